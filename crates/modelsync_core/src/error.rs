//! Error types for the adapter.

use modelsync_store::StoreError;
use thiserror::Error;

/// Result type for adapter operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can occur in adapter operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncError {
    /// A store operation failed. The store's error is kept as is.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A model schema was declared without a type tag.
    #[error("model schema has no entity type")]
    MissingEntityType,

    /// A model or schema is unusable for the requested binding.
    #[error("configuration error: {message}")]
    Configuration {
        /// Description of the problem.
        message: String,
    },

    /// The continuation of a store call did not run to completion.
    #[error("sync interrupted: {message}")]
    Interrupted {
        /// Why the continuation stopped.
        message: String,
    },
}

impl SyncError {
    /// Creates a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Creates an interrupted error.
    pub fn interrupted(message: impl Into<String>) -> Self {
        Self::Interrupted {
            message: message.into(),
        }
    }

    /// Returns the store error, if this is one.
    pub fn store_error(&self) -> Option<&StoreError> {
        match self {
            SyncError::Store(err) => Some(err),
            _ => None,
        }
    }
}
