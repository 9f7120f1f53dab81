//! Error types for store operations.

use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors a store client can report.
///
/// Store errors are cloneable so that the same failure can be handed to a
/// caller's error callback and returned through the deferred unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// No record with the given id exists for the type.
    #[error("record not found: {entity_type}/{id}")]
    NotFound {
        /// Type tag that was searched.
        entity_type: String,
        /// The missing record id.
        id: String,
    },

    /// A record with the given id already exists for the type.
    #[error("record already exists: {entity_type}/{id}")]
    AlreadyExists {
        /// Type tag of the existing record.
        entity_type: String,
        /// The conflicting record id.
        id: String,
    },

    /// The type tag cannot be used as a store collection name.
    #[error("invalid entity type {name:?}: {reason}")]
    InvalidEntityType {
        /// The rejected tag.
        name: String,
        /// Why it was rejected.
        reason: &'static str,
    },

    /// The store refused the operation.
    #[error("store rejected operation: {0}")]
    Rejected(String),

    /// The store could not be reached or has no answer for the call.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    /// Creates a not found error.
    pub fn not_found(entity_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: entity_type.into(),
            id: id.into(),
        }
    }

    /// Creates an already exists error.
    pub fn already_exists(entity_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self::AlreadyExists {
            entity_type: entity_type.into(),
            id: id.into(),
        }
    }

    /// Creates a rejected error.
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::Rejected(message.into())
    }

    /// Creates an unavailable error.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable(message.into())
    }

    /// Returns true if the error reports a missing record.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }
}
