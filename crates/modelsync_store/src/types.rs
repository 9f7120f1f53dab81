//! Core type definitions shared by stores and the adapter.

use crate::error::{StoreError, StoreResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Type tag naming a logical store collection (for example `"task"`).
///
/// Every persistable entity declares one. The tag doubles as the second half
/// of an event key, so it must be non-empty and free of whitespace and `:`.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EntityType(String);

impl EntityType {
    /// Creates a type tag, validating it.
    pub fn new(name: impl Into<String>) -> StoreResult<Self> {
        let name = name.into();
        let reason = if name.is_empty() {
            Some("type tag is empty")
        } else if name.chars().any(char::is_whitespace) {
            Some("type tag contains whitespace")
        } else if name.contains(':') {
            Some("type tag contains ':'")
        } else {
            None
        };

        match reason {
            Some(reason) => Err(StoreError::InvalidEntityType { name, reason }),
            None => Ok(Self(name)),
        }
    }

    /// Returns the tag as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityType({})", self.0)
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for EntityType {
    type Error = StoreError;

    fn try_from(name: String) -> StoreResult<Self> {
        Self::new(name)
    }
}

impl TryFrom<&str> for EntityType {
    type Error = StoreError;

    fn try_from(name: &str) -> StoreResult<Self> {
        Self::new(name)
    }
}

impl From<EntityType> for String {
    fn from(entity_type: EntityType) -> Self {
        entity_type.0
    }
}

/// Identifier of a persisted record.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    /// Creates a record id.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RecordId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for RecordId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Where a change came from.
///
/// `Local` marks a change caused by the adapter's own write. Handlers that
/// observe a `Local` change must not apply it again. Everything else is
/// `Remote`: other devices, other processes, direct store writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    /// Caused by this adapter.
    Local,
    /// Caused by anything else.
    #[default]
    Remote,
}

impl Origin {
    /// Returns true for [`Origin::Local`].
    #[must_use]
    pub const fn is_local(self) -> bool {
        matches!(self, Origin::Local)
    }

    /// Returns true for [`Origin::Remote`].
    #[must_use]
    pub const fn is_remote(self) -> bool {
        matches!(self, Origin::Remote)
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Origin::Local => f.write_str("local"),
            Origin::Remote => f.write_str("remote"),
        }
    }
}
