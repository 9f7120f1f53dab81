//! Model schemas.

use crate::error::{SyncError, SyncResult};
use modelsync_store::{EntityType, Record};
use serde_json::Value;

/// Declaration of a persistable model class.
///
/// Every schema names the store collection its models live in. A schema
/// without a type tag cannot be built, so every model and collection
/// created from one can be bound to the store.
///
/// # Example
///
/// ```rust
/// use modelsync_core::ModelSchema;
///
/// let task = ModelSchema::new("task")
///     .unwrap()
///     .with_default("done", false);
///
/// assert_eq!(task.entity_type().as_str(), "task");
/// assert!(ModelSchema::new("").is_err());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ModelSchema {
    entity_type: EntityType,
    defaults: Record,
}

impl ModelSchema {
    /// Declares a schema for the given type tag.
    pub fn new(entity_type: &str) -> SyncResult<Self> {
        if entity_type.is_empty() {
            return Err(SyncError::MissingEntityType);
        }
        let entity_type =
            EntityType::new(entity_type).map_err(|e| SyncError::configuration(e.to_string()))?;
        Ok(Self::from_type(entity_type))
    }

    /// Declares a schema for an already validated type tag.
    pub fn from_type(entity_type: EntityType) -> Self {
        Self {
            entity_type,
            defaults: Record::new(),
        }
    }

    /// Adds a default attribute.
    pub fn with_default(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.defaults.insert(key, value);
        self
    }

    /// Adds several default attributes.
    pub fn with_defaults(mut self, defaults: &Record) -> Self {
        self.defaults.merge(defaults);
        self
    }

    /// Returns the type tag.
    pub fn entity_type(&self) -> &EntityType {
        &self.entity_type
    }

    /// Returns the default attributes.
    pub fn defaults(&self) -> &Record {
        &self.defaults
    }

    /// Returns the defaults overlaid with the given attributes.
    pub(crate) fn initial_attributes(&self, attrs: &Record) -> Record {
        let mut initial = self.defaults.clone();
        initial.merge(attrs);
        initial
    }
}
