//! Configuration for store clients.

/// Configuration for opening a store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Endpoint the store synchronizes with.
    pub base_url: String,
    /// Length of generated record ids.
    pub id_length: usize,
    /// Owner stamped as `createdBy` on added records.
    pub owner: Option<String>,
}

impl StoreConfig {
    /// Shortest generated id allowed.
    pub const MIN_ID_LENGTH: usize = 4;
    /// Longest generated id allowed (a simple-format UUID).
    pub const MAX_ID_LENGTH: usize = 32;

    /// Creates a configuration for the given endpoint.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            id_length: 7,
            owner: None,
        }
    }

    /// Sets the generated id length, clamped to the supported range.
    pub fn with_id_length(mut self, length: usize) -> Self {
        self.id_length = length.clamp(Self::MIN_ID_LENGTH, Self::MAX_ID_LENGTH);
        self
    }

    /// Sets the owner stamped on added records.
    pub fn with_owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = Some(owner.into());
        self
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::new("memory://")
    }
}

impl From<&str> for StoreConfig {
    fn from(base_url: &str) -> Self {
        Self::new(base_url)
    }
}

impl From<String> for StoreConfig {
    fn from(base_url: String) -> Self {
        Self::new(base_url)
    }
}
