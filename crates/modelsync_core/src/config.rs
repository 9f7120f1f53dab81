//! Configuration for the adapter.

use crate::deferred::Continuation;
use modelsync_store::StoreConfig;

/// Configuration for an [`Adapter`](crate::Adapter).
#[derive(Debug, Clone, Default)]
pub struct AdapterConfig {
    /// Settings applied when connecting by endpoint. The endpoint's URL
    /// replaces `base_url`.
    pub endpoint: StoreConfig,
    /// Scheduling of store call continuations.
    pub continuation: Continuation,
}

impl AdapterConfig {
    /// Creates the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the settings used for endpoint connections.
    pub fn with_endpoint_defaults(mut self, endpoint: StoreConfig) -> Self {
        self.endpoint = endpoint;
        self
    }

    /// Sets how continuations are scheduled.
    pub fn with_continuation(mut self, continuation: Continuation) -> Self {
        self.continuation = continuation;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adapter_config_builder() {
        let config = AdapterConfig::new()
            .with_endpoint_defaults(StoreConfig::default().with_owner("pe3vv6m"))
            .with_continuation(Continuation::Lazy);

        assert_eq!(config.endpoint.owner.as_deref(), Some("pe3vv6m"));
        assert_eq!(config.continuation, Continuation::Lazy);
    }

    #[test]
    fn defaults_spawn_continuations() {
        assert_eq!(AdapterConfig::default().continuation, Continuation::Spawn);
    }
}
