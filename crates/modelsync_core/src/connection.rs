//! Store connections.

use crate::collection::{Collection, CollectionOptions};
use crate::config::AdapterConfig;
use crate::dispatcher::Dispatcher;
use crate::model::Model;
use crate::schema::ModelSchema;
use modelsync_store::{MemoryStore, Record, Store, StoreConfig};
use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// What to connect to.
#[derive(Clone)]
pub enum StoreSource {
    /// An already built store client.
    Client(Arc<dyn Store>),
    /// A bare endpoint URL, opened with the handle's endpoint settings.
    Endpoint(String),
    /// A full store configuration.
    Config(StoreConfig),
}

impl StoreSource {
    /// Wraps a store client.
    pub fn client<S: Store + 'static>(store: S) -> Self {
        Self::Client(Arc::new(store))
    }
}

impl From<Arc<dyn Store>> for StoreSource {
    fn from(store: Arc<dyn Store>) -> Self {
        Self::Client(store)
    }
}

impl From<&str> for StoreSource {
    fn from(url: &str) -> Self {
        Self::Endpoint(url.to_string())
    }
}

impl From<String> for StoreSource {
    fn from(url: String) -> Self {
        Self::Endpoint(url)
    }
}

impl From<StoreConfig> for StoreSource {
    fn from(config: StoreConfig) -> Self {
        Self::Config(config)
    }
}

impl fmt::Debug for StoreSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreSource::Client(store) => f
                .debug_tuple("Client")
                .field(&store.base_url())
                .finish(),
            StoreSource::Endpoint(url) => f.debug_tuple("Endpoint").field(url).finish(),
            StoreSource::Config(config) => f.debug_tuple("Config").field(config).finish(),
        }
    }
}

/// Shared reference to the current store.
///
/// Clones share one slot: [`StoreHandle::connect`] on any clone redirects
/// all of them. Separate handles are fully independent, so several stores
/// can be connected side by side.
#[derive(Clone)]
pub struct StoreHandle {
    current: Arc<RwLock<Arc<dyn Store>>>,
    endpoint: StoreConfig,
}

impl StoreHandle {
    /// Connects a new handle with default endpoint settings.
    pub fn new(source: impl Into<StoreSource>) -> Self {
        Self::with_endpoint_defaults(source, StoreConfig::default())
    }

    /// Connects a new handle, opening endpoints with the given settings.
    pub fn with_endpoint_defaults(source: impl Into<StoreSource>, endpoint: StoreConfig) -> Self {
        let store = Self::open(source.into(), &endpoint);
        Self {
            current: Arc::new(RwLock::new(store)),
            endpoint,
        }
    }

    /// Replaces the current store.
    ///
    /// Operations started afterwards use the new store. Operations already
    /// in flight finish against the store they started with.
    pub fn connect(&self, source: impl Into<StoreSource>) {
        let store = Self::open(source.into(), &self.endpoint);
        debug!(base_url = ?store.base_url(), "connected store");
        *self.current.write() = store;
    }

    /// Returns the current store.
    pub fn current(&self) -> Arc<dyn Store> {
        Arc::clone(&self.current.read())
    }

    /// Returns the endpoint of the current store, if it has one.
    pub fn base_url(&self) -> Option<String> {
        self.current.read().base_url().map(str::to_string)
    }

    fn open(source: StoreSource, endpoint: &StoreConfig) -> Arc<dyn Store> {
        match source {
            StoreSource::Client(store) => store,
            StoreSource::Endpoint(url) => {
                let mut config = endpoint.clone();
                config.base_url = url;
                Arc::new(MemoryStore::open(config))
            }
            StoreSource::Config(config) => Arc::new(MemoryStore::open(config)),
        }
    }
}

impl fmt::Debug for StoreHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreHandle")
            .field("base_url", &self.base_url())
            .finish()
    }
}

/// Entry point tying a store handle to model and collection construction.
///
/// # Example
///
/// ```rust
/// use modelsync_core::{Adapter, CollectionOptions, ModelSchema};
///
/// let adapter = Adapter::connect("http://example.com");
/// let task = ModelSchema::new("task").unwrap();
///
/// let tasks = adapter.collection(&task, CollectionOptions::default());
/// assert!(tasks.is_empty());
/// assert_eq!(adapter.handle().base_url().as_deref(), Some("http://example.com"));
/// ```
#[derive(Debug, Clone)]
pub struct Adapter {
    handle: StoreHandle,
    dispatcher: Dispatcher,
    config: AdapterConfig,
}

impl Adapter {
    /// Connects with the default configuration.
    pub fn connect(source: impl Into<StoreSource>) -> Self {
        Self::with_config(source, AdapterConfig::default())
    }

    /// Connects with the given configuration.
    pub fn with_config(source: impl Into<StoreSource>, config: AdapterConfig) -> Self {
        let handle = StoreHandle::with_endpoint_defaults(source, config.endpoint.clone());
        let dispatcher = Dispatcher::new(handle.clone()).with_continuation(config.continuation);
        Self {
            handle,
            dispatcher,
            config,
        }
    }

    /// Replaces the store for every model and collection of this adapter.
    ///
    /// Sync calls started afterwards go to the new store. Existing
    /// collections keep their store subscription: they still hear events
    /// from the store that was current when they were built. Build new
    /// collections to receive the new store's events.
    pub fn reconnect(&self, source: impl Into<StoreSource>) {
        self.handle.connect(source);
    }

    /// Returns the store handle.
    pub fn handle(&self) -> &StoreHandle {
        &self.handle
    }

    /// Returns the dispatcher.
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Returns the configuration.
    pub fn config(&self) -> &AdapterConfig {
        &self.config
    }

    /// Creates a model that is not part of any collection.
    pub fn model(&self, schema: &ModelSchema, attrs: Record) -> Arc<Model> {
        Model::new(schema.clone(), attrs, self.dispatcher.clone())
    }

    /// Creates a collection bound to the current store.
    pub fn collection(&self, schema: &ModelSchema, options: CollectionOptions) -> Arc<Collection> {
        Collection::new(
            schema.clone(),
            self.dispatcher.clone(),
            self.handle.current(),
            options,
        )
    }
}
