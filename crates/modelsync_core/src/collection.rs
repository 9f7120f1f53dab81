//! Collections and their store binding.

use crate::bridge::Bridge;
use crate::deferred::Deferred;
use crate::dispatcher::{Dispatcher, Method, SyncOptions, SyncTarget};
use crate::error::{SyncError, SyncResult};
use crate::events::{CollectionEvent, ListenerId, Observers};
use crate::model::Model;
use crate::schema::ModelSchema;
use modelsync_store::{EntityType, Record, RecordId, Store};
use parking_lot::{Mutex, RwLock};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Predicate deciding which store records a collection mirrors.
pub type StoreFilter = Arc<dyn Fn(&Record) -> bool + Send + Sync>;

/// Options for [`Collection::new`].
#[derive(Clone, Default)]
pub struct CollectionOptions {
    store_filter: Option<StoreFilter>,
}

impl CollectionOptions {
    /// Creates default options: every record of the type is mirrored.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mirrors only store records accepted by `filter`.
    pub fn with_store_filter<F>(mut self, filter: F) -> Self
    where
        F: Fn(&Record) -> bool + Send + Sync + 'static,
    {
        self.store_filter = Some(Arc::new(filter));
        self
    }
}

impl fmt::Debug for CollectionOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CollectionOptions")
            .field("store_filter", &self.store_filter.is_some())
            .finish()
    }
}

/// Lifecycle of a collection's store subscription.
///
/// Moves `Uninitialized -> Bound -> Disposed`. [`Collection::new`] binds
/// before returning, so callers only ever observe `Bound` or `Disposed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingState {
    /// Not yet subscribed. Only held while [`Collection::new`] runs.
    Uninitialized,
    /// Receiving store events.
    Bound,
    /// Unsubscribed for good.
    Disposed,
}

enum Binding {
    Uninitialized,
    Bound(Bridge),
    Disposed,
}

/// An ordered set of models of one type, kept in step with the store.
///
/// A collection subscribes to its type's store events when it is built and
/// stays subscribed until [`Collection::dispose`] or drop.
pub struct Collection {
    schema: ModelSchema,
    dispatcher: Dispatcher,
    models: RwLock<Vec<Arc<Model>>>,
    store_filter: Option<StoreFilter>,
    binding: Mutex<Binding>,
    observers: Observers<CollectionEvent>,
}

impl Collection {
    /// Creates a collection bound to `store`.
    pub fn new(
        schema: ModelSchema,
        dispatcher: Dispatcher,
        store: Arc<dyn Store>,
        options: CollectionOptions,
    ) -> Arc<Self> {
        let collection = Arc::new(Self {
            schema,
            dispatcher,
            models: RwLock::new(Vec::new()),
            store_filter: options.store_filter,
            binding: Mutex::new(Binding::Uninitialized),
            observers: Observers::new(),
        });

        let bridge = Bridge::bind(&collection, store);
        *collection.binding.lock() = Binding::Bound(bridge);
        debug!(entity_type = %collection.entity_type(), "collection bound");
        collection
    }

    /// Returns the schema of the collection's models.
    pub fn schema(&self) -> &ModelSchema {
        &self.schema
    }

    /// Returns the type tag.
    pub fn entity_type(&self) -> &EntityType {
        self.schema.entity_type()
    }

    /// Returns the binding state.
    pub fn state(&self) -> BindingState {
        match &*self.binding.lock() {
            Binding::Uninitialized => BindingState::Uninitialized,
            Binding::Bound(_) => BindingState::Bound,
            Binding::Disposed => BindingState::Disposed,
        }
    }

    /// Unsubscribes from store events. The models stay.
    pub fn dispose(&self) {
        let previous = std::mem::replace(&mut *self.binding.lock(), Binding::Disposed);
        if let Binding::Bound(bridge) = previous {
            bridge.unbind();
            debug!(entity_type = %self.entity_type(), "collection disposed");
        }
    }

    /// Returns the number of models.
    pub fn len(&self) -> usize {
        self.models.read().len()
    }

    /// Returns true if the collection holds no models.
    pub fn is_empty(&self) -> bool {
        self.models.read().is_empty()
    }

    /// Returns the models in order.
    pub fn models(&self) -> Vec<Arc<Model>> {
        self.models.read().clone()
    }

    /// Returns the model at `index`.
    pub fn at(&self, index: usize) -> Option<Arc<Model>> {
        self.models.read().get(index).cloned()
    }

    /// Returns the model with the given id.
    pub fn get(&self, id: &RecordId) -> Option<Arc<Model>> {
        self.models
            .read()
            .iter()
            .find(|model| model.id().as_ref() == Some(id))
            .cloned()
    }

    /// Adds a model built from `attrs`.
    ///
    /// If a model with the same id is already present it is returned
    /// unchanged.
    pub fn add(self: &Arc<Self>, attrs: Record) -> Arc<Model> {
        self.insert(attrs).0
    }

    /// Adds an existing model.
    ///
    /// Fails if the model belongs to another type. If a model with the same
    /// id is already present, that one is returned instead.
    pub fn add_model(self: &Arc<Self>, model: Arc<Model>) -> SyncResult<Arc<Model>> {
        if model.entity_type() != self.entity_type() {
            return Err(SyncError::configuration(format!(
                "cannot add a {} model to a {} collection",
                model.entity_type(),
                self.entity_type()
            )));
        }
        if let Some(existing) = model.id().and_then(|id| self.get(&id)) {
            return Ok(existing);
        }
        self.push(Arc::clone(&model));
        Ok(model)
    }

    /// Removes the model with the given id.
    pub fn remove(&self, id: &RecordId) -> Option<Arc<Model>> {
        let model = self.get(id)?;
        self.remove_model(&model).then_some(model)
    }

    /// Applies a full set of stored records.
    ///
    /// Known ids have their attributes replaced, unknown records are added
    /// and persisted models missing from `records` are removed. Models that
    /// were never saved are kept.
    pub fn set_records(self: &Arc<Self>, records: Vec<Record>) {
        let mut seen = HashSet::new();
        for record in records {
            match record.id() {
                Some(id) => {
                    seen.insert(id.clone());
                    match self.get(&id) {
                        Some(model) => {
                            model.replace_attributes(record);
                        }
                        None => self.push(self.build(record)),
                    }
                }
                None => self.push(self.build(record)),
            }
        }

        let stale: Vec<Arc<Model>> = self
            .models
            .read()
            .iter()
            .filter(|model| model.id().is_some_and(|id| !seen.contains(&id)))
            .cloned()
            .collect();
        for model in stale {
            self.remove_model(&model);
        }
    }

    /// Adds a model built from `attrs` and saves it.
    pub fn create(self: &Arc<Self>, attrs: Record, options: SyncOptions) -> (Arc<Model>, Deferred) {
        let model = self.build(attrs);
        self.push(Arc::clone(&model));
        let deferred = model.save(Record::new(), options);
        (model, deferred)
    }

    /// Loads the collection's records from the store.
    ///
    /// With a filter in `options` the store is queried across types.
    pub fn fetch(self: &Arc<Self>, options: SyncOptions) -> Deferred {
        self.dispatcher.sync(
            Method::Read,
            SyncTarget::Collection(Arc::clone(self)),
            options,
        )
    }

    /// Registers a listener for collection events.
    pub fn subscribe<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&CollectionEvent) + Send + Sync + 'static,
    {
        self.observers.subscribe(listener)
    }

    /// Removes a listener.
    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        self.observers.unsubscribe(id)
    }

    pub(crate) fn passes_filter(&self, record: &Record) -> bool {
        self.store_filter.as_ref().is_none_or(|filter| filter(record))
    }

    /// Inserts a record announced by the store. Returns `None` if its id is
    /// already present.
    pub(crate) fn insert_remote(self: &Arc<Self>, record: Record) -> Option<Arc<Model>> {
        match self.insert(record) {
            (model, true) => Some(model),
            (_, false) => None,
        }
    }

    pub(crate) fn remove_model(&self, model: &Arc<Model>) -> bool {
        let removed = {
            let mut models = self.models.write();
            let before = models.len();
            models.retain(|existing| !Arc::ptr_eq(existing, model));
            models.len() != before
        };
        if removed {
            model.detach();
            self.observers.emit(&CollectionEvent::Remove {
                model: Arc::clone(model),
            });
        }
        removed
    }

    pub(crate) fn emit(&self, event: CollectionEvent) {
        self.observers.emit(&event);
    }

    pub(crate) fn synced(&self, method: Method) {
        self.observers.emit(&CollectionEvent::Sync { method });
    }

    fn build(&self, attrs: Record) -> Arc<Model> {
        Model::new(self.schema.clone(), attrs, self.dispatcher.clone())
    }

    fn insert(self: &Arc<Self>, attrs: Record) -> (Arc<Model>, bool) {
        if let Some(existing) = attrs.id().and_then(|id| self.get(&id)) {
            return (existing, false);
        }
        let model = self.build(attrs);
        self.push(Arc::clone(&model));
        (model, true)
    }

    fn push(self: &Arc<Self>, model: Arc<Model>) {
        model.attach(self);
        self.models.write().push(Arc::clone(&model));
        self.observers.emit(&CollectionEvent::Add { model });
    }
}

impl fmt::Debug for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collection")
            .field("entity_type", self.entity_type())
            .field("len", &self.len())
            .field("state", &self.state())
            .finish()
    }
}
