//! Models.

use crate::collection::Collection;
use crate::deferred::Deferred;
use crate::dispatcher::{Dispatcher, Method, SyncOptions, SyncTarget};
use crate::events::{ListenerId, ModelEvent, Observers};
use crate::schema::ModelSchema;
use modelsync_store::{EntityType, Origin, Record, RecordId};
use parking_lot::RwLock;
use serde_json::Value;
use std::fmt;
use std::sync::{Arc, Weak};

#[derive(Debug, Default)]
struct State {
    attributes: Record,
    changed: Record,
}

/// One record held in memory.
///
/// Models are shared as `Arc<Model>`. Attribute reads return copies; every
/// mutation goes through [`Model::set`], [`Model::merge`] or a successful
/// sync, each of which reports what changed as a [`ModelEvent::Change`].
pub struct Model {
    schema: ModelSchema,
    state: RwLock<State>,
    collection: RwLock<Weak<Collection>>,
    dispatcher: Dispatcher,
    observers: Observers<ModelEvent>,
}

impl Model {
    /// Creates a model with the schema's defaults overlaid by `attrs`.
    pub fn new(schema: ModelSchema, attrs: Record, dispatcher: Dispatcher) -> Arc<Self> {
        let attributes = schema.initial_attributes(&attrs);
        Arc::new(Self {
            schema,
            state: RwLock::new(State {
                attributes,
                changed: Record::new(),
            }),
            collection: RwLock::new(Weak::new()),
            dispatcher,
            observers: Observers::new(),
        })
    }

    /// Returns the schema.
    pub fn schema(&self) -> &ModelSchema {
        &self.schema
    }

    /// Returns the type tag.
    pub fn entity_type(&self) -> &EntityType {
        self.schema.entity_type()
    }

    /// Returns the id, once assigned.
    pub fn id(&self) -> Option<RecordId> {
        self.state.read().attributes.id()
    }

    /// Returns true until the model has an id.
    pub fn is_new(&self) -> bool {
        self.id().is_none()
    }

    /// Returns one attribute.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.state.read().attributes.get(key).cloned()
    }

    /// Returns a copy of all attributes.
    pub fn attributes(&self) -> Record {
        self.state.read().attributes.clone()
    }

    /// Returns the attributes changed by the last local mutation.
    pub fn changed(&self) -> Record {
        self.state.read().changed.clone()
    }

    /// Returns the collection holding this model, if any.
    pub fn collection(&self) -> Option<Arc<Collection>> {
        self.collection.read().upgrade()
    }

    /// Applies a local mutation.
    ///
    /// Only attributes whose value differs are recorded in
    /// [`Model::changed`]. Returns what changed.
    pub fn set(&self, attrs: Record) -> Record {
        let changed = {
            let mut state = self.state.write();
            let changed = state.attributes.diff(&attrs);
            state.attributes.merge(&changed);
            state.changed = changed.clone();
            changed
        };
        self.notify_change(&changed, Origin::Local);
        changed
    }

    /// Applies attributes received from the store.
    ///
    /// Unlike [`Model::set`] this leaves [`Model::changed`] alone, so a
    /// remote update is never sent back on the next save.
    pub fn merge(&self, attrs: &Record) -> Record {
        let changed = {
            let mut state = self.state.write();
            let changed = state.attributes.diff(attrs);
            state.attributes.merge(&changed);
            changed
        };
        self.notify_change(&changed, Origin::Remote);
        changed
    }

    /// Replaces all attributes with a stored record.
    ///
    /// Attributes missing from `record` are dropped and reported as null in
    /// the emitted change. The model is in sync afterwards, so
    /// [`Model::changed`] is cleared.
    pub fn replace_attributes(&self, record: Record) -> Record {
        let changed = {
            let mut state = self.state.write();
            let mut changed = state.attributes.diff(&record);
            for (key, _) in state.attributes.iter() {
                if !record.contains_key(key) {
                    changed.insert(key.clone(), Value::Null);
                }
            }
            state.attributes = record;
            state.changed = Record::new();
            changed
        };
        self.notify_change(&changed, Origin::Local);
        changed
    }

    /// Sets `attrs` and writes the model to the store.
    ///
    /// A new model is created; a persisted one sends the attributes changed
    /// locally since its last sync.
    pub fn save(self: &Arc<Self>, attrs: Record, options: SyncOptions) -> Deferred {
        if !attrs.is_empty() {
            self.set(attrs);
        }
        let method = if self.is_new() {
            Method::Create
        } else {
            Method::Update
        };
        self.dispatcher
            .sync(method, SyncTarget::Model(Arc::clone(self)), options)
    }

    /// Reloads the model from the store.
    pub fn fetch(self: &Arc<Self>, options: SyncOptions) -> Deferred {
        self.dispatcher
            .sync(Method::Read, SyncTarget::Model(Arc::clone(self)), options)
    }

    /// Destroys the model.
    ///
    /// The model leaves its collection and raises [`ModelEvent::Destroy`]
    /// before the store is called. With [`SyncOptions::remote`] the store is
    /// not called at all.
    pub fn destroy(self: &Arc<Self>, options: SyncOptions) -> Deferred {
        if let Some(collection) = self.collection() {
            collection.remove_model(self);
        }
        self.observers.emit(&ModelEvent::Destroy {
            origin: options.origin,
        });
        self.dispatcher
            .sync(Method::Delete, SyncTarget::Model(Arc::clone(self)), options)
    }

    /// Registers a listener for model events.
    pub fn subscribe<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&ModelEvent) + Send + Sync + 'static,
    {
        self.observers.subscribe(listener)
    }

    /// Removes a listener.
    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        self.observers.unsubscribe(id)
    }

    pub(crate) fn attach(&self, collection: &Arc<Collection>) {
        *self.collection.write() = Arc::downgrade(collection);
    }

    pub(crate) fn detach(&self) {
        *self.collection.write() = Weak::new();
    }

    pub(crate) fn synced(&self, method: Method) {
        self.observers.emit(&ModelEvent::Sync { method });
    }

    fn notify_change(&self, changed: &Record, origin: Origin) {
        if changed.is_empty() {
            return;
        }
        self.observers.emit(&ModelEvent::Change {
            changed: changed.clone(),
            origin,
        });
    }
}

impl fmt::Debug for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.read();
        f.debug_struct("Model")
            .field("entity_type", self.schema.entity_type())
            .field("attributes", &state.attributes)
            .field("changed", &state.changed)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::StoreHandle;
    use parking_lot::Mutex;
    use serde_json::json;

    fn record(value: serde_json::Value) -> Record {
        Record::try_from(value).unwrap()
    }

    fn task(attrs: serde_json::Value) -> Arc<Model> {
        let dispatcher = Dispatcher::new(StoreHandle::new("memory://"));
        Model::new(ModelSchema::new("task").unwrap(), record(attrs), dispatcher)
    }

    fn recorder(model: &Model) -> Arc<Mutex<Vec<ModelEvent>>> {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        model.subscribe(move |event| sink.lock().push(event.clone()));
        events
    }

    #[test]
    fn defaults_are_applied() {
        let dispatcher = Dispatcher::new(StoreHandle::new("memory://"));
        let schema = ModelSchema::new("task").unwrap().with_default("done", false);
        let model = Model::new(schema, record(json!({"name": "New Task"})), dispatcher);

        assert_eq!(model.get("done"), Some(json!(false)));
        assert!(model.is_new());
        assert!(model.changed().is_empty());
    }

    #[test]
    fn set_records_changed_and_emits_local() {
        let model = task(json!({"id": "juyc3ej", "name": "New Task"}));
        let events = recorder(&model);

        model.set(record(json!({"name": "Updated Name", "id": "juyc3ej"})));

        assert_eq!(model.changed(), record(json!({"name": "Updated Name"})));
        assert_eq!(
            *events.lock(),
            vec![ModelEvent::Change {
                changed: record(json!({"name": "Updated Name"})),
                origin: Origin::Local,
            }]
        );
    }

    #[test]
    fn set_without_change_is_silent() {
        let model = task(json!({"name": "New Task"}));
        let events = recorder(&model);

        model.set(record(json!({"name": "New Task"})));
        assert!(events.lock().is_empty());
    }

    #[test]
    fn merge_is_remote_and_keeps_changed() {
        let model = task(json!({"id": "juyc3ej", "name": "New Task"}));
        model.set(record(json!({"done": true})));
        let events = recorder(&model);

        model.merge(&record(json!({"name": "Remote Name"})));

        assert_eq!(model.get("name"), Some(json!("Remote Name")));
        assert_eq!(model.changed(), record(json!({"done": true})));
        assert_eq!(
            *events.lock(),
            vec![ModelEvent::Change {
                changed: record(json!({"name": "Remote Name"})),
                origin: Origin::Remote,
            }]
        );
    }

    #[test]
    fn replace_drops_missing_attributes() {
        let model = task(json!({"name": "New Task", "draft": true}));
        model.set(record(json!({"name": "Renamed"})));
        let events = recorder(&model);

        let changed = model.replace_attributes(record(json!({"id": "juyc3ej", "name": "New Task"})));

        assert_eq!(
            model.attributes(),
            record(json!({"id": "juyc3ej", "name": "New Task"}))
        );
        assert_eq!(
            changed,
            record(json!({"id": "juyc3ej", "name": "New Task", "draft": null}))
        );
        assert!(model.changed().is_empty());
        assert_eq!(
            *events.lock(),
            vec![ModelEvent::Change {
                changed,
                origin: Origin::Local,
            }]
        );
    }

    #[tokio::test]
    async fn destroy_emits_event_with_origin() {
        let model = task(json!({"id": "juyc3ej"}));
        let events = recorder(&model);

        let outcome = model.destroy(SyncOptions::remote()).await;

        assert!(outcome.is_ok());
        assert_eq!(
            *events.lock(),
            vec![ModelEvent::Destroy {
                origin: Origin::Remote
            }]
        );
    }
}
