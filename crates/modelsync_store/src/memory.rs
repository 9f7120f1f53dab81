//! In-memory local-first store.

use crate::config::StoreConfig;
use crate::error::{StoreError, StoreResult};
use crate::event::{ChangeKind, EventBus, StoreEvent};
use crate::record::{Record, ID_FIELD};
use crate::store::{FindAll, Store, WriteOptions};
use crate::types::{EntityType, RecordId};
use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;
use tracing::debug;
use uuid::Uuid;

/// Attribute stamped with the creation time.
pub const CREATED_AT_FIELD: &str = "createdAt";
/// Attribute stamped with the last write time.
pub const UPDATED_AT_FIELD: &str = "updatedAt";
/// Attribute stamped with the configured owner.
pub const CREATED_BY_FIELD: &str = "createdBy";

/// An in-memory store.
///
/// Records live in memory, grouped by type in insertion order. This store
/// is suitable for:
/// - Unit and integration tests
/// - Clients connected by endpoint before a durable store is wired in
/// - Ephemeral sessions that do not need persistence
///
/// Every successful write emits one event after the data lock has been
/// released, so listeners may read from the store.
///
/// # Example
///
/// ```rust
/// use modelsync_store::{EntityType, MemoryStore, Record, Store, StoreConfig, WriteOptions};
///
/// # let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
/// # rt.block_on(async {
/// let store = MemoryStore::open(StoreConfig::new("http://example.com"));
/// let task = EntityType::new("task").unwrap();
///
/// let mut attrs = Record::new();
/// attrs.insert("name", "New Task");
/// let stored = store.add(&task, attrs, WriteOptions::remote()).await.unwrap();
///
/// let id = stored.id().unwrap();
/// assert_eq!(store.find(&task, &id).await.unwrap(), stored);
/// # });
/// ```
#[derive(Debug)]
pub struct MemoryStore {
    config: StoreConfig,
    records: RwLock<HashMap<EntityType, Vec<Record>>>,
    events: EventBus,
}

impl MemoryStore {
    /// Creates an empty store with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::open(StoreConfig::default())
    }

    /// Opens an empty store with the given configuration.
    #[must_use]
    pub fn open(config: StoreConfig) -> Self {
        Self {
            config,
            records: RwLock::new(HashMap::new()),
            events: EventBus::new(),
        }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Returns the number of records of one type.
    pub fn count(&self, entity_type: &EntityType) -> usize {
        self.records.read().get(entity_type).map_or(0, Vec::len)
    }

    /// Returns a copy of every record of one type.
    pub fn snapshot(&self, entity_type: &EntityType) -> Vec<Record> {
        self.records
            .read()
            .get(entity_type)
            .cloned()
            .unwrap_or_default()
    }

    fn now() -> String {
        Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    fn generate_id(&self, existing: &[Record]) -> RecordId {
        loop {
            let uuid = Uuid::new_v4().simple().to_string();
            let length = self
                .config
                .id_length
                .clamp(StoreConfig::MIN_ID_LENGTH, uuid.len());
            let candidate = RecordId::new(&uuid[..length]);
            if !existing.iter().any(|r| r.id().as_ref() == Some(&candidate)) {
                return candidate;
            }
        }
    }

    fn position(records: &[Record], id: &RecordId) -> Option<usize> {
        records.iter().position(|r| r.id().as_ref() == Some(id))
    }

    fn notify(&self, kind: ChangeKind, entity_type: &EntityType, record: &Record, options: WriteOptions) {
        debug!(
            %kind,
            %entity_type,
            id = ?record.id(),
            origin = %options.origin,
            "store change"
        );
        self.events.emit(StoreEvent::new(
            kind,
            entity_type.clone(),
            record.clone(),
            options.origin,
        ));
    }

    fn insert(&self, entity_type: &EntityType, mut attrs: Record) -> StoreResult<Record> {
        let mut records = self.records.write();
        let bucket = records.entry(entity_type.clone()).or_default();

        match attrs.id() {
            Some(id) if Self::position(bucket, &id).is_some() => {
                return Err(StoreError::already_exists(entity_type.as_str(), id.as_str()));
            }
            // a given id keeps its JSON type
            Some(_) => {}
            None => {
                let id = self.generate_id(bucket);
                attrs.set_id(&id);
            }
        }

        let now = Self::now();
        attrs.insert(CREATED_AT_FIELD, now.clone());
        attrs.insert(UPDATED_AT_FIELD, now);
        if let Some(owner) = &self.config.owner {
            if !attrs.contains_key(CREATED_BY_FIELD) {
                attrs.insert(CREATED_BY_FIELD, owner.clone());
            }
        }

        bucket.push(attrs.clone());
        Ok(attrs)
    }

    /// Merges changes into an existing record; `None` when it does not exist.
    fn apply_changes(
        &self,
        entity_type: &EntityType,
        id: &RecordId,
        changes: &Record,
    ) -> Option<Record> {
        let mut records = self.records.write();
        let bucket = records.get_mut(entity_type)?;
        let index = Self::position(bucket, id)?;

        let record = &mut bucket[index];
        let stored_id = record.get(ID_FIELD).cloned();
        record.merge(changes);
        // the id is fixed once stored
        if let Some(stored_id) = stored_id {
            record.insert(ID_FIELD, stored_id);
        }
        record.insert(UPDATED_AT_FIELD, Self::now());
        Some(record.clone())
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn find(&self, entity_type: &EntityType, id: &RecordId) -> StoreResult<Record> {
        self.records
            .read()
            .get(entity_type)
            .and_then(|bucket| Self::position(bucket, id).map(|i| bucket[i].clone()))
            .ok_or_else(|| StoreError::not_found(entity_type.as_str(), id.as_str()))
    }

    async fn find_all(&self, query: &FindAll) -> StoreResult<Vec<Record>> {
        let records = self.records.read();
        Ok(match query {
            FindAll::Type(entity_type) => records.get(entity_type).cloned().unwrap_or_default(),
            FindAll::Matching(filter) => {
                let mut types: Vec<&EntityType> = records.keys().collect();
                types.sort();
                types
                    .into_iter()
                    .flat_map(|t| records[t].iter())
                    .filter(|r| r.matches(filter))
                    .cloned()
                    .collect()
            }
        })
    }

    async fn add(
        &self,
        entity_type: &EntityType,
        attrs: Record,
        options: WriteOptions,
    ) -> StoreResult<Record> {
        let record = self.insert(entity_type, attrs)?;
        self.notify(ChangeKind::Add, entity_type, &record, options);
        Ok(record)
    }

    async fn update(
        &self,
        entity_type: &EntityType,
        id: &RecordId,
        changes: Record,
        options: WriteOptions,
    ) -> StoreResult<Record> {
        let record = self
            .apply_changes(entity_type, id, &changes)
            .ok_or_else(|| StoreError::not_found(entity_type.as_str(), id.as_str()))?;
        self.notify(ChangeKind::Update, entity_type, &record, options);
        Ok(record)
    }

    async fn update_or_add(
        &self,
        entity_type: &EntityType,
        id: &RecordId,
        changes: Record,
        options: WriteOptions,
    ) -> StoreResult<Record> {
        if let Some(record) = self.apply_changes(entity_type, id, &changes) {
            self.notify(ChangeKind::Update, entity_type, &record, options);
            return Ok(record);
        }

        let mut attrs = changes;
        if attrs.id().as_ref() != Some(id) {
            attrs.set_id(id);
        }
        let record = self.insert(entity_type, attrs)?;
        self.notify(ChangeKind::Add, entity_type, &record, options);
        Ok(record)
    }

    async fn remove(
        &self,
        entity_type: &EntityType,
        id: &RecordId,
        options: WriteOptions,
    ) -> StoreResult<Record> {
        let removed = {
            let mut records = self.records.write();
            records
                .get_mut(entity_type)
                .and_then(|bucket| Self::position(bucket, id).map(|i| bucket.remove(i)))
        };

        let record =
            removed.ok_or_else(|| StoreError::not_found(entity_type.as_str(), id.as_str()))?;
        self.notify(ChangeKind::Remove, entity_type, &record, options);
        Ok(record)
    }

    fn events(&self) -> &EventBus {
        &self.events
    }

    fn base_url(&self) -> Option<&str> {
        Some(&self.config.base_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Origin;
    use parking_lot::Mutex;
    use serde_json::json;
    use std::sync::Arc;

    fn task() -> EntityType {
        EntityType::new("task").unwrap()
    }

    fn record(value: serde_json::Value) -> Record {
        Record::try_from(value).unwrap()
    }

    fn recorder(store: &MemoryStore, kind: ChangeKind) -> Arc<Mutex<Vec<StoreEvent>>> {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        store
            .events()
            .subscribe(kind, task(), move |e| sink.lock().push(e.clone()));
        seen
    }

    #[tokio::test]
    async fn add_assigns_id_and_metadata() {
        let store = MemoryStore::open(StoreConfig::default().with_owner("pe3vv6m"));

        let stored = store
            .add(&task(), record(json!({"name": "New Task"})), WriteOptions::local())
            .await
            .unwrap();

        let id = stored.id().unwrap();
        assert_eq!(id.as_str().len(), 7);
        assert_eq!(stored.get("name"), Some(&json!("New Task")));
        assert!(stored.contains_key(CREATED_AT_FIELD));
        assert!(stored.contains_key(UPDATED_AT_FIELD));
        assert_eq!(stored.get(CREATED_BY_FIELD), Some(&json!("pe3vv6m")));
        assert_eq!(store.count(&task()), 1);
    }

    #[tokio::test]
    async fn add_keeps_given_id_and_rejects_duplicates() {
        let store = MemoryStore::new();
        let attrs = record(json!({"id": "juyc3ej", "name": "New Task"}));

        let stored = store.add(&task(), attrs.clone(), WriteOptions::remote()).await.unwrap();
        assert_eq!(stored.id(), Some(RecordId::new("juyc3ej")));

        let err = store.add(&task(), attrs, WriteOptions::remote()).await.unwrap_err();
        assert_eq!(err, StoreError::already_exists("task", "juyc3ej"));
        assert_eq!(store.count(&task()), 1);
    }

    #[tokio::test]
    async fn numeric_id_keeps_its_type() {
        let store = MemoryStore::new();
        let attrs = record(json!({"id": 7, "name": "New Task"}));

        let stored = store.add(&task(), attrs, WriteOptions::local()).await.unwrap();
        assert_eq!(stored.get("id"), Some(&json!(7)));

        let id = RecordId::new("7");
        let updated = store
            .update(&task(), &id, record(json!({"id": "7", "name": "Renamed"})), WriteOptions::local())
            .await
            .unwrap();
        assert_eq!(updated.get("id"), Some(&json!(7)));
        assert_eq!(store.find(&task(), &id).await.unwrap().get("id"), Some(&json!(7)));
    }

    #[tokio::test]
    async fn find_missing_is_not_found() {
        let store = MemoryStore::new();
        let err = store.find(&task(), &RecordId::new("nope")).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn update_merges_and_keeps_id() {
        let store = MemoryStore::new();
        store
            .add(&task(), record(json!({"id": "a", "name": "Old", "done": false})), WriteOptions::remote())
            .await
            .unwrap();

        let updated = store
            .update(
                &task(),
                &RecordId::new("a"),
                record(json!({"name": "New", "id": "other"})),
                WriteOptions::local(),
            )
            .await
            .unwrap();

        assert_eq!(updated.id(), Some(RecordId::new("a")));
        assert_eq!(updated.get("name"), Some(&json!("New")));
        assert_eq!(updated.get("done"), Some(&json!(false)));
    }

    #[tokio::test]
    async fn update_missing_fails_without_event() {
        let store = MemoryStore::new();
        let updates = recorder(&store, ChangeKind::Update);

        let err = store
            .update(&task(), &RecordId::new("x"), Record::new(), WriteOptions::local())
            .await
            .unwrap_err();

        assert!(err.is_not_found());
        assert!(updates.lock().is_empty());
    }

    #[tokio::test]
    async fn update_or_add_adds_when_missing() {
        let store = MemoryStore::new();
        let adds = recorder(&store, ChangeKind::Add);
        let updates = recorder(&store, ChangeKind::Update);

        let id = RecordId::new("juyc3ej");
        store
            .update_or_add(&task(), &id, record(json!({"name": "A"})), WriteOptions::local())
            .await
            .unwrap();
        store
            .update_or_add(&task(), &id, record(json!({"name": "B"})), WriteOptions::local())
            .await
            .unwrap();

        assert_eq!(adds.lock().len(), 1);
        assert_eq!(updates.lock().len(), 1);
        assert_eq!(
            store.find(&task(), &id).await.unwrap().get("name"),
            Some(&json!("B"))
        );
    }

    #[tokio::test]
    async fn events_carry_write_origin() {
        let store = MemoryStore::new();
        let adds = recorder(&store, ChangeKind::Add);
        let removes = recorder(&store, ChangeKind::Remove);

        let stored = store
            .add(&task(), record(json!({"name": "x"})), WriteOptions::local())
            .await
            .unwrap();
        store
            .remove(&task(), &stored.id().unwrap(), WriteOptions::remote())
            .await
            .unwrap();

        assert_eq!(adds.lock()[0].origin, Origin::Local);
        assert_eq!(adds.lock()[0].record, stored);
        assert_eq!(removes.lock()[0].origin, Origin::Remote);
        assert_eq!(removes.lock()[0].record, stored);
        assert_eq!(store.count(&task()), 0);
    }

    #[tokio::test]
    async fn remove_missing_is_not_found() {
        let store = MemoryStore::new();
        let err = store
            .remove(&task(), &RecordId::new("nope"), WriteOptions::local())
            .await
            .unwrap_err();
        assert_eq!(err, StoreError::not_found("task", "nope"));
    }

    #[tokio::test]
    async fn find_all_by_type_and_filter() {
        let store = MemoryStore::new();
        let note = EntityType::new("note").unwrap();

        store.add(&task(), record(json!({"foo": "bar"})), WriteOptions::remote()).await.unwrap();
        store.add(&task(), record(json!({"foo": "baz"})), WriteOptions::remote()).await.unwrap();
        store.add(&note, record(json!({"foo": "bar"})), WriteOptions::remote()).await.unwrap();

        let tasks = store.find_all(&FindAll::Type(task())).await.unwrap();
        assert_eq!(tasks.len(), 2);

        let matching = store
            .find_all(&FindAll::Matching(record(json!({"foo": "bar"}))))
            .await
            .unwrap();
        assert_eq!(matching.len(), 2);

        let none = store
            .find_all(&FindAll::Type(EntityType::new("empty").unwrap()))
            .await
            .unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn listener_can_read_store_during_event() {
        let store = Arc::new(MemoryStore::new());
        let counts = Arc::new(Mutex::new(Vec::new()));

        let weak = Arc::downgrade(&store);
        let sink = Arc::clone(&counts);
        store.events().subscribe(ChangeKind::Add, task(), move |_| {
            if let Some(store) = weak.upgrade() {
                sink.lock().push(store.count(&task()));
            }
        });

        store.add(&task(), Record::new(), WriteOptions::remote()).await.unwrap();
        assert_eq!(*counts.lock(), vec![1]);
    }

    #[test]
    fn base_url_comes_from_config() {
        let store = MemoryStore::open(StoreConfig::new("http://example.com"));
        assert_eq!(store.base_url(), Some("http://example.com"));
    }
}
