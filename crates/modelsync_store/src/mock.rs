//! A scripted store for testing.

use crate::error::{StoreError, StoreResult};
use crate::event::EventBus;
use crate::record::Record;
use crate::store::{FindAll, Store, WriteOptions};
use crate::types::{EntityType, RecordId};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::fmt;
use tokio::sync::oneshot;

/// Store methods, as recorded by [`MockStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreMethod {
    /// [`Store::find`].
    Find,
    /// [`Store::find_all`].
    FindAll,
    /// [`Store::add`].
    Add,
    /// [`Store::update`].
    Update,
    /// [`Store::update_or_add`].
    UpdateOrAdd,
    /// [`Store::remove`].
    Remove,
}

impl fmt::Display for StoreMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StoreMethod::Find => "find",
            StoreMethod::FindAll => "find_all",
            StoreMethod::Add => "add",
            StoreMethod::Update => "update",
            StoreMethod::UpdateOrAdd => "update_or_add",
            StoreMethod::Remove => "remove",
        };
        f.write_str(name)
    }
}

/// One recorded call.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreCall {
    /// Method called.
    pub method: StoreMethod,
    /// Type argument, absent for filtered `find_all`.
    pub entity_type: Option<EntityType>,
    /// Id argument.
    pub id: Option<RecordId>,
    /// Attribute payload of a write.
    pub payload: Option<Record>,
    /// Query of a `find_all`.
    pub query: Option<FindAll>,
    /// Options of a write.
    pub options: Option<WriteOptions>,
}

impl StoreCall {
    fn new(method: StoreMethod) -> Self {
        Self {
            method,
            entity_type: None,
            id: None,
            payload: None,
            query: None,
            options: None,
        }
    }
}

/// A scripted answer.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// A single record.
    Record(Record),
    /// Several records.
    Records(Vec<Record>),
}

impl From<Record> for Reply {
    fn from(record: Record) -> Self {
        Reply::Record(record)
    }
}

impl From<Vec<Record>> for Reply {
    fn from(records: Vec<Record>) -> Self {
        Reply::Records(records)
    }
}

/// Completes a held call.
///
/// Dropping the gate without completing it fails the call with
/// [`StoreError::Unavailable`].
#[derive(Debug)]
pub struct ReplyGate {
    tx: oneshot::Sender<StoreResult<Reply>>,
}

impl ReplyGate {
    /// Resolves the held call.
    pub fn resolve(self, reply: impl Into<Reply>) {
        let _ = self.tx.send(Ok(reply.into()));
    }

    /// Rejects the held call.
    pub fn reject(self, error: StoreError) {
        let _ = self.tx.send(Err(error));
    }
}

enum Scripted {
    Now(StoreResult<Reply>),
    Held(oneshot::Receiver<StoreResult<Reply>>),
}

/// A store that records calls and answers from scripts.
///
/// Each method has a queue of scripted answers consumed in order. An answer
/// is either immediate ([`MockStore::respond`]) or held until a test
/// completes its [`ReplyGate`] ([`MockStore::hold`]). A call with nothing
/// scripted fails with [`StoreError::Unavailable`].
///
/// The mock never emits events on its own; tests drive the bus through
/// [`Store::events`].
#[derive(Default)]
pub struct MockStore {
    calls: Mutex<Vec<StoreCall>>,
    scripts: Mutex<HashMap<StoreMethod, VecDeque<Scripted>>>,
    events: EventBus,
    base_url: Option<String>,
}

impl MockStore {
    /// Creates a mock store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a mock store reporting the given endpoint.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: Some(base_url.into()),
            ..Self::default()
        }
    }

    /// Scripts the next answer of a method.
    pub fn respond(&self, method: StoreMethod, result: StoreResult<Reply>) {
        self.script(method, Scripted::Now(result));
    }

    /// Scripts a successful answer.
    pub fn resolve_with(&self, method: StoreMethod, reply: impl Into<Reply>) {
        self.respond(method, Ok(reply.into()));
    }

    /// Scripts a failed answer.
    pub fn reject_with(&self, method: StoreMethod, error: StoreError) {
        self.respond(method, Err(error));
    }

    /// Holds the next call of a method until the returned gate completes.
    pub fn hold(&self, method: StoreMethod) -> ReplyGate {
        let (tx, rx) = oneshot::channel();
        self.script(method, Scripted::Held(rx));
        ReplyGate { tx }
    }

    /// Returns every recorded call.
    pub fn calls(&self) -> Vec<StoreCall> {
        self.calls.lock().clone()
    }

    /// Returns the recorded calls of one method.
    pub fn calls_to(&self, method: StoreMethod) -> Vec<StoreCall> {
        self.calls
            .lock()
            .iter()
            .filter(|c| c.method == method)
            .cloned()
            .collect()
    }

    /// Returns the number of calls of one method.
    pub fn call_count(&self, method: StoreMethod) -> usize {
        self.calls.lock().iter().filter(|c| c.method == method).count()
    }

    fn script(&self, method: StoreMethod, scripted: Scripted) {
        self.scripts
            .lock()
            .entry(method)
            .or_default()
            .push_back(scripted);
    }

    async fn answer(&self, call: StoreCall) -> StoreResult<Reply> {
        let method = call.method;
        self.calls.lock().push(call);

        let scripted = self
            .scripts
            .lock()
            .get_mut(&method)
            .and_then(VecDeque::pop_front);

        match scripted {
            Some(Scripted::Now(result)) => result,
            Some(Scripted::Held(rx)) => rx.await.unwrap_or_else(|_| {
                Err(StoreError::unavailable(format!("held {method} call was dropped")))
            }),
            None => Err(StoreError::unavailable(format!("no reply scripted for {method}"))),
        }
    }

    async fn answer_record(&self, call: StoreCall) -> StoreResult<Record> {
        let method = call.method;
        match self.answer(call).await? {
            Reply::Record(record) => Ok(record),
            Reply::Records(_) => Err(StoreError::unavailable(format!(
                "{method} scripted with several records"
            ))),
        }
    }
}

impl fmt::Debug for MockStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockStore")
            .field("calls", &self.calls.lock().len())
            .field("events", &self.events)
            .field("base_url", &self.base_url)
            .finish()
    }
}

#[async_trait]
impl Store for MockStore {
    async fn find(&self, entity_type: &EntityType, id: &RecordId) -> StoreResult<Record> {
        let mut call = StoreCall::new(StoreMethod::Find);
        call.entity_type = Some(entity_type.clone());
        call.id = Some(id.clone());
        self.answer_record(call).await
    }

    async fn find_all(&self, query: &FindAll) -> StoreResult<Vec<Record>> {
        let mut call = StoreCall::new(StoreMethod::FindAll);
        if let FindAll::Type(entity_type) = query {
            call.entity_type = Some(entity_type.clone());
        }
        call.query = Some(query.clone());

        match self.answer(call).await? {
            Reply::Records(records) => Ok(records),
            Reply::Record(record) => Ok(vec![record]),
        }
    }

    async fn add(
        &self,
        entity_type: &EntityType,
        attrs: Record,
        options: WriteOptions,
    ) -> StoreResult<Record> {
        let mut call = StoreCall::new(StoreMethod::Add);
        call.entity_type = Some(entity_type.clone());
        call.payload = Some(attrs);
        call.options = Some(options);
        self.answer_record(call).await
    }

    async fn update(
        &self,
        entity_type: &EntityType,
        id: &RecordId,
        changes: Record,
        options: WriteOptions,
    ) -> StoreResult<Record> {
        let mut call = StoreCall::new(StoreMethod::Update);
        call.entity_type = Some(entity_type.clone());
        call.id = Some(id.clone());
        call.payload = Some(changes);
        call.options = Some(options);
        self.answer_record(call).await
    }

    async fn update_or_add(
        &self,
        entity_type: &EntityType,
        id: &RecordId,
        changes: Record,
        options: WriteOptions,
    ) -> StoreResult<Record> {
        let mut call = StoreCall::new(StoreMethod::UpdateOrAdd);
        call.entity_type = Some(entity_type.clone());
        call.id = Some(id.clone());
        call.payload = Some(changes);
        call.options = Some(options);
        self.answer_record(call).await
    }

    async fn remove(
        &self,
        entity_type: &EntityType,
        id: &RecordId,
        options: WriteOptions,
    ) -> StoreResult<Record> {
        let mut call = StoreCall::new(StoreMethod::Remove);
        call.entity_type = Some(entity_type.clone());
        call.id = Some(id.clone());
        call.options = Some(options);
        self.answer_record(call).await
    }

    fn events(&self) -> &EventBus {
        &self.events
    }

    fn base_url(&self) -> Option<&str> {
        self.base_url.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn task() -> EntityType {
        EntityType::new("task").unwrap()
    }

    fn record(value: serde_json::Value) -> Record {
        Record::try_from(value).unwrap()
    }

    #[tokio::test]
    async fn records_calls_with_arguments() {
        let store = MockStore::new();
        store.resolve_with(StoreMethod::Add, record(json!({"id": "a"})));

        let attrs = record(json!({"name": "New Task"}));
        store.add(&task(), attrs.clone(), WriteOptions::local()).await.unwrap();

        let calls = store.calls_to(StoreMethod::Add);
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].entity_type, Some(task()));
        assert_eq!(calls[0].payload, Some(attrs));
        assert_eq!(calls[0].options, Some(WriteOptions::local()));
    }

    #[tokio::test]
    async fn unscripted_call_is_unavailable() {
        let store = MockStore::new();
        let err = store.find(&task(), &RecordId::new("a")).await.unwrap_err();
        assert!(matches!(err, StoreError::Unavailable(_)));
        assert_eq!(store.call_count(StoreMethod::Find), 1);
    }

    #[tokio::test]
    async fn scripts_are_consumed_in_order() {
        let store = MockStore::new();
        store.resolve_with(StoreMethod::Find, record(json!({"n": 1})));
        store.reject_with(StoreMethod::Find, StoreError::not_found("task", "a"));

        let id = RecordId::new("a");
        assert_eq!(store.find(&task(), &id).await.unwrap(), record(json!({"n": 1})));
        assert!(store.find(&task(), &id).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn held_call_waits_for_gate() {
        let store = std::sync::Arc::new(MockStore::new());
        let gate = store.hold(StoreMethod::Remove);

        let pending = {
            let store = std::sync::Arc::clone(&store);
            tokio::spawn(async move {
                store
                    .remove(&task(), &RecordId::new("a"), WriteOptions::local())
                    .await
            })
        };

        tokio::task::yield_now().await;
        gate.reject(StoreError::rejected("denied"));

        let result = pending.await.unwrap();
        assert_eq!(result, Err(StoreError::rejected("denied")));
    }

    #[tokio::test]
    async fn dropped_gate_fails_call() {
        let store = MockStore::new();
        drop(store.hold(StoreMethod::Find));

        let err = store.find(&task(), &RecordId::new("a")).await.unwrap_err();
        assert!(matches!(err, StoreError::Unavailable(_)));
    }

    #[tokio::test]
    async fn filtered_find_all_has_no_type() {
        let store = MockStore::new();
        store.resolve_with(StoreMethod::FindAll, Vec::<Record>::new());

        let filter = record(json!({"foo": "bar"}));
        store.find_all(&FindAll::Matching(filter.clone())).await.unwrap();

        let call = &store.calls()[0];
        assert_eq!(call.entity_type, None);
        assert_eq!(call.query, Some(FindAll::Matching(filter)));
    }
}
