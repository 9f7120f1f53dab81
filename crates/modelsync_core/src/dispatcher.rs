//! The sync dispatcher.
//!
//! Every persistence call made by a [`Model`] or [`Collection`] goes through
//! [`Dispatcher::sync`], which maps it onto one store call:
//!
//! | method | target | store call |
//! |--------|--------|------------|
//! | `Read` | model with id | `find(type, id)` |
//! | `Read` | with a filter | `find_all(Matching(filter))` |
//! | `Read` | otherwise | `find_all(Type(type))` |
//! | `Create` | any | `add(type, payload)` |
//! | `Update` | model with id | `update_or_add(type, id, changed)` |
//! | `Delete` | model with id | `remove(type, id)` |
//!
//! Writes are tagged [`Origin::Local`] so the bridge ignores their echoes.
//! Store errors reach the caller's error callback and the returned
//! [`Deferred`] unchanged.

use crate::collection::Collection;
use crate::connection::StoreHandle;
use crate::deferred::{Continuation, Deferred};
use crate::error::SyncError;
use crate::model::Model;
use modelsync_store::{
    EntityType, FindAll, Origin, Record, RecordId, Store, StoreError, StoreResult, WriteOptions,
};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// Persistence method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    /// Load from the store.
    Read,
    /// Add a new record.
    Create,
    /// Write changed attributes.
    Update,
    /// Remove the record.
    Delete,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Method::Read => "read",
            Method::Create => "create",
            Method::Update => "update",
            Method::Delete => "delete",
        };
        f.write_str(name)
    }
}

/// What a sync call operates on.
#[derive(Debug, Clone)]
pub enum SyncTarget {
    /// A single model.
    Model(Arc<Model>),
    /// A whole collection.
    Collection(Arc<Collection>),
}

impl SyncTarget {
    /// Returns the target's type tag.
    pub fn entity_type(&self) -> &EntityType {
        match self {
            SyncTarget::Model(model) => model.entity_type(),
            SyncTarget::Collection(collection) => collection.entity_type(),
        }
    }

    fn apply(&self, method: Method, outcome: &SyncOutcome) {
        match (self, outcome) {
            (SyncTarget::Model(model), SyncOutcome::Record(record)) => {
                model.replace_attributes(record.clone());
                model.synced(method);
            }
            (SyncTarget::Model(model), _) => model.synced(method),
            (SyncTarget::Collection(collection), SyncOutcome::Records(records)) => {
                collection.set_records(records.clone());
                collection.synced(method);
            }
            (SyncTarget::Collection(collection), _) => collection.synced(method),
        }
    }
}

impl From<Arc<Model>> for SyncTarget {
    fn from(model: Arc<Model>) -> Self {
        SyncTarget::Model(model)
    }
}

impl From<Arc<Collection>> for SyncTarget {
    fn from(collection: Arc<Collection>) -> Self {
        SyncTarget::Collection(collection)
    }
}

/// Result of a successful sync call.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncOutcome {
    /// A single stored record.
    Record(Record),
    /// Several stored records.
    Records(Vec<Record>),
    /// The last state of a removed record.
    Removed(Record),
    /// Nothing was sent to the store.
    Skipped,
}

/// Called with the outcome when a sync call succeeds.
pub type SuccessCallback = Box<dyn FnOnce(&SyncOutcome) + Send>;

/// Called with the store's error when a sync call fails.
pub type ErrorCallback = Box<dyn FnOnce(&StoreError) + Send>;

/// Options for one sync call.
pub struct SyncOptions {
    /// Payload to send instead of the target's own attributes.
    pub attrs: Option<Record>,
    /// Filter for a read without id.
    pub filter: Option<Record>,
    /// Who asked. Remote calls never reach the store.
    pub origin: Origin,
    success: Option<SuccessCallback>,
    error: Option<ErrorCallback>,
}

impl SyncOptions {
    /// Options for a call issued by application code.
    pub fn new() -> Self {
        Self {
            attrs: None,
            filter: None,
            origin: Origin::Local,
            success: None,
            error: None,
        }
    }

    /// Options for a call triggered by a store event.
    ///
    /// The call updates local state only; the store already has the change.
    pub fn remote() -> Self {
        Self {
            origin: Origin::Remote,
            ..Self::new()
        }
    }

    /// Sends the given attributes instead of the target's own.
    pub fn with_attrs(mut self, attrs: Record) -> Self {
        self.attrs = Some(attrs);
        self
    }

    /// Restricts a read to records matching the filter.
    pub fn with_filter(mut self, filter: Record) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Registers a success callback.
    pub fn on_success<F>(mut self, callback: F) -> Self
    where
        F: FnOnce(&SyncOutcome) + Send + 'static,
    {
        self.success = Some(Box::new(callback));
        self
    }

    /// Registers an error callback.
    pub fn on_error<F>(mut self, callback: F) -> Self
    where
        F: FnOnce(&StoreError) + Send + 'static,
    {
        self.error = Some(Box::new(callback));
        self
    }
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SyncOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncOptions")
            .field("attrs", &self.attrs)
            .field("filter", &self.filter)
            .field("origin", &self.origin)
            .field("success", &self.success.is_some())
            .field("error", &self.error.is_some())
            .finish()
    }
}

/// One resolved store call.
#[derive(Debug, Clone, PartialEq)]
pub struct Operation {
    /// Method requested.
    pub method: Method,
    /// Store collection addressed.
    pub entity_type: EntityType,
    /// Id of the target model, if it has one.
    pub id: Option<RecordId>,
    /// Attributes sent with a write.
    pub payload: Record,
    /// Filter for a read without id.
    pub filter: Option<Record>,
}

impl Operation {
    /// Resolves the store call for a target.
    ///
    /// The payload is `options.attrs` when given. Otherwise an update sends
    /// the model's changed attributes and every other method sends the
    /// model's attributes. A collection has no attributes of its own.
    pub fn resolve(method: Method, target: &SyncTarget, options: &SyncOptions) -> Self {
        let (id, payload) = match target {
            SyncTarget::Model(model) => {
                let payload = match (&options.attrs, method) {
                    (Some(attrs), _) => attrs.clone(),
                    (None, Method::Update) => model.changed(),
                    (None, _) => model.attributes(),
                };
                (model.id(), payload)
            }
            SyncTarget::Collection(_) => (None, options.attrs.clone().unwrap_or_default()),
        };

        Self {
            method,
            entity_type: target.entity_type().clone(),
            id,
            payload,
            filter: options.filter.clone(),
        }
    }

    async fn execute(&self, store: &dyn Store) -> StoreResult<SyncOutcome> {
        let local = WriteOptions::local();
        match (self.method, &self.id) {
            (Method::Read, Some(id)) => store
                .find(&self.entity_type, id)
                .await
                .map(SyncOutcome::Record),
            (Method::Read, None) => {
                let query = match &self.filter {
                    Some(filter) => FindAll::Matching(filter.clone()),
                    None => FindAll::Type(self.entity_type.clone()),
                };
                store.find_all(&query).await.map(SyncOutcome::Records)
            }
            (Method::Create, _) | (Method::Update, None) => store
                .add(&self.entity_type, self.payload.clone(), local)
                .await
                .map(SyncOutcome::Record),
            (Method::Update, Some(id)) => store
                .update_or_add(&self.entity_type, id, self.payload.clone(), local)
                .await
                .map(SyncOutcome::Record),
            (Method::Delete, Some(id)) => store
                .remove(&self.entity_type, id, local)
                .await
                .map(SyncOutcome::Removed),
            (Method::Delete, None) => Ok(SyncOutcome::Skipped),
        }
    }
}

/// Routes sync calls to the current store.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    handle: StoreHandle,
    continuation: Continuation,
}

impl Dispatcher {
    /// Creates a dispatcher over a store handle.
    pub fn new(handle: StoreHandle) -> Self {
        Self {
            handle,
            continuation: Continuation::default(),
        }
    }

    /// Sets how continuations are scheduled.
    pub fn with_continuation(mut self, continuation: Continuation) -> Self {
        self.continuation = continuation;
        self
    }

    /// Returns the store handle.
    pub fn handle(&self) -> &StoreHandle {
        &self.handle
    }

    /// Performs a sync call.
    ///
    /// The store is the one current when this is called. Once the store
    /// answers, a returned record replaces the model's attributes (or the
    /// returned records are set on the collection), then the success
    /// callback runs. On failure only the error callback runs.
    pub fn sync(&self, method: Method, target: SyncTarget, options: SyncOptions) -> Deferred {
        if options.origin.is_remote() {
            trace!(%method, entity_type = %target.entity_type(), "remote sync not forwarded");
            return Deferred::ready(Ok(SyncOutcome::Skipped));
        }

        let operation = Operation::resolve(method, &target, &options);
        let SyncOptions { success, error, .. } = options;

        if method == Method::Delete && operation.id.is_none() {
            debug!(entity_type = %operation.entity_type, "delete of unsaved model not forwarded");
            let outcome = SyncOutcome::Skipped;
            if let Some(success) = success {
                success(&outcome);
            }
            return Deferred::ready(Ok(outcome));
        }

        let store = self.handle.current();
        debug!(
            %method,
            entity_type = %operation.entity_type,
            id = ?operation.id,
            "dispatching sync"
        );

        Deferred::start(self.continuation, async move {
            match operation.execute(&*store).await {
                Ok(outcome) => {
                    target.apply(method, &outcome);
                    if let Some(success) = success {
                        success(&outcome);
                    }
                    Ok(outcome)
                }
                Err(err) => {
                    warn!(
                        method = %operation.method,
                        entity_type = %operation.entity_type,
                        error = %err,
                        "store call failed"
                    );
                    if let Some(error) = error {
                        error(&err);
                    }
                    Err(SyncError::Store(err))
                }
            }
        })
    }
}
