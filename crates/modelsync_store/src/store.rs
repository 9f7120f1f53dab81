//! The store client contract.

use crate::error::StoreResult;
use crate::event::EventBus;
use crate::record::Record;
use crate::types::{EntityType, Origin, RecordId};
use async_trait::async_trait;

/// Options passed to every store write.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteOptions {
    /// Origin echoed on the change event this write produces.
    pub origin: Origin,
}

impl WriteOptions {
    /// Options for a write issued by the adapter itself.
    pub const fn local() -> Self {
        Self {
            origin: Origin::Local,
        }
    }

    /// Options for a write from anywhere else.
    pub const fn remote() -> Self {
        Self {
            origin: Origin::Remote,
        }
    }
}

/// Query for [`Store::find_all`].
#[derive(Debug, Clone, PartialEq)]
pub enum FindAll {
    /// Every record of one type.
    Type(EntityType),
    /// Every record, of any type, whose attributes contain the filter.
    Matching(Record),
}

/// A local-first store client.
///
/// Stores hold the durable copy of every record and emit a
/// [`StoreEvent`](crate::StoreEvent) on their [`EventBus`] after each
/// successful write.
///
/// # Invariants
///
/// - A write emits exactly one event, carrying the origin from its
///   [`WriteOptions`]
/// - Events are emitted after the write is visible to reads
/// - Failures are reported as [`StoreError`](crate::StoreError) values and
///   never emit an event
///
/// # Implementors
///
/// - [`crate::MemoryStore`] - in-memory store
/// - [`crate::MockStore`] - scripted test double
#[async_trait]
pub trait Store: Send + Sync {
    /// Finds one record by type and id.
    async fn find(&self, entity_type: &EntityType, id: &RecordId) -> StoreResult<Record>;

    /// Finds every record matching the query.
    async fn find_all(&self, query: &FindAll) -> StoreResult<Vec<Record>>;

    /// Adds a record, returning it as stored (with its id).
    async fn add(
        &self,
        entity_type: &EntityType,
        attrs: Record,
        options: WriteOptions,
    ) -> StoreResult<Record>;

    /// Applies changes to an existing record.
    async fn update(
        &self,
        entity_type: &EntityType,
        id: &RecordId,
        changes: Record,
        options: WriteOptions,
    ) -> StoreResult<Record>;

    /// Applies changes to a record, adding it if it does not exist.
    async fn update_or_add(
        &self,
        entity_type: &EntityType,
        id: &RecordId,
        changes: Record,
        options: WriteOptions,
    ) -> StoreResult<Record>;

    /// Removes a record, returning its last stored state.
    async fn remove(
        &self,
        entity_type: &EntityType,
        id: &RecordId,
        options: WriteOptions,
    ) -> StoreResult<Record>;

    /// Returns the change event bus.
    fn events(&self) -> &EventBus;

    /// Returns the endpoint this client was opened against, if any.
    fn base_url(&self) -> Option<&str> {
        None
    }
}
