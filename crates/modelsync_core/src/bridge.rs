//! Store-to-collection event bridge.
//!
//! A [`Bridge`] mirrors store changes of one type into one collection. Each
//! handler first applies the collection's store filter, then branches on the
//! event's [`Origin`]:
//!
//! - `Local` changes were made by this adapter and are already reflected in
//!   memory, so they are dropped.
//! - `Remote` changes are applied. An add inserts the record and raises
//!   [`CollectionEvent::Create`]; an update merges into the existing model
//!   and raises [`CollectionEvent::Update`]; a remove destroys the existing
//!   model with [`SyncOptions::remote`], which does not call the store.
//!
//! Records the collection does not hold are ignored.

use crate::collection::Collection;
use crate::dispatcher::SyncOptions;
use crate::events::CollectionEvent;
use modelsync_store::{ChangeKind, EntityType, Origin, Store, StoreEvent, SubscriptionId};
use std::fmt;
use std::sync::{Arc, Weak};
use tracing::trace;

/// Subscription of one collection to its type's store events.
///
/// Dropping the bridge unsubscribes.
pub struct Bridge {
    store: Arc<dyn Store>,
    entity_type: EntityType,
    subscriptions: Vec<SubscriptionId>,
}

impl Bridge {
    /// Subscribes `collection` to the add, update and remove events of its
    /// type on `store`.
    ///
    /// Handlers hold the collection weakly and do nothing once it is gone.
    pub fn bind(collection: &Arc<Collection>, store: Arc<dyn Store>) -> Self {
        let entity_type = collection.entity_type().clone();
        let subscriptions = ChangeKind::ALL
            .into_iter()
            .map(|kind| {
                let target = Arc::downgrade(collection);
                store
                    .events()
                    .subscribe(kind, entity_type.clone(), move |event| {
                        handle(&target, event)
                    })
            })
            .collect();

        Self {
            store,
            entity_type,
            subscriptions,
        }
    }

    /// Returns the bound type.
    pub fn entity_type(&self) -> &EntityType {
        &self.entity_type
    }

    /// Returns true while subscribed.
    pub fn is_bound(&self) -> bool {
        !self.subscriptions.is_empty()
    }

    /// Unsubscribes.
    pub fn unbind(mut self) {
        self.release();
    }

    fn release(&mut self) {
        for id in self.subscriptions.drain(..) {
            self.store.events().unsubscribe(id);
        }
    }
}

impl Drop for Bridge {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Debug for Bridge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bridge")
            .field("entity_type", &self.entity_type)
            .field("subscriptions", &self.subscriptions.len())
            .finish()
    }
}

fn handle(target: &Weak<Collection>, event: &StoreEvent) {
    let Some(collection) = target.upgrade() else {
        return;
    };
    if !collection.passes_filter(&event.record) {
        trace!(kind = %event.kind, entity_type = %event.entity_type, "filtered store event");
        return;
    }

    match event.origin {
        Origin::Local => {
            trace!(kind = %event.kind, id = ?event.record.id(), "suppressed local echo");
        }
        Origin::Remote => match event.kind {
            ChangeKind::Add => on_add(&collection, event),
            ChangeKind::Update => on_update(&collection, event),
            ChangeKind::Remove => on_remove(&collection, event),
        },
    }
}

fn on_add(collection: &Arc<Collection>, event: &StoreEvent) {
    if collection.insert_remote(event.record.clone()).is_some() {
        collection.emit(CollectionEvent::Create {
            record: event.record.clone(),
            origin: event.origin,
        });
    }
}

fn on_update(collection: &Arc<Collection>, event: &StoreEvent) {
    let Some(model) = event.record.id().and_then(|id| collection.get(&id)) else {
        return;
    };
    model.merge(&event.record);
    collection.emit(CollectionEvent::Update {
        record: event.record.clone(),
        origin: event.origin,
    });
}

fn on_remove(collection: &Arc<Collection>, event: &StoreEvent) {
    let Some(model) = event.record.id().and_then(|id| collection.get(&id)) else {
        return;
    };
    // Remote options resolve immediately without touching the store.
    let _ = model.destroy(SyncOptions::remote());
}
