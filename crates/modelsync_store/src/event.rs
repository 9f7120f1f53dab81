//! Store change events and the typed event bus.
//!
//! A store emits one [`StoreEvent`] for every successful write. Listeners
//! subscribe to a single key, the pair `(ChangeKind, EntityType)`; there is
//! no string event naming.
//!
//! # Usage
//!
//! ```rust
//! use modelsync_store::{ChangeKind, EntityType, EventBus, Origin, Record, StoreEvent};
//!
//! let bus = EventBus::new();
//! let task = EntityType::new("task").unwrap();
//!
//! let id = bus.subscribe(ChangeKind::Add, task.clone(), |event| {
//!     println!("added {:?} ({})", event.record.id(), event.origin);
//! });
//!
//! bus.emit(StoreEvent::new(ChangeKind::Add, task, Record::new(), Origin::Remote));
//! bus.unsubscribe(id);
//! ```

use crate::record::Record;
use crate::types::{EntityType, Origin};
use parking_lot::RwLock;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Kind of store change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    /// A record was added.
    Add,
    /// A record was updated.
    Update,
    /// A record was removed.
    Remove,
}

impl ChangeKind {
    /// All change kinds, in subscription order.
    pub const ALL: [ChangeKind; 3] = [ChangeKind::Add, ChangeKind::Update, ChangeKind::Remove];
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChangeKind::Add => f.write_str("add"),
            ChangeKind::Update => f.write_str("update"),
            ChangeKind::Remove => f.write_str("remove"),
        }
    }
}

/// A single change emitted by a store.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreEvent {
    /// Kind of change.
    pub kind: ChangeKind,
    /// Type of the changed record.
    pub entity_type: EntityType,
    /// The record after the change (before it, for removals).
    pub record: Record,
    /// Who caused the change.
    pub origin: Origin,
}

impl StoreEvent {
    /// Creates an event.
    pub fn new(kind: ChangeKind, entity_type: EntityType, record: Record, origin: Origin) -> Self {
        Self {
            kind,
            entity_type,
            record,
            origin,
        }
    }
}

/// Handle returned by [`EventBus::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Arc<dyn Fn(&StoreEvent) + Send + Sync>;

struct Subscriber {
    id: SubscriptionId,
    kind: ChangeKind,
    entity_type: EntityType,
    listener: Listener,
}

/// Distributes store events to listeners keyed by kind and type.
///
/// The bus:
/// - Delivers events in emission order
/// - Supports any number of listeners per key
/// - Is thread-safe
/// - Invokes listeners without holding its lock, so a listener may
///   subscribe or unsubscribe while being called
pub struct EventBus {
    subscribers: RwLock<Vec<Subscriber>>,
    next_id: AtomicU64,
}

impl EventBus {
    /// Creates an empty bus.
    pub fn new() -> Self {
        Self {
            subscribers: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Subscribes to changes of one kind for one type.
    pub fn subscribe<F>(&self, kind: ChangeKind, entity_type: EntityType, listener: F) -> SubscriptionId
    where
        F: Fn(&StoreEvent) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::SeqCst));
        self.subscribers.write().push(Subscriber {
            id,
            kind,
            entity_type,
            listener: Arc::new(listener),
        });
        id
    }

    /// Removes a subscription.
    ///
    /// Returns false if the id was not subscribed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscribers = self.subscribers.write();
        let before = subscribers.len();
        subscribers.retain(|s| s.id != id);
        subscribers.len() != before
    }

    /// Emits an event to every listener of its key.
    ///
    /// Returns the number of listeners invoked.
    pub fn emit(&self, event: StoreEvent) -> usize {
        let listeners: Vec<Listener> = self
            .subscribers
            .read()
            .iter()
            .filter(|s| s.kind == event.kind && s.entity_type == event.entity_type)
            .map(|s| Arc::clone(&s.listener))
            .collect();

        for listener in &listeners {
            listener(&event);
        }
        listeners.len()
    }

    /// Returns the number of active subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().len()
    }

    /// Returns the number of subscriptions for one key.
    pub fn subscriber_count_for(&self, kind: ChangeKind, entity_type: &EntityType) -> usize {
        self.subscribers
            .read()
            .iter()
            .filter(|s| s.kind == kind && &s.entity_type == entity_type)
            .count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}
