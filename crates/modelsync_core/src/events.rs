//! Domain events raised by models and collections.

use crate::dispatcher::Method;
use crate::model::Model;
use modelsync_store::{Origin, Record};
use parking_lot::RwLock;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Events raised by a [`Model`].
#[derive(Debug, Clone, PartialEq)]
pub enum ModelEvent {
    /// Attributes changed.
    Change {
        /// The attributes that changed, with their new values.
        changed: Record,
        /// Local for `set` and sync results, Remote for store echoes.
        origin: Origin,
    },
    /// The model was destroyed.
    Destroy {
        /// Who asked for the destruction.
        origin: Origin,
    },
    /// A store call for the model succeeded.
    Sync {
        /// The method that completed.
        method: Method,
    },
}

/// Events raised by a [`Collection`](crate::Collection).
#[derive(Debug, Clone)]
pub enum CollectionEvent {
    /// A model joined the collection.
    Add {
        /// The added model.
        model: Arc<Model>,
    },
    /// A model left the collection.
    Remove {
        /// The removed model.
        model: Arc<Model>,
    },
    /// A remotely added record was inserted.
    Create {
        /// The inserted record.
        record: Record,
        /// Origin of the store change.
        origin: Origin,
    },
    /// A remotely updated record was merged.
    Update {
        /// The merged record.
        record: Record,
        /// Origin of the store change.
        origin: Origin,
    },
    /// A store call for the collection succeeded.
    Sync {
        /// The method that completed.
        method: Method,
    },
}

/// Handle returned by [`Observers::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener<E> = Arc<dyn Fn(&E) + Send + Sync>;

/// Typed listener registry.
///
/// Listeners are invoked outside the registry lock, so they may subscribe
/// and unsubscribe while an event is being delivered.
pub struct Observers<E> {
    listeners: RwLock<Vec<(ListenerId, Listener<E>)>>,
    next_id: AtomicU64,
}

impl<E> Observers<E> {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            listeners: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Registers a listener.
    pub fn subscribe<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&E) + Send + Sync + 'static,
    {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::SeqCst));
        self.listeners.write().push((id, Arc::new(listener)));
        id
    }

    /// Removes a listener. Returns false if it was not registered.
    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.write();
        let before = listeners.len();
        listeners.retain(|(existing, _)| *existing != id);
        listeners.len() != before
    }

    /// Delivers an event to every listener.
    pub fn emit(&self, event: &E) -> usize {
        let listeners: Vec<Listener<E>> = self
            .listeners
            .read()
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();

        for listener in &listeners {
            listener(event);
        }
        listeners.len()
    }

    /// Returns the number of listeners.
    pub fn len(&self) -> usize {
        self.listeners.read().len()
    }

    /// Returns true if nothing is listening.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<E> Default for Observers<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> fmt::Debug for Observers<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observers").field("listeners", &self.len()).finish()
    }
}
