//! Deferred results of sync operations.

use crate::dispatcher::SyncOutcome;
use crate::error::{SyncError, SyncResult};
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

type BoxFuture = Pin<Box<dyn Future<Output = SyncResult<SyncOutcome>> + Send + 'static>>;

/// How the continuation of a store call is scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Continuation {
    /// Spawn onto the current tokio runtime so the call proceeds whether or
    /// not the deferred is awaited. Falls back to [`Continuation::Lazy`]
    /// outside a runtime.
    #[default]
    Spawn,
    /// Run only while the deferred is polled.
    Lazy,
}

enum Inner {
    Ready(Option<SyncResult<SyncOutcome>>),
    Lazy(BoxFuture),
    Spawned(JoinHandle<SyncResult<SyncOutcome>>),
}

/// An in-flight sync operation.
///
/// Awaiting a deferred yields the outcome after the store has answered, the
/// target has been updated and the caller's callbacks have run. Dropping a
/// spawned deferred does not cancel the operation.
#[must_use = "a lazy deferred does nothing unless awaited"]
pub struct Deferred {
    inner: Inner,
}

impl Deferred {
    /// Creates an already completed deferred.
    pub fn ready(result: SyncResult<SyncOutcome>) -> Self {
        Self {
            inner: Inner::Ready(Some(result)),
        }
    }

    pub(crate) fn start<F>(continuation: Continuation, future: F) -> Self
    where
        F: Future<Output = SyncResult<SyncOutcome>> + Send + 'static,
    {
        let inner = match (continuation, Handle::try_current()) {
            (Continuation::Spawn, Ok(runtime)) => Inner::Spawned(runtime.spawn(future)),
            _ => Inner::Lazy(Box::pin(future)),
        };
        Self { inner }
    }

    /// Returns true if the outcome is available without waiting.
    pub fn is_finished(&self) -> bool {
        match &self.inner {
            Inner::Ready(_) => true,
            Inner::Lazy(_) => false,
            Inner::Spawned(handle) => handle.is_finished(),
        }
    }
}

impl Future for Deferred {
    type Output = SyncResult<SyncOutcome>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match &mut self.inner {
            Inner::Ready(slot) => Poll::Ready(
                slot.take()
                    .unwrap_or_else(|| Err(SyncError::interrupted("deferred polled after completion"))),
            ),
            Inner::Lazy(future) => future.as_mut().poll(cx),
            Inner::Spawned(handle) => Pin::new(handle).poll(cx).map(|joined| {
                joined.unwrap_or_else(|e| Err(SyncError::interrupted(e.to_string())))
            }),
        }
    }
}

impl fmt::Debug for Deferred {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match &self.inner {
            Inner::Ready(_) => "ready",
            Inner::Lazy(_) => "lazy",
            Inner::Spawned(_) => "spawned",
        };
        f.debug_struct("Deferred").field("state", &state).finish()
    }
}
