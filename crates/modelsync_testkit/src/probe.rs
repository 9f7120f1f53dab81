//! Callback probes.
//!
//! A [`CallbackProbe`] hands out success and error callbacks and counts
//! how often each one fired.

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct Counts {
    successes: AtomicUsize,
    errors: AtomicUsize,
    last_error: Mutex<Option<String>>,
}

/// Counts success and error callback invocations.
///
/// Clones share their counts.
#[derive(Clone, Default)]
pub struct CallbackProbe {
    counts: Arc<Counts>,
}

impl CallbackProbe {
    /// Creates a probe with zero counts.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a success callback bumping this probe.
    pub fn success<T: ?Sized>(&self) -> impl FnOnce(&T) + Send + 'static {
        let counts = Arc::clone(&self.counts);
        move |_| {
            counts.successes.fetch_add(1, Ordering::SeqCst);
        }
    }

    /// Returns an error callback bumping this probe and keeping the error's
    /// text.
    pub fn error<E: fmt::Display + ?Sized>(&self) -> impl FnOnce(&E) + Send + 'static {
        let counts = Arc::clone(&self.counts);
        move |error| {
            counts.errors.fetch_add(1, Ordering::SeqCst);
            if let Ok(mut last) = counts.last_error.lock() {
                *last = Some(error.to_string());
            }
        }
    }

    /// Returns how often a success callback fired.
    pub fn successes(&self) -> usize {
        self.counts.successes.load(Ordering::SeqCst)
    }

    /// Returns how often an error callback fired.
    pub fn errors(&self) -> usize {
        self.counts.errors.load(Ordering::SeqCst)
    }

    /// Returns the text of the last error seen.
    pub fn last_error(&self) -> Option<String> {
        self.counts
            .last_error
            .lock()
            .ok()
            .and_then(|last| last.clone())
    }
}

impl fmt::Debug for CallbackProbe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackProbe")
            .field("successes", &self.successes())
            .field("errors", &self.errors())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_counts() {
        let probe = CallbackProbe::new();
        let clone = probe.clone();

        (clone.success::<str>())("done");
        (clone.error::<str>())("boom");

        assert_eq!(probe.successes(), 1);
        assert_eq!(probe.errors(), 1);
        assert_eq!(probe.last_error().as_deref(), Some("boom"));
    }
}
