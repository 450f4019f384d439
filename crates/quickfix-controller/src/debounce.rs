//! Trailing-edge debounce for search input.
//!
//! Each keystroke schedules a commit; scheduling again before the window
//! elapses aborts the pending commit outright. Only the last keystroke in a
//! burst ever commits, and a controller being torn down cancels whatever is
//! still pending.

use std::future::Future;
use std::sync::Mutex;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::sleep;

/// Schedules at most one pending commit at a time.
pub struct DebouncedSearch {
    window: Duration,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl DebouncedSearch {
    /// A debouncer that waits `window` after the last schedule before
    /// committing.
    #[must_use]
    pub const fn new(window: Duration) -> Self {
        Self {
            window,
            pending: Mutex::new(None),
        }
    }

    /// Schedule `commit` to run once the window elapses, aborting any commit
    /// still pending. Returns `true` when a pending commit was superseded.
    ///
    /// # Panics
    ///
    /// Panics if the pending-task mutex has been poisoned.
    pub fn schedule<F>(&self, commit: F) -> bool
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let window = self.window;
        let handle = tokio::spawn(async move {
            sleep(window).await;
            commit.await;
        });

        let mut pending = self.pending.lock().expect("debounce mutex poisoned");
        pending.replace(handle).is_some_and(|previous| {
            let live = !previous.is_finished();
            previous.abort();
            live
        })
    }

    /// Abort whatever is pending without replacing it.
    ///
    /// # Panics
    ///
    /// Panics if the pending-task mutex has been poisoned.
    pub fn cancel(&self) {
        if let Some(handle) = self
            .pending
            .lock()
            .expect("debounce mutex poisoned")
            .take()
        {
            handle.abort();
        }
    }
}
