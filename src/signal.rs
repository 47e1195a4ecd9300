//! Completion signalling between the task that starts work and the tasks doing it.
//!
//! A [`WaitGroup`] counts outstanding units of work. Producers register work with
//! [`WaitGroup::add`] before starting it, each unit releases itself exactly once
//! with [`WaitGroup::done`] (or by dropping a [`DoneGuard`]), and any number of
//! waiters park in [`WaitGroup::wait`] until the count drops back to zero.
//!
//! ```rust
//! use lilnas_core::signal::WaitGroup;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let wg = WaitGroup::new();
//! wg.add(1);
//!
//! let guard = wg.guard();
//! tokio::spawn(async move {
//!     let _guard = guard;
//!     // work happens here; the guard releases the unit on every exit path
//! });
//!
//! wg.wait().await;
//! assert_eq!(wg.count(), 0);
//! # }
//! ```

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use tokio::sync::Notify;

/// Counter of pending work that releases every waiter when it reaches zero.
///
/// Clones share the same counter. The group can be reused once it has drained,
/// as long as new work is added before the next `wait`.
#[derive(Clone, Default)]
pub struct WaitGroup {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    pending: AtomicUsize,
    drained: Notify,
}

impl WaitGroup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `n` units of pending work.
    ///
    /// Must happen before the `wait` that is supposed to observe this work.
    ///
    /// # Panics
    ///
    /// Panics if `n` is zero.
    pub fn add(&self, n: usize) {
        assert!(n > 0, "WaitGroup::add requires at least one unit of work");
        self.inner.pending.fetch_add(n, Ordering::AcqRel);
    }

    /// Releases one unit of pending work, waking all waiters if it was the last.
    ///
    /// # Panics
    ///
    /// Panics if there is no pending work left to release. That is always a
    /// double-`done` bug in the caller.
    pub fn done(&self) {
        let previous =
            self.inner
                .pending
                .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1));

        match previous {
            Ok(1) => self.inner.drained.notify_waiters(),
            Ok(_) => {}
            Err(_) => panic!("WaitGroup::done called with no pending work (negative counter)"),
        }
    }

    /// Number of units still pending.
    pub fn count(&self) -> usize {
        self.inner.pending.load(Ordering::Acquire)
    }

    /// Suspends until the pending count is zero.
    ///
    /// Returns immediately when nothing is pending.
    pub async fn wait(&self) {
        loop {
            let drained = self.inner.drained.notified();
            tokio::pin!(drained);
            // Register before checking the counter so a concurrent `done` cannot
            // slip between the check and the await.
            drained.as_mut().enable();

            if self.count() == 0 {
                return;
            }

            drained.await;
        }
    }

    /// Like [`wait`](Self::wait), but gives up after `timeout`.
    ///
    /// Returns `true` if the group drained in time.
    pub async fn wait_timeout(&self, timeout: Duration) -> bool {
        tokio::time::timeout(timeout, self.wait()).await.is_ok()
    }

    /// Returns a guard that calls [`done`](Self::done) once when dropped.
    ///
    /// The unit it releases must already have been registered with `add`.
    pub fn guard(&self) -> DoneGuard {
        DoneGuard {
            group: self.clone(),
        }
    }
}

impl fmt::Debug for WaitGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WaitGroup")
            .field("pending", &self.count())
            .finish()
    }
}

/// Releases one unit of a [`WaitGroup`] when dropped, including during unwinding.
#[must_use = "dropping the guard immediately releases the unit of work"]
#[derive(Debug)]
pub struct DoneGuard {
    group: WaitGroup,
}

impl Drop for DoneGuard {
    fn drop(&mut self) {
        self.group.done();
    }
}
