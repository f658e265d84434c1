//! Counting completion barrier.

use parking_lot::{Condvar, Mutex};
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Completion barrier for one `distribute` call.
///
/// Initialized to the fan-out count before any claimer is spawned and
/// decremented exactly once per claimer on either terminal path, whether
/// the worker ran or the claimer gave up. [`wait`](Self::wait) blocks the
/// caller until the count reaches zero.
///
/// Handles are cheap clones sharing one counter.
#[derive(Clone)]
pub struct CompletionLatch {
    inner: Arc<LatchInner>,
}

struct LatchInner {
    remaining: Mutex<usize>,
    cvar: Condvar,
}

impl CompletionLatch {
    pub(crate) fn new(count: usize) -> Self {
        Self {
            inner: Arc::new(LatchInner {
                remaining: Mutex::new(count),
                cvar: Condvar::new(),
            }),
        }
    }

    /// Records one claimer reaching a terminal state.
    pub(crate) fn count_down(&self) {
        let mut remaining = self.inner.remaining.lock();
        debug_assert!(*remaining > 0, "latch signalled more often than its count");
        *remaining = remaining.saturating_sub(1);
        if *remaining == 0 {
            self.inner.cvar.notify_all();
        }
    }

    /// Blocks until every claimer has reached a terminal state.
    ///
    /// Returns immediately if the count is already zero. A claimer that
    /// gave up counts as terminal, so this never blocks on skipped
    /// workers.
    pub fn wait(&self) {
        let mut remaining = self.inner.remaining.lock();
        while *remaining > 0 {
            self.inner.cvar.wait(&mut remaining);
        }
    }

    /// Like [`wait`](Self::wait), but gives up after `timeout`.
    ///
    /// Returns `true` if the latch released, `false` if the timeout
    /// elapsed first.
    #[must_use]
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut remaining = self.inner.remaining.lock();
        while *remaining > 0 {
            if self
                .inner
                .cvar
                .wait_until(&mut remaining, deadline)
                .timed_out()
            {
                return *remaining == 0;
            }
        }
        true
    }

    /// Number of claimers not yet terminal.
    #[must_use]
    pub fn pending(&self) -> usize {
        *self.inner.remaining.lock()
    }

    /// Whether every claimer has reached a terminal state.
    #[must_use]
    pub fn is_released(&self) -> bool {
        self.pending() == 0
    }
}

impl fmt::Debug for CompletionLatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompletionLatch")
            .field("pending", &self.pending())
            .finish()
    }
}
