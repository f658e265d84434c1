//! The per-worker claim loop.
//!
//! Each claimer obtains exclusive use of one OS thread, runs exactly one
//! worker invocation on it, and releases the claim. A claimer that cannot
//! find an unclaimed thread within its retry budget gives up: it logs a
//! warning and signals the latch without ever invoking the worker.

use crate::error::ClaimExhausted;
use crate::latch::CompletionLatch;
use crate::registry::ThreadRegistry;
use crate::tid::{ThreadSource, ThreadTid};
use std::sync::Arc;
use std::thread;
use tracing::{debug, trace, warn};

pub(crate) struct Claimer {
    pub(crate) registry: Arc<ThreadRegistry>,
    pub(crate) source: Arc<dyn ThreadSource>,
    pub(crate) latch: CompletionLatch,
    pub(crate) max_attempts: usize,
}

impl Claimer {
    /// Runs the claimer to a terminal state, signalling the latch exactly
    /// once on both paths.
    pub(crate) fn run(self, worker: &(dyn Fn() + Send + Sync)) {
        match self.claim_and_run(worker) {
            Ok(tid) => debug!(%tid, "worker finished, thread released"),
            Err(err) => warn!(
                attempts = err.attempts,
                claimer = thread::current().name().unwrap_or("<unnamed>"),
                "gave up finding an unclaimed thread, worker skipped",
            ),
        }
        self.latch.count_down();
    }

    fn claim_and_run(
        &self,
        worker: &(dyn Fn() + Send + Sync),
    ) -> Result<ThreadTid, ClaimExhausted> {
        for _ in 0..self.max_attempts {
            let Some(tid) = self.registry.claim_current(self.source.as_ref()) else {
                // Collision: a sibling holds this thread. Drop the binding
                // and probe again.
                self.source.unbind();
                continue;
            };
            trace!(%tid, "thread claimed");

            // Yield once so concurrently starting siblings observe this
            // registration before making their own binding decision.
            thread::yield_now();

            worker();
            self.registry.release(tid);
            return Ok(tid);
        }
        Err(ClaimExhausted {
            attempts: self.max_attempts,
        })
    }
}
