//! Mutex-guarded registry of claimed thread identities.
//!
//! One registry exists per `distribute` call and lives exactly as long as
//! that call's claimers. Its contents at any instant are the identities of
//! the OS threads hosting an actively running worker; it is not a
//! historical record. Separate calls never share a registry.

use crate::tid::{ThreadSource, ThreadTid};
use parking_lot::Mutex;
use std::collections::HashSet;

/// Set of thread identities currently claimed by a live worker.
///
/// A single lock covers every membership test and mutation, so the
/// "is this thread free" check and the "mark it taken" insert are one
/// atomic step. Operations are total; there is no error surface.
#[derive(Debug)]
pub struct ThreadRegistry {
    claimed: Mutex<HashSet<ThreadTid>>,
}

impl ThreadRegistry {
    /// Creates a registry sized for `threads` concurrent claims.
    #[must_use]
    pub fn with_capacity(threads: usize) -> Self {
        Self {
            claimed: Mutex::new(HashSet::with_capacity(threads)),
        }
    }

    /// Atomically tests whether `tid` is unclaimed and, if so, claims it.
    ///
    /// Returns `true` if the claim was recorded, `false` if a sibling
    /// already holds `tid` (state unchanged).
    pub fn try_claim(&self, tid: ThreadTid) -> bool {
        self.claimed.lock().insert(tid)
    }

    /// Releases `tid` unconditionally.
    pub fn release(&self, tid: ThreadTid) {
        self.claimed.lock().remove(&tid);
    }

    /// Binds the calling task through `source` and claims the bound thread,
    /// all under one lock acquisition.
    ///
    /// The bind happens while the registry lock is held, which serializes
    /// the identity read and the registration against all sibling claimers.
    /// Returns the claimed identity, or `None` on collision; after a
    /// `None`, the caller must undo the bind via
    /// [`ThreadSource::unbind`].
    pub fn claim_current(&self, source: &dyn ThreadSource) -> Option<ThreadTid> {
        let mut claimed = self.claimed.lock();
        let tid = source.bind();
        claimed.insert(tid).then_some(tid)
    }

    /// Number of currently claimed threads.
    #[must_use]
    pub fn len(&self) -> usize {
        self.claimed.lock().len()
    }

    /// Whether no thread is currently claimed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.claimed.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tid::{OsThreads, VirtualThreads};
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn claim_is_exclusive_until_released() {
        let registry = ThreadRegistry::with_capacity(1);
        let tid = ThreadTid::current();

        assert!(registry.try_claim(tid));
        assert!(!registry.try_claim(tid));
        assert_eq!(registry.len(), 1);

        registry.release(tid);
        assert!(registry.is_empty());
        assert!(registry.try_claim(tid));
    }

    #[test]
    fn release_of_unclaimed_tid_is_a_no_op() {
        let registry = ThreadRegistry::with_capacity(1);
        registry.release(ThreadTid::current());
        assert!(registry.is_empty());
    }

    #[test]
    fn claim_current_registers_the_bound_thread() {
        let registry = ThreadRegistry::with_capacity(1);
        let claimed = registry.claim_current(&OsThreads).unwrap();

        assert_eq!(claimed, ThreadTid::current());
        assert!(!registry.try_claim(claimed));
        assert_eq!(registry.claim_current(&OsThreads), None);
    }

    #[test]
    fn concurrent_claims_of_one_shared_identity_admit_one_winner() {
        let registry = Arc::new(ThreadRegistry::with_capacity(1));
        let pool = Arc::new(VirtualThreads::new(1));

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let registry = Arc::clone(&registry);
                let pool = Arc::clone(&pool);
                thread::spawn(move || registry.claim_current(pool.as_ref()))
            })
            .collect();

        let wins = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|r| r.is_some())
            .count();
        assert_eq!(wins, 1);
        assert_eq!(registry.len(), 1);
    }
}
