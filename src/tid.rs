//! Thread identity and the bind/unbind seam.
//!
//! A claim attempt needs two things from its execution environment: pin the
//! running task to the OS thread it is currently on, and read that thread's
//! identity. [`ThreadSource`] is that seam. The production source,
//! [`OsThreads`], runs every claimer on a dedicated `std::thread`, where the
//! pin is inherent and binding reduces to an identity read. The
//! deterministic source, [`VirtualThreads`], models a runtime that
//! multiplexes many claimers onto a bounded set of threads, which is the
//! regime where collisions and give-ups actually occur.

use std::fmt;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// Process-wide allocator for thread identities. Identities are never reused
/// within a process, so a released tid can only reappear by the same thread
/// claiming again.
static NEXT_TID: AtomicU64 = AtomicU64::new(1);

thread_local! {
    static CURRENT_TID: ThreadTid = ThreadTid::allocate();
}

/// Opaque, process-unique identifier for an OS thread.
///
/// Observed, never fabricated, by the claiming protocol: the registry only
/// ever stores values a [`ThreadSource`] handed out. Display renders the
/// underlying integer for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ThreadTid(u64);

impl ThreadTid {
    fn allocate() -> Self {
        Self(NEXT_TID.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the identity of the calling OS thread.
    ///
    /// Stable for the lifetime of the thread; distinct from every other
    /// thread's identity for the lifetime of the process.
    #[must_use]
    pub fn current() -> Self {
        CURRENT_TID.with(|tid| *tid)
    }
}

impl fmt::Display for ThreadTid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Source of OS thread identity for claim attempts.
///
/// `bind` is called with the registry lock held, so identity reads and
/// registrations are serialized process-wide against all sibling claimers;
/// two claimers can never observe the same not-yet-registered thread as
/// available. `unbind` is called after a failed claim, with the lock
/// released.
pub trait ThreadSource: Send + Sync {
    /// Pins the calling task to the OS thread it is currently running on,
    /// for the remainder of this attempt, and returns that thread's
    /// identity.
    fn bind(&self) -> ThreadTid;

    /// Undoes the most recent [`bind`](Self::bind) after a failed claim.
    fn unbind(&self) {}
}

/// Production thread source: one dedicated OS thread per claimer.
///
/// `std::thread` tasks never migrate between OS threads, so the exclusive
/// binding is inherent: `bind` is a read of the calling thread's identity
/// and `unbind` has nothing to undo.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsThreads;

impl ThreadSource for OsThreads {
    fn bind(&self) -> ThreadTid {
        ThreadTid::current()
    }
}

/// Deterministic thread source simulating a bounded, shared thread set.
///
/// Models an execution environment that multiplexes claimers onto `size`
/// OS threads: successive binds rotate over a fixed set of identities, so
/// concurrently probing claimers land on shared threads, collide, and
/// retry exactly as they would under a task-multiplexing runtime. With
/// more claimers than identities, the surplus exhausts its retry budget
/// and gives up.
///
/// The identities handed out here are claim identities only;
/// [`ThreadTid::current`] still reports the dedicated OS thread a claimer
/// runs on.
#[derive(Debug)]
pub struct VirtualThreads {
    tids: Vec<ThreadTid>,
    cursor: AtomicUsize,
}

impl VirtualThreads {
    /// Creates a pool of `size` freshly allocated thread identities.
    ///
    /// # Panics
    /// Panics if `size` is 0.
    #[must_use]
    pub fn new(size: usize) -> Self {
        assert!(size > 0, "virtual thread pool requires at least 1 thread");
        Self {
            tids: (0..size).map(|_| ThreadTid::allocate()).collect(),
            cursor: AtomicUsize::new(0),
        }
    }

    /// The identities this pool hands out, in rotation order.
    #[must_use]
    pub fn tids(&self) -> &[ThreadTid] {
        &self.tids
    }
}

impl ThreadSource for VirtualThreads {
    fn bind(&self) -> ThreadTid {
        let slot = self.cursor.fetch_add(1, Ordering::Relaxed) % self.tids.len();
        self.tids[slot]
    }
}
