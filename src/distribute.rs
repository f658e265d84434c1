//! Fan a worker out across claimers.
//!
//! [`Distributor::distribute`] spawns `n` claimers over one fresh registry
//! and one completion latch; [`fill`] is the convenience entry point that
//! sizes `n` to the process's logical parallelism limit. Both return
//! immediately; callers block on the returned [`CompletionLatch`].

use crate::claimer::Claimer;
use crate::latch::CompletionLatch;
use crate::registry::ThreadRegistry;
use crate::tid::{OsThreads, ThreadSource};
use std::fmt;
use std::sync::Arc;
use std::thread;
use tracing::{debug, info};

/// Default retry-budget multiplier: a claimer in a fan-out of `n` makes at
/// most `1000 × n` claim attempts before giving up. An empirical policy
/// constant, scaled with the fan-out because every sibling it collides with
/// is also probing.
const DEFAULT_RETRY_MULTIPLIER: usize = 1000;

const DEFAULT_THREAD_NAME_PREFIX: &str = "threadclaim";

/// Configuration for a [`Distributor`].
#[derive(Clone)]
pub struct DistributeOptions {
    /// Per-claimer retry budget as a multiple of the fan-out count.
    pub retry_multiplier: usize,
    /// Prefix for claimer thread names (`{prefix}-claimer-{i}`).
    pub thread_name_prefix: String,
    /// Thread source claimers bind through. The default, [`OsThreads`],
    /// gives every claimer a dedicated OS thread.
    pub source: Arc<dyn ThreadSource>,
}

impl DistributeOptions {
    /// Clamp zero-valued fields to usable minimums.
    fn normalize(&mut self) {
        if self.retry_multiplier == 0 {
            self.retry_multiplier = 1;
        }
        if self.thread_name_prefix.is_empty() {
            self.thread_name_prefix = DEFAULT_THREAD_NAME_PREFIX.to_string();
        }
    }
}

impl Default for DistributeOptions {
    fn default() -> Self {
        Self {
            retry_multiplier: DEFAULT_RETRY_MULTIPLIER,
            thread_name_prefix: DEFAULT_THREAD_NAME_PREFIX.to_string(),
            source: Arc::new(OsThreads),
        }
    }
}

impl fmt::Debug for DistributeOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DistributeOptions")
            .field("retry_multiplier", &self.retry_multiplier)
            .field("thread_name_prefix", &self.thread_name_prefix)
            .finish_non_exhaustive()
    }
}

/// Spawns concurrent claimers sharing one registry and one latch.
#[derive(Debug, Default)]
pub struct Distributor {
    options: DistributeOptions,
}

impl Distributor {
    /// Creates a distributor with default options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a distributor with the given options, normalized.
    #[must_use]
    pub fn with_options(mut options: DistributeOptions) -> Self {
        options.normalize();
        Self { options }
    }

    /// Runs `threads` concurrent instances of `worker`, each on a distinct
    /// OS thread.
    ///
    /// Spawns `threads` claimers sharing a fresh registry and a latch
    /// pre-set to `threads`, then returns immediately. No error is
    /// surfaced: a claimer that exhausts its retry budget logs a warning
    /// and skips its worker invocation, but still signals the latch, so
    /// [`CompletionLatch::wait`] always returns once every claimer is
    /// terminal.
    pub fn distribute<F>(&self, threads: usize, worker: F) -> CompletionLatch
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.launch(threads, worker).0
    }

    /// Runs one instance of `worker` per logical CPU.
    ///
    /// Reads the process's logical parallelism limit once, logs the chosen
    /// fan-out, and delegates to [`distribute`](Self::distribute).
    pub fn fill<F>(&self, worker: F) -> CompletionLatch
    where
        F: Fn() + Send + Sync + 'static,
    {
        let threads = logical_parallelism();
        info!(threads, "spawning one worker per logical cpu");
        self.distribute(threads, worker)
    }

    /// [`distribute`](Self::distribute), also exposing the call's registry
    /// so tests can observe the claim set drain.
    pub(crate) fn launch<F>(
        &self,
        threads: usize,
        worker: F,
    ) -> (CompletionLatch, Arc<ThreadRegistry>)
    where
        F: Fn() + Send + Sync + 'static,
    {
        let registry = Arc::new(ThreadRegistry::with_capacity(threads));
        // The latch must carry the full count before the first claimer
        // starts; a fast claimer may otherwise finish before the latch
        // knows it exists.
        let latch = CompletionLatch::new(threads);
        let worker: Arc<dyn Fn() + Send + Sync> = Arc::new(worker);
        let max_attempts = self.options.retry_multiplier.saturating_mul(threads);

        for i in 0..threads {
            let claimer = Claimer {
                registry: Arc::clone(&registry),
                source: Arc::clone(&self.options.source),
                latch: latch.clone(),
                max_attempts,
            };
            let worker = Arc::clone(&worker);
            thread::Builder::new()
                .name(format!("{}-claimer-{i}", self.options.thread_name_prefix))
                .spawn(move || claimer.run(&*worker))
                .expect("failed to spawn claimer thread");
        }

        debug!(threads, max_attempts, "claimers launched");
        (latch, registry)
    }
}

/// Runs `threads` concurrent instances of `worker`, each on a distinct OS
/// thread, with default options.
///
/// See [`Distributor::distribute`]; in particular, a claimer that cannot
/// find a free thread within its retry budget silently skips its worker.
pub fn distribute<F>(threads: usize, worker: F) -> CompletionLatch
where
    F: Fn() + Send + Sync + 'static,
{
    Distributor::new().distribute(threads, worker)
}

/// Runs one instance of `worker` per logical CPU, with default options.
///
/// See [`Distributor::fill`].
pub fn fill<F>(worker: F) -> CompletionLatch
where
    F: Fn() + Send + Sync + 'static,
{
    Distributor::new().fill(worker)
}

/// The process's logical parallelism limit, re-read on every call and
/// clamped to at least 1.
fn logical_parallelism() -> usize {
    thread::available_parallelism().map_or(1, std::num::NonZeroUsize::get)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tid::ThreadTid;
    use parking_lot::Mutex;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Barrier;

    #[test]
    fn three_workers_get_three_distinct_threads() {
        let seen = Arc::new(Mutex::new(HashSet::new()));
        let all_live = Arc::new(Barrier::new(3));

        let (latch, registry) = {
            let seen = Arc::clone(&seen);
            let all_live = Arc::clone(&all_live);
            Distributor::new().launch(3, move || {
                seen.lock().insert(ThreadTid::current());
                // Hold every worker live until all three have claimed, so
                // no thread can be released and re-claimed by a sibling.
                all_live.wait();
            })
        };

        latch.wait();
        assert_eq!(seen.lock().len(), 3);
        assert!(registry.is_empty());
    }

    #[test]
    fn registry_drains_after_wait() {
        let (latch, registry) = Distributor::new().launch(8, || {});
        latch.wait();
        assert!(registry.is_empty());
        assert!(latch.is_released());
    }

    #[test]
    fn zero_fan_out_releases_immediately() {
        let latch = distribute(0, || unreachable!("no claimer should spawn"));
        latch.wait();
        assert!(latch.is_released());
    }

    #[test]
    fn every_claimer_signals_once_with_instant_workers() {
        let invocations = Arc::new(AtomicUsize::new(0));
        let latch = {
            let invocations = Arc::clone(&invocations);
            distribute(16, move || {
                invocations.fetch_add(1, Ordering::Relaxed);
            })
        };

        latch.wait();
        assert_eq!(invocations.load(Ordering::Relaxed), 16);
        assert_eq!(latch.pending(), 0);
    }

    #[test]
    fn fill_matches_the_parallelism_limit() {
        let invocations = Arc::new(AtomicUsize::new(0));
        let latch = {
            let invocations = Arc::clone(&invocations);
            fill(move || {
                invocations.fetch_add(1, Ordering::Relaxed);
            })
        };

        latch.wait();
        assert_eq!(invocations.load(Ordering::Relaxed), logical_parallelism());
    }

    #[test]
    fn options_normalize_clamps_zero_multiplier() {
        let distributor = Distributor::with_options(DistributeOptions {
            retry_multiplier: 0,
            thread_name_prefix: String::new(),
            ..DistributeOptions::default()
        });

        let latch = distributor.distribute(2, || {});
        assert!(latch.wait_timeout(std::time::Duration::from_secs(10)));
    }

    #[test]
    fn claimer_threads_carry_the_configured_prefix() {
        let distributor = Distributor::with_options(DistributeOptions {
            thread_name_prefix: "renamed".to_string(),
            ..DistributeOptions::default()
        });

        let names = Arc::new(Mutex::new(Vec::new()));
        let latch = {
            let names = Arc::clone(&names);
            distributor.distribute(2, move || {
                if let Some(name) = thread::current().name() {
                    names.lock().push(name.to_string());
                }
            })
        };

        latch.wait();
        let names = names.lock();
        assert_eq!(names.len(), 2);
        for name in names.iter() {
            assert!(name.starts_with("renamed-claimer-"), "bad name: {name}");
        }
    }
}
