//! Threadclaim: run N copies of a worker, each on a distinct OS thread.
//!
//! # Overview
//!
//! Given a worker callback and a fan-out count `n`, this crate runs `n`
//! concurrent instances of the worker such that no two concurrently live
//! instances ever share an OS thread. CPU-bound workers that would otherwise
//! contend for cache lines or scheduler quantum on a shared thread each get a
//! thread of their own.
//!
//! The core is a claiming protocol rather than a pool: every worker instance
//! is wrapped in a claimer that binds to the OS thread it is running on,
//! registers that thread's identity in a shared registry, and only proceeds
//! if no sibling already holds it. A claimer that cannot find a free thread
//! within its retry budget gives up, logs a warning, and signals completion
//! without running the worker.
//!
//! # Core Guarantees
//!
//! - **Thread distinctness**: no two concurrently running workers spawned by
//!   one [`distribute()`] call share an OS thread identity
//! - **Atomic claims**: the free-check and the registration are one step
//!   under a single lock; two claimers can never both observe the same
//!   thread as free
//! - **Bounded completion**: every claimer signals the [`CompletionLatch`]
//!   exactly once, whether it ran the worker or gave up, so `wait` always
//!   returns
//! - **Bounded retries**: a claimer attempts at most `retry_multiplier × n`
//!   claims before giving up
//!
//! # The Sharp Edge
//!
//! A claimer that exhausts its retry budget skips the worker *silently*: the
//! latch still releases and no error is returned. The only signal is a WARN
//! log line. Callers that need to know how many workers actually ran must
//! count invocations themselves.
//!
//! # Module Structure
//!
//! - [`tid`]: thread identity and the bind/unbind seam ([`ThreadSource`])
//! - [`registry`]: the mutex-guarded claim set
//! - [`latch`]: counting completion barrier
//! - [`mod@distribute`]: the distributor and the [`distribute()`]/[`fill()`]
//!   entry points
//! - [`error`]: the single (internal) failure kind
//!
//! # Example
//!
//! ```
//! let latch = threadclaim::distribute(3, || {
//!     // CPU-bound work; runs on a thread no sibling shares
//! });
//! latch.wait();
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::module_name_repetitions)]

pub mod distribute;
pub mod error;
pub mod latch;
pub mod registry;
pub mod tid;

mod claimer;

pub use distribute::{distribute, fill, DistributeOptions, Distributor};
pub use error::ClaimExhausted;
pub use latch::CompletionLatch;
pub use registry::ThreadRegistry;
pub use tid::{OsThreads, ThreadSource, ThreadTid, VirtualThreads};
