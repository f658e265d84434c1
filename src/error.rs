//! Error types.

/// A claimer exhausted its retry budget without finding an unclaimed thread.
///
/// This is the crate's only failure kind, and it never crosses the public
/// API: the claimer handles it locally by logging at WARN and signalling the
/// completion latch without running its worker. Callers that need to detect
/// skipped workers must count invocations themselves (see the crate docs,
/// "The Sharp Edge").
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("no unclaimed thread found after {attempts} attempts")]
pub struct ClaimExhausted {
    /// Claim attempts made before giving up.
    pub attempts: usize,
}
