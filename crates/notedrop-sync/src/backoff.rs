//! Exponential backoff schedule for the retry loop.

use std::time::Duration;

/// Computes wait durations for a bounded retry sequence.
///
/// The delay before retry `n` (zero-indexed) is `base_delay * 2^n`, so a 1s
/// base yields 1s, 2s, 4s, ... The policy is stateless and deterministic; no
/// jitter is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    base_delay: Duration,
}

impl BackoffPolicy {
    /// Creates a policy with the given base delay.
    pub fn new(base_delay: Duration) -> Self {
        Self { base_delay }
    }

    /// The wait before retry `attempt_index` (0 for the first retry).
    ///
    /// Saturates instead of overflowing for absurd attempt counts.
    pub fn delay(&self, attempt_index: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt_index).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor)
    }
}
