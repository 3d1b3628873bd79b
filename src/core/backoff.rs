//! core::backoff
//!
//! Jittered, capped-linear backoff for the wait loop.
//!
//! The delay before retry `n` (0-indexed) is drawn uniformly from
//! `[0, (min(n, max_attempt) + 1) * step_ms)` milliseconds. With the defaults
//! the ceiling grows by 10ms per attempt and stops at one second.

use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Default per-attempt growth of the delay ceiling, in milliseconds.
pub const DEFAULT_STEP_MS: u64 = 10;

/// Default attempt index at which the ceiling stops growing.
pub const DEFAULT_MAX_ATTEMPT: u32 = 99;

/// Backoff parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Backoff {
    /// Growth of the delay ceiling per attempt, in milliseconds.
    pub step_ms: u64,
    /// Attempt index at which the ceiling is capped.
    pub max_attempt: u32,
}

impl Default for Backoff {
    fn default() -> Self {
        Self {
            step_ms: DEFAULT_STEP_MS,
            max_attempt: DEFAULT_MAX_ATTEMPT,
        }
    }
}

impl Backoff {
    /// Exclusive upper bound of the delay for `attempt`, in milliseconds.
    pub fn ceiling_ms(&self, attempt: u32) -> u64 {
        let capped = u64::from(attempt.min(self.max_attempt));
        (capped + 1).saturating_mul(self.step_ms)
    }

    /// Draw the delay before retry `attempt` from `rng`.
    pub fn delay<R: Rng + ?Sized>(&self, attempt: u32, rng: &mut R) -> Duration {
        let ceiling = self.ceiling_ms(attempt);
        if ceiling == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(rng.random_range(0..ceiling))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn ceiling_grows_linearly_then_caps() {
        let backoff = Backoff::default();
        assert_eq!(backoff.ceiling_ms(0), 10);
        assert_eq!(backoff.ceiling_ms(1), 20);
        assert_eq!(backoff.ceiling_ms(49), 500);
        assert_eq!(backoff.ceiling_ms(99), 1000);
        assert_eq!(backoff.ceiling_ms(100), 1000);
        assert_eq!(backoff.ceiling_ms(u32::MAX), 1000);
    }

    #[test]
    fn zero_step_means_no_delay() {
        let backoff = Backoff {
            step_ms: 0,
            max_attempt: 5,
        };
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(backoff.delay(3, &mut rng), Duration::ZERO);
    }

    #[test]
    fn same_seed_same_delays() {
        let backoff = Backoff::default();
        let mut a = StdRng::seed_from_u64(42);
        let mut b = StdRng::seed_from_u64(42);
        let left: Vec<_> = (0..20).map(|n| backoff.delay(n, &mut a)).collect();
        let right: Vec<_> = (0..20).map(|n| backoff.delay(n, &mut b)).collect();
        assert_eq!(left, right);
    }

    #[test]
    fn first_delay_is_under_step() {
        let backoff = Backoff::default();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..100 {
            assert!(backoff.delay(0, &mut rng) < Duration::from_millis(10));
        }
    }
}
