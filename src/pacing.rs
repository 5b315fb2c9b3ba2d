//! Request pacing policy.
//!
//! A stateless policy consulted by the orchestrator between navigations.
//! Short jittered delays precede listing-detail navigations, a longer one
//! separates result-page fetches, and a fixed extended cooldown follows a
//! rate-limit signal. Jitter is sampled uniformly from a configured range
//! so tests can substitute deterministic values by collapsing the range.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Delay ranges in seconds. Stateless besides these.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PacingPolicy {
    /// Jitter range before each listing-detail navigation.
    pub detail_delay_secs: (f64, f64),
    /// Jitter range between successive listings of one result page.
    pub listing_gap_secs: (f64, f64),
    /// Jitter range between successive result-page fetches.
    pub page_delay_secs: (f64, f64),
    /// Fixed cooldown after a rate-limit signal.
    pub cooldown_secs: u64,
}

impl Default for PacingPolicy {
    fn default() -> Self {
        Self {
            detail_delay_secs: (2.0, 4.0),
            listing_gap_secs: (3.0, 6.0),
            page_delay_secs: (10.0, 15.0),
            cooldown_secs: 30,
        }
    }
}

impl PacingPolicy {
    /// Zeroed policy for tests: every delay is `Duration::ZERO` except the
    /// cooldown, which stays distinguishable at 0 as well.
    #[must_use]
    pub fn zero() -> Self {
        Self {
            detail_delay_secs: (0.0, 0.0),
            listing_gap_secs: (0.0, 0.0),
            page_delay_secs: (0.0, 0.0),
            cooldown_secs: 0,
        }
    }

    #[must_use]
    pub fn detail_delay(&self) -> Duration {
        jittered(self.detail_delay_secs)
    }

    #[must_use]
    pub fn listing_gap(&self) -> Duration {
        jittered(self.listing_gap_secs)
    }

    #[must_use]
    pub fn page_delay(&self) -> Duration {
        jittered(self.page_delay_secs)
    }

    #[must_use]
    pub fn cooldown(&self) -> Duration {
        Duration::from_secs(self.cooldown_secs)
    }
}

/// Uniform sample from `[lo, hi]`; a collapsed or inverted range is treated
/// as the fixed value `lo`.
fn jittered((lo, hi): (f64, f64)) -> Duration {
    let lo = lo.max(0.0);
    if hi <= lo {
        return Duration::from_secs_f64(lo);
    }
    let secs = rand::rng().random_range(lo..=hi);
    Duration::from_secs_f64(secs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jitter_stays_within_the_configured_range() {
        let policy = PacingPolicy::default();
        for _ in 0..200 {
            let d = policy.detail_delay().as_secs_f64();
            assert!((2.0..=4.0).contains(&d), "detail delay out of range: {d}");
            let g = policy.listing_gap().as_secs_f64();
            assert!((3.0..=6.0).contains(&g), "listing gap out of range: {g}");
            let p = policy.page_delay().as_secs_f64();
            assert!((10.0..=15.0).contains(&p), "page delay out of range: {p}");
        }
    }

    #[test]
    fn cooldown_exceeds_every_jittered_delay() {
        let policy = PacingPolicy::default();
        assert!(policy.cooldown() > Duration::from_secs_f64(policy.page_delay_secs.1));
    }

    #[test]
    fn collapsed_range_is_deterministic() {
        let policy = PacingPolicy {
            detail_delay_secs: (1.5, 1.5),
            ..PacingPolicy::default()
        };
        for _ in 0..10 {
            assert_eq!(policy.detail_delay(), Duration::from_secs_f64(1.5));
        }
        assert_eq!(PacingPolicy::zero().page_delay(), Duration::ZERO);
    }
}
