//! Reconnection policy.
//!
//! Recovers from unplanned disconnects without user action. The default is
//! bounded exponential backoff with jitter and a terminal give-up; the
//! legacy fixed-interval cadence remains available via [`ReconnectPolicy::fixed`]
//! for callers that want behavioral parity with the original services.

use std::time::Duration;

use rand::Rng;

const DEFAULT_BASE: Duration = Duration::from_secs(1);
const DEFAULT_CAP: Duration = Duration::from_secs(30);
const DEFAULT_MAX_ATTEMPTS: u32 = 10;

/// Delay schedule for reconnect attempts.
#[derive(Debug, Clone)]
pub struct ReconnectPolicy {
    base: Duration,
    cap: Duration,
    max_attempts: Option<u32>,
    jitter: bool,
}

impl ReconnectPolicy {
    /// Fixed delay between attempts, retrying forever.
    pub fn fixed(delay: Duration) -> Self {
        Self {
            base: delay,
            cap: delay,
            max_attempts: None,
            jitter: false,
        }
    }

    /// Exponential backoff doubling from `base` up to `cap`, giving up
    /// after `max_attempts` (or never, when `None`). Jitter is on.
    pub fn backoff(base: Duration, cap: Duration, max_attempts: Option<u32>) -> Self {
        Self {
            base,
            cap,
            max_attempts,
            jitter: true,
        }
    }

    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }

    /// Delay before attempt number `attempt` (0-indexed), or `None` when
    /// the policy has given up.
    pub fn delay_for(&self, attempt: u32) -> Option<Duration> {
        if let Some(max) = self.max_attempts
            && attempt >= max
        {
            return None;
        }

        let exp = self.base.saturating_mul(2u32.saturating_pow(attempt.min(16)));
        let delay = exp.min(self.cap);
        if self.jitter {
            Some(apply_jitter(delay))
        } else {
            Some(delay)
        }
    }
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self::backoff(DEFAULT_BASE, DEFAULT_CAP, Some(DEFAULT_MAX_ATTEMPTS))
    }
}

/// Scale the delay by a random factor in [0.75, 1.25].
fn apply_jitter(delay: Duration) -> Duration {
    let factor = rand::rng().random_range(0.75..=1.25);
    delay.mul_f64(factor)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_policy_returns_same_delay_forever() {
        // given:
        let policy = ReconnectPolicy::fixed(Duration::from_secs(5));

        // when / then:
        assert_eq!(policy.delay_for(0), Some(Duration::from_secs(5)));
        assert_eq!(policy.delay_for(7), Some(Duration::from_secs(5)));
        assert_eq!(policy.delay_for(1000), Some(Duration::from_secs(5)));
    }

    #[test]
    fn test_backoff_doubles_until_cap() {
        // given:
        let policy = ReconnectPolicy::backoff(
            Duration::from_secs(1),
            Duration::from_secs(8),
            None,
        )
        .with_jitter(false);

        // when / then:
        assert_eq!(policy.delay_for(0), Some(Duration::from_secs(1)));
        assert_eq!(policy.delay_for(1), Some(Duration::from_secs(2)));
        assert_eq!(policy.delay_for(2), Some(Duration::from_secs(4)));
        assert_eq!(policy.delay_for(3), Some(Duration::from_secs(8)));
        assert_eq!(policy.delay_for(4), Some(Duration::from_secs(8)));
    }

    #[test]
    fn test_backoff_gives_up_after_max_attempts() {
        // given:
        let policy = ReconnectPolicy::backoff(
            Duration::from_secs(1),
            Duration::from_secs(8),
            Some(3),
        )
        .with_jitter(false);

        // when / then:
        assert!(policy.delay_for(2).is_some());
        assert_eq!(policy.delay_for(3), None);
        assert_eq!(policy.delay_for(10), None);
    }

    #[test]
    fn test_jitter_stays_within_bounds() {
        // given:
        let policy =
            ReconnectPolicy::backoff(Duration::from_secs(4), Duration::from_secs(4), None);

        // when / then:
        for _ in 0..100 {
            let delay = policy.delay_for(0).unwrap();
            assert!(delay >= Duration::from_secs(3));
            assert!(delay <= Duration::from_secs(5));
        }
    }

    #[test]
    fn test_large_attempt_does_not_overflow() {
        // given:
        let policy = ReconnectPolicy::backoff(
            Duration::from_secs(1),
            Duration::from_secs(30),
            None,
        )
        .with_jitter(false);

        // when:
        let delay = policy.delay_for(u32::MAX);

        // then:
        assert_eq!(delay, Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_default_policy_is_bounded() {
        // given:
        let policy = ReconnectPolicy::default();

        // when / then:
        assert!(policy.delay_for(0).is_some());
        assert_eq!(policy.delay_for(DEFAULT_MAX_ATTEMPTS), None);
    }
}
