use std::time::Duration;

use rand::Rng;

use crate::config::Config;

/// Exponential backoff with symmetric jitter, clamped to `[base, max]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BackoffPolicy {
    base: Duration,
    max: Duration,
    /// Fraction of the raw delay used as the jitter amplitude.
    jitter: f64,
}

impl BackoffPolicy {
    pub const DEFAULT_JITTER: f64 = 0.2;

    pub fn new(base: Duration, max: Duration) -> Self {
        Self {
            base,
            max: max.max(base),
            jitter: Self::DEFAULT_JITTER,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            Duration::from_millis(config.retry_backoff_base_ms),
            Duration::from_millis(config.retry_backoff_max_ms),
        )
    }

    pub fn with_jitter(mut self, jitter: f64) -> Self {
        self.jitter = jitter.clamp(0.0, 1.0);
        self
    }

    /// Delay before the retry following failed attempt `attempt` (0-based).
    pub fn delay(&self, attempt: u32) -> Duration {
        let unit = rand::thread_rng().gen_range(-1.0..=1.0);
        self.delay_with(attempt, unit)
    }

    /// Deterministic form of [`delay`](Self::delay): `unit` in `[-1, 1]`
    /// selects where in the jitter band the result lands.
    pub fn delay_with(&self, attempt: u32, unit: f64) -> Duration {
        let base_ms = self.base.as_millis() as f64;
        let max_ms = self.max.as_millis() as f64;

        let raw = base_ms * 2f64.powi(attempt.min(32) as i32);
        let jittered = raw + raw * self.jitter * unit.clamp(-1.0, 1.0);
        let clamped = jittered.clamp(base_ms, max_ms);

        Duration::from_millis(clamped.round() as u64)
    }
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self::new(Duration::from_millis(50), Duration::from_millis(1000))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn doubles_per_attempt_without_jitter() {
        let policy = BackoffPolicy::default();
        assert_eq!(policy.delay_with(0, 0.0), Duration::from_millis(50));
        assert_eq!(policy.delay_with(1, 0.0), Duration::from_millis(100));
        assert_eq!(policy.delay_with(3, 0.0), Duration::from_millis(400));
    }

    #[test]
    fn jitter_is_twenty_percent() {
        let policy = BackoffPolicy::default();
        assert_eq!(policy.delay_with(2, 1.0), Duration::from_millis(240));
        assert_eq!(policy.delay_with(2, -1.0), Duration::from_millis(160));
    }

    #[test]
    fn clamped_to_base_and_ceiling() {
        let policy = BackoffPolicy::default();
        assert_eq!(policy.delay_with(0, -1.0), Duration::from_millis(50));
        assert_eq!(policy.delay_with(10, 1.0), Duration::from_millis(1000));
        assert_eq!(policy.delay_with(u32::MAX, 0.0), Duration::from_millis(1000));
    }

    #[test]
    fn random_delays_stay_in_bounds() {
        let policy = BackoffPolicy::default();
        for attempt in 0..8 {
            let delay = policy.delay(attempt);
            assert!(delay >= Duration::from_millis(50));
            assert!(delay <= Duration::from_millis(1000));
        }
    }
}
