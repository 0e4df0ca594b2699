//! Wait policy for the polling loop
//!
//! Jittered waits keep the polling cadence unpredictable (the site soft-bans
//! obvious bots); fixed waits bound the request rate after a suspected block
//! or an unexpected fault. Flat random distribution, not exponential backoff.

use crate::config::TimingSettings;
use rand::Rng;
use std::time::Duration;

/// Lower jitter bound when the site returned no dates at all
const NO_SLOTS_MIN_SECONDS: u64 = 5;

/// Lower jitter bound when dates existed but none beat the booked one
const NO_EARLIER_MIN_SECONDS: u64 = 10;

/// Computes how long the loop pauses after each cycle outcome
#[derive(Debug, Clone)]
pub struct WaitPolicy {
    timing: TimingSettings,
}

impl WaitPolicy {
    pub fn new(timing: TimingSettings) -> Self {
        Self { timing }
    }

    /// Jittered wait after an empty result (no slots, or soft rate limit)
    pub fn no_slots_delay(&self) -> Duration {
        self.jitter(NO_SLOTS_MIN_SECONDS)
    }

    /// Jittered wait when no offered date beat the booked one
    pub fn no_earlier_delay(&self) -> Duration {
        self.jitter(NO_EARLIER_MIN_SECONDS)
    }

    /// Fixed wait after a rejected reschedule
    pub fn cooldown_delay(&self) -> Duration {
        Duration::from_secs(self.timing.cooldown_seconds)
    }

    /// Fixed wait after an unexpected fault
    pub fn exception_delay(&self) -> Duration {
        Duration::from_secs(self.timing.exception_seconds)
    }

    /// Uniform random seconds in `[min, retry_seconds]`; degenerates to
    /// `min` when the configured ceiling sits below it.
    fn jitter(&self, min_seconds: u64) -> Duration {
        let max_seconds = self.timing.retry_seconds.max(min_seconds);
        Duration::from_secs(rand::thread_rng().gen_range(min_seconds..=max_seconds))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(retry_seconds: u64) -> WaitPolicy {
        WaitPolicy::new(TimingSettings {
            retry_seconds,
            ..TimingSettings::default()
        })
    }

    #[test]
    fn test_no_slots_delay_stays_in_range() {
        let policy = policy(30);
        for _ in 0..200 {
            let delay = policy.no_slots_delay();
            assert!(delay >= Duration::from_secs(5));
            assert!(delay <= Duration::from_secs(30));
        }
    }

    #[test]
    fn test_no_earlier_delay_stays_in_range() {
        let policy = policy(30);
        for _ in 0..200 {
            let delay = policy.no_earlier_delay();
            assert!(delay >= Duration::from_secs(10));
            assert!(delay <= Duration::from_secs(30));
        }
    }

    #[test]
    fn test_jitter_degenerates_when_ceiling_below_floor() {
        let policy = policy(1);
        for _ in 0..50 {
            assert_eq!(policy.no_slots_delay(), Duration::from_secs(5));
            assert_eq!(policy.no_earlier_delay(), Duration::from_secs(10));
        }
    }

    #[test]
    fn test_fixed_delays_come_from_settings() {
        let policy = WaitPolicy::new(TimingSettings {
            cooldown_seconds: 120,
            exception_seconds: 45,
            ..TimingSettings::default()
        });
        assert_eq!(policy.cooldown_delay(), Duration::from_secs(120));
        assert_eq!(policy.exception_delay(), Duration::from_secs(45));
    }
}
