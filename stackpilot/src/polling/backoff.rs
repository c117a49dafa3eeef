//! Poll interval schedule with configurable backoff and jitter.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Backoff strategy for poll intervals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackoffStrategy {
    /// interval = initial * 2^attempt
    #[default]
    Exponential,
    /// interval = initial * (attempt + 1)
    Linear,
    /// interval = initial
    Constant,
}

/// Jitter strategy applied on top of the backoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JitterStrategy {
    /// No jitter
    None,
    /// Random from 0 to interval
    Full,
    /// Half fixed, half random
    #[default]
    Equal,
}

/// Configuration for waiting on a stack transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollConfig {
    /// First interval between describe calls, in milliseconds.
    pub initial_interval_ms: u64,
    /// Interval cap, in milliseconds.
    pub max_interval_ms: u64,
    /// Backoff strategy.
    pub backoff_strategy: BackoffStrategy,
    /// Jitter strategy.
    pub jitter_strategy: JitterStrategy,
    /// Upper bound on the whole wait, in seconds.
    pub timeout_secs: u64,
    /// Consecutive describe failures tolerated before giving up.
    pub max_consecutive_errors: u32,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            initial_interval_ms: 5_000,
            max_interval_ms: 30_000,
            backoff_strategy: BackoffStrategy::Exponential,
            jitter_strategy: JitterStrategy::Equal,
            timeout_secs: 3_600,
            max_consecutive_errors: 3,
        }
    }
}

impl PollConfig {
    /// Creates a new poll config.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the initial interval.
    #[must_use]
    pub fn with_initial_interval_ms(mut self, interval: u64) -> Self {
        self.initial_interval_ms = interval;
        self
    }

    /// Sets the interval cap.
    #[must_use]
    pub fn with_max_interval_ms(mut self, interval: u64) -> Self {
        self.max_interval_ms = interval;
        self
    }

    /// Sets the backoff strategy.
    #[must_use]
    pub fn with_backoff(mut self, strategy: BackoffStrategy) -> Self {
        self.backoff_strategy = strategy;
        self
    }

    /// Sets the jitter strategy.
    #[must_use]
    pub fn with_jitter(mut self, strategy: JitterStrategy) -> Self {
        self.jitter_strategy = strategy;
        self
    }

    /// Sets the overall timeout.
    #[must_use]
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Sets the tolerated number of consecutive describe failures.
    #[must_use]
    pub fn with_max_consecutive_errors(mut self, errors: u32) -> Self {
        self.max_consecutive_errors = errors;
        self
    }

    /// Overall timeout as a duration.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Tracks how many polls have happened and yields the next interval.
#[derive(Debug)]
pub struct PollSchedule<'a> {
    config: &'a PollConfig,
    /// Number of intervals handed out so far.
    pub attempt: u32,
}

impl<'a> PollSchedule<'a> {
    /// Creates a new schedule.
    #[must_use]
    pub const fn new(config: &'a PollConfig) -> Self {
        Self { config, attempt: 0 }
    }

    /// Interval before jitter for the current attempt.
    #[must_use]
    pub fn base_interval(&self) -> u64 {
        let initial = self.config.initial_interval_ms;
        let max = self.config.max_interval_ms;
        let interval = match self.config.backoff_strategy {
            BackoffStrategy::Exponential => {
                initial.saturating_mul(2u64.saturating_pow(self.attempt))
            }
            BackoffStrategy::Linear => initial.saturating_mul(u64::from(self.attempt) + 1),
            BackoffStrategy::Constant => initial,
        };
        interval.min(max)
    }

    /// Returns the next interval and advances the schedule.
    pub fn next_interval(&mut self) -> Duration {
        let interval = self.base_interval();

        let jittered = match self.config.jitter_strategy {
            JitterStrategy::None => interval,
            JitterStrategy::Full => {
                if interval == 0 {
                    0
                } else {
                    rand::thread_rng().gen_range(0..=interval)
                }
            }
            JitterStrategy::Equal => {
                let half = interval / 2;
                if half == 0 {
                    interval
                } else {
                    (interval - half) + rand::thread_rng().gen_range(0..=half)
                }
            }
        };

        self.attempt = self.attempt.saturating_add(1);
        Duration::from_millis(jittered)
    }
}
