use std::time::{Duration, Instant};

use crate::domain::errors::{DomainError, Result};

/// How persistently a bridge tries to reach its source before giving up
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectRetryPolicy {
    max_attempts: u32,
    interval: Duration,
}

impl ConnectRetryPolicy {
    pub fn new(max_attempts: u32, interval: Duration) -> Result<Self> {
        if max_attempts == 0 {
            return Err(DomainError::InvalidRetryPolicy);
        }

        Ok(Self {
            max_attempts,
            interval,
        })
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Wait between two consecutive attempts; also the budget of a single attempt
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Upper bound of the time spent waiting between attempts
    pub fn total_wait(&self) -> Duration {
        self.interval * (self.max_attempts - 1)
    }

    /// Wait still owed after an attempt that began at `attempt_started`.
    /// An attempt and the wait after it together take one interval.
    pub fn remaining(&self, attempt_started: Instant) -> Duration {
        self.interval.saturating_sub(attempt_started.elapsed())
    }

    pub fn has_attempts_left(&self, attempts_made: u32) -> bool {
        attempts_made < self.max_attempts
    }
}

impl Default for ConnectRetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            interval: Duration::from_millis(100),
        }
    }
}
