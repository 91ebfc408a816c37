use std::time::{Duration, Instant};

use crate::domain::errors::{DomainError, Result};

const MAX_FRAME_RATE: u32 = 1000;

/// Cadence of the relay pump loop
#[derive(Debug, Clone, PartialEq)]
pub struct PacingPolicy {
    interval: Duration,
    pull_timeout: Duration,
}

impl PacingPolicy {
    /// `pull_timeout` bounds how long a blocking source may wait for a frame
    pub fn new(frame_rate: u32, pull_timeout: Duration) -> Result<Self> {
        if frame_rate == 0 || frame_rate > MAX_FRAME_RATE {
            return Err(DomainError::InvalidFrameRate);
        }

        Ok(Self {
            interval: Duration::from_secs(1) / frame_rate,
            pull_timeout,
        })
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn pull_timeout(&self) -> Duration {
        self.pull_timeout
    }

    /// Time left in the tick that began at `tick_started`
    pub fn remaining(&self, tick_started: Instant) -> Duration {
        self.interval.saturating_sub(tick_started.elapsed())
    }
}

impl Default for PacingPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(16),
            pull_timeout: Duration::from_millis(16),
        }
    }
}
