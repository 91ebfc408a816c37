use std::sync::atomic::{AtomicU64, Ordering};

/// Point-in-time copy of a bridge's relay counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RelayStats {
    pub connect_attempts: u64,
    pub frames_relayed: u64,
    pub missed_pulls: u64,
    pub publish_failures: u64,
    pub send_failures: u64,
}

/// Counters written by the worker thread and read by anyone
#[derive(Debug, Default)]
pub struct RelayCounters {
    connect_attempts: AtomicU64,
    frames_relayed: AtomicU64,
    missed_pulls: AtomicU64,
    publish_failures: AtomicU64,
    send_failures: AtomicU64,
}

impl RelayCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_connect_attempt(&self) {
        self.connect_attempts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_frame_relayed(&self) {
        self.frames_relayed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_missed_pull(&self) {
        self.missed_pulls.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_publish_failure(&self) {
        self.publish_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_send_failure(&self) {
        self.send_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> RelayStats {
        RelayStats {
            connect_attempts: self.connect_attempts.load(Ordering::Relaxed),
            frames_relayed: self.frames_relayed.load(Ordering::Relaxed),
            missed_pulls: self.missed_pulls.load(Ordering::Relaxed),
            publish_failures: self.publish_failures.load(Ordering::Relaxed),
            send_failures: self.send_failures.load(Ordering::Relaxed),
        }
    }
}
