use lazy_static::lazy_static;
use prometheus::{Encoder, GaugeVec, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};

use crate::domain::ports::MetricsReporter;
use crate::domain::value_objects::BridgeState;

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();

    // Per-bridge state (0=Created .. 4=Stopping, 5=Stopped, 6=Failed)
    pub static ref BRIDGE_STATE: GaugeVec = GaugeVec::new(
        Opts::new("frame_bridge_state", "Current state of each bridge"),
        &["bridge"]
    ).expect("metric can be created");

    pub static ref CONNECT_ATTEMPTS: IntCounterVec = IntCounterVec::new(
        Opts::new("frame_bridge_connect_attempts_total", "Total source connection attempts"),
        &["bridge"]
    ).expect("metric can be created");

    pub static ref FRAMES_RELAYED: IntCounterVec = IntCounterVec::new(
        Opts::new("frame_bridge_frames_relayed_total", "Total frames handed to the sink"),
        &["bridge"]
    ).expect("metric can be created");

    pub static ref BYTES_RELAYED: IntCounterVec = IntCounterVec::new(
        Opts::new("frame_bridge_bytes_relayed_total", "Total payload bytes handed to the sink"),
        &["bridge"]
    ).expect("metric can be created");

    pub static ref MISSED_PULLS: IntCounterVec = IntCounterVec::new(
        Opts::new("frame_bridge_missed_pulls_total", "Ticks where the source had no frame"),
        &["bridge"]
    ).expect("metric can be created");

    pub static ref SEND_FAILURES: IntCounterVec = IntCounterVec::new(
        Opts::new("frame_bridge_send_failures_total", "Frames the sink failed to publish"),
        &["bridge"]
    ).expect("metric can be created");

    pub static ref ACTIVE_BRIDGES: IntGauge = IntGauge::new(
        "frame_bridge_active_bridges",
        "Number of bridges in the registry"
    ).expect("metric can be created");
}

pub struct PrometheusReporter;

impl PrometheusReporter {
    pub fn new() -> Self {
        Self
    }

    pub fn init_metrics() -> Result<(), prometheus::Error> {
        REGISTRY.register(Box::new(BRIDGE_STATE.clone()))?;
        REGISTRY.register(Box::new(CONNECT_ATTEMPTS.clone()))?;
        REGISTRY.register(Box::new(FRAMES_RELAYED.clone()))?;
        REGISTRY.register(Box::new(BYTES_RELAYED.clone()))?;
        REGISTRY.register(Box::new(MISSED_PULLS.clone()))?;
        REGISTRY.register(Box::new(SEND_FAILURES.clone()))?;
        REGISTRY.register(Box::new(ACTIVE_BRIDGES.clone()))?;
        Ok(())
    }

    pub fn gather_metrics() -> Vec<u8> {
        let encoder = TextEncoder::new();
        let metric_families = REGISTRY.gather();
        let mut buffer = vec![];
        if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
            tracing::error!("Failed to encode metrics: {}", e);
            return b"# Error encoding metrics\n".to_vec();
        }
        buffer
    }
}

impl Default for PrometheusReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsReporter for PrometheusReporter {
    fn report_state_change(&self, bridge: &str, state: BridgeState) {
        BRIDGE_STATE.with_label_values(&[bridge]).set(state.as_metric());
    }

    fn report_connect_attempt(&self, bridge: &str) {
        CONNECT_ATTEMPTS.with_label_values(&[bridge]).inc();
    }

    fn report_frame_relayed(&self, bridge: &str, bytes: usize) {
        FRAMES_RELAYED.with_label_values(&[bridge]).inc();
        BYTES_RELAYED.with_label_values(&[bridge]).inc_by(bytes as u64);
    }

    fn report_missed_pull(&self, bridge: &str) {
        MISSED_PULLS.with_label_values(&[bridge]).inc();
    }

    fn report_send_failure(&self, bridge: &str) {
        SEND_FAILURES.with_label_values(&[bridge]).inc();
    }

    fn report_active_bridges(&self, count: usize) {
        ACTIVE_BRIDGES.set(count as i64);
    }

    fn report_bridge_removed(&self, bridge: &str) {
        // a series that was never touched is not an error here
        let _ = BRIDGE_STATE.remove_label_values(&[bridge]);
        for counter in [
            &*CONNECT_ATTEMPTS,
            &*FRAMES_RELAYED,
            &*BYTES_RELAYED,
            &*MISSED_PULLS,
            &*SEND_FAILURES,
        ] {
            let _ = counter.remove_label_values(&[bridge]);
        }
    }
}
