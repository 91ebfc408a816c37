use crate::domain::value_objects::BridgeState;

/// Port for metrics reporting
pub trait MetricsReporter: Send + Sync {
    fn report_state_change(&self, bridge: &str, state: BridgeState);
    fn report_connect_attempt(&self, bridge: &str);
    fn report_frame_relayed(&self, bridge: &str, bytes: usize);
    fn report_missed_pull(&self, bridge: &str);
    fn report_send_failure(&self, bridge: &str);
    fn report_active_bridges(&self, count: usize);
    /// The bridge is gone; forget everything reported under its name
    fn report_bridge_removed(&self, bridge: &str);
}

/// Reporter that drops everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopMetrics;

impl MetricsReporter for NoopMetrics {
    fn report_state_change(&self, _bridge: &str, _state: BridgeState) {}
    fn report_connect_attempt(&self, _bridge: &str) {}
    fn report_frame_relayed(&self, _bridge: &str, _bytes: usize) {}
    fn report_missed_pull(&self, _bridge: &str) {}
    fn report_send_failure(&self, _bridge: &str) {}
    fn report_active_bridges(&self, _count: usize) {}
    fn report_bridge_removed(&self, _bridge: &str) {}
}
