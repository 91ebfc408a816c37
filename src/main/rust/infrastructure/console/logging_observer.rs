use crate::domain::ports::RegistryObserver;
use crate::domain::value_objects::BridgeSummary;

/// Logs the bridge table whenever it changes
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingObserver;

impl RegistryObserver for LoggingObserver {
    fn registry_changed(&self, bridges: &[BridgeSummary]) {
        tracing::info!(count = bridges.len(), "Bridge list changed");
        for bridge in bridges {
            tracing::debug!(
                bridge = %bridge.bridge_name,
                direction = %bridge.direction,
                source = %bridge.source_name,
                color_space = %bridge.color_space,
                state = %bridge.state,
                "Bridge"
            );
        }
    }
}
