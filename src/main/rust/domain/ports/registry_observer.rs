use crate::domain::value_objects::BridgeSummary;

/// Port notified whenever the set of bridges changes, so a display can refresh
pub trait RegistryObserver: Send + Sync {
    fn registry_changed(&self, bridges: &[BridgeSummary]);
}
