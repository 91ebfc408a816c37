use std::sync::Arc;

use parking_lot::Mutex;

use crate::application::services::BridgeInstance;
use crate::domain::entities::RelayStats;
use crate::domain::errors::{DomainError, Result};
use crate::domain::ports::RegistryObserver;
use crate::domain::value_objects::{BridgeId, BridgeSummary, TransportKind};

/// Ordered collection of running bridges; insertion order is display order.
///
/// The lock is held only while the sequence is mutated or copied. Stopping a
/// removed bridge, which may block on transport teardown, always happens
/// after the lock is released.
#[derive(Default)]
pub struct BridgeRegistry {
    instances: Mutex<Vec<BridgeInstance>>,
    observer: Option<Arc<dyn RegistryObserver>>,
}

impl BridgeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_observer(observer: Arc<dyn RegistryObserver>) -> Self {
        Self {
            instances: Mutex::new(Vec::new()),
            observer: Some(observer),
        }
    }

    /// Append a bridge. A bridge publishing a name already in use is stopped
    /// and rejected.
    pub fn add(&self, instance: BridgeInstance) -> Result<BridgeId> {
        self.insert_at(usize::MAX, instance)
    }

    /// Insert a bridge at `index`, clamped to the current length
    pub fn insert_at(&self, index: usize, instance: BridgeInstance) -> Result<BridgeId> {
        let id = instance.id();
        let outcome = {
            let mut instances = self.instances.lock();
            let sink_kind = instance.direction().sink_kind();
            if Self::publishes(&instances, sink_kind, instance.bridge_name()) {
                Err(instance)
            } else {
                let index = index.min(instances.len());
                instances.insert(index, instance);
                Ok(Self::snapshot(&instances))
            }
        };

        match outcome {
            Ok(snapshot) => {
                self.notify(&snapshot);
                Ok(id)
            }
            Err(mut rejected) => {
                let name = rejected.bridge_name().to_string();
                rejected.stop();
                Err(DomainError::DuplicateBridgeName(name))
            }
        }
    }

    /// Remove the bridge at `index` and block until it has stopped
    pub fn remove_at(&self, index: usize) -> Result<BridgeSummary> {
        let (removed, snapshot) = {
            let mut instances = self.instances.lock();
            if index >= instances.len() {
                return Err(DomainError::IndexOutOfRange {
                    index,
                    len: instances.len(),
                });
            }
            let removed = instances.remove(index);
            (removed, Self::snapshot(&instances))
        };

        Ok(self.finish_removal(removed, &snapshot))
    }

    /// Remove the bridge with `id` and block until it has stopped
    pub fn remove(&self, id: BridgeId) -> Result<BridgeSummary> {
        let (removed, snapshot) = {
            let mut instances = self.instances.lock();
            let index = instances
                .iter()
                .position(|instance| instance.id() == id)
                .ok_or_else(|| DomainError::BridgeNotFound(id.to_string()))?;
            let removed = instances.remove(index);
            (removed, Self::snapshot(&instances))
        };

        Ok(self.finish_removal(removed, &snapshot))
    }

    /// Stop and remove every bridge; returns what was stopped
    pub fn drain_all(&self) -> Vec<BridgeSummary> {
        let mut drained = std::mem::take(&mut *self.instances.lock());

        // cancel all first so the joins overlap
        for instance in &drained {
            instance.request_stop();
        }
        for instance in &mut drained {
            instance.stop();
        }
        let stopped = Self::snapshot(&drained);
        drop(drained);

        if !stopped.is_empty() {
            self.notify(&[]);
        }
        stopped
    }

    pub fn position(&self, id: BridgeId) -> Option<usize> {
        self.instances
            .lock()
            .iter()
            .position(|instance| instance.id() == id)
    }

    /// Whether a bridge already publishes `name` on `kind`
    pub fn contains_published(&self, kind: TransportKind, name: &str) -> bool {
        Self::publishes(&self.instances.lock(), kind, name)
    }

    /// Snapshot of all bridges in display order
    pub fn enumerate(&self) -> Vec<BridgeSummary> {
        Self::snapshot(&self.instances.lock())
    }

    pub fn get(&self, id: BridgeId) -> Option<BridgeSummary> {
        self.instances
            .lock()
            .iter()
            .find(|instance| instance.id() == id)
            .map(BridgeInstance::summary)
    }

    pub fn stats(&self, id: BridgeId) -> Option<RelayStats> {
        self.instances
            .lock()
            .iter()
            .find(|instance| instance.id() == id)
            .map(BridgeInstance::stats)
    }

    pub fn len(&self) -> usize {
        self.instances.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.lock().is_empty()
    }

    fn finish_removal(&self, mut removed: BridgeInstance, snapshot: &[BridgeSummary]) -> BridgeSummary {
        removed.stop();
        let summary = removed.summary();
        drop(removed);
        self.notify(snapshot);
        summary
    }

    fn publishes(instances: &[BridgeInstance], kind: TransportKind, name: &str) -> bool {
        instances
            .iter()
            .any(|instance| instance.direction().sink_kind() == kind && instance.bridge_name() == name)
    }

    fn snapshot(instances: &[BridgeInstance]) -> Vec<BridgeSummary> {
        instances.iter().map(BridgeInstance::summary).collect()
    }

    fn notify(&self, snapshot: &[BridgeSummary]) {
        if let Some(observer) = &self.observer {
            observer.registry_changed(snapshot);
        }
    }
}
