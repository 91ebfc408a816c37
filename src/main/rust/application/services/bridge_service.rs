use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use crate::application::services::{BridgeInstance, BridgeRegistry, CancelFlag, RelaySettings};
use crate::domain::entities::RelayStats;
use crate::domain::errors::{DomainError, Result};
use crate::domain::ports::{MetricsReporter, TransportFactory};
use crate::domain::value_objects::{
    BridgeConfig, BridgeId, BridgeSummary, ColorSpace, Direction, TransportKind,
};

/// Stop flags of bridges still waiting for their connect outcome
#[derive(Default)]
struct PendingStarts {
    closed: bool,
    flags: Vec<CancelFlag>,
}

/// Application service the control surface talks to: create, edit, remove
/// and list bridges.
pub struct BridgeService {
    registry: Arc<BridgeRegistry>,
    transports: Arc<dyn TransportFactory>,
    settings: RelaySettings,
    metrics: Arc<dyn MetricsReporter>,
    discovery_timeout: Duration,
    pending: Mutex<PendingStarts>,
}

impl BridgeService {
    pub fn new(
        registry: Arc<BridgeRegistry>,
        transports: Arc<dyn TransportFactory>,
        settings: RelaySettings,
        metrics: Arc<dyn MetricsReporter>,
    ) -> Self {
        Self {
            registry,
            transports,
            settings,
            metrics,
            discovery_timeout: Duration::from_secs(1),
            pending: Mutex::new(PendingStarts::default()),
        }
    }

    pub fn with_discovery_timeout(mut self, timeout: Duration) -> Self {
        self.discovery_timeout = timeout;
        self
    }

    pub fn registry(&self) -> &Arc<BridgeRegistry> {
        &self.registry
    }

    /// Create and start a bridge (use case)
    pub fn create_bridge(
        &self,
        source_name: impl Into<String>,
        bridge_name: impl Into<String>,
        direction: Direction,
        color_space: ColorSpace,
    ) -> Result<BridgeId> {
        let config = BridgeConfig::new(source_name.into(), bridge_name.into(), direction, color_space)?;
        self.start_bridge(config)
    }

    /// Start a bridge from an already validated configuration.
    /// Nothing is registered unless the bridge reached Running.
    pub fn start_bridge(&self, config: BridgeConfig) -> Result<BridgeId> {
        self.ensure_name_free(&config)?;
        let instance = self.launch(config)?;
        let id = self.registry.add(instance)?;
        self.admit(id)
    }

    /// Replace a bridge with a new configuration, keeping its list position.
    /// The old bridge is stopped first so the replacement can reuse its
    /// published name; it stays removed even if the replacement fails.
    pub fn edit_bridge(&self, id: BridgeId, config: BridgeConfig) -> Result<BridgeId> {
        let index = self
            .registry
            .position(id)
            .ok_or_else(|| DomainError::BridgeNotFound(id.to_string()))?;

        let previous = self.registry.remove_at(index)?;
        self.after_removal(&previous);
        tracing::info!(bridge = %previous.bridge_name, "Bridge stopped for edit");

        self.ensure_name_free(&config)?;
        let instance = self.launch(config)?;
        let id = self.registry.insert_at(index, instance)?;
        self.admit(id)
    }

    /// Stop a bridge and remove it; blocks until it is fully torn down
    pub fn stop_and_remove(&self, id: BridgeId) -> Result<()> {
        let removed = self.registry.remove(id)?;
        self.after_removal(&removed);
        Ok(())
    }

    /// Stop and remove the bridge shown at `index`
    pub fn stop_and_remove_at(&self, index: usize) -> Result<()> {
        let removed = self.registry.remove_at(index)?;
        self.after_removal(&removed);
        Ok(())
    }

    pub fn list_bridges(&self) -> Vec<BridgeSummary> {
        self.registry.enumerate()
    }

    pub fn bridge_stats(&self, id: BridgeId) -> Option<RelayStats> {
        self.registry.stats(id)
    }

    /// Names currently discoverable on `kind`; may be empty
    pub fn discover_sources(&self, kind: TransportKind) -> Vec<String> {
        self.transports.discover_sources(kind, self.discovery_timeout)
    }

    /// Stop every bridge, including ones still connecting.
    /// Later creates fail with `ShuttingDown`.
    pub fn shutdown(&self) {
        {
            let mut pending = self.pending.lock();
            pending.closed = true;
            for flag in &pending.flags {
                flag.request();
            }
        }

        let stopped = self.registry.drain_all();
        for bridge in &stopped {
            self.metrics.report_bridge_removed(&bridge.bridge_name);
        }
        self.metrics.report_active_bridges(0);
        tracing::info!(count = stopped.len(), "All bridges stopped");
    }

    fn is_closed(&self) -> bool {
        self.pending.lock().closed
    }

    /// Keep a freshly registered bridge unless shutdown drained the
    /// registry while it was starting
    fn admit(&self, id: BridgeId) -> Result<BridgeId> {
        if self.is_closed() {
            if let Ok(removed) = self.registry.remove(id) {
                self.metrics.report_bridge_removed(&removed.bridge_name);
            }
            return Err(DomainError::ShuttingDown);
        }
        self.metrics.report_active_bridges(self.registry.len());
        Ok(id)
    }

    fn track_start(&self) -> Result<CancelFlag> {
        let mut pending = self.pending.lock();
        if pending.closed {
            return Err(DomainError::ShuttingDown);
        }
        let flag = CancelFlag::new();
        pending.flags.push(flag.clone());
        Ok(flag)
    }

    fn untrack_start(&self, flag: &CancelFlag) {
        self.pending.lock().flags.retain(|pending| !pending.same_as(flag));
    }

    fn ensure_name_free(&self, config: &BridgeConfig) -> Result<()> {
        let sink_kind = config.direction().sink_kind();
        if self.registry.contains_published(sink_kind, config.bridge_name()) {
            return Err(DomainError::DuplicateBridgeName(config.bridge_name().to_string()));
        }
        Ok(())
    }

    fn launch(&self, config: BridgeConfig) -> Result<BridgeInstance> {
        tracing::info!(
            bridge = %config.bridge_name(),
            source = %config.source_name(),
            direction = %config.direction(),
            color_space = %config.color_space(),
            "Starting bridge"
        );

        let bridge_name = config.bridge_name().to_string();
        let cancel = self.track_start()?;
        let started = BridgeInstance::start_with_cancel(
            config,
            self.transports.as_ref(),
            &self.settings,
            self.metrics.clone(),
            cancel.clone(),
        );
        self.untrack_start(&cancel);

        started.map_err(|e| {
            tracing::warn!(bridge = %bridge_name, error = %e, "Bridge failed to start");
            self.metrics.report_bridge_removed(&bridge_name);
            e
        })
    }

    fn after_removal(&self, removed: &BridgeSummary) {
        self.metrics.report_bridge_removed(&removed.bridge_name);
        self.metrics.report_active_bridges(self.registry.len());
        tracing::info!(bridge = %removed.bridge_name, state = %removed.state, "Bridge removed");
    }
}
