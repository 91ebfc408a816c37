use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::{debug, error, info, trace, warn};

use crate::domain::entities::{BridgeLifecycle, RelayCounters, RelayStats};
use crate::domain::errors::{DomainError, Result};
use crate::domain::ports::{FrameSink, FrameSource, MetricsReporter, PullOutcome, TransportFactory};
use crate::domain::services::PixelConverter;
use crate::domain::value_objects::{
    BridgeConfig, BridgeId, BridgeState, BridgeSummary, ColorSpace, ConnectRetryPolicy, Direction,
    PacingPolicy, Resolution, VideoFrame,
};

/// Longest uninterrupted sleep of a worker; bounds cancellation latency
const CANCEL_POLL_SLICE: Duration = Duration::from_millis(5);

/// Timing knobs shared by every bridge a service starts
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RelaySettings {
    pub retry: ConnectRetryPolicy,
    pub pacing: PacingPolicy,
}

/// Cooperative stop flag. Stores use Release and loads use Acquire, so
/// everything the requesting thread did before `request` is visible to the
/// worker once it observes the flag.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_requested(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    /// Whether both flags are the same shared flag
    pub fn same_as(&self, other: &CancelFlag) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Sleep for `duration` unless cancelled first; returns false if cancelled
    pub fn sleep(&self, duration: Duration) -> bool {
        let deadline = Instant::now() + duration;
        loop {
            if self.is_requested() {
                return false;
            }
            let left = deadline.saturating_duration_since(Instant::now());
            if left.is_zero() {
                return true;
            }
            thread::sleep(left.min(CANCEL_POLL_SLICE));
        }
    }
}

/// The source/sink pair a worker owns for its whole life
struct Endpoints {
    source: Box<dyn FrameSource>,
    sink: Box<dyn FrameSink>,
}

impl Endpoints {
    fn acquire(config: &BridgeConfig, transports: &dyn TransportFactory) -> Result<Self> {
        let direction = config.direction();
        let source = transports.acquire_source(direction.source_kind())?;
        let sink = transports.acquire_sink(direction.sink_kind(), config.color_space())?;
        Ok(Self { source, sink })
    }

    /// Release in reverse acquisition order
    fn release(self) {
        let Self { source, sink } = self;
        drop(sink);
        drop(source);
    }
}

/// State shared between a bridge and its worker thread
struct RelayWorker {
    config: BridgeConfig,
    settings: RelaySettings,
    cancel: CancelFlag,
    lifecycle: Arc<Mutex<BridgeLifecycle>>,
    counters: Arc<RelayCounters>,
    metrics: Arc<dyn MetricsReporter>,
}

impl RelayWorker {
    fn run(self, mut endpoints: Endpoints, ready: Sender<Result<()>>) {
        let bridge = self.config.bridge_name().to_string();

        self.transition(BridgeLifecycle::transition_to_connecting);
        let resolution = match self.connect(endpoints.source.as_mut()) {
            Ok(resolution) => resolution,
            Err(e) => {
                warn!(bridge = %bridge, error = %e, "Bridge failed to connect");
                endpoints.release();
                let reason = e.to_string();
                self.transition(|l| l.transition_to_failed(Some(reason)));
                let _ = ready.send(Err(e));
                return;
            }
        };

        info!(
            bridge = %bridge,
            source = %self.config.source_name(),
            resolution = %resolution,
            "Bridge running"
        );
        self.transition(BridgeLifecycle::transition_to_running);
        let _ = ready.send(Ok(()));
        drop(ready);

        self.pump(&mut endpoints, resolution);

        self.transition(BridgeLifecycle::transition_to_stopping);
        endpoints.release();
        self.transition(BridgeLifecycle::transition_to_stopped);
        info!(bridge = %bridge, "Bridge stopped");
    }

    fn connect(&self, source: &mut dyn FrameSource) -> Result<Resolution> {
        let policy = &self.settings.retry;
        let name = self.config.source_name();
        let mut attempts = 0;

        while policy.has_attempts_left(attempts) {
            if self.cancel.is_requested() {
                return Err(DomainError::ConnectFailed(format!(
                    "cancelled while connecting to {}",
                    name
                )));
            }

            attempts += 1;
            let attempt_started = Instant::now();
            self.counters.record_connect_attempt();
            self.metrics.report_connect_attempt(self.config.bridge_name());

            match source.try_connect(name, policy.interval()) {
                Ok(resolution) if resolution.is_empty() => {
                    return Err(DomainError::ConnectFailed(format!(
                        "{} reported an empty resolution {}",
                        name, resolution
                    )));
                }
                Ok(resolution) => return Ok(resolution),
                Err(e) => {
                    debug!(source = %name, attempt = attempts, error = %e, "Connect attempt failed");
                }
            }

            if policy.has_attempts_left(attempts)
                && !self.cancel.sleep(policy.remaining(attempt_started))
            {
                break;
            }
        }

        if self.cancel.is_requested() {
            return Err(DomainError::ConnectFailed(format!(
                "cancelled while connecting to {}",
                name
            )));
        }
        Err(DomainError::ConnectFailed(format!(
            "{} not reachable after {} attempts",
            name, attempts
        )))
    }

    fn pump(&self, endpoints: &mut Endpoints, resolution: Resolution) {
        let mut frame = VideoFrame::new(resolution);
        let converter = PixelConverter::new(
            endpoints.source.pixel_layout(),
            self.config.color_space(),
        );

        while !self.cancel.is_requested() {
            let tick_started = Instant::now();

            match endpoints.source.pull_frame(&mut frame) {
                Ok(PullOutcome::Filled) => {
                    self.relay(endpoints.sink.as_mut(), &mut frame, &converter)
                }
                Ok(PullOutcome::Empty) => self.missed_pull(),
                Err(e) => {
                    trace!(bridge = %self.config.bridge_name(), error = %e, "Pull failed");
                    self.missed_pull();
                }
            }

            self.cancel.sleep(self.settings.pacing.remaining(tick_started));
        }
    }

    fn relay(&self, sink: &mut dyn FrameSink, frame: &mut VideoFrame, converter: &PixelConverter) {
        let bridge = self.config.bridge_name();
        let resolution = frame.resolution();
        if resolution.is_empty() {
            self.missed_pull();
            return;
        }

        let len = converter.convert(frame);

        if let Err(e) = sink.ensure_published(bridge, resolution) {
            debug!(bridge = %bridge, error = %e, "Publish failed, dropping frame");
            self.counters.record_publish_failure();
            self.metrics.report_send_failure(bridge);
            return;
        }

        match sink.push_frame(&frame.data()[..len], resolution) {
            Ok(()) => {
                self.counters.record_frame_relayed();
                self.metrics.report_frame_relayed(bridge, len);
            }
            Err(e) => {
                debug!(bridge = %bridge, error = %e, "Send failed, dropping frame");
                self.counters.record_send_failure();
                self.metrics.report_send_failure(bridge);
            }
        }
    }

    fn missed_pull(&self) {
        self.counters.record_missed_pull();
        self.metrics.report_missed_pull(self.config.bridge_name());
    }

    fn transition(&self, apply: impl FnOnce(&mut BridgeLifecycle)) {
        let state = {
            let mut lifecycle = self.lifecycle.lock();
            apply(&mut lifecycle);
            lifecycle.current_state()
        };
        debug!(bridge = %self.config.bridge_name(), state = %state, "Bridge state changed");
        self.metrics.report_state_change(self.config.bridge_name(), state);
    }
}

/// One running relay between a source endpoint and a published sink.
///
/// Dropping a bridge cancels its worker and blocks until it has joined.
pub struct BridgeInstance {
    id: BridgeId,
    config: BridgeConfig,
    lifecycle: Arc<Mutex<BridgeLifecycle>>,
    counters: Arc<RelayCounters>,
    cancel: CancelFlag,
    worker: Option<JoinHandle<()>>,
    metrics: Arc<dyn MetricsReporter>,
}

impl BridgeInstance {
    /// Acquire transport handles, spawn the worker and wait until it is
    /// either relaying or has given up. Only a running bridge is returned.
    pub fn start(
        config: BridgeConfig,
        transports: &dyn TransportFactory,
        settings: &RelaySettings,
        metrics: Arc<dyn MetricsReporter>,
    ) -> Result<Self> {
        Self::start_with_cancel(config, transports, settings, metrics, CancelFlag::new())
    }

    /// Like [`BridgeInstance::start`], with a caller-held stop flag.
    /// Requesting `cancel` while the worker is still connecting makes the
    /// start fail with `ConnectFailed`.
    pub fn start_with_cancel(
        config: BridgeConfig,
        transports: &dyn TransportFactory,
        settings: &RelaySettings,
        metrics: Arc<dyn MetricsReporter>,
        cancel: CancelFlag,
    ) -> Result<Self> {
        let mut instance = Self {
            id: BridgeId::new(),
            config,
            lifecycle: Arc::new(Mutex::new(BridgeLifecycle::new())),
            counters: Arc::new(RelayCounters::new()),
            cancel,
            worker: None,
            metrics,
        };

        instance.record(BridgeLifecycle::transition_to_starting);

        let endpoints = match Endpoints::acquire(&instance.config, transports) {
            Ok(endpoints) => endpoints,
            Err(e) => {
                let e = match e {
                    DomainError::HandleAcquisitionFailed(_) => e,
                    other => DomainError::HandleAcquisitionFailed(other.to_string()),
                };
                let reason = e.to_string();
                instance.record(|l| l.transition_to_failed(Some(reason)));
                return Err(e);
            }
        };

        let worker = RelayWorker {
            config: instance.config.clone(),
            settings: settings.clone(),
            cancel: instance.cancel.clone(),
            lifecycle: instance.lifecycle.clone(),
            counters: instance.counters.clone(),
            metrics: instance.metrics.clone(),
        };

        let (ready_tx, ready_rx) = mpsc::channel();
        let handle = thread::Builder::new()
            .name(format!("bridge-{}", instance.id))
            .spawn(move || worker.run(endpoints, ready_tx))
            .map_err(|e| {
                let e = DomainError::HandleAcquisitionFailed(format!("cannot spawn worker: {}", e));
                let reason = e.to_string();
                instance.record(|l| l.transition_to_failed(Some(reason)));
                e
            })?;
        instance.worker = Some(handle);

        match ready_rx.recv() {
            Ok(Ok(())) => Ok(instance),
            Ok(Err(e)) => {
                instance.stop();
                Err(e)
            }
            Err(_) => {
                instance.stop();
                Err(DomainError::HandleAcquisitionFailed(
                    "relay worker exited during startup".to_string(),
                ))
            }
        }
    }

    pub fn id(&self) -> BridgeId {
        self.id
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub fn source_name(&self) -> &str {
        self.config.source_name()
    }

    pub fn bridge_name(&self) -> &str {
        self.config.bridge_name()
    }

    pub fn direction(&self) -> Direction {
        self.config.direction()
    }

    pub fn color_space(&self) -> ColorSpace {
        self.config.color_space()
    }

    pub fn state(&self) -> BridgeState {
        self.lifecycle.lock().current_state()
    }

    /// Every state this bridge has been in, oldest first
    pub fn visited_states(&self) -> Vec<BridgeState> {
        self.lifecycle.lock().visited_states()
    }

    pub fn uptime(&self) -> Option<Duration> {
        self.lifecycle.lock().uptime()
    }

    pub fn stats(&self) -> RelayStats {
        self.counters.snapshot()
    }

    pub fn summary(&self) -> BridgeSummary {
        BridgeSummary {
            id: self.id,
            bridge_name: self.config.bridge_name().to_string(),
            direction: self.config.direction(),
            source_name: self.config.source_name().to_string(),
            color_space: self.config.color_space(),
            state: self.state(),
        }
    }

    /// Ask the worker to stop without waiting for it
    pub fn request_stop(&self) {
        self.cancel.request();
    }

    /// Cancel the worker and block until it has released everything
    pub fn stop(&mut self) {
        let Some(handle) = self.worker.take() else {
            return;
        };

        self.cancel.request();
        if handle.join().is_err() {
            error!(bridge = %self.config.bridge_name(), "Relay worker panicked");
            self.record(|l| l.transition_to_failed(Some("relay worker panicked".to_string())));
        }
    }

    fn record(&self, apply: impl FnOnce(&mut BridgeLifecycle)) {
        let state = {
            let mut lifecycle = self.lifecycle.lock();
            apply(&mut lifecycle);
            lifecycle.current_state()
        };
        self.metrics.report_state_change(self.config.bridge_name(), state);
    }
}

impl Drop for BridgeInstance {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for BridgeInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BridgeInstance")
            .field("id", &self.id)
            .field("config", &self.config)
            .field("state", &self.state())
            .finish()
    }
}
