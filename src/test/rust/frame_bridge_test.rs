use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use frame_bridge::{
    BridgeConfig, BridgeId, BridgeInstance, BridgeRegistry, BridgeService, BridgeState,
    BridgeSummary, CancelFlag, ColorSpace, ConnectRetryPolicy, Direction, DomainError, FrameSink,
    FrameSource, MetricsReporter, NoopMetrics, PacingPolicy, PullOutcome, RegistryObserver, RelaySettings, Resolution,
    TransportFactory, TransportKind, VideoFrame,
};

// Scripted transports

#[derive(Clone)]
struct SourceScript {
    failing_attempts: u32,
    resolution: Arc<Mutex<Resolution>>,
    layout: ColorSpace,
    pixel: [u8; 4],
    deliver: bool,
    // a failing attempt blocks for the whole timeout it was given
    use_full_timeout: bool,
    attempts: Arc<AtomicU32>,
}

impl SourceScript {
    fn new(resolution: Resolution) -> Self {
        Self {
            failing_attempts: 0,
            resolution: Arc::new(Mutex::new(resolution)),
            layout: ColorSpace::Rgba,
            pixel: [10, 20, 30, 255],
            deliver: true,
            use_full_timeout: false,
            attempts: Arc::new(AtomicU32::new(0)),
        }
    }

    fn attempts(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }
}

struct ScriptedSource {
    script: SourceScript,
}

impl FrameSource for ScriptedSource {
    fn try_connect(&mut self, name: &str, timeout: Duration) -> frame_bridge::Result<Resolution> {
        let attempt = self.script.attempts.fetch_add(1, Ordering::SeqCst) + 1;
        if attempt <= self.script.failing_attempts {
            if self.script.use_full_timeout {
                thread::sleep(timeout);
            }
            return Err(DomainError::ConnectFailed(format!("{} not up yet", name)));
        }
        Ok(*self.script.resolution.lock())
    }

    fn pull_frame(&mut self, frame: &mut VideoFrame) -> frame_bridge::Result<PullOutcome> {
        if !self.script.deliver {
            return Ok(PullOutcome::Empty);
        }
        frame.resize(*self.script.resolution.lock());
        for pixel in frame.data_mut().chunks_exact_mut(4) {
            pixel.copy_from_slice(&self.script.pixel);
        }
        Ok(PullOutcome::Filled)
    }

    fn pixel_layout(&self) -> ColorSpace {
        self.script.layout
    }
}

#[derive(Debug, Clone, PartialEq)]
enum SinkEvent {
    Published {
        name: String,
        resolution: Resolution,
    },
    Pushed {
        name: String,
        resolution: Resolution,
        len: usize,
        head: Vec<u8>,
    },
}

#[derive(Clone, Default)]
struct SinkLog(Arc<Mutex<Vec<SinkEvent>>>);

impl SinkLog {
    fn events(&self) -> Vec<SinkEvent> {
        self.0.lock().clone()
    }

    fn pushes_for(&self, name: &str) -> Vec<SinkEvent> {
        self.events()
            .into_iter()
            .filter(|event| matches!(event, SinkEvent::Pushed { name: n, .. } if n == name))
            .collect()
    }
}

struct RecordingSink {
    log: SinkLog,
    fail_publish: bool,
    published: Option<(String, Resolution)>,
}

impl FrameSink for RecordingSink {
    fn ensure_published(&mut self, name: &str, resolution: Resolution) -> frame_bridge::Result<()> {
        if self.fail_publish {
            return Err(DomainError::PublishFailed(name.to_string()));
        }
        let current = Some((name.to_string(), resolution));
        if self.published != current {
            self.log.0.lock().push(SinkEvent::Published {
                name: name.to_string(),
                resolution,
            });
            self.published = current;
        }
        Ok(())
    }

    fn push_frame(&mut self, payload: &[u8], resolution: Resolution) -> frame_bridge::Result<()> {
        let (name, _) = self
            .published
            .clone()
            .ok_or_else(|| DomainError::SendFailed("not published".to_string()))?;
        self.log.0.lock().push(SinkEvent::Pushed {
            name,
            resolution,
            len: payload.len(),
            head: payload.iter().take(8).copied().collect(),
        });
        Ok(())
    }
}

#[derive(Clone)]
struct ScriptedTransports {
    source: SourceScript,
    sink_log: SinkLog,
    fail_acquire: bool,
    fail_publish: bool,
}

impl ScriptedTransports {
    fn new(source: SourceScript) -> Self {
        Self {
            source,
            sink_log: SinkLog::default(),
            fail_acquire: false,
            fail_publish: false,
        }
    }
}

impl TransportFactory for ScriptedTransports {
    fn acquire_source(&self, _kind: TransportKind) -> frame_bridge::Result<Box<dyn FrameSource>> {
        if self.fail_acquire {
            return Err(DomainError::HandleAcquisitionFailed(
                "runtime not available".to_string(),
            ));
        }
        Ok(Box::new(ScriptedSource {
            script: self.source.clone(),
        }))
    }

    fn acquire_sink(
        &self,
        _kind: TransportKind,
        _color_space: ColorSpace,
    ) -> frame_bridge::Result<Box<dyn FrameSink>> {
        Ok(Box::new(RecordingSink {
            log: self.sink_log.clone(),
            fail_publish: self.fail_publish,
            published: None,
        }))
    }

    fn discover_sources(&self, kind: TransportKind, _timeout: Duration) -> Vec<String> {
        match kind {
            TransportKind::SharedMemory => vec!["Arena Out".to_string(), "Touch".to_string()],
            TransportKind::Network => vec!["studio:5960".to_string()],
        }
    }
}

#[derive(Default)]
struct RecordingObserver {
    sizes: Mutex<Vec<usize>>,
}

impl RegistryObserver for RecordingObserver {
    fn registry_changed(&self, bridges: &[BridgeSummary]) {
        self.sizes.lock().push(bridges.len());
    }
}

#[derive(Default)]
struct RecordingMetrics {
    states: Mutex<Vec<BridgeState>>,
    removed: Mutex<Vec<String>>,
}

impl MetricsReporter for RecordingMetrics {
    fn report_state_change(&self, _bridge: &str, state: BridgeState) {
        self.states.lock().push(state);
    }
    fn report_connect_attempt(&self, _bridge: &str) {}
    fn report_frame_relayed(&self, _bridge: &str, _bytes: usize) {}
    fn report_missed_pull(&self, _bridge: &str) {}
    fn report_send_failure(&self, _bridge: &str) {}
    fn report_active_bridges(&self, _count: usize) {}
    fn report_bridge_removed(&self, bridge: &str) {
        self.removed.lock().push(bridge.to_string());
    }
}

// Helpers

fn settings(attempts: u32, interval_ms: u64, frame_rate: u32) -> RelaySettings {
    RelaySettings {
        retry: ConnectRetryPolicy::new(attempts, Duration::from_millis(interval_ms)).unwrap(),
        pacing: PacingPolicy::new(frame_rate, Duration::from_millis(1)).unwrap(),
    }
}

fn fast_settings() -> RelaySettings {
    settings(10, 10, 200)
}

fn service_with(transports: ScriptedTransports, registry: BridgeRegistry) -> BridgeService {
    BridgeService::new(
        Arc::new(registry),
        Arc::new(transports),
        fast_settings(),
        Arc::new(NoopMetrics),
    )
}

fn shm_to_net(source: &str, port: u16, color_space: ColorSpace) -> BridgeConfig {
    BridgeConfig::new(
        source.to_string(),
        format!("0.0.0.0:{}", port),
        Direction::SharedMemoryToNetwork,
        color_space,
    )
    .unwrap()
}

fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(2));
    }
    condition()
}

// Bridge lifecycle

#[test]
fn test_source_found_on_third_attempt_relays_converted_frames() {
    let mut script = SourceScript::new(Resolution::new(640, 480));
    script.failing_attempts = 2;
    script.layout = ColorSpace::Bgra;
    script.pixel = [1, 2, 3, 4];
    let transports = ScriptedTransports::new(script.clone());

    let mut bridge = BridgeInstance::start(
        shm_to_net("Arena Out", 5960, ColorSpace::Rgba),
        &transports,
        &fast_settings(),
        Arc::new(NoopMetrics),
    )
    .unwrap();

    assert_eq!(script.attempts(), 3);
    assert_eq!(bridge.state(), BridgeState::Running);
    assert_eq!(
        bridge.visited_states(),
        vec![
            BridgeState::Created,
            BridgeState::Starting,
            BridgeState::Connecting,
            BridgeState::Running
        ]
    );

    assert!(wait_until(Duration::from_secs(2), || {
        !transports.sink_log.pushes_for("0.0.0.0:5960").is_empty()
    }));

    let events = transports.sink_log.events();
    assert_eq!(
        events[0],
        SinkEvent::Published {
            name: "0.0.0.0:5960".to_string(),
            resolution: Resolution::new(640, 480),
        }
    );
    match &events[1] {
        SinkEvent::Pushed { len, head, .. } => {
            assert_eq!(*len, 640 * 480 * 4);
            assert_eq!(head, &vec![3, 2, 1, 4, 3, 2, 1, 4]);
        }
        other => panic!("expected a push, got {:?}", other),
    }

    bridge.stop();
    assert_eq!(bridge.state(), BridgeState::Stopped);
    assert_eq!(bridge.stats().connect_attempts, 3);
    assert!(bridge.stats().frames_relayed >= 1);
}

#[test]
fn test_retry_budget_is_exact_and_bounded() {
    let mut script = SourceScript::new(Resolution::new(64, 64));
    script.failing_attempts = u32::MAX;
    let transports = ScriptedTransports::new(script.clone());

    let started = Instant::now();
    let result = BridgeInstance::start(
        shm_to_net("Nowhere", 5960, ColorSpace::Rgba),
        &transports,
        &settings(5, 20, 60),
        Arc::new(NoopMetrics),
    );
    let elapsed = started.elapsed();

    assert!(matches!(result, Err(DomainError::ConnectFailed(_))));
    assert_eq!(script.attempts(), 5);
    assert!(elapsed >= Duration::from_millis(80), "waited only {:?}", elapsed);
    assert!(elapsed < Duration::from_millis(80 + 500), "waited {:?}", elapsed);
    assert!(transports.sink_log.events().is_empty());
}

#[test]
fn test_slow_attempts_do_not_stretch_the_retry_window() {
    let mut script = SourceScript::new(Resolution::new(64, 64));
    script.failing_attempts = u32::MAX;
    script.use_full_timeout = true;
    let transports = ScriptedTransports::new(script.clone());

    let started = Instant::now();
    let result = BridgeInstance::start(
        shm_to_net("Sluggish", 5960, ColorSpace::Rgba),
        &transports,
        &settings(10, 50, 60),
        Arc::new(NoopMetrics),
    );
    let elapsed = started.elapsed();

    assert!(matches!(result, Err(DomainError::ConnectFailed(_))));
    assert_eq!(script.attempts(), 10);
    // each attempt and the wait after it share one 50 ms interval
    assert!(elapsed >= Duration::from_millis(450), "waited only {:?}", elapsed);
    assert!(elapsed < Duration::from_millis(500 + 250), "waited {:?}", elapsed);
}

#[test]
fn test_cancel_while_connecting_fails_the_start() {
    let mut script = SourceScript::new(Resolution::new(64, 64));
    script.failing_attempts = u32::MAX;
    let transports = ScriptedTransports::new(script.clone());
    let metrics = Arc::new(RecordingMetrics::default());
    let cancel = CancelFlag::new();

    let canceller = {
        let cancel = cancel.clone();
        let script = script.clone();
        thread::spawn(move || {
            wait_until(Duration::from_secs(2), || script.attempts() >= 2);
            cancel.request();
        })
    };

    let started = Instant::now();
    let result = BridgeInstance::start_with_cancel(
        shm_to_net("Nowhere", 5960, ColorSpace::Rgba),
        &transports,
        &settings(1000, 20, 60),
        metrics.clone(),
        cancel,
    );
    canceller.join().unwrap();

    match result {
        Err(DomainError::ConnectFailed(reason)) => assert!(reason.contains("cancelled"), "{}", reason),
        other => panic!("expected a cancelled connect, got {:?}", other.map(|b| b.state())),
    }
    assert!(started.elapsed() < Duration::from_secs(2));
    assert!(script.attempts() < 1000);
    assert_eq!(metrics.states.lock().last(), Some(&BridgeState::Failed));
}

#[test]
fn test_empty_resolution_fails_connect() {
    let script = SourceScript::new(Resolution::new(0, 480));
    let transports = ScriptedTransports::new(script.clone());

    let result = BridgeInstance::start(
        shm_to_net("Broken", 5960, ColorSpace::Rgba),
        &transports,
        &fast_settings(),
        Arc::new(NoopMetrics),
    );

    assert!(matches!(result, Err(DomainError::ConnectFailed(_))));
    assert_eq!(script.attempts(), 1);
}

#[test]
fn test_stop_is_bounded_by_pacing_interval() {
    let transports = ScriptedTransports::new(SourceScript::new(Resolution::new(16, 16)));
    // 20 fps: the worker spends most of each 50 ms tick asleep
    let mut bridge = BridgeInstance::start(
        shm_to_net("Arena Out", 5960, ColorSpace::Rgba),
        &transports,
        &settings(3, 10, 20),
        Arc::new(NoopMetrics),
    )
    .unwrap();
    thread::sleep(Duration::from_millis(70));

    let started = Instant::now();
    bridge.stop();
    let elapsed = started.elapsed();

    assert!(elapsed < Duration::from_millis(50 + 250), "stop took {:?}", elapsed);
    assert_eq!(bridge.state(), BridgeState::Stopped);
    let states = bridge.visited_states();
    assert_eq!(&states[states.len() - 2..], &[BridgeState::Stopping, BridgeState::Stopped]);
}

#[test]
fn test_resolution_change_republishes_before_push() {
    let script = SourceScript::new(Resolution::new(64, 48));
    let transports = ScriptedTransports::new(script.clone());
    let name = "0.0.0.0:6000";

    let mut bridge = BridgeInstance::start(
        shm_to_net("Arena Out", 6000, ColorSpace::Rgba),
        &transports,
        &fast_settings(),
        Arc::new(NoopMetrics),
    )
    .unwrap();
    assert!(wait_until(Duration::from_secs(2), || {
        !transports.sink_log.pushes_for(name).is_empty()
    }));

    *script.resolution.lock() = Resolution::new(32, 24);
    let resized = Resolution::new(32, 24);
    assert!(wait_until(Duration::from_secs(2), || {
        transports.sink_log.pushes_for(name).iter().any(
            |event| matches!(event, SinkEvent::Pushed { resolution, .. } if *resolution == resized),
        )
    }));
    bridge.stop();

    let events = transports.sink_log.events();
    let republished = events
        .iter()
        .position(|event| matches!(event, SinkEvent::Published { resolution, .. } if *resolution == resized))
        .unwrap();
    let first_resized_push = events
        .iter()
        .position(|event| matches!(event, SinkEvent::Pushed { resolution, .. } if *resolution == resized))
        .unwrap();
    assert!(republished < first_resized_push);

    for event in &events[first_resized_push..] {
        if let SinkEvent::Pushed { len, .. } = event {
            assert_eq!(*len, 32 * 24 * 4);
        }
    }
}

#[test]
fn test_uyvy_bridge_pushes_packed_payload() {
    let mut script = SourceScript::new(Resolution::new(6, 2));
    script.pixel = [255, 255, 255, 255];
    let transports = ScriptedTransports::new(script);
    let name = "0.0.0.0:6001";

    let mut bridge = BridgeInstance::start(
        shm_to_net("Arena Out", 6001, ColorSpace::Uyvy),
        &transports,
        &fast_settings(),
        Arc::new(NoopMetrics),
    )
    .unwrap();
    assert!(wait_until(Duration::from_secs(2), || {
        !transports.sink_log.pushes_for(name).is_empty()
    }));
    bridge.stop();

    match &transports.sink_log.pushes_for(name)[0] {
        SinkEvent::Pushed { len, head, .. } => {
            // 6x2 pixels, two bytes per pixel
            assert_eq!(*len, 24);
            // white: neutral chroma, peak studio-range luma
            assert_eq!(&head[..4], &[128, 235, 128, 235]);
        }
        other => panic!("expected a push, got {:?}", other),
    }
}

#[test]
fn test_empty_pulls_are_counted_not_pushed() {
    let mut script = SourceScript::new(Resolution::new(8, 8));
    script.deliver = false;
    let transports = ScriptedTransports::new(script);

    let mut bridge = BridgeInstance::start(
        shm_to_net("Idle", 6002, ColorSpace::Rgba),
        &transports,
        &fast_settings(),
        Arc::new(NoopMetrics),
    )
    .unwrap();
    assert!(wait_until(Duration::from_secs(2), || bridge.stats().missed_pulls >= 3));
    bridge.stop();

    assert_eq!(bridge.stats().frames_relayed, 0);
    assert!(transports.sink_log.events().is_empty());
}

#[test]
fn test_publish_failures_do_not_stop_the_bridge() {
    let mut transports = ScriptedTransports::new(SourceScript::new(Resolution::new(8, 8)));
    transports.fail_publish = true;

    let mut bridge = BridgeInstance::start(
        shm_to_net("Arena Out", 6003, ColorSpace::Rgba),
        &transports,
        &fast_settings(),
        Arc::new(NoopMetrics),
    )
    .unwrap();
    assert!(wait_until(Duration::from_secs(2), || bridge.stats().publish_failures >= 3));

    assert_eq!(bridge.state(), BridgeState::Running);
    bridge.stop();
    assert_eq!(bridge.stats().frames_relayed, 0);
}

// Service and registry

#[test]
fn test_create_then_remove_scenario() {
    let mut script = SourceScript::new(Resolution::new(640, 480));
    script.failing_attempts = 2;
    let service = service_with(ScriptedTransports::new(script), BridgeRegistry::new());

    let id = service
        .create_bridge(
            "Arena Out",
            "0.0.0.0:5960",
            Direction::SharedMemoryToNetwork,
            ColorSpace::Bgra,
        )
        .unwrap();

    let listed = service.list_bridges();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, id);
    assert_eq!(listed[0].bridge_name, "0.0.0.0:5960");
    assert_eq!(listed[0].source_name, "Arena Out");
    assert_eq!(listed[0].color_space, ColorSpace::Bgra);
    assert_eq!(listed[0].state, BridgeState::Running);

    let started = Instant::now();
    service.stop_and_remove(id).unwrap();
    assert!(started.elapsed() < Duration::from_millis(500));
    assert!(service.list_bridges().is_empty());
    assert!(matches!(
        service.stop_and_remove(id),
        Err(DomainError::BridgeNotFound(_))
    ));
}

#[test]
fn test_failed_create_registers_nothing() {
    let mut script = SourceScript::new(Resolution::new(64, 64));
    script.failing_attempts = u32::MAX;
    let observer = Arc::new(RecordingObserver::default());
    let service = service_with(
        ScriptedTransports::new(script),
        BridgeRegistry::with_observer(observer.clone()),
    );

    let result = service.create_bridge(
        "Nowhere",
        "0.0.0.0:5960",
        Direction::SharedMemoryToNetwork,
        ColorSpace::Rgba,
    );

    assert!(matches!(result, Err(DomainError::ConnectFailed(_))));
    assert!(service.list_bridges().is_empty());
    assert!(observer.sizes.lock().is_empty());
}

#[test]
fn test_acquisition_failure_is_synchronous() {
    let mut transports = ScriptedTransports::new(SourceScript::new(Resolution::new(8, 8)));
    transports.fail_acquire = true;
    let service = service_with(transports, BridgeRegistry::new());

    let result = service.create_bridge(
        "studio:5960",
        "feed",
        Direction::NetworkToSharedMemory,
        ColorSpace::Rgba,
    );

    assert!(matches!(result, Err(DomainError::HandleAcquisitionFailed(_))));
    assert!(service.list_bridges().is_empty());
}

#[test]
fn test_invalid_names_are_rejected_before_starting() {
    let script = SourceScript::new(Resolution::new(8, 8));
    let service = service_with(ScriptedTransports::new(script.clone()), BridgeRegistry::new());

    let result = service.create_bridge(
        "Arena Out",
        "not-an-address",
        Direction::SharedMemoryToNetwork,
        ColorSpace::Rgba,
    );

    assert!(matches!(result, Err(DomainError::InvalidBridgeName(_))));
    assert_eq!(script.attempts(), 0);
}

#[test]
fn test_duplicate_published_name_is_rejected() {
    let service = service_with(
        ScriptedTransports::new(SourceScript::new(Resolution::new(8, 8))),
        BridgeRegistry::new(),
    );

    service
        .create_bridge("studio:5960", "feed", Direction::NetworkToSharedMemory, ColorSpace::Rgba)
        .unwrap();
    let result =
        service.create_bridge("other:5960", "feed", Direction::NetworkToSharedMemory, ColorSpace::Bgra);

    assert!(matches!(result, Err(DomainError::DuplicateBridgeName(_))));
    assert_eq!(service.list_bridges().len(), 1);
    service.shutdown();
}

#[test]
fn test_stopping_one_bridge_leaves_the_other_running() {
    let transports = ScriptedTransports::new(SourceScript::new(Resolution::new(8, 8)));
    let log = transports.sink_log.clone();
    let service = service_with(transports, BridgeRegistry::new());

    let a = service.start_bridge(shm_to_net("A", 7001, ColorSpace::Rgba)).unwrap();
    let b = service.start_bridge(shm_to_net("B", 7002, ColorSpace::Rgba)).unwrap();

    service.stop_and_remove(a).unwrap();
    let pushed_before = log.pushes_for("0.0.0.0:7002").len();
    assert!(wait_until(Duration::from_secs(2), || {
        log.pushes_for("0.0.0.0:7002").len() > pushed_before + 2
    }));

    let listed = service.list_bridges();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, b);
    assert_eq!(listed[0].state, BridgeState::Running);
    service.shutdown();
}

#[test]
fn test_edit_keeps_list_position() {
    let service = service_with(
        ScriptedTransports::new(SourceScript::new(Resolution::new(8, 8))),
        BridgeRegistry::new(),
    );
    let first = service.start_bridge(shm_to_net("A", 7101, ColorSpace::Rgba)).unwrap();
    let middle = service.start_bridge(shm_to_net("B", 7102, ColorSpace::Rgba)).unwrap();
    let last = service.start_bridge(shm_to_net("C", 7103, ColorSpace::Rgba)).unwrap();

    let edited = service
        .edit_bridge(middle, shm_to_net("B2", 7102, ColorSpace::Uyvy))
        .unwrap();

    let ids: Vec<BridgeId> = service.list_bridges().iter().map(|b| b.id).collect();
    assert_eq!(ids, vec![first, edited, last]);
    assert_ne!(edited, middle);
    let listed = service.list_bridges();
    assert_eq!(listed[1].source_name, "B2");
    assert_eq!(listed[1].color_space, ColorSpace::Uyvy);
    service.shutdown();
}

#[test]
fn test_remove_at_out_of_range() {
    let service = service_with(
        ScriptedTransports::new(SourceScript::new(Resolution::new(8, 8))),
        BridgeRegistry::new(),
    );

    assert!(matches!(
        service.stop_and_remove_at(0),
        Err(DomainError::IndexOutOfRange { index: 0, len: 0 })
    ));
}

#[test]
fn test_observer_sees_every_change() {
    let observer = Arc::new(RecordingObserver::default());
    let service = service_with(
        ScriptedTransports::new(SourceScript::new(Resolution::new(8, 8))),
        BridgeRegistry::with_observer(observer.clone()),
    );

    let a = service.start_bridge(shm_to_net("A", 7201, ColorSpace::Rgba)).unwrap();
    service.start_bridge(shm_to_net("B", 7202, ColorSpace::Rgba)).unwrap();
    service.stop_and_remove(a).unwrap();
    service.shutdown();

    assert_eq!(*observer.sizes.lock(), vec![1, 2, 1, 0]);
}

#[test]
fn test_discovery_passes_through() {
    let service = service_with(
        ScriptedTransports::new(SourceScript::new(Resolution::new(8, 8))),
        BridgeRegistry::new(),
    );

    assert_eq!(
        service.discover_sources(TransportKind::SharedMemory),
        vec!["Arena Out".to_string(), "Touch".to_string()]
    );
    assert_eq!(
        service.discover_sources(TransportKind::Network),
        vec!["studio:5960".to_string()]
    );
}

#[test]
fn test_shutdown_stops_everything() {
    let service = service_with(
        ScriptedTransports::new(SourceScript::new(Resolution::new(8, 8))),
        BridgeRegistry::new(),
    );
    for port in 7301..7305 {
        service.start_bridge(shm_to_net("A", port, ColorSpace::Rgba)).unwrap();
    }

    service.shutdown();

    assert!(service.list_bridges().is_empty());
    assert!(service.registry().is_empty());
}

#[test]
fn test_shutdown_interrupts_a_create_in_progress() {
    let mut script = SourceScript::new(Resolution::new(8, 8));
    script.failing_attempts = u32::MAX;
    let service = Arc::new(BridgeService::new(
        Arc::new(BridgeRegistry::new()),
        Arc::new(ScriptedTransports::new(script.clone())),
        settings(1000, 20, 60),
        Arc::new(NoopMetrics),
    ));

    let creating = {
        let service = service.clone();
        thread::spawn(move || service.start_bridge(shm_to_net("Late", 7401, ColorSpace::Rgba)))
    };
    assert!(wait_until(Duration::from_secs(2), || script.attempts() >= 1));

    let started = Instant::now();
    service.shutdown();
    let result = creating.join().unwrap();

    assert!(matches!(result, Err(DomainError::ConnectFailed(_))));
    assert!(started.elapsed() < Duration::from_secs(2));
    assert!(service.list_bridges().is_empty());
    assert!(service.registry().is_empty());

    let after = service.start_bridge(shm_to_net("Later", 7402, ColorSpace::Rgba));
    assert!(matches!(after, Err(DomainError::ShuttingDown)));
    assert!(service.list_bridges().is_empty());
}

#[test]
fn test_removed_bridge_is_reported_to_metrics() {
    let metrics = Arc::new(RecordingMetrics::default());
    let service = BridgeService::new(
        Arc::new(BridgeRegistry::new()),
        Arc::new(ScriptedTransports::new(SourceScript::new(Resolution::new(8, 8)))),
        fast_settings(),
        metrics.clone(),
    );

    let config = shm_to_net("Arena Out", 7501, ColorSpace::Rgba);
    let bridge_name = config.bridge_name().to_string();
    let id = service.start_bridge(config).unwrap();
    service.stop_and_remove(id).unwrap();

    assert_eq!(*metrics.removed.lock(), vec![bridge_name]);
}

#[test]
fn test_concurrent_add_remove_matches_serial_model() {
    let service = Arc::new(service_with(
        ScriptedTransports::new(SourceScript::new(Resolution::new(4, 4))),
        BridgeRegistry::new(),
    ));

    let workers: Vec<_> = (0..4u64)
        .map(|worker| {
            let service = service.clone();
            thread::spawn(move || {
                let mut rng = StdRng::seed_from_u64(0x5eed + worker);
                let mut model: Vec<(BridgeId, String)> = Vec::new();

                for op in 0..16 {
                    if model.is_empty() || rng.random_bool(0.6) {
                        let name = format!("w{}-b{}", worker, op);
                        let id = service
                            .create_bridge(
                                "studio:5960",
                                name.as_str(),
                                Direction::NetworkToSharedMemory,
                                ColorSpace::Rgba,
                            )
                            .unwrap();
                        model.push((id, name));
                    } else {
                        let (id, _) = model.remove(rng.random_range(0..model.len()));
                        service.stop_and_remove(id).unwrap();
                    }
                }
                model
            })
        })
        .collect();

    let expected: BTreeSet<String> = workers
        .into_iter()
        .flat_map(|worker| worker.join().unwrap())
        .map(|(_, name)| name)
        .collect();
    let actual: BTreeSet<String> = service
        .list_bridges()
        .into_iter()
        .map(|bridge| bridge.bridge_name)
        .collect();

    assert_eq!(actual, expected);
    assert_eq!(service.registry().len(), expected.len());
    service.shutdown();
}

#[test]
fn test_bridge_stats_are_exposed() {
    let service = service_with(
        ScriptedTransports::new(SourceScript::new(Resolution::new(8, 8))),
        BridgeRegistry::new(),
    );
    let id = service.start_bridge(shm_to_net("A", 7401, ColorSpace::Rgba)).unwrap();

    assert!(wait_until(Duration::from_secs(2), || {
        service
            .bridge_stats(id)
            .map(|stats| stats.frames_relayed >= 2)
            .unwrap_or(false)
    }));
    assert_eq!(service.bridge_stats(id).unwrap().connect_attempts, 1);

    service.stop_and_remove(id).unwrap();
    assert!(service.bridge_stats(id).is_none());
}

#[cfg(feature = "gstreamer")]
#[test]
fn test_gstreamer_init() {
    assert!(gstreamer::init().is_ok());
}

#[cfg(feature = "gstreamer")]
#[test]
fn test_gstreamer_factory_lists_shared_memory_sockets() {
    use frame_bridge::{GstTransportFactory, TransportSettings};

    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("Arena Out.sock"), b"").unwrap();
    std::fs::write(dir.path().join("notes.txt"), b"").unwrap();
    let factory = GstTransportFactory::new(
        TransportSettings::new(dir.path().to_path_buf(), 1024, Vec::new()),
        Duration::from_millis(16),
    );

    assert_eq!(
        factory.discover_sources(TransportKind::SharedMemory, Duration::from_millis(100)),
        vec!["Arena Out".to_string()]
    );
    assert!(factory
        .discover_sources(TransportKind::Network, Duration::from_millis(100))
        .is_empty());
}
