use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tokio::sync::oneshot;
use tracing::{error, info, warn};

use frame_bridge::{
    run_console, serve_metrics, BridgeRegistry, BridgeService, Config, GstTransportFactory,
    LoggingObserver, PrometheusReporter,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse configuration
    let config = Config::parse();
    config.validate()?;

    // Initialize logging
    let filter = if config.verbose { "debug" } else { "info" };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    // Initialize GStreamer (infrastructure concern)
    gstreamer::init()?;

    // Initialize metrics
    PrometheusReporter::init_metrics()?;

    let transport_settings = config.to_transport_settings()?;
    let relay_settings = config
        .to_relay_settings()
        .map_err(|e| anyhow::anyhow!("{}", e))?;

    info!("Starting frame bridge");
    info!("  Shared-memory dir: {}", transport_settings.shm_dir().display());
    info!("  Network peers: {}", transport_settings.network_peers().len());
    info!("  Frame interval: {:?}", relay_settings.pacing.interval());
    info!("  Metrics port: {}", config.metrics_port);

    // Create infrastructure implementations (dependency injection)
    let transports = Arc::new(GstTransportFactory::new(
        transport_settings,
        config.pull_timeout(),
    ));
    let metrics_reporter = Arc::new(PrometheusReporter::new());
    let registry = Arc::new(BridgeRegistry::with_observer(Arc::new(LoggingObserver)));

    // Create application service
    let service = Arc::new(
        BridgeService::new(registry, transports, relay_settings, metrics_reporter)
            .with_discovery_timeout(config.discovery_timeout()),
    );

    // Start metrics server
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
    let (addr, server) = serve_metrics(config.metrics_port, service.clone(), async {
        shutdown_rx.await.ok();
    })?;
    info!("Metrics server listening on http://{}", addr);
    let metrics_server = tokio::spawn(server);

    // Bridges requested on the command line; starting blocks on the connect handshake
    let startup = config.to_startup_bridges()?;
    let startup_service = service.clone();
    tokio::task::spawn_blocking(move || {
        for bridge in startup {
            let name = bridge.bridge_name().to_string();
            if let Err(e) = startup_service.start_bridge(bridge) {
                error!(bridge = %name, error = %e, "Startup bridge failed");
            }
        }
    })
    .await?;

    // Console runs on its own thread (stdin is blocking)
    let console_done = if config.no_console {
        None
    } else {
        let (console_tx, console_rx) = oneshot::channel::<()>();
        let console_service = service.clone();
        std::thread::Builder::new()
            .name("console".to_string())
            .spawn(move || {
                let stdin = std::io::stdin();
                let stdout = std::io::stdout();
                if let Err(e) = run_console(&console_service, stdin.lock(), stdout.lock()) {
                    warn!("Console error: {}", e);
                }
                let _ = console_tx.send(());
            })?;
        Some(console_rx)
    };

    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            if let Err(e) = result {
                error!("Failed to listen for ctrl+c: {}", e);
            }
            info!("Received shutdown signal");
        }
        _ = console_closed(console_done) => {
            info!("Console closed");
        }
    }

    // Stop every bridge (joins worker threads)
    let shutdown_service = service.clone();
    tokio::task::spawn_blocking(move || shutdown_service.shutdown()).await?;

    // Signal shutdown to metrics server
    let _ = shutdown_tx.send(());
    metrics_server.await?;

    info!("Frame bridge shutdown complete");
    Ok(())
}

/// Resolves when the console exits; never without a console
async fn console_closed(done: Option<oneshot::Receiver<()>>) {
    match done {
        Some(done) => {
            let _ = done.await;
        }
        None => std::future::pending().await,
    }
}
