use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use warp::Filter;

use super::PrometheusReporter;
use crate::application::services::BridgeService;

/// Health check response structure
#[derive(serde::Serialize)]
struct HealthResponse {
    status: &'static str,
    service: &'static str,
    version: &'static str,
    bridges: usize,
}

/// Bind the metrics and status server on `port`.
/// Returns the bound address and the server future; the server stops once
/// `shutdown` resolves.
pub fn serve_metrics(
    port: u16,
    service: Arc<BridgeService>,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<(SocketAddr, impl Future<Output = ()>), warp::Error> {
    // CORS configuration for browser access
    let cors = warp::cors()
        .allow_any_origin()
        .allow_methods(vec!["GET", "OPTIONS"])
        .allow_headers(vec!["Content-Type"]);

    let metrics_route = warp::path("metrics").map(|| {
        let body = PrometheusReporter::gather_metrics();
        warp::reply::with_header(body, "content-type", "text/plain; version=0.0.4; charset=utf-8")
    });

    let health_service = service.clone();
    let health_route = warp::path("health").map(move || {
        let response = HealthResponse {
            status: "healthy",
            service: "frame-bridge",
            version: env!("CARGO_PKG_VERSION"),
            bridges: health_service.registry().len(),
        };
        warp::reply::json(&response)
    });

    // Liveness probe endpoint (minimal check - is the process running?)
    let liveness_route =
        warp::path("livez").map(|| warp::reply::with_status("OK", warp::http::StatusCode::OK));

    // Bridge table as JSON, in display order
    let bridges_route =
        warp::path("bridges").map(move || warp::reply::json(&service.list_bridges()));

    let routes = metrics_route
        .or(health_route)
        .or(liveness_route)
        .or(bridges_route)
        .with(cors);

    warp::serve(routes).try_bind_with_graceful_shutdown(([0, 0, 0, 0], port), shutdown)
}
