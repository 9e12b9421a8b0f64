use crate::calibration::PerformanceTracker;
use crate::http::routes;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Shared state for the thin HTTP wrapper. Holds only the append-only
/// metrics sink — the detection pipeline itself is stateless per
/// request.
#[derive(Clone)]
pub struct AppState {
    pub perf: Arc<PerformanceTracker>,
}

impl AppState {
    pub fn new(metrics_path: impl Into<std::path::PathBuf>) -> Self {
        Self {
            perf: Arc::new(PerformanceTracker::new(metrics_path)),
        }
    }
}

/// Build the axum application: one upload endpoint, one enhanced
/// variant, and configuration/metrics/health endpoints. CORS is wide
/// open, matching the service this was ported from.
pub fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/detect", post(routes::detect))
        .route("/detect/enhanced", post(routes::detect_enhanced))
        .route("/config", get(routes::get_config))
        .route("/config/presets/:name", get(routes::get_preset_config))
        .route("/metrics", get(routes::get_metrics))
        .route("/health", get(routes::health))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
