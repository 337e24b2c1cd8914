//! Route definitions for device metrics.

use axum::routing::get;
use axum::Router;

use crate::handlers::metrics;
use crate::state::AppState;

/// Routes mounted at `/metrics`.
///
/// ```text
/// POST /                      -> ingest
/// GET  /                      -> get_all_metrics
/// GET  /latest                -> get_latest_metrics
/// GET  /{device_name}         -> get_device_metrics
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(metrics::get_all_metrics).post(metrics::ingest))
        .route("/latest", get(metrics::get_latest_metrics))
        .route("/{device_name}", get(metrics::get_device_metrics))
}
