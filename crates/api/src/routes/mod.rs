pub mod health;
pub mod metrics;
pub mod scripts;

use axum::routing::get;
use axum::Router;

use crate::state::AppState;
use crate::ws;

/// Build the `/api` route tree.
///
/// ```text
/// /metrics   ingestion, history and latest state
/// /scripts   operator script control
/// /ws        live event channel
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/metrics", metrics::router())
        .nest("/scripts", scripts::router())
        .route("/ws", get(ws::ws_handler))
}
