//! Route definitions for operator scripts.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::scripts;
use crate::state::AppState;

/// Routes mounted at `/scripts`.
///
/// ```text
/// GET  /                      -> list_scripts
/// GET  /status                -> get_status
/// POST /reload                -> reload_scripts
/// POST /{id}/execute          -> execute_script
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(scripts::list_scripts))
        .route("/status", get(scripts::get_status))
        .route("/reload", post(scripts::reload_scripts))
        .route("/{id}/execute", post(scripts::execute_script))
}
