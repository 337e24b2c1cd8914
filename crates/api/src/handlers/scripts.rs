//! Handlers for operator script control.

use axum::extract::{Path, State};
use axum::Json;
use indexmap::IndexMap;
use llmdash_core::scripting::catalog::ScriptSummary;
use llmdash_core::scripting::status::ScriptRun;
use serde::Serialize;

use crate::error::AppResult;
use crate::response::{DataResponse, StatusResponse};
use crate::state::AppState;

/// Result of a successful catalog reload.
#[derive(Debug, Serialize)]
pub struct ReloadResponse {
    pub status: &'static str,
    /// Number of scripts in the new catalog.
    pub scripts: usize,
}

/// GET /api/scripts
pub async fn list_scripts(
    State(state): State<AppState>,
) -> Json<DataResponse<IndexMap<String, ScriptSummary>>> {
    Json(DataResponse {
        data: state.supervisor.list_scripts(),
    })
}

/// POST /api/scripts/{id}/execute
///
/// Starts the script in the background; progress arrives over the live
/// channel and through the status endpoint.
pub async fn execute_script(
    State(state): State<AppState>,
    Path(script_id): Path<String>,
) -> AppResult<Json<DataResponse<StatusResponse>>> {
    state.supervisor.execute(&script_id)?;
    Ok(Json(DataResponse {
        data: StatusResponse { status: "started" },
    }))
}

/// GET /api/scripts/status
pub async fn get_status(State(state): State<AppState>) -> Json<DataResponse<ScriptRun>> {
    Json(DataResponse {
        data: state.supervisor.status(),
    })
}

/// POST /api/scripts/reload
pub async fn reload_scripts(
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<ReloadResponse>>> {
    let scripts = state.supervisor.reload_catalog().await?;
    Ok(Json(DataResponse {
        data: ReloadResponse {
            status: "success",
            scripts,
        },
    }))
}
