use std::sync::Arc;

use llmdash_db::latest::LatestStateCache;
use llmdash_events::EventBroadcaster;

use crate::config::ServerConfig;
use crate::scripting::ScriptSupervisor;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: llmdash_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Latest sample per device.
    pub latest: LatestStateCache,
    /// Live event fan-out to dashboard clients.
    pub broadcaster: Arc<EventBroadcaster>,
    /// Operator script supervisor.
    pub supervisor: Arc<ScriptSupervisor>,
}
