#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use sqlx::SqlitePool;
use tower::ServiceExt;

use llmdash_api::config::ServerConfig;
use llmdash_api::router::build_app_router;
use llmdash_api::scripting::ScriptSupervisor;
use llmdash_api::state::AppState;
use llmdash_core::scripting::catalog::ScriptCatalog;
use llmdash_core::scripting::runner::CommandRunner;
use llmdash_core::scripting::wrap::PassthroughWrapper;
use llmdash_db::latest::LatestStateCache;
use llmdash_events::{DashboardEvent, EventBroadcaster, Subscription};

/// Catalog installed for every test app.
pub const TEST_CATALOG: &str = r#"{
    "hello": {
        "name": "Say hello",
        "description": "Echo a greeting",
        "commands": ["echo hello"]
    },
    "slow": {
        "name": "Slow",
        "description": "Takes a moment",
        "commands": ["sleep 1", "echo done"]
    },
    "broken": {
        "name": "Broken",
        "commands": ["echo first", "exit 3", "echo last"]
    }
}"#;

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config(catalog_path: &Path) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        database_url: "sqlite::memory:".to_string(),
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        metrics_retention_days: 7,
        metrics_cleanup_interval_secs: 3600,
        scripts_config_path: catalog_path.to_path_buf(),
        script_command_timeout_secs: 5,
        ssh_password: None,
        event_buffer_size: 256,
    }
}

/// Application state plus the temp directory holding its catalog file.
pub struct TestContext {
    pub state: AppState,
    pub config: ServerConfig,
    catalog_dir: tempfile::TempDir,
}

impl TestContext {
    /// Full router with the production middleware stack.
    pub fn app(&self) -> Router {
        build_app_router(self.state.clone(), &self.config)
    }

    pub fn catalog_path(&self) -> PathBuf {
        self.config.scripts_config_path.clone()
    }

    /// Overwrite the catalog file on disk (does not reload).
    pub fn write_catalog(&self, document: &str) {
        std::fs::write(self.catalog_path(), document).expect("write catalog");
    }

    pub fn subscribe(&self) -> Subscription {
        self.state.broadcaster.subscribe()
    }
}

/// Build state around `pool`, with [`TEST_CATALOG`] on disk and loaded.
pub async fn setup(pool: SqlitePool) -> TestContext {
    let catalog_dir = tempfile::tempdir().expect("temp dir");
    let catalog_path = catalog_dir.path().join("scripts_config.json");
    std::fs::write(&catalog_path, TEST_CATALOG).expect("write catalog");

    let config = test_config(&catalog_path);
    let broadcaster = Arc::new(EventBroadcaster::new(config.event_buffer_size));
    let catalog = ScriptCatalog::load(&catalog_path).await.expect("load catalog");
    let supervisor = Arc::new(ScriptSupervisor::new(
        catalog,
        catalog_path,
        CommandRunner::shell(Arc::new(PassthroughWrapper)),
        config.script_command_timeout(),
        Arc::clone(&broadcaster),
    ));

    let state = AppState {
        latest: LatestStateCache::new(pool.clone()),
        pool,
        config: Arc::new(config.clone()),
        broadcaster,
        supervisor,
    };

    TestContext {
        state,
        config,
        catalog_dir,
    }
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    post_raw(app, uri, body.to_string()).await
}

pub async fn post_raw(app: Router, uri: &str, body: String) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("Content-Type", "application/json")
        .body(Body::from(body))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn post_empty(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

// ---------------------------------------------------------------------------
// Event helpers
// ---------------------------------------------------------------------------

/// Read events until `script_finished`, returning the log lines seen and
/// the success flag.
pub async fn wait_script_finished(sub: &mut Subscription) -> (Vec<String>, bool) {
    let mut logs = Vec::new();
    loop {
        let event = tokio::time::timeout(Duration::from_secs(15), sub.recv())
            .await
            .expect("timed out waiting for script_finished")
            .expect("subscription closed");
        match event {
            DashboardEvent::ScriptLog { message } => logs.push(message),
            DashboardEvent::ScriptFinished { success } => return (logs, success),
            _ => {}
        }
    }
}
