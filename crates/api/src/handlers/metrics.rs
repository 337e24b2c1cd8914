//! Handlers for metric ingestion and history endpoints.

use std::collections::BTreeMap;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::Duration;
use llmdash_core::metrics::{validate_device_name, MetricsReading, MetricsSample};
use llmdash_core::timestamps;
use llmdash_db::repositories::DeviceMetricRepo;
use llmdash_events::DashboardEvent;
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::response::{DataResponse, StatusResponse};
use crate::state::AppState;

/// Default history window in hours.
const DEFAULT_HOURS: i64 = 24;

/// Largest accepted history window (one year).
const MAX_HOURS: i64 = 8760;

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// Body of `POST /metrics`, as pushed by collection agents.
#[derive(Debug, Deserialize)]
pub struct IngestRequest {
    pub device_name: Option<String>,
    #[serde(default)]
    pub metrics: MetricsReading,
    /// Sample time; server receive time when absent.
    pub timestamp: Option<String>,
}

/// Query parameters for the history endpoints.
#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    /// How many hours of history to return (default: 24).
    pub hours: Option<i64>,
}

impl HistoryQuery {
    fn window(&self) -> AppResult<Duration> {
        let hours = self.hours.unwrap_or(DEFAULT_HOURS);
        if !(1..=MAX_HOURS).contains(&hours) {
            return Err(AppError::BadRequest(format!(
                "hours must be between 1 and {MAX_HOURS}"
            )));
        }
        Ok(Duration::hours(hours))
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/metrics
///
/// Store one sample and push it to live subscribers.
pub async fn ingest(
    State(state): State<AppState>,
    body: Result<Json<IngestRequest>, JsonRejection>,
) -> AppResult<Json<DataResponse<StatusResponse>>> {
    let Json(request) = body.map_err(|e| AppError::BadRequest(e.body_text()))?;

    let device_name = validate_device_name(request.device_name.as_deref())?.to_string();
    request.metrics.check()?;

    let timestamp = match request.timestamp.as_deref() {
        Some(raw) => timestamps::normalize_or_now(raw),
        None => timestamps::now(),
    };

    let sample = MetricsSample {
        device_name,
        timestamp,
        metrics: request.metrics,
    };
    let id = DeviceMetricRepo::insert(&state.pool, &sample).await?;

    tracing::debug!(
        id,
        device_name = %sample.device_name,
        timestamp = %timestamps::format(&sample.timestamp),
        "Received metrics"
    );
    state.broadcaster.publish(DashboardEvent::metrics_update(sample));

    Ok(Json(DataResponse {
        data: StatusResponse { status: "success" },
    }))
}

/// GET /api/metrics/{device_name}?hours=N
///
/// Samples of one device within the window, newest first.
pub async fn get_device_metrics(
    State(state): State<AppState>,
    Path(device_name): Path<String>,
    query: Result<Query<HistoryQuery>, QueryRejection>,
) -> AppResult<Json<DataResponse<Vec<MetricsSample>>>> {
    let Query(query) = query.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let since = timestamps::now() - query.window()?;
    let samples = DeviceMetricRepo::query(&state.pool, Some(&device_name), since).await?;
    Ok(Json(DataResponse { data: samples }))
}

/// GET /api/metrics?hours=N
///
/// Samples of every device within the window, grouped by device.
pub async fn get_all_metrics(
    State(state): State<AppState>,
    query: Result<Query<HistoryQuery>, QueryRejection>,
) -> AppResult<Json<DataResponse<Vec<MetricsSample>>>> {
    let Query(query) = query.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let since = timestamps::now() - query.window()?;
    let samples = DeviceMetricRepo::query(&state.pool, None, since).await?;
    Ok(Json(DataResponse { data: samples }))
}

/// GET /api/metrics/latest
///
/// Newest sample of every device, keyed by device name.
pub async fn get_latest_metrics(
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<BTreeMap<String, MetricsSample>>>> {
    let latest = state.latest.get().await?;
    Ok(Json(DataResponse { data: latest }))
}
