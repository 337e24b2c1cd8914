//! Periodic eviction of expired device samples.
//!
//! Spawns a background task that deletes rows from `device_metrics` older
//! than the configured retention period. Runs on a fixed interval using
//! `tokio::time::interval`; a failed sweep is logged and retried on the
//! next tick.

use std::time::Duration;

use llmdash_db::repositories::DeviceMetricRepo;
use llmdash_db::DbPool;
use tokio_util::sync::CancellationToken;

/// Run the retention loop until `cancel` is triggered.
///
/// The first sweep happens immediately, then every `interval`.
pub async fn run(
    pool: DbPool,
    retention: chrono::Duration,
    interval: Duration,
    cancel: CancellationToken,
) {
    tracing::info!(
        retention_days = retention.num_days(),
        interval_secs = interval.as_secs(),
        "Metrics retention job started"
    );

    let mut interval = tokio::time::interval(interval);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Metrics retention job stopping");
                break;
            }
            _ = interval.tick() => {
                match DeviceMetricRepo::evict_expired(&pool, retention).await {
                    Ok(deleted) => {
                        if deleted > 0 {
                            tracing::info!(deleted, "Metrics retention: purged old rows");
                        } else {
                            tracing::debug!("Metrics retention: no rows to purge");
                        }
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Metrics retention: cleanup failed");
                    }
                }
            }
        }
    }
}
