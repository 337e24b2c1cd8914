//! Repository for the `device_metrics` table (append-only time-series).

use std::collections::BTreeMap;

use chrono::Duration;
use llmdash_core::metrics::MetricsSample;
use llmdash_core::timestamps;
use llmdash_core::types::{DbId, Timestamp};

use crate::models::device_metric::DeviceMetricRow;
use crate::DbPool;

/// Column list for `device_metrics` SELECT queries.
const COLUMNS: &str = "\
    id, device_name, recorded_at, \
    cpu_usage, ram_usage, ram_total, gpu_usage, \
    vram_usage, vram_total, network_tx, network_rx";

/// Column list for INSERT statements (excludes `id` and `created_at`).
const INSERT_COLUMNS: &str = "\
    device_name, recorded_at, \
    cpu_usage, ram_usage, ram_total, gpu_usage, \
    vram_usage, vram_total, network_tx, network_rx";

/// Provides query operations for device samples.
pub struct DeviceMetricRepo;

impl DeviceMetricRepo {
    /// Append one sample and return its row id.
    pub async fn insert(pool: &DbPool, sample: &MetricsSample) -> Result<DbId, sqlx::Error> {
        let query = format!(
            "INSERT INTO device_metrics ({INSERT_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)"
        );
        let m = &sample.metrics;
        let result = sqlx::query(&query)
            .bind(&sample.device_name)
            .bind(timestamps::format(&sample.timestamp))
            .bind(m.cpu_usage)
            .bind(m.ram_usage)
            .bind(m.ram_total)
            .bind(m.gpu_usage)
            .bind(m.vram_usage)
            .bind(m.vram_total)
            .bind(m.network_tx)
            .bind(m.network_rx)
            .execute(pool)
            .await?;
        Ok(result.last_insert_rowid())
    }

    /// Samples recorded at or after `since`.
    ///
    /// For a single device the rows are newest first; across all devices
    /// they are grouped by device name, newest first within each device.
    pub async fn query(
        pool: &DbPool,
        device_name: Option<&str>,
        since: Timestamp,
    ) -> Result<Vec<MetricsSample>, sqlx::Error> {
        let since = timestamps::format(&since);
        let rows = match device_name {
            Some(device) => {
                let query = format!(
                    "SELECT {COLUMNS} FROM device_metrics \
                     WHERE device_name = $1 AND recorded_at >= $2 \
                     ORDER BY recorded_at DESC, id DESC"
                );
                sqlx::query_as::<_, DeviceMetricRow>(&query)
                    .bind(device)
                    .bind(since)
                    .fetch_all(pool)
                    .await?
            }
            None => {
                let query = format!(
                    "SELECT {COLUMNS} FROM device_metrics \
                     WHERE recorded_at >= $1 \
                     ORDER BY device_name ASC, recorded_at DESC, id DESC"
                );
                sqlx::query_as::<_, DeviceMetricRow>(&query)
                    .bind(since)
                    .fetch_all(pool)
                    .await?
            }
        };
        Ok(rows.into_iter().map(DeviceMetricRow::into_sample).collect())
    }

    /// The newest sample of every device.
    ///
    /// Joins each device against its `MAX(recorded_at)`; when two rows share
    /// the maximum timestamp the one inserted last wins.
    pub async fn latest_per_device(
        pool: &DbPool,
    ) -> Result<BTreeMap<String, MetricsSample>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM device_metrics \
             WHERE id IN ( \
                 SELECT MAX(m.id) FROM device_metrics m \
                 JOIN ( \
                     SELECT device_name, MAX(recorded_at) AS max_recorded_at \
                     FROM device_metrics GROUP BY device_name \
                 ) latest \
                   ON m.device_name = latest.device_name \
                  AND m.recorded_at = latest.max_recorded_at \
                 GROUP BY m.device_name \
             )"
        );
        let rows = sqlx::query_as::<_, DeviceMetricRow>(&query)
            .fetch_all(pool)
            .await?;
        Ok(rows
            .into_iter()
            .map(|row| (row.device_name.clone(), row.into_sample()))
            .collect())
    }

    /// Delete samples recorded before `cutoff`. Returns the number of rows removed.
    pub async fn delete_older_than(pool: &DbPool, cutoff: Timestamp) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM device_metrics WHERE recorded_at < $1")
            .bind(timestamps::format(&cutoff))
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// Delete samples older than `retention` relative to now.
    pub async fn evict_expired(pool: &DbPool, retention: Duration) -> Result<u64, sqlx::Error> {
        Self::delete_older_than(pool, timestamps::now() - retention).await
    }

    /// Number of stored samples.
    pub async fn count(pool: &DbPool) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM device_metrics")
            .fetch_one(pool)
            .await?;
        Ok(count)
    }
}
