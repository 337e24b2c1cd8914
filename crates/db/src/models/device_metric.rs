//! Device metric row model.

use llmdash_core::metrics::{MetricsReading, MetricsSample};
use llmdash_core::timestamps;
use llmdash_core::types::DbId;
use sqlx::FromRow;

/// A stored `device_metrics` row.
///
/// `recorded_at` is kept as the raw column text; rows written by older
/// collectors may carry other timestamp layouts, which
/// [`into_sample`](Self::into_sample) normalizes.
#[derive(Debug, Clone, FromRow)]
pub struct DeviceMetricRow {
    pub id: DbId,
    pub device_name: String,
    pub recorded_at: String,
    pub cpu_usage: Option<f64>,
    pub ram_usage: Option<f64>,
    pub ram_total: Option<f64>,
    pub gpu_usage: Option<f64>,
    pub vram_usage: Option<f64>,
    pub vram_total: Option<f64>,
    pub network_tx: Option<f64>,
    pub network_rx: Option<f64>,
}

impl DeviceMetricRow {
    pub fn into_sample(self) -> MetricsSample {
        MetricsSample {
            timestamp: timestamps::normalize_or_now(&self.recorded_at),
            device_name: self.device_name,
            metrics: MetricsReading {
                cpu_usage: self.cpu_usage,
                ram_usage: self.ram_usage,
                ram_total: self.ram_total,
                gpu_usage: self.gpu_usage,
                vram_usage: self.vram_usage,
                vram_total: self.vram_total,
                network_tx: self.network_tx,
                network_rx: self.network_rx,
            },
        }
    }
}
