//! Device sample data model and ingestion validation.
//!
//! Every numeric reading is independently optional. `None` means the
//! collector has no such sensor (or, for network rates, no previous sample
//! to derive a rate from); it is never the same thing as `0`.

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::error::CoreError;
use crate::types::Timestamp;

/// Resource readings of one device at one instant.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_used_within_total"))]
pub struct MetricsReading {
    /// CPU utilization, percent.
    #[validate(range(min = 0.0, max = 100.0))]
    pub cpu_usage: Option<f64>,
    /// Memory in use, GiB.
    #[validate(range(min = 0.0))]
    pub ram_usage: Option<f64>,
    /// Installed memory, GiB.
    #[validate(range(min = 0.0))]
    pub ram_total: Option<f64>,
    /// GPU utilization, percent. Absent when no GPU was detected.
    #[validate(range(min = 0.0, max = 100.0))]
    pub gpu_usage: Option<f64>,
    /// VRAM in use, GiB.
    #[validate(range(min = 0.0))]
    pub vram_usage: Option<f64>,
    /// Total VRAM, GiB.
    #[validate(range(min = 0.0))]
    pub vram_total: Option<f64>,
    /// Transmit rate, Mbps. Absent on a collector's first sample.
    #[validate(range(min = 0.0))]
    pub network_tx: Option<f64>,
    /// Receive rate, Mbps. Absent on a collector's first sample.
    #[validate(range(min = 0.0))]
    pub network_rx: Option<f64>,
}

/// One stored observation for one device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsSample {
    pub device_name: String,
    #[serde(with = "crate::timestamps::canonical")]
    pub timestamp: Timestamp,
    #[serde(flatten)]
    pub metrics: MetricsReading,
}

impl MetricsReading {
    /// `true` when no reading is present at all.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Run field and cross-field validation, flattening failures into a
    /// [`CoreError::Validation`].
    pub fn check(&self) -> Result<(), CoreError> {
        self.validate()
            .map_err(|errors| CoreError::Validation(errors.to_string()))
    }
}

/// Validate an inbound device name: trimmed, non-empty, bounded.
///
/// Returns the trimmed name.
pub fn validate_device_name(name: Option<&str>) -> Result<&str, CoreError> {
    let name = name.map(str::trim).unwrap_or_default();
    if name.is_empty() {
        return Err(CoreError::Validation("Device name is required".to_string()));
    }
    if name.len() > MAX_DEVICE_NAME_LEN {
        return Err(CoreError::Validation(format!(
            "Device name must be at most {MAX_DEVICE_NAME_LEN} characters"
        )));
    }
    Ok(name)
}

/// Upper bound on device name length.
pub const MAX_DEVICE_NAME_LEN: usize = 255;

/// Used memory may never exceed the total reported alongside it.
fn validate_used_within_total(reading: &MetricsReading) -> Result<(), ValidationError> {
    let pairs = [
        ("ram_usage_exceeds_total", reading.ram_usage, reading.ram_total),
        ("vram_usage_exceeds_total", reading.vram_usage, reading.vram_total),
    ];
    for (code, used, total) in pairs {
        if let (Some(used), Some(total)) = (used, total) {
            if used > total {
                return Err(ValidationError::new(code));
            }
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
