//! Current state of the fleet.

use std::collections::BTreeMap;

use llmdash_core::metrics::MetricsSample;

use crate::repositories::DeviceMetricRepo;
use crate::DbPool;

/// Latest sample per device, read straight from the store.
///
/// Holds no copy of its own, so it can never serve a value older than
/// the newest committed insert. Deciding whether a device is offline is
/// left to the dashboard.
#[derive(Clone)]
pub struct LatestStateCache {
    pool: DbPool,
}

impl LatestStateCache {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn get(&self) -> Result<BTreeMap<String, MetricsSample>, sqlx::Error> {
        DeviceMetricRepo::latest_per_device(&self.pool).await
    }
}
