//! Tests for the background retention job.

use std::time::Duration;

use llmdash_api::background::metrics_retention;
use llmdash_core::metrics::{MetricsReading, MetricsSample};
use llmdash_core::timestamps;
use llmdash_db::repositories::DeviceMetricRepo;
use sqlx::SqlitePool;
use tokio_util::sync::CancellationToken;

fn sample(age: chrono::Duration) -> MetricsSample {
    MetricsSample {
        device_name: "gpu-box".into(),
        timestamp: timestamps::now() - age,
        metrics: MetricsReading::default(),
    }
}

#[sqlx::test(migrations = "../db/migrations")]
async fn job_evicts_on_first_tick_and_stops_on_cancel(pool: SqlitePool) {
    DeviceMetricRepo::insert(&pool, &sample(chrono::Duration::days(10))).await.unwrap();
    DeviceMetricRepo::insert(&pool, &sample(chrono::Duration::minutes(1))).await.unwrap();

    let cancel = CancellationToken::new();
    let handle = tokio::spawn(metrics_retention::run(
        pool.clone(),
        chrono::Duration::days(7),
        Duration::from_secs(3600),
        cancel.clone(),
    ));

    let mut remaining = i64::MAX;
    for _ in 0..100 {
        remaining = DeviceMetricRepo::count(&pool).await.unwrap();
        if remaining == 1 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(remaining, 1);

    cancel.cancel();
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("retention job should stop after cancel")
        .unwrap();
}
