//! Long-running background jobs spawned by the server binary.

pub mod metrics_retention;
