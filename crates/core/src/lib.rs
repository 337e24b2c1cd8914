//! Domain logic for the fleet metrics dashboard.
//!
//! Everything here is free of database and HTTP concerns so it can be
//! tested in isolation: the sample data model, timestamp normalization,
//! event names, and the script catalog / command runner.

pub mod error;
pub mod metric_names;
pub mod metrics;
pub mod scripting;
pub mod timestamps;
pub mod types;
