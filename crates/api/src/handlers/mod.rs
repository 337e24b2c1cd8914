pub mod metrics;
pub mod scripts;
