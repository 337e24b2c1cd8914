pub mod device_metric_repo;

pub use device_metric_repo::DeviceMetricRepo;
