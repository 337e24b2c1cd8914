pub mod device_metric;
