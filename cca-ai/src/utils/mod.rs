//! Utility modules for cca-ai

pub mod pool_monitor;

pub use pool_monitor::{begin_monitored, MonitoredTransaction};
