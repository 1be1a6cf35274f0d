//! Concrete adapter implementations for ports.

pub mod file_config_adapter;
pub mod json_report_adapter;
pub mod synthetic_market_adapter;
pub mod tracing_observer;
