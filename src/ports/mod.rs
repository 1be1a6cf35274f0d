//! Port traits the domain and CLI depend on.

pub mod config_port;
pub mod market_data_port;
pub mod observer_port;
pub mod report_port;
