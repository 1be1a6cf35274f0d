//! Core domain types and logic.

pub mod company;
pub mod config_validation;
pub mod error;
pub mod evaluator;
pub mod market;
pub mod metrics;
pub mod order;
pub mod portfolio;
pub mod predictor;
pub mod report;
pub mod simulation;
pub mod stock_series;
pub mod trader;
