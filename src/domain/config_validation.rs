//! Configuration validation.
//!
//! Validates every config field before a simulation runs. Numeric keys that
//! are present but unparsable are rejected rather than silently defaulted.

use crate::domain::error::TradesimError;
use crate::domain::predictor::PredictorKind;
use crate::domain::simulation::TraderKind;
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;
use std::collections::HashSet;
use std::str::FromStr;

pub fn validate_simulation_config(config: &dyn ConfigPort) -> Result<(), TradesimError> {
    let cash = read_number::<f64>(config, "simulation", "initial_cash")?.unwrap_or(10_000.0);
    if !(cash.is_finite() && cash > 0.0) {
        return Err(invalid("simulation", "initial_cash", "initial_cash must be positive"));
    }

    let offset = read_number::<i64>(config, "simulation", "evaluation_offset")?;
    if offset.is_some_and(|o| o < 2) {
        return Err(invalid(
            "simulation",
            "evaluation_offset",
            "evaluation_offset must be at least 2",
        ));
    }

    let start_date = read_date(config, "simulation", "start_date")?;
    if offset.is_some() && start_date.is_some() {
        return Err(invalid(
            "simulation",
            "start_date",
            "start_date and evaluation_offset are mutually exclusive",
        ));
    }

    let rate = read_number::<f64>(config, "simulation", "risk_free_rate")?.unwrap_or(0.0);
    if !(0.0..1.0).contains(&rate) {
        return Err(invalid(
            "simulation",
            "risk_free_rate",
            "risk_free_rate must be between 0 and 1",
        ));
    }
    Ok(())
}

pub fn validate_market_config(config: &dyn ConfigPort) -> Result<(), TradesimError> {
    read_date(config, "market", "start_date")?;

    let days = read_number::<i64>(config, "market", "days")?.unwrap_or(250);
    if days < 2 {
        return Err(invalid("market", "days", "days must be at least 2"));
    }

    if read_number::<i64>(config, "market", "seed")?.is_some_and(|s| s < 0) {
        return Err(invalid("market", "seed", "seed must be non-negative"));
    }

    for key in ["initial_price_company_a", "initial_price_company_b"] {
        if read_number::<f64>(config, "market", key)?.is_some_and(|p| !(p.is_finite() && p > 0.0)) {
            return Err(invalid("market", key, &format!("{key} must be positive")));
        }
    }

    read_number::<f64>(config, "market", "drift")?;
    if read_number::<f64>(config, "market", "volatility")?.is_some_and(|v| v < 0.0) {
        return Err(invalid("market", "volatility", "volatility must be non-negative"));
    }
    Ok(())
}

pub fn validate_traders_config(config: &dyn ConfigPort) -> Result<(), TradesimError> {
    for name in parse_trader_names(config)? {
        validate_trader_section(config, &name)?;
    }
    Ok(())
}

/// Trader names listed in `[traders] names`, in order.
pub fn parse_trader_names(config: &dyn ConfigPort) -> Result<Vec<String>, TradesimError> {
    let raw = config
        .get_string("traders", "names")
        .ok_or_else(|| TradesimError::ConfigMissing {
            section: "traders".to_string(),
            key: "names".to_string(),
        })?;

    let names: Vec<String> = raw
        .split(',')
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .collect();
    if names.is_empty() {
        return Err(invalid("traders", "names", "at least one trader is required"));
    }

    // Sections are looked up case-insensitively, so names must differ in more than case.
    let mut seen = HashSet::new();
    for name in &names {
        if !seen.insert(name.to_lowercase()) {
            return Err(invalid("traders", "names", &format!("duplicate trader name: {name}")));
        }
    }
    Ok(names)
}

fn validate_trader_section(config: &dyn ConfigPort, name: &str) -> Result<(), TradesimError> {
    let kind_str = config
        .get_string(name, "kind")
        .ok_or_else(|| TradesimError::ConfigMissing {
            section: name.to_string(),
            key: "kind".to_string(),
        })?;
    let kind = TraderKind::from_str(&kind_str).map_err(|reason| invalid(name, "kind", &reason))?;
    if kind == TraderKind::BuyAndHold {
        return Ok(());
    }

    if let Some(predictor) = config.get_string(name, "predictor") {
        PredictorKind::from_str(&predictor).map_err(|reason| invalid(name, "predictor", &reason))?;
    }
    if read_number::<i64>(config, name, "lookback")?.is_some_and(|l| l < 1) {
        return Err(invalid(name, "lookback", "lookback must be at least 1"));
    }
    if read_number::<i64>(config, name, "seed")?.is_some_and(|s| s < 0) {
        return Err(invalid(name, "seed", "seed must be non-negative"));
    }
    if read_number::<f64>(config, name, "threshold")?.is_some_and(|t| t < 0.0) {
        return Err(invalid(name, "threshold", "threshold must be non-negative"));
    }
    if read_number::<f64>(config, name, "max_change")?.is_some_and(|m| m < 0.0) {
        return Err(invalid(name, "max_change", "max_change must be non-negative"));
    }
    validate_fraction(config, name, "trade_fraction", false)?;

    if kind == TraderKind::QLearning {
        validate_fraction(config, name, "alpha", false)?;
        validate_fraction(config, name, "gamma", true)?;
        validate_fraction(config, name, "epsilon", true)?;
        validate_fraction(config, name, "epsilon_decay", false)?;
        validate_fraction(config, name, "epsilon_min", true)?;
        for key in ["memory_size", "batch_size"] {
            if read_number::<i64>(config, name, key)?.is_some_and(|v| v < 1) {
                return Err(invalid(name, key, &format!("{key} must be at least 1")));
            }
        }
    }
    Ok(())
}

/// Accepts (0, 1], or [0, 1] when `allow_zero`.
fn validate_fraction(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    allow_zero: bool,
) -> Result<(), TradesimError> {
    let Some(value) = read_number::<f64>(config, section, key)? else {
        return Ok(());
    };
    let lower_ok = if allow_zero { value >= 0.0 } else { value > 0.0 };
    if !(lower_ok && value <= 1.0) {
        let range = if allow_zero { "[0, 1]" } else { "(0, 1]" };
        return Err(invalid(section, key, &format!("{key} must be in {range}")));
    }
    Ok(())
}

pub(crate) fn read_number<T: FromStr>(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<Option<T>, TradesimError> {
    match config.get_string(section, key) {
        None => Ok(None),
        Some(s) => s
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| invalid(section, key, &format!("{key} must be a number"))),
    }
}

pub(crate) fn read_date(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<Option<NaiveDate>, TradesimError> {
    match config.get_string(section, key) {
        None => Ok(None),
        Some(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
            .map(Some)
            .map_err(|_| {
                invalid(section, key, &format!("invalid {key} format, expected YYYY-MM-DD"))
            }),
    }
}

fn invalid(section: &str, key: &str, reason: &str) -> TradesimError {
    TradesimError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.to_string(),
    }
}
