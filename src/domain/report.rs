//! Simulation results assembled for reporting.

use chrono::NaiveDate;
use serde::Serialize;

use super::error::TradesimError;
use super::evaluator::{Trajectories, Trajectory};
use super::market::MarketSnapshot;
use super::metrics::{EquityPoint, Metrics};

/// Outcome of one trader's run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TraderResult {
    pub name: String,
    pub metrics: Metrics,
    pub equity_curve: Vec<EquityPoint>,
    pub trajectory: Trajectory,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationReport {
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
    pub risk_free_rate: f64,
    pub traders: Vec<TraderResult>,
}

impl SimulationReport {
    pub fn build(
        trajectories: &Trajectories,
        market: &MarketSnapshot,
        risk_free_rate: f64,
    ) -> Result<Self, TradesimError> {
        let mut traders = Vec::with_capacity(trajectories.len());
        for trajectory in trajectories {
            let equity_curve = trajectory.valuations(market)?;
            traders.push(TraderResult {
                name: trajectory.name.clone(),
                metrics: Metrics::compute(&equity_curve, risk_free_rate),
                equity_curve,
                trajectory: trajectory.clone(),
            });
        }

        let dates = trajectories.iter().flat_map(|t| t.iter().map(|(d, _)| d));
        let (first_date, last_date) = dates.fold((None, None), |(lo, hi), d| {
            (
                Some(lo.map_or(d, |lo: NaiveDate| lo.min(d))),
                Some(hi.map_or(d, |hi: NaiveDate| hi.max(d))),
            )
        });

        Ok(SimulationReport {
            first_date,
            last_date,
            risk_free_rate,
            traders,
        })
    }

    pub fn get(&self, name: &str) -> Option<&TraderResult> {
        self.traders.iter().find(|t| t.name == name)
    }

    /// Trader with the highest final value. Ties keep the earliest.
    pub fn best(&self) -> Option<&TraderResult> {
        self.traders.iter().fold(None, |best: Option<&TraderResult>, t| match best {
            Some(b) if b.metrics.final_value >= t.metrics.final_value => Some(b),
            _ => Some(t),
        })
    }
}
