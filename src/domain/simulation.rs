//! Simulation setup: run parameters and trader construction.

use chrono::NaiveDate;
use std::fmt;
use std::str::FromStr;

use super::company::Company;
use super::error::TradesimError;
use super::market::MarketSnapshot;
use super::portfolio::Portfolio;
use super::predictor::{
    LinearTrendPredictor, MovingAveragePredictor, PerfectPredictor, Predictor, PredictorKind,
    RandomPredictor,
};
use super::trader::{BuyAndHoldTrader, QLearningConfig, QLearningTrader, Trader, TrustingTrader};

#[derive(Debug, Clone, PartialEq)]
pub struct SimulationConfig {
    pub initial_cash: f64,
    /// Rows to simulate, counting the baseline. `None` with no start date
    /// means the whole market.
    pub evaluation_offset: Option<usize>,
    pub start_date: Option<NaiveDate>,
    pub risk_free_rate: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        SimulationConfig {
            initial_cash: 10_000.0,
            evaluation_offset: None,
            start_date: None,
            risk_free_rate: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraderKind {
    BuyAndHold,
    Trusting,
    QLearning,
}

impl fmt::Display for TraderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TraderKind::BuyAndHold => "buy_and_hold",
            TraderKind::Trusting => "trusting",
            TraderKind::QLearning => "q_learning",
        };
        f.write_str(name)
    }
}

impl FromStr for TraderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "buy_and_hold" => Ok(TraderKind::BuyAndHold),
            "trusting" => Ok(TraderKind::Trusting),
            "q_learning" => Ok(TraderKind::QLearning),
            other => Err(format!("unknown trader kind: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PredictorSettings {
    pub kind: PredictorKind,
    pub lookback: usize,
    pub max_change: f64,
    pub seed: u64,
}

impl Default for PredictorSettings {
    fn default() -> Self {
        PredictorSettings {
            kind: PredictorKind::MovingAverage,
            lookback: 5,
            max_change: 0.05,
            seed: 42,
        }
    }
}

impl PredictorSettings {
    /// Builds the predictor for one company. The perfect predictor is handed
    /// that company's full series; random predictors get a per-company seed.
    pub fn build(
        &self,
        company: Company,
        market: &MarketSnapshot,
    ) -> Result<Box<dyn Predictor>, TradesimError> {
        let predictor: Box<dyn Predictor> = match self.kind {
            PredictorKind::Random => Box::new(RandomPredictor::new(
                self.seed.wrapping_add(company_offset(company)),
                self.max_change,
            )),
            PredictorKind::Perfect => {
                let series = market
                    .get(company)
                    .ok_or(TradesimError::NoPriceData { company })?;
                Box::new(PerfectPredictor::new(series.clone()))
            }
            PredictorKind::MovingAverage => Box::new(MovingAveragePredictor::new(self.lookback)),
            PredictorKind::LinearTrend => Box::new(LinearTrendPredictor::new(self.lookback)),
        };
        Ok(predictor)
    }
}

fn company_offset(company: Company) -> u64 {
    Company::ALL
        .iter()
        .position(|c| *c == company)
        .unwrap_or_default() as u64
}

/// A configured trader, ready to be built against a market.
#[derive(Debug, Clone, PartialEq)]
pub struct TraderSettings {
    pub name: String,
    pub kind: TraderKind,
    pub predictor: PredictorSettings,
    pub threshold: f64,
    pub trade_fraction: f64,
    pub q_learning: QLearningConfig,
}

impl TraderSettings {
    pub fn new(name: impl Into<String>, kind: TraderKind) -> Self {
        TraderSettings {
            name: name.into(),
            kind,
            predictor: PredictorSettings::default(),
            threshold: 0.01,
            trade_fraction: 0.5,
            q_learning: QLearningConfig::default(),
        }
    }

    pub fn build(&self, market: &MarketSnapshot) -> Result<Box<dyn Trader>, TradesimError> {
        let trader: Box<dyn Trader> = match self.kind {
            TraderKind::BuyAndHold => Box::new(BuyAndHoldTrader::new()),
            TraderKind::Trusting => {
                let mut trader = TrustingTrader::new(self.threshold, self.trade_fraction);
                for company in market.companies() {
                    trader = trader.with_predictor(company, self.predictor.build(company, market)?);
                }
                Box::new(trader)
            }
            TraderKind::QLearning => {
                let config = QLearningConfig {
                    threshold: self.threshold,
                    trade_fraction: self.trade_fraction,
                    ..self.q_learning.clone()
                };
                let mut trader = QLearningTrader::new(config);
                for company in market.companies() {
                    trader = trader.with_predictor(company, self.predictor.build(company, market)?);
                }
                Box::new(trader)
            }
        };
        Ok(trader)
    }
}

/// One fresh portfolio per trader, paired with its built trader.
pub fn build_pairings(
    trader_settings: &[TraderSettings],
    initial_cash: f64,
    market: &MarketSnapshot,
) -> Result<Vec<(Portfolio, Box<dyn Trader>)>, TradesimError> {
    trader_settings
        .iter()
        .map(|settings| {
            let portfolio = Portfolio::new(settings.name.clone(), initial_cash);
            Ok((portfolio, settings.build(market)?))
        })
        .collect()
}
