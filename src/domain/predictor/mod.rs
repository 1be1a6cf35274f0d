//! Price predictors: estimate the next closing price from history.
//!
//! Each predictor exposes a minimum lookback; histories shorter than that
//! fail with [`TradesimError::InsufficientHistory`].

pub mod linear_trend;
pub mod moving_average;
pub mod perfect;
pub mod random;

use std::fmt;
use std::str::FromStr;

use super::error::TradesimError;
use super::stock_series::StockSeries;

pub use linear_trend::LinearTrendPredictor;
pub use moving_average::MovingAveragePredictor;
pub use perfect::PerfectPredictor;
pub use random::RandomPredictor;

pub trait Predictor {
    /// Minimum number of history rows `predict` needs.
    fn lookback(&self) -> usize;

    fn predict(&mut self, history: &StockSeries) -> Result<f64, TradesimError>;
}

impl<P: Predictor + ?Sized> Predictor for Box<P> {
    fn lookback(&self) -> usize {
        (**self).lookback()
    }

    fn predict(&mut self, history: &StockSeries) -> Result<f64, TradesimError> {
        (**self).predict(history)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PredictorKind {
    Random,
    Perfect,
    MovingAverage,
    LinearTrend,
}

impl fmt::Display for PredictorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PredictorKind::Random => "random",
            PredictorKind::Perfect => "perfect",
            PredictorKind::MovingAverage => "moving_average",
            PredictorKind::LinearTrend => "linear_trend",
        };
        f.write_str(name)
    }
}

impl FromStr for PredictorKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "random" => Ok(PredictorKind::Random),
            "perfect" => Ok(PredictorKind::Perfect),
            "moving_average" => Ok(PredictorKind::MovingAverage),
            "linear_trend" => Ok(PredictorKind::LinearTrend),
            other => Err(format!("unknown predictor: {other}")),
        }
    }
}

pub(crate) fn require_history(history: &StockSeries, minimum: usize) -> Result<(), TradesimError> {
    if history.len() < minimum.max(1) {
        return Err(TradesimError::InsufficientHistory {
            rows: history.len(),
            minimum: minimum.max(1),
        });
    }
    Ok(())
}
