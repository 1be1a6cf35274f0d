//! Exponential moving average predictor.
//!
//! k = 2/(n+1), seeded with the SMA of the first n prices of the window, then
//! EMA[i] = P[i]*k + EMA[i-1]*(1-k). The EMA at the last row is the estimate.

use super::{Predictor, require_history};
use crate::domain::error::TradesimError;
use crate::domain::stock_series::StockSeries;

pub struct MovingAveragePredictor {
    period: usize,
    window: usize,
}

impl MovingAveragePredictor {
    /// Smooths over the most recent `3 * period` prices.
    pub fn new(period: usize) -> Self {
        let period = period.max(1);
        MovingAveragePredictor {
            period,
            window: period * 3,
        }
    }
}

impl Predictor for MovingAveragePredictor {
    fn lookback(&self) -> usize {
        self.period
    }

    fn predict(&mut self, history: &StockSeries) -> Result<f64, TradesimError> {
        require_history(history, self.period)?;
        let prices: Vec<f64> = history.tail(self.window).iter().map(|r| r.price).collect();
        Ok(calculate_ema(&prices, self.period))
    }
}

fn calculate_ema(prices: &[f64], period: usize) -> f64 {
    let k = 2.0 / (period as f64 + 1.0);
    let seed: f64 = prices[..period].iter().sum::<f64>() / period as f64;
    prices[period..]
        .iter()
        .fold(seed, |ema, &price| price * k + ema * (1.0 - k))
}
