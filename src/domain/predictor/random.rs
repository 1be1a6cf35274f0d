//! Random walk guess around the last price.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::{Predictor, require_history};
use crate::domain::error::TradesimError;
use crate::domain::stock_series::StockSeries;

pub struct RandomPredictor {
    rng: StdRng,
    max_change: f64,
}

impl RandomPredictor {
    /// `max_change` is the largest relative move, e.g. 0.05 for ±5%.
    pub fn new(seed: u64, max_change: f64) -> Self {
        RandomPredictor {
            rng: StdRng::seed_from_u64(seed),
            max_change: max_change.abs(),
        }
    }
}

impl Predictor for RandomPredictor {
    fn lookback(&self) -> usize {
        1
    }

    fn predict(&mut self, history: &StockSeries) -> Result<f64, TradesimError> {
        require_history(history, 1)?;
        let last = history.last_price().unwrap_or_default();
        if self.max_change == 0.0 {
            return Ok(last);
        }
        let change = self.rng.gen_range(-self.max_change..=self.max_change);
        Ok(last * (1.0 + change))
    }
}
