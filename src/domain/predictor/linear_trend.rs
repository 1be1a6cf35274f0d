//! Least-squares trend extrapolation over a fixed lookback window.

use super::{Predictor, require_history};
use crate::domain::error::TradesimError;
use crate::domain::stock_series::StockSeries;

pub struct LinearTrendPredictor {
    lookback: usize,
}

impl LinearTrendPredictor {
    pub fn new(lookback: usize) -> Self {
        LinearTrendPredictor {
            lookback: lookback.max(2),
        }
    }
}

impl Predictor for LinearTrendPredictor {
    fn lookback(&self) -> usize {
        self.lookback
    }

    /// Fits `price = a + b*x` over the window (x = 0..n) and evaluates at x = n.
    fn predict(&mut self, history: &StockSeries) -> Result<f64, TradesimError> {
        require_history(history, self.lookback)?;
        let window = history.tail(self.lookback);
        let n = window.len() as f64;

        let mean_x = (n - 1.0) / 2.0;
        let mean_y = window.iter().map(|r| r.price).sum::<f64>() / n;

        let (mut cov, mut var) = (0.0, 0.0);
        for (i, row) in window.iter().enumerate() {
            let dx = i as f64 - mean_x;
            cov += dx * (row.price - mean_y);
            var += dx * dx;
        }

        let slope = if var > 0.0 { cov / var } else { 0.0 };
        Ok(mean_y + slope * (n - mean_x))
    }
}
