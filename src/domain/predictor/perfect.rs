//! Cheating predictor that reads the next row from the full series.
//!
//! Useful as an upper bound when comparing traders.

use super::{Predictor, require_history};
use crate::domain::error::TradesimError;
use crate::domain::stock_series::StockSeries;

pub struct PerfectPredictor {
    future: StockSeries,
}

impl PerfectPredictor {
    pub fn new(future: StockSeries) -> Self {
        PerfectPredictor { future }
    }
}

impl Predictor for PerfectPredictor {
    fn lookback(&self) -> usize {
        1
    }

    /// Price of the row after the history's last date; the last price when
    /// the history already reaches the end of the known series.
    fn predict(&mut self, history: &StockSeries) -> Result<f64, TradesimError> {
        require_history(history, 1)?;
        let (last_date, last_price) = match history.last() {
            Some(row) => (row.date, row.price),
            None => return Err(TradesimError::InsufficientHistory { rows: 0, minimum: 1 }),
        };
        let next = self
            .future
            .index_of(last_date)
            .and_then(|i| self.future.get(i + 1))
            .map(|row| row.price);
        Ok(next.unwrap_or(last_price))
    }
}
