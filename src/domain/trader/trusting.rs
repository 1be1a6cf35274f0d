//! Rule-based trader that acts on its predictors' forecasts.

use std::collections::BTreeMap;
use tracing::debug;

use super::{Trader, affordable_shares};
use crate::domain::company::Company;
use crate::domain::error::TradesimError;
use crate::domain::market::MarketSnapshot;
use crate::domain::order::OrderList;
use crate::domain::portfolio::Portfolio;
use crate::domain::predictor::Predictor;

/// Buys when a company's forecast beats its last price by more than
/// `threshold` (relative), sells the whole holding when it falls short by more
/// than `threshold`. Companies without a predictor, or without enough
/// history for theirs, are left alone.
pub struct TrustingTrader {
    predictors: BTreeMap<Company, Box<dyn Predictor>>,
    threshold: f64,
    trade_fraction: f64,
}

impl TrustingTrader {
    /// `trade_fraction` of the available cash is spent per tick, split
    /// across the companies with a buy signal.
    pub fn new(threshold: f64, trade_fraction: f64) -> Self {
        TrustingTrader {
            predictors: BTreeMap::new(),
            threshold: threshold.abs(),
            trade_fraction: trade_fraction.clamp(0.0, 1.0),
        }
    }

    pub fn with_predictor(mut self, company: Company, predictor: Box<dyn Predictor>) -> Self {
        self.predictors.insert(company, predictor);
        self
    }
}

impl Trader for TrustingTrader {
    fn decide(
        &mut self,
        portfolio: &Portfolio,
        _portfolio_value: f64,
        market: &MarketSnapshot,
    ) -> Result<OrderList, TradesimError> {
        let mut buys = Vec::new();
        let mut orders = OrderList::new();

        for (&company, predictor) in self.predictors.iter_mut() {
            let history = market
                .get(company)
                .ok_or(TradesimError::NoPriceData { company })?;
            if history.len() < predictor.lookback() {
                continue;
            }
            let last = market.last_price(company)?;
            let predicted = predictor.predict(history)?;
            if last <= 0.0 {
                continue;
            }

            let change = (predicted - last) / last;
            debug!(portfolio = %portfolio.name, %company, last, predicted, "forecast");
            if change > self.threshold {
                buys.push((company, last));
            } else if change < -self.threshold {
                orders.sell(company, portfolio.get_amount(company));
            }
        }

        if !buys.is_empty() {
            let budget = portfolio.cash * self.trade_fraction / buys.len() as f64;
            for (company, price) in buys {
                orders.buy(company, affordable_shares(budget, price));
            }
        }

        Ok(orders)
    }
}
