//! Trader capability and the built-in trading strategies.

pub mod buy_and_hold;
pub mod q_learning;
pub mod replay_memory;
pub mod trusting;

use super::error::TradesimError;
use super::market::MarketSnapshot;
use super::order::OrderList;
use super::portfolio::Portfolio;

pub use buy_and_hold::BuyAndHoldTrader;
pub use q_learning::{QLearningConfig, QLearningTrader};
pub use trusting::TrustingTrader;

/// Decides the orders for one tick.
///
/// Implementations may keep private state between calls (learning state,
/// counters). They only see the portfolio and market by shared reference.
pub trait Trader {
    fn decide(
        &mut self,
        portfolio: &Portfolio,
        portfolio_value: f64,
        market: &MarketSnapshot,
    ) -> Result<OrderList, TradesimError>;
}

impl<T: Trader + ?Sized> Trader for Box<T> {
    fn decide(
        &mut self,
        portfolio: &Portfolio,
        portfolio_value: f64,
        market: &MarketSnapshot,
    ) -> Result<OrderList, TradesimError> {
        (**self).decide(portfolio, portfolio_value, market)
    }
}

/// Whole shares of `price` affordable with `budget`.
pub(crate) fn affordable_shares(budget: f64, price: f64) -> u32 {
    if price <= 0.0 || budget <= 0.0 {
        return 0;
    }
    (budget / price).floor().min(u32::MAX as f64) as u32
}
