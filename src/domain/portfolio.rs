//! Portfolio state, valuation and order application.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::company::Company;
use super::error::TradesimError;
use super::market::MarketSnapshot;
use super::order::{Order, OrderList, OrderType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SharesOfCompany {
    #[serde(rename = "company_id")]
    pub company: Company,
    pub amount: u32,
}

/// Why an order was dropped during [`Portfolio::apply_detailed`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    InsufficientCash,
    InsufficientShares,
    /// The holding would exceed the largest representable share count.
    PositionLimit,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApplyOutcome {
    pub portfolio: Portfolio,
    pub executed: Vec<Order>,
    pub rejected: Vec<(Order, RejectReason)>,
}

/// Cash and share holdings of one named strategy.
///
/// Updates go through [`Portfolio::apply`], which leaves `self` untouched and
/// returns the next state, so earlier states stay valid in a trajectory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Portfolio {
    pub name: String,
    pub cash: f64,
    shares: Vec<SharesOfCompany>,
}

impl Portfolio {
    pub fn new(name: impl Into<String>, cash: f64) -> Self {
        Portfolio {
            name: name.into(),
            cash,
            shares: Vec::new(),
        }
    }

    /// Sets the holding for `company`, replacing any existing entry.
    pub fn with_shares(mut self, company: Company, amount: u32) -> Self {
        self.get_or_insert(company).amount = amount;
        self
    }

    pub fn shares(&self) -> &[SharesOfCompany] {
        &self.shares
    }

    pub fn has_stock(&self, company: Company) -> bool {
        self.shares.iter().any(|s| s.company == company)
    }

    /// Held amount; 0 when there is no holding.
    pub fn get_amount(&self, company: Company) -> u32 {
        self.shares
            .iter()
            .find(|s| s.company == company)
            .map(|s| s.amount)
            .unwrap_or(0)
    }

    pub fn get_or_insert(&mut self, company: Company) -> &mut SharesOfCompany {
        let index = match self.shares.iter().position(|s| s.company == company) {
            Some(i) => i,
            None => {
                self.shares.push(SharesOfCompany { company, amount: 0 });
                self.shares.len() - 1
            }
        };
        &mut self.shares[index]
    }

    /// Cash plus every non-empty holding valued at its price on `date`.
    pub fn total_value(
        &self,
        date: NaiveDate,
        market: &MarketSnapshot,
    ) -> Result<f64, TradesimError> {
        let mut value = self.cash;
        for holding in self.shares.iter().filter(|s| s.amount > 0) {
            let price = market.price_at(holding.company, date)?;
            value += holding.amount as f64 * price;
        }
        Ok(value)
    }

    pub fn apply(
        &self,
        market: &MarketSnapshot,
        orders: &OrderList,
    ) -> Result<Portfolio, TradesimError> {
        self.apply_detailed(market, orders).map(|outcome| outcome.portfolio)
    }

    /// Applies `orders` in list order at each company's most recent price.
    ///
    /// A BUY needs `amount * price <= cash` and a holding that stays within
    /// `u32`; a SELL needs `held >= amount`.
    /// An order failing its check is dropped whole and the batch continues.
    /// A company without price data in `market` is a hard error.
    pub fn apply_detailed(
        &self,
        market: &MarketSnapshot,
        orders: &OrderList,
    ) -> Result<ApplyOutcome, TradesimError> {
        let mut next = self.clone();
        let mut executed = Vec::new();
        let mut rejected = Vec::new();

        for order in orders {
            let price = market.last_price(order.company)?;
            let trade_volume = order.amount as f64 * price;

            match order.order_type {
                OrderType::Buy => {
                    if trade_volume > next.cash {
                        rejected.push((*order, RejectReason::InsufficientCash));
                        continue;
                    }
                    match next.get_amount(order.company).checked_add(order.amount) {
                        Some(amount) => {
                            next.get_or_insert(order.company).amount = amount;
                            next.cash -= trade_volume;
                            executed.push(*order);
                        }
                        None => rejected.push((*order, RejectReason::PositionLimit)),
                    }
                }
                OrderType::Sell => {
                    if next.get_amount(order.company) >= order.amount {
                        next.get_or_insert(order.company).amount -= order.amount;
                        next.cash += trade_volume;
                        executed.push(*order);
                    } else {
                        rejected.push((*order, RejectReason::InsufficientShares));
                    }
                }
            }
        }

        Ok(ApplyOutcome {
            portfolio: next,
            executed,
            rejected,
        })
    }
}
