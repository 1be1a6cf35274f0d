#![allow(dead_code)]

use chrono::{Duration, NaiveDate};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use tradesim::domain::company::Company;
use tradesim::domain::error::TradesimError;
use tradesim::domain::market::MarketSnapshot;
use tradesim::domain::order::OrderList;
use tradesim::domain::portfolio::Portfolio;
use tradesim::domain::stock_series::{StockRow, StockSeries};
use tradesim::domain::trader::Trader;

pub fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

/// Daily series starting at `start`.
pub fn make_series(start: &str, prices: &[f64]) -> StockSeries {
    let start = date(start);
    StockSeries::new(
        prices
            .iter()
            .enumerate()
            .map(|(i, &p)| StockRow::new(start + Duration::days(i as i64), p))
            .collect(),
    )
    .unwrap()
}

pub fn make_market(a: &[f64], b: &[f64]) -> MarketSnapshot {
    MarketSnapshot::new()
        .with_series(Company::CompanyA, make_series("2024-01-01", a))
        .with_series(Company::CompanyB, make_series("2024-01-01", b))
}

pub fn flat_market(rows: usize, price_a: f64, price_b: f64) -> MarketSnapshot {
    make_market(&vec![price_a; rows], &vec![price_b; rows])
}

/// Replays scripted order lists, one per call; empty once the script runs out.
pub struct ScriptedTrader {
    script: VecDeque<OrderList>,
}

impl ScriptedTrader {
    pub fn new(script: Vec<OrderList>) -> Self {
        Self {
            script: script.into(),
        }
    }
}

impl Trader for ScriptedTrader {
    fn decide(
        &mut self,
        _portfolio: &Portfolio,
        _portfolio_value: f64,
        _market: &MarketSnapshot,
    ) -> Result<OrderList, TradesimError> {
        Ok(self.script.pop_front().unwrap_or_default())
    }
}

/// What a trader was shown on one call.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub last_date: NaiveDate,
    pub rows: usize,
    pub cash: f64,
    pub value: f64,
}

/// Records every call and answers with a fixed order list.
pub struct SpyTrader {
    pub seen: Rc<RefCell<Vec<Observation>>>,
    orders: OrderList,
}

impl SpyTrader {
    pub fn new(orders: OrderList) -> (Self, Rc<RefCell<Vec<Observation>>>) {
        let seen = Rc::new(RefCell::new(Vec::new()));
        (
            Self {
                seen: Rc::clone(&seen),
                orders,
            },
            seen,
        )
    }
}

impl Trader for SpyTrader {
    fn decide(
        &mut self,
        portfolio: &Portfolio,
        portfolio_value: f64,
        market: &MarketSnapshot,
    ) -> Result<OrderList, TradesimError> {
        self.seen.borrow_mut().push(Observation {
            last_date: market.last_date().unwrap(),
            rows: market.row_count(),
            cash: portfolio.cash,
            value: portfolio_value,
        });
        Ok(self.orders.clone())
    }
}

/// Fails on its `fail_on`-th call (1-based).
pub struct FailingTrader {
    calls: usize,
    fail_on: usize,
}

impl FailingTrader {
    pub fn new(fail_on: usize) -> Self {
        Self { calls: 0, fail_on }
    }
}

impl Trader for FailingTrader {
    fn decide(
        &mut self,
        _portfolio: &Portfolio,
        _portfolio_value: f64,
        _market: &MarketSnapshot,
    ) -> Result<OrderList, TradesimError> {
        self.calls += 1;
        if self.calls == self.fail_on {
            return Err(TradesimError::Trader {
                name: "failing".to_string(),
                reason: "scripted failure".to_string(),
            });
        }
        Ok(OrderList::new())
    }
}

pub fn boxed(trader: impl Trader + 'static) -> Box<dyn Trader> {
    Box::new(trader)
}
