//! Buy-and-hold baseline: invest everything on the first day, then wait.

use tracing::debug;

use super::{Trader, affordable_shares};
use crate::domain::company::Company;
use crate::domain::error::TradesimError;
use crate::domain::market::MarketSnapshot;
use crate::domain::order::OrderList;
use crate::domain::portfolio::Portfolio;

#[derive(Debug, Default)]
pub struct BuyAndHoldTrader {
    invested: bool,
}

impl BuyAndHoldTrader {
    pub fn new() -> Self {
        BuyAndHoldTrader::default()
    }
}

impl Trader for BuyAndHoldTrader {
    fn decide(
        &mut self,
        portfolio: &Portfolio,
        _portfolio_value: f64,
        market: &MarketSnapshot,
    ) -> Result<OrderList, TradesimError> {
        let mut orders = OrderList::new();
        if self.invested {
            return Ok(orders);
        }

        let companies: Vec<Company> = market.companies().collect();
        if companies.is_empty() {
            return Ok(orders);
        }
        let budget = portfolio.cash / companies.len() as f64;
        for company in companies {
            let price = market.last_price(company)?;
            orders.buy(company, affordable_shares(budget, price));
        }

        debug!(portfolio = %portfolio.name, orders = orders.len(), "buy-and-hold initial purchase");
        self.invested = true;
        Ok(orders)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::order::OrderType;
    use crate::domain::stock_series::{StockRow, StockSeries};
    use chrono::NaiveDate;

    fn market(price_a: f64, price_b: f64) -> MarketSnapshot {
        let d = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        MarketSnapshot::new()
            .with_series(
                Company::CompanyA,
                StockSeries::new(vec![StockRow::new(d, price_a)]).unwrap(),
            )
            .with_series(
                Company::CompanyB,
                StockSeries::new(vec![StockRow::new(d, price_b)]).unwrap(),
            )
    }

    #[test]
    fn first_decision_splits_cash_evenly() {
        let mut trader = BuyAndHoldTrader::new();
        let portfolio = Portfolio::new("hold", 1000.0);
        let orders = trader.decide(&portfolio, 1000.0, &market(100.0, 30.0)).unwrap();

        let a = orders.get_by_company(Company::CompanyA).unwrap();
        let b = orders.get_by_company(Company::CompanyB).unwrap();
        assert_eq!((a.order_type, a.amount), (OrderType::Buy, 5));
        assert_eq!((b.order_type, b.amount), (OrderType::Buy, 16));
    }

    #[test]
    fn later_decisions_are_empty() {
        let mut trader = BuyAndHoldTrader::new();
        let portfolio = Portfolio::new("hold", 1000.0);
        let m = market(100.0, 30.0);
        trader.decide(&portfolio, 1000.0, &m).unwrap();
        assert!(trader.decide(&portfolio, 1000.0, &m).unwrap().is_empty());
    }

    #[test]
    fn initial_orders_are_affordable_together() {
        let mut trader = BuyAndHoldTrader::new();
        let portfolio = Portfolio::new("hold", 999.0);
        let m = market(7.0, 13.0);
        let orders = trader.decide(&portfolio, 999.0, &m).unwrap();
        let outcome = portfolio.apply_detailed(&m, &orders).unwrap();
        assert!(outcome.rejected.is_empty());
        assert!(outcome.portfolio.cash >= 0.0);
    }
}
