//! Portfolio evaluator: replays market history one day at a time.
//!
//! Each tick hides all rows after the simulated day, asks every trader for
//! orders against its own portfolio, applies them, and records the result
//! under that day's date. The first recorded entry of every trajectory is the
//! initial portfolio, dated one calendar day before the first trading day.

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};

use super::error::TradesimError;
use super::market::MarketSnapshot;
use super::metrics::EquityPoint;
use super::portfolio::Portfolio;
use super::trader::Trader;
use crate::ports::observer_port::{EvaluationObserver, NullObserver};

/// Dated portfolio states of one strategy, in chronological order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trajectory {
    pub name: String,
    pub states: BTreeMap<NaiveDate, Portfolio>,
}

impl Trajectory {
    fn new(name: String) -> Self {
        Trajectory {
            name,
            states: BTreeMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn get(&self, date: NaiveDate) -> Option<&Portfolio> {
        self.states.get(&date)
    }

    pub fn first(&self) -> Option<(NaiveDate, &Portfolio)> {
        self.states.iter().next().map(|(d, p)| (*d, p))
    }

    pub fn last(&self) -> Option<(NaiveDate, &Portfolio)> {
        self.states.iter().next_back().map(|(d, p)| (*d, p))
    }

    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, &Portfolio)> {
        self.states.iter().map(|(d, p)| (*d, p))
    }

    /// Total value of every state, priced at the closest market row on or
    /// before its date.
    pub fn valuations(&self, market: &MarketSnapshot) -> Result<Vec<EquityPoint>, TradesimError> {
        self.iter()
            .map(|(date, portfolio)| {
                let mut equity = portfolio.cash;
                for holding in portfolio.shares().iter().filter(|s| s.amount > 0) {
                    let price = market
                        .get(holding.company)
                        .and_then(|s| s.price_on_or_before(date))
                        .ok_or(TradesimError::MissingPrice {
                            company: holding.company,
                            date,
                        })?;
                    equity += holding.amount as f64 * price;
                }
                Ok(EquityPoint { date, equity })
            })
            .collect()
    }
}

/// Trajectories of all evaluated portfolios, in pairing order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Trajectories {
    trajectories: Vec<Trajectory>,
}

impl Trajectories {
    pub fn get(&self, name: &str) -> Option<&Trajectory> {
        self.trajectories.iter().find(|t| t.name == name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.trajectories.iter().map(|t| t.name.as_str())
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Trajectory> {
        self.trajectories.iter()
    }

    pub fn len(&self) -> usize {
        self.trajectories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trajectories.is_empty()
    }

    pub fn into_map(self) -> BTreeMap<String, BTreeMap<NaiveDate, Portfolio>> {
        self.trajectories
            .into_iter()
            .map(|t| (t.name, t.states))
            .collect()
    }
}

impl<'a> IntoIterator for &'a Trajectories {
    type Item = &'a Trajectory;
    type IntoIter = std::slice::Iter<'a, Trajectory>;

    fn into_iter(self) -> Self::IntoIter {
        self.trajectories.iter()
    }
}

pub struct Pairing {
    pub portfolio: Portfolio,
    pub trader: Box<dyn Trader>,
}

pub struct PortfolioEvaluator {
    pairings: Vec<Pairing>,
    observer: Box<dyn EvaluationObserver>,
}

impl PortfolioEvaluator {
    /// Pairings are evaluated in the given order. Portfolio names must be unique.
    pub fn new(pairings: Vec<(Portfolio, Box<dyn Trader>)>) -> Result<Self, TradesimError> {
        let mut seen = HashSet::new();
        for (portfolio, _) in &pairings {
            if !seen.insert(portfolio.name.clone()) {
                return Err(TradesimError::DuplicatePortfolioName(portfolio.name.clone()));
            }
        }
        Ok(PortfolioEvaluator {
            pairings: pairings
                .into_iter()
                .map(|(portfolio, trader)| Pairing { portfolio, trader })
                .collect(),
            observer: Box::new(NullObserver),
        })
    }

    pub fn with_observer(mut self, observer: Box<dyn EvaluationObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn portfolios(&self) -> impl Iterator<Item = &Portfolio> {
        self.pairings.iter().map(|p| &p.portfolio)
    }

    /// Simulates the last `evaluation_offset` rows (all rows when `None`).
    ///
    /// Produces exactly `evaluation_offset` entries per portfolio: one
    /// baseline plus one per trading day.
    pub fn inspect_over_time(
        &mut self,
        market: &MarketSnapshot,
        evaluation_offset: Option<usize>,
    ) -> Result<Trajectories, TradesimError> {
        let rows = market.check_alignment()?;
        let offset = evaluation_offset.unwrap_or(rows);
        self.run(market, rows, offset)
    }

    /// Simulates from `start_date`, located in the reference series.
    pub fn inspect_over_time_with_start_date(
        &mut self,
        market: &MarketSnapshot,
        start_date: NaiveDate,
    ) -> Result<Trajectories, TradesimError> {
        let rows = market.check_alignment()?;
        let index = market
            .reference()
            .and_then(|(_, series)| series.index_of(start_date))
            .ok_or(TradesimError::StartDateNotFound(start_date))?;
        self.run(market, rows, rows - index)
    }

    fn run(
        &mut self,
        market: &MarketSnapshot,
        rows: usize,
        offset: usize,
    ) -> Result<Trajectories, TradesimError> {
        if offset < 2 || offset > rows {
            return Err(TradesimError::OffsetOutOfRange { offset, rows });
        }
        let ticks = offset - 1;

        let names: Vec<&str> = self.pairings.iter().map(|p| p.portfolio.name.as_str()).collect();
        self.observer.on_run_start(&names, ticks);

        let mut trajectories: Vec<Trajectory> = self
            .pairings
            .iter()
            .map(|p| Trajectory::new(p.portfolio.name.clone()))
            .collect();
        let mut working: Vec<Portfolio> =
            self.pairings.iter().map(|p| p.portfolio.clone()).collect();

        for tick in (1..=ticks).rev() {
            let snapshot = market.as_of(rows - tick + 1);
            let current_date = snapshot.last_date().ok_or(TradesimError::EmptyMarket)?;

            if tick == ticks {
                let baseline = current_date
                    .pred_opt()
                    .ok_or(TradesimError::DateOutOfRange(current_date))?;
                for (trajectory, portfolio) in trajectories.iter_mut().zip(&working) {
                    trajectory.states.insert(baseline, portfolio.clone());
                }
            }

            self.observer.on_tick(current_date);

            for ((pairing, portfolio), trajectory) in self
                .pairings
                .iter_mut()
                .zip(working.iter_mut())
                .zip(trajectories.iter_mut())
            {
                let value = portfolio.total_value(current_date, &snapshot)?;
                let orders = pairing.trader.decide(portfolio, value, &snapshot)?;
                self.observer
                    .on_decision(&portfolio.name, current_date, value, &orders);

                let outcome = portfolio.apply_detailed(&snapshot, &orders)?;
                for (order, reason) in &outcome.rejected {
                    self.observer
                        .on_order_rejected(&portfolio.name, current_date, order, *reason);
                }

                trajectory.states.insert(current_date, outcome.portfolio.clone());
                *portfolio = outcome.portfolio;
            }
        }

        self.observer.on_run_end(ticks);
        Ok(Trajectories { trajectories })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::company::Company;
    use crate::domain::order::OrderList;
    use crate::domain::stock_series::{StockRow, StockSeries};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 2, d).unwrap()
    }

    fn series(prices: &[f64]) -> StockSeries {
        StockSeries::new(
            prices
                .iter()
                .enumerate()
                .map(|(i, &p)| StockRow::new(date(i as u32 + 1), p))
                .collect(),
        )
        .unwrap()
    }

    fn market(a: &[f64], b: &[f64]) -> MarketSnapshot {
        MarketSnapshot::new()
            .with_series(Company::CompanyA, series(a))
            .with_series(Company::CompanyB, series(b))
    }

    /// Buys one share of A every tick and remembers what it saw.
    struct RecordingTrader {
        seen_dates: Rc<RefCell<Vec<NaiveDate>>>,
    }

    impl Trader for RecordingTrader {
        fn decide(
            &mut self,
            _portfolio: &Portfolio,
            _value: f64,
            market: &MarketSnapshot,
        ) -> Result<OrderList, TradesimError> {
            self.seen_dates
                .borrow_mut()
                .push(market.last_date().unwrap());
            let mut orders = OrderList::new();
            orders.buy(Company::CompanyA, 1);
            Ok(orders)
        }
    }

    struct IdleTrader;

    fn evaluator_with(portfolio: Portfolio, trader: impl Trader + 'static) -> PortfolioEvaluator {
        PortfolioEvaluator::new(vec![(portfolio, Box::new(trader) as Box<dyn Trader>)]).unwrap()
    }

    impl Trader for IdleTrader {
        fn decide(
            &mut self,
            _portfolio: &Portfolio,
            _value: f64,
            _market: &MarketSnapshot,
        ) -> Result<OrderList, TradesimError> {
            Ok(OrderList::new())
        }
    }

    #[test]
    fn duplicate_names_rejected() {
        let result = PortfolioEvaluator::new(vec![
            (Portfolio::new("same", 1.0), Box::new(IdleTrader) as Box<dyn Trader>),
            (Portfolio::new("same", 2.0), Box::new(IdleTrader) as Box<dyn Trader>),
        ]);
        assert!(matches!(
            result,
            Err(TradesimError::DuplicatePortfolioName(ref n)) if n == "same"
        ));
    }

    #[test]
    fn trajectory_has_offset_entries_with_baseline() {
        let m = market(&[10.0, 11.0, 12.0, 13.0, 14.0], &[1.0; 5]);
        let mut evaluator = evaluator_with(Portfolio::new("idle", 100.0), IdleTrader);

        let result = evaluator.inspect_over_time(&m, Some(3)).unwrap();
        let trajectory = result.get("idle").unwrap();
        assert_eq!(trajectory.len(), 3);
        let dates: Vec<_> = trajectory.iter().map(|(d, _)| d).collect();
        assert_eq!(dates, vec![date(3), date(4), date(5)]);
    }

    #[test]
    fn default_offset_covers_whole_series() {
        let m = market(&[10.0, 11.0, 12.0, 13.0], &[1.0; 4]);
        let mut evaluator = evaluator_with(Portfolio::new("idle", 100.0), IdleTrader);

        let result = evaluator.inspect_over_time(&m, None).unwrap();
        let trajectory = result.get("idle").unwrap();
        assert_eq!(trajectory.len(), 4);
        assert_eq!(trajectory.first().unwrap().0, date(1));
    }

    #[test]
    fn traders_never_see_future_rows() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let trader = RecordingTrader {
            seen_dates: Rc::clone(&seen),
        };
        let m = market(&[10.0, 11.0, 12.0, 13.0], &[1.0; 4]);
        let mut evaluator = evaluator_with(Portfolio::new("rec", 100.0), trader);

        evaluator.inspect_over_time(&m, Some(3)).unwrap();
        assert_eq!(*seen.borrow(), vec![date(3), date(4)]);
    }

    #[test]
    fn orders_fill_at_current_day_price() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let trader = RecordingTrader { seen_dates: seen };
        let m = market(&[10.0, 20.0, 30.0], &[1.0; 3]);
        let mut evaluator = evaluator_with(Portfolio::new("rec", 100.0), trader);

        let result = evaluator.inspect_over_time(&m, None).unwrap();
        let trajectory = result.get("rec").unwrap();
        assert_eq!(trajectory.get(date(1)).unwrap().cash, 100.0);
        assert_eq!(trajectory.get(date(2)).unwrap().cash, 80.0);
        let last = trajectory.get(date(3)).unwrap();
        assert_eq!(last.cash, 50.0);
        assert_eq!(last.get_amount(Company::CompanyA), 2);
    }

    #[test]
    fn initial_portfolios_are_not_consumed() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let trader = RecordingTrader { seen_dates: seen };
        let m = market(&[10.0, 20.0, 30.0], &[1.0; 3]);
        let mut evaluator = evaluator_with(Portfolio::new("rec", 100.0), trader);

        let first = evaluator.inspect_over_time(&m, None).unwrap();
        let second = evaluator.inspect_over_time(&m, None).unwrap();
        assert_eq!(first, second);
        assert_eq!(evaluator.portfolios().next().unwrap().cash, 100.0);
    }

    #[test]
    fn length_mismatch_aborts_before_trading() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let trader = RecordingTrader {
            seen_dates: Rc::clone(&seen),
        };
        let m = market(&[10.0, 11.0, 12.0], &[1.0, 2.0]);
        let mut evaluator = evaluator_with(Portfolio::new("rec", 100.0), trader);

        let err = evaluator.inspect_over_time(&m, None).unwrap_err();
        assert!(matches!(err, TradesimError::LengthMismatch { .. }));
        assert!(seen.borrow().is_empty());
    }

    #[test]
    fn offset_out_of_range_rejected() {
        let m = market(&[10.0, 11.0, 12.0], &[1.0; 3]);
        let mut evaluator = evaluator_with(Portfolio::new("idle", 1.0), IdleTrader);

        for offset in [0, 1, 4] {
            let err = evaluator.inspect_over_time(&m, Some(offset)).unwrap_err();
            assert!(matches!(err, TradesimError::OffsetOutOfRange { rows: 3, .. }));
        }
    }

    #[test]
    fn start_date_converts_to_offset() {
        let m = market(&[10.0, 11.0, 12.0, 13.0, 14.0], &[1.0; 5]);
        let mut evaluator = evaluator_with(Portfolio::new("idle", 1.0), IdleTrader);

        let by_date = evaluator
            .inspect_over_time_with_start_date(&m, date(3))
            .unwrap();
        let by_offset = evaluator.inspect_over_time(&m, Some(3)).unwrap();
        assert_eq!(by_date, by_offset);
    }

    #[test]
    fn unknown_start_date_rejected() {
        let m = market(&[10.0, 11.0], &[1.0; 2]);
        let mut evaluator = evaluator_with(Portfolio::new("idle", 1.0), IdleTrader);

        let err = evaluator
            .inspect_over_time_with_start_date(&m, date(20))
            .unwrap_err();
        assert!(matches!(err, TradesimError::StartDateNotFound(_)));
    }

    #[test]
    fn valuations_price_baseline_on_prior_row() {
        let m = market(&[10.0, 20.0, 30.0], &[1.0; 3]);
        let mut evaluator = evaluator_with(
            Portfolio::new("idle", 5.0).with_shares(Company::CompanyA, 2),
            IdleTrader,
        );

        let result = evaluator.inspect_over_time(&m, None).unwrap();
        let values: Vec<f64> = result
            .get("idle")
            .unwrap()
            .valuations(&m)
            .unwrap()
            .iter()
            .map(|p| p.equity)
            .collect();
        assert_eq!(values, vec![25.0, 45.0, 65.0]);
    }
}
