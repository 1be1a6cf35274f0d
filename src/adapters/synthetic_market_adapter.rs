//! Synthetic market data adapter: seeded geometric random walks.

use chrono::{Duration, NaiveDate};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::{Distribution, Normal};
use std::collections::BTreeMap;
use tracing::info;

use crate::domain::company::Company;
use crate::domain::error::TradesimError;
use crate::domain::market::MarketSnapshot;
use crate::domain::stock_series::{StockRow, StockSeries};
use crate::ports::market_data_port::MarketDataPort;

/// Parameters of the generated market. `drift` and `volatility` are per day.
#[derive(Debug, Clone, PartialEq)]
pub struct MarketConfig {
    pub start_date: NaiveDate,
    pub days: usize,
    pub seed: u64,
    pub initial_prices: BTreeMap<Company, f64>,
    pub drift: f64,
    pub volatility: f64,
}

impl Default for MarketConfig {
    fn default() -> Self {
        MarketConfig {
            start_date: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap_or_default(),
            days: 250,
            seed: 42,
            initial_prices: BTreeMap::from([(Company::CompanyA, 100.0), (Company::CompanyB, 50.0)]),
            drift: 0.0005,
            volatility: 0.02,
        }
    }
}

/// One row per consecutive calendar day for every configured company. The
/// same config always produces the same market.
pub struct SyntheticMarketAdapter {
    config: MarketConfig,
}

impl SyntheticMarketAdapter {
    pub fn new(config: MarketConfig) -> Self {
        Self { config }
    }

    fn generate_series(
        &self,
        initial_price: f64,
        noise: &Normal<f64>,
        rng: &mut StdRng,
    ) -> Result<StockSeries, TradesimError> {
        let drift = self.config.drift - 0.5 * self.config.volatility.powi(2);
        let mut price = initial_price;
        let mut rows = Vec::with_capacity(self.config.days);

        for day in 0..self.config.days {
            let date = self
                .config
                .start_date
                .checked_add_signed(Duration::days(day as i64))
                .ok_or(TradesimError::DateOutOfRange(self.config.start_date))?;
            if day > 0 {
                price *= (drift + noise.sample(rng)).exp();
            }
            rows.push(StockRow::new(date, price));
        }
        StockSeries::new(rows)
    }
}

impl MarketDataPort for SyntheticMarketAdapter {
    fn load_market(&self) -> Result<MarketSnapshot, TradesimError> {
        let invalid_volatility = |reason: String| TradesimError::ConfigInvalid {
            section: "market".to_string(),
            key: "volatility".to_string(),
            reason,
        };
        if self.config.volatility.is_nan() || self.config.volatility < 0.0 {
            return Err(invalid_volatility("volatility must be non-negative".to_string()));
        }
        let noise = Normal::new(0.0, self.config.volatility)
            .map_err(|e| invalid_volatility(e.to_string()))?;
        let mut rng = StdRng::seed_from_u64(self.config.seed);

        let mut market = MarketSnapshot::new();
        for (&company, &initial_price) in &self.config.initial_prices {
            market.insert(company, self.generate_series(initial_price, &noise, &mut rng)?);
        }

        info!(
            companies = self.config.initial_prices.len(),
            days = self.config.days,
            seed = self.config.seed,
            "generated synthetic market"
        );
        Ok(market)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(seed: u64) -> MarketConfig {
        MarketConfig {
            seed,
            days: 30,
            ..MarketConfig::default()
        }
    }

    #[test]
    fn generates_aligned_series() {
        let market = SyntheticMarketAdapter::new(config(7)).load_market().unwrap();
        assert_eq!(market.check_alignment().unwrap(), 30);
        let a = market.get(Company::CompanyA).unwrap();
        assert_eq!(a.first().unwrap().date, NaiveDate::from_ymd_opt(2020, 1, 1).unwrap());
        assert_eq!(a.last().unwrap().date, NaiveDate::from_ymd_opt(2020, 1, 30).unwrap());
        assert_eq!(a.first().unwrap().price, 100.0);
    }

    #[test]
    fn prices_stay_positive() {
        let cfg = MarketConfig {
            days: 500,
            volatility: 0.2,
            ..MarketConfig::default()
        };
        let market = SyntheticMarketAdapter::new(cfg).load_market().unwrap();
        for (_, series) in market.iter() {
            assert!(series.iter().all(|row| row.price > 0.0));
        }
    }

    #[test]
    fn same_seed_same_market() {
        let a = SyntheticMarketAdapter::new(config(11)).load_market().unwrap();
        let b = SyntheticMarketAdapter::new(config(11)).load_market().unwrap();
        let c = SyntheticMarketAdapter::new(config(12)).load_market().unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn zero_volatility_follows_drift() {
        let cfg = MarketConfig {
            days: 3,
            drift: 0.01,
            volatility: 0.0,
            ..MarketConfig::default()
        };
        let market = SyntheticMarketAdapter::new(cfg).load_market().unwrap();
        let prices = market.get(Company::CompanyA).unwrap().prices();
        approx::assert_relative_eq!(prices[2], 100.0 * (0.02f64).exp(), epsilon = 1e-9);
    }

    #[test]
    fn negative_volatility_is_rejected() {
        let cfg = MarketConfig {
            volatility: -1.0,
            ..MarketConfig::default()
        };
        let result = SyntheticMarketAdapter::new(cfg).load_market();
        assert!(matches!(result, Err(TradesimError::ConfigInvalid { .. })));
    }
}
