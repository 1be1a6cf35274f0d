//! Market snapshot: all visible price history keyed by company.

use chrono::NaiveDate;
use std::collections::BTreeMap;

use super::company::Company;
use super::error::TradesimError;
use super::stock_series::StockSeries;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MarketSnapshot {
    series: BTreeMap<Company, StockSeries>,
}

impl MarketSnapshot {
    pub fn new() -> Self {
        MarketSnapshot::default()
    }

    pub fn with_series(mut self, company: Company, series: StockSeries) -> Self {
        self.insert(company, series);
        self
    }

    pub fn insert(&mut self, company: Company, series: StockSeries) {
        self.series.insert(company, series);
    }

    pub fn get(&self, company: Company) -> Option<&StockSeries> {
        self.series.get(&company)
    }

    pub fn companies(&self) -> impl Iterator<Item = Company> + '_ {
        self.series.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Company, &StockSeries)> {
        self.series.iter().map(|(c, s)| (*c, s))
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// The reference series used for date lookups: the first company in order.
    pub fn reference(&self) -> Option<(Company, &StockSeries)> {
        self.series.iter().next().map(|(c, s)| (*c, s))
    }

    /// Row count of the reference series (0 when empty).
    pub fn row_count(&self) -> usize {
        self.reference().map(|(_, s)| s.len()).unwrap_or(0)
    }

    /// Every series must have the same number of rows. Returns that count.
    pub fn check_data_length(&self) -> Result<usize, TradesimError> {
        let (_, reference) = self.reference().ok_or(TradesimError::EmptyMarket)?;
        let expected = reference.len();
        for (company, series) in &self.series {
            if series.len() != expected {
                return Err(TradesimError::LengthMismatch {
                    company: *company,
                    rows: series.len(),
                    expected,
                });
            }
        }
        Ok(expected)
    }

    /// Equal lengths plus identical dates row by row.
    pub fn check_alignment(&self) -> Result<usize, TradesimError> {
        let rows = self.check_data_length()?;
        let (reference_company, reference) = self.reference().ok_or(TradesimError::EmptyMarket)?;
        for (company, series) in self.iter().skip(1) {
            let mismatch = reference
                .dates()
                .zip(series.dates())
                .position(|(a, b)| a != b);
            if let Some(row) = mismatch {
                return Err(TradesimError::DateMisaligned {
                    company,
                    reference: reference_company,
                    row,
                });
            }
        }
        Ok(rows)
    }

    /// History as of row `rows` (exclusive): every series cut to its first `rows` rows.
    pub fn as_of(&self, rows: usize) -> MarketSnapshot {
        MarketSnapshot {
            series: self
                .series
                .iter()
                .map(|(c, s)| (*c, s.prefix(rows)))
                .collect(),
        }
    }

    /// Most recent date of the reference series.
    pub fn last_date(&self) -> Option<NaiveDate> {
        self.reference().and_then(|(_, s)| s.last_date())
    }

    pub fn price_at(&self, company: Company, date: NaiveDate) -> Result<f64, TradesimError> {
        self.get(company)
            .and_then(|s| s.price_at(date))
            .ok_or(TradesimError::MissingPrice { company, date })
    }

    pub fn last_price(&self, company: Company) -> Result<f64, TradesimError> {
        self.get(company)
            .and_then(|s| s.last_price())
            .ok_or(TradesimError::NoPriceData { company })
    }
}
