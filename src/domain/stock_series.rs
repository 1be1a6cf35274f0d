//! Date-indexed closing price series for one company.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::error::TradesimError;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StockRow {
    pub date: NaiveDate,
    #[serde(rename = "adjusted_close")]
    pub price: f64,
}

impl StockRow {
    pub fn new(date: NaiveDate, price: f64) -> Self {
        StockRow { date, price }
    }
}

/// Ordered `(date, price)` rows with strictly increasing dates.
///
/// Deserializing goes through [`StockSeries::new`], so persisted rows are
/// validated the same way as rows built in memory.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<StockRow>", into = "Vec<StockRow>")]
pub struct StockSeries {
    rows: Vec<StockRow>,
}

impl StockSeries {
    pub fn new(rows: Vec<StockRow>) -> Result<Self, TradesimError> {
        let mut series = StockSeries {
            rows: Vec::with_capacity(rows.len()),
        };
        for row in rows {
            series.append(row.date, row.price)?;
        }
        Ok(series)
    }

    /// Appends a row; `date` must be later than the current last date and
    /// `price` finite and positive.
    pub fn append(&mut self, date: NaiveDate, price: f64) -> Result<(), TradesimError> {
        if !price.is_finite() || price <= 0.0 {
            return Err(TradesimError::InvalidPrice { date, price });
        }
        if let Some(last) = self.rows.last() {
            if date <= last.date {
                return Err(TradesimError::NonIncreasingDate {
                    previous: last.date,
                    date,
                });
            }
        }
        self.rows.push(StockRow { date, price });
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn first(&self) -> Option<&StockRow> {
        self.rows.first()
    }

    pub fn last(&self) -> Option<&StockRow> {
        self.rows.last()
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.rows.last().map(|r| r.date)
    }

    pub fn last_price(&self) -> Option<f64> {
        self.rows.last().map(|r| r.price)
    }

    pub fn get(&self, index: usize) -> Option<&StockRow> {
        self.rows.get(index)
    }

    pub fn index_of(&self, date: NaiveDate) -> Option<usize> {
        self.rows.binary_search_by_key(&date, |r| r.date).ok()
    }

    pub fn price_at(&self, date: NaiveDate) -> Option<f64> {
        self.index_of(date).map(|i| self.rows[i].price)
    }

    /// Price of the latest row dated on or before `date`.
    pub fn price_on_or_before(&self, date: NaiveDate) -> Option<f64> {
        let idx = self.rows.partition_point(|r| r.date <= date);
        idx.checked_sub(1).map(|i| self.rows[i].price)
    }

    /// The first `len` rows (all rows if `len` exceeds the length).
    pub fn prefix(&self, len: usize) -> StockSeries {
        StockSeries {
            rows: self.rows[..len.min(self.rows.len())].to_vec(),
        }
    }

    /// The last `n` rows, oldest first.
    pub fn tail(&self, n: usize) -> &[StockRow] {
        let start = self.rows.len().saturating_sub(n);
        &self.rows[start..]
    }

    pub fn prices(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.price).collect()
    }

    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.rows.iter().map(|r| r.date)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, StockRow> {
        self.rows.iter()
    }
}

impl TryFrom<Vec<StockRow>> for StockSeries {
    type Error = TradesimError;

    fn try_from(rows: Vec<StockRow>) -> Result<Self, Self::Error> {
        StockSeries::new(rows)
    }
}

impl From<StockSeries> for Vec<StockRow> {
    fn from(series: StockSeries) -> Self {
        series.rows
    }
}

impl<'a> IntoIterator for &'a StockSeries {
    type Item = &'a StockRow;
    type IntoIter = std::slice::Iter<'a, StockRow>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}
