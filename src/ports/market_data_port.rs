//! Market data source port trait.

use crate::domain::error::TradesimError;
use crate::domain::market::MarketSnapshot;

pub trait MarketDataPort {
    /// Full price history for every company, aligned by date.
    fn load_market(&self) -> Result<MarketSnapshot, TradesimError>;
}
