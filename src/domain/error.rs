//! Domain error types.

use chrono::NaiveDate;

use super::company::Company;

/// Top-level error type for tradesim.
///
/// Rejected orders (not enough cash, not enough shares) are not errors; see
/// [`crate::domain::portfolio::RejectReason`].
#[derive(Debug, thiserror::Error)]
pub enum TradesimError {
    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("unknown company id: {0}")]
    UnknownCompany(String),

    #[error("market snapshot is empty")]
    EmptyMarket,

    #[error("series length mismatch: {company} has {rows} rows, expected {expected}")]
    LengthMismatch {
        company: Company,
        rows: usize,
        expected: usize,
    },

    #[error("series for {company} is not aligned with {reference} at row {row}")]
    DateMisaligned {
        company: Company,
        reference: Company,
        row: usize,
    },

    #[error("dates must be strictly increasing: {date} does not follow {previous}")]
    NonIncreasingDate {
        previous: NaiveDate,
        date: NaiveDate,
    },

    #[error("invalid price {price} on {date}: prices must be finite and positive")]
    InvalidPrice { date: NaiveDate, price: f64 },

    #[error("no price for {company} on {date}")]
    MissingPrice { company: Company, date: NaiveDate },

    #[error("no price data for {company}")]
    NoPriceData { company: Company },

    #[error("start date {0} not found in market data")]
    StartDateNotFound(NaiveDate),

    #[error("evaluation offset {offset} out of range: need 2..={rows}")]
    OffsetOutOfRange { offset: usize, rows: usize },

    #[error("date out of range before {0}")]
    DateOutOfRange(NaiveDate),

    #[error("duplicate portfolio name: {0}")]
    DuplicatePortfolioName(String),

    #[error("insufficient history: have {rows} rows, need {minimum}")]
    InsufficientHistory { rows: usize, minimum: usize },

    #[error("trader {name} failed: {reason}")]
    Trader { name: String, reason: String },

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&TradesimError> for std::process::ExitCode {
    fn from(err: &TradesimError) -> Self {
        let code: u8 = match err {
            TradesimError::Io(_) | TradesimError::Json(_) => 1,
            TradesimError::ConfigParse { .. }
            | TradesimError::ConfigMissing { .. }
            | TradesimError::ConfigInvalid { .. } => 2,
            TradesimError::UnknownCompany(_)
            | TradesimError::EmptyMarket
            | TradesimError::LengthMismatch { .. }
            | TradesimError::DateMisaligned { .. }
            | TradesimError::NonIncreasingDate { .. }
            | TradesimError::InvalidPrice { .. }
            | TradesimError::MissingPrice { .. }
            | TradesimError::NoPriceData { .. } => 3,
            TradesimError::StartDateNotFound(_)
            | TradesimError::OffsetOutOfRange { .. }
            | TradesimError::DateOutOfRange(_)
            | TradesimError::DuplicatePortfolioName(_) => 4,
            TradesimError::InsufficientHistory { .. } | TradesimError::Trader { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
