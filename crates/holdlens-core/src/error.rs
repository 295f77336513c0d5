use thiserror::Error;

use crate::filing_source::FilingError;

/// Validation and contract errors exposed by `holdlens-core`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("CIK cannot be empty")]
    EmptyCik,
    #[error("CIK must contain only ASCII digits: '{value}'")]
    CikNotNumeric { value: String },
    #[error("CIK length {len} exceeds max {max}")]
    CikTooLong { len: usize, max: usize },
    #[error("CIK must not be all zeros")]
    CikZero,

    #[error("CUSIP must be 9 ASCII alphanumeric characters: '{value}'")]
    InvalidCusip { value: String },

    #[error("ticker cannot be empty")]
    EmptyTicker,
    #[error("ticker length {len} exceeds max {max}")]
    TickerTooLong { len: usize, max: usize },
    #[error("ticker must start with an ASCII letter: '{ch}'")]
    TickerInvalidStart { ch: char },
    #[error("ticker contains invalid character '{ch}' at index {index}")]
    TickerInvalidChar { ch: char, index: usize },

    #[error("fund code must be 1-16 uppercase ASCII letters, digits, '-' or '_': '{value}'")]
    InvalidFundCode { value: String },
    #[error("fund '{code}' is not tracked")]
    UnknownFund { code: String },
    #[error("fund '{code}' is listed more than once")]
    DuplicateFund { code: String },

    #[error("invalid quarter '{value}', expected forms like 'Q4 2024', '2024Q4' or '2024-Q4'")]
    InvalidQuarter { value: String },
    #[error("quarter {quarter} lies in the future")]
    FutureQuarter { quarter: String },
    #[error("report date must be YYYY-MM-DD: '{value}'")]
    InvalidReportDate { value: String },

    #[error("user agent must name the client and a contact address: '{value}'")]
    InvalidUserAgent { value: String },
    #[error("field '{field}' must be greater than zero")]
    ZeroValue { field: &'static str },
    #[error("field '{field}' must be within [0, 1]: {value}")]
    OutOfUnitRange { field: &'static str, value: String },

    #[error("snapshot lists '{ticker}' more than once")]
    DuplicateHolding { ticker: String },
    #[error("snapshot total market value must be greater than zero")]
    EmptyPortfolio,

    #[error("reference data is invalid: {reason}")]
    InvalidReference { reason: String },
}

/// Top-level error type for core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Filing(#[from] FilingError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
