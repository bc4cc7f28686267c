//! Error types for risk computations.

use thiserror::Error;

/// Result type for risk computations.
pub type Result<T> = std::result::Result<T, RiskError>;

/// Errors that can occur while computing returns and Value-at-Risk.
#[derive(Debug, Error)]
pub enum RiskError {
    /// Insufficient data for estimation
    #[error("Insufficient data: need at least {required} observations, got {actual}")]
    InsufficientData {
        /// Required number of observations
        required: usize,
        /// Actual number of observations
        actual: usize,
    },

    /// Confidence level outside (0, 1)
    #[error("Invalid confidence level: {0} (must be between 0 and 1)")]
    InvalidConfidence(f64),

    /// Percentile outside [0, 1]
    #[error("Invalid percentile: {0} (must be between 0 and 1)")]
    InvalidPercentile(f64),

    /// Invalid portfolio weights
    #[error("Invalid portfolio weights: {0}")]
    InvalidWeights(String),

    /// Dimension mismatch
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected dimension
        expected: usize,
        /// Actual dimension
        actual: usize,
    },

    /// Price that cannot produce a return
    #[error("Invalid price for {symbol} on {date}: {price}")]
    InvalidPrice {
        /// Symbol of the offending price
        symbol: String,
        /// Date of the offending price
        date: String,
        /// The price itself
        price: f64,
    },

    /// Dates not strictly increasing
    #[error("Dates must be strictly increasing: {previous} is followed by {next}")]
    UnsortedDates {
        /// Earlier row date
        previous: String,
        /// Following row date
        next: String,
    },

    /// NaN or infinite value in a return series
    #[error("Non-finite return at position {0}")]
    NonFiniteReturn(usize),

    /// Symbol requested more than once
    #[error("Duplicate symbol: {0}")]
    DuplicateSymbol(String),

    /// Null or out-of-range date in a quote frame
    #[error("Invalid date in quotes: {0}")]
    InvalidDate(String),

    /// Symbol without any quotes
    #[error("No quotes for symbol {0}")]
    MissingSymbol(String),

    /// Polars error
    #[error("Polars error: {0}")]
    Polars(#[from] polars::prelude::PolarsError),

    /// Distribution construction error
    #[error("Distribution error: {0}")]
    Distribution(String),
}
