//! Analysis configuration.
//!
//! A configuration can be read from JSON; every field is optional and falls
//! back to the default analysis:
//!
//! ```json
//! {
//!   "portfolio": {
//!     "name": "Tech",
//!     "holdings": [
//!       { "symbol": "AAPL", "weight": 0.5 },
//!       { "symbol": "MSFT", "weight": 0.5 }
//!     ],
//!     "value": 250000
//!   },
//!   "start": "2023-01-01",
//!   "end": "2024-12-31",
//!   "confidence": 0.99,
//!   "return_kind": "log",
//!   "percentile_method": "lower"
//! }
//! ```

use crate::portfolio::Portfolio;
use chrono::NaiveDate;
use hsvar_output::DEFAULT_BINS;
use hsvar_risk::{PercentileMethod, ReturnKind, RiskError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default confidence level.
pub const DEFAULT_CONFIDENCE: f64 = 0.95;

/// Errors in a portfolio or analysis configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file could not be read.
    #[error("Failed to read config {path}: {source}")]
    Io {
        /// Path of the config file
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },

    /// Config file is not valid JSON for this schema.
    #[error("Invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Portfolio without holdings.
    #[error("Portfolio has no holdings")]
    EmptyPortfolio,

    /// Blank ticker symbol.
    #[error("Invalid symbol: {0:?}")]
    InvalidSymbol(String),

    /// Same ticker listed twice.
    #[error("Duplicate symbol: {0}")]
    DuplicateSymbol(String),

    /// Weight list does not match the symbol list.
    #[error("Expected {expected} weights, got {actual}")]
    WeightCount {
        /// Number of symbols
        expected: usize,
        /// Number of weights
        actual: usize,
    },

    /// Weights rejected by the risk layer.
    #[error(transparent)]
    InvalidWeights(#[from] RiskError),

    /// Non-positive or non-finite portfolio value.
    #[error("Invalid portfolio value: {0} (must be positive)")]
    InvalidValue(f64),

    /// Start date after end date.
    #[error("Invalid date range: {start} is after {end}")]
    InvalidDateRange {
        /// Start date
        start: NaiveDate,
        /// End date
        end: NaiveDate,
    },

    /// Confidence level outside (0, 1).
    #[error("Invalid confidence level: {0} (must be between 0 and 1)")]
    InvalidConfidence(f64),

    /// Histogram with zero bins.
    #[error("Histogram needs at least one bin")]
    NoBins,
}

/// Parameters of one Value-at-Risk analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Portfolio to analyze.
    pub portfolio: Portfolio,
    /// First calendar day of the lookback window.
    pub start: NaiveDate,
    /// Last calendar day of the lookback window (inclusive).
    pub end: NaiveDate,
    /// Confidence level, e.g. 0.95.
    pub confidence: f64,
    /// Simple or log returns.
    pub return_kind: ReturnKind,
    /// Percentile interpolation.
    pub percentile_method: PercentileMethod,
    /// Number of histogram bins.
    pub histogram_bins: usize,
    /// Also compute the normal (parametric) VaR.
    pub parametric: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            portfolio: Portfolio::default(),
            start: NaiveDate::from_ymd_opt(2023, 1, 1).unwrap_or_default(),
            end: NaiveDate::from_ymd_opt(2024, 12, 31).unwrap_or_default(),
            confidence: DEFAULT_CONFIDENCE,
            return_kind: ReturnKind::Simple,
            percentile_method: PercentileMethod::Linear,
            histogram_bins: DEFAULT_BINS,
            parametric: true,
        }
    }
}

impl AnalysisConfig {
    /// Read a configuration from a JSON file.
    ///
    /// The result is not validated; call [`AnalysisConfig::validate`] after
    /// applying any overrides.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&contents)
    }

    /// Parse a configuration from JSON text.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Check every parameter.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.portfolio.validate()?;
        if self.start > self.end {
            return Err(ConfigError::InvalidDateRange {
                start: self.start,
                end: self.end,
            });
        }
        if !(self.confidence > 0.0 && self.confidence < 1.0) {
            return Err(ConfigError::InvalidConfidence(self.confidence));
        }
        if self.histogram_bins == 0 {
            return Err(ConfigError::NoBins);
        }
        Ok(())
    }
}
