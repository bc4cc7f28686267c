//! Descriptive statistics of a return series.

use crate::error::{Result, RiskError};
use ndarray::ArrayView1;
use serde::{Deserialize, Serialize};

/// Summary statistics of a return series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReturnStatistics {
    /// Number of returns.
    pub count: usize,
    /// Arithmetic mean.
    pub mean: f64,
    /// Sample standard deviation (n - 1 denominator).
    pub std_dev: f64,
    /// Smallest return.
    pub min: f64,
    /// Largest return.
    pub max: f64,
}

impl ReturnStatistics {
    /// Compute statistics; the standard deviation is zero for a single return.
    pub fn from_returns(returns: &[f64]) -> Result<Self> {
        if returns.is_empty() {
            return Err(RiskError::InsufficientData {
                required: 1,
                actual: 0,
            });
        }
        if let Some(i) = returns.iter().position(|r| !r.is_finite()) {
            return Err(RiskError::NonFiniteReturn(i));
        }

        let view = ArrayView1::from(returns);
        let count = returns.len();
        let mean = view.mean().unwrap_or(0.0);
        let std_dev = if count > 1 { view.std(1.0) } else { 0.0 };
        let min = view.iter().copied().fold(f64::INFINITY, f64::min);
        let max = view.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        Ok(Self {
            count,
            mean,
            std_dev,
            min,
            max,
        })
    }

    /// Standard deviation scaled to `periods_per_year` (e.g. 252 trading days).
    pub fn annualized_volatility(&self, periods_per_year: f64) -> f64 {
        self.std_dev * periods_per_year.sqrt()
    }
}
