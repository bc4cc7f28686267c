//! Asset and portfolio returns.

use crate::error::{Result, RiskError};
use crate::prices::PriceMatrix;
use crate::weights::Weights;
use chrono::NaiveDate;
use ndarray::{Array1, Array2, s};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How a return is measured between two consecutive prices.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReturnKind {
    /// `P_t / P_{t-1} - 1`
    #[default]
    Simple,
    /// `ln(P_t / P_{t-1})`
    Log,
}

impl ReturnKind {
    /// Lowercase name.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Simple => "simple",
            Self::Log => "log",
        }
    }
}

impl fmt::Display for ReturnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ReturnKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "simple" | "pct" | "arithmetic" => Ok(Self::Simple),
            "log" | "ln" | "continuous" => Ok(Self::Log),
            _ => Err(format!("Unknown return kind: {s} (expected simple or log)")),
        }
    }
}

/// Per-asset returns on aligned dates.
///
/// Row `t` holds the return from the price on date `t - 1` to the price on
/// `dates[t]`, so there is one row fewer than in the source price matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct ReturnMatrix {
    dates: Vec<NaiveDate>,
    symbols: Vec<String>,
    values: Array2<f64>,
    kind: ReturnKind,
}

impl ReturnMatrix {
    /// Dates at the end of each return period.
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    /// Asset symbols in column order.
    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    /// Returns as a (periods x assets) matrix.
    pub const fn values(&self) -> &Array2<f64> {
        &self.values
    }

    /// Return definition used.
    pub const fn kind(&self) -> ReturnKind {
        self.kind
    }

    /// Number of return periods.
    pub fn n_periods(&self) -> usize {
        self.dates.len()
    }
}

/// Dated portfolio returns.
#[derive(Debug, Clone, PartialEq)]
pub struct PortfolioReturns {
    dates: Vec<NaiveDate>,
    values: Array1<f64>,
    kind: ReturnKind,
}

impl PortfolioReturns {
    /// Dates at the end of each return period.
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    /// Portfolio returns in date order.
    pub const fn values(&self) -> &Array1<f64> {
        &self.values
    }

    /// Portfolio returns as a slice.
    pub fn as_slice(&self) -> &[f64] {
        self.values
            .as_slice()
            .unwrap_or_default()
    }

    /// Return definition used.
    pub const fn kind(&self) -> ReturnKind {
        self.kind
    }

    /// Number of return periods.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True when there are no periods.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate over `(date, return)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, f64)> + '_ {
        self.dates.iter().copied().zip(self.values.iter().copied())
    }
}

/// Compute per-asset returns between consecutive aligned prices.
///
/// # Errors
/// Needs at least two dates.
pub fn compute_returns(prices: &PriceMatrix, kind: ReturnKind) -> Result<ReturnMatrix> {
    let n_days = prices.n_days();
    if n_days < 2 {
        return Err(RiskError::InsufficientData {
            required: 2,
            actual: n_days,
        });
    }

    let values = prices.values();
    let previous = values.slice(s![..-1, ..]);
    let current = values.slice(s![1.., ..]);
    let ratios = &current / &previous;

    let values = match kind {
        ReturnKind::Simple => ratios - 1.0,
        ReturnKind::Log => ratios.mapv(f64::ln),
    };

    Ok(ReturnMatrix {
        dates: prices.dates()[1..].to_vec(),
        symbols: prices.symbols().to_vec(),
        values,
        kind,
    })
}

/// Combine asset returns into portfolio returns: `R_p,t = sum_i w_i r_i,t`.
///
/// Weights are held constant (daily rebalancing). For log returns the
/// weighted sum is the usual first-order approximation.
pub fn portfolio_returns(returns: &ReturnMatrix, weights: &Weights) -> Result<PortfolioReturns> {
    let n_assets = returns.symbols.len();
    if weights.len() != n_assets {
        return Err(RiskError::DimensionMismatch {
            expected: n_assets,
            actual: weights.len(),
        });
    }

    let values = returns.values.dot(weights.as_array());

    if let Some(i) = values.iter().position(|r| !r.is_finite()) {
        return Err(RiskError::NonFiniteReturn(i));
    }

    Ok(PortfolioReturns {
        dates: returns.dates.clone(),
        values,
        kind: returns.kind,
    })
}
