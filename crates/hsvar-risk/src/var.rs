//! Value-at-Risk estimators.
//!
//! Historical simulation takes the empirical `1 - c` percentile of observed
//! returns. The parametric estimator fits a normal distribution to the same
//! returns and is kept as a comparison figure.
//!
//! Both report the loss as a non-negative fraction of portfolio value:
//! `VaR = max(-q, 0)` where `q` is the `1 - c` quantile of returns.

use crate::error::{Result, RiskError};
use crate::quantile::{PercentileMethod, percentile_sorted};
use crate::stats::ReturnStatistics;
use serde::{Deserialize, Serialize};
use statrs::distribution::{Continuous, ContinuousCDF, Normal};
use std::fmt;

/// Estimation method behind a [`VarEstimate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VarMethod {
    /// Empirical percentile of observed returns
    Historical,
    /// Normal distribution fitted to observed returns
    Parametric,
}

impl fmt::Display for VarMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Historical => f.write_str("historical"),
            Self::Parametric => f.write_str("parametric"),
        }
    }
}

/// A single Value-at-Risk estimate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VarEstimate {
    /// Method that produced the estimate.
    pub method: VarMethod,

    /// Confidence level, e.g. 0.95.
    pub confidence: f64,

    /// Return at the `1 - confidence` quantile (signed, usually negative).
    pub quantile_return: f64,

    /// Loss at the confidence level as a fraction of value (non-negative).
    pub var: f64,

    /// Average loss on the days at or beyond the quantile (non-negative).
    pub expected_shortfall: f64,

    /// Number of returns used.
    pub observations: usize,
}

impl VarEstimate {
    fn new(
        method: VarMethod,
        confidence: f64,
        quantile_return: f64,
        shortfall_return: f64,
        observations: usize,
    ) -> Self {
        Self {
            method,
            confidence,
            quantile_return,
            var: (-quantile_return).max(0.0),
            expected_shortfall: (-shortfall_return).max(0.0),
            observations,
        }
    }

    /// VaR in currency units for a portfolio worth `portfolio_value`.
    pub fn monetary(&self, portfolio_value: f64) -> f64 {
        self.var * portfolio_value
    }

    /// Expected shortfall in currency units.
    pub fn shortfall_monetary(&self, portfolio_value: f64) -> f64 {
        self.expected_shortfall * portfolio_value
    }
}

/// Estimates Value-at-Risk from a return series.
pub trait VarEstimator {
    /// Estimate VaR from returns (one per period, any order).
    fn estimate(&self, returns: &[f64]) -> Result<VarEstimate>;

    /// Confidence level of the estimator.
    fn confidence(&self) -> f64;
}

fn validate_confidence(confidence: f64) -> Result<()> {
    if confidence > 0.0 && confidence < 1.0 {
        Ok(())
    } else {
        Err(RiskError::InvalidConfidence(confidence))
    }
}

fn validate_returns(returns: &[f64], required: usize) -> Result<()> {
    if returns.len() < required {
        return Err(RiskError::InsufficientData {
            required,
            actual: returns.len(),
        });
    }
    if let Some(i) = returns.iter().position(|r| !r.is_finite()) {
        return Err(RiskError::NonFiniteReturn(i));
    }
    Ok(())
}

/// Historical-simulation VaR.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HistoricalVar {
    confidence: f64,
    method: PercentileMethod,
}

impl HistoricalVar {
    /// Create an estimator at `confidence` with linear interpolation.
    ///
    /// # Errors
    /// `confidence` must lie strictly between 0 and 1.
    pub fn new(confidence: f64) -> Result<Self> {
        validate_confidence(confidence)?;
        Ok(Self {
            confidence,
            method: PercentileMethod::default(),
        })
    }

    /// Use a different percentile method.
    pub const fn with_method(mut self, method: PercentileMethod) -> Self {
        self.method = method;
        self
    }

    /// Percentile method in use.
    pub const fn method(&self) -> PercentileMethod {
        self.method
    }
}

impl VarEstimator for HistoricalVar {
    fn estimate(&self, returns: &[f64]) -> Result<VarEstimate> {
        validate_returns(returns, 1)?;

        let mut sorted = returns.to_vec();
        sorted.sort_by(f64::total_cmp);

        let quantile = percentile_sorted(&sorted, 1.0 - self.confidence, self.method)?;

        // The smallest return is always at or below the quantile
        let tail: Vec<f64> = sorted.iter().copied().take_while(|r| *r <= quantile).collect();
        let tail_mean = if tail.is_empty() {
            sorted[0]
        } else {
            tail.iter().sum::<f64>() / tail.len() as f64
        };

        Ok(VarEstimate::new(
            VarMethod::Historical,
            self.confidence,
            quantile,
            tail_mean,
            returns.len(),
        ))
    }

    fn confidence(&self) -> f64 {
        self.confidence
    }
}

/// Normal (variance-covariance) VaR on the portfolio return series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParametricVar {
    confidence: f64,
}

impl ParametricVar {
    /// Create an estimator at `confidence`.
    pub fn new(confidence: f64) -> Result<Self> {
        validate_confidence(confidence)?;
        Ok(Self { confidence })
    }
}

impl VarEstimator for ParametricVar {
    fn estimate(&self, returns: &[f64]) -> Result<VarEstimate> {
        validate_returns(returns, 2)?;

        let stats = ReturnStatistics::from_returns(returns)?;
        let normal = Normal::new(0.0, 1.0).map_err(|e| RiskError::Distribution(e.to_string()))?;

        let alpha = 1.0 - self.confidence;
        let z = normal.inverse_cdf(alpha);
        let quantile = stats.mean + stats.std_dev * z;
        // E[R | R <= q] = mu - sigma * phi(z) / alpha
        let tail_mean = stats.mean - stats.std_dev * normal.pdf(z) / alpha;

        Ok(VarEstimate::new(
            VarMethod::Parametric,
            self.confidence,
            quantile,
            tail_mean,
            returns.len(),
        ))
    }

    fn confidence(&self) -> f64 {
        self.confidence
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use rand::seq::SliceRandom;
    use rstest::rstest;

    /// -0.050, -0.049, ..., 0.049
    fn ladder() -> Vec<f64> {
        (0..100).map(|i| (i as f64 - 50.0) / 1000.0).collect()
    }

    #[test]
    fn test_historical_var_known_percentile() {
        let estimate = HistoricalVar::new(0.95).unwrap().estimate(&ladder()).unwrap();

        // h = 99 * 0.05 = 4.95 between -0.046 and -0.045
        assert_relative_eq!(estimate.quantile_return, -0.04505, epsilon = 1e-12);
        assert_relative_eq!(estimate.var, 0.04505, epsilon = 1e-12);
        assert_eq!(estimate.observations, 100);
        assert_eq!(estimate.method, VarMethod::Historical);

        // Tail is -0.050..=-0.046
        assert_relative_eq!(estimate.expected_shortfall, 0.048, epsilon = 1e-12);
    }

    #[rstest]
    #[case(PercentileMethod::Lower, 0.046)]
    #[case(PercentileMethod::Higher, 0.045)]
    #[case(PercentileMethod::Nearest, 0.045)]
    #[case(PercentileMethod::Midpoint, 0.0455)]
    fn test_historical_var_methods(#[case] method: PercentileMethod, #[case] expected: f64) {
        let estimate = HistoricalVar::new(0.95)
            .unwrap()
            .with_method(method)
            .estimate(&ladder())
            .unwrap();
        assert_relative_eq!(estimate.var, expected, epsilon = 1e-12);
    }

    #[test]
    fn test_var_is_non_negative_loss() {
        let gains: Vec<f64> = (1..=50).map(|i| i as f64 / 1000.0).collect();
        let estimate = HistoricalVar::new(0.95).unwrap().estimate(&gains).unwrap();

        assert!(estimate.quantile_return > 0.0);
        assert_eq!(estimate.var, 0.0);
        assert_eq!(estimate.expected_shortfall, 0.0);
        assert_eq!(estimate.monetary(100_000.0), 0.0);
    }

    #[test]
    fn test_shortfall_at_least_var() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut returns = ladder();
        returns.shuffle(&mut rng);

        for confidence in [0.9, 0.95, 0.99] {
            let estimate = HistoricalVar::new(confidence)
                .unwrap()
                .estimate(&returns)
                .unwrap();
            assert!(estimate.expected_shortfall >= estimate.var);
        }
    }

    #[test]
    fn test_order_does_not_matter() {
        let estimator = HistoricalVar::new(0.95).unwrap();
        let baseline = estimator.estimate(&ladder()).unwrap();

        let mut rng = StdRng::seed_from_u64(42);
        let mut shuffled = ladder();
        shuffled.shuffle(&mut rng);

        assert_eq!(estimator.estimate(&shuffled).unwrap(), baseline);
    }

    #[test]
    fn test_monetary_var() {
        let estimate = HistoricalVar::new(0.95).unwrap().estimate(&ladder()).unwrap();
        assert_relative_eq!(estimate.monetary(100_000.0), 4_505.0, epsilon = 1e-6);
        assert_relative_eq!(estimate.shortfall_monetary(100_000.0), 4_800.0, epsilon = 1e-6);
    }

    #[rstest]
    #[case(0.0)]
    #[case(1.0)]
    #[case(1.5)]
    #[case(-0.95)]
    #[case(f64::NAN)]
    fn test_invalid_confidence(#[case] confidence: f64) {
        assert!(matches!(
            HistoricalVar::new(confidence),
            Err(RiskError::InvalidConfidence(_))
        ));
        assert!(ParametricVar::new(confidence).is_err());
    }

    #[test]
    fn test_invalid_returns() {
        let estimator = HistoricalVar::new(0.95).unwrap();
        assert!(matches!(
            estimator.estimate(&[]),
            Err(RiskError::InsufficientData { .. })
        ));
        assert!(matches!(
            estimator.estimate(&[0.01, f64::INFINITY]),
            Err(RiskError::NonFiniteReturn(1))
        ));
    }

    #[test]
    fn test_parametric_var() {
        // mean 0, sample std 0.02
        let returns = [0.02, -0.02, 0.02, -0.02];
        let sample_std = (4.0 * 0.0004 / 3.0_f64).sqrt();

        let estimate = ParametricVar::new(0.95).unwrap().estimate(&returns).unwrap();

        assert_eq!(estimate.method, VarMethod::Parametric);
        assert_relative_eq!(estimate.var, 1.644_853_6 * sample_std, epsilon = 1e-6);
        // phi(1.6449) / 0.05 = 2.0627
        assert_relative_eq!(
            estimate.expected_shortfall,
            2.062_712_9 * sample_std,
            epsilon = 1e-6
        );
        assert!(estimate.expected_shortfall > estimate.var);
    }

    #[test]
    fn test_parametric_needs_two_returns() {
        assert!(matches!(
            ParametricVar::new(0.95).unwrap().estimate(&[0.01]),
            Err(RiskError::InsufficientData { required: 2, actual: 1 })
        ));
    }
}
