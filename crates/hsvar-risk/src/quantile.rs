//! Empirical percentiles.
//!
//! All methods work on the virtual index `h = (n - 1) * q` of the sorted
//! sample `x[0] <= ... <= x[n-1]`:
//!
//! | method     | value                                          |
//! |------------|------------------------------------------------|
//! | `Linear`   | `x[floor h] + (h - floor h) * (x[ceil h] - x[floor h])` |
//! | `Lower`    | `x[floor h]`                                   |
//! | `Higher`   | `x[ceil h]`                                    |
//! | `Nearest`  | `x[round h]`, ties to even                     |
//! | `Midpoint` | `(x[floor h] + x[ceil h]) / 2`                 |

use crate::error::{Result, RiskError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Percentile interpolation method.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PercentileMethod {
    /// Linear interpolation between the two closest ranks
    #[default]
    Linear,
    /// Lower of the two closest ranks
    Lower,
    /// Higher of the two closest ranks
    Higher,
    /// Closest rank
    Nearest,
    /// Mean of the two closest ranks
    Midpoint,
}

impl PercentileMethod {
    /// All methods.
    pub const fn all() -> [Self; 5] {
        [
            Self::Linear,
            Self::Lower,
            Self::Higher,
            Self::Nearest,
            Self::Midpoint,
        ]
    }

    /// Lowercase name.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Linear => "linear",
            Self::Lower => "lower",
            Self::Higher => "higher",
            Self::Nearest => "nearest",
            Self::Midpoint => "midpoint",
        }
    }
}

impl fmt::Display for PercentileMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PercentileMethod {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let normalized = s.to_lowercase();
        Self::all()
            .into_iter()
            .find(|m| m.name() == normalized)
            .ok_or_else(|| {
                format!("Unknown percentile method: {s} (expected linear, lower, higher, nearest or midpoint)")
            })
    }
}

/// Percentile `q` (in `[0, 1]`) of an unsorted sample.
///
/// # Errors
/// Fails on an empty sample, a NaN value, or `q` outside `[0, 1]`.
pub fn percentile(values: &[f64], q: f64, method: PercentileMethod) -> Result<f64> {
    if let Some(i) = values.iter().position(|v| v.is_nan()) {
        return Err(RiskError::NonFiniteReturn(i));
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    percentile_sorted(&sorted, q, method)
}

/// Percentile `q` (in `[0, 1]`) of a sample already sorted ascending.
pub fn percentile_sorted(sorted: &[f64], q: f64, method: PercentileMethod) -> Result<f64> {
    if sorted.is_empty() {
        return Err(RiskError::InsufficientData {
            required: 1,
            actual: 0,
        });
    }
    if !(0.0..=1.0).contains(&q) {
        return Err(RiskError::InvalidPercentile(q));
    }

    let h = (sorted.len() - 1) as f64 * q;
    let lo = h.floor() as usize;
    let hi = h.ceil() as usize;

    let value = match method {
        PercentileMethod::Linear => sorted[lo] + (h - lo as f64) * (sorted[hi] - sorted[lo]),
        PercentileMethod::Lower => sorted[lo],
        PercentileMethod::Higher => sorted[hi],
        PercentileMethod::Nearest => sorted[h.round_ties_even() as usize],
        PercentileMethod::Midpoint => 0.5 * (sorted[lo] + sorted[hi]),
    };

    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    /// 1..=10, shuffled.
    const SAMPLE: [f64; 10] = [7.0, 2.0, 10.0, 1.0, 5.0, 3.0, 9.0, 4.0, 8.0, 6.0];

    // h = 9 * 0.05 = 0.45
    #[rstest]
    #[case(PercentileMethod::Linear, 1.45)]
    #[case(PercentileMethod::Lower, 1.0)]
    #[case(PercentileMethod::Higher, 2.0)]
    #[case(PercentileMethod::Nearest, 1.0)]
    #[case(PercentileMethod::Midpoint, 1.5)]
    fn test_fifth_percentile(#[case] method: PercentileMethod, #[case] expected: f64) {
        assert_relative_eq!(
            percentile(&SAMPLE, 0.05, method).unwrap(),
            expected,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_median_and_extremes() {
        let linear = PercentileMethod::Linear;
        assert_relative_eq!(percentile(&SAMPLE, 0.5, linear).unwrap(), 5.5);
        assert_relative_eq!(percentile(&SAMPLE, 0.0, linear).unwrap(), 1.0);
        assert_relative_eq!(percentile(&SAMPLE, 1.0, linear).unwrap(), 10.0);
    }

    #[test]
    fn test_nearest_ties_to_even() {
        // h = 4 * 0.375 = 1.5 rounds to 2; h = 4 * 0.625 = 2.5 rounds to 2
        let sorted = [10.0, 20.0, 30.0, 40.0, 50.0];
        let nearest = PercentileMethod::Nearest;
        assert_eq!(percentile_sorted(&sorted, 0.375, nearest).unwrap(), 30.0);
        assert_eq!(percentile_sorted(&sorted, 0.625, nearest).unwrap(), 30.0);
    }

    #[test]
    fn test_single_value() {
        for method in PercentileMethod::all() {
            assert_eq!(percentile(&[0.42], 0.05, method).unwrap(), 0.42);
        }
    }

    #[test]
    fn test_invalid_inputs() {
        let linear = PercentileMethod::Linear;
        assert!(matches!(
            percentile(&[], 0.05, linear),
            Err(RiskError::InsufficientData { .. })
        ));
        assert!(matches!(
            percentile(&SAMPLE, 1.5, linear),
            Err(RiskError::InvalidPercentile(_))
        ));
        assert!(matches!(
            percentile(&SAMPLE, -0.1, linear),
            Err(RiskError::InvalidPercentile(_))
        ));
        assert!(matches!(
            percentile(&[1.0, f64::NAN], 0.5, linear),
            Err(RiskError::NonFiniteReturn(1))
        ));
    }

    #[test]
    fn test_parse_method() {
        assert_eq!(
            "Midpoint".parse::<PercentileMethod>().unwrap(),
            PercentileMethod::Midpoint
        );
        assert!("cubic".parse::<PercentileMethod>().is_err());
    }
}
