//! Portfolio weights.

use crate::error::{Result, RiskError};
use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// Allowed deviation of the weight sum from 1.
pub const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

/// Long-only portfolio weights that sum to one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<f64>", into = "Vec<f64>")]
pub struct Weights(Array1<f64>);

impl Weights {
    /// Create validated weights.
    ///
    /// # Errors
    /// Fails when the list is empty, a weight is negative or not finite, or
    /// the weights do not sum to 1 within [`WEIGHT_SUM_TOLERANCE`].
    pub fn new(weights: Vec<f64>) -> Result<Self> {
        validate_components(&weights)?;

        let total: f64 = weights.iter().sum();
        if (total - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(RiskError::InvalidWeights(format!(
                "weights sum to {total}, expected 1"
            )));
        }

        Ok(Self(Array1::from(weights)))
    }

    /// Equal weights `1/n` for `n` assets.
    pub fn equal(n: usize) -> Result<Self> {
        if n == 0 {
            return Err(RiskError::InvalidWeights("no assets".to_string()));
        }
        Ok(Self(Array1::from_elem(n, 1.0 / n as f64)))
    }

    /// Number of assets.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false for validated weights.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Weights as an array.
    pub const fn as_array(&self) -> &Array1<f64> {
        &self.0
    }

    /// Weights as a vector.
    pub fn to_vec(&self) -> Vec<f64> {
        self.0.to_vec()
    }
}

fn validate_components(weights: &[f64]) -> Result<()> {
    if weights.is_empty() {
        return Err(RiskError::InvalidWeights("no assets".to_string()));
    }

    if let Some((i, w)) = weights
        .iter()
        .enumerate()
        .find(|(_, w)| !w.is_finite() || **w < 0.0)
    {
        return Err(RiskError::InvalidWeights(format!(
            "weight {i} is {w}, expected a finite non-negative value"
        )));
    }

    Ok(())
}

impl TryFrom<Vec<f64>> for Weights {
    type Error = RiskError;

    fn try_from(weights: Vec<f64>) -> Result<Self> {
        Self::new(weights)
    }
}

impl From<Weights> for Vec<f64> {
    fn from(weights: Weights) -> Self {
        weights.to_vec()
    }
}
