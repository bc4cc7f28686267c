//! Return distribution histogram.
//!
//! Bins are of equal width between the sample minimum and maximum. Each bin
//! is half-open `[lower, upper)` except the last, which also holds the
//! maximum.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of bins used when none is given.
pub const DEFAULT_BINS: usize = 50;

/// Errors building a histogram.
#[derive(Debug, Error, PartialEq)]
pub enum HistogramError {
    /// No values to bin.
    #[error("Cannot build a histogram from an empty sample")]
    Empty,

    /// Zero bins requested.
    #[error("Histogram needs at least one bin")]
    NoBins,

    /// A value was NaN or infinite.
    #[error("Non-finite value at index {0}")]
    NonFinite(usize),
}

/// Equal-width histogram of a sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Histogram {
    lower: f64,
    upper: f64,
    counts: Vec<usize>,
}

impl Histogram {
    /// Bin `values` into `bins` equal-width bins.
    ///
    /// A sample whose values are all equal is binned over `(v - 0.5, v + 0.5)`.
    pub fn from_values(values: &[f64], bins: usize) -> Result<Self, HistogramError> {
        if values.is_empty() {
            return Err(HistogramError::Empty);
        }
        if bins == 0 {
            return Err(HistogramError::NoBins);
        }
        if let Some(i) = values.iter().position(|v| !v.is_finite()) {
            return Err(HistogramError::NonFinite(i));
        }

        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let (lower, upper) = if max > min {
            (min, max)
        } else {
            (min - 0.5, max + 0.5)
        };

        let mut histogram = Self {
            lower,
            upper,
            counts: vec![0; bins],
        };
        for &value in values {
            if let Some(i) = histogram.bin_index(value) {
                histogram.counts[i] += 1;
            }
        }

        Ok(histogram)
    }

    /// Bin holding `value`, or `None` outside the histogram range.
    pub fn bin_index(&self, value: f64) -> Option<usize> {
        if !(self.lower..=self.upper).contains(&value) {
            return None;
        }
        let i = ((value - self.lower) / self.bin_width()).floor() as usize;
        Some(i.min(self.counts.len() - 1))
    }

    /// Number of bins.
    pub fn bins(&self) -> usize {
        self.counts.len()
    }

    /// Width of every bin.
    pub fn bin_width(&self) -> f64 {
        (self.upper - self.lower) / self.counts.len() as f64
    }

    /// Lower edge of the first bin.
    pub const fn lower(&self) -> f64 {
        self.lower
    }

    /// Upper edge of the last bin.
    pub const fn upper(&self) -> f64 {
        self.upper
    }

    /// Count per bin.
    pub fn counts(&self) -> &[usize] {
        &self.counts
    }

    /// Edges of bin `i` as `(lower, upper)`.
    pub fn edges(&self, i: usize) -> (f64, f64) {
        let width = self.bin_width();
        let lower = self.lower + width * i as f64;
        let upper = if i + 1 == self.counts.len() {
            self.upper
        } else {
            lower + width
        };
        (lower, upper)
    }

    /// Total number of binned values.
    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }

    /// Render horizontal bars, at most `width` characters long.
    ///
    /// Edges are shown as percentages. The bin containing `marker` (usually
    /// the VaR quantile return) is flagged with `<- VaR`.
    pub fn to_ascii(&self, width: usize, marker: Option<f64>) -> String {
        let peak = self.counts.iter().copied().max().unwrap_or(0).max(1);
        let marked = marker.and_then(|m| self.bin_index(m));

        let mut output = String::new();
        for (i, &count) in self.counts.iter().enumerate() {
            let (lo, hi) = self.edges(i);
            let bar_len = (count * width).div_ceil(peak);
            output.push_str(&format!(
                "{:>8.3}% .. {:>8.3}% | {:>5} {}",
                lo * 100.0,
                hi * 100.0,
                count,
                "█".repeat(bar_len)
            ));
            if marked == Some(i) {
                output.push_str(" <- VaR");
            }
            output.push('\n');
        }
        output
    }
}
