//! Aligned price matrix.
//!
//! Quotes arrive as a long frame (one row per symbol and day). Historical
//! simulation needs every asset observed on the same days, so the frame is
//! reduced to the dates on which all requested symbols traded.

use crate::error::{Result, RiskError};
use chrono::NaiveDate;
use ndarray::{Array2, ArrayView1, s};
use polars::prelude::*;

/// `NaiveDate::num_days_from_ce` of 1970-01-01, the epoch of polars `Date`.
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// Adjusted close prices of several assets on common dates.
///
/// Rows are dates (strictly increasing), columns are assets.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceMatrix {
    dates: Vec<NaiveDate>,
    symbols: Vec<String>,
    values: Array2<f64>,
}

impl PriceMatrix {
    /// Create a price matrix, validating its shape and contents.
    ///
    /// # Errors
    /// Fails when the shape does not match `dates` x `symbols`, when dates
    /// are not strictly increasing, when a symbol repeats, or when a price is
    /// not finite and strictly positive.
    pub fn new(dates: Vec<NaiveDate>, symbols: Vec<String>, values: Array2<f64>) -> Result<Self> {
        let (n_rows, n_cols) = values.dim();
        if n_rows != dates.len() {
            return Err(RiskError::DimensionMismatch {
                expected: dates.len(),
                actual: n_rows,
            });
        }
        if n_cols != symbols.len() {
            return Err(RiskError::DimensionMismatch {
                expected: symbols.len(),
                actual: n_cols,
            });
        }
        ensure_unique(&symbols)?;

        for pair in dates.windows(2) {
            if pair[1] <= pair[0] {
                return Err(RiskError::UnsortedDates {
                    previous: pair[0].to_string(),
                    next: pair[1].to_string(),
                });
            }
        }

        for ((row, col), &price) in values.indexed_iter() {
            if !price.is_finite() || price <= 0.0 {
                return Err(RiskError::InvalidPrice {
                    symbol: symbols[col].clone(),
                    date: dates[row].to_string(),
                    price,
                });
            }
        }

        Ok(Self {
            dates,
            symbols,
            values,
        })
    }

    /// Build a price matrix from a long quote frame.
    ///
    /// The frame needs `symbol`, `date` (polars `Date`) and `adjusted_close`
    /// columns. Only dates on which every requested symbol has a quote are
    /// kept, and columns follow the order of `symbols`.
    pub fn from_quotes(quotes: &DataFrame, symbols: &[String]) -> Result<Self> {
        if symbols.is_empty() {
            return Err(RiskError::InsufficientData {
                required: 1,
                actual: 0,
            });
        }
        ensure_unique(symbols)?;

        let mut aligned: Option<LazyFrame> = None;

        for symbol in symbols {
            let series = quotes
                .clone()
                .lazy()
                .filter(col("symbol").eq(lit(symbol.as_str())))
                .select([col("date"), col("adjusted_close").alias(symbol.as_str())])
                .collect()?;

            if series.height() == 0 {
                return Err(RiskError::MissingSymbol(symbol.clone()));
            }

            aligned = Some(match aligned {
                None => series.lazy(),
                Some(frame) => frame.join(
                    series.lazy(),
                    [col("date")],
                    [col("date")],
                    JoinArgs::new(JoinType::Inner),
                ),
            });
        }

        let aligned = aligned
            .ok_or(RiskError::InsufficientData {
                required: 1,
                actual: 0,
            })?
            .sort(["date"], SortMultipleOptions::default())
            .collect()?;

        let day_numbers = aligned.column("date")?.cast(&DataType::Int32)?;
        let dates = day_numbers
            .i32()?
            .into_iter()
            .map(|days| {
                days.and_then(|d| NaiveDate::from_num_days_from_ce_opt(d + UNIX_EPOCH_DAYS_FROM_CE))
                    .ok_or_else(|| RiskError::InvalidDate(format!("{days:?}")))
            })
            .collect::<Result<Vec<_>>>()?;

        let mut columns = Vec::with_capacity(symbols.len());
        for symbol in symbols {
            let prices: Vec<f64> = aligned
                .column(symbol.as_str())?
                .f64()?
                .into_iter()
                .map(|p| p.unwrap_or(f64::NAN))
                .collect();
            columns.push(prices);
        }

        let values = Array2::from_shape_fn((dates.len(), symbols.len()), |(i, j)| columns[j][i]);

        Self::new(dates, symbols.to_vec(), values)
    }

    /// Number of dates.
    pub fn n_days(&self) -> usize {
        self.dates.len()
    }

    /// Number of assets.
    pub fn n_assets(&self) -> usize {
        self.symbols.len()
    }

    /// Dates, oldest first.
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    /// Asset symbols in column order.
    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    /// Prices as a (dates x assets) matrix.
    pub const fn values(&self) -> &Array2<f64> {
        &self.values
    }

    /// First aligned date.
    pub fn first_date(&self) -> Option<NaiveDate> {
        self.dates.first().copied()
    }

    /// Last aligned date.
    pub fn last_date(&self) -> Option<NaiveDate> {
        self.dates.last().copied()
    }

    /// Keep only the dates within `start..=end`.
    pub fn between(&self, start: NaiveDate, end: NaiveDate) -> Self {
        let first = self.dates.partition_point(|d| *d < start);
        let last = self.dates.partition_point(|d| *d <= end).max(first);

        Self {
            dates: self.dates[first..last].to_vec(),
            symbols: self.symbols.clone(),
            values: self.values.slice(s![first..last, ..]).to_owned(),
        }
    }

    /// Price series of one asset.
    pub fn series(&self, symbol: &str) -> Option<ArrayView1<'_, f64>> {
        self.symbols
            .iter()
            .position(|s| s == symbol)
            .map(|j| self.values.column(j))
    }
}

fn ensure_unique(symbols: &[String]) -> Result<()> {
    for (i, symbol) in symbols.iter().enumerate() {
        if symbols[..i].contains(symbol) {
            return Err(RiskError::DuplicateSymbol(symbol.clone()));
        }
    }
    Ok(())
}
