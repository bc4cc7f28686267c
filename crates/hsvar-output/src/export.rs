//! CSV and JSON export of analysis results.

use crate::histogram::Histogram;
use crate::summary::VarSummary;
use chrono::NaiveDate;
use hsvar_risk::{PortfolioReturns, ReturnKind};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during export operations.
#[derive(Debug, Error)]
pub enum ExportError {
    /// CSV serialization error.
    #[error("CSV serialization error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization error.
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialized CSV was not valid UTF-8.
    #[error("CSV output is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    /// Invalid format error.
    #[error("Invalid format: {0}")]
    InvalidFormat(String),
}

/// Export format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// Comma-separated values format.
    Csv,

    /// Compact JSON format.
    Json,

    /// Pretty-printed JSON format.
    PrettyJson,
}

impl ExportFormat {
    /// Get the file extension for this format.
    pub const fn extension(&self) -> &str {
        match self {
            Self::Csv => "csv",
            Self::Json | Self::PrettyJson => "json",
        }
    }

    /// Pick the format from a file extension; `.json` exports pretty JSON.
    pub fn from_path(path: &Path) -> Result<Self, ExportError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase);
        match extension.as_deref() {
            Some("csv") => Ok(Self::Csv),
            Some("json") => Ok(Self::PrettyJson),
            _ => Err(ExportError::InvalidFormat(format!(
                "cannot infer export format from {}, use .csv or .json",
                path.display()
            ))),
        }
    }
}

/// Trait for exporting data in various formats.
pub trait Exporter {
    /// Export data to a string in the specified format.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError>;

    /// Export data to a file in the specified format.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or file writing fails.
    fn export_to_file(&self, path: &Path, format: ExportFormat) -> Result<(), ExportError> {
        let content = self.export_to_string(format)?;
        let mut file = File::create(path)?;
        file.write_all(content.as_bytes())?;
        Ok(())
    }
}

fn csv_to_string<T: Serialize>(records: impl IntoIterator<Item = T>) -> Result<String, ExportError> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    for record in records {
        wtr.serialize(record)?;
    }
    let bytes = wtr.into_inner().map_err(|e| e.into_error())?;
    Ok(String::from_utf8(bytes)?)
}

fn json_to_string<T: Serialize + ?Sized>(
    value: &T,
    format: ExportFormat,
) -> Result<String, ExportError> {
    match format {
        ExportFormat::PrettyJson => Ok(serde_json::to_string_pretty(value)?),
        _ => Ok(serde_json::to_string(value)?),
    }
}

/// One `metric,value` row of a summary export.
#[derive(Debug, Serialize, Deserialize)]
struct MetricRecord {
    metric: String,
    value: String,
}

impl Exporter for VarSummary {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        match format {
            ExportFormat::Csv => csv_to_string(
                self.metrics()
                    .into_iter()
                    .map(|(metric, value)| MetricRecord { metric, value }),
            ),
            ExportFormat::Json | ExportFormat::PrettyJson => json_to_string(self, format),
        }
    }
}

/// One dated portfolio return.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ReturnRecord {
    /// End date of the return period.
    pub date: NaiveDate,

    /// Portfolio return over the period.
    pub portfolio_return: f64,
}

/// Portfolio return series prepared for export.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReturnSeriesExport {
    /// Return definition used.
    pub kind: ReturnKind,

    /// Dated returns in date order.
    pub returns: Vec<ReturnRecord>,
}

impl From<&PortfolioReturns> for ReturnSeriesExport {
    fn from(returns: &PortfolioReturns) -> Self {
        Self {
            kind: returns.kind(),
            returns: returns
                .iter()
                .map(|(date, portfolio_return)| ReturnRecord {
                    date,
                    portfolio_return,
                })
                .collect(),
        }
    }
}

impl Exporter for ReturnSeriesExport {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        match format {
            ExportFormat::Csv => csv_to_string(&self.returns),
            ExportFormat::Json | ExportFormat::PrettyJson => json_to_string(self, format),
        }
    }
}

/// One histogram bin.
#[derive(Debug, Serialize)]
struct BinRecord {
    bin: usize,
    lower: f64,
    upper: f64,
    count: usize,
}

impl Exporter for Histogram {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        let bins = self.counts().iter().enumerate().map(|(bin, &count)| {
            let (lower, upper) = self.edges(bin);
            BinRecord {
                bin,
                lower,
                upper,
                count,
            }
        });
        match format {
            ExportFormat::Csv => csv_to_string(bins),
            ExportFormat::Json | ExportFormat::PrettyJson => {
                json_to_string(&bins.collect::<Vec<_>>(), format)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::path::PathBuf;

    fn series() -> ReturnSeriesExport {
        ReturnSeriesExport {
            kind: ReturnKind::Simple,
            returns: vec![
                ReturnRecord {
                    date: NaiveDate::from_ymd_opt(2024, 1, 3).unwrap(),
                    portfolio_return: 0.0125,
                },
                ReturnRecord {
                    date: NaiveDate::from_ymd_opt(2024, 1, 4).unwrap(),
                    portfolio_return: -0.02,
                },
            ],
        }
    }

    #[rstest]
    #[case("var.csv", ExportFormat::Csv)]
    #[case("out/VAR.JSON", ExportFormat::PrettyJson)]
    fn test_format_from_path(#[case] path: &str, #[case] expected: ExportFormat) {
        assert_eq!(ExportFormat::from_path(Path::new(path)).unwrap(), expected);
    }

    #[rstest]
    #[case("var.png")]
    #[case("var")]
    fn test_format_from_path_unknown(#[case] path: &str) {
        assert!(matches!(
            ExportFormat::from_path(Path::new(path)),
            Err(ExportError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_return_series_csv() {
        let csv = series().export_to_string(ExportFormat::Csv).unwrap();
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines[0], "date,portfolio_return");
        assert_eq!(lines[1], "2024-01-03,0.0125");
        assert_eq!(lines[2], "2024-01-04,-0.02");
    }

    #[test]
    fn test_return_series_json() {
        let json = series().export_to_string(ExportFormat::Json).unwrap();
        let parsed: ReturnSeriesExport = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, series());

        let pretty = series().export_to_string(ExportFormat::PrettyJson).unwrap();
        assert!(pretty.contains("\n  "));
    }

    #[test]
    fn test_histogram_csv() {
        let histogram = Histogram::from_values(&[0.0, 0.5, 1.0], 2).unwrap();
        let csv = histogram.export_to_string(ExportFormat::Csv).unwrap();
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines[0], "bin,lower,upper,count");
        assert_eq!(lines[1], "0,0.0,0.5,1");
        assert_eq!(lines[2], "1,0.5,1.0,2");
    }

    #[test]
    fn test_export_to_file() {
        let path: PathBuf =
            std::env::temp_dir().join(format!("hsvar_export_test_{}.csv", std::process::id()));

        series().export_to_file(&path, ExportFormat::Csv).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert!(content.starts_with("date,portfolio_return"));
    }
}
