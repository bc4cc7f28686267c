//! Offline quotes from CSV files.
//!
//! The expected layout is one row per symbol and trading day:
//!
//! ```text
//! date,symbol,adjusted_close
//! 2024-01-02,AAPL,184.53
//! 2024-01-02,MSFT,368.35
//! ```
//!
//! Rows may appear in any order; alignment happens downstream.

use crate::error::{DataError, Result};
use chrono::NaiveDate;
use polars::prelude::*;
use serde::Deserialize;
use std::io::Read;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct QuoteRecord {
    date: NaiveDate,
    symbol: String,
    adjusted_close: f64,
}

/// Read quotes from a CSV file on disk.
///
/// # Returns
/// A Polars DataFrame with columns: symbol, date, adjusted_close
pub fn read_quotes_csv<P: AsRef<Path>>(path: P) -> Result<DataFrame> {
    let path = path.as_ref();
    tracing::debug!(path = %path.display(), "reading quotes from csv");
    let file = std::fs::File::open(path)?;
    read_quotes_from_reader(file)
}

/// Read quotes from any CSV reader.
pub fn read_quotes_from_reader<R: Read>(reader: R) -> Result<DataFrame> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);

    let mut symbols = Vec::new();
    let mut dates = Vec::new();
    let mut adj_closes = Vec::new();

    for record in rdr.deserialize() {
        let record: QuoteRecord = record?;
        let symbol = record.symbol.to_uppercase();
        if symbol.is_empty() {
            return Err(DataError::InvalidSymbol(format!(
                "Empty symbol on {}",
                record.date
            )));
        }
        symbols.push(symbol);
        dates.push(record.date.to_string());
        adj_closes.push(record.adjusted_close);
    }

    if dates.is_empty() {
        return Err(DataError::MissingData {
            symbol: "csv".to_string(),
            reason: "No quote rows in file".to_string(),
        });
    }

    let df = DataFrame::new(vec![
        Series::new("symbol".into(), symbols).into(),
        Series::new("date".into(), dates).into(),
        Series::new("adjusted_close".into(), adj_closes).into(),
    ])?;

    let df = df
        .lazy()
        .with_column(col("date").cast(DataType::Date))
        .collect()?;

    Ok(df)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
date,symbol,adjusted_close
2024-01-02,aapl,184.53
2024-01-02,MSFT,368.35
2024-01-03,AAPL,183.15
2024-01-03,MSFT,368.80
";

    #[test]
    fn test_read_quotes() {
        let df = read_quotes_from_reader(SAMPLE.as_bytes()).unwrap();

        assert_eq!(df.height(), 4);
        assert_eq!(
            df.get_column_names(),
            vec!["symbol", "date", "adjusted_close"]
        );
        assert_eq!(df.column("date").unwrap().dtype(), &DataType::Date);

        let symbols = df.column("symbol").unwrap().str().unwrap();
        assert_eq!(symbols.get(0), Some("AAPL"));
    }

    #[test]
    fn test_empty_file() {
        let result = read_quotes_from_reader("date,symbol,adjusted_close\n".as_bytes());
        assert!(matches!(result, Err(DataError::MissingData { .. })));
    }

    #[test]
    fn test_malformed_price() {
        let data = "date,symbol,adjusted_close\n2024-01-02,AAPL,abc\n";
        let result = read_quotes_from_reader(data.as_bytes());
        assert!(matches!(result, Err(DataError::Csv(_))));
    }

    #[test]
    fn test_malformed_date() {
        let data = "date,symbol,adjusted_close\n01/02/2024,AAPL,184.5\n";
        assert!(read_quotes_from_reader(data.as_bytes()).is_err());
    }

    #[test]
    fn test_missing_file() {
        let result = read_quotes_csv("/nonexistent/hsvar/quotes.csv");
        assert!(matches!(result, Err(DataError::Io(_))));
    }
}
