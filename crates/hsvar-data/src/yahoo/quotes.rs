//! Quote data fetching from Yahoo Finance.

use crate::error::{DataError, Result};
use chrono::{DateTime, Utc};
use polars::prelude::*;
use std::time::Duration;
use tokio::time::sleep;
use yahoo_finance_api as yahoo;

/// Yahoo Finance quote provider with rate limiting.
pub struct YahooQuoteProvider {
    provider: yahoo::YahooConnector,
    rate_limit_delay: Duration,
}

impl std::fmt::Debug for YahooQuoteProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("YahooQuoteProvider")
            .field("rate_limit_delay", &self.rate_limit_delay)
            .finish_non_exhaustive()
    }
}

impl YahooQuoteProvider {
    /// Create a new Yahoo Finance quote provider with default rate limiting (1 req/sec).
    ///
    /// # Errors
    /// Returns an error if the underlying HTTP connector cannot be built.
    pub fn new() -> Result<Self> {
        Self::with_rate_limit(Duration::from_millis(1000))
    }

    /// Create a new Yahoo Finance quote provider with custom rate limiting.
    ///
    /// # Errors
    /// Returns an error if the underlying HTTP connector cannot be built.
    pub fn with_rate_limit(rate_limit_delay: Duration) -> Result<Self> {
        Ok(Self {
            provider: yahoo::YahooConnector::new()?,
            rate_limit_delay,
        })
    }

    /// Delay applied after every request.
    pub const fn rate_limit_delay(&self) -> Duration {
        self.rate_limit_delay
    }

    /// Fetch daily OHLCV data for a single symbol.
    ///
    /// # Arguments
    /// * `symbol` - The ticker symbol (e.g., "AAPL")
    /// * `start` - Start date for the data
    /// * `end` - End date for the data
    ///
    /// # Returns
    /// A Polars DataFrame with columns: symbol, date, open, high, low, close, volume, adjusted_close
    pub async fn fetch_quotes(
        &self,
        symbol: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<DataFrame> {
        validate_request(symbol, start, end)?;

        let start_time = time::OffsetDateTime::from_unix_timestamp(start.timestamp())
            .map_err(|e| DataError::TimeConversion(e.to_string()))?;
        let end_time = time::OffsetDateTime::from_unix_timestamp(end.timestamp())
            .map_err(|e| DataError::TimeConversion(e.to_string()))?;

        tracing::debug!(symbol, %start, %end, "requesting quote history");

        let response = self
            .provider
            .get_quote_history(symbol, start_time, end_time)
            .await?;

        let quotes = response
            .quotes()
            .map_err(|e| DataError::YahooApi(e.to_string()))?;

        if quotes.is_empty() {
            return Err(DataError::MissingData {
                symbol: symbol.to_string(),
                reason: "No data returned from Yahoo Finance".to_string(),
            });
        }

        let dates: Vec<i64> = quotes.iter().map(|q| q.timestamp as i64).collect();
        let opens: Vec<f64> = quotes.iter().map(|q| q.open).collect();
        let highs: Vec<f64> = quotes.iter().map(|q| q.high).collect();
        let lows: Vec<f64> = quotes.iter().map(|q| q.low).collect();
        let closes: Vec<f64> = quotes.iter().map(|q| q.close).collect();
        let volumes: Vec<u64> = quotes.iter().map(|q| q.volume).collect();
        let adj_closes: Vec<f64> = quotes.iter().map(|q| q.adjclose).collect();

        let mut df = DataFrame::new(vec![
            Series::new("timestamp".into(), dates).into(),
            Series::new("open".into(), opens).into(),
            Series::new("high".into(), highs).into(),
            Series::new("low".into(), lows).into(),
            Series::new("close".into(), closes).into(),
            Series::new("volume".into(), volumes).into(),
            Series::new("adjusted_close".into(), adj_closes).into(),
        ])?;

        let symbol_col: Column = Series::new("symbol".into(), vec![symbol; df.height()]).into();
        df.with_column(symbol_col)?;

        // Yahoo timestamps are seconds at the session open
        let df = df
            .lazy()
            .with_column(
                (col("timestamp") * lit(1_000_000_000))
                    .cast(DataType::Datetime(TimeUnit::Nanoseconds, None))
                    .cast(DataType::Date)
                    .alias("date"),
            )
            .select(&[
                col("symbol"),
                col("date"),
                col("open"),
                col("high"),
                col("low"),
                col("close"),
                col("volume"),
                col("adjusted_close"),
            ])
            .collect()?;

        tracing::debug!(symbol, rows = df.height(), "received quotes");

        sleep(self.rate_limit_delay).await;

        Ok(df)
    }
}

/// Reject requests that can never succeed before touching the network.
fn validate_request(symbol: &str, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<()> {
    if start > end {
        return Err(DataError::InvalidDateRange {
            start: start.to_rfc3339(),
            end: end.to_rfc3339(),
        });
    }

    if symbol.trim().is_empty() {
        return Err(DataError::InvalidSymbol("Empty symbol".to_string()));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;

    #[tokio::test]
    #[ignore = "requires network access to Yahoo Finance"]
    async fn test_fetch_quotes() {
        let provider = YahooQuoteProvider::new().unwrap();
        let end = Utc::now();
        let start = end - ChronoDuration::days(30);

        let df = provider.fetch_quotes("AAPL", start, end).await.unwrap();
        assert!(df.height() > 0);
        assert_eq!(
            df.get_column_names(),
            vec![
                "symbol",
                "date",
                "open",
                "high",
                "low",
                "close",
                "volume",
                "adjusted_close"
            ]
        );
    }

    #[test]
    fn test_invalid_date_range() {
        let start = Utc::now();
        let end = start - ChronoDuration::days(30);

        let result = validate_request("AAPL", start, end);
        assert!(matches!(result, Err(DataError::InvalidDateRange { .. })));
    }

    #[test]
    fn test_invalid_symbol() {
        let end = Utc::now();
        let start = end - ChronoDuration::days(30);

        assert!(matches!(
            validate_request("", start, end),
            Err(DataError::InvalidSymbol(_))
        ));
        assert!(matches!(
            validate_request("   ", start, end),
            Err(DataError::InvalidSymbol(_))
        ));
    }

    #[test]
    fn test_valid_request() {
        let end = Utc::now();
        let start = end - ChronoDuration::days(30);
        assert!(validate_request("MSFT", start, end).is_ok());
    }
}
