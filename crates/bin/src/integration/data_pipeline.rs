//! Quote fetching for a portfolio.
//!
//! Every symbol is served from the SQLite cache when it covers the requested
//! window, otherwise fetched from Yahoo Finance and written back to the cache.
//! Fetches run concurrently, and a failure for any symbol fails the run.

use super::cache_manager;
use chrono::{DateTime, Days, NaiveDate, NaiveTime, Utc};
use futures::stream::{self, StreamExt};
use hsvar_data::{DataError, SqliteCache, YahooQuoteProvider};
use indicatif::ProgressBar;
use polars::prelude::*;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Error type for data pipeline operations.
#[derive(Debug, thiserror::Error)]
pub(crate) enum DataPipelineError {
    /// Quotes for one symbol could not be fetched.
    #[error("Failed to fetch quotes for {symbol}: {source}")]
    Fetch {
        /// Symbol that failed
        symbol: String,
        /// Underlying error
        source: DataError,
    },
    /// Nothing to fetch.
    #[error("No symbols to fetch")]
    NoSymbols,
    /// Polars DataFrame error.
    #[error("Polars error: {0}")]
    Polars(#[from] PolarsError),
}

/// Configuration for data fetching.
#[derive(Debug, Clone)]
pub(crate) struct FetchConfig {
    /// Whether to use the cache.
    pub use_cache: bool,
    /// Whether to force refresh (ignore cached rows, still write back).
    pub force_refresh: bool,
    /// Maximum number of concurrent Yahoo requests.
    pub concurrency: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            use_cache: true,
            force_refresh: false,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }
}

/// Default number of concurrent fetches.
pub(crate) const DEFAULT_CONCURRENCY: usize = 4;

/// Request window for Yahoo: midnight of `start` to midnight after `end`.
pub(crate) fn request_window(start: NaiveDate, end: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let end_exclusive = end.checked_add_days(Days::new(1)).unwrap_or(end);
    (
        start.and_time(NaiveTime::MIN).and_utc(),
        end_exclusive.and_time(NaiveTime::MIN).and_utc(),
    )
}

/// Split `symbols` into frames already cached and symbols still to fetch.
fn load_cached(
    cache: Option<&SqliteCache>,
    symbols: &[String],
    start: NaiveDate,
    end: NaiveDate,
    config: &FetchConfig,
) -> (Vec<LazyFrame>, Vec<String>) {
    let Some(cache) = cache.filter(|_| !config.force_refresh) else {
        return (Vec::new(), symbols.to_vec());
    };

    let mut cached = Vec::new();
    let mut missing = Vec::new();
    for symbol in symbols {
        match cache.has_quotes(symbol, start, end) {
            Ok(true) => match cache.get_quotes(symbol, start, end) {
                Ok(df) => {
                    debug!(symbol = %symbol, rows = df.height(), "cache hit");
                    cached.push(df.lazy());
                    continue;
                }
                Err(e) => warn!(symbol = %symbol, error = %e, "cache read failed"),
            },
            Ok(false) => debug!(symbol = %symbol, "cache miss"),
            Err(e) => warn!(symbol = %symbol, error = %e, "cache lookup failed"),
        }
        missing.push(symbol.clone());
    }
    (cached, missing)
}

/// Fetch adjusted quotes for every symbol between `start` and `end` (inclusive).
///
/// Returns one long frame with the rows of all symbols.
pub(crate) async fn fetch_portfolio_quotes(
    provider: &YahooQuoteProvider,
    symbols: &[String],
    start: NaiveDate,
    end: NaiveDate,
    config: &FetchConfig,
    progress: Option<&ProgressBar>,
) -> Result<DataFrame, DataPipelineError> {
    if symbols.is_empty() {
        return Err(DataPipelineError::NoSymbols);
    }

    let cache = if config.use_cache {
        match cache_manager::open_cache() {
            Ok(cache) => Some(cache),
            Err(e) => {
                warn!(error = %e, "quote cache unavailable, fetching everything");
                None
            }
        }
    } else {
        None
    };

    let (cached_dfs, symbols_to_fetch) =
        load_cached(cache.as_ref(), symbols, start, end, config);
    info!(
        cached = cached_dfs.len(),
        to_fetch = symbols_to_fetch.len(),
        "resolved quote sources"
    );

    if let Some(pb) = progress {
        pb.set_length(symbols.len() as u64);
        pb.set_position(cached_dfs.len() as u64);
        if symbols_to_fetch.is_empty() {
            pb.set_message("Loading from cache...");
        } else {
            pb.set_message(format!(
                "Fetching {} symbols ({} concurrent)...",
                symbols_to_fetch.len(),
                config.concurrency
            ));
        }
    }

    let (window_start, window_end) = request_window(start, end);
    let cache = Arc::new(Mutex::new(cache));
    let results: Arc<Mutex<Vec<LazyFrame>>> = Arc::new(Mutex::new(Vec::new()));
    let failures: Arc<Mutex<Vec<(String, DataError)>>> = Arc::new(Mutex::new(Vec::new()));

    stream::iter(symbols_to_fetch)
        .map(|symbol| {
            let cache = Arc::clone(&cache);
            async move {
                match provider.fetch_quotes(&symbol, window_start, window_end).await {
                    Ok(df) => {
                        if let Some(cache) = cache.lock().await.as_ref()
                            && let Err(e) = cache.put_quotes(&df)
                        {
                            warn!(symbol = %symbol, error = %e, "failed to cache quotes");
                        }
                        Ok(df)
                    }
                    Err(e) => Err((symbol, e)),
                }
            }
        })
        .buffer_unordered(config.concurrency.max(1))
        .for_each(|result| {
            let results = Arc::clone(&results);
            let failures = Arc::clone(&failures);
            async move {
                match result {
                    Ok(df) => results.lock().await.push(df.lazy()),
                    Err((symbol, e)) => {
                        if let Some(pb) = progress {
                            pb.suspend(|| warn!(symbol = %symbol, error = %e, "fetch failed"));
                        } else {
                            warn!(symbol = %symbol, error = %e, "fetch failed");
                        }
                        failures.lock().await.push((symbol, e));
                    }
                }
                if let Some(pb) = progress {
                    pb.inc(1);
                }
            }
        })
        .await;

    let mut failures = std::mem::take(&mut *failures.lock().await);
    failures.sort_by(|a, b| a.0.cmp(&b.0));
    if let Some((symbol, source)) = failures.into_iter().next() {
        return Err(DataPipelineError::Fetch { symbol, source });
    }

    let fetched_dfs = std::mem::take(&mut *results.lock().await);
    let all_dfs: Vec<LazyFrame> = cached_dfs.into_iter().chain(fetched_dfs).collect();

    let combined = concat(all_dfs, UnionArgs::default())?
        .sort(["symbol", "date"], SortMultipleOptions::default())
        .collect()?;

    Ok(combined)
}

/// Print cache location and contents.
pub(crate) fn print_cache_info() -> Result<(), DataError> {
    let path = cache_manager::get_cache_path();
    println!("Cache location: {}", path.display());

    let cache = cache_manager::open_cache()?;
    let stats = cache.get_stats()?;
    println!(
        "Cached data:    {} quotes for {} symbols",
        stats.total_quotes, stats.unique_symbols
    );
    if let (Some(oldest), Some(newest)) = (stats.oldest, stats.newest) {
        println!("Date range:     {oldest} to {newest}");
    }
    let symbols = cache.cached_symbols()?;
    if !symbols.is_empty() {
        println!("Symbols:        {}", symbols.join(", "));
    }
    Ok(())
}

/// Remove cached quotes for one symbol or for all symbols.
pub(crate) fn clear_cache(symbol: Option<&str>) -> Result<usize, DataError> {
    let cache = cache_manager::open_cache()?;
    let removed = match symbol {
        Some(symbol) => cache.clear_symbol(&symbol.to_uppercase())?,
        None => cache.clear_all()?,
    };
    info!(removed, symbol = symbol.unwrap_or("*"), "cleared quote cache");
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_request_window_includes_end_day() {
        let (start, end) = request_window(date(2023, 1, 1), date(2024, 12, 31));

        assert_eq!(start.to_rfc3339(), "2023-01-01T00:00:00+00:00");
        assert_eq!(end.to_rfc3339(), "2025-01-01T00:00:00+00:00");
    }

    #[test]
    fn test_load_cached_without_cache() {
        let symbols = vec!["AAPL".to_string(), "MSFT".to_string()];
        let (cached, missing) = load_cached(
            None,
            &symbols,
            date(2024, 1, 1),
            date(2024, 1, 31),
            &FetchConfig::default(),
        );

        assert!(cached.is_empty());
        assert_eq!(missing, symbols);
    }

    #[test]
    fn test_load_cached_splits_hits_and_misses() {
        let cache = SqliteCache::in_memory().unwrap();
        let days: Vec<NaiveDate> = (1..=31)
            .map(|d| date(2024, 1, d))
            .filter(|d| chrono::Datelike::weekday(d).number_from_monday() <= 5)
            .collect();
        let n = days.len();
        let df = DataFrame::new(vec![
            Series::new("symbol".into(), vec!["AAPL"; n]).into(),
            Series::new(
                "date".into(),
                days.iter().map(|d| d.to_string()).collect::<Vec<_>>(),
            )
            .into(),
            Series::new("open".into(), vec![100.0; n]).into(),
            Series::new("high".into(), vec![100.0; n]).into(),
            Series::new("low".into(), vec![100.0; n]).into(),
            Series::new("close".into(), vec![100.0; n]).into(),
            Series::new("volume".into(), vec![1_000_u64; n]).into(),
            Series::new("adjusted_close".into(), vec![100.0; n]).into(),
        ])
        .unwrap()
        .lazy()
        .with_column(col("date").cast(DataType::Date))
        .collect()
        .unwrap();
        cache.put_quotes(&df).unwrap();

        let symbols = vec!["AAPL".to_string(), "MSFT".to_string()];
        let config = FetchConfig::default();
        let (cached, missing) = load_cached(
            Some(&cache),
            &symbols,
            date(2024, 1, 1),
            date(2024, 1, 31),
            &config,
        );
        assert_eq!(cached.len(), 1);
        assert_eq!(missing, vec!["MSFT".to_string()]);

        let refresh = FetchConfig {
            force_refresh: true,
            ..FetchConfig::default()
        };
        let (cached, missing) = load_cached(
            Some(&cache),
            &symbols,
            date(2024, 1, 1),
            date(2024, 1, 31),
            &refresh,
        );
        assert!(cached.is_empty());
        assert_eq!(missing.len(), 2);
    }
}
