//! SQLite caching layer for quote data.

use crate::error::{DataError, Result};
use chrono::{NaiveDate, Utc};
use polars::prelude::*;
use rusqlite::{Connection, params};
use std::path::Path;

/// Trading days per calendar year used by the coverage check.
const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Fraction of expected trading days that must be cached for a range to count as covered.
const MIN_COVERAGE: f64 = 0.9;

/// Calendar days a cached range may stop short of either end of a request.
///
/// Covers weekends plus a market holiday.
pub const EDGE_TOLERANCE_DAYS: i64 = 4;

/// SQLite cache for quote data.
#[derive(Debug)]
pub struct SqliteCache {
    conn: Connection,
}

impl SqliteCache {
    /// Create a new SQLite cache.
    ///
    /// # Arguments
    /// * `path` - Path to the SQLite database file
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        let cache = Self { conn };
        cache.initialize_schema()?;
        Ok(cache)
    }

    /// Create an in-memory cache (useful for testing).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let cache = Self { conn };
        cache.initialize_schema()?;
        Ok(cache)
    }

    fn initialize_schema(&self) -> Result<()> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS quotes (
                symbol TEXT NOT NULL,
                date TEXT NOT NULL,
                open REAL NOT NULL,
                high REAL NOT NULL,
                low REAL NOT NULL,
                close REAL NOT NULL,
                volume INTEGER NOT NULL,
                adjusted_close REAL NOT NULL,
                cached_at TEXT NOT NULL,
                PRIMARY KEY (symbol, date)
            )",
            [],
        )?;

        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_quotes_symbol_date ON quotes(symbol, date)",
            [],
        )?;

        Ok(())
    }

    /// Check if quotes are cached for a symbol and date range.
    ///
    /// A range counts as covered when the cache holds at least 90% of the
    /// trading days expected between `start` and `end`, and the cached rows
    /// reach both ends of the range (within [`EDGE_TOLERANCE_DAYS`]). An `end`
    /// in the future only needs rows up to today.
    pub fn has_quotes(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> Result<bool> {
        if start > end {
            return Err(DataError::InvalidDateRange {
                start: start.to_string(),
                end: end.to_string(),
            });
        }

        let (count, first, last): (i64, Option<String>, Option<String>) = self.conn.query_row(
            "SELECT COUNT(*), MIN(date), MAX(date) FROM quotes
             WHERE symbol = ?1 AND date >= ?2 AND date <= ?3",
            params![symbol, start.to_string(), end.to_string()],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )?;

        let (Some(first), Some(last)) = (parse_cached_date(first)?, parse_cached_date(last)?)
        else {
            return Ok(false);
        };
        if count < expected_trading_days(start, end) {
            return Ok(false);
        }

        let reachable_end = end.min(Utc::now().date_naive());
        Ok((first - start).num_days() <= EDGE_TOLERANCE_DAYS
            && (reachable_end - last).num_days() <= EDGE_TOLERANCE_DAYS)
    }

    /// Get cached quotes for a symbol and date range.
    pub fn get_quotes(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> Result<DataFrame> {
        let mut stmt = self.conn.prepare(
            "SELECT symbol, date, open, high, low, close, volume, adjusted_close
             FROM quotes
             WHERE symbol = ?1 AND date >= ?2 AND date <= ?3
             ORDER BY date ASC",
        )?;

        let mut symbols = Vec::new();
        let mut dates = Vec::new();
        let mut opens = Vec::new();
        let mut highs = Vec::new();
        let mut lows = Vec::new();
        let mut closes = Vec::new();
        let mut volumes = Vec::new();
        let mut adj_closes = Vec::new();

        let rows = stmt.query_map(params![symbol, start.to_string(), end.to_string()], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, f64>(2)?,
                row.get::<_, f64>(3)?,
                row.get::<_, f64>(4)?,
                row.get::<_, f64>(5)?,
                row.get::<_, i64>(6)?,
                row.get::<_, f64>(7)?,
            ))
        })?;

        for row in rows {
            let (sym, date, open, high, low, close, volume, adj_close) = row?;
            symbols.push(sym);
            dates.push(date);
            opens.push(open);
            highs.push(high);
            lows.push(low);
            closes.push(close);
            volumes.push(volume as u64);
            adj_closes.push(adj_close);
        }

        if dates.is_empty() {
            return Err(DataError::MissingData {
                symbol: symbol.to_string(),
                reason: "No cached data found".to_string(),
            });
        }

        let df = DataFrame::new(vec![
            Series::new("symbol".into(), symbols).into(),
            Series::new("date".into(), dates).into(),
            Series::new("open".into(), opens).into(),
            Series::new("high".into(), highs).into(),
            Series::new("low".into(), lows).into(),
            Series::new("close".into(), closes).into(),
            Series::new("volume".into(), volumes).into(),
            Series::new("adjusted_close".into(), adj_closes).into(),
        ])?;

        let df = df
            .lazy()
            .with_column(col("date").cast(DataType::Date))
            .collect()?;

        tracing::debug!(symbol, rows = df.height(), "loaded quotes from cache");

        Ok(df)
    }

    /// Store quotes in the cache.
    ///
    /// Expects the full OHLCV layout produced by the Yahoo provider.
    pub fn put_quotes(&self, df: &DataFrame) -> Result<()> {
        let cached_at = Utc::now().to_rfc3339();

        let symbols = df.column("symbol")?.str()?;
        let dates = df.column("date")?.cast(&DataType::String)?;
        let dates = dates.str()?;
        let opens = df.column("open")?.f64()?;
        let highs = df.column("high")?.f64()?;
        let lows = df.column("low")?.f64()?;
        let closes = df.column("close")?.f64()?;
        let volumes = df.column("volume")?.cast(&DataType::Int64)?;
        let volumes = volumes.i64()?;
        let adj_closes = df.column("adjusted_close")?.f64()?;

        let tx = self.conn.unchecked_transaction()?;

        for i in 0..df.height() {
            let symbol = symbols
                .get(i)
                .ok_or_else(|| DataError::Parse("Missing symbol".to_string()))?;
            let date = dates
                .get(i)
                .ok_or_else(|| DataError::Parse("Missing date".to_string()))?;
            let open = opens
                .get(i)
                .ok_or_else(|| DataError::Parse("Missing open".to_string()))?;
            let high = highs
                .get(i)
                .ok_or_else(|| DataError::Parse("Missing high".to_string()))?;
            let low = lows
                .get(i)
                .ok_or_else(|| DataError::Parse("Missing low".to_string()))?;
            let close = closes
                .get(i)
                .ok_or_else(|| DataError::Parse("Missing close".to_string()))?;
            let volume = volumes
                .get(i)
                .ok_or_else(|| DataError::Parse("Missing volume".to_string()))?;
            let adj_close = adj_closes
                .get(i)
                .ok_or_else(|| DataError::Parse("Missing adjusted_close".to_string()))?;

            tx.execute(
                "INSERT OR REPLACE INTO quotes
                 (symbol, date, open, high, low, close, volume, adjusted_close, cached_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    symbol, date, open, high, low, close, volume, adj_close, cached_at
                ],
            )?;
        }

        tx.commit()?;
        Ok(())
    }

    /// List the symbols that have cached quotes.
    pub fn cached_symbols(&self) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT DISTINCT symbol FROM quotes ORDER BY symbol")?;

        let symbols = stmt
            .query_map([], |row| row.get(0))?
            .collect::<std::result::Result<Vec<String>, _>>()?;

        Ok(symbols)
    }

    /// Clear all cached data.
    pub fn clear_all(&self) -> Result<usize> {
        Ok(self.conn.execute("DELETE FROM quotes", [])?)
    }

    /// Clear cached data for a specific symbol.
    pub fn clear_symbol(&self, symbol: &str) -> Result<usize> {
        Ok(self
            .conn
            .execute("DELETE FROM quotes WHERE symbol = ?1", params![symbol])?)
    }

    /// Get cache statistics.
    pub fn get_stats(&self) -> Result<CacheStats> {
        let (quotes_count, symbols_count, oldest, newest): (
            i64,
            i64,
            Option<String>,
            Option<String>,
        ) = self.conn.query_row(
            "SELECT COUNT(*), COUNT(DISTINCT symbol), MIN(date), MAX(date) FROM quotes",
            [],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
        )?;

        Ok(CacheStats {
            total_quotes: quotes_count as usize,
            unique_symbols: symbols_count as usize,
            oldest: parse_cached_date(oldest)?,
            newest: parse_cached_date(newest)?,
        })
    }
}

fn parse_cached_date(value: Option<String>) -> Result<Option<NaiveDate>> {
    value
        .map(|d| {
            d.parse::<NaiveDate>()
                .map_err(|e| DataError::Cache(format!("Bad cached date {d}: {e}")))
        })
        .transpose()
}

/// Number of cached rows required for `[start, end]` to count as covered.
fn expected_trading_days(start: NaiveDate, end: NaiveDate) -> i64 {
    let calendar_days = (end - start).num_days() + 1;
    let trading_days = calendar_days as f64 * TRADING_DAYS_PER_YEAR / 365.0;
    (trading_days * MIN_COVERAGE).floor() as i64
}

/// Cache statistics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheStats {
    /// Total number of quote records
    pub total_quotes: usize,
    /// Number of unique symbols
    pub unique_symbols: usize,
    /// Earliest cached date
    pub oldest: Option<NaiveDate>,
    /// Latest cached date
    pub newest: Option<NaiveDate>,
}
