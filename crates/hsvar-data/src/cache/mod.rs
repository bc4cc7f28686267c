//! Caching layer for quote data.

pub mod sqlite;

pub use sqlite::{CacheStats, SqliteCache};
