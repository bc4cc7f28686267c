#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod cache;
pub mod csv_file;
pub mod error;
pub mod yahoo;

pub use cache::{CacheStats, SqliteCache};
pub use csv_file::{read_quotes_csv, read_quotes_from_reader};
pub use error::{DataError, Result};
pub use yahoo::YahooQuoteProvider;

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
