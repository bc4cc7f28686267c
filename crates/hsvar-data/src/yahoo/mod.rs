//! Yahoo Finance data provider.

pub mod quotes;

pub use quotes::YahooQuoteProvider;
