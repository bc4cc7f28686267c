//! Glue between the command line, the quote sources and the analysis.
//!
//! Resolves where the cache lives and fetches the quotes of every portfolio
//! symbol, concurrently and through the cache.

pub(crate) mod cache_manager;
pub(crate) mod data_pipeline;
