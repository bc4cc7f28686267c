#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod analysis;
pub mod config;
pub mod portfolio;

// Re-export main types from sub-crates
pub use hsvar_data as data;
pub use hsvar_output as output;
pub use hsvar_risk as risk;

pub use analysis::{AnalysisError, VarAnalysis, run_analysis};
pub use config::{AnalysisConfig, ConfigError};
pub use portfolio::{DEFAULT_PORTFOLIO_VALUE, DEFAULT_SYMBOLS, Holding, Portfolio};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
