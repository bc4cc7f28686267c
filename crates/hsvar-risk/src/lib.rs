#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod error;
pub mod prices;
pub mod quantile;
pub mod returns;
pub mod stats;
pub mod var;
pub mod weights;

// Re-export main types
pub use error::{Result, RiskError};
pub use prices::PriceMatrix;
pub use quantile::{PercentileMethod, percentile, percentile_sorted};
pub use returns::{PortfolioReturns, ReturnKind, ReturnMatrix, compute_returns, portfolio_returns};
pub use stats::ReturnStatistics;
pub use var::{HistoricalVar, ParametricVar, VarEstimate, VarEstimator, VarMethod};
pub use weights::Weights;
