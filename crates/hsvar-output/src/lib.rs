#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod export;
pub mod histogram;
pub mod report;
pub mod summary;

pub use export::{ExportError, ExportFormat, Exporter, ReturnRecord, ReturnSeriesExport};
pub use histogram::{DEFAULT_BINS, Histogram, HistogramError};
pub use report::{Report, ReportBuilder, ReportError, ReportFormat};
pub use summary::{PortfolioHolding, VarSummary, format_currency};
