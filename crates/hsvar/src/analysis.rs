//! One-shot Value-at-Risk analysis on already-fetched quotes.

use crate::config::{AnalysisConfig, ConfigError};
use crate::portfolio::Portfolio;
use chrono::NaiveDate;
use hsvar_output::{
    Histogram, HistogramError, Report, ReportBuilder, ReportError, ReturnSeriesExport, VarSummary,
};
use hsvar_risk::{
    HistoricalVar, ParametricVar, PercentileMethod, PortfolioReturns, PriceMatrix, ReturnKind,
    ReturnStatistics, RiskError, VarEstimate, VarEstimator, compute_returns, portfolio_returns,
};
use polars::prelude::DataFrame;
use thiserror::Error;
use tracing::{debug, info};

/// Errors raised by [`run_analysis`].
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// Invalid configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Return or VaR computation failed.
    #[error(transparent)]
    Risk(#[from] RiskError),

    /// Histogram construction failed.
    #[error(transparent)]
    Histogram(#[from] HistogramError),

    /// Report assembly failed.
    #[error(transparent)]
    Report(#[from] ReportError),

    /// No common trading days in the requested window.
    #[error("Need at least 2 common trading days between {start} and {end}, found {found}")]
    NotEnoughDays {
        /// Window start
        start: NaiveDate,
        /// Window end
        end: NaiveDate,
        /// Aligned days found
        found: usize,
    },
}

/// Result of one analysis run.
#[derive(Debug, Clone)]
pub struct VarAnalysis {
    /// Portfolio analyzed.
    pub portfolio: Portfolio,
    /// First aligned trading day.
    pub period_start: NaiveDate,
    /// Last aligned trading day.
    pub period_end: NaiveDate,
    /// Number of aligned trading days.
    pub trading_days: usize,
    /// Percentile method of the historical estimate.
    pub percentile_method: PercentileMethod,
    /// Daily portfolio returns.
    pub returns: PortfolioReturns,
    /// Historical-simulation estimate.
    pub historical: VarEstimate,
    /// Normal estimate, when enabled.
    pub parametric: Option<VarEstimate>,
    /// Statistics of the portfolio returns.
    pub statistics: ReturnStatistics,
    /// Distribution of the portfolio returns.
    pub histogram: Histogram,
}

impl VarAnalysis {
    /// Return definition used.
    pub const fn return_kind(&self) -> ReturnKind {
        self.returns.kind()
    }

    /// Historical VaR in dollars.
    pub fn var_monetary(&self) -> f64 {
        self.historical.monetary(self.portfolio.value)
    }

    /// Figures for reporting.
    pub fn summary(&self) -> VarSummary {
        VarSummary {
            name: self.portfolio.name.clone(),
            holdings: self.portfolio.report_holdings(),
            period_start: self.period_start,
            period_end: self.period_end,
            trading_days: self.trading_days,
            portfolio_value: self.portfolio.value,
            return_kind: self.return_kind(),
            percentile_method: self.percentile_method,
            historical: self.historical.clone(),
            parametric: self.parametric.clone(),
            statistics: self.statistics,
        }
    }

    /// Build a report, optionally with the return histogram.
    pub fn report(&self, include_histogram: bool) -> Result<Report, AnalysisError> {
        let mut builder = ReportBuilder::new().summary(self.summary());
        if include_histogram {
            builder = builder.histogram(self.histogram.clone());
        }
        Ok(builder.build()?)
    }

    /// Portfolio returns prepared for export.
    pub fn returns_export(&self) -> ReturnSeriesExport {
        ReturnSeriesExport::from(&self.returns)
    }
}

/// Run the analysis described by `config` on a long quote frame.
///
/// `quotes` needs `symbol`, `date` (polars `Date`) and `adjusted_close`
/// columns; rows outside `config.start..=config.end` and symbols outside the
/// portfolio are ignored. The result depends only on the inputs.
pub fn run_analysis(config: &AnalysisConfig, quotes: &DataFrame) -> Result<VarAnalysis, AnalysisError> {
    config.validate()?;

    let symbols = config.portfolio.symbols();
    let prices = PriceMatrix::from_quotes(quotes, &symbols)?.between(config.start, config.end);

    let (period_start, period_end) = match (prices.first_date(), prices.last_date()) {
        (Some(first), Some(last)) if prices.n_days() >= 2 => (first, last),
        _ => {
            return Err(AnalysisError::NotEnoughDays {
                start: config.start,
                end: config.end,
                found: prices.n_days(),
            });
        }
    };
    info!(
        days = prices.n_days(),
        %period_start,
        %period_end,
        "aligned prices for {}",
        symbols.join(", ")
    );

    let returns = compute_returns(&prices, config.return_kind)?;
    let weights = config.portfolio.weights()?;
    let portfolio = portfolio_returns(&returns, &weights)?;
    debug!(
        periods = portfolio.len(),
        kind = %config.return_kind,
        weights = ?weights.to_vec(),
        "computed portfolio returns"
    );

    let historical = HistoricalVar::new(config.confidence)?
        .with_method(config.percentile_method)
        .estimate(portfolio.as_slice())?;
    info!(
        confidence = config.confidence,
        var = historical.var,
        amount = historical.monetary(config.portfolio.value),
        "historical VaR"
    );

    let parametric = if config.parametric {
        let estimate = ParametricVar::new(config.confidence)?.estimate(portfolio.as_slice())?;
        debug!(var = estimate.var, "parametric VaR");
        Some(estimate)
    } else {
        None
    };

    let statistics = ReturnStatistics::from_returns(portfolio.as_slice())?;
    let histogram = Histogram::from_values(portfolio.as_slice(), config.histogram_bins)?;

    Ok(VarAnalysis {
        portfolio: config.portfolio.clone(),
        period_start,
        period_end,
        trading_days: prices.n_days(),
        percentile_method: config.percentile_method,
        returns: portfolio,
        historical,
        parametric,
        statistics,
        histogram,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use polars::prelude::*;

    /// AAPL and MSFT on five weekdays; GOOGL misses 2024-01-04.
    fn quotes() -> DataFrame {
        let rows = [
            ("AAPL", "2024-01-02", 100.0),
            ("AAPL", "2024-01-03", 102.0),
            ("AAPL", "2024-01-04", 99.96),
            ("AAPL", "2024-01-05", 101.0),
            ("AAPL", "2024-01-08", 103.0),
            ("MSFT", "2024-01-02", 200.0),
            ("MSFT", "2024-01-03", 198.0),
            ("MSFT", "2024-01-04", 201.0),
            ("MSFT", "2024-01-05", 205.0),
            ("MSFT", "2024-01-08", 203.0),
            ("GOOGL", "2024-01-02", 140.0),
            ("GOOGL", "2024-01-03", 141.0),
            ("GOOGL", "2024-01-05", 139.0),
            ("GOOGL", "2024-01-08", 142.0),
        ];
        DataFrame::new(vec![
            Series::new("symbol".into(), rows.iter().map(|r| r.0).collect::<Vec<_>>()).into(),
            Series::new("date".into(), rows.iter().map(|r| r.1).collect::<Vec<_>>()).into(),
            Series::new(
                "adjusted_close".into(),
                rows.iter().map(|r| r.2).collect::<Vec<_>>(),
            )
            .into(),
        ])
        .unwrap()
        .lazy()
        .with_column(col("date").cast(DataType::Date))
        .collect()
        .unwrap()
    }

    fn config(symbols: &[&str]) -> AnalysisConfig {
        let symbols: Vec<String> = symbols.iter().map(|s| s.to_string()).collect();
        AnalysisConfig {
            portfolio: Portfolio::from_symbols(&symbols, None, 100_000.0).unwrap(),
            start: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            end: NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
            ..AnalysisConfig::default()
        }
    }

    #[test]
    fn test_single_asset_returns() {
        let analysis = run_analysis(&config(&["AAPL"]), &quotes()).unwrap();

        assert_eq!(analysis.trading_days, 5);
        assert_eq!(analysis.returns.len(), 4);
        assert_relative_eq!(analysis.returns.values()[0], 0.02, epsilon = 1e-12);
        assert_relative_eq!(analysis.returns.values()[1], -0.02, epsilon = 1e-12);
        // h = 3 * 0.05 = 0.15 between -0.02 and the next smallest return
        assert!(analysis.historical.quantile_return > -0.02);
        assert!(analysis.historical.var > 0.0);
        assert!(analysis.parametric.is_some());
    }

    #[test]
    fn test_alignment_drops_missing_days() {
        let analysis = run_analysis(&config(&["AAPL", "MSFT", "GOOGL"]), &quotes()).unwrap();

        assert_eq!(analysis.trading_days, 4);
        assert_eq!(
            analysis.period_start,
            NaiveDate::from_ymd_opt(2024, 1, 2).unwrap()
        );
        assert_eq!(
            analysis.period_end,
            NaiveDate::from_ymd_opt(2024, 1, 8).unwrap()
        );
        assert_eq!(analysis.histogram.total(), 3);
    }

    #[test]
    fn test_window_restricts_dates() {
        let mut config = config(&["AAPL", "MSFT"]);
        config.start = NaiveDate::from_ymd_opt(2024, 1, 3).unwrap();
        config.end = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();

        let analysis = run_analysis(&config, &quotes()).unwrap();
        assert_eq!(analysis.trading_days, 3);
        assert_eq!(analysis.returns.len(), 2);
    }

    #[test]
    fn test_window_without_data() {
        let mut config = config(&["AAPL"]);
        config.start = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
        config.end = NaiveDate::from_ymd_opt(2023, 12, 31).unwrap();

        assert!(matches!(
            run_analysis(&config, &quotes()),
            Err(AnalysisError::NotEnoughDays { found: 0, .. })
        ));
    }

    #[test]
    fn test_lowercase_config_symbols() {
        let config = AnalysisConfig::from_json_str(
            r#"{
                "portfolio": {"holdings": [
                    {"symbol": "aapl", "weight": 0.5},
                    {"symbol": "msft", "weight": 0.5}
                ]},
                "start": "2024-01-01",
                "end": "2024-01-31"
            }"#,
        )
        .unwrap();

        let analysis = run_analysis(&config, &quotes()).unwrap();
        assert_eq!(analysis.portfolio.symbols(), vec!["AAPL", "MSFT"]);
        assert_eq!(analysis.trading_days, 5);
    }

    #[test]
    fn test_missing_symbol() {
        assert!(matches!(
            run_analysis(&config(&["AAPL", "TSLA"]), &quotes()),
            Err(AnalysisError::Risk(RiskError::MissingSymbol(s))) if s == "TSLA"
        ));
    }

    #[test]
    fn test_invalid_config() {
        let mut config = config(&["AAPL"]);
        config.confidence = 1.2;
        assert!(matches!(
            run_analysis(&config, &quotes()),
            Err(AnalysisError::Config(ConfigError::InvalidConfidence(_)))
        ));
    }

    #[test]
    fn test_summary_and_report() {
        let mut config = config(&["AAPL", "MSFT"]);
        config.parametric = false;
        let analysis = run_analysis(&config, &quotes()).unwrap();

        let summary = analysis.summary();
        assert_eq!(summary.name, "AAPL/MSFT");
        assert_eq!(summary.trading_days, 5);
        assert!(summary.parametric.is_none());
        assert_relative_eq!(summary.var_monetary(), analysis.var_monetary());

        let report = analysis.report(false).unwrap();
        assert!(report.histogram.is_none());
        assert!(analysis.report(true).unwrap().histogram.is_some());

        assert_eq!(analysis.returns_export().returns.len(), 4);
    }
}
