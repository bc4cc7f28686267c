//! Report generation for Value-at-Risk analyses.

use crate::histogram::Histogram;
use crate::summary::VarSummary;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Width of histogram bars in text reports.
const HISTOGRAM_WIDTH: usize = 40;

/// Errors that can occur during report generation.
#[derive(Debug, Error)]
pub enum ReportError {
    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A required part was not set on the builder.
    #[error("Report is missing its {0}")]
    Missing(&'static str),
}

/// Rendering format of a report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    /// Terminal text.
    #[default]
    Text,
    /// Markdown document.
    Markdown,
    /// Pretty-printed JSON.
    Json,
}

impl fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text => f.write_str("text"),
            Self::Markdown => f.write_str("markdown"),
            Self::Json => f.write_str("json"),
        }
    }
}

impl FromStr for ReportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Ok(Self::Text),
            "markdown" | "md" => Ok(Self::Markdown),
            "json" => Ok(Self::Json),
            _ => Err(format!(
                "Unknown report format: {s} (expected text, markdown or json)"
            )),
        }
    }
}

/// A Value-at-Risk report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    /// Report generation timestamp.
    pub generated_at: DateTime<Utc>,

    /// Figures of the analysis.
    pub summary: VarSummary,

    /// Distribution of portfolio returns.
    pub histogram: Option<Histogram>,
}

impl Report {
    /// Create a new report stamped with the current time.
    pub fn new(summary: VarSummary, histogram: Option<Histogram>) -> Self {
        Self {
            generated_at: Utc::now(),
            summary,
            histogram,
        }
    }

    /// Convert report to JSON string.
    pub fn to_json(&self) -> Result<String, ReportError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Render the report in `format`.
    pub fn render(&self, format: ReportFormat) -> Result<String, ReportError> {
        match format {
            ReportFormat::Text => Ok(self.to_text()),
            ReportFormat::Markdown => Ok(self.to_markdown()),
            ReportFormat::Json => self.to_json(),
        }
    }

    fn to_text(&self) -> String {
        let mut output = self.summary.to_ascii_table();
        if let Some(histogram) = &self.histogram {
            output.push_str(&format!(
                "\nDistribution of Daily Portfolio Returns ({} bins):\n",
                histogram.bins()
            ));
            output.push_str(&"-".repeat(60));
            output.push('\n');
            output.push_str(
                &histogram.to_ascii(HISTOGRAM_WIDTH, Some(self.summary.historical.quantile_return)),
            );
        }
        output.push_str(&format!(
            "\nGenerated {}\n",
            self.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
        ));
        output
    }

    fn to_markdown(&self) -> String {
        let mut output = self.summary.to_markdown();
        if let Some(histogram) = &self.histogram {
            output.push_str("\n## Distribution of Daily Returns\n\n```text\n");
            output.push_str(
                &histogram.to_ascii(HISTOGRAM_WIDTH, Some(self.summary.historical.quantile_return)),
            );
            output.push_str("```\n");
        }
        output.push_str(&format!(
            "\n_Generated {}_\n",
            self.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
        ));
        output
    }
}

/// Builder for creating reports.
#[derive(Debug, Default)]
pub struct ReportBuilder {
    summary: Option<VarSummary>,
    histogram: Option<Histogram>,
    generated_at: Option<DateTime<Utc>>,
}

impl ReportBuilder {
    /// Create a new report builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the summary.
    pub fn summary(mut self, summary: VarSummary) -> Self {
        self.summary = Some(summary);
        self
    }

    /// Attach a histogram.
    pub fn histogram(mut self, histogram: Histogram) -> Self {
        self.histogram = Some(histogram);
        self
    }

    /// Fix the generation timestamp instead of using the current time.
    pub const fn generated_at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.generated_at = Some(timestamp);
        self
    }

    /// Build the report.
    pub fn build(self) -> Result<Report, ReportError> {
        let summary = self.summary.ok_or(ReportError::Missing("summary"))?;
        let mut report = Report::new(summary, self.histogram);
        if let Some(timestamp) = self.generated_at {
            report.generated_at = timestamp;
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::summary::PortfolioHolding;
    use chrono::{NaiveDate, TimeZone};
    use hsvar_risk::{
        HistoricalVar, PercentileMethod, ReturnKind, ReturnStatistics, VarEstimator,
    };
    use rstest::rstest;

    fn returns() -> Vec<f64> {
        (0..=100).map(|i| (i as f64 - 50.0) / 1000.0).collect()
    }

    fn summary() -> VarSummary {
        let returns = returns();
        VarSummary {
            name: "Default".to_string(),
            holdings: vec![PortfolioHolding::new("AAPL".to_string(), 1.0)],
            period_start: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            period_end: NaiveDate::from_ymd_opt(2024, 5, 24).unwrap(),
            trading_days: 102,
            portfolio_value: 100_000.0,
            return_kind: ReturnKind::Simple,
            percentile_method: PercentileMethod::Linear,
            historical: HistoricalVar::new(0.95).unwrap().estimate(&returns).unwrap(),
            parametric: None,
            statistics: ReturnStatistics::from_returns(&returns).unwrap(),
        }
    }

    fn report() -> Report {
        ReportBuilder::new()
            .summary(summary())
            .histogram(Histogram::from_values(&returns(), 10).unwrap())
            .generated_at(Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap())
            .build()
            .unwrap()
    }

    #[rstest]
    #[case("text", ReportFormat::Text)]
    #[case("MD", ReportFormat::Markdown)]
    #[case("json", ReportFormat::Json)]
    fn test_parse_format(#[case] input: &str, #[case] expected: ReportFormat) {
        assert_eq!(input.parse::<ReportFormat>().unwrap(), expected);
    }

    #[test]
    fn test_parse_format_unknown() {
        assert!("html".parse::<ReportFormat>().is_err());
    }

    #[test]
    fn test_builder_requires_summary() {
        assert!(matches!(
            ReportBuilder::new().build(),
            Err(ReportError::Missing("summary"))
        ));
    }

    #[test]
    fn test_render_text() {
        let text = report().render(ReportFormat::Text).unwrap();

        assert!(text.contains("VALUE AT RISK (VaR)"));
        assert!(text.contains("Distribution of Daily Portfolio Returns (10 bins)"));
        assert!(text.contains("<- VaR"));
        assert!(text.contains("Generated 2025-01-02 03:04:05 UTC"));
    }

    #[test]
    fn test_render_markdown() {
        let markdown = report().render(ReportFormat::Markdown).unwrap();

        assert!(markdown.starts_with("# Value at Risk: Default"));
        assert!(markdown.contains("```text"));
    }

    #[test]
    fn test_render_json() {
        let json = report().render(ReportFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["summary"]["name"], "Default");
        assert_eq!(value["summary"]["historical"]["method"], "historical");
        assert_eq!(value["histogram"]["counts"].as_array().unwrap().len(), 10);
    }

    #[test]
    fn test_render_without_histogram() {
        let report = ReportBuilder::new().summary(summary()).build().unwrap();
        let text = report.render(ReportFormat::Text).unwrap();
        assert!(!text.contains("Distribution"));
    }
}
