//! Value-at-Risk summary.
//!
//! Collects the figures of one analysis run and formats them for a terminal,
//! for Markdown documents, or as flat `metric,value` rows.

use chrono::NaiveDate;
use hsvar_risk::{PercentileMethod, ReturnKind, ReturnStatistics, VarEstimate};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single holding as shown in a summary.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PortfolioHolding {
    /// Security symbol.
    pub symbol: String,

    /// Weight in the portfolio (0.0 to 1.0).
    pub weight: f64,
}

impl PortfolioHolding {
    /// Create a new holding.
    pub const fn new(symbol: String, weight: f64) -> Self {
        Self { symbol, weight }
    }
}

/// Figures of one Value-at-Risk analysis.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VarSummary {
    /// Portfolio name.
    pub name: String,

    /// Holdings with their weights.
    pub holdings: Vec<PortfolioHolding>,

    /// First aligned trading day.
    pub period_start: NaiveDate,

    /// Last aligned trading day.
    pub period_end: NaiveDate,

    /// Number of aligned trading days (one more than the number of returns).
    pub trading_days: usize,

    /// Portfolio value in currency units.
    pub portfolio_value: f64,

    /// Return definition used.
    pub return_kind: ReturnKind,

    /// Percentile method used for the historical estimate.
    pub percentile_method: PercentileMethod,

    /// Historical-simulation estimate.
    pub historical: VarEstimate,

    /// Normal estimate on the same returns, if computed.
    pub parametric: Option<VarEstimate>,

    /// Statistics of the portfolio return series.
    pub statistics: ReturnStatistics,
}

impl VarSummary {
    /// Confidence level of the historical estimate.
    pub const fn confidence(&self) -> f64 {
        self.historical.confidence
    }

    /// Historical VaR in currency units.
    pub fn var_monetary(&self) -> f64 {
        self.historical.monetary(self.portfolio_value)
    }

    /// Historical expected shortfall in currency units.
    pub fn shortfall_monetary(&self) -> f64 {
        self.historical.shortfall_monetary(self.portfolio_value)
    }

    /// Parametric VaR in currency units.
    pub fn parametric_monetary(&self) -> Option<f64> {
        self.parametric
            .as_ref()
            .map(|estimate| estimate.monetary(self.portfolio_value))
    }

    /// Symbols joined with `", "`.
    pub fn symbols(&self) -> String {
        self.holdings
            .iter()
            .map(|h| h.symbol.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Weights formatted as percentages, in holding order.
    pub fn weights_display(&self) -> String {
        self.holdings
            .iter()
            .map(|h| format!("{}: {:.1}%", h.symbol, h.weight * 100.0))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Flat `(metric, value)` pairs, used for CSV export.
    pub fn metrics(&self) -> Vec<(String, String)> {
        let mut rows = vec![
            ("portfolio".to_string(), self.name.clone()),
            ("symbols".to_string(), self.symbols()),
            ("period_start".to_string(), self.period_start.to_string()),
            ("period_end".to_string(), self.period_end.to_string()),
            ("trading_days".to_string(), self.trading_days.to_string()),
            ("observations".to_string(), self.historical.observations.to_string()),
            ("confidence".to_string(), self.confidence().to_string()),
            ("portfolio_value".to_string(), self.portfolio_value.to_string()),
            ("return_kind".to_string(), self.return_kind.to_string()),
            ("percentile_method".to_string(), self.percentile_method.to_string()),
            (
                "quantile_return".to_string(),
                self.historical.quantile_return.to_string(),
            ),
            ("var".to_string(), self.historical.var.to_string()),
            ("var_amount".to_string(), self.var_monetary().to_string()),
            (
                "expected_shortfall".to_string(),
                self.historical.expected_shortfall.to_string(),
            ),
            (
                "expected_shortfall_amount".to_string(),
                self.shortfall_monetary().to_string(),
            ),
        ];

        if let Some(parametric) = &self.parametric {
            rows.push(("parametric_var".to_string(), parametric.var.to_string()));
            rows.push((
                "parametric_var_amount".to_string(),
                parametric.monetary(self.portfolio_value).to_string(),
            ));
            rows.push((
                "parametric_expected_shortfall".to_string(),
                parametric.expected_shortfall.to_string(),
            ));
        }

        rows.push(("mean_return".to_string(), self.statistics.mean.to_string()));
        rows.push(("std_dev".to_string(), self.statistics.std_dev.to_string()));
        rows.push(("min_return".to_string(), self.statistics.min.to_string()));
        rows.push(("max_return".to_string(), self.statistics.max.to_string()));
        rows
    }

    /// Format as ASCII table for terminal display.
    pub fn to_ascii_table(&self) -> String {
        let mut output = String::new();
        let level = percent_label(self.confidence());

        output.push_str(&"=".repeat(60));
        output.push('\n');
        output.push_str("VALUE AT RISK (VaR)\n");
        output.push_str("Historical Simulation Method\n");
        output.push_str(&"=".repeat(60));
        output.push('\n');

        output.push_str(&format!("  Portfolio:          {}\n", self.name));
        output.push_str(&format!("  Holdings:           {}\n", self.weights_display()));
        output.push_str(&format!(
            "  Portfolio Value:    {}\n",
            format_currency(self.portfolio_value)
        ));
        output.push_str(&format!(
            "  Period:             {} to {}\n",
            self.period_start, self.period_end
        ));
        output.push_str(&format!("  Trading Days:       {}\n", self.trading_days));
        output.push_str(&format!(
            "  Returns:            {} ({} observations)\n",
            self.return_kind, self.historical.observations
        ));

        output.push_str("\nHistorical VaR:\n");
        output.push_str(&"-".repeat(60));
        output.push('\n');
        output.push_str(&format!(
            "  {level}% VaR:            {:.4} ({:.2}%)\n",
            self.historical.var,
            self.historical.var * 100.0
        ));
        output.push_str(&format!(
            "  VaR in Dollars:      {}\n",
            format_currency(self.var_monetary())
        ));
        output.push_str(&format!(
            "  Quantile Return:     {:.4}% ({})\n",
            self.historical.quantile_return * 100.0,
            self.percentile_method
        ));
        output.push_str(&format!(
            "  Expected Shortfall:  {:.2}% ({})\n",
            self.historical.expected_shortfall * 100.0,
            format_currency(self.shortfall_monetary())
        ));

        if let Some(parametric) = &self.parametric {
            output.push_str("\nParametric (Normal) VaR:\n");
            output.push_str(&"-".repeat(60));
            output.push('\n');
            output.push_str(&format!(
                "  {level}% VaR:            {:.4} ({:.2}%)\n",
                parametric.var,
                parametric.var * 100.0
            ));
            output.push_str(&format!(
                "  VaR in Dollars:      {}\n",
                format_currency(parametric.monetary(self.portfolio_value))
            ));
            output.push_str(&format!(
                "  Expected Shortfall:  {:.2}%\n",
                parametric.expected_shortfall * 100.0
            ));
        }

        output.push_str("\nDaily Return Statistics:\n");
        output.push_str(&"-".repeat(60));
        output.push('\n');
        output.push_str(&format!("  Mean:                {:.4}%\n", self.statistics.mean * 100.0));
        output.push_str(&format!(
            "  Std Dev:             {:.4}%\n",
            self.statistics.std_dev * 100.0
        ));
        output.push_str(&format!(
            "  Annualized Vol:      {:.2}%\n",
            self.statistics.annualized_volatility(252.0) * 100.0
        ));
        output.push_str(&format!(
            "  Worst / Best Day:    {:.2}% / {:.2}%\n",
            self.statistics.min * 100.0,
            self.statistics.max * 100.0
        ));

        output.push_str(&"=".repeat(60));
        output.push('\n');

        output
    }

    /// Format as Markdown for documentation.
    pub fn to_markdown(&self) -> String {
        let mut output = String::new();
        let level = percent_label(self.confidence());

        output.push_str(&format!("# Value at Risk: {}\n\n", self.name));
        output.push_str(&format!(
            "**Period:** {} to {} ({} trading days)\n\n",
            self.period_start, self.period_end, self.trading_days
        ));
        output.push_str(&format!(
            "**Portfolio Value:** {}\n\n",
            format_currency(self.portfolio_value)
        ));

        output.push_str("## Holdings\n\n");
        output.push_str("| Symbol | Weight |\n");
        output.push_str("|--------|--------|\n");
        for holding in &self.holdings {
            output.push_str(&format!("| {} | {:.2}% |\n", holding.symbol, holding.weight * 100.0));
        }
        output.push('\n');

        output.push_str("## Value at Risk\n\n");
        output.push_str("| Method | Confidence | VaR | VaR ($) | Expected Shortfall |\n");
        output.push_str("|--------|------------|-----|---------|--------------------|\n");
        for estimate in std::iter::once(&self.historical).chain(self.parametric.as_ref()) {
            output.push_str(&format!(
                "| {} | {level}% | {:.2}% | {} | {:.2}% |\n",
                estimate.method,
                estimate.var * 100.0,
                format_currency(estimate.monetary(self.portfolio_value)),
                estimate.expected_shortfall * 100.0
            ));
        }
        output.push('\n');

        output.push_str("## Daily Returns\n\n");
        output.push_str(&format!(
            "- **Type:** {} ({} observations)\n",
            self.return_kind, self.historical.observations
        ));
        output.push_str(&format!("- **Mean:** {:.4}%\n", self.statistics.mean * 100.0));
        output.push_str(&format!("- **Std Dev:** {:.4}%\n", self.statistics.std_dev * 100.0));
        output.push_str(&format!(
            "- **Worst / Best Day:** {:.2}% / {:.2}%\n",
            self.statistics.min * 100.0,
            self.statistics.max * 100.0
        ));

        output
    }
}

impl fmt::Display for VarSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "VaR Summary: {} ({} to {})",
            self.name, self.period_start, self.period_end
        )?;
        writeln!(
            f,
            "  {}% VaR: {:.4} ({:.2}%)",
            percent_label(self.confidence()),
            self.historical.var,
            self.historical.var * 100.0
        )?;
        writeln!(f, "  VaR in Dollars: {}", format_currency(self.var_monetary()))?;
        writeln!(
            f,
            "  Portfolio Value: {}",
            format_currency(self.portfolio_value)
        )?;
        Ok(())
    }
}

/// Confidence level as a percentage with at most two decimals (95, 97.5).
fn percent_label(confidence: f64) -> f64 {
    (confidence * 10_000.0).round() / 100.0
}

/// Format an amount as dollars with thousands separators, e.g. `$4,505.00`.
pub fn format_currency(amount: f64) -> String {
    let cents = (amount.abs() * 100.0).round() as u64;
    let whole = (cents / 100).to_string();

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if amount < 0.0 && cents > 0 { "-" } else { "" };
    format!("{sign}${grouped}.{:02}", cents % 100)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hsvar_risk::{HistoricalVar, ParametricVar, VarEstimator};
    use rstest::rstest;

    fn summary() -> VarSummary {
        // -0.050, -0.049, ..., 0.050: the 5th percentile is exactly -0.045
        let returns: Vec<f64> = (0..=100).map(|i| (i as f64 - 50.0) / 1000.0).collect();
        VarSummary {
            name: "Tech Portfolio".to_string(),
            holdings: vec![
                PortfolioHolding::new("AAPL".to_string(), 0.5),
                PortfolioHolding::new("MSFT".to_string(), 0.5),
            ],
            period_start: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            period_end: NaiveDate::from_ymd_opt(2024, 5, 24).unwrap(),
            trading_days: 102,
            portfolio_value: 100_000.0,
            return_kind: ReturnKind::Simple,
            percentile_method: PercentileMethod::Linear,
            historical: HistoricalVar::new(0.95).unwrap().estimate(&returns).unwrap(),
            parametric: Some(ParametricVar::new(0.95).unwrap().estimate(&returns).unwrap()),
            statistics: ReturnStatistics::from_returns(&returns).unwrap(),
        }
    }

    #[rstest]
    #[case(0.0, "$0.00")]
    #[case(4505.0, "$4,505.00")]
    #[case(100_000.0, "$100,000.00")]
    #[case(1_234_567.891, "$1,234,567.89")]
    #[case(-2500.5, "-$2,500.50")]
    fn test_format_currency(#[case] amount: f64, #[case] expected: &str) {
        assert_eq!(format_currency(amount), expected);
    }

    #[rstest]
    #[case(0.95, "95")]
    #[case(0.975, "97.5")]
    #[case(0.99, "99")]
    fn test_percent_label(#[case] confidence: f64, #[case] expected: &str) {
        assert_eq!(percent_label(confidence).to_string(), expected);
    }

    #[test]
    fn test_monetary_figures() {
        let summary = summary();
        assert!((summary.var_monetary() - 4_500.0).abs() < 1e-6);
        assert!((summary.shortfall_monetary() - 4_750.0).abs() < 1e-6);
        assert!(summary.parametric_monetary().unwrap() > 0.0);
    }

    #[test]
    fn test_ascii_table() {
        let table = summary().to_ascii_table();

        assert!(table.contains("Historical Simulation Method"));
        assert!(table.contains("AAPL: 50.0%, MSFT: 50.0%"));
        assert!(table.contains("95% VaR:            0.0450 (4.50%)"));
        assert!(table.contains("$4,500.00"));
        assert!(table.contains("Parametric (Normal) VaR"));
    }

    #[test]
    fn test_ascii_table_without_parametric() {
        let mut summary = summary();
        summary.parametric = None;
        assert!(!summary.to_ascii_table().contains("Parametric"));
        assert!(!summary.metrics().iter().any(|(m, _)| m.starts_with("parametric")));
    }

    #[test]
    fn test_markdown() {
        let markdown = summary().to_markdown();

        assert!(markdown.starts_with("# Value at Risk: Tech Portfolio"));
        assert!(markdown.contains("| AAPL | 50.00% |"));
        assert!(markdown.contains("| historical | 95% | 4.50% | $4,500.00 | 4.75% |"));
        assert!(markdown.contains("| parametric |"));
    }

    #[test]
    fn test_display() {
        let text = summary().to_string();
        assert!(text.starts_with("VaR Summary: Tech Portfolio (2024-01-02 to 2024-05-24)"));
        assert!(text.contains("VaR in Dollars: $4,500.00"));
    }

    #[test]
    fn test_metrics() {
        let metrics = summary().metrics();
        let get = |name: &str| {
            metrics
                .iter()
                .find(|(m, _)| m == name)
                .map(|(_, v)| v.clone())
                .unwrap()
        };

        assert_eq!(get("symbols"), "AAPL, MSFT");
        assert_eq!(get("trading_days"), "102");
        assert_eq!(get("observations"), "101");
        assert_eq!(get("return_kind"), "simple");
        assert!(metrics.iter().any(|(m, _)| m == "parametric_var"));
    }
}
