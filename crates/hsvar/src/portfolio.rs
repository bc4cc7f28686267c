//! Portfolio definition.

use crate::config::ConfigError;
use hsvar_output::PortfolioHolding;
use hsvar_risk::Weights;
use serde::{Deserialize, Deserializer, Serialize};

/// Symbols of the default portfolio.
pub const DEFAULT_SYMBOLS: [&str; 3] = ["AAPL", "MSFT", "GOOGL"];

/// Value of the default portfolio in dollars.
pub const DEFAULT_PORTFOLIO_VALUE: f64 = 100_000.0;

/// One position of a portfolio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Holding {
    /// Ticker symbol, trimmed and upper-cased when deserialized.
    #[serde(deserialize_with = "normalized_symbol")]
    pub symbol: String,
    /// Fraction of portfolio value.
    pub weight: f64,
}

impl Holding {
    /// Create a holding.
    pub fn new(symbol: impl Into<String>, weight: f64) -> Self {
        Self {
            symbol: symbol.into(),
            weight,
        }
    }
}

fn normalized_symbol<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(String::deserialize(deserializer)?.trim().to_uppercase())
}

/// A long-only portfolio with a total value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Portfolio {
    /// Display name.
    pub name: String,
    /// Positions; weights sum to one.
    pub holdings: Vec<Holding>,
    /// Total value in dollars.
    pub value: f64,
}

impl Default for Portfolio {
    fn default() -> Self {
        let weight = 1.0 / DEFAULT_SYMBOLS.len() as f64;
        Self {
            name: "Default".to_string(),
            holdings: DEFAULT_SYMBOLS
                .iter()
                .map(|s| Holding::new(*s, weight))
                .collect(),
            value: DEFAULT_PORTFOLIO_VALUE,
        }
    }
}

impl Portfolio {
    /// Build a portfolio from symbols and optional weights.
    ///
    /// Symbols are trimmed and upper-cased. Without weights every holding gets
    /// `1/n`.
    ///
    /// # Errors
    /// Fails on an empty or duplicate symbol, a weight count that differs
    /// from the symbol count, invalid weights, or a non-positive value.
    pub fn from_symbols(
        symbols: &[String],
        weights: Option<Vec<f64>>,
        value: f64,
    ) -> Result<Self, ConfigError> {
        let symbols: Vec<String> = symbols.iter().map(|s| s.trim().to_uppercase()).collect();
        if symbols.is_empty() {
            return Err(ConfigError::EmptyPortfolio);
        }

        let weights = match weights {
            Some(weights) if weights.len() != symbols.len() => {
                return Err(ConfigError::WeightCount {
                    expected: symbols.len(),
                    actual: weights.len(),
                });
            }
            Some(weights) => weights,
            None => Weights::equal(symbols.len())?.to_vec(),
        };

        let portfolio = Self {
            name: symbols.join("/"),
            holdings: symbols
                .into_iter()
                .zip(weights)
                .map(|(symbol, weight)| Holding { symbol, weight })
                .collect(),
            value,
        };
        portfolio.validate()?;
        Ok(portfolio)
    }

    /// Replace the display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Symbols in holding order.
    pub fn symbols(&self) -> Vec<String> {
        self.holdings.iter().map(|h| h.symbol.clone()).collect()
    }

    /// Validated weights in holding order.
    pub fn weights(&self) -> Result<Weights, ConfigError> {
        Ok(Weights::new(
            self.holdings.iter().map(|h| h.weight).collect(),
        )?)
    }

    /// Check symbols, weights and value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.holdings.is_empty() {
            return Err(ConfigError::EmptyPortfolio);
        }
        for (i, holding) in self.holdings.iter().enumerate() {
            if holding.symbol.trim().is_empty() {
                return Err(ConfigError::InvalidSymbol(holding.symbol.clone()));
            }
            if self.holdings[..i]
                .iter()
                .any(|h| h.symbol.eq_ignore_ascii_case(&holding.symbol))
            {
                return Err(ConfigError::DuplicateSymbol(holding.symbol.clone()));
            }
        }
        self.weights()?;
        if !self.value.is_finite() || self.value <= 0.0 {
            return Err(ConfigError::InvalidValue(self.value));
        }
        Ok(())
    }

    /// Holdings in the shape used by reports.
    pub fn report_holdings(&self) -> Vec<PortfolioHolding> {
        self.holdings
            .iter()
            .map(|h| PortfolioHolding::new(h.symbol.clone(), h.weight))
            .collect()
    }
}
