use serde::{Deserialize, Serialize};

/// A tradable market from the static catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketDescriptor {
    /// Market identifier (same as the symbol).
    pub id: String,
    /// Symbol used for price lookups (e.g. "EURUSD").
    pub symbol: String,
    /// Display name (e.g. "EUR/USD OTC").
    pub name: String,
}

impl MarketDescriptor {
    pub fn new(symbol: &str, name: &str) -> Self {
        Self {
            id: symbol.to_string(),
            symbol: symbol.to_string(),
            name: name.to_string(),
        }
    }
}

/// Point-in-time synthetic market data for one symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketSnapshot {
    pub symbol: String,
    pub price: f64,
    /// Absolute change against the base price.
    pub change: f64,
    /// Change as a percentage of the base price.
    pub change_percent: f64,
    pub high: f64,
    pub low: f64,
    pub volume: u64,
    /// Unix timestamp (milliseconds) of generation.
    pub timestamp: i64,
}

impl MarketSnapshot {
    /// Whether the price moved up against the base price.
    pub fn is_up(&self) -> bool {
        self.change > 0.0
    }

    /// Whether the price moved down against the base price.
    pub fn is_down(&self) -> bool {
        self.change < 0.0
    }
}
