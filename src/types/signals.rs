use serde::{Deserialize, Serialize};

/// Chart timeframe a signal is presented for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Timeframe {
    #[default]
    #[serde(rename = "1m")]
    OneMinute,
    #[serde(rename = "5m")]
    FiveMinutes,
}

impl Timeframe {
    /// Parse from string.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "1m" | "1min" => Some(Self::OneMinute),
            "5m" | "5min" => Some(Self::FiveMinutes),
            _ => None,
        }
    }

    /// Get the short label ("1m", "5m").
    pub fn label(&self) -> &'static str {
        match self {
            Self::OneMinute => "1m",
            Self::FiveMinutes => "5m",
        }
    }
}

/// Direction of a trading signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalDirection {
    Buy,
    Sell,
}

impl SignalDirection {
    /// Get display label for this direction.
    pub fn label(&self) -> &'static str {
        match self {
            SignalDirection::Buy => "BUY",
            SignalDirection::Sell => "SELL",
        }
    }
}

/// Qualitative indicator summaries attached to a signal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignalIndicators {
    /// RSI reading (0-100).
    pub rsi: u8,
    /// MACD description.
    pub macd: String,
    /// Bollinger Bands description.
    pub bollinger_bands: String,
}

/// A generated directional recommendation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Signal {
    /// Unique id derived from generation time.
    pub id: String,
    /// Market display name the signal was requested for.
    pub market: String,
    pub direction: SignalDirection,
    /// Confidence percentage (65-95).
    pub confidence: u8,
    /// Unix timestamp (milliseconds) when generated.
    pub timestamp: i64,
    pub indicators: SignalIndicators,
    /// Timeframe of the session that stored the signal.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeframe: Option<Timeframe>,
}

impl Signal {
    /// Copy of this signal stamped with a timeframe.
    pub fn with_timeframe(mut self, timeframe: Timeframe) -> Self {
        self.timeframe = Some(timeframe);
        self
    }
}
