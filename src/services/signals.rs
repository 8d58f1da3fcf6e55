//! Signal generator.
//!
//! Turns one market's fresh snapshot into a buy/sell signal with a confidence
//! score and qualitative indicator summaries. The indicator values are drawn
//! from direction-dependent ranges, not computed from price history.

use crate::error::{AppError, Result};
use crate::services::{Entropy, MarketDataSimulator};
use crate::types::{MarketSnapshot, Signal, SignalDirection, SignalIndicators};
use std::sync::Arc;
use tracing::{debug, info};

pub const MIN_CONFIDENCE: u8 = 65;
pub const MAX_CONFIDENCE: u8 = 95;
const BASE_CONFIDENCE: f64 = 70.0;

/// Minimum percentage move for a momentum-following direction.
const MOMENTUM_THRESHOLD_PCT: f64 = 0.1;

pub const MACD_BUY: [&str; 5] = [
    "bullish crossover",
    "positive divergence",
    "histogram increasing",
    "zero line crossover (bullish)",
    "signal line convergence",
];

pub const MACD_SELL: [&str; 5] = [
    "bearish crossover",
    "negative divergence",
    "histogram decreasing",
    "zero line crossover (bearish)",
    "signal line divergence",
];

pub const BOLLINGER_BUY: [&str; 5] = [
    "lower band bounce",
    "middle band crossover (up)",
    "bandwidth expansion (bullish)",
    "price above upper band",
    "W-bottom pattern",
];

pub const BOLLINGER_SELL: [&str; 5] = [
    "upper band rejection",
    "middle band crossover (down)",
    "bandwidth expansion (bearish)",
    "price below lower band",
    "M-top pattern",
];

/// Symbol a market's data is keyed by: the first token of its display name,
/// unchanged ("EUR/USD OTC" reads "EUR/USD").
pub fn symbol_for_market(market: &str) -> String {
    market.split_whitespace().next().unwrap_or_default().to_string()
}

/// Generates signals from synthetic market data.
pub struct SignalGenerator {
    market_data: Arc<MarketDataSimulator>,
    entropy: Entropy,
}

impl SignalGenerator {
    /// Create a new signal generator.
    pub fn new(market_data: Arc<MarketDataSimulator>, entropy: Entropy) -> Arc<Self> {
        Arc::new(Self {
            market_data,
            entropy,
        })
    }

    /// Generate a signal for a market display name.
    pub fn generate(&self, market: &str) -> Result<Signal> {
        self.market_data.auth().require()?;

        let symbol = symbol_for_market(market);
        debug!("Generating signal for market: {} ({})", market, symbol);

        let snapshot = self.market_data.get_snapshot(&symbol).map_err(|e| match e {
            AppError::NotAuthenticated => e,
            other => AppError::SignalGeneration(other.to_string()),
        })?;

        let direction = self.direction(&snapshot);
        let confidence = self.confidence(&snapshot, direction);
        let indicators = SignalIndicators {
            rsi: self.rsi(direction),
            macd: self.macd(direction).to_string(),
            bollinger_bands: self.bollinger(direction).to_string(),
        };

        let now = chrono::Utc::now().timestamp_millis();
        let id = uuid::Uuid::new_v4().simple().to_string();
        let signal = Signal {
            id: format!("sig-{}-{}", now, &id[..8]),
            market: market.to_string(),
            direction,
            confidence,
            timestamp: now,
            indicators,
            timeframe: None,
        };

        info!(
            "Generated {} signal for {} at {}% confidence",
            direction.label(),
            market,
            confidence
        );
        Ok(signal)
    }

    /// Follow momentum when the move is large enough and the draw agrees,
    /// otherwise flip a coin.
    fn direction(&self, snapshot: &MarketSnapshot) -> SignalDirection {
        let draw = self.entropy.uniform();

        if snapshot.is_up() && snapshot.change_percent > MOMENTUM_THRESHOLD_PCT && draw > 0.3 {
            SignalDirection::Buy
        } else if snapshot.is_down()
            && snapshot.change_percent < -MOMENTUM_THRESHOLD_PCT
            && draw > 0.3
        {
            SignalDirection::Sell
        } else if self.entropy.uniform() > 0.5 {
            SignalDirection::Buy
        } else {
            SignalDirection::Sell
        }
    }

    fn confidence(&self, snapshot: &MarketSnapshot, direction: SignalDirection) -> u8 {
        let mut adjustment = snapshot.change_percent.abs() * 2.0;

        let aligned = match direction {
            SignalDirection::Buy => snapshot.is_up(),
            SignalDirection::Sell => snapshot.is_down(),
        };
        adjustment += if aligned { 5.0 } else { -5.0 };

        adjustment += self.entropy.uniform() * 10.0 - 5.0;

        (BASE_CONFIDENCE + adjustment)
            .round()
            .clamp(MIN_CONFIDENCE as f64, MAX_CONFIDENCE as f64) as u8
    }

    fn rsi(&self, direction: SignalDirection) -> u8 {
        let reversal = self.entropy.uniform() > 0.5;
        let offset = self.entropy.below(15) as u8;

        match (direction, reversal) {
            // recovering from oversold
            (SignalDirection::Buy, true) => 30 + offset,
            // bullish range
            (SignalDirection::Buy, false) => 55 + offset,
            // falling from overbought
            (SignalDirection::Sell, true) => 70 - offset,
            // bearish range
            (SignalDirection::Sell, false) => 45 - offset,
        }
    }

    fn macd(&self, direction: SignalDirection) -> &'static str {
        match direction {
            SignalDirection::Buy => *self.entropy.pick(&MACD_BUY),
            SignalDirection::Sell => *self.entropy.pick(&MACD_SELL),
        }
    }

    fn bollinger(&self, direction: SignalDirection) -> &'static str {
        match direction {
            SignalDirection::Buy => *self.entropy.pick(&BOLLINGER_BUY),
            SignalDirection::Sell => *self.entropy.pick(&BOLLINGER_SELL),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbol_for_market() {
        assert_eq!(symbol_for_market("EUR/USD OTC"), "EUR/USD");
        assert_eq!(symbol_for_market("GBP/USD"), "GBP/USD");
        assert_eq!(symbol_for_market("usdjpy"), "usdjpy");
        assert_eq!(symbol_for_market("   "), "");
    }

    #[test]
    fn test_vocabularies_are_direction_specific() {
        for label in MACD_BUY.iter().chain(BOLLINGER_BUY.iter()) {
            assert!(!MACD_SELL.contains(label));
            assert!(!BOLLINGER_SELL.contains(label));
        }
    }
}
