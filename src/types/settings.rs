//! Signal settings persisted under the "signalSettings" key.

use serde::{Deserialize, Serialize};

/// How often the client wants signals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SignalFrequency {
    Low,
    #[default]
    Medium,
    High,
}

/// User-tunable signal settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignalSettings {
    /// Signal sensitivity (0-100).
    pub sensitivity: u8,
    #[serde(rename = "useRSI")]
    pub use_rsi: bool,
    #[serde(rename = "useMACD")]
    pub use_macd: bool,
    pub use_bollinger_bands: bool,
    /// Minimum confidence to show (0-100).
    pub confidence_threshold: u8,
    pub signal_frequency: SignalFrequency,
}

impl Default for SignalSettings {
    fn default() -> Self {
        Self {
            sensitivity: 50,
            use_rsi: true,
            use_macd: true,
            use_bollinger_bands: true,
            confidence_threshold: 75,
            signal_frequency: SignalFrequency::Medium,
        }
    }
}

impl SignalSettings {
    /// Check percentage fields are within 0-100.
    pub fn validate(&self) -> Result<(), String> {
        if self.sensitivity > 100 {
            return Err(format!("sensitivity {} out of range 0-100", self.sensitivity));
        }
        if self.confidence_threshold > 100 {
            return Err(format!(
                "confidenceThreshold {} out of range 0-100",
                self.confidence_threshold
            ));
        }
        Ok(())
    }
}

/// Partial update of signal settings. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartialSignalSettings {
    pub sensitivity: Option<u8>,
    #[serde(rename = "useRSI")]
    pub use_rsi: Option<bool>,
    #[serde(rename = "useMACD")]
    pub use_macd: Option<bool>,
    pub use_bollinger_bands: Option<bool>,
    pub confidence_threshold: Option<u8>,
    pub signal_frequency: Option<SignalFrequency>,
}

impl PartialSignalSettings {
    /// Apply the present fields to existing settings.
    pub fn apply_to(&self, settings: &mut SignalSettings) {
        if let Some(v) = self.sensitivity {
            settings.sensitivity = v;
        }
        if let Some(v) = self.use_rsi {
            settings.use_rsi = v;
        }
        if let Some(v) = self.use_macd {
            settings.use_macd = v;
        }
        if let Some(v) = self.use_bollinger_bands {
            settings.use_bollinger_bands = v;
        }
        if let Some(v) = self.confidence_threshold {
            settings.confidence_threshold = v;
        }
        if let Some(v) = self.signal_frequency {
            settings.signal_frequency = v;
        }
    }
}
