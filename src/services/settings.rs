/**
 * Settings Service
 *
 * Loads and persists `SignalSettings` in the local store.
 * - Missing or unreadable settings fall back to defaults
 * - Writes are validated before they are stored
 */

use crate::error::{AppError, Result};
use crate::services::local_store::{LocalStore, SETTINGS_KEY};
use crate::types::{PartialSignalSettings, SignalSettings};
use tracing::{debug, info};

/// Signal settings backed by the local store.
#[derive(Clone)]
pub struct SettingsService {
    store: LocalStore,
}

impl SettingsService {
    pub fn new(store: LocalStore) -> Self {
        Self { store }
    }

    /// Stored settings, or defaults when none are stored.
    pub fn load(&self) -> SignalSettings {
        self.store.get(SETTINGS_KEY).unwrap_or_else(|| {
            debug!("No stored signal settings, using defaults");
            SignalSettings::default()
        })
    }

    /// Replace the stored settings.
    pub fn save(&self, settings: &SignalSettings) -> Result<()> {
        settings.validate().map_err(AppError::BadRequest)?;
        self.store.set(SETTINGS_KEY, settings)?;
        info!("Signal settings saved");
        Ok(())
    }

    /// Apply a partial update and store the result.
    pub fn update(&self, partial: &PartialSignalSettings) -> Result<SignalSettings> {
        let mut settings = self.load();
        partial.apply_to(&mut settings);
        self.save(&settings)?;
        Ok(settings)
    }

    /// Restore and store the defaults.
    pub fn reset(&self) -> Result<SignalSettings> {
        let settings = SignalSettings::default();
        self.save(&settings)?;
        Ok(settings)
    }
}
