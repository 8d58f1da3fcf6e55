//! Key-value store for client-side records.
//!
//! Values are JSON. The directory backend keeps one `<key>.json` file per key
//! so the stored records survive restarts; the memory backend is used in tests
//! and when no store directory is configured.

use crate::error::{AppError, Result};
use dashmap::DashMap;
use serde::{de::DeserializeOwned, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

/// Key holding the local user record.
pub const USER_KEY: &str = "user";
/// Key holding the signal settings.
pub const SETTINGS_KEY: &str = "signalSettings";

enum Backend {
    Memory(DashMap<String, String>),
    Directory(PathBuf),
}

/// JSON key-value store.
#[derive(Clone)]
pub struct LocalStore {
    backend: Arc<Backend>,
}

impl LocalStore {
    /// Store that lives only as long as the process.
    pub fn in_memory() -> Self {
        Self {
            backend: Arc::new(Backend::Memory(DashMap::new())),
        }
    }

    /// Store backed by a directory, created if missing.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        debug!("Opened local store at {:?}", dir);
        Ok(Self {
            backend: Arc::new(Backend::Directory(dir)),
        })
    }

    /// Read a value. Missing keys read as `None`; values that no longer parse
    /// are dropped and also read as `None`.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = self.read_raw(key)?;

        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("Discarding unreadable stored value {}: {}", key, e);
                self.remove(key);
                None
            }
        }
    }

    /// Write a value.
    pub fn set<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let raw = serde_json::to_string(value)?;

        match self.backend.as_ref() {
            Backend::Memory(map) => {
                map.insert(key.to_string(), raw);
            }
            Backend::Directory(dir) => {
                fs::write(file_path(dir, key), raw)
                    .map_err(|e| AppError::Storage(format!("failed to write {}: {}", key, e)))?;
            }
        }
        debug!("Stored {}", key);
        Ok(())
    }

    /// Remove a value if present.
    pub fn remove(&self, key: &str) {
        match self.backend.as_ref() {
            Backend::Memory(map) => {
                map.remove(key);
            }
            Backend::Directory(dir) => {
                if let Err(e) = fs::remove_file(file_path(dir, key)) {
                    if e.kind() != ErrorKind::NotFound {
                        warn!("Failed to remove stored value {}: {}", key, e);
                    }
                }
            }
        }
    }

    /// Raw stored text for a key.
    pub fn read_raw(&self, key: &str) -> Option<String> {
        match self.backend.as_ref() {
            Backend::Memory(map) => map.get(key).map(|v| v.clone()),
            Backend::Directory(dir) => fs::read_to_string(file_path(dir, key)).ok(),
        }
    }

    /// Overwrite a key with raw text, bypassing serialization.
    pub fn write_raw(&self, key: &str, raw: &str) -> Result<()> {
        match self.backend.as_ref() {
            Backend::Memory(map) => {
                map.insert(key.to_string(), raw.to_string());
            }
            Backend::Directory(dir) => fs::write(file_path(dir, key), raw)?,
        }
        Ok(())
    }
}

fn file_path(dir: &Path, key: &str) -> PathBuf {
    let safe_key = key.replace(['/', '\\', ':', '*', '?', '"', '<', '>', '|'], "_");
    dir.join(format!("{}.json", safe_key))
}
