//! Persisted auto-refresh settings

use crate::db::KeyValueStore;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// Key of the settings slot in the key-value store
pub const SETTINGS_KEY: &str = "autoRefreshSettings";

/// Selectable refresh intervals in seconds, ascending
pub const AVAILABLE_INTERVALS: [u64; 5] = [5, 10, 20, 30, 60];

pub const DEFAULT_INTERVAL_SECS: u64 = 10;

/// Longest stored interval honoured on load (one day)
pub const MAX_INTERVAL_SECS: u64 = 86_400;

/// Auto-refresh settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RefreshSettings {
    pub enabled: bool,
    pub interval_seconds: u64,
}

impl Default for RefreshSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            interval_seconds: DEFAULT_INTERVAL_SECS,
        }
    }
}

impl RefreshSettings {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_seconds)
    }

    /// Apply the fields present in `update`
    pub fn merge(&mut self, update: &RefreshSettingsUpdate) {
        if let Some(enabled) = update.enabled {
            self.enabled = enabled;
        }
        if let Some(secs) = update.interval_seconds {
            self.interval_seconds = secs;
        }
    }
}

/// Partial settings update
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshSettingsUpdate {
    pub enabled: Option<bool>,
    pub interval_seconds: Option<u64>,
}

impl RefreshSettingsUpdate {
    pub fn enabled(enabled: bool) -> Self {
        Self {
            enabled: Some(enabled),
            ..Self::default()
        }
    }

    pub fn interval(seconds: u64) -> Self {
        Self {
            interval_seconds: Some(seconds),
            ..Self::default()
        }
    }
}

pub fn is_available_interval(seconds: u64) -> bool {
    AVAILABLE_INTERVALS.contains(&seconds)
}

/// Read settings from `store`, falling back to defaults on missing or
/// unreadable data.
///
/// Intervals outside [`AVAILABLE_INTERVALS`] are kept as stored. A zero
/// interval cannot be scheduled and is replaced by the default.
pub fn load_settings(store: &dyn KeyValueStore) -> RefreshSettings {
    let raw = match store.get(SETTINGS_KEY) {
        Ok(Some(raw)) => raw,
        Ok(None) => {
            debug!("No stored auto-refresh settings, using defaults");
            return RefreshSettings::default();
        }
        Err(e) => {
            warn!("Failed to read auto-refresh settings: {}", e);
            return RefreshSettings::default();
        }
    };

    let mut settings: RefreshSettings = match serde_json::from_str(&raw) {
        Ok(settings) => settings,
        Err(e) => {
            warn!("Stored auto-refresh settings are corrupt ({}), using defaults", e);
            return RefreshSettings::default();
        }
    };

    if settings.interval_seconds == 0 || settings.interval_seconds > MAX_INTERVAL_SECS {
        warn!(
            "Stored refresh interval {}s is out of range, using {}s",
            settings.interval_seconds, DEFAULT_INTERVAL_SECS
        );
        settings.interval_seconds = DEFAULT_INTERVAL_SECS;
    } else if !is_available_interval(settings.interval_seconds) {
        debug!(
            "Stored refresh interval {}s is not a selectable value",
            settings.interval_seconds
        );
    }

    settings
}

/// Persist settings. Best effort: failures are logged only.
pub fn save_settings(store: &dyn KeyValueStore, settings: &RefreshSettings) {
    let raw = match serde_json::to_string(settings) {
        Ok(raw) => raw,
        Err(e) => {
            warn!("Failed to encode auto-refresh settings: {}", e);
            return;
        }
    };

    if let Err(e) = store.set(SETTINGS_KEY, &raw) {
        warn!("Failed to save auto-refresh settings: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;

    #[test]
    fn test_missing_and_corrupt_use_defaults() {
        let store = MemoryStore::new();
        assert_eq!(load_settings(&store), RefreshSettings::default());

        store.set(SETTINGS_KEY, "{not json").unwrap();
        assert_eq!(load_settings(&store), RefreshSettings::default());

        store.set(SETTINGS_KEY, r#"{"enabled": "yes"}"#).unwrap();
        assert_eq!(load_settings(&store), RefreshSettings::default());
    }

    #[test]
    fn test_partial_and_unusual_values() {
        let store = MemoryStore::new();

        store.set(SETTINGS_KEY, r#"{"enabled": true}"#).unwrap();
        assert_eq!(
            load_settings(&store),
            RefreshSettings { enabled: true, interval_seconds: DEFAULT_INTERVAL_SECS }
        );

        store.set(SETTINGS_KEY, r#"{"enabled": false, "intervalSeconds": 7}"#).unwrap();
        assert_eq!(load_settings(&store).interval_seconds, 7);

        store.set(SETTINGS_KEY, r#"{"enabled": true, "intervalSeconds": 0}"#).unwrap();
        assert_eq!(load_settings(&store).interval_seconds, DEFAULT_INTERVAL_SECS);
    }

    #[test]
    fn test_oversized_interval_falls_back_to_default() {
        let store = MemoryStore::new();

        store
            .set(SETTINGS_KEY, r#"{"enabled": true, "intervalSeconds": 18446744073709551615}"#)
            .unwrap();
        assert_eq!(
            load_settings(&store),
            RefreshSettings { enabled: true, interval_seconds: DEFAULT_INTERVAL_SECS }
        );

        store.set(SETTINGS_KEY, r#"{"enabled": true, "intervalSeconds": 86400}"#).unwrap();
        assert_eq!(load_settings(&store).interval_seconds, MAX_INTERVAL_SECS);
    }

    #[test]
    fn test_save_uses_camel_case_blob() {
        let store = MemoryStore::new();
        save_settings(&store, &RefreshSettings { enabled: true, interval_seconds: 30 });

        let raw = store.get(SETTINGS_KEY).unwrap().unwrap();
        assert_eq!(raw, r#"{"enabled":true,"intervalSeconds":30}"#);
    }

    #[test]
    fn test_merge() {
        let mut settings = RefreshSettings::default();
        settings.merge(&RefreshSettingsUpdate::interval(60));
        assert_eq!(settings, RefreshSettings { enabled: false, interval_seconds: 60 });

        settings.merge(&RefreshSettingsUpdate::enabled(true));
        assert_eq!(settings, RefreshSettings { enabled: true, interval_seconds: 60 });

        settings.merge(&RefreshSettingsUpdate::default());
        assert_eq!(settings, RefreshSettings { enabled: true, interval_seconds: 60 });
    }
}
