use anyhow::{Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, sync::RwLock, time::Duration};

use crate::models::DEFAULT_PROBABILITY_TOLERANCE;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RevealSettings {
    pub interpretation_cadence_ms: u64,
    pub treatment_cadence_ms: u64,
}

impl Default for RevealSettings {
    fn default() -> Self {
        Self {
            interpretation_cadence_ms: 20,
            treatment_cadence_ms: 20,
        }
    }
}

impl RevealSettings {
    pub fn interpretation_cadence(&self) -> Duration {
        Duration::from_millis(self.interpretation_cadence_ms)
    }

    pub fn treatment_cadence(&self) -> Duration {
        Duration::from_millis(self.treatment_cadence_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct UserSettings {
    pub reveal: RevealSettings,
    /// Allowed distance of the class probability sum from 1.0.
    pub probability_tolerance: f64,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            reveal: RevealSettings::default(),
            probability_tolerance: DEFAULT_PROBABILITY_TOLERANCE,
        }
    }
}

pub struct SettingsStore {
    path: PathBuf,
    data: RwLock<UserSettings>,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_else(|err| {
                warn!("Ignoring unreadable settings at {}: {err}", path.display());
                UserSettings::default()
            })
        } else {
            UserSettings::default()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn current(&self) -> UserSettings {
        match self.data.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn reveal(&self) -> RevealSettings {
        self.current().reveal
    }

    pub fn probability_tolerance(&self) -> f64 {
        self.current().probability_tolerance
    }

    pub fn update_reveal(&self, settings: RevealSettings) -> Result<()> {
        let mut guard = match self.data.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard.reveal = settings;
        self.persist(&guard)
    }

    fn persist(&self, data: &UserSettings) -> Result<()> {
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::new(dir.path().join("settings.json")).unwrap();
        assert_eq!(store.current(), UserSettings::default());
        assert_eq!(store.reveal().interpretation_cadence(), Duration::from_millis(20));
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{ "reveal": { "treatment_cadence_ms": 5 } }"#).unwrap();

        let store = SettingsStore::new(path).unwrap();
        assert_eq!(store.reveal().treatment_cadence_ms, 5);
        assert_eq!(store.reveal().interpretation_cadence_ms, 20);
        assert_eq!(store.probability_tolerance(), DEFAULT_PROBABILITY_TOLERANCE);
    }

    #[test]
    fn updates_are_persisted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let store = SettingsStore::new(path.clone()).unwrap();
        store
            .update_reveal(RevealSettings {
                interpretation_cadence_ms: 0,
                treatment_cadence_ms: 40,
            })
            .unwrap();

        let reopened = SettingsStore::new(path).unwrap();
        assert_eq!(reopened.reveal().treatment_cadence_ms, 40);
        assert_eq!(reopened.reveal().interpretation_cadence_ms, 0);
    }
}
