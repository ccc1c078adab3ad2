use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, sync::RwLock};

const FAST_ENV: &str = "TERMSYNC_FAST";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct PipelineSettings {
    pub save_to_db_by_default: bool,
    pub save_documents_by_default: bool,
    /// Multiplier applied to every scripted delay; 0 runs them back to back.
    pub delay_scale: f64,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            save_to_db_by_default: true,
            save_documents_by_default: true,
            delay_scale: 1.0,
        }
    }
}

impl PipelineSettings {
    /// Applies `TERMSYNC_FAST`, which zeroes every delay.
    pub fn with_env_overrides(mut self) -> Self {
        let fast = std::env::var(FAST_ENV)
            .map(|value| value == "1" || value.eq_ignore_ascii_case("true"))
            .unwrap_or(false);
        if fast {
            self.delay_scale = 0.0;
        }
        self
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct UserSettings {
    pipeline: PipelineSettings,
}

pub struct SettingsStore {
    path: Option<PathBuf>,
    data: RwLock<UserSettings>,
}

impl SettingsStore {
    /// Loads settings from `path`, falling back to defaults when the file is
    /// missing or unreadable as JSON.
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            match serde_json::from_str(&contents) {
                Ok(data) => data,
                Err(err) => {
                    log::warn!("Ignoring malformed settings at {}: {err}", path.display());
                    UserSettings::default()
                }
            }
        } else {
            UserSettings::default()
        };

        Ok(Self {
            path: Some(path),
            data: RwLock::new(data),
        })
    }

    /// Defaults only, never written to disk.
    pub fn ephemeral() -> Self {
        Self {
            path: None,
            data: RwLock::new(UserSettings::default()),
        }
    }

    /// Stored pipeline settings with environment overrides applied.
    pub fn pipeline(&self) -> Result<PipelineSettings> {
        let guard = self
            .data
            .read()
            .map_err(|_| anyhow!("settings lock poisoned"))?;
        Ok(guard.pipeline.clone().with_env_overrides())
    }

    pub fn update_pipeline(&self, settings: PipelineSettings) -> Result<()> {
        let mut guard = self
            .data
            .write()
            .map_err(|_| anyhow!("settings lock poisoned"))?;
        guard.pipeline = settings;
        self.persist(&guard)
    }

    fn persist(&self, data: &UserSettings) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(path, serialized)
            .with_context(|| format!("Failed to write settings to {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::new(dir.path().join("settings.json")).unwrap();
        let stored = store.data.read().unwrap().pipeline.clone();
        assert_eq!(stored, PipelineSettings::default());
    }

    #[test]
    fn update_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");

        let store = SettingsStore::new(path.clone()).unwrap();
        store
            .update_pipeline(PipelineSettings {
                save_documents_by_default: false,
                delay_scale: 0.25,
                ..Default::default()
            })
            .unwrap();

        let reloaded = SettingsStore::new(path).unwrap();
        let stored = reloaded.data.read().unwrap().pipeline.clone();
        assert!(!stored.save_documents_by_default);
        assert_eq!(stored.delay_scale, 0.25);
        assert!(stored.save_to_db_by_default);
    }

    #[test]
    fn partial_json_fills_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{"pipeline":{"delayScale":2.0}}"#).unwrap();

        let store = SettingsStore::new(path).unwrap();
        let stored = store.data.read().unwrap().pipeline.clone();
        assert_eq!(stored.delay_scale, 2.0);
        assert!(stored.save_to_db_by_default);
    }

    #[test]
    fn malformed_json_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "not json").unwrap();

        let store = SettingsStore::new(path).unwrap();
        let stored = store.data.read().unwrap().pipeline.clone();
        assert_eq!(stored, PipelineSettings::default());
    }
}
