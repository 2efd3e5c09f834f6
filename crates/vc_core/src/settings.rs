use std::path::Path;

use serde::{Deserialize, Serialize};
use vc_store::json_file::{load_or_default, save_atomic};
use vc_store::models::ANONYMOUS_SENDER;

use crate::paths::settings_path;

/// Where this device keeps its private key record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyBackend {
    #[default]
    File,
    Keyring,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub key_backend: KeyBackend,
    pub default_sender_label: String,
    pub share_base_url: String,
    pub pretty_output: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            key_backend: KeyBackend::File,
            default_sender_label: ANONYMOUS_SENDER.into(),
            share_base_url: "http://localhost:5173".into(),
            pretty_output: true,
        }
    }
}

pub fn load_settings(data_dir: &Path) -> anyhow::Result<Settings> {
    Ok(load_or_default(&settings_path(data_dir))?)
}

pub fn save_settings(data_dir: &Path, settings: &Settings) -> anyhow::Result<()> {
    save_atomic(&settings_path(data_dir), settings)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let settings = load_settings(dir.path()).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.default_sender_label, "Anonymous");
    }

    #[test]
    fn save_then_load() {
        let dir = tempdir().unwrap();
        let settings = Settings {
            key_backend: KeyBackend::Keyring,
            share_base_url: "https://confess.example".into(),
            ..Settings::default()
        };
        save_settings(dir.path(), &settings).unwrap();
        assert_eq!(load_settings(dir.path()).unwrap(), settings);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = tempdir().unwrap();
        std::fs::write(settings_path(dir.path()), r#"{ "key_backend": "keyring" }"#).unwrap();
        let settings = load_settings(dir.path()).unwrap();
        assert_eq!(settings.key_backend, KeyBackend::Keyring);
        assert!(settings.pretty_output);
    }
}
