use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::warn;

use super::AppConfig;

pub fn settings_path() -> PathBuf {
    let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push("story_weaver");
    path.push("settings.json");
    path
}

/// Loads the settings file, falling back to defaults when it is unreadable.
pub fn load() -> AppConfig {
    let path = settings_path();
    load_from(&path)
        .unwrap_or_else(|err| {
            warn!(path = %path.display(), "ignoring settings file: {err:#}");
            AppConfig::default()
        })
        .apply_env_overrides()
}

/// A missing file yields the defaults; a malformed one is an error.
pub fn load_from(path: &Path) -> Result<AppConfig> {
    if !path.exists() {
        return Ok(AppConfig::default());
    }

    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("failed to parse {}", path.display()))
}

pub fn save(config: &AppConfig) -> Result<()> {
    save_to(&settings_path(), config)
}

pub fn save_to(path: &Path, config: &AppConfig) -> Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)
            .with_context(|| format!("failed to create {}", dir.display()))?;
    }

    let json = serde_json::to_string_pretty(config)?;
    fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BackendKind;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_from(&dir.path().join("nope.json")).unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn partial_file_is_filled_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(
            &path,
            r#"{"backend": {"kind": "gemini", "model": "gemini-2.5-pro"}, "debug": true}"#,
        )
        .unwrap();

        let config = load_from(&path).unwrap();
        assert_eq!(config.backend.kind, BackendKind::Gemini);
        assert_eq!(config.backend.model, "gemini-2.5-pro");
        assert_eq!(config.backend.temperature, 0.7);
        assert!(config.debug);
        assert_eq!(config.retry.wait_secs, 45);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "{ not json").unwrap();

        let err = load_from(&path).unwrap_err();
        assert!(format!("{err:#}").contains("failed to parse"));
    }

    #[test]
    fn saved_settings_load_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");

        let mut config = AppConfig::default();
        config.retry.attempts = 1;
        config.ui.ui_scale = 1.25;
        save_to(&path, &config).unwrap();

        assert_eq!(load_from(&path).unwrap(), config);
    }
}
