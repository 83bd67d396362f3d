//! Application settings, stored as JSON in the platform config directory.
//!
//! Secrets are never part of the file: the backend's API key is read from the
//! environment variable named by [`BackendSettings::api_key_env`].

pub mod io;

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::engine::llm_client::{DEFAULT_GEMINI_MODEL, GEMINI_BASE_URL};
use crate::engine::orchestrator::RetryPolicy;
use crate::ui::settings::UiSettings;

/// Overrides `debug` from the settings file when set to `1` or `true`.
pub const DEBUG_ENV: &str = "STORY_WEAVER_DEBUG";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// Any OpenAI-compatible `/chat/completions` server (LM Studio by default).
    ChatCompletions,
    Gemini,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendSettings {
    pub kind: BackendKind,
    pub endpoint: String,
    pub model: String,
    pub temperature: f32,
    pub api_key_env: String,
    pub timeout_secs: Option<u64>,
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            kind: BackendKind::ChatCompletions,
            endpoint: "http://localhost:1234/v1".into(),
            model: "local-model".into(),
            temperature: 0.7,
            api_key_env: "STORY_WEAVER_API_KEY".into(),
            timeout_secs: Some(120),
        }
    }
}

impl BackendSettings {
    pub fn gemini() -> Self {
        Self {
            kind: BackendKind::Gemini,
            endpoint: GEMINI_BASE_URL.into(),
            model: DEFAULT_GEMINI_MODEL.into(),
            api_key_env: "GEMINI_API_KEY".into(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    /// Extra attempts after a rate-limited request. Zero disables retrying.
    pub attempts: u32,
    pub wait_secs: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            attempts: 0,
            wait_secs: 45,
        }
    }
}

impl RetrySettings {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy {
            attempts: self.attempts,
            wait: Duration::from_secs(self.wait_secs),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub backend: BackendSettings,
    pub retry: RetrySettings,
    /// Adds error details to player-facing failure messages.
    pub debug: bool,
    pub ui: UiSettings,
}

impl AppConfig {
    pub fn apply_env_overrides(mut self) -> Self {
        if let Ok(value) = std::env::var(DEBUG_ENV) {
            self.debug = matches!(value.trim().to_lowercase().as_str(), "1" | "true" | "yes");
        }
        self
    }
}
