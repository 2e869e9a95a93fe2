//! Settings storage
//!
//! Manages persistence of gateway endpoints, credentials and display
//! preferences.

use crate::storage::{get_data_dir, StorageError};
use crate::stream::assembler::DEFAULT_SENTINEL;
use crate::types::session::ActiveSession;
use crate::ui::code_state::DEFAULT_LONG_CODE_LINES;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_GATEWAY_URL: &str = "http://localhost:8003";
pub const DEFAULT_HISTORY_URL: &str = "http://127.0.0.1:8005";

/// Environment variable overriding the stored access token
pub const ACCESS_TOKEN_ENV: &str = "MLAGENT_ACCESS_TOKEN";
/// Environment variable overriding the gateway base URL
pub const GATEWAY_URL_ENV: &str = "MLAGENT_GATEWAY_URL";

/// Application settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppSettings {
    /// Base URL of the API gateway
    #[serde(default = "default_gateway_url")]
    pub gateway_url: String,
    /// Base URL of the chat-history service
    #[serde(default = "default_history_url")]
    pub history_url: String,
    /// Authorization scheme sent before the token
    #[serde(default = "default_token_type")]
    pub token_type: String,
    /// Bearer token; `None` when signed out
    #[serde(default)]
    pub access_token: Option<String>,
    /// Request timeout in seconds (non-streaming requests)
    #[serde(default = "default_timeout")]
    pub request_timeout_secs: u64,
    /// In-band glyph that separates two assistant messages
    #[serde(default = "default_sentinel")]
    pub sentinel: char,
    /// Code blocks with more lines than this are truncated until expanded
    #[serde(default = "default_long_code_lines")]
    pub long_code_lines: usize,
    /// UI theme: "dark" or "light"
    #[serde(default = "default_theme")]
    pub theme: String,
    /// Session restored on startup
    #[serde(default)]
    pub active_session: Option<ActiveSession>,
}

fn default_gateway_url() -> String {
    DEFAULT_GATEWAY_URL.to_string()
}

fn default_history_url() -> String {
    DEFAULT_HISTORY_URL.to_string()
}

fn default_token_type() -> String {
    "Bearer".to_string()
}

fn default_timeout() -> u64 {
    60
}

fn default_sentinel() -> char {
    DEFAULT_SENTINEL
}

fn default_long_code_lines() -> usize {
    DEFAULT_LONG_CODE_LINES
}

fn default_theme() -> String {
    "light".to_string()
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            gateway_url: default_gateway_url(),
            history_url: default_history_url(),
            token_type: default_token_type(),
            access_token: None,
            request_timeout_secs: default_timeout(),
            sentinel: default_sentinel(),
            long_code_lines: default_long_code_lines(),
            theme: default_theme(),
            active_session: None,
        }
    }
}

impl AppSettings {
    /// Validate settings values
    ///
    /// Repairs anything a hand-edited settings file may have broken.
    pub fn validate(&mut self) {
        self.gateway_url = self.gateway_url.trim().trim_end_matches('/').to_string();
        if self.gateway_url.is_empty() {
            self.gateway_url = default_gateway_url();
        }

        self.history_url = self.history_url.trim().trim_end_matches('/').to_string();
        if self.history_url.is_empty() {
            self.history_url = default_history_url();
        }

        if self.token_type.trim().is_empty() {
            self.token_type = default_token_type();
        }

        if self
            .access_token
            .as_deref()
            .map(|t| t.trim().is_empty())
            .unwrap_or(false)
        {
            self.access_token = None;
        }

        self.request_timeout_secs = self.request_timeout_secs.clamp(5, 600);

        if self.sentinel.is_whitespace() || self.sentinel == '`' {
            tracing::warn!("Unusable sentinel {:?}, reverting to default", self.sentinel);
            self.sentinel = default_sentinel();
        }

        if self.long_code_lines == 0 {
            self.long_code_lines = default_long_code_lines();
        }

        if self.theme != "dark" && self.theme != "light" {
            self.theme = default_theme();
        }
    }

    pub fn is_signed_in(&self) -> bool {
        self.access_token.is_some()
    }

    /// Value of the Authorization header, if signed in
    pub fn authorization(&self) -> Option<String> {
        self.access_token
            .as_ref()
            .map(|token| format!("{} {}", self.token_type, token))
    }

    /// Forget credentials and the active session (after a 401/403)
    pub fn sign_out(&mut self) {
        self.access_token = None;
        self.active_session = None;
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(token) = std::env::var(ACCESS_TOKEN_ENV) {
            if !token.trim().is_empty() {
                tracing::debug!("Using access token from {}", ACCESS_TOKEN_ENV);
                self.access_token = Some(token.trim().to_string());
            }
        }
        if let Ok(url) = std::env::var(GATEWAY_URL_ENV) {
            if !url.trim().is_empty() {
                self.gateway_url = url;
            }
        }
    }
}

/// Get the settings file path
fn get_settings_path() -> Result<PathBuf, StorageError> {
    Ok(get_data_dir()?.join("settings.json"))
}

/// Load settings from disk
///
/// Returns default settings if the file doesn't exist or is corrupted
pub fn load_settings() -> AppSettings {
    let mut settings = match get_settings_path().and_then(|path| load_settings_from(&path)) {
        Ok(settings) => settings,
        Err(e) => {
            tracing::warn!("Failed to load settings, using defaults: {}", e);
            AppSettings::default()
        }
    };
    settings.apply_env_overrides();
    settings.validate();
    settings
}

/// Load settings from a specific file
pub fn load_settings_from(path: &Path) -> Result<AppSettings, StorageError> {
    if !path.exists() {
        tracing::info!("Settings file not found, using defaults");
        return Ok(AppSettings::default());
    }

    let json = fs::read_to_string(path)?;
    let mut settings: AppSettings = serde_json::from_str(&json)?;
    settings.validate();

    tracing::debug!("Loaded settings from {:?}", path);
    Ok(settings)
}

/// Save settings to disk
pub fn save_settings(settings: &AppSettings) -> Result<(), StorageError> {
    save_settings_to(settings, &get_settings_path()?)
}

/// Save settings to a specific file
pub fn save_settings_to(settings: &AppSettings, path: &Path) -> Result<(), StorageError> {
    // Ensure the parent directory exists
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let json = serde_json::to_string_pretty(settings)?;
    fs::write(path, json)?;

    tracing::debug!("Saved settings to {:?}", path);
    Ok(())
}
