//! Configuration loading, validation, and management for ChatRelay.
//!
//! Loads configuration from `~/.chatrelay/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.chatrelay/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Completion service settings
    #[serde(default)]
    pub completion: CompletionConfig,

    /// Outbound messaging gateway settings
    #[serde(default)]
    pub messaging: MessagingConfig,

    /// Audit store settings
    #[serde(default)]
    pub store: StoreConfig,

    /// HTTP gateway settings
    #[serde(default)]
    pub gateway: GatewayConfig,
}

/// Redact a secret for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct CompletionConfig {
    /// Provider name: "openai", "openrouter", "ollama" or "custom"
    #[serde(default = "default_provider")]
    pub provider: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Base URL override (required for "custom")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Upper bound on a single completion call
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_provider() -> String {
    "openai".into()
}
fn default_model() -> String {
    "gpt-3.5-turbo".into()
}
fn default_temperature() -> f32 {
    0.7
}
fn default_timeout_secs() -> u64 {
    30
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            api_key: None,
            api_url: None,
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl std::fmt::Debug for CompletionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompletionConfig")
            .field("provider", &self.provider)
            .field("api_key", &redact(&self.api_key))
            .field("api_url", &self.api_url)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct MessagingConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_sid: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<String>,

    /// Sender identity replies are sent from (e.g. `whatsapp:+14155238886`)
    #[serde(default)]
    pub from: String,

    #[serde(default = "default_messaging_api_url")]
    pub api_url: String,
}

fn default_messaging_api_url() -> String {
    "https://api.twilio.com".into()
}

impl Default for MessagingConfig {
    fn default() -> Self {
        Self {
            account_sid: None,
            auth_token: None,
            from: String::new(),
            api_url: default_messaging_api_url(),
        }
    }
}

impl MessagingConfig {
    /// Whether real delivery credentials are present.
    pub fn has_credentials(&self) -> bool {
        self.account_sid.as_deref().is_some_and(|s| !s.is_empty())
            && self.auth_token.as_deref().is_some_and(|s| !s.is_empty())
    }
}

impl std::fmt::Debug for MessagingConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessagingConfig")
            .field("account_sid", &self.account_sid)
            .field("auth_token", &redact(&self.auth_token))
            .field("from", &self.from)
            .field("api_url", &self.api_url)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// "sqlite" or "memory"
    #[serde(default = "default_store_backend")]
    pub backend: String,

    /// Connection string, e.g. `sqlite://chatrelay.db`
    #[serde(default = "default_store_url")]
    pub url: String,
}

fn default_store_backend() -> String {
    "sqlite".into()
}
fn default_store_url() -> String {
    format!("sqlite://{}?mode=rwc", AppConfig::config_dir().join("exchanges.db").display())
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: default_store_backend(),
            url: default_store_url(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,

    /// Answer the webhook as soon as the reply is known; persist, deliver
    /// and broadcast finish in the background. Set to `false` to wait.
    #[serde(default = "default_detach_side_effects")]
    pub detach_side_effects: bool,

    /// Frames buffered per observer before it starts lagging
    #[serde(default = "default_broadcast_capacity")]
    pub broadcast_capacity: usize,
}

fn default_port() -> u16 {
    5000
}
fn default_host() -> String {
    "0.0.0.0".into()
}
fn default_broadcast_capacity() -> usize {
    256
}
fn default_detach_side_effects() -> bool {
    true
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
            detach_side_effects: default_detach_side_effects(),
            broadcast_capacity: default_broadcast_capacity(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.chatrelay/config.toml)
    /// and apply environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;
        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply environment overrides. Environment values win over the file.
    ///
    /// - `OPENAI_API_KEY`, `CHATRELAY_MODEL`
    /// - `CHATRELAY_STORE_URL` (falls back to `DATABASE_URL`)
    /// - `TWILIO_ACCOUNT_SID`, `TWILIO_AUTH_TOKEN`, `TWILIO_WHATSAPP_FROM`
    /// - `CHATRELAY_PORT`
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(key) = lookup("OPENAI_API_KEY") {
            self.completion.api_key = Some(key);
        }
        if let Some(model) = lookup("CHATRELAY_MODEL") {
            self.completion.model = model;
        }
        if let Some(url) = lookup("CHATRELAY_STORE_URL").or_else(|| lookup("DATABASE_URL")) {
            self.store.url = url;
        }
        if let Some(sid) = lookup("TWILIO_ACCOUNT_SID") {
            self.messaging.account_sid = Some(sid);
        }
        if let Some(token) = lookup("TWILIO_AUTH_TOKEN") {
            self.messaging.auth_token = Some(token);
        }
        if let Some(from) = lookup("TWILIO_WHATSAPP_FROM") {
            self.messaging.from = from;
        }
        match lookup("CHATRELAY_PORT").map(|p| p.parse::<u16>()) {
            Some(Ok(port)) => self.gateway.port = port,
            Some(Err(e)) => tracing::warn!(error = %e, "Ignoring invalid CHATRELAY_PORT"),
            None => {}
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".chatrelay")
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=2.0).contains(&self.completion.temperature) {
            return Err(ConfigError::ValidationError(
                "completion.temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.completion.timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "completion.timeout_secs must be > 0".into(),
            ));
        }

        if self.completion.provider == "custom" && self.completion.api_url.is_none() {
            return Err(ConfigError::ValidationError(
                "completion.api_url is required for the custom provider".into(),
            ));
        }

        if self.messaging.has_credentials() && self.messaging.from.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "messaging.from is required when Twilio credentials are set".into(),
            ));
        }

        if !matches!(self.store.backend.as_str(), "sqlite" | "memory") {
            return Err(ConfigError::ValidationError(format!(
                "unknown store.backend '{}' (expected sqlite or memory)",
                self.store.backend
            )));
        }

        Ok(())
    }

    /// Check if a completion API key is available.
    pub fn has_api_key(&self) -> bool {
        self.completion.api_key.as_deref().is_some_and(|k| !k.is_empty())
    }

    /// Generate a default config TOML string (for `onboard` command).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
