//! Configuration loading, validation, and management for Bashpilot.
//!
//! Loads configuration from `~/.bashpilot/config.toml`, then a `.env` file in
//! the working directory, then environment variable overrides. Validates all
//! settings at startup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// The root configuration structure.
///
/// Maps directly to `~/.bashpilot/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Anthropic API key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Override the provider base URL (proxies, tests)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    /// Model id
    #[serde(default = "default_model")]
    pub model: String,

    /// Max output tokens per provider call
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// System prompt override; the built-in prompt is used when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,

    /// Describe commands instead of running them
    #[serde(default)]
    pub dry_run: bool,

    /// Agent loop limits
    #[serde(default)]
    pub agent: AgentConfig,

    /// Shell execution settings
    #[serde(default)]
    pub shell: ShellConfig,

    /// Session log settings
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Conversation history settings
    #[serde(default)]
    pub history: HistoryConfig,

    /// Token pricing used for the session cost summary
    #[serde(default)]
    pub pricing: PricingConfig,
}

fn default_model() -> String {
    "claude-3-5-sonnet-20241022".into()
}
fn default_max_tokens() -> u32 {
    4096
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("api_url", &self.api_url)
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .field("system_prompt", &self.system_prompt.as_ref().map(|p| p.len()))
            .field("dry_run", &self.dry_run)
            .field("agent", &self.agent)
            .field("shell", &self.shell)
            .field("logging", &self.logging)
            .field("history", &self.history)
            .field("pricing", &self.pricing)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Maximum provider rounds per user turn
    #[serde(default = "default_max_rounds")]
    pub max_rounds: u32,

    /// Timeout for a single provider call
    #[serde(default = "default_provider_timeout")]
    pub provider_timeout_secs: u64,
}

fn default_max_rounds() -> u32 {
    25
}
fn default_provider_timeout() -> u64 {
    300
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_rounds: default_max_rounds(),
            provider_timeout_secs: default_provider_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShellConfig {
    /// Interpreter used as `<path> -c <command>`
    #[serde(default = "default_shell_path")]
    pub path: PathBuf,

    #[serde(default = "default_command_timeout")]
    pub command_timeout_secs: u64,
}

fn default_shell_path() -> PathBuf {
    PathBuf::from("/bin/bash")
}
fn default_command_timeout() -> u64 {
    120
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            path: default_shell_path(),
            command_timeout_secs: default_command_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Where `<session id>.log` files go (default: ~/.bashpilot/sessions)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sessions_dir: Option<PathBuf>,

    /// Rotate a session log once it would grow past this size
    #[serde(default = "default_max_bytes")]
    pub max_bytes: u64,

    /// Number of rotated files kept per session
    #[serde(default = "default_backup_count")]
    pub backup_count: usize,
}

fn default_max_bytes() -> u64 {
    1024 * 1024
}
fn default_backup_count() -> usize {
    5
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            sessions_dir: None,
            max_bytes: default_max_bytes(),
            backup_count: default_backup_count(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Where conversation JSON files go (default: ~/.bashpilot/history)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
}

/// Per-million-token pricing in USD.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingConfig {
    #[serde(default = "default_input_per_m")]
    pub input_per_m: f64,
    #[serde(default = "default_output_per_m")]
    pub output_per_m: f64,
}

fn default_input_per_m() -> f64 {
    3.0
}
fn default_output_per_m() -> f64 {
    15.0
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            input_per_m: default_input_per_m(),
            output_per_m: default_output_per_m(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.bashpilot/config.toml).
    ///
    /// A `.env` file in the working directory is loaded first, then these
    /// environment variables override the file:
    /// - `ANTHROPIC_API_KEY`
    /// - `BASHPILOT_MODEL`
    /// - `BASH_SYSTEM_PROMPT`
    /// - `BASHPILOT_DRY_RUN` (`1`/`true`/`yes`)
    pub fn load() -> Result<Self, ConfigError> {
        if let Err(e) = dotenvy::dotenv() {
            if !e.not_found() {
                tracing::warn!("Ignoring unreadable .env file: {e}");
            }
        }

        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;
        config.apply_env(|name| std::env::var(name).ok());
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

    /// Apply environment overrides using the given lookup.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(key) = lookup("ANTHROPIC_API_KEY").filter(|k| !k.is_empty()) {
            self.api_key = Some(key);
        }
        if let Some(model) = lookup("BASHPILOT_MODEL").filter(|m| !m.is_empty()) {
            self.model = model;
        }
        if let Some(prompt) = lookup("BASH_SYSTEM_PROMPT").filter(|p| !p.trim().is_empty()) {
            self.system_prompt = Some(prompt);
        }
        if let Some(flag) = lookup("BASHPILOT_DRY_RUN") {
            self.dry_run = matches!(flag.to_ascii_lowercase().as_str(), "1" | "true" | "yes");
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".bashpilot")
    }

    /// Resolved session log directory.
    pub fn sessions_dir(&self) -> PathBuf {
        self.logging
            .sessions_dir
            .clone()
            .unwrap_or_else(|| Self::config_dir().join("sessions"))
    }

    /// Resolved conversation history directory.
    pub fn history_dir(&self) -> PathBuf {
        self.history
            .dir
            .clone()
            .unwrap_or_else(|| Self::config_dir().join("history"))
    }

    pub fn provider_timeout(&self) -> Duration {
        Duration::from_secs(self.agent.provider_timeout_secs)
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.shell.command_timeout_secs)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.model.trim().is_empty() {
            return Err(ConfigError::ValidationError("model must not be empty".into()));
        }
        if self.max_tokens == 0 {
            return Err(ConfigError::ValidationError("max_tokens must be > 0".into()));
        }
        if self.agent.max_rounds == 0 {
            return Err(ConfigError::ValidationError(
                "agent.max_rounds must be > 0".into(),
            ));
        }
        if self.agent.provider_timeout_secs == 0 || self.shell.command_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "timeouts must be at least one second".into(),
            ));
        }
        if self.logging.max_bytes == 0 {
            return Err(ConfigError::ValidationError(
                "logging.max_bytes must be > 0".into(),
            ));
        }
        if self.pricing.input_per_m < 0.0 || self.pricing.output_per_m < 0.0 {
            return Err(ConfigError::ValidationError(
                "pricing rates must not be negative".into(),
            ));
        }
        Ok(())
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Generate a default config TOML string (for `onboard` command).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_url: None,
            model: default_model(),
            max_tokens: default_max_tokens(),
            system_prompt: None,
            dry_run: false,
            agent: AgentConfig::default(),
            shell: ShellConfig::default(),
            logging: LoggingConfig::default(),
            history: HistoryConfig::default(),
            pricing: PricingConfig::default(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/tmp"))
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

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.model, "claude-3-5-sonnet-20241022");
        assert_eq!(config.max_tokens, 4096);
        assert_eq!(config.shell.path, PathBuf::from("/bin/bash"));
        assert_eq!(config.logging.max_bytes, 1024 * 1024);
        assert_eq!(config.logging.backup_count, 5);
        assert!(!config.dry_run);
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.model, config.model);
        assert_eq!(parsed.agent.max_rounds, config.agent.max_rounds);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "dry_run = true\n[shell]\ncommand_timeout_secs = 5\n[pricing]\ninput_per_m = 1.0\n",
        )
        .unwrap();

        let config = AppConfig::load_from(&path).unwrap();
        assert!(config.dry_run);
        assert_eq!(config.command_timeout(), Duration::from_secs(5));
        assert_eq!(config.shell.path, PathBuf::from("/bin/bash"));
        assert!((config.pricing.input_per_m - 1.0).abs() < f64::EPSILON);
        assert!((config.pricing.output_per_m - 15.0).abs() < f64::EPSILON);
    }

    #[test]
    fn invalid_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "max_tokens = \"lots\"").unwrap();
        let err = AppConfig::load_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
        assert!(err.to_string().contains("config.toml"));
    }

    #[test]
    fn zero_rounds_rejected() {
        let mut config = AppConfig::default();
        config.agent.max_rounds = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let result = AppConfig::load_from(Path::new("/nonexistent/config.toml"));
        assert!(result.is_ok());
    }

    #[test]
    fn env_overrides_apply() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("ANTHROPIC_API_KEY", "sk-ant-test"),
            ("BASH_SYSTEM_PROMPT", "Be terse."),
            ("BASHPILOT_DRY_RUN", "TRUE"),
        ]);
        let mut config = AppConfig::default();
        config.apply_env(|name| vars.get(name).map(|v| v.to_string()));

        assert_eq!(config.api_key.as_deref(), Some("sk-ant-test"));
        assert_eq!(config.system_prompt.as_deref(), Some("Be terse."));
        assert!(config.dry_run);
        assert_eq!(config.model, "claude-3-5-sonnet-20241022");
    }

    #[test]
    fn blank_prompt_override_is_ignored() {
        let mut config = AppConfig::default();
        config.apply_env(|name| (name == "BASH_SYSTEM_PROMPT").then(|| "   ".to_string()));
        assert!(config.system_prompt.is_none());
    }

    #[test]
    fn debug_redacts_api_key() {
        let config = AppConfig {
            api_key: Some("sk-ant-secret".into()),
            ..AppConfig::default()
        };
        let debug = format!("{config:?}");
        assert!(!debug.contains("sk-ant-secret"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn default_toml_generation() {
        let toml_str = AppConfig::default_toml();
        assert!(toml_str.contains("claude-3-5-sonnet-20241022"));
        assert!(toml_str.contains("/bin/bash"));
    }
}
