//! Configuration loading, validation, and management for TutorForge.
//!
//! Loads configuration from `~/.tutorforge/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.tutorforge/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API key for the completion provider
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Completion (LLM) provider configuration
    #[serde(default)]
    pub completion: CompletionConfig,

    /// Search provider configuration
    #[serde(default)]
    pub search: SearchConfig,

    /// Source extraction configuration
    #[serde(default)]
    pub extraction: ExtractionConfig,

    /// Gateway configuration
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Admission (per-identity request budget) configuration
    #[serde(default)]
    pub admission: AdmissionConfig,

    /// Default audience level when the client does not supply one
    #[serde(default = "default_level")]
    pub default_level: String,
}

fn default_level() -> String {
    "Middle School".into()
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
            .field("completion", &self.completion)
            .field("search", &self.search)
            .field("extraction", &self.extraction)
            .field("gateway", &self.gateway)
            .field("admission", &self.admission)
            .field("default_level", &self.default_level)
            .finish()
    }
}

/// Which LLM endpoint generates the tutoring dialogue.
#[derive(Clone, Serialize, Deserialize)]
pub struct CompletionConfig {
    /// Provider name: "together", "openai", or any OpenAI-compatible name
    #[serde(default = "default_completion_provider")]
    pub provider: String,

    /// Override the provider's base URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    /// Model identifier
    #[serde(default = "default_model")]
    pub model: String,

    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum tokens per generated reply
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

fn default_completion_provider() -> String {
    "together".into()
}
fn default_model() -> String {
    "meta-llama/Meta-Llama-3.1-70B-Instruct-Turbo".into()
}
fn default_temperature() -> f32 {
    0.7
}
fn default_max_tokens() -> u32 {
    2000
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            provider: default_completion_provider(),
            api_url: None,
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
        }
    }
}

impl std::fmt::Debug for CompletionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompletionConfig")
            .field("provider", &self.provider)
            .field("api_url", &self.api_url)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

/// Which search backend discovers candidate sources.
#[derive(Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Provider name: "serper" or "bing"
    #[serde(default = "default_search_provider")]
    pub provider: String,

    /// Serper API key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serper_api_key: Option<String>,

    /// Bing API key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bing_api_key: Option<String>,

    /// Sites excluded from search results
    #[serde(default = "default_excluded_sites")]
    pub excluded_sites: Vec<String>,
}

fn default_search_provider() -> String {
    "serper".into()
}
fn default_excluded_sites() -> Vec<String> {
    vec!["youtube.com".into()]
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            provider: default_search_provider(),
            serper_api_key: None,
            bing_api_key: None,
            excluded_sites: default_excluded_sites(),
        }
    }
}

impl std::fmt::Debug for SearchConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchConfig")
            .field("provider", &self.provider)
            .field("serper_api_key", &redact(&self.serper_api_key))
            .field("bing_api_key", &redact(&self.bing_api_key))
            .field("excluded_sites", &self.excluded_sites)
            .finish()
    }
}

/// Bounds for the parallel fetch-and-extract stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Hard per-source fetch deadline in milliseconds
    #[serde(default = "default_fetch_timeout_ms")]
    pub fetch_timeout_ms: u64,

    /// Maximum characters of extracted text kept per source
    #[serde(default = "default_max_content_len")]
    pub max_content_len: usize,
}

fn default_fetch_timeout_ms() -> u64 {
    3000
}
fn default_max_content_len() -> usize {
    100_000
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            fetch_timeout_ms: default_fetch_timeout_ms(),
            max_content_len: default_max_content_len(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,
}

fn default_port() -> u16 {
    8080
}
fn default_host() -> String {
    "127.0.0.1".into()
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
        }
    }
}

/// Fixed-window request budget applied per caller identity.
///
/// The reference policy is 10 requests per 24-hour window; both knobs are
/// configurable, the window semantics are not.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdmissionConfig {
    /// Whether the gate is enforced at all. Disabled = no-op gate.
    #[serde(default)]
    pub enabled: bool,

    /// Requests allowed per identity per window
    #[serde(default = "default_admission_budget")]
    pub max_requests: u32,

    /// Window length in minutes
    #[serde(default = "default_admission_window_minutes")]
    pub window_minutes: u64,
}

fn default_admission_budget() -> u32 {
    10
}
fn default_admission_window_minutes() -> u64 {
    1440
}

impl Default for AdmissionConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            max_requests: default_admission_budget(),
            window_minutes: default_admission_window_minutes(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.tutorforge/config.toml).
    ///
    /// Also checks environment variables for API keys:
    /// - `TUTORFORGE_API_KEY` (highest priority)
    /// - `TOGETHER_API_KEY`
    /// - `OPENAI_API_KEY`
    /// - `SERPER_API_KEY` / `BING_API_KEY` for the search backends
    pub fn load() -> Result<Self, ConfigError> {
        let config_dir = Self::config_dir();
        let config_path = config_dir.join("config.toml");
        let mut config = Self::load_from(&config_path)?;

        // Environment variable overrides (highest priority)
        if config.api_key.is_none() {
            config.api_key = std::env::var("TUTORFORGE_API_KEY")
                .ok()
                .or_else(|| std::env::var("TOGETHER_API_KEY").ok())
                .or_else(|| std::env::var("OPENAI_API_KEY").ok());
        }

        if config.search.serper_api_key.is_none() {
            config.search.serper_api_key = std::env::var("SERPER_API_KEY").ok();
        }

        if config.search.bing_api_key.is_none() {
            config.search.bing_api_key = std::env::var("BING_API_KEY").ok();
        }

        if let Ok(provider) = std::env::var("TUTORFORGE_PROVIDER") {
            config.completion.provider = provider;
        }

        if let Ok(model) = std::env::var("TUTORFORGE_MODEL") {
            config.completion.model = model;
        }

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

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".tutorforge")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.completion.temperature < 0.0 || self.completion.temperature > 2.0 {
            return Err(ConfigError::ValidationError(
                "completion.temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.extraction.fetch_timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "extraction.fetch_timeout_ms must be greater than 0".into(),
            ));
        }

        if self.admission.enabled && self.admission.max_requests == 0 {
            return Err(ConfigError::ValidationError(
                "admission.max_requests must be greater than 0 when the gate is enabled".into(),
            ));
        }

        match self.search.provider.as_str() {
            "serper" | "bing" => {}
            other => {
                return Err(ConfigError::ValidationError(format!(
                    "search.provider must be 'serper' or 'bing', got '{other}'"
                )));
            }
        }

        Ok(())
    }

    /// Check if a completion API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Generate a default config TOML string (for first-run setup).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            completion: CompletionConfig::default(),
            search: SearchConfig::default(),
            extraction: ExtractionConfig::default(),
            gateway: GatewayConfig::default(),
            admission: AdmissionConfig::default(),
            default_level: default_level(),
        }
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.search.provider, "serper");
        assert_eq!(config.extraction.fetch_timeout_ms, 3000);
        assert_eq!(config.admission.max_requests, 10);
        assert_eq!(config.admission.window_minutes, 1440);
        assert_eq!(config.default_level, "Middle School");
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.completion.model, config.completion.model);
        assert_eq!(parsed.gateway.port, config.gateway.port);
        assert_eq!(parsed.search.excluded_sites, config.search.excluded_sites);
    }

    #[test]
    fn invalid_temperature_rejected() {
        let mut config = AppConfig::default();
        config.completion.temperature = 5.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn unknown_search_provider_rejected() {
        let mut config = AppConfig::default();
        config.search.provider = "altavista".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_budget_rejected_when_gate_enabled() {
        let mut config = AppConfig::default();
        config.admission.enabled = true;
        config.admission.max_requests = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let result = AppConfig::load_from(Path::new("/nonexistent/config.toml"));
        assert!(result.is_ok());
        assert_eq!(result.unwrap().gateway.port, 8080);
    }

    #[test]
    fn config_file_loading() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[search]
provider = "bing"
excluded_sites = ["youtube.com", "pinterest.com"]

[admission]
enabled = true
max_requests = 5
window_minutes = 60
"#,
        )
        .unwrap();

        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.search.provider, "bing");
        assert_eq!(config.search.excluded_sites.len(), 2);
        assert!(config.admission.enabled);
        assert_eq!(config.admission.max_requests, 5);
    }

    #[test]
    fn debug_output_redacts_keys() {
        let config = AppConfig {
            api_key: Some("sk-secret".into()),
            ..AppConfig::default()
        };
        let debug = format!("{config:?}");
        assert!(!debug.contains("sk-secret"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn default_toml_generation() {
        let toml_str = AppConfig::default_toml();
        assert!(toml_str.contains("serper"));
        assert!(toml_str.contains("8080"));
    }
}
