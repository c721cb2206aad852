//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.skybrief.toml` files.

use crate::briefing::SummarizerConfig;
use crate::sources::registry::DEFAULT_BASE_URL;
use crate::sources::FetcherConfig;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default configuration file name.
pub const CONFIG_FILE_NAME: &str = ".skybrief.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Upstream source settings.
    #[serde(default)]
    pub sources: SourcesConfig,

    /// Summarization backend settings.
    #[serde(default)]
    pub backend: BackendConfig,
}

/// General application settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Default output file path (stdout when unset).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,

    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,
}

/// Upstream data source settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourcesConfig {
    /// Base URL every source endpoint is rooted at.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-source request timeout in seconds.
    #[serde(default = "default_source_timeout")]
    pub timeout_seconds: u64,

    /// User agent sent to upstream sources.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_seconds: default_source_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_source_timeout() -> u64 {
    20
}

fn default_user_agent() -> String {
    format!("skybrief/{}", env!("CARGO_PKG_VERSION"))
}

/// Generative-text backend settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Chat-completions endpoint.
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Model name.
    #[serde(default = "default_model")]
    pub model: String,

    /// Temperature for generation.
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum tokens in response.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Request timeout in seconds.
    #[serde(default = "default_backend_timeout")]
    pub timeout_seconds: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            timeout_seconds: default_backend_timeout(),
        }
    }
}

fn default_api_url() -> String {
    "https://api.openai.com/v1/chat/completions".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_temperature() -> f32 {
    0.2
}

fn default_max_tokens() -> u32 {
    400
}

fn default_backend_timeout() -> u64 {
    30
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(CONFIG_FILE_NAME);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings, but only
    /// when they were explicitly provided.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref base_url) = args.base_url {
            self.sources.base_url = base_url.clone();
        }
        if let Some(timeout) = args.timeout {
            self.sources.timeout_seconds = timeout;
        }

        if let Some(ref model) = args.model {
            self.backend.model = model.clone();
        }
        if let Some(ref api_url) = args.api_url {
            self.backend.api_url = api_url.clone();
        }

        if let Some(ref output) = args.output {
            self.general.output = Some(output.display().to_string());
        }

        // Flags always override
        if args.verbose {
            self.general.verbose = true;
        }
    }

    /// Fetcher settings derived from the `[sources]` table.
    pub fn fetcher_config(&self) -> FetcherConfig {
        FetcherConfig {
            timeout_seconds: self.sources.timeout_seconds,
            user_agent: self.sources.user_agent.clone(),
        }
    }

    /// Summarizer settings derived from the `[backend]` table.
    pub fn summarizer_config(&self) -> SummarizerConfig {
        SummarizerConfig {
            api_url: self.backend.api_url.clone(),
            model_name: self.backend.model.clone(),
            temperature: self.backend.temperature,
            max_tokens: self.backend.max_tokens,
            timeout_seconds: self.backend.timeout_seconds,
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.sources.base_url, "https://aviationweather.gov/api/data");
        assert_eq!(config.sources.timeout_seconds, 20);
        assert_eq!(config.backend.model, "gpt-4o-mini");
        assert_eq!(config.backend.timeout_seconds, 30);
        assert_eq!(config.backend.max_tokens, 400);
        assert!(config.general.output.is_none());
    }

    #[test]
    fn test_parse_config() {
        let toml_content = r#"
[general]
output = "briefing.md"
verbose = true

[sources]
base_url = "http://localhost:8080/api/data"
timeout_seconds = 5

[backend]
model = "gpt-4o"
temperature = 0.1
"#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert_eq!(config.general.output.as_deref(), Some("briefing.md"));
        assert!(config.general.verbose);
        assert_eq!(config.sources.base_url, "http://localhost:8080/api/data");
        assert_eq!(config.sources.timeout_seconds, 5);
        assert_eq!(config.backend.model, "gpt-4o");
        assert_eq!(config.backend.temperature, 0.1);
        assert_eq!(config.backend.max_tokens, 400);
    }

    #[test]
    fn test_default_toml_generation() {
        let toml_str = Config::default_toml();
        assert!(!toml_str.is_empty());
        assert!(toml_str.contains("[general]"));
        assert!(toml_str.contains("[sources]"));
        assert!(toml_str.contains("[backend]"));

        let reparsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(reparsed.backend.model, "gpt-4o-mini");
    }

    #[test]
    fn test_default_toml_lists_every_key() {
        let toml_str = Config::default_toml();
        for key in [
            "verbose = false",
            "base_url = \"https://aviationweather.gov/api/data\"",
            "timeout_seconds = 20",
            "user_agent = \"skybrief/",
            "api_url = \"https://api.openai.com/v1/chat/completions\"",
            "model = \"gpt-4o-mini\"",
            "max_tokens = 400",
            "timeout_seconds = 30",
        ] {
            assert!(toml_str.contains(key), "missing `{}` in:\n{}", key, toml_str);
        }
        assert!(!toml_str.contains("output ="));
    }

    #[test]
    fn test_derived_component_configs() {
        let mut config = Config::default();
        config.sources.timeout_seconds = 7;
        config.backend.model = "gpt-4o".to_string();

        assert_eq!(config.fetcher_config().timeout_seconds, 7);
        let summarizer = config.summarizer_config();
        assert_eq!(summarizer.model_name, "gpt-4o");
        assert_eq!(summarizer.max_tokens, 400);
    }
}
