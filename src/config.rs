//! Configuration loading and management for briefly.
//!
//! Loads settings from an optional `briefly.toml`, then applies environment
//! variable overrides. The resulting [`Config`] is immutable and handed to the
//! extractor and the summarizer at construction time.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Default per-candidate retry budget (attempts = retries + 1)
pub const DEFAULT_MAX_RETRIES: u32 = 2;

/// Default timeout for fetching article HTML
pub const DEFAULT_HTTP_TIMEOUT_MS: u64 = 15_000;

/// Public Gemini REST endpoint
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";

const CONFIG_FILE_NAME: &str = "briefly.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("missing required API key (set GEMINI_API_KEY)")]
    MissingApiKey,
    #[error("invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },
}

/// Generative backend settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiConfig {
    pub api_key: String,
    /// Primary model candidate
    pub model: Option<String>,
    /// Secondary model candidate, tried before the built-in list
    pub fallback_model: Option<String>,
    /// Retries per candidate after the first attempt
    pub max_retries: u32,
    pub base_url: String,
}

/// Article fetch settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    pub timeout_ms: u64,
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    fn from_sources<F>(file: &FileHttp, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let timeout_ms = match lookup("HTTP_TIMEOUT_MS").filter(|v| !v.trim().is_empty()) {
            Some(raw) => parse_number("HTTP_TIMEOUT_MS", raw.trim().to_string())?,
            None => file.timeout_ms.unwrap_or(DEFAULT_HTTP_TIMEOUT_MS),
        };
        Ok(Self { timeout_ms })
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_HTTP_TIMEOUT_MS,
        }
    }
}

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub gemini: GeminiConfig,
    pub http: HttpConfig,
}

/// On-disk shape of `briefly.toml`. Every field is optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub gemini: FileGemini,
    #[serde(default)]
    pub http: FileHttp,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileGemini {
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub fallback_model: Option<String>,
    pub max_retries: Option<u32>,
    pub base_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileHttp {
    pub timeout_ms: Option<u64>,
}

impl FileConfig {
    /// Load a config file from a specific path
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }
}

impl Config {
    /// Load configuration from the default config file location (if any)
    /// and the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        let file = match Self::find_config_file() {
            Some(path) => {
                tracing::debug!(path = %path.display(), "loading config file");
                FileConfig::load_from(&path)?
            }
            None => FileConfig::default(),
        };
        Self::from_sources(file, |key| std::env::var(key).ok())
    }

    /// Build a configuration from a parsed file and an environment lookup.
    ///
    /// Environment values win over file values. Empty environment values are
    /// treated as unset.
    pub fn from_sources<F>(file: FileConfig, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let api_key = env("GEMINI_API_KEY")
            .or(file.gemini.api_key)
            .filter(|k| !k.trim().is_empty())
            .ok_or(ConfigError::MissingApiKey)?;

        let max_retries = match env("GEMINI_MAX_RETRIES") {
            Some(raw) => parse_number("GEMINI_MAX_RETRIES", raw)?,
            None => file.gemini.max_retries.unwrap_or(DEFAULT_MAX_RETRIES),
        };

        let http = HttpConfig::from_sources(&file.http, &lookup)?;

        Ok(Config {
            gemini: GeminiConfig {
                api_key,
                model: env("GEMINI_MODEL").or(file.gemini.model),
                fallback_model: env("GEMINI_FALLBACK_MODEL").or(file.gemini.fallback_model),
                max_retries,
                base_url: env("GEMINI_BASE_URL")
                    .or(file.gemini.base_url)
                    .unwrap_or_else(|| DEFAULT_GEMINI_BASE_URL.to_string()),
            },
            http,
        })
    }

    /// Load only the fetch settings. No API key is required.
    pub fn load_http() -> Result<HttpConfig, ConfigError> {
        let file = match Self::find_config_file() {
            Some(path) => FileConfig::load_from(&path)?,
            None => FileConfig::default(),
        };
        HttpConfig::from_sources(&file.http, |key| std::env::var(key).ok())
    }

    /// Find the config file in standard locations
    fn find_config_file() -> Option<PathBuf> {
        // Check current directory first
        let local_config = PathBuf::from(CONFIG_FILE_NAME);
        if local_config.exists() {
            return Some(local_config);
        }

        let home_config = dirs::home_dir()?
            .join(".config")
            .join("briefly")
            .join(CONFIG_FILE_NAME);
        home_config.exists().then_some(home_config)
    }
}

fn parse_number<T: std::str::FromStr>(key: &'static str, raw: String) -> Result<T, ConfigError> {
    raw.parse()
        .map_err(|_| ConfigError::InvalidValue { key, value: raw })
}
