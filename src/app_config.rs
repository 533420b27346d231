use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::path::Path;

use crate::localization::LocalizationMode;

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Generation backend settings
    #[serde(default)]
    pub generation: GenerationConfig,

    /// Text unit extraction settings
    #[serde(default)]
    pub extraction: ExtractionConfig,

    /// Chunking and scheduling settings
    #[serde(default)]
    pub batching: BatchConfig,

    /// Default localization mode
    #[serde(default)]
    pub mode: LocalizationMode,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Generation backend configuration (OpenAI-compatible chat completions)
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GenerationConfig {
    /// Chat completions endpoint URL
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// API key for the service; falls back to `OPENROUTER_API_KEY` when empty
    #[serde(default = "String::new")]
    pub api_key: String,

    /// Candidate models in preference order
    #[serde(default = "default_models")]
    pub models: Vec<String>,

    /// Maximum tokens per completion
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Sampling temperature for unit mode (0.0 to 2.0)
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Sampling temperature for document mode
    #[serde(default = "default_document_temperature")]
    pub document_temperature: f32,

    /// Per-attempt timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Retry settings for transient failures
    #[serde(default)]
    pub retry: RetryConfig,

    /// Value of the `HTTP-Referer` header
    #[serde(default = "default_referer")]
    pub referer: String,

    /// Value of the `X-Title` header
    #[serde(default = "default_app_title")]
    pub app_title: String,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            api_key: String::new(),
            models: default_models(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            document_temperature: default_document_temperature(),
            timeout_secs: default_timeout_secs(),
            retry: RetryConfig::default(),
            referer: default_referer(),
            app_title: default_app_title(),
        }
    }
}

impl GenerationConfig {
    /// Get the API key, reading the environment when the config leaves it empty
    pub fn resolve_api_key(&self) -> String {
        if !self.api_key.is_empty() {
            return self.api_key.clone();
        }
        std::env::var("OPENROUTER_API_KEY").unwrap_or_default()
    }

    /// Get the API key or fail when neither the config nor the environment has one
    pub fn require_api_key(&self) -> Result<String> {
        let key = self.resolve_api_key();
        if key.trim().is_empty() {
            return Err(anyhow!(
                "Generation API key is required (set generation.api_key or OPENROUTER_API_KEY)"
            ));
        }
        Ok(key)
    }
}

/// Exponential backoff settings
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct RetryConfig {
    /// Retries after the first attempt
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Delay before the first retry in milliseconds
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,

    /// Upper bound for any single delay in milliseconds
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    /// Growth factor applied per retry
    #[serde(default = "default_backoff_multiplier")]
    pub multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            initial_delay_ms: default_initial_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            multiplier: default_backoff_multiplier(),
        }
    }
}

/// Text unit extraction settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ExtractionConfig {
    /// Minimum trimmed length for a text unit
    #[serde(default = "default_min_text_length")]
    pub min_text_length: usize,

    /// Case-insensitive substrings that mark boilerplate text
    #[serde(default = "default_skip_patterns")]
    pub skip_patterns: Vec<String>,

    /// Collapse header/main/footer/aside/form containers into grouped units
    #[serde(default)]
    pub group_sections: bool,

    /// Extract alt/title/placeholder attributes as units
    #[serde(default = "default_true")]
    pub include_attributes: bool,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            min_text_length: default_min_text_length(),
            skip_patterns: default_skip_patterns(),
            group_sections: false,
            include_attributes: true,
        }
    }
}

/// Chunking and scheduling settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct BatchConfig {
    /// Maximum units per chunk
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Run chunks concurrently with this bound; sequential when unset
    #[serde(default)]
    pub max_concurrent_chunks: Option<usize>,

    /// Pause between sequential chunks in milliseconds
    #[serde(default = "default_chunk_delay_ms")]
    pub chunk_delay_ms: u64,

    /// Largest document accepted in document mode, in kilobytes
    #[serde(default = "default_max_document_kb")]
    pub max_document_kb: usize,

    /// Auto mode switches to document mode below this many units
    #[serde(default = "default_document_mode_unit_threshold")]
    pub document_mode_unit_threshold: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            max_concurrent_chunks: None,
            chunk_delay_ms: default_chunk_delay_ms(),
            max_document_kb: default_max_document_kb(),
            document_mode_unit_threshold: default_document_mode_unit_threshold(),
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Convert to the `log` crate filter
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            Self::Error => log::LevelFilter::Error,
            Self::Warn => log::LevelFilter::Warn,
            Self::Info => log::LevelFilter::Info,
            Self::Debug => log::LevelFilter::Debug,
            Self::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Fallback catalogue tried after the preferred model
pub const DEFAULT_MODELS: &[&str] = &[
    "qwen/qwen3-32b",
    "qwen/qwen3-72b",
    "qwen/qwen-2.5-72b-instruct",
    "qwen/qwen-2.5-32b-instruct",
    "qwen/qwen-2.5-14b-instruct",
    "anthropic/claude-3.5-sonnet",
    "anthropic/claude-3-opus",
    "anthropic/claude-3-sonnet",
    "openai/gpt-4-turbo",
    "openai/gpt-3.5-turbo",
];

/// Boilerplate markers excluded from extraction
pub const DEFAULT_SKIP_PATTERNS: &[&str] = &[
    "click here",
    "read more",
    "learn more",
    "view more",
    "cookie",
    "privacy",
    "terms",
    "copyright",
    "menu",
    "navigation",
    "skip to",
    "back to top",
];

fn default_endpoint() -> String {
    "https://openrouter.ai/api/v1/chat/completions".to_string()
}

fn default_models() -> Vec<String> {
    DEFAULT_MODELS.iter().map(|m| m.to_string()).collect()
}

fn default_max_tokens() -> u32 {
    16000
}

fn default_temperature() -> f32 {
    0.3
}

fn default_document_temperature() -> f32 {
    0.1
}

fn default_timeout_secs() -> u64 {
    120
}

fn default_max_retries() -> u32 {
    3
}

fn default_initial_delay_ms() -> u64 {
    2000
}

fn default_max_delay_ms() -> u64 {
    30000
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

fn default_referer() -> String {
    "http://localhost".to_string()
}

fn default_app_title() -> String {
    "Page Variant Generator".to_string()
}

fn default_min_text_length() -> usize {
    10
}

fn default_skip_patterns() -> Vec<String> {
    DEFAULT_SKIP_PATTERNS.iter().map(|p| p.to_string()).collect()
}

fn default_true() -> bool {
    true
}

fn default_chunk_size() -> usize {
    200
}

fn default_chunk_delay_ms() -> u64 {
    2000
}

fn default_max_document_kb() -> usize {
    100
}

fn default_document_mode_unit_threshold() -> usize {
    3
}

impl Config {
    /// Load the configuration from `path`, writing the defaults there if the file is missing
    pub fn load_or_create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to open config file: {}", path.display()))?;
            let config: Config = serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
            return Ok(config);
        }

        log::warn!("Config file not found at '{}', creating default config.", path.display());
        let config = Config::default();
        config.save(path)?;
        Ok(config)
    }

    /// Write the configuration as pretty JSON
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self)
            .context("Failed to serialize config to JSON")?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write config to file: {}", path.display()))?;
        Ok(())
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        if self.generation.endpoint.trim().is_empty() {
            return Err(anyhow!("Generation endpoint must not be empty"));
        }
        url::Url::parse(&self.generation.endpoint)
            .with_context(|| format!("Invalid generation endpoint: {}", self.generation.endpoint))?;

        if self.generation.models.is_empty() {
            return Err(anyhow!("At least one candidate model is required"));
        }
        if !(0.0..=2.0).contains(&self.generation.temperature)
            || !(0.0..=2.0).contains(&self.generation.document_temperature)
        {
            return Err(anyhow!("Temperature must be between 0.0 and 2.0"));
        }
        if self.generation.timeout_secs == 0 {
            return Err(anyhow!("Timeout must be at least one second"));
        }

        let retry = &self.generation.retry;
        if retry.multiplier < 1.0 {
            return Err(anyhow!("Backoff multiplier must be at least 1.0"));
        }
        if retry.initial_delay_ms > retry.max_delay_ms {
            return Err(anyhow!(
                "Initial retry delay ({}ms) exceeds maximum delay ({}ms)",
                retry.initial_delay_ms,
                retry.max_delay_ms
            ));
        }

        if self.batching.chunk_size == 0 {
            return Err(anyhow!("Chunk size must be greater than zero"));
        }
        if self.batching.max_concurrent_chunks == Some(0) {
            return Err(anyhow!("max_concurrent_chunks must be greater than zero when set"));
        }

        Ok(())
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            generation: GenerationConfig::default(),
            extraction: ExtractionConfig::default(),
            batching: BatchConfig::default(),
            mode: LocalizationMode::default(),
            log_level: LogLevel::default(),
        }
    }
}
