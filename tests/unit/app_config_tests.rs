/*!
 * Tests for application configuration functionality
 */

use anyhow::Result;
use page_localizer::app_config::{Config, LogLevel, DEFAULT_MODELS};
use page_localizer::localization::{LocalizationMode, PipelineOptions};

use crate::common;

/// Test default configuration values
#[test]
fn test_default_config_withNoParameters_shouldHaveCorrectDefaults() {
    let config = Config::default();

    assert_eq!(config.generation.endpoint, "https://openrouter.ai/api/v1/chat/completions");
    assert_eq!(config.generation.models.len(), DEFAULT_MODELS.len());
    assert_eq!(config.generation.max_tokens, 16000);
    assert_eq!(config.generation.timeout_secs, 120);
    assert_eq!(config.generation.retry.initial_delay_ms, 2000);
    assert_eq!(config.generation.retry.max_delay_ms, 30000);
    assert_eq!(config.extraction.min_text_length, 10);
    assert!(!config.extraction.group_sections);
    assert_eq!(config.batching.chunk_size, 200);
    assert_eq!(config.batching.max_concurrent_chunks, None);
    assert_eq!(config.batching.chunk_delay_ms, 2000);
    assert_eq!(config.batching.max_document_kb, 100);
    assert_eq!(config.mode, LocalizationMode::Units);
    assert_eq!(config.log_level, LogLevel::Info);
}

/// Test that a missing config file is created with defaults and reloads identically
#[test]
fn test_loadOrCreate_withMissingFile_shouldWriteDefaultsThatReload() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("conf.json");

    let created = Config::load_or_create(&path)?;
    assert!(path.exists());

    let reloaded = Config::load_or_create(&path)?;
    assert_eq!(reloaded.generation.models, created.generation.models);
    assert_eq!(reloaded.batching.chunk_size, created.batching.chunk_size);
    assert_eq!(reloaded.extraction.skip_patterns, created.extraction.skip_patterns);
    Ok(())
}

/// Test that saved overrides survive a round trip through the file
#[test]
fn test_save_withOverrides_shouldRoundTrip() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("custom.json");

    let mut config = Config::default();
    config.generation.models = vec!["openai/gpt-4-turbo".to_string()];
    config.batching.max_concurrent_chunks = Some(4);
    config.mode = LocalizationMode::Auto;
    config.log_level = LogLevel::Debug;
    config.save(&path)?;

    let loaded = Config::load_or_create(&path)?;
    assert_eq!(loaded.generation.models, vec!["openai/gpt-4-turbo"]);
    assert_eq!(loaded.batching.max_concurrent_chunks, Some(4));
    assert_eq!(loaded.mode, LocalizationMode::Auto);
    assert_eq!(loaded.log_level, LogLevel::Debug);
    Ok(())
}

/// Test that a partial file is completed with defaults
#[test]
fn test_loadOrCreate_withPartialFile_shouldFillDefaults() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(
        temp_dir.path(),
        "partial.json",
        r#"{"mode": "document", "generation": {"api_key": "sk-test"}}"#,
    )?;

    let config = Config::load_or_create(&path)?;
    assert_eq!(config.mode, LocalizationMode::Document);
    assert_eq!(config.generation.require_api_key()?, "sk-test");
    assert_eq!(config.generation.temperature, 0.3);
    Ok(())
}

/// Test that malformed JSON is reported instead of replaced
#[test]
fn test_loadOrCreate_withMalformedFile_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(temp_dir.path(), "broken.json", "{ not json")?;

    let result = Config::load_or_create(&path);
    assert!(result.is_err());
    assert_eq!(std::fs::read_to_string(&path)?, "{ not json");
    Ok(())
}

/// Test configuration validation
#[test]
fn test_config_validation_withVariousConfigs_shouldValidateCorrectly() {
    let mut config = Config::default();
    assert!(config.validate().is_ok());

    config.generation.endpoint = "not a url".to_string();
    assert!(config.validate().is_err());
    config.generation.endpoint = "http://localhost:1234/v1/chat/completions".to_string();
    assert!(config.validate().is_ok());

    config.generation.models.clear();
    assert!(config.validate().is_err());
    config.generation.models = vec!["m".to_string()];

    config.generation.temperature = 3.5;
    assert!(config.validate().is_err());
    config.generation.temperature = 0.3;

    config.generation.retry.multiplier = 0.5;
    assert!(config.validate().is_err());
    config.generation.retry.multiplier = 2.0;

    config.generation.retry.initial_delay_ms = 60_000;
    assert!(config.validate().is_err());
    config.generation.retry.initial_delay_ms = 2000;

    config.batching.max_concurrent_chunks = Some(0);
    assert!(config.validate().is_err());
    config.batching.max_concurrent_chunks = Some(2);
    assert!(config.validate().is_ok());
}

/// Test that pipeline options follow the config
#[test]
fn test_pipelineOptions_fromConfig_shouldCarrySettings() {
    let mut config = Config::default();
    config.batching.chunk_size = 25;
    config.batching.max_concurrent_chunks = Some(3);
    config.generation.document_temperature = 0.05;

    let options = PipelineOptions::from(&config);
    assert_eq!(options.chunk_size, 25);
    assert_eq!(options.max_concurrent_chunks, Some(3));
    assert_eq!(options.document_temperature, 0.05);
    assert!(options.model.is_none());
    assert!(options.base_url.is_none());
}
