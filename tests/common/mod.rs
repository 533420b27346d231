/*!
 * Common test utilities for the page-localizer test suite
 */

use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;

use page_localizer::localization::{
    GenerationClient, LocalizationPipeline, LocalizationRequest, PipelineOptions, RetryPolicy,
};
use page_localizer::providers::mock::MockProvider;

/// Creates a temporary directory for test files
pub fn create_temp_dir() -> Result<TempDir> {
    Ok(TempDir::new()?)
}

/// Creates a test file with the given content in the specified directory
pub fn create_test_file(dir: &Path, filename: &str, content: &str) -> Result<PathBuf> {
    let file_path = dir.join(filename);
    fs::write(&file_path, content)?;
    Ok(file_path)
}

/// Landing page fragment with every locator tier represented
pub const LANDING_PAGE: &str = r#"<header class="site-header"><h1 id="hero-title">Build your dream website today</h1><p class="tagline">Fast, friendly and affordable web design</p></header><main><h2>Why customers choose us</h2><ul><li>Free consultation for every project</li><li>Responsive designs on all devices</li></ul><a class="btn btn-primary" href="/start">Start your project now</a><img src="/team.jpg" alt="Our design team at work"></main><script>var greeting = "Build your dream website today";</script>"#;

/// Full document with head, body and a style block
pub const FULL_DOCUMENT: &str = "<!DOCTYPE html><html lang=\"en\"><head><title>Acme</title><style>h1 { color: red; }</style></head><body><h1 id=\"t\">Welcome to Acme Industries</h1><p>We make everything you could need.</p></body></html>";

/// Fragment with `n` paragraphs carrying distinct, extractable text
pub fn numbered_paragraphs(n: usize) -> String {
    (0..n)
        .map(|i| format!("<p>Paragraph number {} with enough text</p>", i))
        .collect()
}

/// Spanish request used across tests
pub fn spanish_request() -> LocalizationRequest {
    LocalizationRequest::new("es", "Mexico").with_audience("small business owners")
}

/// Pipeline options without inter-chunk delays
pub fn fast_options() -> PipelineOptions {
    PipelineOptions {
        chunk_delay: Duration::ZERO,
        ..PipelineOptions::default()
    }
}

/// Client with immediate retries over the given models
pub fn test_client(provider: MockProvider, models: &[&str]) -> GenerationClient<MockProvider> {
    GenerationClient::new(provider, models.iter().map(|m| m.to_string()).collect())
        .with_retry_policy(RetryPolicy::immediate(1))
        .with_timeout(Duration::from_secs(5))
}

/// Pipeline over a single test model
pub fn test_pipeline(provider: MockProvider, options: PipelineOptions) -> LocalizationPipeline<MockProvider> {
    LocalizationPipeline::new(test_client(provider, &["test/model"]), options)
}
