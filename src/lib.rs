/*!
 * # Page Localizer
 *
 * A Rust library that localizes HTML pages with chat-completion models.
 *
 * ## Features
 *
 * - Extract localizable text units (headings, paragraphs, buttons, list
 *   items, links, labels and the `alt`/`title`/`placeholder` attributes)
 * - Send them to an OpenAI-compatible backend in chunks, with retry and
 *   model fallback
 * - Recover structured payloads from free-form model output
 * - Write localized text back without touching markup, scripts or styles
 * - Whole-document mode for small pages
 * - ISO 639 language codes or plain language names as targets
 *
 * ## Architecture
 *
 * - `app_config`: Configuration management
 * - `document`: Document model adapter and its html5ever implementation
 * - `localization`: Extraction, batching, generation, parsing, replacement
 *   and the pipeline that runs them
 * - `language_utils`: ISO language code utilities
 * - `providers`: Chat-completion clients:
 *   - `providers::openrouter`: OpenRouter and other OpenAI-compatible gateways
 *   - `providers::mock`: Scripted provider for tests and benchmarks
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod document;
pub mod errors;
pub mod language_utils;
pub mod localization;
pub mod providers;

// Re-export main types for easier usage
pub use app_config::Config;
pub use document::{DocumentModel, HtmlDocument};
pub use errors::{AppError, LocalizationError, ProviderError};
pub use language_utils::{display_name, is_rtl, normalize_to_part3};
pub use localization::{
    CompletionReport, LocalizationMode, LocalizationOutcome, LocalizationPipeline, LocalizationRequest,
    LocalizationResult, TextUnit,
};
