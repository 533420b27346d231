/*!
 * Page localization engine.
 *
 * - `units`: text units, locators, requests and results
 * - `extractor`: finds localizable text in a document
 * - `prompts` / `batch`: chunking and prompt rendering
 * - `retry` / `client`: generation with retry and model fallback
 * - `parser`: recovers payloads from free-form responses
 * - `replace`: writes localized text back into the document
 * - `urls`: optional absolutizing of relative references
 * - `orchestrator`: runs the whole pipeline
 */

pub mod batch;
pub mod client;
pub mod extractor;
pub mod orchestrator;
pub mod parser;
pub mod prompts;
pub mod replace;
pub mod retry;
pub mod units;
pub mod urls;

pub use batch::{Chunk, PromptBatcher};
pub use client::{Generation, GenerationClient, GenerationOptions};
pub use extractor::{ExtractionOptions, TextUnitExtractor};
pub use orchestrator::{
    CompletionReport, LocalizationMetadata, LocalizationMode, LocalizationOutcome, LocalizationPipeline, Phase,
    PipelineOptions,
};
pub use parser::{ParsedPayload, ResponseMode};
pub use replace::{ReplacementEngine, ReplacementReport};
pub use retry::RetryPolicy;
pub use units::{GroupMember, LocalizationRequest, LocalizationResult, Locator, TextUnit, UnitKind};
pub use urls::rewrite_relative_urls;
