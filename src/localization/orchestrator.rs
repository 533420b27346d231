/*!
 * Localization pipeline.
 *
 * One run moves through `Extracting → Batching → Generating → Parsing →
 * Replacing → Done`. In unit mode the generating and parsing steps fan out
 * into one sub-flow per chunk; a chunk that fails leaves its units as
 * original text and the run carries on. Replacement happens once, after
 * every chunk has settled, so the document is always in a fully applied
 * state.
 */

use std::fmt;
use std::future::{Future, pending};
use std::str::FromStr;
use std::time::{Duration, Instant};

use futures::stream::{self, StreamExt};
use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::app_config::Config;
use crate::document::{DocumentModel, HtmlDocument};
use crate::errors::LocalizationError;
use crate::providers::ChatProvider;

use super::batch::{Chunk, PromptBatcher, estimate_tokens};
use super::client::{GenerationClient, GenerationOptions};
use super::extractor::{ExtractionOptions, TextUnitExtractor};
use super::parser;
use super::replace::{ReplacementEngine, ReplacementReport};
use super::units::{LocalizationRequest, LocalizationResult, TextUnit};
use super::urls::absolutize_urls;

/// How text travels to the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocalizationMode {
    /// Discrete text units, chunked
    #[default]
    Units,
    /// The whole serialized document in one request
    Document,
    /// Document mode for small pages, unit mode otherwise
    Auto,
}

impl fmt::Display for LocalizationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Units => "units",
            Self::Document => "document",
            Self::Auto => "auto",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for LocalizationMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "units" | "unit" => Ok(Self::Units),
            "document" | "doc" => Ok(Self::Document),
            "auto" => Ok(Self::Auto),
            other => Err(format!("Unknown localization mode: {}", other)),
        }
    }
}

/// Run state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Idle,
    Extracting,
    Batching,
    Generating,
    Parsing,
    Replacing,
    Done,
}

/// Aggregate counts of one run.
///
/// `units_processed + units_unresolved == units_total` always holds.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CompletionReport {
    pub units_total: usize,
    /// Units whose localized text was written to the document
    pub units_processed: usize,
    /// Units left as original text
    pub units_unresolved: usize,
    /// Units that had a localized value but no matching node
    pub replacements_skipped: usize,
    pub chunks_total: usize,
    pub chunks_failed: usize,
    pub unresolved_ids: Vec<String>,
}

impl CompletionReport {
    fn from_replacement(units_total: usize, replacement: &ReplacementReport) -> Self {
        let mut unresolved_ids = replacement.untouched.clone();
        unresolved_ids.extend(replacement.skipped.iter().cloned());
        Self {
            units_total,
            units_processed: replacement.applied.len(),
            units_unresolved: units_total.saturating_sub(replacement.applied.len()),
            replacements_skipped: replacement.skipped.len(),
            unresolved_ids,
            ..Default::default()
        }
    }

    /// Share of units that ended up localized, between 0 and 1
    pub fn completeness(&self) -> f64 {
        if self.units_total == 0 {
            return 0.0;
        }
        self.units_processed as f64 / self.units_total as f64
    }
}

/// Run facts handed to the persistence side
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocalizationMetadata {
    /// Mode actually used, after resolving auto
    pub mode: LocalizationMode,
    pub target_language: String,
    pub target_country: String,
    pub writing_style: String,
    pub audience: String,
    /// Models that produced accepted output, in chunk order
    pub models_used: Vec<String>,
    /// Every model tried, in order of first use
    pub models_attempted: Vec<String>,
    pub estimated_prompt_tokens: usize,
    /// RFC 3339 timestamp of completion
    pub generated_at: String,
    pub extraction_ms: u64,
    pub generation_ms: u64,
    pub replacement_ms: u64,
    pub total_ms: u64,
    /// Phases entered, in order
    pub phases: Vec<Phase>,
    pub cancelled: bool,
}

/// Result of a successful run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocalizationOutcome {
    pub localized_html: String,
    pub report: CompletionReport,
    pub metadata: LocalizationMetadata,
}

/// Tunables of a run
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub extraction: ExtractionOptions,
    pub mode: LocalizationMode,
    pub chunk_size: usize,
    /// Concurrent chunk bound; chunks run one by one with a delay when unset
    pub max_concurrent_chunks: Option<usize>,
    pub chunk_delay: Duration,
    pub max_document_kb: usize,
    pub document_mode_unit_threshold: usize,
    /// Preferred model tried before the configured list
    pub model: Option<String>,
    pub max_tokens: u32,
    pub temperature: f32,
    pub document_temperature: f32,
    /// Base URL for absolutizing relative references
    pub base_url: Option<Url>,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

impl From<&Config> for PipelineOptions {
    fn from(config: &Config) -> Self {
        Self {
            extraction: ExtractionOptions::from(&config.extraction),
            mode: config.mode,
            chunk_size: config.batching.chunk_size,
            max_concurrent_chunks: config.batching.max_concurrent_chunks,
            chunk_delay: Duration::from_millis(config.batching.chunk_delay_ms),
            max_document_kb: config.batching.max_document_kb,
            document_mode_unit_threshold: config.batching.document_mode_unit_threshold,
            model: None,
            max_tokens: config.generation.max_tokens,
            temperature: config.generation.temperature,
            document_temperature: config.generation.document_temperature,
            base_url: None,
        }
    }
}

/// Settled chunk sub-flow
struct ChunkOutcome {
    index: usize,
    units: usize,
    models_tried: Vec<String>,
    result: Result<(LocalizationResult, String), LocalizationError>,
}

/// Drives extraction, generation, parsing and replacement for one page at a time
#[derive(Debug)]
pub struct LocalizationPipeline<P> {
    client: GenerationClient<P>,
    extractor: TextUnitExtractor,
    batcher: PromptBatcher,
    engine: ReplacementEngine,
    options: PipelineOptions,
}

impl<P: ChatProvider> LocalizationPipeline<P> {
    pub fn new(client: GenerationClient<P>, options: PipelineOptions) -> Self {
        Self {
            extractor: TextUnitExtractor::new(options.extraction.clone()),
            batcher: PromptBatcher::new(options.chunk_size),
            engine: ReplacementEngine::new(),
            client,
            options,
        }
    }

    /// Build a pipeline and its client from the application config
    pub fn from_config(provider: P, config: &Config) -> Self {
        let client = GenerationClient::from_config(provider, &config.generation);
        Self::new(client, PipelineOptions::from(config))
    }

    pub fn with_mode(mut self, mode: LocalizationMode) -> Self {
        self.options.mode = mode;
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.options.model = Some(model.into());
        self
    }

    pub fn with_base_url(mut self, base_url: Url) -> Self {
        self.options.base_url = Some(base_url);
        self
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    pub fn client(&self) -> &GenerationClient<P> {
        &self.client
    }

    /// Localize a page
    pub async fn localize(
        &self,
        html: &str,
        request: &LocalizationRequest,
    ) -> Result<LocalizationOutcome, LocalizationError> {
        self.localize_until(html, request, pending::<()>()).await
    }

    /// Localize a page, stopping early when `cancel` completes.
    ///
    /// In-flight chunk requests are dropped on cancellation. Chunks that had
    /// already settled are still applied; the rest stay unresolved.
    pub async fn localize_until<C>(
        &self,
        html: &str,
        request: &LocalizationRequest,
        cancel: C,
    ) -> Result<LocalizationOutcome, LocalizationError>
    where
        C: Future<Output = ()>,
    {
        let started = Instant::now();
        let mut phases = vec![Phase::Idle];

        enter(&mut phases, Phase::Extracting);
        let units = self.extract(html);
        if units.is_empty() {
            error!("No localizable text found, aborting run");
            return Err(LocalizationError::ExtractionEmpty);
        }
        let extraction_ms = elapsed_ms(started);
        info!("Extracted {} text unit(s)", units.len());

        let mode = self.resolve_mode(html, units.len());
        info!(
            "Localizing into {} ({}) using {} mode",
            request.language_name(),
            request.target_country(),
            mode
        );

        let outcome = match mode {
            LocalizationMode::Document => {
                self.run_document(html, request, &units, cancel, &mut phases).await?
            }
            _ => self.run_units(html, request, &units, cancel, &mut phases).await?,
        };

        let RunOutput {
            localized_html,
            mut report,
            models_used,
            models_attempted,
            estimated_prompt_tokens,
            generation_ms,
            replacement_ms,
            cancelled,
        } = outcome;

        enter(&mut phases, Phase::Done);
        report.units_total = units.len();
        info!(
            "Localization done: {}/{} unit(s) localized, {} unresolved, {} skipped, {}/{} chunk(s) failed",
            report.units_processed,
            report.units_total,
            report.units_unresolved,
            report.replacements_skipped,
            report.chunks_failed,
            report.chunks_total
        );

        Ok(LocalizationOutcome {
            localized_html,
            report,
            metadata: LocalizationMetadata {
                mode,
                target_language: request.language_name(),
                target_country: request.target_country().to_string(),
                writing_style: request.writing_style().to_string(),
                audience: request.audience().to_string(),
                models_used,
                models_attempted,
                estimated_prompt_tokens,
                generated_at: chrono::Utc::now().to_rfc3339(),
                extraction_ms,
                generation_ms,
                replacement_ms,
                total_ms: elapsed_ms(started),
                phases,
                cancelled,
            },
        })
    }

    /// Extract units without keeping the parsed tree alive
    pub fn extract(&self, html: &str) -> Vec<TextUnit> {
        let doc = HtmlDocument::parse(html);
        self.extractor.extract(&doc)
    }

    /// Mode to use for a page with `unit_count` units
    pub fn resolve_mode(&self, html: &str, unit_count: usize) -> LocalizationMode {
        match self.options.mode {
            LocalizationMode::Auto => {
                let fits = size_kb(html) <= self.options.max_document_kb as f64;
                if unit_count < self.options.document_mode_unit_threshold && fits {
                    LocalizationMode::Document
                } else {
                    LocalizationMode::Units
                }
            }
            mode => mode,
        }
    }

    async fn run_units<C: Future<Output = ()>>(
        &self,
        html: &str,
        request: &LocalizationRequest,
        units: &[TextUnit],
        cancel: C,
        phases: &mut Vec<Phase>,
    ) -> Result<RunOutput, LocalizationError> {
        enter(phases, Phase::Batching);
        let chunks = self.batcher.chunk(units);
        let chunks_total = chunks.len();
        let estimated_prompt_tokens: usize = chunks
            .iter()
            .map(|chunk| estimate_tokens(&self.batcher.unit_prompt(chunk, request).user))
            .sum();
        info!(
            "Split {} unit(s) into {} chunk(s) of at most {} (~{} prompt tokens)",
            units.len(),
            chunks_total,
            self.batcher.chunk_size(),
            estimated_prompt_tokens
        );

        enter(phases, Phase::Generating);
        enter(phases, Phase::Parsing);
        let generation_started = Instant::now();
        let (mut settled, cancelled) = self.run_chunks(&chunks, request, cancel).await;
        let generation_ms = elapsed_ms(generation_started);
        settled.sort_by_key(|outcome| outcome.index);

        let mut merged = LocalizationResult::new();
        let mut chunks_failed = chunks_total - settled.len();
        let mut models_used = Vec::new();
        let mut models_attempted: Vec<String> = Vec::new();

        for outcome in settled {
            for model in &outcome.models_tried {
                if !models_attempted.contains(model) {
                    models_attempted.push(model.clone());
                }
            }
            match outcome.result {
                Ok((result, model)) => {
                    let rejected = merged.merge(result);
                    if !rejected.is_empty() {
                        warn!(
                            "Chunk {} returned ids already localized elsewhere: {}",
                            outcome.index + 1,
                            rejected.join(", ")
                        );
                    }
                    models_used.push(model);
                }
                Err(e) if !e.is_chunk_recoverable() => {
                    error!("Chunk {} failed: {}", outcome.index + 1, e);
                    return Err(e);
                }
                Err(e) => {
                    warn!(
                        "Chunk {} failed, leaving its {} unit(s) unresolved: {}",
                        outcome.index + 1,
                        outcome.units,
                        e
                    );
                    chunks_failed += 1;
                }
            }
        }

        if cancelled && merged.is_empty() {
            warn!("Run cancelled before any chunk completed");
            return Err(LocalizationError::Cancelled);
        }
        if chunks_failed == chunks_total {
            error!("All {} chunk(s) failed", chunks_total);
            return Err(LocalizationError::AllChunksFailed { chunks: chunks_total });
        }

        enter(phases, Phase::Replacing);
        let replacement_started = Instant::now();
        let (localized_html, replacement) = self.replace(html, units, &merged)?;
        let mut report = CompletionReport::from_replacement(units.len(), &replacement);
        report.chunks_total = chunks_total;
        report.chunks_failed = chunks_failed;

        Ok(RunOutput {
            localized_html,
            report,
            models_used,
            models_attempted,
            estimated_prompt_tokens,
            generation_ms,
            replacement_ms: elapsed_ms(replacement_started),
            cancelled,
        })
    }

    /// Run every chunk, returning the settled ones and whether the run was cancelled
    async fn run_chunks<C: Future<Output = ()>>(
        &self,
        chunks: &[Chunk],
        request: &LocalizationRequest,
        cancel: C,
    ) -> (Vec<ChunkOutcome>, bool) {
        let concurrency = self.options.max_concurrent_chunks.unwrap_or(1).max(1);
        let delay = match self.options.max_concurrent_chunks {
            Some(_) => Duration::ZERO,
            None => self.options.chunk_delay,
        };
        let total = chunks.len();

        let mut pending_chunks = stream::iter(chunks)
            .map(|chunk| async move {
                if chunk.index > 0 && !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                info!("Processing chunk {} of {} ({} units)", chunk.index + 1, total, chunk.len());
                self.process_chunk(chunk, request).await
            })
            .buffer_unordered(concurrency);

        let mut settled = Vec::with_capacity(total);
        let mut cancel = std::pin::pin!(cancel);
        loop {
            tokio::select! {
                biased;
                _ = &mut cancel => {
                    warn!("Cancellation requested with {} of {} chunk(s) settled", settled.len(), total);
                    return (settled, true);
                }
                next = pending_chunks.next() => match next {
                    Some(outcome) => settled.push(outcome),
                    None => return (settled, false),
                },
            }
        }
    }

    async fn process_chunk(&self, chunk: &Chunk, request: &LocalizationRequest) -> ChunkOutcome {
        let prompt = self.batcher.unit_prompt(chunk, request);
        let options = GenerationOptions {
            model: self.options.model.clone(),
            max_tokens: self.options.max_tokens,
            temperature: self.options.temperature,
        };

        let generation = match self.client.generate_with_model(&prompt.user, &prompt.system, &options).await {
            Ok(generation) => generation,
            Err(e) => {
                return ChunkOutcome {
                    index: chunk.index,
                    units: chunk.len(),
                    models_tried: self.client.candidate_models(options.model.as_deref()),
                    result: Err(e),
                };
            }
        };

        let result = parser::parse_units(&generation.text).map(|parsed| {
            let (known, unknown): (Vec<_>, Vec<_>) = parsed
                .iter()
                .map(|(id, text)| (id.to_string(), text.to_string()))
                .partition(|(id, _)| prompt.unit_ids.contains(id));
            if !unknown.is_empty() {
                debug!(
                    "Chunk {} ignored {} id(s) it did not ask for",
                    chunk.index + 1,
                    unknown.len()
                );
            }
            let missing = prompt.unit_ids.len().saturating_sub(known.len());
            if missing > 0 {
                warn!("Chunk {} came back without {} unit(s)", chunk.index + 1, missing);
            }
            (known.into_iter().collect::<LocalizationResult>(), generation.model.clone())
        });

        ChunkOutcome {
            index: chunk.index,
            units: chunk.len(),
            models_tried: generation.models_tried,
            result,
        }
    }

    async fn run_document<C: Future<Output = ()>>(
        &self,
        html: &str,
        request: &LocalizationRequest,
        units: &[TextUnit],
        cancel: C,
        phases: &mut Vec<Phase>,
    ) -> Result<RunOutput, LocalizationError> {
        enter(phases, Phase::Batching);
        let size = size_kb(html);
        if size > self.options.max_document_kb as f64 {
            error!(
                "Document is {:.1}KB, above the {}KB document mode limit",
                size, self.options.max_document_kb
            );
            return Err(LocalizationError::DocumentTooLarge {
                size_kb: size,
                max_kb: self.options.max_document_kb,
            });
        }
        if size > self.options.max_document_kb as f64 / 2.0 {
            warn!(
                "Document is {:.1}KB, more than half of the {}KB limit; output may be truncated",
                size, self.options.max_document_kb
            );
        }

        let prompt = self.batcher.document_prompt(html, request);
        info!(
            "Document prompt: {} bytes of markup, ~{} tokens",
            prompt.document_bytes, prompt.estimated_tokens
        );

        enter(phases, Phase::Generating);
        let options = GenerationOptions {
            model: self.options.model.clone(),
            max_tokens: self.options.max_tokens,
            temperature: self.options.document_temperature,
        };
        let generation_started = Instant::now();
        let generation = tokio::select! {
            biased;
            _ = cancel => {
                warn!("Run cancelled during document generation");
                return Err(LocalizationError::Cancelled);
            }
            generation = self.client.generate_with_model(&prompt.user, &prompt.system, &options) => generation?,
        };
        let generation_ms = elapsed_ms(generation_started);

        enter(phases, Phase::Parsing);
        let document = parser::parse_document(&generation.text)?;

        enter(phases, Phase::Replacing);
        let replacement_started = Instant::now();
        let localized_html = match &self.options.base_url {
            Some(base) => {
                let mut doc = HtmlDocument::parse(&document);
                if absolutize_urls(&mut doc, base) > 0 {
                    doc.serialize().map_err(|e| {
                        LocalizationError::InvalidDocumentStructure(format!("serialization failed: {}", e))
                    })?
                } else {
                    document
                }
            }
            None => document,
        };

        let report = CompletionReport {
            units_total: units.len(),
            units_processed: units.len(),
            chunks_total: 1,
            ..Default::default()
        };

        Ok(RunOutput {
            localized_html,
            report,
            models_used: vec![generation.model],
            models_attempted: generation.models_tried,
            estimated_prompt_tokens: prompt.estimated_tokens,
            generation_ms,
            replacement_ms: elapsed_ms(replacement_started),
            cancelled: false,
        })
    }

    /// Apply merged results to a fresh parse of the page.
    ///
    /// When nothing is written the input is returned verbatim.
    fn replace(
        &self,
        html: &str,
        units: &[TextUnit],
        merged: &LocalizationResult,
    ) -> Result<(String, ReplacementReport), LocalizationError> {
        let mut doc = HtmlDocument::parse(html);
        let report = self.engine.apply(&mut doc, units, merged);
        let rewritten = match &self.options.base_url {
            Some(base) => absolutize_urls(&mut doc, base),
            None => 0,
        };

        if report.nodes_written == 0 && rewritten == 0 {
            return Ok((html.to_string(), report));
        }
        let localized = doc.serialize().map_err(|e| {
            LocalizationError::InvalidDocumentStructure(format!("serialization failed: {}", e))
        })?;
        Ok((localized, report))
    }
}

/// Mode-independent output of a run
struct RunOutput {
    localized_html: String,
    report: CompletionReport,
    models_used: Vec<String>,
    models_attempted: Vec<String>,
    estimated_prompt_tokens: usize,
    generation_ms: u64,
    replacement_ms: u64,
    cancelled: bool,
}

fn enter(phases: &mut Vec<Phase>, phase: Phase) {
    debug!("Entering phase {:?}", phase);
    phases.push(phase);
}

fn elapsed_ms(since: Instant) -> u64 {
    since.elapsed().as_millis().min(u64::MAX as u128) as u64
}

fn size_kb(html: &str) -> f64 {
    html.len() as f64 / 1024.0
}
