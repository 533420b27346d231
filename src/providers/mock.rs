/*!
 * Mock provider implementations for testing.
 *
 * This module provides a scripted chat provider that simulates different behaviors:
 * - `MockProvider::working()` - Always succeeds, echoing every unit with a `[LOCALIZED]` prefix
 * - `MockProvider::intermittent(n)` - Fails every Nth request with a 503
 * - `MockProvider::failing(status)` - Always fails with the given HTTP status
 * - `MockProvider::fail_first(n, status)` - Fails the first N requests, then works
 *
 * Modifiers add per-model errors and prompt-dependent failures on top of any behavior.
 */

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::errors::ProviderError;
use crate::providers::{ChatRequest, ChatResponse, Provider};

static UNIT_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#""id":\s*"([^"]+)",\s*"text":\s*"((?:[^"\\]|\\.)*)""#).unwrap()
});

const DOCUMENT_START: &str = "## HTML Document To Localize\n";
const DOCUMENT_END: &str = "\n\n## Localization Requirements";

/// Response generator: maps a unit's original text to its localized text
pub type UnitTranslator = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// Response generator for the whole request
pub type ResponseGenerator = Arc<dyn Fn(&ChatRequest) -> String + Send + Sync>;

/// Behavior mode for the mock provider
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MockBehavior {
    /// Always succeeds
    Working,
    /// Fails intermittently (every Nth request)
    Intermittent { fail_every: usize },
    /// Always fails with the given HTTP status
    Failing { status_code: u16 },
    /// Fails the first N requests with the given status, then works
    FailFirst { failures: usize, status_code: u16 },
    /// Returns text without any recoverable payload
    Garbage,
    /// Returns empty response
    Empty,
    /// Simulates slow response (for timeout testing)
    Slow { delay_ms: u64 },
}

/// Mock provider for testing localization behavior
pub struct MockProvider {
    /// Behavior mode
    behavior: MockBehavior,
    /// Request counter shared between clones
    request_count: Arc<AtomicUsize>,
    /// Models requested, in call order
    models_seen: Arc<Mutex<Vec<String>>>,
    /// Unit text transformation used by the working behavior
    translator: UnitTranslator,
    /// Custom response generator (optional)
    custom_response: Option<ResponseGenerator>,
    /// Errors returned for specific models
    model_errors: HashMap<String, ProviderError>,
    /// Prompt substrings that trigger a server error
    fail_when_contains: Vec<String>,
    /// Wrap generated payloads in a markdown fence
    fenced: bool,
}

impl std::fmt::Debug for MockProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockProvider")
            .field("behavior", &self.behavior)
            .field("request_count", &self.request_count())
            .field("model_errors", &self.model_errors)
            .field("fail_when_contains", &self.fail_when_contains)
            .field("fenced", &self.fenced)
            .finish()
    }
}

impl MockProvider {
    /// Create a new mock provider with the specified behavior
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            request_count: Arc::new(AtomicUsize::new(0)),
            models_seen: Arc::new(Mutex::new(Vec::new())),
            translator: Arc::new(|text: &str| format!("[LOCALIZED] {}", text)),
            custom_response: None,
            model_errors: HashMap::new(),
            fail_when_contains: Vec::new(),
            fenced: false,
        }
    }

    /// Create a working mock provider that always succeeds
    pub fn working() -> Self {
        Self::new(MockBehavior::Working)
    }

    /// Create an intermittently failing mock provider
    pub fn intermittent(fail_every: usize) -> Self {
        Self::new(MockBehavior::Intermittent { fail_every: fail_every.max(1) })
    }

    /// Create a failing mock provider that always errors
    pub fn failing(status_code: u16) -> Self {
        Self::new(MockBehavior::Failing { status_code })
    }

    /// Create a mock that fails a number of times before succeeding
    pub fn fail_first(failures: usize, status_code: u16) -> Self {
        Self::new(MockBehavior::FailFirst { failures, status_code })
    }

    /// Create a mock whose responses contain no payload
    pub fn garbage() -> Self {
        Self::new(MockBehavior::Garbage)
    }

    /// Create a mock that returns empty responses
    pub fn empty() -> Self {
        Self::new(MockBehavior::Empty)
    }

    /// Create a mock that sleeps before answering
    pub fn slow(delay_ms: u64) -> Self {
        Self::new(MockBehavior::Slow { delay_ms })
    }

    /// Localize units with a lookup table, falling back to the default echo
    pub fn with_translations(mut self, table: &[(&str, &str)]) -> Self {
        let table: HashMap<String, String> = table
            .iter()
            .map(|(from, to)| (from.to_string(), to.to_string()))
            .collect();
        self.translator = Arc::new(move |text: &str| {
            table
                .get(text)
                .cloned()
                .unwrap_or_else(|| format!("[LOCALIZED] {}", text))
        });
        self
    }

    /// Set a custom unit text transformation
    pub fn with_translator(mut self, translator: impl Fn(&str) -> String + Send + Sync + 'static) -> Self {
        self.translator = Arc::new(translator);
        self
    }

    /// Set a custom response generator
    pub fn with_custom_response(
        mut self,
        generator: impl Fn(&ChatRequest) -> String + Send + Sync + 'static,
    ) -> Self {
        self.custom_response = Some(Arc::new(generator));
        self
    }

    /// Return `error` whenever `model` is requested
    pub fn with_model_error(mut self, model: impl Into<String>, error: ProviderError) -> Self {
        self.model_errors.insert(model.into(), error);
        self
    }

    /// Fail with a 500 whenever the user prompt contains `needle`
    pub fn with_failure_on(mut self, needle: impl Into<String>) -> Self {
        self.fail_when_contains.push(needle.into());
        self
    }

    /// Wrap payloads in a ```json fence with a chatty lead-in
    pub fn fenced(mut self) -> Self {
        self.fenced = true;
        self
    }

    /// Number of requests received so far
    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::SeqCst)
    }

    /// Models requested so far, in call order
    pub fn models_seen(&self) -> Vec<String> {
        self.models_seen.lock().map(|seen| seen.clone()).unwrap_or_default()
    }

    /// Generate a unit mode answer for a rendered prompt
    pub fn generate_unit_response(prompt: &str, translate: &dyn Fn(&str) -> String) -> String {
        let items: Vec<serde_json::Value> = UNIT_PATTERN
            .captures_iter(prompt)
            .filter_map(|caps| {
                let id = caps.get(1)?.as_str();
                let raw = caps.get(2)?.as_str();
                let text: String = serde_json::from_str(&format!("\"{}\"", raw)).ok()?;
                Some(serde_json::json!({ "id": id, "localized": translate(&text) }))
            })
            .collect();
        serde_json::to_string(&items).unwrap_or_else(|_| "[]".to_string())
    }

    /// Echo the document embedded in a document mode prompt
    pub fn generate_document_response(prompt: &str) -> String {
        let start = prompt.find(DOCUMENT_START).map(|i| i + DOCUMENT_START.len());
        let end = prompt.find(DOCUMENT_END);
        match (start, end) {
            (Some(start), Some(end)) if start <= end => prompt[start..end].to_string(),
            _ => String::new(),
        }
    }

    fn generate(&self, request: &ChatRequest) -> String {
        if let Some(generator) = &self.custom_response {
            return generator(request);
        }

        let prompt = request.user_prompt();
        let payload = if prompt.contains(DOCUMENT_START) {
            Self::generate_document_response(prompt)
        } else {
            Self::generate_unit_response(prompt, self.translator.as_ref())
        };

        if self.fenced {
            format!("Here is the localized content:\n```json\n{}\n```", payload)
        } else {
            payload
        }
    }
}

impl Clone for MockProvider {
    fn clone(&self) -> Self {
        Self {
            behavior: self.behavior,
            request_count: Arc::clone(&self.request_count),
            models_seen: Arc::clone(&self.models_seen),
            translator: Arc::clone(&self.translator),
            custom_response: self.custom_response.clone(),
            model_errors: self.model_errors.clone(),
            fail_when_contains: self.fail_when_contains.clone(),
            fenced: self.fenced,
        }
    }
}

#[async_trait]
impl Provider for MockProvider {
    type Request = ChatRequest;
    type Response = ChatResponse;

    async fn complete(&self, request: Self::Request) -> Result<Self::Response, ProviderError> {
        let count = self.request_count.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut seen) = self.models_seen.lock() {
            seen.push(request.model.clone());
        }

        if let Some(error) = self.model_errors.get(&request.model) {
            return Err(error.clone());
        }
        if self
            .fail_when_contains
            .iter()
            .any(|needle| request.user_prompt().contains(needle.as_str()))
        {
            return Err(ProviderError::ApiError {
                status_code: 500,
                message: "Simulated failure for matching prompt".to_string(),
            });
        }

        match self.behavior {
            MockBehavior::Working => {}
            MockBehavior::Intermittent { fail_every } => {
                if count % fail_every == fail_every - 1 {
                    return Err(ProviderError::ApiError {
                        message: format!("Simulated intermittent failure (request #{})", count + 1),
                        status_code: 503,
                    });
                }
            }
            MockBehavior::Failing { status_code } => {
                return Err(ProviderError::from_status(status_code, "Simulated provider failure"));
            }
            MockBehavior::FailFirst { failures, status_code } => {
                if count < failures {
                    return Err(ProviderError::from_status(
                        status_code,
                        format!("Simulated failure {} of {}", count + 1, failures),
                    ));
                }
            }
            MockBehavior::Garbage => {
                return Ok(ChatResponse::from_text(request.model, "I cannot help with that request."));
            }
            MockBehavior::Empty => return Ok(ChatResponse::from_text(request.model, "")),
            MockBehavior::Slow { delay_ms } => {
                tokio::time::sleep(tokio::time::Duration::from_millis(delay_ms)).await;
            }
        }

        let text = self.generate(&request);
        Ok(ChatResponse::from_text(request.model, text))
    }

    async fn test_connection(&self) -> Result<(), ProviderError> {
        match self.behavior {
            MockBehavior::Failing { status_code } => {
                Err(ProviderError::from_status(status_code, "Simulated provider failure"))
            }
            _ => Ok(()),
        }
    }

    fn extract_text(response: &Self::Response) -> String {
        response.text()
    }
}
