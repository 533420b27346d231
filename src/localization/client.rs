/*!
 * Generation client with model fallback and retry.
 *
 * Each candidate model gets its own retry loop. Transient failures (429,
 * 5xx, timeouts) are retried with exponential backoff; once a model gives
 * up with "not found", "bad request" or "rate limited" the next candidate
 * is tried. Any other failure, authentication included, ends the call.
 */

use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};

use crate::app_config::GenerationConfig;
use crate::errors::{LocalizationError, ProviderError};
use crate::providers::{ChatProvider, ChatRequest};

use super::retry::{RetryPolicy, retry_with_backoff};

/// Per-call generation parameters
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationOptions {
    /// Preferred model, tried before the configured candidates
    pub model: Option<String>,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            model: None,
            max_tokens: 16000,
            temperature: 0.3,
        }
    }
}

/// Successful generation with the model that produced it
#[derive(Debug, Clone, PartialEq)]
pub struct Generation {
    /// Trimmed response text
    pub text: String,
    /// Model that answered
    pub model: String,
    /// Models tried, in order, including the one that answered
    pub models_tried: Vec<String>,
}

/// Sends prompts to a chat provider
#[derive(Debug)]
pub struct GenerationClient<P> {
    provider: Arc<P>,
    models: Vec<String>,
    policy: RetryPolicy,
    timeout: Duration,
}

impl<P> Clone for GenerationClient<P> {
    fn clone(&self) -> Self {
        Self {
            provider: Arc::clone(&self.provider),
            models: self.models.clone(),
            policy: self.policy.clone(),
            timeout: self.timeout,
        }
    }
}

impl<P: ChatProvider> GenerationClient<P> {
    /// Create a client with default retry policy and a 120 second attempt timeout
    pub fn new(provider: P, models: Vec<String>) -> Self {
        Self {
            provider: Arc::new(provider),
            models,
            policy: RetryPolicy::default(),
            timeout: Duration::from_secs(120),
        }
    }

    /// Create a client from the generation section of the config
    pub fn from_config(provider: P, config: &GenerationConfig) -> Self {
        Self::new(provider, config.models.clone())
            .with_retry_policy(RetryPolicy::from(&config.retry))
            .with_timeout(Duration::from_secs(config.timeout_secs))
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn models(&self) -> &[String] {
        &self.models
    }

    /// Preferred model first, then the configured candidates, without duplicates
    pub fn candidate_models(&self, preferred: Option<&str>) -> Vec<String> {
        let mut candidates: Vec<String> = Vec::with_capacity(self.models.len() + 1);
        let preferred = preferred.map(str::trim).filter(|m| !m.is_empty());
        for model in preferred.into_iter().chain(self.models.iter().map(String::as_str)) {
            if !candidates.iter().any(|c| c == model) {
                candidates.push(model.to_string());
            }
        }
        candidates
    }

    /// Generate text for a prompt, returning only the trimmed text
    pub async fn generate(
        &self,
        prompt: &str,
        system: &str,
        options: &GenerationOptions,
    ) -> Result<String, LocalizationError> {
        self.generate_with_model(prompt, system, options)
            .await
            .map(|generation| generation.text)
    }

    /// Generate text for a prompt, reporting which model answered
    pub async fn generate_with_model(
        &self,
        prompt: &str,
        system: &str,
        options: &GenerationOptions,
    ) -> Result<Generation, LocalizationError> {
        let candidates = self.candidate_models(options.model.as_deref());
        let mut models_tried = Vec::with_capacity(candidates.len());
        let mut last_error: Option<ProviderError> = None;

        for model in candidates {
            models_tried.push(model.clone());
            debug!("Generating with model {} ({} chars prompt)", model, prompt.len());

            let model_ref = model.as_str();
            let result = retry_with_backoff(&self.policy, model_ref, move |_| {
                self.attempt(model_ref, prompt, system, options)
            })
            .await;

            match result {
                Ok(text) => {
                    info!("Model {} answered ({} chars)", model, text.len());
                    return Ok(Generation { text, model, models_tried });
                }
                Err(error) if error.allows_model_fallback() => {
                    warn!("Model {} unavailable ({}), trying next model", model, error);
                    last_error = Some(error);
                }
                Err(error) => {
                    return Err(LocalizationError::GenerationFailed {
                        attempts: models_tried.len(),
                        source: error,
                    });
                }
            }
        }

        Err(LocalizationError::GenerationFailed {
            attempts: models_tried.len(),
            source: last_error
                .unwrap_or_else(|| ProviderError::RequestFailed("No candidate models configured".to_string())),
        })
    }

    /// Check the provider and run a tiny completion against the first candidate
    pub async fn test_connection(&self) -> Result<String, LocalizationError> {
        let model = self
            .models
            .first()
            .cloned()
            .ok_or(LocalizationError::GenerationFailed {
                attempts: 0,
                source: ProviderError::RequestFailed("No candidate models configured".to_string()),
            })?;

        let failed = |error: ProviderError| LocalizationError::GenerationFailed { attempts: 1, source: error };
        self.provider.test_connection().await.map_err(failed)?;

        let options = GenerationOptions {
            model: None,
            max_tokens: 10,
            temperature: 0.0,
        };
        self.attempt(&model, "Reply with the single word OK.", "", &options)
            .await
            .map_err(failed)?;
        Ok(model)
    }

    /// One request against one model, bounded by the attempt timeout
    async fn attempt(
        &self,
        model: &str,
        prompt: &str,
        system: &str,
        options: &GenerationOptions,
    ) -> Result<String, ProviderError> {
        let mut request = ChatRequest::new(model);
        if !system.is_empty() {
            request = request.system(system);
        }
        let request = request
            .add_message("user", prompt)
            .temperature(options.temperature)
            .max_tokens(options.max_tokens);

        match tokio::time::timeout(self.timeout, self.provider.complete(request)).await {
            Ok(Ok(response)) => Ok(P::extract_text(&response).trim().to_string()),
            Ok(Err(error)) => Err(error),
            Err(_) => Err(ProviderError::Timeout { seconds: self.timeout.as_secs() }),
        }
    }
}
