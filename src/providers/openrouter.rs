use async_trait::async_trait;
use log::{debug, error};
use reqwest::Client;

use crate::errors::ProviderError;
use crate::providers::{ChatRequest, ChatResponse, Provider};

/// Client for OpenAI-compatible chat-completion gateways such as OpenRouter
#[derive(Debug)]
pub struct OpenRouter {
    /// HTTP client for API requests
    client: Client,
    /// API key for authentication
    api_key: String,
    /// Full chat-completions URL
    endpoint: String,
    /// Value of the `HTTP-Referer` header
    referer: String,
    /// Value of the `X-Title` header
    app_title: String,
}

impl OpenRouter {
    /// Create a new client
    pub fn new(api_key: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            client: Client::builder().build().unwrap_or_default(),
            api_key: api_key.into(),
            endpoint: endpoint.into(),
            referer: "http://localhost".to_string(),
            app_title: "Page Variant Generator".to_string(),
        }
    }

    /// Set the attribution headers sent with every request
    pub fn with_attribution(mut self, referer: impl Into<String>, app_title: impl Into<String>) -> Self {
        self.referer = referer.into();
        self.app_title = app_title.into();
        self
    }

    /// Models listing URL next to the completions endpoint
    fn models_url(&self) -> String {
        let base = self.endpoint.trim_end_matches('/');
        let base = base.strip_suffix("/chat/completions").unwrap_or(base);
        format!("{}/models", base)
    }

    fn map_transport_error(error: reqwest::Error) -> ProviderError {
        if error.is_timeout() {
            ProviderError::Timeout { seconds: 0 }
        } else if error.is_connect() {
            ProviderError::ConnectionError(error.to_string())
        } else {
            ProviderError::RequestFailed(error.to_string())
        }
    }
}

#[async_trait]
impl Provider for OpenRouter {
    type Request = ChatRequest;
    type Response = ChatResponse;

    async fn complete(&self, request: Self::Request) -> Result<Self::Response, ProviderError> {
        debug!("Sending chat completion request to {} with model {}", self.endpoint, request.model);

        let response = self
            .client
            .post(&self.endpoint)
            .header("Content-Type", "application/json")
            .bearer_auth(&self.api_key)
            .header("HTTP-Referer", &self.referer)
            .header("X-Title", &self.app_title)
            .json(&request)
            .send()
            .await
            .map_err(Self::map_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to get error response text".to_string());
            error!("Chat API error ({}) for model {}: {}", status, request.model, error_text);
            return Err(ProviderError::from_status(status.as_u16(), error_text));
        }

        let chat_response = response
            .json::<ChatResponse>()
            .await
            .map_err(|e| ProviderError::ParseError(e.to_string()))?;

        if let Some(embedded) = &chat_response.error {
            return Err(ProviderError::from_status(
                embedded.code.unwrap_or(500),
                embedded.message.clone(),
            ));
        }
        if chat_response.choices.is_empty() {
            return Err(ProviderError::ParseError("Response contained no choices".to_string()));
        }

        Ok(chat_response)
    }

    async fn test_connection(&self) -> Result<(), ProviderError> {
        let response = self
            .client
            .get(self.models_url())
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(Self::map_transport_error)?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            let error_text = response.text().await.unwrap_or_default();
            Err(ProviderError::from_status(status.as_u16(), error_text))
        }
    }

    fn extract_text(response: &Self::Response) -> String {
        response.text()
    }
}
