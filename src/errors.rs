/*!
 * Error types for the page-localizer library.
 *
 * This module contains custom error types for the different layers of the
 * localization engine, using the thiserror crate for ergonomic error definitions.
 */

use thiserror::Error;

/// Errors that can occur when talking to a generation backend
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProviderError {
    /// Error when making an API request fails
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error when parsing an API response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String,
    },

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Error related to rate limiting
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// Error with authentication
    #[error("Authentication error: {0}")]
    AuthenticationError(String),

    /// The requested model does not exist on the backend
    #[error("Model not found: {0}")]
    ModelNotFound(String),

    /// The backend rejected the request payload
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// A single attempt exceeded its deadline
    #[error("Request timeout after {seconds} seconds")]
    Timeout {
        /// Deadline that was exceeded
        seconds: u64,
    },
}

impl ProviderError {
    /// Map an HTTP status and response body onto a typed error
    pub fn from_status(status_code: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status_code {
            400 => Self::BadRequest(message),
            401 | 403 => Self::AuthenticationError(message),
            404 => Self::ModelNotFound(message),
            408 => Self::Timeout { seconds: 0 },
            429 => Self::RateLimitExceeded(message),
            _ => Self::ApiError { status_code, message },
        }
    }

    /// HTTP status equivalent of this error, when there is one
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::ApiError { status_code, .. } => Some(*status_code),
            Self::RateLimitExceeded(_) => Some(429),
            Self::AuthenticationError(_) => Some(401),
            Self::ModelNotFound(_) => Some(404),
            Self::BadRequest(_) => Some(400),
            Self::Timeout { .. } => Some(408),
            _ => None,
        }
    }

    /// Whether the same request may succeed if sent again after a delay.
    ///
    /// Rate limits, server errors, timeouts and dropped connections are
    /// transient; every other 4xx is not.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::RateLimitExceeded(_) | Self::Timeout { .. } | Self::ConnectionError(_) => true,
            Self::ApiError { status_code, .. } => (500..600).contains(status_code),
            _ => false,
        }
    }

    /// Whether the client should move on to the next candidate model
    pub fn allows_model_fallback(&self) -> bool {
        matches!(
            self,
            Self::ModelNotFound(_) | Self::BadRequest(_) | Self::RateLimitExceeded(_)
        )
    }
}

/// Errors of the localization engine itself
#[derive(Error, Debug)]
pub enum LocalizationError {
    /// Extraction produced no localizable text
    #[error("No localizable text found in document")]
    ExtractionEmpty,

    /// Every model and every retry was exhausted
    #[error("Generation failed after {attempts} model attempt(s): {source}")]
    GenerationFailed {
        /// Number of models tried
        attempts: usize,
        /// Last underlying backend error
        #[source]
        source: ProviderError,
    },

    /// No parsing strategy recovered a payload
    #[error(
        "Could not parse model response ({response_len} chars); tried strategies: {}",
        strategies.join(", ")
    )]
    ParseFailed {
        /// Names of the strategies that were attempted
        strategies: Vec<String>,
        /// Length of the raw response in characters
        response_len: usize,
    },

    /// A document-mode response failed structural validation
    #[error("Invalid document structure: {0}")]
    InvalidDocumentStructure(String),

    /// Document mode refuses oversized documents
    #[error("Document too large for document mode: {size_kb:.1}KB (max {max_kb}KB)")]
    DocumentTooLarge {
        /// Serialized document size
        size_kb: f64,
        /// Configured limit
        max_kb: usize,
    },

    /// Every chunk of the run failed
    #[error("All {chunks} chunk(s) failed to localize")]
    AllChunksFailed {
        /// Number of chunks in the run
        chunks: usize,
    },

    /// The run was cancelled before any chunk completed
    #[error("Localization run was cancelled")]
    Cancelled,
}

impl LocalizationError {
    /// Whether the orchestrator may downgrade this error to unresolved units
    pub fn is_chunk_recoverable(&self) -> bool {
        matches!(self, Self::GenerationFailed { .. } | Self::ParseFailed { .. })
    }
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Invalid or unreadable configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Error from a provider
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Error from the localization engine
    #[error("Localization error: {0}")]
    Localization(#[from] LocalizationError),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}
