//! Error types for reverse-vector.

/// Alias for Results returning [`SearchError`].
pub type Result<T> = std::result::Result<T, SearchError>;

/// Top-level error type for reverse-vector.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Embedder error: {0}")]
    Embedder(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// LLM-specific errors.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("Rate limited")]
    RateLimit,

    #[error("Empty response from LLM")]
    EmptyResponse,

    #[error("Authentication failed")]
    Authentication,

    #[error("API error: HTTP {status} — {message}")]
    Api { status: u16, message: String },
}
