use std::time::Duration;
use thiserror::Error;

use edurag_vector::StoreError;

/// Failures talking to the generative model.
#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("no API key configured (set generation.api_key or GEMINI_API_KEY)")]
    MissingCredential,

    #[error("API key rejected: {0}")]
    InvalidCredential(String),

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("model endpoint returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("unexpected response: {0}")]
    Malformed(String),
}

impl GenerateError {
    /// Worth another attempt: timeouts, connection trouble, 429 and 5xx.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Timeout(_) | Self::Transport(_) => true,
            Self::Status { status, .. } => *status == 429 || (500..600).contains(status),
            _ => false,
        }
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::MissingCredential | Self::InvalidCredential(_))
    }
}

#[derive(Debug, Error)]
pub enum AnswerError {
    #[error("{0}")]
    InvalidRequest(String),

    #[error("No data found for subject: {0}")]
    NotFound(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("answer generation failed: {0}")]
    Upstream(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("embedding failed: {0}")]
    Embedding(#[from] anyhow::Error),
}

impl From<GenerateError> for AnswerError {
    fn from(e: GenerateError) -> Self {
        if e.is_configuration() {
            Self::Config(e.to_string())
        } else {
            Self::Upstream(e.to_string())
        }
    }
}
