use thiserror::Error;

#[derive(Debug, Error)]
pub enum LlmError {
    /// Raised before any request is built; nothing was sent
    #[error("No API key configured for {0}. Set one or route requests through the proxy")]
    MissingCredential(String),

    #[error("Network error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Upstream answered with an error; `message` is what the user sees
    #[error("{message}")]
    Api { status: u16, message: String },

    #[error("Invalid header value: {0}")]
    InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl LlmError {
    pub fn is_missing_credential(&self) -> bool {
        matches!(self, Self::MissingCredential(_))
    }
}

pub type Result<T> = std::result::Result<T, LlmError>;
