use thiserror::Error;

/// Pretty-print failure
///
/// Never reaches the caller of [`crate::Formatter`]: any error here means the
/// block is shown with its raw source instead.
#[derive(Debug, Error)]
pub enum FormatError {
    /// No formatter handles this language (or its binary is not installed)
    #[error("No formatter available for {0}")]
    Unavailable(String),

    #[error("{formatter} failed: {message}")]
    Failed { formatter: String, message: String },

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl FormatError {
    pub fn failed(formatter: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Failed {
            formatter: formatter.into(),
            message: message.into(),
        }
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

pub type Result<T> = std::result::Result<T, FormatError>;
