use thiserror::Error;
use uuid::Uuid;

/// Columns the `chats` table must have
pub const CHATS_SCHEMA: &str =
    "id (uuid), title (text), messages (jsonb), created_at (timestamptz), updated_at (timestamptz)";

#[derive(Error, Debug)]
pub enum PersistError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Store error ({status}): {message}")]
    Api {
        status: u16,
        code: Option<String>,
        message: String,
    },

    #[error("Table '{0}' was not found. Create it with columns: {schema}", schema = CHATS_SCHEMA)]
    TableMissing(String),

    #[error("Chat not found: {0}")]
    ChatNotFound(Uuid),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Store not configured: {0}")]
    Config(String),
}

impl PersistError {
    pub fn is_table_missing(&self) -> bool {
        matches!(self, Self::TableMissing(_))
    }
}

pub type Result<T> = std::result::Result<T, PersistError>;
