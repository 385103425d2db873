use chrono::{DateTime, Utc};
use looka_llm::{ChatMessage, Role};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const TITLE_CHARS: usize = 50;
pub const DEFAULT_TITLE: &str = "New Chat";

/// One row of the `chats` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRecord {
    pub id: Uuid,
    pub title: String,
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insert payload; the store assigns `id` and `created_at`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewChat {
    pub title: String,
    pub messages: Vec<ChatMessage>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatUpdate {
    pub title: String,
    pub messages: Vec<ChatMessage>,
    pub updated_at: DateTime<Utc>,
}

impl NewChat {
    pub fn from_messages(messages: &[ChatMessage], now: DateTime<Utc>) -> Self {
        Self {
            title: title_for(messages),
            messages: messages.to_vec(),
            updated_at: now,
        }
    }
}

impl ChatUpdate {
    pub fn from_messages(messages: &[ChatMessage], now: DateTime<Utc>) -> Self {
        Self {
            title: title_for(messages),
            messages: messages.to_vec(),
            updated_at: now,
        }
    }
}

/// First user message, cut to [`TITLE_CHARS`] characters with `...` when longer
pub fn title_for(messages: &[ChatMessage]) -> String {
    let Some(first) = messages.iter().find(|m| m.role == Role::User) else {
        return DEFAULT_TITLE.to_string();
    };

    let mut title: String = first.content.chars().take(TITLE_CHARS).collect();
    if first.content.chars().count() > TITLE_CHARS {
        title.push_str("...");
    }
    title
}
