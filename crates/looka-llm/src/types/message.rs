use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::content::{Content, ContentPart};

/// Longest document excerpt sent upstream, in characters
pub const DOCUMENT_EXCERPT_CHARS: usize = 5000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }

    /// Display name used in transcripts and message footers
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::User => "You",
            Self::Assistant => "Looka",
        }
    }
}

/// Message as sent on the wire (`{role, content}`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: Content,
}

impl Message {
    pub fn user(content: impl Into<Content>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<Content>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// File carried alongside a user message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Attachment {
    Image {
        name: String,
        #[serde(rename = "mimeType")]
        mime_type: String,
        /// `data:<mime>;base64,...` URL
        data: String,
    },

    Document {
        name: String,
        #[serde(rename = "mimeType")]
        mime_type: String,
        content: String,
    },

    File {
        name: String,
        #[serde(rename = "mimeType")]
        mime_type: String,
        size: u64,
    },
}

impl Attachment {
    /// Document attachment, truncated to [`DOCUMENT_EXCERPT_CHARS`]
    pub fn document(
        name: impl Into<String>,
        mime_type: impl Into<String>,
        content: &str,
    ) -> Self {
        Self::Document {
            name: name.into(),
            mime_type: mime_type.into(),
            content: content.chars().take(DOCUMENT_EXCERPT_CHARS).collect(),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Image { name, .. } | Self::Document { name, .. } | Self::File { name, .. } => {
                name
            }
        }
    }

    /// One-line listing appended to the user's text
    pub fn listing(&self) -> String {
        match self {
            Self::Image { name, .. } => format!("📷 {}", name),
            Self::Document { name, .. } => format!("📄 {}", name),
            Self::File { name, .. } => format!("📎 {}", name),
        }
    }
}

/// One entry of the conversation history
///
/// Immutable once appended, except for the in-progress assistant message
/// which only ever grows by [`ChatMessage::append_delta`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
    #[serde(rename = "ts", with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "files", default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Attachment>,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: Utc::now(),
            attachments: Vec::new(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    pub fn with_attachments(mut self, attachments: Vec<Attachment>) -> Self {
        self.attachments = attachments;
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn append_delta(&mut self, delta: &str) {
        self.content.push_str(delta);
    }

    /// Convert to wire form
    ///
    /// Without attachments the content is sent as plain text. With attachments
    /// it becomes a part list: the text (if any), one part per image, and each
    /// document folded into the first text part.
    pub fn to_wire(&self) -> Message {
        if self.attachments.is_empty() {
            return Message {
                role: self.role,
                content: Content::Text(self.content.clone()),
            };
        }

        let mut parts: Vec<ContentPart> = Vec::new();
        if !self.content.trim().is_empty() {
            parts.push(ContentPart::text(self.content.clone()));
        }

        for attachment in &self.attachments {
            match attachment {
                Attachment::Image { data, .. } => parts.push(ContentPart::image(data.clone())),
                Attachment::Document { name, content, .. } if !content.is_empty() => {
                    match parts.first_mut() {
                        Some(ContentPart::Text { text }) => {
                            text.push_str(&format!("\n\nDocument \"{}\":\n{}", name, content));
                        }
                        _ => parts.push(ContentPart::text(format!(
                            "Document \"{}\":\n{}",
                            name, content
                        ))),
                    }
                }
                _ => {}
            }
        }

        Message {
            role: self.role,
            content: Content::Parts(parts),
        }
    }
}
