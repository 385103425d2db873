use chrono::{DateTime, Duration, Utc};
use looka_llm::ChatMessage;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::Result;
use crate::models::{ChatRecord, ChatUpdate, NewChat};
use crate::store::{ChatStore, DEFAULT_LIST_LIMIT};

pub const DEFAULT_RETENTION_DAYS: i64 = 7;

/// Tracks which stored chat the live conversation belongs to
///
/// The first save of a conversation creates a row and adopts its id; later
/// saves update that row.
pub struct ChatHistory {
    store: Arc<dyn ChatStore>,
    current: Option<Uuid>,
    list_limit: usize,
    retention: Duration,
}

impl ChatHistory {
    pub fn new(store: Arc<dyn ChatStore>) -> Self {
        Self {
            store,
            current: None,
            list_limit: DEFAULT_LIST_LIMIT,
            retention: Duration::days(DEFAULT_RETENTION_DAYS),
        }
    }

    pub fn with_list_limit(mut self, limit: usize) -> Self {
        self.list_limit = limit;
        self
    }

    pub fn with_retention(mut self, retention: Duration) -> Self {
        self.retention = retention;
        self
    }

    pub fn current(&self) -> Option<Uuid> {
        self.current
    }

    pub fn store(&self) -> &Arc<dyn ChatStore> {
        &self.store
    }

    /// Save the conversation; a lone greeting is never stored
    ///
    /// Returns the stored record, or `None` when nothing was written.
    pub async fn save(
        &mut self,
        messages: &[ChatMessage],
        now: DateTime<Utc>,
    ) -> Result<Option<ChatRecord>> {
        if messages.len() <= 1 {
            return Ok(None);
        }

        let record = match self.current {
            Some(id) => {
                self.store
                    .update(id, ChatUpdate::from_messages(messages, now))
                    .await?
            }
            None => {
                let record = self
                    .store
                    .create(NewChat::from_messages(messages, now))
                    .await?;
                self.current = Some(record.id);
                record
            }
        };

        tracing::debug!(chat_id = %record.id, messages = messages.len(), "Chat saved");
        Ok(Some(record))
    }

    /// Load a stored chat and make it current
    pub async fn open(&mut self, id: Uuid) -> Result<Option<ChatRecord>> {
        let record = self.store.get(id).await?;
        if record.is_some() {
            self.current = Some(id);
        }
        Ok(record)
    }

    /// Detach from the current chat; the next save creates a new row
    pub fn new_chat(&mut self) {
        self.current = None;
    }

    /// Returns true when the deleted chat was the current one
    pub async fn delete(&mut self, id: Uuid) -> Result<bool> {
        self.store.delete(id).await?;

        if self.current == Some(id) {
            self.current = None;
            return Ok(true);
        }
        Ok(false)
    }

    pub async fn list_recent(&self) -> Result<Vec<ChatRecord>> {
        self.store.list_recent(self.list_limit).await
    }

    /// Remove chats created before the retention window
    pub async fn cleanup(&mut self, now: DateTime<Utc>) -> Result<usize> {
        let removed = self.store.delete_created_before(now - self.retention).await?;

        if let Some(id) = self.current {
            if self.store.get(id).await?.is_none() {
                self.current = None;
            }
        }
        Ok(removed)
    }
}

/// Relative age for history listings
pub fn time_ago(date: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let elapsed = now - date;

    if elapsed < Duration::minutes(1) {
        "Just now".to_string()
    } else if elapsed < Duration::hours(1) {
        format!("{}m ago", elapsed.num_minutes())
    } else if elapsed < Duration::days(1) {
        format!("{}h ago", elapsed.num_hours())
    } else if elapsed < Duration::days(7) {
        format!("{}d ago", elapsed.num_days())
    } else {
        date.format("%Y-%m-%d").to_string()
    }
}
