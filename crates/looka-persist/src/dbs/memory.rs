use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{PersistError, Result};
use crate::models::{ChatRecord, ChatUpdate, NewChat};
use crate::store::ChatStore;

/// Process-local store with the same semantics as the remote one
#[derive(Debug, Default)]
pub struct MemoryStore {
    chats: RwLock<HashMap<Uuid, ChatRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed with existing records (ids and timestamps kept as given)
    pub fn with_records(records: impl IntoIterator<Item = ChatRecord>) -> Self {
        Self {
            chats: RwLock::new(records.into_iter().map(|r| (r.id, r)).collect()),
        }
    }

    pub async fn len(&self) -> usize {
        self.chats.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.chats.read().await.is_empty()
    }
}

#[async_trait]
impl ChatStore for MemoryStore {
    async fn list_recent(&self, limit: usize) -> Result<Vec<ChatRecord>> {
        let chats = self.chats.read().await;
        let mut records: Vec<ChatRecord> = chats.values().cloned().collect();
        records.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        records.truncate(limit);
        Ok(records)
    }

    async fn get(&self, id: Uuid) -> Result<Option<ChatRecord>> {
        Ok(self.chats.read().await.get(&id).cloned())
    }

    async fn create(&self, chat: NewChat) -> Result<ChatRecord> {
        let record = ChatRecord {
            id: Uuid::new_v4(),
            title: chat.title,
            messages: chat.messages,
            created_at: Utc::now(),
            updated_at: chat.updated_at,
        };

        self.chats.write().await.insert(record.id, record.clone());
        tracing::debug!(chat_id = %record.id, "Chat created in memory");
        Ok(record)
    }

    async fn update(&self, id: Uuid, update: ChatUpdate) -> Result<ChatRecord> {
        let mut chats = self.chats.write().await;
        let record = chats.get_mut(&id).ok_or(PersistError::ChatNotFound(id))?;

        record.title = update.title;
        record.messages = update.messages;
        record.updated_at = update.updated_at;
        Ok(record.clone())
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        self.chats.write().await.remove(&id);
        Ok(())
    }

    async fn delete_created_before(&self, cutoff: DateTime<Utc>) -> Result<usize> {
        let mut chats = self.chats.write().await;
        let before = chats.len();
        chats.retain(|_, record| record.created_at >= cutoff);
        Ok(before - chats.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use looka_llm::ChatMessage;

    fn record(title: &str, created_days_ago: i64, updated_mins_ago: i64) -> ChatRecord {
        let now = Utc::now();
        ChatRecord {
            id: Uuid::new_v4(),
            title: title.to_string(),
            messages: vec![ChatMessage::user(title)],
            created_at: now - Duration::days(created_days_ago),
            updated_at: now - Duration::minutes(updated_mins_ago),
        }
    }

    #[tokio::test]
    async fn test_list_recent_orders_and_limits() {
        let store = MemoryStore::with_records([
            record("old", 1, 30),
            record("newest", 1, 1),
            record("middle", 1, 10),
        ]);

        let titles: Vec<String> = store
            .list_recent(2)
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.title)
            .collect();

        assert_eq!(titles, vec!["newest", "middle"]);
    }

    #[tokio::test]
    async fn test_update_missing_chat() {
        let store = MemoryStore::new();
        let id = Uuid::new_v4();

        let err = store
            .update(id, ChatUpdate::from_messages(&[], Utc::now()))
            .await
            .unwrap_err();

        assert!(matches!(err, PersistError::ChatNotFound(missing) if missing == id));
    }

    #[tokio::test]
    async fn test_delete_created_before() {
        let store = MemoryStore::with_records([record("stale", 9, 0), record("fresh", 2, 0)]);

        let removed = store
            .delete_created_before(Utc::now() - Duration::days(7))
            .await
            .unwrap();

        assert_eq!(removed, 1);
        assert_eq!(store.len().await, 1);
    }
}
