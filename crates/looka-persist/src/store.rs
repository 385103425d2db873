use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::Result;
use crate::models::{ChatRecord, ChatUpdate, NewChat};

pub const DEFAULT_LIST_LIMIT: usize = 50;

/// CRUD over chat records
///
/// Implementations own the storage details; callers only see records.
#[async_trait]
pub trait ChatStore: Send + Sync {
    /// Most recently updated first
    async fn list_recent(&self, limit: usize) -> Result<Vec<ChatRecord>>;

    async fn get(&self, id: Uuid) -> Result<Option<ChatRecord>>;

    async fn create(&self, chat: NewChat) -> Result<ChatRecord>;

    /// Fails with `ChatNotFound` when no row has this id
    async fn update(&self, id: Uuid, update: ChatUpdate) -> Result<ChatRecord>;

    /// Deleting a missing chat is not an error
    async fn delete(&self, id: Uuid) -> Result<()>;

    /// Returns how many chats were removed
    async fn delete_created_before(&self, cutoff: DateTime<Utc>) -> Result<usize>;
}
