use chrono::Duration;
use std::sync::Arc;

use crate::dbs::{MemoryStore, SupabaseConfig, SupabaseStore};
use crate::error::{PersistError, Result};
use crate::history::{ChatHistory, DEFAULT_RETENTION_DAYS};
use crate::store::{ChatStore, DEFAULT_LIST_LIMIT};

pub struct ChatHistoryBuilder {
    supabase: Option<SupabaseConfig>,
    store: Option<Arc<dyn ChatStore>>,
    list_limit: usize,
    retention_days: i64,
}

impl ChatHistoryBuilder {
    pub fn new() -> Self {
        Self {
            supabase: None,
            store: None,
            list_limit: DEFAULT_LIST_LIMIT,
            retention_days: DEFAULT_RETENTION_DAYS,
        }
    }

    pub fn supabase(mut self, config: SupabaseConfig) -> Self {
        self.supabase = Some(config);
        self
    }

    /// Use an existing store; takes precedence over `supabase`
    pub fn store(mut self, store: Arc<dyn ChatStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Keep history in process memory only
    pub fn in_memory(self) -> Self {
        self.store(Arc::new(MemoryStore::new()))
    }

    pub fn list_limit(mut self, limit: usize) -> Self {
        self.list_limit = limit;
        self
    }

    pub fn retention_days(mut self, days: i64) -> Self {
        self.retention_days = days;
        self
    }

    pub fn build(self) -> Result<ChatHistory> {
        let store: Arc<dyn ChatStore> = match (self.store, self.supabase) {
            (Some(store), _) => store,
            (None, Some(config)) => Arc::new(SupabaseStore::new(&config)?),
            (None, None) => {
                return Err(PersistError::Config(
                    "a Supabase config or a store is required".to_string(),
                ))
            }
        };

        Ok(ChatHistory::new(store)
            .with_list_limit(self.list_limit)
            .with_retention(Duration::days(self.retention_days)))
    }
}

impl Default for ChatHistoryBuilder {
    fn default() -> Self {
        Self::new()
    }
}
