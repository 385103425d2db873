pub mod builder;
pub mod dbs;
pub mod error;
pub mod history;
pub mod models;
pub mod store;

pub use builder::ChatHistoryBuilder;
pub use dbs::{MemoryStore, SupabaseConfig, SupabaseStore};
pub use error::{PersistError, Result, CHATS_SCHEMA};
pub use history::{time_ago, ChatHistory, DEFAULT_RETENTION_DAYS};
pub use models::{title_for, ChatRecord, ChatUpdate, NewChat, DEFAULT_TITLE, TITLE_CHARS};
pub use store::{ChatStore, DEFAULT_LIST_LIMIT};
