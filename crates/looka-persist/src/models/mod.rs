mod chat;

pub use chat::{title_for, ChatRecord, ChatUpdate, NewChat, DEFAULT_TITLE, TITLE_CHARS};
