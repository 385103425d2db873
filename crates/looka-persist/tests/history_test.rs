use chrono::{Duration, Utc};
use looka_llm::ChatMessage;
use looka_persist::{
    ChatHistory, ChatHistoryBuilder, ChatRecord, ChatStore, MemoryStore, PersistError,
    DEFAULT_TITLE,
};
use std::sync::Arc;
use uuid::Uuid;

fn greeting() -> ChatMessage {
    ChatMessage::assistant("Hi, ask me anything")
}

fn history() -> (ChatHistory, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    (ChatHistory::new(store.clone()), store)
}

#[tokio::test]
async fn test_greeting_only_is_not_saved() {
    let (mut history, store) = history();

    let saved = history.save(&[greeting()], Utc::now()).await.unwrap();

    assert!(saved.is_none());
    assert!(store.is_empty().await);
    assert_eq!(history.current(), None);
}

#[tokio::test]
async fn test_first_save_creates_then_updates() {
    let (mut history, store) = history();
    let mut messages = vec![greeting(), ChatMessage::user("What is Rust?")];

    let created = history.save(&messages, Utc::now()).await.unwrap().unwrap();
    assert_eq!(history.current(), Some(created.id));
    assert_eq!(created.title, "What is Rust?");

    messages.push(ChatMessage::assistant("A systems language."));
    let updated = history.save(&messages, Utc::now()).await.unwrap().unwrap();

    assert_eq!(updated.id, created.id);
    assert_eq!(updated.messages.len(), 3);
    assert_eq!(store.len().await, 1);
}

#[tokio::test]
async fn test_new_chat_starts_a_new_row() {
    let (mut history, store) = history();
    let messages = vec![greeting(), ChatMessage::user("first")];

    history.save(&messages, Utc::now()).await.unwrap();
    history.new_chat();
    history
        .save(&[greeting(), ChatMessage::user("second")], Utc::now())
        .await
        .unwrap();

    assert_eq!(store.len().await, 2);
    let titles: Vec<String> = history
        .list_recent()
        .await
        .unwrap()
        .into_iter()
        .map(|r| r.title)
        .collect();
    assert!(titles.contains(&"first".to_string()));
    assert!(titles.contains(&"second".to_string()));
}

#[tokio::test]
async fn test_open_and_delete_current() {
    let (mut history, _store) = history();
    let record = history
        .save(&[greeting(), ChatMessage::user("keep me")], Utc::now())
        .await
        .unwrap()
        .unwrap();
    history.new_chat();

    let opened = history.open(record.id).await.unwrap().unwrap();
    assert_eq!(opened.title, "keep me");
    assert_eq!(history.current(), Some(record.id));

    assert!(history.delete(record.id).await.unwrap());
    assert_eq!(history.current(), None);
    assert!(history.open(record.id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_cleanup_drops_old_chats() {
    let now = Utc::now();
    let stale = ChatRecord {
        id: Uuid::new_v4(),
        title: DEFAULT_TITLE.to_string(),
        messages: Vec::new(),
        created_at: now - Duration::days(8),
        updated_at: now - Duration::days(8),
    };
    let stale_id = stale.id;
    let store = Arc::new(MemoryStore::with_records([stale]));
    let mut history = ChatHistory::new(store.clone());
    history.open(stale_id).await.unwrap();

    let removed = history.cleanup(now).await.unwrap();

    assert_eq!(removed, 1);
    assert_eq!(history.current(), None);
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn test_builder() {
    let err = ChatHistoryBuilder::new().build().err().unwrap();
    assert!(matches!(err, PersistError::Config(_)));

    let history = ChatHistoryBuilder::new()
        .in_memory()
        .list_limit(1)
        .build()
        .unwrap();
    let store = history.store().clone();
    for title in ["a", "b"] {
        store
            .create(looka_persist::NewChat::from_messages(
                &[ChatMessage::user(title)],
                Utc::now(),
            ))
            .await
            .unwrap();
    }

    assert_eq!(history.list_recent().await.unwrap().len(), 1);
}
