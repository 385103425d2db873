use looka::{
    Attachment, BufferSink, ChatSettings, ClientFactory, Conversation, Role, StreamOutcome, Turn,
    GREETING,
};
use async_trait::async_trait;
use bytes::Bytes;
use futures::stream;
use looka::{ChatClient, ChatRequest, LlmError};
use looka_llm::{ByteStream, ChatResponse};
use looka_render::SinkState;
use mockito::Matcher;
use serde_json::json;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Sends a keep-alive comment, then drops the connection
struct ResetAfterComment;

#[async_trait]
impl ChatClient for ResetAfterComment {
    async fn chat(&self, _request: ChatRequest) -> looka_llm::Result<ChatResponse> {
        unreachable!("only streaming is used")
    }

    async fn chat_stream(&self, _request: ChatRequest) -> looka_llm::Result<ByteStream> {
        Ok(Box::pin(stream::iter(vec![
            Ok(Bytes::from_static(b": OPENROUTER PROCESSING\n\n")),
            Err(LlmError::Api {
                status: 502,
                message: "connection reset".to_string(),
            }),
        ])))
    }
}

/// Never answers
struct NoResponse;

#[async_trait]
impl ChatClient for NoResponse {
    async fn chat(&self, _request: ChatRequest) -> looka_llm::Result<ChatResponse> {
        unreachable!("only streaming is used")
    }

    async fn chat_stream(&self, _request: ChatRequest) -> looka_llm::Result<ByteStream> {
        std::future::pending().await
    }
}

fn sse_body(deltas: &[&str]) -> String {
    let mut body = String::new();
    for delta in deltas {
        body.push_str(&format!(
            "data: {}\n\n",
            json!({"choices": [{"delta": {"content": delta}}]})
        ));
    }
    body.push_str("data: [DONE]\n\n");
    body
}

fn conversation(server: &mockito::Server, model: &str) -> Conversation {
    let settings = ChatSettings {
        model: model.to_string(),
        use_proxy: true,
        proxy_url: format!("{}/api/proxy", server.url()),
        ..Default::default()
    };
    let client = ClientFactory::create_client(&settings).unwrap();
    Conversation::new(client, settings)
}

#[tokio::test]
async fn test_starts_with_greeting() {
    let server = mockito::Server::new_async().await;
    let conversation = conversation(&server, "qwen/qwen3-4b:free");

    assert_eq!(conversation.messages().len(), 1);
    assert_eq!(conversation.messages()[0].content, GREETING);
    assert_eq!(conversation.messages()[0].role, Role::Assistant);
}

#[tokio::test]
async fn test_blank_input_sends_nothing() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/api/proxy")
        .expect(0)
        .create_async()
        .await;
    let mut conversation = conversation(&server, "qwen/qwen3-4b:free");
    let mut sink = BufferSink::default();

    let turn = conversation
        .send("   \n", Vec::new(), &mut sink, &CancellationToken::new())
        .await;

    assert!(turn.is_none());
    assert_eq!(conversation.messages().len(), 1);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_reply_is_streamed_and_appended() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/api/proxy")
        .match_body(Matcher::PartialJson(json!({
            "model": "qwen/qwen3-4b:free",
            "stream": true,
            "max_tokens": 8192,
            "messages": [{"role": "user", "content": "Hello"}]
        })))
        .with_status(200)
        .with_header("content-type", "text/event-stream")
        .with_body(sse_body(&["Hi", " there"]))
        .create_async()
        .await;
    let mut conversation = conversation(&server, "qwen/qwen3-4b:free");
    let mut sink = BufferSink::default();

    let turn = conversation
        .send("  Hello ", Vec::new(), &mut sink, &CancellationToken::new())
        .await;

    assert!(matches!(
        turn,
        Some(Turn::Replied(StreamOutcome::Completed { terminated: true, .. }))
    ));
    let messages = conversation.messages();
    assert_eq!(messages.len(), 3);
    assert_eq!(messages[1].content, "Hello");
    assert_eq!(messages[2].content, "Hi there");
    assert_eq!(sink.text(), "Hi there");
    assert_eq!(sink.deltas(), 2);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_follow_up_carries_history() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/api/proxy")
        .match_body(Matcher::Regex(
            r#""messages":\[\{"role":"user","content":"one"\}\]"#.to_string(),
        ))
        .with_status(200)
        .with_body(sse_body(&["first"]))
        .create_async()
        .await;
    let second = server
        .mock("POST", "/api/proxy")
        .match_body(Matcher::PartialJson(json!({
            "messages": [
                {"role": "user", "content": "one"},
                {"role": "assistant", "content": "first"},
                {"role": "user", "content": "two"}
            ]
        })))
        .with_status(200)
        .with_body(sse_body(&["second"]))
        .create_async()
        .await;
    let mut conversation = conversation(&server, "qwen/qwen3-4b:free");
    let cancel = CancellationToken::new();

    conversation
        .send("one", Vec::new(), &mut BufferSink::default(), &cancel)
        .await;
    conversation
        .send("two", Vec::new(), &mut BufferSink::default(), &cancel)
        .await;

    assert_eq!(conversation.messages().len(), 5);
    assert_eq!(conversation.messages()[4].content, "second");
    second.assert_async().await;
}

#[tokio::test]
async fn test_api_error_becomes_assistant_message() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/api/proxy")
        .with_status(429)
        .with_header("content-type", "application/json")
        .with_body(r#"{"error":{"message":"Rate limited"}}"#)
        .create_async()
        .await;
    let mut conversation = conversation(&server, "qwen/qwen3-4b:free");
    let mut sink = BufferSink::default();

    let turn = conversation
        .send("Hello", Vec::new(), &mut sink, &CancellationToken::new())
        .await;

    let expected = "Error: Rate limited. Please check your connection and try again.";
    match turn {
        Some(Turn::Failed { message, .. }) => assert_eq!(message, expected),
        other => panic!("Expected Failed, got {:?}", other),
    }
    assert_eq!(conversation.messages().last().unwrap().content, expected);
    assert_eq!(sink.state(), SinkState::Finalized);
    assert_eq!(sink.text(), expected);
}

#[tokio::test]
async fn test_missing_key_short_circuits() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/chat/completions")
        .expect(0)
        .create_async()
        .await;
    let settings = ChatSettings {
        use_proxy: false,
        base_url: server.url(),
        api_key: None,
        ..Default::default()
    };
    let client = ClientFactory::create_client(&settings).unwrap();
    let mut conversation = Conversation::new(client, settings);

    let turn = conversation
        .send("Hello", Vec::new(), &mut BufferSink::default(), &CancellationToken::new())
        .await;

    match turn {
        Some(Turn::Failed { error, message }) => {
            assert!(error.is_missing_credential());
            assert!(message.starts_with("Error: No API key configured"));
        }
        other => panic!("Expected Failed, got {:?}", other),
    }
    mock.assert_async().await;
}

#[tokio::test]
async fn test_documents_are_folded_into_the_request() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/api/proxy")
        .match_body(Matcher::Regex(r#"Document \\"notes\.txt\\":\\nremember the milk"#.to_string()))
        .with_status(200)
        .with_body(sse_body(&["Noted"]))
        .create_async()
        .await;
    let mut conversation = conversation(&server, "qwen/qwen3-4b:free");

    conversation
        .send(
            "Summarize",
            vec![Attachment::document("notes.txt", "text/plain", "remember the milk")],
            &mut BufferSink::default(),
            &CancellationToken::new(),
        )
        .await;

    let user = &conversation.messages()[1];
    assert_eq!(user.content, "Summarize\n\nAttached files:\n📄 notes.txt\n");
    assert_eq!(user.attachments.len(), 1);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_attachments_dropped_for_text_only_models() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/api/proxy")
        .match_body(Matcher::PartialJson(json!({
            "messages": [{"role": "user", "content": "Summarize"}]
        })))
        .with_status(200)
        .with_body(sse_body(&["ok"]))
        .create_async()
        .await;
    let mut conversation = conversation(&server, "meta-llama/llama-3.3-70b-instruct:free");

    conversation
        .send(
            "Summarize",
            vec![Attachment::document("notes.txt", "text/plain", "x")],
            &mut BufferSink::default(),
            &CancellationToken::new(),
        )
        .await;

    assert!(conversation.messages()[1].attachments.is_empty());
    mock.assert_async().await;
}

#[tokio::test]
async fn test_reset_and_load() {
    let server = mockito::Server::new_async().await;
    let mut conversation = conversation(&server, "qwen/qwen3-4b:free");

    conversation.load(vec![
        looka::ChatMessage::user("stored question"),
        looka::ChatMessage::assistant("stored answer"),
    ]);
    assert_eq!(conversation.messages().len(), 2);
    assert_eq!(conversation.wire_messages().len(), 2);

    conversation.load(Vec::new());
    assert_eq!(conversation.messages()[0].content, GREETING);

    conversation.reset();
    assert_eq!(conversation.messages().len(), 1);
    assert_eq!(conversation.wire_messages().len(), 1);
}

#[tokio::test]
async fn test_failure_before_any_text_shows_error_reply() {
    let mut conversation = Conversation::new(Arc::new(ResetAfterComment), ChatSettings::default());
    let mut sink = BufferSink::default();

    let turn = conversation
        .send("hi", Vec::new(), &mut sink, &CancellationToken::new())
        .await;

    let expected = "Error: connection reset. Please check your connection and try again.";
    assert!(matches!(
        turn,
        Some(Turn::Replied(StreamOutcome::Interrupted { .. }))
    ));
    assert_eq!(conversation.messages().last().unwrap().content, expected);
    assert_eq!(sink.state(), SinkState::Finalized);
    assert_eq!(sink.text(), expected);
}

#[tokio::test]
async fn test_cancel_before_response_starts() {
    let mut conversation = Conversation::new(Arc::new(NoResponse), ChatSettings::default());
    let mut sink = BufferSink::default();
    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
            cancel.cancel();
        }
    });

    let turn = conversation.send("hi", Vec::new(), &mut sink, &cancel).await;

    match turn {
        Some(Turn::Replied(StreamOutcome::Aborted { partial })) => assert!(partial.is_empty()),
        other => panic!("Expected Aborted, got {:?}", other),
    }
    assert_eq!(sink.state(), SinkState::Aborted);
    assert_eq!(conversation.messages().len(), 2);
    assert_eq!(conversation.messages()[1].content, "hi");
}
