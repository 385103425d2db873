use chrono::{TimeZone, Utc};
use looka_llm::{Attachment, ChatMessage, Content, ContentPart, Message, Role};
use serde_json::json;

#[test]
fn test_content_text_creation() {
    let content = Content::text("Hello, world!");
    assert_eq!(content.as_text(), Some("Hello, world!"));
}

#[test]
fn test_content_from_str() {
    let content: Content = "Test".into();
    assert_eq!(content.as_text(), Some("Test"));
}

#[test]
fn test_wire_message_serialization() {
    let msg = Message::user("Hello");
    let json = serde_json::to_value(&msg).unwrap();

    assert_eq!(json, json!({"role": "user", "content": "Hello"}));
}

#[test]
fn test_parts_serialization() {
    let content = Content::Parts(vec![
        ContentPart::text("look"),
        ContentPart::image("data:image/png;base64,AAAA"),
    ]);

    assert_eq!(
        serde_json::to_value(&content).unwrap(),
        json!([
            {"type": "text", "text": "look"},
            {"type": "image_url", "image_url": {"url": "data:image/png;base64,AAAA"}}
        ])
    );
}

#[test]
fn test_chat_message_persisted_shape() {
    let ts = Utc.timestamp_millis_opt(1_700_000_000_123).unwrap();
    let msg = ChatMessage::assistant("Hi").with_timestamp(ts);

    let json = serde_json::to_value(&msg).unwrap();
    assert_eq!(json, json!({"role": "assistant", "content": "Hi", "ts": 1_700_000_000_123i64}));

    let back: ChatMessage = serde_json::from_value(json).unwrap();
    assert_eq!(back, msg);
}

#[test]
fn test_attachment_shape() {
    let json = json!({
        "role": "user",
        "content": "see file",
        "ts": 0,
        "files": [{"type": "file", "name": "a.bin", "mimeType": "application/octet-stream", "size": 12}]
    });

    let msg: ChatMessage = serde_json::from_value(json).unwrap();
    assert_eq!(msg.role, Role::User);
    assert_eq!(msg.attachments[0].name(), "a.bin");
    assert_eq!(msg.attachments[0].listing(), "📎 a.bin");
}

#[test]
fn test_to_wire_without_attachments_is_plain_text() {
    let wire = ChatMessage::user("plain").to_wire();

    assert_eq!(wire.content, Content::text("plain"));
}

#[test]
fn test_to_wire_folds_documents_into_text() {
    let msg = ChatMessage::user("Summarize").with_attachments(vec![
        Attachment::document("notes.md", "text/markdown", "# Notes"),
        Attachment::Image {
            name: "cat.png".to_string(),
            mime_type: "image/png".to_string(),
            data: "data:image/png;base64,AAAA".to_string(),
        },
        Attachment::File {
            name: "blob".to_string(),
            mime_type: "application/octet-stream".to_string(),
            size: 3,
        },
    ]);

    let Content::Parts(parts) = msg.to_wire().content else {
        panic!("Expected parts");
    };

    assert_eq!(parts.len(), 2);
    assert_eq!(
        parts[0],
        ContentPart::text("Summarize\n\nDocument \"notes.md\":\n# Notes")
    );
    assert_eq!(parts[1], ContentPart::image("data:image/png;base64,AAAA"));
}

#[test]
fn test_to_wire_document_without_text() {
    let msg = ChatMessage::user("   ")
        .with_attachments(vec![Attachment::document("a.txt", "text/plain", "body")]);

    let Content::Parts(parts) = msg.to_wire().content else {
        panic!("Expected parts");
    };

    assert_eq!(parts, vec![ContentPart::text("Document \"a.txt\":\nbody")]);
}

#[test]
fn test_document_is_truncated() {
    let long = "x".repeat(6000);

    let Attachment::Document { content, .. } = Attachment::document("big.txt", "text/plain", &long)
    else {
        panic!("Expected document");
    };

    assert_eq!(content.chars().count(), 5000);
}
