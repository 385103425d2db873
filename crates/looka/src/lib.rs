//! # Looka
//!
//! Streaming AI chat assistant: chat completions are streamed from an
//! OpenAI-compatible API (directly or through the `looka-api` proxy), decoded
//! incrementally, rendered delta by delta, and finalized with code blocks
//! detected and pretty-printed.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use looka::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = ChatSettings::default();
//!     let client = ClientFactory::create_client(&settings)?;
//!
//!     let mut conversation = Conversation::new(client, settings);
//!     let mut sink = BufferSink::default();
//!     let cancel = CancellationToken::new();
//!
//!     conversation
//!         .send("Write hello world in Rust", Vec::new(), &mut sink, &cancel)
//!         .await;
//!
//!     println!("{}", sink.text());
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! - **`looka-llm`**: message types, chat completions client, stream decoding
//! - **`looka-render`**: code block detection, pretty-printing, render sinks
//! - **`looka-persist`**: chat history over Supabase or in memory
//! - **`looka-api`**: proxy server holding the upstream key
//!
//! This crate adds the stream pipeline, conversation orchestration,
//! attachments, transcript export and the `looka` terminal client.

pub mod attachments;
pub mod commands;
pub mod config;
pub mod conversation;
pub mod pipeline;
pub mod prelude;
pub mod transcript;

pub use attachments::{attachment_from_path, mime_for_path};
pub use commands::{ChatRef, Command};
pub use conversation::{error_reply, Conversation, Turn, GREETING};
pub use pipeline::{run_stream, StreamOutcome};

pub use looka_llm::{
    Attachment, ChatClient, ChatMessage, ChatOptions, ChatRequest, ChatSettings, ClientFactory,
    CompletionsClient, Endpoint, LlmError, Message, ModelCatalog, Role, StreamSession,
};

pub use looka_render::{
    BufferSink, FormattedMessage, Formatter, HtmlSink, RenderSink, Segment, TerminalSink,
};

pub use looka_persist::{
    time_ago, ChatHistory, ChatHistoryBuilder, ChatRecord, ChatStore, MemoryStore, PersistError,
    SupabaseConfig, SupabaseStore,
};
