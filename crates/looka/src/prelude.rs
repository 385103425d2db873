//! Prelude module for convenient imports
//!
//! Import everything you need with:
//! ```rust
//! use looka::prelude::*;
//! ```

pub use crate::{
    run_stream, Attachment, BufferSink, ChatClient, ChatHistory, ChatMessage, ChatSettings,
    ClientFactory, Conversation, Formatter, RenderSink, StreamOutcome, StreamSession,
    TerminalSink, Turn,
};

pub use tokio_util::sync::CancellationToken;
