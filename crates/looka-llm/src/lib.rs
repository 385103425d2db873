pub mod buffer_utils;
pub mod config;
pub mod error;
pub mod openai;
pub mod streaming;
pub mod traits;
pub mod types;

pub use traits::{ChatClient, ChatOptions, ChatRequest, ChatResponse, TokenUsage};

pub use buffer_utils::{EventParser, LineDecoder, LineEvent, SkipReason};
pub use config::{ChatSettings, ClientFactory, Endpoint, ModelCapabilities, ModelCatalog};
pub use error::{LlmError, Result};
pub use openai::{mask_key, CompletionsClient, ProbeResult};
pub use streaming::{ByteStream, ContentDelta, StreamChunk, StreamSession, StreamState};
pub use types::{Attachment, ChatMessage, Content, ContentPart, Message, Role};
