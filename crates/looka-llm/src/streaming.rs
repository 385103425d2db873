use bytes::Bytes;
use futures::Stream;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::pin::Pin;

use crate::buffer_utils::{EventParser, LineDecoder, LineEvent, SkipReason};
use crate::error::Result;

/// Raw response body, chunked however the transport delivers it
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes>> + Send>>;

/// An incremental fragment of assistant text, in arrival order
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContentDelta(String);

impl ContentDelta {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for ContentDelta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ContentDelta {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// ============================================================================
// WIRE TYPES (one `data:` payload)
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamChunk {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    pub choices: Vec<StreamChoice>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamChoice {
    #[serde(default)]
    pub delta: Delta,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Delta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl StreamChunk {
    /// `choices[0].delta.content`, the only field the pipeline consumes
    pub fn content(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|c| c.delta.content.as_deref())
    }

    pub fn finish_reason(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|c| c.finish_reason.as_deref())
    }
}

// ============================================================================
// SESSION
// ============================================================================

/// Lifecycle of one streamed response
///
/// `Idle → Streaming` on the first chunk, `Streaming → Finalizing` on the
/// terminator, `Finalizing → Done` at end of body. A body that ends (or
/// breaks) without a terminator goes `Streaming → Done` directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamState {
    Idle,
    Streaming,
    Finalizing,
    Done,
    Aborted,
}

/// Per-request decode state: byte decoder, accumulated text, terminator flag
///
/// Owned by the request that created it and never shared. Between calls the
/// decoder buffer and accumulated text are always consistent with the bytes
/// consumed so far.
#[derive(Debug)]
pub struct StreamSession {
    decoder: LineDecoder,
    parser: EventParser,
    accumulated: String,
    state: StreamState,
    terminated: bool,
    delta_count: usize,
    skipped_lines: usize,
}

impl Default for StreamSession {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamSession {
    pub fn new() -> Self {
        Self {
            decoder: LineDecoder::new(),
            parser: EventParser::new(),
            accumulated: String::new(),
            state: StreamState::Idle,
            terminated: false,
            delta_count: 0,
            skipped_lines: 0,
        }
    }

    /// Process one chunk completely and return its deltas in order
    ///
    /// Once the terminator has been seen, the rest of the chunk and every
    /// later chunk are ignored.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<ContentDelta> {
        match self.state {
            StreamState::Idle => self.state = StreamState::Streaming,
            StreamState::Streaming => {}
            StreamState::Finalizing | StreamState::Done | StreamState::Aborted => {
                return Vec::new();
            }
        }

        let mut deltas = Vec::new();
        for line in self.decoder.push(chunk) {
            match self.parser.parse_line(&line) {
                LineEvent::Delta(delta) => {
                    self.accumulated.push_str(delta.as_str());
                    self.delta_count += 1;
                    deltas.push(delta);
                }
                LineEvent::Terminator => {
                    tracing::debug!(deltas = self.delta_count, "Stream terminator received");
                    self.terminated = true;
                    self.state = StreamState::Finalizing;
                    break;
                }
                LineEvent::Skip(SkipReason::Malformed) => self.skipped_lines += 1,
                LineEvent::Skip(_) => {}
            }
        }

        deltas
    }

    /// End of body (or transport failure): move to `Done`
    ///
    /// Any unterminated trailing fragment is dropped, never parsed.
    pub fn finish(&mut self) {
        if matches!(self.state, StreamState::Done | StreamState::Aborted) {
            return;
        }

        if let Some(dropped) = self.decoder.finish() {
            tracing::debug!(bytes = dropped.len(), "Discarding unterminated trailing fragment");
        }
        self.state = StreamState::Done;
    }

    /// Cancelled by the caller; the accumulated text is partial
    pub fn abort(&mut self) {
        if self.state != StreamState::Done {
            self.state = StreamState::Aborted;
        }
    }

    pub fn text(&self) -> &str {
        &self.accumulated
    }

    pub fn into_text(self) -> String {
        self.accumulated
    }

    pub fn state(&self) -> StreamState {
        self.state
    }

    /// Whether the terminator token was seen
    pub fn is_terminated(&self) -> bool {
        self.terminated
    }

    /// True once no further chunk will be consumed
    pub fn is_closed(&self) -> bool {
        !matches!(self.state, StreamState::Idle | StreamState::Streaming)
    }

    pub fn delta_count(&self) -> usize {
        self.delta_count
    }

    /// Data lines dropped because their payload did not parse
    pub fn skipped_lines(&self) -> usize {
        self.skipped_lines
    }
}
