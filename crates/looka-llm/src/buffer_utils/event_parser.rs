use crate::streaming::{ContentDelta, StreamChunk};

/// Prefix that marks an event-data line
pub const DATA_PREFIX: &str = "data: ";

/// Payload that ends the stream
pub const TERMINATOR: &str = "[DONE]";

/// What one complete line contributes to the stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineEvent {
    Delta(ContentDelta),
    Terminator,
    Skip(SkipReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    Blank,
    /// Comment, `event:`/`id:` field or anything without the data prefix
    NotData,
    /// Payload did not parse as a chunk; upstream may split JSON mid-token
    Malformed,
    /// Well-formed chunk without `choices[0].delta.content`
    NoContent,
}

/// Extracts content deltas from event-stream lines
///
/// Never fails: blank lines, non-data lines and unparseable payloads are
/// reported as [`LineEvent::Skip`] and the stream carries on.
#[derive(Debug, Clone, Copy, Default)]
pub struct EventParser;

impl EventParser {
    pub fn new() -> Self {
        Self
    }

    pub fn parse_line(&self, line: &str) -> LineEvent {
        let line = line.trim();
        if line.is_empty() {
            return LineEvent::Skip(SkipReason::Blank);
        }

        let Some(data) = line.strip_prefix(DATA_PREFIX) else {
            return LineEvent::Skip(SkipReason::NotData);
        };

        if self.is_done_marker(data) {
            return LineEvent::Terminator;
        }

        match serde_json::from_str::<StreamChunk>(data) {
            Ok(chunk) => match chunk.content() {
                Some(content) if !content.is_empty() => {
                    LineEvent::Delta(ContentDelta::new(content))
                }
                _ => LineEvent::Skip(SkipReason::NoContent),
            },
            Err(e) => {
                tracing::debug!(error = %e, payload_len = data.len(), "Skipping malformed event payload");
                LineEvent::Skip(SkipReason::Malformed)
            }
        }
    }

    pub fn is_done_marker(&self, data: &str) -> bool {
        data == TERMINATOR
    }
}
