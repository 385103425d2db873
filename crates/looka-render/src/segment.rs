use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

use crate::heuristic::looks_like_code;
use crate::language::guess_language;

pub const FENCE: &str = "```";

/// Opening fence, optional word-character language tag, newline, body, closing fence
static FENCED_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"```(\w+)?\n((?s:.*?))```").expect("valid fence pattern"));

/// A code region of a finished message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeBlock {
    pub language: Option<String>,
    /// Exactly the text between the fences
    pub raw: String,
    /// Formatted form; equal to `raw` until a pretty printer has run
    pub pretty: String,
    /// False when the whole message was classified as code without fences
    pub fenced: bool,
}

impl CodeBlock {
    pub fn new(language: Option<String>, raw: impl Into<String>, fenced: bool) -> Self {
        let raw = raw.into();
        Self {
            language,
            pretty: raw.clone(),
            raw,
            fenced,
        }
    }

    pub fn language(&self) -> Option<&str> {
        self.language.as_deref()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Segment {
    PlainText { text: String },
    CodeBlock(CodeBlock),
}

impl Segment {
    pub fn plain(text: impl Into<String>) -> Self {
        Self::PlainText { text: text.into() }
    }

    pub fn raw(&self) -> &str {
        match self {
            Self::PlainText { text } => text,
            Self::CodeBlock(block) => &block.raw,
        }
    }

    pub fn as_code_block(&self) -> Option<&CodeBlock> {
        match self {
            Self::CodeBlock(block) => Some(block),
            Self::PlainText { .. } => None,
        }
    }
}

/// Read-only segmented view of a finished message
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormattedMessage {
    segments: Vec<Segment>,
}

impl FormattedMessage {
    pub fn new(segments: Vec<Segment>) -> Self {
        Self { segments }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn code_blocks(&self) -> impl Iterator<Item = &CodeBlock> {
        self.segments.iter().filter_map(Segment::as_code_block)
    }

    pub(crate) fn code_blocks_mut(&mut self) -> impl Iterator<Item = &mut CodeBlock> {
        self.segments.iter_mut().filter_map(|segment| match segment {
            Segment::CodeBlock(block) => Some(block),
            Segment::PlainText { .. } => None,
        })
    }

    /// Concatenated raw text of every segment (the source minus fence markers)
    pub fn raw_text(&self) -> String {
        self.segments.iter().map(Segment::raw).collect()
    }

    /// The exact text the message was built from, fences included
    pub fn to_source(&self) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::PlainText { text } => out.push_str(text),
                Segment::CodeBlock(block) if block.fenced => {
                    out.push_str(FENCE);
                    out.push_str(block.language().unwrap_or_default());
                    out.push('\n');
                    out.push_str(&block.raw);
                    out.push_str(FENCE);
                }
                Segment::CodeBlock(block) => out.push_str(&block.raw),
            }
        }
        out
    }
}

/// Split message text into plain and code segments, in source order
///
/// Fenced regions win; only a message without any fence is run through
/// the code-likelihood classifier, and then as a whole. Empty text yields
/// no segments. Pretty forms are left equal to the raw source.
pub fn segment_message(text: &str) -> FormattedMessage {
    if text.is_empty() {
        return FormattedMessage::empty();
    }

    let mut segments = Vec::new();
    let mut cursor = 0;

    for captures in FENCED_BLOCK.captures_iter(text) {
        let (Some(whole), Some(body)) = (captures.get(0), captures.get(2)) else {
            continue;
        };

        if whole.start() > cursor {
            segments.push(Segment::plain(&text[cursor..whole.start()]));
        }
        let language = captures.get(1).map(|m| m.as_str().to_string());
        segments.push(Segment::CodeBlock(CodeBlock::new(language, body.as_str(), true)));
        cursor = whole.end();
    }

    if segments.is_empty() {
        if looks_like_code(text) {
            let language = guess_language(text).map(str::to_string);
            return FormattedMessage::new(vec![Segment::CodeBlock(CodeBlock::new(
                language, text, false,
            ))]);
        }
        return FormattedMessage::new(vec![Segment::plain(text)]);
    }

    if cursor < text.len() {
        segments.push(Segment::plain(&text[cursor..]));
    }

    FormattedMessage::new(segments)
}
