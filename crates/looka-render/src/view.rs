use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

use crate::segment::{CodeBlock, FormattedMessage, Segment};

/// Stable identity of a code block: message number and block index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockId {
    pub message: u64,
    pub index: usize,
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "code-{}-{}", self.message, self.index)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayMode {
    #[default]
    Pretty,
    Raw,
}

impl DisplayMode {
    pub fn flipped(self) -> Self {
        match self {
            Self::Pretty => Self::Raw,
            Self::Raw => Self::Pretty,
        }
    }

    /// Label of the toggle control: names the mode it switches to
    pub fn toggle_label(self) -> &'static str {
        match self {
            Self::Pretty => "Raw",
            Self::Raw => "Pretty",
        }
    }
}

/// Display state of one code block; both forms are kept so toggling never
/// recomputes anything
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeBlockView {
    id: BlockId,
    language: Option<String>,
    raw: String,
    pretty: String,
    mode: DisplayMode,
}

impl CodeBlockView {
    pub fn new(id: BlockId, block: &CodeBlock) -> Self {
        Self {
            id,
            language: block.language.clone(),
            raw: block.raw.clone(),
            pretty: block.pretty.clone(),
            mode: DisplayMode::Pretty,
        }
    }

    pub fn id(&self) -> BlockId {
        self.id
    }

    pub fn language(&self) -> Option<&str> {
        self.language.as_deref()
    }

    pub fn mode(&self) -> DisplayMode {
        self.mode
    }

    pub fn toggle(&mut self) -> DisplayMode {
        self.mode = self.mode.flipped();
        self.mode
    }

    pub fn displayed(&self) -> &str {
        match self.mode {
            DisplayMode::Pretty => &self.pretty,
            DisplayMode::Raw => &self.raw,
        }
    }

    /// Copy always yields the raw source, whatever is displayed
    pub fn copy_text(&self) -> &str {
        &self.raw
    }
}

/// Which blocks already have their copy and toggle controls
#[derive(Debug, Clone, Default)]
pub struct Affordances {
    attached: HashSet<BlockId>,
}

impl Affordances {
    /// Returns false when the block already had them
    pub fn attach(&mut self, id: BlockId) -> bool {
        self.attached.insert(id)
    }

    pub fn is_attached(&self, id: BlockId) -> bool {
        self.attached.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.attached.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attached.is_empty()
    }
}

/// A finalized message together with its code block views
#[derive(Debug, Clone, Default)]
pub struct MessageView {
    message_id: u64,
    message: FormattedMessage,
    blocks: Vec<CodeBlockView>,
    affordances: Affordances,
}

impl MessageView {
    pub fn new(message_id: u64) -> Self {
        Self {
            message_id,
            ..Default::default()
        }
    }

    /// Install a formatted message and attach controls to its blocks
    ///
    /// Safe to repeat: controls are attached once per block and the display
    /// mode of a block that is still present is kept.
    pub fn install(&mut self, message: &FormattedMessage) {
        let blocks: Vec<CodeBlockView> = message
            .code_blocks()
            .enumerate()
            .map(|(index, block)| {
                let id = BlockId {
                    message: self.message_id,
                    index,
                };
                let mut view = CodeBlockView::new(id, block);
                if let Some(previous) = self.blocks.get(index) {
                    if previous.raw == view.raw {
                        view.mode = previous.mode;
                    }
                }
                view
            })
            .collect();

        for view in &blocks {
            if self.affordances.attach(view.id) {
                tracing::trace!(block = %view.id, "Attached code block controls");
            }
        }

        self.message = message.clone();
        self.blocks = blocks;
    }

    pub fn message(&self) -> &FormattedMessage {
        &self.message
    }

    pub fn blocks(&self) -> &[CodeBlockView] {
        &self.blocks
    }

    pub fn block(&self, index: usize) -> Option<&CodeBlockView> {
        self.blocks.get(index)
    }

    pub fn toggle(&mut self, index: usize) -> Option<DisplayMode> {
        self.blocks.get_mut(index).map(CodeBlockView::toggle)
    }

    pub fn copy(&self, index: usize) -> Option<&str> {
        self.blocks.get(index).map(CodeBlockView::copy_text)
    }

    pub fn affordances(&self) -> &Affordances {
        &self.affordances
    }

    /// Segments with each code block paired to its view, in order
    pub fn parts(&self) -> impl Iterator<Item = Part<'_>> {
        let mut block_index = 0;
        self.message.segments().iter().map(move |segment| match segment {
            Segment::PlainText { text } => Part::Text(text),
            Segment::CodeBlock(block) => {
                let part = self
                    .blocks
                    .get(block_index)
                    .map_or(Part::Text(&block.raw), Part::Code);
                block_index += 1;
                part
            }
        })
    }

    /// What is on screen as plain text: code blocks show their current form
    pub fn displayed_text(&self) -> String {
        let mut out = String::new();
        for part in self.parts() {
            match part {
                Part::Text(text) => out.push_str(text),
                Part::Code(view) => out.push_str(view.displayed()),
            }
        }
        out
    }
}

pub enum Part<'a> {
    Text(&'a str),
    Code(&'a CodeBlockView),
}
