use std::sync::Arc;

use crate::pretty::{FormatterChain, PrettyPrinter};
use crate::segment::{segment_message, FormattedMessage};

/// Turns final accumulated text into a [`FormattedMessage`]
///
/// Segmentation is synchronous; pretty-printing of each code block is
/// awaited in order. A block whose formatting fails keeps its raw source as
/// the pretty form.
#[derive(Clone, Default)]
pub struct Formatter {
    chain: FormatterChain,
}

impl Formatter {
    /// Deterministic fallback formatting only
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_printer(rich: Arc<dyn PrettyPrinter>) -> Self {
        Self {
            chain: FormatterChain::new(rich),
        }
    }

    /// Installed formatters first, fallback otherwise
    pub fn with_external() -> Self {
        Self {
            chain: FormatterChain::with_external(),
        }
    }

    pub async fn format(&self, text: &str) -> FormattedMessage {
        let mut message = segment_message(text);

        for block in message.code_blocks_mut() {
            block.pretty = self
                .chain
                .pretty_or_raw(block.language.as_deref(), &block.raw)
                .await;
        }

        tracing::debug!(
            segments = message.segments().len(),
            code_blocks = message.code_blocks().count(),
            "Formatted message"
        );
        message
    }
}
