//! Rendering of streamed assistant messages.
//!
//! Deltas go to a [`RenderSink`] as they arrive. When the stream ends the
//! accumulated text is split into plain and code segments by
//! [`segment_message`], code blocks are pretty-printed through the
//! [`PrettyPrinter`] capability, and the sink is finalized with the
//! resulting [`FormattedMessage`].

pub mod error;
pub mod escape;
pub mod formatter;
pub mod heuristic;
pub mod html;
pub mod language;
pub mod pretty;
pub mod segment;
pub mod sink;
pub mod terminal;
pub mod view;

pub use error::{FormatError, Result};
pub use escape::{escape_html, text_to_html};
pub use formatter::Formatter;
pub use heuristic::{looks_like_code, score, CodeScore, Indicator};
pub use html::HtmlSink;
pub use language::{guess_language, LanguageFamily};
pub use pretty::{ExternalFormatter, FallbackFormatter, FormatterChain, PrettyPrinter};
pub use segment::{segment_message, CodeBlock, FormattedMessage, Segment};
pub use sink::{BufferSink, RenderSink, SinkState, Viewport};
pub use terminal::TerminalSink;
pub use view::{Affordances, BlockId, CodeBlockView, DisplayMode, MessageView};
