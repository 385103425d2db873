use std::io::{self, Write};
use std::sync::LazyLock;
use syntect::easy::HighlightLines;
use syntect::highlighting::{Theme, ThemeSet};
use syntect::parsing::SyntaxSet;
use syntect::util::{as_24_bit_terminal_escaped, LinesWithEndings};
use unicode_width::UnicodeWidthStr;

use crate::segment::FormattedMessage;
use crate::sink::{RenderSink, SinkState};
use crate::view::{MessageView, Part};

static SYNTAX_SET: LazyLock<SyntaxSet> = LazyLock::new(SyntaxSet::load_defaults_newlines);
static THEME_SET: LazyLock<ThemeSet> = LazyLock::new(ThemeSet::load_defaults);

const THEME: &str = "base16-ocean.dark";
const RESET: &str = "\x1b[0m";
const DIM: &str = "\x1b[2m";

/// Sink writing to a terminal (or any writer)
///
/// Deltas are written and flushed immediately. With `rich` output the live
/// text is erased on finalize and the message is redrawn with highlighted
/// code blocks; without it the live text already is the final rendering and
/// finalize only writes the text when no delta was ever shown.
pub struct TerminalSink<W: Write + Send> {
    out: W,
    rich: bool,
    /// Terminal width, for counting soft-wrapped rows of live text
    columns: Option<usize>,
    live: String,
    view: MessageView,
    state: SinkState,
}

impl<W: Write + Send> TerminalSink<W> {
    pub fn new(out: W, rich: bool) -> Self {
        let columns = if rich {
            crossterm::terminal::size()
                .ok()
                .map(|(width, _)| usize::from(width))
                .filter(|&c| c > 0)
        } else {
            None
        };

        Self {
            out,
            rich,
            columns,
            live: String::new(),
            view: MessageView::new(0),
            state: SinkState::Idle,
        }
    }

    pub fn with_message_id(mut self, message_id: u64) -> Self {
        self.view = MessageView::new(message_id);
        self
    }

    pub fn with_columns(mut self, columns: Option<usize>) -> Self {
        self.columns = columns.filter(|&c| c > 0);
        self
    }

    pub fn state(&self) -> SinkState {
        self.state
    }

    pub fn view(&self) -> &MessageView {
        &self.view
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_str(&mut self, text: &str) {
        if let Err(e) = self.out.write_all(text.as_bytes()).and_then(|_| self.out.flush()) {
            tracing::warn!(error = %e, "Terminal write failed");
        }
    }

    /// Cursor up over the live text, then clear to the end of the screen
    fn erase_live(&mut self) {
        let rows = rows_above_cursor(&self.live, self.columns);
        let mut seq = String::from("\r");
        if rows > 0 {
            seq.push_str(&format!("\x1b[{}A", rows));
        }
        seq.push_str("\x1b[J");
        self.write_str(&seq);
    }
}

impl<W: Write + Send> RenderSink for TerminalSink<W> {
    fn apply_delta(&mut self, delta: &str) {
        if self.state.is_closed() {
            return;
        }
        self.state = SinkState::Live;
        self.live.push_str(delta);
        self.write_str(delta);
    }

    fn finalize(&mut self, message: &FormattedMessage) {
        self.view.install(message);
        self.state = SinkState::Finalized;

        let rendered = if self.rich {
            if !self.live.is_empty() {
                self.erase_live();
            }
            render_highlighted(&self.view)
        } else if self.live.is_empty() {
            message.to_source()
        } else {
            String::new()
        };

        self.write_str(&rendered);
        self.write_str("\n");
    }

    fn abort(&mut self) {
        if self.state == SinkState::Finalized {
            return;
        }
        self.state = SinkState::Aborted;
        self.write_str("\n[response stopped]\n");
    }
}

/// Rows between the first row of `text` and the cursor after writing it
///
/// Without a known width every line counts as one row.
fn rows_above_cursor(text: &str, columns: Option<usize>) -> usize {
    let Some(columns) = columns else {
        return text.matches('\n').count();
    };

    let mut lines = text.split('\n').map(UnicodeWidthStr::width).peekable();
    let mut rows = 0;
    while let Some(width) = lines.next() {
        if lines.peek().is_some() {
            rows += width.div_ceil(columns).max(1);
        } else {
            // The cursor stays on the last column until the next character
            rows += width.saturating_sub(1) / columns;
        }
    }
    rows
}

/// Plain text as-is, code blocks framed and highlighted in their current form
pub fn render_highlighted(view: &MessageView) -> String {
    let mut out = String::new();
    for part in view.parts() {
        match part {
            Part::Text(text) => out.push_str(text),
            Part::Code(block) => {
                let language = block.language().unwrap_or("text");
                out.push_str(&format!("{}─── {} ───{}\n", DIM, language, RESET));
                out.push_str(&highlight(block.displayed(), block.language()));
                if !out.ends_with('\n') {
                    out.push('\n');
                }
                out.push_str(&format!("{}────────{}\n", DIM, RESET));
            }
        }
    }
    out
}

/// 24-bit ANSI highlighting; unknown languages are plain text
pub fn highlight(code: &str, language: Option<&str>) -> String {
    let syntax = language
        .and_then(|lang| {
            SYNTAX_SET
                .find_syntax_by_token(lang)
                .or_else(|| SYNTAX_SET.find_syntax_by_extension(lang))
        })
        .unwrap_or_else(|| SYNTAX_SET.find_syntax_plain_text());

    let Some(theme) = theme() else {
        return code.to_string();
    };
    let mut highlighter = HighlightLines::new(syntax, theme);

    let mut out = String::new();
    for line in LinesWithEndings::from(code) {
        match highlighter.highlight_line(line, &SYNTAX_SET) {
            Ok(ranges) => out.push_str(&as_24_bit_terminal_escaped(&ranges[..], false)),
            Err(e) => {
                tracing::debug!(error = %e, "Highlighting failed, writing line plain");
                out.push_str(line);
            }
        }
    }
    out.push_str(RESET);
    out
}

fn theme() -> Option<&'static Theme> {
    THEME_SET
        .themes
        .get(THEME)
        .or_else(|| THEME_SET.themes.values().next())
}

/// Whether stdout should get highlighted output
pub fn stdout_is_rich() -> bool {
    use std::io::IsTerminal;
    io::stdout().is_terminal() && std::env::var_os("NO_COLOR").is_none()
}
