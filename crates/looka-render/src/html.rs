use std::fmt::Write;

use crate::escape::{escape_html, text_to_html};
use crate::segment::FormattedMessage;
use crate::sink::{RenderSink, SinkState};
use crate::view::{CodeBlockView, DisplayMode, MessageView, Part};

/// Sink producing message markup
///
/// While live, the body is the escaped text with `<br/>` line breaks. Once
/// finalized, plain segments become paragraphs and each code block gets a
/// language label, a toggle and a copy control.
#[derive(Debug, Clone)]
pub struct HtmlSink {
    live: String,
    view: MessageView,
    state: SinkState,
}

impl HtmlSink {
    pub fn new(message_id: u64) -> Self {
        Self {
            live: String::new(),
            view: MessageView::new(message_id),
            state: SinkState::Idle,
        }
    }

    pub fn state(&self) -> SinkState {
        self.state
    }

    pub fn view(&self) -> &MessageView {
        &self.view
    }

    pub fn toggle(&mut self, index: usize) -> Option<DisplayMode> {
        self.view.toggle(index)
    }

    pub fn html(&self) -> String {
        match self.state {
            SinkState::Finalized => render_view(&self.view),
            _ if self.live.is_empty() => String::new(),
            _ => format!(r#"<p class="message-text">{}</p>"#, self.live),
        }
    }
}

impl RenderSink for HtmlSink {
    fn apply_delta(&mut self, delta: &str) {
        if self.state.is_closed() {
            return;
        }
        self.state = SinkState::Live;
        self.live.push_str(&escape_html(delta).replace('\n', "<br/>"));
    }

    fn finalize(&mut self, message: &FormattedMessage) {
        self.view.install(message);
        self.state = SinkState::Finalized;
    }

    fn abort(&mut self) {
        if self.state != SinkState::Finalized {
            self.state = SinkState::Aborted;
        }
    }
}

/// Markup for a finalized message view
pub fn render_view(view: &MessageView) -> String {
    let mut out = String::new();
    for part in view.parts() {
        match part {
            Part::Text(text) if text.trim().is_empty() => {}
            Part::Text(text) => {
                let _ = write!(out, r#"<p class="message-text">{}</p>"#, text_to_html(text));
            }
            Part::Code(block) => render_code_block(&mut out, view, block),
        }
    }
    out
}

fn render_code_block(out: &mut String, view: &MessageView, block: &CodeBlockView) {
    let id = block.id();
    let language = block.language().unwrap_or_default();

    let _ = write!(out, r#"<div class="code-block" id="{}"><div class="code-header">"#, id);
    if !language.is_empty() {
        let _ = write!(out, r#"<span class="code-lang">{}</span>"#, escape_html(language));
    }
    if view.affordances().is_attached(id) {
        let _ = write!(
            out,
            r#"<div class="code-actions"><button class="toggle-btn" data-block="{id}">{}</button><button class="copy-btn" data-block="{id}">Copy</button></div>"#,
            block.mode().toggle_label(),
        );
    }
    out.push_str("</div>");

    match block.mode() {
        DisplayMode::Pretty => {
            let _ = write!(
                out,
                r#"<pre><code class="language-{}">{}</code></pre>"#,
                escape_html(language),
                escape_html(block.displayed())
            );
        }
        DisplayMode::Raw => {
            let _ = write!(
                out,
                r#"<textarea class="code-raw" readonly>{}</textarea>"#,
                escape_html(block.displayed())
            );
        }
    }
    out.push_str("</div>");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segment::segment_message;

    #[test]
    fn test_live_markup_is_escaped() {
        let mut sink = HtmlSink::new(0);

        sink.apply_delta("a < b\n");
        sink.apply_delta("& c");

        assert_eq!(sink.html(), r#"<p class="message-text">a &lt; b<br/>&amp; c</p>"#);
    }

    #[test]
    fn test_finalized_code_block() {
        let mut sink = HtmlSink::new(3);
        sink.finalize(&segment_message("Run:\n```sh\necho \"<hi>\"\n```"));

        let html = sink.html();
        assert!(html.starts_with(r#"<p class="message-text">Run:<br/></p>"#));
        assert!(html.contains(r#"<div class="code-block" id="code-3-0">"#));
        assert!(html.contains(r#"<span class="code-lang">sh</span>"#));
        assert!(html.contains("echo &quot;&lt;hi&gt;&quot;"));
        assert!(html.contains(r#"<button class="toggle-btn" data-block="code-3-0">Raw</button>"#));
    }

    #[test]
    fn test_controls_attached_once() {
        let message = segment_message("```js\nlet a = 1;\n```");
        let mut sink = HtmlSink::new(0);

        sink.finalize(&message);
        sink.finalize(&message);

        assert_eq!(sink.html().matches("copy-btn").count(), 1);
        assert_eq!(sink.view().affordances().len(), 1);
    }

    #[test]
    fn test_toggle_switches_to_raw_textarea() {
        let mut sink = HtmlSink::new(0);
        sink.finalize(&segment_message("```js\nlet a = 1;\n```"));

        sink.toggle(0);
        assert!(sink.html().contains(r#"<textarea class="code-raw" readonly>"#));
        assert!(sink.html().contains(">Pretty</button>"));

        sink.toggle(0);
        assert!(sink.html().contains("<pre><code class=\"language-js\">"));
    }

    #[test]
    fn test_empty_message() {
        let mut sink = HtmlSink::new(0);
        sink.finalize(&FormattedMessage::empty());

        assert_eq!(sink.html(), "");
    }
}
