use crate::segment::FormattedMessage;
use crate::view::{DisplayMode, MessageView};

/// Display surface for one streamed assistant message
///
/// `apply_delta` is called for every delta as it arrives, unbatched.
/// `finalize` replaces the live view with the formatted message and must
/// give the same result whether the text arrived in many deltas, one, or
/// none. `abort` ends the message without finalizing it.
pub trait RenderSink: Send {
    fn apply_delta(&mut self, delta: &str);

    fn finalize(&mut self, message: &FormattedMessage);

    fn abort(&mut self);
}

impl<S: RenderSink + ?Sized> RenderSink for Box<S> {
    fn apply_delta(&mut self, delta: &str) {
        (**self).apply_delta(delta)
    }

    fn finalize(&mut self, message: &FormattedMessage) {
        (**self).finalize(message)
    }

    fn abort(&mut self) {
        (**self).abort()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SinkState {
    #[default]
    Idle,
    Live,
    Finalized,
    Aborted,
}

impl SinkState {
    pub fn is_closed(self) -> bool {
        matches!(self, Self::Finalized | Self::Aborted)
    }
}

/// Window of `height` lines over the rendered text, pinned to the bottom
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub height: usize,
    pub offset: usize,
}

impl Viewport {
    pub fn new(height: usize) -> Self {
        Self { height, offset: 0 }
    }

    pub fn scroll_to_bottom(&mut self, total_lines: usize) {
        self.offset = total_lines.saturating_sub(self.height);
    }
}

/// In-memory sink: keeps the text, a scrolled viewport and code block views
#[derive(Debug, Clone)]
pub struct BufferSink {
    live: String,
    view: MessageView,
    viewport: Viewport,
    state: SinkState,
    deltas: usize,
}

impl Default for BufferSink {
    fn default() -> Self {
        Self::new(0, 24)
    }
}

impl BufferSink {
    pub fn new(message_id: u64, viewport_height: usize) -> Self {
        Self {
            live: String::new(),
            view: MessageView::new(message_id),
            viewport: Viewport::new(viewport_height),
            state: SinkState::Idle,
            deltas: 0,
        }
    }

    pub fn state(&self) -> SinkState {
        self.state
    }

    /// Deltas applied to the live view
    pub fn deltas(&self) -> usize {
        self.deltas
    }

    pub fn live_text(&self) -> &str {
        &self.live
    }

    /// What the surface shows now
    pub fn text(&self) -> String {
        match self.state {
            SinkState::Finalized => self.view.displayed_text(),
            _ => self.live.clone(),
        }
    }

    pub fn view(&self) -> &MessageView {
        &self.view
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Lines inside the viewport
    pub fn visible_lines(&self) -> Vec<String> {
        self.text()
            .lines()
            .skip(self.viewport.offset)
            .take(self.viewport.height)
            .map(str::to_owned)
            .collect()
    }

    pub fn toggle(&mut self, index: usize) -> Option<DisplayMode> {
        let mode = self.view.toggle(index);
        self.rescroll();
        mode
    }

    pub fn copy(&self, index: usize) -> Option<&str> {
        self.view.copy(index)
    }

    fn rescroll(&mut self) {
        let lines = self.text().lines().count();
        self.viewport.scroll_to_bottom(lines);
    }
}

impl RenderSink for BufferSink {
    fn apply_delta(&mut self, delta: &str) {
        if self.state.is_closed() {
            tracing::debug!(state = ?self.state, "Delta after close ignored");
            return;
        }

        self.state = SinkState::Live;
        self.live.push_str(delta);
        self.deltas += 1;
        self.rescroll();
    }

    fn finalize(&mut self, message: &FormattedMessage) {
        self.view.install(message);
        self.state = SinkState::Finalized;
        self.rescroll();
    }

    fn abort(&mut self) {
        if self.state != SinkState::Finalized {
            self.state = SinkState::Aborted;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segment::segment_message;

    #[test]
    fn test_deltas_scroll_viewport() {
        let mut sink = BufferSink::new(0, 2);

        sink.apply_delta("one\ntwo\n");
        sink.apply_delta("three\nfour");

        assert_eq!(sink.state(), SinkState::Live);
        assert_eq!(sink.viewport().offset, 2);
        assert_eq!(sink.visible_lines(), vec!["three", "four"]);
    }

    #[test]
    fn test_finalize_matches_single_delta() {
        let text = "Look:\n```py\nprint(1)\n```\nok";
        let message = segment_message(text);

        let mut streamed = BufferSink::default();
        for piece in ["Lo", "ok:\n``", "`py\nprint(1)\n```\nok"] {
            streamed.apply_delta(piece);
        }
        streamed.finalize(&message);

        let mut whole = BufferSink::default();
        whole.apply_delta(text);
        whole.finalize(&message);

        let mut silent = BufferSink::default();
        silent.finalize(&message);

        assert_eq!(streamed.text(), whole.text());
        assert_eq!(silent.text(), whole.text());
    }

    #[test]
    fn test_finalize_empty() {
        let mut sink = BufferSink::default();

        sink.finalize(&FormattedMessage::empty());

        assert_eq!(sink.state(), SinkState::Finalized);
        assert_eq!(sink.text(), "");
        assert!(sink.view().blocks().is_empty());
    }

    #[test]
    fn test_abort_keeps_partial_and_ignores_later_deltas() {
        let mut sink = BufferSink::default();
        sink.apply_delta("par");

        sink.abort();
        sink.apply_delta("tial");

        assert_eq!(sink.state(), SinkState::Aborted);
        assert_eq!(sink.text(), "par");
    }
}
