use looka_llm::{
    Attachment, ChatClient, ChatMessage, ChatRequest, ChatSettings, LlmError, Message,
    ModelCapabilities, ModelCatalog, Role, StreamSession,
};
use looka_render::{Formatter, RenderSink};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::pipeline::{run_stream, StreamOutcome};

pub const GREETING: &str =
    "Hi — I'm Looka, your AI assistant. Ask me anything, upload files, or generate images!";

/// Result of one user turn
#[derive(Debug)]
pub enum Turn {
    /// The request streamed; see the outcome for how it ended
    Replied(StreamOutcome),
    /// The request failed before any body arrived
    Failed { error: LlmError, message: String },
}

/// Assistant text shown in place of a reply that failed
pub fn error_reply(error: &LlmError) -> String {
    format!("Error: {}. Please check your connection and try again.", error)
}

/// One chat: settings, model catalog and the message history
///
/// Created per session and passed explicitly; nothing here is global.
pub struct Conversation {
    client: Arc<dyn ChatClient>,
    settings: ChatSettings,
    catalog: ModelCatalog,
    formatter: Formatter,
    messages: Vec<ChatMessage>,
}

impl Conversation {
    pub fn new(client: Arc<dyn ChatClient>, settings: ChatSettings) -> Self {
        Self {
            client,
            settings,
            catalog: ModelCatalog::default(),
            formatter: Formatter::new(),
            messages: vec![ChatMessage::assistant(GREETING)],
        }
    }

    pub fn with_catalog(mut self, catalog: ModelCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn with_formatter(mut self, formatter: Formatter) -> Self {
        self.formatter = formatter;
        self
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn settings(&self) -> &ChatSettings {
        &self.settings
    }

    pub fn formatter(&self) -> &Formatter {
        &self.formatter
    }

    pub fn capabilities(&self) -> ModelCapabilities {
        self.catalog.capabilities(&self.settings.model)
    }

    /// Back to just the greeting
    pub fn reset(&mut self) {
        self.messages = vec![ChatMessage::assistant(GREETING)];
    }

    /// Replace the history with a stored chat
    pub fn load(&mut self, messages: Vec<ChatMessage>) {
        if messages.is_empty() {
            self.reset();
        } else {
            self.messages = messages;
        }
    }

    /// History in wire form, without the leading greeting
    pub fn wire_messages(&self) -> Vec<Message> {
        let skip = usize::from(
            self.messages.len() > 1 && self.messages[0].role == Role::Assistant,
        );

        self.messages[skip..].iter().map(ChatMessage::to_wire).collect()
    }

    pub fn request(&self) -> ChatRequest {
        ChatRequest::new(self.settings.model.clone(), self.wire_messages())
            .with_options(self.settings.options(&self.catalog))
    }

    /// Send one user message and stream the reply into `sink`
    ///
    /// Blank input is a no-op and returns `None`. Attachments are dropped
    /// when the model does not accept them. Failures never escape: they are
    /// rendered and appended as the assistant's reply. Cancelling before the
    /// response starts aborts the sink and adds nothing to the history.
    pub async fn send(
        &mut self,
        text: &str,
        attachments: Vec<Attachment>,
        sink: &mut dyn RenderSink,
        cancel: &CancellationToken,
    ) -> Option<Turn> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }

        let attachments = if self.capabilities().attachments {
            attachments
        } else {
            if !attachments.is_empty() {
                tracing::warn!(
                    model = %self.settings.model,
                    dropped = attachments.len(),
                    "Model does not accept attachments"
                );
            }
            Vec::new()
        };

        self.messages.push(user_message(text, attachments));

        let request = self.request();
        tracing::info!(
            model = %request.model,
            messages = request.messages.len(),
            "Sending message"
        );

        let started = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            result = self.client.chat_stream(request) => Some(result),
        };
        let body = match started {
            Some(Ok(body)) => body,
            Some(Err(error)) => return Some(self.fail(error, sink).await),
            None => {
                tracing::info!("Request cancelled before the response started");
                sink.abort();
                return Some(Turn::Replied(StreamOutcome::Aborted {
                    partial: String::new(),
                }));
            }
        };

        let mut session = StreamSession::new();
        let outcome = run_stream(body, &mut session, sink, &self.formatter, cancel).await;

        match &outcome {
            StreamOutcome::Completed { text, .. } => {
                self.messages.push(ChatMessage::assistant(text.clone()));
            }
            StreamOutcome::Interrupted { text, error } if text.is_empty() => {
                let reply = self.render_error(error, sink).await;
                self.messages.push(ChatMessage::assistant(reply));
            }
            StreamOutcome::Interrupted { text, .. } => {
                self.messages.push(ChatMessage::assistant(text.clone()));
            }
            StreamOutcome::Aborted { partial } if !partial.is_empty() => {
                self.messages.push(ChatMessage::assistant(partial.clone()));
            }
            StreamOutcome::Aborted { .. } => {}
        }

        Some(Turn::Replied(outcome))
    }

    async fn fail(&mut self, error: LlmError, sink: &mut dyn RenderSink) -> Turn {
        tracing::error!(%error, "Chat request failed");

        let message = self.render_error(&error, sink).await;
        self.messages.push(ChatMessage::assistant(message.clone()));

        Turn::Failed { error, message }
    }

    /// Finalize `sink` with the error reply and return its text
    async fn render_error(&self, error: &LlmError, sink: &mut dyn RenderSink) -> String {
        let message = error_reply(error);
        sink.finalize(&self.formatter.format(&message).await);
        message
    }
}

/// User text with an `Attached files:` listing when files are present
fn user_message(text: &str, attachments: Vec<Attachment>) -> ChatMessage {
    let mut content = text.to_string();
    if !attachments.is_empty() {
        content.push_str("\n\nAttached files:\n");
        for attachment in &attachments {
            content.push_str(&attachment.listing());
            content.push('\n');
        }
    }

    ChatMessage::user(content).with_attachments(attachments)
}
