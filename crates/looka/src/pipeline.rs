use futures::StreamExt;
use looka_llm::{ByteStream, LlmError, StreamSession};
use looka_render::{Formatter, RenderSink};
use tokio_util::sync::CancellationToken;

/// How one streamed response ended
#[derive(Debug)]
pub enum StreamOutcome {
    /// Body ended or the terminator arrived; the sink was finalized
    Completed { text: String, terminated: bool },
    /// Transport failed mid-body; what arrived was still finalized
    ///
    /// When nothing arrived the sink is left open for the caller to render
    /// the failure.
    Interrupted { text: String, error: LlmError },
    /// Cancelled; the sink was aborted and never finalized
    Aborted { partial: String },
}

impl StreamOutcome {
    pub fn text(&self) -> &str {
        match self {
            Self::Completed { text, .. } | Self::Interrupted { text, .. } => text,
            Self::Aborted { partial } => partial,
        }
    }

    pub fn is_aborted(&self) -> bool {
        matches!(self, Self::Aborted { .. })
    }
}

/// Drive one response body through decode, parse, sink and finalize
///
/// Chunks are processed strictly in order and each chunk's deltas reach the
/// sink before the next chunk is awaited. The body stream is dropped as soon
/// as the terminator is seen.
pub async fn run_stream(
    mut body: ByteStream,
    session: &mut StreamSession,
    sink: &mut dyn RenderSink,
    formatter: &Formatter,
    cancel: &CancellationToken,
) -> StreamOutcome {
    let mut failure = None;

    loop {
        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => return abort(session, sink),
            next = body.next() => next,
        };

        match next {
            Some(Ok(chunk)) => {
                tracing::debug!(bytes = chunk.len(), "Chunk received");
                for delta in session.feed(&chunk) {
                    sink.apply_delta(delta.as_str());
                }
                if session.is_terminated() {
                    break;
                }
            }
            Some(Err(error)) => {
                tracing::warn!(%error, "Response body interrupted");
                failure = Some(error);
                break;
            }
            None => break,
        }
    }

    drop(body);
    session.finish();

    let text = session.text().to_string();
    if text.is_empty() {
        if let Some(error) = failure {
            return StreamOutcome::Interrupted { text, error };
        }
    }

    let message = tokio::select! {
        biased;
        _ = cancel.cancelled() => return abort(session, sink),
        message = formatter.format(&text) => message,
    };
    sink.finalize(&message);

    tracing::info!(
        chars = text.len(),
        deltas = session.delta_count(),
        skipped = session.skipped_lines(),
        terminated = session.is_terminated(),
        "Response finished"
    );

    match failure {
        Some(error) => StreamOutcome::Interrupted { text, error },
        None => StreamOutcome::Completed {
            text,
            terminated: session.is_terminated(),
        },
    }
}

fn abort(session: &mut StreamSession, sink: &mut dyn RenderSink) -> StreamOutcome {
    session.abort();
    sink.abort();
    tracing::info!(chars = session.text().len(), "Response aborted");

    StreamOutcome::Aborted {
        partial: session.text().to_string(),
    }
}
