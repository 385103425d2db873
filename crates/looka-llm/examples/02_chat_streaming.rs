use anyhow::Result;
use futures::StreamExt;
use looka_llm::{ChatClient, ChatRequest, ChatSettings, ClientFactory, Message, ModelCatalog, StreamSession};
use std::io::Write;

/// Streams through the local proxy unless `USE_PROXY=false`
#[tokio::main]
async fn main() -> Result<()> {
    let settings = ChatSettings {
        use_proxy: std::env::var("USE_PROXY").map(|v| v != "false").unwrap_or(true),
        api_key: std::env::var("OPENROUTER_API_KEY").ok(),
        ..Default::default()
    };
    let client = ClientFactory::create_client(&settings)?;

    let request = ChatRequest::new(
        settings.model.clone(),
        vec![Message::user("Write a haiku about Rust.")],
    )
    .with_options(settings.options(&ModelCatalog::default()));

    let mut stream = client.chat_stream(request).await?;
    let mut session = StreamSession::new();

    while let Some(chunk) = stream.next().await {
        for delta in session.feed(&chunk?) {
            print!("{}", delta);
            std::io::stdout().flush()?;
        }
    }
    session.finish();

    println!(
        "\n\n{} deltas, terminated: {}",
        session.delta_count(),
        session.is_terminated()
    );

    Ok(())
}
