use anyhow::Result;
use looka_llm::{ChatClient, ChatRequest, CompletionsClient, Endpoint, Message};

#[tokio::main]
async fn main() -> Result<()> {
    let api_key = std::env::var("OPENROUTER_API_KEY")?;
    let client = CompletionsClient::new(Endpoint::direct(api_key))?;

    let request = ChatRequest::new(
        "qwen/qwen3-4b:free",
        vec![Message::user("What is the capital of France?")],
    );

    let response = client.chat(request).await?;

    println!("Response: {}", response.content.unwrap_or_default());

    if let Some(usage) = response.usage {
        println!("Tokens used: {}", usage.total_tokens);
    }

    Ok(())
}
