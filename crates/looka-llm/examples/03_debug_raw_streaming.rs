use anyhow::Result;
use futures::StreamExt;
use looka_llm::{ChatClient, ChatRequest, CompletionsClient, Endpoint, EventParser, LineDecoder, Message};

/// Prints every raw line of the event stream next to how it is classified
#[tokio::main]
async fn main() -> Result<()> {
    let api_key = std::env::var("OPENROUTER_API_KEY")?;
    let client = CompletionsClient::new(Endpoint::direct(api_key))?;

    let request = ChatRequest::new("qwen/qwen3-4b:free", vec![Message::user("Count to five.")]);
    let mut stream = client.chat_stream(request).await?;

    let mut decoder = LineDecoder::new();
    let parser = EventParser::new();
    let mut chunks = 0;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        chunks += 1;
        println!("--- chunk {} ({} bytes)", chunks, chunk.len());
        for line in decoder.push(&chunk) {
            println!("{:<60} => {:?}", line, parser.parse_line(&line));
        }
    }

    if let Some(dropped) = decoder.finish() {
        println!("--- dropped unterminated fragment: {:?}", dropped);
    }

    Ok(())
}
