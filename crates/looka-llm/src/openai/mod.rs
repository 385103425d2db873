// OpenAI-compatible chat completions (OpenRouter upstream or the Looka proxy)

mod client;

pub use client::{api_error_message, mask_key, CompletionsClient, ProbeResult};
