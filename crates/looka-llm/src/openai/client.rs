// OpenAI-compatible client implementation

use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::{ChatSettings, Endpoint, DEFAULT_REFERER, DEFAULT_TITLE};
use crate::error::{LlmError, Result};
use crate::streaming::ByteStream;
use crate::traits::{ChatClient, ChatRequest, ChatResponse, TokenUsage};
use crate::types::Message;

/// Chat completions client (HTTP direct, no SDK)
///
/// Talks either to the upstream API with a bearer key, or to the proxy which
/// injects the key server-side.
pub struct CompletionsClient {
    http_client: reqwest::Client,
    endpoint: Endpoint,
    referer: String,
    title: String,
}

/// Outcome of a connectivity probe
#[derive(Debug, Clone, Serialize)]
pub struct ProbeResult {
    pub status: u16,
    pub body: Value,
}

impl CompletionsClient {
    pub fn new(endpoint: Endpoint) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http_client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            http_client,
            endpoint,
            referer: DEFAULT_REFERER.to_string(),
            title: DEFAULT_TITLE.to_string(),
        })
    }

    pub fn from_settings(settings: &ChatSettings) -> Result<Self> {
        Ok(Self::new(settings.endpoint())?
            .with_referer(settings.referer.clone())
            .with_title(settings.title.clone()))
    }

    pub fn with_referer(mut self, referer: impl Into<String>) -> Self {
        self.referer = referer.into();
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Send a one-token "Ping" to check key and connectivity
    ///
    /// Non-2xx answers are returned as data rather than errors.
    pub async fn probe(&self, model: &str) -> Result<ProbeResult> {
        let payload = serde_json::json!({
            "model": model,
            "messages": [Message::user("Ping")],
            "max_tokens": 1,
            "temperature": 0.0,
            "stream": false,
        });

        tracing::info!(
            model,
            key = %mask_key(self.endpoint.api_key()),
            url = %self.endpoint.completions_url(),
            "Probing model"
        );

        let response = self.post(&payload)?.send().await?;
        let status = response.status().as_u16();
        let text = response.text().await?;
        let body = serde_json::from_str(&text).unwrap_or(Value::String(text));

        Ok(ProbeResult { status, body })
    }

    /// Build chat completion request payload
    fn build_chat_request(&self, request: &ChatRequest, stream: bool) -> Result<Value> {
        let mut payload = serde_json::json!({
            "model": request.model,
            "messages": serde_json::to_value(&request.messages)?,
            "stream": stream,
        });

        if let Some(obj) = payload.as_object_mut() {
            if let Some(temp) = request.options.temperature {
                obj.insert("temperature".to_string(), serde_json::json!(temp));
            }
            if let Some(max_tokens) = request.options.max_tokens {
                obj.insert("max_tokens".to_string(), serde_json::json!(max_tokens));
            }
        }

        Ok(payload)
    }

    /// Prepare a POST, failing fast when a direct endpoint has no usable key
    fn post(&self, payload: &Value) -> Result<RequestBuilder> {
        let credential = self.endpoint.credential()?;

        let mut builder = self
            .http_client
            .post(self.endpoint.completions_url())
            .header("HTTP-Referer", HeaderValue::from_str(&self.referer)?)
            .header("X-Title", HeaderValue::from_str(&self.title)?)
            .json(payload);

        if let Some(api_key) = credential {
            builder = builder.header(
                AUTHORIZATION,
                HeaderValue::from_str(&format!("Bearer {}", api_key))?,
            );
        }

        Ok(builder)
    }

    async fn send(&self, payload: &Value) -> Result<Response> {
        let response = self.post(payload)?.send().await?;
        ensure_success(response).await
    }
}

// ============================================================================
// TRAIT IMPLEMENTATIONS
// ============================================================================

#[async_trait]
impl ChatClient for CompletionsClient {
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse> {
        let payload = self.build_chat_request(&request, false)?;
        let response = self.send(&payload).await?;

        let raw: CompletionResponse = response.json().await?;

        let choice = raw.choices.first();
        Ok(ChatResponse {
            content: choice.and_then(|c| c.message.content.clone()),
            usage: raw.usage.as_ref().map(|u| TokenUsage {
                input_tokens: u.prompt_tokens,
                output_tokens: u.completion_tokens,
                total_tokens: u.total_tokens,
            }),
            finish_reason: choice.and_then(|c| c.finish_reason.clone()),
            raw: serde_json::to_value(&raw)?,
        })
    }

    async fn chat_stream(&self, request: ChatRequest) -> Result<ByteStream> {
        let payload = self.build_chat_request(&request, true)?;

        tracing::info!(
            model = %request.model,
            messages = request.messages.len(),
            url = %self.endpoint.completions_url(),
            "Starting streaming completion"
        );

        let response = self.send(&payload).await?;

        if is_json_response(&response) {
            return single_body_stream(response).await;
        }

        Ok(Box::pin(
            response
                .bytes_stream()
                .map(|chunk| chunk.map_err(LlmError::from)),
        ))
    }
}

// ============================================================================
// HELPERS
// ============================================================================

async fn ensure_success(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = api_error_message(&body);
    tracing::warn!(status = %status, %message, "Chat completion rejected");

    Err(LlmError::Api {
        status: status.as_u16(),
        message,
    })
}

/// User-facing message from an error body
///
/// `error.message`, else `error` when it is a string, else a generic text.
/// Bodies that are not JSON are returned trimmed.
pub fn api_error_message(body: &str) -> String {
    match serde_json::from_str::<Value>(body) {
        Ok(value) => {
            let error = &value["error"];
            error
                .get("message")
                .and_then(Value::as_str)
                .or_else(|| error.as_str())
                .unwrap_or("Unknown API error")
                .to_string()
        }
        Err(_) if !body.trim().is_empty() => body.trim().to_string(),
        Err(_) => "Unknown API error".to_string(),
    }
}

/// Mask a key for logs: `sk-or-v1...abcd`
pub fn mask_key(key: Option<&str>) -> String {
    let Some(key) = key.filter(|k| !k.is_empty()) else {
        return "MISSING".to_string();
    };

    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 12 {
        let visible = chars.len().saturating_sub(4);
        return chars
            .iter()
            .enumerate()
            .map(|(i, c)| if i < visible { '*' } else { *c })
            .collect();
    }

    let head: String = chars[..8].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}

fn is_json_response(response: &Response) -> bool {
    response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("application/json"))
}

/// A streaming request answered with one JSON object
///
/// Errors reported in a 2xx body are surfaced as API errors; a complete
/// message is re-framed as a single data event plus terminator so the
/// pipeline handles it like any other stream.
async fn single_body_stream(response: Response) -> Result<ByteStream> {
    let status = response.status().as_u16();
    let body = response.bytes().await?;

    let framed = match serde_json::from_slice::<Value>(&body) {
        Ok(value) if !value["error"].is_null() => {
            return Err(LlmError::Api {
                status,
                message: api_error_message(&String::from_utf8_lossy(&body)),
            });
        }
        Ok(value) => match value["choices"][0]["message"]["content"].as_str() {
            Some(content) => {
                tracing::debug!("Upstream answered without streaming, re-framing body");
                let chunk = serde_json::json!({"choices": [{"delta": {"content": content}}]});
                Bytes::from(format!("data: {}\n\ndata: [DONE]\n\n", chunk))
            }
            None => body,
        },
        Err(_) => body,
    };

    Ok(Box::pin(futures::stream::once(async move { Ok(framed) })))
}

// ============================================================================
// RESPONSE TYPES (non-streaming)
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    pub choices: Vec<Choice>,
    #[serde(default)]
    pub usage: Option<Usage>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Choice {
    pub message: ResponseMessage,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}
