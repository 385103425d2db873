use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use futures::TryStreamExt;
use std::sync::Arc;

use crate::{
    error::{ApiError, ApiResult},
    state::AppState,
};

/// Forward a chat completion body upstream with the server-held key
///
/// The body is sent unchanged. Upstream status and content type are relayed
/// and the response body is streamed through as it arrives.
pub async fn forward(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Response> {
    let api_key = state
        .config
        .openrouter_api_key
        .as_deref()
        .ok_or(ApiError::MissingKey)?;

    let upstream = &state.config.upstream;
    let referer = headers
        .get(header::REFERER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or(&upstream.referer);

    tracing::info!(bytes = body.len(), %referer, "Forwarding chat completion");

    let response = state
        .http
        .post(upstream.completions_url())
        .header(header::CONTENT_TYPE, "application/json")
        .bearer_auth(api_key)
        .header("HTTP-Referer", referer)
        .header("X-Title", &upstream.title)
        .body(body)
        .send()
        .await?;

    let status = StatusCode::from_u16(response.status().as_u16())
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| HeaderValue::from_bytes(v.as_bytes()).ok())
        .unwrap_or_else(|| HeaderValue::from_static("application/json"));

    if !status.is_success() {
        tracing::warn!(status = status.as_u16(), "Upstream rejected request");
    }

    let stream = response
        .bytes_stream()
        .inspect_err(|e| tracing::warn!("Upstream body interrupted: {}", e));

    Ok((status, [(header::CONTENT_TYPE, content_type)], Body::from_stream(stream)).into_response())
}

pub async fn preflight() -> StatusCode {
    StatusCode::OK
}

pub async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}
