use axum::{extract::Request, middleware::Next, response::Response};
use std::time::Instant;
use uuid::Uuid;

/// Log one line per request with a request id, status and latency
pub async fn log_request(req: Request, next: Next) -> Response {
    let request_id = Uuid::new_v4();
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let started = Instant::now();

    tracing::debug!(%request_id, %method, %path, "Request received");

    let response = next.run(req).await;
    let status = response.status();
    let latency_ms = started.elapsed().as_millis() as u64;

    if status.is_server_error() {
        tracing::warn!(%request_id, %method, %path, status = status.as_u16(), latency_ms, "Request failed");
    } else {
        tracing::info!(%request_id, %method, %path, status = status.as_u16(), latency_ms, "Request completed");
    }

    response
}
