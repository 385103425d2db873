use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    response::IntoResponse,
    Router,
};
use looka_api::{build_router, config::Config, error::ApiError, state::AppState};
use mockito::Matcher;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

const KEY: &str = "sk-or-test-secret";

fn app(upstream_url: &str, key: Option<&str>) -> Router {
    let mut config = Config::default();
    config.upstream.url = upstream_url.to_string();
    if let Some(key) = key {
        config = config.with_api_key(key);
    }
    build_router(Arc::new(AppState::new(config)))
}

fn proxy_request(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/proxy")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_text(response: axum::response::Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    serde_json::from_str(&body_text(response).await).unwrap()
}

#[tokio::test]
async fn test_forwards_body_with_server_key() {
    let mut server = mockito::Server::new_async().await;
    let payload = json!({"model": "qwen/qwen3-4b:free", "stream": true, "messages": []}).to_string();
    let mock = server
        .mock("POST", "/chat/completions")
        .match_header("authorization", "Bearer sk-or-test-secret")
        .match_header("http-referer", "https://looka-ai.vercel.app")
        .match_header("x-title", "Looka AI Assistant")
        .match_body(Matcher::JsonString(payload.clone()))
        .with_status(200)
        .with_header("content-type", "text/event-stream")
        .with_body("data: {\"choices\":[{\"delta\":{\"content\":\"Hi\"}}]}\n\ndata: [DONE]\n\n")
        .create_async()
        .await;

    let response = app(&server.url(), Some(KEY))
        .oneshot(proxy_request(&payload))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["content-type"], "text/event-stream");
    let text = body_text(response).await;
    assert!(text.ends_with("data: [DONE]\n\n"));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_caller_referer_is_forwarded() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/chat/completions")
        .match_header("http-referer", "http://localhost:5173/")
        .with_status(200)
        .with_body("{}")
        .create_async()
        .await;

    let mut request = proxy_request("{}");
    request
        .headers_mut()
        .insert("referer", "http://localhost:5173/".parse().unwrap());

    let response = app(&server.url(), Some(KEY)).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_upstream_error_status_is_relayed() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/chat/completions")
        .with_status(429)
        .with_header("content-type", "application/json")
        .with_body(r#"{"error":{"message":"Rate limited"}}"#)
        .create_async()
        .await;

    let response = app(&server.url(), Some(KEY))
        .oneshot(proxy_request("{}"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body_json(response).await["error"]["message"], "Rate limited");
}

#[tokio::test]
async fn test_missing_key_never_calls_upstream() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/chat/completions")
        .expect(0)
        .create_async()
        .await;

    let response = app(&server.url(), None)
        .oneshot(proxy_request("{}"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body_json(response).await,
        json!({"error": "OPENROUTER_API_KEY is not set"})
    );
    mock.assert_async().await;
}

#[tokio::test]
async fn test_unreachable_upstream_is_proxy_error() {
    let response = app("http://127.0.0.1:1", Some(KEY))
        .oneshot(proxy_request("{}"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Proxy error");
    assert!(body["message"].as_str().is_some_and(|m| !m.is_empty()));
}

#[tokio::test]
async fn test_options_and_other_methods() {
    let router = app("http://127.0.0.1:1", Some(KEY));

    let options = Request::builder()
        .method("OPTIONS")
        .uri("/api/proxy")
        .body(Body::empty())
        .unwrap();
    let response = router.clone().oneshot(options).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let get = Request::builder()
        .method("GET")
        .uri("/api/proxy")
        .body(Body::empty())
        .unwrap();
    let response = router.oneshot(get).await.unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(body_json(response).await, json!({"error": "Method not allowed"}));
}

#[tokio::test]
async fn test_cors_allows_any_origin() {
    let preflight = Request::builder()
        .method("OPTIONS")
        .uri("/api/proxy")
        .header("origin", "https://example.com")
        .header("access-control-request-method", "POST")
        .header("access-control-request-headers", "content-type,x-title")
        .body(Body::empty())
        .unwrap();

    let response = app("http://127.0.0.1:1", Some(KEY))
        .oneshot(preflight)
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["access-control-allow-origin"], "*");
    let methods = response.headers()["access-control-allow-methods"]
        .to_str()
        .unwrap()
        .to_string();
    assert!(methods.contains("POST"));
    assert!(methods.contains("OPTIONS"));
}

#[tokio::test]
async fn test_check_never_exposes_key() {
    let request = Request::builder()
        .uri("/api/check")
        .body(Body::empty())
        .unwrap();

    let response = app("http://127.0.0.1:1", Some(KEY))
        .oneshot(request)
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let text = body_text(response).await;
    assert!(!text.contains(KEY));
    let body: Value = serde_json::from_str(&text).unwrap();
    assert_eq!(body["environment_variable_set"], true);
    assert!(body["found_openrouter_keys"].is_array());
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn test_health() {
    let request = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();

    let response = app("http://127.0.0.1:1", None).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_api_error_response() {
    let response = ApiError::MethodNotAllowed.into_response();

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}
