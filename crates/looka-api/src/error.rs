use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::config::API_KEY_VAR;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{} is not set", API_KEY_VAR)]
    MissingKey,

    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("Proxy error")]
    Upstream(#[from] reqwest::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            ApiError::MissingKey => {
                tracing::error!("{} is not set; refusing to proxy", API_KEY_VAR);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": self.to_string() }),
                )
            }
            ApiError::MethodNotAllowed => (
                StatusCode::METHOD_NOT_ALLOWED,
                json!({ "error": self.to_string() }),
            ),
            ApiError::Upstream(e) => {
                tracing::error!("Proxy error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": self.to_string(), "message": e.to_string() }),
                )
            }
            ApiError::Internal(message) => {
                tracing::error!("Internal error: {}", message);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "Internal error", "message": message }),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}
