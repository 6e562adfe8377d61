//! HTTP error mapping for lexflow-api

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use lexflow_common::{Error, LifecycleError};
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// lexflow-common error, mapped by kind
    #[error(transparent)]
    Common(#[from] Error),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl ApiError {
    fn parts(self) -> (StatusCode, &'static str, String) {
        match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg),
            ApiError::Common(err) => match err {
                // The upstream classifier produced an unusable answer
                Error::Validation(e) => (StatusCode::BAD_GATEWAY, e.reason(), e.to_string()),
                Error::Classifier(e) => {
                    (StatusCode::BAD_GATEWAY, "CLASSIFIER_ERROR", e.to_string())
                }
                Error::Input(e) => (StatusCode::BAD_REQUEST, "INVALID_INPUT", e.to_string()),
                Error::Lifecycle(e @ LifecycleError::InvalidStatus { .. }) => {
                    (StatusCode::BAD_REQUEST, "INVALID_STATUS", e.to_string())
                }
                Error::Lifecycle(e @ LifecycleError::CaseNotFound(_)) => {
                    (StatusCode::NOT_FOUND, "NOT_FOUND", e.to_string())
                }
                Error::NotFound(what) => {
                    (StatusCode::NOT_FOUND, "NOT_FOUND", format!("{} not found", what))
                }
                Error::Lifecycle(LifecycleError::Store { id, source }) => {
                    error!(intake_id = %id, "Store failure: {}", source);
                    store_failure()
                }
                Error::Store(e) => {
                    error!("Store failure: {}", e);
                    store_failure()
                }
                other => {
                    error!("Internal failure: {}", other);
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "INTERNAL_ERROR",
                        "Internal server error".to_string(),
                    )
                }
            },
        }
    }
}

fn store_failure() -> (StatusCode, &'static str, String) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "STORE_ERROR",
        "Failed to access intake records".to_string(),
    )
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
