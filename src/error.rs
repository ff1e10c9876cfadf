// Error types for the search client and for the HTTP handlers

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use thiserror::Error;

// Failures talking to the remote search service
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("request to search service failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("search service returned {status}: {detail}")]
    Status { status: StatusCode, detail: String },
}

// Application error returned by axum handlers
#[derive(Debug)]
pub enum AppError {
    InternalServerError(anyhow::Error),
    BadRequest(String),
    Conflict(String),
}

impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        AppError::InternalServerError(error)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::InternalServerError(e) => {
                tracing::error!("Internal server error: {:?}", e);
                // Don't expose internal details to the client
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error".to_string())
            }
            AppError::BadRequest(message) => {
                tracing::debug!("Rejected request: {}", message);
                (StatusCode::BAD_REQUEST, message)
            }
            AppError::Conflict(message) => {
                tracing::debug!("Request conflicts with session state: {}", message);
                (StatusCode::CONFLICT, message)
            }
        };

        let body = Json(json!({ "success": false, "error": error_message }));
        (status, body).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
