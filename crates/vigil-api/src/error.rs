//! API error types.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use vigil_media::MediaError;
use vigil_models::PlanError;

pub type ApiResult<T> = Result<T, ApiError>;

/// Message returned when a request names no footage or no markers.
pub const MISSING_INPUT_MESSAGE: &str = "Missing videoUrl or timestamps";

/// Message returned when assembly fails after the request was accepted.
pub const GENERATION_FAILED_MESSAGE: &str = "Failed to generate video clip";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid clip markers: {0}")]
    Plan(#[from] PlanError),

    #[error("Media error: {0}")]
    Media(#[from] MediaError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn missing_input() -> Self {
        Self::BadRequest(MISSING_INPUT_MESSAGE.to_string())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) | ApiError::Validation(_) | ApiError::Plan(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Media(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn body(&self) -> ErrorResponse {
        match self {
            ApiError::BadRequest(msg) => ErrorResponse::new(msg.clone()),
            ApiError::Validation(msg) => {
                ErrorResponse::new("Invalid request").with_details(msg.clone())
            }
            ApiError::Plan(e) => ErrorResponse::new("Invalid clip plan").with_details(e.to_string()),
            ApiError::Media(e) => {
                ErrorResponse::new(GENERATION_FAILED_MESSAGE).with_details(e.details())
            }
            ApiError::Internal(msg) => {
                ErrorResponse::new("An internal error occurred").with_details(msg.clone())
            }
        }
    }
}

/// Public message of an error response, kept in the response extensions so
/// details can be stripped later without re-parsing the body.
#[derive(Debug, Clone)]
pub struct ErrorSummary(pub String);

impl ErrorSummary {
    /// Response carrying only the public message.
    pub fn respond(self, status: StatusCode) -> Response {
        (status, Json(ErrorResponse::new(self.0))).into_response()
    }
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl ErrorResponse {
    fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: None,
        }
    }

    fn with_details(mut self, details: String) -> Self {
        self.details = Some(details);
        self
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        }

        let body = self.body();
        let summary = ErrorSummary(body.error.clone());
        let mut response = (status, Json(body)).into_response();
        response.extensions_mut().insert(summary);
        response
    }
}
