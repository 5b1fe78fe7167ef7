use axum::{extract::rejection::JsonRejection, http::StatusCode, response::IntoResponse, Json};
use parley_core::{types::ErrorResponse, validation::ValidationError};
use tracing::error;

use crate::state::RequestId;

#[derive(Debug)]
pub enum AppError {
    BadRequest(String),
    Validation(ValidationError),
    NotFound(String),
    MethodNotAllowed,
    Internal(String),
}

#[derive(Debug)]
pub struct ApiError {
    pub error: AppError,
    pub request_id: String,
}

impl AppError {
    pub fn with_request_id(self, request_id: &str) -> ApiError {
        ApiError {
            error: self,
            request_id: request_id.to_string(),
        }
    }
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::Validation(err)
    }
}

/// Turns a store failure into a 500 carrying only `message`; the cause is
/// logged against the request id.
pub fn store_error<'a>(
    request_id: &'a RequestId,
    message: &'static str,
) -> impl FnOnce(sqlx::Error) -> ApiError + 'a {
    move |err| {
        error!(request_id = %request_id.0, error = %err, "{}", message);
        AppError::Internal(message.to_string()).with_request_id(&request_id.0)
    }
}

pub fn bad_body(rejection: JsonRejection, request_id: &RequestId) -> ApiError {
    AppError::BadRequest(rejection.body_text()).with_request_id(&request_id.0)
}

pub fn not_found(message: &str, request_id: &RequestId) -> ApiError {
    AppError::NotFound(message.to_string()).with_request_id(&request_id.0)
}

/// Rejects identity keys that are empty after trimming.
pub fn require_key(value: &str, field: &str, request_id: &RequestId) -> ApiResult<()> {
    if value.trim().is_empty() {
        return Err(
            AppError::BadRequest(format!("{} is required", field)).with_request_id(&request_id.0)
        );
    }
    Ok(())
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self.error {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Validation(err) => (StatusCode::BAD_REQUEST, err.to_string()),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::MethodNotAllowed => (
                StatusCode::METHOD_NOT_ALLOWED,
                "Method not allowed".to_string(),
            ),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        (
            status,
            Json(ErrorResponse {
                success: false,
                error: message,
            }),
        )
            .into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
