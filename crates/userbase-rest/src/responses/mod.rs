//! API response types.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::{error, warn};
use userbase_core::{ErrorKind, ErrorResponse, FieldError, UserbaseError};

/// Summary used when a handler does not name its operation.
pub const REQUEST_FAILED: &str = "An error occurred while processing the request.";

/// Application error type for Axum.
///
/// Renders as `{"message", "error", "code", "details"?}` where `message`
/// names the operation that failed and `error` carries the cause.
#[derive(Debug)]
pub struct AppError {
    message: &'static str,
    error: UserbaseError,
    details: Option<Vec<FieldError>>,
}

impl AppError {
    /// Wraps `error` under an operation summary.
    #[must_use]
    pub fn new(message: &'static str, error: UserbaseError) -> Self {
        Self {
            message,
            error,
            details: None,
        }
    }

    /// Returns a closure that wraps errors under `message`, for `map_err`.
    pub fn context(message: &'static str) -> impl Fn(UserbaseError) -> Self {
        move |error| Self::new(message, error)
    }

    /// Attaches field-level validation errors.
    #[must_use]
    pub fn with_details(mut self, details: Vec<FieldError>) -> Self {
        self.details = Some(details);
        self
    }

    /// Returns the wrapped error.
    #[must_use]
    pub const fn error(&self) -> &UserbaseError {
        &self.error
    }

    /// Returns the HTTP status for the wrapped error.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        StatusCode::from_u16(self.error.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl From<UserbaseError> for AppError {
    fn from(err: UserbaseError) -> Self {
        Self::new(REQUEST_FAILED, err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        match self.error.kind() {
            ErrorKind::Connectivity | ErrorKind::Query | ErrorKind::Configuration | ErrorKind::Internal => {
                error!(error = %self.error, code = self.error.error_code(), "{}", self.message);
            }
            _ => warn!(error = %self.error, code = self.error.error_code(), "{}", self.message),
        }

        let mut body = ErrorResponse::from_error(self.message, &self.error);
        if let Some(details) = self.details {
            body = body.with_details(details);
        }

        (status, Json(body)).into_response()
    }
}

/// Result type for Axum handlers.
pub type ApiResult<T> = Result<T, AppError>;

/// Helper to create a success (200) response.
pub fn ok<T: Serialize>(data: T) -> (StatusCode, Json<T>) {
    (StatusCode::OK, Json(data))
}

/// Helper to create a created (201) response.
pub fn created<T: Serialize>(data: T) -> (StatusCode, Json<T>) {
    (StatusCode::CREATED, Json(data))
}
