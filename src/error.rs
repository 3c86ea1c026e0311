// src/error.rs

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;

/// Global Application Error Enum.
/// Every failure surfaces to clients with a stable `kind` and a readable message.
#[derive(Debug)]
pub enum AppError {
    // 500 Internal Server Error (hashing, token signing)
    InternalServerError(String),

    // 500 Internal Server Error (persistence failure)
    StoreError(String),

    // 400 Bad Request (malformed or missing input)
    BadRequest(String),

    // 400 Bad Request (grading an empty question set)
    InvalidInput(String),

    // 401 Unauthorized (no token presented)
    Unauthenticated(String),

    // 401 Unauthorized (login mismatch, same for unknown email and bad password)
    InvalidCredentials,

    // 403 Forbidden (invalid or expired token)
    Forbidden(String),

    // 404 Not Found
    NotFound(String),

    // 409 Conflict (e.g., duplicate email)
    Conflict(String),
}

impl AppError {
    /// Stable, machine-readable error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::InternalServerError(_) => "internal_error",
            AppError::StoreError(_) => "store_error",
            AppError::BadRequest(_) => "validation_error",
            AppError::InvalidInput(_) => "invalid_input",
            AppError::Unauthenticated(_) => "unauthenticated",
            AppError::InvalidCredentials => "invalid_credentials",
            AppError::Forbidden(_) => "forbidden",
            AppError::NotFound(_) => "not_found",
            AppError::Conflict(_) => "conflict",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::InternalServerError(_) | AppError::StoreError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::BadRequest(_) | AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthenticated(_) | AppError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
        }
    }

    /// Shorthand for the grading failure on a zero-length question set.
    pub fn empty_question_set() -> Self {
        AppError::InvalidInput("empty question set".to_string())
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::InternalServerError(msg) => write!(f, "internal error: {}", msg),
            AppError::StoreError(msg) => write!(f, "store error: {}", msg),
            AppError::BadRequest(msg) => write!(f, "validation error: {}", msg),
            AppError::InvalidInput(msg) => write!(f, "invalid input: {}", msg),
            AppError::Unauthenticated(msg) => write!(f, "unauthenticated: {}", msg),
            AppError::InvalidCredentials => write!(f, "invalid credentials"),
            AppError::Forbidden(msg) => write!(f, "forbidden: {}", msg),
            AppError::NotFound(msg) => write!(f, "not found: {}", msg),
            AppError::Conflict(msg) => write!(f, "conflict: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

/// Implements `IntoResponse` for `AppError`.
/// Converts the error into a JSON response with appropriate HTTP status code.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let kind = self.kind();
        let error_message = match self {
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                "Internal Server Error".to_string()
            }
            AppError::StoreError(msg) => {
                tracing::error!("Store Error: {}", msg);
                "Storage failure".to_string()
            }
            AppError::InvalidCredentials => "Invalid credentials".to_string(),
            AppError::BadRequest(msg)
            | AppError::InvalidInput(msg)
            | AppError::Unauthenticated(msg)
            | AppError::Forbidden(msg)
            | AppError::NotFound(msg)
            | AppError::Conflict(msg) => msg,
        };
        let body = Json(json!({
            "kind": kind,
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

/// Converts `sqlx::Error` into `AppError::StoreError`.
/// Allows using `?` operator on database queries.
impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::StoreError(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::BadRequest(err.to_string())
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::BadRequest(err.to_string())
    }
}
