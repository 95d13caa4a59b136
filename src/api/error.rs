use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::fmt;

use super::ApiResponse;
use crate::services::{AuthError, ResetError};

#[derive(Debug)]
pub enum ApiError {
    NotFound(String),

    DatabaseError(String),

    ValidationError(String),

    Conflict(String),

    InternalError(String),

    /// Generic credential failure. Deliberately does not distinguish
    /// unknown user from wrong password.
    Unauthorized(String),

    /// No valid session. Carries the originally requested path so the
    /// client can resume there after logging in.
    Unauthenticated { next: Option<String> },

    /// Valid session, wrong role. The body never reveals which role would
    /// have sufficed.
    Forbidden,

    /// Outbound mail failed; the underlying operation (e.g. token
    /// issuance) is not rolled back.
    DeliveryFailure(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::DatabaseError(msg) => write!(f, "Database error: {}", msg),
            ApiError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            ApiError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
            ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ApiError::Unauthenticated { .. } => write!(f, "Authentication required"),
            ApiError::Forbidden => write!(f, "Forbidden"),
            ApiError::DeliveryFailure(msg) => write!(f, "Delivery failure: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            ApiError::DatabaseError(msg) => {
                tracing::error!("Database error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "A database error occurred".to_string(),
                )
            }
            ApiError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            ApiError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal error occurred".to_string(),
                )
            }
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
            ApiError::Unauthenticated { next } => {
                let body = serde_json::json!({
                    "success": false,
                    "error": "Authentication required",
                    "next": next,
                });
                return (StatusCode::UNAUTHORIZED, Json(body)).into_response();
            }
            ApiError::Forbidden => (
                StatusCode::FORBIDDEN,
                "Forbidden: insufficient permissions".to_string(),
            ),
            ApiError::DeliveryFailure(msg) => {
                tracing::warn!("Mail delivery failure: {}", msg);
                (StatusCode::BAD_GATEWAY, msg.clone())
            }
        };

        let body = ApiResponse::<()>::error(error_message);
        (status, Json(body)).into_response()
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::InternalError(err.to_string())
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials => {
                ApiError::Unauthorized("Invalid credentials".to_string())
            }
            AuthError::DuplicateUsername => ApiError::Conflict("Username already exists".to_string()),
            AuthError::UserNotFound => ApiError::NotFound("User not found".to_string()),
            AuthError::Validation(msg) => ApiError::ValidationError(msg),
            AuthError::Database(msg) => ApiError::DatabaseError(msg),
            AuthError::Internal(msg) => ApiError::InternalError(msg),
        }
    }
}

impl From<ResetError> for ApiError {
    fn from(err: ResetError) -> Self {
        match err {
            ResetError::UnknownEmail => {
                ApiError::NotFound("No user found with that email".to_string())
            }
            ResetError::InvalidOrExpired => {
                ApiError::ValidationError("Invalid or expired token".to_string())
            }
            ResetError::Delivery(msg) => ApiError::DeliveryFailure(msg),
            ResetError::Validation(msg) => ApiError::ValidationError(msg),
            ResetError::Database(msg) => ApiError::DatabaseError(msg),
            ResetError::Internal(msg) => ApiError::InternalError(msg),
        }
    }
}

impl ApiError {
    pub fn not_found(resource: &str, id: impl fmt::Display) -> Self {
        ApiError::NotFound(format!("{} {} not found", resource, id))
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        ApiError::ValidationError(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        ApiError::InternalError(msg.into())
    }
}
