use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::policy::PolicyError;
use crate::store::StoreError;
use crate::utils::session::TokenError;
use crate::voting::VoteError;

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("Authentication error: {0}")]
    AuthenticationError(String),
    #[error("Authorization error: {0}")]
    AuthorizationError(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Store unavailable: {0}")]
    TransientStoreError(String),
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match self {
            AppError::ValidationError(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg),
            AppError::AuthenticationError(msg) => {
                (StatusCode::UNAUTHORIZED, "AUTHENTICATION_ERROR", msg)
            }
            AppError::AuthorizationError(msg) => (StatusCode::FORBIDDEN, "AUTHORIZATION_ERROR", msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg),
            // Duplicate email, closed poll and repeat votes all surface as 400.
            AppError::Conflict(msg) => (StatusCode::BAD_REQUEST, "CONFLICT", msg),
            AppError::TransientStoreError(msg) => {
                error!(error = %msg, "store operation failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "STORE_UNAVAILABLE",
                    "Storage is temporarily unavailable, please retry".to_string(),
                )
            }
            AppError::InternalError(msg) => {
                error!(error = %msg, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal error occurred".to_string(),
                )
            }
        };

        let error_response = ErrorResponse {
            error: error_type.to_string(),
            message,
        };

        (status, Json(error_response)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(what) => AppError::NotFound(format!("{what} not found")),
            StoreError::DuplicateEmail => AppError::Conflict("User already exists".to_string()),
            StoreError::AdminProtected => {
                AppError::Conflict("Cannot delete admin user".to_string())
            }
            StoreError::Vote(err) => err.into(),
            StoreError::Timeout(_) | StoreError::Unavailable(_) | StoreError::Contended => {
                AppError::TransientStoreError(err.to_string())
            }
            StoreError::Corrupt(msg) => AppError::InternalError(msg),
        }
    }
}

impl From<VoteError> for AppError {
    fn from(err: VoteError) -> Self {
        match err {
            VoteError::OptionNotFound => AppError::NotFound(err.to_string()),
            VoteError::PollClosed(_) | VoteError::AlreadyVoted => AppError::Conflict(err.to_string()),
        }
    }
}

impl From<TokenError> for AppError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::InvalidToken | TokenError::Expired => {
                AppError::AuthenticationError(err.to_string())
            }
            TokenError::Signing(msg) => {
                AppError::InternalError(format!("Failed to create session token: {msg}"))
            }
        }
    }
}

impl From<PolicyError> for AppError {
    fn from(err: PolicyError) -> Self {
        match err {
            PolicyError::Unauthenticated => AppError::AuthenticationError(err.to_string()),
            PolicyError::Forbidden(_) => AppError::AuthorizationError(err.to_string()),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::ValidationError(rejection.body_text())
    }
}
