//! Auth Error Types
//!
//! This module provides auth-specific error variants that integrate
//! with the unified `kernel::error::AppError` system.

use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, kind::ErrorKind};
use platform::crypto::CryptoError;
use platform::password::PasswordHashError;
use thiserror::Error;

use crate::domain::value_object::email::EmailError;

/// Auth-specific result type alias
pub type AuthResult<T> = Result<T, AuthError>;

/// Auth-specific error variants
#[derive(Debug, Error)]
pub enum AuthError {
    /// Caller identity exceeded its request budget
    #[error("Too many requests, please try again later")]
    RateLimitExceeded { retry_after_secs: u64 },

    /// Malformed or missing input
    #[error("{0}")]
    Validation(String),

    /// Unknown email, inactive account or wrong password
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Account is locked (too many failed attempts)
    #[error("Account is temporarily locked. Please try again later.")]
    AccountLocked,

    /// CSRF token missing, wrong or expired
    #[error("Invalid CSRF token")]
    CsrfTokenInvalid,

    /// Password did not pass the strength rules or is too common
    #[error("{0}")]
    WeakPassword(String),

    /// Email already registered
    #[error("Email already registered")]
    EmailTaken,

    /// Bearer or refresh token invalid, expired or revoked
    #[error("Invalid or expired token")]
    TokenInvalid,

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Get the ErrorKind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            AuthError::RateLimitExceeded { .. } => ErrorKind::TooManyRequests,
            AuthError::Validation(_) | AuthError::WeakPassword(_) => ErrorKind::BadRequest,
            AuthError::InvalidCredentials | AuthError::TokenInvalid => ErrorKind::Unauthorized,
            AuthError::AccountLocked => ErrorKind::Locked,
            AuthError::CsrfTokenInvalid => ErrorKind::Forbidden,
            AuthError::EmailTaken => ErrorKind::Conflict,
            AuthError::Database(_) | AuthError::Internal(_) => ErrorKind::InternalServerError,
        }
    }

    /// Convert to AppError
    ///
    /// Server-side failures render a generic message; the detail only
    /// reaches the log.
    pub fn to_app_error(&self) -> AppError {
        match self {
            AuthError::RateLimitExceeded { retry_after_secs } => {
                AppError::too_many_requests(self.to_string()).with_retry_after(*retry_after_secs)
            }
            AuthError::Database(_) | AuthError::Internal(_) => {
                AppError::internal("Internal server error")
            }
            _ => AppError::new(self.kind(), self.to_string()),
        }
    }

    /// Log the error with appropriate level
    fn log(&self) {
        match self {
            AuthError::Database(e) => {
                tracing::error!(error = %e, "Auth database error");
            }
            AuthError::Internal(msg) => {
                tracing::error!(message = %msg, "Auth internal error");
            }
            AuthError::InvalidCredentials => {
                tracing::warn!("Invalid login attempt");
            }
            AuthError::AccountLocked => {
                tracing::warn!("Login attempt on locked account");
            }
            AuthError::CsrfTokenInvalid => {
                tracing::warn!("CSRF token rejected");
            }
            AuthError::RateLimitExceeded { retry_after_secs } => {
                tracing::warn!(retry_after_secs, "Rate limit exceeded");
            }
            _ => {
                tracing::debug!(error = %self, "Auth error");
            }
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        self.log();
        self.to_app_error().into_response()
    }
}

impl From<AppError> for AuthError {
    fn from(err: AppError) -> Self {
        AuthError::Internal(err.to_string())
    }
}

impl From<EmailError> for AuthError {
    fn from(err: EmailError) -> Self {
        AuthError::Validation(err.to_string())
    }
}

impl From<PasswordHashError> for AuthError {
    fn from(err: PasswordHashError) -> Self {
        AuthError::Internal(err.to_string())
    }
}

impl From<CryptoError> for AuthError {
    fn from(err: CryptoError) -> Self {
        AuthError::Internal(err.to_string())
    }
}
