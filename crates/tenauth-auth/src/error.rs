//! Authentication error types.
//!
//! Business-rule rejections each have their own variant so callers can
//! map them to precise responses. Store and infrastructure failures are
//! carried unchanged in [`AuthError::Store`].

use tenauth_core::error::TenauthError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("tenant not found")]
    TenantNotFound,

    #[error("tenant is inactive")]
    TenantInactive,

    #[error("tenant could not be determined from the request")]
    TenantContextMissing,

    #[error("token belongs to another tenant")]
    TenantMismatch,

    #[error("user not found")]
    UserNotFound,

    #[error("user already exists")]
    UserAlreadyExists,

    #[error("user is inactive")]
    UserInactive,

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("maximum users reached for tenant")]
    MaxUsersReached,

    #[error("insufficient privileges")]
    InsufficientRole,

    #[error("invalid refresh token")]
    InvalidRefreshToken,

    #[error("session expired")]
    SessionExpired,

    #[error("token has expired")]
    TokenExpired,

    #[error("invalid token: {0}")]
    TokenInvalid(String),

    #[error("token kind mismatch: expected {expected}")]
    TokenKindMismatch { expected: &'static str },

    #[error("validation error: {0}")]
    Validation(String),

    #[error("cryptography error: {0}")]
    Crypto(String),

    #[error(transparent)]
    Store(#[from] TenauthError),
}

impl AuthError {
    /// HTTP-equivalent status code for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            AuthError::Validation(_) | AuthError::TenantContextMissing => 400,
            AuthError::InvalidCredentials
            | AuthError::InvalidRefreshToken
            | AuthError::SessionExpired
            | AuthError::TokenExpired
            | AuthError::TokenInvalid(_)
            | AuthError::TokenKindMismatch { .. } => 401,
            AuthError::TenantInactive
            | AuthError::TenantMismatch
            | AuthError::UserInactive
            | AuthError::MaxUsersReached
            | AuthError::InsufficientRole => 403,
            AuthError::TenantNotFound | AuthError::UserNotFound => 404,
            AuthError::UserAlreadyExists => 409,
            AuthError::Crypto(_) | AuthError::Store(_) => 500,
        }
    }

    /// True for failures that are not a business-rule rejection
    /// (store outages, timeouts, key problems).
    pub fn is_infrastructure(&self) -> bool {
        matches!(self, AuthError::Store(_) | AuthError::Crypto(_))
    }
}
