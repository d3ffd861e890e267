//! Entitlement error types.
//!
//! # HTTP Status Mapping
//!
//! | Error | HTTP Status |
//! |-------|-------------|
//! | Malformed | 400 |
//! | CryptographicFailure | 401 |
//! | OriginMismatch | 401 |
//! | NotFound | 401 |
//! | InsufficientCredit | 403 |
//! | TransientStoreFailure | 500 |

use axum::http::StatusCode;
use thiserror::Error;

use crate::domain::foundation::{DomainError, ErrorCode};
use crate::domain::token::TokenError;

/// Why a presented token was not accepted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerifyError {
    /// Structurally invalid token or request origin.
    #[error("Malformed request: {0}")]
    Malformed(String),

    /// AEAD authentication failed.
    #[error("Token failed authentication")]
    CryptographicFailure,

    #[error("Token is bound to a different origin")]
    OriginMismatch,

    /// No entitlement matches the token's identity and issuance time.
    #[error("No entitlement for this token")]
    NotFound,

    #[error("No credit remaining")]
    InsufficientCredit,

    /// The store timed out or failed. Nothing was committed.
    #[error("Store unavailable: {0}")]
    TransientStoreFailure(String),
}

impl VerifyError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            VerifyError::Malformed(_) => StatusCode::BAD_REQUEST,
            VerifyError::CryptographicFailure
            | VerifyError::OriginMismatch
            | VerifyError::NotFound => StatusCode::UNAUTHORIZED,
            VerifyError::InsufficientCredit => StatusCode::FORBIDDEN,
            VerifyError::TransientStoreFailure(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Only store failures are worth repeating unchanged.
    pub fn is_retryable(&self) -> bool {
        matches!(self, VerifyError::TransientStoreFailure(_))
    }
}

impl From<TokenError> for VerifyError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Malformed(reason) => VerifyError::Malformed(reason),
            TokenError::Tampered => VerifyError::CryptographicFailure,
            // The verifier only re-derives keys, so a sealing failure here is
            // a server fault rather than a bad token.
            TokenError::Sealing(reason) => VerifyError::TransientStoreFailure(reason),
        }
    }
}

impl From<DomainError> for VerifyError {
    fn from(err: DomainError) -> Self {
        VerifyError::TransientStoreFailure(err.message)
    }
}

/// Failures of issuance and account lookups.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EntitlementError {
    #[error("Invalid origin: {0}")]
    InvalidOrigin(String),

    #[error("Identity already holds a token")]
    IdentityAlreadyBound,

    #[error("Origin is already bound to another identity")]
    OriginAlreadyBound,

    #[error("No entitlement for this identity")]
    NotFound,

    #[error("Token issuance failed: {0}")]
    Sealing(String),

    #[error("Store error: {0}")]
    Store(String),
}

impl EntitlementError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            EntitlementError::InvalidOrigin(_) => StatusCode::BAD_REQUEST,
            EntitlementError::IdentityAlreadyBound | EntitlementError::OriginAlreadyBound => {
                StatusCode::CONFLICT
            }
            EntitlementError::NotFound => StatusCode::NOT_FOUND,
            EntitlementError::Sealing(_) | EntitlementError::Store(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, EntitlementError::Store(_))
    }
}

impl From<DomainError> for EntitlementError {
    fn from(err: DomainError) -> Self {
        match err.code {
            ErrorCode::IdentityAlreadyBound => EntitlementError::IdentityAlreadyBound,
            ErrorCode::OriginAlreadyBound => EntitlementError::OriginAlreadyBound,
            ErrorCode::EntitlementNotFound => EntitlementError::NotFound,
            _ => EntitlementError::Store(err.message),
        }
    }
}

impl From<TokenError> for EntitlementError {
    fn from(err: TokenError) -> Self {
        EntitlementError::Sealing(err.to_string())
    }
}
