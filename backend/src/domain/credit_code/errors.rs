//! Credit code error types.

use axum::http::StatusCode;
use thiserror::Error;

use crate::domain::foundation::{DomainError, ErrorCode, ValidationError};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CreditCodeError {
    #[error("Credit code not found")]
    NotFound,

    #[error("Credit code already used")]
    AlreadyUsed,

    #[error("Grant amount must be between 1 and {max}, got {actual}")]
    InvalidGrant { max: i64, actual: i64 },

    #[error("Invalid credit code: {0}")]
    InvalidCode(String),

    /// The caller has no entitlement that could receive the credit.
    #[error("No entitlement for this identity")]
    EntitlementMissing,

    #[error("Caller may not issue credit codes")]
    Forbidden,

    /// Generated code already exists. Retry with a fresh timestamp.
    #[error("Credit code collision")]
    Collision,

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Store error: {0}")]
    Store(String),
}

impl CreditCodeError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            CreditCodeError::NotFound | CreditCodeError::EntitlementMissing => {
                StatusCode::NOT_FOUND
            }
            CreditCodeError::AlreadyUsed => StatusCode::CONFLICT,
            CreditCodeError::InvalidGrant { .. } | CreditCodeError::InvalidCode(_) => {
                StatusCode::BAD_REQUEST
            }
            CreditCodeError::Forbidden => StatusCode::FORBIDDEN,
            CreditCodeError::Collision
            | CreditCodeError::Internal(_)
            | CreditCodeError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, CreditCodeError::Collision | CreditCodeError::Store(_))
    }
}

impl From<ValidationError> for CreditCodeError {
    fn from(err: ValidationError) -> Self {
        CreditCodeError::InvalidCode(err.to_string())
    }
}

impl From<DomainError> for CreditCodeError {
    fn from(err: DomainError) -> Self {
        match err.code {
            ErrorCode::CreditCodeConflict => CreditCodeError::Collision,
            ErrorCode::EntitlementNotFound => CreditCodeError::EntitlementMissing,
            _ => CreditCodeError::Store(err.message),
        }
    }
}
