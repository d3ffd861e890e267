//! Payment error types.
//!
//! Reconciliation status codes decide whether the gateway retries:
//! 2xx acknowledges, anything else is redelivered later.
//!
//! | Error | HTTP Status |
//! |-------|-------------|
//! | MissingField, InvalidField | 400 |
//! | MerchantMismatch, SignatureMismatch, AmountMismatch | 400 |
//! | OrderNotFound | 404 |
//! | OriginAlreadyBound, EntitlementMissing | 500 |
//! | InvalidTransition, Store | 500 |

use axum::http::StatusCode;
use thiserror::Error;

use super::price::Price;
use crate::domain::foundation::{DomainError, ErrorCode, ValidationError};

/// Result of a notification that was accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// The order settled now and its effect was applied.
    Processed,
    /// The order was already paid; nothing changed.
    AlreadyProcessed,
}

/// Why a payment notification was not acknowledged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReconcileError {
    #[error("Missing field: {0}")]
    MissingField(&'static str),

    #[error("Invalid field {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },

    #[error("Merchant id does not match")]
    MerchantMismatch,

    #[error("Invalid signature")]
    SignatureMismatch,

    #[error("Amount mismatch: order costs {expected}, notification says {actual}")]
    AmountMismatch { expected: Price, actual: Price },

    #[error("Order not found")]
    OrderNotFound,

    /// A rebind target was bound to another identity after the order was
    /// placed. Needs an operator.
    #[error("Target origin is already bound to another identity")]
    OriginAlreadyBound,

    #[error("No entitlement for the order's identity")]
    EntitlementMissing,

    #[error("Invalid state transition: {0}")]
    InvalidTransition(String),

    #[error("Store error: {0}")]
    Store(String),
}

impl ReconcileError {
    pub fn invalid_field(field: &'static str, reason: impl Into<String>) -> Self {
        ReconcileError::InvalidField {
            field,
            reason: reason.into(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ReconcileError::MissingField(_)
            | ReconcileError::InvalidField { .. }
            | ReconcileError::MerchantMismatch
            | ReconcileError::SignatureMismatch
            | ReconcileError::AmountMismatch { .. } => StatusCode::BAD_REQUEST,

            ReconcileError::OrderNotFound => StatusCode::NOT_FOUND,

            ReconcileError::OriginAlreadyBound
            | ReconcileError::EntitlementMissing
            | ReconcileError::InvalidTransition(_)
            | ReconcileError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// True when redelivering the same notification may succeed unchanged.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ReconcileError::Store(_))
    }
}

impl From<DomainError> for ReconcileError {
    fn from(err: DomainError) -> Self {
        match err.code {
            ErrorCode::OrderNotFound => ReconcileError::OrderNotFound,
            ErrorCode::OriginAlreadyBound => ReconcileError::OriginAlreadyBound,
            ErrorCode::EntitlementNotFound => ReconcileError::EntitlementMissing,
            ErrorCode::InvalidStateTransition => ReconcileError::InvalidTransition(err.message),
            _ => ReconcileError::Store(err.message),
        }
    }
}

/// Failures placing or checking a payment order.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PaymentOrderError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("No entitlement for this identity")]
    EntitlementMissing,

    #[error("New origin equals the current one")]
    SameOrigin,

    #[error("Origin is already bound to another identity")]
    OriginAlreadyBound,

    #[error("Order not found")]
    NotFound,

    #[error("Gateway error: {message}")]
    Gateway { message: String, retryable: bool },

    #[error("Store error: {0}")]
    Store(String),
}

impl PaymentOrderError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            PaymentOrderError::InvalidRequest(_) | PaymentOrderError::SameOrigin => {
                StatusCode::BAD_REQUEST
            }
            PaymentOrderError::EntitlementMissing | PaymentOrderError::NotFound => {
                StatusCode::NOT_FOUND
            }
            PaymentOrderError::OriginAlreadyBound => StatusCode::CONFLICT,
            PaymentOrderError::Gateway { .. } => StatusCode::BAD_GATEWAY,
            PaymentOrderError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn is_retryable(&self) -> bool {
        match self {
            PaymentOrderError::Gateway { retryable, .. } => *retryable,
            PaymentOrderError::Store(_) => true,
            _ => false,
        }
    }
}

impl From<ValidationError> for PaymentOrderError {
    fn from(err: ValidationError) -> Self {
        PaymentOrderError::InvalidRequest(err.to_string())
    }
}

impl From<DomainError> for PaymentOrderError {
    fn from(err: DomainError) -> Self {
        match err.code {
            ErrorCode::OrderNotFound => PaymentOrderError::NotFound,
            ErrorCode::EntitlementNotFound => PaymentOrderError::EntitlementMissing,
            ErrorCode::OriginAlreadyBound => PaymentOrderError::OriginAlreadyBound,
            _ => PaymentOrderError::Store(err.message),
        }
    }
}
