//! JSON error bodies for the `/api` routes.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::domain::credit_code::CreditCodeError;
use crate::domain::entitlement::EntitlementError;
use crate::domain::payment::PaymentOrderError;

/// Standard error response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling.
    pub error_code: String,
    /// Human-readable error message.
    pub message: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub retryable: bool,
}

impl ErrorResponse {
    pub fn new(error_code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error_code: error_code.into(),
            message: message.into(),
            retryable: false,
        }
    }

    pub fn retryable(mut self, retryable: bool) -> Self {
        self.retryable = retryable;
        self
    }
}

/// Any failure an `/api` handler can return.
#[derive(Debug)]
pub enum ApiError {
    Entitlement(EntitlementError),
    CreditCode(CreditCodeError),
    PaymentOrder(PaymentOrderError),
}

impl From<EntitlementError> for ApiError {
    fn from(err: EntitlementError) -> Self {
        Self::Entitlement(err)
    }
}

impl From<CreditCodeError> for ApiError {
    fn from(err: CreditCodeError) -> Self {
        Self::CreditCode(err)
    }
}

impl From<PaymentOrderError> for ApiError {
    fn from(err: PaymentOrderError) -> Self {
        Self::PaymentOrder(err)
    }
}

impl ApiError {
    fn error_code(&self) -> &'static str {
        match self {
            ApiError::Entitlement(e) => match e {
                EntitlementError::InvalidOrigin(_) => "INVALID_ORIGIN",
                EntitlementError::IdentityAlreadyBound => "IDENTITY_ALREADY_BOUND",
                EntitlementError::OriginAlreadyBound => "ORIGIN_ALREADY_BOUND",
                EntitlementError::NotFound => "ENTITLEMENT_NOT_FOUND",
                EntitlementError::Sealing(_) | EntitlementError::Store(_) => "INTERNAL_ERROR",
            },
            ApiError::CreditCode(e) => match e {
                CreditCodeError::NotFound => "CREDIT_CODE_NOT_FOUND",
                CreditCodeError::AlreadyUsed => "CREDIT_CODE_USED",
                CreditCodeError::InvalidGrant { .. } => "INVALID_GRANT",
                CreditCodeError::InvalidCode(_) => "INVALID_CREDIT_CODE",
                CreditCodeError::EntitlementMissing => "ENTITLEMENT_NOT_FOUND",
                CreditCodeError::Forbidden => "FORBIDDEN",
                CreditCodeError::Collision
                | CreditCodeError::Internal(_)
                | CreditCodeError::Store(_) => "INTERNAL_ERROR",
            },
            ApiError::PaymentOrder(e) => match e {
                PaymentOrderError::InvalidRequest(_) => "VALIDATION_FAILED",
                PaymentOrderError::EntitlementMissing => "ENTITLEMENT_NOT_FOUND",
                PaymentOrderError::SameOrigin => "SAME_ORIGIN",
                PaymentOrderError::OriginAlreadyBound => "ORIGIN_ALREADY_BOUND",
                PaymentOrderError::NotFound => "ORDER_NOT_FOUND",
                PaymentOrderError::Gateway { .. } => "GATEWAY_ERROR",
                PaymentOrderError::Store(_) => "INTERNAL_ERROR",
            },
        }
    }

    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Entitlement(e) => e.status_code(),
            ApiError::CreditCode(e) => e.status_code(),
            ApiError::PaymentOrder(e) => e.status_code(),
        }
    }

    fn is_retryable(&self) -> bool {
        match self {
            ApiError::Entitlement(e) => e.is_retryable(),
            ApiError::CreditCode(e) => e.is_retryable(),
            ApiError::PaymentOrder(e) => e.is_retryable(),
        }
    }

    fn message(&self) -> String {
        match self {
            ApiError::Entitlement(e) => e.to_string(),
            ApiError::CreditCode(e) => e.to_string(),
            ApiError::PaymentOrder(e) => e.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        // Internal details stay in the log
        let message = if status.is_server_error() {
            tracing::error!(error = %self.message(), "Request failed");
            "Internal error".to_string()
        } else {
            self.message()
        };

        let body = ErrorResponse::new(self.error_code(), message).retryable(self.is_retryable());
        (status, Json(body)).into_response()
    }
}
