//! Payment gateway port.
//!
//! The gateway hosts the payment page and later calls our webhook. From
//! here we only create orders and query their state; settlement happens
//! exclusively through the signed notification.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::payment::{PaymentOrderError, Price};

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Register an order and obtain its payment URL.
    async fn create_order(&self, request: CreateOrderRequest) -> Result<GatewayOrder, PaymentError>;

    /// Current state of an order on the gateway side.
    async fn query_order(&self, gateway_order_id: &str) -> Result<GatewayOrderState, PaymentError>;
}

/// Order creation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateOrderRequest {
    /// Merchant-assigned unique id.
    pub pay_id: String,
    /// Correlation param echoed back on notify.
    pub param: String,
    /// 1 = WeChat, 2 = Alipay.
    pub pay_type: i32,
    pub price: Price,
    pub goods_name: String,
}

/// What the gateway assigned to a created order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayOrder {
    pub gateway_order_id: String,
    pub pay_type: i32,
    pub price: Price,
    /// The amount the payer is actually asked for. Gateways that
    /// disambiguate concurrent payments may shave a cent off.
    pub really_price: Price,
    pub pay_url: String,
    pub timeout_minutes: i64,
}

/// Order state as reported by the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GatewayOrderState {
    Pending,
    Paid,
    Failed,
    Unknown,
}

impl GatewayOrderState {
    /// Maps the gateway's numeric `state`.
    pub fn from_code(code: i64) -> Self {
        match code {
            0 => GatewayOrderState::Pending,
            1 => GatewayOrderState::Paid,
            2 => GatewayOrderState::Failed,
            _ => GatewayOrderState::Unknown,
        }
    }
}

/// Payment gateway error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentError {
    pub code: PaymentErrorCode,
    pub message: String,
    /// Gateway's own status code or message, if any.
    pub provider_code: Option<String>,
    pub retryable: bool,
}

impl PaymentError {
    pub fn new(code: PaymentErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            provider_code: None,
            retryable: code.is_retryable(),
        }
    }

    pub fn with_provider_code(mut self, code: impl Into<String>) -> Self {
        self.provider_code = Some(code.into());
        self
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(PaymentErrorCode::NetworkError, message)
    }

    /// The gateway answered but the body was not what the contract says.
    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::new(PaymentErrorCode::InvalidResponse, message)
    }

    /// The gateway refused the request.
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::new(PaymentErrorCode::Rejected, message)
    }

    pub fn not_found(resource: &str) -> Self {
        Self::new(PaymentErrorCode::NotFound, format!("{} not found", resource))
    }
}

impl std::fmt::Display for PaymentError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for PaymentError {}

impl From<PaymentError> for PaymentOrderError {
    fn from(err: PaymentError) -> Self {
        PaymentOrderError::Gateway {
            message: err.to_string(),
            retryable: err.retryable,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentErrorCode {
    NetworkError,
    InvalidResponse,
    Rejected,
    NotFound,
}

impl PaymentErrorCode {
    pub fn is_retryable(&self) -> bool {
        matches!(self, PaymentErrorCode::NetworkError)
    }
}

impl std::fmt::Display for PaymentErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PaymentErrorCode::NetworkError => "network_error",
            PaymentErrorCode::InvalidResponse => "invalid_response",
            PaymentErrorCode::Rejected => "rejected",
            PaymentErrorCode::NotFound => "not_found",
        };
        write!(f, "{}", s)
    }
}
