//! Shared fakes for handler tests.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use secrecy::SecretString;

use crate::domain::foundation::{DomainError, ErrorCode, Identity, Origin};
use crate::domain::payment::Price;
use crate::domain::token::{KeyDeriver, TokenCodec};
use crate::ports::{
    ChatNotifier, CreateOrderRequest, GatewayOrder, GatewayOrderState, PaymentError,
    PaymentGateway, PaymentNotice,
};

pub const TOKEN_SECRET: &str = "handler-test-secret-0123456789abcdef";

pub fn codec() -> TokenCodec {
    TokenCodec::new(KeyDeriver::new(SecretString::new(TOKEN_SECRET.to_string())))
}

pub fn identity(value: &str) -> Identity {
    Identity::new(value).unwrap()
}

pub fn origin(value: &str) -> Origin {
    Origin::parse_public(value).unwrap()
}

pub fn cents(value: i64) -> Price {
    Price::from_cents(value).unwrap()
}

// ════════════════════════════════════════════════════════════════════════════
// Gateway
// ════════════════════════════════════════════════════════════════════════════

/// Gateway fake that records requests and answers from canned state.
pub struct MockGateway {
    pub requests: Mutex<Vec<CreateOrderRequest>>,
    pub state: Mutex<GatewayOrderState>,
    pub fail_create: bool,
}

impl MockGateway {
    pub fn new() -> Self {
        Self {
            requests: Mutex::new(Vec::new()),
            state: Mutex::new(GatewayOrderState::Pending),
            fail_create: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            fail_create: true,
            ..Self::new()
        }
    }

    pub fn reporting(state: GatewayOrderState) -> Self {
        Self {
            state: Mutex::new(state),
            ..Self::new()
        }
    }

    pub fn requests(&self) -> Vec<CreateOrderRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl PaymentGateway for MockGateway {
    async fn create_order(&self, request: CreateOrderRequest) -> Result<GatewayOrder, PaymentError> {
        if self.fail_create {
            return Err(PaymentError::network("connection refused"));
        }
        let order = GatewayOrder {
            gateway_order_id: format!("GW-{}", request.pay_id),
            pay_type: request.pay_type,
            price: request.price,
            really_price: request.price,
            pay_url: format!("https://pay.example/{}", request.pay_id),
            timeout_minutes: 5,
        };
        self.requests.lock().unwrap().push(request);
        Ok(order)
    }

    async fn query_order(&self, _gateway_order_id: &str) -> Result<GatewayOrderState, PaymentError> {
        Ok(*self.state.lock().unwrap())
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Notifier
// ════════════════════════════════════════════════════════════════════════════

/// Notifier fake that records notices and optionally fails.
#[derive(Default)]
pub struct RecordingNotifier {
    pub notices: Mutex<Vec<PaymentNotice>>,
    pub fail: bool,
}

impl RecordingNotifier {
    pub fn failing() -> Self {
        Self {
            notices: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn notices(&self) -> Vec<PaymentNotice> {
        self.notices.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatNotifier for RecordingNotifier {
    async fn notify_payment(&self, notice: &PaymentNotice) -> Result<(), DomainError> {
        self.notices.lock().unwrap().push(notice.clone());
        if self.fail {
            return Err(DomainError::new(ErrorCode::ExternalServiceError, "chat down"));
        }
        Ok(())
    }
}

/// Waits until spawned notification tasks have run.
pub async fn settle_background_tasks(notifier: &Arc<RecordingNotifier>, expected: usize) {
    for _ in 0..100 {
        if notifier.notices().len() >= expected {
            return;
        }
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    }
}
