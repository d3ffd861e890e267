//! Mock payment gateway for tests and offline development.
//!
//! Hands out sequential gateway order ids, records every request and lets
//! tests choose the reported order state or inject an error.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::ports::{
    CreateOrderRequest, GatewayOrder, GatewayOrderState, PaymentError, PaymentGateway,
};

#[derive(Default)]
struct MockState {
    next_id: u64,
    created: Vec<CreateOrderRequest>,
    queried: Vec<String>,
    state: Option<GatewayOrderState>,
    next_error: Option<PaymentError>,
}

/// In-process stand-in for the gateway.
#[derive(Default, Clone)]
pub struct MockPaymentGateway {
    inner: Arc<Mutex<MockState>>,
}

impl MockPaymentGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// State returned by `query_order`. Defaults to `Pending`.
    pub fn set_state(&self, state: GatewayOrderState) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.state = Some(state);
        }
    }

    /// Fails the next call with `error`.
    pub fn set_error(&self, error: PaymentError) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.next_error = Some(error);
        }
    }

    pub fn created_orders(&self) -> Vec<CreateOrderRequest> {
        self.inner
            .lock()
            .map(|inner| inner.created.clone())
            .unwrap_or_default()
    }

    pub fn queried_orders(&self) -> Vec<String> {
        self.inner
            .lock()
            .map(|inner| inner.queried.clone())
            .unwrap_or_default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, MockState>, PaymentError> {
        self.inner
            .lock()
            .map_err(|_| PaymentError::network("mock gateway lock poisoned"))
    }
}

#[async_trait]
impl PaymentGateway for MockPaymentGateway {
    async fn create_order(&self, request: CreateOrderRequest) -> Result<GatewayOrder, PaymentError> {
        let mut inner = self.lock()?;
        if let Some(err) = inner.next_error.take() {
            return Err(err);
        }

        inner.next_id += 1;
        let gateway_order_id = format!("MOCK{:08}", inner.next_id);
        let order = GatewayOrder {
            gateway_order_id: gateway_order_id.clone(),
            pay_type: request.pay_type,
            price: request.price,
            really_price: request.price,
            pay_url: format!("https://pay.invalid/qr/{}", gateway_order_id),
            timeout_minutes: 5,
        };
        inner.created.push(request);
        Ok(order)
    }

    async fn query_order(&self, gateway_order_id: &str) -> Result<GatewayOrderState, PaymentError> {
        let mut inner = self.lock()?;
        if let Some(err) = inner.next_error.take() {
            return Err(err);
        }

        inner.queried.push(gateway_order_id.to_string());
        Ok(inner.state.unwrap_or(GatewayOrderState::Pending))
    }
}
