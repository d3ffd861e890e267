//! Gateway response bodies.
//!
//! Both endpoints answer `{code, msg, data}` where `code == 1` means success
//! and prices are JSON numbers in yuan.

use serde::Deserialize;

use crate::domain::payment::Price;
use crate::ports::{GatewayOrder, GatewayOrderState, PaymentError};

/// Status code the gateway uses for success.
pub const SUCCESS_CODE: i64 = 1;

/// Envelope shared by `createOrder` and `getOrder`.
#[derive(Debug, Clone, Deserialize)]
pub struct EpayEnvelope {
    pub code: i64,
    #[serde(default)]
    pub msg: String,
    pub data: Option<EpayOrderData>,
}

/// Order data as the gateway reports it.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EpayOrderData {
    #[serde(default)]
    pub pay_id: String,
    pub order_id: String,
    #[serde(default)]
    pub pay_type: i32,
    pub price: f64,
    pub really_price: Option<f64>,
    #[serde(default)]
    pub pay_url: String,
    #[serde(default)]
    pub state: Option<i64>,
    #[serde(default)]
    pub time_out: i64,
}

impl EpayEnvelope {
    /// Parses a raw body, rejecting the HTML error pages the gateway serves
    /// for unknown routes and bad parameters.
    pub fn parse(body: &str) -> Result<Self, PaymentError> {
        let trimmed = body.trim_start();
        if trimmed.starts_with('<') || body.contains("<html") || body.contains("<!DOCTYPE") {
            return Err(PaymentError::invalid_response(
                "Gateway returned an HTML page instead of JSON",
            ));
        }

        serde_json::from_str(body).map_err(|e| {
            PaymentError::invalid_response(format!("Failed to parse gateway response: {}", e))
        })
    }

    /// Returns the data block of a successful response.
    pub fn into_data(self) -> Result<EpayOrderData, PaymentError> {
        if self.code != SUCCESS_CODE {
            return Err(PaymentError::rejected(if self.msg.is_empty() {
                "Gateway rejected the request".to_string()
            } else {
                self.msg
            })
            .with_provider_code(self.code.to_string()));
        }

        self.data
            .ok_or_else(|| PaymentError::invalid_response("Gateway response has no data"))
    }
}

impl EpayOrderData {
    pub fn into_gateway_order(self) -> Result<GatewayOrder, PaymentError> {
        let price = price_from_yuan("price", self.price)?;
        let really_price = match self.really_price {
            Some(value) => price_from_yuan("reallyPrice", value)?,
            None => price,
        };

        Ok(GatewayOrder {
            gateway_order_id: self.order_id,
            pay_type: self.pay_type,
            price,
            really_price,
            pay_url: self.pay_url,
            timeout_minutes: self.time_out,
        })
    }

    pub fn state(&self) -> GatewayOrderState {
        self.state
            .map(GatewayOrderState::from_code)
            .unwrap_or(GatewayOrderState::Unknown)
    }
}

/// The gateway reports amounts as floats; go through the two-decimal text
/// form so `0.1` becomes ten cents.
fn price_from_yuan(field: &str, value: f64) -> Result<Price, PaymentError> {
    if !value.is_finite() || value < 0.0 {
        return Err(PaymentError::invalid_response(format!(
            "Gateway {} is not a price: {}",
            field, value
        )));
    }
    Price::parse(&format!("{:.2}", value)).map_err(|e| {
        PaymentError::invalid_response(format!("Gateway {} is not a price: {}", field, e))
    })
}
