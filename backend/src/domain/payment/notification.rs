//! Payment notification parameters.

use std::collections::HashMap;

use super::correlation::CorrelationParam;
use super::errors::ReconcileError;
use super::order::PaidDetails;
use super::price::Price;
use crate::domain::foundation::Timestamp;

/// Fields a notification must carry with a non-empty value.
const REQUIRED_FIELDS: &[&str] = &["mchId", "orderId", "type", "price", "reallyPrice", "sign"];

/// A webhook call from the gateway, parsed but not yet authenticated.
///
/// The raw parameters are kept because the signature covers their exact text,
/// not our re-rendering of them.
#[derive(Debug, Clone)]
pub struct PaymentNotification {
    pub merchant_id: String,
    pub gateway_order_id: String,
    pub param: String,
    pub pay_type: i32,
    pub price: Price,
    pub really_price: Price,
    pub sign: String,
    params: HashMap<String, String>,
}

impl PaymentNotification {
    /// Validates presence and shape of the notification fields.
    ///
    /// `param` is optional and defaults to the empty string, which is also
    /// what the gateway signs in that case.
    pub fn from_params(mut params: HashMap<String, String>) -> Result<Self, ReconcileError> {
        for &field in REQUIRED_FIELDS {
            if params.get(field).map_or(true, |v| v.trim().is_empty()) {
                return Err(ReconcileError::MissingField(field));
            }
        }
        params.entry("param".to_string()).or_default();

        let field = |name: &str| params.get(name).cloned().unwrap_or_default();

        let pay_type = field("type")
            .trim()
            .parse::<i32>()
            .map_err(|_| ReconcileError::invalid_field("type", "not an integer"))?;
        let price = Price::parse(&field("price"))
            .map_err(|e| ReconcileError::invalid_field("price", e.to_string()))?;
        let really_price = Price::parse(&field("reallyPrice"))
            .map_err(|e| ReconcileError::invalid_field("reallyPrice", e.to_string()))?;

        let merchant_id = field("mchId");
        let gateway_order_id = field("orderId");
        let param = field("param");
        let sign = field("sign");

        Ok(Self {
            merchant_id,
            gateway_order_id,
            param,
            pay_type,
            price,
            really_price,
            sign,
            params,
        })
    }

    /// Parameters as received, for signature checks.
    pub fn params(&self) -> &HashMap<String, String> {
        &self.params
    }

    /// The correlation param, if it parses. An unparsable param only means
    /// the order has to be found by gateway order id instead.
    pub fn correlation(&self) -> Option<CorrelationParam> {
        CorrelationParam::parse(&self.param).ok()
    }

    pub fn paid_details(&self, now: Timestamp) -> PaidDetails {
        PaidDetails {
            really_paid: self.really_price,
            pay_method: self.pay_type,
            paid_at: now,
        }
    }
}
