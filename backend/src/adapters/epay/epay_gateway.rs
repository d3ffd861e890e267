//! HTTP client for the payment gateway.
//!
//! Implements the `PaymentGateway` port against the gateway's form-encoded
//! API (`/api/createOrder`, `/api/getOrder`).
//!
//! # Configuration
//!
//! ```ignore
//! let config = EpayConfig::new(base_url, merchant_id, notify_url, return_url);
//! let gateway = EpayGateway::new(config, signer)?;
//! ```

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;

use crate::domain::payment::{GatewaySigner, CREATE_ORDER_SIGNATURE_FIELDS};
use crate::ports::{
    CreateOrderRequest, GatewayOrder, GatewayOrderState, PaymentError, PaymentGateway,
};

use super::response_types::EpayEnvelope;

/// Gateway API configuration.
#[derive(Debug, Clone)]
pub struct EpayConfig {
    /// Gateway root, without the `/api` suffix.
    base_url: String,

    merchant_id: String,

    /// Where the gateway posts payment notifications.
    notify_url: String,

    /// Where the payer's browser lands after paying.
    return_url: String,

    timeout: Duration,
}

impl EpayConfig {
    pub fn new(
        base_url: impl Into<String>,
        merchant_id: impl Into<String>,
        notify_url: impl Into<String>,
        return_url: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            merchant_id: merchant_id.into(),
            notify_url: notify_url.into(),
            return_url: return_url.into(),
            timeout: Duration::from_secs(10),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Payment gateway adapter.
pub struct EpayGateway {
    config: EpayConfig,
    signer: GatewaySigner,
    http_client: reqwest::Client,
}

impl EpayGateway {
    pub fn new(config: EpayConfig, signer: GatewaySigner) -> Result<Self, PaymentError> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| PaymentError::network(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            config,
            signer,
            http_client,
        })
    }

    /// Builds the signed order-creation form.
    fn create_order_form(
        &self,
        request: &CreateOrderRequest,
    ) -> Result<Vec<(&'static str, String)>, PaymentError> {
        let mut signed = HashMap::new();
        signed.insert("payId".to_string(), request.pay_id.clone());
        signed.insert("param".to_string(), request.param.clone());
        signed.insert("type".to_string(), request.pay_type.to_string());
        signed.insert("price".to_string(), request.price.to_string());

        let sign = self
            .signer
            .sign(CREATE_ORDER_SIGNATURE_FIELDS, &signed)
            .map_err(|e| PaymentError::rejected(format!("Failed to sign order: {}", e)))?;

        Ok(vec![
            ("mchId", self.config.merchant_id.clone()),
            ("payId", request.pay_id.clone()),
            ("type", request.pay_type.to_string()),
            ("price", request.price.to_string()),
            ("goodsName", request.goods_name.clone()),
            ("param", request.param.clone()),
            ("isHtml", "0".to_string()),
            ("notifyUrl", self.config.notify_url.clone()),
            ("returnUrl", self.config.return_url.clone()),
            ("sign", sign),
        ])
    }

    async fn post_form(
        &self,
        path: &str,
        params: &[(&'static str, String)],
    ) -> Result<EpayEnvelope, PaymentError> {
        let url = format!("{}{}", self.config.base_url, path);

        let response = self
            .http_client
            .post(&url)
            .form(params)
            .send()
            .await
            .map_err(|e| PaymentError::network(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| PaymentError::network(format!("Failed to read gateway response: {}", e)))?;

        if !status.is_success() {
            tracing::error!(path, status = status.as_u16(), "Gateway request failed");
            let message = format!("Gateway answered HTTP {}", status);
            // 5xx may clear up on retry; anything else will not
            let err = if status.is_server_error() {
                PaymentError::network(message)
            } else {
                PaymentError::invalid_response(message)
            };
            return Err(err.with_provider_code(status.as_u16().to_string()));
        }

        EpayEnvelope::parse(&body).map_err(|e| {
            tracing::error!(path, body_len = body.len(), error = %e, "Unparseable gateway response");
            e
        })
    }
}

#[async_trait]
impl PaymentGateway for EpayGateway {
    async fn create_order(&self, request: CreateOrderRequest) -> Result<GatewayOrder, PaymentError> {
        let form = self.create_order_form(&request)?;

        tracing::debug!(
            pay_id = %request.pay_id,
            price = %request.price,
            pay_type = request.pay_type,
            "Creating gateway order"
        );

        let envelope = self.post_form("/api/createOrder", &form).await?;
        let order = envelope.into_data()?.into_gateway_order()?;

        tracing::info!(
            pay_id = %request.pay_id,
            gateway_order_id = %order.gateway_order_id,
            really_price = %order.really_price,
            "Gateway order created"
        );

        Ok(order)
    }

    async fn query_order(&self, gateway_order_id: &str) -> Result<GatewayOrderState, PaymentError> {
        let form = [
            ("mchId", self.config.merchant_id.clone()),
            ("orderId", gateway_order_id.to_string()),
        ];

        let envelope = self.post_form("/api/getOrder", &form).await?;
        let data = envelope.into_data()?;
        Ok(data.state())
    }
}
