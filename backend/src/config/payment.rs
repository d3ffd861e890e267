//! Payment gateway configuration

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;
use super::server::Environment;

/// Payment configuration (epay-style QR gateway)
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentConfig {
    /// Gateway base URL, e.g. `https://pay.example.com`
    pub base_url: String,

    /// Merchant id assigned by the gateway
    pub merchant_id: String,

    /// Shared signing secret
    pub secret: SecretString,

    #[serde(default = "default_price_per_use")]
    pub price_per_use_cents: i64,

    #[serde(default = "default_rebind_price")]
    pub rebind_price_cents: i64,

    /// 1 = WeChat, 2 = Alipay
    #[serde(default = "default_pay_type")]
    pub pay_type: i32,

    /// Public URL of this service's `/notify`
    pub notify_url: String,

    /// Public URL of this service's `/return`
    pub return_url: String,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl PaymentConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Validate payment configuration
    pub fn validate(&self, environment: &Environment) -> Result<(), ValidationError> {
        if self.base_url.is_empty() {
            return Err(ValidationError::MissingRequired("PAYMENT__BASE_URL"));
        }
        if self.merchant_id.is_empty() {
            return Err(ValidationError::MissingRequired("PAYMENT__MERCHANT_ID"));
        }
        if self.secret.expose_secret().is_empty() {
            return Err(ValidationError::MissingRequired("PAYMENT__SECRET"));
        }

        check_url("PAYMENT__BASE_URL", &self.base_url, environment)?;
        check_url("PAYMENT__NOTIFY_URL", &self.notify_url, environment)?;
        check_url("PAYMENT__RETURN_URL", &self.return_url, environment)?;

        if self.price_per_use_cents < 1 {
            return Err(ValidationError::InvalidAmount("PAYMENT__PRICE_PER_USE_CENTS"));
        }
        if self.rebind_price_cents < 1 {
            return Err(ValidationError::InvalidAmount("PAYMENT__REBIND_PRICE_CENTS"));
        }
        if !matches!(self.pay_type, 1 | 2) {
            return Err(ValidationError::InvalidPayType);
        }
        if self.request_timeout_secs == 0 || self.request_timeout_secs > 300 {
            return Err(ValidationError::InvalidTimeout);
        }
        Ok(())
    }
}

fn check_url(name: &'static str, url: &str, environment: &Environment) -> Result<(), ValidationError> {
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(ValidationError::InvalidUrl(name));
    }
    // In production, require HTTPS
    if *environment == Environment::Production && !url.starts_with("https://") {
        return Err(ValidationError::UrlMustBeHttps(name));
    }
    Ok(())
}

fn default_price_per_use() -> i64 {
    10
}

fn default_rebind_price() -> i64 {
    100
}

fn default_pay_type() -> i32 {
    1
}

fn default_request_timeout() -> u64 {
    10
}
