//! Telegram Bot API notifier.
//!
//! The identity is the payer's Telegram user id, which doubles as the
//! private chat id for `sendMessage`.

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::domain::foundation::{DomainError, ErrorCode};
use crate::domain::payment::OrderKind;
use crate::ports::{ChatNotifier, PaymentNotice};

/// Telegram notifier configuration.
#[derive(Clone)]
pub struct TelegramConfig {
    bot_token: SecretString,
    api_base_url: String,
    timeout: Duration,
}

impl TelegramConfig {
    pub fn new(bot_token: SecretString) -> Self {
        Self {
            bot_token,
            api_base_url: "https://api.telegram.org".to_string(),
            timeout: Duration::from_secs(10),
        }
    }

    /// Set a custom API base URL (for testing or a local Bot API server).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[derive(Debug, Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: String,
}

#[derive(Debug, Deserialize)]
struct BotApiResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

pub struct TelegramNotifier {
    config: TelegramConfig,
    http_client: reqwest::Client,
}

impl TelegramNotifier {
    pub fn new(config: TelegramConfig) -> Result<Self, DomainError> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| {
                DomainError::new(
                    ErrorCode::ExternalServiceError,
                    format!("Failed to build HTTP client: {}", e),
                )
            })?;
        Ok(Self {
            config,
            http_client,
        })
    }
}

/// Renders the message a payer receives once their payment is settled.
pub fn render_payment_message(notice: &PaymentNotice) -> String {
    match notice.kind {
        OrderKind::OriginRebind => {
            let origin = notice
                .bound_origin
                .as_ref()
                .map(|o| o.as_str().to_string())
                .unwrap_or_default();
            format!(
                "Origin rebind complete\n\n\
                 Service: {}\n\
                 Paid: {} CNY\n\
                 Method: {}\n\
                 Order: {}\n\
                 New origin: {}\n\n\
                 A new token has been issued; previous tokens no longer verify.",
                notice.goods_name,
                notice.really_paid,
                notice.pay_method_name(),
                notice.pay_id,
                origin,
            )
        }
        OrderKind::CreditPurchase => format!(
            "Payment received\n\n\
             Item: {}\n\
             Paid: {} CNY\n\
             Method: {}\n\
             Order: {}\n\
             Remaining credit: {}",
            notice.goods_name,
            notice.really_paid,
            notice.pay_method_name(),
            notice.pay_id,
            notice.remaining_credit,
        ),
    }
}

#[async_trait]
impl ChatNotifier for TelegramNotifier {
    async fn notify_payment(&self, notice: &PaymentNotice) -> Result<(), DomainError> {
        let url = format!(
            "{}/bot{}/sendMessage",
            self.config.api_base_url,
            self.config.bot_token.expose_secret()
        );
        let body = SendMessage {
            chat_id: notice.identity.as_str(),
            text: render_payment_message(notice),
        };

        // The URL embeds the bot token; never log the reqwest error's URL
        let response = self
            .http_client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                DomainError::new(
                    ErrorCode::ExternalServiceError,
                    format!("Telegram request failed: {}", e.without_url()),
                )
            })?;

        let status = response.status();
        let parsed: BotApiResponse = response.json().await.map_err(|e| {
            DomainError::new(
                ErrorCode::ExternalServiceError,
                format!("Failed to parse Telegram response: {}", e.without_url()),
            )
        })?;

        if !status.is_success() || !parsed.ok {
            return Err(DomainError::new(
                ErrorCode::ExternalServiceError,
                format!(
                    "Telegram rejected message: {}",
                    parsed.description.unwrap_or_else(|| status.to_string())
                ),
            ));
        }

        tracing::info!(identity = %notice.identity, pay_id = %notice.pay_id, "Payment notice sent");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{Identity, Origin};
    use crate::domain::payment::Price;

    fn notice(kind: OrderKind) -> PaymentNotice {
        PaymentNotice {
            identity: Identity::new("42").unwrap(),
            pay_id: "RECHARGE_42_1".to_string(),
            kind,
            goods_name: "25 verifications".to_string(),
            really_paid: Price::from_cents(249).unwrap(),
            pay_method: 2,
            remaining_credit: 28,
            bound_origin: Some(Origin::parse_public("198.51.100.7").unwrap()),
        }
    }

    #[test]
    fn credit_purchase_message_shows_credit() {
        let text = render_payment_message(&notice(OrderKind::CreditPurchase));
        assert!(text.contains("Paid: 2.49 CNY"));
        assert!(text.contains("Method: Alipay"));
        assert!(text.contains("Remaining credit: 28"));
        assert!(!text.contains("198.51.100.7"));
    }

    #[test]
    fn rebind_message_shows_new_origin() {
        let text = render_payment_message(&notice(OrderKind::OriginRebind));
        assert!(text.contains("New origin: 198.51.100.7"));
        assert!(text.contains("previous tokens no longer verify"));
    }

    #[test]
    fn base_url_trailing_slash_is_dropped() {
        let config = TelegramConfig::new(SecretString::new("123:abc".to_string()))
            .with_base_url("http://localhost:8081/");
        assert_eq!(config.api_base_url, "http://localhost:8081");
    }
}
