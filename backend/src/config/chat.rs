//! Chat notification configuration

use secrecy::SecretString;
use serde::Deserialize;

use super::error::ValidationError;

#[derive(Debug, Clone, Deserialize)]
pub struct ChatConfig {
    /// Telegram bot token; notifications are only logged without one
    #[serde(default)]
    pub bot_token: Option<SecretString>,

    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
}

impl ChatConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.api_base_url.starts_with("http://") && !self.api_base_url.starts_with("https://") {
            return Err(ValidationError::InvalidUrl("CHAT__API_BASE_URL"));
        }
        Ok(())
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            bot_token: None,
            api_base_url: default_api_base_url(),
        }
    }
}

fn default_api_base_url() -> String {
    "https://api.telegram.org".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_telegram_without_token() {
        let config = ChatConfig::default();
        assert!(config.bot_token.is_none());
        assert_eq!(config.api_base_url, "https://api.telegram.org");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn non_http_base_url_is_rejected() {
        let config = ChatConfig {
            api_base_url: "telegram".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
