//! Token key-derivation configuration

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use super::error::ValidationError;

pub const MIN_SECRET_LEN: usize = 32;

/// Server-wide salt for per-token key derivation and credit code minting.
///
/// Changing it invalidates every issued token.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenConfig {
    pub secret: SecretString,
}

impl TokenConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.secret.expose_secret().len() < MIN_SECRET_LEN {
            return Err(ValidationError::SecretTooShort {
                name: "TOKEN__SECRET",
                min: MIN_SECRET_LEN,
            });
        }
        Ok(())
    }
}
