//! HS256 JWT adapter for intent authentication.
//!
//! The conversational front end signs a short-lived JWT per request with a
//! secret shared with this service. This adapter validates it by:
//!
//! 1. Checking the HS256 signature against the shared secret
//! 2. Validating issuer, audience and expiry claims
//! 3. Mapping `sub` to the caller identity and `role` to its `CallerRole`
//!
//! # Example
//!
//! ```ignore
//! let config = JwtConfig::new(secret, "chat-frontend", "token-ledger");
//! let authenticator = JwtIntentAuthenticator::new(config);
//! let caller = authenticator.authenticate("eyJ...").await?;
//! ```

use async_trait::async_trait;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::domain::foundation::{AuthError, Caller, CallerRole, Identity};
use crate::ports::IntentAuthenticator;

/// Configuration for the JWT authenticator.
#[derive(Clone)]
pub struct JwtConfig {
    /// Shared HMAC secret.
    pub secret: SecretString,

    /// Expected `iss` claim.
    pub issuer: String,

    /// Expected `aud` claim.
    pub audience: String,
}

impl JwtConfig {
    pub fn new(secret: SecretString, issuer: impl Into<String>, audience: impl Into<String>) -> Self {
        Self {
            secret,
            issuer: issuer.into(),
            audience: audience.into(),
        }
    }
}

/// Claims carried by an intent token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntentClaims {
    /// The acting identity (chat user id).
    pub sub: String,
    pub iss: String,
    pub aud: String,
    /// Expiry, Unix epoch seconds.
    pub exp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

pub struct JwtIntentAuthenticator {
    config: JwtConfig,
    decoding_key: DecodingKey,
}

impl JwtIntentAuthenticator {
    pub fn new(config: JwtConfig) -> Self {
        let decoding_key = DecodingKey::from_secret(config.secret.expose_secret().as_bytes());
        Self {
            config,
            decoding_key,
        }
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.config.issuer]);
        validation.set_audience(&[&self.config.audience]);
        validation.validate_exp = true;
        validation.set_required_spec_claims(&["exp", "iss", "aud", "sub"]);
        validation
    }
}

#[async_trait]
impl IntentAuthenticator for JwtIntentAuthenticator {
    async fn authenticate(&self, token: &str) -> Result<Caller, AuthError> {
        let data = decode::<IntentClaims>(token, &self.decoding_key, &self.validation()).map_err(
            |e| {
                use jsonwebtoken::errors::ErrorKind;
                match e.kind() {
                    ErrorKind::ExpiredSignature => {
                        tracing::debug!("Intent token expired");
                        AuthError::TokenExpired
                    }
                    ErrorKind::InvalidIssuer => {
                        tracing::warn!("Invalid issuer in intent token");
                        AuthError::InvalidToken
                    }
                    ErrorKind::InvalidAudience => {
                        tracing::warn!("Invalid audience in intent token");
                        AuthError::InvalidToken
                    }
                    _ => {
                        tracing::warn!(error = %e, "Intent token validation failed");
                        AuthError::InvalidToken
                    }
                }
            },
        )?;

        let claims = data.claims;
        let identity = Identity::new(claims.sub).map_err(|_| {
            tracing::warn!("Invalid subject in intent token");
            AuthError::InvalidToken
        })?;

        Ok(Caller::new(
            identity,
            CallerRole::from_claim(claims.role.as_deref()),
        ))
    }
}

impl std::fmt::Debug for JwtIntentAuthenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtIntentAuthenticator")
            .field("issuer", &self.config.issuer)
            .field("audience", &self.config.audience)
            .finish_non_exhaustive()
    }
}
