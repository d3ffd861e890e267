//! Intent authentication port.
//!
//! The conversational front end calls the `/api` routes on behalf of an
//! identity and proves it with a bearer token. Implementations MUST validate
//! signature, issuer, audience and expiry.

use async_trait::async_trait;

use crate::domain::foundation::{AuthError, Caller};

#[async_trait]
pub trait IntentAuthenticator: Send + Sync {
    /// Validate a bearer token (without the "Bearer " prefix).
    ///
    /// # Returns
    ///
    /// * `Ok(Caller)` - Token is valid
    /// * `Err(AuthError::InvalidToken)` - Malformed token or bad signature
    /// * `Err(AuthError::TokenExpired)` - Valid signature but expired
    async fn authenticate(&self, token: &str) -> Result<Caller, AuthError>;
}
