//! Authentication types for the domain layer.
//!
//! A `Caller` is the identity behind a validated intent from the
//! conversational front end. Any bearer-token scheme can populate it via the
//! `IntentAuthenticator` port.

use super::Identity;
use thiserror::Error;

/// What an authenticated caller is allowed to do beyond its own account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallerRole {
    /// Regular end user.
    User,
    /// May mint credit codes.
    Issuer,
}

impl CallerRole {
    /// Parses the optional `role` claim. Unknown roles fall back to `User`.
    pub fn from_claim(claim: Option<&str>) -> Self {
        match claim {
            Some("issuer") => CallerRole::Issuer,
            _ => CallerRole::User,
        }
    }
}

/// Authenticated caller extracted from a validated bearer token.
#[derive(Debug, Clone)]
pub struct Caller {
    pub identity: Identity,
    pub role: CallerRole,
}

impl Caller {
    pub fn new(identity: Identity, role: CallerRole) -> Self {
        Self { identity, role }
    }

    pub fn user(identity: Identity) -> Self {
        Self::new(identity, CallerRole::User)
    }

    pub fn issuer(identity: Identity) -> Self {
        Self::new(identity, CallerRole::Issuer)
    }

    pub fn can_issue_codes(&self) -> bool {
        self.role == CallerRole::Issuer
    }
}

/// Authentication errors that can occur during bearer-token validation.
#[derive(Debug, Clone, Error)]
pub enum AuthError {
    /// The token is missing, malformed, or has an invalid signature.
    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Token expired")]
    TokenExpired,

    /// Token is valid but the caller lacks the role for this action.
    #[error("Insufficient permissions")]
    InsufficientPermissions,

    /// The authenticator itself is misconfigured or unavailable.
    #[error("Auth service unavailable: {0}")]
    ServiceUnavailable(String),
}

impl AuthError {
    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::ServiceUnavailable(message.into())
    }

    /// Returns true if the caller should obtain a fresh token.
    pub fn requires_reauthentication(&self) -> bool {
        matches!(self, AuthError::InvalidToken | AuthError::TokenExpired)
    }

    pub fn is_transient(&self) -> bool {
        matches!(self, AuthError::ServiceUnavailable(_))
    }
}
