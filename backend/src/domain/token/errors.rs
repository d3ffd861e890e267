//! Token error types.

use thiserror::Error;

/// Failures while framing, sealing or opening a token.
///
/// Every variant fails closed: nothing from a token that produced an error
/// is trusted, not even the clear-text header.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    /// Structurally invalid input: bad hex, short frame, bad length byte.
    #[error("Malformed token: {0}")]
    Malformed(String),

    /// AEAD authentication failed or the sealed claims disagree with the
    /// clear-text header. Indistinguishable from tampering.
    #[error("Token failed authentication")]
    Tampered,

    /// The server could not produce a token.
    #[error("Token sealing failed: {0}")]
    Sealing(String),
}

impl TokenError {
    pub fn malformed(reason: impl Into<String>) -> Self {
        TokenError::Malformed(reason.into())
    }

    /// True for the two failures a presented token can cause.
    pub fn is_tampered_or_malformed(&self) -> bool {
        matches!(self, TokenError::Malformed(_) | TokenError::Tampered)
    }
}
