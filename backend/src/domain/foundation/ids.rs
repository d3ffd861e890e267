//! Strongly-typed identifier value objects.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::ValidationError;

/// Largest identity that fits the token's one-byte length prefix.
pub const MAX_IDENTITY_LEN: usize = u8::MAX as usize;

/// Stable external account key that tokens and entitlements are bound to.
///
/// Opaque to the ledger. It is carried in the clear inside tokens and inside
/// the gateway correlation parameter, so it must fit a single length byte and
/// must not contain the `|` separator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Identity(String);

impl Identity {
    /// Creates an identity after validating its shape.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(ValidationError::empty_field("identity"));
        }
        if value.len() > MAX_IDENTITY_LEN {
            return Err(ValidationError::out_of_range(
                "identity",
                1,
                MAX_IDENTITY_LEN as i64,
                value.len() as i64,
            ));
        }
        if value.contains('|') {
            return Err(ValidationError::invalid_format(
                "identity",
                "must not contain '|'",
            ));
        }
        Ok(Self(value))
    }

    /// Returns the identity as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Identity {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for Identity {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Identity> for String {
    fn from(identity: Identity) -> Self {
        identity.0
    }
}
