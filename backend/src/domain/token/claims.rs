//! Token claims and issuance time.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::{Identity, Origin, Timestamp};

/// Millisecond epoch at which a token was issued.
///
/// Doubles as the per-token nonce for key derivation and as the key that
/// ties a token to exactly one entitlement binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IssuanceTime(i64);

impl IssuanceTime {
    pub fn from_millis(millis: i64) -> Self {
        Self(millis)
    }

    /// Issuance time for a token minted right now.
    pub fn now() -> Self {
        Self(Timestamp::now().as_unix_millis())
    }

    pub fn as_millis(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for IssuanceTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What a token asserts once opened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    pub identity: Identity,
    pub origin: Origin,
    pub issuance_time: IssuanceTime,
}

impl TokenClaims {
    pub fn new(identity: Identity, origin: Origin, issuance_time: IssuanceTime) -> Self {
        Self {
            identity,
            origin,
            issuance_time,
        }
    }
}
