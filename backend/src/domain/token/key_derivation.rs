//! Deterministic per-token key derivation.
//!
//! `key = HKDF-SHA256(salt = server secret, ikm = "{identity}_{issuance_time}")`
//! expanded straight to the AES-256 key size. The verifier recomputes the key
//! from the token's clear-text header, so no per-token secret is stored.
//! The trade-off is revocability: a leaked token stays valid until its
//! entitlement binding is replaced.

use std::fmt;

use hkdf::Hkdf;
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;

use super::claims::IssuanceTime;
use super::errors::TokenError;
use crate::domain::foundation::Identity;

/// AES-256 key length.
pub const KEY_LEN: usize = 32;

/// Domain separation for the expand step. Bump the suffix to rotate the
/// derivation scheme.
const KEY_INFO: &[u8] = b"token-ledger/aes-256-gcm/v1";

/// A derived symmetric key. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct DerivedKey([u8; KEY_LEN]);

impl DerivedKey {
    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }
}

impl fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DerivedKey([REDACTED])")
    }
}

/// Derives token keys from public fields plus a server-wide salt.
#[derive(Clone)]
pub struct KeyDeriver {
    salt: SecretString,
}

impl KeyDeriver {
    pub fn new(salt: SecretString) -> Self {
        Self { salt }
    }

    /// Derives the key for one (identity, issuance time) pair.
    pub fn derive(
        &self,
        identity: &Identity,
        issuance_time: IssuanceTime,
    ) -> Result<DerivedKey, TokenError> {
        let ikm = format!("{}_{}", identity.as_str(), issuance_time.as_millis());
        let hk = Hkdf::<Sha256>::new(Some(self.salt.expose_secret().as_bytes()), ikm.as_bytes());

        let mut okm = [0u8; KEY_LEN];
        hk.expand(KEY_INFO, &mut okm)
            .map_err(|e| TokenError::Sealing(format!("key expansion failed: {}", e)))?;
        Ok(DerivedKey(okm))
    }
}

impl fmt::Debug for KeyDeriver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyDeriver").finish_non_exhaustive()
    }
}
