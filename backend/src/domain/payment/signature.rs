//! Gateway request signatures.
//!
//! The gateway signs with `md5(field_1 + field_2 + ... + secret)` as lowercase
//! hex, where the field order is fixed per message type. The orders below are
//! part of the wire protocol; changing one breaks every signature.

use std::collections::HashMap;

use md5::{Digest, Md5};
use secrecy::{ExposeSecret, SecretString};
use subtle::ConstantTimeEq;

use super::errors::ReconcileError;

/// Field order signed by the gateway on payment notifications.
pub const NOTIFY_SIGNATURE_FIELDS: &[&str] = &["orderId", "param", "type", "price", "reallyPrice"];

/// Field order we sign on order creation. `price` uses two decimals.
pub const CREATE_ORDER_SIGNATURE_FIELDS: &[&str] = &["payId", "param", "type", "price"];

/// Signs and verifies gateway messages with the shared merchant secret.
#[derive(Clone)]
pub struct GatewaySigner {
    secret: SecretString,
}

impl GatewaySigner {
    pub fn new(secret: SecretString) -> Self {
        Self { secret }
    }

    /// Computes the signature over `fields` taken from `params` in order.
    ///
    /// # Errors
    ///
    /// `MissingField` naming the first field absent from `params`.
    pub fn sign(
        &self,
        fields: &[&'static str],
        params: &HashMap<String, String>,
    ) -> Result<String, ReconcileError> {
        let mut hasher = Md5::new();
        for &field in fields {
            let value = params.get(field).ok_or(ReconcileError::MissingField(field))?;
            hasher.update(value.as_bytes());
        }
        hasher.update(self.secret.expose_secret().as_bytes());
        Ok(hex::encode(hasher.finalize()))
    }

    /// Checks `presented` against the expected signature in constant time.
    /// Hex case is ignored.
    pub fn verify(
        &self,
        fields: &[&'static str],
        params: &HashMap<String, String>,
        presented: &str,
    ) -> Result<(), ReconcileError> {
        let expected = self.sign(fields, params)?;
        let presented = presented.trim().to_ascii_lowercase();

        if bool::from(expected.as_bytes().ct_eq(presented.as_bytes())) {
            Ok(())
        } else {
            Err(ReconcileError::SignatureMismatch)
        }
    }
}

impl std::fmt::Debug for GatewaySigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewaySigner").finish_non_exhaustive()
    }
}
