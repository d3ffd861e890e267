//! Token sealing and opening.

use aes_gcm::aead::{Aead, AeadCore, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Nonce};

use super::claims::TokenClaims;
use super::errors::TokenError;
use super::frame::{TokenFrame, NONCE_LEN};
use super::key_derivation::KeyDeriver;

/// Issues and opens tokens.
///
/// Opening is split into `decode` (structure only) and `decrypt`
/// (authentication) so callers can report the two failure classes apart.
#[derive(Debug, Clone)]
pub struct TokenCodec {
    keys: KeyDeriver,
}

impl TokenCodec {
    pub fn new(keys: KeyDeriver) -> Self {
        Self { keys }
    }

    /// Seals the claims into a hex token.
    pub fn issue(&self, claims: &TokenClaims) -> Result<String, TokenError> {
        let key = self.keys.derive(&claims.identity, claims.issuance_time)?;
        let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
            .map_err(|e| TokenError::Sealing(format!("cipher init failed: {}", e)))?;

        let plaintext = serde_json::to_vec(claims)
            .map_err(|e| TokenError::Sealing(format!("claims serialization failed: {}", e)))?;

        let mut nonce = [0u8; NONCE_LEN];
        nonce.copy_from_slice(Aes256Gcm::generate_nonce(&mut OsRng).as_slice());

        let ciphertext = cipher
            .encrypt(Nonce::from_slice(&nonce), plaintext.as_slice())
            .map_err(|e| TokenError::Sealing(format!("encryption failed: {}", e)))?;

        TokenFrame {
            issuance_time: claims.issuance_time,
            identity: claims.identity.clone(),
            nonce,
            ciphertext,
        }
        .to_hex()
    }

    /// Parses the hex token without trusting anything in it yet.
    pub fn decode(&self, token: &str) -> Result<TokenFrame, TokenError> {
        TokenFrame::from_hex(token)
    }

    /// Authenticates a decoded frame and returns its sealed claims.
    ///
    /// The sealed identity and issuance time must equal the clear-text header.
    pub fn decrypt(&self, frame: &TokenFrame) -> Result<TokenClaims, TokenError> {
        let key = self.keys.derive(&frame.identity, frame.issuance_time)?;
        let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
            .map_err(|e| TokenError::Sealing(format!("cipher init failed: {}", e)))?;

        let plaintext = cipher
            .decrypt(Nonce::from_slice(&frame.nonce), frame.ciphertext.as_slice())
            .map_err(|_| TokenError::Tampered)?;

        let claims: TokenClaims =
            serde_json::from_slice(&plaintext).map_err(|_| TokenError::Tampered)?;

        if claims.identity != frame.identity || claims.issuance_time != frame.issuance_time {
            return Err(TokenError::Tampered);
        }

        Ok(claims)
    }

    /// Decodes and decrypts in one step.
    pub fn open(&self, token: &str) -> Result<TokenClaims, TokenError> {
        let frame = self.decode(token)?;
        self.decrypt(&frame)
    }
}
