//! Binary token framing.
//!
//! ```text
//! [issuance_time: u64 BE, 8][identity_len: 1][identity][nonce: 12][ciphertext + tag]
//! ```
//!
//! The whole frame travels hex-encoded. Identity and issuance time are in the
//! clear only so the verifier can re-derive the key; the sealed claims repeat
//! them and are checked after decryption.

use super::claims::IssuanceTime;
use super::errors::TokenError;
use crate::domain::foundation::Identity;

/// AES-GCM nonce length.
pub const NONCE_LEN: usize = 12;

/// AES-GCM authentication tag length.
pub const TAG_LEN: usize = 16;

const TIME_LEN: usize = 8;
const HEADER_LEN: usize = TIME_LEN + 1;

/// Smallest frame that can possibly authenticate: one identity byte and an
/// empty ciphertext with its tag.
pub const MIN_FRAME_LEN: usize = HEADER_LEN + 1 + NONCE_LEN + TAG_LEN;

/// A parsed but not yet authenticated token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenFrame {
    pub issuance_time: IssuanceTime,
    pub identity: Identity,
    pub nonce: [u8; NONCE_LEN],
    pub ciphertext: Vec<u8>,
}

impl TokenFrame {
    /// Serializes the frame to raw bytes.
    ///
    /// # Errors
    ///
    /// `Sealing` if the issuance time is negative; the wire format carries an
    /// unsigned value.
    pub fn to_bytes(&self) -> Result<Vec<u8>, TokenError> {
        let time = u64::try_from(self.issuance_time.as_millis())
            .map_err(|_| TokenError::Sealing("issuance time must not be negative".into()))?;
        let identity = self.identity.as_str().as_bytes();
        let identity_len = u8::try_from(identity.len())
            .map_err(|_| TokenError::Sealing("identity longer than 255 bytes".into()))?;

        let mut out =
            Vec::with_capacity(HEADER_LEN + identity.len() + NONCE_LEN + self.ciphertext.len());
        out.extend_from_slice(&time.to_be_bytes());
        out.push(identity_len);
        out.extend_from_slice(identity);
        out.extend_from_slice(&self.nonce);
        out.extend_from_slice(&self.ciphertext);
        Ok(out)
    }

    /// Parses raw bytes into a frame.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, TokenError> {
        if bytes.len() < MIN_FRAME_LEN {
            return Err(TokenError::malformed(format!(
                "frame is {} bytes, minimum is {}",
                bytes.len(),
                MIN_FRAME_LEN
            )));
        }

        let mut time = [0u8; TIME_LEN];
        time.copy_from_slice(&bytes[..TIME_LEN]);
        let time = i64::try_from(u64::from_be_bytes(time))
            .map_err(|_| TokenError::malformed("issuance time out of range"))?;

        let identity_len = bytes[TIME_LEN] as usize;
        if identity_len == 0 {
            return Err(TokenError::malformed("empty identity"));
        }

        let identity_end = HEADER_LEN + identity_len;
        let nonce_end = identity_end + NONCE_LEN;
        if bytes.len() < nonce_end + TAG_LEN {
            return Err(TokenError::malformed("identity length exceeds frame"));
        }

        let identity = std::str::from_utf8(&bytes[HEADER_LEN..identity_end])
            .map_err(|_| TokenError::malformed("identity is not UTF-8"))?;
        let identity = Identity::new(identity)
            .map_err(|e| TokenError::malformed(format!("identity: {}", e)))?;

        let mut nonce = [0u8; NONCE_LEN];
        nonce.copy_from_slice(&bytes[identity_end..nonce_end]);

        Ok(Self {
            issuance_time: IssuanceTime::from_millis(time),
            identity,
            nonce,
            ciphertext: bytes[nonce_end..].to_vec(),
        })
    }

    /// Hex transport form.
    pub fn to_hex(&self) -> Result<String, TokenError> {
        Ok(hex::encode(self.to_bytes()?))
    }

    /// Parses the hex transport form.
    pub fn from_hex(token: &str) -> Result<Self, TokenError> {
        let bytes = hex::decode(token.trim())
            .map_err(|e| TokenError::malformed(format!("invalid hex: {}", e)))?;
        Self::from_bytes(&bytes)
    }
}
