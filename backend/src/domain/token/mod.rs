//! Token domain module.
//!
//! Self-describing, origin-bound access tokens that the verifier can open
//! without any per-token server state.
//!
//! # Module Structure
//!
//! - `claims` - What a token asserts (identity, origin, issuance time)
//! - `frame` - Binary framing and hex transport encoding
//! - `key_derivation` - Per-token key derived from public frame fields
//! - `codec` - Sealing and opening with AES-256-GCM
//! - `errors` - Token failure taxonomy

mod claims;
mod codec;
mod errors;
mod frame;
mod key_derivation;

pub use claims::{IssuanceTime, TokenClaims};
pub use codec::TokenCodec;
pub use errors::TokenError;
pub use frame::{TokenFrame, MIN_FRAME_LEN, NONCE_LEN, TAG_LEN};
pub use key_derivation::{DerivedKey, KeyDeriver, KEY_LEN};
