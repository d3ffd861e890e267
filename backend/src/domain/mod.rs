//! Domain layer containing business rules and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared primitives (identity, origin, timestamps, errors)
//! - `token` - Origin-bound token format, key derivation and sealing
//! - `entitlement` - Per-identity binding and usage credit
//! - `credit_code` - Single-use credit codes
//! - `payment` - Gateway orders and notification reconciliation rules

pub mod credit_code;
pub mod entitlement;
pub mod foundation;
pub mod payment;
pub mod token;
