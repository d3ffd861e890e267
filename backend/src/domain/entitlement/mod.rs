//! Entitlement domain module.
//!
//! The ledger entry behind every token: which origin an identity is bound to,
//! which issuance the binding belongs to, and how much usage credit is left.

mod errors;
mod record;

pub use errors::{EntitlementError, VerifyError};
pub use record::{Binding, EntitlementRecord, VerifyOutcome};
