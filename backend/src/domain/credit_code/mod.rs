//! Credit code domain module.
//!
//! Single-use codes that grant usage credit. The ledger only records
//! redemption; adding the credit to an entitlement is the caller's step.

mod code;
mod errors;

pub use code::{normalize_code, CodeGenerator, CreditCode, CODE_LEN};
pub use errors::CreditCodeError;
