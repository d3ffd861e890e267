//! Credit code handlers.
//!
//! Issuance is restricted to callers with the issuer role; redemption is
//! open to any identity that holds an entitlement.

mod issue_credit_code;
mod redeem_credit_code;

pub use issue_credit_code::{IssueCreditCodeCommand, IssueCreditCodeHandler, IssueCreditCodeResult};
pub use redeem_credit_code::{
    RedeemCreditCodeCommand, RedeemCreditCodeHandler, RedeemCreditCodeResult,
};
