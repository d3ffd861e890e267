//! Application handlers.
//!
//! Command and query handlers that orchestrate domain operations.

pub mod credit_code;
pub mod entitlement;
pub mod payment;

#[cfg(test)]
mod testing;

pub use credit_code::{
    IssueCreditCodeCommand, IssueCreditCodeHandler, IssueCreditCodeResult,
    RedeemCreditCodeCommand, RedeemCreditCodeHandler, RedeemCreditCodeResult,
};
pub use entitlement::{
    GetEntitlementHandler, GetEntitlementQuery, GetEntitlementResult, IssueTokenCommand,
    IssueTokenHandler, IssueTokenResult, VerifyTokenCommand, VerifyTokenHandler,
};
pub use payment::{
    CheckOrderStatusHandler, CheckOrderStatusQuery, CheckOrderStatusResult,
    CreateCreditPurchaseCommand, CreateCreditPurchaseHandler, CreateRebindOrderCommand,
    CreateRebindOrderHandler, PaymentPricing, PlacedOrder, ReconcilePaymentCommand,
    ReconcilePaymentHandler,
};
