//! Application layer - Commands, Queries, and Handlers.
//!
//! This layer orchestrates domain operations and coordinates between ports.
//! Command handlers change the ledger; query handlers only read it.

pub mod handlers;

pub use handlers::{
    // Entitlement handlers
    GetEntitlementHandler, GetEntitlementQuery, IssueTokenCommand, IssueTokenHandler,
    VerifyTokenCommand, VerifyTokenHandler,
    // Credit code handlers
    IssueCreditCodeCommand, IssueCreditCodeHandler, RedeemCreditCodeCommand,
    RedeemCreditCodeHandler,
    // Payment handlers
    CheckOrderStatusHandler, CheckOrderStatusQuery, CreateCreditPurchaseCommand,
    CreateCreditPurchaseHandler, CreateRebindOrderCommand, CreateRebindOrderHandler,
    PaymentPricing, ReconcilePaymentCommand, ReconcilePaymentHandler,
};
