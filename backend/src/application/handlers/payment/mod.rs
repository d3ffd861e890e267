//! Payment handlers.
//!
//! ## Commands
//! - Placing credit purchase and rebind orders
//! - Reconciling gateway notifications
//!
//! ## Queries
//! - Order status, with gateway failure detection

mod check_order_status;
mod create_credit_purchase;
mod create_rebind_order;
mod placement;
mod reconcile_payment;

pub use placement::{PaymentPricing, PlacedOrder};

// Commands
pub use create_credit_purchase::{CreateCreditPurchaseCommand, CreateCreditPurchaseHandler};
pub use create_rebind_order::{CreateRebindOrderCommand, CreateRebindOrderHandler};
pub use reconcile_payment::{ReconcilePaymentCommand, ReconcilePaymentHandler};

// Queries
pub use check_order_status::{
    CheckOrderStatusHandler, CheckOrderStatusQuery, CheckOrderStatusResult,
};
