//! PostgreSQL adapters - Database implementations for the store ports.
//!
//! - `PostgresEntitlementRepository` - Entitlements with atomic decrement
//! - `PostgresCreditCodeRepository` - Row-locked single-use redemption
//! - `PostgresPaymentOrderRepository` - Orders and settlement transactions
//!
//! Every call runs under a `StoreTimeout`; transactions additionally set
//! `lock_timeout` and `statement_timeout` to the same bound.

mod credit_code_repository;
mod entitlement_repository;
mod payment_order_repository;
mod support;

pub use credit_code_repository::PostgresCreditCodeRepository;
pub use entitlement_repository::PostgresEntitlementRepository;
pub use payment_order_repository::PostgresPaymentOrderRepository;
pub use support::StoreTimeout;
