//! Token Ledger - origin-bound access tokens backed by a per-use credit ledger
//!
//! Tokens are sealed per identity and bound to one client origin. Each
//! successful verification spends one unit of credit. Credit is topped up by
//! single-use credit codes or by paid orders, which are settled exactly once
//! from the payment gateway's signed notifications.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
