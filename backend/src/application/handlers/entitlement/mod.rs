//! Entitlement handlers.
//!
//! ## Commands
//! - Issuing the first token of an identity
//! - Verifying a token (consumes one credit)
//!
//! ## Queries
//! - Account info for the caller

mod get_entitlement;
mod issue_token;
mod verify_token;

// Commands
pub use issue_token::{IssueTokenCommand, IssueTokenHandler, IssueTokenResult};
pub use verify_token::{VerifyTokenCommand, VerifyTokenHandler};

// Queries
pub use get_entitlement::{GetEntitlementHandler, GetEntitlementQuery, GetEntitlementResult};
