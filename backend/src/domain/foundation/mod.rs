//! Foundation module - Shared domain primitives.
//!
//! Contains value objects, identifiers, and error types that form the
//! vocabulary shared by the token, entitlement, credit code and payment
//! modules.

mod auth;
mod errors;
mod ids;
mod origin;
mod state_machine;
mod timestamp;

pub use auth::{AuthError, Caller, CallerRole};
pub use errors::{DomainError, ErrorCode, ValidationError};
pub use ids::{Identity, MAX_IDENTITY_LEN};
pub use origin::Origin;
pub use state_machine::StateMachine;
pub use timestamp::Timestamp;
