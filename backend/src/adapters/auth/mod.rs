//! Authentication adapters.
//!
//! Implementations of the `IntentAuthenticator` port:
//!
//! - `jwt` - HS256 JWTs signed by the conversational front end
//! - `mock` - Test implementation keyed by opaque strings

mod jwt;
mod mock;

pub use jwt::{IntentClaims, JwtConfig, JwtIntentAuthenticator};
pub use mock::MockIntentAuthenticator;
