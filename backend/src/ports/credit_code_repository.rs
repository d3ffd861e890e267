//! Credit code repository port.
//!
//! Redemption is a single critical section per code: lock, check `used`,
//! mark used. The loser of a concurrent redemption observes `AlreadyUsed`.

use async_trait::async_trait;

use crate::domain::credit_code::CreditCode;
use crate::domain::foundation::{DomainError, Identity, Timestamp};

/// Result of inserting a freshly generated code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveResult {
    Inserted,
    /// A code with the same value already exists.
    AlreadyExists,
}

/// Result of an atomic redemption.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedeemOutcome {
    Redeemed { grant_amount: i64 },
    NotFound,
    AlreadyUsed,
}

#[async_trait]
pub trait CreditCodeRepository: Send + Sync {
    async fn insert(&self, code: &CreditCode) -> Result<SaveResult, DomainError>;

    /// Mark `code` used by `identity` if and only if it is unused.
    async fn redeem(
        &self,
        code: &str,
        identity: &Identity,
        now: Timestamp,
    ) -> Result<RedeemOutcome, DomainError>;

    async fn find_by_code(&self, code: &str) -> Result<Option<CreditCode>, DomainError>;
}
