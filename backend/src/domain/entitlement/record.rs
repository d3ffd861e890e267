//! Entitlement record entity.

use serde::Serialize;

use crate::domain::foundation::{Identity, Origin, Timestamp, ValidationError};
use crate::domain::token::{IssuanceTime, TokenClaims};

/// The current binding of an identity: origin, token and issuance time.
///
/// Replaced as a unit on rebind, which invalidates every older token because
/// verification looks records up by `(identity, issuance_time)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub origin: Origin,
    pub token: String,
    pub issuance_time: IssuanceTime,
}

impl Binding {
    pub fn new(claims: &TokenClaims, token: String) -> Self {
        Self {
            origin: claims.origin.clone(),
            token,
            issuance_time: claims.issuance_time,
        }
    }
}

/// Durable mapping of identity to its binding and remaining usage credit.
///
/// At most one record exists per identity and per bound origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntitlementRecord {
    pub identity: Identity,
    pub bound_origin: Origin,
    pub token: String,
    pub remaining_credit: i64,
    pub issuance_time: IssuanceTime,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl EntitlementRecord {
    /// Creates the record for a first-time issuance.
    ///
    /// # Errors
    ///
    /// `OutOfRange` if `initial_credit` is negative.
    pub fn issue(
        claims: &TokenClaims,
        token: String,
        initial_credit: i64,
        now: Timestamp,
    ) -> Result<Self, ValidationError> {
        if initial_credit < 0 {
            return Err(ValidationError::out_of_range(
                "initial_credit",
                0,
                i64::MAX,
                initial_credit,
            ));
        }

        Ok(Self {
            identity: claims.identity.clone(),
            bound_origin: claims.origin.clone(),
            token,
            remaining_credit: initial_credit,
            issuance_time: claims.issuance_time,
            created_at: now,
            updated_at: now,
        })
    }

    /// True when this record is the one a token with `issuance_time` was
    /// minted for.
    pub fn is_current_issuance(&self, issuance_time: IssuanceTime) -> bool {
        self.issuance_time == issuance_time
    }

    pub fn has_credit(&self) -> bool {
        self.remaining_credit > 0
    }

    /// Consumes one unit of credit. Returns the remaining credit, or `None`
    /// without mutating anything when no credit is left.
    pub fn consume_one(&mut self, now: Timestamp) -> Option<i64> {
        if !self.has_credit() {
            return None;
        }
        self.remaining_credit -= 1;
        self.updated_at = now;
        Some(self.remaining_credit)
    }

    /// Adds purchased or redeemed credit.
    ///
    /// # Errors
    ///
    /// `OutOfRange` for a non-positive amount or when the sum would overflow.
    pub fn add_credit(&mut self, amount: i64, now: Timestamp) -> Result<i64, ValidationError> {
        if amount < 1 {
            return Err(ValidationError::out_of_range("amount", 1, i64::MAX, amount));
        }
        self.remaining_credit = self
            .remaining_credit
            .checked_add(amount)
            .ok_or_else(|| ValidationError::out_of_range("amount", 1, i64::MAX, amount))?;
        self.updated_at = now;
        Ok(self.remaining_credit)
    }

    /// Replaces origin, token and issuance time. Credit is kept.
    pub fn rebind(&mut self, binding: Binding, now: Timestamp) {
        self.bound_origin = binding.origin;
        self.token = binding.token;
        self.issuance_time = binding.issuance_time;
        self.updated_at = now;
    }
}

/// Successful verification result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerifyOutcome {
    pub identity: Identity,
    pub remaining_credit: i64,
}
