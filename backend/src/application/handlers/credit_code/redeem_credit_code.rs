//! RedeemCreditCodeHandler - Command handler for redeeming a credit code.
//!
//! Redemption and the credit grant are two store calls. The entitlement is
//! checked first so a code is never burnt for an identity that cannot
//! receive the credit.

use std::sync::Arc;

use crate::domain::credit_code::{normalize_code, CreditCodeError};
use crate::domain::foundation::{Identity, Timestamp};
use crate::ports::{CreditCodeRepository, EntitlementRepository, RedeemOutcome};

#[derive(Debug, Clone)]
pub struct RedeemCreditCodeCommand {
    pub identity: Identity,
    /// Code as typed by the user.
    pub code: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RedeemCreditCodeResult {
    pub granted: i64,
    pub remaining_credit: i64,
}

pub struct RedeemCreditCodeHandler {
    codes: Arc<dyn CreditCodeRepository>,
    entitlements: Arc<dyn EntitlementRepository>,
}

impl RedeemCreditCodeHandler {
    pub fn new(
        codes: Arc<dyn CreditCodeRepository>,
        entitlements: Arc<dyn EntitlementRepository>,
    ) -> Self {
        Self {
            codes,
            entitlements,
        }
    }

    pub async fn handle(
        &self,
        cmd: RedeemCreditCodeCommand,
    ) -> Result<RedeemCreditCodeResult, CreditCodeError> {
        // 1. Normalize input
        let code = normalize_code(&cmd.code)?;

        // 2. The caller must be able to receive credit
        if self
            .entitlements
            .find_by_identity(&cmd.identity)
            .await?
            .is_none()
        {
            return Err(CreditCodeError::EntitlementMissing);
        }

        // 3. Atomic check-and-mark
        let granted = match self.codes.redeem(&code, &cmd.identity, Timestamp::now()).await? {
            RedeemOutcome::Redeemed { grant_amount } => grant_amount,
            RedeemOutcome::NotFound => return Err(CreditCodeError::NotFound),
            RedeemOutcome::AlreadyUsed => {
                tracing::info!(identity = %cmd.identity, "Credit code already used");
                return Err(CreditCodeError::AlreadyUsed);
            }
        };

        // 4. Grant the credit
        let remaining_credit = self
            .entitlements
            .add_credit(&cmd.identity, granted)
            .await
            .map_err(|e| {
                tracing::error!(
                    identity = %cmd.identity,
                    code = %code,
                    granted,
                    error = %e,
                    "Credit code marked used but credit grant failed"
                );
                CreditCodeError::from(e)
            })?;

        tracing::info!(identity = %cmd.identity, granted, remaining_credit, "Credit code redeemed");

        Ok(RedeemCreditCodeResult {
            granted,
            remaining_credit,
        })
    }
}
