//! IssueCreditCodeHandler - Command handler for minting single-use credit codes.

use std::sync::Arc;

use crate::domain::credit_code::{CodeGenerator, CreditCode, CreditCodeError};
use crate::domain::foundation::{Caller, Timestamp};
use crate::ports::{CreditCodeRepository, SaveResult};

/// Attempts before a run of collisions is reported.
const MAX_ATTEMPTS: usize = 3;

/// Command to issue a credit code.
#[derive(Debug, Clone)]
pub struct IssueCreditCodeCommand {
    pub caller: Caller,
    pub grant_amount: i64,
}

#[derive(Debug, Clone)]
pub struct IssueCreditCodeResult {
    pub code: CreditCode,
}

pub struct IssueCreditCodeHandler {
    repository: Arc<dyn CreditCodeRepository>,
    generator: CodeGenerator,
    max_grant: i64,
}

impl IssueCreditCodeHandler {
    pub fn new(
        repository: Arc<dyn CreditCodeRepository>,
        generator: CodeGenerator,
        max_grant: i64,
    ) -> Self {
        Self {
            repository,
            generator,
            max_grant,
        }
    }

    pub async fn handle(
        &self,
        cmd: IssueCreditCodeCommand,
    ) -> Result<IssueCreditCodeResult, CreditCodeError> {
        // 1. Only issuers mint codes
        if !cmd.caller.can_issue_codes() {
            tracing::warn!(identity = %cmd.caller.identity, "Credit code issuance refused");
            return Err(CreditCodeError::Forbidden);
        }

        // 2. Generate and insert, with a fresh timestamp per attempt
        for attempt in 1..=MAX_ATTEMPTS {
            let now = Timestamp::now();
            let value = self.generator.generate(&cmd.caller.identity, now)?;
            let code = CreditCode::issue(
                value,
                cmd.grant_amount,
                self.max_grant,
                cmd.caller.identity.clone(),
                now,
            )?;

            match self.repository.insert(&code).await? {
                SaveResult::Inserted => {
                    tracing::info!(
                        issuer = %code.issuer,
                        grant_amount = code.grant_amount,
                        "Credit code issued"
                    );
                    return Ok(IssueCreditCodeResult { code });
                }
                SaveResult::AlreadyExists => {
                    tracing::warn!(attempt, "Generated credit code collided, retrying");
                }
            }
        }

        Err(CreditCodeError::Collision)
    }
}
