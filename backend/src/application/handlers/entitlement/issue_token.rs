//! IssueTokenHandler - Command handler for first-time token issuance.

use std::sync::Arc;

use crate::domain::entitlement::{EntitlementError, EntitlementRecord};
use crate::domain::foundation::{Identity, Origin, Timestamp};
use crate::domain::token::{IssuanceTime, TokenClaims, TokenCodec};
use crate::ports::EntitlementRepository;

/// Command to issue the first token of an identity.
#[derive(Debug, Clone)]
pub struct IssueTokenCommand {
    pub identity: Identity,
    /// Origin as supplied by the caller; validated here.
    pub origin: String,
}

#[derive(Debug, Clone)]
pub struct IssueTokenResult {
    pub record: EntitlementRecord,
}

pub struct IssueTokenHandler {
    repository: Arc<dyn EntitlementRepository>,
    codec: TokenCodec,
    default_credit: i64,
}

impl IssueTokenHandler {
    pub fn new(
        repository: Arc<dyn EntitlementRepository>,
        codec: TokenCodec,
        default_credit: i64,
    ) -> Self {
        Self {
            repository,
            codec,
            default_credit,
        }
    }

    pub async fn handle(&self, cmd: IssueTokenCommand) -> Result<IssueTokenResult, EntitlementError> {
        // 1. Validate the origin
        let origin = Origin::parse_public(&cmd.origin)
            .map_err(|e| EntitlementError::InvalidOrigin(e.to_string()))?;

        // 2. Early rejections; the store's unique constraints settle races
        if self.repository.find_by_identity(&cmd.identity).await?.is_some() {
            return Err(EntitlementError::IdentityAlreadyBound);
        }
        if self.repository.find_by_origin(&origin).await?.is_some() {
            return Err(EntitlementError::OriginAlreadyBound);
        }

        // 3. Mint the token
        let claims = TokenClaims::new(cmd.identity, origin, IssuanceTime::now());
        let token = self.codec.issue(&claims)?;

        // 4. Persist the binding
        let record = EntitlementRecord::issue(&claims, token, self.default_credit, Timestamp::now())
            .map_err(|e| EntitlementError::Sealing(e.to_string()))?;
        self.repository.insert(&record).await?;

        tracing::info!(
            identity = %record.identity,
            origin = %record.bound_origin,
            issuance_time = %record.issuance_time,
            credit = record.remaining_credit,
            "Token issued"
        );

        Ok(IssueTokenResult { record })
    }
}
