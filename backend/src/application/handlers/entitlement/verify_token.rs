//! VerifyTokenHandler - Validates a presented token and consumes one credit.
//!
//! Each step is a hard gate, in this order:
//!
//! 1. Decode the frame (`Malformed`)
//! 2. Re-derive the key and decrypt (`CryptographicFailure`)
//! 3. Compare the sealed origin to the request origin (`OriginMismatch`)
//! 4. Find the entitlement for (identity, issuance time) (`NotFound`)
//! 5. Refuse when no credit is left (`InsufficientCredit`)
//! 6. Decrement
//!
//! Steps 4 to 6 are one atomic store call.

use std::sync::Arc;

use crate::domain::entitlement::{VerifyError, VerifyOutcome};
use crate::domain::foundation::Origin;
use crate::domain::token::TokenCodec;
use crate::ports::{CreditDecrement, EntitlementRepository};

#[derive(Debug, Clone)]
pub struct VerifyTokenCommand {
    /// Hex token as presented.
    pub token: String,
    /// Origin the request came from, as extracted by the boundary.
    pub origin: String,
}

pub struct VerifyTokenHandler {
    repository: Arc<dyn EntitlementRepository>,
    codec: TokenCodec,
}

impl VerifyTokenHandler {
    pub fn new(repository: Arc<dyn EntitlementRepository>, codec: TokenCodec) -> Self {
        Self { repository, codec }
    }

    pub async fn handle(&self, cmd: VerifyTokenCommand) -> Result<VerifyOutcome, VerifyError> {
        let request_origin = Origin::parse_public(&cmd.origin)
            .map_err(|e| VerifyError::Malformed(format!("request origin: {}", e)))?;

        let frame = self.codec.decode(&cmd.token).map_err(|e| {
            tracing::debug!(token_len = cmd.token.len(), error = %e, "Token rejected as malformed");
            VerifyError::from(e)
        })?;

        let claims = self.codec.decrypt(&frame).map_err(|e| {
            tracing::warn!(identity = %frame.identity, "Token failed authentication");
            VerifyError::from(e)
        })?;

        if claims.origin != request_origin {
            tracing::warn!(
                identity = %claims.identity,
                bound = %claims.origin,
                presented = %request_origin,
                "Token used from a different origin"
            );
            return Err(VerifyError::OriginMismatch);
        }

        let decrement = self
            .repository
            .decrement_credit(&claims.identity, claims.issuance_time)
            .await?;

        match decrement {
            CreditDecrement::Decremented { remaining } => {
                tracing::info!(identity = %claims.identity, remaining, "Token verified");
                Ok(VerifyOutcome {
                    identity: claims.identity,
                    remaining_credit: remaining,
                })
            }
            CreditDecrement::Exhausted => Err(VerifyError::InsufficientCredit),
            CreditDecrement::NotFound => Err(VerifyError::NotFound),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryLedger;
    use crate::application::handlers::testing::{codec, identity, origin};
    use crate::domain::entitlement::EntitlementRecord;
    use crate::domain::foundation::Timestamp;
    use crate::domain::token::{IssuanceTime, TokenClaims};

    /// Stores an entitlement for the claims and returns its token.
    async fn seed(ledger: &InMemoryLedger, claims: &TokenClaims, credit: i64) -> String {
        let token = codec().issue(claims).unwrap();
        let record =
            EntitlementRecord::issue(claims, token.clone(), credit, Timestamp::now()).unwrap();
        EntitlementRepository::insert(ledger, &record).await.unwrap();
        token
    }

    fn sample_claims() -> TokenClaims {
        TokenClaims::new(
            identity("42"),
            origin("203.0.113.9"),
            IssuanceTime::from_millis(1_700_000_000_000),
        )
    }

    fn handler(ledger: &InMemoryLedger) -> VerifyTokenHandler {
        VerifyTokenHandler::new(Arc::new(ledger.clone()), codec())
    }

    fn command(token: &str, ip: &str) -> VerifyTokenCommand {
        VerifyTokenCommand {
            token: token.to_string(),
            origin: ip.to_string(),
        }
    }

    // ══════════════════════════════════════════════════════════════
    // Success
    // ══════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn sample_identity_verifies_and_consumes_one_credit() {
        let ledger = InMemoryLedger::new();
        let token = seed(&ledger, &sample_claims(), 3).await;

        let outcome = handler(&ledger).handle(command(&token, "203.0.113.9")).await.unwrap();
        assert_eq!(outcome.identity.as_str(), "42");
        assert_eq!(outcome.remaining_credit, 2);
    }

    #[tokio::test]
    async fn last_credit_then_insufficient() {
        let ledger = InMemoryLedger::new();
        let token = seed(&ledger, &sample_claims(), 1).await;
        let h = handler(&ledger);

        assert_eq!(
            h.handle(command(&token, "203.0.113.9")).await.unwrap().remaining_credit,
            0
        );
        assert_eq!(
            h.handle(command(&token, "203.0.113.9")).await.unwrap_err(),
            VerifyError::InsufficientCredit
        );
        let stored = ledger.find_by_identity(&identity("42")).await.unwrap().unwrap();
        assert_eq!(stored.remaining_credit, 0);
    }

    // ══════════════════════════════════════════════════════════════
    // Gates
    // ══════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn different_origin_is_origin_mismatch() {
        let ledger = InMemoryLedger::new();
        let token = seed(&ledger, &sample_claims(), 3).await;

        let err = handler(&ledger).handle(command(&token, "198.51.100.7")).await.unwrap_err();
        assert_eq!(err, VerifyError::OriginMismatch);

        let stored = ledger.find_by_identity(&identity("42")).await.unwrap().unwrap();
        assert_eq!(stored.remaining_credit, 3);
    }

    #[tokio::test]
    async fn tampered_ciphertext_is_cryptographic_failure() {
        let ledger = InMemoryLedger::new();
        let token = seed(&ledger, &sample_claims(), 3).await;

        let index = 2 * (8 + 1 + 2 + 12) + 4;
        let mut chars: Vec<char> = token.chars().collect();
        chars[index] = if chars[index] == 'a' { 'b' } else { 'a' };
        let tampered: String = chars.into_iter().collect();

        let err = handler(&ledger).handle(command(&tampered, "203.0.113.9")).await.unwrap_err();
        assert_eq!(err, VerifyError::CryptographicFailure);
    }

    #[tokio::test]
    async fn garbage_token_is_malformed() {
        let ledger = InMemoryLedger::new();
        let err = handler(&ledger).handle(command("xyz", "203.0.113.9")).await.unwrap_err();
        assert!(matches!(err, VerifyError::Malformed(_)));
    }

    #[tokio::test]
    async fn private_request_origin_is_malformed() {
        let ledger = InMemoryLedger::new();
        let token = seed(&ledger, &sample_claims(), 3).await;
        let err = handler(&ledger).handle(command(&token, "127.0.0.1")).await.unwrap_err();
        assert!(matches!(err, VerifyError::Malformed(_)));
    }

    #[tokio::test]
    async fn valid_token_without_entitlement_is_not_found() {
        let ledger = InMemoryLedger::new();
        let token = codec().issue(&sample_claims()).unwrap();
        let err = handler(&ledger).handle(command(&token, "203.0.113.9")).await.unwrap_err();
        assert_eq!(err, VerifyError::NotFound);
    }

    #[tokio::test]
    async fn superseded_issuance_is_not_found() {
        let ledger = InMemoryLedger::new();
        seed(&ledger, &sample_claims(), 3).await;
        let stale = TokenClaims::new(
            identity("42"),
            origin("203.0.113.9"),
            IssuanceTime::from_millis(1_600_000_000_000),
        );
        let stale_token = codec().issue(&stale).unwrap();

        let err = handler(&ledger).handle(command(&stale_token, "203.0.113.9")).await.unwrap_err();
        assert_eq!(err, VerifyError::NotFound);
    }

    #[tokio::test]
    async fn store_outage_is_transient() {
        let ledger = InMemoryLedger::new();
        let token = seed(&ledger, &sample_claims(), 3).await;
        ledger.set_unavailable(true);

        let err = handler(&ledger).handle(command(&token, "203.0.113.9")).await.unwrap_err();
        assert!(matches!(err, VerifyError::TransientStoreFailure(_)));
    }

    // ══════════════════════════════════════════════════════════════
    // Concurrency
    // ══════════════════════════════════════════════════════════════

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_verifications_of_last_credit_yield_one_success() {
        let ledger = InMemoryLedger::new();
        let token = seed(&ledger, &sample_claims(), 1).await;
        let h = Arc::new(handler(&ledger));

        let tasks: Vec<_> = (0..10)
            .map(|_| {
                let h = Arc::clone(&h);
                let token = token.clone();
                tokio::spawn(async move { h.handle(command(&token, "203.0.113.9")).await })
            })
            .collect();

        let mut successes = 0;
        for task in tasks {
            match task.await.unwrap() {
                Ok(_) => successes += 1,
                Err(e) => assert_eq!(e, VerifyError::InsufficientCredit),
            }
        }
        assert_eq!(successes, 1);
        let stored = ledger.find_by_identity(&identity("42")).await.unwrap().unwrap();
        assert_eq!(stored.remaining_credit, 0);
    }
}
