//! PostgreSQL implementation of EntitlementRepository.
//!
//! Credit check-and-decrement is a single conditional UPDATE, so two
//! concurrent verifications of the last credit cannot both succeed.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use super::support::{corrupt, db_error, StoreTimeout};
use crate::domain::entitlement::EntitlementRecord;
use crate::domain::foundation::{DomainError, ErrorCode, Identity, Origin, Timestamp};
use crate::domain::token::IssuanceTime;
use crate::ports::{CreditDecrement, EntitlementRepository};

pub struct PostgresEntitlementRepository {
    pool: PgPool,
    timeout: StoreTimeout,
}

impl PostgresEntitlementRepository {
    pub fn new(pool: PgPool, timeout: StoreTimeout) -> Self {
        Self { pool, timeout }
    }
}

/// Database row representation of an entitlement.
#[derive(Debug, sqlx::FromRow)]
struct EntitlementRow {
    identity: String,
    bound_origin: String,
    token: String,
    remaining_credit: i64,
    issuance_time: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<EntitlementRow> for EntitlementRecord {
    type Error = DomainError;

    fn try_from(row: EntitlementRow) -> Result<Self, Self::Error> {
        Ok(EntitlementRecord {
            identity: Identity::new(row.identity).map_err(|e| corrupt("identity", e))?,
            bound_origin: Origin::try_from(row.bound_origin)
                .map_err(|e| corrupt("bound_origin", e))?,
            token: row.token,
            remaining_credit: row.remaining_credit,
            issuance_time: IssuanceTime::from_millis(row.issuance_time),
            created_at: Timestamp::from_datetime(row.created_at),
            updated_at: Timestamp::from_datetime(row.updated_at),
        })
    }
}

const SELECT_ENTITLEMENT: &str = r#"
    SELECT identity, bound_origin, token, remaining_credit, issuance_time, created_at, updated_at
    FROM entitlements
"#;

#[async_trait]
impl EntitlementRepository for PostgresEntitlementRepository {
    async fn insert(&self, record: &EntitlementRecord) -> Result<(), DomainError> {
        self.timeout
            .run("insert entitlement", async {
                sqlx::query(
                    r#"
                    INSERT INTO entitlements (
                        identity, bound_origin, token, remaining_credit, issuance_time,
                        created_at, updated_at
                    ) VALUES ($1, $2, $3, $4, $5, $6, $7)
                    "#,
                )
                .bind(record.identity.as_str())
                .bind(record.bound_origin.as_str())
                .bind(&record.token)
                .bind(record.remaining_credit)
                .bind(record.issuance_time.as_millis())
                .bind(record.created_at.as_datetime())
                .bind(record.updated_at.as_datetime())
                .execute(&self.pool)
                .await
                .map_err(|e| db_error("insert entitlement", e))?;
                Ok(())
            })
            .await
    }

    async fn find_by_identity(
        &self,
        identity: &Identity,
    ) -> Result<Option<EntitlementRecord>, DomainError> {
        self.timeout
            .run("find entitlement", async {
                let row: Option<EntitlementRow> =
                    sqlx::query_as(&format!("{} WHERE identity = $1", SELECT_ENTITLEMENT))
                        .bind(identity.as_str())
                        .fetch_optional(&self.pool)
                        .await
                        .map_err(|e| db_error("find entitlement", e))?;
                row.map(EntitlementRecord::try_from).transpose()
            })
            .await
    }

    async fn find_by_origin(
        &self,
        origin: &Origin,
    ) -> Result<Option<EntitlementRecord>, DomainError> {
        self.timeout
            .run("find entitlement by origin", async {
                let row: Option<EntitlementRow> =
                    sqlx::query_as(&format!("{} WHERE bound_origin = $1", SELECT_ENTITLEMENT))
                        .bind(origin.as_str())
                        .fetch_optional(&self.pool)
                        .await
                        .map_err(|e| db_error("find entitlement by origin", e))?;
                row.map(EntitlementRecord::try_from).transpose()
            })
            .await
    }

    async fn decrement_credit(
        &self,
        identity: &Identity,
        issuance_time: IssuanceTime,
    ) -> Result<CreditDecrement, DomainError> {
        self.timeout
            .run("decrement credit", async {
                let remaining: Option<i64> = sqlx::query_scalar(
                    r#"
                    UPDATE entitlements
                    SET remaining_credit = remaining_credit - 1, updated_at = NOW()
                    WHERE identity = $1 AND issuance_time = $2 AND remaining_credit > 0
                    RETURNING remaining_credit
                    "#,
                )
                .bind(identity.as_str())
                .bind(issuance_time.as_millis())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| db_error("decrement credit", e))?;

                if let Some(remaining) = remaining {
                    return Ok(CreditDecrement::Decremented { remaining });
                }

                // Nothing updated: either no such record or no credit left
                let exists: Option<i64> = sqlx::query_scalar(
                    "SELECT remaining_credit FROM entitlements WHERE identity = $1 AND issuance_time = $2",
                )
                .bind(identity.as_str())
                .bind(issuance_time.as_millis())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| db_error("read credit", e))?;

                Ok(match exists {
                    Some(_) => CreditDecrement::Exhausted,
                    None => CreditDecrement::NotFound,
                })
            })
            .await
    }

    async fn add_credit(&self, identity: &Identity, amount: i64) -> Result<i64, DomainError> {
        if amount < 1 {
            return Err(DomainError::validation("amount", "credit grant must be positive"));
        }

        self.timeout
            .run("add credit", async {
                let remaining: Option<i64> = sqlx::query_scalar(
                    r#"
                    UPDATE entitlements
                    SET remaining_credit = remaining_credit + $2, updated_at = NOW()
                    WHERE identity = $1
                    RETURNING remaining_credit
                    "#,
                )
                .bind(identity.as_str())
                .bind(amount)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| db_error("add credit", e))?;

                remaining.ok_or_else(|| {
                    DomainError::new(ErrorCode::EntitlementNotFound, "No entitlement for identity")
                })
            })
            .await
    }
}
