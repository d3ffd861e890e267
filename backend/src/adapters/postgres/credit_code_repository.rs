//! PostgreSQL implementation of CreditCodeRepository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use super::support::{corrupt, db_error, StoreTimeout};
use crate::domain::credit_code::CreditCode;
use crate::domain::foundation::{DomainError, Identity, Timestamp};
use crate::ports::{CreditCodeRepository, RedeemOutcome, SaveResult};

pub struct PostgresCreditCodeRepository {
    pool: PgPool,
    timeout: StoreTimeout,
}

impl PostgresCreditCodeRepository {
    pub fn new(pool: PgPool, timeout: StoreTimeout) -> Self {
        Self { pool, timeout }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CreditCodeRow {
    code: String,
    grant_amount: i64,
    used: bool,
    used_by: Option<String>,
    issuer: String,
    created_at: DateTime<Utc>,
    used_at: Option<DateTime<Utc>>,
}

impl TryFrom<CreditCodeRow> for CreditCode {
    type Error = DomainError;

    fn try_from(row: CreditCodeRow) -> Result<Self, Self::Error> {
        Ok(CreditCode {
            code: row.code,
            grant_amount: row.grant_amount,
            used: row.used,
            used_by: row
                .used_by
                .map(Identity::new)
                .transpose()
                .map_err(|e| corrupt("used_by", e))?,
            issuer: Identity::new(row.issuer).map_err(|e| corrupt("issuer", e))?,
            created_at: Timestamp::from_datetime(row.created_at),
            used_at: row.used_at.map(Timestamp::from_datetime),
        })
    }
}

#[async_trait]
impl CreditCodeRepository for PostgresCreditCodeRepository {
    async fn insert(&self, code: &CreditCode) -> Result<SaveResult, DomainError> {
        self.timeout
            .run("insert credit code", async {
                let result = sqlx::query(
                    r#"
                    INSERT INTO credit_codes (code, grant_amount, used, used_by, issuer, created_at, used_at)
                    VALUES ($1, $2, $3, $4, $5, $6, $7)
                    ON CONFLICT (code) DO NOTHING
                    "#,
                )
                .bind(&code.code)
                .bind(code.grant_amount)
                .bind(code.used)
                .bind(code.used_by.as_ref().map(|i| i.as_str()))
                .bind(code.issuer.as_str())
                .bind(code.created_at.as_datetime())
                .bind(code.used_at.as_ref().map(|t| *t.as_datetime()))
                .execute(&self.pool)
                .await
                .map_err(|e| db_error("insert credit code", e))?;

                Ok(if result.rows_affected() == 0 {
                    SaveResult::AlreadyExists
                } else {
                    SaveResult::Inserted
                })
            })
            .await
    }

    async fn redeem(
        &self,
        code: &str,
        identity: &Identity,
        now: Timestamp,
    ) -> Result<RedeemOutcome, DomainError> {
        self.timeout
            .run("redeem credit code", async {
                let mut tx = self.timeout.begin(&self.pool).await?;

                // 1. Lock the code row
                let row: Option<CreditCodeRow> = sqlx::query_as(
                    r#"
                    SELECT code, grant_amount, used, used_by, issuer, created_at, used_at
                    FROM credit_codes
                    WHERE code = $1
                    FOR UPDATE
                    "#,
                )
                .bind(code)
                .fetch_optional(&mut *tx)
                .await
                .map_err(|e| db_error("lock credit code", e))?;

                let Some(row) = row else {
                    return Ok(RedeemOutcome::NotFound);
                };

                // 2. Check and mark in memory, then persist
                let mut credit_code = CreditCode::try_from(row)?;
                let grant_amount = match credit_code.redeem(identity, now) {
                    Ok(grant_amount) => grant_amount,
                    Err(_) => return Ok(RedeemOutcome::AlreadyUsed),
                };

                sqlx::query(
                    r#"
                    UPDATE credit_codes
                    SET used = TRUE, used_by = $2, used_at = $3
                    WHERE code = $1
                    "#,
                )
                .bind(code)
                .bind(identity.as_str())
                .bind(now.as_datetime())
                .execute(&mut *tx)
                .await
                .map_err(|e| db_error("mark credit code used", e))?;

                tx.commit()
                    .await
                    .map_err(|e| db_error("commit redemption", e))?;

                Ok(RedeemOutcome::Redeemed { grant_amount })
            })
            .await
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<CreditCode>, DomainError> {
        self.timeout
            .run("find credit code", async {
                let row: Option<CreditCodeRow> = sqlx::query_as(
                    r#"
                    SELECT code, grant_amount, used, used_by, issuer, created_at, used_at
                    FROM credit_codes
                    WHERE code = $1
                    "#,
                )
                .bind(code)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| db_error("find credit code", e))?;

                row.map(CreditCode::try_from).transpose()
            })
            .await
    }
}
