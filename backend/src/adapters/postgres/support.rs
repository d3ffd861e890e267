//! Shared helpers for the Postgres adapters: bounded calls, transaction
//! setup and error mapping.

use std::future::Future;
use std::time::Duration;

use sqlx::{PgPool, Postgres, Transaction};

use crate::domain::foundation::{DomainError, ErrorCode};

const ENTITLEMENTS_PKEY: &str = "entitlements_pkey";
const ENTITLEMENTS_ORIGIN_KEY: &str = "entitlements_bound_origin_key";
const CREDIT_CODES_PKEY: &str = "credit_codes_pkey";
const PAYMENT_ORDERS_PKEY: &str = "payment_orders_pkey";

/// SQLSTATE for `lock_timeout` expiry.
const LOCK_NOT_AVAILABLE: &str = "55P03";
/// SQLSTATE for `statement_timeout` expiry.
const QUERY_CANCELED: &str = "57014";

/// Upper bound on a single store operation, including lock waits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreTimeout(Duration);

impl StoreTimeout {
    pub fn from_millis(millis: u64) -> Self {
        Self(Duration::from_millis(millis))
    }

    pub fn as_duration(&self) -> Duration {
        self.0
    }

    /// Runs `operation`, failing with `StoreTimeout` when the bound expires.
    pub(super) async fn run<T, F>(&self, what: &str, operation: F) -> Result<T, DomainError>
    where
        F: Future<Output = Result<T, DomainError>>,
    {
        tokio::time::timeout(self.0, operation).await.map_err(|_| {
            tracing::warn!(operation = what, timeout_ms = self.0.as_millis() as u64, "Store call timed out");
            DomainError::new(
                ErrorCode::StoreTimeout,
                format!("{} timed out after {}ms", what, self.0.as_millis()),
            )
        })?
    }

    /// Opens a transaction whose lock waits and statements share this bound.
    pub(super) async fn begin(&self, pool: &PgPool) -> Result<Transaction<'static, Postgres>, DomainError> {
        let mut tx = pool
            .begin()
            .await
            .map_err(|e| db_error("start transaction", e))?;

        let millis = self.0.as_millis();
        sqlx::query(&format!("SET LOCAL lock_timeout = '{}ms'", millis))
            .execute(&mut *tx)
            .await
            .map_err(|e| db_error("set lock_timeout", e))?;
        sqlx::query(&format!("SET LOCAL statement_timeout = '{}ms'", millis))
            .execute(&mut *tx)
            .await
            .map_err(|e| db_error("set statement_timeout", e))?;

        Ok(tx)
    }
}

impl Default for StoreTimeout {
    fn default() -> Self {
        Self::from_millis(5_000)
    }
}

/// Maps a sqlx error to the domain error the ports promise.
pub(super) fn db_error(context: &str, err: sqlx::Error) -> DomainError {
    if let sqlx::Error::Database(db_err) = &err {
        match db_err.constraint() {
            Some(ENTITLEMENTS_PKEY) => {
                return DomainError::new(
                    ErrorCode::IdentityAlreadyBound,
                    "Identity already has an entitlement",
                )
            }
            Some(ENTITLEMENTS_ORIGIN_KEY) => {
                return DomainError::new(ErrorCode::OriginAlreadyBound, "Origin is already bound")
            }
            Some(CREDIT_CODES_PKEY) => {
                return DomainError::new(ErrorCode::CreditCodeConflict, "Credit code already exists")
            }
            Some(PAYMENT_ORDERS_PKEY) => {
                return DomainError::new(ErrorCode::OrderConflict, "Order already exists")
            }
            _ => {}
        }

        if matches!(db_err.code().as_deref(), Some(LOCK_NOT_AVAILABLE) | Some(QUERY_CANCELED)) {
            return DomainError::new(
                ErrorCode::StoreTimeout,
                format!("Failed to {}: {}", context, db_err.message()),
            );
        }
    }

    if matches!(err, sqlx::Error::PoolTimedOut) {
        return DomainError::new(
            ErrorCode::StoreTimeout,
            format!("Failed to {}: connection pool exhausted", context),
        );
    }

    DomainError::new(ErrorCode::DatabaseError, format!("Failed to {}: {}", context, err))
}

/// A stored value that no longer parses into its domain type.
pub(super) fn corrupt(column: &str, err: impl std::fmt::Display) -> DomainError {
    DomainError::new(
        ErrorCode::DatabaseError,
        format!("Invalid {} value in store: {}", column, err),
    )
}
