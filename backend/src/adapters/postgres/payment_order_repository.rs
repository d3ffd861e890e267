//! PostgreSQL implementation of PaymentOrderRepository.
//!
//! Settlement locks the order row with `SELECT ... FOR UPDATE`, re-checks
//! its status and applies the entitlement change in the same transaction.
//! A concurrent delivery of the same notification blocks on the lock and
//! then observes `paid`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};

use super::support::{corrupt, db_error, StoreTimeout};
use crate::domain::foundation::{DomainError, ErrorCode, Identity, Origin, Timestamp};
use crate::domain::payment::{OrderKind, OrderStatus, PaidDetails, PaymentOrder, Price};
use crate::ports::{PaymentOrderRepository, SettlementEffect, SettlementOutcome};

pub struct PostgresPaymentOrderRepository {
    pool: PgPool,
    timeout: StoreTimeout,
}

impl PostgresPaymentOrderRepository {
    pub fn new(pool: PgPool, timeout: StoreTimeout) -> Self {
        Self { pool, timeout }
    }
}

/// Database row representation of a payment order.
#[derive(Debug, sqlx::FromRow)]
struct PaymentOrderRow {
    pay_id: String,
    gateway_order_id: Option<String>,
    identity: String,
    kind: String,
    requested_amount: i64,
    target_origin: Option<String>,
    goods_name: String,
    price_cents: i64,
    status: String,
    really_paid_cents: Option<i64>,
    pay_method: Option<i32>,
    pay_url: Option<String>,
    created_at: DateTime<Utc>,
    paid_at: Option<DateTime<Utc>>,
}

impl TryFrom<PaymentOrderRow> for PaymentOrder {
    type Error = DomainError;

    fn try_from(row: PaymentOrderRow) -> Result<Self, Self::Error> {
        Ok(PaymentOrder {
            pay_id: row.pay_id,
            gateway_order_id: row.gateway_order_id,
            identity: Identity::new(row.identity).map_err(|e| corrupt("identity", e))?,
            kind: OrderKind::parse(&row.kind).map_err(|e| corrupt("kind", e))?,
            requested_amount: row.requested_amount,
            target_origin: row
                .target_origin
                .map(Origin::try_from)
                .transpose()
                .map_err(|e| corrupt("target_origin", e))?,
            goods_name: row.goods_name,
            price: Price::from_cents(row.price_cents).map_err(|e| corrupt("price_cents", e))?,
            status: OrderStatus::parse(&row.status).map_err(|e| corrupt("status", e))?,
            really_paid: row
                .really_paid_cents
                .map(Price::from_cents)
                .transpose()
                .map_err(|e| corrupt("really_paid_cents", e))?,
            pay_method: row.pay_method,
            pay_url: row.pay_url,
            created_at: Timestamp::from_datetime(row.created_at),
            paid_at: row.paid_at.map(Timestamp::from_datetime),
        })
    }
}

const SELECT_ORDER: &str = r#"
    SELECT pay_id, gateway_order_id, identity, kind, requested_amount, target_origin,
           goods_name, price_cents, status, really_paid_cents, pay_method, pay_url,
           created_at, paid_at
    FROM payment_orders
"#;

fn order_not_found(pay_id: &str) -> DomainError {
    DomainError::new(ErrorCode::OrderNotFound, format!("Order {} not found", pay_id))
}

fn entitlement_not_found() -> DomainError {
    DomainError::new(ErrorCode::EntitlementNotFound, "No entitlement for identity")
}

impl PostgresPaymentOrderRepository {
    async fn fetch_one(&self, filter: &str, value: &str) -> Result<Option<PaymentOrder>, DomainError> {
        let row: Option<PaymentOrderRow> =
            sqlx::query_as(&format!("{} {}", SELECT_ORDER, filter))
                .bind(value)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| db_error("find payment order", e))?;
        row.map(PaymentOrder::try_from).transpose()
    }

    /// Applies the effect to the entitlement and returns the remaining credit.
    async fn apply_effect(
        tx: &mut Transaction<'static, Postgres>,
        order: &PaymentOrder,
        effect: SettlementEffect,
        now: Timestamp,
    ) -> Result<i64, DomainError> {
        let remaining: Option<i64> = match (order.kind, effect) {
            (OrderKind::CreditPurchase, SettlementEffect::GrantCredit) => sqlx::query_scalar(
                r#"
                UPDATE entitlements
                SET remaining_credit = remaining_credit + $2, updated_at = $3
                WHERE identity = $1
                RETURNING remaining_credit
                "#,
            )
            .bind(order.identity.as_str())
            .bind(order.requested_amount)
            .bind(now.as_datetime())
            .fetch_optional(&mut **tx)
            .await
            .map_err(|e| db_error("grant credit", e))?,

            (OrderKind::OriginRebind, SettlementEffect::Rebind(binding)) => sqlx::query_scalar(
                r#"
                UPDATE entitlements
                SET bound_origin = $2, token = $3, issuance_time = $4, updated_at = $5
                WHERE identity = $1
                RETURNING remaining_credit
                "#,
            )
            .bind(order.identity.as_str())
            .bind(binding.origin.as_str())
            .bind(&binding.token)
            .bind(binding.issuance_time.as_millis())
            .bind(now.as_datetime())
            .fetch_optional(&mut **tx)
            .await
            .map_err(|e| db_error("rebind entitlement", e))?,

            (kind, _) => {
                return Err(DomainError::new(
                    ErrorCode::InvalidStateTransition,
                    format!("Effect does not apply to a {} order", kind),
                ))
            }
        };

        remaining.ok_or_else(entitlement_not_found)
    }
}

#[async_trait]
impl PaymentOrderRepository for PostgresPaymentOrderRepository {
    async fn save(&self, order: &PaymentOrder) -> Result<(), DomainError> {
        self.timeout
            .run("save payment order", async {
                sqlx::query(
                    r#"
                    INSERT INTO payment_orders (
                        pay_id, gateway_order_id, identity, kind, requested_amount, target_origin,
                        goods_name, price_cents, status, really_paid_cents, pay_method, pay_url,
                        created_at, paid_at
                    ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
                    "#,
                )
                .bind(&order.pay_id)
                .bind(&order.gateway_order_id)
                .bind(order.identity.as_str())
                .bind(order.kind.as_str())
                .bind(order.requested_amount)
                .bind(order.target_origin.as_ref().map(|o| o.as_str()))
                .bind(&order.goods_name)
                .bind(order.price.cents())
                .bind(order.status.as_str())
                .bind(order.really_paid.map(|p| p.cents()))
                .bind(order.pay_method)
                .bind(&order.pay_url)
                .bind(order.created_at.as_datetime())
                .bind(order.paid_at.as_ref().map(|t| *t.as_datetime()))
                .execute(&self.pool)
                .await
                .map_err(|e| db_error("save payment order", e))?;
                Ok(())
            })
            .await
    }

    async fn attach_gateway_info(&self, order: &PaymentOrder) -> Result<(), DomainError> {
        self.timeout
            .run("attach gateway info", async {
                // A notification may already have settled the order; keep its paid amount
                let result = sqlx::query(
                    r#"
                    UPDATE payment_orders SET
                        gateway_order_id = $2,
                        pay_method = $3,
                        pay_url = $4,
                        really_paid_cents = CASE WHEN status = 'pending' THEN $5 ELSE really_paid_cents END
                    WHERE pay_id = $1
                    "#,
                )
                .bind(&order.pay_id)
                .bind(&order.gateway_order_id)
                .bind(order.pay_method)
                .bind(&order.pay_url)
                .bind(order.really_paid.map(|p| p.cents()))
                .execute(&self.pool)
                .await
                .map_err(|e| db_error("attach gateway info", e))?;

                if result.rows_affected() == 0 {
                    return Err(order_not_found(&order.pay_id));
                }
                Ok(())
            })
            .await
    }

    async fn find_by_pay_id(&self, pay_id: &str) -> Result<Option<PaymentOrder>, DomainError> {
        self.timeout
            .run("find order by pay id", self.fetch_one("WHERE pay_id = $1", pay_id))
            .await
    }

    async fn find_by_gateway_order_id(
        &self,
        gateway_order_id: &str,
    ) -> Result<Option<PaymentOrder>, DomainError> {
        self.timeout
            .run(
                "find order by gateway id",
                self.fetch_one(
                    "WHERE gateway_order_id = $1 ORDER BY created_at DESC LIMIT 1",
                    gateway_order_id,
                ),
            )
            .await
    }

    async fn latest_pending_for_identity(
        &self,
        identity: &Identity,
    ) -> Result<Option<PaymentOrder>, DomainError> {
        self.timeout
            .run(
                "find latest pending order",
                self.fetch_one(
                    "WHERE identity = $1 AND status = 'pending' ORDER BY created_at DESC LIMIT 1",
                    identity.as_str(),
                ),
            )
            .await
    }

    async fn settle(
        &self,
        pay_id: &str,
        effect: SettlementEffect,
        details: &PaidDetails,
    ) -> Result<SettlementOutcome, DomainError> {
        self.timeout
            .run("settle payment order", async {
                let mut tx = self.timeout.begin(&self.pool).await?;

                // 1. Lock the order row
                let row: Option<PaymentOrderRow> =
                    sqlx::query_as(&format!("{} WHERE pay_id = $1 FOR UPDATE", SELECT_ORDER))
                        .bind(pay_id)
                        .fetch_optional(&mut *tx)
                        .await
                        .map_err(|e| db_error("lock payment order", e))?;
                let mut order = PaymentOrder::try_from(row.ok_or_else(|| order_not_found(pay_id))?)?;

                // 2. Re-check under the lock
                if order.is_terminal() {
                    return Ok(SettlementOutcome::AlreadyTerminal(order.status));
                }

                // 3. Apply the effect; any failure drops the transaction
                let remaining_credit =
                    Self::apply_effect(&mut tx, &order, effect, details.paid_at).await?;

                // 4. Mark paid
                order.mark_paid(details).map_err(|e| {
                    DomainError::new(ErrorCode::InvalidStateTransition, e.to_string())
                })?;
                sqlx::query(
                    r#"
                    UPDATE payment_orders
                    SET status = $2, really_paid_cents = $3, pay_method = $4, paid_at = $5
                    WHERE pay_id = $1
                    "#,
                )
                .bind(pay_id)
                .bind(order.status.as_str())
                .bind(details.really_paid.cents())
                .bind(details.pay_method)
                .bind(details.paid_at.as_datetime())
                .execute(&mut *tx)
                .await
                .map_err(|e| db_error("mark order paid", e))?;

                tx.commit()
                    .await
                    .map_err(|e| db_error("commit settlement", e))?;

                Ok(SettlementOutcome::Settled {
                    order,
                    remaining_credit,
                })
            })
            .await
    }

    async fn mark_failed(&self, pay_id: &str) -> Result<bool, DomainError> {
        self.timeout
            .run("mark order failed", async {
                let result = sqlx::query(
                    "UPDATE payment_orders SET status = 'failed' WHERE pay_id = $1 AND status = 'pending'",
                )
                .bind(pay_id)
                .execute(&self.pool)
                .await
                .map_err(|e| db_error("mark order failed", e))?;

                if result.rows_affected() == 1 {
                    return Ok(true);
                }

                let exists: Option<String> =
                    sqlx::query_scalar("SELECT pay_id FROM payment_orders WHERE pay_id = $1")
                        .bind(pay_id)
                        .fetch_optional(&self.pool)
                        .await
                        .map_err(|e| db_error("find payment order", e))?;
                match exists {
                    Some(_) => Ok(false),
                    None => Err(order_not_found(pay_id)),
                }
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stored(order: &PaymentOrder) -> PaymentOrderRow {
        PaymentOrderRow {
            pay_id: order.pay_id.clone(),
            gateway_order_id: order.gateway_order_id.clone(),
            identity: order.identity.as_str().to_string(),
            kind: order.kind.as_str().to_string(),
            requested_amount: order.requested_amount,
            target_origin: order.target_origin.as_ref().map(|o| o.as_str().to_string()),
            goods_name: order.goods_name.clone(),
            price_cents: order.price.cents(),
            status: order.status.as_str().to_string(),
            really_paid_cents: order.really_paid.map(|p| p.cents()),
            pay_method: order.pay_method,
            pay_url: order.pay_url.clone(),
            created_at: *order.created_at.as_datetime(),
            paid_at: order.paid_at.map(|t| *t.as_datetime()),
        }
    }

    fn purchase() -> PaymentOrder {
        PaymentOrder::credit_purchase(
            Identity::new("42").unwrap(),
            5,
            Price::from_cents(10).unwrap(),
            Timestamp::now(),
        )
        .unwrap()
    }

    fn rebind() -> PaymentOrder {
        PaymentOrder::origin_rebind(
            Identity::new("42").unwrap(),
            Origin::parse_public("198.51.100.7").unwrap(),
            Price::from_cents(100).unwrap(),
            Timestamp::now(),
        )
    }

    #[test]
    fn pending_purchase_row_converts_back() {
        let order = purchase();
        assert_eq!(PaymentOrder::try_from(stored(&order)).unwrap(), order);
    }

    #[test]
    fn paid_rebind_row_keeps_target_and_paid_amount() {
        let mut order = rebind();
        order
            .mark_paid(&PaidDetails {
                really_paid: Price::from_cents(95).unwrap(),
                pay_method: 2,
                paid_at: Timestamp::now(),
            })
            .unwrap();

        let parsed = PaymentOrder::try_from(stored(&order)).unwrap();
        assert_eq!(parsed.kind, OrderKind::OriginRebind);
        assert_eq!(parsed.status, OrderStatus::Paid);
        assert_eq!(parsed.target_origin.unwrap().as_str(), "198.51.100.7");
        assert_eq!(parsed.really_paid.unwrap().cents(), 95);
    }

    #[test]
    fn unknown_kind_is_reported_as_corrupt() {
        let mut row = stored(&purchase());
        row.kind = "subscription".to_string();

        let err = PaymentOrder::try_from(row).unwrap_err();
        assert_eq!(err.code, ErrorCode::DatabaseError);
        assert!(err.message.contains("kind"), "{}", err.message);
    }

    #[test]
    fn unknown_status_is_reported_as_corrupt() {
        let mut row = stored(&purchase());
        row.status = "PAID".to_string();

        let err = PaymentOrder::try_from(row).unwrap_err();
        assert!(err.message.contains("status"), "{}", err.message);
    }

    #[test]
    fn private_target_origin_is_reported_as_corrupt() {
        let mut row = stored(&rebind());
        row.target_origin = Some("10.0.0.1".to_string());

        let err = PaymentOrder::try_from(row).unwrap_err();
        assert!(err.message.contains("target_origin"), "{}", err.message);
    }

    #[test]
    fn negative_amounts_are_reported_as_corrupt() {
        let mut row = stored(&purchase());
        row.price_cents = -1;
        assert!(PaymentOrder::try_from(row).unwrap_err().message.contains("price_cents"));

        let mut row = stored(&purchase());
        row.really_paid_cents = Some(-5);
        assert!(PaymentOrder::try_from(row)
            .unwrap_err()
            .message
            .contains("really_paid_cents"));
    }
}
