//! Store atomicity against a live PostgreSQL.
//!
//! Run with `DATABASE_URL=postgres://... cargo test --test postgres_store_integration -- --ignored`.
//! Migrations are applied on connect; every test uses fresh identities and
//! origins, so the database may be reused between runs.

use std::net::Ipv6Addr;
use std::sync::atomic::{AtomicU16, Ordering};
use std::sync::Arc;

use futures::future::join_all;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use token_ledger::adapters::{
    PostgresCreditCodeRepository, PostgresEntitlementRepository, PostgresPaymentOrderRepository,
    StoreTimeout,
};
use token_ledger::domain::credit_code::CreditCode;
use token_ledger::domain::entitlement::{Binding, EntitlementRecord};
use token_ledger::domain::foundation::{ErrorCode, Identity, Origin, Timestamp};
use token_ledger::domain::payment::{OrderStatus, PaidDetails, PaymentOrder, Price};
use token_ledger::domain::token::{IssuanceTime, TokenClaims};
use token_ledger::ports::{
    CreditCodeRepository, CreditDecrement, EntitlementRepository, PaymentOrderRepository,
    RedeemOutcome, SaveResult, SettlementEffect, SettlementOutcome,
};

// =============================================================================
// Test Infrastructure
// =============================================================================

static SEQUENCE: AtomicU16 = AtomicU16::new(0);

async fn pool() -> PgPool {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let pool = PgPoolOptions::new()
        .max_connections(16)
        .connect(&url)
        .await
        .expect("connect to DATABASE_URL");
    sqlx::migrate!().run(&pool).await.expect("run migrations");
    pool
}

fn unique_suffix() -> (u64, u16) {
    let nanos = Timestamp::now().as_unix_nanos() as u64;
    (nanos, SEQUENCE.fetch_add(1, Ordering::SeqCst))
}

fn fresh_identity() -> Identity {
    let (nanos, seq) = unique_suffix();
    Identity::new(format!("it-{}-{}", nanos, seq)).unwrap()
}

fn fresh_origin() -> Origin {
    let (nanos, seq) = unique_suffix();
    let addr = Ipv6Addr::new(
        0x2606,
        0x4700,
        (nanos >> 48) as u16,
        (nanos >> 32) as u16,
        (nanos >> 16) as u16,
        nanos as u16,
        std::process::id() as u16,
        seq,
    );
    Origin::parse_public(&addr.to_string()).unwrap()
}

async fn insert_entitlement(
    repo: &PostgresEntitlementRepository,
    credit: i64,
) -> EntitlementRecord {
    let claims = TokenClaims::new(fresh_identity(), fresh_origin(), IssuanceTime::now());
    let record =
        EntitlementRecord::issue(&claims, "ab".repeat(40), credit, Timestamp::now()).unwrap();
    repo.insert(&record).await.unwrap();
    record
}

fn paid_details(cents: i64) -> PaidDetails {
    PaidDetails {
        really_paid: Price::from_cents(cents).unwrap(),
        pay_method: 2,
        paid_at: Timestamp::now(),
    }
}

// =============================================================================
// Entitlements
// =============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
#[ignore = "Requires PostgreSQL (set DATABASE_URL)"]
async fn concurrent_decrements_never_overspend() {
    let repo = Arc::new(PostgresEntitlementRepository::new(pool().await, StoreTimeout::default()));
    let record = insert_entitlement(&repo, 3).await;

    let attempts = (0..10).map(|_| {
        let repo = repo.clone();
        let identity = record.identity.clone();
        let issuance_time = record.issuance_time;
        tokio::spawn(async move { repo.decrement_credit(&identity, issuance_time).await })
    });
    let results: Vec<CreditDecrement> = join_all(attempts)
        .await
        .into_iter()
        .map(|joined| joined.unwrap().unwrap())
        .collect();

    let spent = results
        .iter()
        .filter(|r| matches!(r, CreditDecrement::Decremented { .. }))
        .count();
    let refused = results.iter().filter(|r| **r == CreditDecrement::Exhausted).count();
    assert_eq!((spent, refused), (3, 7));

    let stored = repo.find_by_identity(&record.identity).await.unwrap().unwrap();
    assert_eq!(stored.remaining_credit, 0);
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (set DATABASE_URL)"]
async fn decrement_for_stale_issuance_is_not_found() {
    let repo = PostgresEntitlementRepository::new(pool().await, StoreTimeout::default());
    let record = insert_entitlement(&repo, 3).await;

    let stale = IssuanceTime::from_millis(record.issuance_time.as_millis() - 1);
    assert_eq!(
        repo.decrement_credit(&record.identity, stale).await.unwrap(),
        CreditDecrement::NotFound
    );
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (set DATABASE_URL)"]
async fn second_binding_of_an_origin_is_rejected() {
    let repo = PostgresEntitlementRepository::new(pool().await, StoreTimeout::default());
    let first = insert_entitlement(&repo, 3).await;

    let claims = TokenClaims::new(fresh_identity(), first.bound_origin.clone(), IssuanceTime::now());
    let second = EntitlementRecord::issue(&claims, "cd".repeat(40), 3, Timestamp::now()).unwrap();

    let err = repo.insert(&second).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::OriginAlreadyBound);
}

// =============================================================================
// Credit Codes
// =============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
#[ignore = "Requires PostgreSQL (set DATABASE_URL)"]
async fn concurrent_redemptions_grant_once() {
    let repo = Arc::new(PostgresCreditCodeRepository::new(pool().await, StoreTimeout::default()));
    let (nanos, seq) = unique_suffix();
    let value = format!("{:016x}{:016x}", nanos, seq as u64);
    let code = CreditCode::issue(value.clone(), 5, 100, fresh_identity(), Timestamp::now()).unwrap();
    assert_eq!(repo.insert(&code).await.unwrap(), SaveResult::Inserted);
    assert_eq!(repo.insert(&code).await.unwrap(), SaveResult::AlreadyExists);

    let attempts = (0..8).map(|_| {
        let repo = repo.clone();
        let value = value.clone();
        tokio::spawn(async move {
            repo.redeem(&value, &fresh_identity(), Timestamp::now()).await
        })
    });
    let results: Vec<RedeemOutcome> = join_all(attempts)
        .await
        .into_iter()
        .map(|joined| joined.unwrap().unwrap())
        .collect();

    let granted = results
        .iter()
        .filter(|r| **r == RedeemOutcome::Redeemed { grant_amount: 5 })
        .count();
    let refused = results.iter().filter(|r| **r == RedeemOutcome::AlreadyUsed).count();
    assert_eq!((granted, refused), (1, 7));

    let stored = repo.find_by_code(&value).await.unwrap().unwrap();
    assert!(stored.used);
    assert!(stored.used_by.is_some());
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (set DATABASE_URL)"]
async fn redeeming_unknown_code_is_not_found() {
    let repo = PostgresCreditCodeRepository::new(pool().await, StoreTimeout::default());
    let outcome = repo
        .redeem("ffffffffffffffffffffffffffffffff", &fresh_identity(), Timestamp::now())
        .await
        .unwrap();
    assert_eq!(outcome, RedeemOutcome::NotFound);
}

// =============================================================================
// Settlement
// =============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
#[ignore = "Requires PostgreSQL (set DATABASE_URL)"]
async fn concurrent_settlements_apply_credit_once() {
    let pool = pool().await;
    let entitlements = PostgresEntitlementRepository::new(pool.clone(), StoreTimeout::default());
    let orders = Arc::new(PostgresPaymentOrderRepository::new(pool, StoreTimeout::default()));

    let record = insert_entitlement(&entitlements, 3).await;
    let order = PaymentOrder::credit_purchase(
        record.identity.clone(),
        5,
        Price::from_cents(10).unwrap(),
        Timestamp::now(),
    )
    .unwrap();
    orders.save(&order).await.unwrap();

    let attempts = (0..8).map(|_| {
        let orders = orders.clone();
        let pay_id = order.pay_id.clone();
        tokio::spawn(async move {
            orders
                .settle(&pay_id, SettlementEffect::GrantCredit, &paid_details(50))
                .await
        })
    });
    let results: Vec<SettlementOutcome> = join_all(attempts)
        .await
        .into_iter()
        .map(|joined| joined.unwrap().unwrap())
        .collect();

    let settled: Vec<i64> = results
        .iter()
        .filter_map(|r| match r {
            SettlementOutcome::Settled { remaining_credit, .. } => Some(*remaining_credit),
            SettlementOutcome::AlreadyTerminal(_) => None,
        })
        .collect();
    assert_eq!(settled, vec![8]);
    assert!(results
        .iter()
        .filter(|r| !matches!(r, SettlementOutcome::Settled { .. }))
        .all(|r| *r == SettlementOutcome::AlreadyTerminal(OrderStatus::Paid)));

    let stored = entitlements.find_by_identity(&record.identity).await.unwrap().unwrap();
    assert_eq!(stored.remaining_credit, 8);

    let paid = orders.find_by_pay_id(&order.pay_id).await.unwrap().unwrap();
    assert_eq!(paid.status, OrderStatus::Paid);
    assert_eq!(paid.really_paid, Some(Price::from_cents(50).unwrap()));
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (set DATABASE_URL)"]
async fn rebind_onto_a_taken_origin_rolls_back() {
    let pool = pool().await;
    let entitlements = PostgresEntitlementRepository::new(pool.clone(), StoreTimeout::default());
    let orders = PostgresPaymentOrderRepository::new(pool, StoreTimeout::default());

    let mover = insert_entitlement(&entitlements, 3).await;
    let occupant = insert_entitlement(&entitlements, 3).await;

    let order = PaymentOrder::origin_rebind(
        mover.identity.clone(),
        occupant.bound_origin.clone(),
        Price::from_cents(100).unwrap(),
        Timestamp::now(),
    );
    orders.save(&order).await.unwrap();

    let claims = TokenClaims::new(
        mover.identity.clone(),
        occupant.bound_origin.clone(),
        IssuanceTime::now(),
    );
    let binding = Binding::new(&claims, "ef".repeat(40));
    let err = orders
        .settle(&order.pay_id, SettlementEffect::Rebind(binding), &paid_details(100))
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::OriginAlreadyBound);

    // Neither the order nor the entitlement changed
    let still_pending = orders.find_by_pay_id(&order.pay_id).await.unwrap().unwrap();
    assert_eq!(still_pending.status, OrderStatus::Pending);
    let unchanged = entitlements.find_by_identity(&mover.identity).await.unwrap().unwrap();
    assert_eq!(unchanged.bound_origin, mover.bound_origin);
    assert_eq!(unchanged.token, mover.token);
}
