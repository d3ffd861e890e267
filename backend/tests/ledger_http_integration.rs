//! End-to-end tests of the HTTP API over the in-memory store.
//!
//! These drive the full router (auth middleware included) with signed intent
//! JWTs, a mock payment gateway and gateway notifications signed the way the
//! real gateway signs them.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use jsonwebtoken::{encode, EncodingKey, Header};
use secrecy::SecretString;
use serde_json::{json, Value};
use tower::ServiceExt;

use token_ledger::adapters::http::{app_router, AppState, LedgerPorts, LedgerSettings};
use token_ledger::adapters::{
    InMemoryLedger, IntentClaims, JwtConfig, JwtIntentAuthenticator, LoggingNotifier,
    MockPaymentGateway,
};
use token_ledger::application::handlers::PaymentPricing;
use token_ledger::domain::credit_code::CodeGenerator;
use token_ledger::domain::payment::{GatewaySigner, Price, NOTIFY_SIGNATURE_FIELDS};
use token_ledger::domain::token::{KeyDeriver, TokenCodec};
use token_ledger::ports::GatewayOrderState;

const JWT_SECRET: &str = "integration-jwt-secret-0123456789abcdef";
const JWT_ISSUER: &str = "chat-frontend";
const JWT_AUDIENCE: &str = "token-ledger";
const GATEWAY_SECRET: &str = "integration-gateway-secret";
const MERCHANT_ID: &str = "1000";
const USER: &str = "42";
const HOME: &str = "8.8.8.8";
const AWAY: &str = "1.1.1.1";

// =============================================================================
// Test Infrastructure
// =============================================================================

struct TestApp {
    router: Router,
    gateway: MockPaymentGateway,
    signer: GatewaySigner,
}

fn secret(value: &str) -> SecretString {
    SecretString::new(value.to_string())
}

impl TestApp {
    fn new() -> Self {
        let ledger = Arc::new(InMemoryLedger::new());
        let gateway = MockPaymentGateway::new();
        let signer = GatewaySigner::new(secret(GATEWAY_SECRET));

        let ports = LedgerPorts {
            entitlements: ledger.clone(),
            credit_codes: ledger.clone(),
            orders: ledger,
            gateway: Arc::new(gateway.clone()),
            notifier: Arc::new(LoggingNotifier),
            authenticator: Arc::new(JwtIntentAuthenticator::new(JwtConfig::new(
                secret(JWT_SECRET),
                JWT_ISSUER,
                JWT_AUDIENCE,
            ))),
        };
        let settings = LedgerSettings {
            codec: TokenCodec::new(KeyDeriver::new(secret("integration-salt-0123456789abcdef"))),
            code_generator: CodeGenerator::new(secret("integration-salt-0123456789abcdef")),
            signer: signer.clone(),
            merchant_id: MERCHANT_ID.to_string(),
            default_credit: 3,
            max_code_grant: 1000,
            pricing: PaymentPricing {
                price_per_use: Price::from_cents(10).unwrap(),
                rebind_price: Price::from_cents(100).unwrap(),
                pay_type: 2,
            },
        };

        Self {
            router: app_router(AppState::new(ports, settings), Duration::from_secs(5)),
            gateway,
            signer,
        }
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), 64 * 1024)
            .await
            .unwrap();
        let body = serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));
        (status, body)
    }

    async fn api(&self, method: &str, uri: &str, bearer: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("Authorization", format!("Bearer {}", bearer));
        let request = match body {
            Some(body) => builder
                .header("Content-Type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.send(request).await
    }

    async fn verify(&self, token: &str, from: &str) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("POST")
            .uri("/verify")
            .header("Content-Type", "application/json")
            .header("X-Forwarded-For", format!("{}, 10.0.0.1", from))
            .body(Body::from(json!({ "token": token }).to_string()))
            .unwrap();
        self.send(request).await
    }

    /// Posts a notification signed with the merchant secret as a urlencoded form.
    async fn notify(&self, mut params: HashMap<String, String>) -> (StatusCode, Value) {
        params.insert("mchId".to_string(), MERCHANT_ID.to_string());
        let sign = self.signer.sign(NOTIFY_SIGNATURE_FIELDS, &params).unwrap();
        params.insert("sign".to_string(), sign);
        self.notify_raw(params).await
    }

    async fn notify_raw(&self, params: HashMap<String, String>) -> (StatusCode, Value) {
        let body = params
            .iter()
            .map(|(k, v)| format!("{}={}", k, v.replace('|', "%7C")))
            .collect::<Vec<_>>()
            .join("&");
        let request = Request::builder()
            .method("POST")
            .uri("/notify")
            .header("Content-Type", "application/x-www-form-urlencoded")
            .body(Body::from(body))
            .unwrap();
        self.send(request).await
    }

    async fn issue_first_token(&self) -> String {
        let (status, body) = self
            .api("POST", "/api/tokens", &user_jwt(USER), Some(json!({ "origin": HOME })))
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["token"].as_str().unwrap().to_string()
    }

    async fn remaining_credit(&self) -> i64 {
        let (status, body) = self.api("GET", "/api/entitlements/me", &user_jwt(USER), None).await;
        assert_eq!(status, StatusCode::OK, "{body}");
        body["remaining_credit"].as_i64().unwrap()
    }
}

fn jwt(sub: &str, role: Option<&str>) -> String {
    let claims = IntentClaims {
        sub: sub.to_string(),
        iss: JWT_ISSUER.to_string(),
        aud: JWT_AUDIENCE.to_string(),
        exp: (chrono::Utc::now() + chrono::Duration::minutes(5)).timestamp(),
        role: role.map(str::to_string),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .unwrap()
}

fn user_jwt(sub: &str) -> String {
    jwt(sub, None)
}

fn notification(order_id: &str, param: &str, price: &str) -> HashMap<String, String> {
    HashMap::from([
        ("orderId".to_string(), order_id.to_string()),
        ("param".to_string(), param.to_string()),
        ("type".to_string(), "2".to_string()),
        ("price".to_string(), price.to_string()),
        ("reallyPrice".to_string(), price.to_string()),
    ])
}

// =============================================================================
// Token issuance and verification
// =============================================================================

#[tokio::test]
async fn issued_token_verifies_from_its_origin_and_spends_credit() {
    let app = TestApp::new();
    let token = app.issue_first_token().await;

    let (status, body) = app.verify(&token, HOME).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["success"], true);
    assert_eq!(body["identity"], USER);
    assert_eq!(body["remaining_credit"], 2);

    assert_eq!(app.remaining_credit().await, 2);
}

#[tokio::test]
async fn token_from_another_origin_is_rejected_without_spending() {
    let app = TestApp::new();
    let token = app.issue_first_token().await;

    let (status, body) = app.verify(&token, AWAY).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);

    assert_eq!(app.remaining_credit().await, 3);
}

#[tokio::test]
async fn exhausted_credit_is_403_with_zero_remaining() {
    let app = TestApp::new();
    let token = app.issue_first_token().await;

    for expected in [2, 1, 0] {
        let (status, body) = app.verify(&token, HOME).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["remaining_credit"], expected);
    }

    let (status, body) = app.verify(&token, HOME).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["remaining_credit"], 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_verifications_never_overspend() {
    let app = Arc::new(TestApp::new());
    let token = app.issue_first_token().await;

    let attempts = (0..10).map(|_| {
        let app = Arc::clone(&app);
        let token = token.clone();
        async move { app.verify(&token, HOME).await.0 }
    });
    let statuses = futures::future::join_all(attempts).await;

    let granted = statuses.iter().filter(|s| **s == StatusCode::OK).count();
    let refused = statuses.iter().filter(|s| **s == StatusCode::FORBIDDEN).count();
    assert_eq!(granted, 3);
    assert_eq!(refused, 7);
    assert_eq!(app.remaining_credit().await, 0);
}

#[tokio::test]
async fn garbage_token_is_400() {
    let app = TestApp::new();
    let (status, _) = app.verify("not-hex", HOME).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn second_issuance_for_the_same_identity_conflicts() {
    let app = TestApp::new();
    app.issue_first_token().await;

    let (status, _) = app
        .api("POST", "/api/tokens", &user_jwt(USER), Some(json!({ "origin": AWAY })))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn origin_bound_to_another_identity_conflicts() {
    let app = TestApp::new();
    app.issue_first_token().await;

    let (status, _) = app
        .api("POST", "/api/tokens", &user_jwt("43"), Some(json!({ "origin": HOME })))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn private_origin_is_rejected() {
    let app = TestApp::new();
    let (status, _) = app
        .api("POST", "/api/tokens", &user_jwt(USER), Some(json!({ "origin": "192.168.1.10" })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// =============================================================================
// Credit codes
// =============================================================================

#[tokio::test]
async fn issuer_code_is_redeemed_exactly_once() {
    let app = TestApp::new();
    app.issue_first_token().await;

    let (status, body) = app
        .api("POST", "/api/credit-codes", &jwt("admin", Some("issuer")), Some(json!({ "grant_amount": 10 })))
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let code = body["code"].as_str().unwrap().to_string();

    let (status, body) = app
        .api("POST", "/api/credit-codes/redeem", &user_jwt(USER), Some(json!({ "code": code })))
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["granted"], 10);
    assert_eq!(body["remaining_credit"], 13);

    let (status, _) = app
        .api("POST", "/api/credit-codes/redeem", &user_jwt(USER), Some(json!({ "code": code })))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(app.remaining_credit().await, 13);
}

#[tokio::test]
async fn plain_users_cannot_mint_codes() {
    let app = TestApp::new();
    let (status, _) = app
        .api("POST", "/api/credit-codes", &user_jwt(USER), Some(json!({ "grant_amount": 10 })))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

// =============================================================================
// Payments
// =============================================================================

#[tokio::test]
async fn paid_credit_purchase_is_applied_once() {
    let app = TestApp::new();
    app.issue_first_token().await;

    let (status, placed) = app
        .api("POST", "/api/orders/credit", &user_jwt(USER), Some(json!({ "count": 5 })))
        .await;
    assert_eq!(status, StatusCode::CREATED, "{placed}");
    assert_eq!(placed["price"], "0.50");
    let pay_id = placed["pay_id"].as_str().unwrap().to_string();
    let gateway_order_id = placed["gateway_order_id"].as_str().unwrap().to_string();
    assert!(pay_id.starts_with("RECHARGE_42_"));
    assert_eq!(app.gateway.created_orders().len(), 1);

    let (status, body) = app.notify(notification(&gateway_order_id, USER, "0.50")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::String("success".to_string()));
    assert_eq!(app.remaining_credit().await, 8);

    // Redelivery is acknowledged without a second grant
    let (status, _) = app.notify(notification(&gateway_order_id, USER, "0.50")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(app.remaining_credit().await, 8);

    let (status, order) = app
        .api("GET", &format!("/api/orders/{}", pay_id), &user_jwt(USER), None)
        .await;
    assert_eq!(status, StatusCode::OK, "{order}");
    assert_eq!(order["status"], "paid");
    assert_eq!(order["really_paid"], "0.50");
}

#[tokio::test]
async fn tampered_notification_changes_nothing() {
    let app = TestApp::new();
    app.issue_first_token().await;

    let (_, placed) = app
        .api("POST", "/api/orders/credit", &user_jwt(USER), Some(json!({ "count": 5 })))
        .await;
    let gateway_order_id = placed["gateway_order_id"].as_str().unwrap().to_string();

    let mut params = notification(&gateway_order_id, USER, "0.50");
    params.insert("mchId".to_string(), MERCHANT_ID.to_string());
    params.insert("sign".to_string(), "0".repeat(32));
    let (status, body) = app.notify_raw(params).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, Value::String("fail".to_string()));
    assert_eq!(app.remaining_credit().await, 3);
}

#[tokio::test]
async fn underpaid_notification_is_rejected() {
    let app = TestApp::new();
    app.issue_first_token().await;

    let (_, placed) = app
        .api("POST", "/api/orders/credit", &user_jwt(USER), Some(json!({ "count": 5 })))
        .await;
    let gateway_order_id = placed["gateway_order_id"].as_str().unwrap().to_string();

    let (status, _) = app.notify(notification(&gateway_order_id, USER, "0.01")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(app.remaining_credit().await, 3);
}

#[tokio::test]
async fn paid_rebind_moves_the_token_to_the_new_origin() {
    let app = TestApp::new();
    let old_token = app.issue_first_token().await;

    let (status, placed) = app
        .api("POST", "/api/orders/rebind", &user_jwt(USER), Some(json!({ "new_origin": AWAY })))
        .await;
    assert_eq!(status, StatusCode::CREATED, "{placed}");
    assert_eq!(placed["price"], "1.00");
    let gateway_order_id = placed["gateway_order_id"].as_str().unwrap().to_string();

    let param = format!("{}|{}", USER, AWAY);
    let (status, _) = app.notify(notification(&gateway_order_id, &param, "1.00")).await;
    assert_eq!(status, StatusCode::OK);

    let (_, account) = app.api("GET", "/api/entitlements/me", &user_jwt(USER), None).await;
    assert_eq!(account["bound_origin"], AWAY);
    assert_eq!(account["remaining_credit"], 3);
    let new_token = account["token"].as_str().unwrap().to_string();
    assert_ne!(new_token, old_token);

    let (status, _) = app.verify(&old_token, HOME).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = app.verify(&old_token, AWAY).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = app.verify(&new_token, AWAY).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["remaining_credit"], 2);
}

#[tokio::test]
async fn rebind_to_the_current_origin_is_rejected() {
    let app = TestApp::new();
    app.issue_first_token().await;

    let (status, _) = app
        .api("POST", "/api/orders/rebind", &user_jwt(USER), Some(json!({ "new_origin": HOME })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(app.gateway.created_orders().is_empty());
}

#[tokio::test]
async fn gateway_failure_report_fails_the_pending_order() {
    let app = TestApp::new();
    app.issue_first_token().await;

    let (_, placed) = app
        .api("POST", "/api/orders/credit", &user_jwt(USER), Some(json!({ "count": 1 })))
        .await;
    let pay_id = placed["pay_id"].as_str().unwrap().to_string();

    app.gateway.set_state(GatewayOrderState::Failed);
    let (status, order) = app
        .api("GET", &format!("/api/orders/{}", pay_id), &user_jwt(USER), None)
        .await;
    assert_eq!(status, StatusCode::OK, "{order}");
    assert_eq!(order["status"], "failed");
    assert_eq!(order["gateway_state"], "failed");
}

#[tokio::test]
async fn orders_are_private_to_their_owner() {
    let app = TestApp::new();
    app.issue_first_token().await;

    let (_, placed) = app
        .api("POST", "/api/orders/credit", &user_jwt(USER), Some(json!({ "count": 1 })))
        .await;
    let pay_id = placed["pay_id"].as_str().unwrap().to_string();

    let (status, _) = app
        .api("GET", &format!("/api/orders/{}", pay_id), &user_jwt("43"), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
