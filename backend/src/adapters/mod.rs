//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `auth` - Bearer-token authentication of chat front-end callers
//! - `chat` - Payment notices to the chat platform (Telegram, or logs)
//! - `epay` - The payment gateway's HTTP API
//! - `http` - axum routes, middleware and application state
//! - `memory` - In-process store for tests and development
//! - `postgres` - PostgreSQL store

pub mod auth;
pub mod chat;
pub mod epay;
pub mod http;
pub mod memory;
pub mod postgres;

pub use auth::{IntentClaims, JwtConfig, JwtIntentAuthenticator, MockIntentAuthenticator};
pub use chat::{LoggingNotifier, TelegramConfig, TelegramNotifier};
pub use epay::{EpayConfig, EpayGateway, MockPaymentGateway};
pub use memory::InMemoryLedger;
pub use postgres::{
    PostgresCreditCodeRepository, PostgresEntitlementRepository, PostgresPaymentOrderRepository,
    StoreTimeout,
};
