//! token-ledger server binary.
//!
//! Loads configuration, wires the store, gateway, notifier and authenticator
//! adapters into the handlers, and serves the HTTP API until Ctrl-C or SIGTERM.

use std::net::SocketAddr;
use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

use token_ledger::adapters::http::{app_router, AppState, LedgerPorts, LedgerSettings};
use token_ledger::adapters::{
    EpayConfig, EpayGateway, InMemoryLedger, JwtConfig, JwtIntentAuthenticator, LoggingNotifier,
    PostgresCreditCodeRepository, PostgresEntitlementRepository, PostgresPaymentOrderRepository,
    StoreTimeout, TelegramConfig, TelegramNotifier,
};
use token_ledger::application::handlers::PaymentPricing;
use token_ledger::config::{AppConfig, ConfigError};
use token_ledger::domain::credit_code::CodeGenerator;
use token_ledger::domain::payment::{GatewaySigner, Price};
use token_ledger::domain::token::{KeyDeriver, TokenCodec};
use token_ledger::ports::{
    ChatNotifier, CreditCodeRepository, EntitlementRepository, PaymentOrderRepository,
};

#[derive(Debug, Error)]
enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Database: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migrations: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("Invalid price: {0}")]
    Pricing(String),

    #[error("Adapter setup failed: {0}")]
    Adapter(String),

    #[error("Server: {0}")]
    Io(#[from] std::io::Error),
}

type Stores = (
    Arc<dyn EntitlementRepository>,
    Arc<dyn CreditCodeRepository>,
    Arc<dyn PaymentOrderRepository>,
);

#[tokio::main]
async fn main() -> Result<(), StartupError> {
    // 1. Configuration
    let config = AppConfig::load()?;
    config.validate().map_err(ConfigError::from)?;

    // 2. Logging
    init_tracing(&config);
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        environment = ?config.server.environment,
        "Starting token-ledger"
    );

    // 3. Store
    let (entitlements, credit_codes, orders) = build_stores(&config).await?;

    // 4. Outbound adapters
    let signer = GatewaySigner::new(config.payment.secret.clone());
    let gateway = EpayGateway::new(
        EpayConfig::new(
            config.payment.base_url.clone(),
            config.payment.merchant_id.clone(),
            config.payment.notify_url.clone(),
            config.payment.return_url.clone(),
        )
        .with_timeout(config.payment.request_timeout()),
        signer.clone(),
    )
    .map_err(|e| StartupError::Adapter(e.message))?;

    let notifier: Arc<dyn ChatNotifier> = match &config.chat.bot_token {
        Some(token) => Arc::new(
            TelegramNotifier::new(
                TelegramConfig::new(token.clone()).with_base_url(config.chat.api_base_url.clone()),
            )
            .map_err(|e| StartupError::Adapter(e.to_string()))?,
        ),
        None => {
            tracing::warn!("No chat bot token configured; payment notices will only be logged");
            Arc::new(LoggingNotifier)
        }
    };

    let authenticator = JwtIntentAuthenticator::new(JwtConfig::new(
        config.auth.jwt_secret.clone(),
        config.auth.issuer.clone(),
        config.auth.audience.clone(),
    ));

    // 5. Handlers
    let pricing = PaymentPricing {
        price_per_use: Price::from_cents(config.payment.price_per_use_cents)
            .map_err(|e| StartupError::Pricing(e.to_string()))?,
        rebind_price: Price::from_cents(config.payment.rebind_price_cents)
            .map_err(|e| StartupError::Pricing(e.to_string()))?,
        pay_type: config.payment.pay_type,
    };

    let ports = LedgerPorts {
        entitlements,
        credit_codes,
        orders,
        gateway: Arc::new(gateway),
        notifier,
        authenticator: Arc::new(authenticator),
    };
    let settings = LedgerSettings {
        codec: TokenCodec::new(KeyDeriver::new(config.token.secret.clone())),
        code_generator: CodeGenerator::new(config.token.secret.clone()),
        signer,
        merchant_id: config.payment.merchant_id.clone(),
        default_credit: config.limits.default_credit,
        max_code_grant: config.limits.max_code_grant,
        pricing,
    };
    let state = AppState::new(ports, settings);

    // 6. Serve
    let app = app_router(state, config.server.request_timeout());
    let addr = config.server.socket_addr();
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "Listening");

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.server.log_level));

    if config.is_production() {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

async fn build_stores(config: &AppConfig) -> Result<Stores, StartupError> {
    if config.database.is_memory() {
        tracing::warn!("Using the in-memory store; all data is lost on exit");
        let ledger = Arc::new(InMemoryLedger::new());
        let entitlements: Arc<dyn EntitlementRepository> = ledger.clone();
        let credit_codes: Arc<dyn CreditCodeRepository> = ledger.clone();
        let orders: Arc<dyn PaymentOrderRepository> = ledger;
        return Ok((entitlements, credit_codes, orders));
    }

    let pool = PgPoolOptions::new()
        .min_connections(config.database.min_connections)
        .max_connections(config.database.max_connections)
        .acquire_timeout(config.database.acquire_timeout())
        .idle_timeout(config.database.idle_timeout())
        .max_lifetime(config.database.max_lifetime())
        .connect(&config.database.url)
        .await?;

    if config.database.run_migrations {
        tracing::info!("Running database migrations");
        sqlx::migrate!().run(&pool).await?;
    }

    let timeout = StoreTimeout::from_millis(config.database.statement_timeout_ms);
    let entitlements: Arc<dyn EntitlementRepository> =
        Arc::new(PostgresEntitlementRepository::new(pool.clone(), timeout));
    let credit_codes: Arc<dyn CreditCodeRepository> =
        Arc::new(PostgresCreditCodeRepository::new(pool.clone(), timeout));
    let orders: Arc<dyn PaymentOrderRepository> =
        Arc::new(PostgresPaymentOrderRepository::new(pool, timeout));
    Ok((entitlements, credit_codes, orders))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
