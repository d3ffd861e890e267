//! Application configuration module
//!
//! This module provides type-safe configuration loading from environment variables
//! using the `config` and `dotenvy` crates. Configuration is loaded with the
//! `TOKEN_LEDGER` prefix and nested values use double underscores as separators.
//!
//! # Example
//!
//! ```no_run
//! use token_ledger::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Server running on {}", config.server.socket_addr());
//! ```

mod auth;
mod chat;
mod database;
mod error;
mod limits;
mod payment;
mod server;
mod token;

pub use auth::AuthConfig;
pub use chat::ChatConfig;
pub use database::{DatabaseConfig, MEMORY_URL};
pub use error::{ConfigError, ValidationError};
pub use limits::LimitsConfig;
pub use payment::PaymentConfig;
pub use server::{Environment, ServerConfig};
pub use token::TokenConfig;

use serde::Deserialize;

/// Root application configuration
///
/// Load using [`AppConfig::load()`] which reads from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration (host, port, environment)
    #[serde(default)]
    pub server: ServerConfig,

    /// Store configuration (PostgreSQL connection or `memory://`)
    pub database: DatabaseConfig,

    /// Key-derivation salt
    pub token: TokenConfig,

    /// Credit defaults and bounds
    #[serde(default)]
    pub limits: LimitsConfig,

    /// Payment gateway
    pub payment: PaymentConfig,

    /// Intent JWT validation
    pub auth: AuthConfig,

    /// Payment notices to users
    #[serde(default)]
    pub chat: ChatConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `TOKEN_LEDGER` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    /// 4. Deserializes into typed configuration structs
    ///
    /// # Environment Variable Format
    ///
    /// - `TOKEN_LEDGER__SERVER__PORT=8080` -> `server.port = 8080`
    /// - `TOKEN_LEDGER__PAYMENT__SECRET=...` -> `payment.secret = ...`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Required environment variables are missing
    /// - Values cannot be parsed into expected types
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (development)
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("TOKEN_LEDGER")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` for the first section that is invalid.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.database.validate()?;
        self.token.validate()?;
        self.limits.validate()?;
        self.payment.validate(&self.server.environment)?;
        self.auth.validate()?;
        self.chat.validate()?;
        Ok(())
    }

    /// Check if running in production environment
    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }
}
