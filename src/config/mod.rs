//! Application configuration
//!
//! Values come from environment variables prefixed with `BILLING_BRIDGE`,
//! nested with `__`. A `.env` file is read first when present.
//!
//! ```no_run
//! use billing_bridge::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//! ```

mod auth;
mod database;
mod error;
mod payment;
mod server;

pub use auth::AuthConfig;
pub use database::DatabaseConfig;
pub use error::{ConfigError, ValidationError};
pub use payment::PaymentConfig;
pub use server::{Environment, ServerConfig};

use serde::Deserialize;

/// Root configuration for the billing bridge
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,

    /// Record store connection
    pub database: DatabaseConfig,

    /// Session token validation
    pub auth: AuthConfig,

    /// Stripe credentials and redirect URLs
    pub payment: PaymentConfig,
}

impl AppConfig {
    /// Load configuration from the environment.
    ///
    /// `BILLING_BRIDGE__SERVER__PORT=8080` sets `server.port`,
    /// `BILLING_BRIDGE__PAYMENT__STRIPE_API_KEY=...` sets
    /// `payment.stripe_api_key`, and so on.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("BILLING_BRIDGE")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        let environment = self.server.environment;
        self.server.validate()?;
        self.database.validate()?;
        self.auth.validate(environment)?;
        self.payment.validate(environment)?;
        Ok(())
    }

    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }
}
