//! Application configuration module
//!
//! Type-safe configuration loaded from environment variables using the
//! `config` and `dotenvy` crates. Variables carry the `ASSIGNMENT_CHAT`
//! prefix and nested values are separated by double underscores.
//!
//! # Example
//!
//! ```no_run
//! use assignment_chat::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Server running on {}", config.server.socket_addr().unwrap());
//! ```

mod attachments;
mod auth;
mod chat;
mod database;
mod email;
mod error;
mod redis;
mod server;

pub use attachments::AttachmentsConfig;
pub use auth::AuthConfig;
pub use chat::ChatConfig;
pub use database::DatabaseConfig;
pub use email::EmailConfig;
pub use error::{ConfigError, ValidationError};
pub use redis::RedisConfig;
pub use server::{Environment, ServerConfig};

use serde::Deserialize;

use crate::adapters::http::HttpSettings;

/// Root application configuration
///
/// Load using [`AppConfig::load()`] which reads from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,

    pub database: DatabaseConfig,

    /// Authentication configuration (Zitadel OIDC)
    pub auth: AuthConfig,

    #[serde(default)]
    pub chat: ChatConfig,

    #[serde(default)]
    pub attachments: AttachmentsConfig,

    /// Cross-instance fan-out; local delivery only when absent
    #[serde(default)]
    pub redis: Option<RedisConfig>,

    /// Upload alert e-mail; alerts are logged when absent
    #[serde(default)]
    pub email: Option<EmailConfig>,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `ASSIGNMENT_CHAT` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    ///
    /// # Environment Variable Format
    ///
    /// - `ASSIGNMENT_CHAT__SERVER__PORT=8080` -> `server.port = 8080`
    /// - `ASSIGNMENT_CHAT__ATTACHMENTS__MAX_BYTES=1048576` -> `attachments.max_bytes`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or values
    /// cannot be parsed into the expected types.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("ASSIGNMENT_CHAT")
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
    /// Returns `ValidationError` for the first invalid section.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.database.validate()?;
        self.auth.validate(&self.server.environment)?;
        self.chat.validate()?;
        self.attachments.validate()?;
        if let Some(redis) = &self.redis {
            redis.validate()?;
        }
        if let Some(email) = &self.email {
            email.validate()?;
        }
        Ok(())
    }

    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }

    /// Router settings derived from the server and attachment sections.
    pub fn http_settings(&self) -> HttpSettings {
        HttpSettings {
            body_limit_bytes: self.attachments.body_limit_bytes(),
            request_timeout: self.server.request_timeout(),
            cors_origins: self.server.cors_origins_list(),
        }
    }
}
