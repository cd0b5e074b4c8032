//! Application configuration module
//!
//! Type-safe configuration loading via the `config` and `dotenvy` crates.
//! Scalar values are read from environment variables with the `COMPANION`
//! prefix (double underscore as nesting separator); the provider list is
//! read from an optional `companion.toml` file, since structured lists do
//! not map cleanly onto environment variables.
//!
//! # Example
//!
//! ```no_run
//! use companion_core::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! let addr = config.server.socket_addr().expect("Invalid bind address");
//! println!("Server running on {addr}");
//! ```

mod ai;
mod dispatch;
mod error;
mod server;

pub use ai::{AiConfig, ProviderEntry, ProviderKind};
pub use dispatch::DispatchConfig;
pub use error::{ConfigError, ValidationError};
pub use server::{Environment, ServerConfig};

use serde::Deserialize;

/// Root application configuration
#[derive(Debug, Deserialize, Default)]
pub struct AppConfig {
    /// Server configuration (host, port, environment)
    #[serde(default)]
    pub server: ServerConfig,

    /// AI provider configuration (descriptors, credentials, timeouts)
    #[serde(default)]
    pub ai: AiConfig,

    /// Dispatcher configuration (thresholds, session capacity)
    #[serde(default)]
    pub dispatch: DispatchConfig,
}

impl AppConfig {
    /// Load configuration from `companion.toml` (if present) and environment
    /// variables with the `COMPANION` prefix
    ///
    /// # Environment Variable Format
    ///
    /// - `COMPANION__SERVER__PORT=8080` -> `server.port = 8080`
    /// - `COMPANION__DISPATCH__ACCEPT_THRESHOLD=0.8` -> `dispatch.accept_threshold = 0.8`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if values cannot be parsed into expected types.
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (development)
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(config::File::with_name("companion").required(false))
            .add_source(
                config::Environment::default()
                    .prefix("COMPANION")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// Fails fast before the server accepts traffic: a malformed provider
    /// entry or dispatch tunable is a startup error, not a runtime one.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.ai.validate()?;
        self.dispatch.validate()?;
        Ok(())
    }

    /// Check if running in production environment
    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }
}
