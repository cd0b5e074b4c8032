//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Invalid bind address for host '{0}'")]
    InvalidBindAddr(String),

    #[error("Invalid port number")]
    InvalidPort,

    #[error("Invalid request timeout")]
    InvalidTimeout,

    #[error("No AI provider configured")]
    NoProviderConfigured,

    #[error("Provider '{0}' has no API key configured")]
    MissingApiKey(String),

    #[error("Provider '{0}' has no tier affinity")]
    NoTierAffinity(String),

    #[error("Duplicate provider name: {0}")]
    DuplicateProvider(String),

    #[error("Acceptance threshold must be between 0 and 1")]
    InvalidThreshold,

    #[error("Margin must be non-negative and below the acceptance threshold")]
    InvalidMargin,

    #[error("Recent turn capacity must be at least 2")]
    InvalidTurnCapacity,
}
