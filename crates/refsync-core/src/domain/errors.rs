//! Domain error types
//!
//! Validation failures for domain identifiers and the configuration
//! errors raised when the engine is constructed.

use thiserror::Error;

/// Errors that can occur in domain operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Invalid catalog item identifier
    #[error("Invalid item ID: {0}")]
    InvalidItemId(String),

    /// Invalid remote record identifier
    #[error("Invalid remote ID: {0}")]
    InvalidRemoteId(String),

    /// Generic validation failure
    #[error("Validation failed: {0}")]
    ValidationFailed(String),
}

/// Errors raised while turning configuration into engine settings
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A required setting is absent or blank
    #[error("Configuration missing: {0}")]
    ConfigurationMissing(&'static str),

    /// A setting is present but unusable
    #[error("Invalid configuration for {field}: {message}")]
    Invalid {
        /// Dotted path of the offending field
        field: String,
        /// Human-readable explanation
        message: String,
    },
}
