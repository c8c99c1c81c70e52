//! Error types for the core model.

use thiserror::Error;

/// Errors raised while validating model values or loading configuration.
#[derive(Debug, Error)]
pub enum ModelError {
    /// An intent uid does not follow `<service-domain>:<name>:<version>`.
    #[error("invalid intent uid '{uid}': {reason}")]
    InvalidIntentUid { uid: String, reason: String },

    /// A configuration value could not be interpreted.
    #[error("invalid configuration value for {field}: {reason}")]
    InvalidConfig { field: String, reason: String },

    /// Failed to read a configuration file.
    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to parse a configuration file.
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_yaml::Error),
}
