//! Configuration Errors

use thiserror::Error;

/// Errors raised while loading environment configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Required variable absent or empty
    #[error("{0} not set")]
    Missing(&'static str),

    /// Value present but unusable
    #[error("invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}
