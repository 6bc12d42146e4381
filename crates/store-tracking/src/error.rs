//! Tracking Error Types

use thiserror::Error;

pub type Result<T> = std::result::Result<T, TrackingError>;

#[derive(Error, Debug)]
pub enum TrackingError {
    /// Missing or invalid request field
    #[error("Validation error: {0}")]
    Validation(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Error reported by the Conversions API
    #[error("Conversions API error: {0}")]
    Capi(String),

    /// Network error
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl TrackingError {
    /// HTTP status this error maps to.
    pub const fn http_status(&self) -> u16 {
        match self {
            Self::Validation(_) | Self::Capi(_) => 400,
            Self::Config(_) | Self::Network(_) | Self::Serialization(_) => 500,
        }
    }

    /// Short machine-readable code for API responses.
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Config(_) => "CONFIG_ERROR",
            Self::Capi(_) => "CAPI_ERROR",
            Self::Network(_) => "NETWORK_ERROR",
            Self::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }
}
