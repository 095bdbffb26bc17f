//! Error types for the kiosk gateway

use thiserror::Error;

/// Result type alias for kiosk gateway operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the kiosk gateway
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// MQTT transport error
    #[error("mqtt error: {0}")]
    Mqtt(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP error
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),
}
