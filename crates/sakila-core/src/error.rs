use thiserror::Error;

/// Top-level error type for the Sakila chat front-end.
///
/// Subsystem crates define their own error types and convert into this one
/// where they cross crate boundaries, so `?` works in the binary.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SakilaError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<toml::de::Error> for SakilaError {
    fn from(err: toml::de::Error) -> Self {
        SakilaError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for SakilaError {
    fn from(err: toml::ser::Error) -> Self {
        SakilaError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for SakilaError {
    fn from(err: serde_json::Error) -> Self {
        SakilaError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for Sakila operations.
pub type Result<T> = std::result::Result<T, SakilaError>;
