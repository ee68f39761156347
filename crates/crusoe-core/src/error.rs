use thiserror::Error;

/// Top-level error type shared by the CRUSOE crates.
#[derive(Error, Debug)]
pub enum CrusoeError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid host record: {0}")]
    InvalidHost(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<config::ConfigError> for CrusoeError {
    fn from(e: config::ConfigError) -> Self {
        CrusoeError::Config(e.to_string())
    }
}
