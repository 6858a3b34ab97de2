//! Error types for the acceleration engines

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AccelError {
    #[error("Device error: {0}")]
    Device(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Configuration parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, AccelError>;
