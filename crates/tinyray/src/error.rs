//! Error types for tinyray
//!
//! Only data problems are errors. API misuse (tracing before `commit`,
//! adding meshes after it) panics.

use thiserror::Error;
use tinyray_accel::AccelError;

#[derive(Error, Debug)]
pub enum TinyrayError {
    #[error("Invalid mesh: {reason}")]
    InvalidMesh { reason: String },

    #[error("Acceleration engine error: {0}")]
    Accel(#[from] AccelError),
}

pub type Result<T> = std::result::Result<T, TinyrayError>;
