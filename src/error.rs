//! Error handling and custom error types
//!
//! Provides unified error handling across the crate using thiserror.

use crate::envelope::DecodeError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Image processing error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Invalid invocation payload: {0}")]
    Decode(#[from] DecodeError),

    #[error("Text recognition error: {0}")]
    Recognition(String),

    #[error("Processing engine finished without reporting an outcome")]
    EngineAbandoned,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Environment variable error: {0}")]
    EnvVar(#[from] dotenvy::Error),

    #[error("Invariant violated: {0}")]
    Invariant(String),
}

pub type Result<T> = std::result::Result<T, Error>;
