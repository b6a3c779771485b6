//! Error types for the estimator.

use thiserror::Error;

/// Estimator error type.
#[derive(Error, Debug)]
pub enum SlamError {
    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, SlamError>;
