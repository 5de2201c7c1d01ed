//! Animation error types

use thiserror::Error;

/// Errors raised while building actions or loading configuration
#[derive(Error, Debug)]
pub enum CadenceError {
    /// A bounded action reported a duration that is not a finite, positive number
    #[error("Invalid action duration: {0} (must be finite and greater than zero)")]
    InvalidDuration(f64),

    /// A clock was configured to tick zero times per second
    #[error("Invalid target fps: {0}")]
    InvalidTargetFps(u32),

    /// Configuration could not be parsed
    #[error("Failed to parse configuration: {0}")]
    Config(#[from] toml::de::Error),
}

/// Result type for animation operations
pub type Result<T> = std::result::Result<T, CadenceError>;
