//! Error types for configuration parsing and validation

use thiserror::Error;

/// Result type for manifest operations
pub type Result<T> = std::result::Result<T, ManifestError>;

/// Errors that can occur while loading a harness configuration
#[derive(Debug, Error)]
pub enum ManifestError {
    /// I/O error reading or writing the file
    #[error("I/O error: {0}")]
    Io(String),

    /// TOML parsing error
    #[error("Failed to parse configuration: {0}")]
    Parse(String),

    /// TOML serialization error
    #[error("Failed to serialize configuration: {0}")]
    Serialize(String),

    /// A value is outside its allowed range
    #[error("Invalid value for '{0}': {1}")]
    InvalidValue(String, String),
}
