//! syncprobe configuration
//!
//! Parses and validates `syncprobe.toml`, which sets the clock, the startup
//! sequence lengths, the observation window and the backend options.

pub mod error;
pub mod manifest;

pub use error::{ManifestError, Result};
pub use manifest::{
    ClockConfig, HarnessManifest, IdleConfig, ModelConfig, ObserveConfig, Polarity,
    SequenceConfig, TimeUnit, WaveformConfig,
};

use std::io;
use std::path::Path;

/// File name looked up when no path is given
pub const DEFAULT_FILE_NAME: &str = "syncprobe.toml";

/// Parse a configuration from a file path
pub fn from_path(path: impl AsRef<Path>) -> Result<HarnessManifest> {
    let contents =
        std::fs::read_to_string(path.as_ref()).map_err(|e| ManifestError::Io(e.to_string()))?;
    from_str(&contents)
}

/// Parse a configuration, falling back to defaults when the file is missing
pub fn load_or_default(path: impl AsRef<Path>) -> Result<HarnessManifest> {
    match std::fs::read_to_string(path.as_ref()) {
        Ok(contents) => from_str(&contents),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(HarnessManifest::default()),
        Err(e) => Err(ManifestError::Io(e.to_string())),
    }
}

/// Parse a configuration from a string
pub fn from_str(s: &str) -> Result<HarnessManifest> {
    toml::from_str(s).map_err(|e| ManifestError::Parse(e.to_string()))
}

/// Render a configuration as TOML
pub fn to_string(manifest: &HarnessManifest) -> Result<String> {
    toml::to_string_pretty(manifest).map_err(|e| ManifestError::Serialize(e.to_string()))
}
