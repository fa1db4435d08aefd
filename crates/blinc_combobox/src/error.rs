//! Error types for blinc_combobox
//!
//! Only configuration loading can fail. Widget operations absorb anomalies
//! as state transitions instead.

use std::io;
use thiserror::Error;

/// Errors that can occur when loading or saving combobox configuration
#[derive(Error, Debug)]
pub enum ComboboxError {
    /// IO error when reading the file
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Configuration could not be parsed
    #[error("Config parsing error: {0}")]
    Parse(#[from] toml::de::Error),

    /// Configuration could not be serialized
    #[error("Config serialization error: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Result type for blinc_combobox operations
pub type Result<T> = std::result::Result<T, ComboboxError>;
