//! Error types for kl-core

use thiserror::Error;

/// Core error type for Keel
#[derive(Error, Debug)]
pub enum CoreError {
    /// E001: Configuration file not found
    #[error("[E001] Config file not found: {path}")]
    ConfigNotFound { path: String },

    /// E002: Failed to parse configuration file
    #[error("[E002] Failed to parse config: {message}")]
    ConfigParseError { message: String },

    /// E003: Invalid configuration value
    #[error("[E003] Invalid config: {message}")]
    ConfigInvalid { message: String },

    /// E004: IO error
    #[error("[E004] IO error: {0}")]
    Io(#[from] std::io::Error),

    /// E005: IO error with file path context
    #[error("[E005] Failed to read '{path}': {source}")]
    IoWithPath {
        path: String,
        source: std::io::Error,
    },

    /// E006: YAML parse error
    #[error("[E006] YAML parse error: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    /// E007: Unknown script encoding label
    #[error("[E007] Unsupported script encoding '{label}'. Supported: utf-8, iso-8859-1, us-ascii")]
    UnsupportedEncoding { label: String },

    /// E008: Script bytes are not valid in the requested encoding
    #[error("[E008] Cannot decode '{path}' as {encoding}: {reason}")]
    Decode {
        path: String,
        encoding: String,
        reason: String,
    },

    /// R001: Migration file follows the naming convention but its version or name is invalid
    #[error("[R001] Malformed migration '{path}': {reason}")]
    MalformedMigration { path: String, reason: String },

    /// R002: Two migration files resolve to the same version
    #[error("[R002] Duplicate migration version '{version}' in {first} and {second}")]
    DuplicateVersion {
        version: String,
        first: String,
        second: String,
    },
}

/// Result type alias for CoreError
pub type CoreResult<T> = Result<T, CoreError>;
