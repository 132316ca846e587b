//! Error types for configuration loading and validation.

/// Errors that can occur when loading, validating or resolving a `qlfasm.toml`.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// An I/O error occurred while reading the configuration file.
    #[error("failed to read configuration: {0}")]
    IoError(#[from] std::io::Error),

    /// The TOML content could not be parsed.
    #[error("failed to parse configuration: {0}")]
    ParseError(String),

    /// A configuration value failed validation.
    #[error("validation error: {0}")]
    ValidationError(String),

    /// The device family names no supported device.
    #[error("unknown device type '{0}' (expected one of: ql-eos-s3, ql-pp3)")]
    UnknownDevice(String),
}
