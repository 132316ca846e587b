//! Configuration file loading and validation.

use crate::error::ConfigError;
use crate::types::ToolConfig;
use qlf_bitstream::{DeviceFamily, HeaderMode};
use std::path::Path;

/// File name looked up in a directory by [`load_config`].
pub const CONFIG_FILE_NAME: &str = "qlfasm.toml";

/// Loads and validates `<dir>/qlfasm.toml`.
pub fn load_config(dir: &Path) -> Result<ToolConfig, ConfigError> {
    load_config_file(&dir.join(CONFIG_FILE_NAME))
}

/// Loads and validates a configuration file.
///
/// Relative paths in the file are resolved against the file's directory.
pub fn load_config_file(path: &Path) -> Result<ToolConfig, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut config = load_config_from_str(&content)?;
    config.base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
    Ok(config)
}

/// Parses and validates a `qlfasm.toml` configuration from a string.
///
/// Useful for testing without filesystem dependencies.
pub fn load_config_from_str(content: &str) -> Result<ToolConfig, ConfigError> {
    let config: ToolConfig =
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
    validate_config(&config)?;
    Ok(config)
}

/// Validates that configuration values are consistent.
fn validate_config(config: &ToolConfig) -> Result<(), ConfigError> {
    let family = match &config.device.family {
        Some(tag) => Some(
            tag.parse::<DeviceFamily>()
                .map_err(|_| ConfigError::UnknownDevice(tag.clone()))?,
        ),
        None => None,
    };

    if config
        .device
        .db_root
        .as_ref()
        .is_some_and(|p| p.as_os_str().is_empty())
    {
        return Err(ConfigError::ValidationError("device.db_root is empty".to_string()));
    }

    if !config.device.use_default_bitstream && config.device.default_bitstream.is_some() {
        return Err(ConfigError::ValidationError(
            "device.default_bitstream is set but device.use_default_bitstream is false"
                .to_string(),
        ));
    }

    if let Some(family) = family {
        let framing = family.geometry().framing;
        let header = config.bitstream.header.unwrap_or_default();
        if header != HeaderMode::None && !framing.header {
            return Err(ConfigError::ValidationError(format!(
                "bitstream.header is not supported by {family}"
            )));
        }
        let seed_header = config.bitstream.seed_header.unwrap_or_default();
        if seed_header != HeaderMode::None && !framing.header {
            return Err(ConfigError::ValidationError(format!(
                "bitstream.seed_header is not supported by {family}"
            )));
        }
        if config.bitstream.checksum == Some(true) && !framing.checksum {
            return Err(ConfigError::ValidationError(format!(
                "bitstream.checksum is not supported by {family}"
            )));
        }
    }
    Ok(())
}
