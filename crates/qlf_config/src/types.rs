//! Configuration types deserialized from `qlfasm.toml`.

use qlf_bitstream::{HeaderMode, OscFreq};
use serde::Deserialize;
use std::path::PathBuf;

/// The top-level tool configuration parsed from `qlfasm.toml`.
///
/// Every section is optional.
#[derive(Debug, Default, Deserialize)]
pub struct ToolConfig {
    /// Device family and database location.
    #[serde(default)]
    pub device: DeviceConfig,
    /// Bitstream framing options.
    #[serde(default)]
    pub bitstream: BitstreamConfig,
    /// Side-output locations.
    #[serde(default)]
    pub output: OutputConfig,
    /// Directory relative paths in this configuration are resolved against.
    ///
    /// Set by [`load_config_file`](crate::load_config_file); empty for
    /// configurations parsed from a string.
    #[serde(skip)]
    pub base_dir: PathBuf,
}

/// The `[device]` section.
#[derive(Debug, Deserialize)]
pub struct DeviceConfig {
    /// Device-type tag, `ql-eos-s3` or `ql-pp3`.
    #[serde(default)]
    pub family: Option<String>,
    /// Directory holding the `*.db` feature tables.
    #[serde(default)]
    pub db_root: Option<PathBuf>,
    /// Bitstream used to seed every assembly.
    #[serde(default)]
    pub default_bitstream: Option<PathBuf>,
    /// Whether to seed assemblies from a default bitstream at all.
    #[serde(default = "default_true")]
    pub use_default_bitstream: bool,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            family: None,
            db_root: None,
            default_bitstream: None,
            use_default_bitstream: true,
        }
    }
}

/// The `[bitstream]` section. Unset fields keep the built-in defaults.
#[derive(Debug, Default, Deserialize)]
pub struct BitstreamConfig {
    /// Header written before the configuration data.
    #[serde(default)]
    pub header: Option<HeaderMode>,
    /// Append a Fletcher-32 checksum.
    #[serde(default)]
    pub checksum: Option<bool>,
    /// Fail on checksum mismatch when decoding.
    #[serde(default)]
    pub verify_checksum: Option<bool>,
    /// Command byte: device boots as SPI master.
    #[serde(default)]
    pub spi_master: Option<bool>,
    /// Command byte: oscillator frequency.
    #[serde(default)]
    pub osc_freq: Option<OscFreq>,
    /// Command byte: verify the checksum after writing the configuration.
    #[serde(default)]
    pub cfg_write_checksum_post: Option<bool>,
    /// Command byte: verify the checksum after reading the configuration back.
    #[serde(default)]
    pub cfg_read_checksum_post: Option<bool>,
    /// Command byte: mask the configuration-done output.
    #[serde(default)]
    pub cfg_done_out_mask: Option<bool>,
    /// Short header carried by the default bitstream. A full header is
    /// recognized by its preamble without this setting.
    #[serde(default)]
    pub seed_header: Option<HeaderMode>,
    /// Whether a headerless default bitstream ends in a checksum.
    #[serde(default)]
    pub seed_checksum: Option<bool>,
}

/// The `[output]` section.
#[derive(Debug, Default, Deserialize)]
pub struct OutputConfig {
    /// Where to write the RAM memory file.
    #[serde(default)]
    pub ram_mem: Option<PathBuf>,
    /// Where to write the bitmap CSV.
    #[serde(default)]
    pub bitmap: Option<PathBuf>,
}

fn default_true() -> bool {
    true
}
