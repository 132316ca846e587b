//! Resolution: merging the configuration file with command-line overrides.

use crate::error::ConfigError;
use crate::types::ToolConfig;
use qlf_bitstream::{BitstreamOptions, DeviceFamily, HeaderMode, OscFreq};
use std::path::{Path, PathBuf};

/// Environment variable naming the directory that holds one database
/// directory per family (`ql732b/`, `ql725a/`).
pub const DB_ROOT_ENV: &str = "QLFASM_DB_ROOT";

/// File looked up inside the database directory when no default bitstream is named.
const DEFAULT_BITSTREAM_FILE: &str = "default_bitstream.bin";

/// Settings given on the command line. Unset fields defer to the configuration.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    /// `--dev-type`.
    pub family: Option<DeviceFamily>,
    /// `--db-root`.
    pub db_root: Option<PathBuf>,
    /// `--default-bitstream`.
    pub default_bitstream: Option<PathBuf>,
    /// `--no-default-bitstream`.
    pub no_default_bitstream: bool,
    /// `--header`.
    pub header: Option<HeaderMode>,
    /// `--no-checksum`.
    pub no_checksum: bool,
    /// `--no-verify-checksum`.
    pub no_verify_checksum: bool,
    /// `--spi-master`.
    pub spi_master: bool,
    /// `--osc-freq`.
    pub osc_freq: Option<OscFreq>,
    /// `--cfg-write-checksum-post`.
    pub cfg_write_checksum_post: bool,
    /// `--cfg-read-checksum-post`.
    pub cfg_read_checksum_post: bool,
    /// `--cfg-done-out-mask`.
    pub cfg_done_out_mask: bool,
    /// `--ram-mem`.
    pub ram_mem: Option<PathBuf>,
    /// `--bitmap`.
    pub bitmap: Option<PathBuf>,
}

/// Where the default bitstream overlay comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DefaultBitstream {
    /// No overlay.
    Disabled,
    /// A file the user named; it must exist.
    Explicit(PathBuf),
    /// The conventional file in the database directory; used only if present.
    IfPresent(PathBuf),
}

/// A fully resolved run: every setting has a concrete value.
#[derive(Debug, Clone)]
pub struct ResolvedRun {
    /// Selected device family.
    pub family: DeviceFamily,
    /// Feature database directory.
    pub db_root: PathBuf,
    /// Default bitstream overlay source.
    pub default_bitstream: DefaultBitstream,
    /// Framing options for encoding and decoding.
    pub options: BitstreamOptions,
    /// Framing of the default bitstream, independent of the output framing.
    pub seed_options: BitstreamOptions,
    /// Explicit RAM memory file location, if any.
    pub ram_mem: Option<PathBuf>,
    /// Bitmap CSV location, if requested.
    pub bitmap: Option<PathBuf>,
}

/// Resolves a run from the configuration, command-line overrides and the
/// value of [`DB_ROOT_ENV`].
///
/// Precedence is command line, then configuration file, then environment.
/// The family defaults to EOS S3.
pub fn resolve(
    config: &ToolConfig,
    overrides: &Overrides,
    env_db_root: Option<&Path>,
) -> Result<ResolvedRun, ConfigError> {
    let family = match (overrides.family, &config.device.family) {
        (Some(family), _) => family,
        (None, Some(tag)) => tag
            .parse()
            .map_err(|_| ConfigError::UnknownDevice(tag.clone()))?,
        (None, None) => DeviceFamily::EosS3,
    };

    let db_root = overrides
        .db_root
        .clone()
        .or_else(|| config.device.db_root.as_ref().map(|p| config.base_dir.join(p)))
        .or_else(|| env_db_root.map(|root| root.join(family.db_dir())))
        .ok_or_else(|| {
            ConfigError::ValidationError(format!(
                "no feature database for {family}: pass --db-root or set {DB_ROOT_ENV}"
            ))
        })?;

    let default_bitstream = if overrides.no_default_bitstream || !config.device.use_default_bitstream
    {
        DefaultBitstream::Disabled
    } else if let Some(path) = &overrides.default_bitstream {
        DefaultBitstream::Explicit(path.clone())
    } else if let Some(path) = &config.device.default_bitstream {
        DefaultBitstream::Explicit(config.base_dir.join(path))
    } else {
        DefaultBitstream::IfPresent(db_root.join(DEFAULT_BITSTREAM_FILE))
    };

    let options = resolve_options(config, overrides, family)?;
    let seed_options = resolve_seed_options(config, &options, family)?;

    Ok(ResolvedRun {
        family,
        db_root,
        default_bitstream,
        options,
        seed_options,
        ram_mem: overrides
            .ram_mem
            .clone()
            .or_else(|| config.output.ram_mem.as_ref().map(|p| config.base_dir.join(p))),
        bitmap: overrides
            .bitmap
            .clone()
            .or_else(|| config.output.bitmap.as_ref().map(|p| config.base_dir.join(p))),
    })
}

fn resolve_options(
    config: &ToolConfig,
    overrides: &Overrides,
    family: DeviceFamily,
) -> Result<BitstreamOptions, ConfigError> {
    let file = &config.bitstream;
    let mut options = BitstreamOptions::default();

    options.header = overrides.header.or(file.header).unwrap_or(options.header);
    options.checksum = !overrides.no_checksum && file.checksum.unwrap_or(options.checksum);
    options.verify_checksum =
        !overrides.no_verify_checksum && file.verify_checksum.unwrap_or(options.verify_checksum);
    options.spi_master = overrides.spi_master || file.spi_master.unwrap_or(false);
    options.osc_freq = overrides.osc_freq.or(file.osc_freq).unwrap_or_default();
    options.cfg_write_checksum_post =
        overrides.cfg_write_checksum_post || file.cfg_write_checksum_post.unwrap_or(false);
    options.cfg_read_checksum_post =
        overrides.cfg_read_checksum_post || file.cfg_read_checksum_post.unwrap_or(false);
    options.cfg_done_out_mask =
        overrides.cfg_done_out_mask || file.cfg_done_out_mask.unwrap_or(false);

    if options.header != HeaderMode::None && !family.geometry().framing.header {
        return Err(ConfigError::ValidationError(format!(
            "{family} bitstreams have no header"
        )));
    }
    Ok(options)
}

/// The default bitstream keeps its own header and checksum settings, so a
/// headerless seed still decodes when the output asks for a short header.
fn resolve_seed_options(
    config: &ToolConfig,
    options: &BitstreamOptions,
    family: DeviceFamily,
) -> Result<BitstreamOptions, ConfigError> {
    let file = &config.bitstream;
    let seed = BitstreamOptions {
        header: file.seed_header.unwrap_or_default(),
        checksum: file.seed_checksum.unwrap_or(true),
        verify_checksum: options.verify_checksum,
        ..BitstreamOptions::default()
    };
    if seed.header != HeaderMode::None && !family.geometry().framing.header {
        return Err(ConfigError::ValidationError(format!(
            "{family} default bitstreams have no header"
        )));
    }
    Ok(seed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::load_config_from_str;

    fn with_db_root() -> Overrides {
        Overrides {
            db_root: Some(PathBuf::from("/db")),
            ..Overrides::default()
        }
    }

    #[test]
    fn defaults() {
        let run = resolve(&ToolConfig::default(), &with_db_root(), None).unwrap();
        assert_eq!(run.family, DeviceFamily::EosS3);
        assert_eq!(run.db_root, PathBuf::from("/db"));
        assert_eq!(
            run.default_bitstream,
            DefaultBitstream::IfPresent(PathBuf::from("/db/default_bitstream.bin"))
        );
        assert_eq!(run.options, BitstreamOptions::default());
        assert!(run.ram_mem.is_none());
    }

    #[test]
    fn db_root_from_environment() {
        let overrides = Overrides {
            family: Some(DeviceFamily::Pp3),
            ..Overrides::default()
        };
        let run = resolve(&ToolConfig::default(), &overrides, Some(Path::new("/share"))).unwrap();
        assert_eq!(run.db_root, PathBuf::from("/share/ql725a"));
    }

    #[test]
    fn db_root_precedence() {
        let mut config = load_config_from_str("[device]\ndb_root = \"cfg\"\n").unwrap();
        config.base_dir = PathBuf::from("/proj");
        let env = Some(Path::new("/share"));

        let run = resolve(&config, &Overrides::default(), env).unwrap();
        assert_eq!(run.db_root, PathBuf::from("/proj/cfg"));

        let run = resolve(&config, &with_db_root(), env).unwrap();
        assert_eq!(run.db_root, PathBuf::from("/db"));
    }

    #[test]
    fn missing_db_root_errors() {
        let err = resolve(&ToolConfig::default(), &Overrides::default(), None).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn family_from_config_and_override() {
        let config = load_config_from_str("[device]\nfamily = \"ql-pp3\"\n").unwrap();
        let run = resolve(&config, &with_db_root(), None).unwrap();
        assert_eq!(run.family, DeviceFamily::Pp3);

        let overrides = Overrides {
            family: Some(DeviceFamily::EosS3),
            ..with_db_root()
        };
        let run = resolve(&config, &overrides, None).unwrap();
        assert_eq!(run.family, DeviceFamily::EosS3);
    }

    #[test]
    fn default_bitstream_sources() {
        let config =
            load_config_from_str("[device]\ndefault_bitstream = \"seed.bin\"\n").unwrap();
        let run = resolve(&config, &with_db_root(), None).unwrap();
        assert_eq!(
            run.default_bitstream,
            DefaultBitstream::Explicit(PathBuf::from("seed.bin"))
        );

        let overrides = Overrides {
            default_bitstream: Some(PathBuf::from("/other.bin")),
            ..with_db_root()
        };
        let run = resolve(&config, &overrides, None).unwrap();
        assert_eq!(
            run.default_bitstream,
            DefaultBitstream::Explicit(PathBuf::from("/other.bin"))
        );

        let overrides = Overrides {
            no_default_bitstream: true,
            ..overrides
        };
        let run = resolve(&config, &overrides, None).unwrap();
        assert_eq!(run.default_bitstream, DefaultBitstream::Disabled);
    }

    #[test]
    fn disabled_in_config() {
        let config = load_config_from_str("[device]\nuse_default_bitstream = false\n").unwrap();
        let run = resolve(&config, &with_db_root(), None).unwrap();
        assert_eq!(run.default_bitstream, DefaultBitstream::Disabled);
    }

    #[test]
    fn options_merge() {
        let toml = r#"
[device]
family = "ql-pp3"
[bitstream]
header = "short"
spi_master = true
verify_checksum = false
"#;
        let config = load_config_from_str(toml).unwrap();
        let overrides = Overrides {
            header: Some(HeaderMode::Full),
            no_checksum: true,
            osc_freq: Some(OscFreq::High),
            cfg_done_out_mask: true,
            ..with_db_root()
        };
        let run = resolve(&config, &overrides, None).unwrap();
        assert_eq!(run.options.header, HeaderMode::Full);
        assert!(!run.options.checksum);
        assert!(!run.options.verify_checksum);
        assert!(run.options.spi_master);
        assert_eq!(run.options.osc_freq, OscFreq::High);
        assert!(run.options.cfg_done_out_mask);
        assert!(!run.options.cfg_write_checksum_post);
    }

    #[test]
    fn seed_framing_is_independent_of_output() {
        let overrides = Overrides {
            family: Some(DeviceFamily::Pp3),
            header: Some(HeaderMode::Short),
            no_verify_checksum: true,
            ..with_db_root()
        };
        let run = resolve(&ToolConfig::default(), &overrides, None).unwrap();
        assert_eq!(run.options.header, HeaderMode::Short);
        assert_eq!(run.seed_options.header, HeaderMode::None);
        assert!(run.seed_options.checksum);
        assert!(!run.seed_options.verify_checksum);

        let config = load_config_from_str(
            "[bitstream]\nseed_header = \"short\"\nseed_checksum = false\n",
        )
        .unwrap();
        let run = resolve(&config, &overrides, None).unwrap();
        assert_eq!(run.seed_options.header, HeaderMode::Short);
        assert!(!run.seed_options.checksum);
    }

    #[test]
    fn seed_header_on_eos_s3_rejected() {
        let config = load_config_from_str("[bitstream]\nseed_header = \"short\"\n").unwrap();
        let err = resolve(&config, &with_db_root(), None).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn header_on_eos_s3_rejected() {
        let overrides = Overrides {
            header: Some(HeaderMode::Short),
            ..with_db_root()
        };
        let err = resolve(&ToolConfig::default(), &overrides, None).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn output_paths() {
        let mut config =
            load_config_from_str("[output]\nram_mem = \"ram.mem\"\nbitmap = \"map.csv\"\n")
                .unwrap();
        config.base_dir = PathBuf::from("/proj");
        let overrides = Overrides {
            bitmap: Some(PathBuf::from("/tmp/b.csv")),
            ..with_db_root()
        };
        let run = resolve(&config, &overrides, None).unwrap();
        assert_eq!(run.ram_mem, Some(PathBuf::from("/proj/ram.mem")));
        assert_eq!(run.bitmap, Some(PathBuf::from("/tmp/b.csv")));
    }
}
