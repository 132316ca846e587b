//! qlfasm: converts FASM to QuickLogic configuration bitstreams and back.
//!
//! `qlfasm top.fasm top.bit` assembles, `qlfasm -d top.bit top.fasm`
//! disassembles. The device family, feature database and bitstream framing
//! come from the command line, an optional `qlfasm.toml`, and the
//! `QLFASM_DB_ROOT` environment variable, in that order.

#![warn(missing_docs)]

mod assemble;
mod disassemble;
mod pipeline;

use std::io::IsTerminal;
use std::path::PathBuf;
use std::process;

use clap::{Parser, ValueEnum};
use qlf_bitstream::{DeviceFamily, HeaderMode, OscFreq};

/// Converts FASM to a bitstream, or a bitstream back to FASM.
#[derive(Parser, Debug)]
#[command(
    name = "qlfasm",
    version,
    about = "FASM assembler and disassembler for QuickLogic EOS S3 and PolarPro 3"
)]
pub struct Cli {
    /// The input file (FASM, or bitstream when disassembling).
    pub infile: PathBuf,

    /// The output file (bitstream, or FASM when disassembling).
    pub outfile: PathBuf,

    /// Disassemble a bitstream into FASM.
    #[arg(short, long)]
    pub disassemble: bool,

    /// Target device family.
    #[arg(long, value_enum)]
    pub dev_type: Option<DevType>,

    /// Directory holding the feature database (`*.db`).
    #[arg(long)]
    pub db_root: Option<PathBuf>,

    /// Bitstream to seed the configuration with before applying the FASM.
    #[arg(long, conflicts_with = "no_default_bitstream")]
    pub default_bitstream: Option<PathBuf>,

    /// Start from an empty configuration.
    #[arg(long)]
    pub no_default_bitstream: bool,

    /// Bitstream header (PolarPro 3 only).
    #[arg(long, value_enum)]
    pub header: Option<HeaderArg>,

    /// Do not append (or expect) a checksum.
    #[arg(long)]
    pub no_checksum: bool,

    /// Warn instead of failing on a checksum mismatch.
    #[arg(long)]
    pub no_verify_checksum: bool,

    /// Header command: boot as SPI master.
    #[arg(long)]
    pub spi_master: bool,

    /// Header command: configuration oscillator frequency.
    #[arg(long, value_enum)]
    pub osc_freq: Option<OscFreqArg>,

    /// Header command: verify the checksum after writing.
    #[arg(long)]
    pub cfg_write_checksum_post: bool,

    /// Header command: verify the checksum after reading back.
    #[arg(long)]
    pub cfg_read_checksum_post: bool,

    /// Header command: mask the configuration-done output.
    #[arg(long)]
    pub cfg_done_out_mask: bool,

    /// Also write a CSV map of defined and set cells.
    #[arg(long)]
    pub bitmap: Option<PathBuf>,

    /// Where to write RAM initialization words (default: `ram.mem` next to the output).
    #[arg(long)]
    pub ram_mem: Option<PathBuf>,

    /// Path to a `qlfasm.toml` configuration file.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Print progress and statistics.
    #[arg(short, long)]
    pub verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long)]
    pub quiet: bool,

    /// Control colored output.
    #[arg(long, value_enum, default_value_t = ColorChoice::Auto)]
    pub color: ColorChoice,

    /// Diagnostic output format.
    #[arg(long, value_enum, default_value_t = ReportFormat::Text)]
    pub report_format: ReportFormat,
}

/// Device family as spelled on the command line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum DevType {
    /// QuickLogic EOS S3.
    #[value(name = "ql-eos-s3")]
    EosS3,
    /// QuickLogic PolarPro 3.
    #[value(name = "ql-pp3")]
    Pp3,
}

impl From<DevType> for DeviceFamily {
    fn from(dev: DevType) -> Self {
        match dev {
            DevType::EosS3 => DeviceFamily::EosS3,
            DevType::Pp3 => DeviceFamily::Pp3,
        }
    }
}

/// Bitstream header form.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum HeaderArg {
    /// No header.
    None,
    /// One command byte.
    Short,
    /// Six bytes: preamble, command, RAM block enables, reserved.
    Full,
}

impl From<HeaderArg> for HeaderMode {
    fn from(arg: HeaderArg) -> Self {
        match arg {
            HeaderArg::None => HeaderMode::None,
            HeaderArg::Short => HeaderMode::Short,
            HeaderArg::Full => HeaderMode::Full,
        }
    }
}

/// Oscillator frequency selection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OscFreqArg {
    /// Low frequency.
    Low,
    /// High frequency.
    High,
}

impl From<OscFreqArg> for OscFreq {
    fn from(arg: OscFreqArg) -> Self {
        match arg {
            OscFreqArg::Low => OscFreq::Low,
            OscFreqArg::High => OscFreq::High,
        }
    }
}

/// Controls whether colored output is produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ColorChoice {
    /// Detect from terminal capabilities.
    Auto,
    /// Always produce colored output.
    Always,
    /// Never produce colored output.
    Never,
}

/// Diagnostic output format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    /// Human-readable terminal output.
    Text,
    /// Machine-readable JSON output.
    Json,
}

/// Output settings derived from CLI flags.
pub struct GlobalArgs {
    /// Whether to suppress non-error output.
    pub quiet: bool,
    /// Whether to print progress and statistics.
    pub verbose: bool,
    /// Whether to use colored output.
    pub color: bool,
    /// How to report diagnostics.
    pub format: ReportFormat,
}

impl GlobalArgs {
    /// Derives output settings from parsed arguments.
    pub fn from_cli(cli: &Cli) -> Self {
        let color = match cli.color {
            ColorChoice::Auto => std::io::stderr().is_terminal(),
            ColorChoice::Always => true,
            ColorChoice::Never => false,
        };
        Self {
            quiet: cli.quiet,
            verbose: cli.verbose && !cli.quiet,
            color,
            format: cli.report_format,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    let global = GlobalArgs::from_cli(&cli);

    let result = if cli.disassemble {
        disassemble::run(&cli, &global)
    } else {
        assemble::run(&cli, &global)
    };

    match result {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    }
}
