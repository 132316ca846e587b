//! Shared pipeline helpers for assembly and disassembly.
//!
//! Configuration resolution, database loading, staged output writes and
//! diagnostic reporting.

use std::io::Write;
use std::path::{Path, PathBuf};

use qlf_config::{load_config_file, resolve, Overrides, ResolvedRun, CONFIG_FILE_NAME, DB_ROOT_ENV};
use qlf_db::FeatureTables;
use qlf_diagnostics::{DiagnosticRenderer, DiagnosticSink, Severity, TerminalRenderer};
use qlf_source::SourceDb;
use tempfile::NamedTempFile;

use crate::{Cli, GlobalArgs, ReportFormat};

/// File name of the RAM memory file written next to the output bitstream.
const RAM_MEM_FILE: &str = "ram.mem";

/// Collects the command-line settings that override `qlfasm.toml`.
pub fn overrides(cli: &Cli) -> Overrides {
    Overrides {
        family: cli.dev_type.map(Into::into),
        db_root: cli.db_root.clone(),
        default_bitstream: cli.default_bitstream.clone(),
        no_default_bitstream: cli.no_default_bitstream,
        header: cli.header.map(Into::into),
        no_checksum: cli.no_checksum,
        no_verify_checksum: cli.no_verify_checksum,
        spi_master: cli.spi_master,
        osc_freq: cli.osc_freq.map(Into::into),
        cfg_write_checksum_post: cli.cfg_write_checksum_post,
        cfg_read_checksum_post: cli.cfg_read_checksum_post,
        cfg_done_out_mask: cli.cfg_done_out_mask,
        ram_mem: cli.ram_mem.clone(),
        bitmap: cli.bitmap.clone(),
    }
}

/// Resolves the run settings.
///
/// Uses `--config` when given, otherwise `qlfasm.toml` in the current
/// directory if one exists, otherwise built-in defaults.
pub fn resolve_run(cli: &Cli, global: &GlobalArgs) -> Result<ResolvedRun, Box<dyn std::error::Error>> {
    let config = match &cli.config {
        Some(path) => load_config_file(path)?,
        None if Path::new(CONFIG_FILE_NAME).is_file() => {
            load_config_file(Path::new(CONFIG_FILE_NAME))?
        }
        None => Default::default(),
    };
    let env_db_root = std::env::var_os(DB_ROOT_ENV).map(PathBuf::from);
    let run = resolve(&config, &overrides(cli), env_db_root.as_deref())?;

    if global.verbose {
        eprintln!("   Device {} ({})", run.family, run.family.geometry().name);
    }
    Ok(run)
}

/// Loads the feature database of a run.
pub fn load_database(
    run: &ResolvedRun,
    global: &GlobalArgs,
) -> Result<FeatureTables, Box<dyn std::error::Error>> {
    let db = FeatureTables::load(&run.db_root)?;
    if global.verbose {
        eprintln!(
            "   Loaded {} features from {}",
            db.len(),
            run.db_root.display()
        );
    }
    Ok(db)
}

/// Reads an input file, naming it in the error.
pub fn read_input(path: &Path) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
    std::fs::read(path).map_err(|e| format!("failed to read '{}': {e}", path.display()).into())
}

/// Fails unless the directory an output goes to exists.
pub fn check_output_dir(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let dir = parent_dir(path);
    if dir.is_dir() {
        Ok(())
    } else {
        Err(format!("output directory '{}' does not exist", dir.display()).into())
    }
}

/// Default location of the RAM memory file: next to the output.
pub fn default_ram_mem_path(output: &Path) -> PathBuf {
    parent_dir(output).join(RAM_MEM_FILE)
}

/// Writes `contents` to `path` through a temporary file in the same
/// directory, so an existing file is replaced in one step and a failed run
/// leaves nothing half-written.
pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), Box<dyn std::error::Error>> {
    let fail = |e: std::io::Error| format!("failed to write '{}': {e}", path.display());
    let mut tmp = NamedTempFile::new_in(parent_dir(path)).map_err(fail)?;
    tmp.write_all(contents).map_err(fail)?;
    tmp.persist(path).map_err(|e| fail(e.error))?;
    Ok(())
}

fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    }
}

/// Renders every collected diagnostic and returns the process exit code.
///
/// Text goes to stderr (errors only with `--quiet`); JSON goes to stdout.
pub fn report(sink: &DiagnosticSink, sources: &SourceDb, global: &GlobalArgs) -> i32 {
    let diagnostics = sink.diagnostics();

    match global.format {
        ReportFormat::Text => {
            let renderer = TerminalRenderer::new(global.color);
            for diag in diagnostics
                .iter()
                .filter(|d| !global.quiet || d.severity.is_error())
            {
                eprint!("{}", renderer.render(diag, sources));
            }
        }
        ReportFormat::Json => {
            let json =
                serde_json::to_string_pretty(&diagnostics).unwrap_or_else(|_| "[]".to_string());
            println!("{json}");
        }
    }

    let error_count = sink.error_count();
    if !global.quiet && global.format == ReportFormat::Text && !diagnostics.is_empty() {
        let warning_count = diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Warning)
            .count();
        eprintln!("   Result: {error_count} error(s), {warning_count} warning(s)");
    }

    if error_count > 0 {
        1
    } else {
        0
    }
}
