//! `qlfasm IN.fasm OUT.bit`: FASM to bitstream.
//!
//! 1. Resolve the device, database and framing options
//! 2. Parse the FASM file, reporting every malformed line
//! 3. Seed the configuration from the default bitstream, if any
//! 4. Enable every feature and restore every `unknown_bit`
//! 5. Produce the bitstream and write it together with the side files

use qlf_bitstream::{
    bitmap_csv, codes, decode_bitstream, Assembler, ConfigBitStore, DeviceGeometry,
};
use qlf_config::{DefaultBitstream, ResolvedRun};
use qlf_diagnostics::{Diagnostic, DiagnosticSink};
use qlf_fasm::parse_fasm;
use qlf_source::{SourceDb, Span};

use crate::pipeline::{
    check_output_dir, default_ram_mem_path, load_database, read_input, report, resolve_run,
    write_atomic,
};
use crate::{Cli, GlobalArgs};

/// Runs an assembly. Returns exit code 0 on success, 1 if any error was reported.
pub fn run(cli: &Cli, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let run = resolve_run(cli, global)?;
    check_output_dir(&cli.outfile)?;
    let db = load_database(&run, global)?;
    let geometry = run.family.geometry();

    let mut sources = SourceDb::new();
    let file = sources
        .load_file(&cli.infile)
        .map_err(|e| format!("failed to read '{}': {e}", cli.infile.display()))?;
    let sink = DiagnosticSink::new();

    let lines = parse_fasm(&sources, file, &sink);
    if sink.has_errors() {
        return Ok(report(&sink, &sources, global));
    }
    if global.verbose {
        eprintln!(
            "   Parsed {} lines from {}",
            lines.len(),
            cli.infile.display()
        );
    }

    let Some(seed) = load_seed(&run, geometry, &sink, global)? else {
        return Ok(report(&sink, &sources, global));
    };

    let mut assembler = Assembler::with_seed(geometry, &db, &sink, seed);
    for line in &lines {
        if let Some(assignment) = line.assignment() {
            if let Err(e) = assembler.enable_feature(&assignment) {
                sink.emit(e.to_diagnostic());
            }
        }
        for coord in line.unknown_bits() {
            if let Err(e) = assembler.restore_unknown_bit(coord, line.span) {
                sink.emit(e.to_diagnostic());
            }
        }
    }
    if sink.has_errors() {
        return Ok(report(&sink, &sources, global));
    }

    let bitmap = run
        .bitmap
        .as_ref()
        .map(|path| (path, bitmap_csv(geometry, &db, assembler.store())));
    let produced = match assembler.produce(&run.options) {
        Ok(produced) => produced,
        Err(e) => {
            sink.emit(e.to_diagnostic());
            return Ok(report(&sink, &sources, global));
        }
    };

    write_atomic(&cli.outfile, &produced.data)?;
    if let Some(mem) = &produced.ram_mem {
        let path = run
            .ram_mem
            .clone()
            .unwrap_or_else(|| default_ram_mem_path(&cli.outfile));
        write_atomic(&path, mem.as_bytes())?;
        if global.verbose {
            eprintln!("   Wrote RAM initialization to {}", path.display());
        }
    }
    if let Some((path, csv)) = bitmap {
        write_atomic(path, csv.as_bytes())?;
    }

    if !global.quiet {
        eprintln!(
            "   Wrote {} bytes to {}",
            produced.data.len(),
            cli.outfile.display()
        );
    }
    Ok(report(&sink, &sources, global))
}

/// Decodes the default bitstream into the starting configuration.
///
/// Returns `None` if the default bitstream is unusable; the reason has been
/// reported to `sink`.
fn load_seed(
    run: &ResolvedRun,
    geometry: &DeviceGeometry,
    sink: &DiagnosticSink,
    global: &GlobalArgs,
) -> Result<Option<ConfigBitStore>, Box<dyn std::error::Error>> {
    let path = match &run.default_bitstream {
        DefaultBitstream::Disabled => return Ok(Some(ConfigBitStore::new())),
        DefaultBitstream::Explicit(path) => path,
        DefaultBitstream::IfPresent(path) if path.is_file() => path,
        DefaultBitstream::IfPresent(path) => {
            sink.emit(
                Diagnostic::note(
                    codes::NO_DEFAULT_BITSTREAM,
                    format!(
                        "no default bitstream at '{}'; starting from an empty configuration",
                        path.display()
                    ),
                    Span::SYNTHETIC,
                )
                .with_help("pass --default-bitstream FILE or --no-default-bitstream"),
            );
            return Ok(Some(ConfigBitStore::new()));
        }
    };

    let data = read_input(path)?;
    match decode_bitstream(geometry, &data, &run.seed_options, sink) {
        Ok(decoded) => {
            if global.verbose {
                eprintln!("   Seeded configuration from {}", path.display());
            }
            Ok(Some(decoded.store))
        }
        Err(e) => {
            sink.emit(
                e.to_diagnostic()
                    .with_note(format!("while decoding default bitstream '{}'", path.display())),
            );
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    const DB: &str = "X1Y1.A 5_5\nX2Y2.B 6_7 !6_8\nX3Y3.INIT[0] 10_10\nX3Y3.INIT[1] 10_11\n";

    fn workspace() -> TempDir {
        let tmp = TempDir::new().unwrap();
        fs::create_dir(tmp.path().join("db")).unwrap();
        fs::write(tmp.path().join("db").join("macro.db"), DB).unwrap();
        tmp
    }

    fn cli(dir: &Path, fasm: &str, extra: &[&str]) -> Cli {
        fs::write(dir.join("in.fasm"), fasm).unwrap();
        let db = dir.join("db");
        let infile = dir.join("in.fasm");
        let outfile = dir.join("out.bit");
        let mut args = vec![
            "qlfasm".to_string(),
            "--db-root".to_string(),
            db.display().to_string(),
            "-q".to_string(),
        ];
        args.extend(extra.iter().map(|s| s.to_string()));
        args.push(infile.display().to_string());
        args.push(outfile.display().to_string());
        Cli::parse_from(args)
    }

    fn quiet() -> GlobalArgs {
        GlobalArgs {
            quiet: true,
            verbose: false,
            color: false,
            format: crate::ReportFormat::Text,
        }
    }

    #[test]
    fn assembles_eos_s3() {
        let tmp = workspace();
        let cli = cli(tmp.path(), "X1Y1.A\nX3Y3.INIT[1:0] = 2'b10\n", &[]);
        assert_eq!(run(&cli, &quiet()).unwrap(), 0);
        let data = fs::read(tmp.path().join("out.bit")).unwrap();
        assert_eq!(data.len(), 75_960);
        assert!(data.iter().any(|&b| b != 0));
        assert!(!tmp.path().join("ram.mem").exists());
    }

    #[test]
    fn unknown_feature_fails_without_output() {
        let tmp = workspace();
        let cli = cli(tmp.path(), "X1Y1.A\nX9Y9.NOPE\n", &[]);
        assert_eq!(run(&cli, &quiet()).unwrap(), 1);
        assert!(!tmp.path().join("out.bit").exists());
    }

    #[test]
    fn parse_error_fails_without_output() {
        let tmp = workspace();
        let cli = cli(tmp.path(), "X1Y1.A[0:1]\n", &[]);
        assert_eq!(run(&cli, &quiet()).unwrap(), 1);
        assert!(!tmp.path().join("out.bit").exists());
    }

    #[test]
    fn missing_explicit_default_bitstream_is_an_error() {
        let tmp = workspace();
        let missing = tmp.path().join("missing.bin");
        let cli = cli(
            tmp.path(),
            "X1Y1.A\n",
            &["--default-bitstream", missing.to_str().unwrap()],
        );
        assert!(run(&cli, &quiet()).is_err());
    }

    #[test]
    fn seeds_from_default_bitstream_in_db_root() {
        let tmp = workspace();
        // Produce a seed holding X2Y2.B, then install it as the default.
        let seed_cli = cli(tmp.path(), "X2Y2.B\n", &["--no-default-bitstream"]);
        assert_eq!(run(&seed_cli, &quiet()).unwrap(), 0);
        fs::rename(
            tmp.path().join("out.bit"),
            tmp.path().join("db").join("default_bitstream.bin"),
        )
        .unwrap();

        let overlay = cli(tmp.path(), "X1Y1.A\n", &[]);
        assert_eq!(run(&overlay, &quiet()).unwrap(), 0);
        let combined = fs::read(tmp.path().join("out.bit")).unwrap();

        let both = cli(tmp.path(), "X1Y1.A\nX2Y2.B\n", &["--no-default-bitstream"]);
        fs::rename(tmp.path().join("out.bit"), tmp.path().join("combined.bit")).unwrap();
        assert_eq!(run(&both, &quiet()).unwrap(), 0);
        assert_eq!(fs::read(tmp.path().join("out.bit")).unwrap(), combined);
    }

    #[test]
    fn headerless_seed_under_short_header_output() {
        let tmp = workspace();
        let seed_cli = cli(
            tmp.path(),
            "X2Y2.B\n",
            &["--dev-type", "ql-pp3", "--no-default-bitstream"],
        );
        assert_eq!(run(&seed_cli, &quiet()).unwrap(), 0);
        fs::rename(
            tmp.path().join("out.bit"),
            tmp.path().join("db").join("default_bitstream.bin"),
        )
        .unwrap();

        let overlay = cli(
            tmp.path(),
            "X1Y1.A\n",
            &["--dev-type", "ql-pp3", "--header", "short"],
        );
        assert_eq!(run(&overlay, &quiet()).unwrap(), 0);
        let combined = fs::read(tmp.path().join("out.bit")).unwrap();

        let both = cli(
            tmp.path(),
            "X1Y1.A\nX2Y2.B\n",
            &[
                "--dev-type",
                "ql-pp3",
                "--header",
                "short",
                "--no-default-bitstream",
            ],
        );
        assert_eq!(run(&both, &quiet()).unwrap(), 0);
        assert_eq!(fs::read(tmp.path().join("out.bit")).unwrap(), combined);
    }

    #[test]
    fn pp3_ram_writes_mem_file() {
        let tmp = workspace();
        let fasm = format!("X3Y1.RAM.RAM.INIT[9215:0] = 9216'h{}\n", "0".repeat(2303) + "1");
        let cli = cli(tmp.path(), &fasm, &["--dev-type", "ql-pp3", "--header", "full"]);
        assert_eq!(run(&cli, &quiet()).unwrap(), 0);
        let mem = fs::read_to_string(tmp.path().join("ram.mem")).unwrap();
        assert!(mem.starts_with("0x00000000:0x00000001\n"));
        let data = fs::read(tmp.path().join("out.bit")).unwrap();
        assert_eq!(data.len(), 6 + 98_124 + 512 * 4 + 4);
    }

    #[test]
    fn writes_bitmap() {
        let tmp = workspace();
        let map = tmp.path().join("map.csv");
        let cli = cli(tmp.path(), "X1Y1.A\n", &["--bitmap", map.to_str().unwrap()]);
        assert_eq!(run(&cli, &quiet()).unwrap(), 0);
        let csv = fs::read_to_string(map).unwrap();
        assert_eq!(csv.lines().count(), 844);
    }
}
