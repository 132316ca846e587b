//! `qlfasm -d IN.bit OUT.fasm`: bitstream to FASM.

use qlf_bitstream::{bitmap_csv, decode_bitstream, disassemble, ram_init_assignments};
use qlf_diagnostics::DiagnosticSink;
use qlf_fasm::FasmOutput;
use qlf_source::SourceDb;

use crate::pipeline::{
    check_output_dir, load_database, read_input, report, resolve_run, write_atomic,
};
use crate::{Cli, GlobalArgs};

/// Runs a disassembly. Returns exit code 0 on success, 1 if any error was reported.
pub fn run(cli: &Cli, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let run = resolve_run(cli, global)?;
    check_output_dir(&cli.outfile)?;
    let db = load_database(&run, global)?;
    let geometry = run.family.geometry();

    let data = read_input(&cli.infile)?;
    let sources = SourceDb::new();
    let sink = DiagnosticSink::new();

    let decoded = match decode_bitstream(geometry, &data, &run.options, &sink) {
        Ok(decoded) => decoded,
        Err(e) => {
            sink.emit(e.to_diagnostic());
            return Ok(report(&sink, &sources, global));
        }
    };

    let disassembly = disassemble(&db, &decoded.store);
    let mut output = FasmOutput::from_disassembly(&disassembly);
    let mut ram_blocks = 0;
    if let Some(image) = &decoded.ram {
        for init in ram_init_assignments(geometry, image) {
            output.add_assignment(&init);
            ram_blocks += 1;
        }
    }

    write_atomic(&cli.outfile, output.render().as_bytes())?;
    if let Some(path) = &run.bitmap {
        write_atomic(path, bitmap_csv(geometry, &db, &decoded.store).as_bytes())?;
    }

    if global.verbose {
        eprintln!(
            "   Found {} features, {} unknown bits, {} RAM blocks",
            disassembly.features.len(),
            disassembly.unknown_bits.len(),
            ram_blocks
        );
    }
    if !global.quiet {
        eprintln!(
            "   Wrote {} lines to {}",
            output.len(),
            cli.outfile.display()
        );
    }
    Ok(report(&sink, &sources, global))
}
