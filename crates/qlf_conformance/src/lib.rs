//! Conformance test helpers for the qlfasm codec.
//!
//! Builds synthetic feature databases for the built-in device geometries and
//! runs FASM text and bitstream bytes through the same parse → assemble and
//! decode → disassemble pipelines the `qlfasm` binary uses, returning
//! structured results for assertion in integration tests.

#![warn(missing_docs)]

use qlf_bitstream::{
    decode_bitstream, disassemble, ram_init_assignments, Assembler, BitstreamOptions,
    ConfigBitStore, DeviceGeometry, Disassembly, Header,
};
use qlf_db::FeatureTables;
use qlf_diagnostics::{Diagnostic, DiagnosticSink, Severity};
use qlf_fasm::{parse_fasm, FasmOutput};
use qlf_source::SourceDb;
use std::fmt::Write;

/// Features generated per synthetic tile.
pub const FEATURES_PER_TILE: usize = 8;

/// Result of running FASM text through parse → assemble → produce.
pub struct AssemblyResult {
    /// The bitstream, absent if any error was reported.
    pub data: Option<Vec<u8>>,
    /// RAM memory file content, when RAM was initialized.
    pub ram_mem: Option<String>,
    /// Header written, if any.
    pub header: Option<Header>,
    /// The configuration the bitstream was produced from.
    pub store: ConfigBitStore,
    /// All diagnostics emitted.
    pub diagnostics: Vec<Diagnostic>,
    /// Whether any errors were emitted.
    pub has_errors: bool,
}

impl AssemblyResult {
    /// Diagnostics of the given severity.
    pub fn with_severity(&self, severity: Severity) -> Vec<&Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == severity)
            .collect()
    }
}

/// Result of running bitstream bytes through decode → disassemble.
pub struct DisassemblyResult {
    /// Rendered FASM, absent if decoding failed.
    pub fasm: Option<String>,
    /// Structured disassembly, absent if decoding failed.
    pub disassembly: Option<Disassembly>,
    /// The decoded configuration, absent if decoding failed.
    pub store: Option<ConfigBitStore>,
    /// All diagnostics emitted.
    pub diagnostics: Vec<Diagnostic>,
    /// Whether any errors were emitted.
    pub has_errors: bool,
}

/// Generates database text for `tiles` synthetic tiles of a geometry.
///
/// Tile `i` occupies wordlines `8i+3 ..= 8i+5`, so tiles never share cells.
/// Each tile has a single-bit enable, a two-way mux whose settings clear
/// each other's cell, and a 5-bit `INIT` vector. Two edge features touch the
/// first and the last cell of the grid. `tiles` is capped so every tile
/// fits on the grid.
pub fn synthetic_db_text(geom: &DeviceGeometry, tiles: u32) -> String {
    let tiles = tiles.min(geom.max_wl / 8);
    let mut out = String::from("# synthetic feature table\n");
    for i in 0..tiles {
        let wl = i * 8 + 3;
        let bl = (i * 29) % (geom.max_bl - 5);
        let tile = format!("X{i}Y1");
        let _ = writeln!(out, "{tile}.LOGIC.EN {wl}_{bl}");
        let mux = wl + 1;
        let (a, b) = (bl, bl + 1);
        let _ = writeln!(out, "{tile}.MUX.I0 {mux}_{a} !{mux}_{b}");
        let _ = writeln!(out, "{tile}.MUX.I1 !{mux}_{a} {mux}_{b}");
        for k in 0..5 {
            let _ = writeln!(out, "{tile}.LUT.INIT[{k}] {}_{}", wl + 2, bl + k);
        }
    }
    let _ = writeln!(out, "EDGE.FIRST 0_0");
    let _ = writeln!(out, "EDGE.LAST {}_{}", geom.max_wl - 1, geom.max_bl - 1);
    out
}

/// Builds a synthetic database. See [`synthetic_db_text`].
pub fn synthetic_db(geom: &DeviceGeometry, tiles: u32) -> FeatureTables {
    db_from_text(&synthetic_db_text(geom, tiles))
}

/// Builds a database from one table's text.
pub fn db_from_text(text: &str) -> FeatureTables {
    let mut db = FeatureTables::new();
    db.add_table("synthetic.db", text)
        .expect("synthetic table must parse");
    db
}

/// Parses and assembles FASM text on an empty configuration.
pub fn assemble_fasm(
    geom: &DeviceGeometry,
    db: &FeatureTables,
    fasm: &str,
    options: &BitstreamOptions,
) -> AssemblyResult {
    assemble_fasm_seeded(geom, db, fasm, options, ConfigBitStore::new())
}

/// Parses and assembles FASM text on top of `seed`.
pub fn assemble_fasm_seeded(
    geom: &DeviceGeometry,
    db: &FeatureTables,
    fasm: &str,
    options: &BitstreamOptions,
    seed: ConfigBitStore,
) -> AssemblyResult {
    let mut sources = SourceDb::new();
    let file = sources.add_source("input.fasm", fasm.to_string());
    let sink = DiagnosticSink::new();

    let lines = parse_fasm(&sources, file, &sink);
    let mut assembler = Assembler::with_seed(geom, db, &sink, seed);
    if !sink.has_errors() {
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
    }

    let store = assembler.store().clone();
    let (data, ram_mem, header) = if sink.has_errors() {
        (None, None, None)
    } else {
        match assembler.produce(options) {
            Ok(p) => (Some(p.data), p.ram_mem, p.header),
            Err(e) => {
                sink.emit(e.to_diagnostic());
                (None, None, None)
            }
        }
    };

    let diagnostics = sink.take_all();
    let has_errors = diagnostics.iter().any(|d| d.severity.is_error());
    AssemblyResult {
        data,
        ram_mem,
        header,
        store,
        diagnostics,
        has_errors,
    }
}

/// Decodes and disassembles a bitstream, rendering FASM with RAM init lines.
pub fn disassemble_bitstream(
    geom: &DeviceGeometry,
    db: &FeatureTables,
    data: &[u8],
    options: &BitstreamOptions,
) -> DisassemblyResult {
    let sink = DiagnosticSink::new();
    let (fasm, disassembly, store) = match decode_bitstream(geom, data, options, &sink) {
        Ok(decoded) => {
            let disassembly = disassemble(db, &decoded.store);
            let mut output = FasmOutput::from_disassembly(&disassembly);
            if let Some(image) = &decoded.ram {
                for init in ram_init_assignments(geom, image) {
                    output.add_assignment(&init);
                }
            }
            (Some(output.render()), Some(disassembly), Some(decoded.store))
        }
        Err(e) => {
            sink.emit(e.to_diagnostic());
            (None, None, None)
        }
    };

    let diagnostics = sink.take_all();
    let has_errors = diagnostics.iter().any(|d| d.severity.is_error());
    DisassemblyResult {
        fasm,
        disassembly,
        store,
        diagnostics,
        has_errors,
    }
}

/// A RAM init line for one whole block, every cell holding `cell(k)`.
pub fn ram_block_line(bank: &str, block: u32, cells: impl Fn(u32) -> u32) -> String {
    ram_blocks_line(bank, block, 1, cells)
}

/// A RAM init line covering `count` consecutive blocks starting at `first`.
///
/// `cells(k)` gives the 18-bit value of the `k`-th cell of the range.
pub fn ram_blocks_line(bank: &str, first: u32, count: u32, cells: impl Fn(u32) -> u32) -> String {
    const BLOCK_BITS: u32 = 512 * 18;
    let width = count * BLOCK_BITS;
    let mut value = qlf_common::BitValue::new(width);
    for k in 0..width / 18 {
        value.set_bits(k * 18, 18, u64::from(cells(k) & 0x3_FFFF));
    }
    let lo = first * BLOCK_BITS;
    format!("{bank}.RAM.RAM.INIT[{}:{lo}] = {value}", lo + width - 1)
}
