//! Configuration bits → feature names.

use crate::assembler::{BitRange, FeatureAssignment};
use crate::config_bits::ConfigBitStore;
use crate::geometry::DeviceGeometry;
use crate::ram::RamImage;
use crate::{FeatureDatabase, RAM_INIT_SUFFIX};
use qlf_common::{BitValue, Coord};
use qlf_source::Span;
use std::collections::BTreeSet;

/// Features found in a configuration, plus set cells no feature explains.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Disassembly {
    /// Matched feature names, in database order.
    pub features: Vec<String>,
    /// Set cells not covered by any matched feature, ascending.
    pub unknown_bits: Vec<Coord>,
}

/// Names the features a configuration contains.
///
/// A feature matches when every one of its cells is stored with the value
/// the feature requires. Cells that are set but belong to no matched
/// feature are reported as unknown.
pub fn disassemble(db: &dyn FeatureDatabase, store: &ConfigBitStore) -> Disassembly {
    let mut unknown: BTreeSet<Coord> = store.set_coords().collect();
    let mut features = Vec::new();
    for feature in db.features() {
        let matches = feature
            .bits
            .iter()
            .all(|bit| store.get(bit.coord).is_some_and(|stored| stored.value == bit.set));
        if matches {
            features.push(feature.name.clone());
            for bit in &feature.bits {
                unknown.remove(&bit.coord);
            }
        }
    }
    Disassembly {
        features,
        unknown_bits: unknown.into_iter().collect(),
    }
}

/// Turns decoded RAM blocks back into `BANK.RAM.RAM.INIT[hi:lo]` assignments.
///
/// Feeding the assignments back to the assembler reproduces the same payload.
pub fn ram_init_assignments(geom: &DeviceGeometry, image: &RamImage) -> Vec<FeatureAssignment> {
    let Some(layout) = geom.ram.as_ref() else {
        return Vec::new();
    };
    let block_bits = layout.block_bits();
    image
        .enabled_blocks()
        .filter_map(|(bank, block)| {
            let cells = image.cells(bank, block)?;
            let mut value = BitValue::new(block_bits);
            for (k, cell) in cells.iter().enumerate() {
                value.set_bits(k as u32 * layout.init_width, layout.init_width, *cell as u64);
            }
            let start = block * block_bits;
            Some(FeatureAssignment {
                feature: format!("{}{RAM_INIT_SUFFIX}", layout.banks[bank].name),
                value,
                range: Some(BitRange {
                    start,
                    end: start + block_bits - 1,
                }),
                origin: Span::SYNTHETIC,
            })
        })
        .collect()
}

/// Renders decoded RAM blocks as `BANK.RAM.RAM.INIT[hi:lo] = 9216'h…` lines.
pub fn ram_init_lines(geom: &DeviceGeometry, image: &RamImage) -> Vec<String> {
    ram_init_assignments(geom, image)
        .into_iter()
        .filter_map(|init| {
            let range = init.range?;
            Some(format!(
                "{}[{}:{}] = {}",
                init.feature, range.end, range.start, init.value
            ))
        })
        .collect()
}
