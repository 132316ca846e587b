//! CSV map of the configuration grid, for inspecting database coverage.

use crate::config_bits::ConfigBitStore;
use crate::geometry::DeviceGeometry;
use crate::FeatureDatabase;
use qlf_common::Coord;
use std::collections::HashSet;

/// Renders the grid as CSV: `max_wl` rows of `max_bl` cells.
///
/// Each cell is `defined + 2 × set`, where `defined` means some database
/// feature references the cell and `set` means the store holds a 1 there:
///
/// | value | meaning |
/// |---|---|
/// | 0 | unused, clear |
/// | 1 | known to the database, clear |
/// | 2 | set, unknown to the database |
/// | 3 | set and known |
pub fn bitmap_csv(
    geom: &DeviceGeometry,
    db: &dyn FeatureDatabase,
    store: &ConfigBitStore,
) -> String {
    let defined: HashSet<Coord> = db
        .features()
        .flat_map(|f| f.bits.iter().map(|b| b.coord))
        .collect();

    let mut out = String::with_capacity((geom.max_wl * geom.max_bl * 2) as usize);
    for wl in 0..geom.max_wl {
        for bl in 0..geom.max_bl {
            if bl > 0 {
                out.push(',');
            }
            let coord = Coord::new(wl, bl);
            let cell = defined.contains(&coord) as u8 + 2 * store.value(coord) as u8;
            out.push(char::from(b'0' + cell));
        }
        out.push('\n');
    }
    out
}
