//! The bit-layout engine: configuration grid ⇄ configuration words.
//!
//! Words are emitted wordline by wordline, from `half_wl - 1` down to 0.
//! For each wordline, one word is emitted per bank bit-number, and bit `b`
//! of the word carries bank `b`'s cell. Banks in the upper half read their
//! cell `half_wl` wordlines higher. Padding positions carry 0 and are
//! ignored when decoding.

use crate::config_bits::ConfigBitStore;
use crate::geometry::DeviceGeometry;
use qlf_common::Coord;

/// Visits every (word index, bank, cell) triple in stream order.
///
/// Padding positions are skipped. Banks are visited from the highest down,
/// matching the order in which the device shifts them in.
fn for_each_cell(geom: &DeviceGeometry, mut visit: impl FnMut(usize, u32, Coord)) {
    let mut word_index = 0;
    for wl in (0..geom.half_wl()).rev() {
        for bitnum in 0..geom.bank_bits() {
            for bank in (0..geom.banks).rev() {
                if let Some(bl) = geom.bitline(bank, bitnum) {
                    visit(word_index, bank, Coord::new(wl + geom.wl_shift(bank), bl));
                }
            }
            word_index += 1;
        }
    }
}

/// Encodes the configuration section of a bitstream.
///
/// Returns exactly `geom.config_bytes()` bytes, each word written
/// little-endian in `geom.word_bytes` bytes.
pub fn encode_config_bits(geom: &DeviceGeometry, store: &ConfigBitStore) -> Vec<u8> {
    let mut words = vec![0u32; geom.config_words()];
    for_each_cell(geom, |index, bank, coord| {
        if store.value(coord) {
            words[index] |= 1 << bank;
        }
    });

    let word_bytes = geom.word_bytes as usize;
    let mut out = Vec::with_capacity(geom.config_bytes());
    for word in words {
        out.extend_from_slice(&word.to_le_bytes()[..word_bytes]);
    }
    out
}

/// Decodes a configuration section into a fresh store.
///
/// `data` must hold at least `geom.config_bytes()` bytes; extra bytes are
/// ignored. Every non-padding cell is written, including cells that are 0,
/// and decoded cells carry no origin.
pub fn decode_config_bits(geom: &DeviceGeometry, data: &[u8]) -> ConfigBitStore {
    let word_bytes = geom.word_bytes as usize;
    let words: Vec<u32> = data[..geom.config_bytes()]
        .chunks(word_bytes)
        .map(|chunk| {
            let mut bytes = [0u8; 4];
            bytes[..chunk.len()].copy_from_slice(chunk);
            u32::from_le_bytes(bytes)
        })
        .collect();

    let mut store = ConfigBitStore::new();
    for_each_cell(geom, |index, bank, coord| {
        store.set(coord, (words[index] >> bank) & 1 != 0, None);
    });
    store
}
