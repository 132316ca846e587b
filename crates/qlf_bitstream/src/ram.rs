//! Embedded RAM initialization.
//!
//! RAM content reaches the tool as pseudo-features named
//! `<BANK>.RAM.RAM.INIT[hi:lo] = <value>`, where the range addresses
//! 18-bit cells of the bank concatenated into one bit vector. Each bank
//! has two blocks of 512 cells; a range must cover exactly one or two whole
//! blocks. Populated cells are collected by address for the memory side
//! file, and the blocks they fall in are marked enabled.

use crate::assembler::BitRange;
use crate::error::BitstreamError;
use crate::geometry::RamLayout;
use crate::RAM_INIT_SUFFIX;
use qlf_common::BitValue;
use qlf_source::Span;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write;

/// RAM cells and block enables accumulated during one assembly run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RamState {
    words: BTreeMap<u32, u32>,
    enabled: BTreeSet<(usize, u32)>,
}

impl RamState {
    /// Creates an empty state with no blocks enabled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies one RAM init assignment.
    ///
    /// `feature` is the full pseudo-feature name. Blocks touched by the range
    /// are enabled even when the value is zero. Enabling is idempotent and
    /// OR-merged across lines.
    pub fn populate(
        &mut self,
        layout: &RamLayout,
        feature: &str,
        value: &BitValue,
        range: Option<BitRange>,
        span: Span,
    ) -> Result<(), BitstreamError> {
        let bank_name = feature.strip_suffix(RAM_INIT_SUFFIX).unwrap_or(feature);
        let bank = layout
            .bank_index(bank_name)
            .ok_or_else(|| BitstreamError::UnknownFeature {
                feature: feature.to_string(),
                span,
            })?;

        let block_bits = layout.block_bits();
        let (start, width) = match range {
            Some(r) => (r.start, r.width()),
            None => (0, value.width()),
        };
        let blocks = width / block_bits;
        let first_block = start / block_bits;
        let valid = range.is_some()
            && start % block_bits == 0
            && width % block_bits == 0
            && (1..=2).contains(&blocks)
            && first_block + blocks <= layout.blocks_per_bank;
        if !valid {
            return Err(BitstreamError::InvalidRamBankSize {
                feature: feature.to_string(),
                width,
                span,
            });
        }

        let first_cell = start / layout.init_width;
        for k in 0..width / layout.init_width {
            let cell_value = value.bits(k * layout.init_width, layout.init_width) as u32;
            let addr = layout.cell_address(bank, first_cell + k);
            self.words.insert(addr, cell_value);
        }
        for block in first_block..first_block + blocks {
            self.enabled.insert((bank, block));
        }
        Ok(())
    }

    /// Returns `true` if the block has been enabled.
    pub fn is_enabled(&self, bank: usize, block: u32) -> bool {
        self.enabled.contains(&(bank, block))
    }

    /// Returns `true` if any block is enabled.
    pub fn any_enabled(&self) -> bool {
        !self.enabled.is_empty()
    }

    /// Block enables as header bits: bit `bank × blocks_per_bank + block`.
    pub fn enable_mask(&self, layout: &RamLayout) -> u8 {
        self.enabled
            .iter()
            .fold(0u8, |mask, &(bank, block)| {
                mask | 1 << (bank as u32 * layout.blocks_per_bank + block)
            })
    }

    /// Populated cells by address.
    pub fn words(&self) -> &BTreeMap<u32, u32> {
        &self.words
    }

    /// Renders the memory side file, one `0xADDR:0xVALUE` line per cell in
    /// ascending address order. `None` when no cell was populated.
    pub fn mem_file(&self) -> Option<String> {
        if self.words.is_empty() {
            return None;
        }
        let mut out = String::with_capacity(self.words.len() * 22);
        for (addr, value) in &self.words {
            let _ = writeln!(out, "0x{addr:08x}:0x{value:08x}");
        }
        Some(out)
    }

    /// Serializes the enabled blocks in table order, one little-endian cell
    /// after another. Unpopulated cells of an enabled block are 0.
    pub fn encode_payload(&self, layout: &RamLayout) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.enabled.len() * layout.block_bytes());
        for &(bank, block) in &self.enabled {
            for c in 0..layout.cells_per_block {
                let addr = layout.cell_address(bank, block * layout.cells_per_block + c);
                let value = self.words.get(&addr).copied().unwrap_or(0);
                out.extend_from_slice(&value.to_le_bytes()[..layout.cell_bytes as usize]);
            }
        }
        out
    }
}

/// Bytes of RAM payload announced by a header's block enables.
pub fn payload_len(layout: &RamLayout, ram_enable: u8) -> usize {
    let valid_bits = layout.banks.len() as u32 * layout.blocks_per_bank;
    let valid_mask = if valid_bits >= 8 {
        u8::MAX
    } else {
        (1u8 << valid_bits) - 1
    };
    (ram_enable & valid_mask).count_ones() as usize * layout.block_bytes()
}

/// RAM content recovered from a bitstream payload.
///
/// Indexed bank, then block; `None` for blocks the header did not enable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RamImage {
    banks: Vec<Vec<Option<Vec<u8>>>>,
    cell_bytes: u32,
    init_width: u32,
}

impl RamImage {
    /// Splits a payload into blocks according to the header's enables.
    ///
    /// `payload` must be exactly [`payload_len`] bytes long.
    pub fn decode(layout: &RamLayout, ram_enable: u8, payload: &[u8]) -> Self {
        let block_bytes = layout.block_bytes();
        let mut offset = 0;
        let mut banks = Vec::with_capacity(layout.banks.len());
        for bank in 0..layout.banks.len() {
            let mut blocks = Vec::with_capacity(layout.blocks_per_bank as usize);
            for block in 0..layout.blocks_per_bank {
                let bit = bank as u32 * layout.blocks_per_bank + block;
                if ram_enable & (1 << bit) != 0 {
                    let end = (offset + block_bytes).min(payload.len());
                    blocks.push(Some(payload[offset..end].to_vec()));
                    offset = end;
                } else {
                    blocks.push(None);
                }
            }
            banks.push(blocks);
        }
        Self {
            banks,
            cell_bytes: layout.cell_bytes,
            init_width: layout.init_width,
        }
    }

    /// Raw bytes of a block, if it was enabled.
    pub fn block(&self, bank: usize, block: u32) -> Option<&[u8]> {
        self.banks
            .get(bank)?
            .get(block as usize)?
            .as_deref()
    }

    /// Cell values of a block, masked to the init width.
    pub fn cells(&self, bank: usize, block: u32) -> Option<Vec<u32>> {
        let mask = (1u32 << self.init_width) - 1;
        let bytes = self.block(bank, block)?;
        Some(
            bytes
                .chunks(self.cell_bytes as usize)
                .map(|chunk| {
                    let mut word = [0u8; 4];
                    word[..chunk.len()].copy_from_slice(chunk);
                    u32::from_le_bytes(word) & mask
                })
                .collect(),
        )
    }

    /// Iterates `(bank, block)` of every enabled block in table order.
    pub fn enabled_blocks(&self) -> impl Iterator<Item = (usize, u32)> + '_ {
        self.banks.iter().enumerate().flat_map(|(bank, blocks)| {
            blocks
                .iter()
                .enumerate()
                .filter(|(_, b)| b.is_some())
                .map(move |(block, _)| (bank, block as u32))
        })
    }

    /// Returns `true` if no block was enabled.
    pub fn is_empty(&self) -> bool {
        self.enabled_blocks().next().is_none()
    }
}
