//! Fixed per-family dimensions of the configuration grid and bitstream.

use qlf_common::Coord;

/// Which optional framing elements a family's bitstream may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Framing {
    /// A 1-byte or 6-byte header may precede the configuration data.
    pub header: bool,
    /// A Fletcher-32 trailer may follow the data.
    pub checksum: bool,
}

/// One RAM bank: its FASM prefix and the address of its first cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RamBank {
    /// Tile name used as the FASM prefix, e.g. `X33Y2`.
    pub name: &'static str,
    /// Address of cell 0 in the memory side file.
    pub base_address: u32,
}

/// Organisation of the embedded RAM blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RamLayout {
    /// RAM banks in table order.
    pub banks: &'static [RamBank],
    /// Independently enabled blocks per bank.
    pub blocks_per_bank: u32,
    /// Cells per block.
    pub cells_per_block: u32,
    /// Significant bits per cell.
    pub init_width: u32,
    /// Address distance between consecutive cells.
    pub cell_stride: u32,
    /// Bytes per cell in the bitstream payload.
    pub cell_bytes: u32,
    /// Whether RAM content is appended to the bitstream (otherwise it only
    /// goes to the memory side file).
    pub payload: bool,
}

impl RamLayout {
    /// Initialization bits per block (`cells_per_block × init_width`).
    pub fn block_bits(&self) -> u32 {
        self.cells_per_block * self.init_width
    }

    /// Payload bytes per enabled block.
    pub fn block_bytes(&self) -> usize {
        (self.cells_per_block * self.cell_bytes) as usize
    }

    /// Looks up a bank by tile name.
    pub fn bank_index(&self, name: &str) -> Option<usize> {
        self.banks.iter().position(|b| b.name == name)
    }

    /// Address of `cell` (counted from the start of the bank) in bank `bank`.
    pub fn cell_address(&self, bank: usize, cell: u32) -> u32 {
        self.banks[bank].base_address + cell * self.cell_stride
    }
}

/// Immutable description of one device family's configuration grid.
///
/// The grid is `max_wl` wordlines by `max_bl` bitlines. Banks `0..banks/2`
/// serve wordlines `0..max_wl/2`; the upper banks serve the upper half.
/// Within each half, bank `b` covers the bitlines starting at
/// `bank_start[b % (banks/2)]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceGeometry {
    /// Part name, used in messages.
    pub name: &'static str,
    /// Number of wordlines.
    pub max_wl: u32,
    /// Number of bitlines.
    pub max_bl: u32,
    /// Number of banks (one bit per bank in every word).
    pub banks: u32,
    /// First bitline of each bank in one half.
    pub bank_start: &'static [u32],
    /// Banks whose first `pad_bits` bit-numbers have no storage behind them.
    pub padded_banks: &'static [u32],
    /// Number of padding bit-numbers in a padded bank.
    pub pad_bits: u32,
    /// Bytes per emitted word.
    pub word_bytes: u32,
    /// Supported framing.
    pub framing: Framing,
    /// Embedded RAM, if the family has initializable RAM.
    pub ram: Option<RamLayout>,
}

const EOS_S3_RAM_BANKS: [RamBank; 4] = [
    RamBank {
        name: "X33Y2",
        base_address: 0x4001_8000,
    },
    RamBank {
        name: "X33Y16",
        base_address: 0x4001_9000,
    },
    RamBank {
        name: "X1Y30",
        base_address: 0x4001_A000,
    },
    RamBank {
        name: "X18Y30",
        base_address: 0x4001_B000,
    },
];

const PP3_RAM_BANKS: [RamBank; 4] = [
    RamBank {
        name: "X3Y1",
        base_address: 0x0000_0000,
    },
    RamBank {
        name: "X3Y17",
        base_address: 0x0000_1000,
    },
    RamBank {
        name: "X30Y1",
        base_address: 0x0000_2000,
    },
    RamBank {
        name: "X30Y17",
        base_address: 0x0000_3000,
    },
];

/// QuickLogic EOS S3 (QL732B).
pub static EOS_S3: DeviceGeometry = DeviceGeometry {
    name: "QL732B",
    max_wl: 844,
    max_bl: 716,
    banks: 32,
    bank_start: &[
        0, 43, 88, 133, 178, 223, 268, 313, 673, 628, 583, 538, 493, 448, 403, 358,
    ],
    padded_banks: &[0, 8, 16, 24],
    pad_bits: 2,
    word_bytes: 4,
    framing: Framing {
        header: false,
        checksum: false,
    },
    ram: Some(RamLayout {
        banks: &EOS_S3_RAM_BANKS,
        blocks_per_bank: 2,
        cells_per_block: 512,
        init_width: 18,
        cell_stride: 4,
        cell_bytes: 4,
        payload: false,
    }),
};

/// QuickLogic PolarPro 3 (QL725A).
pub static PP3: DeviceGeometry = DeviceGeometry {
    name: "QL725A",
    max_wl: 884,
    max_bl: 886,
    banks: 8,
    bank_start: &[0, 220, 442, 664],
    padded_banks: &[0, 4],
    pad_bits: 2,
    word_bytes: 1,
    framing: Framing {
        header: true,
        checksum: true,
    },
    ram: Some(RamLayout {
        banks: &PP3_RAM_BANKS,
        blocks_per_bank: 2,
        cells_per_block: 512,
        init_width: 18,
        cell_stride: 4,
        cell_bytes: 4,
        payload: true,
    }),
};

impl DeviceGeometry {
    /// Banks per wordline half.
    pub fn half_banks(&self) -> u32 {
        self.banks / 2
    }

    /// Wordlines per half.
    pub fn half_wl(&self) -> u32 {
        self.max_wl / 2
    }

    /// Bit-numbers per bank: `ceil(max_bl / (banks / 2))`.
    pub fn bank_bits(&self) -> u32 {
        self.max_bl.div_ceil(self.half_banks())
    }

    /// Words in the configuration section.
    pub fn config_words(&self) -> usize {
        self.half_wl() as usize * self.bank_bits() as usize
    }

    /// Bytes in the configuration section.
    pub fn config_bytes(&self) -> usize {
        self.config_words() * self.word_bytes as usize
    }

    /// Returns `true` if `bank`'s first bit-numbers are padding.
    pub fn is_padded(&self, bank: u32) -> bool {
        self.padded_banks.contains(&bank)
    }

    /// Bitline stored at `bitnum` of `bank`, or `None` for a padding position.
    pub fn bitline(&self, bank: u32, bitnum: u32) -> Option<u32> {
        let start = self.bank_start[(bank % self.half_banks()) as usize];
        if self.is_padded(bank) {
            if bitnum < self.pad_bits {
                return None;
            }
            Some(start + bitnum - self.pad_bits)
        } else {
            Some(start + bitnum)
        }
    }

    /// Wordline offset of `bank`: 0 for the lower half, `half_wl` for the upper.
    pub fn wl_shift(&self, bank: u32) -> u32 {
        if bank >= self.half_banks() {
            self.half_wl()
        } else {
            0
        }
    }

    /// Returns `true` if `coord` lies on the grid.
    pub fn contains(&self, coord: Coord) -> bool {
        coord.wl < self.max_wl && coord.bl < self.max_bl
    }
}
