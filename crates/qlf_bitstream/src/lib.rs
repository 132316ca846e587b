//! Configuration bitstream codec for QuickLogic EOS S3 and PolarPro 3 devices.
//!
//! Both families store their fabric configuration as a grid of cells
//! addressed by wordline and bitline. The bitstream shifts that grid out one
//! bank bit-number at a time: every emitted word carries one bit per bank,
//! and the lower and upper halves of the banks cover the lower and upper
//! halves of the wordlines.
//!
//! The crate is organised around the [`ConfigBitStore`]:
//!
//! - [`Assembler`] turns FASM feature assignments into a store and produces
//!   the bitstream bytes ([`layout`], [`framing`], [`checksum`], [`ram`]).
//! - [`decode_bitstream`] turns bytes back into a store.
//! - [`disassemble`] names the features a store contains.
//!
//! Feature names are resolved through the [`FeatureDatabase`] trait, which
//! the `qlf_db` crate implements on top of the on-disk tables.

#![warn(missing_docs)]

pub mod assembler;
pub mod bitmap;
pub mod checksum;
pub mod codes;
pub mod config_bits;
pub mod decoder;
pub mod disassembler;
pub mod error;
pub mod framing;
pub mod geometry;
pub mod layout;
pub mod ram;

pub use assembler::{Assembler, BitRange, FeatureAssignment, ProducedBitstream};
pub use bitmap::bitmap_csv;
pub use config_bits::{ConfigBitStore, StoredBit};
pub use decoder::{decode_bitstream, DecodedBitstream};
pub use disassembler::{disassemble, ram_init_assignments, ram_init_lines, Disassembly};
pub use error::BitstreamError;
pub use framing::{BitstreamOptions, Command, Header, HeaderKind, HeaderMode, OscFreq};
pub use geometry::{DeviceGeometry, Framing, RamBank, RamLayout};
pub use ram::{RamImage, RamState};

use qlf_common::Coord;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Name suffix of the pseudo-feature that carries RAM initialization data.
pub const RAM_INIT_SUFFIX: &str = ".RAM.RAM.INIT";

/// The supported device families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeviceFamily {
    /// QuickLogic EOS S3 (QL732B).
    #[serde(rename = "ql-eos-s3")]
    EosS3,
    /// QuickLogic PolarPro 3 (QL725A).
    #[serde(rename = "ql-pp3")]
    Pp3,
}

impl DeviceFamily {
    /// All families, in the order they are listed to users.
    pub const ALL: [DeviceFamily; 2] = [DeviceFamily::EosS3, DeviceFamily::Pp3];

    /// The device-type tag accepted on the command line.
    pub fn tag(self) -> &'static str {
        match self {
            DeviceFamily::EosS3 => "ql-eos-s3",
            DeviceFamily::Pp3 => "ql-pp3",
        }
    }

    /// Name of the feature database directory for this family.
    pub fn db_dir(self) -> &'static str {
        match self {
            DeviceFamily::EosS3 => "ql732b",
            DeviceFamily::Pp3 => "ql725a",
        }
    }

    /// Returns the fixed geometry of this family.
    pub fn geometry(self) -> &'static DeviceGeometry {
        match self {
            DeviceFamily::EosS3 => &geometry::EOS_S3,
            DeviceFamily::Pp3 => &geometry::PP3,
        }
    }
}

impl fmt::Display for DeviceFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Error returned when a device-type tag names no supported family.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown device type '{0}' (expected one of: ql-eos-s3, ql-pp3)")]
pub struct UnknownDeviceError(pub String);

impl FromStr for DeviceFamily {
    type Err = UnknownDeviceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DeviceFamily::ALL
            .into_iter()
            .find(|family| family.tag().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownDeviceError(s.to_string()))
    }
}

/// One bit of a feature: the cell it touches and the value it requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FeatureBit {
    /// Cell coordinate.
    pub coord: Coord,
    /// `true` to set the cell, `false` to clear it (`!wl_bl` in database files).
    pub set: bool,
}

/// A named feature: the set of cell values that enable it.
///
/// Different features may touch the same cells; mutually exclusive settings
/// of one routing mux typically do.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feature {
    /// Fully qualified feature name, e.g. `X1Y1.LOGIC.LOGIC.Ipwr_gates.J_pwr_st`.
    pub name: String,
    /// Cell values required by the feature.
    pub bits: Vec<FeatureBit>,
}

/// Lookup of features by name.
///
/// Implementations are immutable once loaded and may be shared by any
/// number of conversion runs.
pub trait FeatureDatabase {
    /// Returns the feature with exactly this name.
    fn get_feature(&self, name: &str) -> Option<&Feature>;

    /// Iterates all features in load order.
    fn features(&self) -> Box<dyn Iterator<Item = &Feature> + '_>;
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn family_from_tag() {
        assert_eq!("ql-eos-s3".parse::<DeviceFamily>(), Ok(DeviceFamily::EosS3));
        assert_eq!("QL-PP3".parse::<DeviceFamily>(), Ok(DeviceFamily::Pp3));
    }

    #[test]
    fn family_unknown_tag() {
        let err = "ql-xyz".parse::<DeviceFamily>().unwrap_err();
        assert_eq!(
            err.to_string(),
            "unknown device type 'ql-xyz' (expected one of: ql-eos-s3, ql-pp3)"
        );
    }

    #[test]
    fn family_display_matches_tag() {
        for family in DeviceFamily::ALL {
            assert_eq!(family.to_string().parse::<DeviceFamily>(), Ok(family));
        }
    }

    #[test]
    fn family_db_dirs() {
        assert_eq!(DeviceFamily::EosS3.db_dir(), "ql732b");
        assert_eq!(DeviceFamily::Pp3.db_dir(), "ql725a");
    }

    #[test]
    fn family_serde_uses_tag() {
        let json = serde_json::to_string(&DeviceFamily::Pp3).unwrap();
        assert_eq!(json, "\"ql-pp3\"");
        let back: DeviceFamily = serde_json::from_str("\"ql-eos-s3\"").unwrap();
        assert_eq!(back, DeviceFamily::EosS3);
    }

    #[test]
    fn feature_serde_roundtrip() {
        let f = Feature {
            name: "X1Y1.A".into(),
            bits: vec![FeatureBit {
                coord: Coord::new(1, 2),
                set: false,
            }],
        };
        let json = serde_json::to_string(&f).unwrap();
        assert_eq!(serde_json::from_str::<Feature>(&json).unwrap(), f);
    }
}
