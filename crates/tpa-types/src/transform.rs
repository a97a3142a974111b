//! Transform identifier.
//!
//! The enumeration that fully determines the shape of per-SA state
//! (number of parallel chains, cumulative ring, tree).

use serde::{Deserialize, Serialize};

/// One of the six transforms a peer/firewall can negotiate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum TransformId {
    Unused = 0,
    Plain = 1,
    Parallel = 2,
    Cumulative = 3,
    ParaCumul = 4,
    Tree = 5,
}

impl TransformId {
    /// Decode a wire byte, mapping anything unrecognized to `Unused`:
    /// entries whose transform ID is not locally supported are normalized
    /// to `UNUSED` rather than rejected outright.
    pub fn from_wire(byte: u8) -> Self {
        match byte {
            1 => Self::Plain,
            2 => Self::Parallel,
            3 => Self::Cumulative,
            4 => Self::ParaCumul,
            5 => Self::Tree,
            _ => Self::Unused,
        }
    }

    pub fn to_wire(self) -> u8 {
        self as u8
    }

    /// True if this transform uses a cumulative ring buffer.
    pub fn is_cumulative(self) -> bool {
        matches!(self, Self::Cumulative | Self::ParaCumul)
    }

    /// True if this transform is tree-verified rather than chain-walked.
    pub fn is_tree(self) -> bool {
        matches!(self, Self::Tree)
    }

    /// Default parallel chain count for this transform (`PARALLEL` itself
    /// has no fixed default above 1; callers must supply
    /// `num_parallel_hchains` explicitly for it).
    pub fn default_num_chains(self) -> Option<usize> {
        match self {
            Self::Unused => None,
            Self::Plain | Self::Cumulative | Self::Tree => Some(1),
            Self::Parallel => Some(2),
            Self::ParaCumul => Some(1),
        }
    }
}
