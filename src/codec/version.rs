use std::fmt;

use crate::error::{LinkGraphError, Result};

/// Version stamp of a save stream; gates which fields are present.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct SaveVersion(pub u16);

impl SaveVersion {
    /// Oldest stream this build reads.
    pub const OLDEST: SaveVersion = SaveVersion(150);
    /// Edges carry `last_restricted_update` from here on.
    pub const RESTRICTED_UPDATE: SaveVersion = SaveVersion(187);
    /// Nodes carry their location, edges are stored as sparse chains and the
    /// legacy distance field is gone.
    pub const SPARSE_EDGES: SaveVersion = SaveVersion(191);
    /// Edges carry their accumulated travel time.
    pub const TRAVEL_TIME: SaveVersion = SaveVersion(297);
    /// Version written by default.
    pub const CURRENT: SaveVersion = SaveVersion::TRAVEL_TIME;

    /// True if this stream predates `gate`.
    pub fn is_before(self, gate: SaveVersion) -> bool {
        self < gate
    }

    /// True if this stream contains fields introduced at `gate`.
    pub fn has(self, gate: SaveVersion) -> bool {
        self >= gate
    }

    /// Fails for versions outside the readable range.
    pub fn check_supported(self) -> Result<()> {
        if self < Self::OLDEST || self > Self::CURRENT {
            return Err(LinkGraphError::UnsupportedVersion {
                found: self.0,
                min: Self::OLDEST.0,
                max: Self::CURRENT.0,
            });
        }
        Ok(())
    }
}

impl fmt::Display for SaveVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// How a node's outgoing edges are laid out in the stream.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum EdgeFormat {
    /// One record for every possible target, zero-capacity ones included.
    Dense,
    /// Only the live chain, headed by the node's own slot.
    Sparse,
}

impl EdgeFormat {
    /// Edge layout used by streams of `version`.
    pub fn for_version(version: SaveVersion) -> Self {
        if version.is_before(SaveVersion::SPARSE_EDGES) {
            EdgeFormat::Dense
        } else {
            EdgeFormat::Sparse
        }
    }
}
