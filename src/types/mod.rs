//! Identifier newtypes, screen geometry and selection masks shared by the
//! store, the codec and the overlay.

mod mask;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use mask::{CargoMask, CompanyMask};

/// Station identifier as used by the host game.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Serialize, Deserialize)]
pub struct StationId(pub u16);

/// Dense index of a node inside one [`crate::storage::LinkGraph`].
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Serialize, Deserialize)]
pub struct NodeId(pub u16);

/// Cargo type index. Valid cargo ids are below [`CargoId::MAX`].
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Serialize, Deserialize)]
pub struct CargoId(pub u8);

/// Company index. Valid company ids are below [`CompanyId::MAX`].
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Serialize, Deserialize)]
pub struct CompanyId(pub u8);

/// Registry index of a link graph.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Serialize, Deserialize)]
pub struct LinkGraphId(pub u16);

/// Registry index of a link graph job.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Serialize, Deserialize)]
pub struct JobId(pub u16);

/// Packed tile coordinate: x in the low 16 bits, y in the high 16 bits.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Default, Serialize, Deserialize)]
pub struct TileIndex(pub u32);

/// Game date in days.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Default, Serialize, Deserialize)]
pub struct Date(pub i32);

impl NodeId {
    /// Terminator of an edge chain in the persisted format.
    pub const INVALID: NodeId = NodeId(u16::MAX);

    /// Index into dense node storage.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl CargoId {
    /// Number of distinct cargo slots.
    pub const MAX: u8 = 64;
    /// Placeholder for "no cargo".
    pub const INVALID: CargoId = CargoId(u8::MAX);
}

impl CompanyId {
    /// Number of distinct company slots.
    pub const MAX: u8 = 15;
}

impl TileIndex {
    /// Packs a tile coordinate.
    pub fn from_xy(x: u16, y: u16) -> Self {
        TileIndex(((y as u32) << 16) | x as u32)
    }

    /// Tile column.
    pub fn x(self) -> u16 {
        (self.0 & 0xFFFF) as u16
    }

    /// Tile row.
    pub fn y(self) -> u16 {
        (self.0 >> 16) as u16
    }
}

/// Owner of a station.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Serialize, Deserialize)]
pub enum Owner {
    /// Owned by a company.
    Company(CompanyId),
    /// Not owned by any company (oil rigs and other shared facilities).
    Neutral,
}

impl Owner {
    /// True for owner-neutral stations.
    pub fn is_neutral(self) -> bool {
        matches!(self, Owner::Neutral)
    }
}

/// A point in screen or world pixels.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal coordinate.
    pub x: i32,
    /// Vertical coordinate, growing downwards.
    pub y: i32,
}

impl Point {
    /// Creates a point.
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// An axis-aligned rectangle; `right` and `bottom` are the far edges.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default, Serialize, Deserialize)]
pub struct Rect {
    /// Left edge.
    pub left: i32,
    /// Top edge.
    pub top: i32,
    /// Right edge.
    pub right: i32,
    /// Bottom edge.
    pub bottom: i32,
}

impl Rect {
    /// Creates a rectangle from its edges.
    pub const fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Creates a rectangle from an origin and a size.
    pub const fn from_size(left: i32, top: i32, width: i32, height: i32) -> Self {
        Self::new(
            left,
            top,
            left.saturating_add(width),
            top.saturating_add(height),
        )
    }

    /// Width of the rectangle.
    pub fn width(&self) -> i32 {
        self.right - self.left
    }

    /// Height of the rectangle.
    pub fn height(&self) -> i32 {
        self.bottom - self.top
    }

    /// Grows every side by `by`.
    pub fn expand(&self, by: i32) -> Rect {
        Rect::new(
            self.left.saturating_sub(by),
            self.top.saturating_sub(by),
            self.right.saturating_add(by),
            self.bottom.saturating_add(by),
        )
    }

    /// True if `other` lies entirely inside `self`.
    pub fn contains_rect(&self, other: &Rect) -> bool {
        other.left >= self.left
            && other.right <= self.right
            && other.top >= self.top
            && other.bottom <= self.bottom
    }
}

impl fmt::Display for StationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for CargoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for LinkGraphId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u16> for StationId {
    fn from(value: u16) -> Self {
        StationId(value)
    }
}

impl From<u16> for NodeId {
    fn from(value: u16) -> Self {
        NodeId(value)
    }
}
