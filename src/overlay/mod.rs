//! Link graph overlay for a display surface.
//!
//! The [`OverlayCache`] decides which stations and links of the link graphs
//! are relevant to what a surface shows, keeps them sorted and merges newly
//! discovered entries in when the view moves. Rendering and picking work on
//! the cached entries only.

pub mod cache;
pub mod draw;
pub mod geometry;
pub mod options;
pub mod stats;
pub mod tooltip;
pub mod world;

pub use cache::{merge_sorted_runs, LinkInfo, OverlayCache, RebuildKind, StationSupplyInfo};
pub use draw::{dot_size, link_colour, DirtySink, DrawTarget, LINK_COLOURS};
pub use geometry::{point_visible, segment_visible};
pub use options::OverlayOptions;
pub use stats::{combine, reduce, saturation_percent, LinkContribution, LinkProperties};
pub use tooltip::LinkHit;
pub use world::{
    DisplaySurface, GoodsEntry, Network, NetworkView, SmallMapSurface, Station, Viewport,
    ViewportSurface,
};
