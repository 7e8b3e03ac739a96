//! What the overlay reads from the host: stations and graphs through
//! [`NetworkView`], screen projection through [`DisplaySurface`].
//!
//! [`Network`], [`ViewportSurface`] and [`SmallMapSurface`] are small
//! self-contained hosts used by the CLI and the tests.

use std::collections::BTreeMap;

use crate::codec::StationLocator;
use crate::error::{LinkGraphError, Result};
use crate::storage::{LinkGraph, LinkGraphState};
use crate::types::{
    CargoId, CargoMask, CompanyId, Date, LinkGraphId, NodeId, Owner, Point, Rect, StationId,
    TileIndex,
};

/// World pixels per tile edge.
pub const TILE_SIZE: i32 = 16;

/// A station's membership in one cargo's link graph.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GoodsEntry {
    /// Graph the station's node lives in.
    pub link_graph: LinkGraphId,
    /// Node of the station inside that graph.
    pub node: NodeId,
    /// Planned flow leaving the station, keyed by next hop.
    pub flows: BTreeMap<StationId, u32>,
}

impl GoodsEntry {
    /// Creates an entry without planned flows.
    pub fn new(link_graph: LinkGraphId, node: NodeId) -> Self {
        Self {
            link_graph,
            node,
            flows: BTreeMap::new(),
        }
    }
}

/// A station as seen by the overlay.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Station {
    /// Station id.
    pub id: StationId,
    /// Owning company.
    pub owner: Owner,
    /// Reference tile.
    pub xy: TileIndex,
    /// True while the station has no tiles (e.g. all parts were removed).
    pub footprint_empty: bool,
    /// Graph membership per cargo.
    pub goods: BTreeMap<CargoId, GoodsEntry>,
}

impl Station {
    /// Creates a station without any cargo.
    pub fn new(id: StationId, owner: Owner, xy: TileIndex) -> Self {
        Self {
            id,
            owner,
            xy,
            footprint_empty: false,
            goods: BTreeMap::new(),
        }
    }

    /// Graph membership for `cargo`.
    pub fn goods(&self, cargo: CargoId) -> Option<&GoodsEntry> {
        self.goods.get(&cargo)
    }

    /// Planned flow of `cargo` routed via `to`.
    pub fn planned_flow_via(&self, cargo: CargoId, to: StationId) -> u32 {
        self.goods(cargo)
            .and_then(|ge| ge.flows.get(&to))
            .copied()
            .unwrap_or(0)
    }
}

/// Read access to stations and link graphs.
pub trait NetworkView {
    /// Station with the given id, if it still exists.
    fn station(&self, id: StationId) -> Option<&Station>;
    /// Every station in ascending id order.
    fn stations(&self) -> Box<dyn Iterator<Item = &Station> + '_>;
    /// Link graph with the given id, if it still exists.
    fn link_graph(&self, id: LinkGraphId) -> Option<&LinkGraph>;
    /// True if `cargo` is defined in the current game.
    fn is_cargo_valid(&self, cargo: CargoId) -> bool;
    /// Current date.
    fn date(&self) -> Date;
    /// Palette index of a company's colour.
    fn company_colour(&self, company: CompanyId) -> u8;
}

/// Scrollable main view in world coordinates.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Viewport {
    /// Left edge of the visible world area.
    pub virtual_left: i32,
    /// Top edge of the visible world area.
    pub virtual_top: i32,
    /// Width of the visible world area.
    pub virtual_width: i32,
    /// Height of the visible world area.
    pub virtual_height: i32,
    /// Zoom level; one screen pixel covers `1 << zoom` world pixels.
    pub zoom: u8,
}

impl Viewport {
    /// Visible world area.
    pub fn virtual_rect(&self) -> Rect {
        Rect::from_size(
            self.virtual_left,
            self.virtual_top,
            self.virtual_width,
            self.virtual_height,
        )
    }

    /// Converts screen pixels to world pixels.
    pub fn scale_by_zoom(&self, value: i32) -> i32 {
        let scaled = i64::from(value) << self.zoom.min(31);
        scaled.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
    }

    /// Converts world pixels to screen pixels.
    pub fn unscale_by_zoom(&self, value: i32) -> i32 {
        value >> self.zoom.min(31)
    }
}

/// Where the overlay is drawn.
pub trait DisplaySurface {
    /// The scrollable view, or `None` for a fixed overview map.
    fn viewport(&self) -> Option<Viewport>;
    /// Widget size in screen pixels.
    fn widget_size(&self) -> (i32, i32);
    /// Screen point of a station's middle.
    fn station_middle(&self, station: &Station) -> Point;
    /// World point of a tile's north corner.
    fn tile_point(&self, tile: TileIndex) -> Point;
    /// Counter bumped whenever the projection changes.
    fn update_number(&self) -> u64;
}

/// Isometric projection of tile coordinates onto world pixels.
pub fn remap_coords(x: i32, y: i32) -> Point {
    Point::new((y - x) * 2, y + x)
}

/// In-memory host holding stations, link graphs and the current date.
#[derive(Clone, Debug, Default)]
pub struct Network {
    /// Stations by id.
    pub stations: BTreeMap<StationId, Station>,
    /// Graphs, jobs and schedule.
    pub state: LinkGraphState,
    /// Cargo types defined in the game.
    pub valid_cargos: CargoMask,
    /// Current date.
    pub date: Date,
    /// Palette index per company.
    pub company_colours: BTreeMap<CompanyId, u8>,
}

impl Network {
    /// Creates an empty network where every cargo is valid.
    pub fn new(date: Date) -> Self {
        Self {
            valid_cargos: CargoMask::all(),
            date,
            ..Self::default()
        }
    }

    /// Adds or replaces a station.
    pub fn insert_station(&mut self, station: Station) {
        self.stations.insert(station.id, station);
    }

    /// Removes a station; its graph nodes become stale references.
    pub fn remove_station(&mut self, id: StationId) -> Option<Station> {
        self.stations.remove(&id)
    }

    /// Adds `station` as a node of graph `graph` for `cargo`.
    pub fn join_graph(
        &mut self,
        station: StationId,
        cargo: CargoId,
        graph: LinkGraphId,
    ) -> Result<NodeId> {
        let st = self
            .stations
            .get_mut(&station)
            .ok_or_else(|| LinkGraphError::invalid(format!("unknown station {station}")))?;
        let lg = self
            .state
            .graph_mut(graph)
            .ok_or_else(|| LinkGraphError::invalid(format!("unknown link graph {graph}")))?;
        let node = lg.add_node(station, st.xy, self.date)?;
        st.goods.insert(cargo, GoodsEntry::new(graph, node));
        Ok(node)
    }
}

impl NetworkView for Network {
    fn station(&self, id: StationId) -> Option<&Station> {
        self.stations.get(&id)
    }

    fn stations(&self) -> Box<dyn Iterator<Item = &Station> + '_> {
        Box::new(self.stations.values())
    }

    fn link_graph(&self, id: LinkGraphId) -> Option<&LinkGraph> {
        self.state.graph(id)
    }

    fn is_cargo_valid(&self, cargo: CargoId) -> bool {
        self.valid_cargos.contains(cargo)
    }

    fn date(&self) -> Date {
        self.date
    }

    fn company_colour(&self, company: CompanyId) -> u8 {
        self.company_colours.get(&company).copied().unwrap_or(0)
    }
}

impl StationLocator for Network {
    fn station_location(&self, station: StationId) -> Option<TileIndex> {
        self.stations.get(&station).map(|st| st.xy)
    }
}

/// Main view: isometric projection scrolled and zoomed by a [`Viewport`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ViewportSurface {
    /// Visible world area and zoom.
    pub viewport: Viewport,
    /// Projection generation.
    pub update_number: u64,
}

impl ViewportSurface {
    /// Creates a surface showing `viewport`.
    pub fn new(viewport: Viewport) -> Self {
        Self {
            viewport,
            update_number: 0,
        }
    }

    /// Scrolls the view and bumps the update number.
    pub fn scroll_to(&mut self, left: i32, top: i32) {
        self.viewport.virtual_left = left;
        self.viewport.virtual_top = top;
        self.update_number += 1;
    }

    /// Resizes the visible area in world pixels and bumps the update number.
    pub fn resize(&mut self, width: i32, height: i32) {
        self.viewport.virtual_width = width;
        self.viewport.virtual_height = height;
        self.update_number += 1;
    }
}

impl DisplaySurface for ViewportSurface {
    fn viewport(&self) -> Option<Viewport> {
        Some(self.viewport)
    }

    fn widget_size(&self) -> (i32, i32) {
        (
            self.viewport.unscale_by_zoom(self.viewport.virtual_width),
            self.viewport.unscale_by_zoom(self.viewport.virtual_height),
        )
    }

    fn station_middle(&self, station: &Station) -> Point {
        let x = station.xy.x() as i32 * TILE_SIZE + TILE_SIZE / 2;
        let y = station.xy.y() as i32 * TILE_SIZE + TILE_SIZE / 2;
        let world = remap_coords(x, y);
        Point::new(
            self.viewport
                .unscale_by_zoom(world.x.saturating_sub(self.viewport.virtual_left)),
            self.viewport
                .unscale_by_zoom(world.y.saturating_sub(self.viewport.virtual_top)),
        )
    }

    fn tile_point(&self, tile: TileIndex) -> Point {
        remap_coords(tile.x() as i32 * TILE_SIZE, tile.y() as i32 * TILE_SIZE)
    }

    fn update_number(&self) -> u64 {
        self.update_number
    }
}

/// Overview map: every tile maps linearly to a block of screen pixels and
/// there is no scrollable viewport, so everything gets cached.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SmallMapSurface {
    /// Widget width in pixels.
    pub width: i32,
    /// Widget height in pixels.
    pub height: i32,
    /// Screen pixels per tile.
    pub pixels_per_tile: i32,
    /// Tile shown at the widget's top left corner.
    pub origin: (i32, i32),
    /// Projection generation.
    pub update_number: u64,
}

impl SmallMapSurface {
    /// Creates a map of the given size showing tiles from the origin.
    pub fn new(width: i32, height: i32, pixels_per_tile: i32) -> Self {
        Self {
            width,
            height,
            pixels_per_tile: pixels_per_tile.max(1),
            origin: (0, 0),
            update_number: 0,
        }
    }
}

impl DisplaySurface for SmallMapSurface {
    fn viewport(&self) -> Option<Viewport> {
        None
    }

    fn widget_size(&self) -> (i32, i32) {
        (self.width, self.height)
    }

    fn station_middle(&self, station: &Station) -> Point {
        let tile = self.tile_point(station.xy);
        Point::new(
            tile.x + self.pixels_per_tile / 2,
            tile.y + self.pixels_per_tile / 2,
        )
    }

    fn tile_point(&self, tile: TileIndex) -> Point {
        Point::new(
            (tile.x() as i32 - self.origin.0) * self.pixels_per_tile,
            (tile.y() as i32 - self.origin.1) * self.pixels_per_tile,
        )
    }

    fn update_number(&self) -> u64 {
        self.update_number
    }
}
