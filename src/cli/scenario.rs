//! JSON scenarios: a small world description the `overlay` command builds a
//! [`Network`] and a display surface from.
//!
//! ```json
//! {
//!   "date": 29,
//!   "stations": [{ "id": 1, "owner": 0, "x": 2, "y": 2 }],
//!   "graphs": [{
//!     "cargo": 0,
//!     "nodes": [{ "station": 1, "supply": 30 }],
//!     "edges": [{ "from": 1, "to": 2, "capacity": 100, "usage": 40 }]
//!   }],
//!   "display": { "small_map": { "width": 64, "height": 64 } }
//! }
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use crate::error::{LinkGraphError, Result};
use crate::overlay::{
    DisplaySurface, Network, SmallMapSurface, Station, Viewport, ViewportSurface,
};
use crate::storage::LinkGraph;
use crate::types::{
    CargoId, CargoMask, CompanyId, Date, NodeId, Owner, Point, StationId, TileIndex,
};

/// Parsed scenario file.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Scenario {
    /// Current date in days.
    #[serde(default)]
    pub date: i32,
    /// Defined cargo types; every cargo when absent.
    #[serde(default)]
    pub valid_cargos: Option<u64>,
    /// Stations in any order.
    #[serde(default)]
    pub stations: Vec<StationSpec>,
    /// Link graphs, registered in list order.
    #[serde(default)]
    pub graphs: Vec<GraphSpec>,
    /// Planned flows.
    #[serde(default)]
    pub flows: Vec<FlowSpec>,
    /// Palette index per company.
    #[serde(default)]
    pub company_colours: Vec<CompanyColourSpec>,
    /// Surface the overlay is built for.
    #[serde(default)]
    pub display: DisplaySpec,
}

/// A station entry.
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StationSpec {
    /// Station id.
    pub id: u16,
    /// Owning company, neutral when absent.
    #[serde(default)]
    pub owner: Option<u8>,
    /// Tile column.
    pub x: u16,
    /// Tile row.
    pub y: u16,
    /// Station without any tiles.
    #[serde(default)]
    pub footprint_empty: bool,
}

/// A link graph entry; nodes and edges refer to stations by id.
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GraphSpec {
    /// Cargo the graph tracks.
    pub cargo: u8,
    /// Date of the last decay pass.
    #[serde(default)]
    pub last_compression: i32,
    /// Member stations in node order.
    #[serde(default)]
    pub nodes: Vec<NodeSpec>,
    /// Directed links.
    #[serde(default)]
    pub edges: Vec<EdgeSpec>,
}

/// A graph member.
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NodeSpec {
    /// Member station.
    pub station: u16,
    /// Supply recorded since the last decay pass.
    #[serde(default)]
    pub supply: u32,
    /// Acceptance.
    #[serde(default)]
    pub demand: u32,
}

/// A directed link.
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EdgeSpec {
    /// Source station.
    pub from: u16,
    /// Target station.
    pub to: u16,
    /// Capacity since the last decay pass.
    pub capacity: u32,
    /// Usage since the last decay pass.
    #[serde(default)]
    pub usage: u32,
    /// Travel time of a single trip.
    #[serde(default)]
    pub travel_time: u32,
}

/// Planned flow of one cargo from a station via a next hop.
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FlowSpec {
    /// Station the flow leaves.
    pub station: u16,
    /// Cargo of the flow.
    pub cargo: u8,
    /// Next hop.
    pub via: u16,
    /// Planned amount per month.
    pub amount: u32,
}

/// Colour of a company.
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CompanyColourSpec {
    /// Company index.
    pub company: u8,
    /// Palette index.
    pub colour: u8,
}

/// Surface description.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub enum DisplaySpec {
    /// Scrollable main view.
    Viewport {
        /// Left edge in world pixels.
        #[serde(default)]
        left: i32,
        /// Top edge in world pixels.
        #[serde(default)]
        top: i32,
        /// Width in world pixels.
        width: i32,
        /// Height in world pixels.
        height: i32,
        /// Zoom level.
        #[serde(default)]
        zoom: u8,
    },
    /// Overview map showing everything.
    SmallMap {
        /// Widget width.
        width: i32,
        /// Widget height.
        height: i32,
        /// Screen pixels per tile.
        #[serde(default = "default_pixels_per_tile")]
        pixels_per_tile: i32,
    },
}

fn default_pixels_per_tile() -> i32 {
    1
}

impl Default for DisplaySpec {
    fn default() -> Self {
        DisplaySpec::SmallMap {
            width: 256,
            height: 256,
            pixels_per_tile: 1,
        }
    }
}

/// Either kind of surface a scenario can ask for.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Surface {
    /// Main view.
    Viewport(ViewportSurface),
    /// Overview map.
    SmallMap(SmallMapSurface),
}

impl DisplaySurface for Surface {
    fn viewport(&self) -> Option<Viewport> {
        match self {
            Surface::Viewport(s) => s.viewport(),
            Surface::SmallMap(s) => s.viewport(),
        }
    }

    fn widget_size(&self) -> (i32, i32) {
        match self {
            Surface::Viewport(s) => s.widget_size(),
            Surface::SmallMap(s) => s.widget_size(),
        }
    }

    fn station_middle(&self, station: &Station) -> Point {
        match self {
            Surface::Viewport(s) => s.station_middle(station),
            Surface::SmallMap(s) => s.station_middle(station),
        }
    }

    fn tile_point(&self, tile: TileIndex) -> Point {
        match self {
            Surface::Viewport(s) => s.tile_point(tile),
            Surface::SmallMap(s) => s.tile_point(tile),
        }
    }

    fn update_number(&self) -> u64 {
        match self {
            Surface::Viewport(s) => s.update_number(),
            Surface::SmallMap(s) => s.update_number(),
        }
    }
}

impl Scenario {
    /// Reads a scenario from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        serde_json::from_str(&text).map_err(|err| {
            LinkGraphError::invalid(format!("malformed scenario {}: {err}", path.display()))
        })
    }

    /// Parses a scenario from JSON text.
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text)
            .map_err(|err| LinkGraphError::invalid(format!("malformed scenario: {err}")))
    }

    /// Builds the world described by the scenario.
    pub fn network(&self) -> Result<Network> {
        let date = Date(self.date);
        let mut net = Network::new(date);
        if let Some(bits) = self.valid_cargos {
            net.valid_cargos = CargoMask(bits);
        }
        for entry in &self.company_colours {
            net.company_colours
                .insert(company(entry.company)?, entry.colour);
        }
        for spec in &self.stations {
            let owner = match spec.owner {
                Some(id) => Owner::Company(company(id)?),
                None => Owner::Neutral,
            };
            let mut st = Station::new(StationId(spec.id), owner, TileIndex::from_xy(spec.x, spec.y));
            st.footprint_empty = spec.footprint_empty;
            net.insert_station(st);
        }

        for spec in &self.graphs {
            let cargo = cargo(spec.cargo)?;
            let mut graph = LinkGraph::new(cargo);
            graph.set_last_compression(Date(spec.last_compression));
            let id = net.state.insert_graph(graph)?;

            let mut nodes: BTreeMap<u16, NodeId> = BTreeMap::new();
            for member in &spec.nodes {
                if nodes.contains_key(&member.station) {
                    return Err(LinkGraphError::invalid(format!(
                        "station {} listed twice in graph {id}",
                        member.station
                    )));
                }
                let node = net.join_graph(StationId(member.station), cargo, id)?;
                nodes.insert(member.station, node);
                if let Some(n) = net.state.graph_mut(id).and_then(|g| g.node_mut(node)) {
                    n.update_supply(member.supply, date);
                    n.set_demand(member.demand);
                }
            }

            let node_of = |station: u16| {
                nodes.get(&station).copied().ok_or_else(|| {
                    LinkGraphError::invalid(format!("station {station} is not a member of graph {id}"))
                })
            };
            for edge in &spec.edges {
                let (from, to) = (node_of(edge.from)?, node_of(edge.to)?);
                let graph = net
                    .state
                    .graph_mut(id)
                    .ok_or_else(|| LinkGraphError::invalid(format!("unknown link graph {id}")))?;
                graph.add_edge(from, to, edge.capacity, edge.usage, edge.travel_time, date)?;
            }
        }

        for flow in &self.flows {
            let cargo = cargo(flow.cargo)?;
            let st = net
                .stations
                .get_mut(&StationId(flow.station))
                .ok_or_else(|| LinkGraphError::invalid(format!("unknown station {}", flow.station)))?;
            let goods = st.goods.get_mut(&cargo).ok_or_else(|| {
                LinkGraphError::invalid(format!(
                    "station {} has no link graph for cargo {cargo}",
                    flow.station
                ))
            })?;
            goods.flows.insert(StationId(flow.via), flow.amount);
        }

        debug!(
            stations = net.stations.len(),
            graphs = net.state.graphs.len(),
            "cli.scenario.network"
        );
        Ok(net)
    }

    /// Builds the display surface described by the scenario.
    pub fn surface(&self) -> Surface {
        match self.display {
            DisplaySpec::Viewport {
                left,
                top,
                width,
                height,
                zoom,
            } => Surface::Viewport(ViewportSurface::new(Viewport {
                virtual_left: left,
                virtual_top: top,
                virtual_width: width,
                virtual_height: height,
                zoom,
            })),
            DisplaySpec::SmallMap {
                width,
                height,
                pixels_per_tile,
            } => Surface::SmallMap(SmallMapSurface::new(width, height, pixels_per_tile)),
        }
    }
}

fn company(id: u8) -> Result<CompanyId> {
    if id >= CompanyId::MAX {
        return Err(LinkGraphError::invalid(format!("company {id} out of range")));
    }
    Ok(CompanyId(id))
}

fn cargo(id: u8) -> Result<CargoId> {
    if id >= CargoId::MAX {
        return Err(LinkGraphError::invalid(format!("cargo {id} out of range")));
    }
    Ok(CargoId(id))
}
