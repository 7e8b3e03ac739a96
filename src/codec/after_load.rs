//! Fix-ups applied once a whole save has been read.

use tracing::{debug, trace};

use super::version::SaveVersion;
use crate::storage::{LinkGraph, LinkGraphState};
use crate::types::{NodeId, StationId, TileIndex};

/// Resolves a station to its current tile.
pub trait StationLocator {
    /// Location of `station`, or `None` if it no longer exists.
    fn station_location(&self, station: StationId) -> Option<TileIndex>;
}

impl<F> StationLocator for F
where
    F: Fn(StationId) -> Option<TileIndex>,
{
    fn station_location(&self, station: StationId) -> Option<TileIndex> {
        self(station)
    }
}

/// Streams older than [`SaveVersion::SPARSE_EDGES`] carry no node locations;
/// re-derive them from the owning stations, in live graphs and in job
/// snapshots alike. Returns the number of nodes that were updated.
pub fn relocate_nodes<L>(state: &mut LinkGraphState, version: SaveVersion, locator: &L) -> usize
where
    L: StationLocator + ?Sized,
{
    if version.has(SaveVersion::SPARSE_EDGES) {
        return 0;
    }
    let mut updated = 0;
    for graph in state.graphs.values_mut() {
        updated += relocate_graph(graph, locator);
    }
    for job in state.jobs.values_mut() {
        updated += relocate_graph(&mut job.graph, locator);
    }
    debug!(%version, updated, "codec.after_load.relocate");
    updated
}

fn relocate_graph<L>(graph: &mut LinkGraph, locator: &L) -> usize
where
    L: StationLocator + ?Sized,
{
    let mut updated = 0;
    for index in 0..graph.size() {
        let Some(node) = graph.node_mut(NodeId(index as u16)) else {
            continue;
        };
        match locator.station_location(node.station) {
            Some(tile) => {
                node.update_location(tile);
                updated += 1;
            }
            None => trace!(station = node.station.0, "codec.after_load.missing_station"),
        }
    }
    updated
}
