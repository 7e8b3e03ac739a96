use std::ops::Index;

use smallvec::SmallVec;
use tracing::trace;

use super::edge::{Edge, EdgeUpdateMode, EMPTY_EDGE};
use super::node::Node;
use crate::error::{LinkGraphError, Result};
use crate::types::{CargoId, Date, NodeId, StationId, TileIndex};

/// Outgoing edges of one node in insertion order.
pub type EdgeRow = SmallVec<[(NodeId, Edge); 4]>;

/// Largest node count representable by the persisted `u16` node ids.
pub const MAX_NODES: usize = NodeId::INVALID.0 as usize;

/// The link graph of one cargo across a connected set of stations.
///
/// Nodes are stored densely; edges are kept as one sparse row per source
/// node so that memory grows with the number of live links rather than with
/// the square of the node count.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LinkGraph {
    cargo: CargoId,
    last_compression: Date,
    nodes: Vec<Node>,
    rows: Vec<EdgeRow>,
}

impl LinkGraph {
    /// Creates an empty graph tracking `cargo`.
    pub fn new(cargo: CargoId) -> Self {
        Self {
            cargo,
            last_compression: Date::default(),
            nodes: Vec::new(),
            rows: Vec::new(),
        }
    }

    /// Cargo tracked by this graph.
    pub fn cargo(&self) -> CargoId {
        self.cargo
    }

    pub(crate) fn set_cargo(&mut self, cargo: CargoId) {
        self.cargo = cargo;
    }

    /// Date of the last capacity decay pass.
    pub fn last_compression(&self) -> Date {
        self.last_compression
    }

    /// Overrides the date of the last capacity decay pass.
    pub fn set_last_compression(&mut self, date: Date) {
        self.last_compression = date;
    }

    /// Number of nodes.
    pub fn size(&self) -> usize {
        self.nodes.len()
    }

    /// True if the graph has no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Resets the graph to `n` default nodes without edges.
    pub fn init(&mut self, n: usize) {
        self.nodes.clear();
        self.nodes.resize_with(n, Node::default);
        self.rows.clear();
        self.rows.resize_with(n, EdgeRow::new);
    }

    /// Node with the given id, if it exists.
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    /// Mutable access to a node.
    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.index())
    }

    /// All nodes in index order.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, node)| (NodeId(i as u16), node))
    }

    /// Appends a node for `station` and returns its id.
    pub fn add_node(&mut self, station: StationId, location: TileIndex, now: Date) -> Result<NodeId> {
        if self.nodes.len() >= MAX_NODES {
            return Err(LinkGraphError::invalid("link graph node limit reached"));
        }
        let id = NodeId(self.nodes.len() as u16);
        self.nodes.push(Node::new(station, location, now));
        self.rows.push(EdgeRow::new());
        Ok(id)
    }

    /// Removes a node, moving the last node into its slot.
    ///
    /// Returns the station whose node id changed together with its new id so
    /// the caller can update its back-reference.
    pub fn remove_node(&mut self, id: NodeId) -> Result<Option<(StationId, NodeId)>> {
        self.check_node(id)?;
        let last = NodeId((self.nodes.len() - 1) as u16);

        for row in &mut self.rows {
            row.retain(|(to, _)| *to != id);
            for (to, _) in row.iter_mut() {
                if *to == last {
                    *to = id;
                }
            }
        }

        self.nodes.swap_remove(id.index());
        self.rows.swap_remove(id.index());

        if id == last {
            return Ok(None);
        }
        let moved = self.nodes[id.index()].station;
        trace!(node = id.0, station = moved.0, "linkgraph.node.relocated");
        Ok(Some((moved, id)))
    }

    /// Statistics of the edge `from -> to`.
    ///
    /// Pairs without an edge yield a zeroed sentinel edge.
    pub fn edge(&self, from: NodeId, to: NodeId) -> &Edge {
        self.rows
            .get(from.index())
            .and_then(|row| row.iter().find(|(target, _)| *target == to))
            .map(|(_, edge)| edge)
            .unwrap_or(&EMPTY_EDGE)
    }

    /// True if `from -> to` carries nonzero capacity.
    pub fn has_edge(&self, from: NodeId, to: NodeId) -> bool {
        self.edge(from, to).is_live()
    }

    /// Adds capacity and usage to the edge `from -> to`, creating it if needed.
    pub fn add_edge(
        &mut self,
        from: NodeId,
        to: NodeId,
        capacity: u32,
        usage: u32,
        travel_time: u32,
        now: Date,
    ) -> Result<()> {
        self.update_edge(from, to, capacity, usage, travel_time, EdgeUpdateMode::Increase, now)
    }

    /// Applies an update to `from -> to`.
    ///
    /// An edge enters the row the first time it receives nonzero capacity and
    /// is appended at the tail, so walks keep insertion order.
    #[allow(clippy::too_many_arguments)]
    pub fn update_edge(
        &mut self,
        from: NodeId,
        to: NodeId,
        capacity: u32,
        usage: u32,
        travel_time: u32,
        mode: EdgeUpdateMode,
        now: Date,
    ) -> Result<()> {
        self.check_node(from)?;
        self.check_node(to)?;
        if from == to {
            return Err(LinkGraphError::invalid("link graph edges cannot loop"));
        }
        let row = &mut self.rows[from.index()];
        if let Some((_, edge)) = row.iter_mut().find(|(target, _)| *target == to) {
            edge.apply(capacity, usage, travel_time, mode, now);
            return Ok(());
        }
        let creates = matches!(mode, EdgeUpdateMode::Increase | EdgeUpdateMode::Refresh);
        if creates && capacity > 0 {
            let mut edge = Edge::default();
            edge.apply(capacity, usage, travel_time, mode, now);
            row.push((to, edge));
        }
        Ok(())
    }

    /// Removes `from -> to`; returns the removed statistics.
    pub fn remove_edge(&mut self, from: NodeId, to: NodeId) -> Option<Edge> {
        let row = self.rows.get_mut(from.index())?;
        let pos = row.iter().position(|(target, _)| *target == to)?;
        Some(row.remove(pos).1)
    }

    /// Calls `f(from, to, edge)` for every live edge leaving `from`, in row order.
    pub fn iterate_edges_from_node<F>(&self, from: NodeId, mut f: F)
    where
        F: FnMut(NodeId, NodeId, &Edge),
    {
        for (to, edge) in self.edges_from(from) {
            f(from, to, edge);
        }
    }

    /// Iterator over the edges leaving `from`, in row order.
    pub fn edges_from(&self, from: NodeId) -> impl Iterator<Item = (NodeId, &Edge)> {
        self.rows
            .get(from.index())
            .into_iter()
            .flat_map(|row| row.iter().map(|(to, edge)| (*to, edge)))
    }

    /// Row of `from`, if the node exists.
    pub fn row(&self, from: NodeId) -> Option<&EdgeRow> {
        self.rows.get(from.index())
    }

    /// Total number of live edges.
    pub fn edge_count(&self) -> usize {
        self.rows.iter().map(|row| row.len()).sum()
    }

    /// Scales a value accumulated since the last compression to a monthly rate.
    pub fn monthly(&self, base: u32, now: Date) -> u32 {
        let span = (now.0 as i64 - self.last_compression.0 as i64 + 1).max(1);
        (base as i64 * 30 / span).min(u32::MAX as i64) as u32
    }

    /// Halves supply and edge statistics so old traffic decays.
    pub fn compress(&mut self, now: Date) {
        self.last_compression = Date((self.last_compression.0 as i64 + now.0 as i64).div_euclid(2) as i32);
        for node in &mut self.nodes {
            node.supply /= 2;
        }
        for row in &mut self.rows {
            for (_, edge) in row.iter_mut() {
                edge.halve();
            }
        }
    }

    pub(crate) fn push_edge_unchecked(&mut self, from: NodeId, to: NodeId, edge: Edge) {
        self.rows[from.index()].push((to, edge));
    }

    pub(crate) fn node_slot(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.index()]
    }

    fn check_node(&self, id: NodeId) -> Result<()> {
        if id.index() >= self.nodes.len() {
            return Err(LinkGraphError::invalid(format!(
                "node {id} out of range (size {})",
                self.nodes.len()
            )));
        }
        Ok(())
    }
}

impl Index<NodeId> for LinkGraph {
    type Output = Node;

    fn index(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph_with(n: u16) -> LinkGraph {
        let mut lg = LinkGraph::new(CargoId(0));
        for i in 0..n {
            lg.add_node(StationId(i * 10), TileIndex::from_xy(i, i), Date(0))
                .unwrap();
        }
        lg
    }

    #[test]
    fn missing_edge_is_zeroed_sentinel() {
        let lg = graph_with(3);
        let edge = lg.edge(NodeId(0), NodeId(2));
        assert_eq!(*edge, Edge::default());
        assert!(!lg.has_edge(NodeId(0), NodeId(2)));
        assert_eq!(lg.edge(NodeId(9), NodeId(0)).capacity, 0);
    }

    #[test]
    fn walk_preserves_insertion_order() {
        let mut lg = graph_with(4);
        lg.add_edge(NodeId(0), NodeId(3), 5, 1, 0, Date(1)).unwrap();
        lg.add_edge(NodeId(0), NodeId(1), 7, 2, 0, Date(1)).unwrap();
        lg.add_edge(NodeId(0), NodeId(2), 9, 3, 0, Date(1)).unwrap();
        lg.add_edge(NodeId(0), NodeId(1), 1, 0, 0, Date(2)).unwrap();

        let mut seen = Vec::new();
        lg.iterate_edges_from_node(NodeId(0), |from, to, edge| {
            assert_eq!(from, NodeId(0));
            seen.push((to.0, edge.capacity));
        });
        assert_eq!(seen, vec![(3, 5), (1, 8), (2, 9)]);
        assert_eq!(lg.edge_count(), 3);
    }

    #[test]
    fn zero_capacity_update_does_not_create_edge() {
        let mut lg = graph_with(2);
        lg.add_edge(NodeId(0), NodeId(1), 0, 4, 0, Date(1)).unwrap();
        lg.update_edge(NodeId(0), NodeId(1), 3, 0, 0, EdgeUpdateMode::Restricted, Date(1))
            .unwrap();
        assert_eq!(lg.edge_count(), 0);
    }

    #[test]
    fn self_loops_and_out_of_range_are_rejected() {
        let mut lg = graph_with(2);
        assert!(lg.add_edge(NodeId(1), NodeId(1), 1, 0, 0, Date(0)).is_err());
        assert!(lg.add_edge(NodeId(0), NodeId(2), 1, 0, 0, Date(0)).is_err());
    }

    #[test]
    fn remove_node_retargets_moved_node() {
        let mut lg = graph_with(4);
        lg.add_edge(NodeId(0), NodeId(3), 5, 0, 0, Date(0)).unwrap();
        lg.add_edge(NodeId(0), NodeId(1), 6, 0, 0, Date(0)).unwrap();
        lg.add_edge(NodeId(3), NodeId(0), 7, 0, 0, Date(0)).unwrap();
        lg.add_edge(NodeId(2), NodeId(1), 8, 0, 0, Date(0)).unwrap();

        let moved = lg.remove_node(NodeId(1)).unwrap();
        assert_eq!(moved, Some((StationId(30), NodeId(1))));
        assert_eq!(lg.size(), 3);
        assert_eq!(lg.edge(NodeId(0), NodeId(1)).capacity, 5);
        assert_eq!(lg.edge(NodeId(1), NodeId(0)).capacity, 7);
        assert_eq!(lg.edges_from(NodeId(2)).count(), 0);
        assert_eq!(lg.edge_count(), 2);
    }

    #[test]
    fn remove_last_node_relocates_nothing() {
        let mut lg = graph_with(2);
        lg.add_edge(NodeId(0), NodeId(1), 5, 0, 0, Date(0)).unwrap();
        assert_eq!(lg.remove_node(NodeId(1)).unwrap(), None);
        assert_eq!(lg.edge_count(), 0);
    }

    #[test]
    fn monthly_scales_by_sampling_window() {
        let mut lg = graph_with(1);
        lg.set_last_compression(Date(100));
        assert_eq!(lg.monthly(100, Date(129)), 100);
        assert_eq!(lg.monthly(100, Date(114)), 200);
        assert_eq!(lg.monthly(100, Date(50)), 3000);
    }

    #[test]
    fn compress_halves_statistics() {
        let mut lg = graph_with(2);
        lg.node_mut(NodeId(0)).unwrap().update_supply(40, Date(0));
        lg.add_edge(NodeId(0), NodeId(1), 1, 1, 10, Date(0)).unwrap();
        lg.compress(Date(60));
        assert_eq!(lg[NodeId(0)].supply, 20);
        let edge = lg.edge(NodeId(0), NodeId(1));
        assert_eq!(edge.capacity, 1);
        assert_eq!(edge.usage, 0);
        assert_eq!(lg.last_compression(), Date(30));
    }
}
