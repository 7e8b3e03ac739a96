//! Per-graph record: header, node records and each node's edge list.
//!
//! Every function receives the graph and the node it works on explicitly.
//! The edge layout is chosen once per call from the stream version and
//! dispatched to either the dense or the sparse routine.

use tracing::trace;

use super::version::{EdgeFormat, SaveVersion};
use super::wire::{SaveReader, SaveWriter};
use crate::error::{LinkGraphError, Result};
use crate::storage::{Edge, LinkGraph};
use crate::types::{CargoId, Date, NodeId, StationId, TileIndex};

/// Size of the distance field carried by pre-sparse edge records.
const LEGACY_DISTANCE_LEN: usize = 4;

/// Writes `graph` in the layout required by the writer's version.
pub fn encode_link_graph(w: &mut SaveWriter, graph: &LinkGraph) -> Result<()> {
    let count = u16::try_from(graph.size())
        .map_err(|_| LinkGraphError::invalid("too many nodes to serialize"))?;
    w.put_i32(graph.last_compression().0);
    w.put_u16(count);
    w.put_u8(graph.cargo().0);

    let format = EdgeFormat::for_version(w.version());
    for (from, _) in graph.nodes() {
        encode_node(w, graph, from);
        match format {
            EdgeFormat::Dense => encode_edges_dense(w, graph, from),
            EdgeFormat::Sparse => encode_edges_sparse(w, graph, from),
        }
    }
    Ok(())
}

/// Reads one graph record.
pub fn decode_link_graph(r: &mut SaveReader<'_>) -> Result<LinkGraph> {
    let last_compression = Date(r.get_i32()?);
    let count = r.get_u16()? as usize;
    let cargo = CargoId(r.get_u8()?);
    if cargo.0 >= CargoId::MAX {
        return Err(LinkGraphError::corrupt(format!(
            "link graph cargo {cargo} out of range"
        )));
    }

    let mut graph = LinkGraph::new(cargo);
    graph.set_last_compression(last_compression);
    graph.init(count);

    let format = EdgeFormat::for_version(r.version());
    for index in 0..count {
        let from = NodeId(index as u16);
        decode_node(r, &mut graph, from)?;
        match format {
            EdgeFormat::Dense => decode_edges_dense(r, &mut graph, from, count)?,
            EdgeFormat::Sparse => decode_edges_sparse(r, &mut graph, from, count)?,
        }
    }
    trace!(
        cargo = cargo.0,
        nodes = count,
        edges = graph.edge_count(),
        ?format,
        "codec.load.graph"
    );
    Ok(graph)
}

fn encode_node(w: &mut SaveWriter, graph: &LinkGraph, from: NodeId) {
    let node = &graph[from];
    if w.version().has(SaveVersion::SPARSE_EDGES) {
        w.put_u32(node.location.0);
    }
    w.put_u32(node.supply);
    w.put_u32(node.demand);
    w.put_u16(node.station.0);
    w.put_i32(node.last_update.0);
}

fn decode_node(r: &mut SaveReader<'_>, graph: &mut LinkGraph, from: NodeId) -> Result<()> {
    let location = if r.version().has(SaveVersion::SPARSE_EDGES) {
        TileIndex(r.get_u32()?)
    } else {
        TileIndex::default()
    };
    let node = graph.node_slot(from);
    node.location = location;
    node.supply = r.get_u32()?;
    node.demand = r.get_u32()?;
    node.station = StationId(r.get_u16()?);
    node.last_update = Date(r.get_i32()?);
    Ok(())
}

fn encode_edge(w: &mut SaveWriter, edge: &Edge, next: NodeId) {
    let version = w.version();
    if version.is_before(SaveVersion::SPARSE_EDGES) {
        w.put_null(LEGACY_DISTANCE_LEN);
    }
    w.put_u32(edge.capacity);
    w.put_u32(edge.usage);
    w.put_i32(edge.last_unrestricted_update.0);
    if version.has(SaveVersion::RESTRICTED_UPDATE) {
        w.put_i32(edge.last_restricted_update.0);
    }
    if version.has(SaveVersion::TRAVEL_TIME) {
        w.put_u64(edge.travel_time_sum);
    }
    w.put_u16(next.0);
}

fn decode_edge(r: &mut SaveReader<'_>) -> Result<(Edge, NodeId)> {
    let version = r.version();
    if version.is_before(SaveVersion::SPARSE_EDGES) {
        r.skip(LEGACY_DISTANCE_LEN)?;
    }
    let mut edge = Edge {
        capacity: r.get_u32()?,
        usage: r.get_u32()?,
        last_unrestricted_update: Date(r.get_i32()?),
        ..Edge::default()
    };
    if version.has(SaveVersion::RESTRICTED_UPDATE) {
        edge.last_restricted_update = Date(r.get_i32()?);
    }
    if version.has(SaveVersion::TRAVEL_TIME) {
        edge.travel_time_sum = r.get_u64()?;
    }
    let next = NodeId(r.get_u16()?);
    Ok((edge, next))
}

/// Writes the node's own slot as chain head, then every live edge in row order.
fn encode_edges_sparse(w: &mut SaveWriter, graph: &LinkGraph, from: NodeId) {
    let row = graph.row(from).map(|row| row.as_slice()).unwrap_or(&[]);
    let head_next = row.first().map(|(to, _)| *to).unwrap_or(NodeId::INVALID);
    encode_edge(w, &Edge::default(), head_next);
    for (i, (_, edge)) in row.iter().enumerate() {
        let next = row.get(i + 1).map(|(to, _)| *to).unwrap_or(NodeId::INVALID);
        encode_edge(w, edge, next);
    }
}

/// Follows the chain from the node's own slot until the terminator. Each
/// target may appear once; a repeat, the head included, is a cycle.
fn decode_edges_sparse(
    r: &mut SaveReader<'_>,
    graph: &mut LinkGraph,
    from: NodeId,
    count: usize,
) -> Result<()> {
    let mut seen = vec![false; count];
    let mut to = from;
    while to != NodeId::INVALID {
        let Some(slot) = seen.get_mut(to.index()) else {
            return Err(LinkGraphError::corrupt("link graph structure overflow"));
        };
        if *slot {
            return Err(LinkGraphError::corrupt("link graph edge chain cycle"));
        }
        *slot = true;
        let (edge, next) = decode_edge(r)?;
        if to != from {
            graph.push_edge_unchecked(from, to, edge);
        }
        to = next;
    }
    Ok(())
}

/// Writes a record for every target; `next_edge` links live targets in
/// ascending order the way old streams did.
fn encode_edges_dense(w: &mut SaveWriter, graph: &LinkGraph, from: NodeId) {
    let mut live: Vec<NodeId> = graph.edges_from(from).map(|(to, _)| to).collect();
    live.sort_unstable();
    let next_after = |slot: NodeId| {
        live.iter()
            .copied()
            .find(|to| *to > slot)
            .unwrap_or(NodeId::INVALID)
    };
    for index in 0..graph.size() {
        let to = NodeId(index as u16);
        if to == from {
            let head = live.first().copied().unwrap_or(NodeId::INVALID);
            encode_edge(w, &Edge::default(), head);
            continue;
        }
        let edge = graph.edge(from, to);
        let next = if edge.is_live() {
            next_after(to)
        } else {
            NodeId::INVALID
        };
        encode_edge(w, edge, next);
    }
}

/// Reads exactly `count` records; live ones become the row in target order.
fn decode_edges_dense(
    r: &mut SaveReader<'_>,
    graph: &mut LinkGraph,
    from: NodeId,
    count: usize,
) -> Result<()> {
    for index in 0..count {
        let to = NodeId(index as u16);
        let (edge, _) = decode_edge(r)?;
        if to != from && edge.is_live() {
            graph.push_edge_unchecked(from, to, edge);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_graph() -> LinkGraph {
        let mut lg = LinkGraph::new(CargoId(3));
        lg.set_last_compression(Date(-40));
        for i in 0..4u16 {
            lg.add_node(StationId(100 + i), TileIndex::from_xy(i, 2 * i), Date(i as i32))
                .unwrap();
        }
        lg.node_mut(NodeId(1)).unwrap().update_supply(77, Date(9));
        lg.add_edge(NodeId(0), NodeId(2), 5, 1, 12, Date(3)).unwrap();
        lg.add_edge(NodeId(0), NodeId(1), 8, 2, 4, Date(3)).unwrap();
        lg.add_edge(NodeId(3), NodeId(0), 1, 1, 0, Date(4)).unwrap();
        lg
    }

    fn round_trip(graph: &LinkGraph, version: SaveVersion) -> LinkGraph {
        let mut w = SaveWriter::new(version);
        encode_link_graph(&mut w, graph).unwrap();
        let bytes = w.into_vec();
        let mut r = SaveReader::new(&bytes, version);
        let decoded = decode_link_graph(&mut r).unwrap();
        r.ensure_consumed("graph").unwrap();
        decoded
    }

    #[test]
    fn sparse_stream_keeps_row_order() {
        let graph = sample_graph();
        let decoded = round_trip(&graph, SaveVersion::CURRENT);
        assert_eq!(decoded, graph);
        let order: Vec<u16> = decoded.edges_from(NodeId(0)).map(|(to, _)| to.0).collect();
        assert_eq!(order, vec![2, 1]);
    }

    #[test]
    fn dense_stream_sorts_rows_and_drops_gated_fields() {
        let graph = sample_graph();
        let decoded = round_trip(&graph, SaveVersion(186));
        let order: Vec<u16> = decoded.edges_from(NodeId(0)).map(|(to, _)| to.0).collect();
        assert_eq!(order, vec![1, 2]);
        assert_eq!(decoded[NodeId(2)].location, TileIndex::default());
        assert_eq!(decoded.edge(NodeId(0), NodeId(2)).travel_time_sum, 0);
        assert_eq!(decoded.edge(NodeId(0), NodeId(2)).capacity, 5);
        assert_eq!(decoded[NodeId(1)].supply, 77);
    }

    #[test]
    fn sparse_stream_is_smaller_than_dense() {
        let graph = sample_graph();
        let mut dense = SaveWriter::new(SaveVersion(190));
        encode_link_graph(&mut dense, &graph).unwrap();
        let mut sparse = SaveWriter::new(SaveVersion(191));
        encode_link_graph(&mut sparse, &graph).unwrap();
        assert!(sparse.len() < dense.len());
    }

    #[test]
    fn chain_target_beyond_node_count_is_corruption() {
        let mut w = SaveWriter::new(SaveVersion::SPARSE_EDGES);
        w.put_i32(0);
        w.put_u16(1);
        w.put_u8(0);
        w.put_u32(0);
        w.put_u32(0);
        w.put_u32(0);
        w.put_u16(7);
        w.put_i32(0);
        // head slot pointing at node 5 of a one-node graph
        w.put_u32(0);
        w.put_u32(0);
        w.put_i32(0);
        w.put_i32(0);
        w.put_u16(5);
        let bytes = w.into_vec();
        let mut r = SaveReader::new(&bytes, SaveVersion::SPARSE_EDGES);
        let err = decode_link_graph(&mut r).unwrap_err();
        assert!(err.to_string().contains("link graph structure overflow"));
    }

    #[test]
    fn cyclic_chain_is_corruption() {
        let mut w = SaveWriter::new(SaveVersion::SPARSE_EDGES);
        w.put_i32(0);
        w.put_u16(2);
        w.put_u8(0);
        w.put_u32(0);
        w.put_u32(0);
        w.put_u32(0);
        w.put_u16(1);
        w.put_i32(0);
        // node 0 head -> 1, 1 -> 1 forever
        for next in [1u16, 1, 1] {
            w.put_u32(1);
            w.put_u32(0);
            w.put_i32(0);
            w.put_i32(0);
            w.put_u16(next);
        }
        let bytes = w.into_vec();
        let mut r = SaveReader::new(&bytes, SaveVersion::SPARSE_EDGES);
        let err = decode_link_graph(&mut r).unwrap_err();
        assert!(err.is_corruption());
    }

    fn chain_stream(nodes: u16, chain: &[(u32, u16)]) -> Vec<u8> {
        let mut w = SaveWriter::new(SaveVersion::CURRENT);
        w.put_i32(0);
        w.put_u16(nodes);
        w.put_u8(0);
        for station in 0..nodes {
            w.put_u32(0);
            w.put_u32(0);
            w.put_u32(0);
            w.put_u16(station);
            w.put_i32(0);
            let records: &[(u32, u16)] = if station == 0 { chain } else { &[(0, u16::MAX)] };
            for &(capacity, next) in records {
                w.put_u32(capacity);
                w.put_u32(0);
                w.put_i32(0);
                w.put_i32(0);
                w.put_u64(0);
                w.put_u16(next);
            }
        }
        w.into_vec()
    }

    #[test]
    fn repeated_chain_target_is_corruption() {
        // head -> 1, 1 -> 1 again, then terminator
        let bytes = chain_stream(3, &[(0, 1), (5, 1), (7, u16::MAX)]);
        let mut r = SaveReader::new(&bytes, SaveVersion::CURRENT);
        let err = decode_link_graph(&mut r).unwrap_err();
        assert!(err.to_string().contains("link graph edge chain cycle"));
    }

    #[test]
    fn chain_returning_to_its_head_is_corruption() {
        let bytes = chain_stream(3, &[(0, 2), (5, 0), (0, u16::MAX)]);
        let mut r = SaveReader::new(&bytes, SaveVersion::CURRENT);
        let err = decode_link_graph(&mut r).unwrap_err();
        assert!(err.to_string().contains("link graph edge chain cycle"));
    }

    #[test]
    fn full_chain_decodes_every_target_once() {
        let bytes = chain_stream(3, &[(0, 2), (5, 1), (7, u16::MAX)]);
        let mut r = SaveReader::new(&bytes, SaveVersion::CURRENT);
        let graph = decode_link_graph(&mut r).unwrap();
        let row: Vec<(u16, u32)> = graph
            .edges_from(NodeId(0))
            .map(|(to, e)| (to.0, e.capacity))
            .collect();
        assert_eq!(row, vec![(2, 5), (1, 7)]);
        assert_eq!(graph.edge_count(), 2);
    }
}
