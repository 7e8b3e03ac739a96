use linkgraph_overlay::codec::chunk::encode_array;
use linkgraph_overlay::codec::{
    append_raw_chunk, decode_link_graph, encode_schedule, load_state, read_file, relocate_nodes,
    save_state, write_file, ChunkTag, SaveReader, SaveVersion, SaveWriter, MAGIC,
};
use linkgraph_overlay::storage::{
    LinkGraph, LinkGraphJob, LinkGraphSchedule, LinkGraphSettings, LinkGraphState,
};
use linkgraph_overlay::types::{CargoId, Date, LinkGraphId, NodeId, StationId, TileIndex};
use linkgraph_overlay::LinkGraphError;
use tempfile::tempdir;

const DENSE: SaveVersion = SaveVersion(186);
const NO_EDGE: u16 = 0xFFFF;

struct EdgeRec {
    capacity: u32,
    usage: u32,
    next: u16,
}

impl EdgeRec {
    const fn empty(next: u16) -> Self {
        Self {
            capacity: 0,
            usage: 0,
            next,
        }
    }
}

fn put_header(w: &mut SaveWriter, nodes: u16) {
    w.put_i32(0);
    w.put_u16(nodes);
    w.put_u8(4);
}

fn put_node(w: &mut SaveWriter, station: u16) {
    if w.version().has(SaveVersion::SPARSE_EDGES) {
        w.put_u32(0);
    }
    w.put_u32(0);
    w.put_u32(0);
    w.put_u16(station);
    w.put_i32(3);
}

fn put_edge(w: &mut SaveWriter, e: &EdgeRec) {
    let version = w.version();
    if version.is_before(SaveVersion::SPARSE_EDGES) {
        w.put_null(4);
    }
    w.put_u32(e.capacity);
    w.put_u32(e.usage);
    w.put_i32(if e.capacity > 0 { 7 } else { 0 });
    if version.has(SaveVersion::RESTRICTED_UPDATE) {
        w.put_i32(0);
    }
    if version.has(SaveVersion::TRAVEL_TIME) {
        w.put_u64(0);
    }
    w.put_u16(e.next);
}

fn decode(bytes: &[u8], version: SaveVersion) -> linkgraph_overlay::Result<LinkGraph> {
    let mut r = SaveReader::new(bytes, version);
    let graph = decode_link_graph(&mut r)?;
    assert_eq!(r.remaining(), 0);
    Ok(graph)
}

/// Three nodes; only node 0 -> node 2 carries capacity 5.
fn dense_stream() -> Vec<u8> {
    let mut w = SaveWriter::new(DENSE);
    put_header(&mut w, 3);
    for from in 0..3u16 {
        put_node(&mut w, 10 + from);
        for to in 0..3u16 {
            let rec = if from == 0 && to == 2 {
                EdgeRec {
                    capacity: 5,
                    usage: 2,
                    next: NO_EDGE,
                }
            } else if from == 0 && to == 0 {
                EdgeRec::empty(2)
            } else {
                EdgeRec::empty(NO_EDGE)
            };
            put_edge(&mut w, &rec);
        }
    }
    w.into_vec()
}

fn sparse_stream() -> Vec<u8> {
    let mut w = SaveWriter::new(SaveVersion::CURRENT);
    put_header(&mut w, 3);
    put_node(&mut w, 10);
    put_edge(&mut w, &EdgeRec::empty(2));
    put_edge(
        &mut w,
        &EdgeRec {
            capacity: 5,
            usage: 2,
            next: NO_EDGE,
        },
    );
    for station in [11, 12] {
        put_node(&mut w, station);
        put_edge(&mut w, &EdgeRec::empty(NO_EDGE));
    }
    w.into_vec()
}

#[test]
fn dense_and_sparse_streams_load_the_same_adjacency() {
    let dense = decode(&dense_stream(), DENSE).unwrap();
    let sparse = decode(&sparse_stream(), SaveVersion::CURRENT).unwrap();
    assert_eq!(dense, sparse);

    let row: Vec<(NodeId, u32, u32)> = dense
        .edges_from(NodeId(0))
        .map(|(to, e)| (to, e.capacity, e.usage))
        .collect();
    assert_eq!(row, vec![(NodeId(2), 5, 2)]);
    assert_eq!(dense.edges_from(NodeId(1)).count(), 0);
    assert_eq!(dense.edge(NodeId(2), NodeId(0)).capacity, 0);
    assert_eq!(dense[NodeId(2)].station, StationId(12));
}

#[test]
fn chain_pointing_past_the_node_count_is_corruption() {
    let mut w = SaveWriter::new(SaveVersion::CURRENT);
    put_header(&mut w, 2);
    put_node(&mut w, 1);
    put_edge(&mut w, &EdgeRec::empty(5));
    let err = decode(&w.into_vec(), SaveVersion::CURRENT).unwrap_err();
    assert!(err.is_corruption());
    assert!(err.to_string().contains("link graph structure overflow"));
}

#[test]
fn truncated_stream_is_corruption() {
    let bytes = sparse_stream();
    let err = decode(&bytes[..bytes.len() - 3], SaveVersion::CURRENT).unwrap_err();
    assert!(err.is_corruption());
}

fn sample_state() -> LinkGraphState {
    let mut state = LinkGraphState::default();
    let mut graph = LinkGraph::new(CargoId(1));
    for i in 0..4u16 {
        graph
            .add_node(StationId(20 + i), TileIndex::default(), Date(2))
            .unwrap();
    }
    // ascending targets so the dense layout reproduces the row order
    graph.add_edge(NodeId(0), NodeId(1), 9, 3, 0, Date(5)).unwrap();
    graph.add_edge(NodeId(0), NodeId(3), 4, 4, 0, Date(5)).unwrap();
    graph.add_edge(NodeId(2), NodeId(0), 1, 0, 0, Date(6)).unwrap();
    let id = state.insert_graph(graph.clone()).unwrap();
    state
        .insert_job(LinkGraphJob::spawn(id, &graph, LinkGraphSettings::default(), Date(8)))
        .unwrap();
    state.schedule.queue(id);
    state
}

#[test]
fn legacy_file_converts_to_sparse_without_loss() {
    let state = sample_state();
    let legacy = save_state(&state, DENSE).unwrap();
    let loaded = load_state(&legacy).unwrap();
    assert_eq!(loaded.version, DENSE);
    assert_eq!(loaded.state, state);

    let current = save_state(&loaded.state, SaveVersion::CURRENT).unwrap();
    assert!(current.len() < legacy.len());
    assert_eq!(load_state(&current).unwrap().state, state);
}

#[test]
fn legacy_locations_are_rederived_after_load() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("legacy.lgs");
    write_file(&path, &sample_state(), SaveVersion(190)).unwrap();

    let mut loaded = read_file(&path).unwrap();
    let locate = |station: StationId| match station.0 {
        20 => Some(TileIndex::from_xy(1, 2)),
        22 => Some(TileIndex::from_xy(3, 4)),
        _ => None,
    };
    let updated = relocate_nodes(&mut loaded.state, loaded.version, &locate);
    assert_eq!(updated, 4);

    let graph = loaded.state.graph(LinkGraphId(0)).unwrap();
    assert_eq!(graph[NodeId(0)].location, TileIndex::from_xy(1, 2));
    assert_eq!(graph[NodeId(2)].location, TileIndex::from_xy(3, 4));
    assert_eq!(graph[NodeId(1)].location, TileIndex::default());

    let job = loaded.state.jobs.values().next().unwrap();
    assert_eq!(job.graph[NodeId(2)].location, TileIndex::from_xy(3, 4));

    // current streams carry locations already
    let mut current = load_state(&save_state(&sample_state(), SaveVersion::CURRENT).unwrap()).unwrap();
    assert_eq!(relocate_nodes(&mut current.state, current.version, &locate), 0);
}

#[test]
fn flipped_byte_fails_the_checksum() {
    let mut bytes = save_state(&sample_state(), SaveVersion::CURRENT).unwrap();
    let mid = bytes.len() / 2;
    bytes[mid] ^= 0x20;
    let err = load_state(&bytes).unwrap_err();
    assert!(err.is_corruption());
    assert!(err.to_string().contains("checksum"));
}

fn empty_save(version: SaveVersion) -> Vec<u8> {
    let mut bytes = MAGIC.to_vec();
    bytes.extend_from_slice(&version.0.to_be_bytes());
    bytes.extend_from_slice(&[0; 4]);
    bytes
}

#[test]
fn schedule_chunk_with_two_records_is_corruption() {
    let schedules = [LinkGraphSchedule::default(), LinkGraphSchedule::default()];
    let body = encode_array(
        SaveVersion::CURRENT,
        schedules.iter().enumerate().map(|(i, s)| (i as u16, s)),
        encode_schedule,
    )
    .unwrap();
    let mut bytes = empty_save(SaveVersion::CURRENT);
    append_raw_chunk(&mut bytes, ChunkTag::SCHEDULE, &body).unwrap();

    let err = load_state(&bytes).unwrap_err();
    assert!(err.to_string().contains("unexpected excess array entries"));
}

#[test]
fn header_only_save_loads_empty() {
    let mut bytes = empty_save(SaveVersion::CURRENT);
    append_raw_chunk(&mut bytes, ChunkTag(*b"XTRA"), b"future data").unwrap();
    let loaded = load_state(&bytes).unwrap();
    assert!(loaded.state.graphs.is_empty());
    assert_eq!(loaded.state.schedule, LinkGraphSchedule::default());
}

#[test]
fn versions_outside_the_window_are_rejected() {
    let state = sample_state();
    for version in [SaveVersion(149), SaveVersion(SaveVersion::CURRENT.0 + 1)] {
        let err = save_state(&state, version).unwrap_err();
        assert!(matches!(err, LinkGraphError::UnsupportedVersion { .. }));
    }

    let mut bytes = empty_save(SaveVersion(120));
    append_raw_chunk(&mut bytes, ChunkTag(*b"XTRA"), &[]).unwrap();
    let err = load_state(&bytes).unwrap_err();
    assert!(matches!(
        err,
        LinkGraphError::UnsupportedVersion { found: 120, .. }
    ));
}
