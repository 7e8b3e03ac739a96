//! Save file container: magic, version, tagged chunks and a CRC trailer.
//!
//! ```text
//! "LGSV" | version:u16 | { tag:[u8;4] | len:u32 | body }* | crc32:u32
//! ```
//!
//! The CRC covers every byte before it. Unknown chunks are skipped so newer
//! writers can add chunks without breaking older readers.

use std::fs;
use std::path::Path;

use tracing::{info, warn};

use super::chunk::{decode_array, decode_single, encode_array, encode_single, ChunkTag};
use super::graph::{decode_link_graph, encode_link_graph};
use super::job::{decode_job, decode_schedule, encode_job, encode_schedule};
use super::version::SaveVersion;
use super::wire::{SaveReader, SaveWriter};
use crate::error::{LinkGraphError, Result};
use crate::storage::LinkGraphState;
use crate::types::{JobId, LinkGraphId};

/// File signature.
pub const MAGIC: [u8; 4] = *b"LGSV";

const HEADER_LEN: usize = 6;
const TRAILER_LEN: usize = 4;

/// A decoded save together with the version it was written at.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoadedState {
    /// Version of the stream; drives after-load fix-ups.
    pub version: SaveVersion,
    /// Graphs, jobs and scheduler queue.
    pub state: LinkGraphState,
}

/// Serializes `state` at `version`.
pub fn save_state(state: &LinkGraphState, version: SaveVersion) -> Result<Vec<u8>> {
    version.check_supported()?;

    let graphs = encode_array(
        version,
        state.graphs.iter().map(|(id, g)| (id.0, g)),
        encode_link_graph,
    )?;
    let jobs = encode_array(
        version,
        state.jobs.iter().map(|(id, j)| (id.0, j)),
        encode_job,
    )?;
    let schedule = encode_single(version, &state.schedule, encode_schedule)?;

    let mut w = SaveWriter::new(version);
    w.put_slice(&MAGIC);
    w.put_u16(version.0);
    for (tag, body) in [
        (ChunkTag::GRAPHS, &graphs),
        (ChunkTag::JOBS, &jobs),
        (ChunkTag::SCHEDULE, &schedule),
    ] {
        w.put_slice(&tag.0);
        w.put_len_prefixed(body)?;
    }
    let crc = crc32fast::hash(w.as_slice());
    w.put_u32(crc);

    info!(
        %version,
        graphs = state.graphs.len(),
        jobs = state.jobs.len(),
        bytes = w.len(),
        "codec.save"
    );
    Ok(w.into_vec())
}

/// Parses a save produced by [`save_state`] at any supported version.
pub fn load_state(bytes: &[u8]) -> Result<LoadedState> {
    if bytes.len() < HEADER_LEN + TRAILER_LEN {
        return Err(LinkGraphError::corrupt("save file truncated"));
    }
    let (content, trailer) = bytes.split_at(bytes.len() - TRAILER_LEN);
    let stored = u32::from_be_bytes([trailer[0], trailer[1], trailer[2], trailer[3]]);
    let actual = crc32fast::hash(content);
    if stored != actual {
        return Err(LinkGraphError::corrupt(format!(
            "checksum mismatch (stored {stored:#010x}, computed {actual:#010x})"
        )));
    }
    if content[..MAGIC.len()] != MAGIC {
        return Err(LinkGraphError::corrupt("not a link graph save"));
    }

    let mut r = SaveReader::new(&content[MAGIC.len()..], SaveVersion::CURRENT);
    let version = SaveVersion(r.get_u16()?);
    version.check_supported()?;

    let mut state = LinkGraphState::default();
    let mut seen = Vec::new();
    while r.remaining() > 0 {
        let raw = r.take(4)?;
        let tag = ChunkTag([raw[0], raw[1], raw[2], raw[3]]);
        let body = r.take_len_prefixed()?;
        if seen.contains(&tag) {
            return Err(LinkGraphError::corrupt(format!("duplicate chunk {tag}")));
        }
        seen.push(tag);
        match tag {
            ChunkTag::GRAPHS => {
                for (index, graph) in decode_array(body, version, "link graph", decode_link_graph)? {
                    state.graphs.insert(LinkGraphId(index), graph);
                }
            }
            ChunkTag::JOBS => {
                for (index, job) in decode_array(body, version, "link graph job", decode_job)? {
                    state.jobs.insert(JobId(index), job);
                }
            }
            ChunkTag::SCHEDULE => {
                if let Some(schedule) = decode_single(body, version, "schedule", decode_schedule)? {
                    state.schedule = schedule;
                }
            }
            other => warn!(tag = %other, len = body.len(), "codec.load.unknown_chunk"),
        }
    }

    info!(
        %version,
        graphs = state.graphs.len(),
        jobs = state.jobs.len(),
        "codec.load"
    );
    Ok(LoadedState { version, state })
}

/// Writes `state` to `path` at `version`.
pub fn write_file(path: impl AsRef<Path>, state: &LinkGraphState, version: SaveVersion) -> Result<()> {
    let bytes = save_state(state, version)?;
    fs::write(path, bytes)?;
    Ok(())
}

/// Reads a save file from `path`.
pub fn read_file(path: impl AsRef<Path>) -> Result<LoadedState> {
    let bytes = fs::read(path)?;
    load_state(&bytes)
}

/// Appends a raw chunk and refreshes the CRC trailer of a serialized save.
///
/// Used to produce files carrying chunks this build does not know about.
pub fn append_raw_chunk(bytes: &mut Vec<u8>, tag: ChunkTag, body: &[u8]) -> Result<()> {
    if bytes.len() < HEADER_LEN + TRAILER_LEN {
        return Err(LinkGraphError::invalid("not a serialized save"));
    }
    bytes.truncate(bytes.len() - TRAILER_LEN);
    let len = u32::try_from(body.len())
        .map_err(|_| LinkGraphError::invalid("chunk larger than u32::MAX bytes"))?;
    bytes.extend_from_slice(&tag.0);
    bytes.extend_from_slice(&len.to_be_bytes());
    bytes.extend_from_slice(body);
    let crc = crc32fast::hash(bytes);
    bytes.extend_from_slice(&crc.to_be_bytes());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{LinkGraph, LinkGraphJob, LinkGraphSettings};
    use crate::types::{CargoId, Date, StationId, TileIndex};

    fn sample_state() -> LinkGraphState {
        let mut state = LinkGraphState::default();
        let mut lg = LinkGraph::new(CargoId(1));
        let a = lg.add_node(StationId(1), TileIndex::from_xy(3, 4), Date(0)).unwrap();
        let b = lg.add_node(StationId(2), TileIndex::from_xy(9, 4), Date(0)).unwrap();
        lg.add_edge(a, b, 30, 10, 40, Date(2)).unwrap();
        let id = state.insert_graph(lg.clone()).unwrap();
        state.schedule.queue(id);
        state
            .insert_job(LinkGraphJob::spawn(id, &lg, LinkGraphSettings::default(), Date(2)))
            .unwrap();
        state
    }

    #[test]
    fn state_survives_save_and_load() {
        let state = sample_state();
        let bytes = save_state(&state, SaveVersion::CURRENT).unwrap();
        let loaded = load_state(&bytes).unwrap();
        assert_eq!(loaded.version, SaveVersion::CURRENT);
        assert_eq!(loaded.state, state);
    }

    #[test]
    fn flipped_byte_fails_checksum() {
        let mut bytes = save_state(&sample_state(), SaveVersion::CURRENT).unwrap();
        bytes[10] ^= 0x40;
        let err = load_state(&bytes).unwrap_err();
        assert!(err.to_string().contains("checksum mismatch"));
    }

    #[test]
    fn unknown_chunk_is_skipped() {
        let state = sample_state();
        let mut bytes = save_state(&state, SaveVersion::CURRENT).unwrap();
        append_raw_chunk(&mut bytes, ChunkTag(*b"ZZZZ"), &[1, 2, 3]).unwrap();
        assert_eq!(load_state(&bytes).unwrap().state, state);
    }

    #[test]
    fn duplicate_chunk_is_corruption() {
        let mut bytes = save_state(&LinkGraphState::default(), SaveVersion::CURRENT).unwrap();
        let schedule = encode_single(
            SaveVersion::CURRENT,
            &crate::storage::LinkGraphSchedule::default(),
            encode_schedule,
        )
        .unwrap();
        append_raw_chunk(&mut bytes, ChunkTag::SCHEDULE, &schedule).unwrap();
        assert!(load_state(&bytes).unwrap_err().is_corruption());
    }

    #[test]
    fn future_version_is_rejected() {
        let mut bytes = save_state(&LinkGraphState::default(), SaveVersion::CURRENT).unwrap();
        bytes[4..6].copy_from_slice(&(SaveVersion::CURRENT.0 + 1).to_be_bytes());
        let len = bytes.len();
        bytes.truncate(len - TRAILER_LEN);
        let crc = crc32fast::hash(&bytes);
        bytes.extend_from_slice(&crc.to_be_bytes());
        assert!(matches!(
            load_state(&bytes).unwrap_err(),
            LinkGraphError::UnsupportedVersion { found, .. } if found == SaveVersion::CURRENT.0 + 1
        ));
    }

    #[test]
    fn files_round_trip_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("graphs.lgs");
        let state = sample_state();
        write_file(&path, &state, SaveVersion(190)).unwrap();
        let loaded = read_file(&path).unwrap();
        assert_eq!(loaded.version, SaveVersion(190));
        assert_eq!(loaded.state.graphs.len(), 1);
    }
}
