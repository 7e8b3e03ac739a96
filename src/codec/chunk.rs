//! Chunk tags and the indexed-array framing shared by all link graph chunks.

use std::collections::BTreeSet;
use std::fmt;

use super::version::SaveVersion;
use super::wire::{SaveReader, SaveWriter};
use crate::error::{LinkGraphError, Result};

/// Four-byte chunk identifier.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct ChunkTag(pub [u8; 4]);

impl ChunkTag {
    /// Array of link graphs.
    pub const GRAPHS: ChunkTag = ChunkTag(*b"LGRP");
    /// Array of in-flight jobs.
    pub const JOBS: ChunkTag = ChunkTag(*b"LGRJ");
    /// Single scheduler record.
    pub const SCHEDULE: ChunkTag = ChunkTag(*b"LGRS");
}

impl fmt::Display for ChunkTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in self.0 {
            if b.is_ascii_graphic() {
                write!(f, "{}", b as char)?;
            } else {
                write!(f, "\\x{b:02x}")?;
            }
        }
        Ok(())
    }
}

impl fmt::Debug for ChunkTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ChunkTag({self})")
    }
}

/// Frames `entries` as `u32 count` followed by `u16 index, u32 len, payload`
/// for each entry.
pub fn encode_array<'a, T, I, F>(version: SaveVersion, entries: I, mut encode: F) -> Result<Vec<u8>>
where
    T: 'a,
    I: IntoIterator<Item = (u16, &'a T)>,
    F: FnMut(&mut SaveWriter, &T) -> Result<()>,
{
    let entries: Vec<(u16, &T)> = entries.into_iter().collect();
    let count = u32::try_from(entries.len())
        .map_err(|_| LinkGraphError::invalid("too many array entries"))?;
    let mut out = SaveWriter::new(version);
    out.put_u32(count);
    for (index, value) in entries {
        let mut record = SaveWriter::new(version);
        encode(&mut record, value)?;
        out.put_u16(index);
        out.put_len_prefixed(record.as_slice())?;
    }
    Ok(out.into_vec())
}

/// Reads an indexed array, requiring every payload to be consumed exactly
/// and every index to be unique.
pub fn decode_array<T, F>(
    body: &[u8],
    version: SaveVersion,
    what: &str,
    mut decode: F,
) -> Result<Vec<(u16, T)>>
where
    F: FnMut(&mut SaveReader<'_>) -> Result<T>,
{
    let mut r = SaveReader::new(body, version);
    let count = r.get_u32()? as usize;
    let mut seen = BTreeSet::new();
    let mut out = Vec::new();
    for _ in 0..count {
        let index = r.get_u16()?;
        if !seen.insert(index) {
            return Err(LinkGraphError::corrupt(format!(
                "duplicate {what} index {index}"
            )));
        }
        let payload = r.take_len_prefixed()?;
        let mut record = SaveReader::new(payload, version);
        let value = decode(&mut record)?;
        record.ensure_consumed(what)?;
        out.push((index, value));
    }
    r.ensure_consumed(what)?;
    Ok(out)
}

/// Frames a single record as a one-entry array.
pub fn encode_single<T, F>(version: SaveVersion, value: &T, encode: F) -> Result<Vec<u8>>
where
    F: FnMut(&mut SaveWriter, &T) -> Result<()>,
{
    encode_array(version, [(0u16, value)], encode)
}

/// Reads a chunk that holds at most one record.
pub fn decode_single<T, F>(
    body: &[u8],
    version: SaveVersion,
    what: &str,
    decode: F,
) -> Result<Option<T>>
where
    F: FnMut(&mut SaveReader<'_>) -> Result<T>,
{
    let mut entries = decode_array(body, version, what, decode)?;
    if entries.len() > 1 {
        return Err(LinkGraphError::corrupt("unexpected excess array entries"));
    }
    Ok(entries.pop().map(|(_, value)| value))
}
