//! Versioned save codec for link graphs, jobs and the scheduler queue.
//!
//! Streams before [`SaveVersion::SPARSE_EDGES`] store a dense edge matrix per
//! graph; later streams store only the live edge chain of every node. The
//! layout is picked once per record from the stream version.

pub mod after_load;
pub mod chunk;
pub mod file;
pub mod graph;
pub mod job;
pub mod version;
pub mod wire;

pub use after_load::{relocate_nodes, StationLocator};
pub use chunk::ChunkTag;
pub use file::{
    append_raw_chunk, load_state, read_file, save_state, write_file, LoadedState, MAGIC,
};
pub use graph::{decode_link_graph, encode_link_graph};
pub use job::{decode_job, decode_schedule, encode_job, encode_schedule};
pub use version::{EdgeFormat, SaveVersion};
pub use wire::{SaveReader, SaveWriter};
