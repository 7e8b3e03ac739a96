//! In-memory link graph store.
//!
//! Holds per-cargo graphs of stations with sparse edge rows, the jobs that
//! recalculate them in the background and the scheduler queue.

mod edge;
mod graph;
mod job;
mod node;
mod state;

/// Edge statistics and update modes.
pub use edge::{Edge, EdgeUpdateMode};

/// The graph store itself.
pub use graph::{EdgeRow, LinkGraph, MAX_NODES};

/// Background recalculation jobs and their captured settings.
pub use job::{DistributionType, LinkGraphJob, LinkGraphSettings};

/// Graph vertices.
pub use node::Node;

/// Registry of graphs, jobs and the scheduler queue.
pub use state::{LinkGraphSchedule, LinkGraphState};
