//! Link graph overlay: a sparse per-cargo link graph store with a versioned
//! save codec, and an incrementally rebuilt spatial cache that decides which
//! stations and links of that graph are drawn on a display surface.

#![warn(missing_docs)]

pub mod cli;
pub mod codec;
pub mod error;
pub mod overlay;
pub mod storage;
pub mod types;

pub use error::{LinkGraphError, Result};
