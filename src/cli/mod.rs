//! Operations behind the `lgo` command line tool.
//!
//! Each command returns a serializable report; the binary decides whether to
//! print it as text or JSON.

pub mod config;
pub mod scenario;

use std::path::Path;

use serde::Serialize;
use tracing::info;

use crate::codec::{read_file, relocate_nodes, write_file, EdgeFormat, SaveVersion};
use crate::error::Result;
use crate::overlay::{
    DisplaySurface, LinkHit, LinkInfo, OverlayCache, OverlayOptions, RebuildKind,
    StationSupplyInfo,
};
use crate::storage::LinkGraph;
use crate::types::{CargoMask, CompanyMask, Point, Rect};

pub use config::{CliConfig, DEFAULT_CONFIG_FILE};
pub use scenario::{Scenario, Surface};

/// Summary of one link graph.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct GraphSummary {
    /// Registry index.
    pub id: u16,
    /// Tracked cargo.
    pub cargo: u8,
    /// Node count.
    pub nodes: usize,
    /// Live edge count.
    pub edges: usize,
    /// Date of the last decay pass.
    pub last_compression: i32,
}

impl GraphSummary {
    fn new(id: u16, graph: &LinkGraph) -> Self {
        Self {
            id,
            cargo: graph.cargo().0,
            nodes: graph.size(),
            edges: graph.edge_count(),
            last_compression: graph.last_compression().0,
        }
    }
}

/// Summary of one running job.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct JobSummary {
    /// Registry index.
    pub id: u16,
    /// Graph the job works on.
    pub link_graph: u16,
    /// Date the result gets merged back.
    pub join_date: i32,
    /// Snapshot of the job's graph.
    pub snapshot: GraphSummary,
}

/// Output of `lgo inspect`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct InspectReport {
    /// Version the file was written at.
    pub version: u16,
    /// Edge layout used by that version.
    pub edge_format: String,
    /// Graphs in registry order.
    pub graphs: Vec<GraphSummary>,
    /// Jobs in registry order.
    pub jobs: Vec<JobSummary>,
    /// Graphs queued for recalculation.
    pub schedule: Vec<u16>,
    /// Jobs currently running.
    pub running: Vec<u16>,
}

/// Loads a save file and summarizes it.
pub fn inspect(path: impl AsRef<Path>) -> Result<InspectReport> {
    let loaded = read_file(path)?;
    let state = &loaded.state;
    Ok(InspectReport {
        version: loaded.version.0,
        edge_format: format!("{:?}", EdgeFormat::for_version(loaded.version)).to_lowercase(),
        graphs: state
            .graphs
            .iter()
            .map(|(id, g)| GraphSummary::new(id.0, g))
            .collect(),
        jobs: state
            .jobs
            .iter()
            .map(|(id, job)| JobSummary {
                id: id.0,
                link_graph: job.link_graph.0,
                join_date: job.join_date.0,
                snapshot: GraphSummary::new(job.link_graph.0, &job.graph),
            })
            .collect(),
        schedule: state.schedule.schedule.iter().map(|id| id.0).collect(),
        running: state.schedule.running.iter().map(|id| id.0).collect(),
    })
}

/// Output of `lgo convert`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ConvertReport {
    /// Version of the input.
    pub from_version: u16,
    /// Version written.
    pub to_version: u16,
    /// Graphs written.
    pub graphs: usize,
    /// Jobs written.
    pub jobs: usize,
    /// Node locations re-derived from station positions.
    pub relocated: usize,
}

/// Re-saves `input` at `version`. Legacy inputs get their node locations
/// re-derived from `stations` when a scenario is supplied.
pub fn convert(
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
    version: SaveVersion,
    stations: Option<&Scenario>,
) -> Result<ConvertReport> {
    version.check_supported()?;
    let mut loaded = read_file(input)?;
    let relocated = match stations {
        Some(scenario) => {
            let net = scenario.network()?;
            relocate_nodes(&mut loaded.state, loaded.version, &net)
        }
        None => 0,
    };
    write_file(output, &loaded.state, version)?;
    info!(
        from = %loaded.version,
        to = %version,
        relocated,
        "cli.convert"
    );
    Ok(ConvertReport {
        from_version: loaded.version.0,
        to_version: version.0,
        graphs: loaded.state.graphs.len(),
        jobs: loaded.state.jobs.len(),
        relocated,
    })
}

/// Overrides applied on top of the configuration file.
#[derive(Clone, Debug, Default)]
pub struct OverlayRequest {
    /// Overlay tunables.
    pub options: OverlayOptions,
    /// Cargo selection; every cargo when `None`.
    pub cargo_mask: Option<CargoMask>,
    /// Company selection; every company when `None`.
    pub company_mask: Option<CompanyMask>,
    /// Screen points to pick links at.
    pub picks: Vec<Point>,
}

/// Result of picking at one point.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PickResult {
    /// Screen point.
    pub at: Point,
    /// Link under the point, if any.
    pub hit: Option<LinkHit>,
}

/// Output of `lgo overlay`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct OverlayReport {
    /// Rebuilds applied.
    pub generation: u64,
    /// World area covered, when the surface has a viewport.
    pub cached_region: Option<Rect>,
    /// Cached stations sorted by id.
    pub stations: Vec<StationSupplyInfo>,
    /// Cached links sorted by `(from, to)`.
    pub links: Vec<LinkInfo>,
    /// Picks in request order.
    pub picks: Vec<PickResult>,
}

/// Builds the scenario's world, runs a full rebuild and picks at the
/// requested points.
pub fn overlay(scenario: &Scenario, request: &OverlayRequest) -> Result<OverlayReport> {
    let net = scenario.network()?;
    let surface = scenario.surface();
    let mut cache = OverlayCache::new(
        request.options.clone(),
        request.cargo_mask.unwrap_or(CargoMask::all()),
        request.company_mask.unwrap_or(CompanyMask::all()),
    );
    cache.rebuild(RebuildKind::Full, &net, &surface);

    let picks = request
        .picks
        .iter()
        .map(|&at| PickResult {
            at,
            hit: cache.hit_test(&net, at),
        })
        .collect();
    Ok(OverlayReport {
        generation: cache.generation(),
        cached_region: surface.viewport().map(|_| cache.cached_region()),
        stations: cache.stations().to_vec(),
        links: cache.links().to_vec(),
        picks,
    })
}
