use std::collections::BTreeMap;

use tracing::debug;

use super::graph::LinkGraph;
use super::job::LinkGraphJob;
use crate::error::{LinkGraphError, Result};
use crate::types::{JobId, LinkGraphId};

/// Graphs waiting for a recalculation and jobs currently running.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LinkGraphSchedule {
    /// Graphs queued for their next job, front first.
    pub schedule: Vec<LinkGraphId>,
    /// Jobs currently running.
    pub running: Vec<JobId>,
}

impl LinkGraphSchedule {
    /// Appends a graph to the queue unless it is already queued.
    pub fn queue(&mut self, id: LinkGraphId) {
        if !self.schedule.contains(&id) {
            self.schedule.push(id);
        }
    }

    /// Drops every reference to a graph.
    pub fn unqueue(&mut self, id: LinkGraphId) {
        self.schedule.retain(|queued| *queued != id);
    }
}

/// All link graphs, their jobs and the scheduler queue.
///
/// The background calculation publishes by replacing a whole graph, so
/// readers only ever observe complete snapshots.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LinkGraphState {
    /// Graphs keyed by registry index.
    pub graphs: BTreeMap<LinkGraphId, LinkGraph>,
    /// Jobs keyed by registry index.
    pub jobs: BTreeMap<JobId, LinkGraphJob>,
    /// Scheduler queue.
    pub schedule: LinkGraphSchedule,
}

impl LinkGraphState {
    /// Graph with the given index.
    pub fn graph(&self, id: LinkGraphId) -> Option<&LinkGraph> {
        self.graphs.get(&id)
    }

    /// Mutable graph with the given index.
    pub fn graph_mut(&mut self, id: LinkGraphId) -> Option<&mut LinkGraph> {
        self.graphs.get_mut(&id)
    }

    /// Inserts `graph` at the lowest free index.
    pub fn insert_graph(&mut self, graph: LinkGraph) -> Result<LinkGraphId> {
        let id = next_free(self.graphs.keys().map(|k| k.0))
            .map(LinkGraphId)
            .ok_or_else(|| LinkGraphError::invalid("link graph registry is full"))?;
        self.graphs.insert(id, graph);
        Ok(id)
    }

    /// Swaps a finished snapshot in for graph `id`, returning the old one.
    pub fn publish(&mut self, id: LinkGraphId, graph: LinkGraph) -> Option<LinkGraph> {
        debug!(graph = id.0, nodes = graph.size(), "linkgraph.publish");
        self.graphs.insert(id, graph)
    }

    /// Removes a graph and every scheduler reference to it.
    pub fn remove_graph(&mut self, id: LinkGraphId) -> Option<LinkGraph> {
        self.schedule.unqueue(id);
        self.graphs.remove(&id)
    }

    /// Registers a job and marks it running.
    pub fn insert_job(&mut self, job: LinkGraphJob) -> Result<JobId> {
        let id = next_free(self.jobs.keys().map(|k| k.0))
            .map(JobId)
            .ok_or_else(|| LinkGraphError::invalid("link graph job registry is full"))?;
        self.jobs.insert(id, job);
        self.schedule.running.push(id);
        Ok(id)
    }

    /// Finishes a job, publishing its snapshot if the source graph still exists.
    pub fn join_job(&mut self, id: JobId) -> Option<LinkGraphId> {
        let job = self.jobs.remove(&id)?;
        self.schedule.running.retain(|running| *running != id);
        if !self.graphs.contains_key(&job.link_graph) {
            return None;
        }
        self.publish(job.link_graph, job.graph);
        Some(job.link_graph)
    }
}

fn next_free(used: impl Iterator<Item = u16>) -> Option<u16> {
    let mut candidate = 0u16;
    for id in used {
        if id != candidate {
            return Some(candidate);
        }
        candidate = candidate.checked_add(1)?;
    }
    Some(candidate)
}
