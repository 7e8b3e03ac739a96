use serde::{Deserialize, Serialize};

use super::graph::LinkGraph;
use crate::types::{Date, LinkGraphId};

/// Demand distribution model applied to a cargo class.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistributionType {
    /// Cargo goes wherever vehicles take it.
    #[default]
    Manual,
    /// Demand is computed one way only.
    Asymmetric,
    /// Demand is balanced between both ends of a link.
    Symmetric,
}

impl DistributionType {
    /// Wire representation.
    pub fn as_u8(self) -> u8 {
        match self {
            DistributionType::Manual => 0,
            DistributionType::Asymmetric => 1,
            DistributionType::Symmetric => 2,
        }
    }

    /// Parses the wire representation.
    pub fn from_u8(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(DistributionType::Manual),
            1 => Some(DistributionType::Asymmetric),
            2 => Some(DistributionType::Symmetric),
            _ => None,
        }
    }
}

/// Settings captured when a job was spawned so later changes do not affect it.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkGraphSettings {
    /// Days between two recalculations.
    pub recalc_interval: u16,
    /// Days a recalculation may take.
    pub recalc_time: u16,
    /// Distribution for passengers.
    pub distribution_pax: DistributionType,
    /// Distribution for mail.
    pub distribution_mail: DistributionType,
    /// Distribution for armoured cargo.
    pub distribution_armoured: DistributionType,
    /// Distribution for every other cargo.
    pub distribution_default: DistributionType,
    /// Accuracy of the flow calculation.
    pub accuracy: u8,
    /// Effect of distance on demand, in percent.
    pub demand_distance: u8,
    /// Effect of supply on symmetric demand, in percent.
    pub demand_size: u8,
    /// Saturation of short paths before longer ones are used, in percent.
    pub short_path_saturation: u8,
}

impl Default for LinkGraphSettings {
    fn default() -> Self {
        Self {
            recalc_interval: 4,
            recalc_time: 16,
            distribution_pax: DistributionType::Manual,
            distribution_mail: DistributionType::Manual,
            distribution_armoured: DistributionType::Manual,
            distribution_default: DistributionType::Manual,
            accuracy: 16,
            demand_distance: 100,
            demand_size: 100,
            short_path_saturation: 80,
        }
    }
}

/// A link graph calculation in flight, working on a snapshot of its graph.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LinkGraphJob {
    /// Snapshot the job works on.
    pub graph: LinkGraph,
    /// Registry index of the graph the snapshot was taken from.
    pub link_graph: LinkGraphId,
    /// Date at which the result will be merged back.
    pub join_date: Date,
    /// Settings in effect when the job was spawned.
    pub settings: LinkGraphSettings,
}

impl LinkGraphJob {
    /// Snapshots `graph` into a new job joining after `settings.recalc_time`.
    pub fn spawn(
        link_graph: LinkGraphId,
        graph: &LinkGraph,
        settings: LinkGraphSettings,
        now: Date,
    ) -> Self {
        let join_date = Date(now.0.saturating_add(settings.recalc_time as i32));
        Self {
            graph: graph.clone(),
            link_graph,
            join_date,
            settings,
        }
    }

    /// True once the job's join date has passed.
    pub fn is_due(&self, now: Date) -> bool {
        now >= self.join_date
    }
}
