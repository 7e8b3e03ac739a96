//! Reduction of per-cargo link statistics to one representative entry.

use serde::Serialize;

use crate::types::CargoId;

/// Numerators are scaled by this before dividing by capacity so that low
/// ratios still compare.
const RATIO_SCALE: u64 = 32;

/// Statistics shown for one directed station pair.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LinkProperties {
    /// Cargo the other fields belong to.
    pub cargo: CargoId,
    /// Monthly capacity.
    pub capacity: u32,
    /// Monthly usage.
    pub usage: u32,
    /// Planned flow via the target station.
    pub planned: u32,
    /// Average travel time.
    pub time: u32,
    /// More than one company can use the link.
    pub shared: bool,
}

impl Default for LinkProperties {
    fn default() -> Self {
        Self {
            cargo: CargoId::INVALID,
            capacity: 0,
            usage: 0,
            planned: 0,
            time: 0,
            shared: false,
        }
    }
}

impl LinkProperties {
    /// Larger of realised and planned flow.
    pub fn usage_or_planned(&self) -> u32 {
        self.usage.max(self.planned)
    }

    /// Load in percent of capacity.
    pub fn saturation_percent(&self) -> u32 {
        saturation_percent(self.usage_or_planned(), self.capacity)
    }

    fn scaled_ratio(&self) -> u64 {
        scaled_ratio(self.usage_or_planned(), self.capacity)
    }
}

/// One cargo's statistics for a station pair.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct LinkContribution {
    /// Cargo the statistics belong to.
    pub cargo: CargoId,
    /// Monthly capacity.
    pub capacity: u32,
    /// Monthly usage.
    pub usage: u32,
    /// Planned flow via the target station.
    pub planned: u32,
    /// Average travel time.
    pub time: u32,
    /// An endpoint is owner-neutral.
    pub shared: bool,
}

/// Folds `candidate` into `existing`.
///
/// The candidate replaces the stats when its load ratio is strictly higher
/// or when nothing was recorded yet; on equal ratios the earlier cargo
/// stays. The shared flag accumulates regardless.
pub fn combine(existing: LinkProperties, candidate: &LinkContribution) -> LinkProperties {
    let candidate_ratio = scaled_ratio(candidate.usage.max(candidate.planned), candidate.capacity);
    let mut out = existing;
    if existing.capacity == 0 || existing.scaled_ratio() < candidate_ratio {
        out.cargo = candidate.cargo;
        out.capacity = candidate.capacity;
        out.usage = candidate.usage;
        out.planned = candidate.planned;
        out.time = candidate.time;
    }
    out.shared |= candidate.shared;
    out
}

/// Left fold of [`combine`] starting from empty properties.
pub fn reduce<'a, I>(contributions: I) -> LinkProperties
where
    I: IntoIterator<Item = &'a LinkContribution>,
{
    contributions
        .into_iter()
        .fold(LinkProperties::default(), combine)
}

/// `usage * 100 / (capacity + 1)`, saturating.
pub fn saturation_percent(usage: u32, capacity: u32) -> u32 {
    (usage as u64 * 100 / (capacity as u64 + 1)).min(u32::MAX as u64) as u32
}

fn scaled_ratio(load: u32, capacity: u32) -> u64 {
    load as u64 * RATIO_SCALE / (capacity as u64 + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contribution(cargo: u8, capacity: u32, usage: u32) -> LinkContribution {
        LinkContribution {
            cargo: CargoId(cargo),
            capacity,
            usage,
            planned: 0,
            time: cargo as u32,
            shared: false,
        }
    }

    #[test]
    fn most_saturated_cargo_wins_in_any_order() {
        let x = contribution(1, 10, 8);
        let y = contribution(2, 50, 5);
        let forward = reduce([&x, &y]);
        let backward = reduce([&y, &x]);
        assert_eq!(forward.cargo, CargoId(1));
        assert_eq!(forward, backward);
        assert_eq!((forward.capacity, forward.usage), (10, 8));
    }

    #[test]
    fn planned_flow_counts_as_load() {
        let quiet = contribution(1, 10, 1);
        let planned = LinkContribution {
            planned: 9,
            ..contribution(2, 10, 0)
        };
        let prop = reduce([&quiet, &planned]);
        assert_eq!(prop.cargo, CargoId(2));
        assert_eq!(prop.usage_or_planned(), 9);
    }

    #[test]
    fn ties_keep_first_seen() {
        let a = contribution(4, 10, 5);
        let b = contribution(7, 10, 5);
        assert_eq!(reduce([&a, &b]).cargo, CargoId(4));
        assert_eq!(reduce([&b, &a]).cargo, CargoId(7));
    }

    #[test]
    fn shared_flag_accumulates_without_replacing() {
        let busy = contribution(1, 10, 9);
        let neutral = LinkContribution {
            shared: true,
            ..contribution(2, 100, 0)
        };
        let prop = reduce([&busy, &neutral]);
        assert_eq!(prop.cargo, CargoId(1));
        assert!(prop.shared);
    }

    #[test]
    fn empty_fold_has_no_capacity() {
        let prop = reduce(std::iter::empty());
        assert_eq!(prop.capacity, 0);
        assert_eq!(prop.cargo, CargoId::INVALID);
    }

    #[test]
    fn saturation_uses_capacity_plus_one() {
        assert_eq!(saturation_percent(40, 100), 39);
        assert_eq!(saturation_percent(0, 0), 0);
        assert_eq!(saturation_percent(u32::MAX, 0), u32::MAX);
    }
}
