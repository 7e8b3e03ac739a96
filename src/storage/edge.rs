use crate::types::Date;

/// How an edge update should be applied.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum EdgeUpdateMode {
    /// Add capacity and usage to the existing values.
    Increase,
    /// Raise capacity to at least the given value; usage is added.
    Refresh,
    /// Only stamp the restricted timestamp.
    Restricted,
    /// Only stamp the unrestricted timestamp.
    Unrestricted,
}

/// Capacity and usage statistics of a directed link between two nodes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Edge {
    /// Maximum flow per sampling period.
    pub capacity: u32,
    /// Realised flow per sampling period.
    pub usage: u32,
    /// Sum of travel times weighted by capacity.
    pub travel_time_sum: u64,
    /// Last date the link was served by unrestricted vehicles.
    pub last_unrestricted_update: Date,
    /// Last date the link was served by restricted vehicles.
    pub last_restricted_update: Date,
}

/// Returned by lookups for pairs without an edge.
pub(crate) static EMPTY_EDGE: Edge = Edge {
    capacity: 0,
    usage: 0,
    travel_time_sum: 0,
    last_unrestricted_update: Date(0),
    last_restricted_update: Date(0),
};

impl Edge {
    /// True once the edge has carried nonzero capacity.
    pub fn is_live(&self) -> bool {
        self.capacity > 0
    }

    /// Average travel time in ticks, zero when nothing was recorded.
    pub fn travel_time(&self) -> u32 {
        if self.capacity == 0 {
            return 0;
        }
        (self.travel_time_sum / self.capacity as u64).min(u32::MAX as u64) as u32
    }

    /// Most recent of both update timestamps.
    pub fn last_update(&self) -> Date {
        self.last_unrestricted_update
            .max(self.last_restricted_update)
    }

    pub(crate) fn apply(
        &mut self,
        capacity: u32,
        usage: u32,
        travel_time: u32,
        mode: EdgeUpdateMode,
        now: Date,
    ) {
        match mode {
            EdgeUpdateMode::Increase => {
                self.travel_time_sum = self
                    .travel_time_sum
                    .saturating_add(travel_time as u64 * capacity as u64);
                self.capacity = self.capacity.saturating_add(capacity);
                self.usage = self.usage.saturating_add(usage);
                self.last_unrestricted_update = now;
            }
            EdgeUpdateMode::Refresh => {
                if capacity > self.capacity {
                    self.travel_time_sum = self.travel_time_sum.saturating_add(
                        travel_time as u64 * (capacity - self.capacity) as u64,
                    );
                    self.capacity = capacity;
                }
                self.usage = self.usage.saturating_add(usage);
                self.last_unrestricted_update = now;
            }
            EdgeUpdateMode::Restricted => self.last_restricted_update = now,
            EdgeUpdateMode::Unrestricted => self.last_unrestricted_update = now,
        }
    }

    pub(crate) fn halve(&mut self) {
        if self.capacity == 0 {
            return;
        }
        let halved = (self.capacity / 2).max(1);
        self.travel_time_sum =
            (self.travel_time_sum as u128 * halved as u128 / self.capacity as u128) as u64;
        self.capacity = halved;
        self.usage /= 2;
    }
}
