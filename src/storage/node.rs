use crate::types::{Date, StationId, TileIndex};

/// A station's vertex inside one cargo's link graph.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Node {
    /// Cargo originating at the station per sampling period.
    pub supply: u32,
    /// Acceptance of the station for this cargo.
    pub demand: u32,
    /// Owning station.
    pub station: StationId,
    /// Station location when the node was last refreshed.
    pub location: TileIndex,
    /// Last time supply was recorded.
    pub last_update: Date,
}

impl Node {
    /// Creates a node for `station` located at `location`.
    pub fn new(station: StationId, location: TileIndex, now: Date) -> Self {
        Self {
            supply: 0,
            demand: 0,
            station,
            location,
            last_update: now,
        }
    }

    /// Adds freshly produced supply.
    pub fn update_supply(&mut self, supply: u32, now: Date) {
        self.supply = self.supply.saturating_add(supply);
        self.last_update = now;
    }

    /// Moves the node to the station's new location.
    pub fn update_location(&mut self, location: TileIndex) {
        self.location = location;
    }

    /// Sets the node's demand.
    pub fn set_demand(&mut self, demand: u32) {
        self.demand = demand;
    }
}

impl Default for Node {
    fn default() -> Self {
        Node::new(StationId(u16::MAX), TileIndex::default(), Date::default())
    }
}
