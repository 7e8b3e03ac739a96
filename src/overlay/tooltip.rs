//! Picking the link under the cursor.

use serde::Serialize;

use super::cache::{LinkInfo, OverlayCache};
use super::stats::LinkProperties;
use super::world::NetworkView;
use crate::types::{Point, StationId};

/// The link found under the cursor, with its reverse direction if cached.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LinkHit {
    /// Source station.
    pub from: StationId,
    /// Target station.
    pub to: StationId,
    /// Statistics of `from -> to`.
    pub prop: LinkProperties,
    /// Load of `from -> to` in percent.
    pub saturation: u32,
    /// Statistics of `to -> from`, when that link is pickable as well.
    pub back: Option<LinkProperties>,
    /// Travel time averaged over both directions where known.
    pub travel_time: u32,
}

impl OverlayCache {
    /// Finds the most recently cached link passing within the hit distance of
    /// `pt`. Links with no load are skipped unless inspect mode is on, in
    /// which case any capacity makes them pickable.
    pub fn hit_test<W>(&self, world: &W, pt: Point) -> Option<LinkHit>
    where
        W: NetworkView + ?Sized,
    {
        if self.company_mask.is_empty() {
            return None;
        }
        for (index, link) in self.links.iter().enumerate().rev() {
            if world.station(link.from).is_none() || world.station(link.to).is_none() {
                continue;
            }
            if !self.pickable(&link.prop) || !self.near_link(link, pt) {
                continue;
            }

            let reverse = self.links[..index]
                .iter()
                .rev()
                .find(|other| other.from == link.to && other.to == link.from);
            let back_time = reverse.map(|r| r.prop.time).unwrap_or(0);
            let back = reverse
                .map(|r| r.prop)
                .filter(|prop| self.pickable(prop));

            return Some(LinkHit {
                from: link.from,
                to: link.to,
                prop: link.prop,
                saturation: link.prop.saturation_percent(),
                back,
                travel_time: combined_travel_time(link.prop.time, back_time),
            });
        }
        None
    }

    fn pickable(&self, prop: &LinkProperties) -> bool {
        prop.usage_or_planned() > 0 || (self.options.inspect && prop.capacity > 0)
    }

    fn near_link(&self, link: &LinkInfo, pt: Point) -> bool {
        let (a, b) = (link.from_pt, link.to_pt);
        let slop = self.options.hit_slop;
        if pt.x.saturating_add(slop) < a.x.min(b.x)
            || pt.x.saturating_sub(slop) > a.x.max(b.x)
            || pt.y.saturating_add(slop) < a.y.min(b.y)
            || pt.y.saturating_sub(slop) > a.y.max(b.y)
        {
            return false;
        }
        let (ax, ay, bx, by) = (a.x as i128, a.y as i128, b.x as i128, b.y as i128);
        let (px, py) = (pt.x as i128, pt.y as i128);
        let cross = (bx - ax) * (ay - py) - (ax - px) * (by - ay);
        let length_sq = (bx - ax) * (bx - ax) + (by - ay) * (by - ay);
        if length_sq == 0 {
            return false;
        }
        cross * cross / length_sq <= self.options.hit_distance_sq as i128
    }
}

fn combined_travel_time(forward: u32, back: u32) -> u32 {
    match (forward, back) {
        (0, back) => back,
        (forward, 0) => forward,
        (forward, back) => ((forward as u64 + back as u64) / 2) as u32,
    }
}
