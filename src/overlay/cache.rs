//! Cached stations and links of the overlay.
//!
//! A full rebuild clears both collections and rediscovers everything inside
//! the padded widget area. An incremental rebuild keeps what is cached,
//! discovers only station ids and station pairs that are not cached yet and
//! merges the new sorted batch into the old one. Both collections stay sorted
//! by station id and by `(from, to)` respectively.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::debug;

use super::geometry::{point_visible, segment_visible};
use super::options::OverlayOptions;
use super::stats::{reduce, LinkContribution, LinkProperties};
use super::world::{DisplaySurface, NetworkView, Station};
use crate::types::{CargoMask, CompanyMask, Date, Owner, Point, Rect, StationId};

/// A station dot.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StationSupplyInfo {
    /// Station id.
    pub id: StationId,
    /// Monthly supply summed over the selected cargos.
    pub quantity: u32,
    /// Screen position.
    pub pt: Point,
}

/// A directed link between two cached stations.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LinkInfo {
    /// Source station.
    pub from: StationId,
    /// Target station.
    pub to: StationId,
    /// Screen position of the source.
    pub from_pt: Point,
    /// Screen position of the target.
    pub to_pt: Point,
    /// Representative statistics over all selected cargos.
    pub prop: LinkProperties,
}

impl LinkInfo {
    /// Sort key of the link.
    pub fn key(&self) -> (StationId, StationId) {
        (self.from, self.to)
    }
}

/// Kind of rebuild requested for the next draw.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RebuildKind {
    /// Drop everything and rediscover.
    Full,
    /// Keep cached entries, add what is missing.
    Incremental,
}

/// Overlay state owned by one display surface.
#[derive(Clone, Debug)]
pub struct OverlayCache {
    pub(super) options: OverlayOptions,
    pub(super) cargo_mask: CargoMask,
    pub(super) company_mask: CompanyMask,
    pub(super) stations: Vec<StationSupplyInfo>,
    pub(super) links: Vec<LinkInfo>,
    cached_region: Rect,
    pending: Option<RebuildKind>,
    pub(super) last_update_number: u64,
    generation: u64,
}

impl OverlayCache {
    /// Creates an empty cache that rebuilds fully before its first draw.
    pub fn new(options: OverlayOptions, cargo_mask: CargoMask, company_mask: CompanyMask) -> Self {
        Self {
            options,
            cargo_mask,
            company_mask,
            stations: Vec::new(),
            links: Vec::new(),
            cached_region: Rect::default(),
            pending: Some(RebuildKind::Full),
            last_update_number: 0,
            generation: 0,
        }
    }

    /// Options in effect.
    pub fn options(&self) -> &OverlayOptions {
        &self.options
    }

    /// Replaces the options; geometry depends on them, so everything is
    /// rediscovered.
    pub fn set_options(&mut self, options: OverlayOptions) {
        self.options = options;
        self.invalidate();
    }

    /// Cached stations sorted by id.
    pub fn stations(&self) -> &[StationSupplyInfo] {
        &self.stations
    }

    /// Cached links sorted by `(from, to)`.
    pub fn links(&self) -> &[LinkInfo] {
        &self.links
    }

    /// World area covered by the cache, margin included.
    pub fn cached_region(&self) -> Rect {
        self.cached_region
    }

    /// Number of rebuilds applied so far.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Rebuild that will run before the next draw, if any.
    pub fn pending(&self) -> Option<RebuildKind> {
        self.pending
    }

    /// Selected cargos.
    pub fn cargo_mask(&self) -> CargoMask {
        self.cargo_mask
    }

    /// Selected companies.
    pub fn company_mask(&self) -> CompanyMask {
        self.company_mask
    }

    /// Selects cargos and schedules a full rebuild.
    pub fn set_cargo_mask(&mut self, mask: CargoMask) {
        self.cargo_mask = mask;
        self.pending = Some(RebuildKind::Full);
    }

    /// Selects companies and schedules a full rebuild.
    pub fn set_company_mask(&mut self, mask: CompanyMask) {
        self.company_mask = mask;
        self.pending = Some(RebuildKind::Full);
    }

    /// Schedules a full rebuild, e.g. after the graphs changed.
    pub fn invalidate(&mut self) {
        self.pending = Some(RebuildKind::Full);
    }

    /// True while the visible world area lies within the cached region.
    /// Surfaces without a viewport cache everything and are always valid.
    pub fn cache_still_valid<D>(&self, display: &D) -> bool
    where
        D: DisplaySurface + ?Sized,
    {
        match display.viewport() {
            Some(vp) => self.cached_region.contains_rect(&vp.virtual_rect()),
            None => true,
        }
    }

    /// Schedules an incremental rebuild if the view left the cached region.
    /// A pending full rebuild is kept.
    pub fn check_region<D>(&mut self, display: &D)
    where
        D: DisplaySurface + ?Sized,
    {
        if self.pending.is_none() && !self.cache_still_valid(display) {
            self.pending = Some(RebuildKind::Incremental);
        }
    }

    /// Runs the pending rebuild, then reprojects cached entries if the
    /// display's projection changed since the last time.
    pub fn prepare_draw<W, D>(&mut self, world: &W, display: &D)
    where
        W: NetworkView + ?Sized,
        D: DisplaySurface + ?Sized,
    {
        if let Some(kind) = self.pending {
            self.rebuild(kind, world, display);
        }
        if self.last_update_number != display.update_number() {
            self.last_update_number = display.update_number();
            self.refresh_screen_positions(world, display);
        }
    }

    /// Rebuilds the cache.
    ///
    /// With an empty company mask nothing is touched: the previous
    /// generation stays in place and draw and hit tests yield nothing.
    pub fn rebuild<W, D>(&mut self, kind: RebuildKind, world: &W, display: &D)
    where
        W: NetworkView + ?Sized,
        D: DisplaySurface + ?Sized,
    {
        self.pending = None;
        if self.company_mask.is_empty() {
            debug!(?kind, "overlay.rebuild.skipped");
            return;
        }
        let incremental = kind == RebuildKind::Incremental;
        if !incremental {
            self.stations.clear();
            self.links.clear();
            self.last_update_number = display.update_number();
        }

        let (width, height) = display.widget_size();
        let (area, cache_all) = match display.viewport() {
            Some(vp) => {
                let margin = self.options.pixel_margin;
                self.cached_region = vp.virtual_rect().expand(vp.scale_by_zoom(margin));
                (Rect::from_size(0, 0, width, height).expand(margin), false)
            }
            None => (Rect::from_size(0, 0, width, height), true),
        };

        let known_stations: Vec<StationId> = if incremental {
            self.stations.iter().map(|s| s.id).collect()
        } else {
            Vec::new()
        };
        let known_links: Vec<(StationId, StationId)> = if incremental {
            self.links.iter().map(LinkInfo::key).collect()
        } else {
            Vec::new()
        };

        let now = world.date();
        let mut found: BTreeMap<(StationId, StationId), LinkInfo> = BTreeMap::new();
        let mut new_stations = Vec::new();

        for sta in world.stations() {
            if sta.footprint_empty || !self.owner_selected(sta.owner) {
                continue;
            }
            let pta = display.station_middle(sta);
            let mut supply = 0u32;

            for cargo in self.cargo_mask.iter() {
                if !world.is_cargo_valid(cargo) {
                    continue;
                }
                let Some(ge) = sta.goods(cargo) else {
                    continue;
                };
                let Some(lg) = world.link_graph(ge.link_graph) else {
                    continue;
                };
                let Some(node) = lg.node(ge.node) else {
                    continue;
                };
                supply = supply.saturating_add(lg.monthly(node.supply, now));

                for (to_node, _) in lg.edges_from(ge.node) {
                    let Some(to) = lg.node(to_node).map(|n| n.station) else {
                        continue;
                    };
                    if to == sta.id {
                        continue;
                    }
                    let Some(stb) = world.station(to) else {
                        continue;
                    };
                    if stb.footprint_empty || !self.owner_selected(stb.owner) {
                        continue;
                    }
                    let key = (sta.id, to);
                    if known_links.binary_search(&key).is_ok() || found.contains_key(&key) {
                        continue;
                    }
                    let ptb = display.station_middle(stb);
                    if !cache_all && !segment_visible(pta, ptb, &area, 0) {
                        continue;
                    }
                    if let Some(prop) = self.link_properties(world, sta, stb, now) {
                        found.insert(
                            key,
                            LinkInfo {
                                from: sta.id,
                                to,
                                from_pt: pta,
                                to_pt: ptb,
                                prop,
                            },
                        );
                    }
                }
            }

            if known_stations.binary_search(&sta.id).is_ok() {
                continue;
            }
            if cache_all || point_visible(pta, &area, 0) {
                new_stations.push(StationSupplyInfo {
                    id: sta.id,
                    quantity: supply,
                    pt: pta,
                });
            }
        }

        let added_stations = new_stations.len();
        let added_links = found.len();
        let previous_stations = self.stations.len();
        let previous_links = self.links.len();
        self.stations.extend(new_stations);
        self.links.extend(found.into_values());
        merge_sorted_runs(&mut self.stations, previous_stations, |s| s.id);
        merge_sorted_runs(&mut self.links, previous_links, LinkInfo::key);
        self.generation += 1;

        debug!(
            ?kind,
            generation = self.generation,
            added_stations,
            added_links,
            stations = self.stations.len(),
            links = self.links.len(),
            "overlay.rebuild"
        );
    }

    /// Statistics of `from -> to` over every selected cargo whose graph
    /// contains both stations, or `None` if no cargo has capacity.
    fn link_properties<W>(&self, world: &W, from: &Station, to: &Station, now: Date) -> Option<LinkProperties>
    where
        W: NetworkView + ?Sized,
    {
        let shared = from.owner.is_neutral() || to.owner.is_neutral();
        let mut contributions = Vec::new();
        for cargo in self.cargo_mask.iter() {
            if !world.is_cargo_valid(cargo) {
                continue;
            }
            let (Some(ge_from), Some(ge_to)) = (from.goods(cargo), to.goods(cargo)) else {
                continue;
            };
            if ge_from.link_graph != ge_to.link_graph {
                continue;
            }
            let Some(lg) = world.link_graph(ge_from.link_graph) else {
                continue;
            };
            let edge = lg.edge(ge_from.node, ge_to.node);
            if edge.capacity == 0 {
                continue;
            }
            contributions.push(LinkContribution {
                cargo,
                capacity: lg.monthly(edge.capacity, now).max(1),
                usage: lg.monthly(edge.usage, now),
                planned: from.planned_flow_via(cargo, to.id),
                time: edge.travel_time(),
                shared,
            });
        }
        let prop = reduce(&contributions);
        (prop.capacity > 0).then_some(prop)
    }

    /// Each endpoint is tested on its own: a neutral station always passes,
    /// so a link survives only if neither endpoint belongs to a company
    /// outside the mask. A link from a neutral station to an unselected
    /// company's station is dropped.
    fn owner_selected(&self, owner: Owner) -> bool {
        match owner {
            Owner::Neutral => true,
            Owner::Company(company) => self.company_mask.contains(company),
        }
    }
}

/// Merges the sorted runs `items[..mid]` and `items[mid..]` in place,
/// keeping equal keys in their original order.
pub fn merge_sorted_runs<T, K, F>(items: &mut [T], mid: usize, key: F)
where
    K: Ord,
    F: FnMut(&T) -> K,
{
    if mid == 0 || mid >= items.len() {
        return;
    }
    // the stable sort detects both runs and performs a single merge
    items.sort_by_key(key);
}
