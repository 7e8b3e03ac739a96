//! Rendering of the cached overlay onto a [`DrawTarget`].

use super::cache::{LinkInfo, OverlayCache};
use super::geometry::{point_visible, segment_visible};
use super::options::COLOUR_SCHEMES;
use super::stats::LinkProperties;
use super::world::{DisplaySurface, NetworkView, Station};
use crate::types::{Owner, Point, Rect};

/// Link colours per scheme, ordered from unused to overloaded.
pub const LINK_COLOURS: [[u8; 12]; COLOUR_SCHEMES as usize] = [
    [
        0x0f, 0xd1, 0xd0, 0x57, 0x55, 0x53, 0xbf, 0xbd, 0xba, 0xb9, 0xb7, 0xb5,
    ],
    [
        0x0f, 0xd1, 0xd0, 0x57, 0x55, 0x53, 0x96, 0x95, 0x94, 0x93, 0x92, 0x91,
    ],
    [
        0x0f, 0x0b, 0x09, 0x07, 0x05, 0x03, 0xbf, 0xbd, 0xba, 0xb9, 0xb7, 0xb5,
    ],
    [
        0x0f, 0x0b, 0x0a, 0x09, 0x08, 0x07, 0x06, 0x05, 0x04, 0x03, 0x02, 0x01,
    ],
];

/// Centre line drawn over every link and border of every dot.
pub const GREY_LINE: u8 = 0x06;
/// Fill of owner-neutral station dots.
pub const GREY_FILL: u8 = 0x0a;

/// Extra radius around a station when marking it dirty, in screen pixels.
const DIRTY_DOT_PADDING: i32 = 3;
/// Half width of the band marked dirty along a link, in screen pixels.
const DIRTY_LINK_RADIUS: i32 = 10;

/// Primitive drawing operations of the host.
pub trait DrawTarget {
    /// Draws a line; `dash` is the dash length or zero for solid lines.
    fn draw_line(&mut self, from: Point, to: Point, colour: u8, width: i32, dash: i32);
    /// Fills a rectangle, edges inclusive.
    fn fill_rect(&mut self, rect: Rect, colour: u8);
}

/// Receives areas of the main view that need repainting, in world pixels.
pub trait DirtySink {
    /// Marks a rectangle.
    fn mark_rect(&mut self, rect: Rect);
    /// Marks a band of `radius` around a line.
    fn mark_line(&mut self, from: Point, to: Point, radius: i32);
}

/// Palette entry for a link of the given load.
pub fn link_colour(scheme: u8, prop: &LinkProperties) -> u8 {
    let cap = prop.capacity as u64;
    let load = (cap * 2 + 1).min(prop.usage_or_planned() as u64);
    let row = &LINK_COLOURS[scheme.min(COLOUR_SCHEMES - 1) as usize];
    let index = load * row.len() as u64 / (cap * 2 + 2);
    row[index as usize]
}

/// Edge length of a station dot: grows from `2w` to `4w` as supply
/// approaches `cap`.
pub fn dot_size(width: i32, quantity: u32, cap: u32) -> i32 {
    let cap = cap.max(1) as i64;
    let q = (quantity as i64).min(cap);
    let w = width as i64;
    (w * 2 + w * 2 * q / cap) as i32
}

impl OverlayCache {
    /// Reprojects cached stations and links without touching their stats.
    /// Entries whose stations vanished keep their old position.
    pub fn refresh_screen_positions<W, D>(&mut self, world: &W, display: &D)
    where
        W: NetworkView + ?Sized,
        D: DisplaySurface + ?Sized,
    {
        for info in &mut self.stations {
            if let Some(st) = world.station(info.id) {
                info.pt = display.station_middle(st);
            }
        }
        for link in &mut self.links {
            let (Some(sta), Some(stb)) = (world.station(link.from), world.station(link.to)) else {
                continue;
            };
            link.from_pt = display.station_middle(sta);
            link.to_pt = display.station_middle(stb);
        }
    }

    /// Draws links, then station dots, clipped to `dpi`.
    pub fn draw<W, T>(&self, world: &W, target: &mut T, dpi: &Rect)
    where
        W: NetworkView + ?Sized,
        T: DrawTarget + ?Sized,
    {
        if self.company_mask.is_empty() {
            return;
        }
        self.draw_links(world, target, dpi);
        self.draw_station_dots(world, target, dpi);
    }

    fn draw_links<W, T>(&self, world: &W, target: &mut T, dpi: &Rect)
    where
        W: NetworkView + ?Sized,
        T: DrawTarget + ?Sized,
    {
        let width = self.options.line_width();
        for link in &self.links {
            if !segment_visible(link.from_pt, link.to_pt, dpi, width.saturating_add(2)) {
                continue;
            }
            if world.station(link.from).is_none() || world.station(link.to).is_none() {
                continue;
            }
            self.draw_link(target, link, width);
        }
    }

    fn draw_link<T>(&self, target: &mut T, link: &LinkInfo, width: i32)
    where
        T: DrawTarget + ?Sized,
    {
        let (a, b) = (link.from_pt, link.to_pt);
        let colour = link_colour(self.options.colour_scheme, &link.prop);
        let dash = if link.prop.shared { width.saturating_mul(4) } else { 0 };

        // shift the coloured line sideways so the grey centre line does not hide it
        let side = if self.options.drive_on_right { 1 } else { -1 };
        if a.x.abs_diff(b.x) < a.y.abs_diff(b.y) {
            let dx = (if a.y > b.y { 1 } else { -1 }) * side * width;
            target.draw_line(
                Point::new(a.x.saturating_add(dx), a.y),
                Point::new(b.x.saturating_add(dx), b.y),
                colour,
                width,
                dash,
            );
        } else {
            let dy = (if a.x < b.x { 1 } else { -1 }) * side * width;
            target.draw_line(
                Point::new(a.x, a.y.saturating_add(dy)),
                Point::new(b.x, b.y.saturating_add(dy)),
                colour,
                width,
                dash,
            );
        }
        target.draw_line(a, b, GREY_LINE, width, 0);
    }

    fn draw_station_dots<W, T>(&self, world: &W, target: &mut T, dpi: &Rect)
    where
        W: NetworkView + ?Sized,
        T: DrawTarget + ?Sized,
    {
        let width = self.options.line_width();
        for info in &self.stations {
            if !point_visible(info.pt, dpi, width.saturating_mul(3)) {
                continue;
            }
            let Some(st) = world.station(info.id) else {
                continue;
            };
            let size = dot_size(width, info.quantity, self.options.dot_quantity_cap);
            let fill = match st.owner {
                Owner::Company(company) => world.company_colour(company),
                Owner::Neutral => GREY_FILL,
            };
            draw_vertex(target, info.pt, size, fill, GREY_LINE);
        }
    }

    /// Reports the areas of the main view covered by `station`'s dot and by
    /// every cached link touching it. Does nothing on surfaces without a
    /// viewport.
    pub fn mark_station_links_dirty<W, D, S>(&self, station: &Station, world: &W, display: &D, sink: &mut S)
    where
        W: NetworkView + ?Sized,
        D: DisplaySurface + ?Sized,
        S: DirtySink + ?Sized,
    {
        let Some(vp) = display.viewport() else {
            return;
        };
        let pt = display.tile_point(station.xy);
        let padding = vp.scale_by_zoom(DIRTY_DOT_PADDING.saturating_mul(self.options.line_width()));
        sink.mark_rect(Rect::new(pt.x, pt.y, pt.x, pt.y).expand(padding));

        let radius = vp.scale_by_zoom(DIRTY_LINK_RADIUS);
        for link in &self.links {
            if link.from == station.id {
                let Some(other) = world.station(link.to) else {
                    continue;
                };
                sink.mark_line(pt, display.tile_point(other.xy), radius);
            } else if link.to == station.id {
                let Some(other) = world.station(link.from) else {
                    continue;
                };
                sink.mark_line(display.tile_point(other.xy), pt, radius);
            }
        }
    }
}

/// Filled square of edge `size` centred on `pt` with a one pixel border.
fn draw_vertex<T>(target: &mut T, pt: Point, size: i32, fill: u8, border: u8)
where
    T: DrawTarget + ?Sized,
{
    let size = size - 1;
    let mut w1 = size / 2;
    let mut w2 = size / 2 + size % 2;
    let square = |w1: i32, w2: i32| {
        Rect::new(
            pt.x.saturating_sub(w1),
            pt.y.saturating_sub(w1),
            pt.x.saturating_add(w2),
            pt.y.saturating_add(w2),
        )
    };
    target.fill_rect(square(w1, w2), fill);

    w1 += 1;
    w2 += 1;
    let Rect { left, top, right, bottom } = square(w1, w2);
    target.draw_line(Point::new(left, top), Point::new(right, top), border, 1, 0);
    target.draw_line(Point::new(left, bottom), Point::new(right, bottom), border, 1, 0);
    target.draw_line(Point::new(left, top), Point::new(left, bottom), border, 1, 0);
    target.draw_line(Point::new(right, top), Point::new(right, bottom), border, 1, 0);
}
