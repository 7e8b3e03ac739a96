//! Visibility tests of points and segments against a padded region.
//!
//! Both tests are conservative: they may report something visible that lies
//! slightly outside the padded region, but never miss anything inside it.

use crate::types::{Point, Rect};

const INSIDE: u8 = 0;
const LEFT: u8 = 1;
const RIGHT: u8 = 2;
const BOTTOM: u8 = 4;
const TOP: u8 = 8;

/// Upper bound on clipping rounds; every round removes one out code bit on an
/// exact line, rounding can only add a few more.
const MAX_CLIP_ROUNDS: usize = 8;

/// True if `pt` lies strictly inside `region` grown by `padding`.
pub fn point_visible(pt: Point, region: &Rect, padding: i32) -> bool {
    let (x, y, padding) = (pt.x as i64, pt.y as i64, padding as i64);
    x > region.left as i64 - padding
        && y > region.top as i64 - padding
        && x < region.right as i64 + padding
        && y < region.bottom as i64 + padding
}

/// True if the segment `a`-`b` may cross `region` grown by `padding`. The
/// padded boundary counts as inside, for a single point as well.
///
/// Cohen-Sutherland: endpoints are classified into out codes, trivially
/// accepted or rejected, otherwise `a` is clipped against one boundary at a
/// time and re-classified.
pub fn segment_visible(a: Point, b: Point, region: &Rect, padding: i32) -> bool {
    let left = region.left as i64 - padding as i64;
    let right = region.right as i64 + padding as i64;
    let top = region.top as i64 - padding as i64;
    let bottom = region.bottom as i64 + padding as i64;

    let out_code = |x: i64, y: i64| -> u8 {
        let mut code = INSIDE;
        if x < left {
            code |= LEFT;
        } else if x > right {
            code |= RIGHT;
        }
        if y < top {
            code |= TOP;
        } else if y > bottom {
            code |= BOTTOM;
        }
        code
    };

    let (mut x0, mut y0) = (a.x as i64, a.y as i64);
    let (x1, y1) = (b.x as i64, b.y as i64);
    let mut c0 = out_code(x0, y0);
    let c1 = out_code(x1, y1);
    if a == b {
        return c0 == INSIDE;
    }

    for _ in 0..MAX_CLIP_ROUNDS {
        if c0 == INSIDE || c1 == INSIDE {
            return true;
        }
        if c0 & c1 != 0 {
            return false;
        }
        if c0 & TOP != 0 {
            let Some(x) = interpolate(x0, x1, y0, y1, top) else {
                return true;
            };
            x0 = x;
            y0 = top;
        } else if c0 & BOTTOM != 0 {
            let Some(x) = interpolate(x0, x1, y0, y1, bottom) else {
                return true;
            };
            x0 = x;
            y0 = bottom;
        } else if c0 & RIGHT != 0 {
            let Some(y) = interpolate(y0, y1, x0, x1, right) else {
                return true;
            };
            y0 = y;
            x0 = right;
        } else if c0 & LEFT != 0 {
            let Some(y) = interpolate(y0, y1, x0, x1, left) else {
                return true;
            };
            y0 = y;
            x0 = left;
        }
        c0 = out_code(x0, y0);
    }
    true
}

/// Value of the dependent axis where the segment meets `bound` on the
/// independent axis. `None` if the segment runs parallel to the boundary.
fn interpolate(dep0: i64, dep1: i64, ind0: i64, ind1: i64, bound: i64) -> Option<i64> {
    let span = ind1 - ind0;
    if span == 0 {
        return None;
    }
    Some(dep0 + (dep1 - dep0) * (bound - ind0) / span)
}
