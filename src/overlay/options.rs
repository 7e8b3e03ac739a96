use serde::{Deserialize, Serialize};

/// Number of link colour schemes available.
pub const COLOUR_SCHEMES: u8 = 4;
/// Largest cache margin in screen pixels.
pub const MAX_PIXEL_MARGIN: i32 = 4096;
/// Largest line width in pixels.
pub const MAX_LINE_SCALE: u32 = 16;
/// Largest squared hit distance.
pub const MAX_HIT_DISTANCE_SQ: i64 = 1 << 20;
/// Largest picker bounding box slack in pixels.
pub const MAX_HIT_SLOP: i32 = 64;

/// Tunables of the overlay cache, renderer and picker.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OverlayOptions {
    /// Screen pixels cached beyond each edge of the visible widget.
    pub pixel_margin: i32,
    /// Line width in pixels.
    pub line_scale: u32,
    /// Largest squared distance from a link that still counts as a hit.
    pub hit_distance_sq: i64,
    /// Slack around a link's bounding box before the distance test.
    pub hit_slop: i32,
    /// Whether links with capacity but no usage are pickable.
    pub inspect: bool,
    /// Index into the link colour schemes.
    pub colour_scheme: u8,
    /// Whether vehicles drive on the right; moves the coloured line.
    pub drive_on_right: bool,
    /// Supply at which a station dot reaches its full size.
    pub dot_quantity_cap: u32,
}

impl Default for OverlayOptions {
    fn default() -> Self {
        Self {
            pixel_margin: 256,
            line_scale: 1,
            hit_distance_sq: 16,
            hit_slop: 2,
            inspect: false,
            colour_scheme: 0,
            drive_on_right: false,
            dot_quantity_cap: 200,
        }
    }
}

impl OverlayOptions {
    /// Sets the cache margin in screen pixels.
    pub fn pixel_margin(mut self, pixels: i32) -> Self {
        self.pixel_margin = pixels.clamp(0, MAX_PIXEL_MARGIN);
        self
    }

    /// Sets the line width.
    pub fn line_scale(mut self, scale: u32) -> Self {
        self.line_scale = scale.clamp(1, MAX_LINE_SCALE);
        self
    }

    /// Sets the squared hit distance.
    pub fn hit_distance_sq(mut self, distance_sq: i64) -> Self {
        self.hit_distance_sq = distance_sq.clamp(0, MAX_HIT_DISTANCE_SQ);
        self
    }

    /// Sets the bounding box slack of the picker.
    pub fn hit_slop(mut self, slop: i32) -> Self {
        self.hit_slop = slop.clamp(0, MAX_HIT_SLOP);
        self
    }

    /// Toggles inspect mode.
    pub fn inspect(mut self, inspect: bool) -> Self {
        self.inspect = inspect;
        self
    }

    /// Picks the link colour scheme; out of range values clamp to the last.
    pub fn colour_scheme(mut self, scheme: u8) -> Self {
        self.colour_scheme = scheme.min(COLOUR_SCHEMES - 1);
        self
    }

    /// Sets the driving side.
    pub fn drive_on_right(mut self, right: bool) -> Self {
        self.drive_on_right = right;
        self
    }

    /// Sets the supply at which station dots stop growing.
    pub fn dot_quantity_cap(mut self, cap: u32) -> Self {
        self.dot_quantity_cap = cap.max(1);
        self
    }

    /// Line width in pixels as used by the geometry code.
    pub fn line_width(&self) -> i32 {
        self.line_scale.clamp(1, MAX_LINE_SCALE) as i32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_toml_keeps_defaults() {
        let opts: OverlayOptions = toml::from_str("line_scale = 2\ninspect = true").unwrap();
        assert_eq!(opts.line_scale, 2);
        assert!(opts.inspect);
        assert_eq!(opts.pixel_margin, 256);
        assert_eq!(opts.hit_distance_sq, 16);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(toml::from_str::<OverlayOptions>("margin = 3").is_err());
    }

    #[test]
    fn builder_clamps_values() {
        let opts = OverlayOptions::default()
            .colour_scheme(9)
            .line_scale(0)
            .dot_quantity_cap(0);
        assert_eq!(opts.colour_scheme, 3);
        assert_eq!(opts.line_width(), 1);
        assert_eq!(opts.dot_quantity_cap, 1);
    }

    #[test]
    fn builder_caps_large_values() {
        let opts = OverlayOptions::default()
            .pixel_margin(i32::MAX)
            .line_scale(u32::MAX)
            .hit_distance_sq(i64::MAX)
            .hit_slop(i32::MAX);
        assert_eq!(opts.pixel_margin, MAX_PIXEL_MARGIN);
        assert_eq!(opts.line_scale, MAX_LINE_SCALE);
        assert_eq!(opts.hit_distance_sq, MAX_HIT_DISTANCE_SQ);
        assert_eq!(opts.hit_slop, MAX_HIT_SLOP);
    }

    #[test]
    fn line_width_is_bounded_for_unnormalized_options() {
        let opts = OverlayOptions {
            line_scale: u32::MAX,
            ..OverlayOptions::default()
        };
        assert_eq!(opts.line_width(), MAX_LINE_SCALE as i32);
    }
}
