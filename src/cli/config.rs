//! `lgo.toml`: optional settings file for the command line tool.
//!
//! ```toml
//! [overlay]
//! pixel_margin = 128
//! colour_scheme = 2
//! inspect = true
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{LinkGraphError, Result};
use crate::overlay::OverlayOptions;

/// File looked up in the working directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "lgo.toml";

/// Parsed configuration file.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CliConfig {
    /// Overlay tunables.
    pub overlay: OverlayOptions,
}

impl CliConfig {
    /// Loads `explicit` if given, otherwise [`DEFAULT_CONFIG_FILE`] when it
    /// exists, otherwise the defaults. An explicit path must exist.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => {
                let fallback = PathBuf::from(DEFAULT_CONFIG_FILE);
                if !fallback.exists() {
                    return Ok(Self::default());
                }
                fallback
            }
        };
        let contents = fs::read_to_string(&path).map_err(|err| {
            LinkGraphError::Config(format!("failed to read {}: {err}", path.display()))
        })?;
        let config = Self::from_toml(&contents)
            .map_err(|err| LinkGraphError::Config(format!("{}: {err}", path.display())))?;
        debug!(path = %path.display(), "cli.config.loaded");
        Ok(config)
    }

    /// Parses configuration text.
    pub fn from_toml(contents: &str) -> std::result::Result<Self, toml::de::Error> {
        let raw: Self = toml::from_str(contents)?;
        Ok(raw.normalized())
    }

    // route values through the builder so out-of-range numbers get clamped
    fn normalized(self) -> Self {
        let o = self.overlay;
        let overlay = OverlayOptions::default()
            .pixel_margin(o.pixel_margin)
            .line_scale(o.line_scale)
            .hit_distance_sq(o.hit_distance_sq)
            .hit_slop(o.hit_slop)
            .inspect(o.inspect)
            .colour_scheme(o.colour_scheme)
            .drive_on_right(o.drive_on_right)
            .dot_quantity_cap(o.dot_quantity_cap);
        Self { overlay }
    }
}
