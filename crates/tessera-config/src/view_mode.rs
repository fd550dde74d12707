//! The set of renderable layers a chunk can be baked for.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A view mode selects which generated layer is colorized into tile pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewMode {
    /// Classified biomes through the terrain palette.
    Terrain,
    /// Surface temperature in °C.
    Temperature,
    /// Absolute humidity in g/m³.
    Humidity,
    /// Final elevation as grayscale.
    Elevation,
    /// Tectonic uplift as grayscale.
    Tectonic,
    /// Soil depth as grayscale.
    SoilDepth,
}

impl ViewMode {
    /// Every view mode, in manifest order.
    pub const ALL: [ViewMode; 6] = [
        ViewMode::Terrain,
        ViewMode::Temperature,
        ViewMode::Humidity,
        ViewMode::Elevation,
        ViewMode::Tectonic,
        ViewMode::SoilDepth,
    ];

    /// The key used for this mode in `manifest.json` and on the command line.
    pub fn as_str(self) -> &'static str {
        match self {
            ViewMode::Terrain => "terrain",
            ViewMode::Temperature => "temperature",
            ViewMode::Humidity => "humidity",
            ViewMode::Elevation => "elevation",
            ViewMode::Tectonic => "tectonic",
            ViewMode::SoilDepth => "soil_depth",
        }
    }
}

impl fmt::Display for ViewMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ViewMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ViewMode::ALL
            .into_iter()
            .find(|mode| mode.as_str() == s)
            .ok_or_else(|| format!("unknown view mode `{s}`"))
    }
}
