//! Configuration system for Tessera world baking.
//!
//! A bake is driven by a single JSON file. The human-facing
//! [`WorldParams`] section uses kilometres and is resolved exactly once into
//! an immutable [`WorldSettings`] value in internal units (centimetres), which
//! is what every generator and worker consumes.

mod cli;
mod config;
mod error;
mod settings;
mod view_mode;
mod world;

pub use cli::CliArgs;
pub use config::{BakeConfig, ConfigFile, LoggingConfig};
pub use error::ConfigError;
pub use settings::{
    BiomeThresholds, CM_PER_KM, ClimateSettings, EdgeMode, EdgeSettings, HumiditySettings,
    NoiseParams, TectonicSettings, TerrainLevels, WorldSettings,
};
pub use view_mode::ViewMode;
pub use world::WorldParams;
