//! The bake configuration file and its JSON persistence.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::view_mode::ViewMode;
use crate::world::WorldParams;

/// Top-level contents of a bake config file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigFile {
    /// World shape, noise, tectonic and climate parameters.
    pub world_generation_parameters: WorldParams,
    /// Output location and worker pool settings.
    pub bake: BakeConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
}

/// Bake output configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BakeConfig {
    /// Root directory of the baked world. Defaults to `baked_worlds/seed_<seed>`.
    pub output_dir: Option<PathBuf>,
    /// View modes to bake, in manifest order.
    pub view_modes: Vec<ViewMode>,
    /// Worker thread count. Defaults to available cores minus one.
    pub workers: Option<usize>,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (e.g., "info", "debug,tessera_bake=trace").
    pub level: String,
    /// Directory for JSON log files in debug builds.
    pub log_dir: Option<PathBuf>,
}

impl Default for BakeConfig {
    fn default() -> Self {
        Self {
            output_dir: None,
            view_modes: ViewMode::ALL.to_vec(),
            workers: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            log_dir: None,
        }
    }
}

impl ConfigFile {
    /// Load a config file. A missing file is an error; there is no implicit default world.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(ConfigError::ReadError)?;
        let config: ConfigFile =
            serde_json::from_str(&contents).map_err(ConfigError::ParseError)?;
        Ok(config)
    }

    /// Save the config as pretty-printed JSON, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(ConfigError::WriteError)?;
        }
        let serialized =
            serde_json::to_string_pretty(self).map_err(ConfigError::SerializeError)?;
        std::fs::write(path, serialized).map_err(ConfigError::WriteError)?;
        Ok(())
    }

    /// The directory the world will be baked into.
    pub fn output_dir(&self) -> PathBuf {
        self.bake.output_dir.clone().unwrap_or_else(|| {
            PathBuf::from("baked_worlds")
                .join(format!("seed_{}", self.world_generation_parameters.seed))
        })
    }
}
