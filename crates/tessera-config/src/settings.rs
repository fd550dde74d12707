//! Resolved world settings in internal units.
//!
//! All lengths are centimetres. A [`WorldSettings`] together with its seed
//! fully determines every generated layer, and it round-trips through JSON so
//! a bake can be regenerated exactly from its `generation_config.json`.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Conversion factor from human-facing kilometres to internal centimetres.
pub const CM_PER_KM: f64 = 100_000.0;

/// Fractal noise parameters for one logical noise channel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NoiseParams {
    /// Feature size in centimetres; coordinates are divided by this.
    pub scale_cm: f64,
    /// Number of octaves to accumulate.
    pub octaves: u32,
    /// Amplitude multiplier between octaves.
    pub persistence: f64,
    /// Frequency multiplier between octaves.
    pub lacunarity: f64,
}

/// Normalized elevation thresholds separating the terrain bands.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainLevels {
    /// Below this is water.
    pub water: f64,
    /// Top of the beach band.
    pub sand: f64,
    /// Top of the vegetated band.
    pub grass: f64,
    /// Top of the dirt band; everything above is mountain.
    pub dirt: f64,
}

impl Default for TerrainLevels {
    fn default() -> Self {
        Self {
            water: 0.1,
            sand: 0.11,
            grass: 0.38,
            dirt: 0.49,
        }
    }
}

/// Climate thresholds for reclassifying the vegetated band.
///
/// Temperatures are °C, humidities g/m³.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BiomeThresholds {
    pub tundra_max_temp: f64,
    pub taiga_max_temp: f64,
    pub temperate_max_temp: f64,
    pub desert_max_humidity: f64,
    pub grassland_max_humidity: f64,
    pub forest_max_humidity: f64,
    pub hot_desert_min_temp: f64,
}

impl Default for BiomeThresholds {
    fn default() -> Self {
        Self {
            tundra_max_temp: -5.0,
            taiga_max_temp: 3.0,
            temperate_max_temp: 18.0,
            desert_max_humidity: 5.0,
            grassland_max_humidity: 10.0,
            forest_max_humidity: 17.0,
            hot_desert_min_temp: 20.0,
        }
    }
}

/// How elevation is shaped near the world borders.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeMode {
    /// No shaping.
    #[default]
    Default,
    /// Fade elevation toward zero, producing an island surrounded by ocean.
    Island,
    /// Raise elevation toward one, producing a basin ringed by mountains.
    Valley,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EdgeSettings {
    pub mode: EdgeMode,
    /// Width of the falloff band as a fraction of the shorter world dimension.
    pub blend_distance: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TectonicSettings {
    pub plate_count: u32,
    /// Boundary distance at which influence reaches zero.
    pub influence_radius_cm: f64,
    pub uplift_strength: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClimateSettings {
    pub target_sea_level_temp_c: f64,
    pub seasonal_variation_c: f64,
    pub lapse_rate_c_per_unit_elevation: f64,
    pub polar_temperature_drop_c: f64,
    /// Equator row as a fraction of world height.
    pub equator_y_pos_factor: f64,
    pub min_global_temp_c: f64,
    pub max_global_temp_c: f64,
    /// Land at or below this temperature is snow.
    pub snow_line_temp_c: f64,
    /// Water at or below this temperature is ice.
    pub ice_formation_temp_c: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HumiditySettings {
    /// Direction the wind blows from: 0 = east, 90 = north.
    pub prevailing_wind_direction_degrees: f64,
    pub rain_shadow_check_distance_cm: f64,
    pub rain_shadow_strength: f64,
    pub rain_shadow_mountain_threshold: f64,
    pub max_coastal_distance_cm: f64,
    pub coastal_falloff_rate: f64,
    pub min_absolute_humidity: f64,
    pub max_absolute_humidity: f64,
    /// Resolution of the world overview relative to full bake resolution.
    pub distance_map_resolution_factor: f64,
}

/// Fully resolved, validated settings for one world.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldSettings {
    pub seed: u64,
    pub world_width_chunks: u32,
    pub world_height_chunks: u32,
    pub chunk_size_cm: f64,
    /// Pixels along one chunk edge.
    pub chunk_resolution: u32,
    pub base_noise: NoiseParams,
    pub detail_noise: NoiseParams,
    pub detail_noise_weight: f64,
    pub climate_noise: NoiseParams,
    pub uplift_noise: NoiseParams,
    pub terrain_amplitude: f64,
    pub max_soil_depth: f64,
    pub tectonics: TectonicSettings,
    pub levels: TerrainLevels,
    pub climate: ClimateSettings,
    pub humidity: HumiditySettings,
    pub biomes: BiomeThresholds,
    pub edge: EdgeSettings,
}

impl WorldSettings {
    pub fn world_width_cm(&self) -> f64 {
        f64::from(self.world_width_chunks) * self.chunk_size_cm
    }

    pub fn world_height_cm(&self) -> f64 {
        f64::from(self.world_height_chunks) * self.chunk_size_cm
    }

    /// Edge length of one bake pixel.
    pub fn pixel_size_cm(&self) -> f64 {
        self.chunk_size_cm / f64::from(self.chunk_resolution)
    }

    /// Total bake pixels along each world axis.
    pub fn world_pixels(&self) -> (u64, u64) {
        let res = u64::from(self.chunk_resolution);
        (
            u64::from(self.world_width_chunks) * res,
            u64::from(self.world_height_chunks) * res,
        )
    }

    pub fn total_chunks(&self) -> u64 {
        u64::from(self.world_width_chunks) * u64::from(self.world_height_chunks)
    }

    /// Read settings previously written with [`WorldSettings::save`].
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(ConfigError::ReadError)?;
        let settings: WorldSettings =
            serde_json::from_str(&contents).map_err(ConfigError::ParseError)?;
        log::info!("Loaded world settings from {}", path.display());
        Ok(settings)
    }

    /// Write settings as pretty-printed JSON.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let serialized =
            serde_json::to_string_pretty(self).map_err(ConfigError::SerializeError)?;
        std::fs::write(path, serialized).map_err(ConfigError::WriteError)
    }
}
