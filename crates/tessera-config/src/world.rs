//! Human-facing world generation parameters as they appear in the config file.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::settings::{
    BiomeThresholds, CM_PER_KM, ClimateSettings, EdgeMode, EdgeSettings, HumiditySettings,
    NoiseParams, TectonicSettings, TerrainLevels, WorldSettings,
};

/// The `world_generation_parameters` section of a config file.
///
/// Every field has a default except the world dimensions, which must be
/// given explicitly. Feature scales and distances are in kilometres.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldParams {
    pub seed: u64,
    /// World width in chunks. Required.
    pub world_width_chunks: Option<u32>,
    /// World height in chunks. Required.
    pub world_height_chunks: Option<u32>,
    /// Chunk edge length in centimetres.
    pub chunk_size_cm: f64,
    /// Pixels along one chunk edge.
    pub chunk_resolution: u32,

    /// Continent-scale features.
    pub terrain_base_feature_scale_km: f64,
    pub base_noise_octaves: u32,
    pub base_noise_persistence: f64,
    pub base_noise_lacunarity: f64,

    /// Hill- and ridge-scale features layered on the continents.
    pub terrain_detail_feature_scale_km: f64,
    pub detail_noise_octaves: u32,
    pub detail_noise_persistence: f64,
    pub detail_noise_lacunarity: f64,
    pub detail_noise_weight: f64,

    pub climate_feature_scale_km: f64,
    pub climate_noise_octaves: u32,
    pub climate_noise_persistence: f64,
    pub climate_noise_lacunarity: f64,

    /// Exponent applied to normalized noise; higher values sharpen peaks.
    pub terrain_amplitude: f64,

    pub num_tectonic_plates: u32,
    pub mountain_uplift_feature_scale_km: f64,
    pub mountain_uplift_noise_octaves: u32,
    pub mountain_uplift_noise_persistence: f64,
    pub mountain_uplift_noise_lacunarity: f64,
    pub mountain_influence_radius_km: f64,
    pub mountain_uplift_strength: f64,

    /// Maximum soil thickness in normalized elevation units.
    pub max_soil_depth_units: f64,

    pub target_sea_level_temp_c: f64,
    pub seasonal_variation_c: f64,
    pub lapse_rate_c_per_unit_elevation: f64,
    pub polar_temperature_drop_c: f64,
    pub equator_y_pos_factor: f64,
    pub min_global_temp_c: f64,
    pub max_global_temp_c: f64,
    pub snow_line_temp_c: f64,
    pub ice_formation_temp_c: f64,

    pub prevailing_wind_direction_degrees: f64,
    pub rain_shadow_check_distance_km: f64,
    pub rain_shadow_strength: f64,
    pub rain_shadow_mountain_threshold: f64,
    pub max_coastal_distance_km: f64,
    pub humidity_coastal_falloff_rate: f64,
    pub min_absolute_humidity_g_m3: f64,
    pub max_absolute_humidity_g_m3: f64,
    pub distance_map_resolution_factor: f64,

    pub terrain_levels: TerrainLevels,
    pub biome_thresholds: BiomeThresholds,

    pub world_edge_mode: EdgeMode,
    pub world_edge_blend_distance: f64,
}

impl Default for WorldParams {
    fn default() -> Self {
        Self {
            seed: 1337,
            world_width_chunks: None,
            world_height_chunks: None,
            chunk_size_cm: 10_000.0,
            chunk_resolution: 100,

            terrain_base_feature_scale_km: 40.0,
            base_noise_octaves: 4,
            base_noise_persistence: 0.5,
            base_noise_lacunarity: 2.0,

            terrain_detail_feature_scale_km: 2.5,
            detail_noise_octaves: 6,
            detail_noise_persistence: 0.5,
            detail_noise_lacunarity: 2.0,
            detail_noise_weight: 0.25,

            climate_feature_scale_km: 120.0,
            climate_noise_octaves: 3,
            climate_noise_persistence: 0.5,
            climate_noise_lacunarity: 2.0,

            terrain_amplitude: 2.5,

            num_tectonic_plates: 2,
            mountain_uplift_feature_scale_km: 15.0,
            mountain_uplift_noise_octaves: 4,
            mountain_uplift_noise_persistence: 0.5,
            mountain_uplift_noise_lacunarity: 2.0,
            mountain_influence_radius_km: 0.05,
            mountain_uplift_strength: 0.8,

            max_soil_depth_units: 0.05,

            target_sea_level_temp_c: 15.0,
            seasonal_variation_c: 30.0,
            lapse_rate_c_per_unit_elevation: 40.0,
            polar_temperature_drop_c: 30.0,
            equator_y_pos_factor: 0.5,
            min_global_temp_c: -50.0,
            max_global_temp_c: 50.0,
            snow_line_temp_c: -8.0,
            ice_formation_temp_c: -10.0,

            prevailing_wind_direction_degrees: 180.0,
            rain_shadow_check_distance_km: 200.0,
            rain_shadow_strength: 0.8,
            rain_shadow_mountain_threshold: 0.3,
            max_coastal_distance_km: 150.0,
            humidity_coastal_falloff_rate: 2.5,
            min_absolute_humidity_g_m3: 0.0,
            max_absolute_humidity_g_m3: 30.0,
            distance_map_resolution_factor: 0.1,

            terrain_levels: TerrainLevels::default(),
            biome_thresholds: BiomeThresholds::default(),

            world_edge_mode: EdgeMode::Default,
            world_edge_blend_distance: 0.1,
        }
    }
}

impl WorldParams {
    /// Validate every field and convert to internal units.
    ///
    /// Fails on the first problem found so no generation work starts from a
    /// half-valid configuration.
    pub fn resolve(&self) -> Result<WorldSettings, ConfigError> {
        let world_width_chunks = self
            .world_width_chunks
            .ok_or(ConfigError::MissingField("world_width_chunks"))?;
        let world_height_chunks = self
            .world_height_chunks
            .ok_or(ConfigError::MissingField("world_height_chunks"))?;
        at_least_one("world_width_chunks", world_width_chunks)?;
        at_least_one("world_height_chunks", world_height_chunks)?;
        at_least_one("chunk_resolution", self.chunk_resolution)?;
        positive("chunk_size_cm", self.chunk_size_cm)?;
        at_least_one("num_tectonic_plates", self.num_tectonic_plates)?;

        let base_noise = noise_params(
            "terrain_base_feature_scale_km",
            self.terrain_base_feature_scale_km,
            self.base_noise_octaves,
            self.base_noise_persistence,
            self.base_noise_lacunarity,
        )?;
        let detail_noise = noise_params(
            "terrain_detail_feature_scale_km",
            self.terrain_detail_feature_scale_km,
            self.detail_noise_octaves,
            self.detail_noise_persistence,
            self.detail_noise_lacunarity,
        )?;
        let climate_noise = noise_params(
            "climate_feature_scale_km",
            self.climate_feature_scale_km,
            self.climate_noise_octaves,
            self.climate_noise_persistence,
            self.climate_noise_lacunarity,
        )?;
        let uplift_noise = noise_params(
            "mountain_uplift_feature_scale_km",
            self.mountain_uplift_feature_scale_km,
            self.mountain_uplift_noise_octaves,
            self.mountain_uplift_noise_persistence,
            self.mountain_uplift_noise_lacunarity,
        )?;

        non_negative("detail_noise_weight", self.detail_noise_weight)?;
        positive("terrain_amplitude", self.terrain_amplitude)?;
        positive("mountain_influence_radius_km", self.mountain_influence_radius_km)?;
        non_negative("mountain_uplift_strength", self.mountain_uplift_strength)?;
        non_negative("max_soil_depth_units", self.max_soil_depth_units)?;
        unit_interval("equator_y_pos_factor", self.equator_y_pos_factor)?;
        if !(self.min_global_temp_c > MIN_SUPPORTED_TEMP_C) {
            return Err(invalid(
                "min_global_temp_c",
                format!(
                    "{} is not above {MIN_SUPPORTED_TEMP_C} °C",
                    self.min_global_temp_c
                ),
            ));
        }
        ordered(
            "max_global_temp_c",
            self.min_global_temp_c,
            self.max_global_temp_c,
        )?;
        non_negative("rain_shadow_check_distance_km", self.rain_shadow_check_distance_km)?;
        unit_interval("rain_shadow_strength", self.rain_shadow_strength)?;
        positive("max_coastal_distance_km", self.max_coastal_distance_km)?;
        positive("humidity_coastal_falloff_rate", self.humidity_coastal_falloff_rate)?;
        ordered(
            "max_absolute_humidity_g_m3",
            self.min_absolute_humidity_g_m3,
            self.max_absolute_humidity_g_m3,
        )?;
        if !(self.distance_map_resolution_factor > 0.0 && self.distance_map_resolution_factor <= 1.0)
        {
            return Err(invalid(
                "distance_map_resolution_factor",
                format!("{} is outside (0, 1]", self.distance_map_resolution_factor),
            ));
        }
        if !(0.0..=0.5).contains(&self.world_edge_blend_distance) {
            return Err(invalid(
                "world_edge_blend_distance",
                format!("{} is outside [0, 0.5]", self.world_edge_blend_distance),
            ));
        }

        let levels = self.terrain_levels;
        let ascending = 0.0 < levels.water
            && levels.water <= levels.sand
            && levels.sand <= levels.grass
            && levels.grass <= levels.dirt
            && levels.dirt <= 1.0;
        if !ascending {
            return Err(invalid(
                "terrain_levels",
                "levels must ascend as 0 < water <= sand <= grass <= dirt <= 1".to_string(),
            ));
        }

        Ok(WorldSettings {
            seed: self.seed,
            world_width_chunks,
            world_height_chunks,
            chunk_size_cm: self.chunk_size_cm,
            chunk_resolution: self.chunk_resolution,
            base_noise,
            detail_noise,
            detail_noise_weight: self.detail_noise_weight,
            climate_noise,
            uplift_noise,
            terrain_amplitude: self.terrain_amplitude,
            max_soil_depth: self.max_soil_depth_units,
            tectonics: TectonicSettings {
                plate_count: self.num_tectonic_plates,
                influence_radius_cm: self.mountain_influence_radius_km * CM_PER_KM,
                uplift_strength: self.mountain_uplift_strength,
            },
            levels,
            climate: ClimateSettings {
                target_sea_level_temp_c: self.target_sea_level_temp_c,
                seasonal_variation_c: self.seasonal_variation_c,
                lapse_rate_c_per_unit_elevation: self.lapse_rate_c_per_unit_elevation,
                polar_temperature_drop_c: self.polar_temperature_drop_c,
                equator_y_pos_factor: self.equator_y_pos_factor,
                min_global_temp_c: self.min_global_temp_c,
                max_global_temp_c: self.max_global_temp_c,
                snow_line_temp_c: self.snow_line_temp_c,
                ice_formation_temp_c: self.ice_formation_temp_c,
            },
            humidity: HumiditySettings {
                prevailing_wind_direction_degrees: self.prevailing_wind_direction_degrees,
                rain_shadow_check_distance_cm: self.rain_shadow_check_distance_km * CM_PER_KM,
                rain_shadow_strength: self.rain_shadow_strength,
                rain_shadow_mountain_threshold: self.rain_shadow_mountain_threshold,
                max_coastal_distance_cm: self.max_coastal_distance_km * CM_PER_KM,
                coastal_falloff_rate: self.humidity_coastal_falloff_rate,
                min_absolute_humidity: self.min_absolute_humidity_g_m3,
                max_absolute_humidity: self.max_absolute_humidity_g_m3,
                distance_map_resolution_factor: self.distance_map_resolution_factor,
            },
            biomes: self.biome_thresholds,
            edge: EdgeSettings {
                mode: self.world_edge_mode,
                blend_distance: self.world_edge_blend_distance,
            },
        })
    }
}

// --- Validation helpers ---

/// Coldest allowed temperature clamp. The saturation curve diverges at −243.5 °C.
const MIN_SUPPORTED_TEMP_C: f64 = -100.0;

fn invalid(field: &'static str, reason: String) -> ConfigError {
    ConfigError::Invalid { field, reason }
}

fn at_least_one(field: &'static str, value: u32) -> Result<(), ConfigError> {
    if value == 0 {
        return Err(invalid(field, "must be at least 1".to_string()));
    }
    Ok(())
}

fn positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if !(value.is_finite() && value > 0.0) {
        return Err(invalid(field, format!("{value} is not a positive number")));
    }
    Ok(())
}

fn non_negative(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if !(value.is_finite() && value >= 0.0) {
        return Err(invalid(field, format!("{value} is negative")));
    }
    Ok(())
}

fn unit_interval(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if !(0.0..=1.0).contains(&value) {
        return Err(invalid(field, format!("{value} is outside [0, 1]")));
    }
    Ok(())
}

fn ordered(field: &'static str, min: f64, max: f64) -> Result<(), ConfigError> {
    if !(min < max) {
        return Err(invalid(field, format!("{max} is not above the minimum {min}")));
    }
    Ok(())
}

fn noise_params(
    field: &'static str,
    scale_km: f64,
    octaves: u32,
    persistence: f64,
    lacunarity: f64,
) -> Result<NoiseParams, ConfigError> {
    positive(field, scale_km)?;
    at_least_one(field, octaves)?;
    positive(field, persistence)?;
    positive(field, lacunarity)?;
    Ok(NoiseParams {
        scale_cm: scale_km * CM_PER_KM,
        octaves,
        persistence,
        lacunarity,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sized(width: u32, height: u32) -> WorldParams {
        WorldParams {
            world_width_chunks: Some(width),
            world_height_chunks: Some(height),
            ..Default::default()
        }
    }

    #[test]
    fn test_resolve_converts_km_to_cm() {
        let settings = sized(10, 10).resolve().unwrap();
        assert_eq!(settings.base_noise.scale_cm, 4_000_000.0);
        assert_eq!(settings.detail_noise.scale_cm, 250_000.0);
        assert_eq!(settings.climate_noise.scale_cm, 12_000_000.0);
        assert_eq!(settings.tectonics.influence_radius_cm, 5_000.0);
        assert_eq!(settings.humidity.max_coastal_distance_cm, 15_000_000.0);
        assert_eq!(settings.seed, 1337);
    }

    #[test]
    fn test_missing_dimensions_are_fatal() {
        let err = WorldParams::default().resolve().unwrap_err();
        assert!(matches!(err, ConfigError::MissingField("world_width_chunks")));

        let params = WorldParams {
            world_width_chunks: Some(3),
            ..Default::default()
        };
        let err = params.resolve().unwrap_err();
        assert!(matches!(err, ConfigError::MissingField("world_height_chunks")));
    }

    #[test]
    fn test_zero_plates_rejected() {
        let params = WorldParams {
            num_tectonic_plates: 0,
            ..sized(2, 2)
        };
        let err = params.resolve().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "num_tectonic_plates",
                ..
            }
        ));
    }

    #[test]
    fn test_unordered_levels_rejected() {
        let params = WorldParams {
            terrain_levels: TerrainLevels {
                water: 0.5,
                sand: 0.2,
                ..TerrainLevels::default()
            },
            ..sized(2, 2)
        };
        assert!(params.resolve().is_err());
    }

    #[test]
    fn test_inverted_temperature_bounds_rejected() {
        let params = WorldParams {
            min_global_temp_c: 20.0,
            max_global_temp_c: 10.0,
            ..sized(2, 2)
        };
        let err = params.resolve().unwrap_err();
        assert!(err.to_string().contains("max_global_temp_c"));
    }

    #[test]
    fn test_extreme_cold_clamp_rejected() {
        let params = WorldParams {
            min_global_temp_c: -250.0,
            ..sized(2, 2)
        };
        let err = params.resolve().unwrap_err();
        assert!(err.to_string().contains("min_global_temp_c"));

        let nan = WorldParams {
            min_global_temp_c: f64::NAN,
            ..sized(2, 2)
        };
        assert!(nan.resolve().is_err());
        assert!(sized(2, 2).resolve().is_ok());
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let json = r#"{ "world_width_chunks": 2, "world_height_chunks": 5, "seed": 7,
                        "terrain_levels": { "water": 0.105 } }"#;
        let params: WorldParams = serde_json::from_str(json).unwrap();
        assert_eq!(params.seed, 7);
        assert_eq!(params.chunk_resolution, 100);
        assert_eq!(params.terrain_levels.water, 0.105);
        assert_eq!(params.terrain_levels.sand, 0.11);
        assert_eq!(params.terrain_levels.dirt, 0.49);
        let settings = params.resolve().unwrap();
        assert_eq!(settings.world_height_chunks, 5);
    }
}
