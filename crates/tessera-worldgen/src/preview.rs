//! Whole-world preview with a per-stage cache.
//!
//! Every stage is keyed by a fingerprint of the settings it and its upstream
//! stages read. Changing a setting only recomputes the stages whose key moved.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use tessera_config::{NoiseParams, ViewMode, WorldSettings};

use crate::error::WorldgenError;
use crate::field::CoordinateGrid;
use crate::image::RgbImage;
use crate::pipeline::{Scope, Stage, WorldGenerator, WorldLayers};

const STAGES: [Stage; 5] = [
    Stage::PlateLayout,
    Stage::Tectonics,
    Stage::Terrain,
    Stage::Climate,
    Stage::Biomes,
];

// ---------------------------------------------------------------------------
// Fingerprints
// ---------------------------------------------------------------------------

struct Fingerprint(DefaultHasher);

impl Fingerprint {
    fn new() -> Self {
        Self(DefaultHasher::new())
    }

    fn float(&mut self, value: f64) -> &mut Self {
        value.to_bits().hash(&mut self.0);
        self
    }

    fn int(&mut self, value: u64) -> &mut Self {
        value.hash(&mut self.0);
        self
    }

    fn noise(&mut self, params: &NoiseParams) -> &mut Self {
        self.float(params.scale_cm)
            .int(u64::from(params.octaves))
            .float(params.persistence)
            .float(params.lacunarity)
    }

    fn finish(&self) -> u64 {
        self.0.finish()
    }
}

/// Key covering every setting read by `stage` and the stages before it.
fn stage_key(s: &WorldSettings, stage: Stage) -> u64 {
    let mut fp = Fingerprint::new();
    fp.int(s.seed)
        .float(s.world_width_cm())
        .float(s.world_height_cm())
        .int(u64::from(s.tectonics.plate_count));

    if stage >= Stage::Tectonics {
        fp.noise(&s.uplift_noise)
            .float(s.tectonics.influence_radius_cm)
            .float(s.tectonics.uplift_strength);
    }
    if stage >= Stage::Terrain {
        fp.noise(&s.base_noise)
            .noise(&s.detail_noise)
            .float(s.detail_noise_weight)
            .float(s.terrain_amplitude)
            .float(s.max_soil_depth)
            .float(s.levels.water)
            .int(s.edge.mode as u64)
            .float(s.edge.blend_distance);
    }
    if stage >= Stage::Climate {
        let c = &s.climate;
        let h = &s.humidity;
        fp.noise(&s.climate_noise)
            .float(c.target_sea_level_temp_c)
            .float(c.seasonal_variation_c)
            .float(c.lapse_rate_c_per_unit_elevation)
            .float(c.polar_temperature_drop_c)
            .float(c.equator_y_pos_factor)
            .float(c.min_global_temp_c)
            .float(c.max_global_temp_c)
            .float(h.prevailing_wind_direction_degrees)
            .float(h.rain_shadow_check_distance_cm)
            .float(h.rain_shadow_strength)
            .float(h.rain_shadow_mountain_threshold)
            .float(h.max_coastal_distance_cm)
            .float(h.coastal_falloff_rate)
            .float(h.min_absolute_humidity)
            .float(h.max_absolute_humidity);
    }
    if stage >= Stage::Biomes {
        let b = &s.biomes;
        fp.float(s.levels.sand)
            .float(s.levels.grass)
            .float(s.levels.dirt)
            .float(b.tundra_max_temp)
            .float(b.taiga_max_temp)
            .float(b.temperate_max_temp)
            .float(b.desert_max_humidity)
            .float(b.grassland_max_humidity)
            .float(b.forest_max_humidity)
            .float(b.hot_desert_min_temp)
            .float(s.climate.snow_line_temp_c)
            .float(s.climate.ice_formation_temp_c);
    }
    fp.finish()
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// An interactive preview of the whole world at a fixed resolution.
pub struct PreviewSession {
    generator: WorldGenerator,
    grid: CoordinateGrid,
    cols: usize,
    rows: usize,
    layers: WorldLayers,
    keys: [Option<u64>; 5],
    last_recomputed: Vec<Stage>,
}

impl PreviewSession {
    pub fn new(settings: &WorldSettings, cols: usize, rows: usize) -> Result<Self, WorldgenError> {
        let grid = Self::preview_grid(settings, cols, rows)?;
        Ok(Self {
            generator: WorldGenerator::new(settings),
            grid,
            cols,
            rows,
            layers: WorldLayers::default(),
            keys: [None; 5],
            last_recomputed: Vec::new(),
        })
    }

    fn preview_grid(
        settings: &WorldSettings,
        cols: usize,
        rows: usize,
    ) -> Result<CoordinateGrid, WorldgenError> {
        CoordinateGrid::spanning(settings.world_width_cm(), settings.world_height_cm(), cols, rows)
    }

    pub fn settings(&self) -> &WorldSettings {
        self.generator.settings()
    }

    pub fn grid(&self) -> &CoordinateGrid {
        &self.grid
    }

    /// Stages recomputed by the most recent [`color_array`](Self::color_array) call.
    pub fn last_recomputed(&self) -> &[Stage] {
        &self.last_recomputed
    }

    /// Replace the settings. Cached stages are kept until a render finds
    /// their key stale.
    pub fn set_settings(&mut self, settings: &WorldSettings) -> Result<(), WorldgenError> {
        self.grid = Self::preview_grid(settings, self.cols, self.rows)?;
        self.generator = WorldGenerator::new(settings);
        Ok(())
    }

    /// Bring every stage up to `through` in line with the current settings.
    fn refresh(&mut self, through: Stage) -> Result<(), WorldgenError> {
        self.last_recomputed.clear();
        for (i, stage) in STAGES.into_iter().enumerate() {
            if stage > through {
                break;
            }
            let key = stage_key(self.generator.settings(), stage);
            if self.keys[i] == Some(key) {
                continue;
            }
            self.run_stage(stage)?;
            self.keys[i] = Some(key);
            self.last_recomputed.push(stage);
        }
        Ok(())
    }

    fn run_stage(&mut self, stage: Stage) -> Result<(), WorldgenError> {
        let generator = &self.generator;
        let grid = &self.grid;
        let layers = &mut self.layers;
        match stage {
            Stage::PlateLayout => {
                layers.plates = Some(generator.plate_stage(grid));
            }
            Stage::Tectonics => {
                let uplift = generator.uplift_stage(grid, layers.plates()?);
                layers.uplift = Some(uplift);
            }
            Stage::Terrain => {
                let terrain = generator.terrain_stage(grid, layers.uplift()?, Scope::WholeGrid);
                layers.terrain = Some(terrain);
            }
            Stage::Climate => {
                let climate = generator.climate_stage(grid, layers.terrain()?, Scope::WholeGrid);
                layers.climate = Some(climate);
            }
            Stage::Biomes => {
                let biomes = generator.biome_stage(layers.terrain()?, layers.climate()?);
                layers.biomes = Some(biomes);
            }
        }
        Ok(())
    }

    /// Colorized preview of `mode`, recomputing only stale stages.
    pub fn color_array(&mut self, mode: ViewMode) -> Result<RgbImage, WorldgenError> {
        self.refresh(Stage::required_for(mode))?;
        if !self.last_recomputed.is_empty() {
            tracing::debug!("Preview {} recomputed {:?}", mode, self.last_recomputed);
        }
        self.generator.colors().colorize(mode, &self.layers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_config::WorldParams;

    fn params() -> WorldParams {
        WorldParams {
            world_width_chunks: Some(3),
            world_height_chunks: Some(2),
            ..Default::default()
        }
    }

    fn session(p: &WorldParams) -> PreviewSession {
        PreviewSession::new(&p.resolve().unwrap(), 24, 16).unwrap()
    }

    #[test]
    fn test_first_render_runs_required_stages() {
        let mut s = session(&params());
        s.color_array(ViewMode::Elevation).unwrap();
        assert_eq!(
            s.last_recomputed(),
            &[Stage::PlateLayout, Stage::Tectonics, Stage::Terrain]
        );
        s.color_array(ViewMode::Terrain).unwrap();
        assert_eq!(s.last_recomputed(), &[Stage::Climate, Stage::Biomes]);
    }

    #[test]
    fn test_unchanged_settings_hit_cache() {
        let mut s = session(&params());
        let first = s.color_array(ViewMode::Terrain).unwrap();
        let second = s.color_array(ViewMode::Terrain).unwrap();
        assert!(s.last_recomputed().is_empty());
        assert_eq!(first, second);
    }

    #[test]
    fn test_change_invalidates_only_downstream() {
        let mut p = params();
        let mut s = session(&p);
        s.color_array(ViewMode::Terrain).unwrap();

        p.snow_line_temp_c = -2.0;
        s.set_settings(&p.resolve().unwrap()).unwrap();
        s.color_array(ViewMode::Terrain).unwrap();
        assert_eq!(s.last_recomputed(), &[Stage::Biomes]);

        p.seasonal_variation_c = 10.0;
        s.set_settings(&p.resolve().unwrap()).unwrap();
        s.color_array(ViewMode::Elevation).unwrap();
        assert!(s.last_recomputed().is_empty());
        s.color_array(ViewMode::Terrain).unwrap();
        assert_eq!(s.last_recomputed(), &[Stage::Climate, Stage::Biomes]);

        p.mountain_uplift_strength = 0.5;
        s.set_settings(&p.resolve().unwrap()).unwrap();
        s.color_array(ViewMode::Tectonic).unwrap();
        assert_eq!(s.last_recomputed(), &[Stage::Tectonics]);
    }

    #[test]
    fn test_cached_result_matches_fresh_generation() {
        let mut p = params();
        let mut s = session(&p);
        s.color_array(ViewMode::Humidity).unwrap();
        p.rain_shadow_strength = 0.4;
        let settings = p.resolve().unwrap();
        s.set_settings(&settings).unwrap();
        let cached = s.color_array(ViewMode::Humidity).unwrap();

        let grid = CoordinateGrid::spanning(
            settings.world_width_cm(),
            settings.world_height_cm(),
            24,
            16,
        )
        .unwrap();
        let fresh = WorldGenerator::new(&settings)
            .render(&grid, ViewMode::Humidity, Scope::WholeGrid)
            .unwrap();
        assert_eq!(cached, fresh);
    }

    #[test]
    fn test_stage_keys_nest() {
        let a = params().resolve().unwrap();
        let b = WorldParams {
            humidity_coastal_falloff_rate: 1.0,
            ..params()
        }
        .resolve()
        .unwrap();
        assert_eq!(stage_key(&a, Stage::Terrain), stage_key(&b, Stage::Terrain));
        assert_ne!(stage_key(&a, Stage::Climate), stage_key(&b, Stage::Climate));
        assert_ne!(stage_key(&a, Stage::Biomes), stage_key(&b, Stage::Biomes));
    }
}
