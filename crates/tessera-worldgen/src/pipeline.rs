//! The generation stage graph and the world-level overview chunks share.
//!
//! Stages run strictly downstream:
//! plates → uplift → terrain (bedrock, slope, soil, elevation) → climate → biomes.
//! Each is a pure function of the settings, the grid and upstream outputs.

use std::time::Instant;

use tessera_config::{ViewMode, WorldSettings};

use crate::biome::{Biome, BiomeClassifier};
use crate::climate::{ClimateLayers, ClimateModel};
use crate::color::ColorMaps;
use crate::error::WorldgenError;
use crate::field::{CoordinateGrid, Field2D};
use crate::image::RgbImage;
use crate::noise::NoiseField;
use crate::tectonics::{PlateData, TectonicModel};
use crate::terrain::{SlopeScale, TerrainLayers, TerrainSynthesizer};

/// A point in the stage graph; later stages include all earlier ones.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Stage {
    PlateLayout,
    Tectonics,
    Terrain,
    Climate,
    Biomes,
}

impl Stage {
    /// The last stage a view mode reads from.
    pub fn required_for(mode: ViewMode) -> Stage {
        match mode {
            ViewMode::Tectonic => Stage::Tectonics,
            ViewMode::Elevation | ViewMode::SoilDepth => Stage::Terrain,
            ViewMode::Temperature | ViewMode::Humidity => Stage::Climate,
            ViewMode::Terrain => Stage::Biomes,
        }
    }
}

/// Whatever stages were run for one grid.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct WorldLayers {
    pub plates: Option<PlateData>,
    pub uplift: Option<Field2D<f64>>,
    pub terrain: Option<TerrainLayers>,
    pub climate: Option<ClimateLayers>,
    pub biomes: Option<Field2D<Biome>>,
}

impl WorldLayers {
    pub fn plates(&self) -> Result<&PlateData, WorldgenError> {
        self.plates.as_ref().ok_or(WorldgenError::MissingLayer("plates"))
    }

    pub fn uplift(&self) -> Result<&Field2D<f64>, WorldgenError> {
        self.uplift.as_ref().ok_or(WorldgenError::MissingLayer("uplift"))
    }

    pub fn terrain(&self) -> Result<&TerrainLayers, WorldgenError> {
        self.terrain.as_ref().ok_or(WorldgenError::MissingLayer("terrain"))
    }

    pub fn climate(&self) -> Result<&ClimateLayers, WorldgenError> {
        self.climate.as_ref().ok_or(WorldgenError::MissingLayer("climate"))
    }

    pub fn biomes(&self) -> Result<&Field2D<Biome>, WorldgenError> {
        self.biomes.as_ref().ok_or(WorldgenError::MissingLayer("biomes"))
    }
}

/// Where the non-local inputs of a grid come from.
#[derive(Clone, Copy, Debug)]
pub enum Scope<'a> {
    /// The grid is the whole area of interest: slope uses its own maximum
    /// and humidity is computed from its own elevation.
    WholeGrid,
    /// The grid is one window of a larger world: slope and humidity factors
    /// come from the world overview so every window agrees.
    Tiled(&'a WorldOverview),
}

/// Immutable generation context for one world.
#[derive(Clone, Debug)]
pub struct WorldGenerator {
    settings: WorldSettings,
    noise: NoiseField,
    tectonics: TectonicModel,
    terrain: TerrainSynthesizer,
    climate: ClimateModel,
    biomes: BiomeClassifier,
    colors: ColorMaps,
}

impl WorldGenerator {
    pub fn new(settings: &WorldSettings) -> Self {
        Self {
            settings: settings.clone(),
            noise: NoiseField::new(settings.seed),
            tectonics: TectonicModel::new(settings),
            terrain: TerrainSynthesizer::new(settings),
            climate: ClimateModel::new(settings),
            biomes: BiomeClassifier::new(settings),
            colors: ColorMaps::new(settings),
        }
    }

    pub fn settings(&self) -> &WorldSettings {
        &self.settings
    }

    pub fn noise(&self) -> &NoiseField {
        &self.noise
    }

    pub fn tectonics(&self) -> &TectonicModel {
        &self.tectonics
    }

    pub fn terrain(&self) -> &TerrainSynthesizer {
        &self.terrain
    }

    pub fn climate(&self) -> &ClimateModel {
        &self.climate
    }

    pub fn classifier(&self) -> &BiomeClassifier {
        &self.biomes
    }

    pub fn colors(&self) -> &ColorMaps {
        &self.colors
    }

    // --- Stage functions ---

    pub fn plate_stage(&self, grid: &CoordinateGrid) -> PlateData {
        self.tectonics.plate_data(grid)
    }

    pub fn uplift_stage(&self, grid: &CoordinateGrid, plates: &PlateData) -> Field2D<f64> {
        let influence = self.tectonics.influence(plates);
        self.tectonics.uplift(&self.noise, grid, &influence)
    }

    pub fn terrain_stage(
        &self,
        grid: &CoordinateGrid,
        uplift: &Field2D<f64>,
        scope: Scope<'_>,
    ) -> TerrainLayers {
        let scale = match scope {
            Scope::WholeGrid => SlopeScale::Observed,
            Scope::Tiled(overview) => SlopeScale::Reference(overview.slope_reference()),
        };
        self.terrain.synthesize(&self.noise, grid, uplift, scale)
    }

    pub fn climate_stage(
        &self,
        grid: &CoordinateGrid,
        terrain: &TerrainLayers,
        scope: Scope<'_>,
    ) -> ClimateLayers {
        let temperature = self.climate.temperature(&self.noise, grid, &terrain.elevation);
        let humidity = match scope {
            Scope::WholeGrid => self.climate.humidity(grid, &terrain.elevation, &temperature),
            Scope::Tiled(overview) => {
                let (coastal, shadow) = overview.sample_factors(grid);
                self.climate
                    .humidity_from_factors(&temperature, &coastal, &shadow)
            }
        };
        ClimateLayers {
            temperature,
            humidity,
        }
    }

    pub fn biome_stage(&self, terrain: &TerrainLayers, climate: &ClimateLayers) -> Field2D<Biome> {
        self.biomes.classify(
            &terrain.elevation,
            &climate.temperature,
            &climate.humidity,
            &terrain.soil_depth,
        )
    }

    /// Run every stage up to and including `through`.
    pub fn generate(&self, grid: &CoordinateGrid, through: Stage, scope: Scope<'_>) -> WorldLayers {
        let mut layers = WorldLayers::default();
        let plates = self.plate_stage(grid);
        if through >= Stage::Tectonics {
            let uplift = self.uplift_stage(grid, &plates);
            if through >= Stage::Terrain {
                let terrain = self.terrain_stage(grid, &uplift, scope);
                if through >= Stage::Climate {
                    let climate = self.climate_stage(grid, &terrain, scope);
                    if through >= Stage::Biomes {
                        layers.biomes = Some(self.biome_stage(&terrain, &climate));
                    }
                    layers.climate = Some(climate);
                }
                layers.terrain = Some(terrain);
            }
            layers.uplift = Some(uplift);
        }
        layers.plates = Some(plates);
        layers
    }

    /// Generate only what `mode` needs and colorize it.
    pub fn render(
        &self,
        grid: &CoordinateGrid,
        mode: ViewMode,
        scope: Scope<'_>,
    ) -> Result<RgbImage, WorldgenError> {
        let layers = self.generate(grid, Stage::required_for(mode), scope);
        self.colors.colorize(mode, &layers)
    }
}

/// A coarse whole-world pass computed once per bake.
///
/// Holds the inputs that depend on more than a cell's neighbourhood: the
/// coastal and rain-shadow factors and the slope normalization reference.
/// Chunks sample it by world position, which keeps them seamless.
#[derive(Clone, Debug)]
pub struct WorldOverview {
    grid: CoordinateGrid,
    coastal: Field2D<f64>,
    shadow: Field2D<f64>,
    slope_reference: f64,
}

impl WorldOverview {
    pub fn compute(generator: &WorldGenerator) -> Result<Self, WorldgenError> {
        let started = Instant::now();
        let settings = generator.settings();
        let (px_w, px_h) = settings.world_pixels();
        let factor = settings.humidity.distance_map_resolution_factor;
        let cols = ((px_w as f64 * factor).round() as usize).max(2);
        let rows = ((px_h as f64 * factor).round() as usize).max(2);
        let grid =
            CoordinateGrid::spanning(settings.world_width_cm(), settings.world_height_cm(), cols, rows)?;

        let plates = generator.plate_stage(&grid);
        let uplift = generator.uplift_stage(&grid, &plates);
        let terrain = generator.terrain_stage(&grid, &uplift, Scope::WholeGrid);
        let slope_reference = TerrainSynthesizer::gradient_magnitude(&terrain.bedrock, &grid).max();
        let coastal = generator.climate().coastal_factor(&terrain.elevation, &grid);
        let shadow = generator.climate().shadow_factor(&terrain.elevation, &grid);

        tracing::debug!(
            "World overview {}x{} computed in {:.1} ms (slope reference {:.3e})",
            cols,
            rows,
            started.elapsed().as_secs_f64() * 1000.0,
            slope_reference
        );

        Ok(Self {
            grid,
            coastal,
            shadow,
            slope_reference,
        })
    }

    pub fn grid(&self) -> &CoordinateGrid {
        &self.grid
    }

    pub fn slope_reference(&self) -> f64 {
        self.slope_reference
    }

    /// Bilinear samples of the coastal and shadow factors at every cell of `grid`.
    pub fn sample_factors(&self, grid: &CoordinateGrid) -> (Field2D<f64>, Field2D<f64>) {
        let (w, h) = grid.shape();
        let mut coastal = Field2D::filled(w, h, 0.0);
        let mut shadow = Field2D::filled(w, h, 0.0);
        for row in 0..h {
            for col in 0..w {
                let (c, r) = self.grid.fractional_index(grid.x(col), grid.y(row));
                coastal.set(col, row, self.coastal.sample_bilinear(c, r));
                shadow.set(col, row, self.shadow.sample_bilinear(c, r));
            }
        }
        (coastal, shadow)
    }
}
