//! Deterministic 2D world synthesis: noise, tectonics, terrain, climate and biomes.

mod color;
mod distance;
mod error;
mod field;
mod image;
mod noise;
mod pipeline;
mod preview;

pub mod biome;
pub mod climate;
pub mod tectonics;
pub mod terrain;

pub use biome::{Biome, BiomeClassifier, ClimateRegion, ClimateTable};
pub use climate::{ClimateLayers, ClimateModel, saturation_humidity};
pub use color::{ColorMaps, HUMIDITY_STEPS, biome_color};
pub use distance::distance_to_nearest;
pub use error::WorldgenError;
pub use field::{CoordinateGrid, Field2D};
pub use image::{Rgb, RgbImage};
pub use noise::{NoiseChannel, NoiseField, PERMUTATION_SIZE, PermutationTable};
pub use pipeline::{Scope, Stage, WorldGenerator, WorldLayers, WorldOverview};
pub use preview::PreviewSession;
pub use tectonics::{PlateData, PlateIndex, PlateSet, TectonicModel};
pub use terrain::{SlopeScale, TerrainLayers, TerrainSynthesizer};
