//! Chunk addressing and single-chunk rendering.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tessera_config::{ViewMode, WorldSettings};
use tessera_worldgen::{CoordinateGrid, RgbImage, Scope, WorldGenerator, WorldOverview, WorldgenError};

/// Extra cells computed on every side of a chunk and cropped afterwards, so
/// neighbourhood operators see real data at the chunk border.
pub const CHUNK_PADDING: usize = 1;

/// Integer chunk address; `(0, 0)` is the top-left chunk.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChunkCoord {
    pub x: u32,
    pub y: u32,
}

impl ChunkCoord {
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    /// Manifest key, `"x,y"`.
    pub fn key(self) -> String {
        format!("{},{}", self.x, self.y)
    }

    pub fn parse_key(key: &str) -> Option<Self> {
        let (x, y) = key.split_once(',')?;
        Some(Self::new(x.trim().parse().ok()?, y.trim().parse().ok()?))
    }

    /// Every chunk of a `width x height` world in row-major order.
    pub fn all(width: u32, height: u32) -> impl Iterator<Item = ChunkCoord> {
        (0..height).flat_map(move |y| (0..width).map(move |x| ChunkCoord::new(x, y)))
    }

    pub fn is_inside(self, settings: &WorldSettings) -> bool {
        self.x < settings.world_width_chunks && self.y < settings.world_height_chunks
    }
}

impl fmt::Display for ChunkCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.x, self.y)
    }
}

/// Padded grid of a chunk, addressed by global pixel index.
pub fn chunk_grid(settings: &WorldSettings, coord: ChunkCoord) -> Result<CoordinateGrid, WorldgenError> {
    let res = settings.chunk_resolution as usize;
    let pad = CHUNK_PADDING as i64;
    let side = res + 2 * CHUNK_PADDING;
    CoordinateGrid::pixel_window(
        i64::from(coord.x) * res as i64 - pad,
        i64::from(coord.y) * res as i64 - pad,
        side,
        side,
        settings.pixel_size_cm(),
    )
}

/// Renders single chunks. One per worker thread.
pub struct ChunkBaker {
    generator: WorldGenerator,
    overview: Arc<WorldOverview>,
}

impl ChunkBaker {
    pub fn new(settings: &WorldSettings, overview: Arc<WorldOverview>) -> Self {
        Self {
            generator: WorldGenerator::new(settings),
            overview,
        }
    }

    pub fn settings(&self) -> &WorldSettings {
        self.generator.settings()
    }

    /// The chunk's `resolution x resolution` image for `mode`, padding removed.
    pub fn bake_chunk(&self, coord: ChunkCoord, mode: ViewMode) -> Result<RgbImage, WorldgenError> {
        let settings = self.generator.settings();
        let grid = chunk_grid(settings, coord)?;
        let padded = self
            .generator
            .render(&grid, mode, Scope::Tiled(&self.overview))?;
        let pad = CHUNK_PADDING as u32;
        let res = settings.chunk_resolution;
        Ok(padded.crop(pad, pad, res, res))
    }
}
