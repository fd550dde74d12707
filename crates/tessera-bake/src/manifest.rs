//! The coordinate → digest map written next to the baked tiles.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tessera_config::{ViewMode, WorldSettings};

use crate::chunk::ChunkCoord;
use crate::error::{BakeError, io_at};

pub const MANIFEST_FILE: &str = "manifest.json";
pub const GENERATION_CONFIG_FILE: &str = "generation_config.json";
pub const CHUNKS_DIR: &str = "chunks";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    /// `[width, height]` in chunks.
    pub world_dimensions_chunks: [u32; 2],
    pub chunk_resolution_pixels: u32,
    /// View mode → `"x,y"` → tile digest.
    pub chunk_map: BTreeMap<String, BTreeMap<String, String>>,
}

impl Manifest {
    pub fn new(settings: &WorldSettings) -> Self {
        Self {
            world_dimensions_chunks: [settings.world_width_chunks, settings.world_height_chunks],
            chunk_resolution_pixels: settings.chunk_resolution,
            chunk_map: BTreeMap::new(),
        }
    }

    pub fn insert(&mut self, mode: ViewMode, coord: ChunkCoord, digest: String) {
        self.chunk_map
            .entry(mode.as_str().to_owned())
            .or_default()
            .insert(coord.key(), digest);
    }

    pub fn digest(&self, mode: ViewMode, coord: ChunkCoord) -> Option<&str> {
        self.chunk_map
            .get(mode.as_str())?
            .get(&coord.key())
            .map(String::as_str)
    }

    pub fn lookup(&self, mode: ViewMode, coord: ChunkCoord) -> Result<&str, BakeError> {
        self.digest(mode, coord).ok_or(BakeError::MissingChunk {
            view_mode: mode,
            coord,
        })
    }

    /// View modes present in the map. Unknown keys are skipped.
    pub fn view_modes(&self) -> Vec<ViewMode> {
        self.chunk_map
            .keys()
            .filter_map(|key| ViewMode::from_str(key).ok())
            .collect()
    }

    /// Number of `(view mode, chunk)` entries.
    pub fn entry_count(&self) -> usize {
        self.chunk_map.values().map(BTreeMap::len).sum()
    }

    pub fn unique_digests(&self) -> BTreeSet<&str> {
        self.chunk_map
            .values()
            .flat_map(|coords| coords.values().map(String::as_str))
            .collect()
    }

    pub fn load(path: &Path) -> Result<Self, BakeError> {
        let contents = fs::read_to_string(path).map_err(io_at(path))?;
        serde_json::from_str(&contents).map_err(|source| BakeError::Json {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Write through a temporary file and a rename.
    pub fn save(&self, path: &Path) -> Result<(), BakeError> {
        let json = serde_json::to_vec(self).map_err(|source| BakeError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(io_at(&tmp))?;
        fs::rename(&tmp, path).map_err(io_at(path))
    }
}
