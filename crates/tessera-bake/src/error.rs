//! Errors raised while baking, reading back or probing a world.

use std::path::{Path, PathBuf};

use tessera_config::{ConfigError, ViewMode};
use tessera_worldgen::WorldgenError;

use crate::chunk::ChunkCoord;

#[derive(Debug, thiserror::Error)]
pub enum BakeError {
    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode tile: {0}")]
    PngEncode(#[from] png::EncodingError),

    #[error("failed to decode tile {}: {source}", path.display())]
    PngDecode {
        path: PathBuf,
        #[source]
        source: png::DecodingError,
    },

    #[error("unexpected tile layout in {}: {reason}", path.display())]
    TileFormat { path: PathBuf, reason: String },

    #[error("invalid JSON in {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Worldgen(#[from] WorldgenError),

    /// One `(chunk, view mode)` job failed; the bake was aborted.
    #[error("chunk {coord} ({view_mode}) failed: {source}")]
    Job {
        coord: ChunkCoord,
        view_mode: ViewMode,
        #[source]
        source: Box<BakeError>,
    },

    #[error("bake cancelled")]
    Cancelled,

    #[error("failed to spawn bake worker: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("a bake worker panicked")]
    WorkerPanic,

    #[error("manifest has no {view_mode} entry for chunk {coord}")]
    MissingChunk { view_mode: ViewMode, coord: ChunkCoord },

    #[error("chunk {coord} is outside the {width}x{height} world")]
    OutOfBounds {
        coord: ChunkCoord,
        width: u32,
        height: u32,
    },

    #[error("preview of {width}x{height} cannot be split into a {cols}x{rows} grid")]
    PreviewTooSmall {
        width: u32,
        height: u32,
        cols: u32,
        rows: u32,
    },
}

/// Attach `path` to an I/O error.
pub(crate) fn io_at(path: &Path) -> impl FnOnce(std::io::Error) -> BakeError + '_ {
    move |source| BakeError::Io {
        path: path.to_path_buf(),
        source,
    }
}
