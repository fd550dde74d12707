//! Chunk baking: tiling, content-addressed tiles, the manifest and a
//! parallel coordinator, plus tools to verify and size a bake.

mod chunk;
mod coordinator;
mod error;
mod estimate;
mod manifest;
mod probe;
mod tile;

pub use chunk::{CHUNK_PADDING, ChunkBaker, ChunkCoord, chunk_grid};
pub use coordinator::{
    BakeOptions, BakeReport, CancelToken, JobSummary, ModeReport, bake_world, default_worker_count,
};
pub use error::BakeError;
pub use estimate::{
    FULL_TILE_KB, PALETTIZED_TILE_KB, SizeEstimate, UNIFORM_TILE_KB, estimate_bake_size,
};
pub use manifest::{CHUNKS_DIR, GENERATION_CONFIG_FILE, MANIFEST_FILE, Manifest};
pub use probe::{ProbeMismatch, ProbeReport, probe_chunks, sample_coords};
pub use tile::{PALETTE_LIMIT, Tier, content_digest, encode_tile, read_tile, tile_path, write_tile};
