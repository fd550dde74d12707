//! Fidelity probe: compare baked tiles against a fresh recomputation.

use std::path::Path;
use std::sync::Arc;

use tessera_config::{ViewMode, WorldSettings};
use tessera_worldgen::{WorldGenerator, WorldOverview};

use crate::chunk::{ChunkBaker, ChunkCoord};
use crate::error::BakeError;
use crate::manifest::{CHUNKS_DIR, GENERATION_CONFIG_FILE, MANIFEST_FILE, Manifest};
use crate::tile::{content_digest, read_tile, tile_path};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProbeMismatch {
    pub coord: ChunkCoord,
    pub view_mode: ViewMode,
    pub differing_pixels: usize,
    /// The decoded tile no longer hashes to its file name.
    pub digest_mismatch: bool,
}

#[derive(Clone, Debug, Default)]
pub struct ProbeReport {
    pub checked: usize,
    pub mismatches: Vec<ProbeMismatch>,
}

impl ProbeReport {
    pub fn is_clean(&self) -> bool {
        self.mismatches.is_empty()
    }
}

/// The four corner chunks and the centre chunk, without duplicates.
pub fn sample_coords(settings: &WorldSettings) -> Vec<ChunkCoord> {
    let (w, h) = (settings.world_width_chunks, settings.world_height_chunks);
    let mut coords = vec![
        ChunkCoord::new(0, 0),
        ChunkCoord::new(w - 1, 0),
        ChunkCoord::new(0, h - 1),
        ChunkCoord::new(w - 1, h - 1),
        ChunkCoord::new(w / 2, h / 2),
    ];
    coords.sort();
    coords.dedup();
    coords
}

/// Decode the baked tile of every view mode at each of `coords` and compare
/// it pixel by pixel with the chunk regenerated from `generation_config.json`.
pub fn probe_chunks(root: &Path, coords: &[ChunkCoord]) -> Result<ProbeReport, BakeError> {
    let manifest = Manifest::load(&root.join(MANIFEST_FILE))?;
    let settings = WorldSettings::load(&root.join(GENERATION_CONFIG_FILE))?;
    let overview = WorldOverview::compute(&WorldGenerator::new(&settings))?;
    let baker = ChunkBaker::new(&settings, Arc::new(overview));
    let chunks_dir = root.join(CHUNKS_DIR);
    let resolution = manifest.chunk_resolution_pixels;

    let mut report = ProbeReport::default();
    for &coord in coords {
        if !coord.is_inside(&settings) {
            return Err(BakeError::OutOfBounds {
                coord,
                width: settings.world_width_chunks,
                height: settings.world_height_chunks,
            });
        }
        for view_mode in manifest.view_modes() {
            let digest = manifest.lookup(view_mode, coord)?;
            let baked = read_tile(&tile_path(&chunks_dir, digest), resolution)?;
            let fresh = baker.bake_chunk(coord, view_mode)?;
            let differing_pixels = baked
                .pixels()
                .zip(fresh.pixels())
                .filter(|(a, b)| a != b)
                .count();
            let digest_mismatch = content_digest(&baked) != digest;
            report.checked += 1;
            if differing_pixels > 0 || digest_mismatch {
                tracing::warn!(
                    "Chunk {} ({}) differs from its bake in {} pixels",
                    coord,
                    view_mode,
                    differing_pixels
                );
                report.mismatches.push(ProbeMismatch {
                    coord,
                    view_mode,
                    differing_pixels,
                    digest_mismatch,
                });
            } else {
                tracing::debug!("Chunk {} ({}) matches", coord, view_mode);
            }
        }
    }
    tracing::info!(
        "Probed {} chunk views, {} mismatched",
        report.checked,
        report.mismatches.len()
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_config::WorldParams;

    #[test]
    fn test_sample_coords_dedup_small_worlds() {
        let one = WorldParams {
            world_width_chunks: Some(1),
            world_height_chunks: Some(1),
            ..Default::default()
        }
        .resolve()
        .unwrap();
        assert_eq!(sample_coords(&one), vec![ChunkCoord::new(0, 0)]);

        let wide = WorldParams {
            world_width_chunks: Some(5),
            world_height_chunks: Some(3),
            ..Default::default()
        }
        .resolve()
        .unwrap();
        let coords = sample_coords(&wide);
        assert_eq!(coords.len(), 5);
        assert!(coords.contains(&ChunkCoord::new(2, 1)));
        assert!(coords.contains(&ChunkCoord::new(4, 2)));
    }
}
