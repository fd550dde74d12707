use std::collections::HashSet;
use std::fs;
use std::sync::Arc;

use tessera_bake::*;
use tessera_config::{ViewMode, WorldParams, WorldSettings};
use tessera_worldgen::{WorldGenerator, WorldOverview};

fn settings() -> WorldSettings {
    WorldParams {
        seed: 7,
        world_width_chunks: Some(3),
        world_height_chunks: Some(2),
        chunk_resolution: 10,
        num_tectonic_plates: 3,
        ..Default::default()
    }
    .resolve()
    .unwrap()
}

fn bake(dir: &std::path::Path, workers: usize) -> BakeReport {
    let mut options = BakeOptions::new(dir);
    options.workers = Some(workers);
    bake_world(&settings(), &options).unwrap()
}

#[test]
fn test_bake_layout_and_dedup() {
    let dir = tempfile::tempdir().unwrap();
    let report = bake(dir.path(), 3);
    assert_eq!(report.total_jobs, 6 * ViewMode::ALL.len() as u64);
    assert_eq!(
        report.unique_saved,
        report.uniform + report.palettized + report.full
    );

    let manifest = Manifest::load(&dir.path().join(MANIFEST_FILE)).unwrap();
    assert_eq!(manifest.world_dimensions_chunks, [3, 2]);
    assert_eq!(manifest.chunk_resolution_pixels, 10);
    assert_eq!(manifest.entry_count(), report.total_jobs as usize);

    // One file per distinct digest, and every referenced digest exists.
    let files: HashSet<String> = fs::read_dir(dir.path().join(CHUNKS_DIR))
        .unwrap()
        .map(|entry| entry.unwrap().file_name().into_string().unwrap())
        .collect();
    let expected: HashSet<String> = manifest
        .unique_digests()
        .into_iter()
        .map(|d| format!("{d}.png"))
        .collect();
    assert_eq!(files, expected);
    assert_eq!(files.len() as u64, report.unique_saved);

    let saved = WorldSettings::load(&dir.path().join(GENERATION_CONFIG_FILE)).unwrap();
    assert_eq!(saved, settings());
}

#[test]
fn test_manifest_roundtrip_matches_regeneration() {
    let dir = tempfile::tempdir().unwrap();
    bake(dir.path(), 2);
    let manifest = Manifest::load(&dir.path().join(MANIFEST_FILE)).unwrap();

    let s = settings();
    let overview = WorldOverview::compute(&WorldGenerator::new(&s)).unwrap();
    let baker = ChunkBaker::new(&s, Arc::new(overview));
    for mode in ViewMode::ALL {
        for coord in [ChunkCoord::new(0, 0), ChunkCoord::new(2, 1)] {
            let digest = manifest.lookup(mode, coord).unwrap();
            let path = tile_path(&dir.path().join(CHUNKS_DIR), digest);
            let decoded = read_tile(&path, 10).unwrap();
            assert_eq!(content_digest(&decoded), digest);
            assert_eq!(decoded, baker.bake_chunk(coord, mode).unwrap(), "{mode} {coord}");
        }
    }
}

#[test]
fn test_worker_count_does_not_change_output() {
    let one = tempfile::tempdir().unwrap();
    let many = tempfile::tempdir().unwrap();
    bake(one.path(), 1);
    bake(many.path(), 4);
    let a = Manifest::load(&one.path().join(MANIFEST_FILE)).unwrap();
    let b = Manifest::load(&many.path().join(MANIFEST_FILE)).unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_probe_after_bake_is_clean() {
    let dir = tempfile::tempdir().unwrap();
    bake(dir.path(), 2);
    let report = probe_chunks(dir.path(), &sample_coords(&settings())).unwrap();
    assert!(report.is_clean(), "{:?}", report.mismatches);
    assert_eq!(report.checked, 5 * ViewMode::ALL.len());
}

#[test]
fn test_probe_detects_tampered_tile() {
    let dir = tempfile::tempdir().unwrap();
    bake(dir.path(), 2);
    let manifest = Manifest::load(&dir.path().join(MANIFEST_FILE)).unwrap();
    let coord = ChunkCoord::new(1, 1);
    let digest = manifest.lookup(ViewMode::Elevation, coord).unwrap();

    let chunks = dir.path().join(CHUNKS_DIR);
    let other = manifest
        .unique_digests()
        .into_iter()
        .find(|d| *d != digest)
        .unwrap()
        .to_owned();
    let replacement = read_tile(&tile_path(&chunks, &other), 10).unwrap();
    write_tile(&chunks, digest, &replacement).unwrap();

    let report = probe_chunks(dir.path(), &[coord]).unwrap();
    assert!(!report.is_clean());
    assert!(
        report
            .mismatches
            .iter()
            .any(|m| m.view_mode == ViewMode::Elevation && m.digest_mismatch)
    );
}

#[test]
fn test_probe_rejects_out_of_bounds() {
    let dir = tempfile::tempdir().unwrap();
    bake(dir.path(), 2);
    let err = probe_chunks(dir.path(), &[ChunkCoord::new(3, 0)]).unwrap_err();
    assert!(matches!(err, BakeError::OutOfBounds { .. }));
}
