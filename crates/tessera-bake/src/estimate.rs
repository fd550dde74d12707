//! Bake size estimate from a whole-world preview image.

use std::collections::HashSet;

use tessera_worldgen::RgbImage;

use crate::error::BakeError;
use crate::tile::{Tier, content_digest};

/// Rough on-disk sizes of one tile per tier, in KB.
pub const UNIFORM_TILE_KB: f64 = 0.5;
pub const PALETTIZED_TILE_KB: f64 = 4.0;
pub const FULL_TILE_KB: f64 = 15.0;

/// Unique preview cells by tier.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SizeEstimate {
    pub cells: usize,
    pub uniform: usize,
    pub palettized: usize,
    pub full: usize,
}

impl SizeEstimate {
    pub fn unique(&self) -> usize {
        self.uniform + self.palettized + self.full
    }

    pub fn kilobytes_per_mode(&self) -> f64 {
        self.uniform as f64 * UNIFORM_TILE_KB
            + self.palettized as f64 * PALETTIZED_TILE_KB
            + self.full as f64 * FULL_TILE_KB
    }

    pub fn total_gigabytes(&self, view_modes: usize) -> f64 {
        self.kilobytes_per_mode() * view_modes as f64 / (1024.0 * 1024.0)
    }
}

/// Split `preview` into a `cols x rows` grid of equal cells, deduplicate the
/// cells by digest and tally the tier each unique cell would be stored in.
///
/// Pixels left over by the integer division are ignored.
pub fn estimate_bake_size(preview: &RgbImage, cols: u32, rows: u32) -> Result<SizeEstimate, BakeError> {
    let (width, height) = preview.dimensions();
    let too_small = || BakeError::PreviewTooSmall {
        width,
        height,
        cols,
        rows,
    };
    let cell_w = width.checked_div(cols).filter(|&w| w > 0).ok_or_else(too_small)?;
    let cell_h = height.checked_div(rows).filter(|&h| h > 0).ok_or_else(too_small)?;

    let mut seen = HashSet::new();
    let mut estimate = SizeEstimate::default();
    for row in 0..rows {
        for col in 0..cols {
            let cell = preview.crop(col * cell_w, row * cell_h, cell_w, cell_h);
            estimate.cells += 1;
            if !seen.insert(content_digest(&cell)) {
                continue;
            }
            match Tier::classify(&cell) {
                Tier::Uniform => estimate.uniform += 1,
                Tier::Palettized => estimate.palettized += 1,
                Tier::Full => estimate.full += 1,
            }
        }
    }
    tracing::info!(
        "Bake estimate: {} unique of {} cells, {:.1} KB per view mode",
        estimate.unique(),
        estimate.cells,
        estimate.kilobytes_per_mode()
    );
    Ok(estimate)
}
