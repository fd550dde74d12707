//! Content digests and tiered PNG tile storage.
//!
//! A tile is named after the SHA-256 of its raw RGB pixels, so identical
//! chunks anywhere in the world share one file. The encoding is picked after
//! hashing and never affects the name.

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufReader, Cursor};
use std::path::{Path, PathBuf};

use serde::Serialize;
use sha2::{Digest, Sha256};
use tessera_worldgen::{Rgb, RgbImage};

use crate::error::{BakeError, io_at};

/// Largest color count stored as an indexed PNG.
pub const PALETTE_LIMIT: usize = 256;

/// Storage encoding of a tile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    /// One color; stored as a 1x1 RGB PNG.
    Uniform,
    /// At most [`PALETTE_LIMIT`] colors; stored as an indexed PNG.
    Palettized,
    /// Stored as a full RGB PNG.
    Full,
}

impl Tier {
    pub fn classify(image: &RgbImage) -> Tier {
        if image.uniform_color().is_some() {
            Tier::Uniform
        } else if image.palette(PALETTE_LIMIT).is_some() {
            Tier::Palettized
        } else {
            Tier::Full
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Tier::Uniform => "uniform",
            Tier::Palettized => "palettized",
            Tier::Full => "full",
        }
    }
}

/// Lowercase hex SHA-256 of the image's row-major RGB bytes.
pub fn content_digest(image: &RgbImage) -> String {
    Sha256::digest(image.as_bytes())
        .iter()
        .map(|byte| format!("{byte:02x}"))
        .collect()
}

pub fn tile_path(dir: &Path, digest: &str) -> PathBuf {
    dir.join(format!("{digest}.png"))
}

fn write_png(
    out: &mut Vec<u8>,
    width: u32,
    height: u32,
    color: png::ColorType,
    palette: Option<Vec<u8>>,
    data: &[u8],
) -> Result<(), png::EncodingError> {
    let mut encoder = png::Encoder::new(Cursor::new(out), width, height);
    encoder.set_color(color);
    encoder.set_depth(png::BitDepth::Eight);
    if let Some(palette) = palette {
        encoder.set_palette(palette);
    }
    let mut writer = encoder.write_header()?;
    writer.write_image_data(data)?;
    writer.finish()
}

/// Encode `image` in the smallest tier that reproduces it exactly.
pub fn encode_tile(image: &RgbImage) -> Result<(Tier, Vec<u8>), BakeError> {
    let mut bytes = Vec::new();
    let tier = if let Some(color) = image.uniform_color() {
        write_png(&mut bytes, 1, 1, png::ColorType::Rgb, None, &color)?;
        Tier::Uniform
    } else if let Some(palette) = image.palette(PALETTE_LIMIT) {
        let index: HashMap<Rgb, u8> = palette
            .iter()
            .enumerate()
            .map(|(i, &color)| (color, i as u8))
            .collect();
        let indices: Vec<u8> = image.pixels().map(|p| index[&p]).collect();
        let flat: Vec<u8> = palette.iter().flatten().copied().collect();
        write_png(
            &mut bytes,
            image.width(),
            image.height(),
            png::ColorType::Indexed,
            Some(flat),
            &indices,
        )?;
        Tier::Palettized
    } else {
        write_png(
            &mut bytes,
            image.width(),
            image.height(),
            png::ColorType::Rgb,
            None,
            image.as_bytes(),
        )?;
        Tier::Full
    };
    Ok((tier, bytes))
}

/// Write `<dir>/<digest>.png` through a temporary file and a rename.
///
/// Rewriting an existing digest replaces the file with identical bytes.
pub fn write_tile(dir: &Path, digest: &str, image: &RgbImage) -> Result<Tier, BakeError> {
    let (tier, bytes) = encode_tile(image)?;
    let path = tile_path(dir, digest);
    let tmp = dir.join(format!(".{digest}.{}.tmp", std::process::id()));
    fs::write(&tmp, &bytes).map_err(io_at(&tmp))?;
    fs::rename(&tmp, &path).map_err(io_at(&path))?;
    Ok(tier)
}

/// Decode a tile of any tier back into a `resolution x resolution` image.
pub fn read_tile(path: &Path, resolution: u32) -> Result<RgbImage, BakeError> {
    let decode_err = |source| BakeError::PngDecode {
        path: path.to_path_buf(),
        source,
    };
    let format_err = |reason: String| BakeError::TileFormat {
        path: path.to_path_buf(),
        reason,
    };

    let file = File::open(path).map_err(io_at(path))?;
    let mut decoder = png::Decoder::new(BufReader::new(file));
    decoder.set_transformations(png::Transformations::EXPAND);
    let mut reader = decoder.read_info().map_err(decode_err)?;
    let mut buf = vec![0; reader.output_buffer_size()];
    let info = reader.next_frame(&mut buf).map_err(decode_err)?;
    if info.color_type != png::ColorType::Rgb || info.bit_depth != png::BitDepth::Eight {
        return Err(format_err(format!(
            "expected 8-bit RGB, found {:?} at {:?}",
            info.color_type, info.bit_depth
        )));
    }
    buf.truncate(info.buffer_size());
    let image = RgbImage::from_raw(info.width, info.height, buf)?;

    match image.dimensions() {
        (1, 1) => Ok(RgbImage::filled(resolution, resolution, image.get_pixel(0, 0))),
        (w, h) if w == resolution && h == resolution => Ok(image),
        (w, h) => Err(format_err(format!(
            "expected {resolution}x{resolution} pixels, found {w}x{h}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn striped(width: u32, height: u32, colors: u32) -> RgbImage {
        let mut image = RgbImage::new(width, height);
        for y in 0..height {
            for x in 0..width {
                let c = (y * width + x) % colors;
                image.set_pixel(x, y, [c as u8, (c >> 8) as u8, 7]);
            }
        }
        image
    }

    #[test]
    fn test_digest_is_lowercase_sha256() {
        let digest = content_digest(&RgbImage::new(0, 0));
        assert_eq!(
            digest,
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_digest_differs_per_content() {
        let a = RgbImage::filled(4, 4, [1, 2, 3]);
        let b = RgbImage::filled(4, 4, [1, 2, 4]);
        assert_ne!(content_digest(&a), content_digest(&b));
        assert_eq!(content_digest(&a), content_digest(&a.clone()));
    }

    #[test]
    fn test_tier_classification() {
        assert_eq!(Tier::classify(&RgbImage::filled(8, 8, [9, 9, 9])), Tier::Uniform);
        assert_eq!(Tier::classify(&striped(16, 16, 256)), Tier::Palettized);
        assert_eq!(Tier::classify(&striped(32, 32, 257)), Tier::Full);
    }

    #[test]
    fn test_uniform_tile_is_one_pixel_but_named_by_full_buffer() {
        let dir = tempfile::tempdir().unwrap();
        let image = RgbImage::filled(10, 10, [20, 40, 120]);
        let digest = content_digest(&image);
        assert_ne!(digest, content_digest(&RgbImage::filled(1, 1, [20, 40, 120])));

        let tier = write_tile(dir.path(), &digest, &image).unwrap();
        assert_eq!(tier, Tier::Uniform);

        let decoder = png::Decoder::new(File::open(tile_path(dir.path(), &digest)).unwrap());
        let reader = decoder.read_info().unwrap();
        assert_eq!((reader.info().width, reader.info().height), (1, 1));

        assert_eq!(read_tile(&tile_path(dir.path(), &digest), 10).unwrap(), image);
    }

    #[test]
    fn test_every_tier_decodes_exactly() {
        let dir = tempfile::tempdir().unwrap();
        for (image, expected) in [
            (striped(20, 20, 37), Tier::Palettized),
            (striped(20, 20, 400), Tier::Full),
        ] {
            let digest = content_digest(&image);
            assert_eq!(write_tile(dir.path(), &digest, &image).unwrap(), expected);
            let decoded = read_tile(&tile_path(dir.path(), &digest), 20).unwrap();
            assert_eq!(decoded, image);
        }
    }

    #[test]
    fn test_rewrite_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let image = striped(8, 8, 5);
        let digest = content_digest(&image);
        write_tile(dir.path(), &digest, &image).unwrap();
        let first = fs::read(tile_path(dir.path(), &digest)).unwrap();
        write_tile(dir.path(), &digest, &image).unwrap();
        assert_eq!(fs::read(tile_path(dir.path(), &digest)).unwrap(), first);
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_wrong_resolution_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let image = striped(8, 8, 5);
        let digest = content_digest(&image);
        write_tile(dir.path(), &digest, &image).unwrap();
        let err = read_tile(&tile_path(dir.path(), &digest), 16).unwrap_err();
        assert!(matches!(err, BakeError::TileFormat { .. }));
    }
}
