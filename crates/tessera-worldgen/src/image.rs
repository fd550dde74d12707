//! An RGB pixel buffer for colorized layers and baked tiles.

use std::collections::HashSet;

use crate::error::WorldgenError;

pub type Rgb = [u8; 3];

/// A 2D image stored as row-major RGB8 pixels.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RgbImage {
    width: u32,
    height: u32,
    /// Length = `width * height * 3`.
    pixels: Vec<u8>,
}

impl RgbImage {
    /// A black image.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; (width * height * 3) as usize],
        }
    }

    /// Every pixel set to `color`.
    pub fn filled(width: u32, height: u32, color: Rgb) -> Self {
        let pixels = color
            .iter()
            .copied()
            .cycle()
            .take((width * height * 3) as usize)
            .collect();
        Self {
            width,
            height,
            pixels,
        }
    }

    /// Wrap raw row-major RGB bytes.
    pub fn from_raw(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self, WorldgenError> {
        if pixels.len() != (width * height * 3) as usize {
            return Err(WorldgenError::ShapeMismatch {
                width: width as usize,
                height: height as usize,
                actual: pixels.len() / 3,
            });
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// # Panics
    ///
    /// Panics if `x >= width` or `y >= height`.
    pub fn set_pixel(&mut self, x: u32, y: u32, color: Rgb) {
        let idx = ((y * self.width + x) * 3) as usize;
        self.pixels[idx..idx + 3].copy_from_slice(&color);
    }

    /// # Panics
    ///
    /// Panics if `x >= width` or `y >= height`.
    pub fn get_pixel(&self, x: u32, y: u32) -> Rgb {
        let idx = ((y * self.width + x) * 3) as usize;
        [self.pixels[idx], self.pixels[idx + 1], self.pixels[idx + 2]]
    }

    /// Returns `(width, height)`.
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Raw row-major RGB bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.pixels
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.pixels
    }

    pub fn pixels(&self) -> impl Iterator<Item = Rgb> + '_ {
        self.pixels.chunks_exact(3).map(|p| [p[0], p[1], p[2]])
    }

    /// The single color filling the whole image, if there is one.
    pub fn uniform_color(&self) -> Option<Rgb> {
        let mut pixels = self.pixels();
        let first = pixels.next()?;
        pixels.all(|p| p == first).then_some(first)
    }

    /// Distinct colors in first-seen order, or `None` once more than `limit` appear.
    pub fn palette(&self, limit: usize) -> Option<Vec<Rgb>> {
        let mut seen = HashSet::new();
        let mut palette = Vec::new();
        for p in self.pixels() {
            if seen.insert(p) {
                if palette.len() == limit {
                    return None;
                }
                palette.push(p);
            }
        }
        Some(palette)
    }

    /// Copy out a sub-rectangle.
    ///
    /// # Panics
    ///
    /// Panics if the rectangle extends past the image.
    pub fn crop(&self, x: u32, y: u32, width: u32, height: u32) -> RgbImage {
        assert!(x + width <= self.width && y + height <= self.height);
        let mut pixels = Vec::with_capacity((width * height * 3) as usize);
        for row in y..y + height {
            let start = ((row * self.width + x) * 3) as usize;
            pixels.extend_from_slice(&self.pixels[start..start + (width * 3) as usize]);
        }
        RgbImage {
            width,
            height,
            pixels,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_correct_dimensions() {
        let image = RgbImage::new(256, 128);
        assert_eq!(image.dimensions(), (256, 128));
        assert_eq!(image.as_bytes().len(), 256 * 128 * 3);
    }

    #[test]
    fn test_get_pixel_roundtrip() {
        let mut image = RgbImage::new(8, 8);
        image.set_pixel(2, 3, [10, 20, 30]);
        assert_eq!(image.get_pixel(2, 3), [10, 20, 30]);
        assert_eq!(image.as_bytes()[(3 * 8 + 2) * 3], 10);
    }

    #[test]
    fn test_from_raw_checks_length() {
        assert!(RgbImage::from_raw(2, 2, vec![0; 12]).is_ok());
        assert!(RgbImage::from_raw(2, 2, vec![0; 11]).is_err());
    }

    #[test]
    fn test_uniform_color() {
        let mut image = RgbImage::filled(4, 4, [1, 2, 3]);
        assert_eq!(image.uniform_color(), Some([1, 2, 3]));
        image.set_pixel(3, 3, [1, 2, 4]);
        assert_eq!(image.uniform_color(), None);
    }

    #[test]
    fn test_palette_limit() {
        let mut image = RgbImage::new(4, 1);
        for x in 0..4 {
            image.set_pixel(x, 0, [x as u8, 0, 0]);
        }
        assert_eq!(image.palette(4).unwrap().len(), 4);
        assert!(image.palette(3).is_none());
    }

    #[test]
    fn test_crop() {
        let mut image = RgbImage::new(5, 5);
        image.set_pixel(1, 1, [9, 9, 9]);
        image.set_pixel(3, 3, [7, 7, 7]);
        let cropped = image.crop(1, 1, 3, 3);
        assert_eq!(cropped.dimensions(), (3, 3));
        assert_eq!(cropped.get_pixel(0, 0), [9, 9, 9]);
        assert_eq!(cropped.get_pixel(2, 2), [7, 7, 7]);
    }
}
