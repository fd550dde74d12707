//! Dense 2D fields and the coordinate grids they are sampled on.

use crate::error::WorldgenError;

/// A row-major 2D array with one value per grid cell.
///
/// Column index runs along world x, row index along world y.
#[derive(Clone, Debug, PartialEq)]
pub struct Field2D<T> {
    width: usize,
    height: usize,
    data: Vec<T>,
}

impl<T: Copy> Field2D<T> {
    /// A field with every cell set to `value`.
    pub fn filled(width: usize, height: usize, value: T) -> Self {
        Self {
            width,
            height,
            data: vec![value; width * height],
        }
    }

    /// Wrap a row-major buffer.
    pub fn from_vec(width: usize, height: usize, data: Vec<T>) -> Result<Self, WorldgenError> {
        if data.len() != width * height {
            return Err(WorldgenError::ShapeMismatch {
                width,
                height,
                actual: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Build a field by evaluating `f(col, row)` for every cell.
    pub fn from_fn(width: usize, height: usize, mut f: impl FnMut(usize, usize) -> T) -> Self {
        let mut data = Vec::with_capacity(width * height);
        for row in 0..height {
            for col in 0..width {
                data.push(f(col, row));
            }
        }
        Self {
            width,
            height,
            data,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns `(width, height)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// # Panics
    ///
    /// Panics if `col >= width` or `row >= height`.
    #[inline]
    pub fn get(&self, col: usize, row: usize) -> T {
        self.data[row * self.width + col]
    }

    /// # Panics
    ///
    /// Panics if `col >= width` or `row >= height`.
    #[inline]
    pub fn set(&mut self, col: usize, row: usize, value: T) {
        self.data[row * self.width + col] = value;
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub fn iter(&self) -> impl Iterator<Item = T> + '_ {
        self.data.iter().copied()
    }

    pub fn map<U: Copy>(&self, f: impl Fn(T) -> U) -> Field2D<U> {
        Field2D {
            width: self.width,
            height: self.height,
            data: self.data.iter().map(|&v| f(v)).collect(),
        }
    }

    /// Combine two fields of the same shape cell by cell.
    ///
    /// # Panics
    ///
    /// Panics if the shapes differ.
    pub fn zip_map<U: Copy, V: Copy>(
        &self,
        other: &Field2D<U>,
        f: impl Fn(T, U) -> V,
    ) -> Field2D<V> {
        assert_eq!(self.shape(), other.shape(), "field shapes must match");
        Field2D {
            width: self.width,
            height: self.height,
            data: self
                .data
                .iter()
                .zip(&other.data)
                .map(|(&a, &b)| f(a, b))
                .collect(),
        }
    }

    /// Copy out the `width x height` window whose top-left cell is `(col, row)`.
    ///
    /// # Panics
    ///
    /// Panics if the window extends past the field.
    pub fn crop(&self, col: usize, row: usize, width: usize, height: usize) -> Field2D<T> {
        assert!(col + width <= self.width && row + height <= self.height);
        Field2D::from_fn(width, height, |c, r| self.get(col + c, row + r))
    }
}

impl Field2D<f64> {
    /// Largest value, ignoring NaN. Returns `-inf` for an empty field.
    pub fn max(&self) -> f64 {
        self.data.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    }

    /// Smallest value, ignoring NaN. Returns `inf` for an empty field.
    pub fn min(&self) -> f64 {
        self.data.iter().copied().fold(f64::INFINITY, f64::min)
    }

    /// Bilinear sample at a fractional `(col, row)` position, clamped to the field.
    pub fn sample_bilinear(&self, col: f64, row: f64) -> f64 {
        let max_col = (self.width - 1) as f64;
        let max_row = (self.height - 1) as f64;
        let c = col.clamp(0.0, max_col);
        let r = row.clamp(0.0, max_row);

        let c0 = libm::floor(c) as usize;
        let r0 = libm::floor(r) as usize;
        let c1 = (c0 + 1).min(self.width - 1);
        let r1 = (r0 + 1).min(self.height - 1);
        let tc = c - c0 as f64;
        let tr = r - r0 as f64;

        let top = self.get(c0, r0) * (1.0 - tc) + self.get(c1, r0) * tc;
        let bottom = self.get(c0, r1) * (1.0 - tc) + self.get(c1, r1) * tc;
        top * (1.0 - tr) + bottom * tr
    }
}

/// World-space sample positions in centimetres, stored per axis.
///
/// Equivalent to a pair of same-shaped `x`/`y` arrays: the position of cell
/// `(col, row)` is `(xs[col], ys[row])`.
#[derive(Clone, Debug, PartialEq)]
pub struct CoordinateGrid {
    xs: Vec<f64>,
    ys: Vec<f64>,
    dx: f64,
    dy: f64,
}

impl CoordinateGrid {
    /// A window of bake pixels addressed by global pixel index.
    ///
    /// Positions are `index * pixel_size`, so every caller that covers the
    /// same global pixel computes a bit-identical coordinate for it.
    pub fn pixel_window(
        origin_col: i64,
        origin_row: i64,
        width: usize,
        height: usize,
        pixel_size: f64,
    ) -> Result<Self, WorldgenError> {
        if width == 0 || height == 0 {
            return Err(WorldgenError::EmptyGrid { width, height });
        }
        let axis = |origin: i64, len: usize| {
            (0..len as i64).map(move |i| (origin + i) as f64 * pixel_size)
        };
        Ok(Self {
            xs: axis(origin_col, width).collect(),
            ys: axis(origin_row, height).collect(),
            dx: pixel_size,
            dy: pixel_size,
        })
    }

    /// `cols x rows` samples spread evenly over `[0, width_cm] x [0, height_cm]`,
    /// endpoints included.
    pub fn spanning(
        width_cm: f64,
        height_cm: f64,
        cols: usize,
        rows: usize,
    ) -> Result<Self, WorldgenError> {
        if cols == 0 || rows == 0 {
            return Err(WorldgenError::EmptyGrid {
                width: cols,
                height: rows,
            });
        }
        let step = |extent: f64, n: usize| if n > 1 { extent / (n - 1) as f64 } else { extent };
        let dx = step(width_cm, cols);
        let dy = step(height_cm, rows);
        Ok(Self {
            xs: (0..cols).map(|i| i as f64 * dx).collect(),
            ys: (0..rows).map(|i| i as f64 * dy).collect(),
            dx,
            dy,
        })
    }

    pub fn width(&self) -> usize {
        self.xs.len()
    }

    pub fn height(&self) -> usize {
        self.ys.len()
    }

    /// Returns `(width, height)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.xs.len(), self.ys.len())
    }

    #[inline]
    pub fn x(&self, col: usize) -> f64 {
        self.xs[col]
    }

    #[inline]
    pub fn y(&self, row: usize) -> f64 {
        self.ys[row]
    }

    /// Distance between neighbouring samples along x and y.
    pub fn spacing(&self) -> (f64, f64) {
        (self.dx, self.dy)
    }

    /// Fractional `(col, row)` of a world position relative to this grid.
    pub fn fractional_index(&self, x: f64, y: f64) -> (f64, f64) {
        ((x - self.xs[0]) / self.dx, (y - self.ys[0]) / self.dy)
    }

    /// Evaluate `f(x, y)` at every cell.
    pub fn map<T: Copy>(&self, mut f: impl FnMut(f64, f64) -> T) -> Field2D<T> {
        Field2D::from_fn(self.width(), self.height(), |col, row| {
            f(self.xs[col], self.ys[row])
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-12;

    #[test]
    fn test_from_vec_rejects_wrong_length() {
        assert!(Field2D::from_vec(3, 2, vec![0.0; 6]).is_ok());
        let err = Field2D::from_vec(3, 2, vec![0.0; 5]).unwrap_err();
        assert!(matches!(err, WorldgenError::ShapeMismatch { actual: 5, .. }));
    }

    #[test]
    fn test_row_major_layout() {
        let field = Field2D::from_fn(3, 2, |c, r| (c + 10 * r) as u32);
        assert_eq!(field.as_slice(), &[0, 1, 2, 10, 11, 12]);
        assert_eq!(field.get(2, 1), 12);
    }

    #[test]
    fn test_crop_window() {
        let field = Field2D::from_fn(4, 4, |c, r| (c, r));
        let cropped = field.crop(1, 2, 2, 2);
        assert_eq!(cropped.shape(), (2, 2));
        assert_eq!(cropped.get(0, 0), (1, 2));
        assert_eq!(cropped.get(1, 1), (2, 3));
    }

    #[test]
    fn test_bilinear_interpolates_and_clamps() {
        let field = Field2D::from_vec(2, 2, vec![0.0, 1.0, 2.0, 3.0]).unwrap();
        assert!((field.sample_bilinear(0.5, 0.5) - 1.5).abs() < EPSILON);
        assert!((field.sample_bilinear(1.0, 0.0) - 1.0).abs() < EPSILON);
        // Out-of-range positions clamp to the border.
        assert!((field.sample_bilinear(-5.0, 9.0) - 2.0).abs() < EPSILON);
    }

    #[test]
    fn test_pixel_window_matches_global_indices() {
        let wide = CoordinateGrid::pixel_window(-1, -1, 12, 3, 0.3).unwrap();
        let narrow = CoordinateGrid::pixel_window(4, 0, 3, 2, 0.3).unwrap();
        for col in 0..3 {
            assert_eq!(narrow.x(col).to_bits(), wide.x(col + 5).to_bits());
        }
        assert_eq!(narrow.y(1).to_bits(), wide.y(2).to_bits());
    }

    #[test]
    fn test_spanning_includes_endpoints() {
        let grid = CoordinateGrid::spanning(100.0, 50.0, 5, 3).unwrap();
        assert_eq!(grid.x(0), 0.0);
        assert_eq!(grid.x(4), 100.0);
        assert_eq!(grid.y(2), 50.0);
        assert_eq!(grid.spacing(), (25.0, 25.0));
        let (c, r) = grid.fractional_index(37.5, 12.5);
        assert!((c - 1.5).abs() < EPSILON && (r - 0.5).abs() < EPSILON);
    }

    #[test]
    fn test_empty_grid_rejected() {
        assert!(CoordinateGrid::spanning(1.0, 1.0, 0, 4).is_err());
        assert!(CoordinateGrid::pixel_window(0, 0, 4, 0, 1.0).is_err());
    }
}
