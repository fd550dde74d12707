//! Bedrock synthesis, slope, soil deposition and world-edge shaping.

use tessera_config::{EdgeMode, EdgeSettings, NoiseParams, WorldSettings};

use crate::field::{CoordinateGrid, Field2D};
use crate::noise::{NoiseChannel, NoiseField};

/// How raw gradient magnitudes are mapped onto `[0, 1]` slope.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SlopeScale {
    /// Divide by the steepest gradient in the same call.
    Observed,
    /// Divide by a fixed world-level gradient so separately computed
    /// windows agree; results above it clip to 1.
    Reference(f64),
}

/// Terrain outputs for one grid.
#[derive(Clone, Debug, PartialEq)]
pub struct TerrainLayers {
    pub bedrock: Field2D<f64>,
    pub slope: Field2D<f64>,
    pub soil_depth: Field2D<f64>,
    /// Bedrock plus soil, edge-shaped, in `[0, 1]`.
    pub elevation: Field2D<f64>,
}

#[derive(Clone, Debug)]
pub struct TerrainSynthesizer {
    base: NoiseParams,
    detail: NoiseParams,
    detail_weight: f64,
    amplitude: f64,
    max_soil_depth: f64,
    water_level: f64,
    edge: EdgeSettings,
    world_width_cm: f64,
    world_height_cm: f64,
}

impl TerrainSynthesizer {
    pub fn new(settings: &WorldSettings) -> Self {
        Self {
            base: settings.base_noise,
            detail: settings.detail_noise,
            detail_weight: settings.detail_noise_weight,
            amplitude: settings.terrain_amplitude,
            max_soil_depth: settings.max_soil_depth,
            water_level: settings.levels.water,
            edge: settings.edge,
            world_width_cm: settings.world_width_cm(),
            world_height_cm: settings.world_height_cm(),
        }
    }

    /// Continent and detail noise normalized by their theoretical range
    /// `±(1 + weight)`, sharpened by the amplitude exponent, plus uplift.
    pub fn bedrock(
        &self,
        noise: &NoiseField,
        grid: &CoordinateGrid,
        uplift: &Field2D<f64>,
    ) -> Field2D<f64> {
        let base = noise.sample_grid(grid, NoiseChannel::ElevationBase, &self.base);
        let detail = noise.sample_grid(grid, NoiseChannel::ElevationDetail, &self.detail);
        let bound = 1.0 + self.detail_weight;
        let amplitude = self.amplitude;

        let shaped = base.zip_map(&detail, |b, d| {
            let normalized = ((b + d * self.detail_weight + bound) / (2.0 * bound)).clamp(0.0, 1.0);
            libm::pow(normalized, amplitude)
        });
        shaped.zip_map(uplift, |e, u| (e + u).clamp(0.0, 1.0))
    }

    /// Gradient magnitude per centimetre.
    ///
    /// Central differences inside the grid, one-sided differences on its
    /// border, so any cell with two neighbours on each axis matches a larger
    /// grid covering the same positions.
    pub fn gradient_magnitude(field: &Field2D<f64>, grid: &CoordinateGrid) -> Field2D<f64> {
        let (w, h) = field.shape();
        let (dx, dy) = grid.spacing();
        Field2D::from_fn(w, h, |col, row| {
            let gx = axis_derivative(w, col, dx, |c| field.get(c, row));
            let gy = axis_derivative(h, row, dy, |r| field.get(col, r));
            (gx * gx + gy * gy).sqrt()
        })
    }

    /// Normalized slope in `[0, 1]`: 0 is flat, 1 is steepest.
    pub fn slope(
        &self,
        bedrock: &Field2D<f64>,
        grid: &CoordinateGrid,
        scale: SlopeScale,
    ) -> Field2D<f64> {
        let gradient = Self::gradient_magnitude(bedrock, grid);
        let reference = match scale {
            SlopeScale::Observed => gradient.max(),
            SlopeScale::Reference(max) => max,
        };
        if !(reference > 0.0) {
            return Field2D::filled(gradient.width(), gradient.height(), 0.0);
        }
        gradient.map(|g| (g / reference).clamp(0.0, 1.0))
    }

    /// `(1 - slope)^2 * max_soil_depth` on land; nothing under water.
    pub fn soil_depth(&self, slope: &Field2D<f64>, bedrock: &Field2D<f64>) -> Field2D<f64> {
        slope.zip_map(bedrock, |s, b| {
            if b >= self.water_level {
                let flatness = 1.0 - s;
                flatness * flatness * self.max_soil_depth
            } else {
                0.0
            }
        })
    }

    /// `clip(bedrock + soil, 0, 1)` with edge shaping applied.
    pub fn elevation(
        &self,
        bedrock: &Field2D<f64>,
        soil: &Field2D<f64>,
        grid: &CoordinateGrid,
    ) -> Field2D<f64> {
        let mut elevation = bedrock.zip_map(soil, |b, s| (b + s).clamp(0.0, 1.0));
        if self.edge.mode != EdgeMode::Default {
            for row in 0..grid.height() {
                for col in 0..grid.width() {
                    let falloff = self.edge_falloff(grid.x(col), grid.y(row));
                    let e = elevation.get(col, row);
                    elevation.set(col, row, self.shape_edge(e, falloff));
                }
            }
        }
        elevation
    }

    /// Separable falloff: 1 in the interior, easing to 0 at the world border.
    pub fn edge_falloff(&self, x: f64, y: f64) -> f64 {
        let blend = self.edge.blend_distance * self.world_width_cm.min(self.world_height_cm);
        if blend <= 0.0 {
            return 1.0;
        }
        let fx = (x.min(self.world_width_cm - x) / blend).clamp(0.0, 1.0);
        let fy = (y.min(self.world_height_cm - y) / blend).clamp(0.0, 1.0);
        let f = fx * fy;
        f * f
    }

    fn shape_edge(&self, elevation: f64, falloff: f64) -> f64 {
        match self.edge.mode {
            EdgeMode::Default => elevation,
            EdgeMode::Island => elevation * falloff,
            EdgeMode::Valley => elevation + (1.0 - elevation) * (1.0 - falloff),
        }
    }

    /// Run bedrock through elevation for one grid.
    pub fn synthesize(
        &self,
        noise: &NoiseField,
        grid: &CoordinateGrid,
        uplift: &Field2D<f64>,
        scale: SlopeScale,
    ) -> TerrainLayers {
        let bedrock = self.bedrock(noise, grid, uplift);
        let slope = self.slope(&bedrock, grid, scale);
        let soil_depth = self.soil_depth(&slope, &bedrock);
        let elevation = self.elevation(&bedrock, &soil_depth, grid);
        TerrainLayers {
            bedrock,
            slope,
            soil_depth,
            elevation,
        }
    }
}

fn axis_derivative(len: usize, i: usize, spacing: f64, value: impl Fn(usize) -> f64) -> f64 {
    if len < 2 {
        0.0
    } else if i == 0 {
        (value(1) - value(0)) / spacing
    } else if i == len - 1 {
        (value(i) - value(i - 1)) / spacing
    } else {
        (value(i + 1) - value(i - 1)) / (2.0 * spacing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_config::WorldParams;

    const EPSILON: f64 = 1e-12;

    fn settings(edge: EdgeMode) -> WorldSettings {
        WorldParams {
            world_width_chunks: Some(4),
            world_height_chunks: Some(4),
            world_edge_mode: edge,
            world_edge_blend_distance: 0.25,
            ..Default::default()
        }
        .resolve()
        .unwrap()
    }

    fn grid() -> CoordinateGrid {
        CoordinateGrid::spanning(40_000.0, 40_000.0, 41, 41).unwrap()
    }

    #[test]
    fn test_bedrock_in_unit_range() {
        let s = settings(EdgeMode::Default);
        let terrain = TerrainSynthesizer::new(&s);
        let noise = NoiseField::new(s.seed);
        let g = grid();
        let uplift = Field2D::filled(41, 41, 0.7);
        let bedrock = terrain.bedrock(&noise, &g, &uplift);
        assert!(bedrock.iter().all(|v| (0.0..=1.0).contains(&v)));
    }

    #[test]
    fn test_gradient_of_linear_ramp() {
        let g = CoordinateGrid::pixel_window(0, 0, 5, 4, 2.0).unwrap();
        let ramp = g.map(|x, _| 3.0 * x);
        let gradient = TerrainSynthesizer::gradient_magnitude(&ramp, &g);
        assert!(gradient.iter().all(|v| (v - 3.0).abs() < EPSILON));
    }

    #[test]
    fn test_gradient_interior_matches_larger_grid() {
        let wide = CoordinateGrid::pixel_window(0, 0, 10, 10, 7.0).unwrap();
        let narrow = CoordinateGrid::pixel_window(3, 2, 4, 5, 7.0).unwrap();
        let f = |x: f64, y: f64| (x * 0.01).sin() + (y * 0.03).cos();
        let wide_g = TerrainSynthesizer::gradient_magnitude(&wide.map(f), &wide);
        let narrow_g = TerrainSynthesizer::gradient_magnitude(&narrow.map(f), &narrow);
        for row in 1..4 {
            for col in 1..3 {
                assert_eq!(
                    narrow_g.get(col, row).to_bits(),
                    wide_g.get(col + 3, row + 2).to_bits()
                );
            }
        }
    }

    #[test]
    fn test_observed_slope_reaches_one() {
        let s = settings(EdgeMode::Default);
        let terrain = TerrainSynthesizer::new(&s);
        let g = grid();
        let bump = g.map(|x, y| ((x - 20_000.0).powi(2) + (y - 20_000.0).powi(2)).sqrt() / 1e5);
        let slope = terrain.slope(&bump, &g, SlopeScale::Observed);
        assert!((slope.max() - 1.0).abs() < EPSILON);
        assert!(slope.min() >= 0.0);
    }

    #[test]
    fn test_reference_slope_clips() {
        let s = settings(EdgeMode::Default);
        let terrain = TerrainSynthesizer::new(&s);
        let g = CoordinateGrid::pixel_window(0, 0, 4, 4, 1.0).unwrap();
        let ramp = g.map(|x, _| x * 0.5);
        let slope = terrain.slope(&ramp, &g, SlopeScale::Reference(0.25));
        assert!(slope.iter().all(|v| v == 1.0));
        let flat = terrain.slope(&ramp, &g, SlopeScale::Reference(1.0));
        assert!(flat.iter().all(|v| (v - 0.5).abs() < EPSILON));
    }

    #[test]
    fn test_no_soil_under_water() {
        let s = settings(EdgeMode::Default);
        let terrain = TerrainSynthesizer::new(&s);
        let bedrock = Field2D::from_vec(3, 1, vec![0.05, 0.1, 0.5]).unwrap();
        let slope = Field2D::from_vec(3, 1, vec![0.0, 0.0, 0.5]).unwrap();
        let soil = terrain.soil_depth(&slope, &bedrock);
        assert_eq!(soil.get(0, 0), 0.0);
        assert!((soil.get(1, 0) - 0.05).abs() < EPSILON);
        assert!((soil.get(2, 0) - 0.0125).abs() < EPSILON);
    }

    #[test]
    fn test_elevation_clipped() {
        let s = settings(EdgeMode::Default);
        let terrain = TerrainSynthesizer::new(&s);
        let g = CoordinateGrid::pixel_window(0, 0, 2, 1, 1.0).unwrap();
        let bedrock = Field2D::from_vec(2, 1, vec![0.99, 0.4]).unwrap();
        let soil = Field2D::from_vec(2, 1, vec![0.05, 0.05]).unwrap();
        let elevation = terrain.elevation(&bedrock, &soil, &g);
        assert_eq!(elevation.get(0, 0), 1.0);
        assert!((elevation.get(1, 0) - 0.45).abs() < EPSILON);
    }

    #[test]
    fn test_edge_falloff_profile() {
        let terrain = TerrainSynthesizer::new(&settings(EdgeMode::Island));
        assert_eq!(terrain.edge_falloff(0.0, 20_000.0), 0.0);
        assert_eq!(terrain.edge_falloff(20_000.0, 20_000.0), 1.0);
        // Half way through the 10 km blend band on one axis: (0.5)^2.
        assert!((terrain.edge_falloff(5_000.0, 20_000.0) - 0.25).abs() < EPSILON);
    }

    #[test]
    fn test_island_sinks_and_valley_raises_borders() {
        let g = grid();
        let bedrock = Field2D::filled(41, 41, 0.5);
        let soil = Field2D::filled(41, 41, 0.0);

        let island = TerrainSynthesizer::new(&settings(EdgeMode::Island));
        let e = island.elevation(&bedrock, &soil, &g);
        assert_eq!(e.get(0, 20), 0.0);
        assert_eq!(e.get(20, 20), 0.5);

        let valley = TerrainSynthesizer::new(&settings(EdgeMode::Valley));
        let e = valley.elevation(&bedrock, &soil, &g);
        assert_eq!(e.get(40, 20), 1.0);
        assert_eq!(e.get(20, 20), 0.5);
    }
}
