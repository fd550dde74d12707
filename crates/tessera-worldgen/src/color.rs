//! Color lookup tables and per-view-mode colorization.
//!
//! Temperature and humidity are quantized before lookup so neighbouring
//! chunks collapse onto fewer distinct pixel buffers.

use tessera_config::{ViewMode, WorldSettings};

use crate::biome::Biome;
use crate::error::WorldgenError;
use crate::field::Field2D;
use crate::image::{Rgb, RgbImage};
use crate::pipeline::WorldLayers;

/// Discrete humidity bands before lookup.
pub const HUMIDITY_STEPS: f64 = 100.0;

const TEMP_COLDEST: Rgb = [0, 0, 100];
const TEMP_COLD: Rgb = [0, 0, 255];
const TEMP_TEMPERATE: Rgb = [255, 255, 0];
const TEMP_HOT: Rgb = [255, 0, 0];
const TEMP_HOTTEST: Rgb = [150, 0, 0];

/// Normalized positions of the cold, temperate and hot color stops.
const TEMP_LEVELS: [f64; 3] = [0.25, 0.75, 0.95];

const HUMIDITY_DRY: Rgb = [210, 180, 140];
const HUMIDITY_WET: Rgb = [70, 130, 180];

/// Terrain palette color for a biome.
pub fn biome_color(biome: Biome) -> Rgb {
    match biome {
        Biome::Abyss => [0, 0, 50],
        Biome::DeepWater => [10, 20, 80],
        Biome::MidWater => [20, 40, 120],
        Biome::ShallowWater => [26, 102, 255],
        Biome::Beach => [240, 230, 140],
        Biome::Grassland => [34, 139, 34],
        Biome::Dirt => [139, 69, 19],
        Biome::Mountain => [112, 128, 144],
        Biome::Tundra => [150, 160, 130],
        Biome::Taiga => [60, 110, 80],
        Biome::Desert => [237, 201, 120],
        Biome::Rainforest => [0, 70, 30],
        Biome::Savanna => [154, 205, 50],
        Biome::TropicalForest => [20, 120, 40],
        Biome::TemperateForest => [0, 100, 0],
        Biome::Snow => [255, 255, 255],
        Biome::Ice => [210, 225, 240],
    }
}

fn lerp_color(a: Rgb, b: Rgb, t: f64) -> Rgb {
    let channel = |i: usize| ((1.0 - t) * f64::from(a[i]) + t * f64::from(b[i])) as u8;
    [channel(0), channel(1), channel(2)]
}

fn temperature_lut() -> [Rgb; 256] {
    let [cold, temperate, hot] = TEMP_LEVELS;
    std::array::from_fn(|i| {
        let t = i as f64 / 255.0;
        if t < cold {
            lerp_color(TEMP_COLDEST, TEMP_COLD, t / cold)
        } else if t < temperate {
            lerp_color(TEMP_COLD, TEMP_TEMPERATE, (t - cold) / (temperate - cold))
        } else if t < hot {
            lerp_color(TEMP_TEMPERATE, TEMP_HOT, (t - temperate) / (hot - temperate))
        } else {
            lerp_color(TEMP_HOT, TEMP_HOTTEST, (t - hot) / (1.0 - hot))
        }
    })
}

fn humidity_lut() -> [Rgb; 256] {
    std::array::from_fn(|i| lerp_color(HUMIDITY_DRY, HUMIDITY_WET, i as f64 / 255.0))
}

#[inline]
fn gray(value: f64) -> Rgb {
    let v = (value.clamp(0.0, 1.0) * 255.0) as u8;
    [v, v, v]
}

#[inline]
fn lut_index(normalized: f64) -> usize {
    (normalized.clamp(0.0, 1.0) * 255.0) as usize
}

fn paint<T: Copy>(field: &Field2D<T>, color: impl Fn(T) -> Rgb) -> RgbImage {
    let mut image = RgbImage::new(field.width() as u32, field.height() as u32);
    for row in 0..field.height() {
        for col in 0..field.width() {
            image.set_pixel(col as u32, row as u32, color(field.get(col, row)));
        }
    }
    image
}

/// Precomputed lookup tables plus the ranges they normalize against.
#[derive(Clone, Debug)]
pub struct ColorMaps {
    temperature: [Rgb; 256],
    humidity: [Rgb; 256],
    temp_range: (f64, f64),
    humidity_range: (f64, f64),
    uplift_max: f64,
    max_soil_depth: f64,
}

impl ColorMaps {
    pub fn new(settings: &WorldSettings) -> Self {
        Self {
            temperature: temperature_lut(),
            humidity: humidity_lut(),
            temp_range: (
                settings.climate.min_global_temp_c,
                settings.climate.max_global_temp_c,
            ),
            humidity_range: (
                settings.humidity.min_absolute_humidity,
                settings.humidity.max_absolute_humidity,
            ),
            uplift_max: 2.0 * settings.tectonics.uplift_strength,
            max_soil_depth: settings.max_soil_depth,
        }
    }

    /// Rounds to whole degrees before lookup.
    pub fn temperature_color(&self, temp_c: f64) -> Rgb {
        let (min, max) = self.temp_range;
        let normalized = (temp_c.round() - min) / (max - min);
        self.temperature[lut_index(normalized)]
    }

    /// Quantizes to [`HUMIDITY_STEPS`] bands before lookup.
    pub fn humidity_color(&self, humidity: f64) -> Rgb {
        let (min, max) = self.humidity_range;
        let normalized = ((humidity - min) / (max - min)).clamp(0.0, 1.0);
        let quantized = (normalized * HUMIDITY_STEPS).round() / HUMIDITY_STEPS;
        self.humidity[lut_index(quantized)]
    }

    pub fn elevation_color(&self, elevation: f64) -> Rgb {
        gray(elevation)
    }

    /// Uplift relative to its theoretical maximum of twice the strength.
    pub fn uplift_color(&self, uplift: f64) -> Rgb {
        if self.uplift_max > 0.0 {
            gray(uplift / self.uplift_max)
        } else {
            gray(0.0)
        }
    }

    pub fn soil_color(&self, soil: f64) -> Rgb {
        if self.max_soil_depth > 0.0 {
            gray(soil / self.max_soil_depth)
        } else {
            gray(0.0)
        }
    }

    /// Render the layer a view mode shows.
    pub fn colorize(&self, mode: ViewMode, layers: &WorldLayers) -> Result<RgbImage, WorldgenError> {
        let image = match mode {
            ViewMode::Terrain => paint(layers.biomes()?, biome_color),
            ViewMode::Temperature => {
                paint(&layers.climate()?.temperature, |t| self.temperature_color(t))
            }
            ViewMode::Humidity => paint(&layers.climate()?.humidity, |h| self.humidity_color(h)),
            ViewMode::Elevation => {
                paint(&layers.terrain()?.elevation, |e| self.elevation_color(e))
            }
            ViewMode::Tectonic => paint(layers.uplift()?, |u| self.uplift_color(u)),
            ViewMode::SoilDepth => paint(&layers.terrain()?.soil_depth, |s| self.soil_color(s)),
        };
        Ok(image)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_config::WorldParams;

    fn maps() -> ColorMaps {
        let settings = WorldParams {
            world_width_chunks: Some(1),
            world_height_chunks: Some(1),
            ..Default::default()
        }
        .resolve()
        .unwrap();
        ColorMaps::new(&settings)
    }

    #[test]
    fn test_temperature_lut_endpoints() {
        let lut = temperature_lut();
        assert_eq!(lut[0], TEMP_COLDEST);
        assert_eq!(lut[255], TEMP_HOTTEST);
    }

    #[test]
    fn test_temperature_extremes_and_rounding() {
        let m = maps();
        assert_eq!(m.temperature_color(-50.0), TEMP_COLDEST);
        assert_eq!(m.temperature_color(80.0), TEMP_HOTTEST);
        // 10.4 and 9.6 both round to 10 °C.
        assert_eq!(m.temperature_color(10.4), m.temperature_color(9.6));
    }

    #[test]
    fn test_humidity_quantization() {
        let m = maps();
        assert_eq!(m.humidity_color(0.0), HUMIDITY_DRY);
        assert_eq!(m.humidity_color(30.0), HUMIDITY_WET);
        assert_eq!(m.humidity_color(15.001), m.humidity_color(15.0));
    }

    #[test]
    fn test_grayscale_views() {
        let m = maps();
        assert_eq!(m.elevation_color(1.0), [255, 255, 255]);
        assert_eq!(m.elevation_color(0.0), [0, 0, 0]);
        assert_eq!(m.uplift_color(1.6), [255, 255, 255]);
        assert_eq!(m.uplift_color(0.0), [0, 0, 0]);
        assert_eq!(m.soil_color(0.05), [255, 255, 255]);
    }

    #[test]
    fn test_biome_palette_distinct() {
        let mut colors: Vec<Rgb> = Biome::ALL.iter().map(|&b| biome_color(b)).collect();
        colors.sort();
        colors.dedup();
        assert_eq!(colors.len(), Biome::COUNT);
    }

    #[test]
    fn test_colorize_missing_layer() {
        let m = maps();
        let layers = WorldLayers::default();
        let err = m.colorize(ViewMode::Terrain, &layers).unwrap_err();
        assert!(matches!(err, WorldgenError::MissingLayer("biomes")));
    }
}
