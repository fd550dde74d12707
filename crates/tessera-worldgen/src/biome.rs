//! Biome classification from elevation, climate and soil.
//!
//! Rules are applied in layers and later layers win: water depth bands, land
//! elevation bands, a climate table inside the vegetated band, exposed
//! bedrock, then snow and ice.

use tessera_config::{BiomeThresholds, TerrainLevels, WorldSettings};

use crate::field::Field2D;

/// Land with less soil than this shows bare rock.
pub const EXPOSED_ROCK_SOIL_THRESHOLD: f64 = 0.001;

/// Discrete biome id. The discriminant is the stable numeric id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum Biome {
    Abyss = 0,
    DeepWater = 1,
    MidWater = 2,
    ShallowWater = 3,
    Beach = 4,
    Grassland = 5,
    Dirt = 6,
    Mountain = 7,
    Tundra = 8,
    Taiga = 9,
    Desert = 10,
    Rainforest = 11,
    Savanna = 12,
    TropicalForest = 13,
    TemperateForest = 14,
    Snow = 15,
    Ice = 16,
}

impl Biome {
    pub const COUNT: usize = 17;

    pub const ALL: [Biome; Biome::COUNT] = [
        Biome::Abyss,
        Biome::DeepWater,
        Biome::MidWater,
        Biome::ShallowWater,
        Biome::Beach,
        Biome::Grassland,
        Biome::Dirt,
        Biome::Mountain,
        Biome::Tundra,
        Biome::Taiga,
        Biome::Desert,
        Biome::Rainforest,
        Biome::Savanna,
        Biome::TropicalForest,
        Biome::TemperateForest,
        Biome::Snow,
        Biome::Ice,
    ];

    pub fn id(self) -> u8 {
        self as u8
    }

    pub fn is_water(self) -> bool {
        matches!(
            self,
            Biome::Abyss | Biome::DeepWater | Biome::MidWater | Biome::ShallowWater | Biome::Ice
        )
    }
}

/// A rectangle in temperature–humidity space mapped to a biome.
#[derive(Clone, Debug)]
pub struct ClimateRegion {
    /// Minimum temperature (inclusive), °C.
    pub temp_min: f64,
    /// Maximum temperature (exclusive), °C.
    pub temp_max: f64,
    /// Minimum humidity (inclusive), g/m³.
    pub humidity_min: f64,
    /// Maximum humidity (exclusive), g/m³.
    pub humidity_max: f64,
    pub biome: Biome,
}

impl ClimateRegion {
    fn contains(&self, temperature: f64, humidity: f64) -> bool {
        temperature >= self.temp_min
            && temperature < self.temp_max
            && humidity >= self.humidity_min
            && humidity < self.humidity_max
    }
}

/// Ordered climate lookup for the vegetated band; first match wins.
#[derive(Clone, Debug)]
pub struct ClimateTable {
    pub regions: Vec<ClimateRegion>,
    pub fallback: Biome,
}

impl ClimateTable {
    /// Most restrictive rules first: cold bands, dryness, wetness, then the
    /// tropical bands. Anything left is grassland.
    pub fn from_thresholds(t: &BiomeThresholds) -> Self {
        const INF: f64 = f64::INFINITY;
        let region = |temp_min, temp_max, humidity_min, humidity_max, biome| ClimateRegion {
            temp_min,
            temp_max,
            humidity_min,
            humidity_max,
            biome,
        };
        Self {
            regions: vec![
                region(-INF, t.tundra_max_temp, -INF, INF, Biome::Tundra),
                region(-INF, t.taiga_max_temp, -INF, INF, Biome::Taiga),
                region(-INF, INF, -INF, t.desert_max_humidity, Biome::Desert),
                region(
                    t.hot_desert_min_temp,
                    INF,
                    -INF,
                    t.grassland_max_humidity,
                    Biome::Desert,
                ),
                region(-INF, INF, t.forest_max_humidity, INF, Biome::Rainforest),
                region(
                    t.temperate_max_temp,
                    INF,
                    -INF,
                    t.grassland_max_humidity,
                    Biome::Savanna,
                ),
                region(t.temperate_max_temp, INF, -INF, INF, Biome::TropicalForest),
                region(-INF, INF, t.grassland_max_humidity, INF, Biome::TemperateForest),
            ],
            fallback: Biome::Grassland,
        }
    }

    pub fn lookup(&self, temperature: f64, humidity: f64) -> Biome {
        self.regions
            .iter()
            .find(|r| r.contains(temperature, humidity))
            .map_or(self.fallback, |r| r.biome)
    }
}

#[derive(Clone, Debug)]
pub struct BiomeClassifier {
    levels: TerrainLevels,
    table: ClimateTable,
    snow_line_temp_c: f64,
    ice_formation_temp_c: f64,
}

impl BiomeClassifier {
    pub fn new(settings: &WorldSettings) -> Self {
        Self {
            levels: settings.levels,
            table: ClimateTable::from_thresholds(&settings.biomes),
            snow_line_temp_c: settings.climate.snow_line_temp_c,
            ice_formation_temp_c: settings.climate.ice_formation_temp_c,
        }
    }

    pub fn table(&self) -> &ClimateTable {
        &self.table
    }

    pub fn classify_cell(&self, elevation: f64, temperature: f64, humidity: f64, soil: f64) -> Biome {
        let l = &self.levels;

        if elevation < l.water {
            let biome = if elevation < l.water * 0.25 {
                Biome::Abyss
            } else if elevation < l.water * 0.5 {
                Biome::DeepWater
            } else if elevation < l.water * 0.75 {
                Biome::MidWater
            } else {
                Biome::ShallowWater
            };
            return if temperature <= self.ice_formation_temp_c {
                Biome::Ice
            } else {
                biome
            };
        }

        let mut biome = if elevation < l.sand {
            Biome::Beach
        } else if elevation < l.grass {
            self.table.lookup(temperature, humidity)
        } else if elevation < l.dirt {
            Biome::Dirt
        } else {
            Biome::Mountain
        };
        if soil < EXPOSED_ROCK_SOIL_THRESHOLD {
            biome = Biome::Mountain;
        }
        if temperature <= self.snow_line_temp_c {
            biome = Biome::Snow;
        }
        biome
    }

    /// # Panics
    ///
    /// Panics if the four fields differ in shape.
    pub fn classify(
        &self,
        elevation: &Field2D<f64>,
        temperature: &Field2D<f64>,
        humidity: &Field2D<f64>,
        soil_depth: &Field2D<f64>,
    ) -> Field2D<Biome> {
        assert_eq!(elevation.shape(), temperature.shape());
        assert_eq!(elevation.shape(), humidity.shape());
        assert_eq!(elevation.shape(), soil_depth.shape());
        Field2D::from_fn(elevation.width(), elevation.height(), |col, row| {
            self.classify_cell(
                elevation.get(col, row),
                temperature.get(col, row),
                humidity.get(col, row),
                soil_depth.get(col, row),
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_config::WorldParams;

    const SOIL: f64 = 0.04;

    fn classifier() -> BiomeClassifier {
        let settings = WorldParams {
            world_width_chunks: Some(1),
            world_height_chunks: Some(1),
            ..Default::default()
        }
        .resolve()
        .unwrap();
        BiomeClassifier::new(&settings)
    }

    #[test]
    fn test_ids_are_stable() {
        for (i, biome) in Biome::ALL.iter().enumerate() {
            assert_eq!(biome.id() as usize, i);
        }
    }

    #[test]
    fn test_water_depth_bands() {
        let c = classifier();
        assert_eq!(c.classify_cell(0.01, 10.0, 5.0, 0.0), Biome::Abyss);
        assert_eq!(c.classify_cell(0.03, 10.0, 5.0, 0.0), Biome::DeepWater);
        assert_eq!(c.classify_cell(0.06, 10.0, 5.0, 0.0), Biome::MidWater);
        assert_eq!(c.classify_cell(0.09, 10.0, 5.0, 0.0), Biome::ShallowWater);
    }

    #[test]
    fn test_land_bands() {
        let c = classifier();
        assert_eq!(c.classify_cell(0.105, 10.0, 12.0, SOIL), Biome::Beach);
        assert_eq!(c.classify_cell(0.4, 10.0, 12.0, SOIL), Biome::Dirt);
        assert_eq!(c.classify_cell(0.7, 10.0, 12.0, SOIL), Biome::Mountain);
    }

    #[test]
    fn test_climate_table_order() {
        let c = classifier();
        let veg = 0.2;
        assert_eq!(c.classify_cell(veg, -6.0, 20.0, SOIL), Biome::Tundra);
        assert_eq!(c.classify_cell(veg, 1.0, 2.0, SOIL), Biome::Taiga);
        assert_eq!(c.classify_cell(veg, 10.0, 3.0, SOIL), Biome::Desert);
        assert_eq!(c.classify_cell(veg, 25.0, 8.0, SOIL), Biome::Desert);
        assert_eq!(c.classify_cell(veg, 10.0, 18.0, SOIL), Biome::Rainforest);
        assert_eq!(c.classify_cell(veg, 19.0, 8.0, SOIL), Biome::Savanna);
        assert_eq!(c.classify_cell(veg, 19.0, 12.0, SOIL), Biome::TropicalForest);
        assert_eq!(c.classify_cell(veg, 10.0, 12.0, SOIL), Biome::TemperateForest);
        assert_eq!(c.classify_cell(veg, 10.0, 7.0, SOIL), Biome::Grassland);
    }

    #[test]
    fn test_exposed_bedrock_overrides_vegetation() {
        let c = classifier();
        assert_eq!(c.classify_cell(0.2, 10.0, 7.0, 0.0005), Biome::Mountain);
        assert_eq!(c.classify_cell(0.105, 10.0, 7.0, 0.0), Biome::Mountain);
    }

    #[test]
    fn test_frost_overrides_everything() {
        let c = classifier();
        // A frozen desert is snow, not sand.
        assert_eq!(c.classify_cell(0.2, -20.0, 0.1, SOIL), Biome::Snow);
        assert_eq!(c.classify_cell(0.8, -9.0, 0.1, 0.0), Biome::Snow);
        assert_eq!(c.classify_cell(0.02, -15.0, 0.0, 0.0), Biome::Ice);
        // Cold but above the ice point stays open water.
        assert_eq!(c.classify_cell(0.02, -5.0, 0.0, 0.0), Biome::Abyss);
    }

    #[test]
    fn test_classify_field() {
        let c = classifier();
        let elevation = Field2D::from_vec(2, 1, vec![0.01, 0.7]).unwrap();
        let temperature = Field2D::filled(2, 1, 10.0);
        let humidity = Field2D::filled(2, 1, 10.0);
        let soil = Field2D::filled(2, 1, SOIL);
        let biomes = c.classify(&elevation, &temperature, &humidity, &soil);
        assert_eq!(biomes.as_slice(), &[Biome::Abyss, Biome::Mountain]);
    }
}
