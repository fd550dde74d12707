//! Temperature and humidity derived from elevation, latitude and wind.

use glam::DVec2;
use tessera_config::{ClimateSettings, HumiditySettings, NoiseParams, WorldSettings};

use crate::distance::distance_to_nearest;
use crate::field::{CoordinateGrid, Field2D};
use crate::noise::{NoiseChannel, NoiseField};

/// Water vapour capacity of saturated air at `temp_c`, in g/m³.
///
/// Magnus approximation of saturation vapour pressure converted to absolute
/// humidity; grows roughly exponentially with temperature.
pub fn saturation_humidity(temp_c: f64) -> f64 {
    let vapour_pressure_hpa = 6.112 * libm::exp(17.67 * temp_c / (temp_c + 243.5));
    vapour_pressure_hpa * 216.74 / (273.15 + temp_c)
}

/// Climate outputs for one grid.
#[derive(Clone, Debug, PartialEq)]
pub struct ClimateLayers {
    /// °C, clamped to the global bounds.
    pub temperature: Field2D<f64>,
    /// g/m³, clamped to the absolute bounds.
    pub humidity: Field2D<f64>,
}

#[derive(Clone, Debug)]
pub struct ClimateModel {
    climate: ClimateSettings,
    humidity: HumiditySettings,
    noise: NoiseParams,
    water_level: f64,
    world_height_cm: f64,
}

impl ClimateModel {
    pub fn new(settings: &WorldSettings) -> Self {
        Self {
            climate: settings.climate,
            humidity: settings.humidity,
            noise: settings.climate_noise,
            water_level: settings.levels.water,
            world_height_cm: settings.world_height_cm(),
        }
    }

    /// 0 on the equator, 1 at the pole furthest from it.
    pub fn latitude_factor(&self, y: f64) -> f64 {
        let equator = self.climate.equator_y_pos_factor;
        let span = equator.max(1.0 - equator);
        ((y / self.world_height_cm - equator).abs() / span).clamp(0.0, 1.0)
    }

    /// Surface temperature in °C.
    ///
    /// The sea-level baseline is raised by half the polar drop so the
    /// configured target stays the mean after the latitude term is removed.
    pub fn temperature(
        &self,
        noise: &NoiseField,
        grid: &CoordinateGrid,
        elevation: &Field2D<f64>,
    ) -> Field2D<f64> {
        let c = &self.climate;
        Field2D::from_fn(grid.width(), grid.height(), |col, row| {
            let (x, y) = (grid.x(col), grid.y(row));
            let n = noise.sample_channel(NoiseChannel::Temperature, &self.noise, x, y);
            let seasonal = ((n + 1.0) * 0.5).clamp(0.0, 1.0) - 0.5;
            let baseline = c.target_sea_level_temp_c
                + c.polar_temperature_drop_c * 0.5
                + seasonal * c.seasonal_variation_c;
            let t = baseline
                - elevation.get(col, row) * c.lapse_rate_c_per_unit_elevation
                - self.latitude_factor(y) * c.polar_temperature_drop_c;
            t.clamp(c.min_global_temp_c, c.max_global_temp_c)
        })
    }

    /// `[0, 1]` closeness to water: 1 on water, falling to 0 at the maximum
    /// coastal distance with the configured falloff exponent.
    pub fn coastal_factor(&self, elevation: &Field2D<f64>, grid: &CoordinateGrid) -> Field2D<f64> {
        let water = elevation.map(|e| e < self.water_level);
        let distance = distance_to_nearest(&water, grid.spacing());
        let max = self.humidity.max_coastal_distance_cm;
        let rate = self.humidity.coastal_falloff_rate;
        distance.map(|d| libm::pow(1.0 - (d / max).clamp(0.0, 1.0), rate))
    }

    /// Offset from a cell to the point the wind arrives from.
    ///
    /// Angles count counter-clockwise from east; north is toward smaller y.
    pub fn upwind_offset(&self) -> DVec2 {
        let angle = self.humidity.prevailing_wind_direction_degrees.to_radians();
        DVec2::new(libm::cos(angle), -libm::sin(angle)) * self.humidity.rain_shadow_check_distance_cm
    }

    /// `[0, 1]` moisture retained after crossing upwind terrain.
    pub fn shadow_factor(&self, elevation: &Field2D<f64>, grid: &CoordinateGrid) -> Field2D<f64> {
        let offset = self.upwind_offset();
        let (dx, dy) = grid.spacing();
        let (oc, or) = (offset.x / dx, offset.y / dy);
        let h = &self.humidity;
        Field2D::from_fn(elevation.width(), elevation.height(), |col, row| {
            let local = elevation.get(col, row);
            let upwind = elevation.sample_bilinear(col as f64 + oc, row as f64 + or);
            let blocked = (upwind - local - h.rain_shadow_mountain_threshold).clamp(0.0, 1.0);
            1.0 - blocked * h.rain_shadow_strength
        })
    }

    /// Absolute humidity from precomputed coastal and shadow factors.
    pub fn humidity_from_factors(
        &self,
        temperature: &Field2D<f64>,
        coastal: &Field2D<f64>,
        shadow: &Field2D<f64>,
    ) -> Field2D<f64> {
        let relative = coastal.zip_map(shadow, |c, s| (c * s).clamp(0.0, 1.0));
        let (min, max) = (
            self.humidity.min_absolute_humidity,
            self.humidity.max_absolute_humidity,
        );
        temperature.zip_map(&relative, |t, r| (saturation_humidity(t) * r).clamp(min, max))
    }

    /// Absolute humidity in g/m³ computed entirely from this grid.
    pub fn humidity(
        &self,
        grid: &CoordinateGrid,
        elevation: &Field2D<f64>,
        temperature: &Field2D<f64>,
    ) -> Field2D<f64> {
        let coastal = self.coastal_factor(elevation, grid);
        let shadow = self.shadow_factor(elevation, grid);
        self.humidity_from_factors(temperature, &coastal, &shadow)
    }
}
