//! Permutation-table gradient noise with fractal octave accumulation.
//!
//! One shuffled table per seed serves every logical channel. Channels are
//! decorrelated by shifting their sample coordinates by large fixed offsets
//! rather than by reseeding.

use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use tessera_config::{CM_PER_KM, NoiseParams};

use crate::field::{CoordinateGrid, Field2D};

/// Number of distinct lattice hashes before the pattern repeats.
pub const PERMUTATION_SIZE: usize = 256;

const GRADIENTS: [(f64, f64); 4] = [(0.0, 1.0), (0.0, -1.0), (1.0, 0.0), (-1.0, 0.0)];

/// Seed-shuffled lattice hash table, duplicated so corner lookups never wrap.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PermutationTable {
    p: [u8; PERMUTATION_SIZE * 2],
}

impl PermutationTable {
    pub fn new(seed: u64) -> Self {
        let mut base: Vec<u8> = (0..=255u8).collect();
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        base.shuffle(&mut rng);

        let mut p = [0u8; PERMUTATION_SIZE * 2];
        for (i, slot) in p.iter_mut().enumerate() {
            *slot = base[i % PERMUTATION_SIZE];
        }
        Self { p }
    }

    /// Hash of lattice corner `(xi, yi)`; both must be at most 256.
    #[inline]
    pub fn hash(&self, xi: usize, yi: usize) -> u8 {
        self.p[self.p[xi] as usize + yi]
    }
}

/// A logical noise channel sharing the seed's permutation table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NoiseChannel {
    ElevationBase,
    ElevationDetail,
    Temperature,
    TectonicUplift,
}

impl NoiseChannel {
    /// Coordinate shift in centimetres applied before scaling.
    pub fn offset_cm(self) -> f64 {
        let km = match self {
            NoiseChannel::ElevationBase => 0.0,
            NoiseChannel::ElevationDetail => 98_761.0,
            NoiseChannel::Temperature => 12_347.0,
            NoiseChannel::TectonicUplift => 25_391.0,
        };
        km * CM_PER_KM
    }
}

/// Quintic smoothstep `6t^5 - 15t^4 + 10t^3`.
#[inline]
fn fade(t: f64) -> f64 {
    t * t * t * (t * (t * 6.0 - 15.0) + 10.0)
}

#[inline]
fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + t * (b - a)
}

#[inline]
fn corner(hash: u8, x: f64, y: f64) -> f64 {
    let (gx, gy) = GRADIENTS[(hash % 4) as usize];
    gx * x + gy * y
}

/// Deterministic 2D gradient noise field for one seed.
#[derive(Clone, Debug)]
pub struct NoiseField {
    table: PermutationTable,
}

impl NoiseField {
    pub fn new(seed: u64) -> Self {
        Self {
            table: PermutationTable::new(seed),
        }
    }

    pub fn table(&self) -> &PermutationTable {
        &self.table
    }

    /// Single-octave noise at a point in lattice units.
    pub fn gradient(&self, x: f64, y: f64) -> f64 {
        let x0 = libm::floor(x);
        let y0 = libm::floor(y);
        let xi = (x0 as i64).rem_euclid(PERMUTATION_SIZE as i64) as usize;
        let yi = (y0 as i64).rem_euclid(PERMUTATION_SIZE as i64) as usize;
        let xf = x - x0;
        let yf = y - y0;
        let u = fade(xf);
        let v = fade(yf);

        let n00 = corner(self.table.hash(xi, yi), xf, yf);
        let n01 = corner(self.table.hash(xi, yi + 1), xf, yf - 1.0);
        let n10 = corner(self.table.hash(xi + 1, yi), xf - 1.0, yf);
        let n11 = corner(self.table.hash(xi + 1, yi + 1), xf - 1.0, yf - 1.0);

        lerp(lerp(n00, n10, u), lerp(n01, n11, u), v)
    }

    /// Fractal sum of `octaves` layers. Not normalized: the result is nominally
    /// in `[-1, 1]` but may exceed it by the sum of the octave amplitudes.
    pub fn sample(&self, x: f64, y: f64, octaves: u32, persistence: f64, lacunarity: f64) -> f64 {
        let mut total = 0.0;
        let mut amplitude = 1.0;
        let mut frequency = 1.0;

        for _ in 0..octaves {
            total += self.gradient(x * frequency, y * frequency) * amplitude;
            amplitude *= persistence;
            frequency *= lacunarity;
        }

        total
    }

    /// Sample one channel at a world position in centimetres.
    pub fn sample_channel(&self, channel: NoiseChannel, params: &NoiseParams, x: f64, y: f64) -> f64 {
        let offset = channel.offset_cm();
        self.sample(
            (x + offset) / params.scale_cm,
            (y + offset) / params.scale_cm,
            params.octaves,
            params.persistence,
            params.lacunarity,
        )
    }

    /// Sample one channel over every cell of a grid.
    pub fn sample_grid(
        &self,
        grid: &CoordinateGrid,
        channel: NoiseChannel,
        params: &NoiseParams,
    ) -> Field2D<f64> {
        grid.map(|x, y| self.sample_channel(channel, params, x, y))
    }
}
