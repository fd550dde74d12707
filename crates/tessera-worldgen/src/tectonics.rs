//! Voronoi tectonic plates, boundary influence and mountain uplift.

use std::f64::consts::PI;

use glam::DVec2;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tessera_config::{NoiseParams, TectonicSettings, WorldSettings};

use crate::field::{CoordinateGrid, Field2D};
use crate::noise::{NoiseChannel, NoiseField};

/// Added to the world seed before drawing plate centres.
pub const TECTONIC_PLATE_SEED_OFFSET: u64 = 54_321;

/// Plate centres scattered uniformly over the world.
#[derive(Clone, Debug, PartialEq)]
pub struct PlateSet {
    centers: Vec<DVec2>,
}

impl PlateSet {
    pub fn generate(width_cm: f64, height_cm: f64, count: u32, seed: u64) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed.wrapping_add(TECTONIC_PLATE_SEED_OFFSET));
        let centers = (0..count)
            .map(|_| {
                let x = rng.random_range(0.0..width_cm);
                let y = rng.random_range(0.0..height_cm);
                DVec2::new(x, y)
            })
            .collect();
        Self { centers }
    }

    pub fn len(&self) -> usize {
        self.centers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.centers.is_empty()
    }

    pub fn centers(&self) -> &[DVec2] {
        &self.centers
    }
}

/// Nearest and second-nearest plate for one query point.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlateNeighbors {
    pub plate: u32,
    pub dist1: f64,
    /// `f64::INFINITY` when only one plate exists.
    pub dist2: f64,
}

#[derive(Clone, Debug)]
struct KdNode {
    point: DVec2,
    id: u32,
    axis: usize,
    left: Option<usize>,
    right: Option<usize>,
}

/// Static 2-d tree over plate centres for k=2 nearest queries.
#[derive(Clone, Debug)]
pub struct PlateIndex {
    nodes: Vec<KdNode>,
    root: Option<usize>,
}

#[inline]
fn axis_value(p: DVec2, axis: usize) -> f64 {
    if axis == 0 { p.x } else { p.y }
}

struct Best {
    first: (f64, u32),
    second: (f64, u32),
}

impl Best {
    fn offer(&mut self, dist_sq: f64, id: u32) {
        if dist_sq < self.first.0 {
            self.second = self.first;
            self.first = (dist_sq, id);
        } else if dist_sq < self.second.0 {
            self.second = (dist_sq, id);
        }
    }
}

impl PlateIndex {
    pub fn new(plates: &PlateSet) -> Self {
        let mut items: Vec<(DVec2, u32)> = plates
            .centers
            .iter()
            .enumerate()
            .map(|(i, &p)| (p, i as u32))
            .collect();
        let mut nodes = Vec::with_capacity(items.len());
        let root = Self::build(&mut nodes, &mut items, 0);
        Self { nodes, root }
    }

    fn build(nodes: &mut Vec<KdNode>, items: &mut [(DVec2, u32)], depth: usize) -> Option<usize> {
        if items.is_empty() {
            return None;
        }
        let axis = depth % 2;
        items.sort_by(|a, b| {
            axis_value(a.0, axis)
                .total_cmp(&axis_value(b.0, axis))
                .then(a.1.cmp(&b.1))
        });
        let mid = items.len() / 2;
        let (point, id) = items[mid];
        let index = nodes.len();
        nodes.push(KdNode {
            point,
            id,
            axis,
            left: None,
            right: None,
        });

        let (lower, rest) = items.split_at_mut(mid);
        let left = Self::build(nodes, lower, depth + 1);
        let right = Self::build(nodes, &mut rest[1..], depth + 1);
        nodes[index].left = left;
        nodes[index].right = right;
        Some(index)
    }

    /// The two closest plates to `query`. Returns `None` for an empty index.
    pub fn nearest_two(&self, query: DVec2) -> Option<PlateNeighbors> {
        let root = self.root?;
        let mut best = Best {
            first: (f64::INFINITY, 0),
            second: (f64::INFINITY, 0),
        };
        self.search(root, query, &mut best);
        Some(PlateNeighbors {
            plate: best.first.1,
            dist1: best.first.0.sqrt(),
            dist2: best.second.0.sqrt(),
        })
    }

    fn search(&self, node: usize, query: DVec2, best: &mut Best) {
        let n = &self.nodes[node];
        best.offer(n.point.distance_squared(query), n.id);

        let diff = axis_value(query, n.axis) - axis_value(n.point, n.axis);
        let (near, far) = if diff < 0.0 {
            (n.left, n.right)
        } else {
            (n.right, n.left)
        };
        if let Some(near) = near {
            self.search(near, query, best);
        }
        if let Some(far) = far
            && diff * diff < best.second.0
        {
            self.search(far, query, best);
        }
    }
}

/// Per-cell plate membership and centre distances.
#[derive(Clone, Debug, PartialEq)]
pub struct PlateData {
    pub plate_ids: Field2D<u32>,
    pub dist1: Field2D<f64>,
    pub dist2: Field2D<f64>,
}

/// Smooth `[0, 1]` weight that peaks on the boundary between two plates.
///
/// The boundary distance is approximated as `(dist2 - dist1) / 2`; an infinite
/// distance (single plate) gives exactly zero.
pub fn boundary_influence(dist1: f64, dist2: f64, radius: f64) -> f64 {
    let boundary = (dist2 - dist1) * 0.5;
    if !boundary.is_finite() {
        return 0.0;
    }
    let linear = 1.0 - (boundary / radius).clamp(0.0, 1.0);
    (1.0 - libm::cos(linear * PI)) * 0.5
}

/// Plate layout plus the uplift it induces.
#[derive(Clone, Debug)]
pub struct TectonicModel {
    plates: PlateSet,
    index: PlateIndex,
    settings: TectonicSettings,
    uplift_noise: NoiseParams,
}

impl TectonicModel {
    pub fn new(settings: &WorldSettings) -> Self {
        let plates = PlateSet::generate(
            settings.world_width_cm(),
            settings.world_height_cm(),
            settings.tectonics.plate_count,
            settings.seed,
        );
        let index = PlateIndex::new(&plates);
        Self {
            plates,
            index,
            settings: settings.tectonics,
            uplift_noise: settings.uplift_noise,
        }
    }

    pub fn plates(&self) -> &PlateSet {
        &self.plates
    }

    pub fn index(&self) -> &PlateIndex {
        &self.index
    }

    /// Nearest plate id and first/second centre distances for every cell.
    pub fn plate_data(&self, grid: &CoordinateGrid) -> PlateData {
        let neighbors = grid.map(|x, y| {
            self.index
                .nearest_two(DVec2::new(x, y))
                .unwrap_or(PlateNeighbors {
                    plate: 0,
                    dist1: f64::INFINITY,
                    dist2: f64::INFINITY,
                })
        });
        PlateData {
            plate_ids: neighbors.map(|n| n.plate),
            dist1: neighbors.map(|n| n.dist1),
            dist2: neighbors.map(|n| n.dist2),
        }
    }

    pub fn influence(&self, data: &PlateData) -> Field2D<f64> {
        let radius = self.settings.influence_radius_cm;
        data.dist1
            .zip_map(&data.dist2, |d1, d2| boundary_influence(d1, d2, radius))
    }

    /// `influence * (1 + uplift_noise) * strength`; never negative.
    pub fn uplift(
        &self,
        noise: &NoiseField,
        grid: &CoordinateGrid,
        influence: &Field2D<f64>,
    ) -> Field2D<f64> {
        let strength = self.settings.uplift_strength;
        let texture = noise.sample_grid(grid, NoiseChannel::TectonicUplift, &self.uplift_noise);
        influence.zip_map(&texture, |i, n| i * (1.0 + n.clamp(-1.0, 1.0)) * strength)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_config::WorldParams;

    const EPSILON: f64 = 1e-12;

    fn settings(plates: u32) -> WorldSettings {
        WorldParams {
            world_width_chunks: Some(4),
            world_height_chunks: Some(4),
            num_tectonic_plates: plates,
            mountain_influence_radius_km: 0.02,
            ..Default::default()
        }
        .resolve()
        .unwrap()
    }

    fn brute_force(plates: &PlateSet, q: DVec2) -> (f64, f64) {
        let mut d: Vec<f64> = plates.centers().iter().map(|c| c.distance(q)).collect();
        d.sort_by(f64::total_cmp);
        (d[0], d.get(1).copied().unwrap_or(f64::INFINITY))
    }

    #[test]
    fn test_plates_inside_world_and_deterministic() {
        let a = PlateSet::generate(40_000.0, 20_000.0, 16, 1337);
        let b = PlateSet::generate(40_000.0, 20_000.0, 16, 1337);
        assert_eq!(a, b);
        assert_eq!(a.len(), 16);
        for c in a.centers() {
            assert!((0.0..40_000.0).contains(&c.x) && (0.0..20_000.0).contains(&c.y));
        }
        assert_ne!(a, PlateSet::generate(40_000.0, 20_000.0, 16, 1338));
    }

    #[test]
    fn test_kd_tree_matches_brute_force() {
        let plates = PlateSet::generate(10_000.0, 10_000.0, 37, 99);
        let index = PlateIndex::new(&plates);
        for i in 0..400 {
            let q = DVec2::new((i * 37 % 101) as f64 * 100.0, (i * 53 % 97) as f64 * 103.0);
            let found = index.nearest_two(q).unwrap();
            let (d1, d2) = brute_force(&plates, q);
            assert!((found.dist1 - d1).abs() < EPSILON, "dist1 at {q}");
            assert!((found.dist2 - d2).abs() < EPSILON, "dist2 at {q}");
            assert!(found.dist1 <= found.dist2);
            let nearest = plates.centers()[found.plate as usize].distance(q);
            assert!((nearest - d1).abs() < EPSILON);
        }
    }

    #[test]
    fn test_single_plate_has_infinite_second_distance() {
        let plates = PlateSet::generate(100.0, 100.0, 1, 5);
        let index = PlateIndex::new(&plates);
        let n = index.nearest_two(DVec2::new(3.0, 4.0)).unwrap();
        assert_eq!(n.plate, 0);
        assert!(n.dist2.is_infinite());
    }

    #[test]
    fn test_influence_peaks_on_boundary() {
        assert!((boundary_influence(50.0, 50.0, 10.0) - 1.0).abs() < EPSILON);
        assert_eq!(boundary_influence(10.0, 40.0, 10.0), 0.0);
        let mid = boundary_influence(10.0, 20.0, 10.0);
        assert!((mid - 0.5).abs() < EPSILON, "half radius eases to 0.5, got {mid}");
        assert_eq!(boundary_influence(5.0, f64::INFINITY, 10.0), 0.0);
    }

    #[test]
    fn test_single_plate_uplift_is_exactly_zero() {
        let s = settings(1);
        let model = TectonicModel::new(&s);
        let noise = NoiseField::new(s.seed);
        let grid = CoordinateGrid::pixel_window(0, 0, 40, 40, 1000.0).unwrap();
        let data = model.plate_data(&grid);
        let uplift = model.uplift(&noise, &grid, &model.influence(&data));
        assert!(uplift.iter().all(|u| u == 0.0));
        assert!(data.plate_ids.iter().all(|id| id == 0));
    }

    #[test]
    fn test_uplift_bounded_by_twice_strength() {
        let s = settings(8);
        let model = TectonicModel::new(&s);
        let noise = NoiseField::new(s.seed);
        let grid = CoordinateGrid::pixel_window(0, 0, 60, 60, 600.0).unwrap();
        let data = model.plate_data(&grid);
        let uplift = model.uplift(&noise, &grid, &model.influence(&data));
        let limit = 2.0 * s.tectonics.uplift_strength;
        assert!(uplift.iter().all(|u| (0.0..=limit).contains(&u)));
        assert!(uplift.max() > 0.0, "eight plates should produce some ridge");
    }
}
