//! k-nearest-neighbour queries over a point set.

use std::collections::BinaryHeap;
use tinyray_accel::{Neighbor, PointBvh};
use tinyray_math::Vec3;

/// Nearest-neighbour search over the points given to `set_points`.
#[derive(Default)]
pub struct KnnAccelerator {
    points: Option<PointBvh>,
}

impl KnnAccelerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the point set and rebuild the hierarchy.
    ///
    /// Neighbours report indices into `points`.
    pub fn set_points(&mut self, points: &[Vec3]) {
        self.points = Some(PointBvh::new(points));
        log::debug!("Built point hierarchy over {} points", points.len());
    }

    /// Number of points searched.
    pub fn len(&self) -> usize {
        self.points.as_ref().map_or(0, PointBvh::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Find up to `k` points strictly closer than `radius` to `position`.
    ///
    /// The result replaces whatever `cache` held. Returns the distance of
    /// the furthest neighbour found, or `radius` if none were.
    pub fn query(&self, position: Vec3, radius: f32, k: usize, cache: &mut KnnCache) -> f32 {
        cache.found.clear();
        let Some(points) = &self.points else {
            cache.heap.clear();
            return radius;
        };

        points.knn(position, radius, k, &mut cache.heap);
        let furthest = cache.heap.peek().map_or(radius, |n| n.distance);

        cache.found.extend(cache.heap.drain());
        cache.found.sort_unstable();
        furthest
    }
}

/// Result buffers reused across `KnnAccelerator::query` calls.
#[derive(Debug, Default)]
pub struct KnnCache {
    heap: BinaryHeap<Neighbor>,
    found: Vec<Neighbor>,
}

impl KnnCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cache sized for queries of up to `k` neighbours.
    pub fn with_capacity(k: usize) -> Self {
        Self {
            heap: BinaryHeap::with_capacity(k),
            found: Vec::with_capacity(k),
        }
    }

    /// Neighbours of the last query, closest first.
    pub fn neighbors(&self) -> &[Neighbor] {
        &self.found
    }

    pub fn len(&self) -> usize {
        self.found.len()
    }

    pub fn is_empty(&self) -> bool {
        self.found.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng};

    fn grid() -> Vec<Vec3> {
        let mut points = Vec::new();
        for x in 0..5 {
            for y in 0..5 {
                for z in 0..5 {
                    points.push(Vec3::new(x as f32, y as f32, z as f32));
                }
            }
        }
        points
    }

    #[test]
    fn test_query_without_points() {
        let knn = KnnAccelerator::new();
        let mut cache = KnnCache::new();

        assert_eq!(knn.query(Vec3::ZERO, 2.5, 4, &mut cache), 2.5);
        assert!(cache.is_empty());
        assert!(knn.is_empty());
    }

    #[test]
    fn test_nearest_on_grid() {
        let points = grid();
        let mut knn = KnnAccelerator::new();
        knn.set_points(&points);
        let mut cache = KnnCache::with_capacity(7);

        let query = Vec3::new(2.0, 2.0, 2.1);
        let furthest = knn.query(query, 10.0, 7, &mut cache);

        let found = cache.neighbors();
        assert_eq!(found.len(), 7);
        assert_eq!(points[found[0].index as usize], Vec3::new(2.0, 2.0, 2.0));
        assert!((found[0].distance - 0.1).abs() < 1e-5);
        assert!(found.windows(2).all(|w| w[0].distance <= w[1].distance));
        assert_eq!(furthest, found[6].distance);
    }

    #[test]
    fn test_radius_limits_results() {
        let mut knn = KnnAccelerator::new();
        knn.set_points(&grid());
        let mut cache = KnnCache::new();

        // Only the point itself is closer than 1
        let furthest = knn.query(Vec3::ONE, 0.5, 10, &mut cache);
        assert_eq!(cache.len(), 1);
        assert_eq!(furthest, 0.0);

        // Nothing in range reports the radius
        let furthest = knn.query(Vec3::splat(-10.0), 3.0, 10, &mut cache);
        assert!(cache.is_empty());
        assert_eq!(furthest, 3.0);
    }

    #[test]
    fn test_matches_brute_force() {
        let mut rng = rand::rngs::StdRng::seed_from_u64(7);
        let points: Vec<Vec3> = (0..500)
            .map(|_| Vec3::new(rng.gen(), rng.gen(), rng.gen()))
            .collect();
        let mut knn = KnnAccelerator::new();
        knn.set_points(&points);
        let mut cache = KnnCache::new();

        for _ in 0..20 {
            let query = Vec3::new(rng.gen(), rng.gen(), rng.gen());
            knn.query(query, 0.25, 8, &mut cache);

            let mut expected: Vec<(f32, u32)> = points
                .iter()
                .enumerate()
                .map(|(i, p)| (p.distance(query), i as u32))
                .filter(|(d, _)| *d < 0.25)
                .collect();
            expected.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
            expected.truncate(8);

            let found: Vec<(f32, u32)> = cache
                .neighbors()
                .iter()
                .map(|n| (n.distance, n.index))
                .collect();
            assert_eq!(found, expected);
        }
    }
}
