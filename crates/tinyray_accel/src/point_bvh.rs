//! Point hierarchy for k-nearest-neighbour queries.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use tinyray_math::{Aabb, Vec3};

/// Maximum points per leaf node before splitting.
const LEAF_MAX_SIZE: usize = 8;

/// A point found by a nearest-neighbour query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    /// Index of the point in the array the hierarchy was built from
    pub index: u32,
    pub distance: f32,
}

impl Eq for Neighbor {}

impl Ord for Neighbor {
    fn cmp(&self, other: &Self) -> Ordering {
        self.distance
            .total_cmp(&other.distance)
            .then(self.index.cmp(&other.index))
    }
}

impl PartialOrd for Neighbor {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

enum PointNode {
    Branch {
        left: Box<PointNode>,
        right: Box<PointNode>,
        bbox: Aabb,
    },
    Leaf {
        points: Vec<(u32, Vec3)>,
        bbox: Aabb,
    },
    Empty,
}

impl PointNode {
    fn build(mut points: Vec<(u32, Vec3)>) -> Self {
        if points.is_empty() {
            return PointNode::Empty;
        }

        let bbox = points
            .iter()
            .fold(Aabb::EMPTY, |acc, (_, p)| Aabb::surrounding(&acc, &Aabb::from_point(*p)));

        if points.len() <= LEAF_MAX_SIZE {
            return PointNode::Leaf { points, bbox };
        }

        let axis = bbox.longest_axis();
        points.sort_unstable_by(|a, b| a.1[axis].total_cmp(&b.1[axis]));

        let right_points = points.split_off(points.len() / 2);

        PointNode::Branch {
            left: Box::new(Self::build(points)),
            right: Box::new(Self::build(right_points)),
            bbox,
        }
    }

    fn bbox(&self) -> Option<&Aabb> {
        match self {
            PointNode::Branch { bbox, .. } | PointNode::Leaf { bbox, .. } => Some(bbox),
            PointNode::Empty => None,
        }
    }

    /// Squared distance from `p` to this node's box, infinite for empty nodes.
    fn distance_squared(&self, p: Vec3) -> f32 {
        self.bbox().map_or(f32::INFINITY, |b| b.distance_squared(p))
    }

    fn knn(&self, query: Vec3, radius: &mut f32, k: usize, heap: &mut BinaryHeap<Neighbor>) {
        match self {
            PointNode::Empty => {}

            PointNode::Leaf { points, .. } => {
                for &(index, p) in points {
                    let distance = p.distance(query);
                    if distance >= *radius {
                        continue;
                    }

                    if heap.len() == k {
                        heap.pop();
                    }
                    heap.push(Neighbor { index, distance });

                    // Once full, only points closer than the current k-th can enter
                    if heap.len() == k {
                        if let Some(furthest) = heap.peek() {
                            *radius = furthest.distance;
                        }
                    }
                }
            }

            PointNode::Branch { left, right, .. } => {
                let dl = left.distance_squared(query);
                let dr = right.distance_squared(query);
                let (near, d_near, far, d_far) = if dl <= dr {
                    (left, dl, right, dr)
                } else {
                    (right, dr, left, dl)
                };

                if d_near < *radius * *radius {
                    near.knn(query, radius, k, heap);
                }
                if d_far < *radius * *radius {
                    far.knn(query, radius, k, heap);
                }
            }
        }
    }
}

/// Bounding volume hierarchy over a point set.
pub struct PointBvh {
    root: PointNode,
    len: usize,
}

impl PointBvh {
    /// Build over `points`. Neighbours report indices into this slice.
    pub fn new(points: &[Vec3]) -> Self {
        let indexed = points
            .iter()
            .enumerate()
            .map(|(i, p)| (i as u32, *p))
            .collect();

        Self {
            root: PointNode::build(indexed),
            len: points.len(),
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Collect up to `k` points strictly closer than `radius` to `query`.
    ///
    /// `heap` is cleared first. On return it is a max-heap: its top is the
    /// furthest of the neighbours found.
    pub fn knn(&self, query: Vec3, radius: f32, k: usize, heap: &mut BinaryHeap<Neighbor>) {
        heap.clear();
        if k == 0 {
            return;
        }

        let mut radius = radius;
        if self.root.distance_squared(query) < radius * radius {
            self.root.knn(query, &mut radius, k, heap);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng};

    fn sorted(heap: &BinaryHeap<Neighbor>) -> Vec<Neighbor> {
        heap.clone().into_sorted_vec()
    }

    #[test]
    fn test_empty_point_set() {
        let bvh = PointBvh::new(&[]);
        let mut heap = BinaryHeap::new();

        bvh.knn(Vec3::ZERO, 10.0, 3, &mut heap);
        assert!(bvh.is_empty());
        assert!(heap.is_empty());
    }

    #[test]
    fn test_knn_on_a_line() {
        let points: Vec<Vec3> = (0..20).map(|i| Vec3::new(i as f32, 0.0, 0.0)).collect();
        let bvh = PointBvh::new(&points);
        let mut heap = BinaryHeap::new();

        bvh.knn(Vec3::new(4.2, 0.0, 0.0), 100.0, 3, &mut heap);
        let found: Vec<u32> = sorted(&heap).iter().map(|n| n.index).collect();
        assert_eq!(found, vec![4, 5, 3]);
        assert!((heap.peek().unwrap().distance - 1.2).abs() < 1e-5);
    }

    #[test]
    fn test_radius_is_exclusive() {
        let points = [Vec3::ZERO, Vec3::X, Vec3::X * 3.0];
        let bvh = PointBvh::new(&points);
        let mut heap = BinaryHeap::new();

        bvh.knn(Vec3::ZERO, 1.0, 5, &mut heap);
        assert_eq!(sorted(&heap).len(), 1);
    }

    #[test]
    fn test_zero_k() {
        let bvh = PointBvh::new(&[Vec3::ZERO]);
        let mut heap = BinaryHeap::new();

        bvh.knn(Vec3::ZERO, 1.0, 0, &mut heap);
        assert!(heap.is_empty());
    }

    #[test]
    fn test_matches_brute_force() {
        let mut rng = rand::rngs::StdRng::seed_from_u64(42);
        let points: Vec<Vec3> = (0..1000)
            .map(|_| Vec3::new(rng.gen(), rng.gen(), rng.gen()))
            .collect();
        let bvh = PointBvh::new(&points);
        let mut heap = BinaryHeap::new();

        for _ in 0..50 {
            let query = Vec3::new(rng.gen(), rng.gen(), rng.gen());
            bvh.knn(query, 0.3, 10, &mut heap);

            let mut expected: Vec<f32> = points
                .iter()
                .map(|p| p.distance(query))
                .filter(|d| *d < 0.3)
                .collect();
            expected.sort_by(f32::total_cmp);
            expected.truncate(10);

            let found: Vec<f32> = sorted(&heap).iter().map(|n| n.distance).collect();
            assert_eq!(found, expected);
        }
    }
}
