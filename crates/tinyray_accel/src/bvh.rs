//! Software Bounding Volume Hierarchy (BVH) engine.
//!
//! Gathers the triangles of every attached mesh into one binary tree and
//! answers closest-hit and any-hit queries against it.

use crate::triangle::{Triangle, TriangleHit};
use crate::{AccelerationScene, GeometryId, RawHit, SceneConfig};
use tinyray_math::{Aabb, Interval, Ray, Vec3};

/// BVH node - either a branch with two children or a leaf with triangles.
enum BvhNode {
    /// Internal node with two children.
    Branch {
        left: Box<BvhNode>,
        right: Box<BvhNode>,
        bbox: Aabb,
    },
    /// Leaf node with a small number of triangles.
    Leaf { triangles: Vec<Triangle>, bbox: Aabb },
    /// Empty node (scene without geometry).
    Empty,
}

impl BvhNode {
    /// Recursive median-split construction.
    ///
    /// Sorts triangles by centroid on the longest axis of the centroid
    /// bounds, splits in half, recurses.
    fn build(mut triangles: Vec<Triangle>, max_leaf_size: usize) -> Self {
        if triangles.is_empty() {
            return BvhNode::Empty;
        }

        let bbox = triangles
            .iter()
            .fold(Aabb::EMPTY, |acc, t| Aabb::surrounding(&acc, &t.bounding_box()));

        if triangles.len() <= max_leaf_size {
            return BvhNode::Leaf { triangles, bbox };
        }

        let centroid_bounds = triangles.iter().fold(Aabb::EMPTY, |acc, t| {
            Aabb::surrounding(&acc, &Aabb::from_point(t.bounding_box().centroid()))
        });
        let axis = centroid_bounds.longest_axis();

        triangles.sort_unstable_by(|a, b| {
            let a_val = a.bounding_box().centroid()[axis];
            let b_val = b.bounding_box().centroid()[axis];
            a_val.total_cmp(&b_val)
        });

        let mid = triangles.len() / 2;
        let right_triangles = triangles.split_off(mid);

        BvhNode::Branch {
            left: Box::new(Self::build(triangles, max_leaf_size)),
            right: Box::new(Self::build(right_triangles, max_leaf_size)),
            bbox,
        }
    }

    /// Closest hit within `ray_t`.
    fn closest<'a>(&'a self, ray: &Ray, ray_t: Interval) -> Option<(TriangleHit, &'a Triangle)> {
        match self {
            BvhNode::Empty => None,

            BvhNode::Leaf { triangles, bbox } => {
                if !bbox.hit(ray, ray_t) {
                    return None;
                }

                let mut closest = None;
                let mut range = ray_t;
                for tri in triangles {
                    if let Some(hit) = tri.intersect(ray, range) {
                        range = range.with_max(hit.t);
                        closest = Some((hit, tri));
                    }
                }
                closest
            }

            BvhNode::Branch { left, right, bbox } => {
                if !bbox.hit(ray, ray_t) {
                    return None;
                }

                let hit_left = left.closest(ray, ray_t);

                // Only check right up to closest hit
                let right_t = match &hit_left {
                    Some((hit, _)) => ray_t.with_max(hit.t),
                    None => ray_t,
                };
                right.closest(ray, right_t).or(hit_left)
            }
        }
    }

    /// Any hit within `ray_t`, stopping at the first one found.
    fn any_hit(&self, ray: &Ray, ray_t: Interval) -> bool {
        match self {
            BvhNode::Empty => false,
            BvhNode::Leaf { triangles, bbox } => {
                bbox.hit(ray, ray_t) && triangles.iter().any(|t| t.intersect(ray, ray_t).is_some())
            }
            BvhNode::Branch { left, right, bbox } => {
                bbox.hit(ray, ray_t) && (left.any_hit(ray, ray_t) || right.any_hit(ray, ray_t))
            }
        }
    }

    fn depth(&self) -> usize {
        match self {
            BvhNode::Empty => 0,
            BvhNode::Leaf { .. } => 1,
            BvhNode::Branch { left, right, .. } => 1 + left.depth().max(right.depth()),
        }
    }
}

/// Pure Rust acceleration engine.
///
/// Geometry ids are issued sequentially from 0. Triangles are buffered
/// until `finalize` builds the tree.
pub struct BvhScene {
    max_leaf_size: usize,
    pending: Vec<Triangle>,
    root: BvhNode,
    geometry_count: u32,
    triangle_count: usize,
    finalized: bool,
}

impl BvhScene {
    pub fn new(config: &SceneConfig) -> Self {
        Self {
            max_leaf_size: config.max_leaf_size.max(1),
            pending: Vec::new(),
            root: BvhNode::Empty,
            geometry_count: 0,
            triangle_count: 0,
            finalized: false,
        }
    }

    pub fn geometry_count(&self) -> u32 {
        self.geometry_count
    }

    pub fn triangle_count(&self) -> usize {
        self.triangle_count
    }

    /// Depth of the built tree (0 before `finalize` or without geometry).
    pub fn depth(&self) -> usize {
        self.root.depth()
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }
}

impl Default for BvhScene {
    fn default() -> Self {
        Self::new(&SceneConfig::default())
    }
}

impl AccelerationScene for BvhScene {
    fn add_triangle_mesh(&mut self, vertices: &[f32], indices: &[u32]) -> GeometryId {
        assert!(!self.finalized, "cannot add geometry to a finalized scene");

        let geometry_id = self.geometry_count;
        self.geometry_count += 1;

        let positions: Vec<Vec3> = vertices
            .chunks_exact(3)
            .map(|xyz| Vec3::new(xyz[0], xyz[1], xyz[2]))
            .collect();

        for (primitive_id, tri) in indices.chunks_exact(3).enumerate() {
            let corners = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
            if corners.iter().any(|&i| i >= positions.len()) {
                log::warn!(
                    "Skipping triangle {} of geometry {}: indices {:?} out of range ({} vertices)",
                    primitive_id,
                    geometry_id,
                    tri,
                    positions.len()
                );
                continue;
            }
            self.pending.push(Triangle::new(
                positions[corners[0]],
                positions[corners[1]],
                positions[corners[2]],
                geometry_id,
                primitive_id as u32,
            ));
        }

        geometry_id
    }

    fn finalize(&mut self) {
        assert!(!self.finalized, "scene finalized twice");

        let triangles = std::mem::take(&mut self.pending);
        self.triangle_count = triangles.len();
        self.root = BvhNode::build(triangles, self.max_leaf_size);
        self.finalized = true;

        log::debug!(
            "Built software BVH: {} geometries, {} triangles, depth {}",
            self.geometry_count,
            self.triangle_count,
            self.root.depth()
        );
    }

    fn trace_single(&self, ray: &Ray, range: Interval) -> RawHit {
        assert!(self.finalized, "scene must be finalized before tracing");

        match self.root.closest(ray, range) {
            Some((hit, tri)) => RawHit {
                distance: hit.t,
                barycentric: hit.barycentric,
                geometry_id: tri.geometry_id,
                primitive_id: tri.primitive_id,
            },
            None => RawHit::MISS,
        }
    }

    fn is_occluded(&self, ray: &Ray, range: Interval) -> bool {
        assert!(self.finalized, "scene must be finalized before tracing");
        self.root.any_hit(ray, range)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng};

    /// Quad at height `y` spanning x,z in [-1, 1], offset by `x_offset`.
    fn quad_buffers(y: f32, x_offset: f32) -> (Vec<f32>, Vec<u32>) {
        let vertices = vec![
            -1.0 + x_offset, y, -1.0,
            1.0 + x_offset, y, -1.0,
            1.0 + x_offset, y, 1.0,
            -1.0 + x_offset, y, 1.0,
        ];
        (vertices, vec![0, 1, 2, 0, 2, 3])
    }

    #[test]
    fn test_empty_scene_misses() {
        let mut scene = BvhScene::default();
        scene.finalize();

        let ray = Ray::new_simple(Vec3::ZERO, Vec3::Y);
        assert!(scene.trace_single(&ray, Interval::from_min(0.0)).is_miss());
        assert!(!scene.is_occluded(&ray, Interval::from_min(0.0)));
        assert_eq!(scene.depth(), 0);
    }

    #[test]
    fn test_sequential_geometry_ids() {
        let mut scene = BvhScene::default();
        let (v, i) = quad_buffers(0.0, 0.0);

        assert_eq!(scene.add_triangle_mesh(&v, &i), 0);
        assert_eq!(scene.add_triangle_mesh(&v, &i), 1);
        assert_eq!(scene.geometry_count(), 2);
    }

    #[test]
    fn test_closest_of_stacked_quads() {
        let mut scene = BvhScene::default();
        let (v0, i0) = quad_buffers(0.0, 0.0);
        let (v1, i1) = quad_buffers(2.0, 0.0);
        let low = scene.add_triangle_mesh(&v0, &i0);
        let high = scene.add_triangle_mesh(&v1, &i1);
        scene.finalize();

        let down = Ray::new_simple(Vec3::new(0.1, 5.0, 0.3), Vec3::NEG_Y);
        let hit = scene.trace_single(&down, Interval::from_min(0.0));
        assert_eq!(hit.geometry_id, high);
        assert!((hit.distance - 3.0).abs() < 1e-5);

        let up = Ray::new_simple(Vec3::new(0.1, -5.0, 0.3), Vec3::Y);
        let hit = scene.trace_single(&up, Interval::from_min(0.0));
        assert_eq!(hit.geometry_id, low);
        assert!((hit.distance - 5.0).abs() < 1e-5);

        // Skipping the first surface with min distance
        let hit = scene.trace_single(&down, Interval::from_min(3.5));
        assert_eq!(hit.geometry_id, low);
    }

    #[test]
    fn test_occlusion_respects_range() {
        let mut scene = BvhScene::default();
        let (v, i) = quad_buffers(0.0, 0.0);
        scene.add_triangle_mesh(&v, &i);
        scene.finalize();

        let down = Ray::new_simple(Vec3::new(0.0, 5.0, 0.2), Vec3::NEG_Y);
        assert!(scene.is_occluded(&down, Interval::new(0.0, 10.0)));
        assert!(!scene.is_occluded(&down, Interval::new(0.0, 4.9)));
        assert!(!scene.is_occluded(&down, Interval::new(5.1, 10.0)));
    }

    #[test]
    fn test_out_of_range_indices_are_skipped() {
        let mut scene = BvhScene::default();
        let (v, _) = quad_buffers(0.0, 0.0);
        scene.add_triangle_mesh(&v, &[0, 1, 2, 0, 2, 9]);
        scene.finalize();

        assert_eq!(scene.triangle_count(), 1);
    }

    #[test]
    #[should_panic(expected = "finalized twice")]
    fn test_double_finalize_panics() {
        let mut scene = BvhScene::default();
        scene.finalize();
        scene.finalize();
    }

    #[test]
    fn test_matches_brute_force() {
        let mut rng = rand::rngs::StdRng::seed_from_u64(1337);
        let config = SceneConfig {
            max_leaf_size: 2,
            ..Default::default()
        };
        let mut scene = BvhScene::new(&config);

        // A row of quads at different heights
        let mut reference = Vec::new();
        for k in 0..16 {
            let (v, i) = quad_buffers(k as f32 * 0.25, k as f32 * 1.5);
            let id = scene.add_triangle_mesh(&v, &i);
            for (prim, tri) in i.chunks_exact(3).enumerate() {
                let corner = |n: u32| Vec3::new(v[3 * n as usize], v[3 * n as usize + 1], v[3 * n as usize + 2]);
                reference.push(Triangle::new(corner(tri[0]), corner(tri[1]), corner(tri[2]), id, prim as u32));
            }
        }
        scene.finalize();
        assert!(scene.depth() > 1);

        for _ in 0..500 {
            let origin = Vec3::new(rng.gen_range(-2.0..26.0), 10.0, rng.gen_range(-1.5..1.5));
            let direction = Vec3::new(rng.gen_range(-0.5..0.5), -1.0, rng.gen_range(-0.5..0.5));
            let ray = Ray::new_simple(origin, direction);

            let expected = reference
                .iter()
                .filter_map(|t| t.intersect(&ray, Interval::from_min(0.0)))
                .map(|h| h.t)
                .fold(f32::INFINITY, f32::min);
            let hit = scene.trace_single(&ray, Interval::from_min(0.0));

            if expected.is_finite() {
                assert!((hit.distance - expected).abs() < 1e-5);
            } else {
                assert!(hit.is_miss());
            }
        }
    }
}
