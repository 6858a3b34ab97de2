//! Triangle primitive for the software engine.
//!
//! Uses the Möller-Trumbore algorithm for ray-triangle intersection. The
//! (u, v) it reports match Embree's barycentric convention.

use crate::GeometryId;
use tinyray_math::{Aabb, Interval, Ray, Vec2, Vec3};

/// Parameters of a ray-triangle intersection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct TriangleHit {
    pub t: f32,
    pub barycentric: Vec2,
}

/// A triangle tagged with the mesh and face it came from.
#[derive(Debug, Clone)]
pub(crate) struct Triangle {
    v0: Vec3,
    edge1: Vec3,
    edge2: Vec3,
    pub geometry_id: GeometryId,
    pub primitive_id: u32,
    bbox: Aabb,
}

impl Triangle {
    pub fn new(v0: Vec3, v1: Vec3, v2: Vec3, geometry_id: GeometryId, primitive_id: u32) -> Self {
        let min = v0.min(v1).min(v2);
        let max = v0.max(v1).max(v2);

        // Pad thin dimensions to avoid degenerate AABBs
        let delta = 0.0001;
        let bbox = Aabb::from_points(min - Vec3::splat(delta), max + Vec3::splat(delta));

        Self {
            v0,
            edge1: v1 - v0,
            edge2: v2 - v0,
            geometry_id,
            primitive_id,
            bbox,
        }
    }

    pub fn bounding_box(&self) -> Aabb {
        self.bbox
    }

    /// Möller-Trumbore ray-triangle intersection.
    pub fn intersect(&self, ray: &Ray, ray_t: Interval) -> Option<TriangleHit> {
        let h = ray.direction.cross(self.edge2);
        let a = self.edge1.dot(h);

        // Ray is parallel to triangle
        if a.abs() < 1e-8 {
            return None;
        }

        let f = 1.0 / a;
        let s = ray.origin - self.v0;
        let u = f * s.dot(h);

        if !(0.0..=1.0).contains(&u) {
            return None;
        }

        let q = s.cross(self.edge1);
        let v = f * ray.direction.dot(q);

        if v < 0.0 || u + v > 1.0 {
            return None;
        }

        let t = f * self.edge2.dot(q);

        if !ray_t.contains(t) {
            return None;
        }

        Some(TriangleHit {
            t,
            barycentric: Vec2::new(u, v),
        })
    }
}
