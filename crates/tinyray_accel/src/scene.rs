//! The engine-facing scene interface.

use tinyray_math::{Interval, Ray, Vec2};

/// Identifier an engine issues for each attached triangle mesh.
///
/// Engines make no promise that ids are dense or sequential.
pub type GeometryId = u32;

/// Reserved id reported when a ray hits nothing (Embree's `RTC_INVALID_GEOMETRY_ID`).
pub const INVALID_GEOMETRY_ID: GeometryId = u32::MAX;

/// Closest-hit result as reported by an engine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawHit {
    /// Ray parameter of the hit
    pub distance: f32,
    /// Barycentric (u, v) on the hit triangle
    pub barycentric: Vec2,
    pub geometry_id: GeometryId,
    pub primitive_id: u32,
}

impl RawHit {
    pub const MISS: RawHit = RawHit {
        distance: f32::INFINITY,
        barycentric: Vec2::ZERO,
        geometry_id: INVALID_GEOMETRY_ID,
        primitive_id: INVALID_GEOMETRY_ID,
    };

    #[inline]
    pub fn is_miss(&self) -> bool {
        self.geometry_id == INVALID_GEOMETRY_ID
    }
}

/// A ray tracing acceleration structure over triangle meshes.
///
/// Lifecycle: meshes are added, then `finalize` is called exactly once,
/// then only queries are made. Dropping the scene frees it.
///
/// # Thread Safety
///
/// Queries take `&self` and implementations must support concurrent
/// read-only queries after `finalize`.
pub trait AccelerationScene: Send + Sync {
    /// Attach a triangle mesh.
    ///
    /// `vertices` holds `xyz` triplets, `indices` holds one index triplet per
    /// triangle. Returns the id hits on this mesh will report.
    fn add_triangle_mesh(&mut self, vertices: &[f32], indices: &[u32]) -> GeometryId;

    /// Build the acceleration structure.
    fn finalize(&mut self);

    /// Closest hit along `ray` with distance inside `range`.
    fn trace_single(&self, ray: &Ray, range: Interval) -> RawHit;

    /// Whether anything is hit along `ray` with distance inside `range`.
    fn is_occluded(&self, ray: &Ray, range: Interval) -> bool;
}

impl<S: AccelerationScene + ?Sized> AccelerationScene for Box<S> {
    fn add_triangle_mesh(&mut self, vertices: &[f32], indices: &[u32]) -> GeometryId {
        (**self).add_triangle_mesh(vertices, indices)
    }

    fn finalize(&mut self) {
        (**self).finalize()
    }

    fn trace_single(&self, ray: &Ray, range: Interval) -> RawHit {
        (**self).trace_single(ray, range)
    }

    fn is_occluded(&self, ray: &Ray, range: Interval) -> bool {
        (**self).is_occluded(ray, range)
    }
}
