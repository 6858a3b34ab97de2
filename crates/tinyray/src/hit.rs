//! Hit records returned by `Raytracer::trace`.

use std::fmt;
use tinyray_math::{Vec2, Vec3};

/// Record of a ray-scene intersection.
///
/// A hit is valid iff `mesh` is `Some`. The geometric fields of an invalid
/// hit carry no meaning.
pub struct Hit<'a, M> {
    /// Barycentric (u, v) on the hit triangle
    pub barycentric: Vec2,
    /// Ray parameter where the intersection occurs
    pub distance: f32,
    /// Mesh that was hit, borrowed from the ray tracer's registry
    pub mesh: Option<&'a M>,
    /// Triangle index within `mesh`
    pub primitive_id: u32,
    /// World position of the hit point
    pub position: Vec3,
    /// Face normal of the hit triangle
    pub normal: Vec3,
    /// How far off the surface a new ray origin must be to not re-hit it
    pub error_offset: f32,
}

impl<'a, M> Hit<'a, M> {
    /// The hit returned for rays that escape the scene.
    pub fn miss() -> Self {
        Self {
            barycentric: Vec2::ZERO,
            distance: f32::INFINITY,
            mesh: None,
            primitive_id: 0,
            position: Vec3::ZERO,
            normal: Vec3::ZERO,
            error_offset: 0.0,
        }
    }

    #[inline]
    pub fn is_valid(&self) -> bool {
        self.mesh.is_some()
    }
}

// Manual impls: a derive would wrongly require `M: Clone`.
impl<M> Clone for Hit<'_, M> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<M> Copy for Hit<'_, M> {}

impl<M> Default for Hit<'_, M> {
    fn default() -> Self {
        Self::miss()
    }
}

impl<M> fmt::Debug for Hit<'_, M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.is_valid() {
            return f.write_str("Hit(miss)");
        }
        f.debug_struct("Hit")
            .field("distance", &self.distance)
            .field("primitive_id", &self.primitive_id)
            .field("barycentric", &self.barycentric)
            .field("position", &self.position)
            .field("normal", &self.normal)
            .field("error_offset", &self.error_offset)
            .finish()
    }
}
