// Math types are glam's
pub use glam::*;


mod aabb;
mod interval;
mod ray;

pub use aabb::Aabb;
pub use interval::Interval;
pub use ray::{Ray, ShadowRay};

/// View a slice of points as a flat `xyz` float buffer.
///
/// This is the layout ray tracing engines expect for vertex buffers.
#[inline]
pub fn as_flat_floats(points: &[Vec3]) -> &[f32] {
    bytemuck::cast_slice(points)
}
