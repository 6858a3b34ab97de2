//! Self-intersection-safe ray construction.
//!
//! A hit position reconstructed from a traversal carries floating-point
//! error, so a ray started exactly at it can hit the surface it starts on.
//! Every ray built here starts `error_offset` away from the surface along
//! the face normal, on the side the ray travels into.
//!
//! All functions expect valid hits.

use crate::Hit;
use tinyray_math::{Ray, ShadowRay, Vec3};

/// Parametric slack at both ends of a surface-to-surface shadow ray.
pub const SHADOW_EPSILON: f32 = 1e-5;

/// Number of single-precision ULPs the hit error bound is scaled by.
pub const ERROR_ULPS: f32 = 32.0;

/// Upper bound on the error of a hit at `position` found at ray parameter
/// `distance`: `max(|x|, |y|, |z|, distance) * 32 * f32::EPSILON`.
#[inline]
pub fn error_offset(position: Vec3, distance: f32) -> f32 {
    position.abs().max_element().max(distance) * ERROR_ULPS * f32::EPSILON
}

/// `hit.position` moved off the surface to the side `direction` points into.
///
/// Tangent directions (`dot == 0`) count as leaving through the normal side.
#[inline]
pub fn offset_point<M>(hit: &Hit<'_, M>, direction: Vec3) -> Vec3 {
    let sign = if direction.dot(hit.normal) < 0.0 { -1.0 } else { 1.0 };
    hit.position + sign * hit.error_offset * hit.normal
}

/// A ray leaving the surface at `hit` in `direction`.
pub fn spawn_ray<M>(hit: &Hit<'_, M>, direction: Vec3) -> Ray {
    debug_assert!(hit.is_valid(), "cannot spawn a ray from a miss");
    Ray::new(offset_point(hit, direction), direction, hit.error_offset)
}

/// A shadow ray connecting two surface points.
///
/// Both endpoints are pushed off their own surfaces before the direction is
/// recomputed, so the range `[SHADOW_EPSILON, 1 - SHADOW_EPSILON]` spans the
/// segment between them without touching either surface.
pub fn make_shadow_ray<M>(from: &Hit<'_, M>, to: &Hit<'_, M>) -> ShadowRay {
    debug_assert!(from.is_valid() && to.is_valid(), "shadow ray endpoints must be hits");

    let dir = to.position - from.position;
    let p0 = offset_point(from, dir);
    let p1 = offset_point(to, -dir);

    ShadowRay::new(Ray::new(p0, p1 - p0, SHADOW_EPSILON), 1.0 - SHADOW_EPSILON)
}

/// A shadow ray from a surface point to an arbitrary point.
///
/// Only the start is offset: `target` has no surface information. Geometry
/// right at the target can therefore still register as an occluder.
pub fn make_shadow_ray_to_point<M>(from: &Hit<'_, M>, target: Vec3) -> ShadowRay {
    let dir = target - from.position;
    let length = dir.length();
    let ray = spawn_ray(from, dir / length);

    ShadowRay::new(ray, length - from.error_offset)
}

/// A shadow ray that only tests whether `direction` escapes the scene.
pub fn make_background_shadow_ray<M>(from: &Hit<'_, M>, direction: Vec3) -> ShadowRay {
    ShadowRay::new(spawn_ray(from, direction), f32::MAX)
}
