use crate::{Interval, Vec3};

/// A ray in 3D space with origin, direction, and a minimum hit distance.
///
/// Intersections closer than `min_distance` (in units of `direction`) are
/// ignored. Rays spawned from a surface use this to step over the surface
/// they start on.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
    pub min_distance: f32,
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3, min_distance: f32) -> Self {
        Self {
            origin,
            direction,
            min_distance,
        }
    }

    /// Create a ray that accepts hits from distance 0.
    #[inline]
    pub fn new_simple(origin: Vec3, direction: Vec3) -> Self {
        Self::new(origin, direction, 0.0)
    }

    /// `origin + t * direction`
    #[inline]
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }
}

/// A ray bounded on both ends, used for visibility tests.
///
/// Only geometry within `[ray.min_distance, max_distance]` counts as an
/// occluder.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ShadowRay {
    pub ray: Ray,
    pub max_distance: f32,
}

impl ShadowRay {
    pub fn new(ray: Ray, max_distance: f32) -> Self {
        Self { ray, max_distance }
    }

    /// The parametric range that is tested for occluders.
    #[inline]
    pub fn range(&self) -> Interval {
        Interval::new(self.ray.min_distance, self.max_distance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_min_distance() {
        let ray = Ray::new(Vec3::new(1.0, 2.0, 3.0), Vec3::Y, 0.5);
        assert_eq!(ray.min_distance, 0.5);
        assert_eq!(Ray::new_simple(ray.origin, ray.direction).min_distance, 0.0);
    }

    #[test]
    fn test_point_at_parameter() {
        let ray = Ray::new_simple(Vec3::new(0.0, 1.0, 0.0), Vec3::new(2.0, 0.0, 0.0));

        assert_eq!(ray.at(0.5), Vec3::new(1.0, 1.0, 0.0));
        assert_eq!(ray.at(-1.0), Vec3::new(-2.0, 1.0, 0.0));
    }

    #[test]
    fn test_shadow_ray_range() {
        let shadow = ShadowRay::new(Ray::new(Vec3::ZERO, Vec3::Y, 0.25), 4.0);
        let range = shadow.range();

        assert_eq!(range.min, 0.25);
        assert_eq!(range.max, 4.0);
        assert!(range.contains(4.0));
        assert!(!range.contains(0.2));
    }
}
