use crate::{Interval, Ray, Vec3};

/// Padding applied to box extents thinner than this.
const MIN_EXTENT: f32 = 0.0001;

/// Axis-aligned bounding box, stored as its two corners.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    /// Box spanning two corner points, in any order.
    ///
    /// Flat boxes are padded so that axis-aligned geometry (a quad lying in
    /// a coordinate plane) still has a volume the slab test can hit.
    pub fn from_points(a: Vec3, b: Vec3) -> Self {
        let min = a.min(b);
        let max = a.max(b);

        let thin = (max - min).cmplt(Vec3::splat(MIN_EXTENT));
        let pad = Vec3::select(thin, Vec3::splat(MIN_EXTENT * 0.5), Vec3::ZERO);

        Self {
            min: min - pad,
            max: max + pad,
        }
    }

    /// Degenerate box around a single point, without padding.
    pub fn from_point(p: Vec3) -> Self {
        Self { min: p, max: p }
    }

    /// Smallest box containing both.
    pub fn surrounding(a: &Aabb, b: &Aabb) -> Self {
        Self {
            min: a.min.min(b.min),
            max: a.max.max(b.max),
        }
    }

    pub fn extent(&self) -> Vec3 {
        self.max - self.min
    }

    /// Slab test: does `ray` pass through the box somewhere in `range`?
    pub fn hit(&self, ray: &Ray, range: Interval) -> bool {
        let inv = ray.direction.recip();
        let t0 = (self.min - ray.origin) * inv;
        let t1 = (self.max - ray.origin) * inv;

        let enter = t0.min(t1).max_element().max(range.min);
        let exit = t0.max(t1).min_element().min(range.max);
        enter <= exit
    }

    /// Squared distance from `p` to the closest point of the box (0 inside).
    pub fn distance_squared(&self, p: Vec3) -> f32 {
        p.clamp(self.min, self.max).distance_squared(p)
    }

    /// Index of the widest axis (0=X, 1=Y, 2=Z). Ties go to the later axis.
    pub fn longest_axis(&self) -> usize {
        let e = self.extent();
        if e.x > e.y && e.x > e.z {
            0
        } else if e.y > e.z {
            1
        } else {
            2
        }
    }

    pub fn centroid(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Contains nothing; the identity for `surrounding`.
    pub const EMPTY: Aabb = Aabb {
        min: Vec3::INFINITY,
        max: Vec3::NEG_INFINITY,
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flat_box_is_padded() {
        let quad = Aabb::from_points(Vec3::new(1.0, 0.0, 1.0), Vec3::new(-1.0, 0.0, -1.0));

        assert!(quad.extent().y > 0.0);
        assert!(quad.min.y < 0.0 && quad.max.y > 0.0);
        assert_eq!(quad.min.x, -1.0);
        assert_eq!(quad.max.z, 1.0);
    }

    #[test]
    fn test_hit_from_above() {
        let quad = Aabb::from_points(Vec3::new(-1.0, 0.0, -1.0), Vec3::new(1.0, 0.0, 1.0));

        let down = Ray::new_simple(Vec3::new(0.0, 5.0, 0.0), Vec3::NEG_Y);
        assert!(quad.hit(&down, Interval::from_min(0.0)));

        // Too short to reach the plane
        assert!(!quad.hit(&down, Interval::new(0.0, 4.0)));

        let up = Ray::new_simple(Vec3::new(0.0, 5.0, 0.0), Vec3::Y);
        assert!(!quad.hit(&up, Interval::from_min(0.0)));
    }

    #[test]
    fn test_axis_parallel_ray() {
        let cube = Aabb::from_points(Vec3::splat(-1.0), Vec3::splat(1.0));

        let inside = Ray::new_simple(Vec3::new(-5.0, 0.5, 0.5), Vec3::X);
        assert!(cube.hit(&inside, Interval::from_min(0.0)));

        let outside = Ray::new_simple(Vec3::new(-5.0, 2.0, 0.5), Vec3::X);
        assert!(!cube.hit(&outside, Interval::from_min(0.0)));
    }

    #[test]
    fn test_surrounding_and_centroid() {
        let a = Aabb::from_points(Vec3::ZERO, Vec3::splat(2.0));
        let b = Aabb::from_points(Vec3::splat(4.0), Vec3::splat(6.0));
        let both = Aabb::surrounding(&a, &b);

        assert_eq!(both.min, Vec3::ZERO);
        assert_eq!(both.max, Vec3::splat(6.0));
        assert_eq!(both.centroid(), Vec3::splat(3.0));
        assert_eq!(Aabb::surrounding(&Aabb::EMPTY, &a), a);
    }

    #[test]
    fn test_longest_axis() {
        assert_eq!(Aabb::from_points(Vec3::ZERO, Vec3::new(10.0, 1.0, 1.0)).longest_axis(), 0);
        assert_eq!(Aabb::from_points(Vec3::ZERO, Vec3::new(1.0, 10.0, 1.0)).longest_axis(), 1);
        assert_eq!(Aabb::from_points(Vec3::ZERO, Vec3::new(1.0, 1.0, 10.0)).longest_axis(), 2);
    }

    #[test]
    fn test_distance_squared() {
        let aabb = Aabb::from_points(Vec3::ZERO, Vec3::splat(1.0));

        assert_eq!(aabb.distance_squared(Vec3::splat(0.5)), 0.0);
        assert_eq!(aabb.distance_squared(Vec3::new(3.0, 0.5, 0.5)), 4.0);
        assert_eq!(Aabb::from_point(Vec3::X).distance_squared(Vec3::ZERO), 1.0);
    }
}
