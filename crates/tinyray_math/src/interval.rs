/// A closed range `[min, max]` of ray parameters.
///
/// Engines only report intersections whose parameter falls inside the
/// range they are given; both ends count.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interval {
    pub min: f32,
    pub max: f32,
}

impl Interval {
    pub fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// Unbounded above.
    pub fn from_min(min: f32) -> Self {
        Self::new(min, f32::INFINITY)
    }

    #[inline]
    pub fn contains(&self, t: f32) -> bool {
        (self.min..=self.max).contains(&t)
    }

    /// Same range with the upper bound replaced, used to narrow the search
    /// after each closer hit.
    pub fn with_max(&self, max: f32) -> Interval {
        Interval::new(self.min, max)
    }

    pub fn is_empty(&self) -> bool {
        !(self.min <= self.max)
    }
}
