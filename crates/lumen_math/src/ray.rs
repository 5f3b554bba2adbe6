use crate::{Interval, Vec3};

/// Offset applied to secondary rays so they do not re-hit the surface they
/// leave from.
pub const RAY_EPSILON: f32 = 1e-3;

/// A ray in 3D space with a valid parametric range.
///
/// Points on the ray are `origin + t * direction` for `t` in `[min_t, max_t]`.
/// Closest-hit queries shrink `max_t` as nearer surfaces are found.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
    pub min_t: f32,
    pub max_t: f32,
}

impl Ray {
    /// Create an unbounded ray starting at `origin`.
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction,
            min_t: 0.0,
            max_t: f32::INFINITY,
        }
    }

    /// Create a secondary ray that skips the first `RAY_EPSILON` of its length.
    pub fn secondary(origin: Vec3, direction: Vec3) -> Self {
        Self {
            min_t: RAY_EPSILON,
            ..Self::new(origin, direction)
        }
    }

    /// Create a ray restricted to `[min_t, max_t]`.
    pub fn with_range(origin: Vec3, direction: Vec3, min_t: f32, max_t: f32) -> Self {
        Self {
            origin,
            direction,
            min_t,
            max_t,
        }
    }

    /// The valid parametric range as an interval.
    #[inline]
    pub fn range(&self) -> Interval {
        Interval::new(self.min_t, self.max_t)
    }

    /// Get the point along the ray at parameter t.
    #[inline]
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }
}
