use crate::{Interval, Ray, Vec3};

/// Axis-Aligned Bounding Box for spatial acceleration structures (BVH).
///
/// Boxes only ever grow through `include_point` / `include_box`. A box that
/// has never included anything is `EMPTY` and intersects nothing. Boxes of
/// zero thickness along an axis are valid.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    /// Empty box: min at +inf, max at -inf.
    pub const EMPTY: Aabb = Aabb {
        min: Vec3::INFINITY,
        max: Vec3::NEG_INFINITY,
    };

    /// Create an AABB from two corner points in any order.
    pub fn from_points(a: Vec3, b: Vec3) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// Create an AABB that surrounds two other AABBs.
    pub fn surrounding(box0: &Aabb, box1: &Aabb) -> Self {
        let mut out = *box0;
        out.include_box(box1);
        out
    }

    /// True if nothing has been included yet.
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    /// Grow the box to contain `p`.
    pub fn include_point(&mut self, p: Vec3) {
        self.min = self.min.min(p);
        self.max = self.max.max(p);
    }

    /// Grow the box to contain `other`.
    pub fn include_box(&mut self, other: &Aabb) {
        self.min = self.min.min(other.min);
        self.max = self.max.max(other.max);
    }

    /// Returns the index (0=X, 1=Y, 2=Z) of the axis with the greatest extent.
    ///
    /// Ties go to the later axis.
    pub fn largest_axis(&self) -> usize {
        let size = self.max - self.min;

        if size.x > size.y && size.x > size.z {
            0
        } else if size.y > size.z {
            1
        } else {
            2
        }
    }

    /// Returns the center point of the bounding box.
    pub fn centroid(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Inclusive point containment.
    pub fn contains_point(&self, p: Vec3) -> bool {
        p.cmpge(self.min).all() && p.cmple(self.max).all()
    }

    /// Slab test against the ray's valid range.
    ///
    /// Returns the entry/exit parameters clipped to `[ray.min_t, ray.max_t]`,
    /// or `None` when the clipped interval is empty. Zero direction components
    /// produce infinities (and possibly NaN for origins on a slab plane);
    /// `f32::max`/`f32::min` discard the NaN so the remaining axes decide.
    pub fn intersect(&self, ray: &Ray) -> Option<Interval> {
        let mut t = ray.range();

        for axis in 0..3 {
            let inv_d = 1.0 / ray.direction[axis];
            let mut t0 = (self.min[axis] - ray.origin[axis]) * inv_d;
            let mut t1 = (self.max[axis] - ray.origin[axis]) * inv_d;
            if inv_d < 0.0 {
                std::mem::swap(&mut t0, &mut t1);
            }
            t.min = t0.max(t.min);
            t.max = t1.min(t.max);
            if t.is_empty() {
                return None;
            }
        }

        // An empty box can survive the loop only through NaN comparisons.
        if self.is_empty() {
            return None;
        }

        Some(t)
    }

    /// Boolean form of [`Aabb::intersect`].
    #[inline]
    pub fn hit(&self, ray: &Ray) -> bool {
        self.intersect(ray).is_some()
    }
}

impl Default for Aabb {
    fn default() -> Self {
        Self::EMPTY
    }
}
