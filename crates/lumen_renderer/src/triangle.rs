//! Triangle primitive for ray tracing.
//!
//! Uses the Möller-Trumbore algorithm for ray-triangle intersection.

use crate::hittable::{HitRecord, Hittable};
use crate::Material;
use lumen_math::{Aabb, Ray, Vec3};

/// A triangle primitive.
pub struct Triangle<M: Material> {
    v0: Vec3,
    edge1: Vec3,
    edge2: Vec3,
    /// Geometric normal, unit length
    normal: Vec3,
    material: M,
    bbox: Aabb,
}

impl<M: Material> Triangle<M> {
    /// Create a new triangle from three vertices. The winding order picks
    /// the outward side.
    pub fn new(v0: Vec3, v1: Vec3, v2: Vec3, material: M) -> Self {
        let edge1 = v1 - v0;
        let edge2 = v2 - v0;
        let normal = edge1.cross(edge2).normalize_or_zero();

        let mut bbox = Aabb::EMPTY;
        for v in [v0, v1, v2] {
            bbox.include_point(v);
        }

        Self {
            v0,
            edge1,
            edge2,
            normal,
            material,
            bbox,
        }
    }

    /// Möller-Trumbore; returns the ray parameter of the hit.
    fn intersect(&self, ray: &Ray) -> Option<f32> {
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
        ray.range().contains(t).then_some(t)
    }
}

impl<M: Material + 'static> Hittable for Triangle<M> {
    fn hit<'a>(&'a self, ray: &Ray) -> Option<HitRecord<'a>> {
        let t = self.intersect(ray)?;
        Some(HitRecord::new(ray, t, self.normal, &self.material))
    }

    fn hit_any(&self, ray: &Ray) -> bool {
        self.intersect(ray).is_some()
    }

    fn bounding_box(&self) -> Aabb {
        self.bbox
    }
}
