//! Sphere primitive for ray tracing.

use crate::hittable::{HitRecord, Hittable};
use crate::Material;
use lumen_math::{Aabb, Ray, Vec3};

/// A sphere primitive.
pub struct Sphere<M: Material> {
    center: Vec3,
    radius: f32,
    material: M,
    bbox: Aabb,
}

impl<M: Material> Sphere<M> {
    /// Create a new sphere.
    pub fn new(center: Vec3, radius: f32, material: M) -> Self {
        let radius = radius.max(0.0);
        let rvec = Vec3::splat(radius);
        let bbox = Aabb::from_points(center - rvec, center + rvec);

        Self {
            center,
            radius,
            material,
            bbox,
        }
    }

    /// Nearest root of the ray-sphere quadratic inside the ray's range.
    /// A sphere of zero radius is never hit.
    fn nearest_root(&self, ray: &Ray) -> Option<f32> {
        if self.radius <= 0.0 {
            return None;
        }

        let oc = self.center - ray.origin;
        let a = ray.direction.length_squared();
        let h = ray.direction.dot(oc);
        let c = oc.length_squared() - self.radius * self.radius;

        let discriminant = h * h - a * c;
        if discriminant < 0.0 || a == 0.0 {
            return None;
        }

        let sqrtd = discriminant.sqrt();
        let range = ray.range();

        [(h - sqrtd) / a, (h + sqrtd) / a]
            .into_iter()
            .find(|&t| range.contains(t))
    }
}

impl<M: Material + 'static> Hittable for Sphere<M> {
    fn hit<'a>(&'a self, ray: &Ray) -> Option<HitRecord<'a>> {
        let t = self.nearest_root(ray)?;
        let outward_normal = (ray.at(t) - self.center) / self.radius;
        Some(HitRecord::new(ray, t, outward_normal, &self.material))
    }

    fn hit_any(&self, ray: &Ray) -> bool {
        self.nearest_root(ray).is_some()
    }

    fn bounding_box(&self) -> Aabb {
        self.bbox
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material::Lambertian;

    fn unit_sphere_ahead() -> Sphere<Lambertian> {
        Sphere::new(
            Vec3::new(0.0, 0.0, -1.0),
            0.5,
            Lambertian::new(Vec3::new(0.5, 0.5, 0.5)),
        )
    }

    #[test]
    fn test_sphere_hit() {
        let sphere = unit_sphere_ahead();
        let ray = Ray::secondary(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0));

        let rec = sphere.hit(&ray).expect("should hit");
        assert!((rec.t - 0.5).abs() < 0.001);
        assert!(rec.front_face);
        assert!((rec.normal - Vec3::Z).length() < 1e-5);
    }

    #[test]
    fn test_sphere_miss() {
        let sphere = unit_sphere_ahead();
        let ray = Ray::secondary(Vec3::ZERO, Vec3::new(0.0, 1.0, 0.0));
        assert!(sphere.hit(&ray).is_none());
        assert!(!sphere.hit_any(&ray));
    }

    #[test]
    fn test_sphere_hit_from_inside_uses_far_root() {
        let sphere = unit_sphere_ahead();
        let ray = Ray::new(Vec3::new(0.0, 0.0, -1.0), Vec3::X);

        let rec = sphere.hit(&ray).expect("should hit the shell");
        assert!((rec.t - 0.5).abs() < 1e-5);
        assert!(!rec.front_face);
        assert!((rec.normal + Vec3::X).length() < 1e-5);
    }

    #[test]
    fn test_sphere_respects_max_t() {
        let sphere = unit_sphere_ahead();
        let short = Ray::with_range(Vec3::ZERO, -Vec3::Z, 0.0, 0.25);
        assert!(!sphere.hit_any(&short));
    }

    #[test]
    fn test_zero_radius_sphere_is_never_hit() {
        let dot = Sphere::new(Vec3::new(0.0, 0.0, -1.0), 0.0, Lambertian::new(Vec3::ONE));
        let through_center = Ray::new(Vec3::ZERO, -Vec3::Z);

        assert!(dot.hit(&through_center).is_none());
        assert!(!dot.hit_any(&through_center));

        let negative = Sphere::new(Vec3::ZERO, -2.0, Lambertian::new(Vec3::ONE));
        assert!(negative.hit(&Ray::new(Vec3::new(0.0, 0.0, 5.0), -Vec3::Z)).is_none());
    }
}
