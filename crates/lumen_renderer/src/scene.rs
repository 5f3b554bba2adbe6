//! Scene: accelerated geometry plus point lights.

use crate::accelerator::RayBvh;
use crate::{Color, HitRecord, HittableList, PointLight};
use lumen_math::Ray;
use std::time::Instant;

/// Everything the integrators need to trace rays.
pub struct Scene {
    accel: RayBvh,
    lights: Vec<PointLight>,
}

impl Scene {
    /// Build the ray accelerator over `objects`.
    pub fn new(objects: HittableList, lights: Vec<PointLight>) -> Self {
        let start = Instant::now();
        let accel = RayBvh::build(objects.into_objects());
        log::info!(
            "Scene ready: {} primitives, {} lights, BVH built in {:.2?}",
            accel.len(),
            lights.len(),
            start.elapsed()
        );

        Self { accel, lights }
    }

    /// Nearest hit along the ray.
    #[inline]
    pub fn intersect(&self, ray: &Ray) -> Option<HitRecord<'_>> {
        self.accel.intersect(ray)
    }

    /// Whether anything blocks the ray.
    #[inline]
    pub fn intersect_any(&self, ray: &Ray) -> bool {
        self.accel.intersect_any(ray)
    }

    pub fn light_count(&self) -> usize {
        self.lights.len()
    }

    pub fn light(&self, index: usize) -> Option<&PointLight> {
        self.lights.get(index)
    }

    pub fn lights(&self) -> &[PointLight] {
        &self.lights
    }

    pub fn primitive_count(&self) -> usize {
        self.accel.len()
    }

    /// Sum of `radiance * BRDF * cos / d²` over every light visible from
    /// the hit.
    pub fn direct_illumination(&self, rec: &HitRecord) -> Color {
        let mut total = Color::ZERO;

        for light in &self.lights {
            let (shadow, distance) = rec.shadow_ray(light.position());
            let cos = shadow.direction.dot(rec.normal);
            if cos <= 0.0 || distance <= 0.0 || self.intersect_any(&shadow) {
                continue;
            }

            let brdf = rec.material.eval_brdf(rec, shadow.direction);
            total += light.radiance() * brdf * cos / (distance * distance);
        }

        total
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Lambertian, Sphere};
    use lumen_math::Vec3;
    use std::f32::consts::PI;

    fn floor_sphere_scene(blocker: bool) -> Scene {
        let mut objects = HittableList::new();
        objects.add(Box::new(Sphere::new(
            Vec3::new(0.0, -100.0, 0.0),
            100.0,
            Lambertian::new(Color::splat(0.8)),
        )));
        if blocker {
            objects.add(Box::new(Sphere::new(
                Vec3::new(0.0, 2.0, 0.0),
                0.5,
                Lambertian::new(Color::ONE),
            )));
        }
        Scene::new(
            objects,
            vec![PointLight::new(Vec3::new(0.0, 4.0, 0.0), Color::ONE, 16.0)],
        )
    }

    fn floor_hit(scene: &Scene) -> HitRecord<'_> {
        let ray = Ray::new(Vec3::new(0.0, 1.0, 1.0), Vec3::new(0.0, -1.0, -1.0).normalize());
        scene.intersect(&ray).expect("floor hit")
    }

    #[test]
    fn test_direct_illumination_closed_form() {
        let scene = floor_sphere_scene(false);
        let rec = floor_hit(&scene);

        // Light straight above at distance 4: 16 * (0.8 / pi) * 1 / 16.
        let expected = 0.8 / PI;
        let direct = scene.direct_illumination(&rec);
        assert!((direct.x - expected).abs() < 1e-3, "{direct:?}");
    }

    #[test]
    fn test_occluded_light_contributes_nothing() {
        let scene = floor_sphere_scene(true);
        let rec = floor_hit(&scene);
        assert_eq!(scene.direct_illumination(&rec), Color::ZERO);
    }

    #[test]
    fn test_light_lookup() {
        let scene = floor_sphere_scene(false);
        assert_eq!(scene.light_count(), 1);
        assert!(scene.light(0).is_some());
        assert!(scene.light(1).is_none());
        assert_eq!(scene.primitive_count(), 1);
    }
}
