//! Whitted-style ray tracer: direct light plus deterministic mirror and
//! refraction recursion.

use crate::config::{SamplingConfig, WhittedConfig};
use crate::integrator::{Integrator, RadianceEstimator};
use crate::renderer::render_image;
use crate::{Camera, Color, ImageBuffer, Scene};
use lumen_math::Ray;
use rand::RngCore;

pub struct WhittedTracer {
    config: WhittedConfig,
    sampling: SamplingConfig,
}

impl WhittedTracer {
    pub fn new(config: WhittedConfig, sampling: SamplingConfig) -> Self {
        Self { config, sampling }
    }

    fn trace(&self, scene: &Scene, ray: &Ray, depth: u32) -> Color {
        if depth >= self.config.max_depth {
            return Color::ZERO;
        }
        let Some(rec) = scene.intersect(ray) else {
            return Color::ZERO;
        };

        let material = rec.material;
        let mut color = material.emitted(&rec) + scene.direct_illumination(&rec);

        let reflectivity = material.reflectivity(&rec);
        if reflectivity > 0.0 {
            color += reflectivity * self.trace(scene, &rec.reflected_ray(), depth + 1);
        }

        let transparency = material.transparency(&rec);
        if transparency > 0.0 {
            color += transparency * self.trace(scene, &rec.refracted_ray(), depth + 1);
        }

        color
    }
}

impl RadianceEstimator for WhittedTracer {
    fn name(&self) -> &'static str {
        "whitted"
    }

    fn radiance(&self, scene: &Scene, ray: &Ray, _rng: &mut dyn RngCore) -> Color {
        self.trace(scene, ray, 0)
    }
}

impl Integrator for WhittedTracer {
    fn name(&self) -> &'static str {
        RadianceEstimator::name(self)
    }

    fn render(&self, scene: &Scene, camera: &Camera) -> ImageBuffer {
        render_image(self, scene, camera, &self.sampling)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{HittableList, Lambertian, PointLight, Sphere};
    use lumen_math::Vec3;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn lit_floor(reflectivity: f32) -> Scene {
        let mut objects = HittableList::new();
        objects.add(Box::new(Sphere::new(
            Vec3::new(0.0, -1000.0, 0.0),
            1000.0,
            Lambertian::new(Color::splat(0.5)).with_reflectivity(reflectivity),
        )));
        // Bright sphere overhead, visible only through the mirror.
        objects.add(Box::new(Sphere::new(
            Vec3::new(0.0, 10.0, 0.0),
            1.0,
            Lambertian::new(Color::ONE),
        )));
        Scene::new(
            objects,
            vec![PointLight::new(Vec3::new(3.0, 5.0, 0.0), Color::ONE, 50.0)],
        )
    }

    #[test]
    fn test_miss_is_black() {
        let scene = lit_floor(0.0);
        let tracer = WhittedTracer::new(WhittedConfig::default(), SamplingConfig::default());
        let mut rng = StdRng::seed_from_u64(0);
        let up = Ray::new(Vec3::new(5.0, 1.0, 0.0), Vec3::new(0.0, 1.0, 1.0).normalize());
        assert_eq!(tracer.radiance(&scene, &up, &mut rng), Color::ZERO);
    }

    #[test]
    fn test_result_is_deterministic() {
        let scene = lit_floor(0.5);
        let tracer = WhittedTracer::new(WhittedConfig::default(), SamplingConfig::default());
        let ray = Ray::new(Vec3::new(0.0, 1.0, 2.0), Vec3::new(0.0, -1.0, -2.0).normalize());

        let mut a = StdRng::seed_from_u64(1);
        let mut b = StdRng::seed_from_u64(2);
        assert_eq!(tracer.radiance(&scene, &ray, &mut a), tracer.radiance(&scene, &ray, &mut b));
    }

    #[test]
    fn test_mirror_adds_reflected_light() {
        let matte = lit_floor(0.0);
        let mirror = lit_floor(0.5);
        let tracer = WhittedTracer::new(WhittedConfig::default(), SamplingConfig::default());
        let mut rng = StdRng::seed_from_u64(0);

        // Steep ray whose reflection hits the sphere overhead.
        let ray = Ray::new(Vec3::new(0.0, 1.0, 0.01), Vec3::new(0.0, -1.0, -0.01).normalize());
        let plain = tracer.radiance(&matte, &ray, &mut rng);
        let shiny = tracer.radiance(&mirror, &ray, &mut rng);
        assert!(shiny.x > plain.x);
    }

    #[test]
    fn test_depth_limit_zero_renders_black() {
        let scene = lit_floor(0.0);
        let tracer = WhittedTracer::new(WhittedConfig { max_depth: 0 }, SamplingConfig::default());
        let mut rng = StdRng::seed_from_u64(0);
        let ray = Ray::new(Vec3::new(0.0, 1.0, 0.0), -Vec3::Y);
        assert_eq!(tracer.radiance(&scene, &ray, &mut rng), Color::ZERO);
    }
}
