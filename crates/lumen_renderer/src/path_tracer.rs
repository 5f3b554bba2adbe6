//! Unidirectional path tracer with next-event estimation at diffuse hits.
//!
//! With `russian_roulette: None` paths stop hard at `max_depth`; with
//! `Some(p)` they continue past it with survival probability `1 - p`.

use crate::config::{PathTracerConfig, SamplingConfig};
use crate::integrator::{choose_lobe, continuation, Integrator, Lobe, RadianceEstimator};
use crate::renderer::render_image;
use crate::sampling::sample_hemisphere;
use crate::{Camera, Color, ImageBuffer, Scene};
use lumen_math::Ray;
use rand::RngCore;

pub struct PathTracer {
    config: PathTracerConfig,
    sampling: SamplingConfig,
}

impl PathTracer {
    pub fn new(config: PathTracerConfig, sampling: SamplingConfig) -> Self {
        Self { config, sampling }
    }

    fn trace(&self, scene: &Scene, ray: &Ray, depth: u32, rng: &mut dyn RngCore) -> Color {
        let Some(rec) = scene.intersect(ray) else {
            return Color::ZERO;
        };

        let material = rec.material;
        if material.is_emissive() {
            return material.emitted(&rec);
        }

        match choose_lobe(&rec, rng) {
            Lobe::Reflect => self.follow(scene, &rec.reflected_ray(), depth, rng),
            Lobe::Refract => self.follow(scene, &rec.refracted_ray(), depth, rng),
            Lobe::Diffuse => {
                let mut color = scene.direct_illumination(&rec);

                if let Some(scale) = self.continues(depth, rng) {
                    let bounce = sample_hemisphere(rec.normal, self.config.hemisphere, rng);
                    let next = Ray::secondary(rec.p, bounce.direction);
                    let indirect = self.trace(scene, &next, depth + 1, rng);
                    let brdf = material.eval_brdf(&rec, bounce.direction);
                    color += brdf * indirect * (bounce.weight * scale);
                }

                color
            }
        }
    }

    /// Continue along a specular bounce, returning its radiance unchanged.
    fn follow(&self, scene: &Scene, ray: &Ray, depth: u32, rng: &mut dyn RngCore) -> Color {
        match self.continues(depth, rng) {
            Some(scale) => self.trace(scene, ray, depth + 1, rng) * scale,
            None => Color::ZERO,
        }
    }

    fn continues(&self, depth: u32, rng: &mut dyn RngCore) -> Option<f32> {
        continuation(depth, self.config.max_depth, self.config.russian_roulette, rng)
    }
}

impl RadianceEstimator for PathTracer {
    fn name(&self) -> &'static str {
        "path tracer"
    }

    fn radiance(&self, scene: &Scene, ray: &Ray, rng: &mut dyn RngCore) -> Color {
        self.trace(scene, ray, 0, rng)
    }
}

impl Integrator for PathTracer {
    fn name(&self) -> &'static str {
        RadianceEstimator::name(self)
    }

    fn render(&self, scene: &Scene, camera: &Camera) -> ImageBuffer {
        render_image(self, scene, camera, &self.sampling)
    }
}
