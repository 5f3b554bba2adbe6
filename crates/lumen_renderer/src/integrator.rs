//! Light transport estimators selectable at runtime.

use crate::sampling::gen_f32;
use crate::{Camera, Color, HitRecord, ImageBuffer, Scene};
use lumen_math::Ray;
use rand::RngCore;

/// Renders a full image of a scene.
pub trait Integrator: Send + Sync {
    fn name(&self) -> &'static str;

    fn render(&self, scene: &Scene, camera: &Camera) -> ImageBuffer;
}

/// Estimates the radiance carried back along a single camera ray.
///
/// Estimators plug into [`crate::render_image`], which handles pixel
/// sampling and parallelism.
pub trait RadianceEstimator: Send + Sync {
    fn name(&self) -> &'static str;

    fn radiance(&self, scene: &Scene, ray: &Ray, rng: &mut dyn RngCore) -> Color;
}

/// Which lobe a stochastic bounce follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Lobe {
    Reflect,
    Refract,
    Diffuse,
}

/// Pick a lobe with probabilities `reflectivity`, `transparency` and the
/// remainder.
pub(crate) fn choose_lobe(rec: &HitRecord, rng: &mut dyn RngCore) -> Lobe {
    let reflectivity = rec.material.reflectivity(rec);
    let transparency = rec.material.transparency(rec);
    let u = gen_f32(rng);

    if u < reflectivity {
        Lobe::Reflect
    } else if u < reflectivity + transparency {
        Lobe::Refract
    } else {
        Lobe::Diffuse
    }
}

/// Decide whether a path at `depth` continues and by how much the next
/// bounce must be scaled.
///
/// Below `max_depth` paths always continue unscaled. Beyond it, with
/// `roulette = Some(p)`, a path survives with probability `1 - p` and is
/// scaled by `1 / (1 - p)`; with `None` it stops.
pub(crate) fn continuation(
    depth: u32,
    max_depth: u32,
    roulette: Option<f32>,
    rng: &mut dyn RngCore,
) -> Option<f32> {
    if depth < max_depth {
        return Some(1.0);
    }

    let absorption = roulette?;
    (gen_f32(rng) >= absorption).then(|| 1.0 / (1.0 - absorption))
}
