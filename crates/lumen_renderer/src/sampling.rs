//! Random sampling helpers shared by the integrators.

use lumen_math::Vec3;
use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};
use serde::{Deserialize, Serialize};
use std::f32::consts::PI;

/// Uniform float in [0, 1).
#[inline]
pub fn gen_f32(rng: &mut dyn RngCore) -> f32 {
    rng.gen::<f32>()
}

/// Deterministic generator for one independent work item (a scanline, a
/// photon batch). Streams from the same seed do not overlap in practice.
pub fn stream_rng(seed: u64, stream: u64) -> StdRng {
    StdRng::seed_from_u64(seed ^ stream.wrapping_add(1).wrapping_mul(0x9E37_79B9_7F4A_7C15))
}

/// Uniform direction on the unit sphere by rejection sampling the unit cube.
pub fn random_unit_vector(rng: &mut dyn RngCore) -> Vec3 {
    loop {
        let v = Vec3::new(
            gen_f32(rng) * 2.0 - 1.0,
            gen_f32(rng) * 2.0 - 1.0,
            gen_f32(rng) * 2.0 - 1.0,
        );
        let len_sq = v.length_squared();
        if len_sq > 1e-6 && len_sq <= 1.0 {
            return v / len_sq.sqrt();
        }
    }
}

/// How indirect bounces pick a direction over the hemisphere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HemisphereSampling {
    /// pdf = cos / pi
    #[default]
    Cosine,
    /// pdf = 1 / (2 pi)
    Uniform,
}

/// A sampled bounce direction and the factor that turns `brdf * L` into an
/// unbiased estimate of the reflected integral.
#[derive(Debug, Clone, Copy)]
pub struct HemisphereSample {
    pub direction: Vec3,
    /// `cos / pdf`: `pi` for cosine sampling, `2 pi cos` for uniform.
    pub weight: f32,
}

/// Sample a direction in the hemisphere around `normal` (unit length).
pub fn sample_hemisphere(
    normal: Vec3,
    mode: HemisphereSampling,
    rng: &mut dyn RngCore,
) -> HemisphereSample {
    let u1 = gen_f32(rng);
    let u2 = gen_f32(rng);
    let phi = 2.0 * PI * u2;

    let cos_theta = match mode {
        HemisphereSampling::Cosine => (1.0 - u1).sqrt(),
        HemisphereSampling::Uniform => 1.0 - u1,
    };
    let sin_theta = (1.0 - cos_theta * cos_theta).max(0.0).sqrt();

    let (u, v) = normal.any_orthonormal_pair();
    let direction =
        (u * (sin_theta * phi.cos()) + v * (sin_theta * phi.sin()) + normal * cos_theta)
            .normalize_or_zero();

    let weight = match mode {
        HemisphereSampling::Cosine => PI,
        HemisphereSampling::Uniform => 2.0 * PI * cos_theta,
    };

    HemisphereSample { direction, weight }
}

/// Visit the jittered sub-sample positions of pixel (x, y) on an
/// `n x n` stratified grid. Positions are continuous pixel coordinates.
pub fn for_each_subsample(
    x: u32,
    y: u32,
    samples_per_axis: u32,
    rng: &mut dyn RngCore,
    mut f: impl FnMut(f32, f32, &mut dyn RngCore),
) {
    let n = samples_per_axis.max(1);
    let inv = 1.0 / n as f32;

    for i in 0..n {
        for j in 0..n {
            let fx = x as f32 + (j as f32 + gen_f32(rng)) * inv;
            let fy = y as f32 + (i as f32 + gen_f32(rng)) * inv;
            f(fx, fy, rng);
        }
    }
}
