//! Image buffer and the parallel pixel loop shared by the integrators.
//!
//! Rows are rendered in parallel with rayon. Each row draws from its own
//! seeded generator, so an image depends only on the seed, never on the
//! thread schedule.

use crate::config::SamplingConfig;
use crate::integrator::RadianceEstimator;
use crate::sampling::{for_each_subsample, stream_rng};
use crate::{Camera, Color, Scene};
use rayon::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

/// Linear RGB image, row-major from the upper-left corner.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageBuffer {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<Color>,
}

impl ImageBuffer {
    /// Create a new image buffer filled with black.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![Color::ZERO; width as usize * height as usize],
        }
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    /// Get the pixel at (x, y).
    pub fn get_pixel(&self, x: u32, y: u32) -> Color {
        self.pixels[self.index(x, y)]
    }

    /// Set the pixel at (x, y).
    pub fn set_pixel(&mut self, x: u32, y: u32, color: Color) {
        let i = self.index(x, y);
        self.pixels[i] = color;
    }

    /// Add to the pixel at (x, y).
    pub fn add_pixel(&mut self, x: u32, y: u32, color: Color) {
        let i = self.index(x, y);
        self.pixels[i] += color;
    }

    /// Convert to RGBA bytes (for display or saving).
    pub fn to_rgba(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.pixels.len() * 4);
        for color in &self.pixels {
            bytes.extend_from_slice(&color_to_rgba(*color));
        }
        bytes
    }

    /// Mean of all pixels.
    pub fn average(&self) -> Color {
        if self.pixels.is_empty() {
            return Color::ZERO;
        }
        self.pixels.iter().copied().sum::<Color>() / self.pixels.len() as f32
    }
}

/// Apply gamma correction (gamma = 2.0).
#[inline]
pub fn linear_to_gamma(linear: f32) -> f32 {
    if linear > 0.0 {
        linear.sqrt()
    } else {
        0.0
    }
}

/// Convert a color to 8-bit RGBA.
pub fn color_to_rgba(color: Color) -> [u8; 4] {
    let to_byte = |c: f32| (255.0 * linear_to_gamma(c).clamp(0.0, 1.0)) as u8;
    [to_byte(color.x), to_byte(color.y), to_byte(color.z), 255]
}

/// Counts finished work items and logs every 5%.
pub(crate) struct Progress {
    label: &'static str,
    total: usize,
    step: usize,
    done: AtomicUsize,
}

impl Progress {
    pub(crate) fn new(label: &'static str, total: usize) -> Self {
        Self {
            label,
            total,
            step: (total / 20).max(1),
            done: AtomicUsize::new(0),
        }
    }

    pub(crate) fn tick(&self) {
        let done = self.done.fetch_add(1, Ordering::Relaxed) + 1;
        if done % self.step == 0 || done == self.total {
            log::info!("{}: {}% done", self.label, 100 * done / self.total.max(1));
        }
    }
}

/// Render every pixel by averaging `estimator` over an `n x n` stratified
/// grid of camera rays.
pub fn render_image<E: RadianceEstimator + ?Sized>(
    estimator: &E,
    scene: &Scene,
    camera: &Camera,
    sampling: &SamplingConfig,
) -> ImageBuffer {
    let width = camera.image_width;
    let height = camera.image_height;
    let mut image = ImageBuffer::new(width, height);

    let n = sampling.samples_per_axis.max(1);
    let sample_weight = 1.0 / (n * n) as f32;
    let progress = Progress::new(estimator.name(), height as usize);
    let start = Instant::now();

    image
        .pixels
        .par_chunks_mut(width as usize)
        .enumerate()
        .for_each(|(y, row)| {
            let mut rng = stream_rng(sampling.seed, y as u64);

            for (x, pixel) in row.iter_mut().enumerate() {
                let mut sum = Color::ZERO;
                for_each_subsample(x as u32, y as u32, n, &mut rng, |fx, fy, rng| {
                    let ray = camera.ray_through(fx, fy, rng);
                    sum += estimator.radiance(scene, &ray, rng);
                });
                *pixel = sum * sample_weight;
            }

            progress.tick();
        });

    log::info!(
        "{} finished {}x{} ({} samples/pixel) in {:.2?}",
        estimator.name(),
        width,
        height,
        n * n,
        start.elapsed()
    );

    image
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumen_math::{Ray, Vec3};
    use rand::RngCore;

    /// Returns the ray direction as a color.
    struct DirectionColor;

    impl RadianceEstimator for DirectionColor {
        fn name(&self) -> &'static str {
            "direction color"
        }

        fn radiance(&self, _scene: &Scene, ray: &Ray, _rng: &mut dyn RngCore) -> Color {
            ray.direction.abs()
        }
    }

    fn empty_scene() -> Scene {
        Scene::new(crate::HittableList::new(), Vec::new())
    }

    fn test_camera() -> Camera {
        let mut camera = Camera::new()
            .with_resolution(8, 6)
            .with_position(Vec3::ZERO, -Vec3::Z, Vec3::Y)
            .with_lens(60.0, 0.0, 1.0);
        camera.initialize();
        camera
    }

    #[test]
    fn test_linear_to_gamma() {
        assert_eq!(linear_to_gamma(0.0), 0.0);
        assert!((linear_to_gamma(1.0) - 1.0).abs() < 0.0001);
        assert!((linear_to_gamma(0.25) - 0.5).abs() < 0.0001);
    }

    #[test]
    fn test_color_to_rgba_clamps() {
        assert_eq!(color_to_rgba(Color::new(4.0, -1.0, 0.25)), [255, 0, 127, 255]);
    }

    #[test]
    fn test_pixel_accessors() {
        let mut image = ImageBuffer::new(4, 3);
        image.set_pixel(3, 2, Color::ONE);
        image.add_pixel(3, 2, Color::ONE);
        assert_eq!(image.get_pixel(3, 2), Color::splat(2.0));
        assert_eq!(image.pixels[11], Color::splat(2.0));
        assert_eq!(image.to_rgba().len(), 4 * 3 * 4);
    }

    #[test]
    fn test_render_is_deterministic_per_seed() {
        let scene = empty_scene();
        let camera = test_camera();
        let sampling = SamplingConfig {
            samples_per_axis: 2,
            seed: 3,
        };

        let a = render_image(&DirectionColor, &scene, &camera, &sampling);
        let b = render_image(&DirectionColor, &scene, &camera, &sampling);
        assert_eq!(a, b);
        assert_eq!(a.pixels.len(), 48);
        // Every camera ray points into the image plane.
        assert!(a.pixels.iter().all(|c| c.z > 0.5));
    }
}
