//! Progressive photon mapping.
//!
//! A forward pass traces eye rays through specular chains and stores a
//! hitpoint wherever a path lands on a diffuse surface. Each iteration then
//! shoots photons from every light, deposits their flux into nearby
//! hitpoints and shrinks the search radii, so the estimate converges as
//! iterations accumulate.

use crate::config::{PhotonMapperConfig, SamplingConfig};
use crate::hitpoint_bvh::{FluxBuffer, Hitpoint, PointBvh};
use crate::integrator::{choose_lobe, continuation, Integrator, Lobe};
use crate::renderer::Progress;
use crate::sampling::{for_each_subsample, random_unit_vector, sample_hemisphere, stream_rng};
use crate::{Camera, Color, ImageBuffer, Scene};
use lumen_math::Ray;
use rand::RngCore;
use rayon::prelude::*;
use std::f32::consts::PI;
use std::time::Instant;

/// Photon batches draw from streams above the ones used for image rows.
const PHOTON_STREAM_BASE: u64 = 1 << 32;

pub struct PhotonMapper {
    config: PhotonMapperConfig,
    sampling: SamplingConfig,
}

impl PhotonMapper {
    pub fn new(config: PhotonMapperConfig, sampling: SamplingConfig) -> Self {
        Self { config, sampling }
    }

    /// Run every iteration, handing each intermediate image to `observer`.
    /// Returns the image of the last iteration.
    pub fn render_progressive(
        &self,
        scene: &Scene,
        camera: &Camera,
        observer: &mut dyn FnMut(usize, &ImageBuffer),
    ) -> ImageBuffer {
        let start = Instant::now();
        let mut hitpoints = self.forward_pass(scene, camera);
        let mut image = ImageBuffer::new(camera.image_width, camera.image_height);

        for iteration in 0..self.config.iterations as usize {
            let pass_start = Instant::now();
            self.photon_pass(scene, &mut hitpoints, iteration);
            image = self.progressive_update(&mut hitpoints, camera, iteration);
            log::info!(
                "Photon iteration {}/{} done in {:.2?}",
                iteration + 1,
                self.config.iterations,
                pass_start.elapsed()
            );
            observer(iteration, &image);
        }

        log::info!("Photon mapping finished in {:.2?}", start.elapsed());
        image
    }

    /// Trace eye rays and collect hitpoints on diffuse surfaces.
    pub fn forward_pass<'s>(&self, scene: &'s Scene, camera: &Camera) -> PointBvh<'s> {
        let start = Instant::now();
        let width = camera.image_width;
        let height = camera.image_height;
        let n = self.sampling.samples_per_axis.max(1);
        let sample_weight = 1.0 / (n * n) as f32;
        let progress = Progress::new("forward pass", height as usize);

        let hitpoints: Vec<Hitpoint<'s>> = (0..height)
            .into_par_iter()
            .flat_map_iter(|y| {
                let mut rng = stream_rng(self.sampling.seed, y as u64);
                let mut row = Vec::new();

                for x in 0..width {
                    for_each_subsample(x, y, n, &mut rng, |fx, fy, rng| {
                        let ray = camera.ray_through(fx, fy, rng);
                        self.forward_ray(scene, &ray, (x, y), sample_weight, 0, &mut row);
                    });
                }

                progress.tick();
                row
            })
            .collect();

        log::info!(
            "Forward pass: {} hitpoints in {:.2?}",
            hitpoints.len(),
            start.elapsed()
        );

        PointBvh::build(hitpoints)
    }

    fn forward_ray<'s>(
        &self,
        scene: &'s Scene,
        ray: &Ray,
        pixel: (u32, u32),
        weight: f32,
        depth: u32,
        out: &mut Vec<Hitpoint<'s>>,
    ) {
        if weight <= 0.0 || depth >= self.config.max_forward_depth {
            return;
        }
        let Some(rec) = scene.intersect(ray) else {
            return;
        };

        let material = rec.material;
        let reflectivity = material.reflectivity(&rec);
        let transparency = material.transparency(&rec);

        if reflectivity > 0.0 {
            let reflected = rec.reflected_ray();
            self.forward_ray(scene, &reflected, pixel, weight * reflectivity, depth + 1, out);
        }
        if transparency > 0.0 {
            let refracted = rec.refracted_ray();
            self.forward_ray(scene, &refracted, pixel, weight * transparency, depth + 1, out);
        }

        let diffuse = (1.0 - reflectivity - transparency) * weight;
        if diffuse > 0.0 {
            let direct = if material.is_emissive() {
                material.emitted(&rec)
            } else {
                scene.direct_illumination(&rec)
            };
            out.push(Hitpoint::new(
                rec,
                pixel.0,
                pixel.1,
                diffuse,
                self.config.initial_radius,
                direct,
            ));
        }
    }

    /// Shoot `photons_per_light` photons from every light and fold their
    /// deposits into the hitpoints.
    pub fn photon_pass(&self, scene: &Scene, hitpoints: &mut PointBvh<'_>, iteration: usize) {
        if hitpoints.is_empty() {
            return;
        }

        let photons = self.config.photons_per_light as usize;
        let batch_size = self.config.batch_size.max(1) as usize;
        let batches = photons.div_ceil(batch_size);
        let light_count = scene.light_count();

        for (light_index, light) in scene.lights().iter().enumerate() {
            let shared: &PointBvh<'_> = hitpoints;
            let first_stream = ((iteration * light_count + light_index) * batches) as u64;

            let buffer = (0..batches)
                .into_par_iter()
                .map(|batch| {
                    let mut rng =
                        stream_rng(self.sampling.seed, PHOTON_STREAM_BASE + first_stream + batch as u64);
                    let count = batch_size.min(photons - batch * batch_size);
                    let mut buffer = FluxBuffer::new();

                    for _ in 0..count {
                        let direction = random_unit_vector(&mut rng);
                        let ray = Ray::new(light.position(), direction);
                        let flux = light.radiance() * (4.0 * PI);
                        self.trace_photon(scene, shared, &ray, flux, 0, &mut rng, &mut buffer);
                    }

                    buffer
                })
                .reduce(FluxBuffer::new, FluxBuffer::merge);

            log::debug!(
                "Light {}: {} deposits from {} photons",
                light_index,
                buffer.len(),
                photons
            );
            buffer.apply(hitpoints);
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn trace_photon<'s>(
        &self,
        scene: &Scene,
        hitpoints: &PointBvh<'s>,
        ray: &Ray,
        flux: Color,
        depth: u32,
        rng: &mut dyn RngCore,
        buffer: &mut FluxBuffer,
    ) {
        let Some(rec) = scene.intersect(ray) else {
            return;
        };

        let material = rec.material;
        if material.is_emissive() {
            return;
        }

        let reflectivity = material.reflectivity(&rec);
        let transparency = material.transparency(&rec);

        // Direct light is already in the hitpoints' direct term.
        if depth > 0 && reflectivity + transparency < 1.0 {
            let incoming = rec.view;
            buffer.deposit(hitpoints, rec.p, |hp| {
                (hp.hit.normal.dot(incoming) > 0.0)
                    .then(|| hp.hit.material.eval_brdf(&hp.hit, incoming) * flux)
            });
        }

        let Some(scale) =
            continuation(depth, self.config.max_depth, self.config.russian_roulette, rng)
        else {
            return;
        };

        match choose_lobe(&rec, rng) {
            Lobe::Reflect => {
                let next = rec.reflected_ray();
                self.trace_photon(scene, hitpoints, &next, flux * scale, depth + 1, rng, buffer);
            }
            Lobe::Refract => {
                let next = rec.refracted_ray();
                self.trace_photon(scene, hitpoints, &next, flux * scale, depth + 1, rng, buffer);
            }
            Lobe::Diffuse => {
                let bounce = sample_hemisphere(rec.normal, self.config.hemisphere, rng);
                let brdf = material.eval_brdf(&rec, bounce.direction);
                let next = Ray::secondary(rec.p, bounce.direction);
                let carried = flux * brdf * (bounce.weight * scale);
                self.trace_photon(scene, hitpoints, &next, carried, depth + 1, rng, buffer);
            }
        }
    }

    /// Apply the radius update and produce the image for `iteration`
    /// (zero-based).
    pub fn progressive_update(
        &self,
        hitpoints: &mut PointBvh<'_>,
        camera: &Camera,
        iteration: usize,
    ) -> ImageBuffer {
        let (min_radius, max_radius) = hitpoints.progressive_update(self.config.radius_reduction);
        log::debug!(
            "Iteration {}: radius range {:.4} .. {:.4}",
            iteration + 1,
            min_radius,
            max_radius
        );

        let emitted = self.config.photons_per_light as f32 * (iteration + 1) as f32;
        let mut image = ImageBuffer::new(camera.image_width, camera.image_height);
        for hp in hitpoints.hitpoints() {
            image.add_pixel(hp.pixel_x, hp.pixel_y, hp.radiance(emitted) * hp.weight);
        }
        image
    }
}

impl Integrator for PhotonMapper {
    fn name(&self) -> &'static str {
        "photon mapper"
    }

    fn render(&self, scene: &Scene, camera: &Camera) -> ImageBuffer {
        self.render_progressive(scene, camera, &mut |_, _| {})
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PathTracerConfig;
    use crate::sampling::HemisphereSampling;
    use crate::{HittableList, Lambertian, PathTracer, PointLight, Sphere, Triangle};
    use lumen_math::Vec3;

    fn small_config() -> PhotonMapperConfig {
        PhotonMapperConfig {
            max_forward_depth: 4,
            initial_radius: 0.5,
            photons_per_light: 2000,
            iterations: 3,
            radius_reduction: 0.7,
            max_depth: 3,
            russian_roulette: Some(0.1),
            hemisphere: HemisphereSampling::Cosine,
            batch_size: 256,
        }
    }

    fn camera(width: u32, height: u32) -> Camera {
        let mut camera = Camera::new()
            .with_resolution(width, height)
            .with_position(Vec3::new(0.0, 2.0, 6.0), Vec3::ZERO, Vec3::Y)
            .with_lens(40.0, 0.0, 1.0);
        camera.initialize();
        camera
    }

    /// Floor with a back wall, lit from above.
    fn corner_scene(floor_reflectivity: f32) -> Scene {
        let mut objects = HittableList::new();
        let floor = Lambertian::new(Color::splat(0.7)).with_reflectivity(floor_reflectivity);
        let wall = Lambertian::new(Color::splat(0.7));
        let (a, b, c, d) = (
            Vec3::new(-5.0, 0.0, 5.0),
            Vec3::new(5.0, 0.0, 5.0),
            Vec3::new(5.0, 0.0, -5.0),
            Vec3::new(-5.0, 0.0, -5.0),
        );
        objects.add(Box::new(Triangle::new(a, b, c, floor.clone())));
        objects.add(Box::new(Triangle::new(a, c, d, floor)));
        let (e, f) = (Vec3::new(5.0, 5.0, -5.0), Vec3::new(-5.0, 5.0, -5.0));
        objects.add(Box::new(Triangle::new(d, c, e, wall.clone())));
        objects.add(Box::new(Triangle::new(d, e, f, wall)));
        objects.add(Box::new(Sphere::new(
            Vec3::new(0.0, 1.0, 0.0),
            1.0,
            Lambertian::new(Color::new(0.8, 0.3, 0.3)),
        )));

        Scene::new(
            objects,
            vec![PointLight::new(Vec3::new(0.0, 4.0, 2.0), Color::ONE, 20.0)],
        )
    }

    /// Floor and ceiling 4 units apart with a light halfway between them.
    fn facing_planes() -> Scene {
        let mut objects = HittableList::new();
        let white = Lambertian::new(Color::splat(0.7));
        for y in [0.0, 4.0] {
            let (a, b, c, d) = (
                Vec3::new(-10.0, y, 10.0),
                Vec3::new(10.0, y, 10.0),
                Vec3::new(10.0, y, -10.0),
                Vec3::new(-10.0, y, -10.0),
            );
            objects.add(Box::new(Triangle::new(a, b, c, white.clone())));
            objects.add(Box::new(Triangle::new(a, c, d, white.clone())));
        }

        Scene::new(
            objects,
            vec![PointLight::new(Vec3::new(0.0, 2.0, 0.0), Color::ONE, 20.0)],
        )
    }

    fn floor_camera() -> Camera {
        let mut camera = Camera::new()
            .with_resolution(8, 8)
            .with_position(Vec3::new(0.0, 3.0, 2.0), Vec3::ZERO, Vec3::Y)
            .with_lens(40.0, 0.0, 1.0);
        camera.initialize();
        camera
    }

    #[test]
    fn test_interreflection_matches_path_tracer() {
        let scene = facing_planes();
        let camera = floor_camera();
        let tracer_config = |max_depth, russian_roulette| PathTracerConfig {
            max_depth,
            russian_roulette,
            hemisphere: HemisphereSampling::Cosine,
        };
        let fine = SamplingConfig {
            samples_per_axis: 8,
            seed: 3,
        };

        let direct = PathTracer::new(tracer_config(0, None), fine)
            .render(&scene, &camera)
            .average();
        let traced = PathTracer::new(tracer_config(3, Some(0.1)), fine)
            .render(&scene, &camera)
            .average();

        let mapper = PhotonMapper::new(
            PhotonMapperConfig {
                photons_per_light: 100_000,
                iterations: 8,
                max_depth: 3,
                ..PhotonMapperConfig::default()
            },
            SamplingConfig::default(),
        );
        let mapped = mapper.render(&scene, &camera).average();

        // Bounced light is a large share of the floor's brightness.
        assert!(traced.x > direct.x * 1.1, "{traced:?} vs direct {direct:?}");
        assert!(mapped.x > direct.x * 1.1, "{mapped:?} vs direct {direct:?}");

        let relative = (mapped - traced).length() / traced.length();
        assert!(relative < 0.05, "photon {mapped:?} vs path {traced:?}");
    }

    #[test]
    fn test_forward_pass_weights_sum_to_covered_pixels() {
        let scene = corner_scene(0.0);
        let mapper = PhotonMapper::new(small_config(), SamplingConfig::default());
        let camera = camera(16, 12);

        let hitpoints = mapper.forward_pass(&scene, &camera);
        assert!(!hitpoints.is_empty());

        // Each pixel's hitpoints carry at most the full pixel weight.
        let mut per_pixel = ImageBuffer::new(16, 12);
        for hp in hitpoints.hitpoints() {
            assert_eq!(hp.radius, 0.5);
            assert!(hp.weight > 0.0);
            per_pixel.add_pixel(hp.pixel_x, hp.pixel_y, Color::splat(hp.weight));
        }
        assert!(per_pixel.pixels.iter().all(|w| w.x <= 1.0 + 1e-5));
    }

    #[test]
    fn test_mirror_splits_forward_weight() {
        let scene = corner_scene(0.4);
        let mapper = PhotonMapper::new(small_config(), SamplingConfig::default());
        let camera = camera(8, 6);

        let hitpoints = mapper.forward_pass(&scene, &camera);
        let on_floor: Vec<&Hitpoint> = hitpoints
            .hitpoints()
            .iter()
            .filter(|hp| hp.position().y.abs() < 1e-3 && hp.position().z > -4.9)
            .collect();
        assert!(!on_floor.is_empty());
        for hp in on_floor {
            // Primary floor hits keep 60% of the 1/4 sub-sample weight.
            assert!(hp.weight <= 0.25 * 0.6 + 1e-5);
        }
    }

    #[test]
    fn test_photon_pass_deposits_flux() {
        let scene = corner_scene(0.0);
        let mapper = PhotonMapper::new(small_config(), SamplingConfig::default());
        let camera = camera(16, 12);
        let mut hitpoints = mapper.forward_pass(&scene, &camera);

        mapper.photon_pass(&scene, &mut hitpoints, 0);

        let received: u32 = hitpoints.hitpoints().iter().map(|hp| hp.new_photon_count).sum();
        assert!(received > 0);
        assert!(hitpoints
            .hitpoints()
            .iter()
            .all(|hp| hp.flux.min_element() >= 0.0));
    }

    #[test]
    fn test_radii_shrink_across_iterations() {
        let scene = corner_scene(0.0);
        let mapper = PhotonMapper::new(small_config(), SamplingConfig::default());
        let camera = camera(12, 9);
        let mut hitpoints = mapper.forward_pass(&scene, &camera);

        let mut previous: Vec<f32> = hitpoints.hitpoints().iter().map(|hp| hp.radius).collect();
        for iteration in 0..3 {
            mapper.photon_pass(&scene, &mut hitpoints, iteration);
            let image = mapper.progressive_update(&mut hitpoints, &camera, iteration);
            assert!(image.pixels.iter().all(|c| c.is_finite()));

            for (hp, before) in hitpoints.hitpoints().iter().zip(&previous) {
                assert!(hp.radius <= *before);
                assert_eq!(hp.new_photon_count, 0);
            }
            previous = hitpoints.hitpoints().iter().map(|hp| hp.radius).collect();
        }
    }

    #[test]
    fn test_observer_sees_every_iteration() {
        let scene = corner_scene(0.0);
        let mapper = PhotonMapper::new(small_config(), SamplingConfig::default());
        let camera = camera(8, 6);

        let mut seen = Vec::new();
        let image = mapper.render_progressive(&scene, &camera, &mut |i, img| {
            seen.push((i, img.average()));
        });

        assert_eq!(seen.iter().map(|(i, _)| *i).collect::<Vec<_>>(), vec![0, 1, 2]);
        assert_eq!(seen.last().map(|(_, avg)| *avg), Some(image.average()));
        assert!(image.average().x > 0.0);
    }

    #[test]
    fn test_render_is_reproducible() {
        let scene = corner_scene(0.2);
        let mapper = PhotonMapper::new(small_config(), SamplingConfig::default());
        let camera = camera(8, 6);

        let a = mapper.render(&scene, &camera);
        let b = mapper.render(&scene, &camera);
        assert_eq!(a.pixels, b.pixels);
    }
}
