//! Simple path tracer example.
//!
//! Renders spheres on a ground plane and saves to PPM format.

use lumen_renderer::{
    color_to_rgba, Camera, Color, HittableList, ImageBuffer, Integrator, Lambertian,
    PathTracer, PathTracerConfig, Phong, PointLight, SamplingConfig, Scene, Sphere, Vec3,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fs::File;
use std::io::{BufWriter, Write};

fn main() -> std::io::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let scene = build_scene();

    let mut camera = Camera::new()
        .with_resolution(400, 225)
        .with_position(Vec3::new(13.0, 2.0, 3.0), Vec3::ZERO, Vec3::Y)
        .with_lens(20.0, 0.6, 10.0);
    camera.initialize();

    let tracer = PathTracer::new(
        PathTracerConfig::default(),
        SamplingConfig {
            samples_per_axis: 3,
            seed: 7,
        },
    );
    let image = tracer.render(&scene, &camera);

    let filename = "output.ppm";
    save_ppm(&image, filename)?;
    log::info!("Saved to {}", filename);
    Ok(())
}

fn build_scene() -> Scene {
    let mut objects = HittableList::new();

    objects.add(Box::new(Sphere::new(
        Vec3::new(0.0, -1000.0, 0.0),
        1000.0,
        Lambertian::new(Color::new(0.5, 0.5, 0.5)),
    )));

    objects.add(Box::new(Sphere::new(
        Vec3::new(0.0, 1.0, 0.0),
        1.0,
        Phong::new(Color::splat(0.1), 200.0)
            .with_transparency(0.9)
            .with_ior(1.5),
    )));
    objects.add(Box::new(Sphere::new(
        Vec3::new(-4.0, 1.0, 0.0),
        1.0,
        Lambertian::new(Color::new(0.4, 0.2, 0.1)),
    )));
    objects.add(Box::new(Sphere::new(
        Vec3::new(4.0, 1.0, 0.0),
        1.0,
        Phong::new(Color::new(0.7, 0.6, 0.5), 100.0).with_reflectivity(0.8),
    )));

    let mut rng = StdRng::seed_from_u64(42);
    for a in -5..5 {
        for b in -5..5 {
            let center = Vec3::new(
                a as f32 + 0.9 * rng.gen::<f32>(),
                0.2,
                b as f32 + 0.9 * rng.gen::<f32>(),
            );
            if (center - Vec3::new(4.0, 0.2, 0.0)).length() <= 0.9 {
                continue;
            }

            let albedo = Color::new(rng.gen(), rng.gen(), rng.gen());
            if rng.gen::<f32>() < 0.8 {
                objects.add(Box::new(Sphere::new(center, 0.2, Lambertian::new(albedo))));
            } else {
                let shiny = Phong::new(albedo, 50.0).with_reflectivity(rng.gen_range(0.3..0.9));
                objects.add(Box::new(Sphere::new(center, 0.2, shiny)));
            }
        }
    }

    Scene::new(
        objects,
        vec![
            PointLight::new(Vec3::new(10.0, 20.0, 10.0), Color::ONE, 800.0),
            PointLight::new(Vec3::new(-8.0, 12.0, 4.0), Color::new(0.6, 0.7, 1.0), 200.0),
        ],
    )
}

fn save_ppm(image: &ImageBuffer, filename: &str) -> std::io::Result<()> {
    let mut writer = BufWriter::new(File::create(filename)?);

    writeln!(writer, "P3")?;
    writeln!(writer, "{} {}", image.width, image.height)?;
    writeln!(writer, "255")?;

    for y in 0..image.height {
        for x in 0..image.width {
            let rgba = color_to_rgba(image.get_pixel(x, y));
            writeln!(writer, "{} {} {}", rgba[0], rgba[1], rgba[2])?;
        }
    }

    Ok(())
}
