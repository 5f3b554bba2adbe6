//! lumen: render built-in scenes with the CPU integrators.

mod obj;
mod output;
mod scenes;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use lumen_renderer::{
    Camera, Color, ImageBuffer, Integrator, IntegratorKind, Lambertian, Material, PhotonMapper,
    RenderSettings, Scene, Vec3,
};

use crate::obj::Placement;
use crate::scenes::SceneKind;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => log::LevelFilter::Trace,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Error => log::LevelFilter::Error,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum IntegratorArg {
    Whitted,
    Path,
    Photon,
}

impl From<IntegratorArg> for IntegratorKind {
    fn from(arg: IntegratorArg) -> Self {
        match arg {
            IntegratorArg::Whitted => IntegratorKind::Whitted,
            IntegratorArg::Path => IntegratorKind::Path,
            IntegratorArg::Photon => IntegratorKind::Photon,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "lumen")]
#[command(version)]
#[command(about = "CPU light transport renderer")]
#[command(long_about = "
Renders one of the built-in scenes with a Whitted tracer, a path tracer
or a progressive photon mapper and writes the result as an image.

Example usage:
  lumen cornell --integrator path --samples 4 -o cornell.png
  lumen cornell --integrator photon --iterations 8 --save-iterations
  lumen spheres --config settings.json
")]
struct Cli {
    /// Scene to render
    #[arg(value_enum, default_value_t = SceneKind::Cornell)]
    scene: SceneKind,

    /// JSON render settings; flags below override its values
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Integrator to render with
    #[arg(short, long, value_enum)]
    integrator: Option<IntegratorArg>,

    #[arg(long)]
    width: Option<u32>,

    #[arg(long)]
    height: Option<u32>,

    /// Camera samples per pixel along each axis
    #[arg(short, long)]
    samples: Option<u32>,

    /// Photon mapper iterations
    #[arg(long)]
    iterations: Option<u32>,

    /// Photons emitted per light in each iteration
    #[arg(long)]
    photons: Option<u32>,

    /// Photon gather radius before the first iteration
    #[arg(long)]
    radius: Option<f32>,

    #[arg(long)]
    seed: Option<u64>,

    /// Output image; the format follows the extension
    #[arg(short, long, default_value = "output.png")]
    output: PathBuf,

    /// Write the photon mapper image after every iteration
    #[arg(long)]
    save_iterations: bool,

    /// Add an OBJ mesh to the scene
    #[arg(long, value_name = "FILE")]
    obj: Vec<PathBuf>,

    /// Uniform scale applied to OBJ meshes
    #[arg(long, default_value_t = 1.0)]
    obj_scale: f32,

    /// Translation applied to OBJ meshes after scaling
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true, value_name = "X,Y,Z")]
    obj_offset: Option<Vec<f32>>,

    /// Set logging level (trace, debug, info, warn, error)
    #[arg(long, value_name = "LEVEL")]
    log_level: Option<LogLevel>,
}

impl Cli {
    /// Settings from `--config` (or defaults) with command line overrides applied.
    fn settings(&self) -> Result<RenderSettings> {
        let mut settings = match &self.config {
            Some(path) => {
                let json = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read config {}", path.display()))?;
                RenderSettings::from_json_str(&json)
                    .with_context(|| format!("Invalid config {}", path.display()))?
            }
            None => RenderSettings::default(),
        };

        if let Some(integrator) = self.integrator {
            settings.integrator = integrator.into();
        }
        if let Some(width) = self.width {
            settings.width = width;
        }
        if let Some(height) = self.height {
            settings.height = height;
        }
        if let Some(samples) = self.samples {
            settings.sampling.samples_per_axis = samples;
        }
        if let Some(seed) = self.seed {
            settings.sampling.seed = seed;
        }
        if let Some(iterations) = self.iterations {
            settings.photon.iterations = iterations;
        }
        if let Some(photons) = self.photons {
            settings.photon.photons_per_light = photons;
        }
        if let Some(radius) = self.radius {
            settings.photon.initial_radius = radius;
        }

        settings.validate()?;
        Ok(settings)
    }

    fn placement(&self) -> Result<Placement> {
        let offset = match self.obj_offset.as_deref() {
            None => Vec3::ZERO,
            Some(&[x, y, z]) => Vec3::new(x, y, z),
            Some(other) => bail!("--obj-offset needs three values, got {}", other.len()),
        };
        Ok(Placement {
            scale: self.obj_scale,
            offset,
        })
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut logger =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if let Some(level) = cli.log_level {
        logger.filter_level(level.into());
    }
    logger.init();

    let settings = cli.settings()?;
    log::info!(
        "Rendering {:?} at {}x{} with {:?}",
        cli.scene,
        settings.width,
        settings.height,
        settings.integrator
    );

    let mut description = scenes::build(cli.scene, settings.width, settings.height);
    if !cli.obj.is_empty() {
        let placement = cli.placement()?;
        let material: Arc<dyn Material> = Arc::new(Lambertian::new(Color::splat(0.7)));
        for path in &cli.obj {
            let triangles = obj::load_obj(path, placement, material.clone())?;
            description.objects.extend(triangles);
        }
    }
    let (scene, camera) = description.finish();

    let start = Instant::now();
    let image = if settings.integrator == IntegratorKind::Photon && cli.save_iterations {
        render_photon_iterations(&settings, &scene, &camera, &cli.output)?
    } else {
        let integrator = settings.build_integrator();
        log::info!("Integrator: {}", integrator.name());
        integrator.render(&scene, &camera)
    };
    log::info!("Render finished in {:.2?}", start.elapsed());

    output::save_image(&image, &cli.output)
}

fn render_photon_iterations(
    settings: &RenderSettings,
    scene: &Scene,
    camera: &Camera,
    base: &Path,
) -> Result<ImageBuffer> {
    let mapper = PhotonMapper::new(settings.photon, settings.sampling);
    let mut failure = None;

    let image = mapper.render_progressive(scene, camera, &mut |iteration, image| {
        if failure.is_some() {
            return;
        }
        if let Err(err) = output::save_image(image, &output::iteration_path(base, iteration)) {
            failure = Some(err);
        }
    });

    match failure {
        Some(err) => Err(err),
        None => Ok(image),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_render_cornell_with_path_tracer() {
        let cli = Cli::parse_from(["lumen"]);
        assert_eq!(cli.scene, SceneKind::Cornell);

        let settings = cli.settings().unwrap();
        assert_eq!(settings, RenderSettings::default());
        assert_eq!(settings.integrator, IntegratorKind::Path);
    }

    #[test]
    fn test_flags_override_settings() {
        let cli = Cli::parse_from([
            "lumen",
            "spheres",
            "--integrator",
            "photon",
            "--width",
            "64",
            "--height",
            "48",
            "--samples",
            "3",
            "--iterations",
            "5",
            "--photons",
            "2000",
            "--radius",
            "2.5",
            "--seed",
            "9",
        ]);
        assert_eq!(cli.scene, SceneKind::Spheres);

        let settings = cli.settings().unwrap();
        assert_eq!(settings.integrator, IntegratorKind::Photon);
        assert_eq!((settings.width, settings.height), (64, 48));
        assert_eq!(settings.sampling.samples_per_axis, 3);
        assert_eq!(settings.sampling.seed, 9);
        assert_eq!(settings.photon.iterations, 5);
        assert_eq!(settings.photon.photons_per_light, 2000);
        assert_eq!(settings.photon.initial_radius, 2.5);
    }

    #[test]
    fn test_invalid_override_is_rejected() {
        let cli = Cli::parse_from(["lumen", "--samples", "0"]);
        assert!(cli.settings().is_err());
    }

    #[test]
    fn test_obj_offset_parses_negative_components() {
        let cli = Cli::parse_from([
            "lumen",
            "--obj",
            "mesh.obj",
            "--obj-scale",
            "2",
            "--obj-offset",
            "-12,-10,1",
        ]);
        let placement = cli.placement().unwrap();
        assert_eq!(placement.scale, 2.0);
        assert_eq!(placement.offset, Vec3::new(-12.0, -10.0, 1.0));
        assert_eq!(cli.obj, vec![PathBuf::from("mesh.obj")]);
    }

    #[test]
    fn test_config_file_is_loaded_before_overrides() {
        let path = std::env::temp_dir().join(format!("lumen_{}_cli.json", std::process::id()));
        let json = r#"{ "integrator": "whitted", "width": 100, "whitted": { "max_depth": 6 } }"#;
        std::fs::write(&path, json).unwrap();

        let cli = Cli::parse_from([
            "lumen".to_string(),
            "--config".to_string(),
            path.display().to_string(),
            "--width".to_string(),
            "80".to_string(),
        ]);
        let settings = cli.settings().unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(settings.integrator, IntegratorKind::Whitted);
        assert_eq!(settings.whitted.max_depth, 6);
        assert_eq!(settings.width, 80);
        assert_eq!(settings.height, 512);
    }
}
