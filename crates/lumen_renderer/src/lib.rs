//! Lumen renderer - CPU light transport
//!
//! Scene primitives, a flat BVH shared by ray and hitpoint queries, and
//! three estimators built on it: a Whitted tracer, a path tracer with
//! Russian roulette and a progressive photon mapper.

mod accelerator;
mod bvh;
mod camera;
mod config;
mod hitpoint_bvh;
mod hittable;
mod integrator;
mod light;
mod material;
mod path_tracer;
mod photon_mapper;
mod renderer;
mod sampling;
mod scene;
mod sphere;
mod triangle;
mod whitted;

pub use accelerator::RayBvh;
pub use bvh::{BvhNode, BvhStats, BvhTree, TreeVisitor, MAX_BUILD_DEPTH, MAX_LEAF_ITEMS};
pub use camera::Camera;
pub use config::{
    ConfigError, IntegratorKind, PathTracerConfig, PhotonMapperConfig, RenderSettings,
    SamplingConfig, WhittedConfig,
};
pub use hitpoint_bvh::{FluxBuffer, Hitpoint, PointBvh};
pub use hittable::{HitRecord, Hittable, HittableList};
pub use integrator::{Integrator, RadianceEstimator};
pub use light::PointLight;
pub use material::{Color, DiffuseLight, Lambertian, Material, Phong};
pub use path_tracer::PathTracer;
pub use photon_mapper::PhotonMapper;
pub use renderer::{color_to_rgba, linear_to_gamma, render_image, ImageBuffer};
pub use sampling::{
    gen_f32, random_unit_vector, sample_hemisphere, stream_rng, HemisphereSample,
    HemisphereSampling,
};
pub use scene::Scene;
pub use sphere::Sphere;
pub use triangle::Triangle;
pub use whitted::WhittedTracer;

/// Re-export Vec3 and common math types from lumen_math
pub use lumen_math::{Aabb, Interval, Ray, Vec3};
