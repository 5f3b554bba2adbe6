//! Built-in test scenes.

use std::sync::Arc;

use clap::ValueEnum;
use lumen_renderer::{
    Camera, Color, Hittable, HittableList, Lambertian, Material, Phong, PointLight, Scene,
    Sphere, Triangle, Vec3,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SceneKind {
    /// Closed box with coloured side walls and two white spheres
    Cornell,
    /// Eight glass and metal spheres above a glossy plane
    Spheres,
    /// 80 small spheres along the diagonal
    Simple,
    /// 80 small spheres at scattered positions
    Scrambled,
    /// Three spheres at different depths seen through a thin lens
    Dof,
}

/// Geometry, lights and camera of a scene before the accelerator is built.
pub struct SceneDescription {
    pub objects: HittableList,
    pub lights: Vec<PointLight>,
    pub camera: Camera,
}

impl SceneDescription {
    /// Build the acceleration structure and initialize the camera.
    pub fn finish(self) -> (Scene, Camera) {
        let mut camera = self.camera;
        camera.initialize();
        (Scene::new(self.objects, self.lights), camera)
    }
}

pub fn build(kind: SceneKind, width: u32, height: u32) -> SceneDescription {
    let mut description = match kind {
        SceneKind::Cornell => cornell(),
        SceneKind::Spheres => spheres(),
        SceneKind::Simple => simple(false),
        SceneKind::Scrambled => simple(true),
        SceneKind::Dof => depth_of_field(),
    };
    description.camera = description.camera.with_resolution(width, height);
    description
}

fn shared<M: Material + 'static>(material: M) -> Arc<dyn Material> {
    Arc::new(material)
}

/// Two triangles spanning `corner`, `corner + u` and `corner + v`.
fn quad(corner: Vec3, u: Vec3, v: Vec3, material: &Arc<dyn Material>) -> [Box<dyn Hittable>; 2] {
    [
        Box::new(Triangle::new(corner, corner + u, corner + u + v, material.clone())),
        Box::new(Triangle::new(corner, corner + u + v, corner + v, material.clone())),
    ]
}

/// Horizontal square of side `size` centred on `center`.
fn ground(center: Vec3, size: f32, material: &Arc<dyn Material>) -> [Box<dyn Hittable>; 2] {
    let half = size * 0.5;
    quad(
        center + Vec3::new(-half, 0.0, -half),
        Vec3::new(size, 0.0, 0.0),
        Vec3::new(0.0, 0.0, size),
        material,
    )
}

fn cornell_camera() -> Camera {
    Camera::new()
        .with_position(Vec3::new(0.0, 60.0, 180.0), Vec3::new(0.0, 60.0, 0.0), Vec3::Y)
        .with_lens(52.0, 0.0, 1.0)
}

pub fn cornell() -> SceneDescription {
    let red = shared(Lambertian::new(Color::new(0.7, 0.1, 0.1)));
    let blue = shared(Lambertian::new(Color::new(0.1, 0.1, 0.7)));
    let white = shared(Lambertian::new(Color::splat(0.7)));

    // Walls are 150 units wide; the box interior is 120 x 120.
    let size = 150.0;
    let mut objects = HittableList::new();
    objects.extend(ground(Vec3::ZERO, size, &white));
    objects.extend(ground(Vec3::new(0.0, 120.0, 0.0), size, &white));
    objects.extend(quad(
        Vec3::new(-60.0, -15.0, -75.0),
        Vec3::new(0.0, size, 0.0),
        Vec3::new(0.0, 0.0, size),
        &red,
    ));
    objects.extend(quad(
        Vec3::new(60.0, -15.0, -75.0),
        Vec3::new(0.0, size, 0.0),
        Vec3::new(0.0, 0.0, size),
        &blue,
    ));
    objects.extend(quad(
        Vec3::new(-75.0, -15.0, -60.0),
        Vec3::new(size, 0.0, 0.0),
        Vec3::new(0.0, size, 0.0),
        &white,
    ));

    objects.add(Box::new(Sphere::new(
        Vec3::new(23.5, 16.5, 31.0),
        16.5,
        white.clone(),
    )));
    objects.add(Box::new(Sphere::new(
        Vec3::new(-22.5, 16.5, 0.0),
        16.5,
        white,
    )));

    SceneDescription {
        objects,
        lights: vec![PointLight::new(Vec3::new(0.0, 108.0, 0.0), Color::ONE, 6000.0)],
        camera: cornell_camera(),
    }
}

pub fn spheres() -> SceneDescription {
    let materials = [
        shared(
            Phong::new(Color::new(0.0, 0.2, 0.9), 10.0)
                .with_transparency(0.7)
                .with_ior(1.01),
        ),
        shared(Phong::new(Color::new(1.0, 0.3, 0.2), 100.0).with_reflectivity(0.7)),
        shared(
            Phong::new(Color::new(0.0, 0.7, 0.1), 10.0)
                .with_transparency(0.3)
                .with_ior(1.2),
        ),
    ];

    let mut objects = HittableList::new();
    for i in 0..8u32 {
        let offset = |bit: u32| -6.0 + 12.0 * ((i >> bit) & 1) as f32;
        let center = Vec3::new(offset(0), offset(1), offset(2));
        let material = materials[i as usize % materials.len()].clone();
        objects.add(Box::new(Sphere::new(center, 3.5, material)));
    }

    let plane = shared(Phong::new(Color::ONE, 10.0).with_reflectivity(0.75));
    objects.extend(ground(Vec3::new(0.0, -10.0, 0.0), 20.0, &plane));

    SceneDescription {
        objects,
        lights: vec![PointLight::new(
            Vec3::new(20.0, 240.0, -7.0),
            Color::splat(1.5),
            60000.0,
        )],
        camera: Camera::new()
            .with_position(Vec3::new(27.0, 17.0, 21.0), Vec3::new(-1.0, -3.0, 0.0), Vec3::Y)
            .with_lens(52.0, 0.0, 1.0),
    }
}

pub fn simple(scrambled: bool) -> SceneDescription {
    let material = shared(Lambertian::new(Color::new(0.0, 0.2, 1.5)).with_reflectivity(0.4));

    let mut objects = HittableList::new();
    for i in 0..80u32 {
        let coord = |stride: u32| {
            let step = if scrambled { (i * stride) % 80 } else { i % 80 };
            -39.5 + step as f32
        };
        let center = Vec3::new(coord(13), coord(7), coord(29));
        objects.add(Box::new(Sphere::new(center, 1.0, material.clone())));
    }

    SceneDescription {
        objects,
        lights: vec![PointLight::new(
            Vec3::new(-20.0, 20.0, 60.0),
            Color::splat(1.5),
            4000.0,
        )],
        camera: Camera::new()
            .with_position(Vec3::new(0.0, 0.0, 116.0), Vec3::ZERO, Vec3::Y)
            .with_lens(58.0, 0.0, 1.0),
    }
}

pub fn depth_of_field() -> SceneDescription {
    let mut objects = HittableList::new();
    let balls = [
        (Vec3::new(22.0, 16.5, -200.0), Color::new(0.7, 0.2, 0.2)),
        (Vec3::new(-10.0, 16.5, 0.0), Color::new(0.2, 0.7, 0.2)),
        (Vec3::new(-35.0, 16.5, 100.0), Color::new(0.2, 0.2, 0.7)),
    ];
    for (center, albedo) in balls {
        objects.add(Box::new(Sphere::new(center, 16.5, Lambertian::new(albedo))));
    }

    let white = shared(Lambertian::new(Color::splat(0.7)));
    objects.extend(ground(Vec3::new(0.0, 0.0, -75.0), 450.0, &white));

    // Focus on the middle sphere.
    let from = Vec3::new(0.0, 60.0, 180.0);
    let focus = (Vec3::new(-10.0, 16.5, 0.0) - from).length();

    SceneDescription {
        objects,
        lights: vec![PointLight::new(Vec3::new(0.0, 108.0, 0.0), Color::ONE, 6000.0)],
        camera: Camera::new()
            .with_position(from, Vec3::new(0.0, 30.0, 0.0), Vec3::Y)
            .with_lens(52.0, 2.0, focus),
    }
}
