//! Hittable trait and HitRecord for ray-object intersection.

use crate::material::{reflect, refract};
use crate::Material;
use lumen_math::{Aabb, Ray, Vec3};

/// Record of a ray-object intersection.
#[derive(Clone, Copy)]
pub struct HitRecord<'a> {
    /// Point of intersection
    pub p: Vec3,
    /// Surface normal at intersection (always points against ray)
    pub normal: Vec3,
    /// Unit vector from the hit back toward the ray origin
    pub view: Vec3,
    /// Material at the intersection point
    pub material: &'a dyn Material,
    /// Parameter t where the intersection occurs
    pub t: f32,
    /// Whether the ray hit the front face (outside) of the surface
    pub front_face: bool,
}

impl<'a> HitRecord<'a> {
    /// Build a record for a hit at `t`, orienting the normal against the ray.
    pub fn new(ray: &Ray, t: f32, outward_normal: Vec3, material: &'a dyn Material) -> Self {
        let front_face = ray.direction.dot(outward_normal) < 0.0;
        let normal = if front_face {
            outward_normal
        } else {
            -outward_normal
        };

        Self {
            p: ray.at(t),
            normal,
            view: (-ray.direction).normalize_or_zero(),
            material,
            t,
            front_face,
        }
    }

    /// Mirror ray leaving the hit point.
    pub fn reflected_ray(&self) -> Ray {
        Ray::secondary(self.p, reflect(-self.view, self.normal))
    }

    /// Refracted ray leaving the hit point, or the mirror ray under total
    /// internal reflection.
    pub fn refracted_ray(&self) -> Ray {
        let ior = self.material.index_of_refraction();
        let ratio = if self.front_face { 1.0 / ior } else { ior };

        let cos_theta = self.view.dot(self.normal).min(1.0);
        let sin_theta = (1.0 - cos_theta * cos_theta).max(0.0).sqrt();
        if ratio * sin_theta > 1.0 {
            return self.reflected_ray();
        }

        Ray::secondary(self.p, refract(-self.view, self.normal, ratio))
    }

    /// Ray toward `target`, stopping just short of it, plus the distance.
    pub fn shadow_ray(&self, target: Vec3) -> (Ray, f32) {
        let to_target = target - self.p;
        let distance = to_target.length();
        let direction = to_target / distance;
        let ray = Ray::with_range(
            self.p,
            direction,
            lumen_math::RAY_EPSILON,
            distance - lumen_math::RAY_EPSILON,
        );
        (ray, distance)
    }
}

/// Trait for objects that can be hit by rays.
///
/// Both queries only report hits with `t` inside `[ray.min_t, ray.max_t]`.
pub trait Hittable: Send + Sync {
    /// Nearest hit within the ray's range.
    fn hit<'a>(&'a self, ray: &Ray) -> Option<HitRecord<'a>>;

    /// Whether anything is hit within the ray's range.
    fn hit_any(&self, ray: &Ray) -> bool {
        self.hit(ray).is_some()
    }

    /// Get the axis-aligned bounding box of this object.
    fn bounding_box(&self) -> Aabb;
}

/// A flat list of hittable objects, tested one by one.
///
/// Used to gather scene geometry before the BVH is built, and as the
/// brute-force reference the BVH is checked against.
pub struct HittableList {
    objects: Vec<Box<dyn Hittable>>,
    bbox: Aabb,
}

impl HittableList {
    /// Create a new empty hittable list.
    pub fn new() -> Self {
        Self {
            objects: Vec::new(),
            bbox: Aabb::EMPTY,
        }
    }

    /// Add an object to the list.
    pub fn add(&mut self, object: Box<dyn Hittable>) {
        self.bbox.include_box(&object.bounding_box());
        self.objects.push(object);
    }

    /// Add every object from an iterator.
    pub fn extend(&mut self, objects: impl IntoIterator<Item = Box<dyn Hittable>>) {
        for object in objects {
            self.add(object);
        }
    }

    /// Get the number of objects.
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Check if the list is empty.
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Hand the objects over, e.g. to a BVH build.
    pub fn into_objects(self) -> Vec<Box<dyn Hittable>> {
        self.objects
    }
}

impl Default for HittableList {
    fn default() -> Self {
        Self::new()
    }
}

impl Hittable for HittableList {
    fn hit<'a>(&'a self, ray: &Ray) -> Option<HitRecord<'a>> {
        let mut working = *ray;
        let mut closest = None;

        for object in &self.objects {
            if let Some(rec) = object.hit(&working) {
                working.max_t = rec.t;
                closest = Some(rec);
            }
        }

        closest
    }

    fn hit_any(&self, ray: &Ray) -> bool {
        self.objects.iter().any(|object| object.hit_any(ray))
    }

    fn bounding_box(&self) -> Aabb {
        self.bbox
    }
}
