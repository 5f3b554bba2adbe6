//! Material trait and the reflectance models used by the integrators.
//!
//! Every material is a mix of three lobes chosen stochastically by the
//! integrators: a perfect mirror (weight `reflectivity`), a perfect
//! refraction (weight `transparency`) and the BRDF returned by
//! `eval_brdf` for the remainder.

use crate::HitRecord;
use lumen_math::Vec3;
use std::f32::consts::PI;
use std::sync::Arc;

/// Color type alias (linear RGB)
pub type Color = Vec3;

/// Trait for materials that describe how light interacts with surfaces.
pub trait Material: Send + Sync {
    /// BRDF at the hit for light arriving from direction `wi` (unit,
    /// pointing away from the surface) and leaving toward `rec.view`.
    fn eval_brdf(&self, rec: &HitRecord, wi: Vec3) -> Color;

    /// Probability of a perfect mirror bounce, in [0, 1].
    fn reflectivity(&self, _rec: &HitRecord) -> f32 {
        0.0
    }

    /// Probability of a perfect refraction, in [0, 1].
    fn transparency(&self, _rec: &HitRecord) -> f32 {
        0.0
    }

    fn index_of_refraction(&self) -> f32 {
        1.0
    }

    /// True if the material emits light.
    fn is_emissive(&self) -> bool {
        false
    }

    /// Radiance emitted toward `rec.view`. Black for non-emitters.
    fn emitted(&self, _rec: &HitRecord) -> Color {
        Color::ZERO
    }
}

impl<M: Material + ?Sized> Material for Arc<M> {
    fn eval_brdf(&self, rec: &HitRecord, wi: Vec3) -> Color {
        (**self).eval_brdf(rec, wi)
    }

    fn reflectivity(&self, rec: &HitRecord) -> f32 {
        (**self).reflectivity(rec)
    }

    fn transparency(&self, rec: &HitRecord) -> f32 {
        (**self).transparency(rec)
    }

    fn index_of_refraction(&self) -> f32 {
        (**self).index_of_refraction()
    }

    fn is_emissive(&self) -> bool {
        (**self).is_emissive()
    }

    fn emitted(&self, rec: &HitRecord) -> Color {
        (**self).emitted(rec)
    }
}

/// Specular lobe weights shared by the non-emissive materials.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Lobes {
    reflectivity: f32,
    transparency: f32,
    ior: f32,
}

impl Default for Lobes {
    fn default() -> Self {
        Self {
            reflectivity: 0.0,
            transparency: 0.0,
            ior: 1.0,
        }
    }
}

impl Lobes {
    /// Keep `reflectivity + transparency <= 1`.
    fn normalized(mut self) -> Self {
        self.reflectivity = self.reflectivity.clamp(0.0, 1.0);
        self.transparency = self.transparency.clamp(0.0, 1.0 - self.reflectivity);
        self
    }
}

/// Lambertian (diffuse) material.
#[derive(Debug, Clone)]
pub struct Lambertian {
    albedo: Color,
    lobes: Lobes,
}

impl Lambertian {
    /// Create a new Lambertian material with the given albedo color.
    pub fn new(albedo: Color) -> Self {
        Self {
            albedo,
            lobes: Lobes::default(),
        }
    }

    pub fn with_reflectivity(mut self, reflectivity: f32) -> Self {
        self.lobes.reflectivity = reflectivity;
        self.lobes = self.lobes.normalized();
        self
    }

    pub fn with_transparency(mut self, transparency: f32) -> Self {
        self.lobes.transparency = transparency;
        self.lobes = self.lobes.normalized();
        self
    }

    pub fn with_ior(mut self, ior: f32) -> Self {
        self.lobes.ior = ior;
        self
    }
}

impl Material for Lambertian {
    fn eval_brdf(&self, _rec: &HitRecord, _wi: Vec3) -> Color {
        self.albedo / PI
    }

    fn reflectivity(&self, _rec: &HitRecord) -> f32 {
        self.lobes.reflectivity
    }

    fn transparency(&self, _rec: &HitRecord) -> f32 {
        self.lobes.transparency
    }

    fn index_of_refraction(&self) -> f32 {
        self.lobes.ior
    }
}

/// Diffuse base with a normalized Blinn-Phong highlight.
///
/// The highlight strength follows the mirror reflectivity, so a matte
/// Phong surface has no highlight.
#[derive(Debug, Clone)]
pub struct Phong {
    diffuse: Color,
    shininess: f32,
    lobes: Lobes,
}

impl Phong {
    pub fn new(diffuse: Color, shininess: f32) -> Self {
        Self {
            diffuse,
            shininess: shininess.max(0.0),
            lobes: Lobes::default(),
        }
    }

    pub fn with_reflectivity(mut self, reflectivity: f32) -> Self {
        self.lobes.reflectivity = reflectivity;
        self.lobes = self.lobes.normalized();
        self
    }

    pub fn with_transparency(mut self, transparency: f32) -> Self {
        self.lobes.transparency = transparency;
        self.lobes = self.lobes.normalized();
        self
    }

    pub fn with_ior(mut self, ior: f32) -> Self {
        self.lobes.ior = ior;
        self
    }
}

impl Material for Phong {
    fn eval_brdf(&self, rec: &HitRecord, wi: Vec3) -> Color {
        let diffuse = self.diffuse / PI;

        let half = (wi + rec.view).normalize_or_zero();
        let n_dot_h = half.dot(rec.normal).max(0.0);
        let norm = (self.shininess + 8.0) / (8.0 * PI);
        let spec = self.lobes.reflectivity * norm * n_dot_h.powf(self.shininess);

        diffuse + Color::splat(spec)
    }

    fn reflectivity(&self, _rec: &HitRecord) -> f32 {
        self.lobes.reflectivity
    }

    fn transparency(&self, _rec: &HitRecord) -> f32 {
        self.lobes.transparency
    }

    fn index_of_refraction(&self) -> f32 {
        self.lobes.ior
    }
}

/// Diffuse light emitter.
#[derive(Debug, Clone)]
pub struct DiffuseLight {
    emit: Color,
}

impl DiffuseLight {
    /// Create a new diffuse light with the given emission color.
    pub fn new(emit: Color) -> Self {
        Self { emit }
    }
}

impl Material for DiffuseLight {
    fn eval_brdf(&self, _rec: &HitRecord, _wi: Vec3) -> Color {
        Color::ZERO
    }

    fn is_emissive(&self) -> bool {
        true
    }

    fn emitted(&self, _rec: &HitRecord) -> Color {
        self.emit
    }
}

// =============================================================================
// Helper functions
// =============================================================================

/// Reflect a vector about a normal.
#[inline]
pub(crate) fn reflect(v: Vec3, n: Vec3) -> Vec3 {
    v - 2.0 * v.dot(n) * n
}

/// Refract a unit vector through a surface with relative index `etai_over_etat`.
#[inline]
pub(crate) fn refract(uv: Vec3, n: Vec3, etai_over_etat: f32) -> Vec3 {
    let cos_theta = (-uv).dot(n).min(1.0);
    let r_out_perp = etai_over_etat * (uv + cos_theta * n);
    let r_out_parallel = -(1.0 - r_out_perp.length_squared()).abs().sqrt() * n;
    r_out_perp + r_out_parallel
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumen_math::Ray;

    fn hit_on_floor(material: &dyn Material) -> HitRecord<'_> {
        let ray = Ray::new(Vec3::new(0.0, 1.0, 1.0), Vec3::new(0.0, -1.0, -1.0));
        HitRecord::new(&ray, 1.0, Vec3::Y, material)
    }

    #[test]
    fn test_lambertian_brdf_is_albedo_over_pi() {
        let mat = Lambertian::new(Color::new(0.5, 0.25, 1.0));
        let rec = hit_on_floor(&mat);
        let brdf = mat.eval_brdf(&rec, Vec3::Y);
        assert!((brdf - Color::new(0.5, 0.25, 1.0) / PI).length() < 1e-6);
    }

    #[test]
    fn test_lobes_never_exceed_one() {
        let mat = Lambertian::new(Color::ONE)
            .with_reflectivity(0.8)
            .with_transparency(0.6);
        let rec = hit_on_floor(&mat);
        assert!((mat.reflectivity(&rec) - 0.8).abs() < 1e-6);
        assert!(mat.reflectivity(&rec) + mat.transparency(&rec) <= 1.0 + 1e-6);
    }

    #[test]
    fn test_phong_highlight_peaks_at_mirror_direction() {
        let mat = Phong::new(Color::splat(0.5), 50.0).with_reflectivity(0.5);
        let rec = hit_on_floor(&mat);

        let mirror = reflect(-rec.view, rec.normal);
        let off_mirror = Vec3::new(1.0, 1.0, 0.0).normalize();
        let peak = mat.eval_brdf(&rec, mirror);
        let side = mat.eval_brdf(&rec, off_mirror);
        assert!(peak.x > side.x);
    }

    #[test]
    fn test_matte_phong_is_lambertian() {
        let mat = Phong::new(Color::splat(0.5), 50.0);
        let rec = hit_on_floor(&mat);
        let brdf = mat.eval_brdf(&rec, rec.view);
        assert!((brdf - Color::splat(0.5 / PI)).length() < 1e-6);
    }

    #[test]
    fn test_diffuse_light_emits_and_absorbs() {
        let light = DiffuseLight::new(Color::splat(4.0));
        let rec = hit_on_floor(&light);
        assert!(light.is_emissive());
        assert_eq!(light.emitted(&rec), Color::splat(4.0));
        assert_eq!(light.eval_brdf(&rec, Vec3::Y), Color::ZERO);
    }

    #[test]
    fn test_shared_material_forwards() {
        let shared: Arc<dyn Material> = Arc::new(Lambertian::new(Color::ONE).with_reflectivity(0.3));
        let rec = hit_on_floor(&shared);
        assert!((shared.reflectivity(&rec) - 0.3).abs() < 1e-6);
    }
}
