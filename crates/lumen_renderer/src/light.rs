//! Point light sources.

use crate::Color;
use lumen_math::Vec3;

/// Isotropic point light.
///
/// `radiance` is the color scaled by intensity; irradiance at distance `d`
/// falls off as `1 / d²`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointLight {
    position: Vec3,
    radiance: Color,
}

impl PointLight {
    pub fn new(position: Vec3, color: Color, intensity: f32) -> Self {
        Self {
            position,
            radiance: color * intensity,
        }
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn radiance(&self) -> Color {
        self.radiance
    }
}
