//! Render settings, loadable from JSON.
//!
//! Every section has defaults, so a settings file only needs the fields it
//! changes.

use crate::photon_mapper::PhotonMapper;
use crate::sampling::HemisphereSampling;
use crate::{Integrator, PathTracer, WhittedTracer};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors produced while loading or validating settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for `{field}`: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("failed to parse settings: {0}")]
    Json(#[from] serde_json::Error),
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::InvalidValue {
        field,
        reason: reason.into(),
    }
}

/// Camera sub-sampling and randomness.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingConfig {
    /// Pixels are sampled on an `n x n` jittered grid.
    pub samples_per_axis: u32,
    pub seed: u64,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            samples_per_axis: 2,
            seed: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WhittedConfig {
    pub max_depth: u32,
}

impl Default for WhittedConfig {
    fn default() -> Self {
        Self { max_depth: 3 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathTracerConfig {
    /// Bounces below this depth always continue.
    pub max_depth: u32,
    /// Absorption probability past `max_depth`; `None` stops paths there.
    pub russian_roulette: Option<f32>,
    pub hemisphere: HemisphereSampling,
}

impl Default for PathTracerConfig {
    fn default() -> Self {
        Self {
            max_depth: 3,
            russian_roulette: Some(0.1),
            hemisphere: HemisphereSampling::Cosine,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhotonMapperConfig {
    /// Specular depth limit of the eye pass.
    pub max_forward_depth: u32,
    pub initial_radius: f32,
    pub photons_per_light: u32,
    pub iterations: u32,
    /// Fraction `k` of new photons kept by the progressive update.
    pub radius_reduction: f32,
    /// Photon bounces below this depth always continue.
    pub max_depth: u32,
    pub russian_roulette: Option<f32>,
    pub hemisphere: HemisphereSampling,
    /// Photons traced per parallel work item.
    pub batch_size: u32,
}

impl Default for PhotonMapperConfig {
    fn default() -> Self {
        Self {
            max_forward_depth: 4,
            initial_radius: 0.5,
            photons_per_light: 100_000,
            iterations: 16,
            radius_reduction: 0.7,
            max_depth: 4,
            russian_roulette: Some(0.1),
            hemisphere: HemisphereSampling::Cosine,
            batch_size: 1024,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntegratorKind {
    Whitted,
    #[default]
    Path,
    Photon,
}

/// Complete settings for one render.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    pub width: u32,
    pub height: u32,
    pub integrator: IntegratorKind,
    pub sampling: SamplingConfig,
    pub whitted: WhittedConfig,
    pub path: PathTracerConfig,
    pub photon: PhotonMapperConfig,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            width: 512,
            height: 512,
            integrator: IntegratorKind::default(),
            sampling: SamplingConfig::default(),
            whitted: WhittedConfig::default(),
            path: PathTracerConfig::default(),
            photon: PhotonMapperConfig::default(),
        }
    }
}

impl RenderSettings {
    /// Parse settings from JSON. Missing fields keep their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let settings: Self = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 || self.height == 0 {
            return Err(invalid("width/height", "image size must be non-zero"));
        }
        if self.sampling.samples_per_axis == 0 {
            return Err(invalid("sampling.samples_per_axis", "must be at least 1"));
        }

        check_roulette("path.russian_roulette", self.path.russian_roulette)?;
        check_roulette("photon.russian_roulette", self.photon.russian_roulette)?;

        let photon = &self.photon;
        if photon.photons_per_light == 0 {
            return Err(invalid("photon.photons_per_light", "must be at least 1"));
        }
        if photon.iterations == 0 {
            return Err(invalid("photon.iterations", "must be at least 1"));
        }
        if photon.batch_size == 0 {
            return Err(invalid("photon.batch_size", "must be at least 1"));
        }
        if !(photon.initial_radius > 0.0 && photon.initial_radius.is_finite()) {
            return Err(invalid(
                "photon.initial_radius",
                format!("{} is not a positive radius", photon.initial_radius),
            ));
        }
        if !(photon.radius_reduction > 0.0 && photon.radius_reduction < 1.0) {
            return Err(invalid(
                "photon.radius_reduction",
                format!("{} is outside (0, 1)", photon.radius_reduction),
            ));
        }

        Ok(())
    }

    /// The integrator selected by `integrator`, configured from these settings.
    pub fn build_integrator(&self) -> Box<dyn Integrator> {
        match self.integrator {
            IntegratorKind::Whitted => Box::new(WhittedTracer::new(self.whitted, self.sampling)),
            IntegratorKind::Path => Box::new(PathTracer::new(self.path, self.sampling)),
            IntegratorKind::Photon => Box::new(PhotonMapper::new(self.photon, self.sampling)),
        }
    }
}

fn check_roulette(field: &'static str, roulette: Option<f32>) -> Result<(), ConfigError> {
    match roulette {
        Some(p) if !(0.0..1.0).contains(&p) => {
            Err(invalid(field, format!("absorption {p} is outside [0, 1)")))
        }
        _ => Ok(()),
    }
}
