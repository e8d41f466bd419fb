//! Evaluation policy for one world and the normalizer that fills it in from a sparse training
//! config.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Hidden-layer activation. Only the periodic `sin` activation is defined.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Activation {
    #[default]
    Sin,
}

impl Activation {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sin => "sin",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "sin" => Some(Self::Sin),
            _ => None,
        }
    }
}

/// Fully populated evaluation policy for one world.
///
/// Field names double as the persisted document keys. Deserialization always goes through
/// [`normalize_config`], so a sparse or partially invalid map still yields a usable config.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "Map<String, Value>")]
pub struct ModelConfig {
    pub cppn_activation: Activation,
    pub cppn_sin_w0: f64,
    pub cppn_coord_use_fourier_xy: bool,
    pub cppn_coord_use_radial: bool,
    pub cppn_coord_fourier_bands: Vec<u32>,
    pub cppn_coord_radial_powers: Vec<u32>,
    pub image_channels: u32,
    /// Latent size used at training time. Informational only.
    pub param_seed_dim: u32,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            cppn_activation: Activation::Sin,
            cppn_sin_w0: 1.0,
            cppn_coord_use_fourier_xy: false,
            cppn_coord_use_radial: false,
            cppn_coord_fourier_bands: vec![1, 2],
            cppn_coord_radial_powers: vec![1, 2],
            image_channels: 3,
            param_seed_dim: 16,
        }
    }
}

impl ModelConfig {
    /// `w0` as applied inside the `f32` evaluator.
    pub fn w0_f32(&self) -> f32 {
        self.cppn_sin_w0 as f32
    }
}

impl From<Map<String, Value>> for ModelConfig {
    fn from(map: Map<String, Value>) -> Self {
        normalize_config(&map)
    }
}

/// Build a [`ModelConfig`] from an arbitrary partial key/value map.
///
/// Unknown keys are ignored. A recognized key that is absent keeps its default silently; one
/// that is present with the wrong shape keeps its default and logs a warning. Normalizing the
/// serialized form of an already-normalized config returns the same value.
pub fn normalize_config(map: &Map<String, Value>) -> ModelConfig {
    let d = ModelConfig::default();
    ModelConfig {
        cppn_activation: field(map, "cppn_activation", |v| {
            v.as_str().and_then(Activation::parse)
        })
        .unwrap_or(d.cppn_activation),
        cppn_sin_w0: field(map, "cppn_sin_w0", |v| v.as_f64().filter(|w| w.is_finite()))
            .unwrap_or(d.cppn_sin_w0),
        cppn_coord_use_fourier_xy: field(map, "cppn_coord_use_fourier_xy", Value::as_bool)
            .unwrap_or(d.cppn_coord_use_fourier_xy),
        cppn_coord_use_radial: field(map, "cppn_coord_use_radial", Value::as_bool)
            .unwrap_or(d.cppn_coord_use_radial),
        cppn_coord_fourier_bands: field(map, "cppn_coord_fourier_bands", positive_ints)
            .unwrap_or(d.cppn_coord_fourier_bands),
        cppn_coord_radial_powers: field(map, "cppn_coord_radial_powers", positive_ints)
            .unwrap_or(d.cppn_coord_radial_powers),
        image_channels: field(map, "image_channels", |v| {
            v.as_u64().filter(|c| *c == 1 || *c == 3).map(|c| c as u32)
        })
        .unwrap_or(d.image_channels),
        param_seed_dim: field(map, "param_seed_dim", positive_int).unwrap_or(d.param_seed_dim),
    }
}

fn field<T>(map: &Map<String, Value>, key: &str, parse: impl FnOnce(&Value) -> Option<T>) -> Option<T> {
    let raw = map.get(key)?;
    let parsed = parse(raw);
    if parsed.is_none() {
        tracing::warn!(key, value = %raw, "config value has the wrong shape, using default");
    }
    parsed
}

fn positive_int(v: &Value) -> Option<u32> {
    v.as_u64()
        .filter(|n| *n > 0)
        .and_then(|n| u32::try_from(n).ok())
}

fn positive_ints(v: &Value) -> Option<Vec<u32>> {
    v.as_array()?.iter().map(positive_int).collect()
}

#[cfg(test)]
#[path = "../../tests/unit/model/config.rs"]
mod tests;
