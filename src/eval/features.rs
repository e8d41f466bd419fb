//! Input feature expansion.
//!
//! The first eight features are fixed by the trained weights, not by config: three coordinates
//! followed by five latent slots. Optional Fourier and radial expansions are appended after them.

use crate::foundation::error::{CppnError, CppnResult};
use crate::model::{ModelConfig, WorldModel};

/// Number of latent slots in the input schema.
pub const LATENT_SLOTS: usize = 5;

/// Names of the base input features, in wire order.
pub const BASE_FEATURES: [&str; 8] = [
    "x", "y", "z", "latent0", "latent1", "latent2", "latent3", "latent4",
];

/// Length of the base feature block.
pub const BASE_FEATURE_LEN: usize = BASE_FEATURES.len();

/// One sample point: coordinates plus the latent vector.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FieldInput {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub latent: [f32; LATENT_SLOTS],
}

impl FieldInput {
    /// Build from a base vector laid out as [`BASE_FEATURES`].
    pub fn from_base(base: &[f32; BASE_FEATURE_LEN]) -> Self {
        Self {
            x: base[0],
            y: base[1],
            z: base[2],
            latent: [base[3], base[4], base[5], base[6], base[7]],
        }
    }

    /// Same point with different screen coordinates.
    pub fn at(self, x: f32, y: f32) -> Self {
        Self { x, y, ..self }
    }
}

/// Expands [`FieldInput`]s into the feature vectors a world was trained on.
#[derive(Clone, Debug)]
pub struct FeatureBuilder {
    fourier_bands: Vec<f32>,
    radial_powers: Vec<i32>,
}

impl FeatureBuilder {
    pub fn new(config: &ModelConfig) -> Self {
        let fourier_bands = if config.cppn_coord_use_fourier_xy {
            config.cppn_coord_fourier_bands.iter().map(|&b| b as f32).collect()
        } else {
            Vec::new()
        };
        let radial_powers = if config.cppn_coord_use_radial {
            config
                .cppn_coord_radial_powers
                .iter()
                .map(|&p| i32::try_from(p).unwrap_or(i32::MAX))
                .collect()
        } else {
            Vec::new()
        };
        Self {
            fourier_bands,
            radial_powers,
        }
    }

    /// Builder for `world`, checked against the first layer's input width.
    pub fn for_world(world: &WorldModel) -> CppnResult<Self> {
        let fb = Self::new(world.config());
        fb.check_len(world.input_dim())?;
        Ok(fb)
    }

    /// `8 + 4·bands + powers`, counting only enabled expansions.
    pub fn feature_len(&self) -> usize {
        BASE_FEATURE_LEN + 4 * self.fourier_bands.len() + self.radial_powers.len()
    }

    pub fn check_len(&self, expected: usize) -> CppnResult<()> {
        let built = self.feature_len();
        if built != expected {
            return Err(CppnError::FeatureDimensionMismatch { built, expected });
        }
        Ok(())
    }

    /// Append the features for one point to `out`.
    pub fn push(&self, p: &FieldInput, out: &mut Vec<f32>) {
        out.extend_from_slice(&[p.x, p.y, p.z]);
        out.extend_from_slice(&p.latent);

        for &b in &self.fourier_bands {
            let bx = b * p.x;
            let by = b * p.y;
            out.extend_from_slice(&[bx.sin(), bx.cos(), by.sin(), by.cos()]);
        }

        if !self.radial_powers.is_empty() {
            let r = (p.x * p.x + p.y * p.y + p.z * p.z).sqrt();
            out.extend(self.radial_powers.iter().map(|&e| r.powi(e)));
        }
    }

    /// Feature vector for one point.
    pub fn build(&self, p: &FieldInput) -> Vec<f32> {
        let mut out = Vec::with_capacity(self.feature_len());
        self.push(p, &mut out);
        out
    }

    /// Row-major batch, one row of [`Self::feature_len`] per point.
    pub fn build_batch(&self, points: &[FieldInput]) -> Vec<f32> {
        let mut out = Vec::with_capacity(points.len() * self.feature_len());
        for p in points {
            self.push(p, &mut out);
        }
        out
    }
}

#[cfg(test)]
#[path = "../../tests/unit/eval/features.rs"]
mod tests;
