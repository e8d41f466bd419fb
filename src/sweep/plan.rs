//! Sweep planning: which input dimension each clip animates, and the per-clip random state.

use std::f64::consts::TAU;
use std::fmt;

use rand::rngs::StdRng;
use rand::seq::SliceRandom as _;
use rand::{Rng as _, SeedableRng as _};

use crate::eval::features::{BASE_FEATURE_LEN, BASE_FEATURES, FieldInput};
use crate::foundation::error::{CppnError, CppnResult};

/// Input dimensions a clip may sweep. `x` and `y` come from the pixel grid instead.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SweepDim {
    Z,
    Latent0,
    Latent1,
    Latent2,
    Latent3,
    Latent4,
}

impl SweepDim {
    pub const ALL: [SweepDim; 6] = [
        Self::Z,
        Self::Latent0,
        Self::Latent1,
        Self::Latent2,
        Self::Latent3,
        Self::Latent4,
    ];

    /// Position in the base feature vector.
    pub fn index(self) -> usize {
        match self {
            Self::Z => 2,
            Self::Latent0 => 3,
            Self::Latent1 => 4,
            Self::Latent2 => 5,
            Self::Latent3 => 6,
            Self::Latent4 => 7,
        }
    }

    pub fn name(self) -> &'static str {
        BASE_FEATURES[self.index()]
    }
}

impl fmt::Display for SweepDim {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for SweepDim {
    type Err = CppnError;

    fn from_str(s: &str) -> CppnResult<Self> {
        Self::ALL
            .into_iter()
            .find(|d| d.name() == s)
            .ok_or_else(|| {
                CppnError::validation(format!(
                    "unknown sweep dimension '{s}' (expected one of z, latent0..latent4)"
                ))
            })
    }
}

/// Shuffle the candidate set once, then cycle through it for `clips` entries.
pub fn choose_sweep_plan(clips: usize, rng: &mut StdRng) -> Vec<SweepDim> {
    let mut options = SweepDim::ALL;
    options.shuffle(rng);
    options.iter().copied().cycle().take(clips).collect()
}

/// One clip to render for one world.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClipSpec {
    /// 1-based clip number within the world.
    pub index: u32,
    pub sweep: SweepDim,
    pub seed: u64,
}

impl ClipSpec {
    /// `<world>_clip_<NN>_<sweep>.mp4`
    pub fn file_name(&self, world_id: &str) -> String {
        format!("{world_id}_clip_{:02}_{}.mp4", self.index, self.sweep)
    }
}

/// Per-clip seed: `base + world_index·1000 + clip_index·37`.
pub fn clip_seed(base_seed: u64, world_index: usize, clip_index: u32) -> u64 {
    base_seed
        .wrapping_add((world_index as u64).wrapping_mul(1000))
        .wrapping_add(u64::from(clip_index).wrapping_mul(37))
}

/// Plan `clips` clips for the world at `world_index`, drawing the sweep order from `rng`.
pub fn plan_clips(
    world_index: usize,
    clips: usize,
    base_seed: u64,
    rng: &mut StdRng,
) -> Vec<ClipSpec> {
    choose_sweep_plan(clips, rng)
        .into_iter()
        .zip(1u32..)
        .map(|(sweep, index)| ClipSpec {
            index,
            sweep,
            seed: clip_seed(base_seed, world_index, index),
        })
        .collect()
}

/// Fixed random state of one clip: the base input vector and the sweep phase.
#[derive(Clone, Debug, PartialEq)]
pub struct SweepState {
    pub dim: SweepDim,
    pub base: [f32; BASE_FEATURE_LEN],
    pub phase: f64,
    pub amplitude: f64,
}

impl SweepState {
    /// Draw the base vector (each slot uniform in `[-1, 1)`, `x = y = 0`) and a phase in
    /// `[0, 2π)` from a stream seeded with `seed`.
    pub fn sample(dim: SweepDim, seed: u64, amplitude: f64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut base = [0.0f32; BASE_FEATURE_LEN];
        for v in base.iter_mut().skip(2) {
            *v = rng.random_range(-1.0f32..1.0);
        }
        let phase = rng.random_range(0.0..TAU);
        Self {
            dim,
            base,
            phase,
            amplitude,
        }
    }

    /// Sweep value at frame `i` of `n`: `amplitude · sin(2π·i/n + phase)`.
    ///
    /// `i = n` lands on the same value as `i = 0`, which closes the loop.
    pub fn value_at(&self, i: u64, n: u64) -> f64 {
        let t = i as f64 / n as f64;
        self.amplitude * (TAU * t + self.phase).sin()
    }

    /// Base vector for frame `i` of `n` with the sweep slot filled in.
    pub fn base_at(&self, i: u64, n: u64) -> [f32; BASE_FEATURE_LEN] {
        let mut base = self.base;
        base[self.dim.index()] = self.value_at(i, n) as f32;
        base
    }

    /// Per-frame field input; `x`/`y` are replaced per pixel.
    pub fn input_at(&self, i: u64, n: u64) -> FieldInput {
        FieldInput::from_base(&self.base_at(i, n))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/sweep/plan.rs"]
mod tests;
