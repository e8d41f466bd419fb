//! Canonical layered representation of trained CPPN worlds.

pub mod config;

use serde::{Deserialize, Serialize};

use crate::foundation::error::{CppnError, CppnResult};

pub use config::{Activation, ModelConfig, normalize_config};

/// Document schema version written by this crate and the only one it loads.
pub const DOCUMENT_VERSION: u32 = 1;

/// One affine transform `h <- W·h + b`.
///
/// `weight` is row-major with one row per output: `weight[o * in_dim + i]`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LayerSpec {
    #[serde(rename = "in")]
    pub in_dim: usize,
    #[serde(rename = "out")]
    pub out_dim: usize,
    pub weight: Vec<f32>,
    pub bias: Vec<f32>,
}

impl LayerSpec {
    /// Create a validated layer.
    pub fn new(in_dim: usize, out_dim: usize, weight: Vec<f32>, bias: Vec<f32>) -> CppnResult<Self> {
        let layer = Self {
            in_dim,
            out_dim,
            weight,
            bias,
        };
        layer.validate()?;
        Ok(layer)
    }

    pub(crate) fn validate(&self) -> CppnResult<()> {
        if self.in_dim == 0 || self.out_dim == 0 {
            return Err(CppnError::shape_mismatch(format!(
                "layer dimensions must be non-zero (in={}, out={})",
                self.in_dim, self.out_dim
            )));
        }
        if self.weight.len() != self.in_dim * self.out_dim {
            return Err(CppnError::shape_mismatch(format!(
                "weight has {} values, expected in*out = {}*{}",
                self.weight.len(),
                self.in_dim,
                self.out_dim
            )));
        }
        if self.bias.len() != self.out_dim {
            return Err(CppnError::shape_mismatch(format!(
                "bias has {} values, expected out = {}",
                self.bias.len(),
                self.out_dim
            )));
        }
        if !self.weight.iter().chain(&self.bias).all(|v| v.is_finite()) {
            return Err(CppnError::validation("layer parameters must be finite"));
        }
        Ok(())
    }

    /// Weight row for output `o`.
    pub fn row(&self, o: usize) -> &[f32] {
        &self.weight[o * self.in_dim..(o + 1) * self.in_dim]
    }
}

/// Check that `layers` is non-empty and each layer's output feeds the next layer's input.
pub fn check_chain(layers: &[LayerSpec]) -> CppnResult<()> {
    if layers.is_empty() {
        return Err(CppnError::empty_model("no layers"));
    }
    for (i, pair) in layers.windows(2).enumerate() {
        if pair[0].out_dim != pair[1].in_dim {
            return Err(CppnError::shape_mismatch(format!(
                "layer {i} outputs {} values but layer {} expects {}",
                pair[0].out_dim,
                i + 1,
                pair[1].in_dim
            )));
        }
    }
    Ok(())
}

/// One trained, named network bundled with its evaluation policy.
///
/// Immutable once constructed; every constructor path validates the layer chain.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "WorldModelDef")]
pub struct WorldModel {
    id: String,
    label: String,
    config: ModelConfig,
    layers: Vec<LayerSpec>,
}

/// Unvalidated boundary form of a [`WorldModel`].
#[derive(Clone, Debug, Deserialize)]
pub(crate) struct WorldModelDef {
    pub(crate) id: String,
    pub(crate) label: String,
    pub(crate) config: ModelConfig,
    pub(crate) layers: Vec<LayerSpec>,
}

impl TryFrom<WorldModelDef> for WorldModel {
    type Error = CppnError;

    fn try_from(def: WorldModelDef) -> CppnResult<Self> {
        Self::new(def.id, def.label, def.config, def.layers)
    }
}

impl WorldModel {
    /// Create a validated world.
    pub fn new(
        id: impl Into<String>,
        label: impl Into<String>,
        config: ModelConfig,
        layers: Vec<LayerSpec>,
    ) -> CppnResult<Self> {
        let id = id.into();
        if id.is_empty() {
            return Err(CppnError::validation("world id must be non-empty"));
        }
        for (i, layer) in layers.iter().enumerate() {
            layer.validate().map_err(|e| match e {
                CppnError::ShapeMismatch(msg) => {
                    CppnError::shape_mismatch(format!("world '{id}' layer {i}: {msg}"))
                }
                other => other,
            })?;
        }
        check_chain(&layers).map_err(|e| match e {
            CppnError::EmptyModel(_) => CppnError::empty_model(format!("world '{id}' has no layers")),
            CppnError::ShapeMismatch(msg) => CppnError::shape_mismatch(format!("world '{id}': {msg}")),
            other => other,
        })?;
        let out = layers.last().map_or(0, |l| l.out_dim);
        if out < config.image_channels as usize {
            return Err(CppnError::shape_mismatch(format!(
                "world '{id}' final layer has {out} outputs but image_channels is {}",
                config.image_channels
            )));
        }
        Ok(Self {
            id,
            label: label.into(),
            config,
            layers,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    pub fn layers(&self) -> &[LayerSpec] {
        &self.layers
    }

    /// Input width of the first layer.
    pub fn input_dim(&self) -> usize {
        self.layers[0].in_dim
    }

    /// Output width of the final layer.
    pub fn output_dim(&self) -> usize {
        self.layers[self.layers.len() - 1].out_dim
    }

    /// Layer widths `[in0, out0, out1, ...]`.
    pub fn sizes(&self) -> Vec<usize> {
        std::iter::once(self.input_dim())
            .chain(self.layers.iter().map(|l| l.out_dim))
            .collect()
    }
}

/// Top-level persisted artifact: a versioned, ordered list of worlds.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ModelDocument {
    version: u32,
    worlds: Vec<WorldModel>,
}

impl ModelDocument {
    /// Create a current-version document. World ids must be unique.
    pub fn new(worlds: Vec<WorldModel>) -> CppnResult<Self> {
        for (i, w) in worlds.iter().enumerate() {
            if worlds[..i].iter().any(|prev| prev.id == w.id) {
                return Err(CppnError::validation(format!(
                    "duplicate world id '{}'",
                    w.id
                )));
            }
        }
        Ok(Self {
            version: DOCUMENT_VERSION,
            worlds,
        })
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn worlds(&self) -> &[WorldModel] {
        &self.worlds
    }

    /// Look up a world by id.
    pub fn world(&self, id: &str) -> CppnResult<&WorldModel> {
        self.worlds
            .iter()
            .find(|w| w.id == id)
            .ok_or_else(|| CppnError::UnknownWorld(id.to_owned()))
    }

    /// Resolve a selector to worlds in document order.
    pub fn select(&self, selector: &WorldSelector) -> CppnResult<Vec<&WorldModel>> {
        match selector {
            WorldSelector::All => Ok(self.worlds.iter().collect()),
            WorldSelector::One(id) => Ok(vec![self.world(id)?]),
        }
    }
}

/// Which worlds a render request targets.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WorldSelector {
    All,
    One(String),
}

impl std::str::FromStr for WorldSelector {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(if s == "all" {
            Self::All
        } else {
            Self::One(s.to_owned())
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/model/mod.rs"]
mod tests;
