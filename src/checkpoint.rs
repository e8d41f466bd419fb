//! Checkpoint boundary: the training toolchain's key -> tensor parameter store and the rule for
//! reading layers out of it.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Context as _;
use serde::{Deserialize, Serialize};

use crate::foundation::error::{CppnError, CppnResult};
use crate::model::{LayerSpec, check_chain};

/// Dense `f32` tensor with a row-major shape.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Tensor {
    pub shape: Vec<usize>,
    pub data: Vec<f32>,
}

impl Tensor {
    pub fn new(shape: Vec<usize>, data: Vec<f32>) -> CppnResult<Self> {
        let t = Self { shape, data };
        t.check_len()?;
        Ok(t)
    }

    fn check_len(&self) -> CppnResult<()> {
        let expected: usize = self.shape.iter().product();
        if expected != self.data.len() {
            return Err(CppnError::checkpoint(format!(
                "tensor of shape {:?} holds {} values, expected {expected}",
                self.shape,
                self.data.len()
            )));
        }
        Ok(())
    }
}

/// Read-only view of a native parameter store.
pub trait ParamStore {
    fn tensor(&self, key: &str) -> Option<&Tensor>;
}

impl ParamStore for BTreeMap<String, Tensor> {
    fn tensor(&self, key: &str) -> Option<&Tensor> {
        self.get(key)
    }
}

impl ParamStore for std::collections::HashMap<String, Tensor> {
    fn tensor(&self, key: &str) -> Option<&Tensor> {
        self.get(key)
    }
}

/// Checkpoint as exchanged on disk: `{"MLP.0.weight": {"shape": [..], "data": [..]}, ...}`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TensorMap(pub BTreeMap<String, Tensor>);

impl TensorMap {
    pub fn from_json_slice(bytes: &[u8]) -> CppnResult<Self> {
        let map: Self = serde_json::from_slice(bytes)
            .map_err(|e| CppnError::checkpoint(format!("parse tensor map: {e}")))?;
        for (key, t) in &map.0 {
            t.check_len()
                .map_err(|e| CppnError::checkpoint(format!("'{key}': {e}")))?;
        }
        Ok(map)
    }

    pub fn read(path: &Path) -> CppnResult<Self> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("read checkpoint '{}'", path.display()))?;
        Self::from_json_slice(&bytes)
    }

    pub fn insert(&mut self, key: impl Into<String>, tensor: Tensor) {
        self.0.insert(key.into(), tensor);
    }
}

impl ParamStore for TensorMap {
    fn tensor(&self, key: &str) -> Option<&Tensor> {
        self.0.get(key)
    }
}

/// Where the affine sub-modules of a sequential container live.
///
/// The container alternates a parametrized affine module with a parameter-free activation, so
/// parameters appear at `start, start + step, start + 2*step, ...`. The first index without a
/// weight ends the sequence.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LayerRule {
    pub container: String,
    pub start: usize,
    pub step: usize,
}

impl LayerRule {
    pub const DEFAULT_CONTAINER: &'static str = "MLP";

    pub fn new(container: impl Into<String>) -> Self {
        Self {
            container: container.into(),
            start: 0,
            step: 2,
        }
    }

    pub fn weight_key(&self, index: usize) -> String {
        format!("{}.{index}.weight", self.container)
    }

    pub fn bias_key(&self, index: usize) -> String {
        format!("{}.{index}.bias", self.container)
    }

    /// Parameter indices in order: `start, start + step, ...`.
    pub fn indices(&self) -> impl Iterator<Item = usize> {
        (self.start..).step_by(self.step.max(1))
    }
}

impl Default for LayerRule {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CONTAINER)
    }
}

/// Read the ordered layer sequence out of `store`.
///
/// `in = weight.shape[1]`, `out = weight.shape[0]`, weight flattened row-major as stored.
pub fn extract_layers(store: &dyn ParamStore, rule: &LayerRule) -> CppnResult<Vec<LayerSpec>> {
    let mut layers = Vec::new();
    for idx in rule.indices() {
        let w_key = rule.weight_key(idx);
        let Some(weight) = store.tensor(&w_key) else {
            break;
        };
        let b_key = rule.bias_key(idx);
        let bias = store
            .tensor(&b_key)
            .ok_or_else(|| CppnError::checkpoint(format!("'{w_key}' present but '{b_key}' missing")))?;

        let &[out_dim, in_dim] = weight.shape.as_slice() else {
            return Err(CppnError::checkpoint(format!(
                "'{w_key}' must be 2-D, got shape {:?}",
                weight.shape
            )));
        };
        if bias.data.len() != out_dim {
            return Err(CppnError::checkpoint(format!(
                "'{b_key}' has {} values, expected {out_dim}",
                bias.data.len()
            )));
        }
        layers.push(LayerSpec::new(
            in_dim,
            out_dim,
            weight.data.clone(),
            bias.data.clone(),
        )?);
    }

    if layers.is_empty() {
        return Err(CppnError::empty_model(format!(
            "no '{}' found in checkpoint",
            rule.weight_key(rule.start)
        )));
    }
    check_chain(&layers)?;
    tracing::debug!(container = %rule.container, layers = layers.len(), "extracted layers");
    Ok(layers)
}

#[cfg(test)]
#[path = "../tests/unit/checkpoint.rs"]
mod tests;
