//! Export: frozen checkpoints plus sparse training configs into one [`ModelDocument`].

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::checkpoint::{LayerRule, ParamStore, TensorMap, extract_layers};
use crate::foundation::error::{CppnError, CppnResult};
use crate::model::{ModelDocument, WorldModel, normalize_config};

/// One world to export. Paths are relative to the manifest.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldSource {
    pub id: String,
    pub label: String,
    pub checkpoint: PathBuf,
    pub config: PathBuf,
}

/// List of worlds to export, in document order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportManifest {
    /// Name of the sequential container in the checkpoint keys.
    #[serde(default = "default_container")]
    pub container: String,
    pub worlds: Vec<WorldSource>,
}

fn default_container() -> String {
    LayerRule::DEFAULT_CONTAINER.to_owned()
}

impl ExportManifest {
    pub fn read(path: &Path) -> CppnResult<Self> {
        let bytes =
            std::fs::read(path).with_context(|| format!("read manifest '{}'", path.display()))?;
        serde_json::from_slice(&bytes)
            .with_context(|| format!("parse manifest '{}'", path.display()))
            .map_err(CppnError::from)
    }
}

/// Build one world from an in-memory parameter store and raw config map.
pub fn build_world(
    id: &str,
    label: &str,
    store: &dyn ParamStore,
    config: &Map<String, Value>,
    rule: &LayerRule,
) -> CppnResult<WorldModel> {
    let layers = extract_layers(store, rule).map_err(|e| match e {
        CppnError::EmptyModel(msg) => CppnError::empty_model(format!("world '{id}': {msg}")),
        CppnError::ShapeMismatch(msg) => CppnError::shape_mismatch(format!("world '{id}': {msg}")),
        other => other,
    })?;
    WorldModel::new(id, label, normalize_config(config), layers)
}

/// Read a sparse config file. A missing file or non-object top level is an error; keys inside
/// are normalized leniently.
pub fn read_config_map(path: &Path) -> CppnResult<Map<String, Value>> {
    let bytes = std::fs::read(path).with_context(|| format!("read config '{}'", path.display()))?;
    let value: Value = serde_json::from_slice(&bytes)
        .with_context(|| format!("parse config '{}'", path.display()))?;
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(CppnError::validation(format!(
            "config '{}' must be a JSON object",
            path.display()
        ))),
    }
}

/// Load every world in `manifest` (paths resolved against `root`) into a document.
pub fn export_document(manifest: &ExportManifest, root: &Path) -> CppnResult<ModelDocument> {
    let rule = LayerRule::new(manifest.container.clone());
    let mut worlds = Vec::with_capacity(manifest.worlds.len());
    for src in &manifest.worlds {
        let store = TensorMap::read(&root.join(&src.checkpoint))?;
        let config = read_config_map(&root.join(&src.config))?;
        let world = build_world(&src.id, &src.label, &store, &config, &rule)?;
        tracing::info!(world = %src.id, sizes = ?world.sizes(), "exported world");
        worlds.push(world);
    }
    ModelDocument::new(worlds)
}

#[cfg(test)]
#[path = "../tests/unit/export.rs"]
mod tests;
