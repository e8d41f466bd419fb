//! Compact, deterministic encoding of a [`ModelDocument`].
//!
//! Keys are written in declaration order with no whitespace, so re-exporting unchanged inputs
//! yields byte-identical output. `f32` parameters are written as their shortest round-tripping
//! decimal form and decode to the same bit pattern.

use std::path::Path;

use anyhow::Context as _;
use serde::Deserialize;
use serde_json::Value;

use crate::foundation::error::{CppnError, CppnResult};
use crate::model::{DOCUMENT_VERSION, ModelDocument, WorldModel, WorldModelDef};

/// `version` is checked on the raw value before this is parsed.
#[derive(Deserialize)]
struct ModelDocumentDef {
    worlds: Vec<WorldModelDef>,
}

/// Encode a document as compact UTF-8 JSON.
pub fn encode_document(doc: &ModelDocument) -> CppnResult<Vec<u8>> {
    serde_json::to_vec(doc).map_err(|e| CppnError::Other(anyhow::Error::new(e)))
}

/// Decode and validate a document.
///
/// The version is checked before `worlds` is interpreted. Structural problems are
/// [`CppnError::MalformedDocument`]; layer chains that do not connect are
/// [`CppnError::ShapeMismatch`].
pub fn decode_document(bytes: &[u8]) -> CppnResult<ModelDocument> {
    let value: Value = serde_json::from_slice(bytes)
        .map_err(|e| CppnError::malformed(format!("invalid JSON: {e}")))?;
    let obj = value
        .as_object()
        .ok_or_else(|| CppnError::malformed("top level must be an object"))?;

    let version = obj
        .get("version")
        .ok_or_else(|| CppnError::malformed("missing 'version'"))?;
    let version = version
        .as_i64()
        .map(i128::from)
        .or_else(|| version.as_u64().map(i128::from))
        .ok_or_else(|| CppnError::malformed(format!("'version' must be an integer, got {version}")))?;
    if version != i128::from(DOCUMENT_VERSION) {
        return Err(CppnError::UnsupportedVersion {
            found: version,
            supported: DOCUMENT_VERSION,
        });
    }
    if !obj.contains_key("worlds") {
        return Err(CppnError::malformed("missing 'worlds'"));
    }

    let def: ModelDocumentDef =
        serde_json::from_value(value).map_err(|e| CppnError::malformed(e.to_string()))?;
    let worlds = def
        .worlds
        .into_iter()
        .map(|def| {
            WorldModel::try_from(def).map_err(|e| match e {
                CppnError::Validation(msg) => CppnError::malformed(msg),
                other => other,
            })
        })
        .collect::<CppnResult<Vec<_>>>()?;
    ModelDocument::new(worlds).map_err(|e| match e {
        CppnError::Validation(msg) => CppnError::malformed(msg),
        other => other,
    })
}

/// Read and decode a document file.
pub fn read_document(path: &Path) -> CppnResult<ModelDocument> {
    let bytes =
        std::fs::read(path).with_context(|| format!("read model document '{}'", path.display()))?;
    let doc = decode_document(&bytes)?;
    tracing::info!(path = %path.display(), worlds = doc.worlds().len(), "loaded model document");
    Ok(doc)
}

/// Encode and write a document file, creating the parent directory if needed.
pub fn write_document(doc: &ModelDocument, path: &Path) -> CppnResult<()> {
    let bytes = encode_document(doc)?;
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output directory '{}'", parent.display()))?;
    }
    std::fs::write(path, &bytes).with_context(|| format!("write '{}'", path.display()))?;
    tracing::info!(path = %path.display(), bytes = bytes.len(), "wrote model document");
    Ok(())
}

#[cfg(test)]
#[path = "../tests/unit/serialize.rs"]
mod tests;
