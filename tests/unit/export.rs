use super::*;
use crate::checkpoint::Tensor;
use serde_json::json;

fn store() -> TensorMap {
    let mut s = TensorMap::default();
    s.insert("MLP.0.weight", Tensor::new(vec![4, 8], vec![0.5; 32]).unwrap());
    s.insert("MLP.0.bias", Tensor::new(vec![4], vec![0.0; 4]).unwrap());
    s.insert("MLP.2.weight", Tensor::new(vec![3, 4], vec![-0.5; 12]).unwrap());
    s.insert("MLP.2.bias", Tensor::new(vec![3], vec![0.1; 3]).unwrap());
    s
}

#[test]
fn build_world_combines_layers_and_config() {
    let cfg = json!({"cppn_sin_w0": 3.0, "optimizer": "adam"});
    let w = build_world(
        "redpurple",
        "Red and Purple",
        &store(),
        cfg.as_object().unwrap(),
        &LayerRule::default(),
    )
    .unwrap();
    assert_eq!(w.id(), "redpurple");
    assert_eq!(w.sizes(), vec![8, 4, 3]);
    assert_eq!(w.config().cppn_sin_w0, 3.0);
}

#[test]
fn build_world_names_the_world_on_failure() {
    let err = build_world(
        "blackwhite",
        "Black and White",
        &TensorMap::default(),
        &Map::new(),
        &LayerRule::default(),
    )
    .unwrap_err();
    assert!(matches!(err, CppnError::EmptyModel(_)));
    assert!(err.to_string().contains("blackwhite"));
}

#[test]
fn manifest_defaults_container() {
    let m: ExportManifest = serde_json::from_value(json!({
        "worlds": [{"id": "trip", "label": "Trip", "checkpoint": "t.json", "config": "c.json"}]
    }))
    .unwrap();
    assert_eq!(m.container, "MLP");
    assert_eq!(m.worlds[0].checkpoint, PathBuf::from("t.json"));
}

#[test]
fn export_document_reads_files() {
    let dir = std::env::temp_dir().join(format!("cppnfield_export_{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("ckpt.json"), serde_json::to_vec(&store()).unwrap()).unwrap();
    std::fs::write(dir.join("cfg.json"), br#"{"image_channels": 3}"#).unwrap();
    let manifest = ExportManifest {
        container: "MLP".to_owned(),
        worlds: vec![WorldSource {
            id: "trip".to_owned(),
            label: "Trip".to_owned(),
            checkpoint: "ckpt.json".into(),
            config: "cfg.json".into(),
        }],
    };
    let doc = export_document(&manifest, &dir).unwrap();
    assert_eq!(doc.worlds().len(), 1);
    assert_eq!(doc.world("trip").unwrap().layers().len(), 2);
    let _ = std::fs::remove_dir_all(&dir);
}
