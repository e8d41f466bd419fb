use super::*;
use serde_json::json;

fn map(v: Value) -> Map<String, Value> {
    v.as_object().cloned().unwrap()
}

#[test]
fn empty_map_yields_documented_defaults() {
    let cfg = normalize_config(&Map::new());
    assert_eq!(cfg.cppn_activation, Activation::Sin);
    assert_eq!(cfg.cppn_sin_w0, 1.0);
    assert!(!cfg.cppn_coord_use_fourier_xy);
    assert!(!cfg.cppn_coord_use_radial);
    assert_eq!(cfg.cppn_coord_fourier_bands, vec![1, 2]);
    assert_eq!(cfg.cppn_coord_radial_powers, vec![1, 2]);
    assert_eq!(cfg.image_channels, 3);
    assert_eq!(cfg.param_seed_dim, 16);
    assert_eq!(cfg, ModelConfig::default());
}

#[test]
fn recognized_keys_are_taken_and_unknown_keys_ignored() {
    let cfg = normalize_config(&map(json!({
        "cppn_sin_w0": 30,
        "cppn_coord_use_fourier_xy": true,
        "cppn_coord_fourier_bands": [1, 4, 8],
        "image_channels": 1,
        "learning_rate": 0.001,
        "epochs": 400
    })));
    assert_eq!(cfg.cppn_sin_w0, 30.0);
    assert!(cfg.cppn_coord_use_fourier_xy);
    assert_eq!(cfg.cppn_coord_fourier_bands, vec![1, 4, 8]);
    assert_eq!(cfg.image_channels, 1);
    assert_eq!(cfg.cppn_coord_radial_powers, vec![1, 2]);
}

#[test]
fn wrong_shapes_fall_back_to_defaults() {
    let cfg = normalize_config(&map(json!({
        "cppn_activation": "relu",
        "cppn_sin_w0": "fast",
        "cppn_coord_use_radial": 1,
        "cppn_coord_fourier_bands": [1, -2],
        "cppn_coord_radial_powers": "1,2",
        "image_channels": 4,
        "param_seed_dim": 0
    })));
    assert_eq!(cfg, ModelConfig::default());
}

#[test]
fn normalization_is_idempotent() {
    let once = normalize_config(&map(json!({
        "cppn_sin_w0": 2.5,
        "cppn_coord_use_radial": true,
        "cppn_coord_radial_powers": [3],
        "image_channels": 1,
        "param_seed_dim": 8
    })));
    let serialized = serde_json::to_value(&once).unwrap();
    let twice = normalize_config(serialized.as_object().unwrap());
    assert_eq!(once, twice);
}

#[test]
fn deserialize_goes_through_normalizer() {
    let cfg: ModelConfig = serde_json::from_str(r#"{"cppn_activation":"sin","extra":null}"#).unwrap();
    assert_eq!(cfg, ModelConfig::default());
}

#[test]
fn serialized_keys_follow_document_order() {
    let s = serde_json::to_string(&ModelConfig::default()).unwrap();
    assert_eq!(
        s,
        r#"{"cppn_activation":"sin","cppn_sin_w0":1.0,"cppn_coord_use_fourier_xy":false,"cppn_coord_use_radial":false,"cppn_coord_fourier_bands":[1,2],"cppn_coord_radial_powers":[1,2],"image_channels":3,"param_seed_dim":16}"#
    );
}
