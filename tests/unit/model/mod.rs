use super::*;

fn zeros(in_dim: usize, out_dim: usize) -> LayerSpec {
    LayerSpec::new(in_dim, out_dim, vec![0.0; in_dim * out_dim], vec![0.0; out_dim]).unwrap()
}

#[test]
fn layer_rejects_bad_lengths() {
    assert!(matches!(
        LayerSpec::new(2, 2, vec![0.0; 3], vec![0.0; 2]),
        Err(CppnError::ShapeMismatch(_))
    ));
    assert!(matches!(
        LayerSpec::new(2, 2, vec![0.0; 4], vec![0.0; 1]),
        Err(CppnError::ShapeMismatch(_))
    ));
    assert!(matches!(
        LayerSpec::new(1, 1, vec![f32::NAN], vec![0.0]),
        Err(CppnError::Validation(_))
    ));
}

#[test]
fn row_is_output_major() {
    let l = LayerSpec::new(3, 2, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], vec![0.0; 2]).unwrap();
    assert_eq!(l.row(0), &[1.0, 2.0, 3.0]);
    assert_eq!(l.row(1), &[4.0, 5.0, 6.0]);
}

#[test]
fn world_requires_chained_layers() {
    let err = WorldModel::new("w", "W", ModelConfig::default(), vec![zeros(8, 4), zeros(5, 3)])
        .unwrap_err();
    assert!(matches!(err, CppnError::ShapeMismatch(_)));
    assert!(err.to_string().contains("world 'w'"));

    let ok = WorldModel::new("w", "W", ModelConfig::default(), vec![zeros(8, 4), zeros(4, 3)])
        .unwrap();
    assert_eq!(ok.sizes(), vec![8, 4, 3]);
    assert_eq!(ok.input_dim(), 8);
    assert_eq!(ok.output_dim(), 3);
}

#[test]
fn world_without_layers_is_empty_model() {
    let err = WorldModel::new("w", "W", ModelConfig::default(), vec![]).unwrap_err();
    assert!(matches!(err, CppnError::EmptyModel(_)));
}

#[test]
fn final_layer_must_cover_image_channels() {
    let err = WorldModel::new("w", "W", ModelConfig::default(), vec![zeros(8, 1)]).unwrap_err();
    assert!(matches!(err, CppnError::ShapeMismatch(_)));

    let cfg = ModelConfig {
        image_channels: 1,
        ..ModelConfig::default()
    };
    assert!(WorldModel::new("w", "W", cfg, vec![zeros(8, 1)]).is_ok());
}

#[test]
fn document_lookup_and_selection() {
    let a = WorldModel::new("a", "A", ModelConfig::default(), vec![zeros(8, 3)]).unwrap();
    let b = WorldModel::new("b", "B", ModelConfig::default(), vec![zeros(8, 3)]).unwrap();
    let doc = ModelDocument::new(vec![a, b]).unwrap();
    assert_eq!(doc.version(), DOCUMENT_VERSION);
    assert_eq!(doc.world("b").unwrap().label(), "B");
    assert!(matches!(doc.world("c"), Err(CppnError::UnknownWorld(id)) if id == "c"));

    let all = doc.select(&"all".parse().unwrap()).unwrap();
    assert_eq!(all.iter().map(|w| w.id()).collect::<Vec<_>>(), vec!["a", "b"]);
    let one = doc.select(&WorldSelector::One("a".to_owned())).unwrap();
    assert_eq!(one.len(), 1);
}

#[test]
fn document_rejects_duplicate_ids() {
    let a = WorldModel::new("a", "A", ModelConfig::default(), vec![zeros(8, 3)]).unwrap();
    assert!(ModelDocument::new(vec![a.clone(), a]).is_err());
}
