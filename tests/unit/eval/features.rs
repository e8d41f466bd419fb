use super::*;
use crate::model::LayerSpec;

fn cfg(fourier: bool, bands: Vec<u32>, radial: bool, powers: Vec<u32>) -> ModelConfig {
    ModelConfig {
        cppn_coord_use_fourier_xy: fourier,
        cppn_coord_fourier_bands: bands,
        cppn_coord_use_radial: radial,
        cppn_coord_radial_powers: powers,
        ..ModelConfig::default()
    }
}

fn point() -> FieldInput {
    FieldInput {
        x: 0.5,
        y: -1.0,
        z: 2.0,
        latent: [0.1, 0.2, 0.3, 0.4, 0.5],
    }
}

#[test]
fn base_order_is_coords_then_latents() {
    let fb = FeatureBuilder::new(&ModelConfig::default());
    assert_eq!(fb.feature_len(), 8);
    assert_eq!(
        fb.build(&point()),
        vec![0.5, -1.0, 2.0, 0.1, 0.2, 0.3, 0.4, 0.5]
    );
}

#[test]
fn disabled_expansions_ignore_their_lists() {
    let fb = FeatureBuilder::new(&cfg(false, vec![1, 2, 3], false, vec![1, 2, 3, 4]));
    assert_eq!(fb.feature_len(), 8);
}

#[test]
fn fourier_block_per_band_in_listed_order() {
    let fb = FeatureBuilder::new(&cfg(true, vec![3, 1], false, vec![]));
    let f = fb.build(&point());
    assert_eq!(f.len(), 16);
    let (x, y) = (0.5f32, -1.0f32);
    assert_eq!(
        &f[8..12],
        &[(3.0 * x).sin(), (3.0 * x).cos(), (3.0 * y).sin(), (3.0 * y).cos()]
    );
    assert_eq!(&f[12..16], &[x.sin(), x.cos(), y.sin(), y.cos()]);
}

#[test]
fn radial_powers_follow_fourier() {
    let fb = FeatureBuilder::new(&cfg(true, vec![1], true, vec![2, 1]));
    let f = fb.build(&point());
    assert_eq!(f.len(), 8 + 4 + 2);
    let r = (0.25f32 + 1.0 + 4.0).sqrt();
    assert_eq!(f[12], r.powi(2));
    assert_eq!(f[13], r);
}

#[test]
fn length_formula_holds() {
    for (bands, powers) in [(0usize, 0usize), (1, 0), (0, 3), (2, 2), (5, 1)] {
        for fourier in [false, true] {
            for radial in [false, true] {
                let c = cfg(
                    fourier,
                    (1..=bands as u32).collect(),
                    radial,
                    (1..=powers as u32).collect(),
                );
                let fb = FeatureBuilder::new(&c);
                let expected = 8
                    + if fourier { 4 * bands } else { 0 }
                    + if radial { powers } else { 0 };
                assert_eq!(fb.feature_len(), expected);
                assert_eq!(fb.build(&point()).len(), expected);
            }
        }
    }
}

#[test]
fn batch_rows_are_contiguous() {
    let fb = FeatureBuilder::new(&ModelConfig::default());
    let a = point();
    let b = a.at(0.0, 0.0);
    let batch = fb.build_batch(&[a, b]);
    assert_eq!(batch.len(), 16);
    assert_eq!(&batch[8..11], &[0.0, 0.0, 2.0]);
}

#[test]
fn mismatched_first_layer_is_rejected() {
    let layer = LayerSpec::new(12, 3, vec![0.0; 36], vec![0.0; 3]).unwrap();
    let world = WorldModel::new("w", "W", ModelConfig::default(), vec![layer]).unwrap();
    assert!(matches!(
        FeatureBuilder::for_world(&world),
        Err(CppnError::FeatureDimensionMismatch {
            built: 8,
            expected: 12
        })
    ));
}

#[test]
fn from_base_maps_slots() {
    let p = FieldInput::from_base(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0]);
    assert_eq!((p.x, p.y, p.z), (1.0, 2.0, 3.0));
    assert_eq!(p.latent, [4.0, 5.0, 6.0, 7.0, 8.0]);
    assert_eq!(BASE_FEATURES[7], "latent4");
}
