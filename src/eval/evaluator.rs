use crate::eval::features::{FeatureBuilder, FieldInput};
use crate::foundation::error::{CppnError, CppnResult};
use crate::model::{Activation, LayerSpec, WorldModel};

/// Stateless forward pass over one world's layers.
///
/// Hidden layers apply `sin(w0 · h)`; the final layer's output is returned as raw logits.
/// Holds only shared borrows, so one evaluator can be used from many threads at once.
#[derive(Clone, Copy, Debug)]
pub struct Evaluator<'a> {
    layers: &'a [LayerSpec],
    activation: Activation,
    w0: f32,
}

impl<'a> Evaluator<'a> {
    pub fn new(world: &'a WorldModel) -> Self {
        Self {
            layers: world.layers(),
            activation: world.config().cppn_activation,
            w0: world.config().w0_f32(),
        }
    }

    pub fn input_dim(&self) -> usize {
        self.layers[0].in_dim
    }

    pub fn output_dim(&self) -> usize {
        self.layers[self.layers.len() - 1].out_dim
    }

    /// Evaluate a row-major batch of feature vectors, returning row-major logits.
    pub fn eval_batch(&self, features: &[f32]) -> CppnResult<Vec<f32>> {
        let in_dim = self.input_dim();
        if !features.len().is_multiple_of(in_dim) {
            return Err(CppnError::validation(format!(
                "feature batch of {} values is not a whole number of {in_dim}-wide rows",
                features.len()
            )));
        }
        let rows = features.len() / in_dim;
        let mut out = Vec::with_capacity(rows * self.output_dim());
        let mut scratch = Scratch::default();
        for row in features.chunks_exact(in_dim) {
            out.extend_from_slice(self.forward(row, &mut scratch));
        }
        Ok(out)
    }

    /// Evaluate one feature vector.
    pub fn eval_one(&self, features: &[f32]) -> CppnResult<Vec<f32>> {
        if features.len() != self.input_dim() {
            return Err(CppnError::FeatureDimensionMismatch {
                built: features.len(),
                expected: self.input_dim(),
            });
        }
        let mut scratch = Scratch::default();
        Ok(self.forward(features, &mut scratch).to_vec())
    }

    /// Expand and evaluate a batch of points with `features`.
    pub fn eval_points(
        &self,
        features: &FeatureBuilder,
        points: &[FieldInput],
    ) -> CppnResult<Vec<f32>> {
        features.check_len(self.input_dim())?;
        let in_dim = self.input_dim();
        let mut row = Vec::with_capacity(in_dim);
        let mut out = Vec::with_capacity(points.len() * self.output_dim());
        let mut scratch = Scratch::default();
        for p in points {
            row.clear();
            features.push(p, &mut row);
            out.extend_from_slice(self.forward(&row, &mut scratch));
        }
        Ok(out)
    }

    fn forward<'s>(&self, input: &[f32], scratch: &'s mut Scratch) -> &'s [f32] {
        let Scratch { a, b } = scratch;
        a.clear();
        a.extend_from_slice(input);
        let last = self.layers.len() - 1;
        for (i, layer) in self.layers.iter().enumerate() {
            affine(layer, a, b);
            if i < last {
                self.activate(b);
            }
            std::mem::swap(a, b);
        }
        a.as_slice()
    }

    fn activate(&self, h: &mut [f32]) {
        match self.activation {
            Activation::Sin => {
                for v in h {
                    *v = (self.w0 * *v).sin();
                }
            }
        }
    }
}

#[derive(Default)]
struct Scratch {
    a: Vec<f32>,
    b: Vec<f32>,
}

fn affine(layer: &LayerSpec, h: &[f32], out: &mut Vec<f32>) {
    out.clear();
    out.extend((0..layer.out_dim).map(|o| {
        let dot: f32 = layer.row(o).iter().zip(h).map(|(w, x)| w * x).sum();
        dot + layer.bias[o]
    }));
}

/// Logistic squashing applied to logits before quantization.
pub fn sigmoid(v: f32) -> f32 {
    1.0 / (1.0 + (-v).exp())
}

#[cfg(test)]
#[path = "../../tests/unit/eval/evaluator.rs"]
mod tests;
