//! Feature expansion and forward evaluation.

pub mod evaluator;
pub mod features;
