//! Looping sweep clips: planning and rendering.

pub mod plan;
pub mod render;
