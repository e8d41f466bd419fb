//! Portable interchange format and deterministic evaluator for small coordinate-conditioned
//! neural fields (CPPNs).
//!
//! - Export: [`extract_layers`] + [`normalize_config`] build [`WorldModel`]s, packaged into a
//!   versioned [`ModelDocument`] by [`encode_document`].
//! - Evaluate: [`decode_document`], then [`FeatureBuilder`] + [`Evaluator`] reproduce the
//!   training-time forward pass.
//! - Render: [`ClipJob`] sweeps one input dimension through a seamless loop and streams the
//!   frames, in order, into a [`FrameSink`] such as [`FfmpegSink`].
#![forbid(unsafe_code)]

mod foundation;

pub mod checkpoint;
pub mod encode;
pub mod eval;
pub mod export;
pub mod model;
pub mod serialize;
pub mod sweep;

pub use crate::foundation::core::{Canvas, Fps, FrameIndex};
pub use crate::foundation::error::{CppnError, CppnResult};

pub use crate::checkpoint::{LayerRule, ParamStore, Tensor, TensorMap, extract_layers};
pub use crate::encode::ffmpeg::{FfmpegSink, FfmpegSinkOpts, is_ffmpeg_on_path};
pub use crate::encode::sink::{FrameRgb, FrameSink, InMemorySink, SinkConfig};
pub use crate::eval::evaluator::{Evaluator, sigmoid};
pub use crate::eval::features::{
    BASE_FEATURE_LEN, BASE_FEATURES, FeatureBuilder, FieldInput, LATENT_SLOTS,
};
pub use crate::export::{ExportManifest, WorldSource, build_world, export_document};
pub use crate::model::{
    Activation, DOCUMENT_VERSION, LayerSpec, ModelConfig, ModelDocument, WorldModel,
    WorldSelector, normalize_config,
};
pub use crate::serialize::{decode_document, encode_document, read_document, write_document};
pub use crate::sweep::plan::{
    ClipSpec, SweepDim, SweepState, choose_sweep_plan, clip_seed, plan_clips,
};
pub use crate::sweep::render::{
    ClipJob, ClipReport, ClipState, CoordGrid, FrameStage, RenderThreading, SweepOpts,
    SweepRenderer, channel_to_u8, linspace, logits_to_rgb, run_clip,
};
