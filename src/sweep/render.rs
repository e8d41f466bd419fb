use rayon::prelude::*;

use crate::encode::sink::{FrameRgb, FrameSink, SinkConfig};
use crate::eval::evaluator::{Evaluator, sigmoid};
use crate::eval::features::{FeatureBuilder, FieldInput};
use crate::foundation::core::{Canvas, Fps, FrameIndex};
use crate::foundation::error::{CppnError, CppnResult};
use crate::model::{ModelDocument, WorldModel};
use crate::sweep::plan::{ClipSpec, SweepDim, SweepState};

/// Threading and chunking controls for multi-frame rendering.
#[derive(Clone, Debug)]
pub struct RenderThreading {
    /// Render the frames of a chunk in parallel when `true`.
    pub parallel: bool,
    /// Frames per chunk. Chunks are computed together and then written in order.
    pub chunk_size: usize,
    /// Optional explicit worker thread count.
    pub threads: Option<usize>,
}

impl Default for RenderThreading {
    fn default() -> Self {
        Self {
            parallel: true,
            chunk_size: 16,
            threads: None,
        }
    }
}

/// Render policy for sweep clips.
#[derive(Clone, Debug)]
pub struct SweepOpts {
    pub canvas: Canvas,
    pub fps: Fps,
    /// Frames per clip. Frame `frames` would repeat frame 0.
    pub frames: u64,
    /// Pixel coordinates span `[-xy_range, xy_range]` on both axes.
    pub xy_range: f32,
    pub sweep_amplitude: f64,
    pub threading: RenderThreading,
}

impl Default for SweepOpts {
    fn default() -> Self {
        let fps = Fps::default();
        Self {
            canvas: Canvas::square(256),
            fps,
            frames: fps.frames_for_secs(6.0),
            xy_range: 2.6,
            sweep_amplitude: 1.25,
            threading: RenderThreading::default(),
        }
    }
}

impl SweepOpts {
    fn validate(&self) -> CppnResult<()> {
        if self.canvas.width == 0 || self.canvas.height == 0 {
            return Err(CppnError::validation("frame size must be non-zero"));
        }
        if self.frames < 2 {
            return Err(CppnError::validation("a clip needs at least 2 frames"));
        }
        if !self.xy_range.is_finite() || !self.sweep_amplitude.is_finite() {
            return Err(CppnError::validation("xy_range and sweep_amplitude must be finite"));
        }
        Ok(())
    }
}

/// `n` evenly spaced values from `start` to `end` inclusive.
///
/// The first half steps forward from `start` and the second half steps back from `end`, so both
/// endpoints are exact and the grid is symmetric.
pub fn linspace(start: f32, end: f32, n: usize) -> Vec<f32> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (n - 1) as f32;
            let half = n / 2;
            (0..n)
                .map(|i| {
                    if i < half {
                        start + step * i as f32
                    } else {
                        end - step * (n - 1 - i) as f32
                    }
                })
                .collect()
        }
    }
}

/// Screen pixel to field coordinate mapping.
#[derive(Clone, Debug, PartialEq)]
pub struct CoordGrid {
    /// One entry per column.
    pub xs: Vec<f32>,
    /// One entry per row.
    pub ys: Vec<f32>,
}

impl CoordGrid {
    pub fn new(canvas: Canvas, xy_range: f32) -> Self {
        Self {
            xs: linspace(-xy_range, xy_range, canvas.width as usize),
            ys: linspace(-xy_range, xy_range, canvas.height as usize),
        }
    }

    /// Row-major points for a frame, `x`/`y` from the grid and everything else from `base`.
    pub fn points(&self, base: FieldInput) -> impl Iterator<Item = FieldInput> + '_ {
        self.ys
            .iter()
            .flat_map(move |&y| self.xs.iter().map(move |&x| base.at(x, y)))
    }
}

/// Quantize one logit: `floor(clamp(sigmoid(v), 0, 1) · 255)`.
pub fn channel_to_u8(logit: f32) -> u8 {
    // `as u8` truncates toward zero and saturates.
    (sigmoid(logit).clamp(0.0, 1.0) * 255.0) as u8
}

/// Map row-major logits (`out_dim` per pixel) to packed RGB8.
///
/// Single-channel worlds replicate channel 0 across RGB; otherwise the first three outputs are
/// used as R, G and B.
pub fn logits_to_rgb(logits: &[f32], out_dim: usize, channels: u32, dst: &mut Vec<u8>) {
    for px in logits.chunks_exact(out_dim) {
        if channels == 1 {
            let g = channel_to_u8(px[0]);
            dst.extend_from_slice(&[g, g, g]);
        } else {
            dst.extend(px[..3].iter().map(|&v| channel_to_u8(v)));
        }
    }
}

/// Renders sweep frames for one world.
///
/// Holds only shared state; `render_frame` may be called from many threads.
#[derive(Clone, Debug)]
pub struct SweepRenderer<'a> {
    world: &'a WorldModel,
    features: FeatureBuilder,
    evaluator: Evaluator<'a>,
    grid: CoordGrid,
    opts: SweepOpts,
}

impl<'a> SweepRenderer<'a> {
    pub fn new(world: &'a WorldModel, opts: SweepOpts) -> CppnResult<Self> {
        opts.validate()?;
        let features = FeatureBuilder::for_world(world)?;
        Ok(Self {
            world,
            features,
            evaluator: Evaluator::new(world),
            grid: CoordGrid::new(opts.canvas, opts.xy_range),
            opts,
        })
    }

    pub fn world(&self) -> &WorldModel {
        self.world
    }

    pub fn opts(&self) -> &SweepOpts {
        &self.opts
    }

    /// Fixed random state for `clip`.
    pub fn sweep_state(&self, clip: &ClipSpec) -> SweepState {
        SweepState::sample(clip.sweep, clip.seed, self.opts.sweep_amplitude)
    }

    /// Row-major feature batch for every pixel of frame `idx`.
    pub fn frame_features(&self, state: &SweepState, idx: FrameIndex) -> Vec<f32> {
        let base = state.input_at(idx.0, self.opts.frames);
        let mut out = Vec::with_capacity(self.opts.canvas.pixels() * self.features.feature_len());
        for p in self.grid.points(base) {
            self.features.push(&p, &mut out);
        }
        out
    }

    /// Raw logits for a feature batch.
    pub fn evaluate(&self, features: &[f32]) -> CppnResult<Vec<f32>> {
        self.evaluator.eval_batch(features)
    }

    /// Squash and pack logits into a frame.
    pub fn frame_from_logits(&self, logits: &[f32]) -> CppnResult<FrameRgb> {
        let mut data = Vec::with_capacity(self.opts.canvas.rgb_len());
        logits_to_rgb(
            logits,
            self.evaluator.output_dim(),
            self.world.config().image_channels,
            &mut data,
        );
        FrameRgb::new(self.opts.canvas.width, self.opts.canvas.height, data)
    }

    /// Features, evaluation and quantization for one frame.
    pub fn render_frame(&self, state: &SweepState, idx: FrameIndex) -> CppnResult<FrameRgb> {
        let features = self.frame_features(state, idx);
        let logits = self.evaluate(&features)?;
        self.frame_from_logits(&logits)
    }

    fn sink_config(&self) -> SinkConfig {
        SinkConfig {
            width: self.opts.canvas.width,
            height: self.opts.canvas.height,
            fps: self.opts.fps,
        }
    }
}

/// Per-frame pipeline stage.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameStage {
    BuildingFeatures,
    Evaluating,
    EncodingFrame,
}

/// Lifecycle of one clip render.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClipState {
    Idle,
    LoadingModel,
    RenderingFrames { frame: FrameIndex, stage: FrameStage },
    Completed,
    Failed,
}

impl ClipState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Whether `self -> next` is a legal step.
    ///
    /// Every frame passes through features, evaluation and encoding before the next frame
    /// index starts.
    pub fn can_advance_to(self, next: ClipState) -> bool {
        use ClipState::*;
        use FrameStage::*;
        match (self, next) {
            (Idle, LoadingModel) => true,
            (LoadingModel, Failed) => true,
            (
                LoadingModel,
                RenderingFrames {
                    stage: BuildingFeatures,
                    ..
                },
            ) => true,
            (RenderingFrames { .. }, Failed) => true,
            (
                RenderingFrames {
                    frame: a,
                    stage: BuildingFeatures,
                },
                RenderingFrames {
                    frame: b,
                    stage: Evaluating,
                },
            ) => a == b,
            (
                RenderingFrames {
                    frame: a,
                    stage: Evaluating,
                },
                RenderingFrames {
                    frame: b,
                    stage: EncodingFrame,
                },
            ) => a == b,
            (
                RenderingFrames {
                    frame: a,
                    stage: EncodingFrame,
                },
                RenderingFrames {
                    frame: b,
                    stage: BuildingFeatures,
                },
            ) => b > a,
            (
                RenderingFrames {
                    stage: EncodingFrame,
                    ..
                },
                Completed,
            ) => true,
            _ => false,
        }
    }
}

/// Outcome of a finished clip.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClipReport {
    pub world_id: String,
    pub clip: u32,
    pub sweep: SweepDim,
    pub frames_written: u64,
    pub state: ClipState,
}

/// One clip of one world, driven through [`ClipState`] into a [`FrameSink`].
#[derive(Debug)]
pub struct ClipJob<'d> {
    doc: &'d ModelDocument,
    world_id: String,
    clip: ClipSpec,
    opts: SweepOpts,
    state: ClipState,
    frames_written: u64,
}

impl<'d> ClipJob<'d> {
    pub fn new(
        doc: &'d ModelDocument,
        world_id: impl Into<String>,
        clip: ClipSpec,
        opts: SweepOpts,
    ) -> Self {
        Self {
            doc,
            world_id: world_id.into(),
            clip,
            opts,
            state: ClipState::Idle,
            frames_written: 0,
        }
    }

    pub fn state(&self) -> ClipState {
        self.state
    }

    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }

    /// Render every frame into `sink`.
    ///
    /// Frames are pushed in strictly increasing order. On any failure the sink is aborted, the
    /// job ends in [`ClipState::Failed`] and the error carries world, clip and frame context.
    #[tracing::instrument(skip(self, sink), fields(world = %self.world_id, clip = self.clip.index, sweep = %self.clip.sweep))]
    pub fn run(&mut self, sink: &mut dyn FrameSink) -> CppnResult<ClipReport> {
        if self.state != ClipState::Idle {
            return Err(CppnError::validation("clip job has already run"));
        }
        self.advance(ClipState::LoadingModel)?;
        let loaded = self
            .doc
            .world(&self.world_id)
            .and_then(|world| SweepRenderer::new(world, self.opts.clone()));
        let renderer = match loaded {
            Ok(r) => r,
            Err(e) => {
                self.state = ClipState::Failed;
                return Err(e.in_clip(&self.world_id, self.clip.index, None));
            }
        };

        if let Err(e) = sink.begin(renderer.sink_config()) {
            self.state = ClipState::Failed;
            sink.abort();
            return Err(e.in_clip(&self.world_id, self.clip.index, None));
        }

        if let Err(e) = self.render_frames(&renderer, sink) {
            return Err(self.fail_rendering(e, sink));
        }

        if let Err(e) = sink.end() {
            self.state = ClipState::Failed;
            sink.abort();
            tracing::warn!(error = %e, "encoder failed to finalize clip");
            return Err(e.in_clip(&self.world_id, self.clip.index, None));
        }
        self.advance(ClipState::Completed)?;
        tracing::info!(frames = self.frames_written, "clip completed");

        Ok(ClipReport {
            world_id: self.world_id.clone(),
            clip: self.clip.index,
            sweep: self.clip.sweep,
            frames_written: self.frames_written,
            state: self.state,
        })
    }

    fn render_frames(
        &mut self,
        renderer: &SweepRenderer<'_>,
        sink: &mut dyn FrameSink,
    ) -> CppnResult<()> {
        let sweep = renderer.sweep_state(&self.clip);
        self.drive_frames(sink, |idx| renderer.render_frame(&sweep, idx))
    }

    /// Compute frames chunk by chunk (in parallel when enabled) and drain each chunk in order,
    /// stepping every frame through its stages before it reaches the sink.
    fn drive_frames<F>(&mut self, sink: &mut dyn FrameSink, render: F) -> CppnResult<()>
    where
        F: Fn(FrameIndex) -> CppnResult<FrameRgb> + Sync,
    {
        let total = self.opts.frames;
        let threading = &self.opts.threading;
        let chunk_size = normalized_chunk_size(threading.chunk_size);
        let pool = if threading.parallel {
            Some(build_thread_pool(threading.threads)?)
        } else {
            None
        };

        let mut chunk_start = 0u64;
        while chunk_start < total {
            let chunk_end = (chunk_start + chunk_size).min(total);
            let indices: Vec<FrameIndex> = (chunk_start..chunk_end).map(FrameIndex).collect();
            let rendered: Vec<(FrameIndex, CppnResult<FrameRgb>)> = match &pool {
                Some(pool) => pool.install(|| {
                    indices
                        .par_iter()
                        .map(|&idx| (idx, render(idx)))
                        .collect()
                }),
                None => indices.iter().map(|&idx| (idx, render(idx))).collect(),
            };

            for (idx, frame) in rendered {
                self.advance(ClipState::RenderingFrames {
                    frame: idx,
                    stage: FrameStage::BuildingFeatures,
                })?;
                self.advance(ClipState::RenderingFrames {
                    frame: idx,
                    stage: FrameStage::Evaluating,
                })?;
                let frame = frame?;
                self.advance(ClipState::RenderingFrames {
                    frame: idx,
                    stage: FrameStage::EncodingFrame,
                })?;
                sink.push_frame(idx, &frame)?;
                self.frames_written += 1;
            }
            tracing::debug!(start = chunk_start, end = chunk_end, "chunk written");
            chunk_start = chunk_end;
        }
        Ok(())
    }

    /// Abort the sink and mark the job failed, tagging `err` with the frame in flight.
    fn fail_rendering(&mut self, err: CppnError, sink: &mut dyn FrameSink) -> CppnError {
        let frame = self.current_frame();
        self.state = ClipState::Failed;
        sink.abort();
        tracing::warn!(error = %err, frame, frames_written = self.frames_written, "clip failed");
        err.in_clip(&self.world_id, self.clip.index, Some(frame))
    }

    fn current_frame(&self) -> u64 {
        match self.state {
            ClipState::RenderingFrames { frame, .. } => frame.0,
            _ => self.frames_written,
        }
    }

    fn advance(&mut self, next: ClipState) -> CppnResult<()> {
        if !self.state.can_advance_to(next) {
            return Err(CppnError::validation(format!(
                "illegal clip state transition {:?} -> {:?}",
                self.state, next
            )));
        }
        self.state = next;
        Ok(())
    }
}

/// Look up `world_id` and render `clip` into `sink`.
pub fn run_clip(
    doc: &ModelDocument,
    world_id: &str,
    clip: ClipSpec,
    opts: SweepOpts,
    sink: &mut dyn FrameSink,
) -> CppnResult<ClipReport> {
    ClipJob::new(doc, world_id, clip, opts).run(sink)
}

fn build_thread_pool(threads: Option<usize>) -> CppnResult<rayon::ThreadPool> {
    if let Some(n) = threads
        && n == 0
    {
        return Err(CppnError::validation(
            "render threading 'threads' must be >= 1 when set",
        ));
    }

    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(n) = threads {
        builder = builder.num_threads(n);
    }
    builder
        .build()
        .map_err(|e| CppnError::Other(anyhow::anyhow!("failed to build rayon thread pool: {e}")))
}

fn normalized_chunk_size(chunk_size: usize) -> u64 {
    if chunk_size == 0 {
        1
    } else {
        chunk_size as u64
    }
}

#[cfg(test)]
#[path = "../../tests/unit/sweep/render.rs"]
mod tests;
