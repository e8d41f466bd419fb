use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use rand::SeedableRng as _;
use rand::rngs::StdRng;
use tracing_subscriber::EnvFilter;

use cppnfield::{
    Canvas, ClipJob, ClipSpec, CppnError, FeatureBuilder, FfmpegSink, FfmpegSinkOpts, Fps,
    FrameIndex, ModelDocument, RenderThreading, SweepDim, SweepOpts, SweepRenderer,
    WorldSelector, plan_clips,
};

#[derive(Parser, Debug)]
#[command(name = "cppnfield", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Export checkpoints listed in a manifest into one model document.
    Export(ExportArgs),
    /// Render looping sweep clips to MP4 (requires `ffmpeg` on PATH).
    Sweep(SweepArgs),
    /// Render a single sweep frame as a PNG.
    Frame(FrameArgs),
    /// Print the worlds in a model document.
    Inspect(InspectArgs),
}

#[derive(Parser, Debug)]
struct ExportArgs {
    /// Export manifest JSON (world ids, labels, checkpoint and config paths).
    #[arg(long)]
    manifest: PathBuf,

    /// Output model document.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Parser, Debug)]
struct SweepArgs {
    /// Model document.
    #[arg(long)]
    models: PathBuf,

    /// World id, or `all`.
    #[arg(long, default_value = "all")]
    world: WorldSelector,

    /// Clips per world.
    #[arg(long, default_value_t = 7)]
    clips: usize,

    /// Frame width and height in pixels.
    #[arg(long, default_value_t = 256)]
    size: u32,

    /// Frames per second.
    #[arg(long, default_value_t = 30)]
    fps: u32,

    /// Clip duration in seconds.
    #[arg(long, default_value_t = 6.0)]
    seconds: f64,

    /// Base seed for sweep planning and per-clip sampling.
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Output directory; clips land in `<outdir>/<world>/`.
    #[arg(long, default_value = "tmp/cppn_sweeps")]
    outdir: PathBuf,

    /// Render a single test clip per world only.
    #[arg(long)]
    make_one: bool,

    /// Worker threads for frame rendering (defaults to all cores).
    #[arg(long)]
    threads: Option<usize>,

    /// Render frames on the calling thread only.
    #[arg(long)]
    sequential: bool,
}

#[derive(Parser, Debug)]
struct FrameArgs {
    /// Model document.
    #[arg(long)]
    models: PathBuf,

    /// World id.
    #[arg(long)]
    world: String,

    /// Frame width and height in pixels.
    #[arg(long, default_value_t = 256)]
    size: u32,

    /// Clip seed.
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Swept input dimension (`z`, `latent0`..`latent4`).
    #[arg(long, default_value = "z")]
    sweep: SweepDim,

    /// Frame index within the loop.
    #[arg(long, default_value_t = 0)]
    index: u64,

    /// Loop length in frames.
    #[arg(long, default_value_t = 180)]
    frames: u64,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Parser, Debug)]
struct InspectArgs {
    /// Model document.
    #[arg(long)]
    models: PathBuf,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Export(args) => cmd_export(args),
        Command::Sweep(args) => cmd_sweep(args),
        Command::Frame(args) => cmd_frame(args),
        Command::Inspect(args) => cmd_inspect(args),
    }
}

fn read_models(path: &Path) -> anyhow::Result<ModelDocument> {
    cppnfield::read_document(path).with_context(|| format!("load models '{}'", path.display()))
}

fn cmd_export(args: ExportArgs) -> anyhow::Result<()> {
    let manifest = cppnfield::ExportManifest::read(&args.manifest)?;
    let root = args.manifest.parent().unwrap_or_else(|| Path::new("."));
    let doc = cppnfield::export_document(&manifest, root)?;
    cppnfield::write_document(&doc, &args.out)?;
    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_sweep(args: SweepArgs) -> anyhow::Result<()> {
    let doc = read_models(&args.models)?;
    let worlds = doc.select(&args.world)?;
    if !cppnfield::is_ffmpeg_on_path() {
        anyhow::bail!("ffmpeg is required for MP4 rendering, but was not found on PATH");
    }

    let fps = Fps::new(args.fps, 1)?;
    let opts = SweepOpts {
        canvas: Canvas::square(args.size),
        fps,
        frames: fps.frames_for_secs(args.seconds),
        threading: RenderThreading {
            parallel: !args.sequential,
            threads: args.threads,
            ..RenderThreading::default()
        },
        ..SweepOpts::default()
    };

    let clip_count = if args.make_one { 1 } else { args.clips };
    let mut plan_rng = StdRng::seed_from_u64(args.seed);
    let mut failed = 0usize;
    let mut written = 0usize;

    for (wi, world) in worlds.iter().enumerate() {
        let world_dir = args.outdir.join(world.id());
        std::fs::create_dir_all(&world_dir)
            .with_context(|| format!("create output dir '{}'", world_dir.display()))?;

        for clip in plan_clips(wi, clip_count, args.seed, &mut plan_rng) {
            let out_path = world_dir.join(clip.file_name(world.id()));
            let mut sink = FfmpegSink::new(FfmpegSinkOpts::new(&out_path));
            let sweep = clip.sweep;
            let seed = clip.seed;
            match ClipJob::new(&doc, world.id(), clip, opts.clone()).run(&mut sink) {
                Ok(_) => {
                    written += 1;
                    eprintln!("wrote {} (sweep={sweep}, seed={seed})", out_path.display());
                }
                Err(e) => {
                    failed += 1;
                    tracing::error!(error = %e, "clip failed; output discarded");
                }
            }
        }
    }

    if failed > 0 {
        anyhow::bail!("{failed} clip(s) failed, {written} written");
    }
    Ok(())
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let doc = read_models(&args.models)?;
    let world = doc.world(&args.world)?;
    let opts = SweepOpts {
        canvas: Canvas::square(args.size),
        frames: args.frames,
        ..SweepOpts::default()
    };
    let renderer = SweepRenderer::new(world, opts)?;
    let clip = ClipSpec {
        index: 1,
        sweep: args.sweep,
        seed: args.seed,
    };
    let state = renderer.sweep_state(&clip);
    let frame = renderer
        .render_frame(&state, FrameIndex(args.index))
        .map_err(|e| e.in_clip(world.id(), clip.index, Some(args.index)))?;

    if let Some(parent) = args.out.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }

    image::save_buffer_with_format(
        &args.out,
        &frame.data,
        frame.width,
        frame.height,
        image::ColorType::Rgb8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", args.out.display()))?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_inspect(args: InspectArgs) -> anyhow::Result<()> {
    let doc = read_models(&args.models)?;
    println!("version: {}", doc.version());
    for world in doc.worlds() {
        let cfg = world.config();
        let features = FeatureBuilder::new(cfg).feature_len();
        let status = match FeatureBuilder::for_world(world) {
            Ok(_) => "ok".to_owned(),
            Err(CppnError::FeatureDimensionMismatch { built, expected }) => {
                format!("feature mismatch (built {built}, expected {expected})")
            }
            Err(e) => e.to_string(),
        };
        println!("{}:", world.id());
        println!("  label:      {}", world.label());
        println!("  sizes:      {:?}", world.sizes());
        println!("  w0:         {}", cfg.cppn_sin_w0);
        println!("  channels:   {}", cfg.image_channels);
        println!("  features:   {features} ({status})");
    }
    Ok(())
}
