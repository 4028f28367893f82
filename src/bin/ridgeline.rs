use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "ridgeline", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Simulate a scene and print a JSON trace of trigger events and final styles.
    Trace(TraceArgs),
    /// Render every live canvas of a scene at a given time as PNGs.
    Frame(FrameArgs),
}

#[derive(Parser, Debug)]
struct TraceArgs {
    /// Input scene JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Simulated frames per second.
    #[arg(long, default_value_t = 60.0)]
    fps: f64,

    /// Stop at this time (seconds) instead of after the last step.
    #[arg(long)]
    until: Option<f64>,
}

#[derive(Parser, Debug)]
struct FrameArgs {
    /// Input scene JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Time in seconds.
    #[arg(long)]
    time: f64,

    /// Output directory.
    #[arg(long)]
    out: PathBuf,

    /// Simulated frames per second.
    #[arg(long, default_value_t = 60.0)]
    fps: f64,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Trace(args) => cmd_trace(args),
        Command::Frame(args) => cmd_frame(args),
    }
}

fn read_scene(path: &Path) -> anyhow::Result<ridgeline::Scene> {
    let scene = ridgeline::Scene::from_path(path)
        .with_context(|| format!("load scene '{}'", path.display()))?;
    scene.validate()?;
    Ok(scene)
}

fn cmd_trace(args: TraceArgs) -> anyhow::Result<()> {
    let scene = read_scene(&args.in_path)?;
    let run = scene.run(args.fps, args.until)?;
    let json = serde_json::to_string_pretty(&run.trace).context("serialize trace")?;
    println!("{json}");
    Ok(())
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let scene = read_scene(&args.in_path)?;
    let run = scene.run(args.fps, Some(args.time))?;

    std::fs::create_dir_all(&args.out)
        .with_context(|| format!("create output dir '{}'", args.out.display()))?;

    let canvases = run.stage.host().canvases();
    if canvases.is_empty() {
        eprintln!("no live canvases at t={}", args.time);
    }
    for (node, container, canvas) in canvases {
        let canvas = canvas.borrow();
        let name = format!("{}-{}.png", container.replace('/', "_"), node.0);
        let path = args.out.join(name);
        image::save_buffer_with_format(
            &path,
            &canvas.rgba,
            canvas.width,
            canvas.height,
            image::ColorType::Rgba8,
            image::ImageFormat::Png,
        )
        .with_context(|| format!("write png '{}'", path.display()))?;
        eprintln!("wrote {}", path.display());
    }
    Ok(())
}
