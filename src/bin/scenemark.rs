use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use scenemark::{
    Canvas, CancelToken, EditSession, ExportConfig, ExportOpts, FfmpegConfig, FfmpegSink, Fps,
    PreparedAssets, Severity, export, render_time,
};

#[derive(Parser, Debug)]
#[command(name = "scenemark", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compile a document and print its diagnostics and timeline JSON.
    Check(CheckArgs),
    /// Render a single frame as a PNG.
    Frame(FrameArgs),
    /// Render an MP4 video (requires `ffmpeg` on PATH).
    Render(RenderArgs),
}

#[derive(Parser, Debug)]
struct CheckArgs {
    /// Input markdown document.
    #[arg(long = "in")]
    in_path: PathBuf,
}

#[derive(Parser, Debug)]
struct FrameArgs {
    /// Input markdown document.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Timeline position in seconds.
    #[arg(long)]
    time: f64,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    /// Canvas width in pixels.
    #[arg(long, default_value_t = 1280)]
    width: u32,

    /// Canvas height in pixels.
    #[arg(long, default_value_t = 720)]
    height: u32,
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Input markdown document.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output MP4 path.
    #[arg(long)]
    out: PathBuf,

    /// Frames per second.
    #[arg(long, default_value_t = 30)]
    fps: u32,

    /// Canvas width in pixels (must be even).
    #[arg(long, default_value_t = 1280)]
    width: u32,

    /// Canvas height in pixels (must be even).
    #[arg(long, default_value_t = 720)]
    height: u32,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.cmd {
        Command::Check(args) => cmd_check(args),
        Command::Frame(args) => cmd_frame(args),
        Command::Render(args) => cmd_render(args),
    }
}

fn open_session(path: &Path) -> anyhow::Result<EditSession> {
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("open document '{}'", path.display()))?;
    Ok(EditSession::new(source))
}

fn print_diagnostics(session: &EditSession) {
    for d in session.diagnostics() {
        let tag = match d.severity {
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        if d.span.start_line == d.span.end_line {
            eprintln!("{tag}: line {}: {}", d.span.start_line, d.message);
        } else {
            eprintln!(
                "{tag}: lines {}-{}: {}",
                d.span.start_line, d.span.end_line, d.message
            );
        }
    }
}

fn cmd_check(args: CheckArgs) -> anyhow::Result<()> {
    let session = open_session(&args.in_path)?;
    print_diagnostics(&session);

    let timeline = session.timeline();
    let json = serde_json::to_string_pretty(timeline.as_ref())
        .with_context(|| "serialize timeline JSON")?;
    println!("{json}");

    eprintln!(
        "{} scene(s), {:.3}s total",
        timeline.len(),
        timeline.total_duration()
    );
    Ok(())
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let session = open_session(&args.in_path)?;
    print_diagnostics(&session);

    let timeline = session.timeline();
    let assets_root = args.in_path.parent().unwrap_or_else(|| Path::new("."));
    let assets = PreparedAssets::prepare(&timeline, assets_root)?;

    let canvas = Canvas {
        width: args.width,
        height: args.height,
    };
    canvas.validate()?;
    let frame = render_time(&timeline, args.time, canvas, &assets);

    if let Some(parent) = args.out.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }

    image::save_buffer_with_format(
        &args.out,
        &frame.data,
        frame.width,
        frame.height,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", args.out.display()))?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let session = open_session(&args.in_path)?;
    print_diagnostics(&session);

    let timeline = session.timeline();
    let assets_root = args.in_path.parent().unwrap_or_else(|| Path::new("."));
    let assets = PreparedAssets::prepare(&timeline, assets_root)?;

    let cfg = ExportConfig {
        canvas: Canvas {
            width: args.width,
            height: args.height,
        },
        fps: Fps::new(args.fps, 1)?,
    };

    let mut sink = FfmpegSink::new(FfmpegConfig::mp4(&args.out));
    let stats = export::export(
        &timeline,
        &assets,
        cfg,
        &mut sink,
        &CancelToken::new(),
        ExportOpts::default(),
    )?;

    eprintln!(
        "wrote {} ({} frame(s))",
        args.out.display(),
        stats.frames_submitted
    );
    Ok(())
}
