use anyhow::{anyhow, Result};
use chrono::{SecondsFormat, Utc};
use clap::{Args, Parser, Subcommand, ValueEnum};
use image::ImageFormat;
use log::{info, warn};
use pathlight_model::{FrameRecord, HostInfo, RunOutputs, RunReceipt, RunSettings};
use pathlight_render::math::Vec3;
use pathlight_render::{
    encode_hdr, encode_png, CameraRig, CancelFlag, FrameInput, RenderError, RenderSettings,
    Renderer, SamplePolicy, Scene, StreamKind, ViewportSize,
};
use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

#[derive(Parser)]
#[command(name = "pathlight", version, about = "Progressive path tracer for a fixed scene")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    Render(RenderArgs),
    Scene(SceneArgs),
}

#[derive(Clone, Copy, ValueEnum)]
enum StreamArg {
    Hashed,
    Legacy,
}

impl StreamArg {
    fn kind(self) -> StreamKind {
        match self {
            StreamArg::Hashed => StreamKind::Hashed,
            StreamArg::Legacy => StreamKind::Legacy,
        }
    }

    fn name(self) -> &'static str {
        match self {
            StreamArg::Hashed => "hashed",
            StreamArg::Legacy => "legacy",
        }
    }
}

#[derive(Args)]
#[command(about = "Render frames of the built-in scene and write the tone-mapped result.")]
struct RenderArgs {
    #[arg(long)]
    out: PathBuf,

    /// Averaged HDR radiance; the format follows the extension (`.exr`).
    #[arg(long)]
    hdr_out: Option<PathBuf>,

    #[arg(long)]
    receipt: Option<PathBuf>,

    #[arg(long, default_value_t = 1280)]
    width: u32,

    #[arg(long, default_value_t = 720)]
    height: u32,

    #[arg(long, default_value_t = 10)]
    frames: u32,

    #[arg(long, default_value_t = 60.0)]
    fov: f32,

    #[arg(long, default_value_t = 25.0)]
    distance: f32,

    /// Degrees the camera orbits the origin per frame; 0 keeps it still.
    #[arg(long, default_value_t = 0.0)]
    orbit: f32,

    #[arg(long, value_enum, default_value_t = StreamArg::Hashed)]
    stream: StreamArg,

    #[arg(long, default_value_t = 8)]
    max_depth: u32,

    #[arg(long, default_value_t = 4)]
    moving_spp: u32,

    #[arg(long, default_value_t = 16)]
    still_spp: u32,

    #[arg(long, default_value_t = 1)]
    seed: u64,

    #[arg(long, default_value_t = 0)]
    threads: usize,

    #[arg(long, default_value_t = 0)]
    progress_every: u32,
}

#[derive(Args)]
#[command(about = "Write the built-in scene as JSON.")]
struct SceneArgs {
    #[arg(long)]
    out: PathBuf,
}

fn main() {
    env_logger::init();

    if let Err(err) = run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Render(args) => run_render(args),
        Commands::Scene(args) => run_scene(args),
    }
}

fn run_scene(args: SceneArgs) -> Result<()> {
    let scene = Scene::cornell_box().map_err(|err| anyhow!("invalid built-in scene: {err}"))?;
    write_json(&args.out, &scene.describe())?;
    info!("wrote scene to {:?}", args.out);
    Ok(())
}

fn run_render(args: RenderArgs) -> Result<()> {
    let started_at_utc = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);

    if args.width == 0 || args.height == 0 {
        return Err(anyhow!("image size must be non-zero (got {}x{})", args.width, args.height));
    }
    if !(args.fov > 0.0 && args.fov < 180.0) {
        return Err(anyhow!("--fov must lie in (0, 180) degrees (got {})", args.fov));
    }
    let hdr_format = match &args.hdr_out {
        Some(path) => Some(
            ImageFormat::from_path(path)
                .map_err(|err| anyhow!("unsupported HDR output {:?}: {}", path, err))?,
        ),
        None => None,
    };

    let cancel = CancelFlag::new();
    {
        let cancel = cancel.clone();
        ctrlc::set_handler(move || cancel.cancel())
            .map_err(|err| anyhow!("failed to install Ctrl-C handler: {err}"))?;
    }

    let scene = Scene::cornell_box().map_err(|err| anyhow!("invalid built-in scene: {err}"))?;
    let settings = RenderSettings {
        threads: args.threads,
        max_depth: args.max_depth,
        sample_policy: SamplePolicy {
            moving: args.moving_spp.max(1),
            still: args.still_spp.max(1),
        },
        stream: args.stream.kind(),
        seed: args.seed,
        progress_every: args.progress_every,
        ..RenderSettings::default()
    };
    let mut renderer = Renderer::new(Arc::new(scene), settings)
        .map_err(|err| anyhow!("failed to set up renderer: {err}"))?;

    info!(
        "render: {}x{} frames={} stream={} depth={}",
        args.width,
        args.height,
        args.frames,
        args.stream.name(),
        args.max_depth
    );

    let viewport = ViewportSize::new(args.width, args.height);
    let mut rig = CameraRig::new(Vec3::new(0.0, 0.0, args.distance));
    rig.set_fov(args.fov);

    let start = Instant::now();
    let mut frames = Vec::new();
    let mut interrupted = false;

    for i in 0..args.frames {
        if cancel.is_cancelled() {
            interrupted = true;
            break;
        }

        if i > 0 && args.orbit != 0.0 {
            let angle = (i as f32 * args.orbit).to_radians();
            rig.set_position(Vec3::new(angle.sin(), 0.0, angle.cos()) * args.distance);
            rig.rotate(-args.orbit, 0.0);
        }

        let input = FrameInput {
            pose: rig.pose(),
            change: rig.take_change(),
            viewport,
            elapsed: start.elapsed().as_secs_f32(),
        };

        match renderer.render_frame(&input, &cancel) {
            Ok(report) => {
                info!(
                    "frame {}/{}: {} spp={} samples={} {:.1}ms",
                    i + 1,
                    args.frames,
                    if report.plan.reset { "reset" } else { "accumulate" },
                    report.plan.samples_per_pixel,
                    report.sample_count,
                    report.duration.as_secs_f64() * 1000.0
                );
                frames.push(FrameRecord {
                    index: i,
                    reset: report.plan.reset,
                    samples_per_pixel: report.plan.samples_per_pixel,
                    sample_count: report.sample_count,
                    millis: report.duration.as_secs_f64() * 1000.0,
                    pose: input.pose.record(),
                });
            }
            Err(RenderError::Cancelled) => {
                interrupted = true;
                break;
            }
            Err(err) => return Err(anyhow!("frame {} failed: {}", i, err)),
        }
    }

    if interrupted {
        warn!("interrupted after {} frame(s)", frames.len());
    }
    if frames.is_empty() {
        return Err(anyhow!("no frames were rendered"));
    }

    let png = encode_png(&renderer.display().to_rgb8())
        .map_err(|err| anyhow!("failed to encode png: {err}"))?;
    atomic_write(&args.out, &png)?;
    info!("wrote {:?}", args.out);

    if let (Some(path), Some(format)) = (&args.hdr_out, hdr_format) {
        let hdr = encode_hdr(renderer.accumulation(), format)
            .map_err(|err| anyhow!("failed to encode {:?}: {}", path, err))?;
        atomic_write(path, &hdr)?;
        info!("wrote {:?}", path);
    }

    if let Some(path) = &args.receipt {
        let receipt = RunReceipt {
            version: env!("CARGO_PKG_VERSION").to_string(),
            started_at_utc,
            finished_at_utc: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            interrupted,
            settings: RunSettings {
                width: args.width,
                height: args.height,
                frames: args.frames,
                fov_deg: args.fov,
                distance: args.distance,
                orbit_deg: args.orbit,
                max_depth: args.max_depth,
                moving_spp: renderer.settings().sample_policy.moving,
                still_spp: renderer.settings().sample_policy.still,
                stream: args.stream.name().to_string(),
                seed: args.seed,
                threads: args.threads,
            },
            frames,
            outputs: RunOutputs {
                image: args.out.display().to_string(),
                hdr: args.hdr_out.as_ref().map(|path| path.display().to_string()),
            },
            host: HostInfo {
                os: std::env::consts::OS.to_string(),
                arch: std::env::consts::ARCH.to_string(),
            },
        };
        write_json(path, &receipt)?;
        info!("wrote receipt to {:?}", path);
    }

    Ok(())
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_vec_pretty(value)?;
    atomic_write(path, &json)
}

fn atomic_write(path: &Path, data: &[u8]) -> Result<()> {
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    if !parent.as_os_str().is_empty() {
        fs::create_dir_all(parent)
            .map_err(|err| anyhow!("failed to create output directory {:?}: {}", parent, err))?;
    }

    let tmp_path = temp_path(path);
    let mut file = fs::File::create(&tmp_path)
        .map_err(|err| anyhow!("failed to create temp file {:?}: {}", tmp_path, err))?;
    file.write_all(data)
        .map_err(|err| anyhow!("failed to write temp file {:?}: {}", tmp_path, err))?;
    file.sync_all()
        .map_err(|err| anyhow!("failed to sync temp file {:?}: {}", tmp_path, err))?;

    if let Err(err) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(anyhow!("failed to replace output {:?}: {}", path, err));
    }

    if let Ok(dir) = fs::File::open(parent) {
        let _ = dir.sync_all();
    }

    Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("output");
    let stamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let pid = std::process::id();
    parent.join(format!(".{}.part-{}-{}", file_name, pid, stamp))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn temp_path_stays_beside_target() {
        let target = Path::new("out/render.png");
        let tmp = temp_path(target);
        assert_eq!(tmp.parent(), Some(Path::new("out")));
        let name = tmp.file_name().and_then(|n| n.to_str()).unwrap();
        assert!(name.starts_with(".render.png.part-"));
    }

    #[test]
    fn atomic_write_replaces_existing_file() {
        let dir = std::env::temp_dir().join(format!("pathlight-atomic-{}", std::process::id()));
        let target = dir.join("nested").join("receipt.json");

        atomic_write(&target, b"first").unwrap();
        atomic_write(&target, b"second").unwrap();
        assert_eq!(fs::read(&target).unwrap(), b"second");

        let leftovers = fs::read_dir(target.parent().unwrap()).unwrap().count();
        assert_eq!(leftovers, 1);
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn cli_defaults_match_reference_view() {
        let cli = Cli::parse_from(["pathlight", "render", "--out", "a.png"]);
        let Commands::Render(args) = cli.command else {
            panic!("expected render");
        };
        assert_eq!((args.width, args.height, args.frames), (1280, 720, 10));
        assert!((args.fov - 60.0).abs() < 1e-6);
        assert!((args.distance - 25.0).abs() < 1e-6);
        assert_eq!(args.stream.kind(), StreamKind::Hashed);
    }
}
