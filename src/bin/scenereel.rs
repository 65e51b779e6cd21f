use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "scenereel", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compose images into an MP4 (requires `ffmpeg`).
    Generate(GenerateArgs),
    /// Print the concat manifest the engine would receive.
    Manifest(ManifestArgs),
}

#[derive(Parser, Debug)]
struct GenerateArgs {
    /// Output MP4 path.
    #[arg(long)]
    out: PathBuf,

    /// Total clip length in seconds (15-20). Defaults to the config value.
    #[arg(long)]
    duration: Option<f64>,

    /// Optional JSON config file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Scene images, in playback order.
    #[arg(required = true)]
    images: Vec<PathBuf>,
}

#[derive(Parser, Debug)]
struct ManifestArgs {
    /// Total clip length in seconds (15-20).
    #[arg(long, default_value_t = scenereel::DEFAULT_DURATION_SECS)]
    duration: f64,

    /// Scene images, in playback order.
    #[arg(required = true)]
    images: Vec<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();
    match cli.cmd {
        Command::Generate(args) => cmd_generate(args),
        Command::Manifest(args) => cmd_manifest(args),
    }
}

fn init_tracing() {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn read_sources(paths: &[PathBuf]) -> anyhow::Result<Vec<scenereel::SceneSource>> {
    paths
        .iter()
        .map(|p| {
            scenereel::SceneSource::from_path(p)
                .with_context(|| format!("load scene '{}'", p.display()))
        })
        .collect()
}

fn load_config(path: Option<&Path>) -> anyhow::Result<scenereel::StudioConfig> {
    let cfg = match path {
        Some(p) => scenereel::StudioConfig::load(p)?,
        None => scenereel::StudioConfig::default(),
    };
    let cfg = cfg.apply_env();
    cfg.validate()?;
    Ok(cfg)
}

fn cmd_generate(args: GenerateArgs) -> anyhow::Result<()> {
    let cfg = load_config(args.config.as_deref())?;
    let mut studio = scenereel::Studio::start(scenereel::FfmpegEngine::new(), &cfg)?;
    if let Some(secs) = args.duration {
        studio.set_target_duration(secs)?;
    }

    let accepted = studio.add_sources(read_sources(&args.images)?)?;
    if accepted.is_empty() {
        anyhow::bail!("no image scenes among {} input file(s)", args.images.len());
    }
    eprintln!(
        "{} scene(s), {}",
        accepted.len(),
        studio.target_duration().label()
    );

    let output = match studio.generate() {
        Ok(output) => output,
        Err(e) => {
            eprintln!("{}", e.status_message());
            return Err(e.into());
        }
    };
    output.save_to(&args.out)?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_manifest(args: ManifestArgs) -> anyhow::Result<()> {
    let target = scenereel::TargetDuration::new(args.duration)?;

    let mut timeline = scenereel::SceneTimeline::new(scenereel::AssetLifecycleManager::new());
    timeline.append(read_sources(&args.images)?)?;
    if timeline.is_empty() {
        anyhow::bail!("no image scenes among {} input file(s)", args.images.len());
    }

    let entries = scenereel::timeline_entries(&timeline, target)?;
    println!("{}", scenereel::build_manifest(&entries)?);
    Ok(())
}
