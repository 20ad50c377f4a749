//! rig2npy - extract joint trajectories from an animated rig
//!
//! Converts a glTF/GLB rig into a `(joint, axis, frame)` keypoint array
//! saved in NumPy `.npy` format.

use anyhow::{Result, bail};
use clap::Parser;
use std::path::PathBuf;

use rig2npy::{DEFAULT_FRAME_RATE, ExtractOptions, SkeletonSchema, convert_rig, list_rig};

#[derive(Parser)]
#[command(name = "rig2npy")]
#[command(about = "Extract per-frame joint positions from an animated rig into a .npy array")]
#[command(version)]
struct Cli {
    /// Input rig file (glTF/GLB)
    #[arg(short, long, default_value = "fbx")]
    input: PathBuf,

    /// Output .npy file
    #[arg(short, long, default_value = "npy")]
    output: PathBuf,

    /// Frame rate used to map keyframe times to frames
    #[arg(short = 'r', long, default_value_t = DEFAULT_FRAME_RATE)]
    frame_rate: f32,

    /// Skeleton schema TOML (default: built-in 15-joint Mixamo schema)
    #[arg(long)]
    schema: Option<PathBuf>,

    /// Bone name prefix override (e.g. "mixamorig_")
    #[arg(long)]
    prefix: Option<String>,

    /// List actions and joint lookups instead of extracting
    #[arg(long)]
    list: bool,
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    if !(cli.frame_rate.is_finite() && cli.frame_rate > 0.0) {
        bail!("--frame-rate must be positive, got {}", cli.frame_rate);
    }

    let mut schema = SkeletonSchema::load_or_default(cli.schema.as_deref())?;
    if let Some(prefix) = cli.prefix {
        schema = schema.with_prefix(prefix);
    }
    let options = ExtractOptions {
        schema,
        frame_rate: cli.frame_rate,
    };

    if cli.list {
        list_rig(&cli.input, &options)?;
    } else {
        tracing::info!("Extracting {:?} -> {:?}", cli.input, cli.output);
        convert_rig(&cli.input, &cli.output, &options)?;
        tracing::info!("Done!");
    }

    Ok(())
}
