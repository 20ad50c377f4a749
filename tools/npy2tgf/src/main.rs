//! npy2tgf - write a keypoint frame as a skeleton graph
//!
//! Converts a `(joint, axis, frame)` `.npy` keypoint array into a `.tgf`
//! file listing joint positions followed by the bone edge list.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use npy2tgf::{SkeletonSchema, convert_npy};

#[derive(Parser)]
#[command(name = "npy2tgf")]
#[command(about = "Write one frame of a .npy keypoint array as a .tgf skeleton graph")]
#[command(version)]
struct Cli {
    /// Input .npy keypoint array
    #[arg(short, long, default_value = "fbx")]
    input: PathBuf,

    /// Output .tgf file (overwritten)
    #[arg(short, long, default_value = "npy")]
    output: PathBuf,

    /// Skeleton schema TOML (default: built-in 15-joint Mixamo schema)
    #[arg(long)]
    schema: Option<PathBuf>,

    /// Frame to serialize
    #[arg(long, default_value_t = 0)]
    frame: usize,
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
    let schema = SkeletonSchema::load_or_default(cli.schema.as_deref())?;

    tracing::info!("Converting {:?} -> {:?}", cli.input, cli.output);
    convert_npy(&cli.input, &cli.output, &schema, cli.frame)?;
    tracing::info!("Done!");

    Ok(())
}
