//! steelblock_design - Generate one design from the command line
//!
//! Prints the description and writes the floor plan and render as PNG files.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use steelblock::design::{DesignRequest, Style};
use steelblock::images::Bitmap;
use steelblock::orchestrator::Orchestrator;
use steelblock::prompts::ArtifactKind;
use steelblock::Config;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Steel Block Generator one-shot tool
#[derive(Parser, Debug)]
#[command(
    name = "steelblock_design",
    version,
    about = "Generate a home description, floor plan and 3D render"
)]
struct Args {
    /// Number of rooms (clamped to 1-10)
    #[arg(long, default_value_t = 3, allow_negative_numbers = true)]
    rooms: i64,

    /// Number of bathrooms (clamped to 1-5)
    #[arg(long, default_value_t = 2, allow_negative_numbers = true)]
    bathrooms: i64,

    /// Architectural style: modern, minimalist, rustic, industrial
    #[arg(long, default_value = "modern")]
    style: Style,

    /// Budget in USD (clamped to 10000-100000)
    #[arg(long, default_value_t = 50_000, allow_negative_numbers = true)]
    budget: i64,

    /// Directory to write images into
    #[arg(short, long, default_value = ".")]
    out: PathBuf,

    /// Path to TOML config file (default: steelblock.toml if present)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "steelblock=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();
    let config = Config::load(args.config.as_deref())?;

    std::fs::create_dir_all(&args.out)
        .with_context(|| format!("Failed to create {}", args.out.display()))?;

    let request = DesignRequest::clamped(args.rooms, args.bathrooms, args.style, args.budget);
    let orchestrator = Orchestrator::new(&config.provider)?;
    let outcome = orchestrator.generate(request).await?;

    println!("== {}", ArtifactKind::Description.caption());
    match &outcome.description {
        Ok(text) => println!("{}\n", text),
        Err(e) => println!("Error: {}\n", e),
    }

    write_image(&args.out, ArtifactKind::FloorPlan, &outcome.floor_plan)?;
    write_image(&args.out, ArtifactKind::Render, &outcome.render)?;

    Ok(())
}

fn write_image(
    dir: &Path,
    kind: ArtifactKind,
    result: &Result<Bitmap, steelblock::error::GenerationError>,
) -> Result<()> {
    println!("== {}", kind.caption());
    match result {
        Ok(bitmap) => {
            let path = dir.join(format!("{}.png", kind.file_stem()));
            bitmap
                .save_png(&path)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!(
                "Saved {} ({}x{})\n",
                path.display(),
                bitmap.width(),
                bitmap.height()
            );
        }
        Err(e) => println!("Error: {}\n", e),
    }
    Ok(())
}
