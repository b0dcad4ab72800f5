use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use renderer::PixelSize;

#[derive(Parser, Debug)]
#[command(
    name = "gridwarp",
    author,
    version,
    about = "Grid-distortion image preview for portfolio project links",
    args_conflicts_with_subcommands = true,
    subcommand_negates_reqs = true
)]
pub struct Cli {
    #[command(flatten)]
    pub run: RunArgs,
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Page description (TOML) listing the container attributes and project links.
    #[arg(value_name = "PAGE", required = true)]
    pub page: Option<PathBuf>,

    /// Use tap-to-preview with a confirmation control instead of hover.
    #[arg(long)]
    pub touch: bool,

    /// Initial window size (e.g. `1280x720`).
    #[arg(long, value_name = "WIDTHxHEIGHT", value_parser = parse_surface_size)]
    pub size: Option<PixelSize>,

    /// Optional FPS cap for the animation loop (0=every refresh).
    #[arg(long, value_name = "FPS")]
    pub fps: Option<f32>,

    /// Seed for the displacement grid; omitted means a fresh random seed.
    #[arg(long, value_name = "SEED")]
    pub seed: Option<u64>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Validate a page description and print the resolved settings and links.
    Check(CheckArgs),
}

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Page description to inspect.
    #[arg(value_name = "PAGE")]
    pub page: PathBuf,

    /// Emit the report as JSON.
    #[arg(long)]
    pub json: bool,
}

pub fn parse() -> Cli {
    Cli::parse()
}

/// Parses `WIDTHxHEIGHT`; `x`, `X` and `×` are accepted as the separator.
pub fn parse_surface_size(value: &str) -> Result<PixelSize, String> {
    let (width, height) = value
        .trim()
        .split_once(['x', 'X', '×'])
        .ok_or_else(|| format!("invalid size '{value}'; expected WIDTHxHEIGHT"))?;

    let width: u32 = width
        .trim()
        .parse()
        .map_err(|_| format!("invalid width in '{value}'"))?;
    let height: u32 = height
        .trim()
        .parse()
        .map_err(|_| format!("invalid height in '{value}'"))?;

    if width == 0 || height == 0 {
        return Err(format!("size '{value}' must be non-zero"));
    }

    Ok(PixelSize::new(width, height))
}
