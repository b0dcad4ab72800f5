use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use pageconfig::PageDescription;
use renderer::{HostConfig, InteractionMode, PreviewOptions};
use scheduler::FramePacing;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::check;
use crate::cli::{Cli, Command, RunArgs};

pub fn run(cli: Cli) -> Result<()> {
    initialise_tracing();

    match cli.command {
        Some(Command::Check(args)) => check::run(&args),
        None => launch(cli.run),
    }
}

fn initialise_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn launch(args: RunArgs) -> Result<()> {
    let page_path = args
        .page
        .clone()
        .context("a page description is required (see --help)")?;
    let page = PageDescription::load(&page_path)
        .with_context(|| format!("failed to load {}", page_path.display()))?;

    let Some(target) = page.preview_target() else {
        info!(
            page = %page_path.display(),
            "no preview container or tracked links; nothing to show"
        );
        return Ok(());
    };

    let config = host_config(&args, &page_path)?;
    info!(
        page = %page_path.display(),
        links = target.links.len(),
        grid = target.settings.grid,
        mode = ?config.mode,
        "starting preview"
    );

    renderer::run_preview(target, config)
}

fn host_config(args: &RunArgs, page_path: &Path) -> Result<HostConfig> {
    let pacing = FramePacing::from_fps(args.fps)?;
    let mode = if args.touch {
        InteractionMode::Touch
    } else {
        InteractionMode::Pointer
    };

    let defaults = PreviewOptions::default();
    let preview = PreviewOptions {
        size: args.size.unwrap_or(defaults.size),
        pacing,
        seed: args.seed,
        asset_root: asset_root(page_path),
    };

    let title = match page_path.file_stem() {
        Some(stem) => format!("gridwarp: {}", stem.to_string_lossy()),
        None => "gridwarp".to_string(),
    };

    Ok(HostConfig {
        title,
        mode,
        preview,
    })
}

/// Image URLs resolve against the directory holding the page description.
fn asset_root(page_path: &Path) -> PathBuf {
    match page_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use renderer::PixelSize;

    use super::*;

    fn args() -> RunArgs {
        RunArgs {
            page: Some(PathBuf::from("site/page.toml")),
            touch: false,
            size: None,
            fps: None,
            seed: None,
        }
    }

    #[test]
    fn host_config_uses_defaults() {
        let config = host_config(&args(), Path::new("site/page.toml")).unwrap();
        assert_eq!(config.title, "gridwarp: page");
        assert_eq!(config.mode, InteractionMode::Pointer);
        assert_eq!(config.preview.size, PixelSize::new(1280, 720));
        assert_eq!(config.preview.pacing, FramePacing::EveryRefresh);
        assert_eq!(config.preview.asset_root, PathBuf::from("site"));
    }

    #[test]
    fn host_config_applies_flags() {
        let args = RunArgs {
            touch: true,
            size: Some(PixelSize::new(400, 300)),
            fps: Some(4.0),
            seed: Some(9),
            ..args()
        };
        let config = host_config(&args, Path::new("page.toml")).unwrap();
        assert_eq!(config.mode, InteractionMode::Touch);
        assert_eq!(config.preview.size, PixelSize::new(400, 300));
        assert_eq!(
            config.preview.pacing,
            FramePacing::Capped {
                interval: Duration::from_millis(250)
            }
        );
        assert_eq!(config.preview.seed, Some(9));
        assert_eq!(config.preview.asset_root, PathBuf::from("."));
    }

    #[test]
    fn negative_fps_is_rejected() {
        let args = RunArgs {
            fps: Some(-1.0),
            ..args()
        };
        assert!(host_config(&args, Path::new("page.toml")).is_err());
    }

    #[test]
    fn unrepresentable_fps_interval_is_an_error() {
        let args = RunArgs {
            fps: Some(1e-30),
            ..args()
        };
        assert!(host_config(&args, Path::new("page.toml")).is_err());
    }
}
