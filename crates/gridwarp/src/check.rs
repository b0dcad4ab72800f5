use std::fmt::Write as _;
use std::path::Path;

use anyhow::{Context, Result};
use pageconfig::{PageDescription, PreviewSettings, ProjectLink};
use serde::Serialize;

use crate::cli::CheckArgs;

/// What `gridwarp check` reports about a page description.
#[derive(Debug, Serialize)]
pub struct CheckReport {
    pub page: String,
    /// False when the page has no container or no tracked links, in which
    /// case the preview would not initialise.
    pub active: bool,
    pub settings: PreviewSettings,
    pub links: Vec<ProjectLink>,
    pub distinct_images: usize,
}

impl CheckReport {
    pub fn build(path: &Path, page: &PageDescription) -> Self {
        let target = page.preview_target();
        let settings = target
            .as_ref()
            .map(|target| target.settings)
            .unwrap_or_default();
        let links = page.tracked_links();
        let distinct_images = target
            .as_ref()
            .map(|target| target.image_urls().len())
            .unwrap_or(0);

        Self {
            page: path.display().to_string(),
            active: target.is_some(),
            settings,
            links,
            distinct_images,
        }
    }

    pub fn render_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "page: {}", self.page);
        let _ = writeln!(
            out,
            "preview: {}",
            if self.active { "active" } else { "inactive" }
        );
        let _ = writeln!(out, "grid: {}", self.settings.grid);
        let _ = writeln!(out, "mouse: {}", self.settings.mouse);
        let _ = writeln!(out, "strength: {}", self.settings.strength);
        let _ = writeln!(out, "relaxation: {}", self.settings.relaxation);
        let _ = writeln!(
            out,
            "links: {} ({} distinct images)",
            self.links.len(),
            self.distinct_images
        );
        for link in &self.links {
            match &link.href {
                Some(href) => {
                    let _ = writeln!(out, "  {} -> {}", link.image, href);
                }
                None => {
                    let _ = writeln!(out, "  {} (no href)", link.image);
                }
            }
        }
        out
    }
}

pub fn run(args: &CheckArgs) -> Result<()> {
    let page = PageDescription::load(&args.page)
        .with_context(|| format!("failed to load {}", args.page.display()))?;
    let report = CheckReport::build(&args.page, &page);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", report.render_text());
    }
    Ok(())
}
