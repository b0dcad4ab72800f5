use std::path::PathBuf;

use scheduler::FramePacing;

use crate::interaction::InteractionMode;

/// Surface size in physical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelSize {
    pub width: u32,
    pub height: u32,
}

impl PixelSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Width and height as floats, with zero clamped to one pixel.
    pub fn clamped_f32(self) -> (f32, f32) {
        (self.width.max(1) as f32, self.height.max(1) as f32)
    }

    pub fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Options the host passes when building a preview.
#[derive(Debug, Clone)]
pub struct PreviewOptions {
    /// Initial surface size.
    pub size: PixelSize,
    /// Frame-rate pacing for the animation loop.
    pub pacing: FramePacing,
    /// Seed for the displacement field; `None` seeds from entropy.
    pub seed: Option<u64>,
    /// Directory that root-relative and relative image URLs resolve against.
    pub asset_root: PathBuf,
}

impl Default for PreviewOptions {
    fn default() -> Self {
        Self {
            size: PixelSize::new(1280, 720),
            pacing: FramePacing::default(),
            seed: None,
            asset_root: PathBuf::from("."),
        }
    }
}

/// Configuration for the desktop preview window.
#[derive(Debug, Clone)]
pub struct HostConfig {
    /// Window title prefix.
    pub title: String,
    /// Interaction mode, decided once by the caller.
    pub mode: InteractionMode,
    pub preview: PreviewOptions,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            title: "gridwarp".to_string(),
            mode: InteractionMode::Pointer,
            preview: PreviewOptions::default(),
        }
    }
}
