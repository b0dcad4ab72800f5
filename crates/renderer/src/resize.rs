use tracing::debug;

use crate::engine::{FrameBackend, RenderEngine};
use crate::types::PixelSize;

/// Per-axis scale that keeps an image of `image_aspect` (height / width)
/// from being stretched by a surface of `size`.
///
/// A taller surface than the image scales x, otherwise y is scaled. Zero
/// dimensions count as one pixel, and a non-positive or non-finite aspect
/// yields `(1, 1)`.
pub fn aspect_scale(size: PixelSize, image_aspect: f32) -> (f32, f32) {
    if !image_aspect.is_finite() || image_aspect <= 0.0 {
        return (1.0, 1.0);
    }
    let (width, height) = size.clamped_f32();
    if height / width > image_aspect {
        ((width / height) * image_aspect, 1.0)
    } else {
        (1.0, (height / width) / image_aspect)
    }
}

impl<B: FrameBackend> RenderEngine<B> {
    /// Recomputes the resolution uniform for `size` and draws a new field.
    pub fn on_resize(&mut self, size: PixelSize) {
        let (aspect_x, aspect_y) = aspect_scale(size, self.image_aspect);
        let (width, height) = size.clamped_f32();
        self.size = size;
        self.backend.configure(size);
        self.uniforms.resolution = [width, height, aspect_x, aspect_y];
        self.stats.resolution_updates += 1;
        self.stats.uniform_updates += 1;
        debug!(width, height, aspect_x, aspect_y, "resolution updated");
        self.regenerate_field();
    }
}
