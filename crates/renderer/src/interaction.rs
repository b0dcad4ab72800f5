//! Maps pointer and touch events on project links to preview transitions.

use pageconfig::ProjectLink;
use tracing::{debug, trace};

use crate::engine::FrameBackend;
use crate::preview::Preview;

/// Input style, decided once when the dispatcher is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InteractionMode {
    /// Hover shows the preview, leaving hides it.
    #[default]
    Pointer,
    /// Tap shows the preview plus a confirm control that navigates.
    Touch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PreviewPhase {
    #[default]
    Idle,
    Previewing,
}

/// Request to open a link target in a new browsing context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationRequest {
    pub url: String,
    pub new_context: bool,
}

#[derive(Debug)]
pub struct InteractionDispatcher {
    mode: InteractionMode,
    phase: PreviewPhase,
    canvas_visible: bool,
    confirm_visible: bool,
    remembered: Option<String>,
}

impl InteractionDispatcher {
    pub fn new(mode: InteractionMode) -> Self {
        Self {
            mode,
            phase: PreviewPhase::Idle,
            canvas_visible: false,
            confirm_visible: false,
            remembered: None,
        }
    }

    pub fn mode(&self) -> InteractionMode {
        self.mode
    }

    pub fn phase(&self) -> PreviewPhase {
        self.phase
    }

    pub fn canvas_visible(&self) -> bool {
        self.canvas_visible
    }

    pub fn confirm_visible(&self) -> bool {
        self.confirm_visible
    }

    /// Link target remembered by the last tap, if any.
    pub fn remembered(&self) -> Option<&str> {
        self.remembered.as_deref()
    }

    pub fn hover_enter<B: FrameBackend>(&mut self, preview: &mut Preview<B>, link: &ProjectLink) {
        if self.mode != InteractionMode::Pointer {
            trace!(image = %link.image, "hover ignored in touch mode");
            return;
        }
        preview.show_image(&link.image);
        preview.start();
        self.canvas_visible = true;
        self.phase = PreviewPhase::Previewing;
        debug!(image = %link.image, "preview shown on hover");
    }

    pub fn hover_leave<B: FrameBackend>(&mut self, preview: &mut Preview<B>) {
        if self.mode != InteractionMode::Pointer {
            trace!("hover leave ignored in touch mode");
            return;
        }
        preview.stop();
        self.canvas_visible = false;
        self.phase = PreviewPhase::Idle;
        debug!("preview hidden on hover leave");
    }

    pub fn tap<B: FrameBackend>(&mut self, preview: &mut Preview<B>, link: &ProjectLink) {
        if self.mode != InteractionMode::Touch {
            trace!(image = %link.image, "tap ignored in pointer mode");
            return;
        }
        preview.show_image(&link.image);
        preview.start();
        self.canvas_visible = true;
        self.confirm_visible = true;
        self.remembered = link.href.clone();
        self.phase = PreviewPhase::Previewing;
        debug!(image = %link.image, href = ?link.href, "preview shown on tap");
    }

    pub fn tap_outside<B: FrameBackend>(&mut self, preview: &mut Preview<B>) {
        if self.mode != InteractionMode::Touch {
            trace!("outside tap ignored in pointer mode");
            return;
        }
        preview.stop();
        self.canvas_visible = false;
        self.confirm_visible = false;
        self.remembered = None;
        self.phase = PreviewPhase::Idle;
        debug!("preview dismissed");
    }

    /// Navigation for the remembered target. Leaves the preview as it is.
    pub fn tap_confirm(&self) -> Option<NavigationRequest> {
        if self.mode != InteractionMode::Touch {
            trace!("confirm ignored in pointer mode");
            return None;
        }
        let url = self.remembered.clone()?;
        Some(NavigationRequest {
            url,
            new_context: true,
        })
    }
}
