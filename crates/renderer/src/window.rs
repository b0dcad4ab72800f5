use std::process::Command;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{anyhow, Context, Result};
use pageconfig::{PreviewTarget, ProjectLink};
use tracing::{debug, error, info, warn};
use winit::dpi::{PhysicalPosition, PhysicalSize};
use winit::event::{ElementState, Event, MouseButton, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop, EventLoopWindowTarget};
use winit::keyboard::{Key, NamedKey};
use winit::window::{Window, WindowBuilder};

use crate::engine::FrameError;
use crate::gpu::GpuBackend;
use crate::interaction::{InteractionDispatcher, InteractionMode, NavigationRequest};
use crate::layout::{Hit, LinkLayout};
use crate::preview::Preview;
use crate::textures::PageImageSource;
use crate::types::{HostConfig, PixelSize};

/// How often the idle loop wakes up to collect finished image loads.
const TEXTURE_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Window-side state. `preview` is declared before `window` so the surface
/// is dropped before the window it was created from.
struct HostState {
    preview: Preview<GpuBackend>,
    dispatcher: InteractionDispatcher,
    layout: LinkLayout,
    links: Vec<ProjectLink>,
    hovered: Option<usize>,
    cursor: Option<PhysicalPosition<f64>>,
    needs_clear: bool,
    title: String,
    window: Arc<Window>,
}

impl HostState {
    fn size(&self) -> PixelSize {
        let size = self.window.inner_size();
        PixelSize::new(size.width, size.height)
    }

    fn hit_at(&self, position: PhysicalPosition<f64>) -> Hit {
        self.layout.hit_test(
            position.x,
            position.y,
            self.size(),
            self.dispatcher.confirm_visible(),
        )
    }

    fn handle_cursor_moved(&mut self, position: PhysicalPosition<f64>) {
        self.cursor = Some(position);
        let over = match self.hit_at(position) {
            Hit::Link(index) => Some(index),
            Hit::Confirm | Hit::Outside => None,
        };
        self.update_title(over);
        if self.dispatcher.mode() == InteractionMode::Pointer {
            self.set_hovered(over);
        }
    }

    fn handle_cursor_left(&mut self) {
        self.cursor = None;
        self.update_title(None);
        if self.dispatcher.mode() == InteractionMode::Pointer {
            self.set_hovered(None);
        }
    }

    fn set_hovered(&mut self, over: Option<usize>) {
        if over == self.hovered {
            return;
        }
        if self.hovered.take().is_some() {
            self.dispatcher.hover_leave(&mut self.preview);
            self.needs_clear = true;
        }
        if let Some(link) = over.and_then(|index| self.links.get(index)) {
            self.dispatcher.hover_enter(&mut self.preview, link);
            self.hovered = over;
        }
        self.window.request_redraw();
    }

    fn handle_click(&mut self) {
        if self.dispatcher.mode() != InteractionMode::Touch {
            return;
        }
        let Some(position) = self.cursor else {
            return;
        };
        match self.hit_at(position) {
            Hit::Link(index) => {
                if let Some(link) = self.links.get(index) {
                    self.dispatcher.tap(&mut self.preview, link);
                }
            }
            Hit::Confirm => self.confirm(),
            Hit::Outside => {
                self.dispatcher.tap_outside(&mut self.preview);
                self.needs_clear = true;
            }
        }
        self.refresh_title();
        self.window.request_redraw();
    }

    fn confirm(&mut self) {
        if !self.dispatcher.confirm_visible() {
            return;
        }
        if let Some(request) = self.dispatcher.tap_confirm() {
            open_navigation(&request);
        }
    }

    fn refresh_title(&self) {
        let over = self.cursor.and_then(|position| match self.hit_at(position) {
            Hit::Link(index) => Some(index),
            Hit::Confirm | Hit::Outside => None,
        });
        self.update_title(over);
    }

    fn update_title(&self, over: Option<usize>) {
        let mut title = match over.and_then(|index| self.links.get(index)) {
            Some(link) => format!(
                "{}: {}",
                self.title,
                link.href.as_deref().unwrap_or(&link.image)
            ),
            None => self.title.clone(),
        };
        if self.dispatcher.confirm_visible() {
            title.push_str(" [click centre or press Enter to visit]");
        }
        self.window.set_title(&title);
    }

    fn render(&mut self, elwt: &EventLoopWindowTarget<()>) {
        let result = if self.dispatcher.canvas_visible() {
            self.preview.frame(Instant::now()).map(|_| ())
        } else if self.needs_clear {
            self.needs_clear = false;
            self.preview.engine_mut().backend_mut().clear_frame()
        } else {
            Ok(())
        };
        if let Err(err) = result {
            self.handle_frame_error(err, elwt);
        }
    }

    fn handle_frame_error(&mut self, err: FrameError, elwt: &EventLoopWindowTarget<()>) {
        match err {
            FrameError::SurfaceLost => {
                debug!("surface lost; reconfiguring");
                self.preview.engine_mut().backend_mut().recover_surface();
            }
            FrameError::Timeout => {
                warn!("surface timeout; retrying next frame");
            }
            err if err.is_fatal() => {
                error!(error = %err, "unrecoverable render error; closing preview");
                elwt.exit();
            }
            err => {
                warn!(error = %err, "frame failed; retrying next frame");
            }
        }
    }

    fn schedule(&mut self, elwt: &EventLoopWindowTarget<()>) {
        let now = Instant::now();
        let stored = self.preview.pump_textures();
        if stored > 0 {
            debug!(stored, pending = self.preview.pending_loads(), "textures stored");
        }

        let scheduler = self.preview.scheduler();
        let poll_deadline =
            (self.preview.pending_loads() > 0).then(|| now + TEXTURE_POLL_INTERVAL);
        if (self.dispatcher.canvas_visible() && scheduler.ready_for_frame(now)) || self.needs_clear
        {
            self.window.request_redraw();
            elwt.set_control_flow(ControlFlow::Wait);
        } else if let Some(deadline) = scheduler
            .next_deadline()
            .into_iter()
            .chain(poll_deadline)
            .min()
        {
            elwt.set_control_flow(ControlFlow::WaitUntil(deadline));
        } else {
            elwt.set_control_flow(ControlFlow::Wait);
        }
    }
}

/// Opens the requested URL with the platform's default handler.
fn open_navigation(request: &NavigationRequest) {
    info!(url = %request.url, "opening link");
    let result = if cfg!(target_os = "macos") {
        Command::new("open").arg(&request.url).spawn()
    } else if cfg!(target_os = "windows") {
        Command::new("cmd")
            .args(["/C", "start", ""])
            .arg(&request.url)
            .spawn()
    } else {
        Command::new("xdg-open").arg(&request.url).spawn()
    };
    if let Err(err) = result {
        warn!(url = %request.url, error = %err, "failed to open link");
    }
}

/// Opens the preview window for `target` and runs until it is closed.
pub fn run_preview(target: PreviewTarget, config: HostConfig) -> Result<()> {
    let event_loop = EventLoop::new().map_err(|err| anyhow!("failed to create event loop: {err}"))?;
    let requested = config.preview.size;
    let window = WindowBuilder::new()
        .with_title(&config.title)
        .with_inner_size(PhysicalSize::new(
            requested.width.max(1),
            requested.height.max(1),
        ))
        .build(&event_loop)
        .map_err(|err| anyhow!("failed to create preview window: {err}"))?;
    let window = Arc::new(window);

    let inner = window.inner_size();
    let size = PixelSize::new(inner.width, inner.height);
    let backend = GpuBackend::new(window.as_ref(), size)
        .context("failed to initialise the rendering context")?;

    let mut options = config.preview.clone();
    options.size = size;
    let source = Arc::new(
        PageImageSource::new(options.asset_root.clone())
            .context("failed to build the image HTTP client")?,
    );
    let mut preview = Preview::new(backend, &target.settings, &options, source);
    preview.preload(target.image_urls());

    info!(
        links = target.links.len(),
        mode = ?config.mode,
        grid = target.settings.grid,
        "preview window ready"
    );

    let mut state = HostState {
        preview,
        dispatcher: InteractionDispatcher::new(config.mode),
        layout: LinkLayout::new(target.links.len()),
        links: target.links,
        hovered: None,
        cursor: None,
        needs_clear: true,
        title: config.title,
        window,
    };
    state.window.request_redraw();

    event_loop
        .run(move |event, elwt| match event {
            Event::WindowEvent { window_id, event } if window_id == state.window.id() => {
                match event {
                    WindowEvent::CloseRequested | WindowEvent::Destroyed => {
                        state.preview.stop();
                        elwt.exit();
                    }
                    WindowEvent::Resized(new_size) => {
                        state
                            .preview
                            .resize(PixelSize::new(new_size.width, new_size.height));
                        state.needs_clear = !state.dispatcher.canvas_visible();
                        state.window.request_redraw();
                    }
                    WindowEvent::CursorMoved { position, .. } => {
                        state.handle_cursor_moved(position);
                    }
                    WindowEvent::CursorLeft { .. } => {
                        state.handle_cursor_left();
                    }
                    WindowEvent::MouseInput {
                        state: ElementState::Pressed,
                        button: MouseButton::Left,
                        ..
                    } => {
                        state.handle_click();
                    }
                    WindowEvent::KeyboardInput { event, .. } => {
                        let is_enter = matches!(event.logical_key, Key::Named(NamedKey::Enter));
                        if is_enter && event.state == ElementState::Pressed && !event.repeat {
                            state.confirm();
                        }
                    }
                    WindowEvent::RedrawRequested => {
                        state.render(elwt);
                    }
                    _ => {}
                }
            }
            Event::AboutToWait => {
                state.schedule(elwt);
            }
            _ => {}
        })
        .map_err(|err| anyhow!("window event loop error: {err}"))
}
