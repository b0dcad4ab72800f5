//! Renderer crate for gridwarp, the grid-distortion image preview.
//!
//! A hovered (or tapped) project link shows its image through a shader that
//! offsets every pixel by a coarse random displacement grid, which relaxes
//! back to zero frame by frame. The overall flow is:
//!
//! ```text
//!   winit events ──▶ InteractionDispatcher ──▶ Preview::start / stop
//!                                                   │
//!   FrameScheduler::begin_frame ──▶ AnimationLoop::tick
//!                                       │ relax field, advance time
//!                                       ▼
//!                               RenderEngine::draw ──▶ FrameBackend (wgpu)
//! ```
//!
//! Images load on worker threads and land in the [`TextureStore`] when the
//! host calls [`Preview::pump_textures`]. Everything else runs on the frame
//! thread. The engine only sees the GPU through [`FrameBackend`], so all of
//! the state machinery can be driven headless.

mod animation;
mod compile;
mod engine;
mod field;
mod gpu;
mod interaction;
mod layout;
mod preview;
mod resize;
mod textures;
mod types;
mod window;

pub use animation::{AnimationLoop, LoopState, TIME_STEP};
pub use engine::{
    EngineStats, FrameBackend, FrameError, FrameUniforms, OrthoCamera, Quad, QuadVertex,
    RenderEngine, ShaderUniformState,
};
pub use field::{
    DisplacementField, FieldGenerator, DISPLACEMENT_MAX, DISPLACEMENT_MIN, FIELD_CHANNELS,
};
pub use gpu::{GpuBackend, GpuImage};
pub use interaction::{InteractionDispatcher, InteractionMode, NavigationRequest, PreviewPhase};
pub use layout::{Hit, LinkLayout, CONFIRM_HEIGHT, CONFIRM_WIDTH, LINK_COLUMN_FRACTION};
pub use preview::Preview;
pub use resize::aspect_scale;
pub use textures::{
    DecodedImage, ImageSource, LoadError, LoadedImage, PageImageSource, StoredImage,
    TextureLoader, TextureStore,
};
pub use types::{HostConfig, PixelSize, PreviewOptions};
pub use window::run_preview;
