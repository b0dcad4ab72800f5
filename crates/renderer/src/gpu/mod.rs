//! wgpu side of the preview.
//!
//! - `context` owns instance/device/surface wiring and reconfigures the
//!   swapchain on resize or loss.
//! - `textures` uploads page images, the white placeholder, and the float
//!   displacement texture.
//! - `pipeline` compiles the GLSL pair and describes the bind group layouts.
//! - `uniforms` mirrors the shader's std140 uniform block.
//! - `backend` glues the pieces into a [`crate::FrameBackend`].

mod backend;
mod context;
mod pipeline;
mod textures;
mod uniforms;

pub use backend::GpuBackend;
pub use textures::GpuImage;
