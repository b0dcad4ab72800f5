//! The render engine: one camera, one quad, one shader program.
//!
//! The engine never talks to the GPU directly. Everything that touches device
//! memory goes through a [`FrameBackend`], so the uniform bookkeeping here can
//! be driven by a recording backend in tests and by wgpu in the host.

use bytemuck::{Pod, Zeroable};
use pageconfig::PreviewSettings;
use tracing::debug;

use crate::field::{DisplacementField, FieldGenerator};
use crate::resize::aspect_scale;
use crate::textures::DecodedImage;
use crate::types::PixelSize;

#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error("rendering surface was lost or is outdated")]
    SurfaceLost,
    #[error("timed out waiting for the next surface texture")]
    Timeout,
    #[error("GPU is out of memory")]
    OutOfMemory,
    #[error("image is {width}x{height}, the device allows at most {limit} per side")]
    ImageTooLarge { width: u32, height: u32, limit: u32 },
    #[error("render backend error: {0}")]
    Other(String),
}

impl FrameError {
    /// Errors after which the host cannot keep rendering.
    pub fn is_fatal(&self) -> bool {
        matches!(self, FrameError::OutOfMemory)
    }
}

/// GPU boundary used by [`RenderEngine`].
pub trait FrameBackend {
    /// Handle to an uploaded image texture.
    type Image: Clone;

    fn create_image(&mut self, image: &DecodedImage) -> Result<Self::Image, FrameError>;

    /// Uploads the quad geometry. Called once when the engine is built.
    fn upload_quad(&mut self, quad: &Quad);

    /// Resizes the render target.
    fn configure(&mut self, size: PixelSize);

    fn write_displacement(&mut self, field: &DisplacementField);

    /// `None` binds the white placeholder.
    fn bind_image(&mut self, image: Option<&Self::Image>);

    fn draw(&mut self, uniforms: &FrameUniforms) -> Result<(), FrameError>;
}

/// Orthographic camera looking down -Z.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrthoCamera {
    pub left: f32,
    pub right: f32,
    pub top: f32,
    pub bottom: f32,
    pub near: f32,
    pub far: f32,
    pub position_z: f32,
}

impl OrthoCamera {
    /// One-unit frustum centred on the origin, so the unit quad fills the view.
    pub fn unit_frustum() -> Self {
        Self {
            left: -0.5,
            right: 0.5,
            top: 0.5,
            bottom: -0.5,
            near: -1000.0,
            far: 1000.0,
            position_z: 2.0,
        }
    }

    /// Column-major projection * view matrix with depth mapped to `[0, 1]`.
    pub fn view_projection(&self) -> [[f32; 4]; 4] {
        let width = self.right - self.left;
        let height = self.top - self.bottom;
        let depth = self.far - self.near;
        [
            [2.0 / width, 0.0, 0.0, 0.0],
            [0.0, 2.0 / height, 0.0, 0.0],
            [0.0, 0.0, -1.0 / depth, 0.0],
            [
                -(self.right + self.left) / width,
                -(self.top + self.bottom) / height,
                (self.position_z - self.near) / depth,
                1.0,
            ],
        ]
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct QuadVertex {
    pub position: [f32; 3],
    pub uv: [f32; 2],
}

/// Unit square in the XY plane, counter-clockwise from the bottom-left.
#[derive(Debug, Clone, PartialEq)]
pub struct Quad {
    pub vertices: [QuadVertex; 4],
    pub indices: [u16; 6],
}

impl Quad {
    pub fn unit() -> Self {
        Self {
            vertices: [
                QuadVertex {
                    position: [-0.5, -0.5, 0.0],
                    uv: [0.0, 0.0],
                },
                QuadVertex {
                    position: [0.5, -0.5, 0.0],
                    uv: [1.0, 0.0],
                },
                QuadVertex {
                    position: [0.5, 0.5, 0.0],
                    uv: [1.0, 1.0],
                },
                QuadVertex {
                    position: [-0.5, 0.5, 0.0],
                    uv: [0.0, 1.0],
                },
            ],
            indices: [0, 1, 2, 0, 2, 3],
        }
    }
}

/// Uniform values the shader sees for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameUniforms {
    pub projection: [[f32; 4]; 4],
    pub time: f32,
    /// `(width, height, aspect_x, aspect_y)`.
    pub resolution: [f32; 4],
    pub strength: f32,
}

/// Inputs owned by the engine and mutated by the loop and the resize handler.
#[derive(Debug, Clone)]
pub struct ShaderUniformState<I> {
    pub time: f32,
    pub resolution: [f32; 4],
    pub image: Option<I>,
    pub displacement: DisplacementField,
}

/// Counters for the mutations the engine has performed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineStats {
    /// Any write to time, resolution, or the displacement texture.
    pub uniform_updates: u64,
    pub field_generations: u64,
    pub resolution_updates: u64,
    pub draws: u64,
}

pub struct RenderEngine<B: FrameBackend> {
    pub(crate) backend: B,
    camera: OrthoCamera,
    quad: Quad,
    pub(crate) uniforms: ShaderUniformState<B::Image>,
    pub(crate) image_aspect: f32,
    pub(crate) size: PixelSize,
    grid: usize,
    strength: f32,
    generator: FieldGenerator,
    pub(crate) stats: EngineStats,
}

impl<B: FrameBackend> RenderEngine<B> {
    pub fn new(
        mut backend: B,
        settings: &PreviewSettings,
        size: PixelSize,
        mut generator: FieldGenerator,
    ) -> Self {
        let camera = OrthoCamera::unit_frustum();
        let quad = Quad::unit();
        backend.upload_quad(&quad);
        backend.configure(size);
        backend.bind_image(None);

        let image_aspect = 1.0;
        let (aspect_x, aspect_y) = aspect_scale(size, image_aspect);
        let (width, height) = size.clamped_f32();
        let displacement = generator.generate(settings.grid);
        backend.write_displacement(&displacement);

        Self {
            backend,
            camera,
            quad,
            uniforms: ShaderUniformState {
                time: 0.0,
                resolution: [width, height, aspect_x, aspect_y],
                image: None,
                displacement,
            },
            image_aspect,
            size,
            grid: settings.grid,
            strength: settings.strength,
            generator,
            stats: EngineStats::default(),
        }
    }

    /// Issues one frame with the current uniforms.
    pub fn draw(&mut self) -> Result<(), FrameError> {
        let frame = FrameUniforms {
            projection: self.camera.view_projection(),
            time: self.uniforms.time,
            resolution: self.uniforms.resolution,
            strength: self.strength,
        };
        self.backend.draw(&frame)?;
        self.stats.draws += 1;
        Ok(())
    }

    /// Swaps the active image and recomputes the aspect scale for it.
    pub fn set_active_image(&mut self, image: B::Image, image_aspect: f32) {
        self.backend.bind_image(Some(&image));
        self.uniforms.image = Some(image);
        self.image_aspect = image_aspect;
        debug!(image_aspect, "active image changed");
        self.on_resize(self.size);
    }

    /// Replaces the displacement field with a freshly drawn one.
    pub fn regenerate_field(&mut self) {
        self.uniforms.displacement = self.generator.generate(self.grid);
        self.backend.write_displacement(&self.uniforms.displacement);
        self.stats.field_generations += 1;
        self.stats.uniform_updates += 1;
    }

    /// Applies one step of relaxation decay and re-uploads the field.
    pub fn relax_field(&mut self, relaxation: f32) {
        self.uniforms.displacement.decay(relaxation);
        self.backend.write_displacement(&self.uniforms.displacement);
        self.stats.uniform_updates += 1;
    }

    pub fn set_time(&mut self, time: f32) {
        self.uniforms.time = time;
        self.stats.uniform_updates += 1;
    }

    pub fn time(&self) -> f32 {
        self.uniforms.time
    }

    pub fn resolution(&self) -> [f32; 4] {
        self.uniforms.resolution
    }

    pub fn field(&self) -> &DisplacementField {
        &self.uniforms.displacement
    }

    pub fn active_image(&self) -> Option<&B::Image> {
        self.uniforms.image.as_ref()
    }

    pub fn image_aspect(&self) -> f32 {
        self.image_aspect
    }

    pub fn size(&self) -> PixelSize {
        self.size
    }

    pub fn camera(&self) -> &OrthoCamera {
        &self.camera
    }

    pub fn quad(&self) -> &Quad {
        &self.quad
    }

    pub fn stats(&self) -> EngineStats {
        self.stats
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }
}
