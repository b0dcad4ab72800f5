use std::sync::Arc;

use anyhow::Result;
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use wgpu::util::DeviceExt;

use crate::engine::{FrameBackend, FrameError, FrameUniforms, Quad};
use crate::field::DisplacementField;
use crate::textures::DecodedImage;
use crate::types::PixelSize;

use super::context::GpuContext;
use super::pipeline::PreviewPipeline;
use super::textures::{self, DisplacementTexture, GpuImage};
use super::uniforms::PreviewUniforms;

/// Page background behind the preview, `#eeeeee`.
const CLEAR_SRGB: f64 = 238.0 / 255.0;

impl From<wgpu::SurfaceError> for FrameError {
    fn from(value: wgpu::SurfaceError) -> Self {
        match value {
            wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated => FrameError::SurfaceLost,
            wgpu::SurfaceError::Timeout => FrameError::Timeout,
            wgpu::SurfaceError::OutOfMemory => FrameError::OutOfMemory,
            other => FrameError::Other(other.to_string()),
        }
    }
}

struct QuadBuffers {
    vertices: wgpu::Buffer,
    indices: wgpu::Buffer,
    index_count: u32,
}

/// wgpu implementation of [`FrameBackend`] drawing into a window surface.
pub struct GpuBackend {
    context: GpuContext,
    pipeline: PreviewPipeline,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    quad: Option<QuadBuffers>,
    placeholder: Arc<GpuImage>,
    active: Option<Arc<GpuImage>>,
    displacement: DisplacementTexture,
    texture_bind_group: Option<wgpu::BindGroup>,
    clear_color: wgpu::Color,
}

impl GpuBackend {
    /// Sets up the device and surface for `target`, which must outlive the
    /// backend.
    pub fn new<T>(target: &T, size: PixelSize) -> Result<Self>
    where
        T: HasDisplayHandle + HasWindowHandle,
    {
        let context = GpuContext::new(target, size)?;
        let pipeline = PreviewPipeline::new(&context.device, context.surface_format);

        let uniform_buffer = context.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("uniform buffer"),
            size: std::mem::size_of::<PreviewUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let uniform_bind_group = context
            .device
            .create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("uniform bind group"),
                layout: &pipeline.uniform_layout,
                entries: &[wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniform_buffer.as_entire_binding(),
                }],
            });

        let placeholder = Arc::new(textures::create_placeholder(
            &context.device,
            &context.queue,
        ));
        let displacement = DisplacementTexture::new(&context.device, 1);

        let clear = if context.surface_format.is_srgb() {
            srgb_to_linear(CLEAR_SRGB)
        } else {
            CLEAR_SRGB
        };

        Ok(Self {
            context,
            pipeline,
            uniform_buffer,
            uniform_bind_group,
            quad: None,
            placeholder,
            active: None,
            displacement,
            texture_bind_group: None,
            clear_color: wgpu::Color {
                r: clear,
                g: clear,
                b: clear,
                a: 1.0,
            },
        })
    }

    pub fn size(&self) -> PixelSize {
        self.context.size
    }

    /// Reconfigures the surface after it was lost or became outdated.
    pub fn recover_surface(&mut self) {
        self.context.reconfigure();
    }

    /// Presents an empty page-coloured frame, used while the canvas is hidden.
    pub fn clear_frame(&mut self) -> Result<(), FrameError> {
        let frame = self.context.surface.get_current_texture()?;
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder =
            self.context
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("clear encoder"),
                });
        {
            let _pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("clear pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_color),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });
        }
        self.context.queue.submit(std::iter::once(encoder.finish()));
        frame.present();
        Ok(())
    }

    /// Rebuilds the texture bind group after the image or field texture changed.
    fn ensure_texture_bind_group(&mut self) {
        if self.texture_bind_group.is_some() {
            return;
        }
        let image = self.active.as_ref().unwrap_or(&self.placeholder);
        self.texture_bind_group = Some(self.pipeline.texture_bind_group(
            &self.context.device,
            image,
            &self.displacement,
        ));
    }
}

impl FrameBackend for GpuBackend {
    type Image = Arc<GpuImage>;

    fn create_image(&mut self, image: &DecodedImage) -> Result<Self::Image, FrameError> {
        textures::create_image_texture(
            &self.context.device,
            &self.context.queue,
            image,
            self.context.max_texture_dimension,
        )
        .map(Arc::new)
    }

    fn upload_quad(&mut self, quad: &Quad) {
        let device = &self.context.device;
        let vertices = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("quad vertices"),
            contents: bytemuck::cast_slice(&quad.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let indices = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("quad indices"),
            contents: bytemuck::cast_slice(&quad.indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        self.quad = Some(QuadBuffers {
            vertices,
            indices,
            index_count: quad.indices.len() as u32,
        });
    }

    fn configure(&mut self, size: PixelSize) {
        self.context.resize(size);
    }

    fn write_displacement(&mut self, field: &DisplacementField) {
        let limit = self.context.max_texture_dimension;
        let Some(size) = u32::try_from(field.size()).ok().filter(|size| *size <= limit) else {
            tracing::warn!(
                size = field.size(),
                limit,
                "displacement field exceeds the device texture limit; skipping upload"
            );
            return;
        };
        if size != self.displacement.size() {
            self.displacement = DisplacementTexture::new(&self.context.device, size);
            self.texture_bind_group = None;
        }
        self.displacement.write(&self.context.queue, field);
    }

    fn bind_image(&mut self, image: Option<&Self::Image>) {
        self.active = image.cloned();
        self.texture_bind_group = None;
    }

    fn draw(&mut self, frame_uniforms: &FrameUniforms) -> Result<(), FrameError> {
        let frame = self.context.surface.get_current_texture()?;
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let uniforms = PreviewUniforms::from_frame(frame_uniforms);
        self.context
            .queue
            .write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&uniforms));

        self.ensure_texture_bind_group();
        let (Some(quad), Some(texture_bind_group)) =
            (self.quad.as_ref(), self.texture_bind_group.as_ref())
        else {
            return Err(FrameError::Other("quad geometry was never uploaded".into()));
        };

        let mut encoder =
            self.context
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("render encoder"),
                });
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("preview pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_color),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });
            render_pass.set_pipeline(&self.pipeline.pipeline);
            render_pass.set_bind_group(0, &self.uniform_bind_group, &[]);
            render_pass.set_bind_group(1, texture_bind_group, &[]);
            render_pass.set_vertex_buffer(0, quad.vertices.slice(..));
            render_pass.set_index_buffer(quad.indices.slice(..), wgpu::IndexFormat::Uint16);
            render_pass.draw_indexed(0..quad.index_count, 0, 0..1);
        }
        self.context.queue.submit(std::iter::once(encoder.finish()));
        frame.present();
        Ok(())
    }
}

fn srgb_to_linear(value: f64) -> f64 {
    if value <= 0.04045 {
        value / 12.92
    } else {
        ((value + 0.055) / 1.055).powf(2.4)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_background_converts_to_linear() {
        let linear = srgb_to_linear(CLEAR_SRGB);
        assert!((linear - 0.855).abs() < 1e-3, "got {linear}");
        assert_eq!(srgb_to_linear(0.0), 0.0);
        assert!((srgb_to_linear(1.0) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn surface_errors_map_to_frame_errors() {
        assert!(matches!(
            FrameError::from(wgpu::SurfaceError::Outdated),
            FrameError::SurfaceLost
        ));
        assert!(FrameError::from(wgpu::SurfaceError::OutOfMemory).is_fatal());
    }
}
