use image::imageops::flip_vertical_in_place;
use wgpu::util::{DeviceExt, TextureDataOrder};

use crate::engine::FrameError;
use crate::field::DisplacementField;
use crate::textures::DecodedImage;

const RGBA32F_BYTES_PER_TEXEL: u32 = 16;

/// An uploaded image together with the sampler the shader reads it with.
pub struct GpuImage {
    pub(crate) _texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
    pub width: u32,
    pub height: u32,
}

impl std::fmt::Debug for GpuImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GpuImage")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish()
    }
}

fn image_sampler(device: &wgpu::Device) -> wgpu::Sampler {
    device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some("preview image sampler"),
        address_mode_u: wgpu::AddressMode::ClampToEdge,
        address_mode_v: wgpu::AddressMode::ClampToEdge,
        address_mode_w: wgpu::AddressMode::ClampToEdge,
        mag_filter: wgpu::FilterMode::Linear,
        min_filter: wgpu::FilterMode::Linear,
        mipmap_filter: wgpu::FilterMode::Nearest,
        ..Default::default()
    })
}

fn rgba8_texture(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    label: &str,
    width: u32,
    height: u32,
    data: &[u8],
) -> GpuImage {
    let texture = device.create_texture_with_data(
        queue,
        &wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        },
        TextureDataOrder::LayerMajor,
        data,
    );
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    GpuImage {
        _texture: texture,
        view,
        sampler: image_sampler(device),
        width,
        height,
    }
}

/// Uploads a decoded image. Rows are flipped so `v = 0` is the bottom edge,
/// matching the quad's texture coordinates.
pub(crate) fn create_image_texture(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    image: &DecodedImage,
    max_dimension: u32,
) -> Result<GpuImage, FrameError> {
    let (width, height) = (image.width(), image.height());
    if width > max_dimension || height > max_dimension {
        return Err(FrameError::ImageTooLarge {
            width,
            height,
            limit: max_dimension,
        });
    }
    let mut pixels = image.pixels().clone();
    flip_vertical_in_place(&mut pixels);
    Ok(rgba8_texture(
        device,
        queue,
        "preview image texture",
        width,
        height,
        pixels.as_raw(),
    ))
}

/// 1x1 opaque white texture sampled while no image is active.
pub(crate) fn create_placeholder(device: &wgpu::Device, queue: &wgpu::Queue) -> GpuImage {
    rgba8_texture(
        device,
        queue,
        "placeholder image texture",
        1,
        1,
        &[255, 255, 255, 255],
    )
}

/// Float texture holding the displacement field, recreated when the grid
/// size changes and rewritten in place otherwise.
pub(crate) struct DisplacementTexture {
    texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
    size: u32,
}

impl DisplacementTexture {
    pub fn new(device: &wgpu::Device, size: u32) -> Self {
        let size = size.max(1);
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("displacement texture"),
            size: wgpu::Extent3d {
                width: size,
                height: size,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba32Float,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("displacement sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });
        Self {
            texture,
            view,
            sampler,
            size,
        }
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn write(&self, queue: &wgpu::Queue, field: &DisplacementField) {
        let size = field.size() as u32;
        if size != self.size {
            tracing::warn!(
                texture = self.size,
                field = size,
                "displacement field size mismatch; skipping upload"
            );
            return;
        }
        let texels = field.to_rgba();
        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &self.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            bytemuck::cast_slice(&texels),
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(size * RGBA32F_BYTES_PER_TEXEL),
                rows_per_image: Some(size),
            },
            wgpu::Extent3d {
                width: size,
                height: size,
                depth_or_array_layers: 1,
            },
        );
    }
}
