use std::borrow::Cow;

use wgpu::naga::ShaderStage;

/// Compiles the quad vertex shader.
pub(crate) fn compile_vertex_shader(device: &wgpu::Device) -> wgpu::ShaderModule {
    device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("preview quad vertex"),
        source: wgpu::ShaderSource::Glsl {
            shader: Cow::Owned(vertex_source()),
            stage: ShaderStage::Vertex,
            defines: &[],
        },
    })
}

/// Compiles the grid-distortion fragment shader.
pub(crate) fn compile_fragment_shader(device: &wgpu::Device) -> wgpu::ShaderModule {
    device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("preview distortion fragment"),
        source: wgpu::ShaderSource::Glsl {
            shader: Cow::Owned(fragment_source()),
            stage: ShaderStage::Fragment,
            defines: &[],
        },
    })
}

fn vertex_source() -> String {
    format!("{UNIFORM_BLOCK}{VERTEX_BODY}")
}

fn fragment_source() -> String {
    format!("{UNIFORM_BLOCK}{FRAGMENT_BODY}")
}

/// Shared uniform block. Layout must match `PreviewUniforms` in `gpu::uniforms`.
const UNIFORM_BLOCK: &str = r"#version 450
layout(std140, set = 0, binding = 0) uniform PreviewParams {
    mat4 projection;
    vec4 resolution;
    float time;
    float strength;
    vec2 _padding;
} ubo;
";

const FRAGMENT_BODY: &str = r"
layout(location = 0) in vec2 vUv;
layout(location = 0) out vec4 outColor;

layout(set = 1, binding = 0) uniform texture2D uTexture;
layout(set = 1, binding = 1) uniform sampler uTextureSampler;
layout(set = 1, binding = 2) uniform texture2D uDataTexture;
layout(set = 1, binding = 3) uniform sampler uDataSampler;

void main() {
    vec2 newUV = (vUv - vec2(0.5)) * ubo.resolution.zw + vec2(0.5);
    vec4 offset = texture(sampler2D(uDataTexture, uDataSampler), vUv);
    outColor = texture(
        sampler2D(uTexture, uTextureSampler),
        newUV - 0.02 * ubo.strength * offset.rg
    );
}
";

const VERTEX_BODY: &str = r"
layout(location = 0) in vec3 position;
layout(location = 1) in vec2 uv;
layout(location = 0) out vec2 vUv;

void main() {
    vUv = uv;
    gl_Position = ubo.projection * vec4(position, 1.0);
}
";
