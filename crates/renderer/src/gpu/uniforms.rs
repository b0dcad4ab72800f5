use bytemuck::{Pod, Zeroable};

use crate::engine::FrameUniforms;

/// std140 mirror of the `PreviewParams` block in the shaders.
#[repr(C, align(16))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct PreviewUniforms {
    pub projection: [[f32; 4]; 4],
    pub resolution: [f32; 4],
    pub time: f32,
    pub strength: f32,
    pub padding: [f32; 2],
}

unsafe impl Zeroable for PreviewUniforms {}
unsafe impl Pod for PreviewUniforms {}

impl PreviewUniforms {
    pub fn from_frame(frame: &FrameUniforms) -> Self {
        Self {
            projection: frame.projection,
            resolution: frame.resolution,
            time: frame.time,
            strength: frame.strength,
            padding: [0.0; 2],
        }
    }
}
