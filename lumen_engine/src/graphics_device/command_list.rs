/// Command recording types: barriers, dynamic rendering, viewport state

use crate::graphics_device::{
    AccessFlags, Extent2D, ImageAspect, ImageKey, ImageLayout, PipelineStages,
};

/// Viewport dimensions and depth range
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub min_depth: f32,
    pub max_depth: f32,
}

impl Viewport {
    /// Full-extent viewport with a 0..1 depth range
    pub fn from_extent(extent: Extent2D) -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: extent.width as f32,
            height: extent.height as f32,
            min_depth: 0.0,
            max_depth: 1.0,
        }
    }
}

/// 2D rectangle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect2D {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Rect2D {
    pub fn from_extent(extent: Extent2D) -> Self {
        Self { x: 0, y: 0, width: extent.width, height: extent.height }
    }
}

/// Clear value for an attachment
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ClearValue {
    /// Color clear value (RGBA)
    Color([f32; 4]),
    /// Depth/stencil clear value
    DepthStencil { depth: f32, stencil: u32 },
}

/// Multisample resolve mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveMode {
    Average,
    SampleZero,
}

/// Single-sample target a multisampled attachment resolves into
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolveTarget {
    pub image: ImageKey,
    pub layout: ImageLayout,
    pub mode: ResolveMode,
}

/// One attachment of a dynamic rendering pass (always cleared and stored)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderingAttachment {
    pub image: ImageKey,
    pub layout: ImageLayout,
    pub clear: ClearValue,
    pub resolve: Option<ResolveTarget>,
}

/// Dynamic rendering pass description
#[derive(Debug, Clone, PartialEq)]
pub struct RenderingInfo {
    pub extent: Extent2D,
    pub color_attachments: Vec<RenderingAttachment>,
    pub depth_attachment: Option<RenderingAttachment>,
}

/// Image memory barrier, fully resolved (masks already looked up)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageBarrier {
    pub image: ImageKey,
    pub aspect: ImageAspect,
    pub mip_levels: u32,
    pub old_layout: ImageLayout,
    pub new_layout: ImageLayout,
    pub src_access: AccessFlags,
    pub dst_access: AccessFlags,
    pub src_stage: PipelineStages,
    pub dst_stage: PipelineStages,
}
