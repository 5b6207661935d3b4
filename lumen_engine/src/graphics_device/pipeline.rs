/// Fixed-function pipeline state and pipeline creation descriptors

use crate::graphics_device::{
    DescriptorSetLayoutKey, Format, PipelineCacheKey, PipelineLayoutKey, SampleCount,
    ShaderModuleKey, ShaderStages,
};

/// Primitive topology
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveTopology {
    TriangleList,
    TriangleStrip,
    LineList,
    PointList,
}

/// Rasterizer fill mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolygonMode {
    Fill,
    Line,
}

/// Face culling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CullMode {
    None,
    Front,
    Back,
}

/// Winding order considered front-facing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrontFace {
    Clockwise,
    CounterClockwise,
}

/// Depth comparison
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Never,
    Less,
    LessOrEqual,
    Always,
}

/// States left dynamic in the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DynamicState {
    Viewport,
    Scissor,
}

/// Per-attachment blend state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorBlendAttachment {
    pub blend_enable: bool,
    /// RGBA write mask, bit 0 = R
    pub write_mask: u8,
}

impl ColorBlendAttachment {
    /// No blending, all channels written
    pub const OPAQUE: ColorBlendAttachment = ColorBlendAttachment {
        blend_enable: false,
        write_mask: 0b1111,
    };
}

/// Vertex buffer binding description
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexBinding {
    pub binding: u32,
    pub stride: u32,
}

/// Vertex attribute description
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexAttribute {
    pub location: u32,
    pub binding: u32,
    pub format: Format,
    pub offset: u32,
}

/// Complete fixed-function state block for a graphics pipeline
///
/// Attachments are declared by format only; the pipeline is used with
/// dynamic rendering and never references a render pass object.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub topology: PrimitiveTopology,
    pub primitive_restart: bool,
    pub viewport_count: u32,
    pub scissor_count: u32,
    pub polygon_mode: PolygonMode,
    pub cull_mode: CullMode,
    pub front_face: FrontFace,
    pub line_width: f32,
    pub depth_clamp: bool,
    pub samples: SampleCount,
    pub sample_shading: bool,
    pub min_sample_shading: f32,
    pub color_blend_attachments: Vec<ColorBlendAttachment>,
    pub depth_test: bool,
    pub depth_write: bool,
    pub depth_compare: CompareOp,
    pub dynamic_states: Vec<DynamicState>,
    pub vertex_bindings: Vec<VertexBinding>,
    pub vertex_attributes: Vec<VertexAttribute>,
    pub color_attachment_formats: Vec<Format>,
    pub depth_attachment_format: Format,
    pub stencil_attachment_format: Format,
}

/// Push constant block visible to the pipeline layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PushConstantRange {
    pub stages: ShaderStages,
    pub offset: u32,
    pub size: u32,
}

/// Everything the device needs to compile one graphics pipeline
#[derive(Debug, Clone)]
pub struct GraphicsPipelineDesc<'a> {
    pub vertex_shader: ShaderModuleKey,
    pub fragment_shader: ShaderModuleKey,
    pub entry_point: &'a str,
    pub layout: PipelineLayoutKey,
    pub cache: PipelineCacheKey,
    pub config: &'a PipelineConfig,
}

/// Pipeline layout descriptor
#[derive(Debug, Clone)]
pub struct PipelineLayoutDesc<'a> {
    pub set_layouts: &'a [DescriptorSetLayoutKey],
    pub push_constant: Option<PushConstantRange>,
}
