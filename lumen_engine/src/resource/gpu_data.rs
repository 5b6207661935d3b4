//! Host-side mirrors of the shader-visible data blocks.
//!
//! Every struct here is `#[repr(C)]` and `bytemuck::Pod`, laid out to match
//! std140 (uniform blocks) or the push-constant block it feeds. Padding is
//! spelled out as explicit fields so the byte image can be copied as-is.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec2, Vec3};

use crate::graphics_device::{Format, VertexAttribute, VertexBinding};

// ============================================================================
// VERTEX
// ============================================================================

/// Interleaved vertex: position, color, uv, normal, tangent
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub color: [f32; 3],
    pub uv: [f32; 2],
    pub normal: [f32; 3],
    pub tangent: [f32; 3],
}

impl Vertex {
    /// The single vertex buffer binding (binding 0, per-vertex rate)
    pub fn binding() -> VertexBinding {
        VertexBinding { binding: 0, stride: std::mem::size_of::<Vertex>() as u32 }
    }

    /// Attribute descriptions for locations 0..4
    pub fn attributes() -> Vec<VertexAttribute> {
        let attr = |location: u32, format: Format, offset: usize| VertexAttribute {
            location,
            binding: 0,
            format,
            offset: offset as u32,
        };
        vec![
            attr(0, Format::R32G32B32_SFLOAT, std::mem::offset_of!(Vertex, position)),
            attr(1, Format::R32G32B32_SFLOAT, std::mem::offset_of!(Vertex, color)),
            attr(2, Format::R32G32_SFLOAT, std::mem::offset_of!(Vertex, uv)),
            attr(3, Format::R32G32B32_SFLOAT, std::mem::offset_of!(Vertex, normal)),
            attr(4, Format::R32G32B32_SFLOAT, std::mem::offset_of!(Vertex, tangent)),
        ]
    }
}

// ============================================================================
// UNIFORM BLOCKS
// ============================================================================

/// Per-model transform block (binding 1 of the global set)
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct ModelUbo {
    pub model: Mat4,
}

impl Default for ModelUbo {
    fn default() -> Self {
        Self { model: Mat4::IDENTITY }
    }
}

/// Camera block shared by the geometry and lighting passes
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct CameraUbo {
    pub view: Mat4,
    pub proj: Mat4,
    pub camera_pos: [f32; 3],
    pub exposure: f32,
}

/// Point light as laid out inside `SceneLightingUbo`
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
pub struct PointLight {
    pub position: [f32; 3],
    _pad0: f32,
    pub color: [f32; 3],
    pub lumen: f32,
    pub radius: f32,
    _pad1: [f32; 3],
}

impl PointLight {
    pub fn new(position: Vec3, color: Vec3, radius: f32, lumen: f32) -> Self {
        Self {
            position: position.to_array(),
            _pad0: 0.0,
            color: color.to_array(),
            lumen,
            radius,
            _pad1: [0.0; 3],
        }
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
pub struct DirectionalLight {
    pub direction: [f32; 3],
    _pad0: f32,
    pub color: [f32; 3],
    pub lux: f32,
}

impl DirectionalLight {
    pub fn new(direction: Vec3, color: Vec3, lux: f32) -> Self {
        Self { direction: direction.to_array(), _pad0: 0.0, color: color.to_array(), lux }
    }
}

/// Maximum number of point lights the lighting shader reads
pub const MAX_POINT_LIGHTS: usize = 4;

/// Scene lighting block (binding 8 of the global and lighting sets)
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
pub struct SceneLightingUbo {
    pub lights: [PointLight; MAX_POINT_LIGHTS],
    pub directional_light: DirectionalLight,
    pub number_of_lights: i32,
    _pad: [i32; 3],
}

impl SceneLightingUbo {
    /// Build the block from up to `MAX_POINT_LIGHTS` lights; extra lights are ignored
    pub fn new(lights: &[PointLight], directional_light: DirectionalLight) -> Self {
        let mut block = Self { directional_light, ..Self::default() };
        let count = lights.len().min(MAX_POINT_LIGHTS);
        block.lights[..count].copy_from_slice(&lights[..count]);
        block.number_of_lights = count as i32;
        block
    }
}

// ============================================================================
// PUSH CONSTANTS
// ============================================================================

/// Geometry pass per-draw block (vertex + fragment)
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct GeometryPush {
    pub transform: Mat4,
    pub model_matrix: Mat4,
}

impl Default for GeometryPush {
    fn default() -> Self {
        Self { transform: Mat4::IDENTITY, model_matrix: Mat4::IDENTITY }
    }
}

/// Lighting pass block: reconstructs world position from screen coordinates
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct ScreenSizePush {
    pub inverse_screen_size: [f32; 2],
    _pad: [f32; 2],
    pub inverse_view_projection: Mat4,
}

impl ScreenSizePush {
    pub fn new(inverse_screen_size: Vec2, inverse_view_projection: Mat4) -> Self {
        Self {
            inverse_screen_size: inverse_screen_size.to_array(),
            _pad: [0.0; 2],
            inverse_view_projection,
        }
    }
}

/// Tonemap pass block (fragment only)
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct ToneMapPush {
    pub exposure: f32,
    pub tonemap_operator: i32,
}

#[cfg(test)]
#[path = "gpu_data_tests.rs"]
mod tests;
