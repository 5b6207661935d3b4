//! GPU resource module
//!
//! Layout-tracked images, geometry and uniform buffers, textures and meshes.

pub mod tracked_image;
pub mod gpu_data;
pub mod geometry_buffer;
pub mod uniform_buffer;
pub mod texture;
pub mod mesh;

pub use tracked_image::{transition_masks, TrackedImage, TransitionMasks};
pub use gpu_data::{
    CameraUbo, DirectionalLight, GeometryPush, ModelUbo, PointLight, SceneLightingUbo,
    ScreenSizePush, ToneMapPush, Vertex, MAX_POINT_LIGHTS,
};
pub use geometry_buffer::{IndexBuffer, VertexBuffer};
pub use uniform_buffer::UniformBufferSet;
pub use texture::{mip_levels, RawImage, Texture, TextureKind};
pub use mesh::{Mesh, MeshData};
