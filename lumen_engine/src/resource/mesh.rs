//! GPU-resident meshes.
//!
//! A `Mesh` owns its vertex buffer, its index buffer and up to five material
//! textures stored in a fixed array indexed by `TextureKind`. Only the albedo
//! slot is mandatory; any other absent slot is served by the albedo texture
//! when descriptors are written, so no binding ever references a null view.

use crate::engine_debug;
use crate::error::{Error, Result};
use crate::graphics_device::{CommandBufferKey, GraphicsDevice};
use crate::resource::geometry_buffer::{IndexBuffer, VertexBuffer};
use crate::resource::gpu_data::Vertex;
use crate::resource::texture::{RawImage, Texture, TextureKind};

/// CPU-side mesh as produced by the model importer
#[derive(Debug, Clone, Default)]
pub struct MeshData {
    pub name: String,
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
    /// Decoded images, indexed by `TextureKind::index()`
    pub textures: [Option<RawImage>; 5],
}

impl MeshData {
    pub fn set_texture(&mut self, kind: TextureKind, image: RawImage) {
        self.textures[kind.index()] = Some(image);
    }
}

pub struct Mesh {
    name: String,
    vertex_buffer: VertexBuffer,
    index_buffer: IndexBuffer,
    textures: [Option<Texture>; 5],
}

impl Mesh {
    /// Upload geometry and textures
    ///
    /// # Errors
    ///
    /// Fails without an albedo image, or if any upload fails. Everything
    /// created before the failure is destroyed again.
    pub fn new(device: &mut dyn GraphicsDevice, data: &MeshData) -> Result<Self> {
        if data.textures[TextureKind::Albedo.index()].is_none() {
            return Err(Error::InvalidResource(format!(
                "mesh '{}' has no albedo texture",
                data.name
            )));
        }

        let vertex_buffer = VertexBuffer::new(device, &data.name, &data.vertices)?;
        let index_buffer = match IndexBuffer::new(device, &data.name, &data.indices) {
            Ok(ib) => ib,
            Err(e) => {
                vertex_buffer.destroy(device);
                return Err(e);
            }
        };

        let mut mesh = Self {
            name: data.name.clone(),
            vertex_buffer,
            index_buffer,
            textures: Default::default(),
        };

        for kind in TextureKind::ALL {
            let Some(raw) = &data.textures[kind.index()] else {
                continue;
            };
            let texture_name = format!("{}_{:?}", data.name, kind).to_lowercase();
            match Texture::new(device, &texture_name, kind, raw) {
                Ok(texture) => mesh.textures[kind.index()] = Some(texture),
                Err(e) => {
                    mesh.destroy(device);
                    return Err(e);
                }
            }
        }

        engine_debug!(
            "lumen::Mesh",
            "Mesh '{}' uploaded: {} vertices, {} indices, {} textures",
            mesh.name,
            mesh.vertex_buffer.vertex_count(),
            mesh.index_buffer.index_count(),
            mesh.textures.iter().flatten().count()
        );

        Ok(mesh)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn index_count(&self) -> u32 {
        self.index_buffer.index_count()
    }

    /// The texture in `kind`'s slot, if the mesh has one
    pub fn texture(&self, kind: TextureKind) -> Option<&Texture> {
        self.textures[kind.index()].as_ref()
    }

    /// The texture to bind for `kind`: its own slot, or the albedo texture
    pub fn texture_or_albedo(&self, kind: TextureKind) -> Option<&Texture> {
        self.texture(kind).or_else(|| self.texture(TextureKind::Albedo))
    }

    /// Bind vertex and index buffers
    pub fn bind(&self, device: &mut dyn GraphicsDevice, cmd: CommandBufferKey) -> Result<()> {
        self.vertex_buffer.bind(device, cmd)?;
        self.index_buffer.bind(device, cmd)
    }

    /// Destroy textures, then index and vertex buffers
    pub fn destroy(self, device: &mut dyn GraphicsDevice) {
        for texture in self.textures.into_iter().rev().flatten() {
            texture.destroy(device);
        }
        self.index_buffer.destroy(device);
        self.vertex_buffer.destroy(device);
    }
}

#[cfg(test)]
#[path = "mesh_tests.rs"]
mod tests;
