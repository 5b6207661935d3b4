//! Device-local vertex and index buffers.
//!
//! Both are filled once at creation through the device's staging upload and
//! never written again. They are destroyed by consuming `destroy`.

use crate::engine_bail;
use crate::error::Result;
use crate::graphics_device::{
    BufferDesc, BufferKey, BufferUsage, CommandBufferKey, GraphicsDevice, IndexType,
    MemoryLocation,
};
use crate::resource::gpu_data::Vertex;

// ============================================================================
// VERTEX BUFFER
// ============================================================================

pub struct VertexBuffer {
    buffer: BufferKey,
    vertex_count: u32,
}

impl VertexBuffer {
    /// Create a GPU-only vertex buffer holding `vertices`
    ///
    /// # Errors
    ///
    /// Fails on an empty vertex list or if the upload fails.
    pub fn new(device: &mut dyn GraphicsDevice, name: &str, vertices: &[Vertex]) -> Result<Self> {
        if vertices.is_empty() {
            engine_bail!("lumen::VertexBuffer", "Mesh '{}' has no vertices", name);
        }
        let bytes: &[u8] = bytemuck::cast_slice(vertices);
        let buffer = upload(device, name, BufferUsage::VERTEX, bytes)?;
        Ok(Self { buffer, vertex_count: vertices.len() as u32 })
    }

    pub fn buffer(&self) -> BufferKey {
        self.buffer
    }

    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }

    pub fn bind(&self, device: &mut dyn GraphicsDevice, cmd: CommandBufferKey) -> Result<()> {
        device.cmd_bind_vertex_buffer(cmd, self.buffer)
    }

    pub fn destroy(self, device: &mut dyn GraphicsDevice) {
        device.destroy_buffer(self.buffer);
    }
}

// ============================================================================
// INDEX BUFFER
// ============================================================================

/// 32-bit index buffer
pub struct IndexBuffer {
    buffer: BufferKey,
    index_count: u32,
}

impl IndexBuffer {
    pub fn new(device: &mut dyn GraphicsDevice, name: &str, indices: &[u32]) -> Result<Self> {
        if indices.is_empty() {
            engine_bail!("lumen::IndexBuffer", "Mesh '{}' has no indices", name);
        }
        let bytes: &[u8] = bytemuck::cast_slice(indices);
        let buffer = upload(device, name, BufferUsage::INDEX, bytes)?;
        Ok(Self { buffer, index_count: indices.len() as u32 })
    }

    pub fn buffer(&self) -> BufferKey {
        self.buffer
    }

    pub fn index_count(&self) -> u32 {
        self.index_count
    }

    pub fn bind(&self, device: &mut dyn GraphicsDevice, cmd: CommandBufferKey) -> Result<()> {
        device.cmd_bind_index_buffer(cmd, self.buffer, IndexType::U32)
    }

    pub fn destroy(self, device: &mut dyn GraphicsDevice) {
        device.destroy_buffer(self.buffer);
    }
}

fn upload(
    device: &mut dyn GraphicsDevice,
    name: &str,
    usage: BufferUsage,
    bytes: &[u8],
) -> Result<BufferKey> {
    let buffer = device.create_buffer(&BufferDesc {
        name: name.to_string(),
        size: bytes.len() as u64,
        usage: usage | BufferUsage::TRANSFER_DST,
        location: MemoryLocation::GpuOnly,
    })?;
    if let Err(e) = device.upload_buffer(buffer, bytes) {
        device.destroy_buffer(buffer);
        return Err(e);
    }
    Ok(buffer)
}

#[cfg(test)]
#[path = "geometry_buffer_tests.rs"]
mod tests;
