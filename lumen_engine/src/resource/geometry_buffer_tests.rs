//! Unit tests for geometry_buffer.rs

use crate::error::Error;
use crate::graphics_device::mock_graphics_device::MockGraphicsDevice;
use crate::graphics_device::{GraphicsDevice, MemoryLocation};
use crate::resource::geometry_buffer::{IndexBuffer, VertexBuffer};
use crate::resource::gpu_data::Vertex;

fn triangle() -> Vec<Vertex> {
    vec![
        Vertex { position: [0.0, 0.5, 0.0], ..Default::default() },
        Vertex { position: [-0.5, -0.5, 0.0], ..Default::default() },
        Vertex { position: [0.5, -0.5, 0.0], ..Default::default() },
    ]
}

// ============================================================================
// VERTEX BUFFER TESTS
// ============================================================================

#[test]
fn test_vertex_buffer_uploads_all_bytes() {
    let mut device = MockGraphicsDevice::new();
    let vb = VertexBuffer::new(&mut device, "tri", &triangle()).unwrap();

    assert_eq!(vb.vertex_count(), 3);
    let record = &device.buffers[vb.buffer()];
    assert_eq!(record.location, MemoryLocation::GpuOnly);
    assert_eq!(record.data.len(), 3 * std::mem::size_of::<Vertex>());
    assert_eq!(&record.data[0..12], bytemuck::cast_slice::<f32, u8>(&[0.0, 0.5, 0.0]));
}

#[test]
fn test_vertex_buffer_rejects_empty() {
    let mut device = MockGraphicsDevice::new();
    let result = VertexBuffer::new(&mut device, "empty", &[]);
    assert!(matches!(result, Err(Error::BackendError(_))));
    assert!(device.buffers.is_empty());
}

#[test]
fn test_vertex_buffer_destroy() {
    let mut device = MockGraphicsDevice::new();
    let vb = VertexBuffer::new(&mut device, "tri", &triangle()).unwrap();
    vb.destroy(&mut device);
    assert!(device.buffers.is_empty());
}

// ============================================================================
// INDEX BUFFER TESTS
// ============================================================================

#[test]
fn test_index_buffer_counts_indices() {
    let mut device = MockGraphicsDevice::new();
    let ib = IndexBuffer::new(&mut device, "tri", &[0, 1, 2]).unwrap();
    assert_eq!(ib.index_count(), 3);
    assert_eq!(device.buffers[ib.buffer()].data.len(), 12);
}

#[test]
fn test_index_buffer_bind_records_command() {
    let mut device = MockGraphicsDevice::new();
    let cmd = device.allocate_command_buffer().unwrap();
    let ib = IndexBuffer::new(&mut device, "tri", &[0, 1, 2]).unwrap();
    device.clear_log();

    ib.bind(&mut device, cmd).unwrap();

    assert_eq!(device.commands, vec!["bind_index_buffer"]);
}
