//! Unit tests for mesh.rs

use crate::error::Error;
use crate::graphics_device::mock_graphics_device::MockGraphicsDevice;
use crate::graphics_device::GraphicsDevice;
use crate::resource::gpu_data::Vertex;
use crate::resource::mesh::{Mesh, MeshData};
use crate::resource::texture::{RawImage, TextureKind};

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

fn quad_data(name: &str) -> MeshData {
    let mut data = MeshData {
        name: name.to_string(),
        vertices: vec![Vertex::default(); 4],
        indices: vec![0, 1, 2, 2, 3, 0],
        ..Default::default()
    };
    data.set_texture(TextureKind::Albedo, RawImage::solid(4, 4, [200, 200, 200, 255]));
    data
}

// ============================================================================
// CREATION TESTS
// ============================================================================

#[test]
fn test_mesh_with_albedo_only() {
    let mut device = MockGraphicsDevice::new();
    let mesh = Mesh::new(&mut device, &quad_data("quad")).unwrap();

    assert_eq!(mesh.name(), "quad");
    assert_eq!(mesh.index_count(), 6);
    assert!(mesh.texture(TextureKind::Albedo).is_some());
    assert!(mesh.texture(TextureKind::Normal).is_none());
    assert_eq!(device.images.len(), 1);
}

#[test]
fn test_missing_slot_falls_back_to_albedo() {
    let mut device = MockGraphicsDevice::new();
    let mesh = Mesh::new(&mut device, &quad_data("quad")).unwrap();

    let albedo = mesh.texture(TextureKind::Albedo).unwrap().image();
    for kind in TextureKind::ALL {
        assert_eq!(mesh.texture_or_albedo(kind).unwrap().image(), albedo);
    }
}

#[test]
fn test_present_slot_is_used() {
    let mut device = MockGraphicsDevice::new();
    let mut data = quad_data("quad");
    data.set_texture(TextureKind::Normal, RawImage::solid(2, 2, [128, 128, 255, 255]));

    let mesh = Mesh::new(&mut device, &data).unwrap();

    let normal = mesh.texture_or_albedo(TextureKind::Normal).unwrap();
    assert_eq!(normal.kind(), TextureKind::Normal);
    assert_eq!(device.image_name(normal.image()), "quad_normal");
}

#[test]
fn test_mesh_without_albedo_fails() {
    let mut device = MockGraphicsDevice::new();
    let mut data = quad_data("bare");
    data.textures = Default::default();

    let result = Mesh::new(&mut device, &data);

    assert!(matches!(result, Err(Error::InvalidResource(_))));
    assert!(device.buffers.is_empty());
}

#[test]
fn test_failed_texture_releases_earlier_resources() {
    let mut device = MockGraphicsDevice::new();
    let mut data = quad_data("quad");
    data.set_texture(TextureKind::Roughness, RawImage { width: 2, height: 2, pixels: vec![0; 3] });

    assert!(Mesh::new(&mut device, &data).is_err());

    assert!(device.buffers.is_empty());
    assert!(device.images.is_empty());
    assert!(device.samplers.is_empty());
}

// ============================================================================
// BIND / DESTROY TESTS
// ============================================================================

#[test]
fn test_bind_order() {
    let mut device = MockGraphicsDevice::new();
    let cmd = device.allocate_command_buffer().unwrap();
    let mesh = Mesh::new(&mut device, &quad_data("quad")).unwrap();
    device.clear_log();

    mesh.bind(&mut device, cmd).unwrap();

    assert_eq!(device.commands, vec!["bind_vertex_buffer", "bind_index_buffer"]);
}

#[test]
fn test_destroy_releases_everything() {
    let mut device = MockGraphicsDevice::new();
    let mut data = quad_data("quad");
    data.set_texture(TextureKind::Ao, RawImage::solid(2, 2, [255, 255, 255, 255]));
    let mesh = Mesh::new(&mut device, &data).unwrap();

    mesh.destroy(&mut device);

    assert!(device.buffers.is_empty());
    assert!(device.images.is_empty());
    assert!(device.samplers.is_empty());
}
