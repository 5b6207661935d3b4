//! Unit tests for uniform_buffer.rs

use glam::Mat4;
use slotmap::Key;

use crate::graphics_device::mock_graphics_device::MockGraphicsDevice;
use crate::graphics_device::MemoryLocation;
use crate::resource::gpu_data::{CameraUbo, ModelUbo};
use crate::resource::uniform_buffer::UniformBufferSet;

#[test]
fn test_creates_three_buffers_per_frame() {
    let mut device = MockGraphicsDevice::new();
    let set = UniformBufferSet::new(&mut device, 2).unwrap();

    assert_eq!(set.frame_count(), 2);
    assert_eq!(device.buffers.len(), 6);
    assert!(device.buffers.values().all(|b| b.location == MemoryLocation::CpuToGpu));
    assert_eq!(device.buffers[set.camera_buffer(1)].name, "camera_ubo_1");
    assert_eq!(device.buffers[set.camera_buffer(0)].data.len(), 144);
}

#[test]
fn test_out_of_range_frame_is_null() {
    let mut device = MockGraphicsDevice::new();
    let set = UniformBufferSet::new(&mut device, 2).unwrap();
    assert!(set.lighting_buffer(2).is_null());
}

#[test]
fn test_update_writes_only_that_frame() {
    let mut device = MockGraphicsDevice::new();
    let set = UniformBufferSet::new(&mut device, 2).unwrap();
    let ubo = CameraUbo {
        view: Mat4::IDENTITY,
        proj: Mat4::IDENTITY,
        camera_pos: [1.0, 2.0, 3.0],
        exposure: 1.0,
    };

    set.update_camera(&mut device, 1, &ubo).unwrap();

    assert_eq!(device.buffers[set.camera_buffer(1)].data, bytemuck::bytes_of(&ubo));
    assert!(device.buffers[set.camera_buffer(0)].data.iter().all(|b| *b == 0));
}

#[test]
fn test_update_out_of_range_fails() {
    let mut device = MockGraphicsDevice::new();
    let set = UniformBufferSet::new(&mut device, 2).unwrap();
    assert!(set.update_model(&mut device, 5, &ModelUbo::default()).is_err());
}

#[test]
fn test_cleanup_twice() {
    let mut device = MockGraphicsDevice::new();
    let mut set = UniformBufferSet::new(&mut device, 2).unwrap();

    set.cleanup(&mut device);
    set.cleanup(&mut device);

    assert!(device.buffers.is_empty());
    assert_eq!(set.frame_count(), 0);
}
