//! Unit tests for hdr_manager.rs

use slotmap::Key;

use crate::graphics_device::mock_graphics_device::MockGraphicsDevice;
use crate::graphics_device::{Extent2D, ImageLayout, SampleCount};
use crate::renderer::hdr_manager::{HdrManager, HDR_FORMAT};

#[test]
fn test_create_resources() {
    let mut device = MockGraphicsDevice::new();
    let mut hdr = HdrManager::new();

    hdr.create_resources(&mut device, Extent2D::new(800, 600), SampleCount::S4).unwrap();

    let target = hdr.target().unwrap();
    assert_eq!(target.format(), HDR_FORMAT);
    assert_eq!(target.resolve().layout(), ImageLayout::Undefined);
    assert_eq!(device.images[target.msaa().image()].samples, SampleCount::S4);
    assert!(!hdr.sampler().is_null());
}

#[test]
fn test_create_twice_fails() {
    let mut device = MockGraphicsDevice::new();
    let mut hdr = HdrManager::new();
    hdr.create_resources(&mut device, Extent2D::new(8, 8), SampleCount::S1).unwrap();
    assert!(hdr.create_resources(&mut device, Extent2D::new(8, 8), SampleCount::S1).is_err());
}

#[test]
fn test_cleanup_twice_is_safe() {
    let mut device = MockGraphicsDevice::new();
    let mut hdr = HdrManager::new();
    hdr.create_resources(&mut device, Extent2D::new(8, 8), SampleCount::S1).unwrap();

    hdr.cleanup(&mut device);
    hdr.cleanup(&mut device);

    assert!(hdr.target().is_none());
    assert!(hdr.sampler().is_null());
    assert!(device.images.is_empty());
    assert!(device.samplers.is_empty());
}
