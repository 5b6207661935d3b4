/// Unit tests for texture.rs
///
/// Covers mip math, pixel validation and the create/destroy path on the mock.

use crate::error::Error;
use crate::graphics_device::mock_graphics_device::MockGraphicsDevice;
use crate::graphics_device::{AddressMode, Filter, Format};
use crate::resource::texture::{mip_levels, RawImage, Texture, TextureKind};

// ============================================================================
// MIP LEVEL TESTS
// ============================================================================

#[test]
fn test_mip_levels_power_of_two() {
    assert_eq!(mip_levels(1, 1), 1);
    assert_eq!(mip_levels(2, 2), 2);
    assert_eq!(mip_levels(256, 256), 9);
    assert_eq!(mip_levels(1024, 512), 11);
}

#[test]
fn test_mip_levels_non_power_of_two() {
    assert_eq!(mip_levels(800, 600), 10);
    assert_eq!(mip_levels(3, 1), 2);
}

#[test]
fn test_mip_levels_zero_is_single_level() {
    assert_eq!(mip_levels(0, 0), 1);
}

// ============================================================================
// TEXTURE KIND TESTS
// ============================================================================

#[test]
fn test_kind_slot_order() {
    let indices: Vec<usize> = TextureKind::ALL.iter().map(|k| k.index()).collect();
    assert_eq!(indices, vec![0, 1, 2, 3, 4]);
}

#[test]
fn test_kind_formats() {
    assert_eq!(TextureKind::Normal.format(), Format::R8G8B8A8_UNORM);
    assert_eq!(TextureKind::Albedo.format(), Format::R8G8B8A8_SRGB);
    assert_eq!(TextureKind::Ao.format(), Format::R8G8B8A8_SRGB);
}

// ============================================================================
// TEXTURE CREATION TESTS
// ============================================================================

#[test]
fn test_solid_image_size() {
    let raw = RawImage::solid(4, 2, [255, 0, 0, 255]);
    assert_eq!(raw.pixels.len(), 32);
    assert_eq!(&raw.pixels[4..8], &[255, 0, 0, 255]);
}

#[test]
fn test_create_texture() {
    let mut device = MockGraphicsDevice::new();
    let raw = RawImage::solid(64, 32, [128, 128, 255, 255]);

    let texture = Texture::new(&mut device, "brick_normal", TextureKind::Normal, &raw).unwrap();

    assert_eq!(texture.mip_levels(), 7);
    let image = &device.images[texture.image()];
    assert_eq!(image.format, Format::R8G8B8A8_UNORM);
    assert_eq!(image.mip_levels, 7);

    let sampler = device.samplers[texture.sampler()];
    assert_eq!(sampler.filter, Filter::Linear);
    assert_eq!(sampler.address_mode, AddressMode::Repeat);
    assert_eq!(sampler.max_anisotropy, Some(16.0));
    assert_eq!(sampler.max_lod, 7.0);

    assert_eq!(device.count("upload_texture brick_normal 8192"), 1);
}

#[test]
fn test_create_texture_rejects_short_pixels() {
    let mut device = MockGraphicsDevice::new();
    let raw = RawImage { width: 4, height: 4, pixels: vec![0; 10] };

    let result = Texture::new(&mut device, "broken", TextureKind::Albedo, &raw);

    assert!(matches!(result, Err(Error::InvalidResource(_))));
    assert!(device.images.is_empty());
}

#[test]
fn test_create_texture_rejects_zero_size() {
    let mut device = MockGraphicsDevice::new();
    let raw = RawImage { width: 0, height: 4, pixels: Vec::new() };
    assert!(Texture::new(&mut device, "empty", TextureKind::Albedo, &raw).is_err());
}

#[test]
fn test_destroy_texture_releases_everything() {
    let mut device = MockGraphicsDevice::new();
    let raw = RawImage::solid(8, 8, [0, 0, 0, 255]);
    let texture = Texture::new(&mut device, "black", TextureKind::Ao, &raw).unwrap();

    texture.destroy(&mut device);

    assert!(device.images.is_empty());
    assert!(device.samplers.is_empty());
}
