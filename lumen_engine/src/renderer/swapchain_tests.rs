//! Unit tests for swapchain.rs
//!
//! Covers the selection policy and the create/cleanup steps on the mock.

use std::collections::VecDeque;

use crate::graphics_device::mock_graphics_device::MockGraphicsDevice;
use crate::graphics_device::{
    ColorSpace, Extent2D, Format, ImageLayout, PresentMode, SampleCount, SurfaceCapabilities,
    SurfaceFormat,
};
use crate::renderer::swapchain::*;

// ============================================================================
// HELPERS
// ============================================================================

/// Size source replaying a fixed sequence of sizes
struct ScriptedSize {
    sizes: VecDeque<Extent2D>,
    waits: usize,
    close_after_waits: Option<usize>,
}

impl ScriptedSize {
    fn new(sizes: &[(u32, u32)]) -> Self {
        Self {
            sizes: sizes.iter().map(|(w, h)| Extent2D::new(*w, *h)).collect(),
            waits: 0,
            close_after_waits: None,
        }
    }
}

impl SurfaceSizeSource for ScriptedSize {
    fn framebuffer_size(&self) -> Extent2D {
        self.sizes.front().copied().unwrap_or_default()
    }

    fn wait_events(&mut self) {
        self.waits += 1;
        if self.sizes.len() > 1 {
            self.sizes.pop_front();
        }
    }

    fn close_requested(&self) -> bool {
        self.close_after_waits.is_some_and(|n| self.waits >= n)
    }
}

fn caps(current: Extent2D, min_images: u32, max_images: u32) -> SurfaceCapabilities {
    SurfaceCapabilities {
        min_image_count: min_images,
        max_image_count: max_images,
        current_extent: current,
        min_image_extent: Extent2D::new(100, 100),
        max_image_extent: Extent2D::new(2000, 1000),
    }
}

// ============================================================================
// SELECTION POLICY TESTS
// ============================================================================

#[test]
fn test_prefers_bgra_unorm_srgb_nonlinear() {
    let formats = [
        SurfaceFormat { format: Format::R8G8B8A8_SRGB, color_space: ColorSpace::SrgbNonlinear },
        PREFERRED_SURFACE_FORMAT,
    ];
    assert_eq!(choose_surface_format(&formats).unwrap(), PREFERRED_SURFACE_FORMAT);
}

#[test]
fn test_falls_back_to_first_format() {
    let first = SurfaceFormat { format: Format::R8G8B8A8_UNORM, color_space: ColorSpace::Other(7) };
    let formats = [
        first,
        SurfaceFormat { format: Format::B8G8R8A8_UNORM, color_space: ColorSpace::Other(7) },
    ];
    assert_eq!(choose_surface_format(&formats).unwrap(), first);
}

#[test]
fn test_no_formats_is_error() {
    assert!(choose_surface_format(&[]).is_err());
}

#[test]
fn test_present_mode_prefers_mailbox() {
    assert_eq!(
        choose_present_mode(&[PresentMode::Fifo, PresentMode::Mailbox]),
        PresentMode::Mailbox
    );
    assert_eq!(
        choose_present_mode(&[PresentMode::Immediate, PresentMode::Fifo]),
        PresentMode::Fifo
    );
}

#[test]
fn test_extent_fixed_by_surface() {
    let c = caps(Extent2D::new(640, 480), 2, 3);
    assert_eq!(choose_extent(&c, Extent2D::new(1920, 1080)), Extent2D::new(640, 480));
}

#[test]
fn test_extent_clamped_when_surface_lets_us_pick() {
    let c = caps(Extent2D::new(u32::MAX, u32::MAX), 2, 3);
    assert_eq!(choose_extent(&c, Extent2D::new(50, 5000)), Extent2D::new(100, 1000));
    assert_eq!(choose_extent(&c, Extent2D::new(800, 600)), Extent2D::new(800, 600));
}

#[test]
fn test_image_count() {
    assert_eq!(choose_image_count(&caps(Extent2D::default(), 2, 3)), 3);
    assert_eq!(choose_image_count(&caps(Extent2D::default(), 3, 3)), 3);
    assert_eq!(choose_image_count(&caps(Extent2D::default(), 2, 0)), 3);
}

// ============================================================================
// SIZE WAIT TESTS
// ============================================================================

#[test]
fn test_wait_returns_immediately_for_nonzero() {
    let mut source = ScriptedSize::new(&[(800, 600)]);
    assert_eq!(wait_for_nonzero_size(&mut source), Some(Extent2D::new(800, 600)));
    assert_eq!(source.waits, 0);
}

#[test]
fn test_wait_blocks_while_minimized() {
    let mut source = ScriptedSize::new(&[(0, 0), (0, 600), (1024, 0), (1024, 768)]);
    assert_eq!(wait_for_nonzero_size(&mut source), Some(Extent2D::new(1024, 768)));
    assert_eq!(source.waits, 3);
}

#[test]
fn test_wait_stops_when_closed_while_minimized() {
    let mut source = ScriptedSize::new(&[(0, 0)]);
    source.close_after_waits = Some(2);

    assert_eq!(wait_for_nonzero_size(&mut source), None);
    assert_eq!(source.waits, 2);
}

// ============================================================================
// CREATION TESTS
// ============================================================================

#[test]
fn test_create_steps() {
    let mut device = MockGraphicsDevice::new();
    let mut swapchain = Swapchain::new();

    swapchain.create_swapchain(&mut device, Extent2D::new(800, 600)).unwrap();
    swapchain.create_image_views(&mut device).unwrap();
    swapchain.create_color_resources(&mut device, SampleCount::S4).unwrap();

    assert_eq!(swapchain.extent(), Extent2D::new(800, 600));
    assert_eq!(swapchain.format(), Format::B8G8R8A8_UNORM);
    assert_eq!(swapchain.present_mode(), Some(PresentMode::Mailbox));
    assert_eq!(swapchain.image_count(), 3);
    assert_eq!(swapchain.image(0).unwrap().layout(), ImageLayout::Undefined);

    let color = &device.images[swapchain.color_image().unwrap().image()];
    assert_eq!(color.samples, SampleCount::S4);
    assert_eq!(color.format, Format::B8G8R8A8_UNORM);
}

#[test]
fn test_create_twice_fails() {
    let mut device = MockGraphicsDevice::new();
    let mut swapchain = Swapchain::new();
    swapchain.create_swapchain(&mut device, Extent2D::new(800, 600)).unwrap();
    assert!(swapchain.create_swapchain(&mut device, Extent2D::new(800, 600)).is_err());
}

#[test]
fn test_color_resources_need_swapchain() {
    let mut device = MockGraphicsDevice::new();
    let mut swapchain = Swapchain::new();
    assert!(swapchain.create_color_resources(&mut device, SampleCount::S4).is_err());
}

#[test]
fn test_cleanup_twice_is_safe() {
    let mut device = MockGraphicsDevice::new();
    let mut swapchain = Swapchain::new();
    swapchain.create_swapchain(&mut device, Extent2D::new(800, 600)).unwrap();
    swapchain.create_image_views(&mut device).unwrap();
    swapchain.create_color_resources(&mut device, SampleCount::S4).unwrap();

    swapchain.cleanup(&mut device);
    swapchain.cleanup(&mut device);

    assert!(!swapchain.is_created());
    assert_eq!(device.count("destroy_swapchain"), 1);
    assert!(device.images.is_empty());
}
