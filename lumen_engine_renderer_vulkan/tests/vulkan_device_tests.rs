//! Integration tests for the Vulkan GraphicsDevice backend
//!
//! These tests verify that VulkanDevice correctly implements the GraphicsDevice trait.
//! All tests require a GPU and a display, and are marked with #[ignore].
//!
//! Run with: cargo test --test vulkan_device_tests -- --ignored

use lumen_engine::lumen::device::{
    AcquireOutcome, BufferDesc, BufferUsage, DescriptorPoolFlags, DescriptorPoolSize,
    DescriptorSetLayoutBinding, DescriptorType, DescriptorWrite, Extent2D, Filter, Format,
    GraphicsDevice, ImageDesc, ImageLayout, ImageUsage, MemoryLocation, SampleCount, SamplerDesc,
    AddressMode, ShaderStages, ColorSpace, PresentMode, SwapchainDesc,
};
use lumen_engine::lumen::Error;
use lumen_engine_renderer_vulkan::{VulkanDevice, VulkanDeviceConfig};
use serial_test::serial;
use winit::event_loop::EventLoop;
use winit::window::Window;

/// Helper to create a hidden test window for Vulkan
#[allow(deprecated)]
fn create_test_window() -> (Window, EventLoop<()>) {
    let event_loop = EventLoop::new().unwrap();
    let window_attrs = Window::default_attributes()
        .with_title("Vulkan Device Test")
        .with_inner_size(winit::dpi::PhysicalSize::new(800, 600))
        .with_visible(false);
    let window = event_loop.create_window(window_attrs).unwrap();
    (window, event_loop)
}

fn test_config() -> VulkanDeviceConfig {
    VulkanDeviceConfig {
        app_name: "Lumen Device Tests".to_string(),
        enable_validation: false,
    }
}

fn color_image_desc(name: &str, width: u32, height: u32, mip_levels: u32) -> ImageDesc {
    ImageDesc {
        name: name.to_string(),
        extent: Extent2D::new(width, height),
        format: Format::R8G8B8A8_SRGB,
        mip_levels,
        samples: SampleCount::S1,
        usage: ImageUsage::SAMPLED | ImageUsage::TRANSFER_SRC | ImageUsage::TRANSFER_DST,
    }
}

// ============================================================================
// DEVICE CREATION
// ============================================================================

#[test]
#[ignore] // Requires GPU
#[serial]
fn test_vulkan_device_creation() {
    let (window, _event_loop) = create_test_window();
    let device = VulkanDevice::new(&window, test_config()).unwrap();

    assert!(device.depth_format().is_depth());
    assert!(device.msaa_samples().count() >= 1);
    assert!(device.max_sampler_anisotropy() >= 1.0);
}

#[test]
#[ignore] // Requires GPU
#[serial]
fn test_vulkan_surface_support_not_empty() {
    let (window, _event_loop) = create_test_window();
    let device = VulkanDevice::new(&window, test_config()).unwrap();

    let support = device.surface_support().unwrap();
    assert!(!support.formats.is_empty());
    assert!(support.present_modes.contains(&PresentMode::Fifo));
    assert!(support.capabilities.min_image_count >= 1);
}

// ============================================================================
// BUFFERS
// ============================================================================

#[test]
#[ignore] // Requires GPU
#[serial]
fn test_vulkan_write_host_visible_buffer() {
    let (window, _event_loop) = create_test_window();
    let mut device = VulkanDevice::new(&window, test_config()).unwrap();

    let buffer = device
        .create_buffer(&BufferDesc {
            name: "test_uniform".to_string(),
            size: 64,
            usage: BufferUsage::UNIFORM,
            location: MemoryLocation::CpuToGpu,
        })
        .unwrap();

    device.write_buffer(buffer, 0, &[1u8; 64]).unwrap();
    device.write_buffer(buffer, 32, &[2u8; 32]).unwrap();

    let overflow = device.write_buffer(buffer, 48, &[0u8; 32]);
    assert!(matches!(overflow, Err(Error::InvalidResource(_))));

    device.destroy_buffer(buffer);
    // Destroying twice is a no-op
    device.destroy_buffer(buffer);
}

#[test]
#[ignore] // Requires GPU
#[serial]
fn test_vulkan_upload_device_local_buffer() {
    let (window, _event_loop) = create_test_window();
    let mut device = VulkanDevice::new(&window, test_config()).unwrap();

    let data: Vec<u8> = (0..=255).collect();
    let buffer = device
        .create_buffer(&BufferDesc {
            name: "test_vertices".to_string(),
            size: data.len() as u64,
            usage: BufferUsage::VERTEX | BufferUsage::TRANSFER_DST,
            location: MemoryLocation::GpuOnly,
        })
        .unwrap();

    device.upload_buffer(buffer, &data).unwrap();
    device.destroy_buffer(buffer);
}

// ============================================================================
// IMAGES
// ============================================================================

#[test]
#[ignore] // Requires GPU
#[serial]
fn test_vulkan_upload_texture_with_mips() {
    let (window, _event_loop) = create_test_window();
    let mut device = VulkanDevice::new(&window, test_config()).unwrap();

    let image = device.create_image(&color_image_desc("test_texture", 16, 16, 5)).unwrap();
    let pixels = vec![255u8; 16 * 16 * 4];
    device.upload_texture(image, &pixels).unwrap();

    device.destroy_image(image);
}

#[test]
#[ignore] // Requires GPU
#[serial]
fn test_vulkan_upload_texture_wrong_size_fails() {
    let (window, _event_loop) = create_test_window();
    let mut device = VulkanDevice::new(&window, test_config()).unwrap();

    let image = device.create_image(&color_image_desc("test_texture", 4, 4, 1)).unwrap();
    let result = device.upload_texture(image, &[0u8; 10]);
    assert!(matches!(result, Err(Error::InvalidResource(_))));

    device.destroy_image(image);
}

#[test]
#[ignore] // Requires GPU
#[serial]
fn test_vulkan_create_zero_extent_image_fails() {
    let (window, _event_loop) = create_test_window();
    let mut device = VulkanDevice::new(&window, test_config()).unwrap();

    let result = device.create_image(&color_image_desc("empty", 0, 16, 1));
    assert!(matches!(result, Err(Error::InvalidResource(_))));
}

#[test]
#[ignore] // Requires GPU
#[serial]
fn test_vulkan_create_sampler_with_anisotropy() {
    let (window, _event_loop) = create_test_window();
    let mut device = VulkanDevice::new(&window, test_config()).unwrap();

    let sampler = device
        .create_sampler(&SamplerDesc {
            filter: Filter::Linear,
            address_mode: AddressMode::Repeat,
            max_anisotropy: Some(device.max_sampler_anisotropy()),
            max_lod: 8.0,
        })
        .unwrap();
    device.destroy_sampler(sampler);
}

// ============================================================================
// DESCRIPTORS
// ============================================================================

#[test]
#[ignore] // Requires GPU
#[serial]
fn test_vulkan_descriptor_pool_exhaustion() {
    let (window, _event_loop) = create_test_window();
    let mut device = VulkanDevice::new(&window, test_config()).unwrap();

    let layout = device
        .create_descriptor_set_layout(&[DescriptorSetLayoutBinding {
            binding: 0,
            ty: DescriptorType::UniformBuffer,
            count: 1,
            stages: ShaderStages::VERTEX,
        }])
        .unwrap();
    let pool = device
        .create_descriptor_pool(
            &[DescriptorPoolSize { ty: DescriptorType::UniformBuffer, count: 2 }],
            2,
            DescriptorPoolFlags::FREE_DESCRIPTOR_SET,
        )
        .unwrap();

    let sets = device.allocate_descriptor_sets(pool, layout, 2).unwrap();
    assert_eq!(sets.len(), 2);

    let exhausted = device.allocate_descriptor_sets(pool, layout, 1);
    assert!(matches!(exhausted, Err(Error::DescriptorPoolExhausted(_))));

    // Freed sets make room again
    device.free_descriptor_sets(pool, &sets).unwrap();
    let again = device.allocate_descriptor_sets(pool, layout, 2).unwrap();
    assert_eq!(again.len(), 2);

    device.destroy_descriptor_pool(pool);
    device.destroy_descriptor_set_layout(layout);
}

#[test]
#[ignore] // Requires GPU
#[serial]
fn test_vulkan_update_descriptor_set() {
    let (window, _event_loop) = create_test_window();
    let mut device = VulkanDevice::new(&window, test_config()).unwrap();

    let layout = device
        .create_descriptor_set_layout(&[
            DescriptorSetLayoutBinding {
                binding: 0,
                ty: DescriptorType::UniformBuffer,
                count: 1,
                stages: ShaderStages::VERTEX | ShaderStages::FRAGMENT,
            },
            DescriptorSetLayoutBinding {
                binding: 1,
                ty: DescriptorType::CombinedImageSampler,
                count: 1,
                stages: ShaderStages::FRAGMENT,
            },
        ])
        .unwrap();
    let pool = device
        .create_descriptor_pool(
            &[
                DescriptorPoolSize { ty: DescriptorType::UniformBuffer, count: 1 },
                DescriptorPoolSize { ty: DescriptorType::CombinedImageSampler, count: 1 },
            ],
            1,
            DescriptorPoolFlags::empty(),
        )
        .unwrap();
    let set = device.allocate_descriptor_sets(pool, layout, 1).unwrap()[0];

    let buffer = device
        .create_buffer(&BufferDesc {
            name: "test_ubo".to_string(),
            size: 128,
            usage: BufferUsage::UNIFORM,
            location: MemoryLocation::CpuToGpu,
        })
        .unwrap();
    let image = device.create_image(&color_image_desc("test_texture", 2, 2, 1)).unwrap();
    device.upload_texture(image, &[128u8; 16]).unwrap();
    let sampler = device
        .create_sampler(&SamplerDesc {
            filter: Filter::Nearest,
            address_mode: AddressMode::ClampToEdge,
            max_anisotropy: None,
            max_lod: 0.0,
        })
        .unwrap();

    device
        .update_descriptor_set(
            set,
            &[
                DescriptorWrite::UniformBuffer { binding: 0, buffer, offset: 0, range: 128 },
                DescriptorWrite::CombinedImageSampler {
                    binding: 1,
                    array_element: 0,
                    image,
                    sampler,
                    layout: ImageLayout::ShaderReadOnly,
                },
            ],
        )
        .unwrap();

    // Destroying the pool releases its sets
    device.destroy_descriptor_pool(pool);
    assert!(matches!(
        device.update_descriptor_set(set, &[]),
        Err(Error::InvalidResource(_))
    ));
}

// ============================================================================
// SYNCHRONIZATION AND SWAPCHAIN
// ============================================================================

#[test]
#[ignore] // Requires GPU
#[serial]
fn test_vulkan_fence_lifecycle() {
    let (window, _event_loop) = create_test_window();
    let mut device = VulkanDevice::new(&window, test_config()).unwrap();

    let fence = device.create_fence(true).unwrap();
    // Signaled fences return immediately
    device.wait_for_fence(fence).unwrap();
    device.reset_fence(fence).unwrap();
    device.destroy_fence(fence);

    assert!(matches!(device.wait_for_fence(fence), Err(Error::InvalidResource(_))));
}

#[test]
#[ignore] // Requires GPU
#[serial]
fn test_vulkan_swapchain_acquire() {
    let (window, _event_loop) = create_test_window();
    let mut device = VulkanDevice::new(&window, test_config()).unwrap();

    let support = device.surface_support().unwrap();
    let caps = support.capabilities;
    let extent = if caps.current_extent.width != u32::MAX {
        caps.current_extent
    } else {
        Extent2D::new(800, 600)
    };
    let surface_format = support
        .formats
        .iter()
        .copied()
        .find(|f| f.format == Format::B8G8R8A8_UNORM && f.color_space == ColorSpace::SrgbNonlinear)
        .unwrap_or(support.formats[0]);

    device
        .create_swapchain(&SwapchainDesc {
            surface_format,
            present_mode: PresentMode::Fifo,
            extent,
            image_count: caps.min_image_count + 1,
        })
        .unwrap();
    let views = device.create_swapchain_image_views().unwrap();
    assert!(!views.is_empty());

    let semaphore = device.create_semaphore().unwrap();
    match device.acquire_next_image(semaphore).unwrap() {
        AcquireOutcome::Acquired(index) => assert!((index as usize) < views.len()),
        AcquireOutcome::OutOfDate => {}
    }

    device.wait_idle().unwrap();
    device.destroy_swapchain();
    // Views were released with the swapchain
    for view in views {
        device.destroy_image(view);
    }
}
