/// VulkanSwapchain - swapchain handle, its images and presentation
///
/// Only one swapchain exists at a time. The engine side decides format,
/// present mode, extent and image count; this module just applies them.

use ash::vk;
use lumen_engine::lumen::device::{
    AcquireOutcome, Extent2D, Format, ImageKey, PresentOutcome, SurfaceCapabilities, SurfaceFormat,
    SurfaceSupport, SwapchainDesc,
};
use lumen_engine::lumen::{Error, Result};
use lumen_engine::{engine_debug, engine_err, engine_error};

use crate::vulkan_context::VulkanContext;
use crate::vulkan_convert::{
    color_space_to_vk, extent_to_vk, format_to_vk, present_mode_to_vk, vk_to_color_space,
    vk_to_extent, vk_to_format, vk_to_present_mode,
};

/// Live swapchain and the engine keys of its image views
pub(crate) struct VulkanSwapchain {
    pub handle: vk::SwapchainKHR,
    pub images: Vec<vk::Image>,
    pub format: vk::Format,
    pub extent: Extent2D,
    /// Views registered in the image arena (filled by `create_swapchain_image_views`)
    pub views: Vec<ImageKey>,
}

/// Query capabilities, formats and present modes of the window surface
pub(crate) fn query_surface_support(ctx: &VulkanContext) -> Result<SurfaceSupport> {
    unsafe {
        let caps = ctx
            .surface_loader
            .get_physical_device_surface_capabilities(ctx.physical_device, ctx.surface)
            .map_err(|e| engine_err!("lumen::vulkan", "Failed to get surface capabilities: {:?}", e))?;

        let formats = ctx
            .surface_loader
            .get_physical_device_surface_formats(ctx.physical_device, ctx.surface)
            .map_err(|e| engine_err!("lumen::vulkan", "Failed to get surface formats: {:?}", e))?;

        let present_modes = ctx
            .surface_loader
            .get_physical_device_surface_present_modes(ctx.physical_device, ctx.surface)
            .map_err(|e| engine_err!("lumen::vulkan", "Failed to get present modes: {:?}", e))?;

        Ok(SurfaceSupport {
            capabilities: SurfaceCapabilities {
                min_image_count: caps.min_image_count,
                max_image_count: caps.max_image_count,
                current_extent: vk_to_extent(caps.current_extent),
                min_image_extent: vk_to_extent(caps.min_image_extent),
                max_image_extent: vk_to_extent(caps.max_image_extent),
            },
            // Formats the engine cannot name are never selectable
            formats: formats
                .iter()
                .map(|f| SurfaceFormat {
                    format: vk_to_format(f.format),
                    color_space: vk_to_color_space(f.color_space),
                })
                .filter(|f| f.format != Format::Undefined)
                .collect(),
            present_modes: present_modes.into_iter().filter_map(vk_to_present_mode).collect(),
        })
    }
}

impl VulkanSwapchain {
    /// Create a swapchain with the parameters chosen by the engine
    pub fn new(
        ctx: &VulkanContext,
        loader: &ash::khr::swapchain::Device,
        desc: &SwapchainDesc,
    ) -> Result<Self> {
        unsafe {
            let caps = ctx
                .surface_loader
                .get_physical_device_surface_capabilities(ctx.physical_device, ctx.surface)
                .map_err(|e| engine_err!("lumen::vulkan", "Failed to get surface capabilities: {:?}", e))?;

            let format = format_to_vk(desc.surface_format.format);
            let family_indices = [ctx.queue_families.graphics, ctx.queue_families.present];

            let mut create_info = vk::SwapchainCreateInfoKHR::default()
                .surface(ctx.surface)
                .min_image_count(desc.image_count)
                .image_format(format)
                .image_color_space(color_space_to_vk(desc.surface_format.color_space))
                .image_extent(extent_to_vk(desc.extent))
                .image_array_layers(1)
                .image_usage(vk::ImageUsageFlags::COLOR_ATTACHMENT)
                .pre_transform(caps.current_transform)
                .composite_alpha(vk::CompositeAlphaFlagsKHR::OPAQUE)
                .present_mode(present_mode_to_vk(desc.present_mode))
                .clipped(true);

            create_info = if ctx.queue_families.is_shared() {
                create_info.image_sharing_mode(vk::SharingMode::EXCLUSIVE)
            } else {
                create_info
                    .image_sharing_mode(vk::SharingMode::CONCURRENT)
                    .queue_family_indices(&family_indices)
            };

            let handle = loader.create_swapchain(&create_info, None).map_err(|e| {
                engine_error!("lumen::vulkan", "Failed to create swapchain: {:?}", e);
                Error::InitializationFailed(format!("Failed to create swapchain: {:?}", e))
            })?;

            let images = match loader.get_swapchain_images(handle) {
                Ok(images) => images,
                Err(e) => {
                    loader.destroy_swapchain(handle, None);
                    engine_error!("lumen::vulkan", "Failed to get swapchain images: {:?}", e);
                    return Err(Error::InitializationFailed(format!(
                        "Failed to get swapchain images: {:?}",
                        e
                    )));
                }
            };

            engine_debug!(
                "lumen::vulkan",
                "Swapchain created: {}x{}, {} images, {:?}",
                desc.extent.width,
                desc.extent.height,
                images.len(),
                desc.present_mode
            );

            Ok(Self { handle, images, format, extent: desc.extent, views: Vec::new() })
        }
    }

    /// Acquire the next image; an out-of-date surface is an outcome, not an error
    pub fn acquire(
        &self,
        loader: &ash::khr::swapchain::Device,
        signal: vk::Semaphore,
    ) -> Result<AcquireOutcome> {
        let result = unsafe {
            loader.acquire_next_image(self.handle, u64::MAX, signal, vk::Fence::null())
        };
        match result {
            // A suboptimal acquire still signals; the present reports it
            Ok((index, _suboptimal)) => Ok(AcquireOutcome::Acquired(index)),
            Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => Ok(AcquireOutcome::OutOfDate),
            Err(e) => Err(engine_err!("lumen::vulkan", "Failed to acquire swapchain image: {:?}", e)),
        }
    }

    /// Queue an image for presentation once `wait` is signaled
    pub fn present(
        &self,
        loader: &ash::khr::swapchain::Device,
        queue: vk::Queue,
        image_index: u32,
        wait: vk::Semaphore,
    ) -> Result<PresentOutcome> {
        let swapchains = [self.handle];
        let image_indices = [image_index];
        let wait_semaphores = [wait];

        let present_info = vk::PresentInfoKHR::default()
            .wait_semaphores(&wait_semaphores)
            .swapchains(&swapchains)
            .image_indices(&image_indices);

        match unsafe { loader.queue_present(queue, &present_info) } {
            Ok(false) => Ok(PresentOutcome::Presented),
            Ok(true) | Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => Ok(PresentOutcome::Stale),
            Err(e) => Err(engine_err!("lumen::vulkan", "Failed to present swapchain image: {:?}", e)),
        }
    }
}
