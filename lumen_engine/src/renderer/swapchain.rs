//! Presentation swapchain and its selection policy.
//!
//! The selection helpers are free functions over what the surface reports so
//! they can be checked without a device. `Swapchain` owns the per-image
//! tracked layouts and the multisampled color image that shares the
//! swapchain format. Creation is split into the steps the recreation
//! protocol runs in order: swapchain, image views, color resources.

use crate::error::{Error, Result};
use crate::graphics_device::{
    ColorSpace, Extent2D, Format, GraphicsDevice, ImageDesc, ImageUsage, PresentMode,
    SampleCount, SurfaceCapabilities, SurfaceFormat, SwapchainDesc,
};
use crate::resource::TrackedImage;
use crate::{engine_debug, engine_info};

/// Preferred presentable format
pub const PREFERRED_SURFACE_FORMAT: SurfaceFormat = SurfaceFormat {
    format: Format::B8G8R8A8_UNORM,
    color_space: ColorSpace::SrgbNonlinear,
};

// ============================================================================
// WINDOW SIZE SOURCE
// ============================================================================

/// Window-side collaborator queried while (re)creating the swapchain
pub trait SurfaceSizeSource {
    /// Current framebuffer size in pixels (zero while minimized)
    fn framebuffer_size(&self) -> Extent2D;

    /// Block until the windowing system delivers more events
    fn wait_events(&mut self);

    /// Whether the user asked to close the window
    fn close_requested(&self) -> bool {
        false
    }
}

/// Block until the framebuffer has a non-zero size, then return it
///
/// Returns `None` if the window is closed while still zero-sized.
pub fn wait_for_nonzero_size(source: &mut dyn SurfaceSizeSource) -> Option<Extent2D> {
    let mut size = source.framebuffer_size();
    while size.is_zero() {
        if source.close_requested() {
            return None;
        }
        source.wait_events();
        size = source.framebuffer_size();
    }
    Some(size)
}

// ============================================================================
// SELECTION POLICY
// ============================================================================

/// Preferred format if offered, otherwise the first one
pub fn choose_surface_format(available: &[SurfaceFormat]) -> Result<SurfaceFormat> {
    if available.contains(&PREFERRED_SURFACE_FORMAT) {
        return Ok(PREFERRED_SURFACE_FORMAT);
    }
    available
        .first()
        .copied()
        .ok_or_else(|| Error::InitializationFailed("surface reports no formats".to_string()))
}

/// Mailbox if offered, otherwise FIFO (always available)
pub fn choose_present_mode(available: &[PresentMode]) -> PresentMode {
    if available.contains(&PresentMode::Mailbox) {
        PresentMode::Mailbox
    } else {
        PresentMode::Fifo
    }
}

/// The surface's fixed extent, or the framebuffer size clamped to the limits
pub fn choose_extent(capabilities: &SurfaceCapabilities, framebuffer: Extent2D) -> Extent2D {
    if capabilities.current_extent.width != u32::MAX {
        return capabilities.current_extent;
    }
    let min = capabilities.min_image_extent;
    let max = capabilities.max_image_extent;
    Extent2D::new(
        framebuffer.width.clamp(min.width, max.width),
        framebuffer.height.clamp(min.height, max.height),
    )
}

/// One more than the minimum, capped by the maximum (0 = no cap)
pub fn choose_image_count(capabilities: &SurfaceCapabilities) -> u32 {
    let count = capabilities.min_image_count + 1;
    if capabilities.max_image_count > 0 {
        count.min(capabilities.max_image_count)
    } else {
        count
    }
}

// ============================================================================
// SWAPCHAIN
// ============================================================================

#[derive(Default)]
pub struct Swapchain {
    desc: Option<SwapchainDesc>,
    images: Vec<TrackedImage>,
    color: Option<TrackedImage>,
}

impl Swapchain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pick format, present mode, extent and image count, then create
    pub fn create_swapchain(
        &mut self,
        device: &mut dyn GraphicsDevice,
        framebuffer: Extent2D,
    ) -> Result<()> {
        if self.desc.is_some() {
            return Err(Error::InvalidResource("swapchain already created".to_string()));
        }

        let support = device.surface_support()?;
        let desc = SwapchainDesc {
            surface_format: choose_surface_format(&support.formats)?,
            present_mode: choose_present_mode(&support.present_modes),
            extent: choose_extent(&support.capabilities, framebuffer),
            image_count: choose_image_count(&support.capabilities),
        };
        if desc.extent.is_zero() {
            return Err(Error::InvalidResource("refusing to create a zero-sized swapchain".to_string()));
        }

        device.create_swapchain(&desc)?;
        self.desc = Some(desc);

        engine_info!(
            "lumen::Swapchain",
            "Swapchain created: {}x{}, {} images, {:?}, {:?}",
            desc.extent.width,
            desc.extent.height,
            desc.image_count,
            desc.surface_format.format,
            desc.present_mode
        );
        Ok(())
    }

    /// Register the swapchain images; each starts `Undefined`
    pub fn create_image_views(&mut self, device: &mut dyn GraphicsDevice) -> Result<()> {
        let format = self.format();
        let views = device.create_swapchain_image_views()?;
        self.images = views
            .into_iter()
            .map(|view| TrackedImage::new(view, format, 1))
            .collect();
        Ok(())
    }

    /// Create the multisampled color image in the swapchain format
    pub fn create_color_resources(
        &mut self,
        device: &mut dyn GraphicsDevice,
        samples: SampleCount,
    ) -> Result<()> {
        let desc = self
            .desc
            .ok_or_else(|| Error::InvalidResource("swapchain not created".to_string()))?;
        let image = device.create_image(&ImageDesc {
            name: "swapchain_color".to_string(),
            extent: desc.extent,
            format: desc.surface_format.format,
            mip_levels: 1,
            samples,
            usage: ImageUsage::TRANSIENT_ATTACHMENT | ImageUsage::COLOR_ATTACHMENT,
        })?;
        self.color = Some(TrackedImage::new(image, desc.surface_format.format, 1));
        engine_debug!("lumen::Swapchain", "Color resources created ({} samples)", samples.count());
        Ok(())
    }

    pub fn is_created(&self) -> bool {
        self.desc.is_some()
    }

    /// Current extent (zero when not created)
    pub fn extent(&self) -> Extent2D {
        self.desc.map(|d| d.extent).unwrap_or_default()
    }

    pub fn format(&self) -> Format {
        self.desc
            .map(|d| d.surface_format.format)
            .unwrap_or(Format::Undefined)
    }

    pub fn present_mode(&self) -> Option<PresentMode> {
        self.desc.map(|d| d.present_mode)
    }

    pub fn image_count(&self) -> usize {
        self.images.len()
    }

    pub fn image(&self, index: u32) -> Option<&TrackedImage> {
        self.images.get(index as usize)
    }

    pub fn image_mut(&mut self, index: u32) -> Option<&mut TrackedImage> {
        self.images.get_mut(index as usize)
    }

    pub fn color_image(&self) -> Option<&TrackedImage> {
        self.color.as_ref()
    }

    /// Destroy color resources, image views and the swapchain (idempotent)
    pub fn cleanup(&mut self, device: &mut dyn GraphicsDevice) {
        if let Some(color) = self.color.take() {
            device.destroy_image(color.image());
        }
        self.images.clear();
        if self.desc.take().is_some() {
            device.destroy_swapchain();
        }
    }
}

#[cfg(test)]
#[path = "swapchain_tests.rs"]
mod tests;
