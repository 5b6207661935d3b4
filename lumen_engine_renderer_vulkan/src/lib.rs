/*!
# Lumen Engine - Vulkan Backend

Vulkan 1.3 implementation of the `GraphicsDevice` trait from `lumen_engine`.

The backend uses Ash for the Vulkan bindings and gpu-allocator for memory.
It relies on dynamic rendering and synchronization2 (no render pass or
framebuffer objects). Every object it creates is kept in a typed arena
and handed to the engine as a `slotmap` key.

## Example

```no_run
use lumen_engine_renderer_vulkan::{VulkanDevice, VulkanDeviceConfig};
# fn run(window: &winit::window::Window) -> lumen_engine::lumen::Result<()> {
let device = VulkanDevice::new(window, VulkanDeviceConfig::default())?;
# Ok(())
# }
```

Build with the `vulkan-validation` feature to compile in the Khronos
validation layer and the debug messenger.
*/

mod vulkan_context;
mod vulkan_convert;
mod vulkan_swapchain;
mod vulkan_upload;
mod vulkan_device;

#[cfg(feature = "vulkan-validation")]
mod debug;

pub use vulkan_device::{VulkanDevice, VulkanDeviceConfig};

// Re-export debug utilities
#[cfg(feature = "vulkan-validation")]
pub use debug::{get_validation_stats, print_validation_stats_report, ValidationStats};
