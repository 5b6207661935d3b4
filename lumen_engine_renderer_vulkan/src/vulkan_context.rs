/// VulkanContext - instance, surface, physical and logical device
///
/// Everything here lives for the whole lifetime of a `VulkanDevice` and is
/// destroyed last, after every object created from it.

use ash::vk;
use lumen_engine::lumen::device::{Format, SampleCount};
use lumen_engine::lumen::{Error, Result};
use lumen_engine::{engine_debug, engine_error, engine_info, engine_warn};
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use std::ffi::CStr;

use crate::vulkan_convert::{format_to_vk, max_usable_sample_count};
use crate::VulkanDeviceConfig;

/// Depth formats tried in order of preference
const DEPTH_FORMAT_CANDIDATES: [Format; 3] =
    [Format::D32_SFLOAT, Format::D32_SFLOAT_S8_UINT, Format::D24_UNORM_S8_UINT];

/// Queue families used for rendering and presentation (may be equal)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct QueueFamilies {
    pub graphics: u32,
    pub present: u32,
}

impl QueueFamilies {
    pub fn is_shared(&self) -> bool {
        self.graphics == self.present
    }
}

/// Core Vulkan objects shared by every resource the device creates
pub(crate) struct VulkanContext {
    /// Vulkan entry (keeps the loader library alive)
    _entry: ash::Entry,
    pub instance: ash::Instance,
    pub surface_loader: ash::khr::surface::Instance,
    pub surface: vk::SurfaceKHR,
    pub physical_device: vk::PhysicalDevice,
    pub device: ash::Device,
    pub queue_families: QueueFamilies,
    pub graphics_queue: vk::Queue,
    pub present_queue: vk::Queue,
    pub msaa_samples: SampleCount,
    pub depth_format: Format,
    pub max_anisotropy: f32,
    #[cfg(feature = "vulkan-validation")]
    debug_messenger: Option<crate::debug::DebugMessenger>,
}

impl VulkanContext {
    /// Create the instance, the window surface and the logical device
    pub fn new<W: HasDisplayHandle + HasWindowHandle>(
        window: &W,
        config: &VulkanDeviceConfig,
    ) -> Result<Self> {
        unsafe {
            let entry = ash::Entry::load().map_err(|e| {
                engine_error!("lumen::vulkan", "Failed to load Vulkan library: {:?}", e);
                Error::InitializationFailed(format!("Failed to load Vulkan library: {:?}", e))
            })?;

            let display_handle = window.display_handle().map_err(|e| {
                engine_error!("lumen::vulkan", "Failed to get display handle: {}", e);
                Error::InitializationFailed(format!("Failed to get display handle: {}", e))
            })?;
            let window_handle = window.window_handle().map_err(|e| {
                engine_error!("lumen::vulkan", "Failed to get window handle: {}", e);
                Error::InitializationFailed(format!("Failed to get window handle: {}", e))
            })?;

            let validation = validation_requested(config);
            let instance = create_instance(&entry, display_handle.as_raw(), &config.app_name, validation)?;

            #[cfg(feature = "vulkan-validation")]
            let debug_messenger = if validation {
                match crate::debug::DebugMessenger::new(&entry, &instance) {
                    Ok(messenger) => Some(messenger),
                    Err(e) => {
                        instance.destroy_instance(None);
                        return Err(e);
                    }
                }
            } else {
                None
            };

            let surface = match ash_window::create_surface(
                &entry,
                &instance,
                display_handle.as_raw(),
                window_handle.as_raw(),
                None,
            ) {
                Ok(surface) => surface,
                Err(e) => {
                    engine_error!("lumen::vulkan", "Failed to create surface: {:?}", e);
                    #[cfg(feature = "vulkan-validation")]
                    if let Some(messenger) = debug_messenger {
                        messenger.destroy();
                    }
                    instance.destroy_instance(None);
                    return Err(Error::InitializationFailed(format!(
                        "Failed to create surface: {:?}",
                        e
                    )));
                }
            };
            let surface_loader = ash::khr::surface::Instance::new(&entry, &instance);

            let selected = pick_physical_device(&instance, &surface_loader, surface)
                .and_then(|(physical_device, queue_families)| {
                    let device = create_logical_device(&instance, physical_device, queue_families)?;
                    Ok((physical_device, queue_families, device))
                });

            let (physical_device, queue_families, device) = match selected {
                Ok(selected) => selected,
                Err(e) => {
                    surface_loader.destroy_surface(surface, None);
                    #[cfg(feature = "vulkan-validation")]
                    if let Some(messenger) = debug_messenger {
                        messenger.destroy();
                    }
                    instance.destroy_instance(None);
                    return Err(e);
                }
            };

            let properties = instance.get_physical_device_properties(physical_device);
            let msaa_samples = max_usable_sample_count(&properties.limits);
            let max_anisotropy = properties.limits.max_sampler_anisotropy;

            let depth_format = match find_depth_format(&instance, physical_device) {
                Ok(format) => format,
                Err(e) => {
                    device.destroy_device(None);
                    surface_loader.destroy_surface(surface, None);
                    #[cfg(feature = "vulkan-validation")]
                    if let Some(messenger) = debug_messenger {
                        messenger.destroy();
                    }
                    instance.destroy_instance(None);
                    return Err(e);
                }
            };

            let graphics_queue = device.get_device_queue(queue_families.graphics, 0);
            let present_queue = device.get_device_queue(queue_families.present, 0);

            let device_name = CStr::from_ptr(properties.device_name.as_ptr())
                .to_str()
                .unwrap_or("Unknown");
            engine_info!(
                "lumen::vulkan",
                "Using {} (graphics family {}, present family {}, {}x MSAA, depth {:?})",
                device_name,
                queue_families.graphics,
                queue_families.present,
                msaa_samples.count(),
                depth_format
            );

            Ok(Self {
                _entry: entry,
                instance,
                surface_loader,
                surface,
                physical_device,
                device,
                queue_families,
                graphics_queue,
                present_queue,
                msaa_samples,
                depth_format,
                max_anisotropy,
                #[cfg(feature = "vulkan-validation")]
                debug_messenger,
            })
        }
    }

    /// Whether `format` can be a linear-filtered blit source with optimal tiling
    pub fn supports_linear_blit(&self, format: vk::Format) -> bool {
        let properties = unsafe {
            self.instance
                .get_physical_device_format_properties(self.physical_device, format)
        };
        properties
            .optimal_tiling_features
            .contains(vk::FormatFeatureFlags::SAMPLED_IMAGE_FILTER_LINEAR)
    }

    /// Destroy device, surface, messenger and instance (in that order)
    ///
    /// # Safety
    ///
    /// Every object created from the device must already be destroyed and
    /// the allocator dropped.
    pub unsafe fn destroy(&mut self) {
        self.device.destroy_device(None);
        self.surface_loader.destroy_surface(self.surface, None);
        #[cfg(feature = "vulkan-validation")]
        if let Some(messenger) = self.debug_messenger.take() {
            messenger.destroy();
        }
        self.instance.destroy_instance(None);
    }
}

/// Validation only exists when the feature is compiled in
fn validation_requested(config: &VulkanDeviceConfig) -> bool {
    if config.enable_validation && !cfg!(feature = "vulkan-validation") {
        engine_warn!(
            "lumen::vulkan",
            "Validation requested but the vulkan-validation feature is disabled"
        );
    }
    config.enable_validation && cfg!(feature = "vulkan-validation")
}

unsafe fn create_instance(
    entry: &ash::Entry,
    display_handle: raw_window_handle::RawDisplayHandle,
    app_name: &str,
    validation: bool,
) -> Result<ash::Instance> {
    let app_name = std::ffi::CString::new(app_name)
        .map_err(|e| Error::InitializationFailed(format!("Invalid application name: {}", e)))?;

    let app_info = vk::ApplicationInfo::default()
        .application_name(&app_name)
        .application_version(vk::make_api_version(0, 1, 0, 0))
        .engine_name(c"Lumen")
        .engine_version(vk::make_api_version(0, 0, 1, 0))
        .api_version(vk::API_VERSION_1_3);

    #[cfg_attr(not(feature = "vulkan-validation"), allow(unused_mut))]
    let mut extension_names = ash_window::enumerate_required_extensions(display_handle)
        .map_err(|e| {
            engine_error!("lumen::vulkan", "Failed to get required extensions: {}", e);
            Error::InitializationFailed(format!("Failed to get required extensions: {}", e))
        })?
        .to_vec();

    #[cfg(feature = "vulkan-validation")]
    let layer_names = if validation {
        extension_names.push(ash::ext::debug_utils::NAME.as_ptr());
        vec![crate::debug::VALIDATION_LAYER.as_ptr()]
    } else {
        vec![]
    };
    #[cfg(not(feature = "vulkan-validation"))]
    let layer_names: Vec<*const std::os::raw::c_char> = {
        let _ = validation;
        vec![]
    };

    let create_info = vk::InstanceCreateInfo::default()
        .application_info(&app_info)
        .enabled_layer_names(&layer_names)
        .enabled_extension_names(&extension_names);

    entry.create_instance(&create_info, None).map_err(|e| {
        engine_error!("lumen::vulkan", "Failed to create Vulkan instance: {:?}", e);
        Error::InitializationFailed(format!("Failed to create instance: {:?}", e))
    })
}

/// First device with graphics+present queues, the swapchain extension, a
/// usable surface and anisotropic filtering
unsafe fn pick_physical_device(
    instance: &ash::Instance,
    surface_loader: &ash::khr::surface::Instance,
    surface: vk::SurfaceKHR,
) -> Result<(vk::PhysicalDevice, QueueFamilies)> {
    let physical_devices = instance.enumerate_physical_devices().map_err(|e| {
        engine_error!("lumen::vulkan", "Failed to enumerate physical devices: {:?}", e);
        Error::InitializationFailed(format!("Failed to enumerate physical devices: {:?}", e))
    })?;

    if physical_devices.is_empty() {
        engine_error!("lumen::vulkan", "No Vulkan-capable GPU found");
        return Err(Error::InitializationFailed("No Vulkan-capable GPU found".to_string()));
    }

    for physical_device in physical_devices {
        let Some(queue_families) = find_queue_families(instance, surface_loader, surface, physical_device)
        else {
            continue;
        };
        if !supports_swapchain_extension(instance, physical_device) {
            continue;
        }

        let formats = surface_loader
            .get_physical_device_surface_formats(physical_device, surface)
            .unwrap_or_default();
        let present_modes = surface_loader
            .get_physical_device_surface_present_modes(physical_device, surface)
            .unwrap_or_default();
        if formats.is_empty() || present_modes.is_empty() {
            continue;
        }

        let features = instance.get_physical_device_features(physical_device);
        if features.sampler_anisotropy != vk::TRUE {
            continue;
        }

        return Ok((physical_device, queue_families));
    }

    engine_error!("lumen::vulkan", "No suitable GPU found");
    Err(Error::InitializationFailed("No suitable GPU found".to_string()))
}

unsafe fn find_queue_families(
    instance: &ash::Instance,
    surface_loader: &ash::khr::surface::Instance,
    surface: vk::SurfaceKHR,
    physical_device: vk::PhysicalDevice,
) -> Option<QueueFamilies> {
    let families = instance.get_physical_device_queue_family_properties(physical_device);

    let graphics = families
        .iter()
        .position(|family| family.queue_flags.contains(vk::QueueFlags::GRAPHICS))? as u32;

    let present = (0..families.len() as u32).find(|&index| {
        surface_loader
            .get_physical_device_surface_support(physical_device, index, surface)
            .unwrap_or(false)
    })?;

    Some(QueueFamilies { graphics, present })
}

unsafe fn supports_swapchain_extension(instance: &ash::Instance, physical_device: vk::PhysicalDevice) -> bool {
    let extensions = instance
        .enumerate_device_extension_properties(physical_device)
        .unwrap_or_default();
    let supported = extensions.iter().any(|extension| {
        extension
            .extension_name_as_c_str()
            .map(|name| name == ash::khr::swapchain::NAME)
            .unwrap_or(false)
    });
    if !supported {
        engine_debug!("lumen::vulkan", "Skipping device without VK_KHR_swapchain");
    }
    supported
}

unsafe fn create_logical_device(
    instance: &ash::Instance,
    physical_device: vk::PhysicalDevice,
    queue_families: QueueFamilies,
) -> Result<ash::Device> {
    let queue_priorities = [1.0];
    let mut queue_create_infos = vec![vk::DeviceQueueCreateInfo::default()
        .queue_family_index(queue_families.graphics)
        .queue_priorities(&queue_priorities)];
    if !queue_families.is_shared() {
        queue_create_infos.push(
            vk::DeviceQueueCreateInfo::default()
                .queue_family_index(queue_families.present)
                .queue_priorities(&queue_priorities),
        );
    }

    let device_extension_names = [ash::khr::swapchain::NAME.as_ptr()];

    let features = vk::PhysicalDeviceFeatures::default()
        .sampler_anisotropy(true)
        .sample_rate_shading(true);
    let mut features13 = vk::PhysicalDeviceVulkan13Features::default()
        .dynamic_rendering(true)
        .synchronization2(true)
        .maintenance4(true);
    let mut features2 = vk::PhysicalDeviceFeatures2::default()
        .features(features)
        .push_next(&mut features13);

    let create_info = vk::DeviceCreateInfo::default()
        .queue_create_infos(&queue_create_infos)
        .enabled_extension_names(&device_extension_names)
        .push_next(&mut features2);

    instance
        .create_device(physical_device, &create_info, None)
        .map_err(|e| {
            engine_error!("lumen::vulkan", "Failed to create logical device: {:?}", e);
            Error::InitializationFailed(format!("Failed to create device: {:?}", e))
        })
}

/// First candidate usable as an optimal-tiling depth attachment
unsafe fn find_depth_format(instance: &ash::Instance, physical_device: vk::PhysicalDevice) -> Result<Format> {
    DEPTH_FORMAT_CANDIDATES
        .into_iter()
        .find(|&format| {
            let properties =
                instance.get_physical_device_format_properties(physical_device, format_to_vk(format));
            properties
                .optimal_tiling_features
                .contains(vk::FormatFeatureFlags::DEPTH_STENCIL_ATTACHMENT)
        })
        .ok_or_else(|| {
            engine_error!("lumen::vulkan", "No supported depth format found");
            Error::InitializationFailed("No supported depth format found".to_string())
        })
}
