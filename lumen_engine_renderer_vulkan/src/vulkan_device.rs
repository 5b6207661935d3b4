/// VulkanDevice - Vulkan 1.3 implementation of the GraphicsDevice trait
///
/// Every object handed to the engine lives in a per-kind `slotmap` arena and
/// is addressed by the typed key the engine holds. Destroy calls remove the
/// arena entry; stale or null keys are ignored.

use ash::vk;
use gpu_allocator::vulkan::{
    Allocation, AllocationCreateDesc, AllocationScheme, Allocator, AllocatorCreateDesc,
};
use gpu_allocator::MemoryLocation as GpuMemoryLocation;
use lumen_engine::lumen::device::{
    AcquireOutcome, BufferDesc, BufferKey, CommandBufferKey, DescriptorPoolFlags,
    DescriptorPoolKey, DescriptorPoolSize, DescriptorSetKey, DescriptorSetLayoutBinding,
    DescriptorSetLayoutKey, DescriptorWrite, FenceKey, Format, GraphicsDevice,
    GraphicsPipelineDesc, ImageBarrier, ImageDesc, ImageKey, IndexType, MemoryLocation,
    PipelineCacheKey, PipelineKey, PipelineLayoutDesc, PipelineLayoutKey, PresentOutcome, Rect2D,
    RenderingAttachment, RenderingInfo, SampleCount, SamplerDesc, SamplerKey, SemaphoreKey,
    ShaderModuleKey, ShaderStages, SurfaceSupport, SwapchainDesc, Viewport,
};
use lumen_engine::lumen::{Error, Result};
use lumen_engine::{engine_debug, engine_err, engine_error, engine_info, engine_warn};
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use slotmap::{Key, SlotMap};
use std::ffi::CString;
use std::mem::ManuallyDrop;

use crate::vulkan_context::VulkanContext;
use crate::vulkan_convert::{
    access_to_vk, address_mode_to_vk, aspect_to_vk, buffer_usage_to_vk, clear_value_to_vk,
    color_write_mask_to_vk, compare_op_to_vk, cull_mode_to_vk, descriptor_type_to_vk,
    dynamic_state_to_vk, filter_to_vk, format_to_vk, front_face_to_vk, image_layout_to_vk,
    image_usage_to_vk, index_type_to_vk, mipmap_mode_to_vk, polygon_mode_to_vk,
    resolve_mode_to_vk, sample_count_to_vk, shader_stages_to_vk, stages_to_vk, topology_to_vk,
    vk_to_format,
};
use crate::vulkan_swapchain::{query_surface_support, VulkanSwapchain};
use crate::vulkan_upload::{record_buffer_copy, record_texture_upload, submit_one_shot, StagingBuffer};

/// Configuration for creating a `VulkanDevice`
#[derive(Debug, Clone)]
pub struct VulkanDeviceConfig {
    /// Application name reported to the driver
    pub app_name: String,
    /// Enable the Khronos validation layer (requires the `vulkan-validation` feature)
    pub enable_validation: bool,
}

impl Default for VulkanDeviceConfig {
    fn default() -> Self {
        Self {
            app_name: "Lumen Application".to_string(),
            enable_validation: cfg!(debug_assertions),
        }
    }
}

// ============================================================================
// Arena records
// ============================================================================

/// Image, its default view and (for owned images) its memory
struct ImageRecord {
    name: String,
    image: vk::Image,
    view: vk::ImageView,
    /// `None` for swapchain images, which the swapchain owns
    allocation: Option<Allocation>,
    format: Format,
    width: u32,
    height: u32,
    mip_levels: u32,
}

impl ImageRecord {
    fn is_owned(&self) -> bool {
        self.allocation.is_some()
    }
}

struct BufferRecord {
    name: String,
    buffer: vk::Buffer,
    allocation: Option<Allocation>,
    size: u64,
}

struct DescriptorSetRecord {
    set: vk::DescriptorSet,
    pool: DescriptorPoolKey,
}

/// Look up an arena entry or fail with `InvalidResource`
fn lookup<'a, K: Key, V>(arena: &'a SlotMap<K, V>, key: K, kind: &str) -> Result<&'a V> {
    arena
        .get(key)
        .ok_or_else(|| Error::InvalidResource(format!("unknown {} handle", kind)))
}

fn lookup_copy<K: Key, V: Copy>(arena: &SlotMap<K, V>, key: K, kind: &str) -> Result<V> {
    lookup(arena, key, kind).copied()
}

// ============================================================================
// Device
// ============================================================================

/// Vulkan graphics device
///
/// Owns the instance, surface, logical device, allocator, command pools,
/// the swapchain and every object the engine creates through it.
pub struct VulkanDevice {
    ctx: VulkanContext,
    /// Dropped by hand before the logical device is destroyed
    allocator: ManuallyDrop<Allocator>,
    swapchain_loader: ash::khr::swapchain::Device,
    /// Frame command buffers (RESET_COMMAND_BUFFER)
    command_pool: vk::CommandPool,
    /// One-shot uploads (TRANSIENT)
    upload_command_pool: vk::CommandPool,
    swapchain: Option<VulkanSwapchain>,

    images: SlotMap<ImageKey, ImageRecord>,
    buffers: SlotMap<BufferKey, BufferRecord>,
    samplers: SlotMap<SamplerKey, vk::Sampler>,
    descriptor_pools: SlotMap<DescriptorPoolKey, vk::DescriptorPool>,
    descriptor_set_layouts: SlotMap<DescriptorSetLayoutKey, vk::DescriptorSetLayout>,
    descriptor_sets: SlotMap<DescriptorSetKey, DescriptorSetRecord>,
    shader_modules: SlotMap<ShaderModuleKey, vk::ShaderModule>,
    pipeline_layouts: SlotMap<PipelineLayoutKey, vk::PipelineLayout>,
    pipeline_caches: SlotMap<PipelineCacheKey, vk::PipelineCache>,
    pipelines: SlotMap<PipelineKey, vk::Pipeline>,
    command_buffers: SlotMap<CommandBufferKey, vk::CommandBuffer>,
    fences: SlotMap<FenceKey, vk::Fence>,
    semaphores: SlotMap<SemaphoreKey, vk::Semaphore>,
}

impl VulkanDevice {
    /// Create a new Vulkan device for `window`
    ///
    /// # Arguments
    ///
    /// * `window` - Window whose surface the swapchain presents to
    /// * `config` - Device configuration
    pub fn new<W: HasDisplayHandle + HasWindowHandle>(
        window: &W,
        config: VulkanDeviceConfig,
    ) -> Result<Self> {
        let mut ctx = VulkanContext::new(window, &config)?;

        match Self::create_device_objects(&ctx) {
            Ok((allocator, command_pool, upload_command_pool)) => {
                let swapchain_loader = ash::khr::swapchain::Device::new(&ctx.instance, &ctx.device);
                engine_info!("lumen::vulkan", "Vulkan device ready");
                Ok(Self {
                    ctx,
                    allocator: ManuallyDrop::new(allocator),
                    swapchain_loader,
                    command_pool,
                    upload_command_pool,
                    swapchain: None,
                    images: SlotMap::with_key(),
                    buffers: SlotMap::with_key(),
                    samplers: SlotMap::with_key(),
                    descriptor_pools: SlotMap::with_key(),
                    descriptor_set_layouts: SlotMap::with_key(),
                    descriptor_sets: SlotMap::with_key(),
                    shader_modules: SlotMap::with_key(),
                    pipeline_layouts: SlotMap::with_key(),
                    pipeline_caches: SlotMap::with_key(),
                    pipelines: SlotMap::with_key(),
                    command_buffers: SlotMap::with_key(),
                    fences: SlotMap::with_key(),
                    semaphores: SlotMap::with_key(),
                })
            }
            Err(e) => {
                unsafe { ctx.destroy() };
                Err(e)
            }
        }
    }

    fn create_device_objects(ctx: &VulkanContext) -> Result<(Allocator, vk::CommandPool, vk::CommandPool)> {
        let allocator = Allocator::new(&AllocatorCreateDesc {
            instance: ctx.instance.clone(),
            device: ctx.device.clone(),
            physical_device: ctx.physical_device,
            debug_settings: Default::default(),
            buffer_device_address: false,
            allocation_sizes: Default::default(),
        })
        .map_err(|e| {
            engine_error!("lumen::vulkan", "Failed to create GPU allocator: {:?}", e);
            Error::InitializationFailed(format!("Failed to create allocator: {:?}", e))
        })?;

        unsafe {
            let pool_info = vk::CommandPoolCreateInfo::default()
                .queue_family_index(ctx.queue_families.graphics)
                .flags(vk::CommandPoolCreateFlags::RESET_COMMAND_BUFFER);
            let command_pool = ctx.device.create_command_pool(&pool_info, None).map_err(|e| {
                engine_error!("lumen::vulkan", "Failed to create command pool: {:?}", e);
                Error::InitializationFailed(format!("Failed to create command pool: {:?}", e))
            })?;

            let upload_pool_info = vk::CommandPoolCreateInfo::default()
                .queue_family_index(ctx.queue_families.graphics)
                .flags(vk::CommandPoolCreateFlags::TRANSIENT);
            let upload_command_pool = match ctx.device.create_command_pool(&upload_pool_info, None) {
                Ok(pool) => pool,
                Err(e) => {
                    ctx.device.destroy_command_pool(command_pool, None);
                    engine_error!("lumen::vulkan", "Failed to create upload command pool: {:?}", e);
                    return Err(Error::InitializationFailed(format!(
                        "Failed to create upload command pool: {:?}",
                        e
                    )));
                }
            };

            Ok((allocator, command_pool, upload_command_pool))
        }
    }

    fn allocate_memory(
        &mut self,
        name: &str,
        requirements: vk::MemoryRequirements,
        location: GpuMemoryLocation,
        linear: bool,
    ) -> Result<Allocation> {
        self.allocator
            .allocate(&AllocationCreateDesc {
                name,
                requirements,
                location,
                linear,
                allocation_scheme: AllocationScheme::GpuAllocatorManaged,
            })
            .map_err(|e| {
                let size_mb = requirements.size as f64 / (1024.0 * 1024.0);
                engine_error!(
                    "lumen::vulkan",
                    "Out of GPU memory for '{}' ({:.2} MB): {:?}",
                    name,
                    size_mb,
                    e
                );
                Error::OutOfMemory
            })
    }

    fn destroy_image_record(&mut self, record: ImageRecord) {
        unsafe {
            self.ctx.device.destroy_image_view(record.view, None);
            if let Some(allocation) = record.allocation {
                self.allocator.free(allocation).ok();
                self.ctx.device.destroy_image(record.image, None);
            }
        }
    }

    fn destroy_buffer_record(&mut self, mut record: BufferRecord) {
        if let Some(allocation) = record.allocation.take() {
            self.allocator.free(allocation).ok();
        }
        unsafe {
            self.ctx.device.destroy_buffer(record.buffer, None);
        }
    }

    fn command_buffer(&self, cmd: CommandBufferKey) -> Result<vk::CommandBuffer> {
        lookup_copy(&self.command_buffers, cmd, "command buffer")
    }

    fn image_view(&self, image: ImageKey) -> Result<vk::ImageView> {
        lookup(&self.images, image, "image").map(|record| record.view)
    }

    fn rendering_attachment(&self, attachment: &RenderingAttachment) -> Result<vk::RenderingAttachmentInfo<'static>> {
        let mut info = vk::RenderingAttachmentInfo::default()
            .image_view(self.image_view(attachment.image)?)
            .image_layout(image_layout_to_vk(attachment.layout))
            .load_op(vk::AttachmentLoadOp::CLEAR)
            .store_op(vk::AttachmentStoreOp::STORE)
            .clear_value(clear_value_to_vk(attachment.clear));

        if let Some(resolve) = attachment.resolve {
            info = info
                .resolve_mode(resolve_mode_to_vk(resolve.mode))
                .resolve_image_view(self.image_view(resolve.image)?)
                .resolve_image_layout(image_layout_to_vk(resolve.layout));
        }
        Ok(info)
    }

    /// Destroy everything still alive in the arenas (engine leaks, shutdown)
    fn destroy_all_objects(&mut self) {
        let leaked = self.images.values().filter(|r| r.is_owned()).count()
            + self.buffers.len()
            + self.pipelines.len()
            + self.descriptor_pools.len();
        if leaked > 0 {
            engine_warn!("lumen::vulkan", "Destroying {} objects still alive at shutdown", leaked);
        }

        self.destroy_swapchain();

        let images: Vec<ImageRecord> = self.images.drain().map(|(_, record)| record).collect();
        for record in images {
            self.destroy_image_record(record);
        }
        let buffers: Vec<BufferRecord> = self.buffers.drain().map(|(_, record)| record).collect();
        for record in buffers {
            self.destroy_buffer_record(record);
        }

        let device = &self.ctx.device;
        unsafe {
            for (_, sampler) in self.samplers.drain() {
                device.destroy_sampler(sampler, None);
            }
            self.descriptor_sets.clear();
            for (_, pool) in self.descriptor_pools.drain() {
                device.destroy_descriptor_pool(pool, None);
            }
            for (_, layout) in self.descriptor_set_layouts.drain() {
                device.destroy_descriptor_set_layout(layout, None);
            }
            for (_, pipeline) in self.pipelines.drain() {
                device.destroy_pipeline(pipeline, None);
            }
            for (_, layout) in self.pipeline_layouts.drain() {
                device.destroy_pipeline_layout(layout, None);
            }
            for (_, cache) in self.pipeline_caches.drain() {
                device.destroy_pipeline_cache(cache, None);
            }
            for (_, module) in self.shader_modules.drain() {
                device.destroy_shader_module(module, None);
            }
            for (_, fence) in self.fences.drain() {
                device.destroy_fence(fence, None);
            }
            for (_, semaphore) in self.semaphores.drain() {
                device.destroy_semaphore(semaphore, None);
            }
            // Freed with their pool
            self.command_buffers.clear();
        }
    }
}

impl GraphicsDevice for VulkanDevice {
    // ===== CAPABILITIES =====

    fn msaa_samples(&self) -> SampleCount {
        self.ctx.msaa_samples
    }

    fn depth_format(&self) -> Format {
        self.ctx.depth_format
    }

    fn max_sampler_anisotropy(&self) -> f32 {
        self.ctx.max_anisotropy
    }

    fn wait_idle(&mut self) -> Result<()> {
        unsafe {
            self.ctx
                .device
                .device_wait_idle()
                .map_err(|e| engine_err!("lumen::vulkan", "Failed to wait idle: {:?}", e))
        }
    }

    // ===== IMAGES =====

    fn create_image(&mut self, desc: &ImageDesc) -> Result<ImageKey> {
        if desc.extent.is_zero() || desc.mip_levels == 0 {
            return Err(Error::InvalidResource(format!(
                "image '{}' has a zero extent or no mip levels",
                desc.name
            )));
        }

        let format = format_to_vk(desc.format);
        let image_info = vk::ImageCreateInfo::default()
            .image_type(vk::ImageType::TYPE_2D)
            .format(format)
            .extent(vk::Extent3D { width: desc.extent.width, height: desc.extent.height, depth: 1 })
            .mip_levels(desc.mip_levels)
            .array_layers(1)
            .samples(sample_count_to_vk(desc.samples))
            .tiling(vk::ImageTiling::OPTIMAL)
            .usage(image_usage_to_vk(desc.usage))
            .sharing_mode(vk::SharingMode::EXCLUSIVE)
            .initial_layout(vk::ImageLayout::UNDEFINED);

        let image = unsafe { self.ctx.device.create_image(&image_info, None) }
            .map_err(|e| engine_err!("lumen::vulkan", "Failed to create image '{}': {:?}", desc.name, e))?;

        let requirements = unsafe { self.ctx.device.get_image_memory_requirements(image) };
        let allocation = match self.allocate_memory(&desc.name, requirements, GpuMemoryLocation::GpuOnly, false) {
            Ok(allocation) => allocation,
            Err(e) => {
                unsafe { self.ctx.device.destroy_image(image, None) };
                return Err(e);
            }
        };

        let bound = unsafe {
            self.ctx
                .device
                .bind_image_memory(image, allocation.memory(), allocation.offset())
        };
        let view = bound
            .map_err(|e| engine_err!("lumen::vulkan", "Failed to bind image memory for '{}': {:?}", desc.name, e))
            .and_then(|_| {
                let view_info = vk::ImageViewCreateInfo::default()
                    .image(image)
                    .view_type(vk::ImageViewType::TYPE_2D)
                    .format(format)
                    .subresource_range(vk::ImageSubresourceRange {
                        aspect_mask: aspect_to_vk(desc.format.view_aspect()),
                        base_mip_level: 0,
                        level_count: desc.mip_levels,
                        base_array_layer: 0,
                        layer_count: 1,
                    });
                unsafe { self.ctx.device.create_image_view(&view_info, None) }.map_err(|e| {
                    engine_err!("lumen::vulkan", "Failed to create image view for '{}': {:?}", desc.name, e)
                })
            });

        let view = match view {
            Ok(view) => view,
            Err(e) => {
                self.allocator.free(allocation).ok();
                unsafe { self.ctx.device.destroy_image(image, None) };
                return Err(e);
            }
        };

        engine_debug!(
            "lumen::vulkan",
            "Created image '{}' {}x{} {:?} x{} ({} mips)",
            desc.name,
            desc.extent.width,
            desc.extent.height,
            desc.format,
            desc.samples.count(),
            desc.mip_levels
        );

        Ok(self.images.insert(ImageRecord {
            name: desc.name.clone(),
            image,
            view,
            allocation: Some(allocation),
            format: desc.format,
            width: desc.extent.width,
            height: desc.extent.height,
            mip_levels: desc.mip_levels,
        }))
    }

    fn upload_texture(&mut self, image: ImageKey, pixels: &[u8]) -> Result<()> {
        let (vk_image, width, height, mip_levels, format, name) = {
            let record = lookup(&self.images, image, "image")?;
            (
                record.image,
                record.width,
                record.height,
                record.mip_levels,
                record.format,
                record.name.clone(),
            )
        };

        let expected = width as usize * height as usize * 4;
        if pixels.len() != expected {
            return Err(Error::InvalidResource(format!(
                "texture '{}' expects {} bytes of RGBA8 data, got {}",
                name,
                expected,
                pixels.len()
            )));
        }

        let vk_format = format_to_vk(format);
        if !self.ctx.supports_linear_blit(vk_format) {
            engine_error!(
                "lumen::vulkan",
                "Texture image format {:?} does not support linear blitting",
                format
            );
            return Err(Error::BackendError(format!(
                "texture image format {:?} does not support linear blitting",
                format
            )));
        }

        let staging = StagingBuffer::new(&self.ctx.device, &mut self.allocator, pixels)?;
        let device = &self.ctx.device;
        let result = submit_one_shot(device, self.upload_command_pool, self.ctx.graphics_queue, |cmd| {
            record_texture_upload(device, cmd, staging.buffer, vk_image, width, height, mip_levels);
        });
        staging.destroy(&self.ctx.device, &mut self.allocator);
        result
    }

    fn destroy_image(&mut self, image: ImageKey) {
        let owned = self.images.get(image).map(|r| r.is_owned()).unwrap_or(false);
        if !owned {
            // Swapchain views are released with the swapchain
            return;
        }
        if let Some(record) = self.images.remove(image) {
            self.destroy_image_record(record);
        }
    }

    fn create_sampler(&mut self, desc: &SamplerDesc) -> Result<SamplerKey> {
        let address_mode = address_mode_to_vk(desc.address_mode);
        let mut info = vk::SamplerCreateInfo::default()
            .mag_filter(filter_to_vk(desc.filter))
            .min_filter(filter_to_vk(desc.filter))
            .mipmap_mode(mipmap_mode_to_vk(desc.filter))
            .address_mode_u(address_mode)
            .address_mode_v(address_mode)
            .address_mode_w(address_mode)
            .mip_lod_bias(0.0)
            .min_lod(0.0)
            .max_lod(desc.max_lod)
            .border_color(vk::BorderColor::INT_OPAQUE_BLACK)
            .unnormalized_coordinates(false)
            .compare_enable(false)
            .compare_op(vk::CompareOp::ALWAYS);

        if let Some(max_anisotropy) = desc.max_anisotropy {
            info = info
                .anisotropy_enable(true)
                .max_anisotropy(max_anisotropy.min(self.ctx.max_anisotropy));
        }

        let sampler = unsafe { self.ctx.device.create_sampler(&info, None) }
            .map_err(|e| engine_err!("lumen::vulkan", "Failed to create sampler: {:?}", e))?;
        Ok(self.samplers.insert(sampler))
    }

    fn destroy_sampler(&mut self, sampler: SamplerKey) {
        if let Some(sampler) = self.samplers.remove(sampler) {
            unsafe { self.ctx.device.destroy_sampler(sampler, None) };
        }
    }

    // ===== BUFFERS =====

    fn create_buffer(&mut self, desc: &BufferDesc) -> Result<BufferKey> {
        if desc.size == 0 {
            return Err(Error::InvalidResource(format!("buffer '{}' has zero size", desc.name)));
        }

        let info = vk::BufferCreateInfo::default()
            .size(desc.size)
            .usage(buffer_usage_to_vk(desc.usage))
            .sharing_mode(vk::SharingMode::EXCLUSIVE);

        let buffer = unsafe { self.ctx.device.create_buffer(&info, None) }
            .map_err(|e| engine_err!("lumen::vulkan", "Failed to create buffer '{}': {:?}", desc.name, e))?;

        let requirements = unsafe { self.ctx.device.get_buffer_memory_requirements(buffer) };
        let location = match desc.location {
            MemoryLocation::GpuOnly => GpuMemoryLocation::GpuOnly,
            MemoryLocation::CpuToGpu => GpuMemoryLocation::CpuToGpu,
        };
        let allocation = match self.allocate_memory(&desc.name, requirements, location, true) {
            Ok(allocation) => allocation,
            Err(e) => {
                unsafe { self.ctx.device.destroy_buffer(buffer, None) };
                return Err(e);
            }
        };

        let bound = unsafe {
            self.ctx
                .device
                .bind_buffer_memory(buffer, allocation.memory(), allocation.offset())
        };
        if let Err(e) = bound {
            self.allocator.free(allocation).ok();
            unsafe { self.ctx.device.destroy_buffer(buffer, None) };
            return Err(engine_err!("lumen::vulkan", "Failed to bind buffer memory for '{}': {:?}", desc.name, e));
        }

        Ok(self.buffers.insert(BufferRecord {
            name: desc.name.clone(),
            buffer,
            allocation: Some(allocation),
            size: desc.size,
        }))
    }

    fn write_buffer(&mut self, buffer: BufferKey, offset: u64, data: &[u8]) -> Result<()> {
        let record = lookup(&self.buffers, buffer, "buffer")?;
        if offset + data.len() as u64 > record.size {
            return Err(Error::InvalidResource(format!(
                "write of {} bytes at offset {} overflows buffer '{}' ({} bytes)",
                data.len(),
                offset,
                record.name,
                record.size
            )));
        }

        let allocation = record
            .allocation
            .as_ref()
            .ok_or_else(|| engine_err!("lumen::vulkan", "Buffer '{}' has no allocation", record.name))?;
        let mapped = allocation
            .mapped_ptr()
            .ok_or_else(|| engine_err!("lumen::vulkan", "Buffer '{}' is not CPU-accessible", record.name))?
            .as_ptr() as *mut u8;

        unsafe {
            std::ptr::copy_nonoverlapping(data.as_ptr(), mapped.add(offset as usize), data.len());
        }
        Ok(())
    }

    fn upload_buffer(&mut self, buffer: BufferKey, data: &[u8]) -> Result<()> {
        let (dst, size, name) = {
            let record = lookup(&self.buffers, buffer, "buffer")?;
            (record.buffer, record.size, record.name.clone())
        };
        if data.is_empty() || data.len() as u64 > size {
            return Err(Error::InvalidResource(format!(
                "upload of {} bytes does not fit buffer '{}' ({} bytes)",
                data.len(),
                name,
                size
            )));
        }

        let staging = StagingBuffer::new(&self.ctx.device, &mut self.allocator, data)?;
        let device = &self.ctx.device;
        let result = submit_one_shot(device, self.upload_command_pool, self.ctx.graphics_queue, |cmd| {
            record_buffer_copy(device, cmd, staging.buffer, dst, data.len() as u64);
        });
        staging.destroy(&self.ctx.device, &mut self.allocator);
        result
    }

    fn destroy_buffer(&mut self, buffer: BufferKey) {
        if let Some(record) = self.buffers.remove(buffer) {
            self.destroy_buffer_record(record);
        }
    }

    // ===== DESCRIPTORS =====

    fn create_descriptor_pool(
        &mut self,
        sizes: &[DescriptorPoolSize],
        max_sets: u32,
        flags: DescriptorPoolFlags,
    ) -> Result<DescriptorPoolKey> {
        let pool_sizes: Vec<vk::DescriptorPoolSize> = sizes
            .iter()
            .map(|size| vk::DescriptorPoolSize {
                ty: descriptor_type_to_vk(size.ty),
                descriptor_count: size.count,
            })
            .collect();

        let mut vk_flags = vk::DescriptorPoolCreateFlags::empty();
        if flags.contains(DescriptorPoolFlags::FREE_DESCRIPTOR_SET) {
            vk_flags |= vk::DescriptorPoolCreateFlags::FREE_DESCRIPTOR_SET;
        }

        let info = vk::DescriptorPoolCreateInfo::default()
            .pool_sizes(&pool_sizes)
            .max_sets(max_sets)
            .flags(vk_flags);

        let pool = unsafe { self.ctx.device.create_descriptor_pool(&info, None) }
            .map_err(|e| engine_err!("lumen::vulkan", "Failed to create descriptor pool: {:?}", e))?;
        Ok(self.descriptor_pools.insert(pool))
    }

    fn destroy_descriptor_pool(&mut self, pool: DescriptorPoolKey) {
        if let Some(vk_pool) = self.descriptor_pools.remove(pool) {
            self.descriptor_sets.retain(|_, record| record.pool != pool);
            unsafe { self.ctx.device.destroy_descriptor_pool(vk_pool, None) };
        }
    }

    fn create_descriptor_set_layout(
        &mut self,
        bindings: &[DescriptorSetLayoutBinding],
    ) -> Result<DescriptorSetLayoutKey> {
        let vk_bindings: Vec<vk::DescriptorSetLayoutBinding> = bindings
            .iter()
            .map(|binding| {
                vk::DescriptorSetLayoutBinding::default()
                    .binding(binding.binding)
                    .descriptor_type(descriptor_type_to_vk(binding.ty))
                    .descriptor_count(binding.count)
                    .stage_flags(shader_stages_to_vk(binding.stages))
            })
            .collect();

        let info = vk::DescriptorSetLayoutCreateInfo::default().bindings(&vk_bindings);
        let layout = unsafe { self.ctx.device.create_descriptor_set_layout(&info, None) }
            .map_err(|e| engine_err!("lumen::vulkan", "Failed to create descriptor set layout: {:?}", e))?;
        Ok(self.descriptor_set_layouts.insert(layout))
    }

    fn destroy_descriptor_set_layout(&mut self, layout: DescriptorSetLayoutKey) {
        if let Some(layout) = self.descriptor_set_layouts.remove(layout) {
            unsafe { self.ctx.device.destroy_descriptor_set_layout(layout, None) };
        }
    }

    fn allocate_descriptor_sets(
        &mut self,
        pool: DescriptorPoolKey,
        layout: DescriptorSetLayoutKey,
        count: u32,
    ) -> Result<Vec<DescriptorSetKey>> {
        let vk_pool = lookup_copy(&self.descriptor_pools, pool, "descriptor pool")?;
        let vk_layout = lookup_copy(&self.descriptor_set_layouts, layout, "descriptor set layout")?;
        if count == 0 {
            return Ok(Vec::new());
        }

        let layouts = vec![vk_layout; count as usize];
        let info = vk::DescriptorSetAllocateInfo::default()
            .descriptor_pool(vk_pool)
            .set_layouts(&layouts);

        let sets = match unsafe { self.ctx.device.allocate_descriptor_sets(&info) } {
            Ok(sets) => sets,
            Err(e @ (vk::Result::ERROR_OUT_OF_POOL_MEMORY | vk::Result::ERROR_FRAGMENTED_POOL)) => {
                engine_error!("lumen::vulkan", "Descriptor pool exhausted allocating {} sets: {:?}", count, e);
                return Err(Error::DescriptorPoolExhausted(format!(
                    "cannot allocate {} sets: {:?}",
                    count, e
                )));
            }
            Err(e) => {
                return Err(engine_err!("lumen::vulkan", "Failed to allocate descriptor sets: {:?}", e));
            }
        };

        Ok(sets
            .into_iter()
            .map(|set| self.descriptor_sets.insert(DescriptorSetRecord { set, pool }))
            .collect())
    }

    fn free_descriptor_sets(&mut self, pool: DescriptorPoolKey, sets: &[DescriptorSetKey]) -> Result<()> {
        let vk_pool = lookup_copy(&self.descriptor_pools, pool, "descriptor pool")?;

        let vk_sets: Vec<vk::DescriptorSet> = sets
            .iter()
            .filter_map(|&key| {
                let owned_by_pool = self.descriptor_sets.get(key).map(|r| r.pool == pool).unwrap_or(false);
                if owned_by_pool {
                    self.descriptor_sets.remove(key).map(|record| record.set)
                } else {
                    None
                }
            })
            .collect();

        if vk_sets.is_empty() {
            return Ok(());
        }

        unsafe { self.ctx.device.free_descriptor_sets(vk_pool, &vk_sets) }
            .map_err(|e| engine_err!("lumen::vulkan", "Failed to free descriptor sets: {:?}", e))
    }

    fn update_descriptor_set(&mut self, set: DescriptorSetKey, writes: &[DescriptorWrite]) -> Result<()> {
        let vk_set = lookup(&self.descriptor_sets, set, "descriptor set")?.set;

        // Info arrays must outlive the write structs that point into them
        let mut buffer_infos = Vec::with_capacity(writes.len());
        let mut image_infos = Vec::with_capacity(writes.len());
        for write in writes {
            match *write {
                DescriptorWrite::UniformBuffer { buffer, offset, range, .. } => {
                    let record = lookup(&self.buffers, buffer, "buffer")?;
                    buffer_infos.push(
                        vk::DescriptorBufferInfo::default()
                            .buffer(record.buffer)
                            .offset(offset)
                            .range(range),
                    );
                }
                DescriptorWrite::CombinedImageSampler { image, sampler, layout, .. } => {
                    image_infos.push(
                        vk::DescriptorImageInfo::default()
                            .image_view(self.image_view(image)?)
                            .sampler(lookup_copy(&self.samplers, sampler, "sampler")?)
                            .image_layout(image_layout_to_vk(layout)),
                    );
                }
            }
        }

        let mut next_buffer = 0;
        let mut next_image = 0;
        let vk_writes: Vec<vk::WriteDescriptorSet> = writes
            .iter()
            .map(|write| match *write {
                DescriptorWrite::UniformBuffer { binding, .. } => {
                    let info = std::slice::from_ref(&buffer_infos[next_buffer]);
                    next_buffer += 1;
                    vk::WriteDescriptorSet::default()
                        .dst_set(vk_set)
                        .dst_binding(binding)
                        .dst_array_element(0)
                        .descriptor_type(vk::DescriptorType::UNIFORM_BUFFER)
                        .buffer_info(info)
                }
                DescriptorWrite::CombinedImageSampler { binding, array_element, .. } => {
                    let info = std::slice::from_ref(&image_infos[next_image]);
                    next_image += 1;
                    vk::WriteDescriptorSet::default()
                        .dst_set(vk_set)
                        .dst_binding(binding)
                        .dst_array_element(array_element)
                        .descriptor_type(vk::DescriptorType::COMBINED_IMAGE_SAMPLER)
                        .image_info(info)
                }
            })
            .collect();

        unsafe { self.ctx.device.update_descriptor_sets(&vk_writes, &[]) };
        Ok(())
    }

    // ===== PIPELINES =====

    fn create_shader_module(&mut self, code: &[u32]) -> Result<ShaderModuleKey> {
        let info = vk::ShaderModuleCreateInfo::default().code(code);
        let module = unsafe { self.ctx.device.create_shader_module(&info, None) }
            .map_err(|e| engine_err!("lumen::vulkan", "Failed to create shader module: {:?}", e))?;
        Ok(self.shader_modules.insert(module))
    }

    fn destroy_shader_module(&mut self, module: ShaderModuleKey) {
        if let Some(module) = self.shader_modules.remove(module) {
            unsafe { self.ctx.device.destroy_shader_module(module, None) };
        }
    }

    fn create_pipeline_layout(&mut self, desc: &PipelineLayoutDesc) -> Result<PipelineLayoutKey> {
        let set_layouts = desc
            .set_layouts
            .iter()
            .map(|&key| lookup_copy(&self.descriptor_set_layouts, key, "descriptor set layout"))
            .collect::<Result<Vec<_>>>()?;

        let push_constant_ranges: Vec<vk::PushConstantRange> = desc
            .push_constant
            .iter()
            .map(|range| vk::PushConstantRange {
                stage_flags: shader_stages_to_vk(range.stages),
                offset: range.offset,
                size: range.size,
            })
            .collect();

        let info = vk::PipelineLayoutCreateInfo::default()
            .set_layouts(&set_layouts)
            .push_constant_ranges(&push_constant_ranges);

        let layout = unsafe { self.ctx.device.create_pipeline_layout(&info, None) }
            .map_err(|e| engine_err!("lumen::vulkan", "Failed to create pipeline layout: {:?}", e))?;
        Ok(self.pipeline_layouts.insert(layout))
    }

    fn destroy_pipeline_layout(&mut self, layout: PipelineLayoutKey) {
        if let Some(layout) = self.pipeline_layouts.remove(layout) {
            unsafe { self.ctx.device.destroy_pipeline_layout(layout, None) };
        }
    }

    fn create_pipeline_cache(&mut self, initial_data: &[u8]) -> Result<PipelineCacheKey> {
        let info = vk::PipelineCacheCreateInfo::default().initial_data(initial_data);
        let cache = unsafe { self.ctx.device.create_pipeline_cache(&info, None) }
            .map_err(|e| engine_err!("lumen::vulkan", "Failed to create pipeline cache: {:?}", e))?;
        Ok(self.pipeline_caches.insert(cache))
    }

    fn pipeline_cache_data(&self, cache: PipelineCacheKey) -> Result<Vec<u8>> {
        let cache = lookup_copy(&self.pipeline_caches, cache, "pipeline cache")?;
        unsafe { self.ctx.device.get_pipeline_cache_data(cache) }
            .map_err(|e| engine_err!("lumen::vulkan", "Failed to read pipeline cache data: {:?}", e))
    }

    fn destroy_pipeline_cache(&mut self, cache: PipelineCacheKey) {
        if let Some(cache) = self.pipeline_caches.remove(cache) {
            unsafe { self.ctx.device.destroy_pipeline_cache(cache, None) };
        }
    }

    fn create_graphics_pipeline(&mut self, desc: &GraphicsPipelineDesc) -> Result<PipelineKey> {
        let config = desc.config;
        let vertex_module = lookup_copy(&self.shader_modules, desc.vertex_shader, "shader module")?;
        let fragment_module = lookup_copy(&self.shader_modules, desc.fragment_shader, "shader module")?;
        let layout = lookup_copy(&self.pipeline_layouts, desc.layout, "pipeline layout")?;
        // A null cache key compiles without a cache
        let cache = self
            .pipeline_caches
            .get(desc.cache)
            .copied()
            .unwrap_or(vk::PipelineCache::null());

        let entry_point = CString::new(desc.entry_point)
            .map_err(|e| Error::InvalidResource(format!("invalid shader entry point: {}", e)))?;

        let stages = [
            vk::PipelineShaderStageCreateInfo::default()
                .stage(vk::ShaderStageFlags::VERTEX)
                .module(vertex_module)
                .name(&entry_point),
            vk::PipelineShaderStageCreateInfo::default()
                .stage(vk::ShaderStageFlags::FRAGMENT)
                .module(fragment_module)
                .name(&entry_point),
        ];

        let vertex_bindings: Vec<vk::VertexInputBindingDescription> = config
            .vertex_bindings
            .iter()
            .map(|binding| vk::VertexInputBindingDescription {
                binding: binding.binding,
                stride: binding.stride,
                input_rate: vk::VertexInputRate::VERTEX,
            })
            .collect();
        let vertex_attributes: Vec<vk::VertexInputAttributeDescription> = config
            .vertex_attributes
            .iter()
            .map(|attribute| vk::VertexInputAttributeDescription {
                location: attribute.location,
                binding: attribute.binding,
                format: format_to_vk(attribute.format),
                offset: attribute.offset,
            })
            .collect();
        let vertex_input = vk::PipelineVertexInputStateCreateInfo::default()
            .vertex_binding_descriptions(&vertex_bindings)
            .vertex_attribute_descriptions(&vertex_attributes);

        let input_assembly = vk::PipelineInputAssemblyStateCreateInfo::default()
            .topology(topology_to_vk(config.topology))
            .primitive_restart_enable(config.primitive_restart);

        let viewport_state = vk::PipelineViewportStateCreateInfo::default()
            .viewport_count(config.viewport_count)
            .scissor_count(config.scissor_count);

        let rasterization = vk::PipelineRasterizationStateCreateInfo::default()
            .depth_clamp_enable(config.depth_clamp)
            .rasterizer_discard_enable(false)
            .polygon_mode(polygon_mode_to_vk(config.polygon_mode))
            .cull_mode(cull_mode_to_vk(config.cull_mode))
            .front_face(front_face_to_vk(config.front_face))
            .depth_bias_enable(false)
            .line_width(config.line_width);

        let multisample = vk::PipelineMultisampleStateCreateInfo::default()
            .rasterization_samples(sample_count_to_vk(config.samples))
            .sample_shading_enable(config.sample_shading)
            .min_sample_shading(config.min_sample_shading);

        let depth_stencil = vk::PipelineDepthStencilStateCreateInfo::default()
            .depth_test_enable(config.depth_test)
            .depth_write_enable(config.depth_write)
            .depth_compare_op(compare_op_to_vk(config.depth_compare))
            .depth_bounds_test_enable(false)
            .stencil_test_enable(false);

        let blend_attachments: Vec<vk::PipelineColorBlendAttachmentState> = config
            .color_blend_attachments
            .iter()
            .map(|attachment| {
                vk::PipelineColorBlendAttachmentState::default()
                    .blend_enable(attachment.blend_enable)
                    .src_color_blend_factor(vk::BlendFactor::SRC_ALPHA)
                    .dst_color_blend_factor(vk::BlendFactor::ONE_MINUS_SRC_ALPHA)
                    .color_blend_op(vk::BlendOp::ADD)
                    .src_alpha_blend_factor(vk::BlendFactor::ONE)
                    .dst_alpha_blend_factor(vk::BlendFactor::ZERO)
                    .alpha_blend_op(vk::BlendOp::ADD)
                    .color_write_mask(color_write_mask_to_vk(attachment.write_mask))
            })
            .collect();
        let color_blend = vk::PipelineColorBlendStateCreateInfo::default()
            .logic_op_enable(false)
            .attachments(&blend_attachments);

        let dynamic_states: Vec<vk::DynamicState> =
            config.dynamic_states.iter().map(|&state| dynamic_state_to_vk(state)).collect();
        let dynamic_state = vk::PipelineDynamicStateCreateInfo::default().dynamic_states(&dynamic_states);

        let color_formats: Vec<vk::Format> =
            config.color_attachment_formats.iter().map(|&format| format_to_vk(format)).collect();
        let mut rendering = vk::PipelineRenderingCreateInfo::default()
            .color_attachment_formats(&color_formats)
            .depth_attachment_format(format_to_vk(config.depth_attachment_format))
            .stencil_attachment_format(format_to_vk(config.stencil_attachment_format));

        let pipeline_info = vk::GraphicsPipelineCreateInfo::default()
            .stages(&stages)
            .vertex_input_state(&vertex_input)
            .input_assembly_state(&input_assembly)
            .viewport_state(&viewport_state)
            .rasterization_state(&rasterization)
            .multisample_state(&multisample)
            .depth_stencil_state(&depth_stencil)
            .color_blend_state(&color_blend)
            .dynamic_state(&dynamic_state)
            .layout(layout)
            .push_next(&mut rendering);

        let pipelines = unsafe {
            self.ctx
                .device
                .create_graphics_pipelines(cache, &[pipeline_info], None)
        }
        .map_err(|(_, e)| engine_err!("lumen::vulkan", "Failed to create graphics pipeline: {:?}", e))?;

        let pipeline = pipelines
            .into_iter()
            .next()
            .ok_or_else(|| engine_err!("lumen::vulkan", "Pipeline creation returned no pipeline"))?;
        Ok(self.pipelines.insert(pipeline))
    }

    fn destroy_pipeline(&mut self, pipeline: PipelineKey) {
        if let Some(pipeline) = self.pipelines.remove(pipeline) {
            unsafe { self.ctx.device.destroy_pipeline(pipeline, None) };
        }
    }

    // ===== SWAPCHAIN =====

    fn surface_support(&self) -> Result<SurfaceSupport> {
        query_surface_support(&self.ctx)
    }

    fn create_swapchain(&mut self, desc: &SwapchainDesc) -> Result<()> {
        if self.swapchain.is_some() {
            engine_warn!("lumen::vulkan", "Replacing a live swapchain");
            self.destroy_swapchain();
        }
        self.swapchain = Some(VulkanSwapchain::new(&self.ctx, &self.swapchain_loader, desc)?);
        Ok(())
    }

    fn create_swapchain_image_views(&mut self) -> Result<Vec<ImageKey>> {
        let swapchain = self
            .swapchain
            .as_mut()
            .ok_or_else(|| Error::InvalidResource("no swapchain to create views for".to_string()))?;
        let format = vk_to_format(swapchain.format);
        let extent = swapchain.extent;

        // Views from a previous call are replaced
        for key in swapchain.views.drain(..) {
            if let Some(record) = self.images.remove(key) {
                unsafe { self.ctx.device.destroy_image_view(record.view, None) };
            }
        }

        for (index, &image) in swapchain.images.iter().enumerate() {
            let view_info = vk::ImageViewCreateInfo::default()
                .image(image)
                .view_type(vk::ImageViewType::TYPE_2D)
                .format(swapchain.format)
                .subresource_range(vk::ImageSubresourceRange {
                    aspect_mask: vk::ImageAspectFlags::COLOR,
                    base_mip_level: 0,
                    level_count: 1,
                    base_array_layer: 0,
                    layer_count: 1,
                });
            let view = unsafe { self.ctx.device.create_image_view(&view_info, None) }.map_err(|e| {
                engine_err!("lumen::vulkan", "Failed to create swapchain image view {}: {:?}", index, e)
            })?;

            let key = self.images.insert(ImageRecord {
                name: format!("swapchain_image_{}", index),
                image,
                view,
                allocation: None,
                format,
                width: extent.width,
                height: extent.height,
                mip_levels: 1,
            });
            swapchain.views.push(key);
        }

        Ok(swapchain.views.clone())
    }

    fn destroy_swapchain(&mut self) {
        let Some(swapchain) = self.swapchain.take() else {
            return;
        };
        for key in swapchain.views {
            if let Some(record) = self.images.remove(key) {
                unsafe { self.ctx.device.destroy_image_view(record.view, None) };
            }
        }
        unsafe {
            self.swapchain_loader.destroy_swapchain(swapchain.handle, None);
        }
    }

    fn acquire_next_image(&mut self, signal: SemaphoreKey) -> Result<AcquireOutcome> {
        let semaphore = lookup_copy(&self.semaphores, signal, "semaphore")?;
        let swapchain = self
            .swapchain
            .as_ref()
            .ok_or_else(|| Error::InvalidResource("no swapchain to acquire from".to_string()))?;
        swapchain.acquire(&self.swapchain_loader, semaphore)
    }

    fn present(&mut self, image_index: u32, wait: SemaphoreKey) -> Result<PresentOutcome> {
        let semaphore = lookup_copy(&self.semaphores, wait, "semaphore")?;
        let swapchain = self
            .swapchain
            .as_ref()
            .ok_or_else(|| Error::InvalidResource("no swapchain to present to".to_string()))?;
        swapchain.present(&self.swapchain_loader, self.ctx.present_queue, image_index, semaphore)
    }

    // ===== SYNCHRONIZATION =====

    fn create_fence(&mut self, signaled: bool) -> Result<FenceKey> {
        let flags = if signaled {
            vk::FenceCreateFlags::SIGNALED
        } else {
            vk::FenceCreateFlags::empty()
        };
        let info = vk::FenceCreateInfo::default().flags(flags);
        let fence = unsafe { self.ctx.device.create_fence(&info, None) }
            .map_err(|e| engine_err!("lumen::vulkan", "Failed to create fence: {:?}", e))?;
        Ok(self.fences.insert(fence))
    }

    fn wait_for_fence(&mut self, fence: FenceKey) -> Result<()> {
        let fence = lookup_copy(&self.fences, fence, "fence")?;
        unsafe { self.ctx.device.wait_for_fences(&[fence], true, u64::MAX) }
            .map_err(|e| engine_err!("lumen::vulkan", "Failed to wait for fence: {:?}", e))
    }

    fn reset_fence(&mut self, fence: FenceKey) -> Result<()> {
        let fence = lookup_copy(&self.fences, fence, "fence")?;
        unsafe { self.ctx.device.reset_fences(&[fence]) }
            .map_err(|e| engine_err!("lumen::vulkan", "Failed to reset fence: {:?}", e))
    }

    fn destroy_fence(&mut self, fence: FenceKey) {
        if let Some(fence) = self.fences.remove(fence) {
            unsafe { self.ctx.device.destroy_fence(fence, None) };
        }
    }

    fn create_semaphore(&mut self) -> Result<SemaphoreKey> {
        let info = vk::SemaphoreCreateInfo::default();
        let semaphore = unsafe { self.ctx.device.create_semaphore(&info, None) }
            .map_err(|e| engine_err!("lumen::vulkan", "Failed to create semaphore: {:?}", e))?;
        Ok(self.semaphores.insert(semaphore))
    }

    fn destroy_semaphore(&mut self, semaphore: SemaphoreKey) {
        if let Some(semaphore) = self.semaphores.remove(semaphore) {
            unsafe { self.ctx.device.destroy_semaphore(semaphore, None) };
        }
    }

    // ===== COMMAND RECORDING =====

    fn allocate_command_buffer(&mut self) -> Result<CommandBufferKey> {
        let info = vk::CommandBufferAllocateInfo::default()
            .command_pool(self.command_pool)
            .level(vk::CommandBufferLevel::PRIMARY)
            .command_buffer_count(1);
        let command_buffer = unsafe { self.ctx.device.allocate_command_buffers(&info) }
            .map_err(|e| engine_err!("lumen::vulkan", "Failed to allocate command buffer: {:?}", e))?
            .into_iter()
            .next()
            .ok_or_else(|| engine_err!("lumen::vulkan", "No command buffer returned"))?;
        Ok(self.command_buffers.insert(command_buffer))
    }

    fn free_command_buffer(&mut self, cmd: CommandBufferKey) {
        if let Some(command_buffer) = self.command_buffers.remove(cmd) {
            unsafe {
                self.ctx
                    .device
                    .free_command_buffers(self.command_pool, &[command_buffer])
            };
        }
    }

    fn begin_commands(&mut self, cmd: CommandBufferKey) -> Result<()> {
        let command_buffer = self.command_buffer(cmd)?;
        unsafe {
            self.ctx
                .device
                .reset_command_buffer(command_buffer, vk::CommandBufferResetFlags::empty())
                .map_err(|e| engine_err!("lumen::vulkan", "Failed to reset command buffer: {:?}", e))?;

            let begin_info = vk::CommandBufferBeginInfo::default()
                .flags(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT);
            self.ctx
                .device
                .begin_command_buffer(command_buffer, &begin_info)
                .map_err(|e| engine_err!("lumen::vulkan", "Failed to begin command buffer: {:?}", e))
        }
    }

    fn end_commands(&mut self, cmd: CommandBufferKey) -> Result<()> {
        let command_buffer = self.command_buffer(cmd)?;
        unsafe { self.ctx.device.end_command_buffer(command_buffer) }
            .map_err(|e| engine_err!("lumen::vulkan", "Failed to end command buffer: {:?}", e))
    }

    fn cmd_image_barrier(&mut self, cmd: CommandBufferKey, barrier: &ImageBarrier) -> Result<()> {
        let command_buffer = self.command_buffer(cmd)?;
        let image = lookup(&self.images, barrier.image, "image")?.image;

        let barriers = [vk::ImageMemoryBarrier2::default()
            .src_stage_mask(stages_to_vk(barrier.src_stage))
            .src_access_mask(access_to_vk(barrier.src_access))
            .dst_stage_mask(stages_to_vk(barrier.dst_stage))
            .dst_access_mask(access_to_vk(barrier.dst_access))
            .old_layout(image_layout_to_vk(barrier.old_layout))
            .new_layout(image_layout_to_vk(barrier.new_layout))
            .src_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
            .dst_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
            .image(image)
            .subresource_range(vk::ImageSubresourceRange {
                aspect_mask: aspect_to_vk(barrier.aspect),
                base_mip_level: 0,
                level_count: barrier.mip_levels.max(1),
                base_array_layer: 0,
                layer_count: 1,
            })];
        let dependency = vk::DependencyInfo::default().image_memory_barriers(&barriers);

        unsafe { self.ctx.device.cmd_pipeline_barrier2(command_buffer, &dependency) };
        Ok(())
    }

    fn cmd_begin_rendering(&mut self, cmd: CommandBufferKey, info: &RenderingInfo) -> Result<()> {
        let command_buffer = self.command_buffer(cmd)?;

        let color_attachments = info
            .color_attachments
            .iter()
            .map(|attachment| self.rendering_attachment(attachment))
            .collect::<Result<Vec<_>>>()?;
        let depth_attachment = info
            .depth_attachment
            .as_ref()
            .map(|attachment| self.rendering_attachment(attachment))
            .transpose()?;

        let mut rendering_info = vk::RenderingInfo::default()
            .render_area(vk::Rect2D {
                offset: vk::Offset2D { x: 0, y: 0 },
                extent: vk::Extent2D { width: info.extent.width, height: info.extent.height },
            })
            .layer_count(1)
            .color_attachments(&color_attachments);
        if let Some(depth) = depth_attachment.as_ref() {
            rendering_info = rendering_info.depth_attachment(depth);
        }

        unsafe { self.ctx.device.cmd_begin_rendering(command_buffer, &rendering_info) };
        Ok(())
    }

    fn cmd_end_rendering(&mut self, cmd: CommandBufferKey) -> Result<()> {
        let command_buffer = self.command_buffer(cmd)?;
        unsafe { self.ctx.device.cmd_end_rendering(command_buffer) };
        Ok(())
    }

    fn cmd_bind_pipeline(&mut self, cmd: CommandBufferKey, pipeline: PipelineKey) -> Result<()> {
        let command_buffer = self.command_buffer(cmd)?;
        let pipeline = lookup_copy(&self.pipelines, pipeline, "pipeline")?;
        unsafe {
            self.ctx
                .device
                .cmd_bind_pipeline(command_buffer, vk::PipelineBindPoint::GRAPHICS, pipeline)
        };
        Ok(())
    }

    fn cmd_set_viewport(&mut self, cmd: CommandBufferKey, viewport: Viewport) -> Result<()> {
        let command_buffer = self.command_buffer(cmd)?;
        let vk_viewport = vk::Viewport {
            x: viewport.x,
            y: viewport.y,
            width: viewport.width,
            height: viewport.height,
            min_depth: viewport.min_depth,
            max_depth: viewport.max_depth,
        };
        unsafe { self.ctx.device.cmd_set_viewport(command_buffer, 0, &[vk_viewport]) };
        Ok(())
    }

    fn cmd_set_scissor(&mut self, cmd: CommandBufferKey, scissor: Rect2D) -> Result<()> {
        let command_buffer = self.command_buffer(cmd)?;
        let vk_scissor = vk::Rect2D {
            offset: vk::Offset2D { x: scissor.x, y: scissor.y },
            extent: vk::Extent2D { width: scissor.width, height: scissor.height },
        };
        unsafe { self.ctx.device.cmd_set_scissor(command_buffer, 0, &[vk_scissor]) };
        Ok(())
    }

    fn cmd_push_constants(
        &mut self,
        cmd: CommandBufferKey,
        layout: PipelineLayoutKey,
        stages: ShaderStages,
        data: &[u8],
    ) -> Result<()> {
        let command_buffer = self.command_buffer(cmd)?;
        let layout = lookup_copy(&self.pipeline_layouts, layout, "pipeline layout")?;
        unsafe {
            self.ctx.device.cmd_push_constants(
                command_buffer,
                layout,
                shader_stages_to_vk(stages),
                0,
                data,
            )
        };
        Ok(())
    }

    fn cmd_bind_descriptor_set(
        &mut self,
        cmd: CommandBufferKey,
        layout: PipelineLayoutKey,
        set: DescriptorSetKey,
    ) -> Result<()> {
        let command_buffer = self.command_buffer(cmd)?;
        let layout = lookup_copy(&self.pipeline_layouts, layout, "pipeline layout")?;
        let set = lookup(&self.descriptor_sets, set, "descriptor set")?.set;
        unsafe {
            self.ctx.device.cmd_bind_descriptor_sets(
                command_buffer,
                vk::PipelineBindPoint::GRAPHICS,
                layout,
                0,
                &[set],
                &[],
            )
        };
        Ok(())
    }

    fn cmd_bind_vertex_buffer(&mut self, cmd: CommandBufferKey, buffer: BufferKey) -> Result<()> {
        let command_buffer = self.command_buffer(cmd)?;
        let buffer = lookup(&self.buffers, buffer, "buffer")?.buffer;
        unsafe {
            self.ctx
                .device
                .cmd_bind_vertex_buffers(command_buffer, 0, &[buffer], &[0])
        };
        Ok(())
    }

    fn cmd_bind_index_buffer(
        &mut self,
        cmd: CommandBufferKey,
        buffer: BufferKey,
        index_type: IndexType,
    ) -> Result<()> {
        let command_buffer = self.command_buffer(cmd)?;
        let buffer = lookup(&self.buffers, buffer, "buffer")?.buffer;
        unsafe {
            self.ctx.device.cmd_bind_index_buffer(
                command_buffer,
                buffer,
                0,
                index_type_to_vk(index_type),
            )
        };
        Ok(())
    }

    fn cmd_draw(&mut self, cmd: CommandBufferKey, vertex_count: u32) -> Result<()> {
        let command_buffer = self.command_buffer(cmd)?;
        unsafe { self.ctx.device.cmd_draw(command_buffer, vertex_count, 1, 0, 0) };
        Ok(())
    }

    fn cmd_draw_indexed(&mut self, cmd: CommandBufferKey, index_count: u32) -> Result<()> {
        let command_buffer = self.command_buffer(cmd)?;
        unsafe {
            self.ctx
                .device
                .cmd_draw_indexed(command_buffer, index_count, 1, 0, 0, 0)
        };
        Ok(())
    }

    fn submit(
        &mut self,
        cmd: CommandBufferKey,
        wait: SemaphoreKey,
        signal: SemaphoreKey,
        fence: FenceKey,
    ) -> Result<()> {
        let command_buffers = [self.command_buffer(cmd)?];
        let wait_semaphores = [lookup_copy(&self.semaphores, wait, "semaphore")?];
        let signal_semaphores = [lookup_copy(&self.semaphores, signal, "semaphore")?];
        let fence = lookup_copy(&self.fences, fence, "fence")?;
        let wait_stages = [vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT];

        let submit_info = vk::SubmitInfo::default()
            .wait_semaphores(&wait_semaphores)
            .wait_dst_stage_mask(&wait_stages)
            .command_buffers(&command_buffers)
            .signal_semaphores(&signal_semaphores);

        unsafe {
            self.ctx
                .device
                .queue_submit(self.ctx.graphics_queue, &[submit_info], fence)
        }
        .map_err(|e| engine_err!("lumen::vulkan", "Failed to submit commands to GPU queue: {:?}", e))
    }
}

impl Drop for VulkanDevice {
    fn drop(&mut self) {
        unsafe {
            self.ctx.device.device_wait_idle().ok();
        }

        // 1. Everything created through the trait (frees allocations)
        self.destroy_all_objects();

        unsafe {
            // 2. Command pools (free their command buffers)
            self.ctx.device.destroy_command_pool(self.upload_command_pool, None);
            self.ctx.device.destroy_command_pool(self.command_pool, None);

            // 3. Allocator releases its memory blocks while the device is alive
            ManuallyDrop::drop(&mut self.allocator);

            // 4. Device, surface, messenger, instance
            self.ctx.destroy();
        }
        engine_debug!("lumen::vulkan", "Vulkan device destroyed");
    }
}
