/// Mock graphics device for unit tests (no GPU required)
///
/// Keeps one arena per object kind, exactly like the Vulkan backend, and logs
/// every call as a short string in `commands`. Tests script surface behavior
/// through `acquire_script` / `present_script` and failure switches.

use std::collections::VecDeque;

use slotmap::{Key, SlotMap};

use crate::error::{Error, Result};
use crate::graphics_device::{
    AcquireOutcome, BufferDesc, BufferKey, ColorSpace, CommandBufferKey, DescriptorPoolFlags,
    DescriptorPoolKey, DescriptorPoolSize, DescriptorSetKey, DescriptorSetLayoutBinding,
    DescriptorSetLayoutKey, DescriptorWrite, Extent2D, FenceKey, Format, GraphicsDevice,
    GraphicsPipelineDesc, ImageBarrier, ImageDesc, ImageKey, IndexType, MemoryLocation,
    PipelineCacheKey, PipelineConfig, PipelineKey, PipelineLayoutDesc, PipelineLayoutKey,
    PresentMode, PresentOutcome, PushConstantRange, Rect2D, RenderingInfo, SampleCount,
    SamplerDesc, SamplerKey, SemaphoreKey, ShaderModuleKey, ShaderStages, SurfaceCapabilities,
    SurfaceFormat, SurfaceSupport, SwapchainDesc, Viewport,
};

// ============================================================================
// Mock records
// ============================================================================

#[derive(Debug, Clone)]
pub struct MockImage {
    pub name: String,
    pub format: Format,
    pub extent: Extent2D,
    pub samples: SampleCount,
    pub mip_levels: u32,
    pub swapchain_owned: bool,
}

#[derive(Debug, Clone)]
pub struct MockBuffer {
    pub name: String,
    pub location: MemoryLocation,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct MockPool {
    pub sizes: Vec<DescriptorPoolSize>,
    pub max_sets: u32,
    pub flags: DescriptorPoolFlags,
    pub live_sets: u32,
}

#[derive(Debug, Clone)]
pub struct MockSet {
    pub pool: DescriptorPoolKey,
    pub layout: DescriptorSetLayoutKey,
    pub writes: Vec<DescriptorWrite>,
}

// ============================================================================
// MockGraphicsDevice
// ============================================================================

pub struct MockGraphicsDevice {
    /// Every call, in order
    pub commands: Vec<String>,
    /// Every barrier recorded through `cmd_image_barrier`, in order
    pub barriers: Vec<ImageBarrier>,
    /// Every `update_descriptor_set` batch, in order
    pub descriptor_updates: Vec<(DescriptorSetKey, Vec<DescriptorWrite>)>,

    pub images: SlotMap<ImageKey, MockImage>,
    pub buffers: SlotMap<BufferKey, MockBuffer>,
    pub samplers: SlotMap<SamplerKey, SamplerDesc>,
    pub pools: SlotMap<DescriptorPoolKey, MockPool>,
    pub set_layouts: SlotMap<DescriptorSetLayoutKey, Vec<DescriptorSetLayoutBinding>>,
    pub sets: SlotMap<DescriptorSetKey, MockSet>,
    pub shader_modules: SlotMap<ShaderModuleKey, usize>,
    pub pipeline_layouts: SlotMap<PipelineLayoutKey, Option<PushConstantRange>>,
    pub pipeline_caches: SlotMap<PipelineCacheKey, Vec<u8>>,
    pub pipelines: SlotMap<PipelineKey, PipelineConfig>,
    pub fences: SlotMap<FenceKey, bool>,
    pub semaphores: SlotMap<SemaphoreKey, ()>,
    pub command_buffers: SlotMap<CommandBufferKey, ()>,

    pub swapchain: Option<SwapchainDesc>,
    pub swapchain_images: Vec<ImageKey>,
    pub surface: SurfaceSupport,

    /// Outcomes returned by successive acquires (default: acquired, rotating index)
    pub acquire_script: VecDeque<AcquireOutcome>,
    /// Outcomes returned by successive presents (default: presented)
    pub present_script: VecDeque<PresentOutcome>,

    pub msaa: SampleCount,
    pub depth: Format,
    pub fail_pipeline_creation: bool,
    pub fail_descriptor_writes: bool,
    pub fail_descriptor_free: bool,
    /// Reject non-empty initial pipeline cache data
    pub reject_cache_data: bool,
    /// Bytes `pipeline_cache_data` reports for every cache
    pub cache_blob: Vec<u8>,

    next_image_index: u32,
}

impl MockGraphicsDevice {
    pub fn new() -> Self {
        Self {
            commands: Vec::new(),
            barriers: Vec::new(),
            descriptor_updates: Vec::new(),
            images: SlotMap::with_key(),
            buffers: SlotMap::with_key(),
            samplers: SlotMap::with_key(),
            pools: SlotMap::with_key(),
            set_layouts: SlotMap::with_key(),
            sets: SlotMap::with_key(),
            shader_modules: SlotMap::with_key(),
            pipeline_layouts: SlotMap::with_key(),
            pipeline_caches: SlotMap::with_key(),
            pipelines: SlotMap::with_key(),
            fences: SlotMap::with_key(),
            semaphores: SlotMap::with_key(),
            command_buffers: SlotMap::with_key(),
            swapchain: None,
            swapchain_images: Vec::new(),
            surface: SurfaceSupport {
                capabilities: SurfaceCapabilities {
                    min_image_count: 2,
                    max_image_count: 3,
                    current_extent: Extent2D::new(u32::MAX, u32::MAX),
                    min_image_extent: Extent2D::new(1, 1),
                    max_image_extent: Extent2D::new(4096, 4096),
                },
                formats: vec![SurfaceFormat {
                    format: Format::B8G8R8A8_UNORM,
                    color_space: ColorSpace::SrgbNonlinear,
                }],
                present_modes: vec![PresentMode::Fifo, PresentMode::Mailbox],
            },
            acquire_script: VecDeque::new(),
            present_script: VecDeque::new(),
            msaa: SampleCount::S4,
            depth: Format::D32_SFLOAT,
            fail_pipeline_creation: false,
            fail_descriptor_writes: false,
            fail_descriptor_free: false,
            reject_cache_data: false,
            cache_blob: vec![0xCA, 0xFE],
            next_image_index: 0,
        }
    }

    fn log(&mut self, command: impl Into<String>) {
        self.commands.push(command.into());
    }

    /// Name of an image, or "?" for unknown keys
    pub fn image_name(&self, image: ImageKey) -> String {
        self.images
            .get(image)
            .map(|i| i.name.clone())
            .unwrap_or_else(|| "?".to_string())
    }

    /// Number of logged commands starting with `prefix`
    pub fn count(&self, prefix: &str) -> usize {
        self.commands.iter().filter(|c| c.starts_with(prefix)).count()
    }

    /// Index of the first logged command starting with `prefix`
    pub fn position(&self, prefix: &str) -> Option<usize> {
        self.commands.iter().position(|c| c.starts_with(prefix))
    }

    /// Forget the log so a test can look at one phase only
    pub fn clear_log(&mut self) {
        self.commands.clear();
        self.barriers.clear();
        self.descriptor_updates.clear();
    }

    /// Live images created through `create_image` (swapchain views excluded)
    pub fn owned_image_count(&self) -> usize {
        self.images.values().filter(|i| !i.swapchain_owned).count()
    }
}

impl GraphicsDevice for MockGraphicsDevice {
    // ===== CAPABILITIES =====

    fn msaa_samples(&self) -> SampleCount {
        self.msaa
    }

    fn depth_format(&self) -> Format {
        self.depth
    }

    fn max_sampler_anisotropy(&self) -> f32 {
        16.0
    }

    fn wait_idle(&mut self) -> Result<()> {
        self.log("wait_idle");
        Ok(())
    }

    // ===== IMAGES =====

    fn create_image(&mut self, desc: &ImageDesc) -> Result<ImageKey> {
        if desc.extent.is_zero() {
            return Err(Error::InvalidResource(format!("zero-sized image '{}'", desc.name)));
        }
        self.log(format!("create_image {}", desc.name));
        Ok(self.images.insert(MockImage {
            name: desc.name.clone(),
            format: desc.format,
            extent: desc.extent,
            samples: desc.samples,
            mip_levels: desc.mip_levels,
            swapchain_owned: false,
        }))
    }

    fn upload_texture(&mut self, image: ImageKey, pixels: &[u8]) -> Result<()> {
        let name = self.image_name(image);
        if !self.images.contains_key(image) {
            return Err(Error::InvalidResource("upload to unknown image".to_string()));
        }
        self.log(format!("upload_texture {} {}", name, pixels.len()));
        Ok(())
    }

    fn destroy_image(&mut self, image: ImageKey) {
        if let Some(img) = self.images.remove(image) {
            self.commands.push(format!("destroy_image {}", img.name));
        }
    }

    fn create_sampler(&mut self, desc: &SamplerDesc) -> Result<SamplerKey> {
        self.log("create_sampler");
        Ok(self.samplers.insert(*desc))
    }

    fn destroy_sampler(&mut self, sampler: SamplerKey) {
        if self.samplers.remove(sampler).is_some() {
            self.log("destroy_sampler");
        }
    }

    // ===== BUFFERS =====

    fn create_buffer(&mut self, desc: &BufferDesc) -> Result<BufferKey> {
        self.log(format!("create_buffer {}", desc.name));
        Ok(self.buffers.insert(MockBuffer {
            name: desc.name.clone(),
            location: desc.location,
            data: vec![0; desc.size as usize],
        }))
    }

    fn write_buffer(&mut self, buffer: BufferKey, offset: u64, data: &[u8]) -> Result<()> {
        let buf = self
            .buffers
            .get_mut(buffer)
            .ok_or_else(|| Error::InvalidResource("write to unknown buffer".to_string()))?;
        if buf.location != MemoryLocation::CpuToGpu {
            return Err(Error::InvalidResource(format!("buffer '{}' is not mapped", buf.name)));
        }
        let start = offset as usize;
        let end = start + data.len();
        if end > buf.data.len() {
            return Err(Error::InvalidResource(format!("write past end of '{}'", buf.name)));
        }
        buf.data[start..end].copy_from_slice(data);
        let name = buf.name.clone();
        self.log(format!("write_buffer {}", name));
        Ok(())
    }

    fn upload_buffer(&mut self, buffer: BufferKey, data: &[u8]) -> Result<()> {
        let buf = self
            .buffers
            .get_mut(buffer)
            .ok_or_else(|| Error::InvalidResource("upload to unknown buffer".to_string()))?;
        if data.len() > buf.data.len() {
            return Err(Error::InvalidResource(format!("upload past end of '{}'", buf.name)));
        }
        buf.data[..data.len()].copy_from_slice(data);
        let name = buf.name.clone();
        self.log(format!("upload_buffer {}", name));
        Ok(())
    }

    fn destroy_buffer(&mut self, buffer: BufferKey) {
        if let Some(buf) = self.buffers.remove(buffer) {
            self.commands.push(format!("destroy_buffer {}", buf.name));
        }
    }

    // ===== DESCRIPTORS =====

    fn create_descriptor_pool(
        &mut self,
        sizes: &[DescriptorPoolSize],
        max_sets: u32,
        flags: DescriptorPoolFlags,
    ) -> Result<DescriptorPoolKey> {
        self.log(format!("create_descriptor_pool {}", max_sets));
        Ok(self.pools.insert(MockPool { sizes: sizes.to_vec(), max_sets, flags, live_sets: 0 }))
    }

    fn destroy_descriptor_pool(&mut self, pool: DescriptorPoolKey) {
        if self.pools.remove(pool).is_some() {
            self.sets.retain(|_, s| s.pool != pool);
            self.log("destroy_descriptor_pool");
        }
    }

    fn create_descriptor_set_layout(
        &mut self,
        bindings: &[DescriptorSetLayoutBinding],
    ) -> Result<DescriptorSetLayoutKey> {
        self.log(format!("create_descriptor_set_layout {}", bindings.len()));
        Ok(self.set_layouts.insert(bindings.to_vec()))
    }

    fn destroy_descriptor_set_layout(&mut self, layout: DescriptorSetLayoutKey) {
        if self.set_layouts.remove(layout).is_some() {
            self.log("destroy_descriptor_set_layout");
        }
    }

    fn allocate_descriptor_sets(
        &mut self,
        pool: DescriptorPoolKey,
        layout: DescriptorSetLayoutKey,
        count: u32,
    ) -> Result<Vec<DescriptorSetKey>> {
        if !self.set_layouts.contains_key(layout) {
            return Err(Error::InvalidResource("unknown descriptor set layout".to_string()));
        }
        let p = self
            .pools
            .get_mut(pool)
            .ok_or_else(|| Error::InvalidResource("unknown descriptor pool".to_string()))?;
        if p.live_sets + count > p.max_sets {
            return Err(Error::DescriptorPoolExhausted("ERROR_OUT_OF_POOL_MEMORY".to_string()));
        }
        p.live_sets += count;
        self.commands.push(format!("allocate_descriptor_sets {}", count));
        Ok((0..count)
            .map(|_| self.sets.insert(MockSet { pool, layout, writes: Vec::new() }))
            .collect())
    }

    fn free_descriptor_sets(
        &mut self,
        pool: DescriptorPoolKey,
        sets: &[DescriptorSetKey],
    ) -> Result<()> {
        if self.fail_descriptor_free {
            self.log("free_descriptor_sets failed");
            return Err(Error::BackendError("vkFreeDescriptorSets failed".to_string()));
        }
        let mut freed = 0;
        for set in sets {
            if self.sets.remove(*set).is_some() {
                freed += 1;
            }
        }
        if let Some(p) = self.pools.get_mut(pool) {
            p.live_sets = p.live_sets.saturating_sub(freed);
        }
        self.log(format!("free_descriptor_sets {}", freed));
        Ok(())
    }

    fn update_descriptor_set(
        &mut self,
        set: DescriptorSetKey,
        writes: &[DescriptorWrite],
    ) -> Result<()> {
        if self.fail_descriptor_writes {
            return Err(Error::InvalidResource("descriptor write rejected".to_string()));
        }
        let record = self
            .sets
            .get_mut(set)
            .ok_or_else(|| Error::InvalidResource("unknown descriptor set".to_string()))?;
        record.writes = writes.to_vec();
        self.descriptor_updates.push((set, writes.to_vec()));
        self.log(format!("update_descriptor_set {}", writes.len()));
        Ok(())
    }

    // ===== PIPELINES =====

    fn create_shader_module(&mut self, code: &[u32]) -> Result<ShaderModuleKey> {
        self.log("create_shader_module");
        Ok(self.shader_modules.insert(code.len()))
    }

    fn destroy_shader_module(&mut self, module: ShaderModuleKey) {
        if self.shader_modules.remove(module).is_some() {
            self.log("destroy_shader_module");
        }
    }

    fn create_pipeline_layout(&mut self, desc: &PipelineLayoutDesc) -> Result<PipelineLayoutKey> {
        self.log("create_pipeline_layout");
        Ok(self.pipeline_layouts.insert(desc.push_constant))
    }

    fn destroy_pipeline_layout(&mut self, layout: PipelineLayoutKey) {
        if self.pipeline_layouts.remove(layout).is_some() {
            self.log("destroy_pipeline_layout");
        }
    }

    fn create_pipeline_cache(&mut self, initial_data: &[u8]) -> Result<PipelineCacheKey> {
        if self.reject_cache_data && !initial_data.is_empty() {
            self.log("create_pipeline_cache rejected");
            return Err(Error::BackendError("invalid pipeline cache data".to_string()));
        }
        self.log(format!("create_pipeline_cache {}", initial_data.len()));
        Ok(self.pipeline_caches.insert(initial_data.to_vec()))
    }

    fn pipeline_cache_data(&self, cache: PipelineCacheKey) -> Result<Vec<u8>> {
        if !self.pipeline_caches.contains_key(cache) {
            return Err(Error::InvalidResource("unknown pipeline cache".to_string()));
        }
        Ok(self.cache_blob.clone())
    }

    fn destroy_pipeline_cache(&mut self, cache: PipelineCacheKey) {
        if self.pipeline_caches.remove(cache).is_some() {
            self.log("destroy_pipeline_cache");
        }
    }

    fn create_graphics_pipeline(&mut self, desc: &GraphicsPipelineDesc) -> Result<PipelineKey> {
        if self.fail_pipeline_creation {
            self.log("create_graphics_pipeline failed");
            return Err(Error::BackendError("vkCreateGraphicsPipelines failed".to_string()));
        }
        if !self.shader_modules.contains_key(desc.vertex_shader)
            || !self.shader_modules.contains_key(desc.fragment_shader)
            || !self.pipeline_layouts.contains_key(desc.layout)
        {
            return Err(Error::InvalidResource("pipeline references unknown handle".to_string()));
        }
        if !desc.cache.is_null() && !self.pipeline_caches.contains_key(desc.cache) {
            return Err(Error::InvalidResource("unknown pipeline cache".to_string()));
        }
        self.log("create_graphics_pipeline");
        Ok(self.pipelines.insert(desc.config.clone()))
    }

    fn destroy_pipeline(&mut self, pipeline: PipelineKey) {
        if self.pipelines.remove(pipeline).is_some() {
            self.log("destroy_pipeline");
        }
    }

    // ===== SWAPCHAIN =====

    fn surface_support(&self) -> Result<SurfaceSupport> {
        Ok(self.surface.clone())
    }

    fn create_swapchain(&mut self, desc: &SwapchainDesc) -> Result<()> {
        if desc.extent.is_zero() {
            return Err(Error::InvalidResource("zero-sized swapchain".to_string()));
        }
        self.log(format!(
            "create_swapchain {}x{} {}",
            desc.extent.width, desc.extent.height, desc.image_count
        ));
        self.swapchain = Some(*desc);
        self.next_image_index = 0;
        Ok(())
    }

    fn create_swapchain_image_views(&mut self) -> Result<Vec<ImageKey>> {
        let desc = self
            .swapchain
            .ok_or_else(|| Error::InvalidResource("no swapchain".to_string()))?;
        self.log("create_swapchain_image_views");
        let keys: Vec<ImageKey> = (0..desc.image_count)
            .map(|i| {
                self.images.insert(MockImage {
                    name: format!("swapchain_{}", i),
                    format: desc.surface_format.format,
                    extent: desc.extent,
                    samples: SampleCount::S1,
                    mip_levels: 1,
                    swapchain_owned: true,
                })
            })
            .collect();
        self.swapchain_images = keys.clone();
        Ok(keys)
    }

    fn destroy_swapchain(&mut self) {
        if self.swapchain.take().is_some() {
            for key in std::mem::take(&mut self.swapchain_images) {
                self.images.remove(key);
            }
            self.log("destroy_swapchain");
        }
    }

    fn acquire_next_image(&mut self, signal: SemaphoreKey) -> Result<AcquireOutcome> {
        if !self.semaphores.contains_key(signal) {
            return Err(Error::InvalidResource("unknown semaphore".to_string()));
        }
        let image_count = self
            .swapchain
            .map(|s| s.image_count)
            .ok_or_else(|| Error::InvalidResource("no swapchain".to_string()))?;
        let outcome = self.acquire_script.pop_front().unwrap_or_else(|| {
            let index = self.next_image_index;
            self.next_image_index = (self.next_image_index + 1) % image_count;
            AcquireOutcome::Acquired(index)
        });
        self.log(format!("acquire {:?}", outcome));
        Ok(outcome)
    }

    fn present(&mut self, image_index: u32, wait: SemaphoreKey) -> Result<PresentOutcome> {
        if !self.semaphores.contains_key(wait) {
            return Err(Error::InvalidResource("unknown semaphore".to_string()));
        }
        let outcome = self.present_script.pop_front().unwrap_or(PresentOutcome::Presented);
        self.log(format!("present {} {:?}", image_index, outcome));
        Ok(outcome)
    }

    // ===== SYNCHRONIZATION =====

    fn create_fence(&mut self, signaled: bool) -> Result<FenceKey> {
        self.log(format!("create_fence {}", signaled));
        Ok(self.fences.insert(signaled))
    }

    fn wait_for_fence(&mut self, fence: FenceKey) -> Result<()> {
        let signaled = *self
            .fences
            .get(fence)
            .ok_or_else(|| Error::InvalidResource("unknown fence".to_string()))?;
        if !signaled {
            // A real device would block forever here.
            return Err(Error::BackendError("waiting on an unsignaled fence with nothing in flight".to_string()));
        }
        self.log("wait_fence");
        Ok(())
    }

    fn reset_fence(&mut self, fence: FenceKey) -> Result<()> {
        let state = self
            .fences
            .get_mut(fence)
            .ok_or_else(|| Error::InvalidResource("unknown fence".to_string()))?;
        *state = false;
        self.log("reset_fence");
        Ok(())
    }

    fn destroy_fence(&mut self, fence: FenceKey) {
        if self.fences.remove(fence).is_some() {
            self.log("destroy_fence");
        }
    }

    fn create_semaphore(&mut self) -> Result<SemaphoreKey> {
        self.log("create_semaphore");
        Ok(self.semaphores.insert(()))
    }

    fn destroy_semaphore(&mut self, semaphore: SemaphoreKey) {
        if self.semaphores.remove(semaphore).is_some() {
            self.log("destroy_semaphore");
        }
    }

    // ===== COMMAND RECORDING =====

    fn allocate_command_buffer(&mut self) -> Result<CommandBufferKey> {
        self.log("allocate_command_buffer");
        Ok(self.command_buffers.insert(()))
    }

    fn free_command_buffer(&mut self, cmd: CommandBufferKey) {
        if self.command_buffers.remove(cmd).is_some() {
            self.log("free_command_buffer");
        }
    }

    fn begin_commands(&mut self, cmd: CommandBufferKey) -> Result<()> {
        if !self.command_buffers.contains_key(cmd) {
            return Err(Error::InvalidResource("unknown command buffer".to_string()));
        }
        self.log("begin_commands");
        Ok(())
    }

    fn end_commands(&mut self, _cmd: CommandBufferKey) -> Result<()> {
        self.log("end_commands");
        Ok(())
    }

    fn cmd_image_barrier(&mut self, _cmd: CommandBufferKey, barrier: &ImageBarrier) -> Result<()> {
        let name = self.image_name(barrier.image);
        self.log(format!(
            "barrier {} {:?}->{:?}",
            name, barrier.old_layout, barrier.new_layout
        ));
        self.barriers.push(*barrier);
        Ok(())
    }

    fn cmd_begin_rendering(&mut self, _cmd: CommandBufferKey, info: &RenderingInfo) -> Result<()> {
        let null_views = info
            .color_attachments
            .iter()
            .chain(info.depth_attachment.iter())
            .any(|a| a.image.is_null());
        if null_views {
            return Err(Error::InvalidResource("rendering with a null attachment".to_string()));
        }
        self.log(format!("begin_rendering {}", info.color_attachments.len()));
        Ok(())
    }

    fn cmd_end_rendering(&mut self, _cmd: CommandBufferKey) -> Result<()> {
        self.log("end_rendering");
        Ok(())
    }

    fn cmd_bind_pipeline(&mut self, _cmd: CommandBufferKey, _pipeline: PipelineKey) -> Result<()> {
        self.log("bind_pipeline");
        Ok(())
    }

    fn cmd_set_viewport(&mut self, _cmd: CommandBufferKey, _viewport: Viewport) -> Result<()> {
        self.log("set_viewport");
        Ok(())
    }

    fn cmd_set_scissor(&mut self, _cmd: CommandBufferKey, _scissor: Rect2D) -> Result<()> {
        self.log("set_scissor");
        Ok(())
    }

    fn cmd_push_constants(
        &mut self,
        _cmd: CommandBufferKey,
        _layout: PipelineLayoutKey,
        _stages: ShaderStages,
        data: &[u8],
    ) -> Result<()> {
        self.log(format!("push_constants {}", data.len()));
        Ok(())
    }

    fn cmd_bind_descriptor_set(
        &mut self,
        _cmd: CommandBufferKey,
        _layout: PipelineLayoutKey,
        set: DescriptorSetKey,
    ) -> Result<()> {
        if !self.sets.contains_key(set) {
            return Err(Error::InvalidResource("binding unknown descriptor set".to_string()));
        }
        self.log("bind_descriptor_set");
        Ok(())
    }

    fn cmd_bind_vertex_buffer(&mut self, _cmd: CommandBufferKey, _buffer: BufferKey) -> Result<()> {
        self.log("bind_vertex_buffer");
        Ok(())
    }

    fn cmd_bind_index_buffer(
        &mut self,
        _cmd: CommandBufferKey,
        _buffer: BufferKey,
        _index_type: IndexType,
    ) -> Result<()> {
        self.log("bind_index_buffer");
        Ok(())
    }

    fn cmd_draw(&mut self, _cmd: CommandBufferKey, vertex_count: u32) -> Result<()> {
        self.log(format!("draw {}", vertex_count));
        Ok(())
    }

    fn cmd_draw_indexed(&mut self, _cmd: CommandBufferKey, index_count: u32) -> Result<()> {
        self.log(format!("draw_indexed {}", index_count));
        Ok(())
    }

    fn submit(
        &mut self,
        _cmd: CommandBufferKey,
        _wait: SemaphoreKey,
        _signal: SemaphoreKey,
        fence: FenceKey,
    ) -> Result<()> {
        // Work completes immediately on the mock.
        if let Some(state) = self.fences.get_mut(fence) {
            *state = true;
        }
        self.log("submit");
        Ok(())
    }
}
