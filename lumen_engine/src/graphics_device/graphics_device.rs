/// GraphicsDevice trait - the engine's only door to the GPU
///
/// Implemented by the Vulkan backend and by the test mock. Every object the
/// device creates is returned as a typed key; the caller owns the key and is
/// responsible for handing it back to the matching `destroy_*` call exactly
/// once. Destroy calls accept stale or null keys and ignore them.

use crate::error::Result;
use crate::graphics_device::{
    AcquireOutcome, BufferDesc, BufferKey, CommandBufferKey, DescriptorPoolFlags,
    DescriptorPoolKey, DescriptorPoolSize, DescriptorSetKey, DescriptorSetLayoutBinding,
    DescriptorSetLayoutKey, DescriptorWrite, FenceKey, Format, GraphicsPipelineDesc, ImageBarrier,
    ImageDesc, ImageKey, IndexType, PipelineCacheKey, PipelineKey, PipelineLayoutDesc,
    PipelineLayoutKey, PresentOutcome, Rect2D, RenderingInfo, SampleCount, SamplerDesc,
    SamplerKey, SemaphoreKey, ShaderModuleKey, ShaderStages, SurfaceSupport, SwapchainDesc,
    Viewport,
};

/// Main device trait
pub trait GraphicsDevice {
    // ===== CAPABILITIES =====

    /// Sample count used for every multisampled attachment
    fn msaa_samples(&self) -> SampleCount;

    /// Depth format supported for optimal-tiling depth attachments
    fn depth_format(&self) -> Format;

    /// Maximum sampler anisotropy of the physical device
    fn max_sampler_anisotropy(&self) -> f32;

    /// Block until the device has finished all submitted work
    fn wait_idle(&mut self) -> Result<()>;

    // ===== IMAGES =====

    /// Create an image, its backing allocation and its default view
    ///
    /// The image starts in `ImageLayout::Undefined`.
    fn create_image(&mut self, desc: &ImageDesc) -> Result<ImageKey>;

    /// Upload RGBA8 pixels into mip 0 and generate the remaining mip levels
    ///
    /// Runs on a one-shot command buffer and waits for completion. The image
    /// must be in `Undefined`; it ends in `ShaderReadOnly`.
    ///
    /// # Errors
    ///
    /// Fails if the image format does not support linear blits.
    fn upload_texture(&mut self, image: ImageKey, pixels: &[u8]) -> Result<()>;

    /// Destroy the view, the image and its allocation
    fn destroy_image(&mut self, image: ImageKey);

    /// Create a sampler
    fn create_sampler(&mut self, desc: &SamplerDesc) -> Result<SamplerKey>;

    /// Destroy a sampler
    fn destroy_sampler(&mut self, sampler: SamplerKey);

    // ===== BUFFERS =====

    /// Create a buffer and its backing allocation
    fn create_buffer(&mut self, desc: &BufferDesc) -> Result<BufferKey>;

    /// Copy bytes into a persistently mapped (`CpuToGpu`) buffer
    ///
    /// # Arguments
    ///
    /// * `buffer` - Target buffer
    /// * `offset` - Byte offset into the buffer
    /// * `data` - Bytes to copy
    fn write_buffer(&mut self, buffer: BufferKey, offset: u64, data: &[u8]) -> Result<()>;

    /// Fill a `GpuOnly` buffer through a temporary staging buffer
    ///
    /// Waits for the copy to complete before returning.
    fn upload_buffer(&mut self, buffer: BufferKey, data: &[u8]) -> Result<()>;

    /// Destroy a buffer and free its allocation
    fn destroy_buffer(&mut self, buffer: BufferKey);

    // ===== DESCRIPTORS =====

    /// Create a descriptor pool
    fn create_descriptor_pool(
        &mut self,
        sizes: &[DescriptorPoolSize],
        max_sets: u32,
        flags: DescriptorPoolFlags,
    ) -> Result<DescriptorPoolKey>;

    /// Destroy a descriptor pool (implicitly frees every set allocated from it)
    fn destroy_descriptor_pool(&mut self, pool: DescriptorPoolKey);

    /// Create a descriptor set layout
    fn create_descriptor_set_layout(
        &mut self,
        bindings: &[DescriptorSetLayoutBinding],
    ) -> Result<DescriptorSetLayoutKey>;

    /// Destroy a descriptor set layout
    fn destroy_descriptor_set_layout(&mut self, layout: DescriptorSetLayoutKey);

    /// Allocate `count` sets sharing one layout
    ///
    /// # Errors
    ///
    /// `Error::DescriptorPoolExhausted` when the pool is out of memory or
    /// fragmented, any other error for everything else.
    fn allocate_descriptor_sets(
        &mut self,
        pool: DescriptorPoolKey,
        layout: DescriptorSetLayoutKey,
        count: u32,
    ) -> Result<Vec<DescriptorSetKey>>;

    /// Return sets to a pool created with `FREE_DESCRIPTOR_SET`
    fn free_descriptor_sets(
        &mut self,
        pool: DescriptorPoolKey,
        sets: &[DescriptorSetKey],
    ) -> Result<()>;

    /// Apply all writes for one set in a single batched update
    fn update_descriptor_set(
        &mut self,
        set: DescriptorSetKey,
        writes: &[DescriptorWrite],
    ) -> Result<()>;

    // ===== PIPELINES =====

    /// Create a shader module from SPIR-V words
    fn create_shader_module(&mut self, code: &[u32]) -> Result<ShaderModuleKey>;

    /// Destroy a shader module
    fn destroy_shader_module(&mut self, module: ShaderModuleKey);

    /// Create a pipeline layout
    fn create_pipeline_layout(&mut self, desc: &PipelineLayoutDesc) -> Result<PipelineLayoutKey>;

    /// Destroy a pipeline layout
    fn destroy_pipeline_layout(&mut self, layout: PipelineLayoutKey);

    /// Create a pipeline cache seeded with previously saved bytes (may be empty)
    fn create_pipeline_cache(&mut self, initial_data: &[u8]) -> Result<PipelineCacheKey>;

    /// Serialize a pipeline cache
    fn pipeline_cache_data(&self, cache: PipelineCacheKey) -> Result<Vec<u8>>;

    /// Destroy a pipeline cache
    fn destroy_pipeline_cache(&mut self, cache: PipelineCacheKey);

    /// Compile a graphics pipeline for dynamic rendering
    fn create_graphics_pipeline(&mut self, desc: &GraphicsPipelineDesc) -> Result<PipelineKey>;

    /// Destroy a pipeline
    fn destroy_pipeline(&mut self, pipeline: PipelineKey);

    // ===== SWAPCHAIN =====

    /// Query what the presentation surface supports
    fn surface_support(&self) -> Result<SurfaceSupport>;

    /// Create the swapchain (only one exists at a time)
    fn create_swapchain(&mut self, desc: &SwapchainDesc) -> Result<()>;

    /// Create one view per swapchain image and register the images
    ///
    /// The returned keys are views over images owned by the swapchain;
    /// they are released by `destroy_swapchain`, never by `destroy_image`.
    fn create_swapchain_image_views(&mut self) -> Result<Vec<ImageKey>>;

    /// Destroy the swapchain image views and the swapchain
    fn destroy_swapchain(&mut self);

    /// Acquire the next presentable image, signaling `signal` when it is ready
    fn acquire_next_image(&mut self, signal: SemaphoreKey) -> Result<AcquireOutcome>;

    /// Present an acquired image once `wait` is signaled
    fn present(&mut self, image_index: u32, wait: SemaphoreKey) -> Result<PresentOutcome>;

    // ===== SYNCHRONIZATION =====

    /// Create a fence, optionally already signaled
    fn create_fence(&mut self, signaled: bool) -> Result<FenceKey>;

    /// Block without timeout until the fence is signaled
    fn wait_for_fence(&mut self, fence: FenceKey) -> Result<()>;

    /// Return the fence to the unsignaled state
    fn reset_fence(&mut self, fence: FenceKey) -> Result<()>;

    /// Destroy a fence
    fn destroy_fence(&mut self, fence: FenceKey);

    /// Create a binary semaphore
    fn create_semaphore(&mut self) -> Result<SemaphoreKey>;

    /// Destroy a semaphore
    fn destroy_semaphore(&mut self, semaphore: SemaphoreKey);

    // ===== COMMAND RECORDING =====

    /// Allocate a primary command buffer that can be reset and re-recorded
    fn allocate_command_buffer(&mut self) -> Result<CommandBufferKey>;

    /// Free a command buffer
    fn free_command_buffer(&mut self, cmd: CommandBufferKey);

    /// Reset and begin recording (one-time-submit)
    fn begin_commands(&mut self, cmd: CommandBufferKey) -> Result<()>;

    /// Finish recording
    fn end_commands(&mut self, cmd: CommandBufferKey) -> Result<()>;

    /// Record an image layout transition
    fn cmd_image_barrier(&mut self, cmd: CommandBufferKey, barrier: &ImageBarrier) -> Result<()>;

    /// Begin a dynamic rendering pass
    fn cmd_begin_rendering(&mut self, cmd: CommandBufferKey, info: &RenderingInfo) -> Result<()>;

    /// End the current dynamic rendering pass
    fn cmd_end_rendering(&mut self, cmd: CommandBufferKey) -> Result<()>;

    /// Bind a graphics pipeline
    fn cmd_bind_pipeline(&mut self, cmd: CommandBufferKey, pipeline: PipelineKey) -> Result<()>;

    /// Set the dynamic viewport
    fn cmd_set_viewport(&mut self, cmd: CommandBufferKey, viewport: Viewport) -> Result<()>;

    /// Set the dynamic scissor
    fn cmd_set_scissor(&mut self, cmd: CommandBufferKey, scissor: Rect2D) -> Result<()>;

    /// Push constants at offset 0
    fn cmd_push_constants(
        &mut self,
        cmd: CommandBufferKey,
        layout: PipelineLayoutKey,
        stages: ShaderStages,
        data: &[u8],
    ) -> Result<()>;

    /// Bind one descriptor set at set index 0
    fn cmd_bind_descriptor_set(
        &mut self,
        cmd: CommandBufferKey,
        layout: PipelineLayoutKey,
        set: DescriptorSetKey,
    ) -> Result<()>;

    /// Bind a vertex buffer at binding 0, offset 0
    fn cmd_bind_vertex_buffer(&mut self, cmd: CommandBufferKey, buffer: BufferKey) -> Result<()>;

    /// Bind an index buffer at offset 0
    fn cmd_bind_index_buffer(
        &mut self,
        cmd: CommandBufferKey,
        buffer: BufferKey,
        index_type: IndexType,
    ) -> Result<()>;

    /// Draw without a vertex buffer (one instance)
    fn cmd_draw(&mut self, cmd: CommandBufferKey, vertex_count: u32) -> Result<()>;

    /// Indexed draw (one instance)
    fn cmd_draw_indexed(&mut self, cmd: CommandBufferKey, index_count: u32) -> Result<()>;

    /// Submit one command buffer on the graphics queue
    ///
    /// Waits on `wait` at the color-attachment-output stage, signals `signal`
    /// and `fence` on completion.
    fn submit(
        &mut self,
        cmd: CommandBufferKey,
        wait: SemaphoreKey,
        signal: SemaphoreKey,
        fence: FenceKey,
    ) -> Result<()>;
}
