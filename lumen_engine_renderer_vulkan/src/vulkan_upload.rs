/// One-shot uploads: staging buffers, blocking submits and mip generation

use ash::vk;
use gpu_allocator::vulkan::{Allocation, AllocationCreateDesc, AllocationScheme, Allocator};
use gpu_allocator::MemoryLocation;
use lumen_engine::lumen::{Error, Result};
use lumen_engine::{engine_err, engine_error};

/// Host-visible buffer holding data on its way to a GPU-only resource
pub(crate) struct StagingBuffer {
    pub buffer: vk::Buffer,
    allocation: Option<Allocation>,
}

impl StagingBuffer {
    /// Create a mapped TRANSFER_SRC buffer and copy `data` into it
    pub fn new(device: &ash::Device, allocator: &mut Allocator, data: &[u8]) -> Result<Self> {
        unsafe {
            let create_info = vk::BufferCreateInfo::default()
                .size(data.len() as u64)
                .usage(vk::BufferUsageFlags::TRANSFER_SRC)
                .sharing_mode(vk::SharingMode::EXCLUSIVE);

            let buffer = device
                .create_buffer(&create_info, None)
                .map_err(|e| engine_err!("lumen::vulkan", "Failed to create staging buffer: {:?}", e))?;

            let requirements = device.get_buffer_memory_requirements(buffer);
            let allocation = match allocator.allocate(&AllocationCreateDesc {
                name: "staging_buffer",
                requirements,
                location: MemoryLocation::CpuToGpu,
                linear: true,
                allocation_scheme: AllocationScheme::GpuAllocatorManaged,
            }) {
                Ok(allocation) => allocation,
                Err(_) => {
                    device.destroy_buffer(buffer, None);
                    let size_mb = requirements.size as f64 / (1024.0 * 1024.0);
                    engine_error!("lumen::vulkan", "Out of GPU memory for staging buffer ({:.2} MB)", size_mb);
                    return Err(Error::OutOfMemory);
                }
            };

            let mut staging = Self { buffer, allocation: Some(allocation) };

            if let Err(e) = staging.fill(device, data) {
                staging.destroy(device, allocator);
                return Err(e);
            }
            Ok(staging)
        }
    }

    unsafe fn fill(&mut self, device: &ash::Device, data: &[u8]) -> Result<()> {
        let allocation = self
            .allocation
            .as_ref()
            .ok_or_else(|| Error::BackendError("Staging buffer has no allocation".to_string()))?;

        device
            .bind_buffer_memory(self.buffer, allocation.memory(), allocation.offset())
            .map_err(|e| engine_err!("lumen::vulkan", "Failed to bind staging buffer memory: {:?}", e))?;

        let mapped = allocation
            .mapped_ptr()
            .ok_or_else(|| engine_err!("lumen::vulkan", "Staging buffer is not host-visible"))?
            .as_ptr() as *mut u8;
        std::ptr::copy_nonoverlapping(data.as_ptr(), mapped, data.len());
        Ok(())
    }

    /// Free the allocation and destroy the buffer
    pub fn destroy(mut self, device: &ash::Device, allocator: &mut Allocator) {
        if let Some(allocation) = self.allocation.take() {
            allocator.free(allocation).ok();
        }
        unsafe {
            device.destroy_buffer(self.buffer, None);
        }
    }
}

/// Record commands into a fresh command buffer, submit and wait for the queue
///
/// # Arguments
///
/// * `device` - Logical device
/// * `pool` - Transient command pool on the graphics family
/// * `queue` - Graphics queue
/// * `record` - Fills the command buffer
pub(crate) fn submit_one_shot<F>(
    device: &ash::Device,
    pool: vk::CommandPool,
    queue: vk::Queue,
    record: F,
) -> Result<()>
where
    F: FnOnce(vk::CommandBuffer),
{
    unsafe {
        let alloc_info = vk::CommandBufferAllocateInfo::default()
            .command_pool(pool)
            .level(vk::CommandBufferLevel::PRIMARY)
            .command_buffer_count(1);

        let command_buffer = device
            .allocate_command_buffers(&alloc_info)
            .map_err(|e| engine_err!("lumen::vulkan", "Failed to allocate upload command buffer: {:?}", e))?
            .into_iter()
            .next()
            .ok_or_else(|| engine_err!("lumen::vulkan", "No upload command buffer returned"))?;

        let result = (|| {
            let begin_info = vk::CommandBufferBeginInfo::default()
                .flags(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT);
            device
                .begin_command_buffer(command_buffer, &begin_info)
                .map_err(|e| engine_err!("lumen::vulkan", "Failed to begin upload command buffer: {:?}", e))?;

            record(command_buffer);

            device
                .end_command_buffer(command_buffer)
                .map_err(|e| engine_err!("lumen::vulkan", "Failed to end upload command buffer: {:?}", e))?;

            let command_buffers = [command_buffer];
            let submit_info = vk::SubmitInfo::default().command_buffers(&command_buffers);
            device
                .queue_submit(queue, &[submit_info], vk::Fence::null())
                .map_err(|e| engine_err!("lumen::vulkan", "Failed to submit upload commands: {:?}", e))?;

            device
                .queue_wait_idle(queue)
                .map_err(|e| engine_err!("lumen::vulkan", "Failed to wait for upload: {:?}", e))
        })();

        device.free_command_buffers(pool, &[command_buffer]);
        result
    }
}

/// Color barrier over `level_count` mips starting at `base_mip`
fn mip_barrier<'a>(
    image: vk::Image,
    base_mip: u32,
    level_count: u32,
    old_layout: vk::ImageLayout,
    new_layout: vk::ImageLayout,
    src: (vk::PipelineStageFlags2, vk::AccessFlags2),
    dst: (vk::PipelineStageFlags2, vk::AccessFlags2),
) -> vk::ImageMemoryBarrier2<'a> {
    vk::ImageMemoryBarrier2::default()
        .src_stage_mask(src.0)
        .src_access_mask(src.1)
        .dst_stage_mask(dst.0)
        .dst_access_mask(dst.1)
        .old_layout(old_layout)
        .new_layout(new_layout)
        .src_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
        .dst_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
        .image(image)
        .subresource_range(vk::ImageSubresourceRange {
            aspect_mask: vk::ImageAspectFlags::COLOR,
            base_mip_level: base_mip,
            level_count,
            base_array_layer: 0,
            layer_count: 1,
        })
}

fn pipeline_barrier(device: &ash::Device, cmd: vk::CommandBuffer, barrier: vk::ImageMemoryBarrier2) {
    let barriers = [barrier];
    let dependency = vk::DependencyInfo::default().image_memory_barriers(&barriers);
    unsafe {
        device.cmd_pipeline_barrier2(cmd, &dependency);
    }
}

/// Copy mip 0 from `staging`, blit the rest of the chain, end in SHADER_READ_ONLY
///
/// The image must be in UNDEFINED when the commands execute.
pub(crate) fn record_texture_upload(
    device: &ash::Device,
    cmd: vk::CommandBuffer,
    staging: vk::Buffer,
    image: vk::Image,
    width: u32,
    height: u32,
    mip_levels: u32,
) {
    let transfer_write = (vk::PipelineStageFlags2::TRANSFER, vk::AccessFlags2::TRANSFER_WRITE);
    let transfer_read = (vk::PipelineStageFlags2::TRANSFER, vk::AccessFlags2::TRANSFER_READ);
    let shader_read = (vk::PipelineStageFlags2::FRAGMENT_SHADER, vk::AccessFlags2::SHADER_READ);

    pipeline_barrier(
        device,
        cmd,
        mip_barrier(
            image,
            0,
            mip_levels,
            vk::ImageLayout::UNDEFINED,
            vk::ImageLayout::TRANSFER_DST_OPTIMAL,
            (vk::PipelineStageFlags2::TOP_OF_PIPE, vk::AccessFlags2::NONE),
            transfer_write,
        ),
    );

    let region = vk::BufferImageCopy::default()
        .image_subresource(vk::ImageSubresourceLayers {
            aspect_mask: vk::ImageAspectFlags::COLOR,
            mip_level: 0,
            base_array_layer: 0,
            layer_count: 1,
        })
        .image_extent(vk::Extent3D { width, height, depth: 1 });

    unsafe {
        device.cmd_copy_buffer_to_image(
            cmd,
            staging,
            image,
            vk::ImageLayout::TRANSFER_DST_OPTIMAL,
            &[region],
        );
    }

    let mut mip_width = width as i32;
    let mut mip_height = height as i32;

    for mip in 1..mip_levels {
        let src_mip = mip - 1;
        let dst_width = (mip_width / 2).max(1);
        let dst_height = (mip_height / 2).max(1);

        pipeline_barrier(
            device,
            cmd,
            mip_barrier(
                image,
                src_mip,
                1,
                vk::ImageLayout::TRANSFER_DST_OPTIMAL,
                vk::ImageLayout::TRANSFER_SRC_OPTIMAL,
                transfer_write,
                transfer_read,
            ),
        );

        let blit = vk::ImageBlit::default()
            .src_subresource(vk::ImageSubresourceLayers {
                aspect_mask: vk::ImageAspectFlags::COLOR,
                mip_level: src_mip,
                base_array_layer: 0,
                layer_count: 1,
            })
            .src_offsets([
                vk::Offset3D { x: 0, y: 0, z: 0 },
                vk::Offset3D { x: mip_width, y: mip_height, z: 1 },
            ])
            .dst_subresource(vk::ImageSubresourceLayers {
                aspect_mask: vk::ImageAspectFlags::COLOR,
                mip_level: mip,
                base_array_layer: 0,
                layer_count: 1,
            })
            .dst_offsets([
                vk::Offset3D { x: 0, y: 0, z: 0 },
                vk::Offset3D { x: dst_width, y: dst_height, z: 1 },
            ]);

        unsafe {
            device.cmd_blit_image(
                cmd,
                image,
                vk::ImageLayout::TRANSFER_SRC_OPTIMAL,
                image,
                vk::ImageLayout::TRANSFER_DST_OPTIMAL,
                &[blit],
                vk::Filter::LINEAR,
            );
        }

        // Source level is final
        pipeline_barrier(
            device,
            cmd,
            mip_barrier(
                image,
                src_mip,
                1,
                vk::ImageLayout::TRANSFER_SRC_OPTIMAL,
                vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
                transfer_read,
                shader_read,
            ),
        );

        mip_width = dst_width;
        mip_height = dst_height;
    }

    // Last level was only ever written
    pipeline_barrier(
        device,
        cmd,
        mip_barrier(
            image,
            mip_levels - 1,
            1,
            vk::ImageLayout::TRANSFER_DST_OPTIMAL,
            vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
            transfer_write,
            shader_read,
        ),
    );
}

/// Copy the whole staging buffer to the start of `dst`
pub(crate) fn record_buffer_copy(
    device: &ash::Device,
    cmd: vk::CommandBuffer,
    staging: vk::Buffer,
    dst: vk::Buffer,
    size: u64,
) {
    let region = vk::BufferCopy { src_offset: 0, dst_offset: 0, size };
    unsafe {
        device.cmd_copy_buffer(cmd, staging, dst, &[region]);
    }
}
