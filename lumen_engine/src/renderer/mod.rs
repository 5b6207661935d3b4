/// Renderer module - attachment managers, descriptors, pipelines and the frame orchestrator

// Module declarations
pub mod attachment;
pub mod depth_buffer;
pub mod descriptor_manager;
pub mod frame_sync;
pub mod gbuffer_manager;
pub mod hdr_manager;
pub mod pipeline_builder;
pub mod renderer;
pub mod swapchain;

// Re-export the orchestrator
pub use renderer::{Renderer, RendererStats};

// Re-export from other modules
pub use attachment::AttachmentPair;
pub use depth_buffer::{DepthBuffer, DEPTH_CLEAR};
pub use descriptor_manager::{BufferBinding, DescriptorManager, ImageBinding, SetBindings};
pub use frame_sync::{FrameSlot, FrameSync};
pub use gbuffer_manager::{GBufferAttachment, GBufferManager};
pub use hdr_manager::{HdrManager, HDR_CLEAR, HDR_FORMAT};
pub use pipeline_builder::{
    default_pipeline_config, load_shader_code, GraphicsPipeline, PipelineBuilder, PipelineShaders,
};
pub use swapchain::{
    choose_extent, choose_image_count, choose_present_mode, choose_surface_format,
    wait_for_nonzero_size, SurfaceSizeSource, Swapchain, PREFERRED_SURFACE_FORMAT,
};
