/// Typed handles for device objects
///
/// Each kind lives in its own arena inside the device. The null key stands
/// for "no handle"; destroying a null or already-destroyed key does nothing.

use slotmap::new_key_type;

new_key_type! {
    /// Image plus its default view and backing allocation
    pub struct ImageKey;
    /// Buffer plus its backing allocation
    pub struct BufferKey;
    pub struct SamplerKey;
    pub struct DescriptorPoolKey;
    pub struct DescriptorSetLayoutKey;
    pub struct DescriptorSetKey;
    pub struct ShaderModuleKey;
    pub struct PipelineLayoutKey;
    pub struct PipelineKey;
    pub struct PipelineCacheKey;
    pub struct CommandBufferKey;
    pub struct FenceKey;
    pub struct SemaphoreKey;
}
