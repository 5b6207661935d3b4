/// Backend-neutral descriptions of GPU objects, formats and states

use bitflags::bitflags;

use crate::graphics_device::{BufferKey, ImageKey, SamplerKey};

// ============================================================================
// Formats
// ============================================================================

/// Pixel formats used by attachments, textures and the swapchain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(non_camel_case_types)]
pub enum Format {
    Undefined,

    // Color
    R8_UNORM,
    R8G8_UNORM,
    R8G8B8A8_UNORM,
    R8G8B8A8_SRGB,
    B8G8R8A8_UNORM,
    B8G8R8A8_SRGB,
    R16G16B16A16_SFLOAT,
    R32G32B32A32_SFLOAT,

    // Vertex attributes
    R32G32_SFLOAT,
    R32G32B32_SFLOAT,

    // Depth / stencil
    D32_SFLOAT,
    D32_SFLOAT_S8_UINT,
    D24_UNORM_S8_UINT,
}

impl Format {
    /// True for formats with a depth component
    pub fn is_depth(&self) -> bool {
        matches!(
            self,
            Format::D32_SFLOAT | Format::D32_SFLOAT_S8_UINT | Format::D24_UNORM_S8_UINT
        )
    }

    /// True for depth formats that also carry stencil
    pub fn has_stencil(&self) -> bool {
        matches!(self, Format::D32_SFLOAT_S8_UINT | Format::D24_UNORM_S8_UINT)
    }

    /// Aspect a barrier on an image of this format must cover
    pub fn barrier_aspect(&self) -> ImageAspect {
        if self.has_stencil() {
            ImageAspect::DepthStencil
        } else if self.is_depth() {
            ImageAspect::Depth
        } else {
            ImageAspect::Color
        }
    }

    /// Aspect used for views (sampled depth-stencil images expose depth only)
    pub fn view_aspect(&self) -> ImageAspect {
        if self.is_depth() {
            ImageAspect::Depth
        } else {
            ImageAspect::Color
        }
    }
}

/// Image aspect selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageAspect {
    Color,
    Depth,
    DepthStencil,
}

/// Color space paired with a surface format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorSpace {
    SrgbNonlinear,
    /// Anything else the surface reports
    Other(i32),
}

/// Format + color space offered by the presentation surface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceFormat {
    pub format: Format,
    pub color_space: ColorSpace,
}

// ============================================================================
// Extents, samples, layouts
// ============================================================================

/// 2D size in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Extent2D {
    pub width: u32,
    pub height: u32,
}

impl Extent2D {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Either dimension is zero (minimized window)
    pub fn is_zero(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Multisample count
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SampleCount {
    S1 = 1,
    S2 = 2,
    S4 = 4,
    S8 = 8,
    S16 = 16,
    S32 = 32,
    S64 = 64,
}

impl SampleCount {
    /// Number of samples per pixel
    pub fn count(&self) -> u32 {
        *self as u32
    }

    /// Highest sample count whose bit is set in `mask`, searching 64 down to 1.
    ///
    /// `mask` uses the same bit values as the sample counts themselves
    /// (bit 0 = 1 sample, bit 6 = 64 samples). An empty mask yields `S1`.
    pub fn highest_in_mask(mask: u32) -> SampleCount {
        [
            SampleCount::S64,
            SampleCount::S32,
            SampleCount::S16,
            SampleCount::S8,
            SampleCount::S4,
            SampleCount::S2,
        ]
        .into_iter()
        .find(|s| mask & s.count() != 0)
        .unwrap_or(SampleCount::S1)
    }
}

/// Image layouts the engine moves images through
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageLayout {
    Undefined,
    ColorAttachment,
    DepthAttachment,
    DepthReadOnly,
    ShaderReadOnly,
    TransferSrc,
    TransferDst,
    PresentSrc,
}

// ============================================================================
// Flags
// ============================================================================

bitflags! {
    /// How an image will be used
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ImageUsage: u32 {
        const TRANSFER_SRC = 1 << 0;
        const TRANSFER_DST = 1 << 1;
        const SAMPLED = 1 << 2;
        const COLOR_ATTACHMENT = 1 << 3;
        const DEPTH_STENCIL_ATTACHMENT = 1 << 4;
        const TRANSIENT_ATTACHMENT = 1 << 5;
    }
}

bitflags! {
    /// How a buffer will be used
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct BufferUsage: u32 {
        const TRANSFER_SRC = 1 << 0;
        const TRANSFER_DST = 1 << 1;
        const VERTEX = 1 << 2;
        const INDEX = 1 << 3;
        const UNIFORM = 1 << 4;
    }
}

bitflags! {
    /// Shader stages
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ShaderStages: u32 {
        const VERTEX = 1 << 0;
        const FRAGMENT = 1 << 1;
    }
}

bitflags! {
    /// Memory access kinds covered by a barrier
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct AccessFlags: u32 {
        const COLOR_ATTACHMENT_READ = 1 << 0;
        const COLOR_ATTACHMENT_WRITE = 1 << 1;
        const DEPTH_STENCIL_ATTACHMENT_READ = 1 << 2;
        const DEPTH_STENCIL_ATTACHMENT_WRITE = 1 << 3;
        const SHADER_READ = 1 << 4;
        const TRANSFER_READ = 1 << 5;
        const TRANSFER_WRITE = 1 << 6;
    }
}

bitflags! {
    /// Pipeline stages a barrier synchronizes
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct PipelineStages: u32 {
        const TOP_OF_PIPE = 1 << 0;
        const EARLY_FRAGMENT_TESTS = 1 << 1;
        const LATE_FRAGMENT_TESTS = 1 << 2;
        const FRAGMENT_SHADER = 1 << 3;
        const COLOR_ATTACHMENT_OUTPUT = 1 << 4;
        const TRANSFER = 1 << 5;
        const BOTTOM_OF_PIPE = 1 << 6;
    }
}

bitflags! {
    /// Descriptor pool creation flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct DescriptorPoolFlags: u32 {
        /// Individual sets may be returned to the pool
        const FREE_DESCRIPTOR_SET = 1 << 0;
    }
}

// ============================================================================
// Resource descriptors
// ============================================================================

/// Where a buffer's memory lives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryLocation {
    /// Device-local, filled through staging
    GpuOnly,
    /// Host-visible, persistently mapped
    CpuToGpu,
}

/// Descriptor for creating an image together with its view and allocation
#[derive(Debug, Clone)]
pub struct ImageDesc {
    pub name: String,
    pub extent: Extent2D,
    pub format: Format,
    pub mip_levels: u32,
    pub samples: SampleCount,
    pub usage: ImageUsage,
}

/// Descriptor for creating a buffer
#[derive(Debug, Clone)]
pub struct BufferDesc {
    pub name: String,
    pub size: u64,
    pub usage: BufferUsage,
    pub location: MemoryLocation,
}

/// Texel filter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Filter {
    Nearest,
    Linear,
}

/// Texture coordinate addressing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressMode {
    Repeat,
    ClampToEdge,
}

/// Descriptor for creating a sampler
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplerDesc {
    pub filter: Filter,
    pub address_mode: AddressMode,
    /// `None` disables anisotropic filtering
    pub max_anisotropy: Option<f32>,
    pub max_lod: f32,
}

/// Index element type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexType {
    U16,
    U32,
}

// ============================================================================
// Descriptors
// ============================================================================

/// Descriptor kinds the engine binds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DescriptorType {
    UniformBuffer,
    CombinedImageSampler,
}

/// Number of descriptors of one type a pool can hold
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DescriptorPoolSize {
    pub ty: DescriptorType,
    pub count: u32,
}

/// One binding slot of a descriptor set layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DescriptorSetLayoutBinding {
    pub binding: u32,
    pub ty: DescriptorType,
    pub count: u32,
    pub stages: ShaderStages,
}

/// A single descriptor write, already validated (no null handles)
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DescriptorWrite {
    UniformBuffer {
        binding: u32,
        buffer: BufferKey,
        offset: u64,
        range: u64,
    },
    CombinedImageSampler {
        binding: u32,
        array_element: u32,
        image: ImageKey,
        sampler: SamplerKey,
        layout: ImageLayout,
    },
}

impl DescriptorWrite {
    pub fn binding(&self) -> u32 {
        match self {
            DescriptorWrite::UniformBuffer { binding, .. } => *binding,
            DescriptorWrite::CombinedImageSampler { binding, .. } => *binding,
        }
    }
}

// ============================================================================
// Swapchain
// ============================================================================

/// Presentation modes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresentMode {
    Immediate,
    Mailbox,
    Fifo,
    FifoRelaxed,
}

/// Surface limits reported by the device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceCapabilities {
    pub min_image_count: u32,
    /// 0 means no upper bound
    pub max_image_count: u32,
    /// `u32::MAX` width means the surface lets the swapchain pick
    pub current_extent: Extent2D,
    pub min_image_extent: Extent2D,
    pub max_image_extent: Extent2D,
}

/// Everything the surface supports
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceSupport {
    pub capabilities: SurfaceCapabilities,
    pub formats: Vec<SurfaceFormat>,
    pub present_modes: Vec<PresentMode>,
}

/// Chosen swapchain parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapchainDesc {
    pub surface_format: SurfaceFormat,
    pub present_mode: PresentMode,
    pub extent: Extent2D,
    pub image_count: u32,
}

/// Result of asking for the next presentable image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquireOutcome {
    Acquired(u32),
    /// The surface changed; the swapchain must be rebuilt before rendering
    OutOfDate,
}

/// Result of presenting an image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresentOutcome {
    Presented,
    /// Suboptimal or out of date; rebuild before the next frame
    Stale,
}
