//! G-buffer render targets.
//!
//! Five color attachments (albedo, AO, normal, metallic-roughness, world
//! position), each a multisampled image plus a resolve image, and one sampler
//! shared by every resolve image. All attachments live at the swapchain
//! extent; a resize destroys and recreates the whole set.

use crate::engine_debug;
use crate::error::{Error, Result};
use crate::graphics_device::{
    AddressMode, ClearValue, Extent2D, Filter, Format, GraphicsDevice, ImageLayout, SampleCount,
    SamplerDesc, SamplerKey,
};
use crate::renderer::attachment::AttachmentPair;

// ============================================================================
// ATTACHMENT KINDS
// ============================================================================

/// One G-buffer channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GBufferAttachment {
    Albedo = 0,
    Ao = 1,
    Normal = 2,
    MetallicRoughness = 3,
    WorldPosition = 4,
}

impl GBufferAttachment {
    /// All channels in color-attachment order
    pub const ALL: [GBufferAttachment; 5] = [
        GBufferAttachment::Albedo,
        GBufferAttachment::Ao,
        GBufferAttachment::Normal,
        GBufferAttachment::MetallicRoughness,
        GBufferAttachment::WorldPosition,
    ];

    pub fn index(&self) -> usize {
        *self as usize
    }

    pub fn format(&self) -> Format {
        match self {
            GBufferAttachment::Albedo => Format::R8G8B8A8_UNORM,
            GBufferAttachment::Ao => Format::R8_UNORM,
            GBufferAttachment::Normal => Format::R16G16B16A16_SFLOAT,
            GBufferAttachment::MetallicRoughness => Format::R8G8_UNORM,
            GBufferAttachment::WorldPosition => Format::R32G32B32A32_SFLOAT,
        }
    }

    pub fn clear_value(&self) -> ClearValue {
        match self {
            // Flat tangent-space normal
            GBufferAttachment::Normal => ClearValue::Color([0.5, 0.5, 1.0, 1.0]),
            GBufferAttachment::WorldPosition => ClearValue::Color([0.0, 0.0, 0.0, 0.0]),
            _ => ClearValue::Color([0.0, 0.0, 0.0, 1.0]),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            GBufferAttachment::Albedo => "gbuffer_albedo",
            GBufferAttachment::Ao => "gbuffer_ao",
            GBufferAttachment::Normal => "gbuffer_normal",
            GBufferAttachment::MetallicRoughness => "gbuffer_metallic_roughness",
            GBufferAttachment::WorldPosition => "gbuffer_world_position",
        }
    }

    /// Formats of all channels, in attachment order (pipeline creation)
    pub fn formats() -> Vec<Format> {
        Self::ALL.iter().map(|a| a.format()).collect()
    }
}

// ============================================================================
// G-BUFFER MANAGER
// ============================================================================

#[derive(Default)]
pub struct GBufferManager {
    /// Indexed by `GBufferAttachment::index()`; empty when not created
    attachments: Vec<AttachmentPair>,
    sampler: Option<SamplerKey>,
    extent: Extent2D,
}

impl GBufferManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the shared sampler and every attachment at `extent`
    ///
    /// # Errors
    ///
    /// Fails if resources already exist or any creation fails; in the
    /// latter case everything created so far is destroyed.
    pub fn create_resources(
        &mut self,
        device: &mut dyn GraphicsDevice,
        extent: Extent2D,
        samples: SampleCount,
    ) -> Result<()> {
        if self.is_created() {
            return Err(Error::InvalidResource(
                "G-buffer resources already created".to_string(),
            ));
        }

        if let Err(e) = self.create_all(device, extent, samples) {
            self.cleanup(device);
            return Err(e);
        }

        self.extent = extent;
        engine_debug!(
            "lumen::GBufferManager",
            "Created {} G-buffer attachments at {}x{} ({} samples)",
            self.attachments.len(),
            extent.width,
            extent.height,
            samples.count()
        );
        Ok(())
    }

    fn create_all(
        &mut self,
        device: &mut dyn GraphicsDevice,
        extent: Extent2D,
        samples: SampleCount,
    ) -> Result<()> {
        self.sampler = Some(device.create_sampler(&SamplerDesc {
            filter: Filter::Linear,
            address_mode: AddressMode::ClampToEdge,
            max_anisotropy: None,
            max_lod: 1.0,
        })?);

        for kind in GBufferAttachment::ALL {
            let pair = AttachmentPair::new(device, kind.name(), kind.format(), extent, samples)?;
            self.attachments.push(pair);
        }
        Ok(())
    }

    pub fn is_created(&self) -> bool {
        !self.attachments.is_empty() || self.sampler.is_some()
    }

    pub fn extent(&self) -> Extent2D {
        self.extent
    }

    /// Sampler shared by all resolve images (null key when not created)
    pub fn sampler(&self) -> SamplerKey {
        self.sampler.unwrap_or_default()
    }

    pub fn attachment(&self, kind: GBufferAttachment) -> Option<&AttachmentPair> {
        self.attachments.get(kind.index())
    }

    pub fn attachment_mut(&mut self, kind: GBufferAttachment) -> Option<&mut AttachmentPair> {
        self.attachments.get_mut(kind.index())
    }

    /// All attachments in attachment order
    pub fn attachments(&self) -> &[AttachmentPair] {
        &self.attachments
    }

    pub fn attachments_mut(&mut self) -> &mut [AttachmentPair] {
        &mut self.attachments
    }

    /// Tracked layout of the resolve image (Undefined when not created)
    pub fn resolve_layout(&self, kind: GBufferAttachment) -> ImageLayout {
        self.attachment(kind)
            .map(|a| a.resolve().layout())
            .unwrap_or(ImageLayout::Undefined)
    }

    /// Tracked layout of the multisampled image (Undefined when not created)
    pub fn msaa_layout(&self, kind: GBufferAttachment) -> ImageLayout {
        self.attachment(kind)
            .map(|a| a.msaa().layout())
            .unwrap_or(ImageLayout::Undefined)
    }

    /// Destroy attachments in reverse creation order, then the sampler
    ///
    /// Safe on partially created state and when called repeatedly.
    pub fn cleanup(&mut self, device: &mut dyn GraphicsDevice) {
        while let Some(pair) = self.attachments.pop() {
            pair.destroy(device);
        }
        if let Some(sampler) = self.sampler.take() {
            device.destroy_sampler(sampler);
        }
        self.extent = Extent2D::default();
    }
}

#[cfg(test)]
#[path = "gbuffer_manager_tests.rs"]
mod tests;
