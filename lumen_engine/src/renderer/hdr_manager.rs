//! High-dynamic-range target between the lighting and tonemap passes.

use crate::engine_debug;
use crate::error::{Error, Result};
use crate::graphics_device::{
    AddressMode, ClearValue, Extent2D, Filter, Format, GraphicsDevice, SampleCount, SamplerDesc,
    SamplerKey,
};
use crate::renderer::attachment::AttachmentPair;

/// Format of both HDR images
pub const HDR_FORMAT: Format = Format::R32G32B32A32_SFLOAT;

/// Lighting pass clear color
pub const HDR_CLEAR: ClearValue = ClearValue::Color([0.0, 0.0, 0.0, 1.0]);

#[derive(Default)]
pub struct HdrManager {
    target: Option<AttachmentPair>,
    sampler: Option<SamplerKey>,
}

impl HdrManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the multisampled HDR image, its resolve image and a sampler
    pub fn create_resources(
        &mut self,
        device: &mut dyn GraphicsDevice,
        extent: Extent2D,
        samples: SampleCount,
    ) -> Result<()> {
        if self.target.is_some() || self.sampler.is_some() {
            return Err(Error::InvalidResource("HDR resources already created".to_string()));
        }

        let target = AttachmentPair::new(device, "hdr", HDR_FORMAT, extent, samples)?;
        let sampler = match device.create_sampler(&SamplerDesc {
            filter: Filter::Linear,
            address_mode: AddressMode::ClampToEdge,
            max_anisotropy: None,
            max_lod: 1.0,
        }) {
            Ok(sampler) => sampler,
            Err(e) => {
                target.destroy(device);
                return Err(e);
            }
        };

        self.target = Some(target);
        self.sampler = Some(sampler);
        engine_debug!("lumen::HdrManager", "HDR target created at {}x{}", extent.width, extent.height);
        Ok(())
    }

    pub fn target(&self) -> Option<&AttachmentPair> {
        self.target.as_ref()
    }

    pub fn target_mut(&mut self) -> Option<&mut AttachmentPair> {
        self.target.as_mut()
    }

    pub fn sampler(&self) -> SamplerKey {
        self.sampler.unwrap_or_default()
    }

    /// Destroy the sampler and both images (idempotent)
    pub fn cleanup(&mut self, device: &mut dyn GraphicsDevice) {
        if let Some(sampler) = self.sampler.take() {
            device.destroy_sampler(sampler);
        }
        if let Some(target) = self.target.take() {
            target.destroy(device);
        }
    }
}

#[cfg(test)]
#[path = "hdr_manager_tests.rs"]
mod tests;
