//! Depth attachment and its depth resolve target.
//!
//! The multisampled depth image and the single-sample resolve image are
//! separate images with separate allocations; the resolve image is what the
//! lighting pass samples.

use crate::engine_debug;
use crate::error::{Error, Result};
use crate::graphics_device::{ClearValue, Extent2D, Format, GraphicsDevice, SampleCount};
use crate::renderer::attachment::AttachmentPair;

pub const DEPTH_CLEAR: ClearValue = ClearValue::DepthStencil { depth: 1.0, stencil: 0 };

#[derive(Default)]
pub struct DepthBuffer {
    depth: Option<AttachmentPair>,
}

impl DepthBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create both depth images in the device's depth format
    pub fn create(
        &mut self,
        device: &mut dyn GraphicsDevice,
        extent: Extent2D,
        samples: SampleCount,
    ) -> Result<()> {
        if self.depth.is_some() {
            return Err(Error::InvalidResource("depth buffer already created".to_string()));
        }
        let format = device.depth_format();
        self.depth = Some(AttachmentPair::new(device, "depth", format, extent, samples)?);
        engine_debug!("lumen::DepthBuffer", "Depth buffer created ({:?})", format);
        Ok(())
    }

    pub fn attachment(&self) -> Option<&AttachmentPair> {
        self.depth.as_ref()
    }

    pub fn attachment_mut(&mut self) -> Option<&mut AttachmentPair> {
        self.depth.as_mut()
    }

    /// Format in use, `Undefined` when not created
    pub fn format(&self) -> Format {
        self.depth.as_ref().map(|d| d.format()).unwrap_or(Format::Undefined)
    }

    pub fn cleanup(&mut self, device: &mut dyn GraphicsDevice) {
        if let Some(depth) = self.depth.take() {
            depth.destroy(device);
        }
    }
}

#[cfg(test)]
#[path = "depth_buffer_tests.rs"]
mod tests;
