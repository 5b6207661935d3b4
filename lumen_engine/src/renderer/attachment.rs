//! Multisampled attachment with its single-sample resolve target
//!
//! Shared by the G-buffer, HDR and depth managers. Both images are created
//! at the same extent and format; the resolve image is sampled by later
//! passes, the multisampled one is only ever rendered to.

use crate::error::Result;
use crate::graphics_device::{
    Extent2D, Format, GraphicsDevice, ImageDesc, ImageUsage, SampleCount,
};
use crate::resource::TrackedImage;

pub struct AttachmentPair {
    msaa: TrackedImage,
    resolve: TrackedImage,
}

impl AttachmentPair {
    /// Create both images; on failure nothing is left allocated
    pub fn new(
        device: &mut dyn GraphicsDevice,
        name: &str,
        format: Format,
        extent: Extent2D,
        samples: SampleCount,
    ) -> Result<Self> {
        let attachment_usage = if format.is_depth() {
            ImageUsage::DEPTH_STENCIL_ATTACHMENT
        } else {
            ImageUsage::COLOR_ATTACHMENT
        };

        let msaa = device.create_image(&ImageDesc {
            name: format!("{}_msaa", name),
            extent,
            format,
            mip_levels: 1,
            samples,
            usage: attachment_usage,
        })?;

        let resolve = match device.create_image(&ImageDesc {
            name: format!("{}_resolve", name),
            extent,
            format,
            mip_levels: 1,
            samples: SampleCount::S1,
            usage: attachment_usage | ImageUsage::SAMPLED,
        }) {
            Ok(image) => image,
            Err(e) => {
                device.destroy_image(msaa);
                return Err(e);
            }
        };

        Ok(Self {
            msaa: TrackedImage::new(msaa, format, 1),
            resolve: TrackedImage::new(resolve, format, 1),
        })
    }

    pub fn msaa(&self) -> &TrackedImage {
        &self.msaa
    }

    pub fn resolve(&self) -> &TrackedImage {
        &self.resolve
    }

    pub fn msaa_mut(&mut self) -> &mut TrackedImage {
        &mut self.msaa
    }

    pub fn resolve_mut(&mut self) -> &mut TrackedImage {
        &mut self.resolve
    }

    pub fn format(&self) -> Format {
        self.msaa.format()
    }

    /// Destroy the resolve image, then the multisampled one
    pub fn destroy(self, device: &mut dyn GraphicsDevice) {
        device.destroy_image(self.resolve.image());
        device.destroy_image(self.msaa.image());
    }
}
