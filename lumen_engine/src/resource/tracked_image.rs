//! Image-layout state machine
//!
//! Every attachment the frame engine transitions is wrapped in a
//! `TrackedImage`. The current layout lives next to the handle and is only
//! changed by `transition`, in the same call that records the barrier, so the
//! barrier's old layout is always the tracked one.

use crate::error::{Error, Result};
use crate::graphics_device::{
    AccessFlags, CommandBufferKey, Format, GraphicsDevice, ImageBarrier, ImageKey, ImageLayout,
    PipelineStages,
};

/// Access masks and pipeline stages for one layout transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionMasks {
    pub src_access: AccessFlags,
    pub dst_access: AccessFlags,
    pub src_stage: PipelineStages,
    pub dst_stage: PipelineStages,
}

const fn masks(
    src_access: AccessFlags,
    src_stage: PipelineStages,
    dst_access: AccessFlags,
    dst_stage: PipelineStages,
) -> TransitionMasks {
    TransitionMasks { src_access, dst_access, src_stage, dst_stage }
}

/// Look up the barrier definition for `from -> to`
///
/// # Errors
///
/// `Error::UnsupportedLayoutTransition` for pairs outside the table,
/// including same-layout pairs (callers filter those out first).
pub fn transition_masks(from: ImageLayout, to: ImageLayout) -> Result<TransitionMasks> {
    use ImageLayout::*;

    let none = AccessFlags::empty();
    let color_write = AccessFlags::COLOR_ATTACHMENT_READ | AccessFlags::COLOR_ATTACHMENT_WRITE;
    let depth_rw = AccessFlags::DEPTH_STENCIL_ATTACHMENT_READ
        | AccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE;
    let depth_tests = PipelineStages::EARLY_FRAGMENT_TESTS | PipelineStages::LATE_FRAGMENT_TESTS;
    // Depth resolves are performed in the color-attachment-output stage.
    let depth_resolved = AccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE | AccessFlags::COLOR_ATTACHMENT_WRITE;
    let depth_resolve_stages =
        PipelineStages::LATE_FRAGMENT_TESTS | PipelineStages::COLOR_ATTACHMENT_OUTPUT;

    let found = match (from, to) {
        (Undefined, ColorAttachment) => Some(masks(
            none, PipelineStages::TOP_OF_PIPE,
            color_write, PipelineStages::COLOR_ATTACHMENT_OUTPUT,
        )),
        (Undefined, DepthAttachment) => Some(masks(
            none, PipelineStages::TOP_OF_PIPE,
            depth_rw, depth_tests,
        )),
        (Undefined, TransferDst) => Some(masks(
            none, PipelineStages::TOP_OF_PIPE,
            AccessFlags::TRANSFER_WRITE, PipelineStages::TRANSFER,
        )),
        (Undefined, ShaderReadOnly) => Some(masks(
            none, PipelineStages::TOP_OF_PIPE,
            AccessFlags::SHADER_READ, PipelineStages::FRAGMENT_SHADER,
        )),
        (ColorAttachment, ShaderReadOnly) => Some(masks(
            AccessFlags::COLOR_ATTACHMENT_WRITE, PipelineStages::COLOR_ATTACHMENT_OUTPUT,
            AccessFlags::SHADER_READ, PipelineStages::FRAGMENT_SHADER,
        )),
        (ColorAttachment, PresentSrc) => Some(masks(
            AccessFlags::COLOR_ATTACHMENT_WRITE, PipelineStages::COLOR_ATTACHMENT_OUTPUT,
            none, PipelineStages::BOTTOM_OF_PIPE,
        )),
        (ColorAttachment, TransferSrc) => Some(masks(
            AccessFlags::COLOR_ATTACHMENT_WRITE, PipelineStages::COLOR_ATTACHMENT_OUTPUT,
            AccessFlags::TRANSFER_READ, PipelineStages::TRANSFER,
        )),
        (ShaderReadOnly, ColorAttachment) => Some(masks(
            AccessFlags::SHADER_READ, PipelineStages::FRAGMENT_SHADER,
            color_write, PipelineStages::COLOR_ATTACHMENT_OUTPUT,
        )),
        (ShaderReadOnly, TransferDst) => Some(masks(
            AccessFlags::SHADER_READ, PipelineStages::FRAGMENT_SHADER,
            AccessFlags::TRANSFER_WRITE, PipelineStages::TRANSFER,
        )),
        (DepthAttachment, DepthReadOnly) | (DepthAttachment, ShaderReadOnly) => Some(masks(
            depth_resolved, depth_resolve_stages,
            AccessFlags::SHADER_READ, PipelineStages::FRAGMENT_SHADER,
        )),
        (DepthReadOnly, DepthAttachment) => Some(masks(
            AccessFlags::SHADER_READ, PipelineStages::FRAGMENT_SHADER,
            depth_rw | AccessFlags::COLOR_ATTACHMENT_WRITE,
            depth_tests | PipelineStages::COLOR_ATTACHMENT_OUTPUT,
        )),
        (TransferDst, TransferSrc) => Some(masks(
            AccessFlags::TRANSFER_WRITE, PipelineStages::TRANSFER,
            AccessFlags::TRANSFER_READ, PipelineStages::TRANSFER,
        )),
        (TransferDst, ShaderReadOnly) => Some(masks(
            AccessFlags::TRANSFER_WRITE, PipelineStages::TRANSFER,
            AccessFlags::SHADER_READ, PipelineStages::FRAGMENT_SHADER,
        )),
        (TransferSrc, ShaderReadOnly) => Some(masks(
            AccessFlags::TRANSFER_READ, PipelineStages::TRANSFER,
            AccessFlags::SHADER_READ, PipelineStages::FRAGMENT_SHADER,
        )),
        (PresentSrc, ColorAttachment) => Some(masks(
            none, PipelineStages::COLOR_ATTACHMENT_OUTPUT,
            color_write, PipelineStages::COLOR_ATTACHMENT_OUTPUT,
        )),
        _ => None,
    };

    found.ok_or(Error::UnsupportedLayoutTransition { from, to })
}

/// An image handle paired with its tracked layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackedImage {
    image: ImageKey,
    format: Format,
    mip_levels: u32,
    layout: ImageLayout,
}

impl TrackedImage {
    /// Track a freshly created image (layout `Undefined`)
    pub fn new(image: ImageKey, format: Format, mip_levels: u32) -> Self {
        Self { image, format, mip_levels, layout: ImageLayout::Undefined }
    }

    pub fn image(&self) -> ImageKey {
        self.image
    }

    pub fn format(&self) -> Format {
        self.format
    }

    pub fn mip_levels(&self) -> u32 {
        self.mip_levels
    }

    /// Current tracked layout
    pub fn layout(&self) -> ImageLayout {
        self.layout
    }

    /// Build the barrier that moves this image to `new_layout`
    ///
    /// Returns `Ok(None)` when the image is already in `new_layout`.
    pub fn barrier_to(&self, new_layout: ImageLayout) -> Result<Option<ImageBarrier>> {
        if self.layout == new_layout {
            return Ok(None);
        }
        let m = transition_masks(self.layout, new_layout)?;
        Ok(Some(ImageBarrier {
            image: self.image,
            aspect: self.format.barrier_aspect(),
            mip_levels: self.mip_levels,
            old_layout: self.layout,
            new_layout,
            src_access: m.src_access,
            dst_access: m.dst_access,
            src_stage: m.src_stage,
            dst_stage: m.dst_stage,
        }))
    }

    /// Record the transition into `cmd` and update the tracked layout
    ///
    /// The tracked layout only changes if the barrier was recorded.
    pub fn transition(
        &mut self,
        device: &mut dyn GraphicsDevice,
        cmd: CommandBufferKey,
        new_layout: ImageLayout,
    ) -> Result<()> {
        if let Some(barrier) = self.barrier_to(new_layout)? {
            device.cmd_image_barrier(cmd, &barrier)?;
            self.layout = new_layout;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "tracked_image_tests.rs"]
mod tests;
