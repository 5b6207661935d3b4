//! Per-slot synchronization objects.
//!
//! Each frame slot owns a command buffer, an "image available" semaphore, a
//! "render finished" semaphore and an "in flight" fence. Fences are created
//! signaled so the first wait on every slot returns immediately.

use crate::engine_debug;
use crate::error::{Error, Result};
use crate::graphics_device::{CommandBufferKey, FenceKey, GraphicsDevice, SemaphoreKey};

/// Objects owned by one frame slot
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameSlot {
    pub command_buffer: CommandBufferKey,
    pub image_available: SemaphoreKey,
    pub render_finished: SemaphoreKey,
    pub in_flight: FenceKey,
}

impl FrameSlot {
    fn create(device: &mut dyn GraphicsDevice) -> Result<Self> {
        let mut slot = FrameSlot::default();
        if let Err(e) = slot.fill(device) {
            slot.destroy(device);
            return Err(e);
        }
        Ok(slot)
    }

    fn fill(&mut self, device: &mut dyn GraphicsDevice) -> Result<()> {
        self.command_buffer = device.allocate_command_buffer()?;
        self.image_available = device.create_semaphore()?;
        self.render_finished = device.create_semaphore()?;
        self.in_flight = device.create_fence(true)?;
        Ok(())
    }

    fn destroy(self, device: &mut dyn GraphicsDevice) {
        device.destroy_fence(self.in_flight);
        device.destroy_semaphore(self.render_finished);
        device.destroy_semaphore(self.image_available);
        device.free_command_buffer(self.command_buffer);
    }
}

/// All frame slots plus the rotating current-slot index
pub struct FrameSync {
    slots: Vec<FrameSlot>,
    current: usize,
}

impl FrameSync {
    /// Create `frames_in_flight` slots
    pub fn new(device: &mut dyn GraphicsDevice, frames_in_flight: usize) -> Result<Self> {
        if frames_in_flight == 0 {
            return Err(Error::InvalidConfig("frames in flight must be at least 1".to_string()));
        }
        let mut sync = Self { slots: Vec::with_capacity(frames_in_flight), current: 0 };
        for _ in 0..frames_in_flight {
            match FrameSlot::create(device) {
                Ok(slot) => sync.slots.push(slot),
                Err(e) => {
                    sync.cleanup(device);
                    return Err(e);
                }
            }
        }
        engine_debug!("lumen::FrameSync", "Created {} frame slots", frames_in_flight);
        Ok(sync)
    }

    pub fn frames_in_flight(&self) -> usize {
        self.slots.len()
    }

    /// Index of the slot the next frame uses
    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current(&self) -> Option<FrameSlot> {
        self.slots.get(self.current).copied()
    }

    pub fn slot(&self, index: usize) -> Option<FrameSlot> {
        self.slots.get(index).copied()
    }

    /// Move to the next slot, wrapping around
    pub fn advance(&mut self) {
        if !self.slots.is_empty() {
            self.current = (self.current + 1) % self.slots.len();
        }
    }

    /// Destroy all slots (idempotent)
    pub fn cleanup(&mut self, device: &mut dyn GraphicsDevice) {
        while let Some(slot) = self.slots.pop() {
            slot.destroy(device);
        }
        self.current = 0;
    }
}

#[cfg(test)]
#[path = "frame_sync_tests.rs"]
mod tests;
