//! Per-frame uniform buffers.
//!
//! One camera, one model and one scene-lighting buffer per frame slot, all
//! host-visible and persistently mapped. Updates are plain byte copies into
//! the slot's buffer; the slot's fence guarantees the GPU is done with it.

use bytemuck::Pod;

use crate::error::{Error, Result};
use crate::graphics_device::{BufferDesc, BufferKey, BufferUsage, GraphicsDevice, MemoryLocation};
use crate::resource::gpu_data::{CameraUbo, ModelUbo, SceneLightingUbo};

pub struct UniformBufferSet {
    camera: Vec<BufferKey>,
    model: Vec<BufferKey>,
    lighting: Vec<BufferKey>,
}

impl UniformBufferSet {
    /// Create `frames` instances of each block
    pub fn new(device: &mut dyn GraphicsDevice, frames: usize) -> Result<Self> {
        let mut set = Self { camera: Vec::new(), model: Vec::new(), lighting: Vec::new() };
        if let Err(e) = set.create_all(device, frames) {
            set.cleanup(device);
            return Err(e);
        }
        Ok(set)
    }

    fn create_all(&mut self, device: &mut dyn GraphicsDevice, frames: usize) -> Result<()> {
        for frame in 0..frames {
            self.camera.push(create::<CameraUbo>(device, "camera_ubo", frame)?);
            self.model.push(create::<ModelUbo>(device, "model_ubo", frame)?);
            self.lighting.push(create::<SceneLightingUbo>(device, "lighting_ubo", frame)?);
        }
        Ok(())
    }

    pub fn frame_count(&self) -> usize {
        self.camera.len()
    }

    pub fn camera_buffer(&self, frame: usize) -> BufferKey {
        self.camera.get(frame).copied().unwrap_or_default()
    }

    pub fn model_buffer(&self, frame: usize) -> BufferKey {
        self.model.get(frame).copied().unwrap_or_default()
    }

    pub fn lighting_buffer(&self, frame: usize) -> BufferKey {
        self.lighting.get(frame).copied().unwrap_or_default()
    }

    pub fn update_camera(
        &self,
        device: &mut dyn GraphicsDevice,
        frame: usize,
        data: &CameraUbo,
    ) -> Result<()> {
        write(device, &self.camera, frame, data)
    }

    pub fn update_model(
        &self,
        device: &mut dyn GraphicsDevice,
        frame: usize,
        data: &ModelUbo,
    ) -> Result<()> {
        write(device, &self.model, frame, data)
    }

    pub fn update_lighting(
        &self,
        device: &mut dyn GraphicsDevice,
        frame: usize,
        data: &SceneLightingUbo,
    ) -> Result<()> {
        write(device, &self.lighting, frame, data)
    }

    /// Destroy every buffer (safe to call more than once)
    pub fn cleanup(&mut self, device: &mut dyn GraphicsDevice) {
        for buffer in self
            .lighting
            .drain(..)
            .chain(self.model.drain(..))
            .chain(self.camera.drain(..))
        {
            device.destroy_buffer(buffer);
        }
    }
}

fn create<T: Pod>(device: &mut dyn GraphicsDevice, name: &str, frame: usize) -> Result<BufferKey> {
    device.create_buffer(&BufferDesc {
        name: format!("{}_{}", name, frame),
        size: std::mem::size_of::<T>() as u64,
        usage: BufferUsage::UNIFORM,
        location: MemoryLocation::CpuToGpu,
    })
}

fn write<T: Pod>(
    device: &mut dyn GraphicsDevice,
    buffers: &[BufferKey],
    frame: usize,
    data: &T,
) -> Result<()> {
    let buffer = buffers.get(frame).copied().ok_or_else(|| {
        Error::InvalidResource(format!(
            "frame {} out of range ({} uniform buffers)",
            frame,
            buffers.len()
        ))
    })?;
    device.write_buffer(buffer, 0, bytemuck::bytes_of(data))
}

#[cfg(test)]
#[path = "uniform_buffer_tests.rs"]
mod tests;
