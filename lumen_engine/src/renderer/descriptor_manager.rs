//! Descriptor pool, set layouts and batched set writes.
//!
//! The manager owns exactly one pool. Set layouts it creates are owned by the
//! caller. Sets are bound to their resources once, when allocated: a set
//! that must point at different resources is freed and reallocated.

use rustc_hash::FxHashSet;
use slotmap::Key;

use crate::error::{Error, Result};
use crate::graphics_device::{
    BufferKey, DescriptorPoolFlags, DescriptorPoolKey, DescriptorPoolSize, DescriptorSetKey,
    DescriptorSetLayoutBinding, DescriptorSetLayoutKey, DescriptorWrite, GraphicsDevice,
    ImageKey, ImageLayout, SamplerKey,
};
use crate::{engine_bail, engine_debug, engine_error, engine_warn};

// ============================================================================
// BINDINGS
// ============================================================================

/// A uniform buffer range bound at `binding`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BufferBinding {
    pub binding: u32,
    pub buffer: BufferKey,
    pub offset: u64,
    pub range: u64,
}

/// A combined image sampler bound at `binding`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageBinding {
    pub binding: u32,
    pub image: ImageKey,
    pub sampler: SamplerKey,
    pub layout: ImageLayout,
}

/// What one descriptor set should reference
pub type SetBindings = (Vec<BufferBinding>, Vec<ImageBinding>);

// ============================================================================
// DESCRIPTOR MANAGER
// ============================================================================

#[derive(Default)]
pub struct DescriptorManager {
    pool: Option<DescriptorPoolKey>,
}

impl DescriptorManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the pool
    ///
    /// # Errors
    ///
    /// Fails if a pool already exists, if `sizes` is empty or `max_sets` is
    /// zero, or if the device refuses the pool.
    pub fn create_descriptor_pool(
        &mut self,
        device: &mut dyn GraphicsDevice,
        sizes: &[DescriptorPoolSize],
        max_sets: u32,
        flags: DescriptorPoolFlags,
    ) -> Result<()> {
        if self.pool.is_some() {
            engine_bail!("lumen::DescriptorManager", "Descriptor pool already created");
        }
        if sizes.is_empty() || max_sets == 0 {
            engine_bail!(
                "lumen::DescriptorManager",
                "Invalid pool parameters: {} pool sizes, max_sets = {}",
                sizes.len(),
                max_sets
            );
        }

        let pool = device.create_descriptor_pool(sizes, max_sets, flags).map_err(|e| {
            engine_error!("lumen::DescriptorManager", "Failed to create descriptor pool: {}", e);
            e
        })?;
        self.pool = Some(pool);

        engine_debug!(
            "lumen::DescriptorManager",
            "Descriptor pool created ({} sizes, {} max sets)",
            sizes.len(),
            max_sets
        );
        Ok(())
    }

    /// Create a set layout; the caller owns the returned key
    pub fn create_descriptor_set_layout(
        &self,
        device: &mut dyn GraphicsDevice,
        bindings: &[DescriptorSetLayoutBinding],
    ) -> Result<DescriptorSetLayoutKey> {
        if bindings.is_empty() {
            engine_bail!("lumen::DescriptorManager", "Descriptor set layout needs at least one binding");
        }
        let mut seen = FxHashSet::default();
        if let Some(dup) = bindings.iter().find(|b| !seen.insert(b.binding)) {
            engine_bail!(
                "lumen::DescriptorManager",
                "Binding {} declared twice in descriptor set layout",
                dup.binding
            );
        }
        device.create_descriptor_set_layout(bindings)
    }

    /// Allocate `count` sets of `layout` and write each one
    ///
    /// `provider` is called once per set index and returns the buffers and
    /// images that set references. Bindings with a null resource are skipped
    /// with a warning; all remaining writes of a set go out in one update.
    ///
    /// # Errors
    ///
    /// `Error::DescriptorPoolExhausted` when the pool has no room left. Any
    /// other failure is returned as is.
    pub fn allocate_and_write_descriptor_sets<F>(
        &self,
        device: &mut dyn GraphicsDevice,
        layout: DescriptorSetLayoutKey,
        count: u32,
        provider: F,
    ) -> Result<Vec<DescriptorSetKey>>
    where
        F: Fn(u32) -> SetBindings,
    {
        let Some(pool) = self.pool else {
            engine_bail!("lumen::DescriptorManager", "Descriptor pool not created");
        };
        if layout.is_null() {
            return Err(Error::InvalidResource("descriptor set layout is null".to_string()));
        }
        if count == 0 {
            return Ok(Vec::new());
        }

        let sets = device
            .allocate_descriptor_sets(pool, layout, count)
            .map_err(|e| {
                match &e {
                    Error::DescriptorPoolExhausted(reason) => engine_error!(
                        "lumen::DescriptorManager",
                        "Descriptor pool exhausted allocating {} sets: {}",
                        count,
                        reason
                    ),
                    other => engine_error!(
                        "lumen::DescriptorManager",
                        "Failed to allocate {} descriptor sets: {}",
                        count,
                        other
                    ),
                }
                e
            })?;

        for (index, set) in sets.iter().enumerate() {
            let (buffers, images) = provider(index as u32);
            let writes = build_writes(index, &buffers, &images);
            if let Err(e) = device.update_descriptor_set(*set, &writes) {
                // Hand the sets back before failing
                if let Err(free_error) = device.free_descriptor_sets(pool, &sets) {
                    engine_warn!(
                        "lumen::DescriptorManager",
                        "Failed to free {} descriptor sets after a write error: {}",
                        sets.len(),
                        free_error
                    );
                }
                return Err(e);
            }
        }

        Ok(sets)
    }

    /// Return sets to the pool and clear the caller's list
    pub fn free_descriptor_sets(
        &self,
        device: &mut dyn GraphicsDevice,
        sets: &mut Vec<DescriptorSetKey>,
    ) -> Result<()> {
        if sets.is_empty() {
            return Ok(());
        }
        let Some(pool) = self.pool else {
            sets.clear();
            return Ok(());
        };
        let result = device.free_descriptor_sets(pool, sets);
        sets.clear();
        result
    }

    /// The pool (null key when not created)
    pub fn pool(&self) -> DescriptorPoolKey {
        self.pool.unwrap_or_default()
    }

    /// Destroy the pool and, with it, every set allocated from it
    pub fn cleanup(&mut self, device: &mut dyn GraphicsDevice) {
        if let Some(pool) = self.pool.take() {
            device.destroy_descriptor_pool(pool);
        }
    }
}

fn build_writes(
    set_index: usize,
    buffers: &[BufferBinding],
    images: &[ImageBinding],
) -> Vec<DescriptorWrite> {
    let mut writes = Vec::with_capacity(buffers.len() + images.len());

    for b in buffers {
        if b.buffer.is_null() {
            engine_warn!(
                "lumen::DescriptorManager",
                "Set {}: skipping binding {} (null buffer)",
                set_index,
                b.binding
            );
            continue;
        }
        writes.push(DescriptorWrite::UniformBuffer {
            binding: b.binding,
            buffer: b.buffer,
            offset: b.offset,
            range: b.range,
        });
    }

    for i in images {
        if i.image.is_null() || i.sampler.is_null() {
            engine_warn!(
                "lumen::DescriptorManager",
                "Set {}: skipping binding {} (null image view or sampler)",
                set_index,
                i.binding
            );
            continue;
        }
        writes.push(DescriptorWrite::CombinedImageSampler {
            binding: i.binding,
            array_element: 0,
            image: i.image,
            sampler: i.sampler,
            layout: i.layout,
        });
    }

    writes
}

#[cfg(test)]
#[path = "descriptor_manager_tests.rs"]
mod tests;
