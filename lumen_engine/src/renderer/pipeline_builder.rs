//! Graphics pipeline construction and the on-disk pipeline cache.
//!
//! Pipelines are built for dynamic rendering: attachments are described by
//! format in the `PipelineConfig`, never by a render pass object.

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::graphics_device::{
    ColorBlendAttachment, CompareOp, CullMode, DynamicState, Format, FrontFace, GraphicsDevice,
    GraphicsPipelineDesc, PipelineCacheKey, PipelineConfig, PipelineKey, PipelineLayoutDesc,
    PipelineLayoutKey, PolygonMode, PrimitiveTopology, PushConstantRange, SampleCount,
    ShaderModuleKey, ShaderStages, DescriptorSetLayoutKey,
};
use crate::{engine_bail, engine_debug, engine_error, engine_info, engine_warn};
use slotmap::Key;

/// Minimum fraction of samples shaded when sample-rate shading is on
const MIN_SAMPLE_SHADING: f32 = 0.2;

/// Complete fixed-function state with the usual defaults
///
/// Triangle lists, dynamic viewport and scissor, filled polygons with back
/// face culling and counter-clockwise front faces, opaque blending on every
/// color attachment, depth test and write with `LessOrEqual`. Sample-rate
/// shading is enabled whenever more than one sample is used. No stencil
/// attachment is declared; combined depth-stencil formats are only bound as
/// the depth attachment.
pub fn default_pipeline_config(
    color_formats: &[Format],
    samples: SampleCount,
    depth_format: Format,
) -> PipelineConfig {
    PipelineConfig {
        topology: PrimitiveTopology::TriangleList,
        primitive_restart: false,
        viewport_count: 1,
        scissor_count: 1,
        polygon_mode: PolygonMode::Fill,
        cull_mode: CullMode::Back,
        front_face: FrontFace::CounterClockwise,
        line_width: 1.0,
        depth_clamp: false,
        samples,
        sample_shading: samples != SampleCount::S1,
        min_sample_shading: MIN_SAMPLE_SHADING,
        color_blend_attachments: vec![ColorBlendAttachment::OPAQUE; color_formats.len()],
        depth_test: true,
        depth_write: true,
        depth_compare: CompareOp::LessOrEqual,
        dynamic_states: vec![DynamicState::Viewport, DynamicState::Scissor],
        vertex_bindings: Vec::new(),
        vertex_attributes: Vec::new(),
        color_attachment_formats: color_formats.to_vec(),
        depth_attachment_format: depth_format,
        stencil_attachment_format: Format::Undefined,
    }
}

/// Read a compiled SPIR-V file into 32-bit words
///
/// # Errors
///
/// Fails if the file cannot be read, is empty, or its size is not a
/// multiple of 4 bytes.
pub fn load_shader_code(path: &Path) -> Result<Vec<u32>> {
    let bytes = std::fs::read(path).map_err(|e| {
        Error::InvalidResource(format!("cannot read shader '{}': {}", path.display(), e))
    })?;
    if bytes.is_empty() || bytes.len() % 4 != 0 {
        return Err(Error::InvalidResource(format!(
            "shader '{}' is {} bytes, not a whole number of SPIR-V words",
            path.display(),
            bytes.len()
        )));
    }
    Ok(bytes
        .chunks_exact(4)
        .map(|w| u32::from_le_bytes([w[0], w[1], w[2], w[3]]))
        .collect())
}

// ============================================================================
// GRAPHICS PIPELINE
// ============================================================================

/// A compiled pipeline together with its layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GraphicsPipeline {
    pub pipeline: PipelineKey,
    pub layout: PipelineLayoutKey,
}

impl GraphicsPipeline {
    pub fn destroy(self, device: &mut dyn GraphicsDevice) {
        device.destroy_pipeline(self.pipeline);
        device.destroy_pipeline_layout(self.layout);
    }
}

/// Shader pair and layout inputs for one pipeline
#[derive(Debug, Clone)]
pub struct PipelineShaders<'a> {
    pub vertex_path: &'a Path,
    pub fragment_path: &'a Path,
    pub set_layout: DescriptorSetLayoutKey,
    /// Stages that see the push-constant block
    pub push_stages: ShaderStages,
}

// ============================================================================
// PIPELINE BUILDER
// ============================================================================

pub struct PipelineBuilder {
    cache_path: PathBuf,
    cache: Option<PipelineCacheKey>,
}

impl PipelineBuilder {
    pub fn new(cache_path: impl Into<PathBuf>) -> Self {
        Self { cache_path: cache_path.into(), cache: None }
    }

    pub fn cache_path(&self) -> &Path {
        &self.cache_path
    }

    /// The pipeline cache (null key when not created)
    pub fn cache(&self) -> PipelineCacheKey {
        self.cache.unwrap_or_default()
    }

    /// Create the pipeline cache, seeded from disk when possible
    ///
    /// A missing or unreadable file, or data the device rejects, falls back
    /// to an empty cache.
    pub fn create_pipeline_cache(&mut self, device: &mut dyn GraphicsDevice) -> Result<()> {
        if self.cache.is_some() {
            return Ok(());
        }

        let initial = match std::fs::read(&self.cache_path) {
            Ok(bytes) => bytes,
            Err(e) => {
                engine_warn!(
                    "lumen::PipelineBuilder",
                    "No pipeline cache at '{}' ({}), starting empty",
                    self.cache_path.display(),
                    e
                );
                Vec::new()
            }
        };

        let cache = if initial.is_empty() {
            device.create_pipeline_cache(&[])?
        } else {
            match device.create_pipeline_cache(&initial) {
                Ok(cache) => {
                    engine_info!(
                        "lumen::PipelineBuilder",
                        "Loaded pipeline cache ({} bytes)",
                        initial.len()
                    );
                    cache
                }
                Err(e) => {
                    engine_warn!(
                        "lumen::PipelineBuilder",
                        "Pipeline cache data rejected ({}), starting empty",
                        e
                    );
                    device.create_pipeline_cache(&[])?
                }
            }
        };

        self.cache = Some(cache);
        Ok(())
    }

    /// Compile a graphics pipeline whose push-constant block has the size of `T`
    ///
    /// A zero-sized `T` (such as `()`) means no push constants. Shader
    /// modules are destroyed whatever the outcome; the layout is destroyed
    /// if the pipeline itself fails.
    ///
    /// # Errors
    ///
    /// Fails on empty shader paths, a null set layout, unreadable or
    /// misaligned shader files, or any device failure.
    pub fn create_graphics_pipeline<T>(
        &self,
        device: &mut dyn GraphicsDevice,
        shaders: &PipelineShaders,
        config: &PipelineConfig,
    ) -> Result<GraphicsPipeline> {
        if shaders.vertex_path.as_os_str().is_empty()
            || shaders.fragment_path.as_os_str().is_empty()
        {
            engine_bail!("lumen::PipelineBuilder", "Shader paths must not be empty");
        }
        if shaders.set_layout.is_null() {
            engine_bail!("lumen::PipelineBuilder", "Descriptor set layout is null");
        }

        let vertex_code = load_shader_code(shaders.vertex_path)?;
        let fragment_code = load_shader_code(shaders.fragment_path)?;

        let vertex_module = device.create_shader_module(&vertex_code)?;
        let fragment_module = match device.create_shader_module(&fragment_code) {
            Ok(module) => module,
            Err(e) => {
                device.destroy_shader_module(vertex_module);
                return Err(e);
            }
        };

        let size = std::mem::size_of::<T>() as u32;
        let push_constant = (size > 0).then_some(PushConstantRange {
            stages: shaders.push_stages,
            offset: 0,
            size,
        });
        let set_layouts = [shaders.set_layout];

        let result = self.link(
            device,
            vertex_module,
            fragment_module,
            &set_layouts,
            push_constant,
            config,
        );

        device.destroy_shader_module(fragment_module);
        device.destroy_shader_module(vertex_module);

        match &result {
            Ok(_) => engine_debug!(
                "lumen::PipelineBuilder",
                "Pipeline created from '{}' + '{}'",
                shaders.vertex_path.display(),
                shaders.fragment_path.display()
            ),
            Err(e) => engine_error!(
                "lumen::PipelineBuilder",
                "Pipeline creation failed for '{}': {}",
                shaders.vertex_path.display(),
                e
            ),
        }
        result
    }

    fn link(
        &self,
        device: &mut dyn GraphicsDevice,
        vertex_shader: ShaderModuleKey,
        fragment_shader: ShaderModuleKey,
        set_layouts: &[DescriptorSetLayoutKey],
        push_constant: Option<PushConstantRange>,
        config: &PipelineConfig,
    ) -> Result<GraphicsPipeline> {
        let layout =
            device.create_pipeline_layout(&PipelineLayoutDesc { set_layouts, push_constant })?;
        let created = device.create_graphics_pipeline(&GraphicsPipelineDesc {
            vertex_shader,
            fragment_shader,
            entry_point: "main",
            layout,
            cache: self.cache(),
            config,
        });
        match created {
            Ok(pipeline) => Ok(GraphicsPipeline { pipeline, layout }),
            Err(e) => {
                device.destroy_pipeline_layout(layout);
                Err(e)
            }
        }
    }

    /// Write the cache contents to disk
    pub fn save_pipeline_cache(&self, device: &dyn GraphicsDevice) -> Result<()> {
        let Some(cache) = self.cache else {
            return Ok(());
        };
        let data = device.pipeline_cache_data(cache)?;
        std::fs::write(&self.cache_path, &data).map_err(|e| {
            Error::BackendError(format!(
                "cannot write pipeline cache '{}': {}",
                self.cache_path.display(),
                e
            ))
        })?;
        engine_debug!("lumen::PipelineBuilder", "Saved pipeline cache ({} bytes)", data.len());
        Ok(())
    }

    /// Persist the cache, then destroy it (idempotent)
    pub fn cleanup(&mut self, device: &mut dyn GraphicsDevice) {
        if let Err(e) = self.save_pipeline_cache(device) {
            engine_warn!("lumen::PipelineBuilder", "{}", e);
        }
        if let Some(cache) = self.cache.take() {
            device.destroy_pipeline_cache(cache);
        }
    }
}

#[cfg(test)]
#[path = "pipeline_builder_tests.rs"]
mod tests;
