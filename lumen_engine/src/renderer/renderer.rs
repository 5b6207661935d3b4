//! Deferred frame orchestrator.
//!
//! The `Renderer` owns every GPU-side manager and drives one frame slot at
//! a time through a fixed protocol:
//!
//! 1. wait on the slot's in-flight fence
//! 2. acquire a swapchain image (out of date: rebuild and skip the frame)
//! 3. reset the fence and write the slot's uniform buffers
//! 4. record the geometry, lighting and tonemap passes
//! 5. submit, present (stale: rebuild after presenting)
//! 6. advance to the next slot, whatever happened above
//!
//! Every image the passes touch is a `TrackedImage`; barriers are always
//! built from the tracked layout so old and current layouts never diverge.

use std::mem::size_of;

use glam::Vec2;

use crate::camera::FlyCamera;
use crate::config::RendererConfig;
use crate::error::{Error, Result};
use crate::graphics_device::{
    AcquireOutcome, BufferKey, ClearValue, CommandBufferKey, CullMode, DescriptorPoolFlags,
    DescriptorPoolSize, DescriptorSetKey, DescriptorSetLayoutBinding, DescriptorSetLayoutKey,
    DescriptorType, Extent2D, Format, GraphicsDevice, ImageLayout, PipelineConfig,
    PresentOutcome, Rect2D, RenderingAttachment, RenderingInfo, ResolveMode, ResolveTarget,
    SampleCount, ShaderStages, Viewport,
};
use crate::renderer::depth_buffer::{DepthBuffer, DEPTH_CLEAR};
use crate::renderer::descriptor_manager::{BufferBinding, DescriptorManager, ImageBinding, SetBindings};
use crate::renderer::frame_sync::{FrameSlot, FrameSync};
use crate::renderer::gbuffer_manager::{GBufferAttachment, GBufferManager};
use crate::renderer::hdr_manager::{HdrManager, HDR_CLEAR, HDR_FORMAT};
use crate::renderer::pipeline_builder::{
    default_pipeline_config, GraphicsPipeline, PipelineBuilder, PipelineShaders,
};
use crate::renderer::swapchain::{wait_for_nonzero_size, SurfaceSizeSource, Swapchain};
use crate::resource::{
    CameraUbo, GeometryPush, Mesh, MeshData, ModelUbo, SceneLightingUbo, ScreenSizePush,
    TextureKind, ToneMapPush, UniformBufferSet, Vertex,
};
use crate::{engine_debug, engine_error, engine_info, engine_warn};

// Global set (one per mesh per frame)
const GLOBAL_CAMERA_BINDING: u32 = 0;
const GLOBAL_MODEL_BINDING: u32 = 1;
const GLOBAL_FIRST_TEXTURE_BINDING: u32 = 2;
const GLOBAL_LIGHTING_BINDING: u32 = 8;

// Lighting set (one per frame)
const LIGHTING_INPUTS: [(u32, GBufferAttachment); 4] = [
    (0, GBufferAttachment::Albedo),
    (1, GBufferAttachment::Ao),
    (2, GBufferAttachment::Normal),
    (3, GBufferAttachment::MetallicRoughness),
];
const LIGHTING_DEPTH_BINDING: u32 = 4;
const LIGHTING_SCENE_BINDING: u32 = 8;
const LIGHTING_CAMERA_BINDING: u32 = 9;

// Tonemap set (one per frame)
const TONEMAP_HDR_BINDING: u32 = 0;

/// Vertices of the full-screen triangle drawn by the lighting and tonemap passes
const FULLSCREEN_VERTICES: u32 = 3;

const SWAPCHAIN_CLEAR: ClearValue = ClearValue::Color([0.0, 0.0, 0.0, 1.0]);

/// Counters for the last recorded frame and the renderer's lifetime
#[derive(Debug, Clone, Copy, Default)]
pub struct RendererStats {
    /// Draw calls recorded in the last frame
    pub draw_calls: u32,
    /// Triangles submitted by the geometry pass in the last frame
    pub triangles: u32,
    /// Frames submitted since creation
    pub frames_rendered: u64,
    /// Completed swapchain rebuilds since creation
    pub swapchain_recreations: u32,
}

pub struct Renderer {
    config: RendererConfig,
    samples: SampleCount,
    lighting_block: SceneLightingUbo,

    swapchain: Swapchain,
    depth: DepthBuffer,
    gbuffer: GBufferManager,
    hdr: HdrManager,
    descriptors: DescriptorManager,
    pipeline_builder: PipelineBuilder,
    uniforms: Option<UniformBufferSet>,
    frames: Option<FrameSync>,
    meshes: Vec<Mesh>,

    global_layout: Option<DescriptorSetLayoutKey>,
    lighting_layout: Option<DescriptorSetLayoutKey>,
    tonemap_layout: Option<DescriptorSetLayoutKey>,

    geometry_pipeline: Option<GraphicsPipeline>,
    lighting_pipeline: Option<GraphicsPipeline>,
    tonemap_pipeline: Option<GraphicsPipeline>,

    /// `global_sets[mesh][frame]`
    global_sets: Vec<Vec<DescriptorSetKey>>,
    lighting_sets: Vec<DescriptorSetKey>,
    tonemap_sets: Vec<DescriptorSetKey>,

    stats: RendererStats,
}

impl Renderer {
    /// Build every resource the three passes need and upload `meshes`
    ///
    /// Blocks until `size_source` reports a non-zero framebuffer.
    ///
    /// # Errors
    ///
    /// Any failure is fatal; whatever was created before it is destroyed.
    /// Closing the window while it is still zero-sized fails with
    /// `Error::InitializationFailed`.
    pub fn new(
        device: &mut dyn GraphicsDevice,
        config: RendererConfig,
        meshes: &[MeshData],
        size_source: &mut dyn SurfaceSizeSource,
    ) -> Result<Self> {
        config.validate()?;

        let mut renderer = Self {
            samples: device.msaa_samples(),
            lighting_block: SceneLightingUbo::new(&config.point_lights, config.directional_light),
            pipeline_builder: PipelineBuilder::new(config.pipeline_cache_path.clone()),
            config,
            swapchain: Swapchain::new(),
            depth: DepthBuffer::new(),
            gbuffer: GBufferManager::new(),
            hdr: HdrManager::new(),
            descriptors: DescriptorManager::new(),
            uniforms: None,
            frames: None,
            meshes: Vec::with_capacity(meshes.len()),
            global_layout: None,
            lighting_layout: None,
            tonemap_layout: None,
            geometry_pipeline: None,
            lighting_pipeline: None,
            tonemap_pipeline: None,
            global_sets: Vec::new(),
            lighting_sets: Vec::new(),
            tonemap_sets: Vec::new(),
            stats: RendererStats::default(),
        };

        if let Err(e) = renderer.initialize(device, meshes, size_source) {
            engine_error!("lumen::Renderer", "Renderer initialization failed: {}", e);
            renderer.cleanup(device);
            return Err(e);
        }
        Ok(renderer)
    }

    fn initialize(
        &mut self,
        device: &mut dyn GraphicsDevice,
        meshes: &[MeshData],
        size_source: &mut dyn SurfaceSizeSource,
    ) -> Result<()> {
        let framebuffer = wait_for_nonzero_size(size_source).ok_or_else(|| {
            Error::InitializationFailed("window closed before the swapchain was created".to_string())
        })?;
        self.swapchain.create_swapchain(device, framebuffer)?;
        self.swapchain.create_image_views(device)?;
        self.swapchain.create_color_resources(device, self.samples)?;

        let extent = self.swapchain.extent();
        self.depth.create(device, extent, self.samples)?;
        self.gbuffer.create_resources(device, extent, self.samples)?;
        self.hdr.create_resources(device, extent, self.samples)?;

        self.uniforms = Some(UniformBufferSet::new(device, self.config.frames_in_flight)?);
        for data in meshes {
            let mesh = Mesh::new(device, data)?;
            self.meshes.push(mesh);
        }

        self.create_descriptor_pool(device)?;
        self.create_set_layouts(device)?;
        self.create_pipelines(device)?;
        self.allocate_global_sets(device)?;
        self.allocate_extent_sets(device)?;

        self.frames = Some(FrameSync::new(device, self.config.frames_in_flight)?);

        engine_info!(
            "lumen::Renderer",
            "Renderer ready: {}x{}, {} meshes, {} frames in flight, {} samples",
            extent.width,
            extent.height,
            self.meshes.len(),
            self.config.frames_in_flight,
            self.samples.count()
        );
        Ok(())
    }

    // ===== ACCESSORS =====

    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    pub fn stats(&self) -> RendererStats {
        self.stats
    }

    pub fn swapchain(&self) -> &Swapchain {
        &self.swapchain
    }

    pub fn gbuffer(&self) -> &GBufferManager {
        &self.gbuffer
    }

    pub fn depth_buffer(&self) -> &DepthBuffer {
        &self.depth
    }

    pub fn hdr(&self) -> &HdrManager {
        &self.hdr
    }

    pub fn mesh_count(&self) -> usize {
        self.meshes.len()
    }

    /// Slot the next `draw_frame` will use
    pub fn current_frame(&self) -> usize {
        self.frames.as_ref().map(|f| f.current_index()).unwrap_or(0)
    }

    /// Global descriptor set of `mesh` for frame slot `frame` (null if absent)
    pub fn global_set(&self, mesh: usize, frame: usize) -> DescriptorSetKey {
        self.global_sets
            .get(mesh)
            .and_then(|sets| sets.get(frame))
            .copied()
            .unwrap_or_default()
    }

    /// Lighting descriptor set of frame slot `frame` (null if absent)
    pub fn lighting_set(&self, frame: usize) -> DescriptorSetKey {
        self.lighting_sets.get(frame).copied().unwrap_or_default()
    }

    /// Tonemap descriptor set of frame slot `frame` (null if absent)
    pub fn tonemap_set(&self, frame: usize) -> DescriptorSetKey {
        self.tonemap_sets.get(frame).copied().unwrap_or_default()
    }

    // ===== FRAME =====

    /// Render one frame on the current slot, then advance the slot
    ///
    /// A stale swapchain is rebuilt in place and is not an error.
    ///
    /// # Errors
    ///
    /// Any other device failure; the caller should treat it as fatal.
    pub fn draw_frame(
        &mut self,
        device: &mut dyn GraphicsDevice,
        camera: &FlyCamera,
        size_source: &mut dyn SurfaceSizeSource,
    ) -> Result<()> {
        let (slot, frame) = {
            let frames = self
                .frames
                .as_ref()
                .ok_or_else(|| Error::InvalidResource("frame slots not created".to_string()))?;
            let slot = frames
                .current()
                .ok_or_else(|| Error::InvalidResource("no current frame slot".to_string()))?;
            (slot, frames.current_index())
        };

        let result = self.render_slot(device, camera, size_source, slot, frame);

        if let Some(frames) = self.frames.as_mut() {
            frames.advance();
        }
        result
    }

    fn render_slot(
        &mut self,
        device: &mut dyn GraphicsDevice,
        camera: &FlyCamera,
        size_source: &mut dyn SurfaceSizeSource,
        slot: FrameSlot,
        frame: usize,
    ) -> Result<()> {
        device.wait_for_fence(slot.in_flight)?;

        let image_index = match device.acquire_next_image(slot.image_available)? {
            AcquireOutcome::Acquired(index) => index,
            AcquireOutcome::OutOfDate => {
                engine_info!("lumen::Renderer", "Swapchain out of date on acquire, rebuilding");
                return self.recreate_swapchain(device, size_source);
            }
        };

        device.reset_fence(slot.in_flight)?;
        self.update_uniforms(device, camera, frame)?;

        let cmd = slot.command_buffer;
        device.begin_commands(cmd)?;
        self.stats.draw_calls = 0;
        self.stats.triangles = 0;
        self.record_geometry_pass(device, cmd, frame)?;
        self.record_lighting_pass(device, cmd, frame, camera, image_index)?;
        self.record_tonemap_pass(device, cmd, frame, image_index)?;
        device.end_commands(cmd)?;

        device.submit(cmd, slot.image_available, slot.render_finished, slot.in_flight)?;
        self.stats.frames_rendered += 1;

        if device.present(image_index, slot.render_finished)? == PresentOutcome::Stale {
            engine_info!("lumen::Renderer", "Swapchain stale on present, rebuilding");
            self.recreate_swapchain(device, size_source)?;
        }
        Ok(())
    }

    fn update_uniforms(
        &self,
        device: &mut dyn GraphicsDevice,
        camera: &FlyCamera,
        frame: usize,
    ) -> Result<()> {
        let uniforms = self
            .uniforms
            .as_ref()
            .ok_or_else(|| Error::InvalidResource("uniform buffers not created".to_string()))?;

        uniforms.update_camera(
            device,
            frame,
            &CameraUbo {
                view: camera.view(),
                proj: camera.projection(),
                camera_pos: camera.position().to_array(),
                exposure: self.config.exposure,
            },
        )?;
        uniforms.update_model(device, frame, &ModelUbo::default())?;
        uniforms.update_lighting(device, frame, &self.lighting_block)
    }

    // ===== PASSES =====

    fn record_geometry_pass(
        &mut self,
        device: &mut dyn GraphicsDevice,
        cmd: CommandBufferKey,
        frame: usize,
    ) -> Result<()> {
        let extent = self.swapchain.extent();
        let pipeline = self
            .geometry_pipeline
            .ok_or_else(|| Error::InvalidResource("geometry pipeline not created".to_string()))?;

        for pair in self.gbuffer.attachments_mut() {
            pair.msaa_mut().transition(device, cmd, ImageLayout::ColorAttachment)?;
            pair.resolve_mut().transition(device, cmd, ImageLayout::ColorAttachment)?;
        }
        let depth = self
            .depth
            .attachment_mut()
            .ok_or_else(|| Error::InvalidResource("depth buffer not created".to_string()))?;
        depth.msaa_mut().transition(device, cmd, ImageLayout::DepthAttachment)?;
        depth.resolve_mut().transition(device, cmd, ImageLayout::DepthAttachment)?;

        let depth_attachment = RenderingAttachment {
            image: depth.msaa().image(),
            layout: ImageLayout::DepthAttachment,
            clear: DEPTH_CLEAR,
            resolve: Some(ResolveTarget {
                image: depth.resolve().image(),
                layout: ImageLayout::DepthAttachment,
                mode: ResolveMode::SampleZero,
            }),
        };
        let color_attachments = GBufferAttachment::ALL
            .iter()
            .zip(self.gbuffer.attachments())
            .map(|(kind, pair)| RenderingAttachment {
                image: pair.msaa().image(),
                layout: ImageLayout::ColorAttachment,
                clear: kind.clear_value(),
                resolve: Some(ResolveTarget {
                    image: pair.resolve().image(),
                    layout: ImageLayout::ColorAttachment,
                    mode: ResolveMode::Average,
                }),
            })
            .collect();

        device.cmd_begin_rendering(
            cmd,
            &RenderingInfo { extent, color_attachments, depth_attachment: Some(depth_attachment) },
        )?;
        device.cmd_bind_pipeline(cmd, pipeline.pipeline)?;
        set_viewport_and_scissor(device, cmd, extent)?;

        let push = GeometryPush::default();
        for (mesh, sets) in self.meshes.iter().zip(&self.global_sets) {
            let set = sets.get(frame).copied().ok_or_else(|| {
                Error::InvalidResource(format!("no global set for mesh '{}'", mesh.name()))
            })?;
            device.cmd_push_constants(
                cmd,
                pipeline.layout,
                geometry_push_stages(),
                bytemuck::bytes_of(&push),
            )?;
            mesh.bind(device, cmd)?;
            device.cmd_bind_descriptor_set(cmd, pipeline.layout, set)?;
            device.cmd_draw_indexed(cmd, mesh.index_count())?;
            self.stats.draw_calls += 1;
            self.stats.triangles += mesh.index_count() / 3;
        }
        device.cmd_end_rendering(cmd)?;

        for pair in self.gbuffer.attachments_mut() {
            pair.resolve_mut().transition(device, cmd, ImageLayout::ShaderReadOnly)?;
        }
        if let Some(depth) = self.depth.attachment_mut() {
            depth.resolve_mut().transition(device, cmd, ImageLayout::DepthReadOnly)?;
        }
        Ok(())
    }

    fn record_lighting_pass(
        &mut self,
        device: &mut dyn GraphicsDevice,
        cmd: CommandBufferKey,
        frame: usize,
        camera: &FlyCamera,
        image_index: u32,
    ) -> Result<()> {
        let extent = self.swapchain.extent();
        let pipeline = self
            .lighting_pipeline
            .ok_or_else(|| Error::InvalidResource("lighting pipeline not created".to_string()))?;
        let set = self.lighting_set(frame);

        let hdr = self
            .hdr
            .target_mut()
            .ok_or_else(|| Error::InvalidResource("HDR target not created".to_string()))?;
        hdr.msaa_mut().transition(device, cmd, ImageLayout::ColorAttachment)?;
        hdr.resolve_mut().transition(device, cmd, ImageLayout::ColorAttachment)?;

        let target = RenderingAttachment {
            image: hdr.msaa().image(),
            layout: ImageLayout::ColorAttachment,
            clear: HDR_CLEAR,
            resolve: Some(ResolveTarget {
                image: hdr.resolve().image(),
                layout: ImageLayout::ColorAttachment,
                mode: ResolveMode::Average,
            }),
        };
        device.cmd_begin_rendering(
            cmd,
            &RenderingInfo { extent, color_attachments: vec![target], depth_attachment: None },
        )?;
        device.cmd_bind_pipeline(cmd, pipeline.pipeline)?;
        set_viewport_and_scissor(device, cmd, extent)?;
        device.cmd_bind_descriptor_set(cmd, pipeline.layout, set)?;

        let push = ScreenSizePush::new(
            Vec2::new(1.0 / extent.width as f32, 1.0 / extent.height as f32),
            camera.view_projection().inverse(),
        );
        device.cmd_push_constants(cmd, pipeline.layout, ShaderStages::FRAGMENT, bytemuck::bytes_of(&push))?;
        device.cmd_draw(cmd, FULLSCREEN_VERTICES)?;
        self.stats.draw_calls += 1;
        device.cmd_end_rendering(cmd)?;

        hdr.resolve_mut().transition(device, cmd, ImageLayout::ShaderReadOnly)?;
        self.swapchain
            .image_mut(image_index)
            .ok_or_else(|| Error::InvalidResource(format!("no swapchain image {}", image_index)))?
            .transition(device, cmd, ImageLayout::ColorAttachment)
    }

    fn record_tonemap_pass(
        &mut self,
        device: &mut dyn GraphicsDevice,
        cmd: CommandBufferKey,
        frame: usize,
        image_index: u32,
    ) -> Result<()> {
        let extent = self.swapchain.extent();
        let pipeline = self
            .tonemap_pipeline
            .ok_or_else(|| Error::InvalidResource("tonemap pipeline not created".to_string()))?;
        let set = self.tonemap_set(frame);
        let push = ToneMapPush {
            exposure: self.config.exposure,
            tonemap_operator: self.config.tonemap_operator,
        };

        let target = self
            .swapchain
            .image_mut(image_index)
            .ok_or_else(|| Error::InvalidResource(format!("no swapchain image {}", image_index)))?;

        device.cmd_begin_rendering(
            cmd,
            &RenderingInfo {
                extent,
                color_attachments: vec![RenderingAttachment {
                    image: target.image(),
                    layout: ImageLayout::ColorAttachment,
                    clear: SWAPCHAIN_CLEAR,
                    resolve: None,
                }],
                depth_attachment: None,
            },
        )?;
        device.cmd_bind_pipeline(cmd, pipeline.pipeline)?;
        set_viewport_and_scissor(device, cmd, extent)?;
        device.cmd_bind_descriptor_set(cmd, pipeline.layout, set)?;
        device.cmd_push_constants(cmd, pipeline.layout, ShaderStages::FRAGMENT, bytemuck::bytes_of(&push))?;
        device.cmd_draw(cmd, FULLSCREEN_VERTICES)?;
        self.stats.draw_calls += 1;
        device.cmd_end_rendering(cmd)?;

        target.transition(device, cmd, ImageLayout::PresentSrc)
    }

    // ===== SWAPCHAIN RECREATION =====

    /// Rebuild the swapchain and everything sized after it
    ///
    /// Waits for a non-zero framebuffer and for the device to go idle, then
    /// replaces the depth buffer and swapchain (swapchain, image views, color
    /// resources, depth, in that order), followed by the G-buffer, the HDR
    /// target and the descriptor sets that sample them.
    ///
    /// If the window is closed while minimized nothing is rebuilt and the
    /// current resources stay in place for `cleanup`.
    pub fn recreate_swapchain(
        &mut self,
        device: &mut dyn GraphicsDevice,
        size_source: &mut dyn SurfaceSizeSource,
    ) -> Result<()> {
        let Some(framebuffer) = wait_for_nonzero_size(size_source) else {
            engine_info!("lumen::Renderer", "Window closed while minimized, swapchain left as is");
            return Ok(());
        };
        device.wait_idle()?;

        self.depth.cleanup(device);
        self.swapchain.cleanup(device);

        self.swapchain.create_swapchain(device, framebuffer)?;
        self.swapchain.create_image_views(device)?;
        self.swapchain.create_color_resources(device, self.samples)?;
        let extent = self.swapchain.extent();
        self.depth.create(device, extent, self.samples)?;

        self.descriptors.free_descriptor_sets(device, &mut self.lighting_sets)?;
        self.descriptors.free_descriptor_sets(device, &mut self.tonemap_sets)?;
        self.hdr.cleanup(device);
        self.gbuffer.cleanup(device);
        self.gbuffer.create_resources(device, extent, self.samples)?;
        self.hdr.create_resources(device, extent, self.samples)?;
        self.allocate_extent_sets(device)?;

        self.stats.swapchain_recreations += 1;
        engine_info!(
            "lumen::Renderer",
            "Swapchain recreated at {}x{}",
            extent.width,
            extent.height
        );
        Ok(())
    }

    // ===== SETUP =====

    fn create_descriptor_pool(&mut self, device: &mut dyn GraphicsDevice) -> Result<()> {
        let frames = self.config.frames_in_flight as u32;
        let meshes = self.meshes.len() as u32;
        let sizes = [
            DescriptorPoolSize { ty: DescriptorType::UniformBuffer, count: frames * (3 * meshes + 2) },
            DescriptorPoolSize {
                ty: DescriptorType::CombinedImageSampler,
                count: frames * (5 * meshes + 6),
            },
        ];
        self.descriptors.create_descriptor_pool(
            device,
            &sizes,
            frames * (meshes + 2),
            DescriptorPoolFlags::FREE_DESCRIPTOR_SET,
        )
    }

    fn create_set_layouts(&mut self, device: &mut dyn GraphicsDevice) -> Result<()> {
        let mut global = vec![
            layout_binding(GLOBAL_CAMERA_BINDING, DescriptorType::UniformBuffer, ShaderStages::VERTEX | ShaderStages::FRAGMENT),
            layout_binding(GLOBAL_MODEL_BINDING, DescriptorType::UniformBuffer, ShaderStages::VERTEX),
        ];
        global.extend(TextureKind::ALL.iter().map(|kind| {
            layout_binding(
                GLOBAL_FIRST_TEXTURE_BINDING + kind.index() as u32,
                DescriptorType::CombinedImageSampler,
                ShaderStages::FRAGMENT,
            )
        }));
        global.push(layout_binding(GLOBAL_LIGHTING_BINDING, DescriptorType::UniformBuffer, ShaderStages::FRAGMENT));
        self.global_layout = Some(self.descriptors.create_descriptor_set_layout(device, &global)?);

        let mut lighting: Vec<_> = LIGHTING_INPUTS
            .iter()
            .map(|(binding, _)| layout_binding(*binding, DescriptorType::CombinedImageSampler, ShaderStages::FRAGMENT))
            .collect();
        lighting.push(layout_binding(LIGHTING_DEPTH_BINDING, DescriptorType::CombinedImageSampler, ShaderStages::FRAGMENT));
        lighting.push(layout_binding(LIGHTING_SCENE_BINDING, DescriptorType::UniformBuffer, ShaderStages::FRAGMENT));
        lighting.push(layout_binding(LIGHTING_CAMERA_BINDING, DescriptorType::UniformBuffer, ShaderStages::FRAGMENT));
        self.lighting_layout = Some(self.descriptors.create_descriptor_set_layout(device, &lighting)?);

        let tonemap = [layout_binding(TONEMAP_HDR_BINDING, DescriptorType::CombinedImageSampler, ShaderStages::FRAGMENT)];
        self.tonemap_layout = Some(self.descriptors.create_descriptor_set_layout(device, &tonemap)?);
        Ok(())
    }

    fn create_pipelines(&mut self, device: &mut dyn GraphicsDevice) -> Result<()> {
        self.pipeline_builder.create_pipeline_cache(device)?;

        let mut geometry_config =
            default_pipeline_config(&GBufferAttachment::formats(), self.samples, self.depth.format());
        geometry_config.vertex_bindings = vec![Vertex::binding()];
        geometry_config.vertex_attributes = Vertex::attributes();
        let geometry = self.pipeline_builder.create_graphics_pipeline::<GeometryPush>(
            device,
            &PipelineShaders {
                vertex_path: &self.config.geometry_shaders.vertex,
                fragment_path: &self.config.geometry_shaders.fragment,
                set_layout: self.global_layout.unwrap_or_default(),
                push_stages: geometry_push_stages(),
            },
            &geometry_config,
        )?;
        self.geometry_pipeline = Some(geometry);

        let lighting = self.pipeline_builder.create_graphics_pipeline::<ScreenSizePush>(
            device,
            &PipelineShaders {
                vertex_path: &self.config.lighting_shaders.vertex,
                fragment_path: &self.config.lighting_shaders.fragment,
                set_layout: self.lighting_layout.unwrap_or_default(),
                push_stages: ShaderStages::FRAGMENT,
            },
            &fullscreen_pipeline_config(HDR_FORMAT, self.samples),
        )?;
        self.lighting_pipeline = Some(lighting);

        let tonemap = self.pipeline_builder.create_graphics_pipeline::<ToneMapPush>(
            device,
            &PipelineShaders {
                vertex_path: &self.config.tonemap_shaders.vertex,
                fragment_path: &self.config.tonemap_shaders.fragment,
                set_layout: self.tonemap_layout.unwrap_or_default(),
                push_stages: ShaderStages::FRAGMENT,
            },
            &fullscreen_pipeline_config(self.swapchain.format(), SampleCount::S1),
        )?;
        self.tonemap_pipeline = Some(tonemap);

        engine_debug!("lumen::Renderer", "Geometry, lighting and tonemap pipelines created");
        Ok(())
    }

    fn allocate_global_sets(&mut self, device: &mut dyn GraphicsDevice) -> Result<()> {
        let uniforms = self
            .uniforms
            .as_ref()
            .ok_or_else(|| Error::InvalidResource("uniform buffers not created".to_string()))?;
        let layout = self.global_layout.unwrap_or_default();
        let frames = uniforms.frame_count() as u32;

        for mesh in &self.meshes {
            let sets = self.descriptors.allocate_and_write_descriptor_sets(
                device,
                layout,
                frames,
                |frame| global_bindings(uniforms, mesh, frame as usize),
            )?;
            self.global_sets.push(sets);
        }
        Ok(())
    }

    /// Lighting and tonemap sets, which reference extent-sized images
    fn allocate_extent_sets(&mut self, device: &mut dyn GraphicsDevice) -> Result<()> {
        let uniforms = self
            .uniforms
            .as_ref()
            .ok_or_else(|| Error::InvalidResource("uniform buffers not created".to_string()))?;
        let frames = uniforms.frame_count() as u32;
        let (gbuffer, depth, hdr) = (&self.gbuffer, &self.depth, &self.hdr);

        self.lighting_sets = self.descriptors.allocate_and_write_descriptor_sets(
            device,
            self.lighting_layout.unwrap_or_default(),
            frames,
            |frame| lighting_bindings(uniforms, gbuffer, depth, frame as usize),
        )?;
        self.tonemap_sets = self.descriptors.allocate_and_write_descriptor_sets(
            device,
            self.tonemap_layout.unwrap_or_default(),
            frames,
            |_| tonemap_bindings(hdr),
        )?;
        Ok(())
    }

    // ===== CLEANUP =====

    /// Destroy everything in reverse creation order (safe to call twice)
    pub fn cleanup(&mut self, device: &mut dyn GraphicsDevice) {
        if let Err(e) = device.wait_idle() {
            engine_warn!("lumen::Renderer", "wait_idle failed during cleanup: {}", e);
        }

        if let Some(mut frames) = self.frames.take() {
            frames.cleanup(device);
        }

        for pipeline in [
            self.tonemap_pipeline.take(),
            self.lighting_pipeline.take(),
            self.geometry_pipeline.take(),
        ]
        .into_iter()
        .flatten()
        {
            pipeline.destroy(device);
        }
        self.pipeline_builder.cleanup(device);

        // Sets go away with the pool
        self.tonemap_sets.clear();
        self.lighting_sets.clear();
        self.global_sets.clear();
        self.descriptors.cleanup(device);
        for layout in [
            self.tonemap_layout.take(),
            self.lighting_layout.take(),
            self.global_layout.take(),
        ]
        .into_iter()
        .flatten()
        {
            device.destroy_descriptor_set_layout(layout);
        }

        while let Some(mesh) = self.meshes.pop() {
            mesh.destroy(device);
        }
        if let Some(mut uniforms) = self.uniforms.take() {
            uniforms.cleanup(device);
        }

        self.hdr.cleanup(device);
        self.gbuffer.cleanup(device);
        self.depth.cleanup(device);
        self.swapchain.cleanup(device);
    }
}

// ============================================================================
// HELPERS
// ============================================================================

fn geometry_push_stages() -> ShaderStages {
    ShaderStages::VERTEX | ShaderStages::FRAGMENT
}

fn layout_binding(binding: u32, ty: DescriptorType, stages: ShaderStages) -> DescriptorSetLayoutBinding {
    DescriptorSetLayoutBinding { binding, ty, count: 1, stages }
}

/// Single-attachment pipeline drawing a full-screen triangle without depth
fn fullscreen_pipeline_config(format: Format, samples: SampleCount) -> PipelineConfig {
    let mut config = default_pipeline_config(&[format], samples, Format::Undefined);
    config.cull_mode = CullMode::None;
    config.depth_test = false;
    config.depth_write = false;
    config
}

fn set_viewport_and_scissor(
    device: &mut dyn GraphicsDevice,
    cmd: CommandBufferKey,
    extent: Extent2D,
) -> Result<()> {
    device.cmd_set_viewport(cmd, Viewport::from_extent(extent))?;
    device.cmd_set_scissor(cmd, Rect2D::from_extent(extent))
}

fn uniform_binding<T>(binding: u32, buffer: BufferKey) -> BufferBinding {
    BufferBinding { binding, buffer, offset: 0, range: size_of::<T>() as u64 }
}

fn global_bindings(uniforms: &UniformBufferSet, mesh: &Mesh, frame: usize) -> SetBindings {
    let buffers = vec![
        uniform_binding::<CameraUbo>(GLOBAL_CAMERA_BINDING, uniforms.camera_buffer(frame)),
        uniform_binding::<ModelUbo>(GLOBAL_MODEL_BINDING, uniforms.model_buffer(frame)),
        uniform_binding::<SceneLightingUbo>(GLOBAL_LIGHTING_BINDING, uniforms.lighting_buffer(frame)),
    ];
    let images = TextureKind::ALL
        .iter()
        .map(|kind| {
            let texture = mesh.texture_or_albedo(*kind);
            ImageBinding {
                binding: GLOBAL_FIRST_TEXTURE_BINDING + kind.index() as u32,
                image: texture.map(|t| t.image()).unwrap_or_default(),
                sampler: texture.map(|t| t.sampler()).unwrap_or_default(),
                layout: ImageLayout::ShaderReadOnly,
            }
        })
        .collect();
    (buffers, images)
}

fn lighting_bindings(
    uniforms: &UniformBufferSet,
    gbuffer: &GBufferManager,
    depth: &DepthBuffer,
    frame: usize,
) -> SetBindings {
    let buffers = vec![
        uniform_binding::<SceneLightingUbo>(LIGHTING_SCENE_BINDING, uniforms.lighting_buffer(frame)),
        uniform_binding::<CameraUbo>(LIGHTING_CAMERA_BINDING, uniforms.camera_buffer(frame)),
    ];
    let mut images: Vec<ImageBinding> = LIGHTING_INPUTS
        .iter()
        .map(|(binding, kind)| ImageBinding {
            binding: *binding,
            image: gbuffer.attachment(*kind).map(|a| a.resolve().image()).unwrap_or_default(),
            sampler: gbuffer.sampler(),
            layout: ImageLayout::ShaderReadOnly,
        })
        .collect();
    images.push(ImageBinding {
        binding: LIGHTING_DEPTH_BINDING,
        image: depth.attachment().map(|a| a.resolve().image()).unwrap_or_default(),
        sampler: gbuffer.sampler(),
        layout: ImageLayout::DepthReadOnly,
    });
    (buffers, images)
}

fn tonemap_bindings(hdr: &HdrManager) -> SetBindings {
    let images = vec![ImageBinding {
        binding: TONEMAP_HDR_BINDING,
        image: hdr.target().map(|t| t.resolve().image()).unwrap_or_default(),
        sampler: hdr.sampler(),
        layout: ImageLayout::ShaderReadOnly,
    }];
    (Vec::new(), images)
}

#[cfg(test)]
#[path = "renderer_tests.rs"]
mod tests;
