//! Lumen demo: loads a model and renders it with the deferred pipeline.
//!
//! Controls: WASD to move, Space/Left Shift to rise and sink, hold the
//! right mouse button to look around, scroll to zoom, Escape to quit.

mod model_loader;
mod window;

use std::process::ExitCode;
use std::time::Instant;

use lumen_engine::glam::Vec3;
use lumen_engine::lumen::camera::FlyCamera;
use lumen_engine::lumen::{Engine, Error, Renderer, RendererConfig, Result};
use lumen_engine::engine_info;
use lumen_engine_renderer_vulkan::{VulkanDevice, VulkanDeviceConfig};
use winit::event_loop::EventLoop;

use crate::model_loader::ModelLoader;
use crate::window::{DemoWindow, WindowPump};

const DEMO_SOURCE: &str = "lumen::Demo";

const CAMERA_START: Vec3 = Vec3::new(0.0, 0.0, 3.0);
const CAMERA_FOV_DEGREES: f32 = 45.0;

fn main() -> ExitCode {
    Engine::initialize();
    let result = run();
    Engine::shutdown();

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    let config = RendererConfig::default();
    config.validate()?;

    let mut event_loop = EventLoop::new()
        .map_err(|e| Error::InitializationFailed(format!("Failed to create event loop: {}", e)))?;
    let mut demo_window = DemoWindow::new(&config.window_title, config.window_width, config.window_height);

    // The window only exists after the first resume
    while demo_window.window().is_none() {
        WindowPump { event_loop: &mut event_loop, window: &mut demo_window }.poll();
        if let Some(e) = demo_window.take_creation_error() {
            return Err(Error::InitializationFailed(format!("Failed to create window: {}", e)));
        }
        if demo_window.close_requested() {
            return Ok(());
        }
    }

    let window = demo_window
        .window()
        .ok_or_else(|| Error::InitializationFailed("window disappeared before device creation".to_string()))?;
    let mut device = VulkanDevice::new(
        window,
        VulkanDeviceConfig {
            app_name: config.window_title.clone(),
            ..Default::default()
        },
    )?;

    let meshes = ModelLoader::new(&config.default_albedo_path).load(&config.model_path);

    let created = Renderer::new(
        &mut device,
        config,
        &meshes,
        &mut WindowPump { event_loop: &mut event_loop, window: &mut demo_window },
    );
    drop(meshes);
    let mut renderer = match created {
        Ok(renderer) => renderer,
        // Closed while minimized before the first frame
        Err(_) if demo_window.close_requested() => return Ok(()),
        Err(e) => return Err(e),
    };

    let extent = renderer.swapchain().extent();
    let mut camera = FlyCamera::new(
        CAMERA_START,
        CAMERA_FOV_DEGREES,
        extent.width as f32 / extent.height.max(1) as f32,
    );

    let mut last_frame = Instant::now();
    let result = loop {
        let mut pump = WindowPump { event_loop: &mut event_loop, window: &mut demo_window };
        pump.poll();
        if pump.window.close_requested() {
            break Ok(());
        }

        let now = Instant::now();
        let delta_seconds = (now - last_frame).as_secs_f32();
        last_frame = now;

        let input = *pump.window.input();
        camera.process_mouse(input.cursor.0, input.cursor.1, input.look_held);
        camera.process_keyboard(&input.movement, delta_seconds);
        let scroll = pump.window.take_scroll();
        if scroll != 0.0 {
            camera.process_scroll(scroll);
        }

        // Some platforms never report a stale swapchain after a resize
        let size = pump.window.framebuffer_size();
        if pump.window.take_resized() && !size.is_zero() && size != renderer.swapchain().extent() {
            if let Err(e) = renderer.recreate_swapchain(&mut device, &mut pump) {
                break Err(e);
            }
        }

        let extent = renderer.swapchain().extent();
        camera.set_viewport_size(extent.width, extent.height);

        if let Err(e) = renderer.draw_frame(&mut device, &camera, &mut pump) {
            break Err(e);
        }
    };

    let stats = renderer.stats();
    engine_info!(
        DEMO_SOURCE,
        "Shutting down after {} frames ({} swapchain recreations)",
        stats.frames_rendered,
        stats.swapchain_recreations
    );

    renderer.cleanup(&mut device);
    drop(device);

    #[cfg(feature = "vulkan-validation")]
    lumen_engine_renderer_vulkan::print_validation_stats_report();

    result
}
