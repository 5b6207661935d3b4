//! Window and input for the demo.
//!
//! `DemoWindow` receives winit events and keeps the state the frame loop
//! reads back: movement keys, right-button look, cursor position, scroll
//! and close/resize requests. The event loop is pumped by the caller so the
//! renderer can block on it while the window is minimized.

use std::time::Duration;

use lumen_engine::lumen::camera::MovementInput;
use lumen_engine::lumen::device::Extent2D;
use lumen_engine::lumen::render::SurfaceSizeSource;
use lumen_engine::{engine_error, engine_info};
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, KeyEvent, MouseButton, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::platform::pump_events::{EventLoopExtPumpEvents, PumpStatus};
use winit::window::{Window, WindowId};

const WINDOW_SOURCE: &str = "lumen::Window";

/// Pixels of a touchpad scroll counted as one wheel line
const PIXELS_PER_SCROLL_LINE: f64 = 20.0;

/// Input gathered since the last frame
#[derive(Debug, Clone, Copy, Default)]
pub struct InputState {
    pub movement: MovementInput,
    pub look_held: bool,
    pub cursor: (f64, f64),
    /// Accumulated wheel lines, consumed by `take_scroll`
    pub scroll: f32,
}

pub struct DemoWindow {
    title: String,
    size: PhysicalSize<u32>,
    window: Option<Window>,
    input: InputState,
    close_requested: bool,
    resized: bool,
    creation_error: Option<String>,
}

impl DemoWindow {
    pub fn new(title: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            title: title.into(),
            size: PhysicalSize::new(width, height),
            window: None,
            input: InputState::default(),
            close_requested: false,
            resized: false,
            creation_error: None,
        }
    }

    pub fn window(&self) -> Option<&Window> {
        self.window.as_ref()
    }

    pub fn input(&self) -> &InputState {
        &self.input
    }

    /// Wheel lines since the last call
    pub fn take_scroll(&mut self) -> f32 {
        std::mem::take(&mut self.input.scroll)
    }

    pub fn close_requested(&self) -> bool {
        self.close_requested
    }

    /// Whether a resize happened since the last call
    pub fn take_resized(&mut self) -> bool {
        std::mem::take(&mut self.resized)
    }

    pub fn take_creation_error(&mut self) -> Option<String> {
        self.creation_error.take()
    }

    /// Framebuffer size in pixels (zero before creation and while minimized)
    pub fn framebuffer_size(&self) -> Extent2D {
        self.window
            .as_ref()
            .map(|window| {
                let size = window.inner_size();
                Extent2D::new(size.width, size.height)
            })
            .unwrap_or_default()
    }

    fn handle_key(&mut self, event: &KeyEvent) {
        let PhysicalKey::Code(code) = event.physical_key else {
            return;
        };
        let pressed = event.state == ElementState::Pressed;
        let movement = &mut self.input.movement;
        match code {
            KeyCode::KeyW => movement.forward = pressed,
            KeyCode::KeyS => movement.backward = pressed,
            KeyCode::KeyA => movement.left = pressed,
            KeyCode::KeyD => movement.right = pressed,
            KeyCode::Space => movement.up = pressed,
            KeyCode::ShiftLeft => movement.down = pressed,
            KeyCode::Escape if pressed => self.close_requested = true,
            _ => {}
        }
    }
}

impl ApplicationHandler for DemoWindow {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        let attributes = Window::default_attributes()
            .with_title(self.title.clone())
            .with_inner_size(self.size)
            .with_resizable(true);

        match event_loop.create_window(attributes) {
            Ok(window) => {
                engine_info!(WINDOW_SOURCE, "Window created ({}x{})", self.size.width, self.size.height);
                self.window = Some(window);
            }
            Err(e) => {
                engine_error!(WINDOW_SOURCE, "Failed to create window: {}", e);
                self.creation_error = Some(e.to_string());
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, _event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => self.close_requested = true,
            WindowEvent::Resized(_) => self.resized = true,
            WindowEvent::KeyboardInput { event, .. } => self.handle_key(&event),
            WindowEvent::MouseInput { state, button: MouseButton::Right, .. } => {
                self.input.look_held = state == ElementState::Pressed;
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.input.cursor = (position.x, position.y);
            }
            WindowEvent::MouseWheel { delta, .. } => {
                self.input.scroll += match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(position) => (position.y / PIXELS_PER_SCROLL_LINE) as f32,
                };
            }
            _ => {}
        }
    }
}

/// Event loop plus window state, pumped on demand
pub struct WindowPump<'a> {
    pub event_loop: &'a mut EventLoop<()>,
    pub window: &'a mut DemoWindow,
}

impl WindowPump<'_> {
    /// Dispatch pending events without blocking
    pub fn poll(&mut self) {
        self.pump(Some(Duration::ZERO));
    }

    fn pump(&mut self, timeout: Option<Duration>) {
        if let PumpStatus::Exit(_) = self.event_loop.pump_app_events(timeout, self.window) {
            self.window.close_requested = true;
        }
    }
}

impl SurfaceSizeSource for WindowPump<'_> {
    fn framebuffer_size(&self) -> Extent2D {
        self.window.framebuffer_size()
    }

    fn wait_events(&mut self) {
        self.pump(None);
    }

    fn close_requested(&self) -> bool {
        self.window.close_requested
    }
}
