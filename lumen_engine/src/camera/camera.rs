/// Free-fly camera.
///
/// Yaw/pitch orientation in degrees, WASD-style translation and mouse look
/// while a button is held. The projection is right-handed with a zero-to-one
/// depth range; the Y axis is flipped inside the projection matrix so that
/// +Y points up on screen. View matrices are never flipped.

use glam::{Mat4, Vec3};

const WORLD_UP: Vec3 = Vec3::Y;
const PITCH_LIMIT: f32 = 89.0;
const MIN_FOV: f32 = 1.0;
const MAX_FOV: f32 = 45.0;

/// Which movement keys are held this frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MovementInput {
    pub forward: bool,
    pub backward: bool,
    pub left: bool,
    pub right: bool,
    pub up: bool,
    pub down: bool,
}

#[derive(Debug, Clone)]
pub struct FlyCamera {
    position: Vec3,
    forward: Vec3,
    right: Vec3,
    up: Vec3,

    yaw: f32,
    pitch: f32,
    fov_degrees: f32,
    aspect_ratio: f32,
    near: f32,
    far: f32,

    /// World units per second
    pub speed: f32,
    /// Degrees per pixel of mouse travel
    pub sensitivity: f32,

    last_cursor: Option<(f64, f64)>,
}

impl FlyCamera {
    /// Camera at `position` looking down -Z
    pub fn new(position: Vec3, fov_degrees: f32, aspect_ratio: f32) -> Self {
        let mut camera = Self {
            position,
            forward: Vec3::NEG_Z,
            right: Vec3::X,
            up: Vec3::Y,
            yaw: -90.0,
            pitch: 0.0,
            fov_degrees,
            aspect_ratio,
            near: 0.1,
            far: 500.0,
            speed: 5.0,
            sensitivity: 0.1,
            last_cursor: None,
        };
        camera.update_vectors();
        camera
    }

    // ===== GETTERS =====

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn forward(&self) -> Vec3 {
        self.forward
    }

    pub fn right(&self) -> Vec3 {
        self.right
    }

    pub fn up(&self) -> Vec3 {
        self.up
    }

    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    pub fn fov_degrees(&self) -> f32 {
        self.fov_degrees
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.aspect_ratio
    }

    /// Width over height; ignored when either is zero
    pub fn set_viewport_size(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.aspect_ratio = width as f32 / height as f32;
        }
    }

    // ===== MATRICES =====

    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.position + self.forward, self.up)
    }

    pub fn projection(&self) -> Mat4 {
        let mut proj = Mat4::perspective_rh(
            self.fov_degrees.to_radians(),
            self.aspect_ratio,
            self.near,
            self.far,
        );
        proj.y_axis.y *= -1.0;
        proj
    }

    /// `projection * view`
    pub fn view_projection(&self) -> Mat4 {
        self.projection() * self.view()
    }

    // ===== INPUT =====

    /// Translate along the camera axes
    pub fn process_keyboard(&mut self, input: &MovementInput, delta_seconds: f32) {
        let velocity = self.speed * delta_seconds;
        let mut offset = Vec3::ZERO;
        if input.forward {
            offset += self.forward;
        }
        if input.backward {
            offset -= self.forward;
        }
        if input.right {
            offset += self.right;
        }
        if input.left {
            offset -= self.right;
        }
        if input.up {
            offset += self.up;
        }
        if input.down {
            offset -= self.up;
        }
        self.position += offset * velocity;
    }

    /// Mouse look while `look_held`; the first sample after a press only
    /// records the cursor so the view does not jump
    pub fn process_mouse(&mut self, x: f64, y: f64, look_held: bool) {
        if !look_held {
            self.last_cursor = None;
            return;
        }
        let Some((last_x, last_y)) = self.last_cursor.replace((x, y)) else {
            return;
        };

        let dx = (x - last_x) as f32 * self.sensitivity;
        let dy = (last_y - y) as f32 * self.sensitivity;
        self.yaw += dx;
        self.pitch = (self.pitch + dy).clamp(-PITCH_LIMIT, PITCH_LIMIT);
        self.update_vectors();
    }

    /// Zoom by narrowing the field of view
    pub fn process_scroll(&mut self, delta: f32) {
        self.fov_degrees = (self.fov_degrees - delta).clamp(MIN_FOV, MAX_FOV);
    }

    fn update_vectors(&mut self) {
        let (yaw, pitch) = (self.yaw.to_radians(), self.pitch.to_radians());
        self.forward = Vec3::new(yaw.cos() * pitch.cos(), pitch.sin(), yaw.sin() * pitch.cos())
            .normalize();
        self.right = self.forward.cross(WORLD_UP).normalize();
        self.up = self.right.cross(self.forward).normalize();
    }
}

#[cfg(test)]
#[path = "camera_tests.rs"]
mod tests;
