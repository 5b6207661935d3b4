//! Renderer configuration.

use std::path::PathBuf;

use glam::Vec3;

use crate::error::{Error, Result};
use crate::resource::{DirectionalLight, PointLight, MAX_POINT_LIGHTS};

/// Compiled vertex + fragment shader pair
#[derive(Debug, Clone, PartialEq)]
pub struct ShaderPaths {
    pub vertex: PathBuf,
    pub fragment: PathBuf,
}

impl ShaderPaths {
    pub fn new(vertex: impl Into<PathBuf>, fragment: impl Into<PathBuf>) -> Self {
        Self { vertex: vertex.into(), fragment: fragment.into() }
    }

    fn is_empty(&self) -> bool {
        self.vertex.as_os_str().is_empty() || self.fragment.as_os_str().is_empty()
    }
}

/// Everything the renderer and the demo need to start
#[derive(Debug, Clone)]
pub struct RendererConfig {
    /// Number of frame slots recorded ahead of the GPU
    pub frames_in_flight: usize,
    pub window_title: String,
    pub window_width: u32,
    pub window_height: u32,

    pub geometry_shaders: ShaderPaths,
    pub lighting_shaders: ShaderPaths,
    pub tonemap_shaders: ShaderPaths,

    /// Serialized pipeline cache, read at startup and written at shutdown
    pub pipeline_cache_path: PathBuf,
    /// Albedo used for meshes whose material has none
    pub default_albedo_path: PathBuf,
    pub model_path: PathBuf,

    pub exposure: f32,
    /// Operator index understood by the tonemap shader
    pub tonemap_operator: i32,

    pub point_lights: Vec<PointLight>,
    pub directional_light: DirectionalLight,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            frames_in_flight: 2,
            window_title: "Vulkan".to_string(),
            window_width: 800,
            window_height: 600,
            geometry_shaders: ShaderPaths::new("Shaders/shader.vert.spv", "Shaders/shader.frag.spv"),
            lighting_shaders: ShaderPaths::new(
                "Shaders/fullscreen_quad.vert.spv",
                "Shaders/lighting.frag.spv",
            ),
            tonemap_shaders: ShaderPaths::new("Shaders/tonemap.vert.spv", "Shaders/tonemap.frag.spv"),
            pipeline_cache_path: PathBuf::from("pipeline_cache.bin"),
            default_albedo_path: PathBuf::from("Textures/default_albedo.png"),
            model_path: PathBuf::from("Models/flightHelmet/FlightHelmet.obj"),
            exposure: 1.0,
            tonemap_operator: 1,
            point_lights: vec![
                PointLight::new(Vec3::new(20.0, 10.0, 0.0), Vec3::new(1.0, 0.0, 0.0), 100.0, 10.0),
                PointLight::new(Vec3::new(10.0, 5.0, 0.0), Vec3::new(0.0, 1.0, 0.0), 100.0, 20.0),
                PointLight::new(Vec3::new(-10.0, 5.0, 0.0), Vec3::new(0.0, 0.0, 1.0), 100.0, 3.0),
                PointLight::new(Vec3::new(0.0, 5.0, 10.0), Vec3::ONE, 100.0, 8000.0),
            ],
            directional_light: DirectionalLight::new(
                Vec3::new(-0.5, -1.0, -0.3),
                Vec3::ONE,
                50_000.0,
            ),
        }
    }
}

impl RendererConfig {
    /// Reject settings the renderer cannot start with
    pub fn validate(&self) -> Result<()> {
        if self.frames_in_flight == 0 {
            return Err(Error::InvalidConfig("frames_in_flight must be at least 1".to_string()));
        }
        if self.window_width == 0 || self.window_height == 0 {
            return Err(Error::InvalidConfig(format!(
                "window size {}x{} has a zero dimension",
                self.window_width, self.window_height
            )));
        }
        for (name, shaders) in [
            ("geometry", &self.geometry_shaders),
            ("lighting", &self.lighting_shaders),
            ("tonemap", &self.tonemap_shaders),
        ] {
            if shaders.is_empty() {
                return Err(Error::InvalidConfig(format!("{} shader paths must not be empty", name)));
            }
        }
        if self.point_lights.len() > MAX_POINT_LIGHTS {
            return Err(Error::InvalidConfig(format!(
                "{} point lights configured, at most {} supported",
                self.point_lights.len(),
                MAX_POINT_LIGHTS
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
