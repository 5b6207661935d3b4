//! Unit tests for config.rs

use std::path::PathBuf;

use crate::config::{RendererConfig, ShaderPaths};
use crate::error::Error;
use crate::resource::PointLight;

#[test]
fn test_default_config_is_valid() {
    let config = RendererConfig::default();
    assert!(config.validate().is_ok());
    assert_eq!(config.frames_in_flight, 2);
    assert_eq!(config.window_title, "Vulkan");
    assert_eq!((config.window_width, config.window_height), (800, 600));
    assert_eq!(config.pipeline_cache_path, PathBuf::from("pipeline_cache.bin"));
    assert_eq!(config.tonemap_operator, 1);
}

#[test]
fn test_default_lights() {
    let config = RendererConfig::default();
    assert_eq!(config.point_lights.len(), 4);
    assert_eq!(config.point_lights[3].lumen, 8000.0);
    assert_eq!(config.directional_light.lux, 50_000.0);
}

#[test]
fn test_zero_frames_in_flight_rejected() {
    let config = RendererConfig { frames_in_flight: 0, ..Default::default() };
    assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
}

#[test]
fn test_zero_window_size_rejected() {
    let config = RendererConfig { window_height: 0, ..Default::default() };
    assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
}

#[test]
fn test_empty_shader_path_rejected() {
    let config = RendererConfig {
        lighting_shaders: ShaderPaths::new("", "Shaders/lighting.frag.spv"),
        ..Default::default()
    };
    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("lighting"));
}

#[test]
fn test_too_many_point_lights_rejected() {
    let mut config = RendererConfig::default();
    config.point_lights.push(PointLight::default());
    assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
}
