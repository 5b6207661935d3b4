//! Error types for the Lumen engine
//!
//! This module defines the error types used throughout the engine,
//! including device setup, resource management and frame recording.
//!
//! Presentation staleness is not an error: acquire and present report it
//! through their outcome enums.

use std::fmt;

use crate::graphics_device::ImageLayout;

/// Result type for Lumen engine operations
pub type Result<T> = std::result::Result<T, Error>;

/// Lumen engine errors
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Backend-specific error (Vulkan call failure, unexpected status)
    BackendError(String),

    /// Out of GPU memory
    OutOfMemory,

    /// Invalid resource (texture, buffer, shader, layout handle, etc.)
    InvalidResource(String),

    /// Initialization failed (device, swapchain, managers)
    InitializationFailed(String),

    /// The descriptor pool has no room left (out of memory or fragmented)
    DescriptorPoolExhausted(String),

    /// A layout transition pair with no barrier definition was requested
    UnsupportedLayoutTransition {
        from: ImageLayout,
        to: ImageLayout,
    },

    /// Configuration values rejected before use
    InvalidConfig(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::BackendError(msg) => write!(f, "Backend error: {}", msg),
            Error::OutOfMemory => write!(f, "Out of GPU memory"),
            Error::InvalidResource(msg) => write!(f, "Invalid resource: {}", msg),
            Error::InitializationFailed(msg) => write!(f, "Initialization failed: {}", msg),
            Error::DescriptorPoolExhausted(msg) => write!(f, "Descriptor pool exhausted: {}", msg),
            Error::UnsupportedLayoutTransition { from, to } => {
                write!(f, "Unsupported layout transition: {:?} -> {:?}", from, to)
            }
            Error::InvalidConfig(msg) => write!(f, "Invalid configuration: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
