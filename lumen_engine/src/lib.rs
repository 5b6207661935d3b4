/*!
# Lumen Engine

Backend-neutral core of the Lumen deferred renderer.

The crate owns the frame lifecycle: per-slot synchronization, the
geometry → lighting → tonemap pass sequence, explicit image-layout
tracking, and the creation/destruction discipline of every GPU object.
It reaches the GPU only through the `GraphicsDevice` trait; the Vulkan
implementation lives in `lumen_engine_renderer_vulkan`.

## Architecture

- **GraphicsDevice**: device trait, typed handle keys and plain-data descriptors
- **Resource**: tracked images, vertex/index/uniform buffers, textures, meshes
- **Renderer**: G-buffer, HDR, depth and swapchain managers, descriptor
  manager, pipeline builder, frame sync and the `Renderer` orchestrator
- **Camera**: free-fly camera fed by window-agnostic input
- **Config**: `RendererConfig` and its validation
*/

// Internal modules
mod error;
mod engine;
pub mod log;
pub mod config;
pub mod camera;
pub mod graphics_device;
pub mod resource;
pub mod renderer;

// Main lumen namespace module
pub mod lumen {
    // Error types
    pub use crate::error::{Error, Result};

    // Engine singleton
    pub use crate::engine::Engine;

    // Frame orchestrator and configuration
    pub use crate::renderer::{Renderer, RendererStats};
    pub use crate::config::{RendererConfig, ShaderPaths};

    // Logging sub-module (types only, NOT macros)
    pub mod log {
        pub use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger};
    }

    // Device sub-module: the trait backends implement, plus its types
    pub mod device {
        pub use crate::graphics_device::*;
    }

    // Render sub-module with the managers
    pub mod render {
        pub use crate::renderer::*;
    }

    // Resource sub-module
    pub mod resource {
        pub use crate::resource::*;
    }

    // Camera sub-module
    pub mod camera {
        pub use crate::camera::*;
    }
}

// Re-export math library at crate root
pub use glam;
