/// Graphics device module - backend-neutral GPU types and the device trait

// Module declarations
pub mod graphics_device;
pub mod handles;
pub mod types;
pub mod pipeline;
pub mod command_list;

// Re-export everything from graphics_device.rs
pub use graphics_device::*;

// Re-export from other modules
pub use handles::*;
pub use types::*;
pub use pipeline::*;
pub use command_list::*;

// Mock graphics device for tests (no GPU required)
#[cfg(test)]
pub mod mock_graphics_device;
