//! Camera module
//!
//! A free-fly camera driven by backend-neutral input snapshots.

mod camera;

pub use camera::{FlyCamera, MovementInput};
