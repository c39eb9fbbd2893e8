//! Rendering: the transform carried by the uniform buffer and the Vulkan
//! backend that sets everything up

pub mod camera;
pub mod vulkan;

pub use camera::TransformState;
