//! # Render Core
//!
//! Brings up a Vulkan rendering context: discovers layers and extensions,
//! picks an adapter and its graphics/present queue families, negotiates a
//! swapchain for a presentation surface and provisions the baseline
//! resources a renderer needs before its first draw.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use render_core::prelude::*;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = RenderCoreConfig::default();
//!     let mut window = Window::new(&config.window.title, config.window.width, config.window.height)?;
//!     let context = RenderContext::new(&config, &mut window)?;
//!     println!("{} swapchain images", context.swapchain().images().len());
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]

pub mod config;
pub mod foundation;
pub mod render;

/// Common imports for crate users
pub mod prelude {
    pub use crate::config::{Config, ConfigError, DepthFormat, RenderCoreConfig};
    pub use crate::foundation::math::{Mat4, Point3, Vec3};
    pub use crate::render::camera::TransformState;
    pub use crate::render::vulkan::{
        InitStage, PresentationTarget, RenderContext, VulkanError, VulkanResult,
    };
    #[cfg(feature = "glfw-window")]
    pub use crate::render::vulkan::{Window, WindowError};
}
