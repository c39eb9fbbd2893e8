//! Vulkan backend
//!
//! Setup stages, leaf first: capability inventory, adapter and queue
//! selection, surface negotiation, memory type resolution, baseline resources
//! and the render pass. [`RenderContext`] strings them together.

pub mod adapter;
pub mod capabilities;
pub mod context;
pub mod depth;
pub mod device;
pub mod enumerate;
pub mod error;
pub mod instance;
pub mod layout;
pub mod memory;
pub mod render_pass;
pub mod surface;
pub mod swapchain;
pub mod uniform_buffer;
#[cfg(feature = "glfw-window")]
pub mod window;

pub use adapter::{queue_flags_string, AdapterInfo, QueueSelection};
pub use capabilities::{CapabilityInventory, LayerRecord};
pub use context::RenderContext;
pub use depth::DepthBuffer;
pub use device::{CommandPool, LogicalDevice};
pub use error::{InitStage, VulkanError, VulkanResult};
pub use instance::VulkanInstance;
pub use layout::PipelineLayouts;
pub use render_pass::{RenderPass, RenderPassDesc};
#[cfg(feature = "raw-window")]
pub use surface::RawWindowTarget;
pub use surface::{PresentationSurface, PresentationTarget};
pub use swapchain::{SharingConfig, SurfaceConfig, SurfaceSupport, SwapImage, Swapchain};
pub use uniform_buffer::UniformBuffer;
#[cfg(feature = "glfw-window")]
pub use window::{Window, WindowError, WindowResult};
