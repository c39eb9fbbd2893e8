//! Vulkan bootstrap errors
//!
//! Every failure during context setup is unrecoverable. Stages return
//! `VulkanResult` and the caller at the very top decides to terminate.

use ash::vk;
use std::fmt;
use thiserror::Error;

/// Ordered initialization stages, used to label fatal errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitStage {
    /// Loading the Vulkan entry points
    Loader,
    /// Enumerating layers and extensions
    CapabilityInventory,
    /// Creating the instance and debug messenger
    Instance,
    /// Creating the presentation surface
    Surface,
    /// Enumerating adapters and reading their tables
    Adapter,
    /// Resolving graphics and present queue families
    QueueSelection,
    /// Creating the logical device and fetching queues
    Device,
    /// Creating the command pool and primary command buffer
    Commands,
    /// Negotiating and creating the swapchain
    Swapchain,
    /// Creating the depth image
    DepthBuffer,
    /// Creating and filling the uniform buffer
    UniformBuffer,
    /// Creating descriptor-set and pipeline layouts
    Layouts,
    /// Creating the render pass
    RenderPass,
}

impl fmt::Display for InitStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Loader => "loader",
            Self::CapabilityInventory => "capability inventory",
            Self::Instance => "instance",
            Self::Surface => "surface",
            Self::Adapter => "adapter",
            Self::QueueSelection => "queue selection",
            Self::Device => "device",
            Self::Commands => "command pool",
            Self::Swapchain => "swapchain",
            Self::DepthBuffer => "depth buffer",
            Self::UniformBuffer => "uniform buffer",
            Self::Layouts => "descriptor/pipeline layouts",
            Self::RenderPass => "render pass",
        };
        f.write_str(name)
    }
}

/// Vulkan-specific error types
#[derive(Error, Debug)]
pub enum VulkanError {
    /// Vulkan API call failed
    #[error("[{stage}] {call} failed: {result:?}")]
    Api {
        /// Stage that issued the call
        stage: InitStage,
        /// Name of the failing entry point
        call: &'static str,
        /// Result code reported by the driver
        result: vk::Result,
    },

    /// The Vulkan loader library could not be loaded
    #[error("[loader] failed to load Vulkan: {0}")]
    Loading(String),

    /// No physical device is exposed by the driver stack
    #[error("[adapter] no Vulkan-capable adapter found")]
    NoAdapter,

    /// The selected adapter reports no queue families
    #[error("[adapter] adapter reports no queue families")]
    NoQueueFamilies,

    /// Graphics and present queue families could not both be resolved
    #[error("[queue selection] could not find queues for both graphics and present (graphics: {graphics:?}, present: {present:?})")]
    QueueSelection {
        /// Graphics family, if any was found
        graphics: Option<u32>,
        /// Present family, if any was found
        present: Option<u32>,
    },

    /// The surface reports no formats
    #[error("[swapchain] surface reports no formats")]
    NoSurfaceFormats,

    /// The surface reports no present modes
    #[error("[swapchain] surface reports no present modes")]
    NoPresentModes,

    /// The swapchain was created without images
    #[error("[swapchain] swapchain has no images")]
    NoSwapchainImages,

    /// None of the known composite alpha modes is supported
    #[error("[swapchain] no supported composite alpha mode in {0:?}")]
    NoCompositeAlpha(vk::CompositeAlphaFlagsKHR),

    /// Depth format supports neither linear nor optimal depth attachments
    #[error("[depth buffer] depth format {0:?} unsupported")]
    UnsupportedDepthFormat(vk::Format),

    /// No memory type satisfies the resource's type bits and property flags
    #[error("[{stage}] no memory type in bits {type_bits:#b} with {required:?}")]
    NoSuitableMemoryType {
        /// Stage allocating the memory
        stage: InitStage,
        /// Memory type bits reported by the resource requirements
        type_bits: u32,
        /// Property flags the memory must have
        required: vk::MemoryPropertyFlags,
    },

    /// Surface creation by the presentation backend failed
    #[error("[surface] {0}")]
    Surface(String),

    /// A name handed to Vulkan contained an interior NUL byte
    #[error("[{stage}] invalid name {name:?}")]
    InvalidName {
        /// Stage that built the name
        stage: InitStage,
        /// Offending name
        name: String,
    },
}

impl VulkanError {
    /// Stage that produced this error
    pub const fn stage(&self) -> InitStage {
        match self {
            Self::Api { stage, .. }
            | Self::NoSuitableMemoryType { stage, .. }
            | Self::InvalidName { stage, .. } => *stage,
            Self::Loading(_) => InitStage::Loader,
            Self::NoAdapter | Self::NoQueueFamilies => InitStage::Adapter,
            Self::QueueSelection { .. } => InitStage::QueueSelection,
            Self::NoSurfaceFormats
            | Self::NoPresentModes
            | Self::NoSwapchainImages
            | Self::NoCompositeAlpha(_) => InitStage::Swapchain,
            Self::UnsupportedDepthFormat(_) => InitStage::DepthBuffer,
            Self::Surface(_) => InitStage::Surface,
        }
    }

    /// Build a `map_err` adapter for a failing API call
    pub fn api(stage: InitStage, call: &'static str) -> impl Fn(vk::Result) -> Self {
        move |result| Self::Api {
            stage,
            call,
            result,
        }
    }
}

/// Result type for Vulkan operations
pub type VulkanResult<T> = Result<T, VulkanError>;
