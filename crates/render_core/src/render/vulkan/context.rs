//! Vulkan context management
//!
//! [`RenderContext::new`] runs every setup stage in order and hands back the
//! finished context, or the first fatal error. Field order is teardown order.

use ash::{vk, Device, Entry, Instance};

use super::adapter::{AdapterInfo, QueueSelection};
use super::capabilities::CapabilityInventory;
use super::depth::DepthBuffer;
use super::device::{CommandPool, LogicalDevice};
use super::error::VulkanResult;
use super::instance::{load_entry, VulkanInstance};
use super::layout::PipelineLayouts;
use super::render_pass::{RenderPass, RenderPassDesc};
use super::surface::{PresentationSurface, PresentationTarget};
use super::swapchain::{SurfaceConfig, SurfaceSupport, Swapchain};
use super::uniform_buffer::UniformBuffer;
use crate::config::RenderCoreConfig;
use crate::render::camera::TransformState;

/// Everything a renderer needs before it records its first command buffer
pub struct RenderContext {
    render_pass: RenderPass,
    layouts: PipelineLayouts,
    uniform: UniformBuffer,
    depth: DepthBuffer,
    swapchain: Swapchain,
    commands: CommandPool,
    device: LogicalDevice,
    surface: PresentationSurface,
    instance: VulkanInstance,
    adapter: AdapterInfo,
    inventory: CapabilityInventory,
    transform: TransformState,
}

impl RenderContext {
    /// Bring up the full context for `target`
    pub fn new<T>(config: &RenderCoreConfig, target: &mut T) -> VulkanResult<Self>
    where
        T: PresentationTarget + ?Sized,
    {
        log::info!("Initializing render context for {}", config.application_name);

        let entry = load_entry()?;
        let mut inventory = CapabilityInventory::collect(&entry)?;

        let platform_extensions = target.required_instance_extensions()?;
        let instance = VulkanInstance::new(entry, config, &inventory, &platform_extensions)?;

        let surface = PresentationSurface::new(&instance.entry, &instance.instance, target)?;

        let adapter = AdapterInfo::select_first(&instance.instance)?;
        inventory.collect_device_extensions(&instance.instance, adapter.device)?;

        let present_support = adapter.present_support(&surface)?;
        let queues = QueueSelection::resolve(&adapter.queue_families, &present_support)?;

        let device = LogicalDevice::new(&instance.instance, &adapter, queues)?;
        let commands = CommandPool::new(device.device.clone(), queues.graphics)?;

        let support = SurfaceSupport::query(&surface, &adapter)?;
        let surface_config = SurfaceConfig::negotiate(&support, target.framebuffer_extent(), &queues)?;
        let swapchain = Swapchain::new(
            device.device.clone(),
            device.swapchain_loader.clone(),
            &surface,
            surface_config,
            vk::ImageUsageFlags::COLOR_ATTACHMENT,
        )?;
        let extent = swapchain.extent();

        let depth = DepthBuffer::new(
            device.device.clone(),
            &instance.instance,
            &adapter,
            config.depth_format.to_vk(),
            extent,
        )?;

        let transform = TransformState::for_extent(extent.width, extent.height);
        let uniform = UniformBuffer::new(device.device.clone(), &adapter, &transform)?;

        let layouts = PipelineLayouts::new(device.device.clone())?;

        let depth_format = config.render_pass.include_depth.then(|| depth.format());
        let desc = RenderPassDesc::presentable(swapchain.format(), depth_format, config.render_pass.clear);
        let render_pass = RenderPass::new(device.device.clone(), &desc)?;

        log::info!("Render context ready");

        Ok(Self {
            render_pass,
            layouts,
            uniform,
            depth,
            swapchain,
            commands,
            device,
            surface,
            instance,
            adapter,
            inventory,
            transform,
        })
    }

    /// Vulkan entry point
    pub fn entry(&self) -> &Entry {
        &self.instance.entry
    }

    /// Vulkan instance
    pub fn instance(&self) -> &Instance {
        &self.instance.instance
    }

    /// Layers and extensions discovered during setup
    pub const fn capabilities(&self) -> &CapabilityInventory {
        &self.inventory
    }

    /// Selected adapter
    pub const fn adapter(&self) -> &AdapterInfo {
        &self.adapter
    }

    /// Presentation surface
    pub const fn surface(&self) -> &PresentationSurface {
        &self.surface
    }

    /// Logical device
    pub const fn device(&self) -> &Device {
        &self.device.device
    }

    /// Resolved graphics and present families
    pub const fn queue_selection(&self) -> QueueSelection {
        self.device.queues
    }

    /// Graphics queue
    pub const fn graphics_queue(&self) -> vk::Queue {
        self.device.graphics_queue
    }

    /// Present queue
    pub const fn present_queue(&self) -> vk::Queue {
        self.device.present_queue
    }

    /// Command pool and its primary command buffer
    pub const fn commands(&self) -> &CommandPool {
        &self.commands
    }

    /// Swapchain and its images
    pub const fn swapchain(&self) -> &Swapchain {
        &self.swapchain
    }

    /// Depth buffer
    pub const fn depth(&self) -> &DepthBuffer {
        &self.depth
    }

    /// Uniform buffer holding the transform product
    pub const fn uniform(&self) -> &UniformBuffer {
        &self.uniform
    }

    /// Descriptor set and pipeline layouts
    pub const fn layouts(&self) -> &PipelineLayouts {
        &self.layouts
    }

    /// Render pass
    pub const fn render_pass(&self) -> &RenderPass {
        &self.render_pass
    }

    /// Transform currently stored in the uniform buffer
    pub const fn transform(&self) -> &TransformState {
        &self.transform
    }

    /// Modify the transform and push the new product to the uniform buffer
    pub fn update_transform<F>(&mut self, update: F) -> VulkanResult<()>
    where
        F: FnOnce(&mut TransformState),
    {
        update(&mut self.transform);
        self.uniform.upload(&self.transform)
    }
}
