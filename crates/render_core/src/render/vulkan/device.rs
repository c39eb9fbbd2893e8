//! Logical device and command pool

use ash::extensions::khr::Swapchain as SwapchainLoader;
use ash::{vk, Device, Instance};
use std::os::raw::c_char;

use super::adapter::{AdapterInfo, QueueSelection};
use super::capabilities::required_device_extensions;
use super::error::{InitStage, VulkanError, VulkanResult};

/// Logical device wrapper with RAII cleanup
pub struct LogicalDevice {
    /// Vulkan logical device handle
    pub device: Device,
    /// Graphics operations queue
    pub graphics_queue: vk::Queue,
    /// Surface presentation queue, the graphics queue when families match
    pub present_queue: vk::Queue,
    /// Resolved queue family indices
    pub queues: QueueSelection,
    /// Swapchain extension loader
    pub swapchain_loader: SwapchainLoader,
}

/// One queue create info per distinct family
pub fn queue_create_infos(
    queues: &QueueSelection,
    priorities: &[f32],
) -> Vec<vk::DeviceQueueCreateInfo> {
    queues
        .unique_families()
        .into_iter()
        .map(|family| {
            vk::DeviceQueueCreateInfo::builder()
                .queue_family_index(family)
                .queue_priorities(priorities)
                .build()
        })
        .collect()
}

impl LogicalDevice {
    /// Create a new logical device with the graphics and present queues
    pub fn new(
        instance: &Instance,
        adapter: &AdapterInfo,
        queues: QueueSelection,
    ) -> VulkanResult<Self> {
        log::info!("Creating logical device");

        let priorities = [0.0_f32];
        let queue_infos = queue_create_infos(&queues, &priorities);

        let extension_ptrs: Vec<*const c_char> = required_device_extensions()
            .iter()
            .map(|name| name.as_ptr())
            .collect();

        let create_info = vk::DeviceCreateInfo::builder()
            .queue_create_infos(&queue_infos)
            .enabled_extension_names(&extension_ptrs);

        let device = unsafe { instance.create_device(adapter.device, &create_info, None) }
            .map_err(VulkanError::api(InitStage::Device, "vkCreateDevice"))?;

        let graphics_queue = unsafe { device.get_device_queue(queues.graphics, 0) };
        let present_queue = if queues.is_shared() {
            graphics_queue
        } else {
            unsafe { device.get_device_queue(queues.present, 0) }
        };

        let swapchain_loader = SwapchainLoader::new(instance, &device);

        log::info!(
            "Device queues: graphics family {}, present family {}",
            queues.graphics,
            queues.present
        );

        Ok(Self {
            device,
            graphics_queue,
            present_queue,
            queues,
            swapchain_loader,
        })
    }
}

impl Drop for LogicalDevice {
    fn drop(&mut self) {
        unsafe {
            let _ = self.device.device_wait_idle();
            self.device.destroy_device(None);
        }
    }
}

/// Command pool on the graphics family with one primary command buffer
pub struct CommandPool {
    device: Device,
    pool: vk::CommandPool,
    primary: vk::CommandBuffer,
}

impl CommandPool {
    /// Create the pool and allocate its primary command buffer
    pub fn new(device: Device, queue_family_index: u32) -> VulkanResult<Self> {
        log::info!("Creating command pool");

        let pool_info = vk::CommandPoolCreateInfo::builder()
            .queue_family_index(queue_family_index)
            .flags(vk::CommandPoolCreateFlags::RESET_COMMAND_BUFFER);

        let pool = unsafe { device.create_command_pool(&pool_info, None) }
            .map_err(VulkanError::api(InitStage::Commands, "vkCreateCommandPool"))?;

        let alloc_info = vk::CommandBufferAllocateInfo::builder()
            .command_pool(pool)
            .level(vk::CommandBufferLevel::PRIMARY)
            .command_buffer_count(1);

        let primary = match unsafe { device.allocate_command_buffers(&alloc_info) } {
            Ok(buffers) => buffers[0],
            Err(result) => {
                unsafe { device.destroy_command_pool(pool, None) };
                return Err(VulkanError::api(InitStage::Commands, "vkAllocateCommandBuffers")(
                    result,
                ));
            }
        };

        Ok(Self {
            device,
            pool,
            primary,
        })
    }

    /// Pool handle
    pub const fn handle(&self) -> vk::CommandPool {
        self.pool
    }

    /// The primary command buffer, ready to be begun by the renderer
    pub const fn primary(&self) -> vk::CommandBuffer {
        self.primary
    }
}

impl Drop for CommandPool {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_command_pool(self.pool, None);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shared_family_creates_one_queue() {
        let priorities = [0.0];
        let infos = queue_create_infos(&QueueSelection { graphics: 1, present: 1 }, &priorities);

        assert_eq!(infos.len(), 1);
        assert_eq!(infos[0].queue_family_index, 1);
        assert_eq!(infos[0].queue_count, 1);
    }

    #[test]
    fn test_split_families_create_two_queues() {
        let priorities = [0.0];
        let infos = queue_create_infos(&QueueSelection { graphics: 0, present: 2 }, &priorities);

        let families: Vec<u32> = infos.iter().map(|i| i.queue_family_index).collect();
        assert_eq!(families, vec![0, 2]);
    }
}
