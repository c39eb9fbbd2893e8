//! Uniform buffer holding the model-view-projection matrix
//!
//! The buffer lives in host-visible, host-coherent memory and is written with
//! a map / copy / unmap cycle, so no flush is needed after an upload.

use ash::{vk, Device};
use std::mem;

use super::adapter::AdapterInfo;
use super::error::{InitStage, VulkanError, VulkanResult};
use super::memory;
use crate::foundation::math::Mat4;
use crate::render::camera::TransformState;

/// Size of the uniform payload: one 4x4 f32 matrix
pub const UNIFORM_SIZE: vk::DeviceSize = mem::size_of::<Mat4>() as vk::DeviceSize;

/// Copy `bytes` to the start of a mapped region.
///
/// # Panics
/// If the region is smaller than the payload.
pub fn copy_to_mapped(mapped: &mut [u8], bytes: &[u8]) {
    assert!(
        mapped.len() >= bytes.len(),
        "mapped region of {} bytes cannot hold {} bytes",
        mapped.len(),
        bytes.len()
    );
    mapped[..bytes.len()].copy_from_slice(bytes);
}

/// Uniform buffer with exclusively owned memory
pub struct UniformBuffer {
    device: Device,
    buffer: vk::Buffer,
    memory: vk::DeviceMemory,
    size: vk::DeviceSize,
    descriptor: vk::DescriptorBufferInfo,
}

impl UniformBuffer {
    /// Create the buffer, fill it with the transform product and bind it
    pub fn new(device: Device, adapter: &AdapterInfo, transform: &TransformState) -> VulkanResult<Self> {
        log::info!("Creating uniform buffer ({} bytes)", UNIFORM_SIZE);

        let buffer_info = vk::BufferCreateInfo::builder()
            .size(UNIFORM_SIZE)
            .usage(vk::BufferUsageFlags::UNIFORM_BUFFER)
            .sharing_mode(vk::SharingMode::EXCLUSIVE);

        let buffer = unsafe { device.create_buffer(&buffer_info, None) }
            .map_err(VulkanError::api(InitStage::UniformBuffer, "vkCreateBuffer"))?;

        let requirements = unsafe { device.get_buffer_memory_requirements(buffer) };
        let memory = match memory::allocate(
            &device,
            &adapter.memory_properties,
            requirements,
            vk::MemoryPropertyFlags::HOST_VISIBLE | vk::MemoryPropertyFlags::HOST_COHERENT,
            InitStage::UniformBuffer,
        ) {
            Ok(memory) => memory,
            Err(err) => {
                unsafe { device.destroy_buffer(buffer, None) };
                return Err(err);
            }
        };

        let this = Self {
            device,
            buffer,
            memory,
            size: requirements.size,
            descriptor: vk::DescriptorBufferInfo {
                buffer,
                offset: 0,
                range: UNIFORM_SIZE,
            },
        };

        this.upload(transform)?;

        unsafe { this.device.bind_buffer_memory(buffer, memory, 0) }
            .map_err(VulkanError::api(InitStage::UniformBuffer, "vkBindBufferMemory"))?;

        Ok(this)
    }

    /// Push the current transform product into the buffer
    pub fn upload(&self, transform: &TransformState) -> VulkanResult<()> {
        let bytes = transform.mvp_bytes();

        unsafe {
            let ptr = self
                .device
                .map_memory(self.memory, 0, self.size, vk::MemoryMapFlags::empty())
                .map_err(VulkanError::api(InitStage::UniformBuffer, "vkMapMemory"))?;

            let mapped = std::slice::from_raw_parts_mut(ptr.cast::<u8>(), self.size as usize);
            copy_to_mapped(mapped, bytes);

            self.device.unmap_memory(self.memory);
        }

        log::trace!("Uploaded {} bytes of uniform data", bytes.len());
        Ok(())
    }

    /// Buffer handle
    pub const fn buffer(&self) -> vk::Buffer {
        self.buffer
    }

    /// Backing memory
    pub const fn memory(&self) -> vk::DeviceMemory {
        self.memory
    }

    /// Descriptor info covering the whole matrix
    pub const fn descriptor_info(&self) -> vk::DescriptorBufferInfo {
        self.descriptor
    }
}

impl Drop for UniformBuffer {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_buffer(self.buffer, None);
            self.device.free_memory(self.memory, None);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_size_is_one_matrix() {
        assert_eq!(UNIFORM_SIZE, 64);
    }

    #[test]
    fn test_product_round_trips_through_mapped_region() {
        let transform = TransformState::for_extent(640, 480);
        // Drivers round allocations up, so the region is usually larger
        let mut region = vec![0_u8; 256];

        copy_to_mapped(&mut region, transform.mvp_bytes());

        let floats: Vec<f32> = region[..64]
            .chunks_exact(4)
            .map(|chunk| f32::from_ne_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect();
        assert_eq!(floats.as_slice(), transform.mvp().as_slice());
        assert!(region[64..].iter().all(|&b| b == 0));
    }

    #[test]
    #[should_panic(expected = "cannot hold")]
    fn test_short_region_panics() {
        let transform = TransformState::for_extent(640, 480);
        let mut region = vec![0_u8; 16];
        copy_to_mapped(&mut region, transform.mvp_bytes());
    }
}
