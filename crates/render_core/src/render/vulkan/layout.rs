//! Descriptor set layout and pipeline layout for the uniform transform

use ash::{vk, Device};

use super::error::{InitStage, VulkanError, VulkanResult};

/// Binding slot of the transform uniform
pub const UNIFORM_BINDING: u32 = 0;

/// Vertex-stage uniform buffer at [`UNIFORM_BINDING`]
pub fn uniform_binding() -> vk::DescriptorSetLayoutBinding {
    vk::DescriptorSetLayoutBinding::builder()
        .binding(UNIFORM_BINDING)
        .descriptor_type(vk::DescriptorType::UNIFORM_BUFFER)
        .descriptor_count(1)
        .stage_flags(vk::ShaderStageFlags::VERTEX)
        .build()
}

/// Descriptor set layout plus a single-set pipeline layout
pub struct PipelineLayouts {
    device: Device,
    descriptor_set_layout: vk::DescriptorSetLayout,
    pipeline_layout: vk::PipelineLayout,
}

impl PipelineLayouts {
    /// Create both layouts
    pub fn new(device: Device) -> VulkanResult<Self> {
        log::info!("Creating descriptor set and pipeline layouts");

        let bindings = [uniform_binding()];
        let set_info = vk::DescriptorSetLayoutCreateInfo::builder().bindings(&bindings);

        let descriptor_set_layout = unsafe { device.create_descriptor_set_layout(&set_info, None) }
            .map_err(VulkanError::api(InitStage::Layouts, "vkCreateDescriptorSetLayout"))?;

        let set_layouts = [descriptor_set_layout];
        let pipeline_info = vk::PipelineLayoutCreateInfo::builder().set_layouts(&set_layouts);

        let pipeline_layout = match unsafe { device.create_pipeline_layout(&pipeline_info, None) } {
            Ok(layout) => layout,
            Err(result) => {
                unsafe { device.destroy_descriptor_set_layout(descriptor_set_layout, None) };
                return Err(VulkanError::api(InitStage::Layouts, "vkCreatePipelineLayout")(result));
            }
        };

        Ok(Self {
            device,
            descriptor_set_layout,
            pipeline_layout,
        })
    }

    /// Descriptor set layout handle
    pub const fn descriptor_set_layout(&self) -> vk::DescriptorSetLayout {
        self.descriptor_set_layout
    }

    /// Pipeline layout handle
    pub const fn pipeline_layout(&self) -> vk::PipelineLayout {
        self.pipeline_layout
    }
}

impl Drop for PipelineLayouts {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_pipeline_layout(self.pipeline_layout, None);
            self.device.destroy_descriptor_set_layout(self.descriptor_set_layout, None);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_binding_shape() {
        let binding = uniform_binding();

        assert_eq!(binding.binding, 0);
        assert_eq!(binding.descriptor_type, vk::DescriptorType::UNIFORM_BUFFER);
        assert_eq!(binding.descriptor_count, 1);
        assert_eq!(binding.stage_flags, vk::ShaderStageFlags::VERTEX);
        assert!(binding.p_immutable_samplers.is_null());
    }
}
