//! Depth buffer

use ash::{vk, Device, Instance};

use super::adapter::AdapterInfo;
use super::error::{InitStage, VulkanError, VulkanResult};
use super::memory;

/// Format used when the configuration leaves the depth format unset
pub const DEFAULT_DEPTH_FORMAT: vk::Format = vk::Format::D16_UNORM;

/// Tiling that supports depth attachments for `properties`, linear first
pub fn choose_depth_tiling(properties: &vk::FormatProperties) -> Option<vk::ImageTiling> {
    let feature = vk::FormatFeatureFlags::DEPTH_STENCIL_ATTACHMENT;

    if properties.linear_tiling_features.contains(feature) {
        Some(vk::ImageTiling::LINEAR)
    } else if properties.optimal_tiling_features.contains(feature) {
        Some(vk::ImageTiling::OPTIMAL)
    } else {
        None
    }
}

/// View aspect for a depth format, with stencil for combined formats
pub fn depth_aspect_mask(format: vk::Format) -> vk::ImageAspectFlags {
    match format {
        vk::Format::D16_UNORM_S8_UINT
        | vk::Format::D24_UNORM_S8_UINT
        | vk::Format::D32_SFLOAT_S8_UINT => {
            vk::ImageAspectFlags::DEPTH | vk::ImageAspectFlags::STENCIL
        }
        _ => vk::ImageAspectFlags::DEPTH,
    }
}

/// Depth image with its own memory and view
pub struct DepthBuffer {
    device: Device,
    format: vk::Format,
    image: vk::Image,
    memory: vk::DeviceMemory,
    view: vk::ImageView,
}

impl DepthBuffer {
    /// Create a depth buffer covering `extent`.
    ///
    /// `vk::Format::UNDEFINED` selects [`DEFAULT_DEPTH_FORMAT`].
    pub fn new(
        device: Device,
        instance: &Instance,
        adapter: &AdapterInfo,
        format: vk::Format,
        extent: vk::Extent2D,
    ) -> VulkanResult<Self> {
        let format = if format == vk::Format::UNDEFINED {
            DEFAULT_DEPTH_FORMAT
        } else {
            format
        };
        log::info!("Creating depth buffer {:?} {}x{}", format, extent.width, extent.height);

        let properties =
            unsafe { instance.get_physical_device_format_properties(adapter.device, format) };
        let tiling = choose_depth_tiling(&properties).ok_or(VulkanError::UnsupportedDepthFormat(format))?;
        log::debug!("Depth tiling: {:?}", tiling);

        let image_info = vk::ImageCreateInfo::builder()
            .image_type(vk::ImageType::TYPE_2D)
            .format(format)
            .extent(vk::Extent3D {
                width: extent.width,
                height: extent.height,
                depth: 1,
            })
            .mip_levels(1)
            .array_layers(1)
            .samples(vk::SampleCountFlags::TYPE_1)
            .tiling(tiling)
            .initial_layout(vk::ImageLayout::UNDEFINED)
            .usage(vk::ImageUsageFlags::DEPTH_STENCIL_ATTACHMENT)
            .sharing_mode(vk::SharingMode::EXCLUSIVE);

        let image = unsafe { device.create_image(&image_info, None) }
            .map_err(VulkanError::api(InitStage::DepthBuffer, "vkCreateImage"))?;

        let requirements = unsafe { device.get_image_memory_requirements(image) };
        let memory = match memory::allocate(
            &device,
            &adapter.memory_properties,
            requirements,
            vk::MemoryPropertyFlags::DEVICE_LOCAL,
            InitStage::DepthBuffer,
        ) {
            Ok(memory) => memory,
            Err(err) => {
                unsafe { device.destroy_image(image, None) };
                return Err(err);
            }
        };

        // From here on Drop owns the image and memory
        let mut this = Self {
            device,
            format,
            image,
            memory,
            view: vk::ImageView::null(),
        };

        unsafe { this.device.bind_image_memory(image, memory, 0) }
            .map_err(VulkanError::api(InitStage::DepthBuffer, "vkBindImageMemory"))?;

        let view_info = vk::ImageViewCreateInfo::builder()
            .image(image)
            .view_type(vk::ImageViewType::TYPE_2D)
            .format(format)
            .components(vk::ComponentMapping {
                r: vk::ComponentSwizzle::R,
                g: vk::ComponentSwizzle::G,
                b: vk::ComponentSwizzle::B,
                a: vk::ComponentSwizzle::A,
            })
            .subresource_range(vk::ImageSubresourceRange {
                aspect_mask: depth_aspect_mask(format),
                base_mip_level: 0,
                level_count: 1,
                base_array_layer: 0,
                layer_count: 1,
            });

        this.view = unsafe { this.device.create_image_view(&view_info, None) }
            .map_err(VulkanError::api(InitStage::DepthBuffer, "vkCreateImageView"))?;

        Ok(this)
    }

    /// Depth format actually used
    pub const fn format(&self) -> vk::Format {
        self.format
    }

    /// Image handle
    pub const fn image(&self) -> vk::Image {
        self.image
    }

    /// Backing memory
    pub const fn memory(&self) -> vk::DeviceMemory {
        self.memory
    }

    /// Image view handle
    pub const fn view(&self) -> vk::ImageView {
        self.view
    }
}

impl Drop for DepthBuffer {
    fn drop(&mut self) {
        unsafe {
            if self.view != vk::ImageView::null() {
                self.device.destroy_image_view(self.view, None);
            }
            self.device.destroy_image(self.image, None);
            self.device.free_memory(self.memory, None);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEPTH: vk::FormatFeatureFlags = vk::FormatFeatureFlags::DEPTH_STENCIL_ATTACHMENT;

    fn props(linear: vk::FormatFeatureFlags, optimal: vk::FormatFeatureFlags) -> vk::FormatProperties {
        vk::FormatProperties {
            linear_tiling_features: linear,
            optimal_tiling_features: optimal,
            ..Default::default()
        }
    }

    #[test]
    fn test_linear_tiling_preferred() {
        assert_eq!(choose_depth_tiling(&props(DEPTH, DEPTH)), Some(vk::ImageTiling::LINEAR));
    }

    #[test]
    fn test_optimal_tiling_fallback() {
        let optimal_only = props(vk::FormatFeatureFlags::SAMPLED_IMAGE, DEPTH);
        assert_eq!(choose_depth_tiling(&optimal_only), Some(vk::ImageTiling::OPTIMAL));
    }

    #[test]
    fn test_no_depth_tiling() {
        let none = props(vk::FormatFeatureFlags::SAMPLED_IMAGE, vk::FormatFeatureFlags::empty());
        assert_eq!(choose_depth_tiling(&none), None);
    }

    #[test]
    fn test_stencil_aspect_for_combined_formats() {
        let both = vk::ImageAspectFlags::DEPTH | vk::ImageAspectFlags::STENCIL;

        assert_eq!(depth_aspect_mask(vk::Format::D16_UNORM), vk::ImageAspectFlags::DEPTH);
        assert_eq!(depth_aspect_mask(vk::Format::D32_SFLOAT), vk::ImageAspectFlags::DEPTH);
        assert_eq!(depth_aspect_mask(vk::Format::D16_UNORM_S8_UINT), both);
        assert_eq!(depth_aspect_mask(vk::Format::D24_UNORM_S8_UINT), both);
        assert_eq!(depth_aspect_mask(vk::Format::D32_SFLOAT_S8_UINT), both);
    }
}
