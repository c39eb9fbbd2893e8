//! Vulkan swapchain negotiation and creation
//!
//! Negotiation is split from creation: [`SurfaceConfig::negotiate`] is a pure
//! function of what the surface reports and what the application asked for,
//! [`Swapchain::new`] turns the result into handles.

use ash::extensions::khr::Swapchain as SwapchainLoader;
use ash::{vk, Device};

use super::adapter::{AdapterInfo, QueueSelection};
use super::enumerate::enumerate;
use super::error::{InitStage, VulkanError, VulkanResult};
use super::surface::PresentationSurface;

/// Color format preferred over whatever the surface lists first
pub const PREFERRED_FORMAT: vk::Format = vk::Format::B8G8R8A8_UNORM;

/// Composite alpha modes in order of preference
pub const COMPOSITE_ALPHA_PREFERENCE: [vk::CompositeAlphaFlagsKHR; 4] = [
    vk::CompositeAlphaFlagsKHR::OPAQUE,
    vk::CompositeAlphaFlagsKHR::PRE_MULTIPLIED,
    vk::CompositeAlphaFlagsKHR::POST_MULTIPLIED,
    vk::CompositeAlphaFlagsKHR::INHERIT,
];

/// Everything the surface reports for an adapter
#[derive(Debug, Clone)]
pub struct SurfaceSupport {
    /// Surface capabilities
    pub capabilities: vk::SurfaceCapabilitiesKHR,
    /// Supported formats, in driver order
    pub formats: Vec<vk::SurfaceFormatKHR>,
    /// Supported present modes, in driver order
    pub present_modes: Vec<vk::PresentModeKHR>,
}

impl SurfaceSupport {
    /// Query capabilities, formats and present modes
    pub fn query(surface: &PresentationSurface, adapter: &AdapterInfo) -> VulkanResult<Self> {
        Ok(Self {
            capabilities: surface.capabilities(adapter.device)?,
            formats: surface.formats(adapter.device)?,
            present_modes: surface.present_modes(adapter.device)?,
        })
    }
}

/// How swapchain images are shared between queue families
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SharingConfig {
    /// One family owns the images
    Exclusive,
    /// Images are used concurrently by exactly these families
    Concurrent([u32; 2]),
}

impl SharingConfig {
    /// Exclusive when both queues share a family, concurrent otherwise
    pub const fn for_queues(queues: &QueueSelection) -> Self {
        if queues.graphics == queues.present {
            Self::Exclusive
        } else {
            Self::Concurrent([queues.graphics, queues.present])
        }
    }

    /// Vulkan sharing mode
    pub const fn mode(&self) -> vk::SharingMode {
        match self {
            Self::Exclusive => vk::SharingMode::EXCLUSIVE,
            Self::Concurrent(_) => vk::SharingMode::CONCURRENT,
        }
    }

    /// Queue family indices to declare, empty for exclusive sharing
    pub fn family_indices(&self) -> &[u32] {
        match self {
            Self::Exclusive => &[],
            Self::Concurrent(families) => families.as_slice(),
        }
    }
}

/// Negotiated swapchain parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurfaceConfig {
    /// Image format and color space
    pub format: vk::SurfaceFormatKHR,
    /// Present mode
    pub present_mode: vk::PresentModeKHR,
    /// Image extent
    pub extent: vk::Extent2D,
    /// Minimum image count requested from the driver
    pub image_count: u32,
    /// Surface pre-transform
    pub pre_transform: vk::SurfaceTransformFlagsKHR,
    /// Composite alpha mode
    pub composite_alpha: vk::CompositeAlphaFlagsKHR,
    /// Queue family sharing
    pub sharing: SharingConfig,
}

impl SurfaceConfig {
    /// Resolve every swapchain parameter from what the surface supports
    pub fn negotiate(
        support: &SurfaceSupport,
        requested: vk::Extent2D,
        queues: &QueueSelection,
    ) -> VulkanResult<Self> {
        let caps = &support.capabilities;

        if support.present_modes.is_empty() {
            return Err(VulkanError::NoPresentModes);
        }

        let config = Self {
            format: resolve_format(&support.formats)?,
            present_mode: resolve_present_mode(),
            extent: resolve_extent(caps, requested),
            image_count: caps.min_image_count,
            pre_transform: resolve_pre_transform(caps),
            composite_alpha: resolve_composite_alpha(caps.supported_composite_alpha)?,
            sharing: SharingConfig::for_queues(queues),
        };

        log::info!(
            "Swapchain: {:?} {}x{}, {} images, {:?}, {:?}",
            config.format.format,
            config.extent.width,
            config.extent.height,
            config.image_count,
            config.present_mode,
            config.sharing.mode()
        );
        Ok(config)
    }
}

/// Requested extent clamped into the surface bounds when the surface leaves
/// the size to the application, otherwise the surface's current extent
pub fn resolve_extent(caps: &vk::SurfaceCapabilitiesKHR, requested: vk::Extent2D) -> vk::Extent2D {
    if caps.current_extent.width != u32::MAX {
        return caps.current_extent;
    }

    vk::Extent2D {
        width: requested
            .width
            .max(caps.min_image_extent.width)
            .min(caps.max_image_extent.width),
        height: requested
            .height
            .max(caps.min_image_extent.height)
            .min(caps.max_image_extent.height),
    }
}

/// The preferred BGRA format wherever it appears, else the first entry
pub fn resolve_format(formats: &[vk::SurfaceFormatKHR]) -> VulkanResult<vk::SurfaceFormatKHR> {
    let first = *formats.first().ok_or(VulkanError::NoSurfaceFormats)?;

    Ok(formats
        .iter()
        .find(|sf| sf.format == PREFERRED_FORMAT)
        .map_or(first, |sf| vk::SurfaceFormatKHR {
            format: PREFERRED_FORMAT,
            color_space: sf.color_space,
        }))
}

/// FIFO is the only mode every implementation must support
pub const fn resolve_present_mode() -> vk::PresentModeKHR {
    vk::PresentModeKHR::FIFO
}

/// Identity when supported, else whatever the surface currently uses
pub fn resolve_pre_transform(caps: &vk::SurfaceCapabilitiesKHR) -> vk::SurfaceTransformFlagsKHR {
    if caps
        .supported_transforms
        .contains(vk::SurfaceTransformFlagsKHR::IDENTITY)
    {
        vk::SurfaceTransformFlagsKHR::IDENTITY
    } else {
        caps.current_transform
    }
}

/// First supported mode from [`COMPOSITE_ALPHA_PREFERENCE`]
pub fn resolve_composite_alpha(
    supported: vk::CompositeAlphaFlagsKHR,
) -> VulkanResult<vk::CompositeAlphaFlagsKHR> {
    COMPOSITE_ALPHA_PREFERENCE
        .iter()
        .copied()
        .find(|&mode| supported.contains(mode))
        .ok_or(VulkanError::NoCompositeAlpha(supported))
}

/// One presentable image and its view
#[derive(Debug, Clone, Copy)]
pub struct SwapImage {
    /// Image owned by the swapchain
    pub image: vk::Image,
    /// View created for the image
    pub view: vk::ImageView,
}

/// Swapchain management wrapper with RAII cleanup
pub struct Swapchain {
    device: Device,
    loader: SwapchainLoader,
    swapchain: vk::SwapchainKHR,
    images: Vec<SwapImage>,
    config: SurfaceConfig,
}

impl Swapchain {
    /// Create the swapchain and one view per image
    pub fn new(
        device: Device,
        loader: SwapchainLoader,
        surface: &PresentationSurface,
        config: SurfaceConfig,
        usage: vk::ImageUsageFlags,
    ) -> VulkanResult<Self> {
        log::info!("Creating swapchain");

        let create_info = vk::SwapchainCreateInfoKHR::builder()
            .surface(surface.handle())
            .min_image_count(config.image_count)
            .image_format(config.format.format)
            .image_color_space(vk::ColorSpaceKHR::SRGB_NONLINEAR)
            .image_extent(config.extent)
            .image_array_layers(1)
            .image_usage(usage)
            .image_sharing_mode(config.sharing.mode())
            .queue_family_indices(config.sharing.family_indices())
            .pre_transform(config.pre_transform)
            .composite_alpha(config.composite_alpha)
            .present_mode(config.present_mode)
            .clipped(cfg!(target_os = "android"))
            .old_swapchain(vk::SwapchainKHR::null());

        let swapchain = unsafe { loader.create_swapchain(&create_info, None) }
            .map_err(VulkanError::api(InitStage::Swapchain, "vkCreateSwapchainKHR"))?;

        let mut this = Self {
            device,
            loader,
            swapchain,
            images: Vec::new(),
            config,
        };

        let fp = this.loader.fp();
        let device_handle = this.device.handle();
        let images: Vec<vk::Image> = enumerate(|count, data| unsafe {
            (fp.get_swapchain_images_khr)(device_handle, swapchain, count, data)
        })
        .map_err(VulkanError::api(InitStage::Swapchain, "vkGetSwapchainImagesKHR"))?;

        if images.is_empty() {
            return Err(VulkanError::NoSwapchainImages);
        }

        // Views are pushed as they are created so Drop cleans up a partial set
        for image in images {
            let view = create_color_view(&this.device, image, this.config.format.format)?;
            this.images.push(SwapImage { image, view });
        }

        log::info!("Swapchain created with {} images", this.images.len());
        Ok(this)
    }

    /// Negotiated parameters
    pub const fn config(&self) -> &SurfaceConfig {
        &self.config
    }

    /// Swapchain extent
    pub const fn extent(&self) -> vk::Extent2D {
        self.config.extent
    }

    /// Color format of the images
    pub const fn format(&self) -> vk::Format {
        self.config.format.format
    }

    /// Images and views, indexed by presentation slot
    pub fn images(&self) -> &[SwapImage] {
        &self.images
    }

    /// Swapchain handle
    pub const fn handle(&self) -> vk::SwapchainKHR {
        self.swapchain
    }

    /// Swapchain loader
    pub const fn loader(&self) -> &SwapchainLoader {
        &self.loader
    }
}

fn create_color_view(device: &Device, image: vk::Image, format: vk::Format) -> VulkanResult<vk::ImageView> {
    let create_info = vk::ImageViewCreateInfo::builder()
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
            aspect_mask: vk::ImageAspectFlags::COLOR,
            base_mip_level: 0,
            level_count: 1,
            base_array_layer: 0,
            layer_count: 1,
        });

    unsafe { device.create_image_view(&create_info, None) }
        .map_err(VulkanError::api(InitStage::Swapchain, "vkCreateImageView"))
}

impl Drop for Swapchain {
    fn drop(&mut self) {
        unsafe {
            for image in &self.images {
                self.device.destroy_image_view(image.view, None);
            }
            self.loader.destroy_swapchain(self.swapchain, None);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caps(current: (u32, u32), min: (u32, u32), max: (u32, u32)) -> vk::SurfaceCapabilitiesKHR {
        vk::SurfaceCapabilitiesKHR {
            min_image_count: 2,
            max_image_count: 8,
            current_extent: vk::Extent2D { width: current.0, height: current.1 },
            min_image_extent: vk::Extent2D { width: min.0, height: min.1 },
            max_image_extent: vk::Extent2D { width: max.0, height: max.1 },
            supported_transforms: vk::SurfaceTransformFlagsKHR::IDENTITY,
            current_transform: vk::SurfaceTransformFlagsKHR::IDENTITY,
            supported_composite_alpha: vk::CompositeAlphaFlagsKHR::OPAQUE,
            ..Default::default()
        }
    }

    fn extent(width: u32, height: u32) -> vk::Extent2D {
        vk::Extent2D { width, height }
    }

    fn format(format: vk::Format) -> vk::SurfaceFormatKHR {
        vk::SurfaceFormatKHR {
            format,
            color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
        }
    }

    fn support(caps: vk::SurfaceCapabilitiesKHR) -> SurfaceSupport {
        SurfaceSupport {
            capabilities: caps,
            formats: vec![format(vk::Format::R8G8B8A8_UNORM)],
            present_modes: vec![vk::PresentModeKHR::MAILBOX, vk::PresentModeKHR::FIFO],
        }
    }

    const SHARED: QueueSelection = QueueSelection { graphics: 0, present: 0 };

    #[test]
    fn test_current_extent_wins_over_request() {
        let caps = caps((800, 600), (1, 1), (4096, 4096));
        assert_eq!(resolve_extent(&caps, extent(640, 480)), extent(800, 600));
    }

    #[test]
    fn test_undefined_extent_uses_request_within_bounds() {
        let caps = caps((u32::MAX, u32::MAX), (100, 100), (2000, 2000));
        assert_eq!(resolve_extent(&caps, extent(640, 480)), extent(640, 480));
    }

    #[test]
    fn test_undefined_extent_clamps_to_bounds() {
        let caps = caps((u32::MAX, u32::MAX), (320, 240), (1024, 768));
        assert_eq!(resolve_extent(&caps, extent(4000, 100)), extent(1024, 240));
        assert_eq!(resolve_extent(&caps, extent(10, 5000)), extent(320, 768));
    }

    #[test]
    fn test_preferred_format_found_anywhere() {
        let formats = [
            format(vk::Format::R8G8B8A8_SRGB),
            format(vk::Format::A2B10G10R10_UNORM_PACK32),
            format(vk::Format::B8G8R8A8_UNORM),
        ];
        assert_eq!(resolve_format(&formats).unwrap().format, vk::Format::B8G8R8A8_UNORM);
    }

    #[test]
    fn test_first_format_without_preferred() {
        let formats = [
            format(vk::Format::R8G8B8A8_SRGB),
            format(vk::Format::B8G8R8A8_SRGB),
        ];
        assert_eq!(resolve_format(&formats).unwrap().format, vk::Format::R8G8B8A8_SRGB);
    }

    #[test]
    fn test_empty_format_list_is_fatal() {
        assert!(matches!(resolve_format(&[]), Err(VulkanError::NoSurfaceFormats)));
    }

    #[test]
    fn test_pre_transform_falls_back_to_current() {
        let mut caps = caps((800, 600), (1, 1), (800, 600));
        assert_eq!(resolve_pre_transform(&caps), vk::SurfaceTransformFlagsKHR::IDENTITY);

        caps.supported_transforms = vk::SurfaceTransformFlagsKHR::ROTATE_90;
        caps.current_transform = vk::SurfaceTransformFlagsKHR::ROTATE_90;
        assert_eq!(resolve_pre_transform(&caps), vk::SurfaceTransformFlagsKHR::ROTATE_90);
    }

    #[test]
    fn test_composite_alpha_preference_order() {
        let all = vk::CompositeAlphaFlagsKHR::INHERIT
            | vk::CompositeAlphaFlagsKHR::POST_MULTIPLIED
            | vk::CompositeAlphaFlagsKHR::PRE_MULTIPLIED;
        assert_eq!(
            resolve_composite_alpha(all).unwrap(),
            vk::CompositeAlphaFlagsKHR::PRE_MULTIPLIED
        );
        assert_eq!(
            resolve_composite_alpha(vk::CompositeAlphaFlagsKHR::INHERIT).unwrap(),
            vk::CompositeAlphaFlagsKHR::INHERIT
        );
        assert!(matches!(
            resolve_composite_alpha(vk::CompositeAlphaFlagsKHR::empty()),
            Err(VulkanError::NoCompositeAlpha(_))
        ));
    }

    #[test]
    fn test_sharing_follows_queue_families() {
        assert_eq!(SharingConfig::for_queues(&SHARED), SharingConfig::Exclusive);
        assert!(SharingConfig::Exclusive.family_indices().is_empty());

        let split = SharingConfig::for_queues(&QueueSelection { graphics: 0, present: 3 });
        assert_eq!(split.mode(), vk::SharingMode::CONCURRENT);
        assert_eq!(split.family_indices(), &[0, 3]);
    }

    #[test]
    fn test_negotiate_uses_fifo_and_min_image_count() {
        let config =
            SurfaceConfig::negotiate(&support(caps((800, 600), (1, 1), (800, 600))), extent(640, 480), &SHARED)
                .unwrap();

        assert_eq!(config.present_mode, vk::PresentModeKHR::FIFO);
        assert_eq!(config.image_count, 2);
        assert_eq!(config.extent, extent(800, 600));
        assert_eq!(config.format.format, vk::Format::R8G8B8A8_UNORM);
        assert_eq!(config.composite_alpha, vk::CompositeAlphaFlagsKHR::OPAQUE);
        assert_eq!(config.sharing, SharingConfig::Exclusive);
    }

    #[test]
    fn test_negotiate_without_present_modes_is_fatal() {
        let mut support = support(caps((800, 600), (1, 1), (800, 600)));
        support.present_modes.clear();

        let err = SurfaceConfig::negotiate(&support, extent(640, 480), &SHARED).unwrap_err();
        assert!(matches!(err, VulkanError::NoPresentModes));
    }

    #[test]
    fn test_negotiate_without_formats_is_fatal() {
        let mut support = support(caps((800, 600), (1, 1), (800, 600)));
        support.formats.clear();

        let err = SurfaceConfig::negotiate(&support, extent(640, 480), &SHARED).unwrap_err();
        assert_eq!(err.stage(), InitStage::Swapchain);
    }
}
