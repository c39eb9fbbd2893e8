//! Vulkan surface management
//!
//! The surface itself comes from whatever owns the window. Backends implement
//! [`PresentationTarget`]; which ones exist is decided by cargo features.

use ash::extensions::khr;
use ash::{vk, Entry, Instance};
use std::ffi::CString;

use super::enumerate::enumerate;
use super::error::{InitStage, VulkanError, VulkanResult};

/// Something a swapchain can present to
pub trait PresentationTarget {
    /// Platform instance extensions needed to create the surface
    fn required_instance_extensions(&self) -> VulkanResult<Vec<CString>>;

    /// Create the platform surface for this target
    fn create_surface(&mut self, entry: &Entry, instance: &Instance) -> VulkanResult<vk::SurfaceKHR>;

    /// Current drawable size in pixels
    fn framebuffer_extent(&self) -> vk::Extent2D;
}

/// Vulkan surface wrapper for presentation
pub struct PresentationSurface {
    loader: khr::Surface,
    surface: vk::SurfaceKHR,
}

impl PresentationSurface {
    /// Create the surface through the presentation target
    pub fn new<T: PresentationTarget + ?Sized>(
        entry: &Entry,
        instance: &Instance,
        target: &mut T,
    ) -> VulkanResult<Self> {
        log::info!("Creating presentation surface");
        let loader = khr::Surface::new(entry, instance);
        let surface = target.create_surface(entry, instance)?;
        Ok(Self { loader, surface })
    }

    /// Get the underlying surface handle
    pub const fn handle(&self) -> vk::SurfaceKHR {
        self.surface
    }

    /// Get the surface loader
    pub const fn loader(&self) -> &khr::Surface {
        &self.loader
    }

    /// Get surface capabilities for a physical device
    pub fn capabilities(
        &self,
        physical_device: vk::PhysicalDevice,
    ) -> VulkanResult<vk::SurfaceCapabilitiesKHR> {
        unsafe {
            self.loader
                .get_physical_device_surface_capabilities(physical_device, self.surface)
                .map_err(VulkanError::api(
                    InitStage::Swapchain,
                    "vkGetPhysicalDeviceSurfaceCapabilitiesKHR",
                ))
        }
    }

    /// Get surface formats for a physical device
    pub fn formats(
        &self,
        physical_device: vk::PhysicalDevice,
    ) -> VulkanResult<Vec<vk::SurfaceFormatKHR>> {
        let fp = self.loader.fp();
        let surface = self.surface;
        enumerate(|count, data| unsafe {
            (fp.get_physical_device_surface_formats_khr)(physical_device, surface, count, data)
        })
        .map_err(VulkanError::api(
            InitStage::Swapchain,
            "vkGetPhysicalDeviceSurfaceFormatsKHR",
        ))
    }

    /// Get surface present modes for a physical device
    pub fn present_modes(
        &self,
        physical_device: vk::PhysicalDevice,
    ) -> VulkanResult<Vec<vk::PresentModeKHR>> {
        let fp = self.loader.fp();
        let surface = self.surface;
        enumerate(|count, data| unsafe {
            (fp.get_physical_device_surface_present_modes_khr)(physical_device, surface, count, data)
        })
        .map_err(VulkanError::api(
            InitStage::Swapchain,
            "vkGetPhysicalDeviceSurfacePresentModesKHR",
        ))
    }

    /// Check if a queue family supports presentation to this surface
    pub fn supports_present(
        &self,
        physical_device: vk::PhysicalDevice,
        queue_family_index: u32,
    ) -> VulkanResult<bool> {
        unsafe {
            self.loader
                .get_physical_device_surface_support(physical_device, queue_family_index, self.surface)
                .map_err(VulkanError::api(
                    InitStage::QueueSelection,
                    "vkGetPhysicalDeviceSurfaceSupportKHR",
                ))
        }
    }
}

impl Drop for PresentationSurface {
    fn drop(&mut self) {
        unsafe {
            self.loader.destroy_surface(self.surface, None);
        }
    }
}

/// Presentation target backed by any window exposing raw handles
#[cfg(feature = "raw-window")]
pub struct RawWindowTarget<'a, W> {
    window: &'a W,
    extent: vk::Extent2D,
}

#[cfg(feature = "raw-window")]
impl<'a, W> RawWindowTarget<'a, W>
where
    W: raw_window_handle::HasRawWindowHandle + raw_window_handle::HasRawDisplayHandle,
{
    /// Wrap a window and its drawable size
    pub const fn new(window: &'a W, width: u32, height: u32) -> Self {
        Self {
            window,
            extent: vk::Extent2D { width, height },
        }
    }
}

#[cfg(feature = "raw-window")]
impl<W> PresentationTarget for RawWindowTarget<'_, W>
where
    W: raw_window_handle::HasRawWindowHandle + raw_window_handle::HasRawDisplayHandle,
{
    fn required_instance_extensions(&self) -> VulkanResult<Vec<CString>> {
        let names = ash_window::enumerate_required_extensions(self.window.raw_display_handle())
            .map_err(VulkanError::api(
                InitStage::Instance,
                "ash_window::enumerate_required_extensions",
            ))?;

        Ok(names
            .iter()
            .map(|&ptr| unsafe { std::ffi::CStr::from_ptr(ptr) }.to_owned())
            .collect())
    }

    fn create_surface(&mut self, entry: &Entry, instance: &Instance) -> VulkanResult<vk::SurfaceKHR> {
        unsafe {
            ash_window::create_surface(
                entry,
                instance,
                self.window.raw_display_handle(),
                self.window.raw_window_handle(),
                None,
            )
        }
        .map_err(|e| VulkanError::Surface(format!("Failed to create surface: {e:?}")))
    }

    fn framebuffer_extent(&self) -> vk::Extent2D {
        self.extent
    }
}
