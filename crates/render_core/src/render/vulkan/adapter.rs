//! Physical device selection and queue family resolution

use ash::{vk, Instance};

use super::capabilities::raw_name;
use super::enumerate::enumerate;
use super::error::{InitStage, VulkanError, VulkanResult};
use super::surface::PresentationSurface;

/// The selected physical device and the tables read from it
#[derive(Clone)]
pub struct AdapterInfo {
    /// Vulkan physical device handle
    pub device: vk::PhysicalDevice,
    /// Device properties and limits
    pub properties: vk::PhysicalDeviceProperties,
    /// Memory types and heaps
    pub memory_properties: vk::PhysicalDeviceMemoryProperties,
    /// Available queue families, never empty
    pub queue_families: Vec<vk::QueueFamilyProperties>,
}

impl AdapterInfo {
    /// Select the first adapter the driver reports.
    ///
    /// No scoring is done; an adapter without usable queues is only caught
    /// later by queue selection.
    pub fn select_first(instance: &Instance) -> VulkanResult<Self> {
        log::info!("Enumerating physical devices");

        let fp = instance.fp_v1_0();
        let handle = instance.handle();
        let devices: Vec<vk::PhysicalDevice> =
            enumerate(|count, data| unsafe { (fp.enumerate_physical_devices)(handle, count, data) })
                .map_err(VulkanError::api(InitStage::Adapter, "vkEnumeratePhysicalDevices"))?;

        log::info!("gpu_count: {}", devices.len());
        let device = *devices.first().ok_or(VulkanError::NoAdapter)?;

        let queue_families = unsafe { instance.get_physical_device_queue_family_properties(device) };
        if queue_families.is_empty() {
            return Err(VulkanError::NoQueueFamilies);
        }

        let memory_properties = unsafe { instance.get_physical_device_memory_properties(device) };
        let properties = unsafe { instance.get_physical_device_properties(device) };

        let info = Self {
            device,
            properties,
            memory_properties,
            queue_families,
        };
        log::info!("Selected GPU 0: {}", info.name());
        for (index, family) in info.queue_families.iter().enumerate() {
            log::debug!(
                "  queue family {}: {} x{}",
                index,
                queue_flags_string(family.queue_flags),
                family.queue_count
            );
        }
        Ok(info)
    }

    /// Device name
    pub fn name(&self) -> String {
        raw_name(&self.properties.device_name)
    }

    /// Device limits
    pub const fn limits(&self) -> &vk::PhysicalDeviceLimits {
        &self.properties.limits
    }

    /// Ask the surface which queue families can present to it
    pub fn present_support(&self, surface: &PresentationSurface) -> VulkanResult<Vec<bool>> {
        (0..self.queue_families.len() as u32)
            .map(|index| surface.supports_present(self.device, index))
            .collect()
    }
}

impl std::fmt::Debug for AdapterInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdapterInfo")
            .field("device", &self.device)
            .field("name", &self.name())
            .field("queue_families", &self.queue_families.len())
            .field("memory_types", &self.memory_properties.memory_type_count)
            .finish()
    }
}

/// Resolved graphics and present queue family indices
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueSelection {
    /// Family used for graphics submission
    pub graphics: u32,
    /// Family used for presentation
    pub present: u32,
}

impl QueueSelection {
    /// Resolve queue families from the family table and per-family present
    /// support.
    ///
    /// The first graphics family is taken provisionally. A family that can do
    /// both wins outright and ends the scan. Otherwise the first
    /// present-capable family is used for presentation.
    pub fn resolve(
        families: &[vk::QueueFamilyProperties],
        supports_present: &[bool],
    ) -> VulkanResult<Self> {
        let presents = |index: usize| supports_present.get(index).copied().unwrap_or(false);

        let mut graphics = None;
        let mut present = None;

        for (index, family) in families.iter().enumerate() {
            if !family.queue_flags.contains(vk::QueueFlags::GRAPHICS) {
                continue;
            }
            if graphics.is_none() {
                graphics = Some(index as u32);
            }
            if presents(index) {
                graphics = Some(index as u32);
                present = Some(index as u32);
                break;
            }
        }

        if present.is_none() {
            present = (0..families.len()).find(|&i| presents(i)).map(|i| i as u32);
        }

        match (graphics, present) {
            (Some(graphics), Some(present)) => Ok(Self { graphics, present }),
            (graphics, present) => Err(VulkanError::QueueSelection { graphics, present }),
        }
    }

    /// Whether graphics and present share one family
    pub const fn is_shared(&self) -> bool {
        self.graphics == self.present
    }

    /// Distinct families, graphics first
    pub fn unique_families(&self) -> Vec<u32> {
        if self.is_shared() {
            vec![self.graphics]
        } else {
            vec![self.graphics, self.present]
        }
    }
}

/// Human-readable list of queue capabilities, e.g. `GRAPHICS|COMPUTE`
pub fn queue_flags_string(flags: vk::QueueFlags) -> String {
    const NAMES: [(vk::QueueFlags, &str); 5] = [
        (vk::QueueFlags::GRAPHICS, "GRAPHICS"),
        (vk::QueueFlags::COMPUTE, "COMPUTE"),
        (vk::QueueFlags::TRANSFER, "TRANSFER"),
        (vk::QueueFlags::SPARSE_BINDING, "SPARSE_BINDING"),
        (vk::QueueFlags::PROTECTED, "PROTECTED"),
    ];

    NAMES
        .iter()
        .filter(|(flag, _)| flags.contains(*flag))
        .map(|(_, name)| *name)
        .collect::<Vec<_>>()
        .join("|")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn family(flags: vk::QueueFlags) -> vk::QueueFamilyProperties {
        vk::QueueFamilyProperties {
            queue_flags: flags,
            queue_count: 1,
            ..Default::default()
        }
    }

    const G: vk::QueueFlags = vk::QueueFlags::GRAPHICS;
    const T: vk::QueueFlags = vk::QueueFlags::TRANSFER;
    const C: vk::QueueFlags = vk::QueueFlags::COMPUTE;

    #[test]
    fn test_transfer_then_combined_then_graphics() {
        let families = [family(T), family(G), family(G)];
        let selection = QueueSelection::resolve(&families, &[false, true, false]).unwrap();

        assert_eq!(selection, QueueSelection { graphics: 1, present: 1 });
        assert!(selection.is_shared());
        assert_eq!(selection.unique_families(), vec![1]);
    }

    #[test]
    fn test_earliest_combined_family_wins() {
        let families = [family(G), family(G | C), family(G)];
        let selection = QueueSelection::resolve(&families, &[false, true, true]).unwrap();

        assert_eq!(selection, QueueSelection { graphics: 1, present: 1 });
    }

    #[test]
    fn test_combined_family_overrides_provisional_graphics() {
        let families = [family(G), family(C), family(G)];
        let selection = QueueSelection::resolve(&families, &[false, true, true]).unwrap();

        assert_eq!(selection, QueueSelection { graphics: 2, present: 2 });
    }

    #[test]
    fn test_split_graphics_and_present() {
        let families = [family(T), family(G), family(C), family(G), family(C)];
        let selection =
            QueueSelection::resolve(&families, &[false, false, true, false, true]).unwrap();

        assert_eq!(selection, QueueSelection { graphics: 1, present: 2 });
        assert!(!selection.is_shared());
        assert_eq!(selection.unique_families(), vec![1, 2]);
    }

    #[test]
    fn test_present_before_graphics() {
        let families = [family(C), family(G)];
        let selection = QueueSelection::resolve(&families, &[true, false]).unwrap();

        assert_eq!(selection, QueueSelection { graphics: 1, present: 0 });
    }

    #[test]
    fn test_no_graphics_family_is_fatal() {
        let families = [family(T), family(C)];
        let err = QueueSelection::resolve(&families, &[true, true]).unwrap_err();

        assert!(matches!(
            err,
            VulkanError::QueueSelection { graphics: None, present: Some(0) }
        ));
    }

    #[test]
    fn test_no_present_family_is_fatal() {
        let families = [family(G), family(G | C)];
        let err = QueueSelection::resolve(&families, &[false, false]).unwrap_err();

        assert!(matches!(
            err,
            VulkanError::QueueSelection { graphics: Some(0), present: None }
        ));
    }

    #[test]
    fn test_missing_present_entries_count_as_unsupported() {
        let families = [family(G), family(G)];
        let err = QueueSelection::resolve(&families, &[]).unwrap_err();
        assert_eq!(err.stage(), InitStage::QueueSelection);
    }

    #[test]
    fn test_queue_flags_string() {
        assert_eq!(queue_flags_string(G | C | T), "GRAPHICS|COMPUTE|TRANSFER");
        assert_eq!(queue_flags_string(T), "TRANSFER");
        assert_eq!(queue_flags_string(vk::QueueFlags::empty()), "");
    }
}
