//! Capability inventory
//!
//! Collects the instance layers exposed by the loader together with the
//! instance and device extensions each layer contributes. The inventory is
//! built once and only read afterwards.

use ash::extensions::khr::{Surface, Swapchain as SwapchainLoader};
use ash::{vk, Entry, Instance};
use std::ffi::CStr;
use std::os::raw::c_char;

use super::enumerate::enumerate;
use super::error::{InitStage, VulkanError, VulkanResult};

/// Decode a fixed-size, NUL-terminated Vulkan name field
pub fn raw_name(raw: &[c_char]) -> String {
    let bytes: Vec<u8> = raw
        .iter()
        .take_while(|&&c| c != 0)
        .map(|&c| c as u8)
        .collect();
    String::from_utf8_lossy(&bytes).into_owned()
}

/// One instance layer and the extensions it provides
#[derive(Clone)]
pub struct LayerRecord {
    /// Layer properties as reported by the loader
    pub properties: vk::LayerProperties,
    /// Instance extensions provided by this layer
    pub instance_extensions: Vec<vk::ExtensionProperties>,
    /// Device extensions provided by this layer on the selected adapter
    pub device_extensions: Vec<vk::ExtensionProperties>,
}

impl LayerRecord {
    /// Layer name
    pub fn name(&self) -> String {
        raw_name(&self.properties.layer_name)
    }

    /// Layer description
    pub fn description(&self) -> String {
        raw_name(&self.properties.description)
    }

    /// Names of the instance extensions this layer provides
    pub fn instance_extension_names(&self) -> Vec<String> {
        self.instance_extensions
            .iter()
            .map(|ext| raw_name(&ext.extension_name))
            .collect()
    }

    /// Names of the device extensions this layer provides
    pub fn device_extension_names(&self) -> Vec<String> {
        self.device_extensions
            .iter()
            .map(|ext| raw_name(&ext.extension_name))
            .collect()
    }
}

impl std::fmt::Debug for LayerRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LayerRecord")
            .field("name", &self.name())
            .field("instance_extensions", &self.instance_extension_names())
            .field("device_extensions", &self.device_extension_names())
            .finish()
    }
}

/// Layers and extensions discovered on this machine
#[derive(Debug, Clone, Default)]
pub struct CapabilityInventory {
    layers: Vec<LayerRecord>,
    instance_extensions: Vec<vk::ExtensionProperties>,
}

impl CapabilityInventory {
    /// Enumerate every instance layer and its instance extensions.
    ///
    /// Zero layers is a valid, empty result.
    pub fn collect(entry: &Entry) -> VulkanResult<Self> {
        log::info!("Collecting instance layer properties");

        let fp = entry.fp_v1_0();
        let layer_properties: Vec<vk::LayerProperties> = enumerate(|count, data| unsafe {
            (fp.enumerate_instance_layer_properties)(count, data)
        })
        .map_err(VulkanError::api(
            InitStage::CapabilityInventory,
            "vkEnumerateInstanceLayerProperties",
        ))?;

        let instance_extensions = Self::instance_extensions_for(entry, std::ptr::null())?;

        let mut layers = Vec::with_capacity(layer_properties.len());
        for properties in layer_properties {
            let instance_extensions =
                Self::instance_extensions_for(entry, properties.layer_name.as_ptr())?;
            layers.push(LayerRecord {
                properties,
                instance_extensions,
                device_extensions: Vec::new(),
            });
        }

        let inventory = Self {
            layers,
            instance_extensions,
        };
        inventory.log_instance_level();
        Ok(inventory)
    }

    /// Build an inventory from already-known records
    pub fn from_records(
        layers: Vec<LayerRecord>,
        instance_extensions: Vec<vk::ExtensionProperties>,
    ) -> Self {
        Self {
            layers,
            instance_extensions,
        }
    }

    fn instance_extensions_for(
        entry: &Entry,
        layer_name: *const c_char,
    ) -> VulkanResult<Vec<vk::ExtensionProperties>> {
        let fp = entry.fp_v1_0();
        enumerate(|count, data| unsafe {
            (fp.enumerate_instance_extension_properties)(layer_name, count, data)
        })
        .map_err(VulkanError::api(
            InitStage::CapabilityInventory,
            "vkEnumerateInstanceExtensionProperties",
        ))
    }

    /// Fill in per-layer device extensions for the selected adapter
    pub fn collect_device_extensions(
        &mut self,
        instance: &Instance,
        physical_device: vk::PhysicalDevice,
    ) -> VulkanResult<()> {
        log::info!("Collecting device extension properties");

        let fp = instance.fp_v1_0();
        for layer in &mut self.layers {
            let layer_name = layer.properties.layer_name.as_ptr();
            layer.device_extensions = enumerate(|count, data| unsafe {
                (fp.enumerate_device_extension_properties)(physical_device, layer_name, count, data)
            })
            .map_err(VulkanError::api(
                InitStage::CapabilityInventory,
                "vkEnumerateDeviceExtensionProperties",
            ))?;

            for name in layer.device_extension_names() {
                log::debug!("  {} device extension: {}", layer.name(), name);
            }
        }
        Ok(())
    }

    /// Discovered layers, in loader order
    pub fn layers(&self) -> &[LayerRecord] {
        &self.layers
    }

    /// Extensions provided by the loader and implicit layers
    pub fn instance_extensions(&self) -> &[vk::ExtensionProperties] {
        &self.instance_extensions
    }

    /// Whether a layer with this name was discovered
    pub fn has_layer(&self, name: &CStr) -> bool {
        let name = name.to_string_lossy();
        self.layers.iter().any(|layer| layer.name() == name)
    }

    /// Whether the loader or any layer provides this instance extension
    pub fn has_instance_extension(&self, name: &CStr) -> bool {
        let name = name.to_string_lossy();
        self.instance_extensions
            .iter()
            .chain(self.layers.iter().flat_map(|l| l.instance_extensions.iter()))
            .any(|ext| raw_name(&ext.extension_name) == name)
    }

    fn log_instance_level(&self) {
        log::info!("Found {} instance layers", self.layers.len());
        for layer in &self.layers {
            log::info!("LayerName: {}", layer.name());
            for name in layer.instance_extension_names() {
                log::info!("  instance extension: {}", name);
            }
        }
    }
}

/// Instance extensions every context needs regardless of platform
pub fn base_instance_extensions() -> Vec<&'static CStr> {
    vec![Surface::name()]
}

/// Device extensions the logical device is created with
pub fn required_device_extensions() -> Vec<&'static CStr> {
    vec![SwapchainLoader::name()]
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn write_name(dst: &mut [c_char], name: &str) {
        for (slot, byte) in dst.iter_mut().zip(name.bytes()) {
            *slot = byte as c_char;
        }
    }

    pub(crate) fn extension(name: &str) -> vk::ExtensionProperties {
        let mut ext = vk::ExtensionProperties::default();
        write_name(&mut ext.extension_name, name);
        ext
    }

    fn layer(name: &str, instance_exts: &[&str]) -> LayerRecord {
        let mut properties = vk::LayerProperties::default();
        write_name(&mut properties.layer_name, name);
        LayerRecord {
            properties,
            instance_extensions: instance_exts.iter().map(|n| extension(n)).collect(),
            device_extensions: Vec::new(),
        }
    }

    #[test]
    fn test_raw_name_stops_at_nul() {
        let mut raw = [0 as c_char; 16];
        write_name(&mut raw, "VK_KHR_surface");
        assert_eq!(raw_name(&raw), "VK_KHR_surface");
    }

    #[test]
    fn test_empty_inventory_has_nothing() {
        let inventory = CapabilityInventory::default();
        assert!(inventory.layers().is_empty());
        assert!(!inventory.has_instance_extension(Surface::name()));
    }

    #[test]
    fn test_lookup_by_layer_and_extension_name() {
        let inventory = CapabilityInventory::from_records(
            vec![layer("VK_LAYER_KHRONOS_validation", &["VK_EXT_debug_utils"])],
            vec![extension("VK_KHR_surface")],
        );

        let validation = CStr::from_bytes_with_nul(b"VK_LAYER_KHRONOS_validation\0").unwrap();
        let debug_utils = CStr::from_bytes_with_nul(b"VK_EXT_debug_utils\0").unwrap();
        let missing = CStr::from_bytes_with_nul(b"VK_KHR_display\0").unwrap();

        assert!(inventory.has_layer(validation));
        assert!(inventory.has_instance_extension(Surface::name()));
        assert!(inventory.has_instance_extension(debug_utils));
        assert!(!inventory.has_instance_extension(missing));
        assert_eq!(
            inventory.layers()[0].instance_extension_names(),
            vec!["VK_EXT_debug_utils".to_string()]
        );
    }

    #[test]
    fn test_required_extensions() {
        assert_eq!(base_instance_extensions(), vec![Surface::name()]);
        assert_eq!(required_device_extensions(), vec![SwapchainLoader::name()]);
    }
}
