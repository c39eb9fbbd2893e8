//! Vulkan instance creation
//!
//! Loads the Vulkan entry points, creates the instance with the surface
//! extensions the presentation target asks for and, in debug builds, routes
//! validation messages into `log`.

#[cfg(debug_assertions)]
use ash::extensions::ext::DebugUtils;
use ash::{vk, Entry, Instance};
use std::ffi::{CStr, CString};
use std::os::raw::c_char;

use super::capabilities::{base_instance_extensions, CapabilityInventory};
use super::error::{InitStage, VulkanError, VulkanResult};
use crate::config::RenderCoreConfig;

const VALIDATION_LAYER: &str = "VK_LAYER_KHRONOS_validation";
const ENGINE_NAME: &str = "RenderCore";

/// Vulkan instance wrapper with RAII cleanup
pub struct VulkanInstance {
    /// Vulkan entry point
    pub entry: Entry,
    /// Vulkan instance handle
    pub instance: Instance,
    /// Names of the enabled instance layers
    pub enabled_layers: Vec<CString>,
    /// Names of the enabled instance extensions
    pub enabled_extensions: Vec<CString>,
    /// Debug utilities extension (debug builds)
    #[cfg(debug_assertions)]
    pub debug_utils: Option<DebugUtils>,
    /// Debug messenger handle (debug builds)
    #[cfg(debug_assertions)]
    pub debug_messenger: Option<vk::DebugUtilsMessengerEXT>,
}

/// Load the Vulkan library
pub fn load_entry() -> VulkanResult<Entry> {
    unsafe { Entry::load() }.map_err(|e| VulkanError::Loading(format!("{e:?}")))
}

/// Merge the base and platform extension lists, keeping order and dropping
/// duplicates
pub fn instance_extension_list(platform: &[CString], debug_utils: bool) -> Vec<CString> {
    let mut names: Vec<CString> = base_instance_extensions()
        .into_iter()
        .map(CStr::to_owned)
        .collect();

    for name in platform {
        if !names.contains(name) {
            names.push(name.clone());
        }
    }

    #[cfg(debug_assertions)]
    if debug_utils {
        let name = DebugUtils::name().to_owned();
        if !names.contains(&name) {
            names.push(name);
        }
    }
    #[cfg(not(debug_assertions))]
    let _ = debug_utils;

    names
}

/// Layers to enable: validation (when requested and available) followed by
/// configured extras
pub fn instance_layer_list(
    config: &RenderCoreConfig,
    inventory: &CapabilityInventory,
) -> VulkanResult<Vec<CString>> {
    let mut names = Vec::new();

    if config.validation_enabled() {
        let validation = to_cstring(VALIDATION_LAYER, InitStage::Instance)?;
        if inventory.has_layer(&validation) {
            names.push(validation);
        } else {
            log::warn!("{} requested but not installed, continuing without it", VALIDATION_LAYER);
        }
    }

    for layer in &config.instance_layers {
        let name = to_cstring(layer, InitStage::Instance)?;
        if !names.contains(&name) {
            names.push(name);
        }
    }

    Ok(names)
}

fn to_cstring(name: &str, stage: InitStage) -> VulkanResult<CString> {
    CString::new(name).map_err(|_| VulkanError::InvalidName {
        stage,
        name: name.to_string(),
    })
}

impl VulkanInstance {
    /// Create a new Vulkan instance
    pub fn new(
        entry: Entry,
        config: &RenderCoreConfig,
        inventory: &CapabilityInventory,
        platform_extensions: &[CString],
    ) -> VulkanResult<Self> {
        log::info!("Creating Vulkan instance");

        let app_name = to_cstring(&config.application_name, InitStage::Instance)?;
        let engine_name = to_cstring(ENGINE_NAME, InitStage::Instance)?;
        let (major, minor, patch) = config.application_version;
        let app_info = vk::ApplicationInfo::builder()
            .application_name(&app_name)
            .application_version(vk::make_api_version(0, major, minor, patch))
            .engine_name(&engine_name)
            .engine_version(vk::make_api_version(0, 1, 0, 0))
            .api_version(vk::API_VERSION_1_0);

        let enabled_layers = instance_layer_list(config, inventory)?;
        let validation = enabled_layers
            .iter()
            .any(|name| name.as_bytes() == VALIDATION_LAYER.as_bytes());
        let enabled_extensions = instance_extension_list(platform_extensions, validation);

        for name in &enabled_extensions {
            if !inventory.has_instance_extension(name) {
                log::warn!("Instance extension {:?} not reported by the loader", name);
            }
            log::info!("Enabling instance extension: {}", name.to_string_lossy());
        }
        for name in &enabled_layers {
            log::info!("Enabling instance layer: {}", name.to_string_lossy());
        }

        let layer_ptrs: Vec<*const c_char> = enabled_layers.iter().map(|n| n.as_ptr()).collect();
        let extension_ptrs: Vec<*const c_char> =
            enabled_extensions.iter().map(|n| n.as_ptr()).collect();

        let create_info = vk::InstanceCreateInfo::builder()
            .application_info(&app_info)
            .enabled_layer_names(&layer_ptrs)
            .enabled_extension_names(&extension_ptrs);

        let instance = unsafe { entry.create_instance(&create_info, None) }
            .map_err(VulkanError::api(InitStage::Instance, "vkCreateInstance"))?;

        #[cfg(debug_assertions)]
        let (debug_utils, debug_messenger) = if validation {
            let debug_utils = DebugUtils::new(&entry, &instance);
            match Self::setup_debug_messenger(&debug_utils) {
                Ok(messenger) => (Some(debug_utils), Some(messenger)),
                Err(err) => {
                    unsafe { instance.destroy_instance(None) };
                    return Err(err);
                }
            }
        } else {
            (None, None)
        };

        Ok(Self {
            entry,
            instance,
            enabled_layers,
            enabled_extensions,
            #[cfg(debug_assertions)]
            debug_utils,
            #[cfg(debug_assertions)]
            debug_messenger,
        })
    }

    #[cfg(debug_assertions)]
    fn setup_debug_messenger(debug_utils: &DebugUtils) -> VulkanResult<vk::DebugUtilsMessengerEXT> {
        let create_info = vk::DebugUtilsMessengerCreateInfoEXT::builder()
            .message_severity(
                vk::DebugUtilsMessageSeverityFlagsEXT::WARNING
                    | vk::DebugUtilsMessageSeverityFlagsEXT::ERROR,
            )
            .message_type(
                vk::DebugUtilsMessageTypeFlagsEXT::GENERAL
                    | vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION
                    | vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE,
            )
            .pfn_user_callback(Some(debug_callback));

        unsafe { debug_utils.create_debug_utils_messenger(&create_info, None) }
            .map_err(VulkanError::api(InitStage::Instance, "vkCreateDebugUtilsMessengerEXT"))
    }

    /// Raw instance handle
    pub fn handle(&self) -> vk::Instance {
        self.instance.handle()
    }
}

impl Drop for VulkanInstance {
    fn drop(&mut self) {
        unsafe {
            #[cfg(debug_assertions)]
            if let (Some(debug_utils), Some(debug_messenger)) =
                (&self.debug_utils, &self.debug_messenger)
            {
                debug_utils.destroy_debug_utils_messenger(*debug_messenger, None);
            }

            self.instance.destroy_instance(None);
        }
    }
}

/// Debug callback for validation layers
#[cfg(debug_assertions)]
unsafe extern "system" fn debug_callback(
    message_severity: vk::DebugUtilsMessageSeverityFlagsEXT,
    message_type: vk::DebugUtilsMessageTypeFlagsEXT,
    callback_data: *const vk::DebugUtilsMessengerCallbackDataEXT,
    _user_data: *mut std::ffi::c_void,
) -> vk::Bool32 {
    if callback_data.is_null() || (*callback_data).p_message.is_null() {
        return vk::FALSE;
    }
    let message = CStr::from_ptr((*callback_data).p_message).to_string_lossy();

    if message_severity >= vk::DebugUtilsMessageSeverityFlagsEXT::ERROR {
        log::error!("[Vulkan] {:?} - {}", message_type, message);
    } else if message_severity >= vk::DebugUtilsMessageSeverityFlagsEXT::WARNING {
        log::warn!("[Vulkan] {:?} - {}", message_type, message);
    } else {
        log::debug!("[Vulkan] {:?} - {}", message_type, message);
    }

    vk::FALSE
}
