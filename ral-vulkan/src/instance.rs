//! Entry point / `VkInstance` creation, with optional validation layers
//! (spec.md §6.5 `DEBUG`, `RAL_VULKAN_VALIDATION` from `SPEC_FULL.md` §11).
use crate::debug::DebugMessenger;
use crate::platform::raw_display_handle;
use ash::vk;
use ral_core::context::PlatformDisplayHandle;
use ral_core::error::CreationError;
use std::ffi::{CStr, CString};
use std::sync::Arc;

pub struct InstanceShared {
    pub entry: ash::Entry,
    pub raw: ash::Instance,
    pub debug_messenger: Option<DebugMessenger>,
    /// Recorded at instance-creation time so later swap-chain surface
    /// creation (spec.md §4.6) can build the matching `RawWindowHandle`
    /// without threading it through every `create_swap_chain` call.
    pub platform_display: Option<PlatformDisplayHandle>,
}

impl Drop for InstanceShared {
    fn drop(&mut self) {
        unsafe {
            self.debug_messenger.take();
            self.raw.destroy_instance(None);
        }
    }
}

/// `ral-vulkan`'s instance, analogous to the source's
/// `create_vulkan_renderer_instance`-equivalent entry point (spec.md §6.2).
pub struct Instance {
    pub shared: Arc<InstanceShared>,
}

const VALIDATION_LAYER: &CStr =
    unsafe { CStr::from_bytes_with_nul_unchecked(b"VK_LAYER_KHRONOS_validation\0") };

impl Instance {
    /// Loads the Vulkan loader (via `libloading`, wrapped by `ash::Entry`),
    /// creates a `VkInstance`, and — when `enable_validation` is set —
    /// attaches the validation layer plus a `VK_EXT_debug_utils` messenger
    /// that routes layer messages through [`ral_core::Context::log`].
    ///
    /// `platform_display` (from [`ral_core::context::Context::platform_display_handle`])
    /// decides which `VK_KHR_*_surface` extensions to enable so swap chains
    /// can later be created against that windowing system (spec.md §4.6).
    pub fn new(
        application_name: &str,
        enable_validation: bool,
        platform_display: Option<PlatformDisplayHandle>,
    ) -> Result<Self, CreationError> {
        let entry = unsafe { ash::Entry::load() }
            .map_err(|e| CreationError::Backend(format!("failed to load Vulkan loader: {e}")))?;

        let application_name = CString::new(application_name).unwrap_or_default();
        let engine_name = CString::new("RAL").unwrap();
        let app_info = vk::ApplicationInfo::default()
            .application_name(&application_name)
            .engine_name(&engine_name)
            .api_version(vk::API_VERSION_1_2);

        let available_layers = unsafe { entry.enumerate_instance_layer_properties() }
            .map_err(|e| CreationError::Backend(e.to_string()))?;
        let has_validation_layer = available_layers
            .iter()
            .any(|layer| unsafe { CStr::from_ptr(layer.layer_name.as_ptr()) } == VALIDATION_LAYER);

        let mut layer_names = Vec::new();
        let mut extension_names = Vec::new();
        if enable_validation && has_validation_layer {
            layer_names.push(VALIDATION_LAYER.as_ptr());
            extension_names.push(ash::extensions::ext::DebugUtils::name().as_ptr());
        }
        let surface_extensions = ash_window::enumerate_required_extensions(raw_display_handle(platform_display))
            .map_err(|e| CreationError::Backend(format!("failed to enumerate surface extensions: {e}")))?;
        extension_names.extend_from_slice(surface_extensions);

        let create_info = vk::InstanceCreateInfo::default()
            .application_info(&app_info)
            .enabled_layer_names(&layer_names)
            .enabled_extension_names(&extension_names);

        let raw = unsafe { entry.create_instance(&create_info, None) }
            .map_err(|e| CreationError::Backend(format!("vkCreateInstance failed: {e:?}")))?;

        let debug_messenger = if enable_validation && has_validation_layer {
            Some(DebugMessenger::new(&entry, &raw)?)
        } else {
            None
        };

        Ok(Self {
            shared: Arc::new(InstanceShared { entry, raw, debug_messenger, platform_display }),
        })
    }

    pub fn enumerate_physical_devices(&self) -> Result<Vec<vk::PhysicalDevice>, CreationError> {
        unsafe { self.shared.raw.enumerate_physical_devices() }
            .map_err(|e| CreationError::Backend(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_layer_name_is_well_formed() {
        assert_eq!(VALIDATION_LAYER.to_bytes(), b"VK_LAYER_KHRONOS_validation");
    }
}
