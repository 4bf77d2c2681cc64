//! `VK_EXT_debug_utils` messenger wiring: validation-layer messages are
//! routed to whatever `log` subscriber the application installed, the same
//! severity mapping `SPEC_FULL.md` §11 documents for `Severity -> log::Level`.
use ash::vk;
use ral_core::error::CreationError;
use std::ffi::CStr;

pub struct DebugMessenger {
    extension: ash::extensions::ext::DebugUtils,
    messenger: vk::DebugUtilsMessengerEXT,
}

impl DebugMessenger {
    pub fn new(entry: &ash::Entry, instance: &ash::Instance) -> Result<Self, CreationError> {
        let extension = ash::extensions::ext::DebugUtils::new(entry, instance);
        let create_info = vk::DebugUtilsMessengerCreateInfoEXT::default()
            .message_severity(
                vk::DebugUtilsMessageSeverityFlagsEXT::ERROR
                    | vk::DebugUtilsMessageSeverityFlagsEXT::WARNING
                    | vk::DebugUtilsMessageSeverityFlagsEXT::INFO,
            )
            .message_type(
                vk::DebugUtilsMessageTypeFlagsEXT::GENERAL
                    | vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION
                    | vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE,
            )
            .pfn_user_callback(Some(debug_callback));

        let messenger = unsafe { extension.create_debug_utils_messenger(&create_info, None) }
            .map_err(|e| CreationError::Backend(format!("failed to create debug messenger: {e}")))?;

        Ok(Self { extension, messenger })
    }

    /// The `VK_EXT_debug_utils` loader, reused for command-buffer debug
    /// labels (`SetDebugMarker`/`BeginDebugEvent`/`EndDebugEvent`,
    /// spec.md §4.5) as well as the messenger above.
    pub fn extension(&self) -> &ash::extensions::ext::DebugUtils {
        &self.extension
    }
}

impl Drop for DebugMessenger {
    fn drop(&mut self) {
        unsafe {
            self.extension.destroy_debug_utils_messenger(self.messenger, None);
        }
    }
}

unsafe extern "system" fn debug_callback(
    severity: vk::DebugUtilsMessageSeverityFlagsEXT,
    message_types: vk::DebugUtilsMessageTypeFlagsEXT,
    callback_data: *const vk::DebugUtilsMessengerCallbackDataEXT,
    _user_data: *mut std::ffi::c_void,
) -> vk::Bool32 {
    let message = if callback_data.is_null() {
        CStr::from_bytes_with_nul_unchecked(b"<no message>\0")
    } else {
        CStr::from_ptr((*callback_data).p_message)
    };
    let log_level = if severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::ERROR) {
        log::Level::Error
    } else if severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::WARNING) {
        log::Level::Warn
    } else {
        log::Level::Info
    };
    log::log!(log_level, "[{message_types:?}] {}", message.to_string_lossy());
    vk::FALSE
}
