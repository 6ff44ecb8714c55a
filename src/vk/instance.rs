//! Instance creation and adapter enumeration.
//!
//! Grounded on `wgpu-hal/src/vulkan/mod.rs`'s `Instance::init` and the
//! original `instance.cpp`'s `selectAdapter` fallback policy (SPEC_FULL.md
//! §10): when the caller does not pin a specific adapter, prefer a
//! discrete GPU, then an integrated one, then whatever is left.

use std::ffi::{c_void, CStr, CString};
use std::sync::Arc;

use ash::vk;

use crate::types::AdapterDeviceType;
use crate::vk::adapter::VulkanAdapter;
use crate::vk::InstanceShared;

pub struct InstanceOptions {
    pub application_name: String,
    pub application_version: u32,
    pub enable_validation: bool,
    pub extra_instance_extensions: Vec<CString>,
}

impl Default for InstanceOptions {
    fn default() -> Self {
        Self {
            application_name: "kdgpu-core application".to_string(),
            application_version: 0,
            enable_validation: cfg!(debug_assertions),
            extra_instance_extensions: Vec::new(),
        }
    }
}

pub struct VulkanInstance {
    pub(crate) shared: Arc<InstanceShared>,
}

impl VulkanInstance {
    pub fn new(options: &InstanceOptions) -> crate::error::Result<Self> {
        let entry = unsafe {
            ash::Entry::load().map_err(|_| {
                crate::error::GpuError::InvalidArgument("failed to load Vulkan loader".into())
            })?
        };

        let app_name = CString::new(options.application_name.clone()).unwrap_or_default();
        let engine_name = CString::new("kdgpu-core").unwrap();
        let app_info = vk::ApplicationInfo::default()
            .application_name(&app_name)
            .application_version(options.application_version)
            .engine_name(&engine_name)
            .engine_version(0)
            .api_version(vk::API_VERSION_1_3);

        let mut extension_names: Vec<*const i8> = vec![
            ash::khr::surface::NAME.as_ptr(),
            #[cfg(target_os = "linux")]
            ash::khr::xcb_surface::NAME.as_ptr(),
            #[cfg(target_os = "windows")]
            ash::khr::win32_surface::NAME.as_ptr(),
        ];
        for ext in &options.extra_instance_extensions {
            extension_names.push(ext.as_ptr());
        }

        let mut layer_names: Vec<*const i8> = Vec::new();
        let validation_layer = CStr::from_bytes_with_nul(b"VK_LAYER_KHRONOS_validation\0").unwrap();
        if options.enable_validation {
            extension_names.push(ash::ext::debug_utils::NAME.as_ptr());
            layer_names.push(validation_layer.as_ptr());
        }

        let create_info = vk::InstanceCreateInfo::default()
            .application_info(&app_info)
            .enabled_extension_names(&extension_names)
            .enabled_layer_names(&layer_names);

        let raw = unsafe { entry.create_instance(&create_info, None)? };

        let (debug_utils, debug_messenger) = if options.enable_validation {
            let debug_utils = ash::ext::debug_utils::Instance::new(&entry, &raw);
            let messenger_info = vk::DebugUtilsMessengerCreateInfoEXT::default()
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
            let messenger = unsafe {
                debug_utils.create_debug_utils_messenger(&messenger_info, None)?
            };
            (Some(debug_utils), Some(messenger))
        } else {
            (None, None)
        };

        Ok(Self {
            shared: Arc::new(InstanceShared {
                entry,
                raw,
                api_version: vk::API_VERSION_1_3,
                debug_utils,
                debug_messenger,
            }),
        })
    }

    pub fn enumerate_adapters(&self) -> crate::error::Result<Vec<VulkanAdapter>> {
        let physical_devices = unsafe { self.shared.raw.enumerate_physical_devices()? };
        Ok(physical_devices
            .into_iter()
            .map(|raw| VulkanAdapter::new(self.shared.clone(), raw))
            .collect())
    }

    /// Picks a default adapter per the fallback policy in SPEC_FULL.md §10:
    /// discrete, then integrated, then whatever remains.
    pub fn select_adapter(&self) -> crate::error::Result<VulkanAdapter> {
        let mut adapters = self.enumerate_adapters()?;
        if adapters.is_empty() {
            return Err(crate::error::GpuError::InvalidArgument(
                "no Vulkan-capable adapters present".into(),
            ));
        }

        let best = adapters
            .iter()
            .position(|a| a.device_type() == AdapterDeviceType::DiscreteGpu)
            .or_else(|| {
                adapters
                    .iter()
                    .position(|a| a.device_type() == AdapterDeviceType::IntegratedGpu)
            })
            .unwrap_or(0);
        Ok(adapters.swap_remove(best))
    }
}

unsafe extern "system" fn debug_callback(
    severity: vk::DebugUtilsMessageSeverityFlagsEXT,
    _message_type: vk::DebugUtilsMessageTypeFlagsEXT,
    callback_data: *const vk::DebugUtilsMessengerCallbackDataEXT,
    _user_data: *mut c_void,
) -> vk::Bool32 {
    let message = unsafe {
        CStr::from_ptr((*callback_data).p_message)
            .to_string_lossy()
            .into_owned()
    };
    if severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::ERROR) {
        log::error!(target: "kdgpu_core::validation", "{message}");
    } else {
        log::warn!(target: "kdgpu_core::validation", "{message}");
    }
    vk::FALSE
}
