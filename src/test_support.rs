//! Shared helpers for the `vulkan-tests`-gated integration tests scattered
//! across the front-end modules: standing up an instance/adapter/device is
//! the same handful of lines in every one of them.

use crate::adapter::DeviceOptions;
use crate::device::GpuDevice;
use crate::instance::{GpuInstance, InstanceOptions};

/// Creates a device on the default-selected adapter, ray tracing disabled.
/// Panics on any failure; only called from tests already gated behind a
/// loadable Vulkan ICD.
pub(crate) fn test_device() -> GpuDevice {
    let instance = GpuInstance::new(InstanceOptions::default()).expect("instance creation");
    let adapter = instance.select_adapter().expect("adapter selection");
    adapter
        .create_device(DeviceOptions::default())
        .expect("device creation")
}

/// Same as [`test_device`] but with ray tracing enabled, for the
/// acceleration-structure and ray-tracing-pipeline tests.
pub(crate) fn test_device_with_raytracing() -> GpuDevice {
    let instance = GpuInstance::new(InstanceOptions::default()).expect("instance creation");
    let adapter = instance.select_adapter().expect("adapter selection");
    adapter
        .create_device(DeviceOptions {
            enable_ray_tracing: true,
            ..Default::default()
        })
        .expect("device creation")
}
