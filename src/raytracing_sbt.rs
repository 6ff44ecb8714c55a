//! The shader binding table a ray-tracing dispatch reads its shader group
//! handles from.

use ash::vk;

use crate::device::GpuDevice;
use crate::handle::Handle;
use crate::resource_manager::ShaderBindingTableTag;

pub struct GpuShaderBindingTable {
    device: GpuDevice,
    handle: Handle<ShaderBindingTableTag>,
}

impl GpuShaderBindingTable {
    pub(crate) fn new(device: GpuDevice, handle: Handle<ShaderBindingTableTag>) -> Self {
        Self { device, handle }
    }

    pub fn is_valid(&self) -> bool {
        self.handle.is_valid()
    }

    pub fn handle(&self) -> Handle<ShaderBindingTableTag> {
        self.handle
    }

    pub fn regions(
        &self,
    ) -> (
        vk::StridedDeviceAddressRegionKHR,
        vk::StridedDeviceAddressRegionKHR,
        vk::StridedDeviceAddressRegionKHR,
        vk::StridedDeviceAddressRegionKHR,
    ) {
        self.device
            .context
            .resources
            .lock()
            .get(self.handle)
            .expect("shader binding table handle valid for the lifetime of GpuShaderBindingTable")
            .regions()
    }
}

impl Drop for GpuShaderBindingTable {
    fn drop(&mut self) {
        self.device.context.resources.lock().delete(self.handle);
    }
}
