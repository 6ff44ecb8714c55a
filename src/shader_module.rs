//! Compiled SPIR-V shader modules.

use crate::device::GpuDevice;
use crate::handle::Handle;
use crate::resource_manager::ShaderModuleTag;

pub struct GpuShaderModule {
    device: GpuDevice,
    handle: Handle<ShaderModuleTag>,
}

impl GpuShaderModule {
    pub(crate) fn new(device: GpuDevice, handle: Handle<ShaderModuleTag>) -> Self {
        Self { device, handle }
    }

    pub fn is_valid(&self) -> bool {
        self.handle.is_valid()
    }

    pub fn handle(&self) -> Handle<ShaderModuleTag> {
        self.handle
    }
}

impl Drop for GpuShaderModule {
    fn drop(&mut self) {
        self.device.context.resources.lock().delete(self.handle);
    }
}
