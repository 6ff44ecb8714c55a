//! `VkSamplerYcbcrConversion` wrapper, for sampling multi-planar video
//! formats (SPEC_FULL.md §10 supplement).

use crate::device::GpuDevice;
use crate::handle::Handle;
use crate::resource_manager::YCbCrConversionTag;

pub struct GpuYCbCrConversion {
    device: GpuDevice,
    handle: Handle<YCbCrConversionTag>,
}

impl GpuYCbCrConversion {
    pub(crate) fn new(device: GpuDevice, handle: Handle<YCbCrConversionTag>) -> Self {
        Self { device, handle }
    }

    pub fn is_valid(&self) -> bool {
        self.handle.is_valid()
    }

    pub fn handle(&self) -> Handle<YCbCrConversionTag> {
        self.handle
    }
}

impl Drop for GpuYCbCrConversion {
    fn drop(&mut self) {
        self.device.context.resources.lock().delete(self.handle);
    }
}
