//! A top- or bottom-level acceleration structure backing ray queries.

use crate::device::GpuDevice;
use crate::handle::Handle;
use crate::resource_manager::AccelerationStructureTag;

pub struct GpuAccelerationStructure {
    device: GpuDevice,
    handle: Handle<AccelerationStructureTag>,
}

impl GpuAccelerationStructure {
    pub(crate) fn new(device: GpuDevice, handle: Handle<AccelerationStructureTag>) -> Self {
        Self { device, handle }
    }

    pub fn is_valid(&self) -> bool {
        self.handle.is_valid()
    }

    pub fn handle(&self) -> Handle<AccelerationStructureTag> {
        self.handle
    }

    pub fn device_address(&self) -> u64 {
        self.device
            .context
            .resources
            .lock()
            .get(self.handle)
            .expect("acceleration structure handle valid for the lifetime of GpuAccelerationStructure")
            .device_address()
    }
}

impl Drop for GpuAccelerationStructure {
    fn drop(&mut self) {
        self.device.context.resources.lock().delete(self.handle);
    }
}

#[cfg(test)]
mod tests {
    use crate::test_support::test_device_with_raytracing;
    use crate::vk::raytracing::AccelerationStructureType;

    #[test]
    #[ignore = "requires vulkan-tests feature, ray tracing extensions, and a loadable Vulkan ICD"]
    #[cfg(feature = "vulkan-tests")]
    fn a_freshly_created_acceleration_structure_has_a_nonzero_device_address() {
        let device = test_device_with_raytracing();
        let accel = device
            .create_acceleration_structure(AccelerationStructureType::BottomLevel, 1024)
            .expect("acceleration structure creation");
        assert!(accel.is_valid());
        assert_ne!(accel.device_address(), 0);
    }
}
