//! A pool of descriptor sets sharing one layout.

use crate::device::GpuDevice;
use crate::handle::Handle;
use crate::resource_manager::BindGroupPoolTag;

pub struct GpuBindGroupPool {
    device: GpuDevice,
    handle: Handle<BindGroupPoolTag>,
}

impl GpuBindGroupPool {
    pub(crate) fn new(device: GpuDevice, handle: Handle<BindGroupPoolTag>) -> Self {
        Self { device, handle }
    }

    pub fn is_valid(&self) -> bool {
        self.handle.is_valid()
    }

    pub fn handle(&self) -> Handle<BindGroupPoolTag> {
        self.handle
    }

    pub fn max_bind_groups(&self) -> u32 {
        self.device
            .context
            .resources
            .lock()
            .get(self.handle)
            .expect("bind group pool handle valid for the lifetime of GpuBindGroupPool")
            .max_bind_groups()
    }
}

impl Drop for GpuBindGroupPool {
    fn drop(&mut self) {
        self.device.context.resources.lock().delete(self.handle);
    }
}

#[cfg(test)]
mod tests {
    use crate::test_support::test_device;
    use crate::types::BindGroupPoolFlags;

    #[test]
    #[ignore = "requires vulkan-tests feature and a loadable Vulkan ICD"]
    #[cfg(feature = "vulkan-tests")]
    fn max_bind_groups_echoes_the_value_it_was_created_with() {
        let device = test_device();
        let pool = device
            .create_bind_group_pool(16, BindGroupPoolFlags::empty())
            .expect("bind group pool creation");
        assert_eq!(pool.max_bind_groups(), 16);
    }
}
