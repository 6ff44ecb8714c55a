//! A physical device and its queried properties/features.

use crate::context::SharedContext;
use crate::device::GpuDevice;
use crate::error::Result;
use crate::handle::Handle;
use crate::resource_manager::AdapterTag;
pub use crate::vk::adapter::{AdapterFeatures, AdapterProperties};
pub use crate::vk::device::DeviceOptions;
use crate::vk::adapter::VulkanAdapter;

pub struct GpuAdapter {
    pub(crate) context: SharedContext,
    pub(crate) handle: Handle<AdapterTag>,
}

impl GpuAdapter {
    pub(crate) fn from_vulkan(context: SharedContext, adapter: VulkanAdapter) -> Self {
        let handle = context.resources.lock().create::<AdapterTag>(adapter);
        Self { context, handle }
    }

    pub fn is_valid(&self) -> bool {
        self.handle.is_valid()
    }

    pub fn handle(&self) -> Handle<AdapterTag> {
        self.handle
    }

    pub fn properties(&self) -> AdapterProperties {
        self.context
            .resources
            .lock()
            .get(self.handle)
            .expect("adapter handle valid for the lifetime of GpuAdapter")
            .properties()
            .clone()
    }

    pub fn features(&self) -> AdapterFeatures {
        self.context
            .resources
            .lock()
            .get(self.handle)
            .expect("adapter handle valid for the lifetime of GpuAdapter")
            .features()
    }

    pub fn create_device(&self, options: DeviceOptions) -> Result<GpuDevice> {
        let resources = self.context.resources.lock();
        let vulkan_adapter = resources
            .get(self.handle)
            .expect("adapter handle valid for the lifetime of GpuAdapter");
        let device = crate::vk::device::VulkanDevice::new(vulkan_adapter, &options)?;
        drop(resources);
        Ok(GpuDevice::from_vulkan(self.context.clone(), device))
    }
}

impl Drop for GpuAdapter {
    fn drop(&mut self) {
        self.context.resources.lock().delete(self.handle);
    }
}
