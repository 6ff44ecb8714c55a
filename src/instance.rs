//! Entry point: creates the Vulkan instance and enumerates adapters.
//!
//! Grounded on `examples/original_source/src/KDGpu/instance.h`'s
//! `Instance` front-end class.

use raw_window_handle::{HasDisplayHandle, HasWindowHandle};

use crate::adapter::GpuAdapter;
use crate::context::Context;
use crate::error::Result;
use crate::handle::Handle;
use crate::resource_manager::{InstanceTag, SurfaceTag};
use crate::surface::GpuSurface;
pub use crate::vk::instance::InstanceOptions;
use crate::vk::instance::VulkanInstance;

/// Move-only front end for a Vulkan instance. Dropping it deletes the
/// backing resource; a moved-from instance becomes invalid rather than
/// double-deleting, matching the pool's idempotent `remove`.
pub struct GpuInstance {
    pub(crate) context: crate::context::SharedContext,
    pub(crate) handle: Handle<InstanceTag>,
}

impl GpuInstance {
    pub fn new(options: InstanceOptions) -> Result<Self> {
        let vulkan_instance = VulkanInstance::new(&options)?;
        let context = Context::new();
        let handle = context.resources.lock().create::<InstanceTag>(vulkan_instance);
        Ok(Self { context, handle })
    }

    pub fn is_valid(&self) -> bool {
        self.handle.is_valid()
    }

    pub fn handle(&self) -> Handle<InstanceTag> {
        self.handle
    }

    pub fn enumerate_adapters(&self) -> Result<Vec<GpuAdapter>> {
        let resources = self.context.resources.lock();
        let vulkan_instance = resources
            .get(self.handle)
            .expect("instance handle valid for the lifetime of GpuInstance");
        let adapters = vulkan_instance.enumerate_adapters()?;
        drop(resources);

        Ok(adapters
            .into_iter()
            .map(|adapter| GpuAdapter::from_vulkan(self.context.clone(), adapter))
            .collect())
    }

    /// Picks a default adapter: discrete, then integrated, then whatever
    /// remains (SPEC_FULL.md §10).
    pub fn select_adapter(&self) -> Result<GpuAdapter> {
        let resources = self.context.resources.lock();
        let vulkan_instance = resources
            .get(self.handle)
            .expect("instance handle valid for the lifetime of GpuInstance");
        let adapter = vulkan_instance.select_adapter()?;
        drop(resources);
        Ok(GpuAdapter::from_vulkan(self.context.clone(), adapter))
    }

    pub fn create_surface(
        &self,
        display_handle: &impl HasDisplayHandle,
        window_handle: &impl HasWindowHandle,
    ) -> Result<GpuSurface> {
        let resources = self.context.resources.lock();
        let vulkan_instance = resources
            .get(self.handle)
            .expect("instance handle valid for the lifetime of GpuInstance");
        let instance_shared = vulkan_instance.shared.clone();
        drop(resources);

        let surface = crate::vk::surface::VulkanSurface::new(instance_shared, display_handle, window_handle)?;
        let handle = self.context.resources.lock().create::<SurfaceTag>(surface);
        Ok(GpuSurface::new(self.context.clone(), handle))
    }
}

impl Drop for GpuInstance {
    fn drop(&mut self) {
        self.context.resources.lock().delete(self.handle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[ignore = "requires vulkan-tests feature and a loadable Vulkan ICD"]
    #[cfg(feature = "vulkan-tests")]
    fn instance_creation_succeeds_on_a_machine_with_vulkan() {
        let instance = GpuInstance::new(InstanceOptions::default()).expect("instance creation");
        assert!(instance.is_valid());
    }
}
