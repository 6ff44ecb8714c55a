//! A platform window surface and the swapchain configured against it.

use crate::context::SharedContext;
use crate::device::GpuDevice;
use crate::error::Result;
use crate::handle::Handle;
use crate::resource_manager::SurfaceTag;
pub use crate::vk::surface::SurfaceConfiguration;

pub struct GpuSurface {
    context: SharedContext,
    handle: Handle<SurfaceTag>,
}

impl GpuSurface {
    pub(crate) fn new(context: SharedContext, handle: Handle<SurfaceTag>) -> Self {
        Self { context, handle }
    }

    pub fn is_valid(&self) -> bool {
        self.handle.is_valid()
    }

    pub fn handle(&self) -> Handle<SurfaceTag> {
        self.handle
    }

    pub fn supports_present(&self, device: &GpuDevice, queue_family: u32) -> bool {
        let shared = device.shared();
        self.context
            .resources
            .lock()
            .get(self.handle)
            .expect("surface handle valid for the lifetime of GpuSurface")
            .supports_present(shared.physical_device, queue_family)
    }

    pub fn configure(&self, device: &GpuDevice, config: &SurfaceConfiguration) -> Result<()> {
        let shared = device.shared();
        self.context
            .resources
            .lock()
            .get_mut(self.handle)
            .expect("surface handle valid for the lifetime of GpuSurface")
            .configure(&shared, shared.physical_device, config)
    }

    pub fn unconfigure(&self, device: &GpuDevice) {
        let shared = device.shared();
        self.context
            .resources
            .lock()
            .get_mut(self.handle)
            .expect("surface handle valid for the lifetime of GpuSurface")
            .unconfigure(&shared);
    }
}

impl Drop for GpuSurface {
    fn drop(&mut self) {
        self.context.resources.lock().delete(self.handle);
    }
}
