//! Fences (CPU-visible completion signals) and semaphores (GPU-to-GPU
//! synchronization primitives).

use crate::device::GpuDevice;
use crate::error::{FenceStatus, Result};
use crate::handle::Handle;
use crate::resource_manager::{FenceTag, SemaphoreTag};

pub struct GpuFence {
    device: GpuDevice,
    handle: Handle<FenceTag>,
}

impl GpuFence {
    pub(crate) fn new(device: GpuDevice, handle: Handle<FenceTag>) -> Self {
        Self { device, handle }
    }

    pub fn is_valid(&self) -> bool {
        self.handle.is_valid()
    }

    pub fn handle(&self) -> Handle<FenceTag> {
        self.handle
    }

    pub fn status(&self) -> Result<FenceStatus> {
        self.device
            .context
            .resources
            .lock()
            .get(self.handle)
            .expect("fence handle valid for the lifetime of GpuFence")
            .status()
    }

    pub fn wait(&self, timeout_ns: u64) -> Result<()> {
        self.device
            .context
            .resources
            .lock()
            .get(self.handle)
            .expect("fence handle valid for the lifetime of GpuFence")
            .wait(timeout_ns)
    }

    pub fn reset(&self) -> Result<()> {
        self.device
            .context
            .resources
            .lock()
            .get(self.handle)
            .expect("fence handle valid for the lifetime of GpuFence")
            .reset()
    }
}

impl Drop for GpuFence {
    fn drop(&mut self) {
        self.device.context.resources.lock().delete(self.handle);
    }
}

pub struct GpuSemaphore {
    device: GpuDevice,
    handle: Handle<SemaphoreTag>,
}

impl GpuSemaphore {
    pub(crate) fn new(device: GpuDevice, handle: Handle<SemaphoreTag>) -> Self {
        Self { device, handle }
    }

    pub fn is_valid(&self) -> bool {
        self.handle.is_valid()
    }

    pub fn handle(&self) -> Handle<SemaphoreTag> {
        self.handle
    }
}

impl Drop for GpuSemaphore {
    fn drop(&mut self) {
        self.device.context.resources.lock().delete(self.handle);
    }
}

#[cfg(test)]
mod tests {
    use crate::error::FenceStatus;
    use crate::test_support::test_device;

    #[test]
    #[ignore = "requires vulkan-tests feature and a loadable Vulkan ICD"]
    #[cfg(feature = "vulkan-tests")]
    fn a_signalled_fence_reports_signalled_without_waiting() {
        let device = test_device();
        let fence = device.create_fence(true).expect("fence creation");
        assert_eq!(fence.status().expect("fence status"), FenceStatus::Signalled);
    }

    #[test]
    #[ignore = "requires vulkan-tests feature and a loadable Vulkan ICD"]
    #[cfg(feature = "vulkan-tests")]
    fn resetting_a_signalled_fence_clears_its_status() {
        let device = test_device();
        let fence = device.create_fence(true).expect("fence creation");
        fence.reset().expect("fence reset");
        assert_eq!(fence.status().expect("fence status"), FenceStatus::NotSignalled);
    }

    #[test]
    #[ignore = "requires vulkan-tests feature and a loadable Vulkan ICD"]
    #[cfg(feature = "vulkan-tests")]
    fn semaphore_creation_succeeds() {
        let device = test_device();
        let semaphore = device.create_semaphore().expect("semaphore creation");
        assert!(semaphore.is_valid());
    }
}
