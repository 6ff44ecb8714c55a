//! GPU-visible buffer resources.

use ash::vk;

use crate::device::GpuDevice;
use crate::handle::Handle;
use crate::resource_manager::BufferTag;
use crate::types::ExternalMemoryHandle;

pub struct GpuBuffer {
    device: GpuDevice,
    handle: Handle<BufferTag>,
    size: u64,
}

impl GpuBuffer {
    pub(crate) fn new(device: GpuDevice, handle: Handle<BufferTag>, size: u64) -> Self {
        Self { device, handle, size }
    }

    pub fn is_valid(&self) -> bool {
        self.handle.is_valid()
    }

    pub fn handle(&self) -> Handle<BufferTag> {
        self.handle
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    /// Maps the buffer's memory for host access. Only valid for buffers
    /// created with a host-visible [`crate::types::MemoryUsage`].
    pub fn map(&self) -> crate::error::Result<*mut u8> {
        let mut resources = self.device.context.resources.lock();
        let buffer = resources
            .get_mut(self.handle)
            .expect("buffer handle valid for the lifetime of GpuBuffer");
        buffer.map()
    }

    pub fn unmap(&self) {
        let mut resources = self.device.context.resources.lock();
        if let Some(buffer) = resources.get_mut(self.handle) {
            buffer.unmap();
        }
    }

    /// Flushes host writes in `[offset, offset + size)` so they become
    /// visible to the device.
    pub fn flush(&self, offset: u64, size: u64) -> crate::error::Result<()> {
        let resources = self.device.context.resources.lock();
        resources
            .get(self.handle)
            .expect("buffer handle valid for the lifetime of GpuBuffer")
            .flush(offset, size)
    }

    /// Invalidates `[offset, offset + size)` so subsequent host reads see
    /// writes the device has made.
    pub fn invalidate(&self, offset: u64, size: u64) -> crate::error::Result<()> {
        let resources = self.device.context.resources.lock();
        resources
            .get(self.handle)
            .expect("buffer handle valid for the lifetime of GpuBuffer")
            .invalidate(offset, size)
    }

    /// `vkGetBufferDeviceAddress`, usable for bindless addressing in
    /// shaders. Requires the device to have enabled buffer device address
    /// support and this buffer to have been created with
    /// [`crate::types::BufferUsageFlags::SHADER_DEVICE_ADDRESS`].
    pub fn buffer_device_address(&self) -> crate::error::Result<vk::DeviceAddress> {
        let resources = self.device.context.resources.lock();
        resources
            .get(self.handle)
            .expect("buffer handle valid for the lifetime of GpuBuffer")
            .device_address()
    }

    /// Exports this buffer's dedicated memory allocation as an OS handle.
    /// Only valid for buffers created through
    /// [`GpuDevice::create_buffer_with_external_memory`].
    pub fn external_memory_handle(&self) -> crate::error::Result<ExternalMemoryHandle> {
        let resources = self.device.context.resources.lock();
        resources
            .get(self.handle)
            .expect("buffer handle valid for the lifetime of GpuBuffer")
            .external_memory_handle()
    }
}

impl Drop for GpuBuffer {
    fn drop(&mut self) {
        let frame = self.device.current_frame();
        self.device.deleter().lock().delete_buffer(frame, self.handle);
    }
}

#[cfg(test)]
mod tests {
    use crate::test_support::test_device;
    use crate::types::{BufferUsageFlags, MemoryUsage};

    #[test]
    #[ignore = "requires vulkan-tests feature and a loadable Vulkan ICD"]
    #[cfg(feature = "vulkan-tests")]
    fn a_host_visible_buffer_round_trips_mapped_writes() {
        let device = test_device();
        let buffer = device
            .create_buffer(256, BufferUsageFlags::TRANSFER_SRC, MemoryUsage::CpuToGpu)
            .expect("buffer creation");
        assert_eq!(buffer.size(), 256);

        let ptr = buffer.map().expect("map");
        unsafe { std::ptr::write_bytes(ptr, 0xAB, 256) };
        buffer.unmap();
    }

    #[test]
    #[ignore = "requires vulkan-tests feature and a loadable Vulkan ICD"]
    #[cfg(feature = "vulkan-tests")]
    fn dropping_a_buffer_defers_its_deletion_past_the_current_frame() {
        let device = test_device();
        let buffer = device
            .create_buffer(64, BufferUsageFlags::TRANSFER_DST, MemoryUsage::GpuOnly)
            .expect("buffer creation");
        let handle = buffer.handle();
        drop(buffer);
        // Still resolvable: the deleter only releases it once
        // `frames_in_flight` frames have elapsed via `begin_frame`.
        assert!(device.context.resources.lock().get(handle).is_some());
    }

    #[test]
    #[ignore = "requires vulkan-tests feature and a loadable Vulkan ICD"]
    #[cfg(feature = "vulkan-tests")]
    fn a_shader_device_address_buffer_reports_a_nonzero_address() {
        let device = test_device();
        let buffer = device
            .create_buffer(
                256,
                BufferUsageFlags::STORAGE_BUFFER | BufferUsageFlags::SHADER_DEVICE_ADDRESS,
                MemoryUsage::GpuOnly,
            )
            .expect("buffer creation");
        assert!(buffer.buffer_device_address().expect("device address") != 0);
    }

    #[test]
    #[ignore = "requires vulkan-tests feature and a loadable Vulkan ICD, linux-only handle type"]
    #[cfg(feature = "vulkan-tests")]
    fn an_external_memory_buffer_exports_a_valid_fd() {
        let device = test_device();
        let buffer = device
            .create_buffer_with_external_memory(
                256,
                BufferUsageFlags::TRANSFER_SRC,
                MemoryUsage::CpuToGpu,
                Some(crate::types::ExternalMemoryHandleType::OpaqueFd),
            )
            .expect("buffer creation");
        let handle = buffer.external_memory_handle().expect("export");
        assert!(handle.fd.expect("fd") >= 0);
        assert!(handle.allocation_size > 0);
    }
}
