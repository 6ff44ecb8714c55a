//! A single allocated command buffer, ready to be recorded and submitted.

use ash::vk;

use crate::command_recorder::GpuCommandRecorder;
use crate::device::GpuDevice;
use crate::error::Result;
use crate::handle::Handle;
use crate::resource_manager::CommandBufferTag;

pub struct GpuCommandBuffer {
    device: GpuDevice,
    handle: Handle<CommandBufferTag>,
}

impl GpuCommandBuffer {
    pub(crate) fn new(device: GpuDevice, handle: Handle<CommandBufferTag>) -> Self {
        Self { device, handle }
    }

    pub fn is_valid(&self) -> bool {
        self.handle.is_valid()
    }

    pub fn handle(&self) -> Handle<CommandBufferTag> {
        self.handle
    }

    pub fn reset(&self) -> Result<()> {
        self.device
            .context
            .resources
            .lock()
            .get(self.handle)
            .expect("command buffer handle valid for the lifetime of GpuCommandBuffer")
            .reset()
    }

    /// Begins recording and hands back a recorder scoped to this call.
    /// Ending the recording (and thus the command buffer) happens when the
    /// recorder is dropped, mirroring the scoped-encoder shape used
    /// throughout the rendering backend this crate is built from.
    pub fn begin(&self) -> Result<GpuCommandRecorder> {
        let raw = self.raw();
        GpuCommandRecorder::begin(self.device.clone(), raw)
    }

    pub(crate) fn raw(&self) -> vk::CommandBuffer {
        self.device
            .context
            .resources
            .lock()
            .get(self.handle)
            .expect("command buffer handle valid for the lifetime of GpuCommandBuffer")
            .raw()
    }
}

impl Drop for GpuCommandBuffer {
    fn drop(&mut self) {
        // Destroying the backing command pool is only safe once every
        // submission referencing it has retired; callers are expected to
        // `waitIdle` (or track fences) before dropping a command buffer
        // still in flight, same as the acceleration structure and
        // ray-tracing pipeline wrappers.
        self.device.context.resources.lock().delete(self.handle);
    }
}

#[cfg(test)]
mod tests {
    use crate::test_support::test_device;
    use crate::types::CommandBufferLevel;

    #[test]
    #[ignore = "requires vulkan-tests feature and a loadable Vulkan ICD"]
    #[cfg(feature = "vulkan-tests")]
    fn an_empty_recording_begins_and_ends_cleanly() {
        let device = test_device();
        let family = device.graphics_queue().family_index();
        let buffer = device
            .create_command_buffer(family, CommandBufferLevel::Primary)
            .expect("command buffer creation");
        let recorder = buffer.begin().expect("begin recording");
        recorder.end().expect("end recording");
    }

    #[test]
    #[ignore = "requires vulkan-tests feature and a loadable Vulkan ICD"]
    #[cfg(feature = "vulkan-tests")]
    fn reset_allows_a_command_buffer_to_be_recorded_again() {
        let device = test_device();
        let family = device.graphics_queue().family_index();
        let buffer = device
            .create_command_buffer(family, CommandBufferLevel::Primary)
            .expect("command buffer creation");
        buffer.begin().expect("first recording").end().expect("end");
        buffer.reset().expect("reset");
        buffer.begin().expect("second recording").end().expect("end");
    }
}
