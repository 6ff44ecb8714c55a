//! GPU timestamp queries, read back after the submission that wrote them
//! has completed.

use crate::device::GpuDevice;
use crate::error::Result;
use crate::handle::Handle;
use crate::resource_manager::TimestampQueryRecorderTag;

pub struct GpuTimestampQueryRecorder {
    device: GpuDevice,
    handle: Handle<TimestampQueryRecorderTag>,
}

impl GpuTimestampQueryRecorder {
    pub(crate) fn new(device: GpuDevice, handle: Handle<TimestampQueryRecorderTag>) -> Self {
        Self { device, handle }
    }

    pub fn is_valid(&self) -> bool {
        self.handle.is_valid()
    }

    pub fn handle(&self) -> Handle<TimestampQueryRecorderTag> {
        self.handle
    }

    /// Raw timestamp ticks; multiply by `AdapterProperties::timestamp_period`
    /// to get nanoseconds.
    pub fn query_results(&self) -> Result<Vec<u64>> {
        self.device
            .context
            .resources
            .lock()
            .get(self.handle)
            .expect("timestamp query recorder handle valid for the lifetime of GpuTimestampQueryRecorder")
            .query_results()
    }
}

impl Drop for GpuTimestampQueryRecorder {
    fn drop(&mut self) {
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
    fn query_results_are_readable_after_the_writing_submission_completes() {
        let device = test_device();
        let recorder = device
            .create_timestamp_query_recorder(2)
            .expect("timestamp query recorder creation");

        let family = device.graphics_queue().family_index();
        let buffer = device
            .create_command_buffer(family, CommandBufferLevel::Primary)
            .expect("command buffer creation");
        let cmd = buffer.begin().expect("begin recording");
        cmd.reset_timestamp_query(&recorder);
        cmd.write_timestamp(&recorder, 0, ash::vk::PipelineStageFlags::TOP_OF_PIPE);
        cmd.write_timestamp(&recorder, 1, ash::vk::PipelineStageFlags::BOTTOM_OF_PIPE);
        cmd.end().expect("end recording");

        let queue = device.graphics_queue();
        queue
            .submit(&crate::queue::SubmitInfo {
                command_buffers: &[&buffer],
                wait_semaphores: &[],
                signal_semaphores: &[],
                fence: None,
            })
            .expect("submit");
        queue.wait_idle().expect("wait idle");

        let results = recorder.query_results().expect("query results");
        assert_eq!(results.len(), 2);
    }
}
