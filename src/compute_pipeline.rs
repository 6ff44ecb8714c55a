//! A single compute shader stage bound to a pipeline layout.

use crate::device::GpuDevice;
use crate::handle::Handle;
use crate::resource_manager::ComputePipelineTag;

pub struct GpuComputePipeline {
    device: GpuDevice,
    handle: Handle<ComputePipelineTag>,
}

impl GpuComputePipeline {
    pub(crate) fn new(device: GpuDevice, handle: Handle<ComputePipelineTag>) -> Self {
        Self { device, handle }
    }

    pub fn is_valid(&self) -> bool {
        self.handle.is_valid()
    }

    pub fn handle(&self) -> Handle<ComputePipelineTag> {
        self.handle
    }
}

impl Drop for GpuComputePipeline {
    fn drop(&mut self) {
        let frame = self.device.current_frame();
        self.device
            .deleter()
            .lock()
            .delete_compute_pipeline(frame, self.handle);
    }
}
