//! A ray-tracing pipeline built from raygen/miss/hit/callable stages.

use crate::device::GpuDevice;
use crate::handle::Handle;
use crate::resource_manager::RayTracingPipelineTag;

pub struct GpuRayTracingPipeline {
    device: GpuDevice,
    handle: Handle<RayTracingPipelineTag>,
}

impl GpuRayTracingPipeline {
    pub(crate) fn new(device: GpuDevice, handle: Handle<RayTracingPipelineTag>) -> Self {
        Self { device, handle }
    }

    pub fn is_valid(&self) -> bool {
        self.handle.is_valid()
    }

    pub fn handle(&self) -> Handle<RayTracingPipelineTag> {
        self.handle
    }

    pub fn group_count(&self) -> u32 {
        self.device
            .context
            .resources
            .lock()
            .get(self.handle)
            .expect("ray tracing pipeline handle valid for the lifetime of GpuRayTracingPipeline")
            .group_count()
    }
}

impl Drop for GpuRayTracingPipeline {
    fn drop(&mut self) {
        // Ray-tracing pipelines can be referenced by command buffers still
        // in flight, exactly like graphics and compute pipelines, but the
        // original KDGpu frontend deletes them immediately and leaves
        // lifetime safety to the caller's own `waitIdle` discipline. This
        // mirrors that rather than growing `ResourceDeleter` a rarely used
        // eighth variant.
        self.device.context.resources.lock().delete(self.handle);
    }
}
