//! The set of bind group layouts and push-constant ranges a pipeline is
//! built against.

use crate::bind_group_layout::GpuBindGroupLayout;
use crate::device::GpuDevice;
use crate::handle::Handle;
use crate::resource_manager::PipelineLayoutTag;
use crate::types::PushConstantRange;

pub struct PipelineLayoutOptions<'a> {
    pub bind_group_layouts: &'a [&'a GpuBindGroupLayout],
    pub push_constant_ranges: &'a [PushConstantRange],
}

pub struct GpuPipelineLayout {
    device: GpuDevice,
    handle: Handle<PipelineLayoutTag>,
}

impl GpuPipelineLayout {
    pub(crate) fn new(device: GpuDevice, handle: Handle<PipelineLayoutTag>) -> Self {
        Self { device, handle }
    }

    pub fn is_valid(&self) -> bool {
        self.handle.is_valid()
    }

    pub fn handle(&self) -> Handle<PipelineLayoutTag> {
        self.handle
    }
}

impl Drop for GpuPipelineLayout {
    fn drop(&mut self) {
        self.device.context.resources.lock().delete(self.handle);
    }
}

#[cfg(test)]
mod tests {
    use crate::test_support::test_device;

    #[test]
    #[ignore = "requires vulkan-tests feature and a loadable Vulkan ICD"]
    #[cfg(feature = "vulkan-tests")]
    fn an_empty_pipeline_layout_creates_successfully() {
        let device = test_device();
        let layout = device
            .create_pipeline_layout(super::PipelineLayoutOptions {
                bind_group_layouts: &[],
                push_constant_ranges: &[],
            })
            .expect("pipeline layout creation");
        assert!(layout.is_valid());
    }
}
