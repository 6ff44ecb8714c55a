//! Scoped recording of dispatches. Vulkan has no native "compute pass"
//! object; this recorder exists only to group bind/dispatch calls under a
//! debug label the way the render pass recorder groups draws.

use ash::vk;

use crate::command_recorder::GpuCommandRecorder;
use crate::compute_pipeline::GpuComputePipeline;

pub struct GpuComputePassRecorder<'a> {
    recorder: &'a GpuCommandRecorder,
}

impl<'a> GpuComputePassRecorder<'a> {
    pub(crate) fn begin(recorder: &'a GpuCommandRecorder, label: &str) -> Self {
        recorder.push_debug_label(label, [0.0, 0.0, 0.0, 1.0]);
        Self { recorder }
    }

    pub fn bind_pipeline(&self, pipeline: &GpuComputePipeline) {
        let resources = self.recorder.device().context.resources.lock();
        let raw = resources
            .get(pipeline.handle())
            .expect("compute pipeline handle valid for the lifetime of GpuComputePipeline")
            .raw();
        self.recorder.inner().bind_compute_pipeline(raw);
    }

    pub fn bind_descriptor_sets(
        &self,
        layout: &crate::pipeline_layout::GpuPipelineLayout,
        first_set: u32,
        bind_groups: &[&crate::bind_group::GpuBindGroup],
    ) {
        let resources = self.recorder.device().context.resources.lock();
        let layout_raw = resources
            .get(layout.handle())
            .expect("pipeline layout handle valid for the lifetime of GpuPipelineLayout")
            .raw();
        let sets: Vec<vk::DescriptorSet> = bind_groups
            .iter()
            .map(|group| {
                resources
                    .get(group.handle())
                    .expect("bind group handle valid for the lifetime of GpuBindGroup")
                    .raw()
            })
            .collect();
        self.recorder.inner().bind_descriptor_sets(
            vk::PipelineBindPoint::COMPUTE,
            layout_raw,
            first_set,
            &sets,
            &[],
        );
    }

    pub fn push_constants(
        &self,
        layout: &crate::pipeline_layout::GpuPipelineLayout,
        offset: u32,
        data: &[u8],
    ) {
        let resources = self.recorder.device().context.resources.lock();
        let layout_raw = resources
            .get(layout.handle())
            .expect("pipeline layout handle valid for the lifetime of GpuPipelineLayout")
            .raw();
        self.recorder
            .inner()
            .push_constants(layout_raw, vk::ShaderStageFlags::COMPUTE, offset, data);
    }

    pub fn dispatch(&self, group_count_x: u32, group_count_y: u32, group_count_z: u32) {
        self.recorder
            .inner()
            .dispatch(group_count_x, group_count_y, group_count_z);
    }
}

impl Drop for GpuComputePassRecorder<'_> {
    fn drop(&mut self) {
        self.recorder.pop_debug_label();
    }
}

#[cfg(test)]
mod tests {
    use crate::test_support::test_device;
    use crate::types::CommandBufferLevel;

    #[test]
    #[ignore = "requires vulkan-tests feature and a loadable Vulkan ICD"]
    #[cfg(feature = "vulkan-tests")]
    fn an_empty_compute_pass_pushes_and_pops_its_debug_label() {
        let device = test_device();
        let family = device.graphics_queue().family_index();
        let buffer = device
            .create_command_buffer(family, CommandBufferLevel::Primary)
            .expect("command buffer creation");
        let recorder = buffer.begin().expect("begin recording");
        {
            let _pass = recorder.begin_compute_pass("test pass");
        }
        recorder.end().expect("end recording");
    }
}
