//! Scoped recording of a single `vkCmdTraceRaysKHR` dispatch.

use ash::vk;

use crate::command_recorder::GpuCommandRecorder;
use crate::raytracing_pipeline::GpuRayTracingPipeline;
use crate::raytracing_sbt::GpuShaderBindingTable;

pub struct GpuRayTracingPassRecorder<'a> {
    recorder: &'a GpuCommandRecorder,
    loader: ash::khr::ray_tracing_pipeline::Device,
}

impl<'a> GpuRayTracingPassRecorder<'a> {
    pub(crate) fn begin(recorder: &'a GpuCommandRecorder, label: &str) -> Self {
        recorder.push_debug_label(label, [0.0, 0.0, 0.0, 1.0]);
        let shared = recorder.device().shared();
        let loader = ash::khr::ray_tracing_pipeline::Device::new(&shared.instance.raw, &shared.raw);
        Self { recorder, loader }
    }

    pub fn bind_pipeline(&self, pipeline: &GpuRayTracingPipeline) {
        let resources = self.recorder.device().context.resources.lock();
        let raw = resources
            .get(pipeline.handle())
            .expect("ray tracing pipeline handle valid for the lifetime of GpuRayTracingPipeline")
            .raw();
        self.recorder.inner().bind_raytracing_pipeline(raw);
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
            vk::PipelineBindPoint::RAY_TRACING_KHR,
            layout_raw,
            first_set,
            &sets,
            &[],
        );
    }

    pub fn trace_rays(&self, sbt: &GpuShaderBindingTable, width: u32, height: u32, depth: u32) {
        let (raygen, miss, hit, callable) = sbt.regions();
        self.recorder
            .inner()
            .trace_rays(&self.loader, &raygen, &miss, &hit, &callable, width, height, depth);
    }
}

impl Drop for GpuRayTracingPassRecorder<'_> {
    fn drop(&mut self) {
        self.recorder.pop_debug_label();
    }
}

#[cfg(test)]
mod tests {
    use crate::test_support::test_device_with_raytracing;
    use crate::types::CommandBufferLevel;

    #[test]
    #[ignore = "requires vulkan-tests feature, ray tracing extensions, and a loadable Vulkan ICD"]
    #[cfg(feature = "vulkan-tests")]
    fn an_empty_raytracing_pass_pushes_and_pops_its_debug_label() {
        let device = test_device_with_raytracing();
        let family = device.graphics_queue().family_index();
        let buffer = device
            .create_command_buffer(family, CommandBufferLevel::Primary)
            .expect("command buffer creation");
        let recorder = buffer.begin().expect("begin recording");
        {
            let _pass = recorder.begin_raytracing_pass("test pass");
        }
        recorder.end().expect("end recording");
    }
}
