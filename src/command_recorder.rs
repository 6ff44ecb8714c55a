//! The scoped recording API: command buffers are recorded through a
//! recorder that borrows every resource it touches and ends the buffer
//! when dropped.

use ash::vk;

use crate::buffer::GpuBuffer;
use crate::compute_pass_recorder::GpuComputePassRecorder;
use crate::device::GpuDevice;
use crate::error::Result;
use crate::raytracing_pass_recorder::GpuRayTracingPassRecorder;
use crate::render_pass_recorder::{GpuRenderPassRecorder, RenderPassDescriptor};
use crate::texture::GpuTexture;
use crate::timestamp_query::GpuTimestampQueryRecorder;
use crate::types::TextureLayout;

pub struct BufferCopyRegion {
    pub src_offset: u64,
    pub dst_offset: u64,
    pub size: u64,
}

pub struct BufferImageCopyRegion {
    pub buffer_offset: u64,
    pub image_extent: crate::types::Extent3D,
}

pub struct GpuCommandRecorder {
    device: GpuDevice,
    inner: Option<crate::vk::command::VulkanCommandRecorder>,
}

impl GpuCommandRecorder {
    pub(crate) fn begin(device: GpuDevice, raw: vk::CommandBuffer) -> Result<Self> {
        let shared = device.shared();
        let inner = crate::vk::command::VulkanCommandRecorder::begin(shared, raw)?;
        Ok(Self {
            device,
            inner: Some(inner),
        })
    }

    pub(crate) fn inner(&self) -> &crate::vk::command::VulkanCommandRecorder {
        self.inner
            .as_ref()
            .expect("recorder used after end() consumed it")
    }

    pub fn push_debug_label(&self, name: &str, color: [f32; 4]) {
        self.inner().push_debug_label(name, color);
    }

    pub fn pop_debug_label(&self) {
        self.inner().pop_debug_label();
    }

    pub fn buffer_barrier(
        &self,
        buffer: &GpuBuffer,
        src_stage: vk::PipelineStageFlags,
        dst_stage: vk::PipelineStageFlags,
        src_access: vk::AccessFlags,
        dst_access: vk::AccessFlags,
    ) {
        let resources = self.device.context.resources.lock();
        let raw = resources
            .get(buffer.handle())
            .expect("buffer handle valid for the lifetime of GpuBuffer")
            .raw();
        self.inner()
            .buffer_barrier(raw, src_stage, dst_stage, src_access, dst_access);
    }

    pub fn image_barrier(
        &self,
        texture: &GpuTexture,
        aspect: crate::types::TextureAspectFlags,
        old_layout: TextureLayout,
        new_layout: TextureLayout,
        src_stage: vk::PipelineStageFlags,
        dst_stage: vk::PipelineStageFlags,
        src_access: vk::AccessFlags,
        dst_access: vk::AccessFlags,
    ) {
        let resources = self.device.context.resources.lock();
        let raw = resources
            .get(texture.handle())
            .expect("texture handle valid for the lifetime of GpuTexture")
            .raw();
        self.inner().image_barrier(
            raw, aspect, old_layout, new_layout, src_stage, dst_stage, src_access, dst_access,
        );
    }

    pub fn copy_buffer(&self, src: &GpuBuffer, dst: &GpuBuffer, regions: &[BufferCopyRegion]) {
        let resources = self.device.context.resources.lock();
        let src_raw = resources
            .get(src.handle())
            .expect("buffer handle valid for the lifetime of GpuBuffer")
            .raw();
        let dst_raw = resources
            .get(dst.handle())
            .expect("buffer handle valid for the lifetime of GpuBuffer")
            .raw();
        let vk_regions: Vec<vk::BufferCopy> = regions
            .iter()
            .map(|region| vk::BufferCopy {
                src_offset: region.src_offset,
                dst_offset: region.dst_offset,
                size: region.size,
            })
            .collect();
        self.inner().copy_buffer(src_raw, dst_raw, &vk_regions);
    }

    pub fn copy_buffer_to_image(
        &self,
        src: &GpuBuffer,
        dst: &GpuTexture,
        layout: TextureLayout,
        regions: &[BufferImageCopyRegion],
    ) {
        let resources = self.device.context.resources.lock();
        let src_raw = resources
            .get(src.handle())
            .expect("buffer handle valid for the lifetime of GpuBuffer")
            .raw();
        let dst_raw = resources
            .get(dst.handle())
            .expect("texture handle valid for the lifetime of GpuTexture")
            .raw();
        let vk_regions: Vec<vk::BufferImageCopy> = regions
            .iter()
            .map(|region| vk::BufferImageCopy {
                buffer_offset: region.buffer_offset,
                buffer_row_length: 0,
                buffer_image_height: 0,
                image_subresource: vk::ImageSubresourceLayers {
                    aspect_mask: vk::ImageAspectFlags::COLOR,
                    mip_level: 0,
                    base_array_layer: 0,
                    layer_count: 1,
                },
                image_offset: vk::Offset3D::default(),
                image_extent: vk::Extent3D {
                    width: region.image_extent.width,
                    height: region.image_extent.height,
                    depth: region.image_extent.depth,
                },
            })
            .collect();
        self.inner()
            .copy_buffer_to_image(src_raw, dst_raw, layout, &vk_regions);
    }

    /// Begins a render pass; the returned recorder ends it on drop.
    pub fn begin_render_pass(
        &self,
        descriptor: RenderPassDescriptor<'_>,
    ) -> Result<GpuRenderPassRecorder<'_>> {
        GpuRenderPassRecorder::begin(self, descriptor)
    }

    /// Compute dispatches need no native "begin/end" pair; this recorder
    /// exists purely to scope bind/dispatch calls under a debug label the
    /// way the render pass recorder scopes draw calls.
    pub fn begin_compute_pass(&self, label: &str) -> GpuComputePassRecorder<'_> {
        GpuComputePassRecorder::begin(self, label)
    }

    /// Scopes a `vkCmdTraceRaysKHR` dispatch under a debug label, same
    /// shape as [`Self::begin_compute_pass`].
    pub fn begin_raytracing_pass(&self, label: &str) -> GpuRayTracingPassRecorder<'_> {
        GpuRayTracingPassRecorder::begin(self, label)
    }

    /// Resets every slot of `recorder`'s query pool so its timestamps can
    /// be rewritten this frame.
    pub fn reset_timestamp_query(&self, recorder: &GpuTimestampQueryRecorder) {
        let resources = self.device.context.resources.lock();
        let vk_recorder = resources
            .get(recorder.handle())
            .expect("timestamp query recorder handle valid for the lifetime of GpuTimestampQueryRecorder");
        self.inner()
            .reset_query_pool(vk_recorder.pool, 0, vk_recorder.query_count);
    }

    /// Writes a GPU timestamp into `recorder`'s pool at `query_index`,
    /// once the given pipeline stage has completed.
    pub fn write_timestamp(
        &self,
        recorder: &GpuTimestampQueryRecorder,
        query_index: u32,
        stage: vk::PipelineStageFlags,
    ) {
        let resources = self.device.context.resources.lock();
        let pool = resources
            .get(recorder.handle())
            .expect("timestamp query recorder handle valid for the lifetime of GpuTimestampQueryRecorder")
            .pool;
        self.inner().write_timestamp(pool, query_index, stage);
    }

    pub(crate) fn raw(&self) -> vk::CommandBuffer {
        self.inner().raw
    }

    pub(crate) fn device(&self) -> &GpuDevice {
        &self.device
    }

    pub fn end(mut self) -> Result<()> {
        self.inner.take().expect("end() called once").end()
    }
}

impl Drop for GpuCommandRecorder {
    fn drop(&mut self) {
        if let Some(inner) = self.inner.take() {
            let _ = inner.end();
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::test_support::test_device;
    use crate::types::{BufferUsageFlags, CommandBufferLevel, MemoryUsage};

    #[test]
    #[ignore = "requires vulkan-tests feature and a loadable Vulkan ICD"]
    #[cfg(feature = "vulkan-tests")]
    fn copying_between_two_buffers_is_visible_after_the_submission_completes() {
        let device = test_device();
        let queue = device.graphics_queue();

        let src = device
            .create_buffer(256, BufferUsageFlags::TRANSFER_SRC, MemoryUsage::CpuToGpu)
            .expect("src buffer creation");
        let dst = device
            .create_buffer(256, BufferUsageFlags::TRANSFER_DST, MemoryUsage::GpuOnly)
            .expect("dst buffer creation");

        let command_buffer = device
            .create_command_buffer(queue.family_index(), CommandBufferLevel::Primary)
            .expect("command buffer creation");
        let recorder = command_buffer.begin().expect("begin recording");
        recorder.push_debug_label("copy", [1.0, 0.0, 0.0, 1.0]);
        recorder.copy_buffer(
            &src,
            &dst,
            &[super::BufferCopyRegion {
                src_offset: 0,
                dst_offset: 0,
                size: 256,
            }],
        );
        recorder.pop_debug_label();
        recorder.end().expect("end recording");

        let fence = device.create_fence(false).expect("fence creation");
        queue
            .submit(&crate::queue::SubmitInfo {
                command_buffers: &[&command_buffer],
                wait_semaphores: &[],
                signal_semaphores: &[],
                fence: Some(&fence),
            })
            .expect("submit");
        fence.wait(u64::MAX).expect("fence wait");
    }
}
