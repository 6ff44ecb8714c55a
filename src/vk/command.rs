//! Command pools, command buffers, and the low-level recording primitives
//! the front-end pass recorders are built from.
//!
//! Grounded on `wgpu-hal/src/vulkan/mod.rs`'s command encoder and the
//! original's `vulkan_command_recorder.cpp` for debug-label scoping via
//! `VK_EXT_debug_utils` (SPEC_FULL.md §10).

use std::ffi::CString;
use std::sync::Arc;

use ash::vk;

use crate::types::{CommandBufferLevel, Extent3D, Rect2D, TextureAspectFlags, TextureLayout, Viewport};
use crate::vk::conv;
use crate::vk::device::DeviceShared;
use crate::vk::render_pass_cache::{AttachmentKey, FramebufferKey, RenderPassKey};

pub struct VulkanCommandBuffer {
    device: Arc<DeviceShared>,
    pool: vk::CommandPool,
    pub(crate) raw: vk::CommandBuffer,
    owns_pool: bool,
}

impl VulkanCommandBuffer {
    /// Allocates a single-use command buffer from a fresh, dedicated pool.
    /// The original KDGpu pools command buffers per-queue-family; this
    /// crate keeps the simpler one-pool-per-buffer shape since the pool
    /// itself is cheap relative to Vulkan object churn and it sidesteps
    /// having to thread pool ownership through the resource manager.
    pub fn new(
        device: Arc<DeviceShared>,
        queue_family: u32,
        level: CommandBufferLevel,
    ) -> crate::error::Result<Self> {
        let pool_info = vk::CommandPoolCreateInfo::default()
            .queue_family_index(queue_family)
            .flags(vk::CommandPoolCreateFlags::RESET_COMMAND_BUFFER);
        let pool = unsafe { device.raw.create_command_pool(&pool_info, None)? };

        let alloc_info = vk::CommandBufferAllocateInfo::default()
            .command_pool(pool)
            .level(match level {
                CommandBufferLevel::Primary => vk::CommandBufferLevel::PRIMARY,
                CommandBufferLevel::Secondary => vk::CommandBufferLevel::SECONDARY,
            })
            .command_buffer_count(1);
        let raw = unsafe { device.raw.allocate_command_buffers(&alloc_info)?[0] };

        Ok(Self {
            device,
            pool,
            raw,
            owns_pool: true,
        })
    }

    pub fn raw(&self) -> vk::CommandBuffer {
        self.raw
    }

    pub fn reset(&self) -> crate::error::Result<()> {
        unsafe {
            self.device
                .raw
                .reset_command_buffer(self.raw, vk::CommandBufferResetFlags::empty())?
        };
        Ok(())
    }
}

impl Drop for VulkanCommandBuffer {
    fn drop(&mut self) {
        if self.owns_pool {
            unsafe { self.device.raw.destroy_command_pool(self.pool, None) };
        }
    }
}

pub struct ColorAttachment {
    pub view: vk::ImageView,
    pub format: crate::types::Format,
    pub load_op: crate::types::AttachmentLoadOp,
    pub store_op: crate::types::AttachmentStoreOp,
    pub clear_value: [f32; 4],
    /// Single-sample view this (multisampled) attachment resolves into at
    /// the end of the subpass, if any.
    pub resolve_view: Option<vk::ImageView>,
    pub resolve_mode: crate::types::ResolveModeFlagBits,
}

pub struct DepthStencilAttachment {
    pub view: vk::ImageView,
    pub format: crate::types::Format,
    pub depth_load_op: crate::types::AttachmentLoadOp,
    pub depth_store_op: crate::types::AttachmentStoreOp,
    pub clear_depth: f32,
    pub clear_stencil: u32,
}

/// Thin wrapper over an already-begun `VkCommandBuffer`; owns none of the
/// resources it touches beyond a reference-counted handle to the device
/// that keeps it alive.
pub struct VulkanCommandRecorder {
    device: Arc<DeviceShared>,
    pub(crate) raw: vk::CommandBuffer,
}

impl VulkanCommandRecorder {
    pub fn begin(device: Arc<DeviceShared>, raw: vk::CommandBuffer) -> crate::error::Result<Self> {
        let info = vk::CommandBufferBeginInfo::default()
            .flags(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT);
        unsafe { device.raw.begin_command_buffer(raw, &info)? };
        Ok(Self { device, raw })
    }

    pub fn end(self) -> crate::error::Result<()> {
        unsafe { self.device.raw.end_command_buffer(self.raw)? };
        Ok(())
    }

    pub fn push_debug_label(&self, name: &str, color: [f32; 4]) {
        let Some(debug_utils) = self.device.instance.debug_utils.as_ref() else {
            return;
        };
        let name = CString::new(name).unwrap_or_default();
        let label = vk::DebugUtilsLabelEXT::default()
            .label_name(&name)
            .color(color);
        unsafe { debug_utils.cmd_begin_debug_utils_label(self.raw, &label) };
    }

    pub fn pop_debug_label(&self) {
        let Some(debug_utils) = self.device.instance.debug_utils.as_ref() else {
            return;
        };
        unsafe { debug_utils.cmd_end_debug_utils_label(self.raw) };
    }

    pub fn image_barrier(
        &self,
        image: vk::Image,
        aspect: TextureAspectFlags,
        old_layout: TextureLayout,
        new_layout: TextureLayout,
        src_stage: vk::PipelineStageFlags,
        dst_stage: vk::PipelineStageFlags,
        src_access: vk::AccessFlags,
        dst_access: vk::AccessFlags,
    ) {
        let barrier = vk::ImageMemoryBarrier::default()
            .old_layout(conv::image_layout(old_layout))
            .new_layout(conv::image_layout(new_layout))
            .src_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
            .dst_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
            .image(image)
            .subresource_range(vk::ImageSubresourceRange {
                aspect_mask: conv::aspect_mask(aspect),
                base_mip_level: 0,
                level_count: vk::REMAINING_MIP_LEVELS,
                base_array_layer: 0,
                layer_count: vk::REMAINING_ARRAY_LAYERS,
            })
            .src_access_mask(src_access)
            .dst_access_mask(dst_access);
        unsafe {
            self.device.raw.cmd_pipeline_barrier(
                self.raw,
                src_stage,
                dst_stage,
                vk::DependencyFlags::empty(),
                &[],
                &[],
                &[barrier],
            )
        };
    }

    pub fn buffer_barrier(
        &self,
        buffer: vk::Buffer,
        src_stage: vk::PipelineStageFlags,
        dst_stage: vk::PipelineStageFlags,
        src_access: vk::AccessFlags,
        dst_access: vk::AccessFlags,
    ) {
        let barrier = vk::BufferMemoryBarrier::default()
            .buffer(buffer)
            .offset(0)
            .size(vk::WHOLE_SIZE)
            .src_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
            .dst_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
            .src_access_mask(src_access)
            .dst_access_mask(dst_access);
        unsafe {
            self.device.raw.cmd_pipeline_barrier(
                self.raw,
                src_stage,
                dst_stage,
                vk::DependencyFlags::empty(),
                &[],
                &[barrier],
                &[],
            )
        };
    }

    pub fn copy_buffer(&self, src: vk::Buffer, dst: vk::Buffer, regions: &[vk::BufferCopy]) {
        unsafe { self.device.raw.cmd_copy_buffer(self.raw, src, dst, regions) };
    }

    pub fn copy_buffer_to_image(
        &self,
        src: vk::Buffer,
        dst: vk::Image,
        layout: TextureLayout,
        regions: &[vk::BufferImageCopy],
    ) {
        unsafe {
            self.device.raw.cmd_copy_buffer_to_image(
                self.raw,
                src,
                dst,
                conv::image_layout(layout),
                regions,
            )
        };
    }

    /// Blits `src_region` of `src` into `dst_region` of `dst`, linear
    /// filtering between them. Used by mip map generation to downsample
    /// one level into the next.
    #[allow(clippy::too_many_arguments)]
    pub fn blit_image(
        &self,
        src: vk::Image,
        src_layout: TextureLayout,
        src_mip_level: u32,
        src_extent: Extent3D,
        dst: vk::Image,
        dst_layout: TextureLayout,
        dst_mip_level: u32,
        dst_extent: Extent3D,
    ) {
        let blit = vk::ImageBlit {
            src_subresource: vk::ImageSubresourceLayers {
                aspect_mask: vk::ImageAspectFlags::COLOR,
                mip_level: src_mip_level,
                base_array_layer: 0,
                layer_count: 1,
            },
            src_offsets: [
                vk::Offset3D::default(),
                vk::Offset3D {
                    x: src_extent.width as i32,
                    y: src_extent.height as i32,
                    z: src_extent.depth as i32,
                },
            ],
            dst_subresource: vk::ImageSubresourceLayers {
                aspect_mask: vk::ImageAspectFlags::COLOR,
                mip_level: dst_mip_level,
                base_array_layer: 0,
                layer_count: 1,
            },
            dst_offsets: [
                vk::Offset3D::default(),
                vk::Offset3D {
                    x: dst_extent.width as i32,
                    y: dst_extent.height as i32,
                    z: dst_extent.depth as i32,
                },
            ],
        };
        unsafe {
            self.device.raw.cmd_blit_image(
                self.raw,
                src,
                conv::image_layout(src_layout),
                dst,
                conv::image_layout(dst_layout),
                &[blit],
                vk::Filter::LINEAR,
            )
        };
    }

    /// Begins a render pass, resolving (or creating) the cached
    /// `VkRenderPass`/`VkFramebuffer` pair for this attachment set.
    pub fn begin_render_pass(
        &self,
        color_attachments: &[ColorAttachment],
        depth_stencil_attachment: Option<&DepthStencilAttachment>,
        view_handles: Vec<crate::handle::Handle<crate::resource_manager::TextureViewTag>>,
        extent: Extent3D,
        samples: u32,
    ) -> crate::error::Result<()> {
        let color_keys: Vec<AttachmentKey> = color_attachments
            .iter()
            .map(|attachment| AttachmentKey {
                format: attachment.format,
                load_op: attachment.load_op,
                store_op: attachment.store_op,
                initial_layout: TextureLayout::ColorAttachmentOptimal,
                final_layout: TextureLayout::ColorAttachmentOptimal,
                resolve_mode: attachment.resolve_mode,
            })
            .collect();
        let depth_key = depth_stencil_attachment.map(|attachment| AttachmentKey {
            format: attachment.format,
            load_op: attachment.depth_load_op,
            store_op: attachment.depth_store_op,
            initial_layout: TextureLayout::DepthStencilAttachmentOptimal,
            final_layout: TextureLayout::DepthStencilAttachmentOptimal,
            resolve_mode: crate::types::ResolveModeFlagBits::None,
        });

        let render_pass_key = RenderPassKey {
            color_attachments: color_keys,
            depth_stencil_attachment: depth_key,
            samples,
            view_count: 1,
        };

        let mut cache = self.device.render_pass_cache.lock();
        let render_pass = cache.render_pass(&self.device.raw, &render_pass_key)?;

        // Image view order must match the attachment order `render_pass`
        // assigns: colors, then depth/stencil, then each color attachment's
        // resolve view (skipped where there is none), matching the order
        // `RenderPassCache::render_pass` appends resolve descriptions in.
        let mut views: Vec<vk::ImageView> =
            color_attachments.iter().map(|a| a.view).collect();
        if let Some(attachment) = depth_stencil_attachment {
            views.push(attachment.view);
        }
        for attachment in color_attachments {
            if let Some(resolve_view) = attachment.resolve_view {
                views.push(resolve_view);
            }
        }

        let framebuffer_key = FramebufferKey {
            render_pass,
            attachments: view_handles,
            width: extent.width,
            height: extent.height,
            layers: 1,
        };
        let framebuffer = cache.framebuffer(&self.device.raw, &framebuffer_key, &views)?;
        drop(cache);

        let mut clear_values: Vec<vk::ClearValue> = color_attachments
            .iter()
            .map(|attachment| vk::ClearValue {
                color: vk::ClearColorValue {
                    float32: attachment.clear_value,
                },
            })
            .collect();
        if let Some(attachment) = depth_stencil_attachment {
            clear_values.push(vk::ClearValue {
                depth_stencil: vk::ClearDepthStencilValue {
                    depth: attachment.clear_depth,
                    stencil: attachment.clear_stencil,
                },
            });
        }

        let begin_info = vk::RenderPassBeginInfo::default()
            .render_pass(render_pass)
            .framebuffer(framebuffer)
            .render_area(vk::Rect2D {
                offset: vk::Offset2D { x: 0, y: 0 },
                extent: vk::Extent2D {
                    width: extent.width,
                    height: extent.height,
                },
            })
            .clear_values(&clear_values);

        unsafe {
            self.device.raw.cmd_begin_render_pass(
                self.raw,
                &begin_info,
                vk::SubpassContents::INLINE,
            )
        };
        Ok(())
    }

    pub fn end_render_pass(&self) {
        unsafe { self.device.raw.cmd_end_render_pass(self.raw) };
    }

    pub fn next_subpass(&self) {
        unsafe {
            self.device
                .raw
                .cmd_next_subpass(self.raw, vk::SubpassContents::INLINE)
        };
    }

    pub fn set_viewport(&self, viewport: Viewport) {
        let vk_viewport = vk::Viewport {
            x: viewport.x,
            y: viewport.y,
            width: viewport.width,
            height: viewport.height,
            min_depth: viewport.min_depth,
            max_depth: viewport.max_depth,
        };
        unsafe { self.device.raw.cmd_set_viewport(self.raw, 0, &[vk_viewport]) };
    }

    pub fn set_scissor(&self, rect: Rect2D) {
        let vk_rect = vk::Rect2D {
            offset: vk::Offset2D { x: rect.x, y: rect.y },
            extent: vk::Extent2D {
                width: rect.width,
                height: rect.height,
            },
        };
        unsafe { self.device.raw.cmd_set_scissor(self.raw, 0, &[vk_rect]) };
    }

    pub fn bind_graphics_pipeline(&self, pipeline: vk::Pipeline) {
        unsafe {
            self.device
                .raw
                .cmd_bind_pipeline(self.raw, vk::PipelineBindPoint::GRAPHICS, pipeline)
        };
    }

    pub fn bind_compute_pipeline(&self, pipeline: vk::Pipeline) {
        unsafe {
            self.device
                .raw
                .cmd_bind_pipeline(self.raw, vk::PipelineBindPoint::COMPUTE, pipeline)
        };
    }

    pub fn bind_descriptor_sets(
        &self,
        bind_point: vk::PipelineBindPoint,
        layout: vk::PipelineLayout,
        first_set: u32,
        sets: &[vk::DescriptorSet],
        dynamic_offsets: &[u32],
    ) {
        unsafe {
            self.device.raw.cmd_bind_descriptor_sets(
                self.raw,
                bind_point,
                layout,
                first_set,
                sets,
                dynamic_offsets,
            )
        };
    }

    pub fn bind_vertex_buffers(&self, first_binding: u32, buffers: &[vk::Buffer], offsets: &[u64]) {
        unsafe {
            self.device
                .raw
                .cmd_bind_vertex_buffers(self.raw, first_binding, buffers, offsets)
        };
    }

    pub fn bind_index_buffer(&self, buffer: vk::Buffer, offset: u64, index_type: vk::IndexType) {
        unsafe {
            self.device
                .raw
                .cmd_bind_index_buffer(self.raw, buffer, offset, index_type)
        };
    }

    pub fn draw(&self, vertex_count: u32, instance_count: u32, first_vertex: u32, first_instance: u32) {
        unsafe {
            self.device
                .raw
                .cmd_draw(self.raw, vertex_count, instance_count, first_vertex, first_instance)
        };
    }

    pub fn draw_indexed(
        &self,
        index_count: u32,
        instance_count: u32,
        first_index: u32,
        vertex_offset: i32,
        first_instance: u32,
    ) {
        unsafe {
            self.device.raw.cmd_draw_indexed(
                self.raw,
                index_count,
                instance_count,
                first_index,
                vertex_offset,
                first_instance,
            )
        };
    }

    pub fn draw_indirect(&self, buffer: vk::Buffer, offset: u64, draw_count: u32, stride: u32) {
        unsafe {
            self.device
                .raw
                .cmd_draw_indirect(self.raw, buffer, offset, draw_count, stride)
        };
    }

    pub fn draw_indexed_indirect(&self, buffer: vk::Buffer, offset: u64, draw_count: u32, stride: u32) {
        unsafe {
            self.device
                .raw
                .cmd_draw_indexed_indirect(self.raw, buffer, offset, draw_count, stride)
        };
    }

    pub fn set_stencil_reference(&self, face_mask: vk::StencilFaceFlags, reference: u32) {
        unsafe {
            self.device
                .raw
                .cmd_set_stencil_reference(self.raw, face_mask, reference)
        };
    }

    pub fn dispatch(&self, group_count_x: u32, group_count_y: u32, group_count_z: u32) {
        unsafe {
            self.device
                .raw
                .cmd_dispatch(self.raw, group_count_x, group_count_y, group_count_z)
        };
    }

    pub fn push_constants(
        &self,
        layout: vk::PipelineLayout,
        stages: vk::ShaderStageFlags,
        offset: u32,
        data: &[u8],
    ) {
        unsafe {
            self.device
                .raw
                .cmd_push_constants(self.raw, layout, stages, offset, data)
        };
    }

    pub fn write_timestamp(
        &self,
        pool: vk::QueryPool,
        query: u32,
        stage: vk::PipelineStageFlags,
    ) {
        unsafe {
            self.device
                .raw
                .cmd_write_timestamp(self.raw, stage, pool, query)
        };
    }

    pub fn reset_query_pool(&self, pool: vk::QueryPool, first: u32, count: u32) {
        unsafe {
            self.device
                .raw
                .cmd_reset_query_pool(self.raw, pool, first, count)
        };
    }

    pub fn bind_raytracing_pipeline(&self, pipeline: vk::Pipeline) {
        unsafe {
            self.device.raw.cmd_bind_pipeline(
                self.raw,
                vk::PipelineBindPoint::RAY_TRACING_KHR,
                pipeline,
            )
        };
    }

    #[allow(clippy::too_many_arguments)]
    pub fn trace_rays(
        &self,
        loader: &ash::khr::ray_tracing_pipeline::Device,
        raygen_region: &vk::StridedDeviceAddressRegionKHR,
        miss_region: &vk::StridedDeviceAddressRegionKHR,
        hit_region: &vk::StridedDeviceAddressRegionKHR,
        callable_region: &vk::StridedDeviceAddressRegionKHR,
        width: u32,
        height: u32,
        depth: u32,
    ) {
        unsafe {
            loader.cmd_trace_rays(
                self.raw,
                raygen_region,
                miss_region,
                hit_region,
                callable_region,
                width,
                height,
                depth,
            )
        };
    }

    pub fn draw_mesh_tasks(
        &self,
        loader: &ash::ext::mesh_shader::Device,
        group_count_x: u32,
        group_count_y: u32,
        group_count_z: u32,
    ) {
        unsafe { loader.cmd_draw_mesh_tasks(self.raw, group_count_x, group_count_y, group_count_z) };
    }

    pub fn draw_mesh_tasks_indirect(
        &self,
        loader: &ash::ext::mesh_shader::Device,
        buffer: vk::Buffer,
        offset: u64,
        draw_count: u32,
        stride: u32,
    ) {
        unsafe {
            loader.cmd_draw_mesh_tasks_indirect(self.raw, buffer, offset, draw_count, stride)
        };
    }

    /// Binds a descriptor set's writes directly into the command buffer
    /// without going through a `VkDescriptorSet` allocation, for pipeline
    /// layouts built with a push-descriptor-enabled set layout.
    pub fn push_bind_group(
        &self,
        loader: &ash::khr::push_descriptor::Device,
        bind_point: vk::PipelineBindPoint,
        layout: vk::PipelineLayout,
        set: u32,
        writes: &[vk::WriteDescriptorSet],
    ) {
        unsafe { loader.cmd_push_descriptor_set(self.raw, bind_point, layout, set, writes) };
    }
}
