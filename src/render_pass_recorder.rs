//! Scoped recording of draw calls inside a single render pass instance.

use ash::vk;

use crate::command_recorder::GpuCommandRecorder;
use crate::device::GpuDevice;
use crate::error::Result;
use crate::graphics_pipeline::GpuGraphicsPipeline;
use crate::texture_view::GpuTextureView;
use crate::types::{AttachmentLoadOp, AttachmentStoreOp, Extent3D, Format, IndexType, Rect2D, TextureLayout, Viewport};
use crate::vk::render_pass_cache::{AttachmentKey, RenderPassKey};

/// An attachment's structural description: everything a `VkRenderPass`
/// depends on, independent of the concrete image view that will be bound
/// to it at framebuffer time.
pub struct RenderPassAttachmentOptions {
    pub format: Format,
    pub load_op: AttachmentLoadOp,
    pub store_op: AttachmentStoreOp,
    pub initial_layout: TextureLayout,
    pub final_layout: TextureLayout,
}

/// Options for [`crate::device::GpuDevice::create_render_pass`], the
/// explicit creation path that sits alongside the one folded implicitly
/// from a [`RenderPassDescriptor`] in [`GpuCommandRecorder::begin_render_pass`] —
/// both resolve through the same structural cache.
pub struct RenderPassOptions<'a> {
    pub color_attachments: &'a [RenderPassAttachmentOptions],
    pub depth_stencil_attachment: Option<RenderPassAttachmentOptions>,
    pub samples: u32,
}

pub(crate) fn create_render_pass(
    device: &GpuDevice,
    options: RenderPassOptions<'_>,
) -> Result<vk::RenderPass> {
    let key = RenderPassKey {
        color_attachments: options
            .color_attachments
            .iter()
            .map(|attachment| AttachmentKey {
                format: attachment.format,
                load_op: attachment.load_op,
                store_op: attachment.store_op,
                initial_layout: attachment.initial_layout,
                final_layout: attachment.final_layout,
                resolve_mode: crate::types::ResolveModeFlagBits::None,
            })
            .collect(),
        depth_stencil_attachment: options.depth_stencil_attachment.as_ref().map(|attachment| AttachmentKey {
            format: attachment.format,
            load_op: attachment.load_op,
            store_op: attachment.store_op,
            initial_layout: attachment.initial_layout,
            final_layout: attachment.final_layout,
            resolve_mode: crate::types::ResolveModeFlagBits::None,
        }),
        samples: options.samples,
        view_count: 1,
    };
    let shared = device.shared();
    let mut cache = shared.render_pass_cache.lock();
    cache.render_pass(&shared.raw, &key)
}

pub struct ColorAttachmentDescriptor<'a> {
    pub view: &'a GpuTextureView,
    pub format: Format,
    pub load_op: AttachmentLoadOp,
    pub store_op: AttachmentStoreOp,
    pub clear_value: [f32; 4],
    /// Single-sample view this attachment resolves into at the end of the
    /// pass. `resolve_mode` must be something other than `None` for this to
    /// take effect.
    pub resolve_view: Option<&'a GpuTextureView>,
    pub resolve_mode: crate::types::ResolveModeFlagBits,
}

pub struct DepthStencilAttachmentDescriptor<'a> {
    pub view: &'a GpuTextureView,
    pub format: Format,
    pub depth_load_op: AttachmentLoadOp,
    pub depth_store_op: AttachmentStoreOp,
    pub clear_depth: f32,
    pub clear_stencil: u32,
}

pub struct RenderPassDescriptor<'a> {
    pub color_attachments: &'a [ColorAttachmentDescriptor<'a>],
    pub depth_stencil_attachment: Option<DepthStencilAttachmentDescriptor<'a>>,
    pub extent: Extent3D,
    pub samples: u32,
}

pub struct GpuRenderPassRecorder<'a> {
    recorder: &'a GpuCommandRecorder,
}

impl<'a> GpuRenderPassRecorder<'a> {
    pub(crate) fn begin(
        recorder: &'a GpuCommandRecorder,
        descriptor: RenderPassDescriptor<'_>,
    ) -> Result<Self> {
        let resources = recorder.device().context.resources.lock();

        let mut view_handles = Vec::with_capacity(descriptor.color_attachments.len() * 2 + 1);
        let mut color_attachments: Vec<crate::vk::command::ColorAttachment> = descriptor
            .color_attachments
            .iter()
            .map(|attachment| {
                let vk_view = resources
                    .get(attachment.view.handle())
                    .expect("texture view handle valid for the lifetime of GpuTextureView");
                view_handles.push(attachment.view.handle());
                crate::vk::command::ColorAttachment {
                    view: vk_view.raw(),
                    format: attachment.format,
                    load_op: attachment.load_op,
                    store_op: attachment.store_op,
                    clear_value: attachment.clear_value,
                    resolve_view: None,
                    resolve_mode: attachment.resolve_mode,
                }
            })
            .collect();

        let depth_stencil_attachment = descriptor
            .depth_stencil_attachment
            .as_ref()
            .map(|attachment| {
                let vk_view = resources
                    .get(attachment.view.handle())
                    .expect("texture view handle valid for the lifetime of GpuTextureView");
                view_handles.push(attachment.view.handle());
                crate::vk::command::DepthStencilAttachment {
                    view: vk_view.raw(),
                    format: attachment.format,
                    depth_load_op: attachment.depth_load_op,
                    depth_store_op: attachment.depth_store_op,
                    clear_depth: attachment.clear_depth,
                    clear_stencil: attachment.clear_stencil,
                }
            });

        // Resolve views are appended to the framebuffer's attachment list
        // after color and depth, matching the order `vk::command::begin_render_pass`
        // builds its image-view list in.
        for (descriptor_attachment, vk_attachment) in
            descriptor.color_attachments.iter().zip(color_attachments.iter_mut())
        {
            if let Some(resolve_view) = descriptor_attachment.resolve_view {
                let vk_view = resources
                    .get(resolve_view.handle())
                    .expect("texture view handle valid for the lifetime of GpuTextureView");
                view_handles.push(resolve_view.handle());
                vk_attachment.resolve_view = Some(vk_view.raw());
            }
        }
        drop(resources);

        recorder.inner().begin_render_pass(
            &color_attachments,
            depth_stencil_attachment.as_ref(),
            view_handles,
            descriptor.extent,
            descriptor.samples,
        )?;

        Ok(Self { recorder })
    }

    pub fn set_viewport(&self, viewport: Viewport) {
        self.recorder.inner().set_viewport(viewport);
    }

    pub fn set_scissor(&self, rect: Rect2D) {
        self.recorder.inner().set_scissor(rect);
    }

    pub fn bind_pipeline(&self, pipeline: &GpuGraphicsPipeline) {
        let resources = self.recorder.device().context.resources.lock();
        let raw = resources
            .get(pipeline.handle())
            .expect("graphics pipeline handle valid for the lifetime of GpuGraphicsPipeline")
            .raw();
        self.recorder.inner().bind_graphics_pipeline(raw);
    }

    pub fn bind_vertex_buffer(&self, binding: u32, buffer: &crate::buffer::GpuBuffer, offset: u64) {
        let resources = self.recorder.device().context.resources.lock();
        let raw = resources
            .get(buffer.handle())
            .expect("buffer handle valid for the lifetime of GpuBuffer")
            .raw();
        self.recorder
            .inner()
            .bind_vertex_buffers(binding, &[raw], &[offset]);
    }

    pub fn bind_index_buffer(&self, buffer: &crate::buffer::GpuBuffer, offset: u64, index_type: IndexType) {
        let resources = self.recorder.device().context.resources.lock();
        let raw = resources
            .get(buffer.handle())
            .expect("buffer handle valid for the lifetime of GpuBuffer")
            .raw();
        self.recorder.inner().bind_index_buffer(
            raw,
            offset,
            crate::vk::conv::index_type(index_type),
        );
    }

    /// `dynamic_offsets` supplies one offset per `DynamicUniformBuffer`/
    /// `DynamicStorageBuffer` binding across `bind_groups`, in binding
    /// order, matching `VkDescriptorSet`'s dynamic-offset contract.
    pub fn bind_descriptor_sets(
        &self,
        layout: &crate::pipeline_layout::GpuPipelineLayout,
        first_set: u32,
        bind_groups: &[&crate::bind_group::GpuBindGroup],
        dynamic_offsets: &[u32],
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
            vk::PipelineBindPoint::GRAPHICS,
            layout_raw,
            first_set,
            &sets,
            dynamic_offsets,
        );
    }

    pub fn push_constants(
        &self,
        layout: &crate::pipeline_layout::GpuPipelineLayout,
        stages: crate::types::ShaderStageFlags,
        offset: u32,
        data: &[u8],
    ) {
        let resources = self.recorder.device().context.resources.lock();
        let layout_raw = resources
            .get(layout.handle())
            .expect("pipeline layout handle valid for the lifetime of GpuPipelineLayout")
            .raw();
        self.recorder.inner().push_constants(
            layout_raw,
            crate::vk::conv::shader_stage_flags(stages),
            offset,
            data,
        );
    }

    pub fn draw(&self, vertex_count: u32, instance_count: u32, first_vertex: u32, first_instance: u32) {
        self.recorder
            .inner()
            .draw(vertex_count, instance_count, first_vertex, first_instance);
    }

    pub fn draw_indexed(
        &self,
        index_count: u32,
        instance_count: u32,
        first_index: u32,
        vertex_offset: i32,
        first_instance: u32,
    ) {
        self.recorder.inner().draw_indexed(
            index_count,
            instance_count,
            first_index,
            vertex_offset,
            first_instance,
        );
    }

    pub fn draw_indirect(&self, buffer: &crate::buffer::GpuBuffer, offset: u64, draw_count: u32, stride: u32) {
        let resources = self.recorder.device().context.resources.lock();
        let raw = resources
            .get(buffer.handle())
            .expect("buffer handle valid for the lifetime of GpuBuffer")
            .raw();
        self.recorder.inner().draw_indirect(raw, offset, draw_count, stride);
    }

    pub fn draw_indexed_indirect(
        &self,
        buffer: &crate::buffer::GpuBuffer,
        offset: u64,
        draw_count: u32,
        stride: u32,
    ) {
        let resources = self.recorder.device().context.resources.lock();
        let raw = resources
            .get(buffer.handle())
            .expect("buffer handle valid for the lifetime of GpuBuffer")
            .raw();
        self.recorder.inner().draw_indexed_indirect(raw, offset, draw_count, stride);
    }

    pub fn set_stencil_reference(&self, face_mask: crate::types::StencilFaceFlags, reference: u32) {
        self.recorder
            .inner()
            .set_stencil_reference(crate::vk::conv::stencil_face_flags(face_mask), reference);
    }

    /// Advances to the next subpass of a multi-subpass render pass. This
    /// crate's render passes are currently always single-subpass, so this
    /// is here for API completeness with pipelines built elsewhere that
    /// expect multiple subpasses.
    pub fn next_subpass(&self) {
        self.recorder.inner().next_subpass();
    }

    pub fn draw_mesh_tasks(&self, group_count_x: u32, group_count_y: u32, group_count_z: u32) {
        let shared = self.recorder.device().shared();
        let loader = ash::ext::mesh_shader::Device::new(&shared.instance.raw, &shared.raw);
        self.recorder
            .inner()
            .draw_mesh_tasks(&loader, group_count_x, group_count_y, group_count_z);
    }

    pub fn draw_mesh_tasks_indirect(
        &self,
        buffer: &crate::buffer::GpuBuffer,
        offset: u64,
        draw_count: u32,
        stride: u32,
    ) {
        let resources = self.recorder.device().context.resources.lock();
        let raw = resources
            .get(buffer.handle())
            .expect("buffer handle valid for the lifetime of GpuBuffer")
            .raw();
        drop(resources);
        let shared = self.recorder.device().shared();
        let loader = ash::ext::mesh_shader::Device::new(&shared.instance.raw, &shared.raw);
        self.recorder
            .inner()
            .draw_mesh_tasks_indirect(&loader, raw, offset, draw_count, stride);
    }

    /// Writes `entries` straight into the command buffer for `set`,
    /// bypassing `VkDescriptorSet` allocation entirely. `layout`'s set at
    /// index `set` must have been built with push-descriptor support.
    pub fn push_bind_group(
        &self,
        layout: &crate::pipeline_layout::GpuPipelineLayout,
        set: u32,
        entries: &[crate::bind_group::BindGroupEntry<'_>],
    ) {
        let resources = self.recorder.device().context.resources.lock();
        let layout_raw = resources
            .get(layout.handle())
            .expect("pipeline layout handle valid for the lifetime of GpuPipelineLayout")
            .raw();

        enum Info {
            Buffer(usize),
            Image(usize),
        }
        let mut buffer_infos = Vec::new();
        let mut image_infos = Vec::new();
        let mut kinds = Vec::with_capacity(entries.len());
        let mut bindings = Vec::with_capacity(entries.len());
        let mut binding_types = Vec::with_capacity(entries.len());

        for entry in entries {
            match *entry {
                crate::bind_group::BindGroupEntry::Buffer {
                    binding,
                    binding_type,
                    buffer,
                    offset,
                    range,
                } => {
                    let raw = resources
                        .get(buffer.handle())
                        .expect("buffer handle valid for the lifetime of GpuBuffer")
                        .raw();
                    kinds.push(Info::Buffer(buffer_infos.len()));
                    buffer_infos.push(vk::DescriptorBufferInfo {
                        buffer: raw,
                        offset,
                        range,
                    });
                    bindings.push(binding);
                    binding_types.push(binding_type);
                }
                crate::bind_group::BindGroupEntry::Texture {
                    binding,
                    binding_type,
                    view,
                    sampler,
                    layout,
                } => {
                    let view_raw = resources
                        .get(view.handle())
                        .expect("texture view handle valid for the lifetime of GpuTextureView")
                        .raw();
                    let sampler_raw = sampler
                        .map(|sampler| {
                            resources
                                .get(sampler.handle())
                                .expect("sampler handle valid for the lifetime of GpuSampler")
                                .raw()
                        })
                        .unwrap_or(vk::Sampler::null());
                    kinds.push(Info::Image(image_infos.len()));
                    image_infos.push(vk::DescriptorImageInfo {
                        sampler: sampler_raw,
                        image_view: view_raw,
                        image_layout: crate::vk::conv::image_layout(layout),
                    });
                    bindings.push(binding);
                    binding_types.push(binding_type);
                }
            }
        }
        drop(resources);

        let writes: Vec<vk::WriteDescriptorSet> = kinds
            .iter()
            .enumerate()
            .map(|(i, kind)| {
                let base = vk::WriteDescriptorSet::default()
                    .dst_binding(bindings[i])
                    .descriptor_type(crate::vk::conv::descriptor_type(binding_types[i]));
                match *kind {
                    Info::Buffer(idx) => base.buffer_info(std::slice::from_ref(&buffer_infos[idx])),
                    Info::Image(idx) => base.image_info(std::slice::from_ref(&image_infos[idx])),
                }
            })
            .collect();

        let shared = self.recorder.device().shared();
        let loader = ash::khr::push_descriptor::Device::new(&shared.instance.raw, &shared.raw);
        self.recorder.inner().push_bind_group(
            &loader,
            vk::PipelineBindPoint::GRAPHICS,
            layout_raw,
            set,
            &writes,
        );
    }
}

impl Drop for GpuRenderPassRecorder<'_> {
    fn drop(&mut self) {
        self.recorder.inner().end_render_pass();
    }
}

#[cfg(test)]
mod tests {
    use crate::test_support::test_device;
    use crate::types::{AttachmentLoadOp, AttachmentStoreOp, TextureLayout};

    #[test]
    #[ignore = "requires vulkan-tests feature and a loadable Vulkan ICD"]
    #[cfg(feature = "vulkan-tests")]
    fn explicit_and_implicit_render_pass_creation_share_the_structural_cache() {
        use crate::vk::render_pass_cache::{AttachmentKey, RenderPassKey};

        let device = test_device();
        let attachment = super::RenderPassAttachmentOptions {
            format: crate::types::Format::R8g8b8a8Unorm,
            load_op: AttachmentLoadOp::Clear,
            store_op: AttachmentStoreOp::Store,
            initial_layout: TextureLayout::Undefined,
            final_layout: TextureLayout::ColorAttachmentOptimal,
        };
        let first = device
            .create_render_pass(super::RenderPassOptions {
                color_attachments: std::slice::from_ref(&attachment),
                depth_stencil_attachment: None,
                samples: 1,
            })
            .expect("explicit render pass creation");

        let key = RenderPassKey {
            color_attachments: vec![AttachmentKey {
                format: crate::types::Format::R8g8b8a8Unorm,
                load_op: AttachmentLoadOp::Clear,
                store_op: AttachmentStoreOp::Store,
                initial_layout: TextureLayout::Undefined,
                final_layout: TextureLayout::ColorAttachmentOptimal,
                resolve_mode: crate::types::ResolveModeFlagBits::None,
            }],
            depth_stencil_attachment: None,
            samples: 1,
            view_count: 1,
        };
        let shared = device.shared();
        let second = shared
            .render_pass_cache
            .lock()
            .render_pass(&shared.raw, &key)
            .expect("cached render pass lookup");
        assert_eq!(first, second);
    }
}
