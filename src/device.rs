//! The logical device: the factory for every other resource kind.
//!
//! Grounded on `examples/original_source/src/KDGpu/device.h`'s `Device`
//! front-end, whose `createX` methods this mirrors one-for-one.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::acceleration_structure::GpuAccelerationStructure;
use crate::bind_group::{BindGroupEntry, GpuBindGroup};
use crate::bind_group_layout::GpuBindGroupLayout;
use crate::bind_group_pool::GpuBindGroupPool;
use crate::buffer::GpuBuffer;
use crate::command_buffer::GpuCommandBuffer;
use crate::context::SharedContext;
use crate::deleter::ResourceDeleter;
use crate::error::Result;
use crate::graphics_pipeline::{GpuGraphicsPipeline, GraphicsPipelineOptions};
use crate::handle::Handle;
use crate::pipeline_layout::{GpuPipelineLayout, PipelineLayoutOptions};
use crate::raytracing_pipeline::GpuRayTracingPipeline;
use crate::render_pass_recorder::RenderPassOptions;
use crate::resource_manager::{AccelerationStructureTag, BindGroupLayoutTag, BindGroupPoolTag, BindGroupTag, BufferTag, CommandBufferTag, ComputePipelineTag, DeviceTag, FenceTag, GraphicsPipelineTag, PipelineLayoutTag, RayTracingPipelineTag, SamplerTag, SemaphoreTag, ShaderModuleTag, ShaderBindingTableTag, SurfaceTag, TextureTag, TextureViewTag, TimestampQueryRecorderTag, YCbCrConversionTag};
use crate::sampler::{GpuSampler, SamplerOptions};
use crate::shader_module::GpuShaderModule;
use crate::staging::StagingBufferPool;
use crate::swapchain::GpuSwapchain;
use crate::sync::{GpuFence, GpuSemaphore};
use crate::texture::{GpuTexture, TextureOptions};
use crate::texture_view::{GpuTextureView, TextureViewOptions};
use crate::timestamp_query::GpuTimestampQueryRecorder;
use crate::types::{BufferUsageFlags, CommandBufferLevel, Format, MemoryUsage};
use crate::vk::device::{DeviceShared, VulkanDevice};
use crate::ycbcr_conversion::GpuYCbCrConversion;

const DEFAULT_FRAMES_IN_FLIGHT: u64 = 2;
const DEFAULT_STAGING_BIN_SIZE: u64 = 16 * 1024 * 1024;

pub struct GpuDevice {
    pub(crate) context: SharedContext,
    pub(crate) handle: Handle<DeviceTag>,
    pub(crate) deleter: Arc<Mutex<ResourceDeleter>>,
    pub(crate) staging: Arc<Mutex<StagingBufferPool>>,
}

impl Clone for GpuDevice {
    fn clone(&self) -> Self {
        // Cloning a `GpuDevice` hands out another reference to the same
        // logical device; deletion only happens once the last clone (and
        // every resource it created) is gone. The resource manager's own
        // generational handle keeps `handle` safe to reuse until then.
        Self {
            context: self.context.clone(),
            handle: self.handle,
            deleter: self.deleter.clone(),
            staging: self.staging.clone(),
        }
    }
}

impl GpuDevice {
    pub(crate) fn from_vulkan(context: SharedContext, device: VulkanDevice) -> Self {
        let shared = device.shared();
        let handle = context.resources.lock().create::<DeviceTag>(device);
        Self {
            context,
            handle,
            deleter: Arc::new(Mutex::new(ResourceDeleter::new(DEFAULT_FRAMES_IN_FLIGHT))),
            staging: Arc::new(Mutex::new(StagingBufferPool::new(
                shared,
                DEFAULT_STAGING_BIN_SIZE,
            ))),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.handle.is_valid()
    }

    pub fn handle(&self) -> Handle<DeviceTag> {
        self.handle
    }

    pub(crate) fn shared(&self) -> Arc<DeviceShared> {
        self.context
            .resources
            .lock()
            .get(self.handle)
            .expect("device handle valid for the lifetime of GpuDevice")
            .shared()
    }

    pub fn wait_idle(&self) -> Result<()> {
        self.shared().wait_idle()
    }

    pub fn ignore_validation_message(&self, needle: impl Into<String>) {
        self.shared().ignore_validation_message(needle);
    }

    /// Advances the frame counter and releases whatever deferred deletions
    /// and staging bins have had every frame slot dereffed, per spec
    /// §4.10/§4.11. Call once per rendered frame, after the previous
    /// frame's work has been submitted. This alone does not free
    /// anything still in flight — the caller must also call
    /// [`Self::deref_frame_index`] once it observes (typically via that
    /// frame slot's fence) that a frame slot has retired on the GPU.
    pub fn begin_frame(&self) -> u64 {
        let shared = self.shared();
        let frame = shared.next_frame();
        let mut resources = self.context.resources.lock();
        let mut deleter = self.deleter.lock();
        deleter.collect(&mut resources);
        drop(resources);
        self.staging
            .lock()
            .recycle(frame, DEFAULT_FRAMES_IN_FLIGHT, &mut deleter);
        frame
    }

    /// Tells the deleter and staging pool that frame slot `slot` has
    /// retired on the GPU, per spec §4.10's `derefFrameIndex`. Call this
    /// once the fence that accompanied that frame slot's submission has
    /// signalled; only then can bins recorded before the current frame be
    /// destroyed.
    pub fn deref_frame_index(&self, slot: u64) {
        let frame = self.current_frame();
        self.deleter.lock().deref_frame_index(slot, frame);
    }

    pub fn current_frame(&self) -> u64 {
        self.shared().current_frame()
    }

    pub fn upload_buffer_data(&self, data: &[u8], align: u64) -> Result<crate::staging::StagingAllocation> {
        self.staging.lock().upload(self.current_frame(), data, align)
    }

    pub fn create_buffer(
        &self,
        size: u64,
        usage: BufferUsageFlags,
        memory_usage: MemoryUsage,
    ) -> Result<GpuBuffer> {
        self.create_buffer_with_external_memory(size, usage, memory_usage, None)
    }

    /// Same as [`Self::create_buffer`], but dedicates the allocation to a
    /// single resource and exports it as `external_memory_handle_type`,
    /// readable afterward via [`GpuBuffer::external_memory_handle`].
    pub fn create_buffer_with_external_memory(
        &self,
        size: u64,
        usage: BufferUsageFlags,
        memory_usage: MemoryUsage,
        external_memory_handle_type: Option<crate::types::ExternalMemoryHandleType>,
    ) -> Result<GpuBuffer> {
        let shared = self.shared();
        let buffer_device_address_enabled = shared.buffer_device_address_enabled;
        let buffer = crate::vk::buffer::VulkanBuffer::new(
            shared,
            size,
            usage,
            memory_usage,
            external_memory_handle_type,
            buffer_device_address_enabled,
        )?;
        let handle = self.context.resources.lock().create::<BufferTag>(buffer);
        Ok(GpuBuffer::new(self.clone(), handle, size))
    }

    pub fn create_texture(&self, options: TextureOptions) -> Result<GpuTexture> {
        let texture = crate::vk::texture::VulkanTexture::new(
            self.shared(),
            options.ty,
            options.format,
            options.extent,
            options.mip_levels,
            options.array_layers,
            options.samples,
            options.tiling,
            options.usage,
            options.memory_usage,
        )?;
        let handle = self.context.resources.lock().create::<TextureTag>(texture);
        Ok(GpuTexture::new(self.clone(), handle))
    }

    pub fn create_texture_view(
        &self,
        texture: &GpuTexture,
        options: TextureViewOptions,
    ) -> Result<GpuTextureView> {
        let resources = self.context.resources.lock();
        let vk_texture = resources
            .get(texture.handle())
            .expect("texture handle valid for the lifetime of GpuTexture");
        let image = vk_texture.raw();
        let extent = vk_texture.extent();
        drop(resources);

        let view = crate::vk::texture::VulkanTextureView::new(
            self.shared(),
            image,
            options.view_type,
            options.format,
            options.aspect,
            options.base_mip_level,
            options.level_count,
            options.base_array_layer,
            options.layer_count,
            extent,
        )?;
        let handle = self.context.resources.lock().create::<TextureViewTag>(view);
        Ok(GpuTextureView::new(self.clone(), handle))
    }

    pub fn create_sampler(&self, options: SamplerOptions) -> Result<GpuSampler> {
        let sampler = crate::vk::texture::VulkanSampler::new(
            self.shared(),
            options.mag_filter,
            options.min_filter,
            options.mipmap_filter,
            options.address_mode_u,
            options.address_mode_v,
            options.address_mode_w,
            options.max_anisotropy,
            options.compare,
            options.min_lod,
            options.max_lod,
        )?;
        let handle = self.context.resources.lock().create::<SamplerTag>(sampler);
        Ok(GpuSampler::new(self.clone(), handle))
    }

    pub fn create_shader_module(&self, spirv_code: &[u32]) -> Result<GpuShaderModule> {
        let module = crate::vk::texture::VulkanShaderModule::new(self.shared(), spirv_code)?;
        let handle = self.context.resources.lock().create::<ShaderModuleTag>(module);
        Ok(GpuShaderModule::new(self.clone(), handle))
    }

    pub fn create_ycbcr_conversion(&self, format: Format) -> Result<GpuYCbCrConversion> {
        let conversion = crate::vk::texture::VulkanYCbCrConversion::new(self.shared(), format)?;
        let handle = self
            .context
            .resources
            .lock()
            .create::<YCbCrConversionTag>(conversion);
        Ok(GpuYCbCrConversion::new(self.clone(), handle))
    }

    pub fn create_bind_group_layout(
        &self,
        entries: &[crate::vk::bind_group::BindGroupLayoutEntry],
        flags: crate::types::BindGroupLayoutFlags,
    ) -> Result<GpuBindGroupLayout> {
        let layout = crate::vk::bind_group::VulkanBindGroupLayout::new(self.shared(), entries, flags)?;
        let handle = self
            .context
            .resources
            .lock()
            .create::<BindGroupLayoutTag>(layout);
        Ok(GpuBindGroupLayout::new(self.clone(), handle))
    }

    pub fn create_bind_group_pool(
        &self,
        max_bind_groups: u32,
        flags: crate::types::BindGroupPoolFlags,
    ) -> Result<GpuBindGroupPool> {
        let pool = crate::vk::bind_group::VulkanBindGroupPool::new(self.shared(), max_bind_groups, flags);
        let handle = self.context.resources.lock().create::<BindGroupPoolTag>(pool);
        Ok(GpuBindGroupPool::new(self.clone(), handle))
    }

    pub fn create_bind_group(
        &self,
        layout: &GpuBindGroupLayout,
        entries: &[BindGroupEntry<'_>],
    ) -> Result<GpuBindGroup> {
        let resources = self.context.resources.lock();
        let vk_layout = resources
            .get(layout.handle())
            .expect("bind group layout handle valid for the lifetime of GpuBindGroupLayout");
        let bind_group = crate::vk::bind_group::VulkanBindGroup::new(self.shared(), vk_layout, None)?;
        drop(resources);

        for entry in entries {
            match entry {
                BindGroupEntry::Buffer {
                    binding,
                    binding_type,
                    buffer,
                    offset,
                    range,
                } => {
                    let resources = self.context.resources.lock();
                    let vk_buffer = resources
                        .get(buffer.handle())
                        .expect("buffer handle valid for the lifetime of GpuBuffer");
                    bind_group.write_buffer(*binding, *binding_type, vk_buffer.raw(), *offset, *range);
                }
                BindGroupEntry::Texture {
                    binding,
                    binding_type,
                    view,
                    sampler,
                    layout,
                } => {
                    let resources = self.context.resources.lock();
                    let vk_view = resources
                        .get(view.handle())
                        .expect("texture view handle valid for the lifetime of GpuTextureView");
                    let sampler_raw = sampler
                        .and_then(|s| resources.get(s.handle()))
                        .map(|s| s.raw())
                        .unwrap_or(ash::vk::Sampler::null());
                    bind_group.write_image(
                        *binding,
                        *binding_type,
                        vk_view.raw(),
                        sampler_raw,
                        crate::vk::conv::image_layout(*layout),
                    );
                }
            }
        }

        let handle = self.context.resources.lock().create::<BindGroupTag>(bind_group);
        Ok(GpuBindGroup::new(self.clone(), handle))
    }

    pub fn create_pipeline_layout(&self, options: PipelineLayoutOptions<'_>) -> Result<GpuPipelineLayout> {
        let resources = self.context.resources.lock();
        let set_layouts: Vec<ash::vk::DescriptorSetLayout> = options
            .bind_group_layouts
            .iter()
            .map(|l| {
                resources
                    .get(l.handle())
                    .expect("bind group layout handle valid for the lifetime of GpuBindGroupLayout")
                    .raw()
            })
            .collect();
        drop(resources);

        let layout = crate::vk::pipeline::VulkanPipelineLayout::new(
            self.shared(),
            &set_layouts,
            options.push_constant_ranges,
        )?;
        let handle = self.context.resources.lock().create::<PipelineLayoutTag>(layout);
        Ok(GpuPipelineLayout::new(self.clone(), handle))
    }

    /// Explicit render pass creation, alongside the implicit path folded
    /// from a render pass descriptor at `begin_render_pass` time; both
    /// resolve through the same structural cache, so a pass created here
    /// is reused (not recreated) the first time a matching attachment set
    /// is recorded against.
    pub fn create_render_pass(&self, options: RenderPassOptions<'_>) -> Result<ash::vk::RenderPass> {
        crate::render_pass_recorder::create_render_pass(self, options)
    }

    pub fn create_graphics_pipeline(
        &self,
        options: GraphicsPipelineOptions<'_>,
    ) -> Result<GpuGraphicsPipeline> {
        GpuGraphicsPipeline::create(self.clone(), options)
    }

    pub fn create_compute_pipeline(
        &self,
        layout: &GpuPipelineLayout,
        module: &GpuShaderModule,
        entry_point: &str,
    ) -> Result<crate::compute_pipeline::GpuComputePipeline> {
        let resources = self.context.resources.lock();
        let layout_raw = resources
            .get(layout.handle())
            .expect("pipeline layout handle valid for the lifetime of GpuPipelineLayout")
            .raw();
        let module_raw = resources
            .get(module.handle())
            .expect("shader module handle valid for the lifetime of GpuShaderModule")
            .raw();
        drop(resources);

        let pipeline =
            crate::vk::pipeline::VulkanComputePipeline::new(self.shared(), layout_raw, module_raw, entry_point)?;
        let handle = self.context.resources.lock().create::<ComputePipelineTag>(pipeline);
        Ok(crate::compute_pipeline::GpuComputePipeline::new(self.clone(), handle))
    }

    pub fn create_raytracing_pipeline(
        &self,
        layout: &GpuPipelineLayout,
        stages: &[crate::vk::pipeline::ShaderStage<'_>],
        groups: &[ash::vk::RayTracingShaderGroupCreateInfoKHR],
        max_recursion_depth: u32,
    ) -> Result<GpuRayTracingPipeline> {
        let shared = self.shared();
        let loader = ash::khr::ray_tracing_pipeline::Device::new(&shared.instance.raw, &shared.raw);
        let resources = self.context.resources.lock();
        let layout_raw = resources
            .get(layout.handle())
            .expect("pipeline layout handle valid for the lifetime of GpuPipelineLayout")
            .raw();
        drop(resources);

        let pipeline = crate::vk::pipeline::VulkanRayTracingPipeline::new(
            shared,
            layout_raw,
            stages,
            groups,
            max_recursion_depth,
            &loader,
        )?;
        let handle = self
            .context
            .resources
            .lock()
            .create::<RayTracingPipelineTag>(pipeline);
        Ok(GpuRayTracingPipeline::new(self.clone(), handle))
    }

    pub fn create_acceleration_structure(
        &self,
        ty: crate::vk::raytracing::AccelerationStructureType,
        size: u64,
    ) -> Result<GpuAccelerationStructure> {
        let accel = crate::vk::raytracing::VulkanAccelerationStructure::new(self.shared(), ty, size)?;
        let handle = self
            .context
            .resources
            .lock()
            .create::<AccelerationStructureTag>(accel);
        Ok(GpuAccelerationStructure::new(self.clone(), handle))
    }

    pub fn create_shader_binding_table(
        &self,
        handle_size_aligned: u32,
        raygen_count: u32,
        miss_count: u32,
        hit_count: u32,
        callable_count: u32,
    ) -> Result<crate::raytracing_sbt::GpuShaderBindingTable> {
        let sbt = crate::vk::raytracing::VulkanShaderBindingTable::new(
            self.shared(),
            handle_size_aligned,
            raygen_count,
            miss_count,
            hit_count,
            callable_count,
        )?;
        let handle = self
            .context
            .resources
            .lock()
            .create::<ShaderBindingTableTag>(sbt);
        Ok(crate::raytracing_sbt::GpuShaderBindingTable::new(self.clone(), handle))
    }

    pub fn create_fence(&self, signalled: bool) -> Result<GpuFence> {
        let fence = crate::vk::sync::VulkanFence::new_binary(self.shared(), signalled)?;
        let handle = self.context.resources.lock().create::<FenceTag>(fence);
        Ok(GpuFence::new(self.clone(), handle))
    }

    pub fn create_semaphore(&self) -> Result<GpuSemaphore> {
        let semaphore = crate::vk::sync::VulkanSemaphore::new(self.shared())?;
        let handle = self.context.resources.lock().create::<SemaphoreTag>(semaphore);
        Ok(GpuSemaphore::new(self.clone(), handle))
    }

    pub fn create_timestamp_query_recorder(&self, query_count: u32) -> Result<GpuTimestampQueryRecorder> {
        let recorder = crate::vk::sync::VulkanTimestampQueryRecorder::new(self.shared(), query_count)?;
        let handle = self
            .context
            .resources
            .lock()
            .create::<TimestampQueryRecorderTag>(recorder);
        Ok(GpuTimestampQueryRecorder::new(self.clone(), handle))
    }

    pub fn create_command_buffer(&self, queue_family: u32, level: CommandBufferLevel) -> Result<GpuCommandBuffer> {
        let buffer = crate::vk::command::VulkanCommandBuffer::new(self.shared(), queue_family, level)?;
        let handle = self.context.resources.lock().create::<CommandBufferTag>(buffer);
        Ok(GpuCommandBuffer::new(self.clone(), handle))
    }

    pub fn create_swapchain(
        &self,
        surface_handle: Handle<SurfaceTag>,
        config: crate::vk::surface::SurfaceConfiguration,
    ) -> Result<GpuSwapchain> {
        GpuSwapchain::create(self.clone(), surface_handle, config)
    }

    pub(crate) fn deleter(&self) -> &Arc<Mutex<ResourceDeleter>> {
        &self.deleter
    }

    pub fn graphics_queue(&self) -> crate::queue::GpuQueue {
        let shared = self.shared();
        let family = shared.graphics_queue_family;
        crate::queue::GpuQueue::new(self.clone(), family)
    }

    pub fn compute_queue(&self) -> crate::queue::GpuQueue {
        let shared = self.shared();
        let family = shared.compute_queue_family;
        crate::queue::GpuQueue::new(self.clone(), family)
    }

    pub fn transfer_queue(&self) -> crate::queue::GpuQueue {
        let shared = self.shared();
        let family = shared.transfer_queue_family;
        crate::queue::GpuQueue::new(self.clone(), family)
    }
}

impl Drop for GpuDevice {
    fn drop(&mut self) {
        if Arc::strong_count(&self.deleter) == 1 {
            let _ = self.wait_idle();
            let mut resources = self.context.resources.lock();
            self.deleter.lock().collect_all(&mut resources);
            resources.delete(self.handle);
        }
    }
}
