//! Descriptor set layouts, pools, and sets, backed by `gpu-descriptor`.

use std::sync::Arc;

use ash::vk;
use gpu_descriptor::{DescriptorSet, DescriptorTotalCount};
use gpu_descriptor_ash::AshDescriptorDevice;

use crate::types::{BindGroupLayoutFlags, BindGroupPoolFlags, BindingFlags, ResourceBindingType, ShaderStageFlags};
use crate::vk::conv;
use crate::vk::device::DeviceShared;

#[derive(Debug, Clone, Copy)]
pub struct BindGroupLayoutEntry {
    pub binding: u32,
    pub binding_type: ResourceBindingType,
    pub count: u32,
    pub shader_stages: ShaderStageFlags,
    pub flags: BindingFlags,
}

pub struct VulkanBindGroupLayout {
    device: Arc<DeviceShared>,
    pub(crate) raw: vk::DescriptorSetLayout,
    pub(crate) entries: Vec<BindGroupLayoutEntry>,
}

impl VulkanBindGroupLayout {
    pub fn new(
        device: Arc<DeviceShared>,
        entries: &[BindGroupLayoutEntry],
        flags: BindGroupLayoutFlags,
    ) -> crate::error::Result<Self> {
        let bindings: Vec<vk::DescriptorSetLayoutBinding> = entries
            .iter()
            .map(|entry| {
                vk::DescriptorSetLayoutBinding::default()
                    .binding(entry.binding)
                    .descriptor_type(conv::descriptor_type(entry.binding_type))
                    .descriptor_count(entry.count)
                    .stage_flags(conv::shader_stage_flags(entry.shader_stages))
            })
            .collect();

        let mut create_flags = vk::DescriptorSetLayoutCreateFlags::empty();
        if flags.contains(BindGroupLayoutFlags::PUSH_BIND_GROUP) {
            create_flags |= vk::DescriptorSetLayoutCreateFlags::PUSH_DESCRIPTOR_KHR;
        }

        let info = vk::DescriptorSetLayoutCreateInfo::default()
            .bindings(&bindings)
            .flags(create_flags);
        let raw = unsafe { device.raw.create_descriptor_set_layout(&info, None)? };

        Ok(Self {
            device,
            raw,
            entries: entries.to_vec(),
        })
    }

    pub fn raw(&self) -> vk::DescriptorSetLayout {
        self.raw
    }
}

impl Drop for VulkanBindGroupLayout {
    fn drop(&mut self) {
        unsafe { self.device.raw.destroy_descriptor_set_layout(self.raw, None) };
    }
}

/// A pool of descriptor sets all sharing one layout, matching the
/// original's `BindGroupPool` (one Vulkan descriptor pool per logical
/// pool, sized up front from the layout's binding counts times
/// `max_bind_groups`).
pub struct VulkanBindGroupPool {
    device: Arc<DeviceShared>,
    max_bind_groups: u32,
    pub(crate) flags: BindGroupPoolFlags,
}

impl VulkanBindGroupPool {
    pub fn new(device: Arc<DeviceShared>, max_bind_groups: u32, flags: BindGroupPoolFlags) -> Self {
        Self {
            device,
            max_bind_groups,
            flags,
        }
    }

    pub fn max_bind_groups(&self) -> u32 {
        self.max_bind_groups
    }
}

pub struct VulkanBindGroup {
    device: Arc<DeviceShared>,
    raw: Option<DescriptorSet<vk::DescriptorSet>>,
}

impl VulkanBindGroup {
    pub fn new(
        device: Arc<DeviceShared>,
        layout: &VulkanBindGroupLayout,
        variable_count: Option<u32>,
    ) -> crate::error::Result<Self> {
        let mut counts = DescriptorTotalCount::default();
        for entry in &layout.entries {
            accumulate_count(&mut counts, entry.binding_type, entry.count);
        }

        let ash_device = AshDescriptorDevice::wrap(&device.raw);
        let raw = unsafe {
            device
                .descriptor_allocator
                .lock()
                .allocate(
                    ash_device,
                    &layout.raw,
                    gpu_descriptor::DescriptorSetLayoutCreateFlags::empty(),
                    &counts,
                    1,
                )
                .map_err(|_| crate::error::GpuError::OutOfMemory)?
                .pop()
                .expect("allocate(1) always returns one descriptor set")
        };

        let _ = variable_count;
        Ok(Self { device, raw: Some(raw) })
    }

    pub fn raw(&self) -> vk::DescriptorSet {
        *self
            .raw
            .as_ref()
            .expect("descriptor set only taken in Drop")
            .raw()
    }

    pub fn write_buffer(
        &self,
        binding: u32,
        binding_type: ResourceBindingType,
        buffer: vk::Buffer,
        offset: u64,
        range: u64,
    ) {
        let buffer_info = [vk::DescriptorBufferInfo {
            buffer,
            offset,
            range,
        }];
        let write = vk::WriteDescriptorSet::default()
            .dst_set(self.raw())
            .dst_binding(binding)
            .descriptor_type(conv::descriptor_type(binding_type))
            .buffer_info(&buffer_info);
        unsafe { self.device.raw.update_descriptor_sets(&[write], &[]) };
    }

    pub fn write_image(
        &self,
        binding: u32,
        binding_type: ResourceBindingType,
        view: vk::ImageView,
        sampler: vk::Sampler,
        layout: vk::ImageLayout,
    ) {
        let image_info = [vk::DescriptorImageInfo {
            sampler,
            image_view: view,
            image_layout: layout,
        }];
        let write = vk::WriteDescriptorSet::default()
            .dst_set(self.raw())
            .dst_binding(binding)
            .descriptor_type(conv::descriptor_type(binding_type))
            .image_info(&image_info);
        unsafe { self.device.raw.update_descriptor_sets(&[write], &[]) };
    }
}

impl Drop for VulkanBindGroup {
    fn drop(&mut self) {
        let Some(raw) = self.raw.take() else {
            return;
        };
        let ash_device = AshDescriptorDevice::wrap(&self.device.raw);
        unsafe {
            self.device
                .descriptor_allocator
                .lock()
                .free(ash_device, Some(raw));
        }
    }
}

fn accumulate_count(counts: &mut DescriptorTotalCount, ty: ResourceBindingType, count: u32) {
    match ty {
        ResourceBindingType::Sampler => counts.sampler += count,
        ResourceBindingType::CombinedImageSampler => counts.combined_image_sampler += count,
        ResourceBindingType::SampledImage => counts.sampled_image += count,
        ResourceBindingType::StorageImage => counts.storage_image += count,
        ResourceBindingType::UniformTexelBuffer => counts.uniform_texel_buffer += count,
        ResourceBindingType::StorageTexelBuffer => counts.storage_texel_buffer += count,
        ResourceBindingType::UniformBuffer => counts.uniform_buffer += count,
        ResourceBindingType::StorageBuffer => counts.storage_buffer += count,
        ResourceBindingType::DynamicUniformBuffer => counts.uniform_buffer_dynamic += count,
        ResourceBindingType::DynamicStorageBuffer => counts.storage_buffer_dynamic += count,
        ResourceBindingType::InputAttachment => counts.input_attachment += count,
        ResourceBindingType::AccelerationStructure => counts.acceleration_structure += count,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accumulate_count_routes_uniform_buffers() {
        let mut counts = DescriptorTotalCount::default();
        accumulate_count(&mut counts, ResourceBindingType::UniformBuffer, 3);
        assert_eq!(counts.uniform_buffer, 3);
    }
}
