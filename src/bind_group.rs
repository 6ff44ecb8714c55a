//! A set of resource bindings, ready to be bound in a render or compute
//! pass.

use crate::device::GpuDevice;
use crate::handle::Handle;
use crate::resource_manager::BindGroupTag;
use crate::sampler::GpuSampler;
use crate::texture_view::GpuTextureView;
use crate::types::{ResourceBindingType, TextureLayout};

pub enum BindGroupEntry<'a> {
    Buffer {
        binding: u32,
        binding_type: ResourceBindingType,
        buffer: &'a crate::buffer::GpuBuffer,
        offset: u64,
        range: u64,
    },
    Texture {
        binding: u32,
        binding_type: ResourceBindingType,
        view: &'a GpuTextureView,
        sampler: Option<&'a GpuSampler>,
        layout: TextureLayout,
    },
}

pub struct GpuBindGroup {
    device: GpuDevice,
    handle: Handle<BindGroupTag>,
}

impl GpuBindGroup {
    pub(crate) fn new(device: GpuDevice, handle: Handle<BindGroupTag>) -> Self {
        Self { device, handle }
    }

    pub fn is_valid(&self) -> bool {
        self.handle.is_valid()
    }

    pub fn handle(&self) -> Handle<BindGroupTag> {
        self.handle
    }
}

impl Drop for GpuBindGroup {
    fn drop(&mut self) {
        let frame = self.device.current_frame();
        self.device.deleter().lock().delete_bind_group(frame, self.handle);
    }
}

#[cfg(test)]
mod tests {
    use crate::test_support::test_device;
    use crate::types::{BindGroupLayoutFlags, BindingFlags, BufferUsageFlags, MemoryUsage, ShaderStageFlags};

    #[test]
    #[ignore = "requires vulkan-tests feature and a loadable Vulkan ICD"]
    #[cfg(feature = "vulkan-tests")]
    fn writing_a_buffer_entry_into_a_bind_group_succeeds() {
        let device = test_device();
        let layout = device
            .create_bind_group_layout(
                &[crate::vk::bind_group::BindGroupLayoutEntry {
                    binding: 0,
                    binding_type: crate::types::ResourceBindingType::UniformBuffer,
                    count: 1,
                    shader_stages: ShaderStageFlags::FRAGMENT,
                    flags: BindingFlags::empty(),
                }],
                BindGroupLayoutFlags::empty(),
            )
            .expect("bind group layout creation");
        let buffer = device
            .create_buffer(256, BufferUsageFlags::UNIFORM_BUFFER, MemoryUsage::CpuToGpu)
            .expect("buffer creation");

        let bind_group = device
            .create_bind_group(
                &layout,
                &[super::BindGroupEntry::Buffer {
                    binding: 0,
                    binding_type: crate::types::ResourceBindingType::UniformBuffer,
                    buffer: &buffer,
                    offset: 0,
                    range: 256,
                }],
            )
            .expect("bind group creation");
        assert!(bind_group.is_valid());
    }
}
