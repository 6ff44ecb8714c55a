//! Descriptor set layout description: which bindings a bind group must
//! provide.

pub use crate::vk::bind_group::BindGroupLayoutEntry;
use crate::device::GpuDevice;
use crate::handle::Handle;
use crate::resource_manager::BindGroupLayoutTag;

pub struct GpuBindGroupLayout {
    device: GpuDevice,
    handle: Handle<BindGroupLayoutTag>,
}

impl GpuBindGroupLayout {
    pub(crate) fn new(device: GpuDevice, handle: Handle<BindGroupLayoutTag>) -> Self {
        Self { device, handle }
    }

    pub fn is_valid(&self) -> bool {
        self.handle.is_valid()
    }

    pub fn handle(&self) -> Handle<BindGroupLayoutTag> {
        self.handle
    }
}

impl Drop for GpuBindGroupLayout {
    fn drop(&mut self) {
        self.device.context.resources.lock().delete(self.handle);
    }
}

#[cfg(test)]
mod tests {
    use crate::test_support::test_device;
    use crate::types::{BindGroupLayoutFlags, BindingFlags, ResourceBindingType, ShaderStageFlags};

    #[test]
    #[ignore = "requires vulkan-tests feature and a loadable Vulkan ICD"]
    #[cfg(feature = "vulkan-tests")]
    fn a_layout_with_one_uniform_buffer_binding_creates_successfully() {
        let device = test_device();
        let entries = [super::BindGroupLayoutEntry {
            binding: 0,
            binding_type: ResourceBindingType::UniformBuffer,
            count: 1,
            shader_stages: ShaderStageFlags::FRAGMENT,
            flags: BindingFlags::empty(),
        }];
        let layout = device
            .create_bind_group_layout(&entries, BindGroupLayoutFlags::empty())
            .expect("bind group layout creation");
        assert!(layout.is_valid());
    }
}
