//! Image views: the unit textures and samplers are actually bound through.

use crate::device::GpuDevice;
use crate::handle::Handle;
use crate::resource_manager::TextureViewTag;
use crate::types::{Format, TextureAspectFlags, ViewType};

#[derive(Debug, Clone, Copy)]
pub struct TextureViewOptions {
    pub view_type: ViewType,
    pub format: Format,
    pub aspect: TextureAspectFlags,
    pub base_mip_level: u32,
    pub level_count: u32,
    pub base_array_layer: u32,
    pub layer_count: u32,
}

impl Default for TextureViewOptions {
    fn default() -> Self {
        Self {
            view_type: ViewType::TwoD,
            format: Format::R8g8b8a8Unorm,
            aspect: TextureAspectFlags::COLOR,
            base_mip_level: 0,
            level_count: 1,
            base_array_layer: 0,
            layer_count: 1,
        }
    }
}

pub struct GpuTextureView {
    device: GpuDevice,
    handle: Handle<TextureViewTag>,
}

impl GpuTextureView {
    pub(crate) fn new(device: GpuDevice, handle: Handle<TextureViewTag>) -> Self {
        Self { device, handle }
    }

    pub fn is_valid(&self) -> bool {
        self.handle.is_valid()
    }

    pub fn handle(&self) -> Handle<TextureViewTag> {
        self.handle
    }
}

impl Drop for GpuTextureView {
    fn drop(&mut self) {
        let shared = self.device.shared();
        shared
            .render_pass_cache
            .lock()
            .invalidate_view(&shared.raw, self.handle);
        let frame = self.device.current_frame();
        self.device
            .deleter()
            .lock()
            .delete_texture_view(frame, self.handle);
    }
}

#[cfg(test)]
mod tests {
    use crate::test_support::test_device;
    use crate::texture::TextureOptions;

    #[test]
    #[ignore = "requires vulkan-tests feature and a loadable Vulkan ICD"]
    #[cfg(feature = "vulkan-tests")]
    fn a_view_created_from_a_texture_is_valid() {
        let device = test_device();
        let texture = device
            .create_texture(TextureOptions::default())
            .expect("texture creation");
        let view = device
            .create_texture_view(&texture, super::TextureViewOptions::default())
            .expect("texture view creation");
        assert!(view.is_valid());
    }
}
