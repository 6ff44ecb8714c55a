//! Image resources, both owned and swapchain-provided.

use crate::device::GpuDevice;
use crate::handle::Handle;
use crate::resource_manager::TextureTag;
use crate::types::{Extent3D, Format, MemoryUsage, Tiling, TextureType, TextureUsageFlags};

#[derive(Debug, Clone, Copy)]
pub struct TextureOptions {
    pub ty: TextureType,
    pub format: Format,
    pub extent: Extent3D,
    pub mip_levels: u32,
    pub array_layers: u32,
    pub samples: u32,
    pub tiling: Tiling,
    pub usage: TextureUsageFlags,
    pub memory_usage: MemoryUsage,
}

impl Default for TextureOptions {
    fn default() -> Self {
        Self {
            ty: TextureType::TwoD,
            format: Format::R8g8b8a8Unorm,
            extent: Extent3D {
                width: 1,
                height: 1,
                depth: 1,
            },
            mip_levels: 1,
            array_layers: 1,
            samples: 1,
            tiling: Tiling::Optimal,
            usage: TextureUsageFlags::SAMPLED,
            memory_usage: MemoryUsage::GpuOnly,
        }
    }
}

pub struct GpuTexture {
    device: GpuDevice,
    handle: Handle<TextureTag>,
}

impl GpuTexture {
    pub(crate) fn new(device: GpuDevice, handle: Handle<TextureTag>) -> Self {
        Self { device, handle }
    }

    pub fn is_valid(&self) -> bool {
        self.handle.is_valid()
    }

    pub fn handle(&self) -> Handle<TextureTag> {
        self.handle
    }

    pub fn extent(&self) -> Extent3D {
        self.device
            .context
            .resources
            .lock()
            .get(self.handle)
            .expect("texture handle valid for the lifetime of GpuTexture")
            .extent()
    }

    pub fn format(&self) -> Format {
        self.device
            .context
            .resources
            .lock()
            .get(self.handle)
            .expect("texture handle valid for the lifetime of GpuTexture")
            .format()
    }

    pub fn mip_levels(&self) -> u32 {
        self.device
            .context
            .resources
            .lock()
            .get(self.handle)
            .expect("texture handle valid for the lifetime of GpuTexture")
            .mip_levels()
    }

    /// Blits level 0 down into every other mip level on `queue`, the way
    /// `Texture::generateMipMaps` does: level 0 starts at `old_layout`, each
    /// target level is filled by a linear-filtered blit from the level
    /// above it, and every level ends in `TransferSrcOptimal` so the caller
    /// can barrier the whole chain into its eventual read layout in one
    /// step. Blocks until the blit submission completes.
    pub fn generate_mip_maps(
        &self,
        queue: &crate::queue::GpuQueue,
        old_layout: crate::types::TextureLayout,
    ) -> crate::error::Result<()> {
        queue.generate_mip_maps(self, old_layout)
    }
}

impl Drop for GpuTexture {
    fn drop(&mut self) {
        let frame = self.device.current_frame();
        self.device.deleter().lock().delete_texture(frame, self.handle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::test_device;

    #[test]
    #[ignore = "requires vulkan-tests feature and a loadable Vulkan ICD"]
    #[cfg(feature = "vulkan-tests")]
    fn a_texture_reports_the_extent_and_format_it_was_created_with() {
        let device = test_device();
        let options = TextureOptions {
            extent: Extent3D {
                width: 64,
                height: 32,
                depth: 1,
            },
            ..TextureOptions::default()
        };
        let texture = device.create_texture(options).expect("texture creation");
        assert_eq!(texture.extent().width, 64);
        assert_eq!(texture.extent().height, 32);
        assert_eq!(texture.format(), Format::R8g8b8a8Unorm);
    }

    #[test]
    #[ignore = "requires vulkan-tests feature and a loadable Vulkan ICD"]
    #[cfg(feature = "vulkan-tests")]
    fn generating_mip_maps_does_not_fail_on_an_eight_level_texture() {
        use crate::types::{TextureLayout, TextureUsageFlags};

        let device = test_device();
        let options = TextureOptions {
            extent: Extent3D {
                width: 128,
                height: 128,
                depth: 1,
            },
            mip_levels: 8,
            usage: TextureUsageFlags::SAMPLED
                | TextureUsageFlags::TRANSFER_SRC
                | TextureUsageFlags::TRANSFER_DST,
            ..TextureOptions::default()
        };
        let texture = device.create_texture(options).expect("texture creation");
        assert_eq!(texture.mip_levels(), 8);

        let queue = device.graphics_queue();
        texture
            .generate_mip_maps(&queue, TextureLayout::Undefined)
            .expect("mip map generation");
    }
}
