//! Texture samplers.

use crate::device::GpuDevice;
use crate::handle::Handle;
use crate::resource_manager::SamplerTag;
use crate::types::{AddressMode, CompareOperation, Filter, MipmapFilter};

#[derive(Debug, Clone, Copy)]
pub struct SamplerOptions {
    pub mag_filter: Filter,
    pub min_filter: Filter,
    pub mipmap_filter: MipmapFilter,
    pub address_mode_u: AddressMode,
    pub address_mode_v: AddressMode,
    pub address_mode_w: AddressMode,
    pub max_anisotropy: Option<f32>,
    pub compare: Option<CompareOperation>,
    pub min_lod: f32,
    pub max_lod: f32,
}

impl Default for SamplerOptions {
    fn default() -> Self {
        Self {
            mag_filter: Filter::Linear,
            min_filter: Filter::Linear,
            mipmap_filter: MipmapFilter::Linear,
            address_mode_u: AddressMode::Repeat,
            address_mode_v: AddressMode::Repeat,
            address_mode_w: AddressMode::Repeat,
            max_anisotropy: None,
            compare: None,
            min_lod: 0.0,
            max_lod: vk_lod_clamp_none(),
        }
    }
}

fn vk_lod_clamp_none() -> f32 {
    1000.0
}

pub struct GpuSampler {
    device: GpuDevice,
    handle: Handle<SamplerTag>,
}

impl GpuSampler {
    pub(crate) fn new(device: GpuDevice, handle: Handle<SamplerTag>) -> Self {
        Self { device, handle }
    }

    pub fn is_valid(&self) -> bool {
        self.handle.is_valid()
    }

    pub fn handle(&self) -> Handle<SamplerTag> {
        self.handle
    }
}

impl Drop for GpuSampler {
    fn drop(&mut self) {
        let frame = self.device.current_frame();
        self.device.deleter().lock().delete_sampler(frame, self.handle);
    }
}

#[cfg(test)]
mod tests {
    use crate::test_support::test_device;

    #[test]
    #[ignore = "requires vulkan-tests feature and a loadable Vulkan ICD"]
    #[cfg(feature = "vulkan-tests")]
    fn default_sampler_options_create_successfully() {
        let device = test_device();
        let sampler = device
            .create_sampler(super::SamplerOptions::default())
            .expect("sampler creation");
        assert!(sampler.is_valid());
    }

    #[test]
    #[ignore = "requires vulkan-tests feature and a loadable Vulkan ICD"]
    #[cfg(feature = "vulkan-tests")]
    fn a_comparison_sampler_creates_successfully() {
        let device = test_device();
        let options = super::SamplerOptions {
            compare: Some(crate::types::CompareOperation::Less),
            ..super::SamplerOptions::default()
        };
        let sampler = device.create_sampler(options).expect("sampler creation");
        assert!(sampler.is_valid());
    }
}
