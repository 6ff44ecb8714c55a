//! Images, image views, samplers, shader modules, and YCbCr conversions.

use std::sync::Arc;

use ash::vk;
use gpu_alloc::MemoryBlock;

use crate::types::{
    AddressMode, CompareOperation, Extent3D, Filter, Format, MemoryUsage, MipmapFilter, Tiling,
    TextureAspectFlags, TextureType, TextureUsageFlags, ViewType,
};
use crate::vk::conv;
use crate::vk::device::DeviceShared;

/// Either an owned image (created through `create<Texture>`) or a
/// borrowed swapchain image, which the swapchain itself destroys.
pub enum VulkanTexture {
    Owned {
        device: Arc<DeviceShared>,
        raw: vk::Image,
        memory: Option<MemoryBlock<vk::DeviceMemory>>,
        extent: Extent3D,
        format: Format,
        mip_levels: u32,
        array_layers: u32,
    },
    SwapchainImage {
        raw: vk::Image,
        extent: Extent3D,
        format: Format,
    },
}

impl VulkanTexture {
    pub fn new(
        device: Arc<DeviceShared>,
        ty: TextureType,
        format: Format,
        extent: Extent3D,
        mip_levels: u32,
        array_layers: u32,
        samples: u32,
        tiling: Tiling,
        usage: TextureUsageFlags,
        memory_usage: MemoryUsage,
    ) -> crate::error::Result<Self> {
        let info = vk::ImageCreateInfo::default()
            .image_type(conv::image_type(ty))
            .format(conv::format(format))
            .extent(vk::Extent3D {
                width: extent.width,
                height: extent.height,
                depth: extent.depth,
            })
            .mip_levels(mip_levels)
            .array_layers(array_layers)
            .samples(
                vk::SampleCountFlags::from_raw(samples.max(1))
            )
            .tiling(conv::image_tiling(tiling))
            .usage(conv::image_usage(usage))
            .sharing_mode(vk::SharingMode::EXCLUSIVE)
            .initial_layout(vk::ImageLayout::UNDEFINED);

        let raw = unsafe { device.raw.create_image(&info, None)? };
        let requirements = unsafe { device.raw.get_image_memory_requirements(raw) };
        let memory = device.allocate_memory(requirements, memory_usage)?;
        unsafe {
            device
                .raw
                .bind_image_memory(raw, *memory.memory(), memory.offset())?;
        }

        Ok(VulkanTexture::Owned {
            device,
            raw,
            memory: Some(memory),
            extent,
            format,
            mip_levels,
            array_layers,
        })
    }

    pub fn raw(&self) -> vk::Image {
        match self {
            VulkanTexture::Owned { raw, .. } => *raw,
            VulkanTexture::SwapchainImage { raw, .. } => *raw,
        }
    }

    pub fn extent(&self) -> Extent3D {
        match self {
            VulkanTexture::Owned { extent, .. } => *extent,
            VulkanTexture::SwapchainImage { extent, .. } => *extent,
        }
    }

    pub fn format(&self) -> Format {
        match self {
            VulkanTexture::Owned { format, .. } => *format,
            VulkanTexture::SwapchainImage { format, .. } => *format,
        }
    }

    pub fn mip_levels(&self) -> u32 {
        match self {
            VulkanTexture::Owned { mip_levels, .. } => *mip_levels,
            VulkanTexture::SwapchainImage { .. } => 1,
        }
    }

    pub fn array_layers(&self) -> u32 {
        match self {
            VulkanTexture::Owned { array_layers, .. } => *array_layers,
            VulkanTexture::SwapchainImage { .. } => 1,
        }
    }
}

impl Drop for VulkanTexture {
    fn drop(&mut self) {
        if let VulkanTexture::Owned {
            device,
            raw,
            memory,
            ..
        } = self
        {
            if let Some(memory) = memory.take() {
                unsafe {
                    device
                        .allocator
                        .lock()
                        .dealloc(super::buffer::AshMemoryDevice::wrap(&device.raw), memory);
                }
            }
            unsafe { device.raw.destroy_image(*raw, None) };
        }
    }
}

pub struct VulkanTextureView {
    device: Arc<DeviceShared>,
    pub(crate) raw: vk::ImageView,
    pub(crate) image: vk::Image,
    pub(crate) format: Format,
    pub(crate) aspect: TextureAspectFlags,
    pub(crate) extent: Extent3D,
}

impl VulkanTextureView {
    pub fn new(
        device: Arc<DeviceShared>,
        image: vk::Image,
        view_type: ViewType,
        format: Format,
        aspect: TextureAspectFlags,
        base_mip_level: u32,
        level_count: u32,
        base_array_layer: u32,
        layer_count: u32,
        extent: Extent3D,
    ) -> crate::error::Result<Self> {
        let info = vk::ImageViewCreateInfo::default()
            .image(image)
            .view_type(conv::image_view_type(view_type))
            .format(conv::format(format))
            .subresource_range(vk::ImageSubresourceRange {
                aspect_mask: conv::aspect_mask(aspect),
                base_mip_level,
                level_count,
                base_array_layer,
                layer_count,
            });
        let raw = unsafe { device.raw.create_image_view(&info, None)? };
        Ok(Self {
            device,
            raw,
            image,
            format,
            aspect,
            extent,
        })
    }

    pub fn raw(&self) -> vk::ImageView {
        self.raw
    }
}

impl Drop for VulkanTextureView {
    fn drop(&mut self) {
        unsafe { self.device.raw.destroy_image_view(self.raw, None) };
    }
}

pub struct VulkanSampler {
    device: Arc<DeviceShared>,
    pub(crate) raw: vk::Sampler,
}

impl VulkanSampler {
    pub fn new(
        device: Arc<DeviceShared>,
        mag_filter: Filter,
        min_filter: Filter,
        mipmap_filter: MipmapFilter,
        address_mode_u: AddressMode,
        address_mode_v: AddressMode,
        address_mode_w: AddressMode,
        max_anisotropy: Option<f32>,
        compare: Option<CompareOperation>,
        min_lod: f32,
        max_lod: f32,
    ) -> crate::error::Result<Self> {
        let mut info = vk::SamplerCreateInfo::default()
            .mag_filter(conv::filter(mag_filter))
            .min_filter(conv::filter(min_filter))
            .mipmap_mode(conv::mipmap_mode(mipmap_filter))
            .address_mode_u(conv::address_mode(address_mode_u))
            .address_mode_v(conv::address_mode(address_mode_v))
            .address_mode_w(conv::address_mode(address_mode_w))
            .min_lod(min_lod)
            .max_lod(max_lod);

        if let Some(anisotropy) = max_anisotropy {
            info = info.anisotropy_enable(true).max_anisotropy(anisotropy);
        }
        if let Some(op) = compare {
            info = info.compare_enable(true).compare_op(conv::compare_op(op));
        }

        let raw = unsafe { device.raw.create_sampler(&info, None)? };
        Ok(Self { device, raw })
    }

    pub fn raw(&self) -> vk::Sampler {
        self.raw
    }
}

impl Drop for VulkanSampler {
    fn drop(&mut self) {
        unsafe { self.device.raw.destroy_sampler(self.raw, None) };
    }
}

pub struct VulkanShaderModule {
    device: Arc<DeviceShared>,
    pub(crate) raw: vk::ShaderModule,
}

impl VulkanShaderModule {
    pub fn new(device: Arc<DeviceShared>, spirv_code: &[u32]) -> crate::error::Result<Self> {
        let info = vk::ShaderModuleCreateInfo::default().code(spirv_code);
        let raw = unsafe { device.raw.create_shader_module(&info, None)? };
        Ok(Self { device, raw })
    }

    pub fn raw(&self) -> vk::ShaderModule {
        self.raw
    }
}

impl Drop for VulkanShaderModule {
    fn drop(&mut self) {
        unsafe { self.device.raw.destroy_shader_module(self.raw, None) };
    }
}

pub struct VulkanYCbCrConversion {
    device: Arc<DeviceShared>,
    pub(crate) raw: vk::SamplerYcbcrConversion,
}

impl VulkanYCbCrConversion {
    pub fn new(device: Arc<DeviceShared>, format: Format) -> crate::error::Result<Self> {
        let info = vk::SamplerYcbcrConversionCreateInfo::default()
            .format(conv::format(format))
            .ycbcr_model(vk::SamplerYcbcrModelConversion::YCBCR_709)
            .ycbcr_range(vk::SamplerYcbcrRange::ITU_NARROW)
            .chroma_filter(vk::Filter::LINEAR);
        let raw = unsafe { device.raw.create_sampler_ycbcr_conversion(&info, None)? };
        Ok(Self { device, raw })
    }
}

impl Drop for VulkanYCbCrConversion {
    fn drop(&mut self) {
        unsafe {
            self.device
                .raw
                .destroy_sampler_ycbcr_conversion(self.raw, None)
        };
    }
}
