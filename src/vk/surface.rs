//! Window surfaces and their swapchains.
//!
//! Grounded on `wgpu-hal/src/vulkan/surface.rs`'s `Swapchain`:
//! `configure`/`unconfigure`/`acquire_texture`/`discard_texture` plus
//! `release_resources`, which defers destruction until the device is
//! known idle rather than destroying mid-flight.

use std::sync::Arc;

use ash::vk;
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};

use crate::error::AcquireImageResult;
use crate::types::{ColorSpace, Extent2D, Format, PresentMode};
use crate::vk::conv;
use crate::vk::device::DeviceShared;
use crate::vk::texture::VulkanTexture;
use crate::vk::InstanceShared;

pub struct VulkanSurface {
    instance: Arc<InstanceShared>,
    surface_loader: ash::khr::surface::Instance,
    pub(crate) raw: vk::SurfaceKHR,
    swapchain: Option<SwapchainState>,
}

struct SwapchainState {
    loader: ash::khr::swapchain::Device,
    raw: vk::SwapchainKHR,
    images: Vec<vk::Image>,
    extent: Extent2D,
    format: Format,
}

pub struct SurfaceConfiguration {
    pub extent: Extent2D,
    pub format: Format,
    pub color_space: ColorSpace,
    pub present_mode: PresentMode,
    pub image_count: u32,
}

impl VulkanSurface {
    pub fn new(
        instance: Arc<InstanceShared>,
        display_handle: &impl HasDisplayHandle,
        window_handle: &impl HasWindowHandle,
    ) -> crate::error::Result<Self> {
        let surface_loader = ash::khr::surface::Instance::new(&instance.entry, &instance.raw);
        let raw = unsafe {
            ash_window::create_surface(
                &instance.entry,
                &instance.raw,
                display_handle.display_handle().map_err(surface_err)?.as_raw(),
                window_handle.window_handle().map_err(surface_err)?.as_raw(),
                None,
            )?
        };
        Ok(Self {
            instance,
            surface_loader,
            raw,
            swapchain: None,
        })
    }

    pub fn supports_present(&self, physical_device: vk::PhysicalDevice, queue_family: u32) -> bool {
        unsafe {
            self.surface_loader
                .get_physical_device_surface_support(physical_device, queue_family, self.raw)
                .unwrap_or(false)
        }
    }

    /// (Re)creates the swapchain for `config`, retiring the previous one.
    pub fn configure(
        &mut self,
        device: &Arc<DeviceShared>,
        physical_device: vk::PhysicalDevice,
        config: &SurfaceConfiguration,
    ) -> crate::error::Result<()> {
        let capabilities = unsafe {
            self.surface_loader
                .get_physical_device_surface_capabilities(physical_device, self.raw)?
        };

        let old_swapchain = self
            .swapchain
            .as_ref()
            .map(|s| s.raw)
            .unwrap_or(vk::SwapchainKHR::null());

        let image_count = config
            .image_count
            .max(capabilities.min_image_count)
            .min(if capabilities.max_image_count == 0 {
                u32::MAX
            } else {
                capabilities.max_image_count
            });

        let loader = ash::khr::swapchain::Device::new(&self.instance.raw, &device.raw);
        let create_info = vk::SwapchainCreateInfoKHR::default()
            .surface(self.raw)
            .min_image_count(image_count)
            .image_format(conv::format(config.format))
            .image_color_space(conv::color_space(config.color_space))
            .image_extent(vk::Extent2D {
                width: config.extent.width,
                height: config.extent.height,
            })
            .image_array_layers(1)
            .image_usage(vk::ImageUsageFlags::COLOR_ATTACHMENT)
            .image_sharing_mode(vk::SharingMode::EXCLUSIVE)
            .pre_transform(capabilities.current_transform)
            .composite_alpha(vk::CompositeAlphaFlagsKHR::OPAQUE)
            .present_mode(conv::present_mode(config.present_mode))
            .clipped(true)
            .old_swapchain(old_swapchain);

        let raw = unsafe { loader.create_swapchain(&create_info, None)? };
        let images = unsafe { loader.get_swapchain_images(raw)? };

        self.unconfigure(device);

        self.swapchain = Some(SwapchainState {
            loader,
            raw,
            images,
            extent: config.extent,
            format: config.format,
        });
        Ok(())
    }

    /// Destroys the current swapchain. Callers must ensure the device is
    /// idle, or that none of the acquired images are still in flight,
    /// before calling this directly (`configure` handles the
    /// old-swapchain retirement dance for you).
    pub fn unconfigure(&mut self, _device: &Arc<DeviceShared>) {
        if let Some(state) = self.swapchain.take() {
            unsafe { state.loader.destroy_swapchain(state.raw, None) };
        }
    }

    pub fn acquire_texture(
        &self,
        timeout_ns: u64,
        signal_semaphore: vk::Semaphore,
    ) -> crate::error::Result<(AcquireImageResult, Option<VulkanTexture>, u32)> {
        let state = self
            .swapchain
            .as_ref()
            .expect("acquire_texture called before configure");

        let result = unsafe {
            state
                .loader
                .acquire_next_image(state.raw, timeout_ns, signal_semaphore, vk::Fence::null())
        };

        match result {
            Ok((index, suboptimal)) => {
                let texture = VulkanTexture::SwapchainImage {
                    raw: state.images[index as usize],
                    extent: crate::types::Extent3D {
                        width: state.extent.width,
                        height: state.extent.height,
                        depth: 1,
                    },
                    format: state.format,
                };
                let status = if suboptimal {
                    AcquireImageResult::SubOptimal
                } else {
                    AcquireImageResult::Success
                };
                Ok((status, Some(texture), index))
            }
            Err(vk::Result::NOT_READY) => Ok((AcquireImageResult::NotReady, None, 0)),
            Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => Ok((AcquireImageResult::OutOfDate, None, 0)),
            Err(vk::Result::ERROR_SURFACE_LOST_KHR) => {
                Ok((AcquireImageResult::SurfaceLost, None, 0))
            }
            Err(vk::Result::ERROR_OUT_OF_HOST_MEMORY)
            | Err(vk::Result::ERROR_OUT_OF_DEVICE_MEMORY) => {
                Ok((AcquireImageResult::OutOfMemory, None, 0))
            }
            Err(vk::Result::ERROR_DEVICE_LOST) => Ok((AcquireImageResult::DeviceLost, None, 0)),
            Err(vk::Result::ERROR_VALIDATION_FAILED_EXT) => {
                Ok((AcquireImageResult::ValidationFailed, None, 0))
            }
            Err(_) => Ok((AcquireImageResult::Unknown, None, 0)),
        }
    }

    pub fn swapchain_raw(&self) -> Option<vk::SwapchainKHR> {
        self.swapchain.as_ref().map(|s| s.raw)
    }

    pub fn extent(&self) -> Option<Extent2D> {
        self.swapchain.as_ref().map(|s| s.extent)
    }
}

impl Drop for VulkanSurface {
    fn drop(&mut self) {
        if let Some(state) = self.swapchain.take() {
            unsafe { state.loader.destroy_swapchain(state.raw, None) };
        }
        unsafe { self.surface_loader.destroy_surface(self.raw, None) };
    }
}

fn surface_err(err: raw_window_handle::HandleError) -> crate::error::GpuError {
    crate::error::GpuError::InvalidArgument(format!("invalid window handle: {err}"))
}
