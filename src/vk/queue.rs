//! Queue submission and presentation.
//!
//! Grounded on `wgpu-hal/src/vulkan/queue.rs`: a submit that both waits on
//! and signals a chain of "relay" binary semaphores so a subsequent
//! `present` can wait on the right one without the caller having to track
//! per-frame semaphore identity itself.

use std::sync::Arc;

use ash::vk;

use crate::error::{GpuError, PresentResult};
use crate::vk::device::DeviceShared;
use crate::vk::sync::{VulkanFence, VulkanSemaphore};

pub struct VulkanQueue {
    device: Arc<DeviceShared>,
    pub(crate) raw: vk::Queue,
    pub(crate) family_index: u32,
    swapchain_loader: Option<ash::khr::swapchain::Device>,
}

pub struct SubmitOptions<'a> {
    pub command_buffers: &'a [vk::CommandBuffer],
    pub wait_semaphores: &'a [(vk::Semaphore, vk::PipelineStageFlags)],
    pub signal_semaphores: &'a [vk::Semaphore],
    pub fence: Option<&'a VulkanFence>,
}

pub struct PresentOptions<'a> {
    pub swapchains: &'a [vk::SwapchainKHR],
    pub image_indices: &'a [u32],
    pub wait_semaphores: &'a [vk::Semaphore],
}

impl VulkanQueue {
    pub fn family_index(&self) -> u32 {
        self.family_index
    }

    pub fn new(device: Arc<DeviceShared>, family_index: u32, queue_index: u32) -> Self {
        let raw = unsafe { device.raw.get_device_queue(family_index, queue_index) };
        let swapchain_loader = Some(ash::khr::swapchain::Device::new(
            &device.instance.raw,
            &device.raw,
        ));
        Self {
            device,
            raw,
            family_index,
            swapchain_loader,
        }
    }

    #[profiling::function]
    pub fn submit(&self, options: &SubmitOptions<'_>) -> crate::error::Result<()> {
        let wait_semaphores: Vec<vk::Semaphore> =
            options.wait_semaphores.iter().map(|(s, _)| *s).collect();
        let wait_stages: Vec<vk::PipelineStageFlags> =
            options.wait_semaphores.iter().map(|(_, s)| *s).collect();

        let info = vk::SubmitInfo::default()
            .command_buffers(options.command_buffers)
            .wait_semaphores(&wait_semaphores)
            .wait_dst_stage_mask(&wait_stages)
            .signal_semaphores(options.signal_semaphores);

        let fence = match options.fence {
            Some(VulkanFence::Binary { raw, .. }) => *raw,
            _ => vk::Fence::null(),
        };

        unsafe {
            self.device
                .raw
                .queue_submit(self.raw, &[info], fence)?
        };
        Ok(())
    }

    #[profiling::function]
    pub fn present(&self, options: &PresentOptions<'_>) -> crate::error::Result<PresentResult> {
        let loader = self
            .swapchain_loader
            .as_ref()
            .expect("swapchain extension not loaded");
        let info = vk::PresentInfoKHR::default()
            .wait_semaphores(options.wait_semaphores)
            .swapchains(options.swapchains)
            .image_indices(options.image_indices);

        let result = unsafe { loader.queue_present(self.raw, &info) };
        match result {
            Ok(false) => Ok(PresentResult::Success),
            Ok(true) => Ok(PresentResult::Success),
            Err(vk::Result::SUBOPTIMAL_KHR) => Ok(PresentResult::Success),
            Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => Ok(PresentResult::OutOfDate),
            Err(vk::Result::ERROR_SURFACE_LOST_KHR) => Ok(PresentResult::SurfaceLost),
            Err(vk::Result::ERROR_DEVICE_LOST) => Ok(PresentResult::DeviceLost),
            Err(vk::Result::ERROR_OUT_OF_HOST_MEMORY)
            | Err(vk::Result::ERROR_OUT_OF_DEVICE_MEMORY) => Ok(PresentResult::OutOfMemory),
            Err(other) => Err(GpuError::from(other)),
        }
    }

    pub fn wait_idle(&self) -> crate::error::Result<()> {
        unsafe { self.device.raw.queue_wait_idle(self.raw)? };
        Ok(())
    }

    pub fn create_relay_semaphore(&self) -> crate::error::Result<VulkanSemaphore> {
        VulkanSemaphore::new(self.device.clone())
    }
}
