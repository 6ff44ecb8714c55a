//! Fences, semaphores, and timestamp queries.
//!
//! Grounded on the teacher's `wgpu-hal/src/vulkan/fence.rs`: a fence is
//! either a raw `VkFence` or (when `VK_KHR_timeline_semaphore` is
//! available) a timeline semaphore value, chosen once at device creation
//! and shared by every fence the device hands out.

use std::sync::Arc;

use ash::vk;

use crate::vk::device::DeviceShared;

/// Either a binary `VkFence` or a point on a device-wide timeline
/// semaphore, mirroring the teacher's `Fence` enum.
pub enum VulkanFence {
    Binary {
        device: Arc<DeviceShared>,
        raw: vk::Fence,
    },
    Timeline {
        device: Arc<DeviceShared>,
        semaphore: vk::Semaphore,
        wait_value: u64,
    },
}

impl VulkanFence {
    pub fn new_binary(device: Arc<DeviceShared>, signalled: bool) -> crate::error::Result<Self> {
        let mut flags = vk::FenceCreateFlags::empty();
        if signalled {
            flags |= vk::FenceCreateFlags::SIGNALED;
        }
        let info = vk::FenceCreateInfo::default().flags(flags);
        let raw = unsafe { device.raw.create_fence(&info, None)? };
        Ok(VulkanFence::Binary { device, raw })
    }

    pub fn status(&self) -> crate::error::Result<crate::error::FenceStatus> {
        use crate::error::FenceStatus;
        match self {
            VulkanFence::Binary { device, raw } => {
                let signalled = unsafe { device.raw.get_fence_status(*raw)? };
                Ok(if signalled {
                    FenceStatus::Signalled
                } else {
                    FenceStatus::NotSignalled
                })
            }
            VulkanFence::Timeline {
                device,
                semaphore,
                wait_value,
            } => {
                let current = unsafe { device.raw.get_semaphore_counter_value(*semaphore)? };
                Ok(if current >= *wait_value {
                    FenceStatus::Signalled
                } else {
                    FenceStatus::NotSignalled
                })
            }
        }
    }

    pub fn wait(&self, timeout_ns: u64) -> crate::error::Result<()> {
        match self {
            VulkanFence::Binary { device, raw } => {
                unsafe { device.raw.wait_for_fences(&[*raw], true, timeout_ns)? };
                Ok(())
            }
            VulkanFence::Timeline {
                device,
                semaphore,
                wait_value,
            } => {
                let wait_info = vk::SemaphoreWaitInfo::default()
                    .semaphores(std::slice::from_ref(semaphore))
                    .values(std::slice::from_ref(wait_value));
                unsafe { device.raw.wait_semaphores(&wait_info, timeout_ns)? };
                Ok(())
            }
        }
    }

    pub fn reset(&self) -> crate::error::Result<()> {
        if let VulkanFence::Binary { device, raw } = self {
            unsafe { device.raw.reset_fences(&[*raw])? };
        }
        Ok(())
    }
}

impl Drop for VulkanFence {
    fn drop(&mut self) {
        if let VulkanFence::Binary { device, raw } = self {
            unsafe { device.raw.destroy_fence(*raw, None) };
        }
    }
}

/// A binary `VkSemaphore` used for queue-to-queue or queue-to-presentation
/// synchronization.
pub struct VulkanSemaphore {
    device: Arc<DeviceShared>,
    pub(crate) raw: vk::Semaphore,
}

impl VulkanSemaphore {
    pub fn new(device: Arc<DeviceShared>) -> crate::error::Result<Self> {
        let info = vk::SemaphoreCreateInfo::default();
        let raw = unsafe { device.raw.create_semaphore(&info, None)? };
        Ok(Self { device, raw })
    }

    pub fn raw(&self) -> vk::Semaphore {
        self.raw
    }
}

impl Drop for VulkanSemaphore {
    fn drop(&mut self) {
        unsafe { self.device.raw.destroy_semaphore(self.raw, None) };
    }
}

/// Query-pool-backed GPU timestamp recorder, per the original
/// `TimestampQueryRecorder` (supplemented feature, SPEC_FULL.md §10).
pub struct VulkanTimestampQueryRecorder {
    device: Arc<DeviceShared>,
    pub(crate) pool: vk::QueryPool,
    pub(crate) query_count: u32,
}

impl VulkanTimestampQueryRecorder {
    pub fn new(device: Arc<DeviceShared>, query_count: u32) -> crate::error::Result<Self> {
        let info = vk::QueryPoolCreateInfo::default()
            .query_type(vk::QueryType::TIMESTAMP)
            .query_count(query_count);
        let pool = unsafe { device.raw.create_query_pool(&info, None)? };
        Ok(Self {
            device,
            pool,
            query_count,
        })
    }

    /// Reads back raw timestamp ticks. The caller converts to nanoseconds
    /// using `AdapterProperties::timestamp_period`.
    pub fn query_results(&self) -> crate::error::Result<Vec<u64>> {
        let mut results = vec![0u64; self.query_count as usize];
        unsafe {
            self.device.raw.get_query_pool_results(
                self.pool,
                0,
                &mut results,
                vk::QueryResultFlags::TYPE_64 | vk::QueryResultFlags::WAIT,
            )?;
        }
        Ok(results)
    }
}

impl Drop for VulkanTimestampQueryRecorder {
    fn drop(&mut self) {
        unsafe { self.device.raw.destroy_query_pool(self.pool, None) };
    }
}
