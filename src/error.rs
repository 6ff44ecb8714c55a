use thiserror::Error;

/// Error kinds per spec §7. Most create operations report failure by
/// returning an invalid handle (see [`crate::handle::Handle::is_valid`]);
/// this type is reserved for operations that must report rich status
/// (submit, present, acquire, fence wait, mipmap generation, bind-group
/// update).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GpuError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("host or device allocation failed")]
    OutOfMemory,

    #[error("the device has been lost")]
    DeviceLost,

    #[error("the surface has been lost")]
    SurfaceLost,

    #[error("the swapchain is out of date and must be recreated")]
    OutOfDate,

    #[error("the swapchain is suboptimal and should be recreated")]
    SubOptimal,

    #[error("operation timed out")]
    Timeout,

    #[error("validation layer rejected the call: {0}")]
    ValidationFailed(String),
}

pub type Result<T> = std::result::Result<T, GpuError>;

impl From<ash::vk::Result> for GpuError {
    fn from(result: ash::vk::Result) -> Self {
        use ash::vk::Result as VkResult;
        match result {
            VkResult::ERROR_OUT_OF_HOST_MEMORY | VkResult::ERROR_OUT_OF_DEVICE_MEMORY => {
                GpuError::OutOfMemory
            }
            VkResult::ERROR_DEVICE_LOST => GpuError::DeviceLost,
            VkResult::ERROR_SURFACE_LOST_KHR => GpuError::SurfaceLost,
            VkResult::ERROR_OUT_OF_DATE_KHR => GpuError::OutOfDate,
            VkResult::SUBOPTIMAL_KHR => GpuError::SubOptimal,
            VkResult::TIMEOUT => GpuError::Timeout,
            VkResult::ERROR_VALIDATION_FAILED_EXT => {
                GpuError::ValidationFailed(format!("{result:?}"))
            }
            other => {
                log::warn!("unrecognized vulkan result mapped to DeviceLost: {other:?}");
                GpuError::DeviceLost
            }
        }
    }
}

/// Coalesced result of [`crate::queue::Queue::present`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresentResult {
    Success,
    OutOfMemory,
    DeviceLost,
    OutOfDate,
    SurfaceLost,
}

/// Result of [`crate::swapchain::Swapchain::get_next_image_index`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquireImageResult {
    Success,
    SubOptimal,
    NotReady,
    OutOfDate,
    SurfaceLost,
    OutOfMemory,
    DeviceLost,
    ValidationFailed,
    Unknown,
}

/// Result of [`crate::sync::Fence::status`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FenceStatus {
    Signalled,
    NotSignalled,
}
