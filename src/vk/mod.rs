//! Vulkan backend internals.
//!
//! There is exactly one backend (spec.md §1 Non-goals: "does not attempt to
//! be multi-backend at runtime"), so unlike the teacher's `wgpu-hal`, these
//! types are not behind a generic `Api` trait — they are concrete structs
//! that the front-end modules (`crate::device`, `crate::queue`, ...) talk to
//! directly. This follows the "Dynamic dispatch" design note in spec.md §9:
//! the vtable seam the original C++ uses to keep Vulkan behind a
//! compile-time wall buys nothing here, so it is inlined away.
//!
//! Every wrapper below is POD-ish: it owns only native handles and raw
//! pointers, and is intentionally cheap to move and overwrite. Per spec.md
//! §9 "Pool destructor semantics", these types must release their native
//! Vulkan objects from the explicit `delete<X>` path (see
//! `crate::resource_manager::ResourceManager`), never from `Drop`, because
//! `Pool<T, Tag>` only destructs elements wholesale when the pool itself is
//! torn down.

pub mod adapter;
pub mod bind_group;
pub mod buffer;
pub mod command;
pub mod conv;
pub mod device;
pub mod instance;
pub mod pipeline;
pub mod queue;
pub mod raytracing;
pub mod render_pass_cache;
pub mod surface;
pub mod sync;
pub mod texture;

pub use adapter::VulkanAdapter;
pub use bind_group::{VulkanBindGroup, VulkanBindGroupLayout, VulkanBindGroupPool};
pub use buffer::VulkanBuffer;
pub use command::{VulkanCommandBuffer, VulkanCommandRecorder};
pub use device::VulkanDevice;
pub use instance::VulkanInstance;
pub use pipeline::{
    VulkanComputePipeline, VulkanGraphicsPipeline, VulkanPipelineLayout, VulkanRayTracingPipeline,
};
pub use queue::VulkanQueue;
pub use raytracing::{VulkanAccelerationStructure, VulkanShaderBindingTable};
pub use surface::VulkanSurface;
pub use sync::{VulkanFence, VulkanSemaphore, VulkanTimestampQueryRecorder};
pub use texture::{VulkanSampler, VulkanShaderModule, VulkanTexture, VulkanTextureView, VulkanYCbCrConversion};

/// Entry points resolved once and shared by every object hanging off an
/// instance. Analogous to the teacher's `InstanceShared`.
pub struct InstanceShared {
    pub entry: ash::Entry,
    pub raw: ash::Instance,
    pub api_version: u32,
    pub debug_utils: Option<ash::ext::debug_utils::Instance>,
    pub debug_messenger: Option<ash::vk::DebugUtilsMessengerEXT>,
}

impl Drop for InstanceShared {
    fn drop(&mut self) {
        unsafe {
            if let (Some(debug_utils), Some(messenger)) =
                (self.debug_utils.as_ref(), self.debug_messenger)
            {
                debug_utils.destroy_debug_utils_messenger(messenger, None);
            }
            self.raw.destroy_instance(None);
        }
    }
}
