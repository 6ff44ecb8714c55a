/*! An API-agnostic GPU abstraction layer with a Vulkan backend: handles
 *  and generational pools for every resource kind, a device that owns a
 *  deferred resource deleter and a bump-allocated staging pool, scoped
 *  command recording, and cached render passes/framebuffers.
 */

#![allow(clippy::too_many_arguments, clippy::type_complexity)]

/// The Vulkan backend. Kept public, the way `wgpu` exposes `wgpu::hal`,
/// so advanced call sites (ray-tracing shader stages, raw descriptor
/// writes) that the safe front-end doesn't wrap can still reach the
/// underlying `ash` types.
pub mod vk;

pub mod acceleration_structure;
pub mod adapter;
pub mod bind_group;
pub mod bind_group_layout;
pub mod bind_group_pool;
pub mod buffer;
pub mod command_buffer;
pub mod command_recorder;
pub mod compute_pass_recorder;
pub mod compute_pipeline;
mod context;
mod deleter;
pub mod device;
pub mod error;
mod handle;
pub mod instance;
mod pool;
pub mod pipeline_layout;
pub mod graphics_pipeline;
pub mod queue;
pub mod raytracing_pass_recorder;
pub mod raytracing_pipeline;
pub mod raytracing_sbt;
pub mod render_pass_recorder;
pub mod resource_manager;
pub mod sampler;
pub mod shader_module;
mod staging;
pub mod surface;
pub mod swapchain;
pub mod sync;
pub mod texture;
pub mod texture_view;
pub mod timestamp_query;
#[cfg(test)]
mod test_support;
pub mod types;
pub mod ycbcr_conversion;

pub use error::{GpuError, Result};
pub use handle::Handle;
pub use instance::{GpuInstance, InstanceOptions};
