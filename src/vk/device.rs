//! Logical device creation and the state every other Vulkan wrapper shares.
//!
//! Grounded on `wgpu-hal/src/vulkan/mod.rs`'s `DeviceShared`: a single
//! reference-counted struct holding the `ash::Device`, the render-pass and
//! framebuffer caches (`Mutex<FxHashMap<...>>` there; `Mutex<RenderPassCache>`
//! here), and anything else every resource wrapper needs a borrow of.
//! `gpu-alloc` and `gpu-descriptor` stand in for the original's hand-rolled
//! suballocators (SPEC_FULL.md §0).

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use ash::vk;
use gpu_alloc::{GpuAllocator, MemoryBlock, Request, UsageFlags};
use gpu_descriptor::DescriptorAllocator;
use parking_lot::Mutex;

use crate::types::{ExternalMemoryHandleType, MemoryUsage};
use crate::vk::adapter::VulkanAdapter;
use crate::vk::conv;
use crate::vk::render_pass_cache::RenderPassCache;
use crate::vk::InstanceShared;

pub struct QueueFamilyInfo {
    pub index: u32,
    pub queue_count: u32,
}

/// State shared by every resource wrapper hanging off one logical device.
pub struct DeviceShared {
    pub(crate) instance: Arc<InstanceShared>,
    pub(crate) raw: ash::Device,
    pub(crate) physical_device: vk::PhysicalDevice,
    pub(crate) graphics_queue_family: u32,
    pub(crate) compute_queue_family: u32,
    pub(crate) transfer_queue_family: u32,
    pub(crate) allocator: Mutex<GpuAllocator<vk::DeviceMemory>>,
    pub(crate) descriptor_allocator: Mutex<DescriptorAllocator<vk::DescriptorPool, vk::DescriptorSet>>,
    pub(crate) render_pass_cache: Mutex<RenderPassCache>,
    /// Validation-message substrings to drop, scoped to this device rather
    /// than process-global (SPEC_FULL.md §0, correcting the spec's Open
    /// Question toward per-device state since multiple devices may run
    /// different workloads in the same process).
    pub(crate) validation_ignore_list: Mutex<HashSet<String>>,
    frame_counter: AtomicU64,
    pub(crate) memory_properties: vk::PhysicalDeviceMemoryProperties,
    pub(crate) external_memory_fd: Option<ash::khr::external_memory_fd::Device>,
    pub(crate) external_memory_win32: Option<ash::khr::external_memory_win32::Device>,
    pub(crate) buffer_device_address_enabled: bool,
}

impl DeviceShared {
    pub fn allocate_memory(
        &self,
        requirements: vk::MemoryRequirements,
        usage: MemoryUsage,
    ) -> crate::error::Result<MemoryBlock<vk::DeviceMemory>> {
        let usage_flags = match usage {
            MemoryUsage::GpuOnly => UsageFlags::FAST_DEVICE_ACCESS,
            MemoryUsage::CpuToGpu => UsageFlags::UPLOAD | UsageFlags::HOST_ACCESS,
            MemoryUsage::GpuToCpu => UsageFlags::DOWNLOAD | UsageFlags::HOST_ACCESS,
            MemoryUsage::CpuOnly => UsageFlags::HOST_ACCESS,
        };
        let request = Request {
            size: requirements.size,
            align_mask: requirements.alignment - 1,
            usage: usage_flags,
            memory_types: requirements.memory_type_bits,
        };
        unsafe {
            self.allocator
                .lock()
                .alloc(
                    super::buffer::AshMemoryDevice::wrap(&self.raw),
                    request,
                )
                .map_err(|_| crate::error::GpuError::OutOfMemory)
        }
    }

    /// Allocates memory dedicated to a single buffer and exportable as
    /// `handle_type`. An exported `VkDeviceMemory` must back exactly one
    /// resource, so this bypasses `gpu-alloc`'s suballocator and its
    /// shared-block bookkeeping entirely, picking a memory type by hand the
    /// way `gpu-alloc` does internally.
    pub fn allocate_dedicated_export_memory(
        &self,
        buffer: vk::Buffer,
        requirements: vk::MemoryRequirements,
        usage: MemoryUsage,
        handle_type: ExternalMemoryHandleType,
    ) -> crate::error::Result<vk::DeviceMemory> {
        let desired_props = match usage {
            MemoryUsage::GpuOnly => vk::MemoryPropertyFlags::DEVICE_LOCAL,
            MemoryUsage::CpuToGpu | MemoryUsage::GpuToCpu | MemoryUsage::CpuOnly => {
                vk::MemoryPropertyFlags::HOST_VISIBLE | vk::MemoryPropertyFlags::HOST_COHERENT
            }
        };
        let memory_type_index = (0..self.memory_properties.memory_type_count)
            .find(|&index| {
                let supported = requirements.memory_type_bits & (1 << index) != 0;
                let props = self.memory_properties.memory_types[index as usize].property_flags;
                supported && props.contains(desired_props)
            })
            .ok_or(crate::error::GpuError::OutOfMemory)?;

        let mut dedicated_info = vk::MemoryDedicatedAllocateInfo::default().buffer(buffer);
        let mut export_info = vk::ExportMemoryAllocateInfo::default()
            .handle_types(conv::external_memory_handle_type(handle_type));
        let info = vk::MemoryAllocateInfo::default()
            .allocation_size(requirements.size)
            .memory_type_index(memory_type_index)
            .push_next(&mut export_info)
            .push_next(&mut dedicated_info);

        Ok(unsafe { self.raw.allocate_memory(&info, None)? })
    }

    pub fn ignore_validation_message(&self, needle: impl Into<String>) {
        self.validation_ignore_list.lock().insert(needle.into());
    }

    pub fn is_validation_message_ignored(&self, message: &str) -> bool {
        self.validation_ignore_list
            .lock()
            .iter()
            .any(|needle| message.contains(needle.as_str()))
    }

    /// Monotonically increasing frame index, used by the deferred deleter
    /// and staging pool to bin work per in-flight frame.
    pub fn next_frame(&self) -> u64 {
        self.frame_counter.fetch_add(1, Ordering::AcqRel)
    }

    pub fn current_frame(&self) -> u64 {
        self.frame_counter.load(Ordering::Acquire)
    }

    pub fn wait_idle(&self) -> crate::error::Result<()> {
        unsafe { self.raw.device_wait_idle()? };
        Ok(())
    }
}

impl Drop for DeviceShared {
    fn drop(&mut self) {
        self.render_pass_cache.lock().destroy_all(&self.raw);
        unsafe { self.raw.destroy_device(None) };
    }
}

pub struct DeviceOptions {
    pub enable_ray_tracing: bool,
    pub enable_mesh_shaders: bool,
    pub enable_timeline_semaphores: bool,
    pub enable_buffer_device_address: bool,
}

impl Default for DeviceOptions {
    fn default() -> Self {
        Self {
            enable_ray_tracing: false,
            enable_mesh_shaders: false,
            enable_timeline_semaphores: true,
            enable_buffer_device_address: true,
        }
    }
}

pub struct VulkanDevice {
    pub(crate) shared: Arc<DeviceShared>,
}

impl VulkanDevice {
    pub fn new(adapter: &VulkanAdapter, options: &DeviceOptions) -> crate::error::Result<Self> {
        let instance = adapter.instance_shared();

        let graphics_family = adapter
            .find_queue_family(vk::QueueFlags::GRAPHICS)
            .ok_or_else(|| {
                crate::error::GpuError::InvalidArgument("no graphics queue family".into())
            })?;
        let compute_family = adapter
            .find_queue_family(vk::QueueFlags::COMPUTE)
            .unwrap_or(graphics_family);
        let transfer_family = adapter
            .find_queue_family(vk::QueueFlags::TRANSFER)
            .unwrap_or(graphics_family);

        let mut unique_families = vec![graphics_family, compute_family, transfer_family];
        unique_families.sort_unstable();
        unique_families.dedup();

        let priorities = [1.0f32];
        let queue_create_infos: Vec<_> = unique_families
            .iter()
            .map(|&family| {
                vk::DeviceQueueCreateInfo::default()
                    .queue_family_index(family)
                    .queue_priorities(&priorities)
            })
            .collect();

        // Every requested toggle is intersected with what the adapter
        // actually reports; asking for a feature the hardware lacks is
        // silently downgraded rather than handed to Vulkan, which would
        // otherwise fail device creation outright.
        let adapter_features = adapter.features();
        let enable_ray_tracing = options.enable_ray_tracing && adapter_features.ray_tracing_pipeline;
        let enable_acceleration_structure =
            options.enable_ray_tracing && adapter_features.acceleration_structures;
        let enable_mesh_shaders = options.enable_mesh_shaders && adapter_features.mesh_shader;
        let enable_timeline_semaphores =
            options.enable_timeline_semaphores && adapter_features.timeline_semaphore;
        let enable_buffer_device_address =
            options.enable_buffer_device_address && adapter_features.buffer_device_address;
        let enable_dynamic_rendering = adapter_features.dynamic_rendering;
        let enable_sampler_anisotropy = adapter_features.sampler_anisotropy;

        let mut extension_names: Vec<*const i8> = vec![ash::khr::swapchain::NAME.as_ptr()];
        if enable_ray_tracing && enable_acceleration_structure {
            extension_names.push(ash::khr::ray_tracing_pipeline::NAME.as_ptr());
            extension_names.push(ash::khr::acceleration_structure::NAME.as_ptr());
            extension_names.push(ash::khr::deferred_host_operations::NAME.as_ptr());
        }
        if enable_mesh_shaders {
            extension_names.push(ash::ext::mesh_shader::NAME.as_ptr());
        }
        #[cfg(unix)]
        extension_names.push(ash::khr::external_memory_fd::NAME.as_ptr());
        #[cfg(windows)]
        extension_names.push(ash::khr::external_memory_win32::NAME.as_ptr());

        let mut features12 = vk::PhysicalDeviceVulkan12Features::default()
            .timeline_semaphore(enable_timeline_semaphores)
            .buffer_device_address(enable_buffer_device_address);
        let mut features13 =
            vk::PhysicalDeviceVulkan13Features::default().dynamic_rendering(enable_dynamic_rendering);
        let features = vk::PhysicalDeviceFeatures::default().sampler_anisotropy(enable_sampler_anisotropy);
        let mut ray_tracing_features = vk::PhysicalDeviceRayTracingPipelineFeaturesKHR::default()
            .ray_tracing_pipeline(enable_ray_tracing);
        let mut acceleration_structure_features =
            vk::PhysicalDeviceAccelerationStructureFeaturesKHR::default()
                .acceleration_structure(enable_acceleration_structure);
        let mut mesh_shader_features =
            vk::PhysicalDeviceMeshShaderFeaturesEXT::default().mesh_shader(enable_mesh_shaders);

        let create_info = vk::DeviceCreateInfo::default()
            .queue_create_infos(&queue_create_infos)
            .enabled_extension_names(&extension_names)
            .enabled_features(&features)
            .push_next(&mut features12)
            .push_next(&mut features13)
            .push_next(&mut ray_tracing_features)
            .push_next(&mut acceleration_structure_features)
            .push_next(&mut mesh_shader_features);

        let raw = unsafe {
            instance
                .raw
                .create_device(adapter.raw, &create_info, None)?
        };

        let memory_properties = *adapter.memory_properties();
        let allocator_props = super::buffer::properties_from(
            &memory_properties,
            vk::WHOLE_SIZE,
            enable_buffer_device_address,
        );
        let allocator = GpuAllocator::new(gpu_alloc::Config::i_am_prototyping(), allocator_props);

        let descriptor_allocator = DescriptorAllocator::new(0);

        #[cfg(unix)]
        let external_memory_fd = Some(ash::khr::external_memory_fd::Device::new(&instance.raw, &raw));
        #[cfg(not(unix))]
        let external_memory_fd = None;
        #[cfg(windows)]
        let external_memory_win32 =
            Some(ash::khr::external_memory_win32::Device::new(&instance.raw, &raw));
        #[cfg(not(windows))]
        let external_memory_win32 = None;

        let shared = Arc::new(DeviceShared {
            instance,
            raw,
            physical_device: adapter.raw,
            graphics_queue_family: graphics_family,
            compute_queue_family: compute_family,
            transfer_queue_family: transfer_family,
            allocator: Mutex::new(allocator),
            descriptor_allocator: Mutex::new(descriptor_allocator),
            render_pass_cache: Mutex::new(RenderPassCache::new()),
            validation_ignore_list: Mutex::new(HashSet::new()),
            frame_counter: AtomicU64::new(0),
            memory_properties,
            external_memory_fd,
            external_memory_win32,
            buffer_device_address_enabled: enable_buffer_device_address,
        });

        Ok(Self { shared })
    }

    pub fn raw(&self) -> &ash::Device {
        &self.shared.raw
    }

    pub fn graphics_queue_family(&self) -> u32 {
        self.shared.graphics_queue_family
    }

    pub fn compute_queue_family(&self) -> u32 {
        self.shared.compute_queue_family
    }

    pub fn transfer_queue_family(&self) -> u32 {
        self.shared.transfer_queue_family
    }

    pub fn shared(&self) -> Arc<DeviceShared> {
        self.shared.clone()
    }

    pub fn wait_idle(&self) -> crate::error::Result<()> {
        self.shared.wait_idle()
    }

    pub fn ignore_validation_message(&self, needle: impl Into<String>) {
        self.shared.ignore_validation_message(needle);
    }
}
