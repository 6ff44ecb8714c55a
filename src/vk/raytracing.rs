//! Acceleration structures and shader binding tables.
//!
//! Supplemented feature per SPEC_FULL.md §10, grounded on the original's
//! `acceleration_structure.h` / `raytracing_pipeline.h` and the shader
//! binding table layout rules from `VK_KHR_ray_tracing_pipeline`.

use std::sync::Arc;

use ash::vk;
use gpu_alloc::MemoryBlock;

use crate::types::MemoryUsage;
use crate::vk::device::DeviceShared;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccelerationStructureType {
    TopLevel,
    BottomLevel,
}

pub struct VulkanAccelerationStructure {
    device: Arc<DeviceShared>,
    loader: ash::khr::acceleration_structure::Device,
    pub(crate) raw: vk::AccelerationStructureKHR,
    buffer: vk::Buffer,
    memory: Option<MemoryBlock<vk::DeviceMemory>>,
    pub(crate) device_address: u64,
}

impl VulkanAccelerationStructure {
    pub fn new(
        device: Arc<DeviceShared>,
        ty: AccelerationStructureType,
        size: u64,
    ) -> crate::error::Result<Self> {
        let loader =
            ash::khr::acceleration_structure::Device::new(&device.instance.raw, &device.raw);

        let buffer_info = vk::BufferCreateInfo::default()
            .size(size)
            .usage(
                vk::BufferUsageFlags::ACCELERATION_STRUCTURE_STORAGE_KHR
                    | vk::BufferUsageFlags::SHADER_DEVICE_ADDRESS,
            )
            .sharing_mode(vk::SharingMode::EXCLUSIVE);
        let buffer = unsafe { device.raw.create_buffer(&buffer_info, None)? };
        let requirements = unsafe { device.raw.get_buffer_memory_requirements(buffer) };
        let memory = device.allocate_memory(requirements, MemoryUsage::GpuOnly)?;
        unsafe {
            device
                .raw
                .bind_buffer_memory(buffer, *memory.memory(), memory.offset())?;
        }

        let create_info = vk::AccelerationStructureCreateInfoKHR::default()
            .buffer(buffer)
            .size(size)
            .ty(match ty {
                AccelerationStructureType::TopLevel => {
                    vk::AccelerationStructureTypeKHR::TOP_LEVEL
                }
                AccelerationStructureType::BottomLevel => {
                    vk::AccelerationStructureTypeKHR::BOTTOM_LEVEL
                }
            });
        let raw = unsafe { loader.create_acceleration_structure(&create_info, None)? };

        let address_info =
            vk::AccelerationStructureDeviceAddressInfoKHR::default().acceleration_structure(raw);
        let device_address =
            unsafe { loader.get_acceleration_structure_device_address(&address_info) };

        Ok(Self {
            device,
            loader,
            raw,
            buffer,
            memory: Some(memory),
            device_address,
        })
    }

    pub fn raw(&self) -> vk::AccelerationStructureKHR {
        self.raw
    }

    pub fn device_address(&self) -> u64 {
        self.device_address
    }
}

impl Drop for VulkanAccelerationStructure {
    fn drop(&mut self) {
        unsafe { self.loader.destroy_acceleration_structure(self.raw, None) };
        if let Some(memory) = self.memory.take() {
            unsafe {
                self.device
                    .allocator
                    .lock()
                    .dealloc(super::buffer::AshMemoryDevice::wrap(&self.device.raw), memory);
            }
        }
        unsafe { self.device.raw.destroy_buffer(self.buffer, None) };
    }
}

/// A buffer region laid out per the four shader-binding-table groups
/// (raygen, miss, hit, callable), each aligned to
/// `shaderGroupBaseAlignment`.
pub struct VulkanShaderBindingTable {
    device: Arc<DeviceShared>,
    pub(crate) buffer: vk::Buffer,
    memory: Option<MemoryBlock<vk::DeviceMemory>>,
    pub(crate) raygen_region: vk::StridedDeviceAddressRegionKHR,
    pub(crate) miss_region: vk::StridedDeviceAddressRegionKHR,
    pub(crate) hit_region: vk::StridedDeviceAddressRegionKHR,
    pub(crate) callable_region: vk::StridedDeviceAddressRegionKHR,
}

impl VulkanShaderBindingTable {
    pub fn new(
        device: Arc<DeviceShared>,
        handle_size_aligned: u32,
        raygen_count: u32,
        miss_count: u32,
        hit_count: u32,
        callable_count: u32,
    ) -> crate::error::Result<Self> {
        let total_handles = raygen_count + miss_count + hit_count + callable_count;
        let size = (total_handles * handle_size_aligned) as u64;

        let buffer_info = vk::BufferCreateInfo::default()
            .size(size.max(1))
            .usage(
                vk::BufferUsageFlags::SHADER_BINDING_TABLE_KHR
                    | vk::BufferUsageFlags::SHADER_DEVICE_ADDRESS
                    | vk::BufferUsageFlags::TRANSFER_DST,
            )
            .sharing_mode(vk::SharingMode::EXCLUSIVE);
        let buffer = unsafe { device.raw.create_buffer(&buffer_info, None)? };
        let requirements = unsafe { device.raw.get_buffer_memory_requirements(buffer) };
        let memory = device.allocate_memory(requirements, MemoryUsage::CpuToGpu)?;
        unsafe {
            device
                .raw
                .bind_buffer_memory(buffer, *memory.memory(), memory.offset())?;
        }

        let address_info = vk::BufferDeviceAddressInfo::default().buffer(buffer);
        let base_address = unsafe { device.raw.get_buffer_device_address(&address_info) };

        let region = |offset: u32, count: u32| vk::StridedDeviceAddressRegionKHR {
            device_address: if count == 0 { 0 } else { base_address + offset as u64 },
            stride: handle_size_aligned as u64,
            size: (count * handle_size_aligned) as u64,
        };

        let raygen_region = region(0, raygen_count);
        let miss_region = region(raygen_count * handle_size_aligned, miss_count);
        let hit_region = region(
            (raygen_count + miss_count) * handle_size_aligned,
            hit_count,
        );
        let callable_region = region(
            (raygen_count + miss_count + hit_count) * handle_size_aligned,
            callable_count,
        );

        Ok(Self {
            device,
            buffer,
            memory: Some(memory),
            raygen_region,
            miss_region,
            hit_region,
            callable_region,
        })
    }

    pub fn regions(
        &self,
    ) -> (
        vk::StridedDeviceAddressRegionKHR,
        vk::StridedDeviceAddressRegionKHR,
        vk::StridedDeviceAddressRegionKHR,
        vk::StridedDeviceAddressRegionKHR,
    ) {
        (
            self.raygen_region,
            self.miss_region,
            self.hit_region,
            self.callable_region,
        )
    }
}

impl Drop for VulkanShaderBindingTable {
    fn drop(&mut self) {
        if let Some(memory) = self.memory.take() {
            unsafe {
                self.device
                    .allocator
                    .lock()
                    .dealloc(super::buffer::AshMemoryDevice::wrap(&self.device.raw), memory);
            }
        }
        unsafe { self.device.raw.destroy_buffer(self.buffer, None) };
    }
}
