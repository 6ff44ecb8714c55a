//! Buffer allocation backed by `gpu-alloc`.

use std::sync::Arc;

use ash::vk;
use gpu_alloc::MemoryBlock;

use crate::types::{BufferUsageFlags, ExternalMemoryHandle, ExternalMemoryHandleType, MemoryUsage};
use crate::vk::conv;
use crate::vk::device::DeviceShared;

/// Either a block suballocated from the shared `gpu-alloc` pool, or a
/// dedicated allocation backing a single exported buffer. An exported
/// `VkDeviceMemory` must map 1:1 to the resource it was allocated for, so it
/// can never share a pool block with anything else.
enum BufferMemory {
    Pooled(MemoryBlock<vk::DeviceMemory>),
    Dedicated {
        memory: vk::DeviceMemory,
        mapped: Option<*mut u8>,
    },
}

// SAFETY: `mapped` is a pointer into host-visible, coherent device memory
// owned exclusively by the `VulkanBuffer` holding this block; see
// `StagingBufferPool`'s identical rationale in staging.rs.
unsafe impl Send for BufferMemory {}

pub struct VulkanBuffer {
    device: Arc<DeviceShared>,
    pub(crate) raw: vk::Buffer,
    pub(crate) size: u64,
    memory: Option<BufferMemory>,
    external_memory_handle_type: Option<ExternalMemoryHandleType>,
    buffer_device_address_enabled: bool,
}

impl VulkanBuffer {
    pub fn new(
        device: Arc<DeviceShared>,
        size: u64,
        usage: BufferUsageFlags,
        memory_usage: MemoryUsage,
        external: Option<ExternalMemoryHandleType>,
        buffer_device_address_enabled: bool,
    ) -> crate::error::Result<Self> {
        if size == 0 {
            return Err(crate::error::GpuError::InvalidArgument(
                "buffer size must be non-zero".into(),
            ));
        }

        let mut external_info = external
            .map(|ty| vk::ExternalMemoryBufferCreateInfo::default().handle_types(conv::external_memory_handle_type(ty)));
        let mut info = vk::BufferCreateInfo::default()
            .size(size)
            .usage(conv::buffer_usage(usage))
            .sharing_mode(vk::SharingMode::EXCLUSIVE);
        if let Some(external_info) = external_info.as_mut() {
            info = info.push_next(external_info);
        }
        let raw = unsafe { device.raw.create_buffer(&info, None)? };
        let requirements = unsafe { device.raw.get_buffer_memory_requirements(raw) };

        let memory = match external {
            Some(handle_type) => {
                let memory =
                    device.allocate_dedicated_export_memory(raw, requirements, memory_usage, handle_type)?;
                unsafe { device.raw.bind_buffer_memory(raw, memory, 0)? };
                BufferMemory::Dedicated { memory, mapped: None }
            }
            None => {
                let block = device.allocate_memory(requirements, memory_usage)?;
                unsafe {
                    device
                        .raw
                        .bind_buffer_memory(raw, *block.memory(), block.offset())?;
                }
                BufferMemory::Pooled(block)
            }
        };

        Ok(Self {
            device,
            raw,
            size,
            memory: Some(memory),
            external_memory_handle_type: external,
            buffer_device_address_enabled,
        })
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn raw(&self) -> vk::Buffer {
        self.raw
    }

    /// Valid only for host-visible memory usages.
    pub fn map(&mut self) -> crate::error::Result<*mut u8> {
        match self
            .memory
            .as_mut()
            .expect("buffer memory freed before map")
        {
            BufferMemory::Pooled(block) => {
                let ptr = unsafe {
                    block
                        .map(ash_ext::AshMemoryDevice::wrap(&self.device.raw), 0, self.size as usize)
                        .map_err(|_| crate::error::GpuError::OutOfMemory)?
                };
                Ok(ptr.as_ptr())
            }
            BufferMemory::Dedicated { memory, mapped } => {
                if let Some(ptr) = mapped {
                    return Ok(*ptr);
                }
                let ptr = unsafe {
                    self.device
                        .raw
                        .map_memory(*memory, 0, self.size, vk::MemoryMapFlags::empty())
                        .map_err(|_| crate::error::GpuError::OutOfMemory)? as *mut u8
                };
                *mapped = Some(ptr);
                Ok(ptr)
            }
        }
    }

    pub fn unmap(&mut self) {
        match self.memory.as_mut() {
            Some(BufferMemory::Pooled(block)) => {
                unsafe { block.unmap(ash_ext::AshMemoryDevice::wrap(&self.device.raw)) };
            }
            Some(BufferMemory::Dedicated { memory, mapped }) => {
                if mapped.take().is_some() {
                    unsafe { self.device.raw.unmap_memory(*memory) };
                }
            }
            None => {}
        }
    }

    /// Flushes host writes in `[offset, offset + size)` so they become
    /// visible to the device. A no-op on coherent memory, which both memory
    /// paths here request, but kept so callers don't need to know which
    /// memory type backs a given buffer.
    pub fn flush(&self, offset: u64, size: u64) -> crate::error::Result<()> {
        let memory = self.raw_memory();
        let range = vk::MappedMemoryRange::default()
            .memory(memory)
            .offset(offset)
            .size(size);
        unsafe { self.device.raw.flush_mapped_memory_ranges(&[range])? };
        Ok(())
    }

    pub fn invalidate(&self, offset: u64, size: u64) -> crate::error::Result<()> {
        let memory = self.raw_memory();
        let range = vk::MappedMemoryRange::default()
            .memory(memory)
            .offset(offset)
            .size(size);
        unsafe { self.device.raw.invalidate_mapped_memory_ranges(&[range])? };
        Ok(())
    }

    fn raw_memory(&self) -> vk::DeviceMemory {
        match self.memory.as_ref().expect("buffer memory freed") {
            BufferMemory::Pooled(block) => *block.memory(),
            BufferMemory::Dedicated { memory, .. } => *memory,
        }
    }

    /// `vkGetBufferDeviceAddress`. Only valid when the device was created
    /// with buffer device address support and this buffer was created with
    /// [`crate::types::BufferUsageFlags::SHADER_DEVICE_ADDRESS`].
    pub fn device_address(&self) -> crate::error::Result<vk::DeviceAddress> {
        if !self.buffer_device_address_enabled {
            return Err(crate::error::GpuError::InvalidArgument(
                "buffer device address was not enabled on this device".into(),
            ));
        }
        let info = vk::BufferDeviceAddressInfo::default().buffer(self.raw);
        Ok(unsafe { self.device.raw.get_buffer_device_address(&info) })
    }

    /// Exports the dedicated allocation backing this buffer as an OS handle.
    /// Only valid for buffers created with an external memory handle type.
    pub fn external_memory_handle(&self) -> crate::error::Result<ExternalMemoryHandle> {
        let handle_type = self.external_memory_handle_type.ok_or_else(|| {
            crate::error::GpuError::InvalidArgument(
                "buffer was not created with an external memory handle type".into(),
            )
        })?;
        let memory = self.raw_memory();
        let allocation_size = self.size;
        match handle_type {
            ExternalMemoryHandleType::OpaqueFd => {
                let loader = self.device.external_memory_fd.as_ref().ok_or_else(|| {
                    crate::error::GpuError::InvalidArgument(
                        "VK_KHR_external_memory_fd is unavailable on this platform".into(),
                    )
                })?;
                let info = vk::MemoryGetFdInfoKHR::default()
                    .memory(memory)
                    .handle_type(vk::ExternalMemoryHandleTypeFlags::OPAQUE_FD);
                let fd = unsafe { loader.get_memory_fd(&info)? };
                Ok(ExternalMemoryHandle {
                    fd: Some(fd),
                    win32_handle: None,
                    allocation_size,
                })
            }
            ExternalMemoryHandleType::OpaqueWin32 => {
                let loader = self.device.external_memory_win32.as_ref().ok_or_else(|| {
                    crate::error::GpuError::InvalidArgument(
                        "VK_KHR_external_memory_win32 is unavailable on this platform".into(),
                    )
                })?;
                let info = vk::MemoryGetWin32HandleInfoKHR::default()
                    .memory(memory)
                    .handle_type(vk::ExternalMemoryHandleTypeFlags::OPAQUE_WIN32);
                let handle = unsafe { loader.get_memory_win32_handle(&info)? };
                Ok(ExternalMemoryHandle {
                    fd: None,
                    win32_handle: Some(handle as usize),
                    allocation_size,
                })
            }
        }
    }
}

impl Drop for VulkanBuffer {
    fn drop(&mut self) {
        if let Some(memory) = self.memory.take() {
            match memory {
                BufferMemory::Pooled(block) => unsafe {
                    self.device
                        .allocator
                        .lock()
                        .dealloc(ash_ext::AshMemoryDevice::wrap(&self.device.raw), block);
                },
                BufferMemory::Dedicated { memory, mapped } => unsafe {
                    if mapped.is_some() {
                        self.device.raw.unmap_memory(memory);
                    }
                    self.device.raw.free_memory(memory, None);
                },
            }
        }
        unsafe { self.device.raw.destroy_buffer(self.raw, None) };
    }
}

/// Thin adapter so `gpu-alloc`'s `MemoryDevice` trait can borrow an
/// `ash::Device` without this crate owning the `gpu-alloc-ash` dependency
/// directly; kept local rather than pulled in as a separate crate since it
/// is a handful of trait forwards.
mod ash_ext {
    use ash::vk;
    use gpu_alloc::{AllocationFlags, DeviceProperties, MemoryDevice, OutOfMemory};

    pub struct AshMemoryDevice<'a> {
        device: &'a ash::Device,
    }

    impl<'a> AshMemoryDevice<'a> {
        pub fn wrap(device: &'a ash::Device) -> &'a Self {
            unsafe { &*(device as *const ash::Device as *const Self) }
        }
    }

    impl<'a> MemoryDevice<vk::DeviceMemory> for AshMemoryDevice<'a> {
        unsafe fn allocate_memory(
            &self,
            size: u64,
            memory_type: u32,
            flags: AllocationFlags,
        ) -> Result<vk::DeviceMemory, OutOfMemory> {
            let mut info = vk::MemoryAllocateInfo::default()
                .allocation_size(size)
                .memory_type_index(memory_type);
            let mut flags_info = vk::MemoryAllocateFlagsInfo::default();
            if flags.contains(AllocationFlags::DEVICE_ADDRESS) {
                flags_info = flags_info.flags(vk::MemoryAllocateFlags::DEVICE_ADDRESS);
                info = info.push_next(&mut flags_info);
            }
            self.device.allocate_memory(&info, None).map_err(|err| {
                if err == vk::Result::ERROR_OUT_OF_HOST_MEMORY {
                    OutOfMemory::OutOfHostMemory
                } else {
                    OutOfMemory::OutOfDeviceMemory
                }
            })
        }

        unsafe fn deallocate_memory(&self, memory: vk::DeviceMemory) {
            self.device.free_memory(memory, None);
        }

        unsafe fn map_memory(
            &self,
            memory: &mut vk::DeviceMemory,
            offset: u64,
            size: u64,
        ) -> Result<std::ptr::NonNull<u8>, gpu_alloc::DeviceMapError> {
            let ptr = self
                .device
                .map_memory(*memory, offset, size, vk::MemoryMapFlags::empty())
                .map_err(|_| gpu_alloc::DeviceMapError::OutOfDeviceMemory)?;
            std::ptr::NonNull::new(ptr as *mut u8).ok_or(gpu_alloc::DeviceMapError::MapFailed)
        }

        unsafe fn unmap_memory(&self, memory: &mut vk::DeviceMemory) {
            self.device.unmap_memory(*memory);
        }

        unsafe fn invalidate_memory_ranges(
            &self,
            _ranges: &[gpu_alloc::MappedMemoryRange<'_, vk::DeviceMemory>],
        ) -> Result<(), OutOfMemory> {
            Ok(())
        }

        unsafe fn flush_memory_ranges(
            &self,
            _ranges: &[gpu_alloc::MappedMemoryRange<'_, vk::DeviceMemory>],
        ) -> Result<(), OutOfMemory> {
            Ok(())
        }
    }

    pub fn properties_from(
        memory_properties: &vk::PhysicalDeviceMemoryProperties,
        max_memory_allocation_size: u64,
        buffer_device_address: bool,
    ) -> DeviceProperties<'static> {
        let memory_types: Vec<_> = memory_properties.memory_types
            [..memory_properties.memory_type_count as usize]
            .iter()
            .map(|ty| gpu_alloc::MemoryType {
                heap: ty.heap_index,
                props: gpu_alloc::MemoryPropertyFlags::from_bits_truncate(
                    ty.property_flags.as_raw() as u8,
                ),
            })
            .collect();
        let memory_heaps: Vec<_> = memory_properties.memory_heaps
            [..memory_properties.memory_heap_count as usize]
            .iter()
            .map(|heap| gpu_alloc::MemoryHeap { size: heap.size })
            .collect();
        DeviceProperties {
            memory_types: memory_types.into(),
            memory_heaps: memory_heaps.into(),
            max_memory_allocation_count: 4096,
            max_memory_allocation_size,
            non_coherent_atom_size: 256,
            buffer_device_address,
        }
    }
}

pub(crate) use ash_ext::{properties_from, AshMemoryDevice};
