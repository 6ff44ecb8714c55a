//! Bump-allocated staging buffer pool for CPU-to-GPU uploads.
//!
//! Grounded on spec.md §4.11 and the original's upload helpers
//! (`Queue::uploadBufferData`, SPEC_FULL.md §10): rather than creating and
//! destroying a host-visible buffer per upload, the pool keeps one
//! host-visible `VulkanBuffer` per in-flight frame and bump-allocates
//! regions from it; the whole bin resets once its frame has cycled back
//! around, the same "frames in flight" reasoning the deleter uses.

use std::sync::Arc;

use crate::deleter::ResourceDeleter;
use crate::error::{GpuError, Result};
use crate::types::{BufferUsageFlags, MemoryUsage};
use crate::vk::device::DeviceShared;
use crate::vk::VulkanBuffer;

/// Bins retained per frame index once `recycle` has reclaimed the rest, per
/// spec §8's "number of bins retained per frame index is ≤ `MinimumBinCount`"
/// testable property.
const MINIMUM_BIN_COUNT_PER_FRAME_INDEX: usize = 1;

struct FrameBin {
    buffer: VulkanBuffer,
    mapped: *mut u8,
    cursor: u64,
    capacity: u64,
}

/// Handle to a region of a staging bin. Only valid for the frame it was
/// returned in: the next `recycle()` call (at the following frame's
/// `begin_frame`) may reset or remove the bin it names, and removal
/// shifts the index of every later bin.
#[derive(Debug, Clone, Copy)]
pub struct StagingAllocation {
    pub buffer_index: usize,
    pub offset: u64,
    pub size: u64,
}

pub struct StagingBufferPool {
    device: Arc<DeviceShared>,
    bin_size: u64,
    bins: Vec<FrameBin>,
    bin_frame: Vec<u64>,
}

// SAFETY: `mapped` is a pointer into host-visible, coherent device memory
// owned exclusively by this pool; the pool is used from a single thread at
// a time, matching every other type in this crate (see spec §5).
unsafe impl Send for StagingBufferPool {}

impl StagingBufferPool {
    pub fn new(device: Arc<DeviceShared>, bin_size: u64) -> Self {
        Self {
            device,
            bin_size: bin_size.max(1),
            bins: Vec::new(),
            bin_frame: Vec::new(),
        }
    }

    fn push_bin(&mut self, frame: u64) -> Result<usize> {
        let mut buffer = VulkanBuffer::new(
            self.device.clone(),
            self.bin_size,
            BufferUsageFlags::TRANSFER_SRC,
            MemoryUsage::CpuToGpu,
            None,
            false,
        )?;
        let mapped = buffer.map()?;
        self.bins.push(FrameBin {
            buffer,
            mapped,
            cursor: 0,
            capacity: self.bin_size,
        });
        self.bin_frame.push(frame);
        Ok(self.bins.len() - 1)
    }

    /// Bump-allocates `size` bytes (aligned to `align`) from a bin for
    /// `frame`, copying `data` into it. Searches every bin already opened
    /// for this frame index for room before allocating a fresh one, so a
    /// full first bin doesn't force a new bin per upload for the rest of
    /// the frame.
    pub fn upload(&mut self, frame: u64, data: &[u8], align: u64) -> Result<StagingAllocation> {
        let size = data.len() as u64;
        if size > self.bin_size {
            return Err(GpuError::InvalidArgument(format!(
                "upload of {size} bytes exceeds staging bin size {}",
                self.bin_size
            )));
        }

        let index = self
            .bin_frame
            .iter()
            .enumerate()
            .filter(|&(_, &f)| f == frame)
            .find(|&(i, _)| {
                let bin = &self.bins[i];
                !bin.mapped.is_null() && align_up(bin.cursor, align) + size <= bin.capacity
            })
            .map(|(i, _)| i);

        let index = match index {
            Some(index) => index,
            None => self.push_bin(frame)?,
        };

        let bin = &mut self.bins[index];
        if bin.mapped.is_null() {
            bin.mapped = bin.buffer.map()?;
        }
        let offset = align_up(bin.cursor, align);
        unsafe {
            std::ptr::copy_nonoverlapping(data.as_ptr(), bin.mapped.add(offset as usize), data.len());
        }
        bin.cursor = offset + size;

        Ok(StagingAllocation {
            buffer_index: index,
            offset,
            size,
        })
    }

    pub fn buffer_raw(&self, allocation: &StagingAllocation) -> ash::vk::Buffer {
        self.bins[allocation.buffer_index].buffer.raw()
    }

    /// Unmaps the most recently opened bin for `frame`, per spec §4.11's
    /// `flush()` operation. Uploads into that bin after this call re-map it
    /// lazily.
    pub fn flush(&mut self, frame: u64) -> Result<()> {
        if let Some(index) = self.bin_frame.iter().rposition(|&f| f == frame) {
            let bin = &mut self.bins[index];
            if !bin.mapped.is_null() {
                bin.buffer.unmap();
                bin.mapped = std::ptr::null_mut();
            }
        }
        Ok(())
    }

    /// Resets bins whose frame is old enough that `frames_in_flight` frames
    /// have elapsed, reclaiming them for `current_frame`. Per spec §8's
    /// `MinimumBinCount` property, at most `MINIMUM_BIN_COUNT_PER_FRAME_INDEX`
    /// retired bins are kept per frame index that had more than one open;
    /// the rest are unmapped and handed to `deleter` for destruction once
    /// their own frame slot has been dereffed, rather than kept forever.
    pub fn recycle(&mut self, current_frame: u64, frames_in_flight: u64, deleter: &mut ResourceDeleter) {
        let mut retired: Vec<usize> = (0..self.bins.len())
            .filter(|&i| current_frame.saturating_sub(self.bin_frame[i]) >= frames_in_flight)
            .collect();
        // Evict from the back so the surplus bins removed for a frame index
        // are the most recently opened ones, keeping the oldest (most likely
        // to still be referenced by in-flight allocations metadata) intact.
        retired.sort_unstable();

        let mut kept_per_frame = std::collections::HashMap::new();
        let mut to_remove = Vec::new();
        for &i in retired.iter().rev() {
            let frame = self.bin_frame[i];
            let kept = kept_per_frame.entry(frame).or_insert(0usize);
            if *kept < MINIMUM_BIN_COUNT_PER_FRAME_INDEX {
                *kept += 1;
                self.bins[i].cursor = 0;
                self.bin_frame[i] = current_frame;
            } else {
                to_remove.push(i);
            }
        }

        to_remove.sort_unstable_by(|a, b| b.cmp(a));
        for i in to_remove {
            let mut bin = self.bins.remove(i);
            self.bin_frame.remove(i);
            if !bin.mapped.is_null() {
                bin.buffer.unmap();
                bin.mapped = std::ptr::null_mut();
            }
            deleter.delete_staging_bin(current_frame, bin.buffer);
        }
    }

    pub fn bin_count(&self) -> usize {
        self.bins.len()
    }
}

fn align_up(value: u64, align: u64) -> u64 {
    if align <= 1 {
        value
    } else {
        (value + align - 1) & !(align - 1)
    }
}

impl Drop for StagingBufferPool {
    fn drop(&mut self) {
        for bin in &mut self.bins {
            if !bin.mapped.is_null() {
                bin.buffer.unmap();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn align_up_rounds_to_next_multiple() {
        assert_eq!(align_up(0, 256), 0);
        assert_eq!(align_up(1, 256), 256);
        assert_eq!(align_up(256, 256), 256);
        assert_eq!(align_up(257, 256), 512);
    }

    #[test]
    fn align_up_is_identity_for_alignment_of_one() {
        assert_eq!(align_up(123, 1), 123);
        assert_eq!(align_up(0, 1), 0);
    }
}
