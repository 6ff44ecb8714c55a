//! Deferred, frame-indexed resource destruction.
//!
//! Grounded on spec.md §4.10 and the original's deletion-queue design: a
//! resource requested for deletion while frames referencing it may still
//! be in flight is not destroyed immediately. Instead it is binned by the
//! frame index it was deleted on. Each bin carries a bit-vector of length
//! `frames_in_flight`, initially all-true; `deref_frame_index(i)` clears
//! bit `i` on every bin older than the current frame, and a bin is only
//! released once every bit is clear. This two-phase design exists because
//! GPU completion is not guaranteed to track the CPU frame counter 1:1 —
//! a bin is never destroyed on elapsed-frame-count alone, only once the
//! client has told the deleter (via the fence that accompanied each frame
//! slot's submission) that slot has actually retired.

use std::collections::VecDeque;

use crate::handle::Handle;

enum PendingDeletion {
    Buffer(Handle<crate::resource_manager::BufferTag>),
    Texture(Handle<crate::resource_manager::TextureTag>),
    TextureView(Handle<crate::resource_manager::TextureViewTag>),
    Sampler(Handle<crate::resource_manager::SamplerTag>),
    BindGroup(Handle<crate::resource_manager::BindGroupTag>),
    GraphicsPipeline(Handle<crate::resource_manager::GraphicsPipelineTag>),
    ComputePipeline(Handle<crate::resource_manager::ComputePipelineTag>),
    /// A surplus staging bin evicted by `StagingBufferPool::recycle`'s
    /// `MinimumBinCount` cap. Holds the buffer itself rather than a handle
    /// since staging bins aren't tracked in `ResourceManager`.
    StagingBin(crate::vk::VulkanBuffer),
}

struct Bin {
    frame: u64,
    deletions: Vec<PendingDeletion>,
    /// `live_slots[i]` is true until `deref_frame_index(i)` observes this
    /// bin has outlived frame slot `i`'s GPU completion.
    live_slots: Vec<bool>,
}

impl Bin {
    fn is_deletable(&self) -> bool {
        self.live_slots.iter().all(|&live| !live)
    }
}

/// Accumulates deletions per frame and releases a bin once every frame
/// slot's fence has confirmed that bin's frame has finished executing on
/// the GPU.
pub struct ResourceDeleter {
    frames_in_flight: u64,
    bins: VecDeque<Bin>,
}

impl ResourceDeleter {
    pub fn new(frames_in_flight: u64) -> Self {
        Self {
            frames_in_flight: frames_in_flight.max(1),
            bins: VecDeque::new(),
        }
    }

    fn bin_for_frame(&mut self, frame: u64) -> &mut Bin {
        if self.bins.back().map(|bin| bin.frame) != Some(frame) {
            self.bins.push_back(Bin {
                frame,
                deletions: Vec::new(),
                live_slots: vec![true; self.frames_in_flight as usize],
            });
        }
        self.bins.back_mut().unwrap()
    }

    pub fn delete_buffer(&mut self, frame: u64, handle: Handle<crate::resource_manager::BufferTag>) {
        self.bin_for_frame(frame)
            .deletions
            .push(PendingDeletion::Buffer(handle));
    }

    pub fn delete_texture(&mut self, frame: u64, handle: Handle<crate::resource_manager::TextureTag>) {
        self.bin_for_frame(frame)
            .deletions
            .push(PendingDeletion::Texture(handle));
    }

    pub fn delete_texture_view(
        &mut self,
        frame: u64,
        handle: Handle<crate::resource_manager::TextureViewTag>,
    ) {
        self.bin_for_frame(frame)
            .deletions
            .push(PendingDeletion::TextureView(handle));
    }

    pub fn delete_sampler(&mut self, frame: u64, handle: Handle<crate::resource_manager::SamplerTag>) {
        self.bin_for_frame(frame)
            .deletions
            .push(PendingDeletion::Sampler(handle));
    }

    pub fn delete_bind_group(
        &mut self,
        frame: u64,
        handle: Handle<crate::resource_manager::BindGroupTag>,
    ) {
        self.bin_for_frame(frame)
            .deletions
            .push(PendingDeletion::BindGroup(handle));
    }

    pub fn delete_graphics_pipeline(
        &mut self,
        frame: u64,
        handle: Handle<crate::resource_manager::GraphicsPipelineTag>,
    ) {
        self.bin_for_frame(frame)
            .deletions
            .push(PendingDeletion::GraphicsPipeline(handle));
    }

    pub fn delete_compute_pipeline(
        &mut self,
        frame: u64,
        handle: Handle<crate::resource_manager::ComputePipelineTag>,
    ) {
        self.bin_for_frame(frame)
            .deletions
            .push(PendingDeletion::ComputePipeline(handle));
    }

    pub fn delete_staging_bin(&mut self, frame: u64, buffer: crate::vk::VulkanBuffer) {
        self.bin_for_frame(frame)
            .deletions
            .push(PendingDeletion::StagingBin(buffer));
    }

    /// Marks frame slot `slot` as retired on the GPU as of `current_frame`:
    /// clears bit `slot` on every bin recorded before `current_frame`.
    /// Called once the fence that accompanied that frame slot's submission
    /// has signalled.
    pub fn deref_frame_index(&mut self, slot: u64, current_frame: u64) {
        let slot = slot as usize;
        for bin in self.bins.iter_mut() {
            if bin.frame < current_frame && slot < bin.live_slots.len() {
                bin.live_slots[slot] = false;
            }
        }
    }

    /// Releases every bin whose bit-vector has been fully cleared by
    /// [`Self::deref_frame_index`]. Call once per frame, after the frame
    /// counter has advanced and any retired frame slots have been
    /// dereffed.
    pub fn collect(&mut self, resources: &mut crate::resource_manager::ResourceManager) {
        while let Some(bin) = self.bins.front() {
            if !bin.is_deletable() {
                break;
            }
            let bin = self.bins.pop_front().unwrap();
            for deletion in bin.deletions {
                match deletion {
                    PendingDeletion::Buffer(h) => resources.delete(h),
                    PendingDeletion::Texture(h) => resources.delete(h),
                    PendingDeletion::TextureView(h) => resources.delete(h),
                    PendingDeletion::Sampler(h) => resources.delete(h),
                    PendingDeletion::BindGroup(h) => resources.delete(h),
                    PendingDeletion::GraphicsPipeline(h) => resources.delete(h),
                    PendingDeletion::ComputePipeline(h) => resources.delete(h),
                    PendingDeletion::StagingBin(buffer) => drop(buffer),
                }
            }
        }
    }

    /// Forces every pending bin to release regardless of its bit-vector.
    /// Used on device teardown, once the caller has already waited for the
    /// device to go idle.
    pub fn collect_all(&mut self, resources: &mut crate::resource_manager::ResourceManager) {
        for bin in self.bins.iter_mut() {
            bin.live_slots.iter_mut().for_each(|live| *live = false);
        }
        self.collect(resources);
    }

    pub fn pending_count(&self) -> usize {
        self.bins.iter().map(|bin| bin.deletions.len()).sum()
    }

    /// Number of bins whose bit-vector is currently fully cleared. Split
    /// out from [`Self::collect`] so the binning/deref logic can be unit
    /// tested without constructing real backend resources.
    fn ready_bin_count(&self) -> usize {
        self.bins.iter().take_while(|bin| bin.is_deletable()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deletion_bin_is_not_ready_until_every_frame_slot_has_been_dereffed() {
        let mut deleter = ResourceDeleter::new(2);
        let handle = Handle::<crate::resource_manager::BufferTag>::null();
        deleter.delete_buffer(0, handle);

        assert_eq!(deleter.ready_bin_count(), 0);
        deleter.deref_frame_index(0, 1);
        assert_eq!(deleter.ready_bin_count(), 0);
        deleter.deref_frame_index(1, 2);
        assert_eq!(deleter.ready_bin_count(), 1);
    }

    #[test]
    fn elapsed_frame_count_alone_never_makes_a_bin_ready() {
        let mut deleter = ResourceDeleter::new(2);
        let handle = Handle::<crate::resource_manager::BufferTag>::null();
        deleter.delete_buffer(0, handle);
        // No deref_frame_index call at all, however far the frame counter
        // has advanced: the bin must stay pinned, since nothing has told
        // the deleter the GPU is actually done with it.
        assert_eq!(deleter.ready_bin_count(), 0);
        let mut resources = crate::resource_manager::ResourceManager::new();
        deleter.collect(&mut resources);
        assert_eq!(deleter.pending_count(), 1);
    }

    #[test]
    fn deref_frame_index_does_not_clear_bins_recorded_on_or_after_current_frame() {
        let mut deleter = ResourceDeleter::new(1);
        let handle = Handle::<crate::resource_manager::BufferTag>::null();
        deleter.delete_buffer(5, handle);
        // A frame slot dereffed "as of" frame 5 itself must not retire a
        // bin recorded during frame 5 — that bin's own submission may not
        // have happened yet.
        deleter.deref_frame_index(0, 5);
        assert_eq!(deleter.ready_bin_count(), 0);
        deleter.deref_frame_index(0, 6);
        assert_eq!(deleter.ready_bin_count(), 1);
    }

    #[test]
    fn deletions_on_the_same_frame_share_a_bin() {
        let mut deleter = ResourceDeleter::new(1);
        let handle = Handle::<crate::resource_manager::BufferTag>::null();
        deleter.delete_buffer(5, handle);
        deleter.delete_buffer(5, handle);
        assert_eq!(deleter.bins.len(), 1);
        assert_eq!(deleter.pending_count(), 2);
    }

    #[test]
    fn deletions_on_different_frames_create_separate_bins() {
        let mut deleter = ResourceDeleter::new(1);
        let handle = Handle::<crate::resource_manager::BufferTag>::null();
        deleter.delete_buffer(0, handle);
        deleter.delete_buffer(1, handle);
        assert_eq!(deleter.bins.len(), 2);
    }

    #[test]
    fn collect_all_ignores_outstanding_frame_slots() {
        let mut deleter = ResourceDeleter::new(4);
        let handle = Handle::<crate::resource_manager::BufferTag>::null();
        deleter.delete_buffer(0, handle);
        let mut resources = crate::resource_manager::ResourceManager::new();
        deleter.collect_all(&mut resources);
        assert_eq!(deleter.pending_count(), 0);
    }
}
