//! A device queue: where recorded command buffers are submitted and
//! swapchain images are presented.
//!
//! `upload_buffer_data`/`upload_texture_data` are grounded on
//! `examples/original_source/src/KDGpu_KDGui/example_engine_layer.cpp`'s
//! `uploadBufferData`/`uploadTextureData`: both copy into the device's
//! staging pool, record and submit a transfer on this queue, and hand back
//! an `UploadStagingBuffer` the caller holds until its fence signals,
//! rather than blocking the calling thread.

use ash::vk;

use crate::buffer::GpuBuffer;
use crate::command_buffer::GpuCommandBuffer;
use crate::device::GpuDevice;
use crate::error::{PresentResult, Result};
use crate::sync::{GpuFence, GpuSemaphore};
use crate::texture::GpuTexture;
use crate::types::{CommandBufferLevel, Extent3D, TextureLayout};

pub struct SubmitInfo<'a> {
    pub command_buffers: &'a [&'a GpuCommandBuffer],
    pub wait_semaphores: &'a [(&'a GpuSemaphore, vk::PipelineStageFlags)],
    pub signal_semaphores: &'a [&'a GpuSemaphore],
    pub fence: Option<&'a GpuFence>,
}

pub struct BufferUploadOptions<'a> {
    pub destination_buffer: &'a GpuBuffer,
    pub dst_stages: vk::PipelineStageFlags,
    pub dst_access: vk::AccessFlags,
    pub data: &'a [u8],
    pub dst_offset: u64,
}

pub struct BufferImageCopyRegion {
    pub buffer_offset: u64,
    pub mip_level: u32,
    pub array_layer: u32,
    pub image_extent: Extent3D,
}

pub struct TextureUploadOptions<'a> {
    pub destination_texture: &'a GpuTexture,
    pub dst_stages: vk::PipelineStageFlags,
    pub dst_access: vk::AccessFlags,
    pub data: &'a [u8],
    pub old_layout: TextureLayout,
    pub new_layout: TextureLayout,
    pub regions: &'a [BufferImageCopyRegion],
}

/// Keeps the transient upload command buffer (and its pool) alive until
/// `fence` signals; the caller's `release_staging_buffers`-style sweep
/// drops these once they're done, the way
/// `ExampleEngineLayer::releaseStagingBuffers` does.
pub struct UploadStagingBuffer {
    _command_buffer: crate::vk::command::VulkanCommandBuffer,
    pub fence: GpuFence,
}

pub struct GpuQueue {
    device: GpuDevice,
    inner: crate::vk::queue::VulkanQueue,
}

impl GpuQueue {
    pub(crate) fn new(device: GpuDevice, family_index: u32) -> Self {
        let shared = device.shared();
        let inner = crate::vk::queue::VulkanQueue::new(shared, family_index, 0);
        Self { device, inner }
    }

    pub fn family_index(&self) -> u32 {
        self.inner.family_index()
    }

    pub fn submit(&self, info: &SubmitInfo<'_>) -> Result<()> {
        let resources = self.device.context.resources.lock();
        let command_buffers: Vec<vk::CommandBuffer> = info
            .command_buffers
            .iter()
            .map(|buffer| {
                resources
                    .get(buffer.handle())
                    .expect("command buffer handle valid for the lifetime of GpuCommandBuffer")
                    .raw()
            })
            .collect();
        let wait_semaphores: Vec<(vk::Semaphore, vk::PipelineStageFlags)> = info
            .wait_semaphores
            .iter()
            .map(|(semaphore, stage)| {
                let raw = resources
                    .get(semaphore.handle())
                    .expect("semaphore handle valid for the lifetime of GpuSemaphore")
                    .raw();
                (raw, *stage)
            })
            .collect();
        let signal_semaphores: Vec<vk::Semaphore> = info
            .signal_semaphores
            .iter()
            .map(|semaphore| {
                resources
                    .get(semaphore.handle())
                    .expect("semaphore handle valid for the lifetime of GpuSemaphore")
                    .raw()
            })
            .collect();
        let fence = info.fence.map(|fence| {
            resources
                .get(fence.handle())
                .expect("fence handle valid for the lifetime of GpuFence")
        });

        self.inner.submit(&crate::vk::queue::SubmitOptions {
            command_buffers: &command_buffers,
            wait_semaphores: &wait_semaphores,
            signal_semaphores: &signal_semaphores,
            fence,
        })
    }

    pub(crate) fn present_raw(
        &self,
        swapchains: &[vk::SwapchainKHR],
        image_indices: &[u32],
        wait_semaphores: &[vk::Semaphore],
    ) -> Result<PresentResult> {
        self.inner.present(&crate::vk::queue::PresentOptions {
            swapchains,
            image_indices,
            wait_semaphores,
        })
    }

    pub fn wait_idle(&self) -> Result<()> {
        self.inner.wait_idle()
    }

    /// Copies `options.data` into the device's staging pool, then records
    /// and submits a transfer that copies it into `options.destination_buffer`
    /// and barriers it into `options.dst_stages`/`options.dst_access`. Does
    /// not block; poll or wait on the returned fence.
    pub fn upload_buffer_data(&self, options: BufferUploadOptions<'_>) -> Result<UploadStagingBuffer> {
        let shared = self.device.shared();
        let frame = self.device.current_frame();
        let allocation = self.device.staging.lock().upload(frame, options.data, 4)?;
        let staging_raw = self.device.staging.lock().buffer_raw(&allocation);

        let command_buffer =
            crate::vk::command::VulkanCommandBuffer::new(shared.clone(), self.family_index(), CommandBufferLevel::Primary)?;
        let recorder = crate::vk::command::VulkanCommandRecorder::begin(shared, command_buffer.raw())?;

        let dst_raw = {
            let resources = self.device.context.resources.lock();
            resources
                .get(options.destination_buffer.handle())
                .expect("buffer handle valid for the lifetime of GpuBuffer")
                .raw()
        };

        recorder.copy_buffer(
            staging_raw,
            dst_raw,
            &[vk::BufferCopy {
                src_offset: allocation.offset,
                dst_offset: options.dst_offset,
                size: allocation.size,
            }],
        );
        recorder.buffer_barrier(
            dst_raw,
            vk::PipelineStageFlags::TRANSFER,
            options.dst_stages,
            vk::AccessFlags::TRANSFER_WRITE,
            options.dst_access,
        );
        recorder.end()?;

        self.submit_upload(command_buffer)
    }

    /// Same as [`Self::upload_buffer_data`] but blocks on the queue until
    /// the transfer completes, per the original's `waitForUploadBufferData`.
    pub fn wait_for_upload_buffer_data(&self, options: BufferUploadOptions<'_>) -> Result<()> {
        let staging = self.upload_buffer_data(options)?;
        staging.fence.wait(u64::MAX)
    }

    /// Copies `options.data` into the staging pool, then records and
    /// submits a transfer that lays out `options.destination_texture` for
    /// a copy, copies each region, and transitions it to `options.new_layout`
    /// while barriering into `options.dst_stages`/`options.dst_access`.
    pub fn upload_texture_data(&self, options: TextureUploadOptions<'_>) -> Result<UploadStagingBuffer> {
        let shared = self.device.shared();
        let frame = self.device.current_frame();
        let allocation = self.device.staging.lock().upload(frame, options.data, 4)?;
        let staging_raw = self.device.staging.lock().buffer_raw(&allocation);

        let command_buffer =
            crate::vk::command::VulkanCommandBuffer::new(shared.clone(), self.family_index(), CommandBufferLevel::Primary)?;
        let recorder = crate::vk::command::VulkanCommandRecorder::begin(shared, command_buffer.raw())?;

        let dst_raw = {
            let resources = self.device.context.resources.lock();
            resources
                .get(options.destination_texture.handle())
                .expect("texture handle valid for the lifetime of GpuTexture")
                .raw()
        };

        recorder.image_barrier(
            dst_raw,
            crate::types::TextureAspectFlags::COLOR,
            options.old_layout,
            TextureLayout::TransferDstOptimal,
            vk::PipelineStageFlags::TOP_OF_PIPE,
            vk::PipelineStageFlags::TRANSFER,
            vk::AccessFlags::empty(),
            vk::AccessFlags::TRANSFER_WRITE,
        );

        let vk_regions: Vec<vk::BufferImageCopy> = options
            .regions
            .iter()
            .map(|region| vk::BufferImageCopy {
                buffer_offset: allocation.offset + region.buffer_offset,
                buffer_row_length: 0,
                buffer_image_height: 0,
                image_subresource: vk::ImageSubresourceLayers {
                    aspect_mask: vk::ImageAspectFlags::COLOR,
                    mip_level: region.mip_level,
                    base_array_layer: region.array_layer,
                    layer_count: 1,
                },
                image_offset: vk::Offset3D::default(),
                image_extent: vk::Extent3D {
                    width: region.image_extent.width,
                    height: region.image_extent.height,
                    depth: region.image_extent.depth,
                },
            })
            .collect();
        recorder.copy_buffer_to_image(
            staging_raw,
            dst_raw,
            TextureLayout::TransferDstOptimal,
            &vk_regions,
        );

        recorder.image_barrier(
            dst_raw,
            crate::types::TextureAspectFlags::COLOR,
            TextureLayout::TransferDstOptimal,
            options.new_layout,
            vk::PipelineStageFlags::TRANSFER,
            options.dst_stages,
            vk::AccessFlags::TRANSFER_WRITE,
            options.dst_access,
        );
        recorder.end()?;

        self.submit_upload(command_buffer)
    }

    /// Same as [`Self::upload_texture_data`] but blocks until the transfer
    /// completes, per the original's `waitForUploadTextureData`.
    pub fn wait_for_upload_texture_data(&self, options: TextureUploadOptions<'_>) -> Result<()> {
        let staging = self.upload_texture_data(options)?;
        staging.fence.wait(u64::MAX)
    }

    fn submit_upload(
        &self,
        command_buffer: crate::vk::command::VulkanCommandBuffer,
    ) -> Result<UploadStagingBuffer> {
        let fence = self.device.create_fence(false)?;
        let resources = self.device.context.resources.lock();
        let raw_fence = resources
            .get(fence.handle())
            .expect("fence handle valid for the lifetime of GpuFence");
        self.inner.submit(&crate::vk::queue::SubmitOptions {
            command_buffers: &[command_buffer.raw()],
            wait_semaphores: &[],
            signal_semaphores: &[],
            fence: Some(raw_fence),
        })?;
        drop(resources);
        Ok(UploadStagingBuffer {
            _command_buffer: command_buffer,
            fence,
        })
    }

    /// Blits mip level 0 of `texture` down into every other level it was
    /// created with, the way `Texture::generateMipMaps` does: level 0 starts
    /// at `old_layout`, each subsequent level is a linear-filtered blit from
    /// the level above, and every level ends in `TransferSrcOptimal` so the
    /// caller can barrier the whole chain into its eventual read layout in
    /// one step. Blocks on a fence before returning.
    pub fn generate_mip_maps(
        &self,
        texture: &GpuTexture,
        old_layout: TextureLayout,
    ) -> Result<()> {
        generate_mip_maps(self, texture, old_layout)
    }

    pub fn create_relay_semaphore(&self) -> Result<GpuSemaphore> {
        let semaphore = self.inner.create_relay_semaphore()?;
        let handle = self
            .device
            .context
            .resources
            .lock()
            .create::<crate::resource_manager::SemaphoreTag>(semaphore);
        Ok(GpuSemaphore::new(self.device.clone(), handle))
    }
}

/// Free-function body behind [`GpuQueue::generate_mip_maps`] and
/// [`crate::texture::GpuTexture::generate_mip_maps`].
fn generate_mip_maps(queue: &GpuQueue, texture: &GpuTexture, old_layout: TextureLayout) -> Result<()> {
    let shared = queue.device.shared();
    let mip_levels = texture.mip_levels();
    let extent = texture.extent();

    let dst_raw = {
        let resources = queue.device.context.resources.lock();
        resources
            .get(texture.handle())
            .expect("texture handle valid for the lifetime of GpuTexture")
            .raw()
    };

    let command_buffer = crate::vk::command::VulkanCommandBuffer::new(
        shared.clone(),
        queue.family_index(),
        CommandBufferLevel::Primary,
    )?;
    let recorder = crate::vk::command::VulkanCommandRecorder::begin(shared, command_buffer.raw())?;

    recorder.image_barrier(
        dst_raw,
        crate::types::TextureAspectFlags::COLOR,
        old_layout,
        TextureLayout::TransferSrcOptimal,
        vk::PipelineStageFlags::TOP_OF_PIPE,
        vk::PipelineStageFlags::TRANSFER,
        vk::AccessFlags::empty(),
        vk::AccessFlags::TRANSFER_READ,
    );

    let mip_extent = |level: u32| Extent3D {
        width: (extent.width >> level).max(1),
        height: (extent.height >> level).max(1),
        depth: (extent.depth >> level).max(1),
    };

    for level in 1..mip_levels {
        recorder.image_barrier(
            dst_raw,
            crate::types::TextureAspectFlags::COLOR,
            TextureLayout::Undefined,
            TextureLayout::TransferDstOptimal,
            vk::PipelineStageFlags::TOP_OF_PIPE,
            vk::PipelineStageFlags::TRANSFER,
            vk::AccessFlags::empty(),
            vk::AccessFlags::TRANSFER_WRITE,
        );
        recorder.blit_image(
            dst_raw,
            TextureLayout::TransferSrcOptimal,
            level - 1,
            mip_extent(level - 1),
            dst_raw,
            TextureLayout::TransferDstOptimal,
            level,
            mip_extent(level),
        );
        recorder.image_barrier(
            dst_raw,
            crate::types::TextureAspectFlags::COLOR,
            TextureLayout::TransferDstOptimal,
            TextureLayout::TransferSrcOptimal,
            vk::PipelineStageFlags::TRANSFER,
            vk::PipelineStageFlags::TRANSFER,
            vk::AccessFlags::TRANSFER_WRITE,
            vk::AccessFlags::TRANSFER_READ,
        );
    }
    recorder.end()?;

    let fence = queue.device.create_fence(false)?;
    let resources = queue.device.context.resources.lock();
    let raw_fence = resources
        .get(fence.handle())
        .expect("fence handle valid for the lifetime of GpuFence");
    queue.inner.submit(&crate::vk::queue::SubmitOptions {
        command_buffers: &[command_buffer.raw()],
        wait_semaphores: &[],
        signal_semaphores: &[],
        fence: Some(raw_fence),
    })?;
    drop(resources);

    fence.wait(u64::MAX)
}

#[cfg(test)]
mod tests {
    use crate::test_support::test_device;
    use crate::types::CommandBufferLevel;

    #[test]
    #[ignore = "requires vulkan-tests feature and a loadable Vulkan ICD"]
    #[cfg(feature = "vulkan-tests")]
    fn submitting_an_empty_command_buffer_signals_its_fence() {
        let device = test_device();
        let queue = device.graphics_queue();
        let buffer = device
            .create_command_buffer(queue.family_index(), CommandBufferLevel::Primary)
            .expect("command buffer creation");
        buffer.begin().expect("begin recording").end().expect("end recording");

        let fence = device.create_fence(false).expect("fence creation");
        queue
            .submit(&super::SubmitInfo {
                command_buffers: &[&buffer],
                wait_semaphores: &[],
                signal_semaphores: &[],
                fence: Some(&fence),
            })
            .expect("submit");
        fence.wait(u64::MAX).expect("fence wait");
    }

    #[test]
    #[ignore = "requires vulkan-tests feature and a loadable Vulkan ICD"]
    #[cfg(feature = "vulkan-tests")]
    fn graphics_and_transfer_queues_report_their_own_family() {
        let device = test_device();
        let graphics = device.graphics_queue();
        let transfer = device.transfer_queue();
        // Distinct families are not guaranteed on every implementation, but
        // the accessor must at least echo back a stable value.
        assert_eq!(graphics.family_index(), device.graphics_queue().family_index());
        assert_eq!(transfer.family_index(), device.transfer_queue().family_index());
    }

    #[test]
    #[ignore = "requires vulkan-tests feature and a loadable Vulkan ICD"]
    #[cfg(feature = "vulkan-tests")]
    fn waiting_for_an_uploaded_buffer_leaves_its_destination_populated() {
        use ash::vk;
        use crate::types::{BufferUsageFlags, MemoryUsage};

        let device = test_device();
        let queue = device.graphics_queue();
        let destination = device
            .create_buffer(4, BufferUsageFlags::TRANSFER_DST, MemoryUsage::GpuOnly)
            .expect("buffer creation");

        queue
            .wait_for_upload_buffer_data(super::BufferUploadOptions {
                destination_buffer: &destination,
                dst_stages: vk::PipelineStageFlags::TOP_OF_PIPE,
                dst_access: vk::AccessFlags::empty(),
                data: &[1u8, 2, 3, 4],
                dst_offset: 0,
            })
            .expect("upload");
    }
}
