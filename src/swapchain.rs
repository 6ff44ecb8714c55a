//! The chain of presentable images backing a window surface.

use crate::device::GpuDevice;
use crate::error::{AcquireImageResult, PresentResult, Result};
use crate::handle::Handle;
use crate::queue::GpuQueue;
use crate::resource_manager::{SurfaceTag, TextureTag};
use crate::sync::GpuSemaphore;
use crate::texture::GpuTexture;
use crate::types::{Extent2D, Format};
pub use crate::vk::surface::SurfaceConfiguration;

pub struct GpuSwapchain {
    device: GpuDevice,
    surface_handle: Handle<SurfaceTag>,
    format: Format,
    extent: Extent2D,
}

impl GpuSwapchain {
    pub(crate) fn create(
        device: GpuDevice,
        surface_handle: Handle<SurfaceTag>,
        config: SurfaceConfiguration,
    ) -> Result<Self> {
        let shared = device.shared();
        let physical_device = shared.physical_device;
        device
            .context
            .resources
            .lock()
            .get_mut(surface_handle)
            .expect("surface handle valid for the lifetime of the swapchain")
            .configure(&shared, physical_device, &config)?;

        Ok(Self {
            device,
            surface_handle,
            format: config.format,
            extent: config.extent,
        })
    }

    pub fn format(&self) -> Format {
        self.format
    }

    pub fn extent(&self) -> Extent2D {
        self.extent
    }

    pub fn reconfigure(&mut self, config: SurfaceConfiguration) -> Result<()> {
        let shared = self.device.shared();
        let physical_device = shared.physical_device;
        self.device
            .context
            .resources
            .lock()
            .get_mut(self.surface_handle)
            .expect("surface handle valid for the lifetime of the swapchain")
            .configure(&shared, physical_device, &config)?;
        self.format = config.format;
        self.extent = config.extent;
        Ok(())
    }

    /// Acquires the next presentable image, signalling `signal_semaphore`
    /// once it is safe to render into. The returned [`GpuTexture`] is a
    /// swapchain-owned wrapper; dropping it does not destroy the image.
    pub fn acquire_next_texture(
        &self,
        timeout_ns: u64,
        signal_semaphore: &GpuSemaphore,
    ) -> Result<(AcquireImageResult, Option<GpuTexture>, u32)> {
        let resources = self.device.context.resources.lock();
        let semaphore_raw = resources
            .get(signal_semaphore.handle())
            .expect("semaphore handle valid for the lifetime of GpuSemaphore")
            .raw();
        let (status, texture, index) = resources
            .get(self.surface_handle)
            .expect("surface handle valid for the lifetime of the swapchain")
            .acquire_texture(timeout_ns, semaphore_raw)?;
        drop(resources);

        let texture = texture.map(|vulkan_texture| {
            let handle = self
                .device
                .context
                .resources
                .lock()
                .create::<TextureTag>(vulkan_texture);
            GpuTexture::new(self.device.clone(), handle)
        });
        Ok((status, texture, index))
    }

    pub fn present(
        &self,
        queue: &GpuQueue,
        image_index: u32,
        wait_semaphore: &GpuSemaphore,
    ) -> Result<PresentResult> {
        let resources = self.device.context.resources.lock();
        let swapchain_raw = resources
            .get(self.surface_handle)
            .expect("surface handle valid for the lifetime of the swapchain")
            .swapchain_raw()
            .expect("swapchain configured before present");
        let wait_raw = resources
            .get(wait_semaphore.handle())
            .expect("semaphore handle valid for the lifetime of GpuSemaphore")
            .raw();
        drop(resources);
        queue.present_raw(&[swapchain_raw], &[image_index], &[wait_raw])
    }
}

impl Drop for GpuSwapchain {
    fn drop(&mut self) {
        let shared = self.device.shared();
        if let Some(surface) = self.device.context.resources.lock().get_mut(self.surface_handle) {
            surface.unconfigure(&shared);
        }
    }
}
