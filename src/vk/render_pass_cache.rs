//! Render pass and framebuffer caches keyed by structural description.
//!
//! Grounded on `wgpu-hal/src/vulkan/mod.rs`'s `DeviceShared::render_passes`
//! / `framebuffers` fields and their `RenderPassKey` / `FramebufferKey`
//! types: a `VkRenderPass` depends only on attachment formats/load-store
//! ops/layouts/sample count/view count (never on the actual image views),
//! so it is cached independently from the `VkFramebuffer`, which does
//! depend on the concrete view handles and extent.

use ash::vk;
use rustc_hash::FxHashMap;

use crate::handle::Handle;
use crate::types::{AttachmentLoadOp, AttachmentStoreOp, Format, ResolveModeFlagBits, TextureLayout};
use crate::vk::conv;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AttachmentKey {
    pub format: Format,
    pub load_op: AttachmentLoadOp,
    pub store_op: AttachmentStoreOp,
    pub initial_layout: TextureLayout,
    pub final_layout: TextureLayout,
    pub resolve_mode: ResolveModeFlagBits,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RenderPassKey {
    pub color_attachments: Vec<AttachmentKey>,
    pub depth_stencil_attachment: Option<AttachmentKey>,
    pub samples: u32,
    pub view_count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FramebufferKey {
    pub render_pass: vk::RenderPass,
    pub attachments: Vec<Handle<crate::resource_manager::TextureViewTag>>,
    pub width: u32,
    pub height: u32,
    pub layers: u32,
}

#[derive(Default)]
pub struct RenderPassCache {
    render_passes: FxHashMap<RenderPassKey, vk::RenderPass>,
    framebuffers: FxHashMap<FramebufferKey, vk::Framebuffer>,
}

impl RenderPassCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn render_pass(
        &mut self,
        device: &ash::Device,
        key: &RenderPassKey,
    ) -> crate::error::Result<vk::RenderPass> {
        if let Some(pass) = self.render_passes.get(key) {
            return Ok(*pass);
        }

        let mut attachments = Vec::new();
        let mut color_refs = Vec::new();
        for attachment in &key.color_attachments {
            let index = attachments.len() as u32;
            attachments.push(build_description(attachment, key.samples));
            color_refs.push(vk::AttachmentReference {
                attachment: index,
                layout: conv::image_layout(attachment.initial_layout),
            });
        }

        let mut depth_ref = None;
        if let Some(attachment) = &key.depth_stencil_attachment {
            let index = attachments.len() as u32;
            attachments.push(build_description(attachment, key.samples));
            depth_ref = Some(vk::AttachmentReference {
                attachment: index,
                layout: conv::image_layout(attachment.initial_layout),
            });
        }

        // A color attachment with a resolve mode gets a second, single-sample
        // attachment description that the multisampled one resolves into.
        // `pResolveAttachments` must be the same length as `pColorAttachments`
        // when present, with `VK_ATTACHMENT_UNUSED` standing in for slots
        // that don't resolve.
        let mut resolve_refs = Vec::new();
        let mut any_resolve = false;
        for attachment in &key.color_attachments {
            if attachment.resolve_mode == ResolveModeFlagBits::None {
                resolve_refs.push(vk::AttachmentReference {
                    attachment: vk::ATTACHMENT_UNUSED,
                    layout: vk::ImageLayout::UNDEFINED,
                });
                continue;
            }
            any_resolve = true;
            let index = attachments.len() as u32;
            attachments.push(
                vk::AttachmentDescription::default()
                    .format(conv::format(attachment.format))
                    .samples(vk::SampleCountFlags::TYPE_1)
                    .load_op(vk::AttachmentLoadOp::DONT_CARE)
                    .store_op(conv::store_op(attachment.store_op))
                    .stencil_load_op(vk::AttachmentLoadOp::DONT_CARE)
                    .stencil_store_op(vk::AttachmentStoreOp::DONT_CARE)
                    .initial_layout(vk::ImageLayout::UNDEFINED)
                    .final_layout(conv::image_layout(attachment.final_layout)),
            );
            resolve_refs.push(vk::AttachmentReference {
                attachment: index,
                layout: vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL,
            });
        }

        let mut subpass = vk::SubpassDescription::default()
            .pipeline_bind_point(vk::PipelineBindPoint::GRAPHICS)
            .color_attachments(&color_refs);
        if let Some(depth_ref) = depth_ref.as_ref() {
            subpass = subpass.depth_stencil_attachment(depth_ref);
        }
        if any_resolve {
            subpass = subpass.resolve_attachments(&resolve_refs);
        }

        let info = vk::RenderPassCreateInfo::default()
            .attachments(&attachments)
            .subpasses(std::slice::from_ref(&subpass));

        let raw = unsafe { device.create_render_pass(&info, None)? };
        self.render_passes.insert(key.clone(), raw);
        Ok(raw)
    }

    pub fn framebuffer(
        &mut self,
        device: &ash::Device,
        key: &FramebufferKey,
        views: &[vk::ImageView],
    ) -> crate::error::Result<vk::Framebuffer> {
        if let Some(fb) = self.framebuffers.get(key) {
            return Ok(*fb);
        }

        let info = vk::FramebufferCreateInfo::default()
            .render_pass(key.render_pass)
            .attachments(views)
            .width(key.width)
            .height(key.height)
            .layers(key.layers);
        let raw = unsafe { device.create_framebuffer(&info, None)? };
        self.framebuffers.insert(key.clone(), raw);
        Ok(raw)
    }

    /// Drops every cached framebuffer referencing `view`; called when a
    /// texture view is destroyed so the cache cannot hand back a
    /// framebuffer pointing at a freed `VkImageView`.
    pub fn invalidate_view(
        &mut self,
        device: &ash::Device,
        view: Handle<crate::resource_manager::TextureViewTag>,
    ) {
        let stale: Vec<FramebufferKey> = self
            .framebuffers
            .keys()
            .filter(|key| key.attachments.contains(&view))
            .cloned()
            .collect();
        for key in stale {
            if let Some(raw) = self.framebuffers.remove(&key) {
                unsafe { device.destroy_framebuffer(raw, None) };
            }
        }
    }

    pub fn destroy_all(&mut self, device: &ash::Device) {
        for (_, raw) in self.framebuffers.drain() {
            unsafe { device.destroy_framebuffer(raw, None) };
        }
        for (_, raw) in self.render_passes.drain() {
            unsafe { device.destroy_render_pass(raw, None) };
        }
    }
}

fn build_description(attachment: &AttachmentKey, samples: u32) -> vk::AttachmentDescription {
    vk::AttachmentDescription::default()
        .format(conv::format(attachment.format))
        .samples(vk::SampleCountFlags::from_raw(samples.max(1)))
        .load_op(conv::load_op(attachment.load_op))
        .store_op(conv::store_op(attachment.store_op))
        .stencil_load_op(conv::load_op(attachment.load_op))
        .stencil_store_op(conv::store_op(attachment.store_op))
        .initial_layout(conv::image_layout(attachment.initial_layout))
        .final_layout(conv::image_layout(attachment.final_layout))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attachment_keys_with_equal_fields_are_equal() {
        let a = AttachmentKey {
            format: Format::R8g8b8a8Unorm,
            load_op: AttachmentLoadOp::Clear,
            store_op: AttachmentStoreOp::Store,
            initial_layout: TextureLayout::Undefined,
            final_layout: TextureLayout::ColorAttachmentOptimal,
            resolve_mode: ResolveModeFlagBits::None,
        };
        let b = a;
        assert_eq!(a, b);
    }

    #[test]
    fn render_pass_keys_differ_on_sample_count() {
        let base = RenderPassKey {
            color_attachments: vec![],
            depth_stencil_attachment: None,
            samples: 1,
            view_count: 1,
        };
        let other = RenderPassKey {
            samples: 4,
            ..base.clone()
        };
        assert_ne!(base, other);
    }
}
