//! The fixed-function and programmable state for rasterized draws.

use ash::vk;

use crate::device::GpuDevice;
use crate::error::Result;
use crate::handle::Handle;
use crate::pipeline_layout::GpuPipelineLayout;
use crate::resource_manager::GraphicsPipelineTag;
use crate::shader_module::GpuShaderModule;
use crate::types::{
    BlendFactor, BlendOp, CompareOperation, CullModeFlags, Format, FrontFace, PolygonMode,
    PrimitiveTopology, ShaderStageFlags,
};

pub struct ShaderStageOptions<'a> {
    pub module: &'a GpuShaderModule,
    pub stage: ShaderStageFlags,
    pub entry_point: &'a str,
}

pub struct VertexAttributeOptions {
    pub location: u32,
    pub binding: u32,
    pub format: Format,
    pub offset: u32,
}

pub struct VertexBindingOptions {
    pub binding: u32,
    pub stride: u32,
    pub per_instance: bool,
}

pub struct ColorAttachmentBlendOptions {
    pub format: Format,
    pub blend_enable: bool,
    pub src_color_factor: BlendFactor,
    pub dst_color_factor: BlendFactor,
    pub color_op: BlendOp,
    pub src_alpha_factor: BlendFactor,
    pub dst_alpha_factor: BlendFactor,
    pub alpha_op: BlendOp,
}

pub struct GraphicsPipelineOptions<'a> {
    pub layout: &'a GpuPipelineLayout,
    pub render_pass: vk::RenderPass,
    pub stages: &'a [ShaderStageOptions<'a>],
    pub vertex_bindings: &'a [VertexBindingOptions],
    pub vertex_attributes: &'a [VertexAttributeOptions],
    pub topology: PrimitiveTopology,
    pub polygon_mode: PolygonMode,
    pub cull_mode: CullModeFlags,
    pub front_face: FrontFace,
    pub depth_test_enable: bool,
    pub depth_write_enable: bool,
    pub depth_compare: CompareOperation,
    pub color_attachments: &'a [ColorAttachmentBlendOptions],
    pub samples: u32,
}

pub struct GpuGraphicsPipeline {
    device: GpuDevice,
    handle: Handle<GraphicsPipelineTag>,
}

impl GpuGraphicsPipeline {
    pub(crate) fn create(device: GpuDevice, options: GraphicsPipelineOptions<'_>) -> Result<Self> {
        let resources = device.context.resources.lock();
        let layout_raw = resources
            .get(options.layout.handle())
            .expect("pipeline layout handle valid for the lifetime of GpuPipelineLayout")
            .raw();
        let stage_modules: Vec<vk::ShaderModule> = options
            .stages
            .iter()
            .map(|stage| {
                resources
                    .get(stage.module.handle())
                    .expect("shader module handle valid for the lifetime of GpuShaderModule")
                    .raw()
            })
            .collect();
        drop(resources);

        let stages: Vec<crate::vk::pipeline::ShaderStage<'_>> = options
            .stages
            .iter()
            .zip(stage_modules.iter())
            .map(|(stage, &module)| crate::vk::pipeline::ShaderStage {
                module,
                stage: stage.stage,
                entry_point: stage.entry_point,
            })
            .collect();

        let vertex_bindings: Vec<crate::vk::pipeline::VertexBinding> = options
            .vertex_bindings
            .iter()
            .map(|binding| crate::vk::pipeline::VertexBinding {
                binding: binding.binding,
                stride: binding.stride,
                per_instance: binding.per_instance,
            })
            .collect();
        let vertex_attributes: Vec<crate::vk::pipeline::VertexAttribute> = options
            .vertex_attributes
            .iter()
            .map(|attribute| crate::vk::pipeline::VertexAttribute {
                location: attribute.location,
                binding: attribute.binding,
                format: attribute.format,
                offset: attribute.offset,
            })
            .collect();
        let color_attachments: Vec<crate::vk::pipeline::ColorAttachmentBlend> = options
            .color_attachments
            .iter()
            .map(|attachment| crate::vk::pipeline::ColorAttachmentBlend {
                format: attachment.format,
                blend_enable: attachment.blend_enable,
                src_color_factor: attachment.src_color_factor,
                dst_color_factor: attachment.dst_color_factor,
                color_op: attachment.color_op,
                src_alpha_factor: attachment.src_alpha_factor,
                dst_alpha_factor: attachment.dst_alpha_factor,
                alpha_op: attachment.alpha_op,
            })
            .collect();

        let descriptor = crate::vk::pipeline::GraphicsPipelineDescriptor {
            layout: layout_raw,
            render_pass: options.render_pass,
            stages: &stages,
            vertex_bindings: &vertex_bindings,
            vertex_attributes: &vertex_attributes,
            topology: options.topology,
            polygon_mode: options.polygon_mode,
            cull_mode: options.cull_mode,
            front_face: options.front_face,
            depth_test_enable: options.depth_test_enable,
            depth_write_enable: options.depth_write_enable,
            depth_compare: options.depth_compare,
            color_attachments: &color_attachments,
            samples: options.samples,
        };

        let pipeline = crate::vk::pipeline::VulkanGraphicsPipeline::new(device.shared(), &descriptor)?;
        let handle = device.context.resources.lock().create::<GraphicsPipelineTag>(pipeline);
        Ok(Self { device, handle })
    }

    pub fn is_valid(&self) -> bool {
        self.handle.is_valid()
    }

    pub fn handle(&self) -> Handle<GraphicsPipelineTag> {
        self.handle
    }
}

impl Drop for GpuGraphicsPipeline {
    fn drop(&mut self) {
        let frame = self.device.current_frame();
        self.device
            .deleter()
            .lock()
            .delete_graphics_pipeline(frame, self.handle);
    }
}
