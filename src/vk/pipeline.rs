//! Pipeline layouts and graphics/compute/ray-tracing pipelines.

use std::ffi::CString;
use std::sync::Arc;

use ash::vk;

use crate::types::{
    BlendFactor, BlendOp, CompareOperation, CullModeFlags, Format, FrontFace, PolygonMode,
    PrimitiveTopology, PushConstantRange, ShaderStageFlags,
};
use crate::vk::conv;
use crate::vk::device::DeviceShared;

pub struct VulkanPipelineLayout {
    device: Arc<DeviceShared>,
    pub(crate) raw: vk::PipelineLayout,
}

impl VulkanPipelineLayout {
    pub fn new(
        device: Arc<DeviceShared>,
        set_layouts: &[vk::DescriptorSetLayout],
        push_constant_ranges: &[PushConstantRange],
    ) -> crate::error::Result<Self> {
        let ranges: Vec<vk::PushConstantRange> = push_constant_ranges
            .iter()
            .map(|range| vk::PushConstantRange {
                stage_flags: conv::shader_stage_flags(range.shader_stages),
                offset: range.offset,
                size: range.size,
            })
            .collect();

        let info = vk::PipelineLayoutCreateInfo::default()
            .set_layouts(set_layouts)
            .push_constant_ranges(&ranges);
        let raw = unsafe { device.raw.create_pipeline_layout(&info, None)? };
        Ok(Self { device, raw })
    }

    pub fn raw(&self) -> vk::PipelineLayout {
        self.raw
    }
}

impl Drop for VulkanPipelineLayout {
    fn drop(&mut self) {
        unsafe { self.device.raw.destroy_pipeline_layout(self.raw, None) };
    }
}

pub struct ShaderStage<'a> {
    pub module: vk::ShaderModule,
    pub stage: ShaderStageFlags,
    pub entry_point: &'a str,
}

pub struct VertexAttribute {
    pub location: u32,
    pub binding: u32,
    pub format: Format,
    pub offset: u32,
}

pub struct VertexBinding {
    pub binding: u32,
    pub stride: u32,
    pub per_instance: bool,
}

pub struct ColorAttachmentBlend {
    pub format: Format,
    pub blend_enable: bool,
    pub src_color_factor: BlendFactor,
    pub dst_color_factor: BlendFactor,
    pub color_op: BlendOp,
    pub src_alpha_factor: BlendFactor,
    pub dst_alpha_factor: BlendFactor,
    pub alpha_op: BlendOp,
}

pub struct GraphicsPipelineDescriptor<'a> {
    pub layout: vk::PipelineLayout,
    pub render_pass: vk::RenderPass,
    pub stages: &'a [ShaderStage<'a>],
    pub vertex_bindings: &'a [VertexBinding],
    pub vertex_attributes: &'a [VertexAttribute],
    pub topology: PrimitiveTopology,
    pub polygon_mode: PolygonMode,
    pub cull_mode: CullModeFlags,
    pub front_face: FrontFace,
    pub depth_test_enable: bool,
    pub depth_write_enable: bool,
    pub depth_compare: CompareOperation,
    pub color_attachments: &'a [ColorAttachmentBlend],
    pub samples: u32,
}

pub struct VulkanGraphicsPipeline {
    device: Arc<DeviceShared>,
    pub(crate) raw: vk::Pipeline,
}

impl VulkanGraphicsPipeline {
    pub fn new(
        device: Arc<DeviceShared>,
        desc: &GraphicsPipelineDescriptor<'_>,
    ) -> crate::error::Result<Self> {
        let entry_points: Vec<CString> = desc
            .stages
            .iter()
            .map(|stage| CString::new(stage.entry_point).unwrap_or_default())
            .collect();

        let stage_infos: Vec<vk::PipelineShaderStageCreateInfo> = desc
            .stages
            .iter()
            .zip(entry_points.iter())
            .map(|(stage, entry_point)| {
                vk::PipelineShaderStageCreateInfo::default()
                    .stage(conv::shader_stage_flags(stage.stage).into())
                    .module(stage.module)
                    .name(entry_point)
            })
            .collect();

        let bindings: Vec<vk::VertexInputBindingDescription> = desc
            .vertex_bindings
            .iter()
            .map(|binding| vk::VertexInputBindingDescription {
                binding: binding.binding,
                stride: binding.stride,
                input_rate: if binding.per_instance {
                    vk::VertexInputRate::INSTANCE
                } else {
                    vk::VertexInputRate::VERTEX
                },
            })
            .collect();
        let attributes: Vec<vk::VertexInputAttributeDescription> = desc
            .vertex_attributes
            .iter()
            .map(|attribute| vk::VertexInputAttributeDescription {
                location: attribute.location,
                binding: attribute.binding,
                format: conv::format(attribute.format),
                offset: attribute.offset,
            })
            .collect();
        let vertex_input = vk::PipelineVertexInputStateCreateInfo::default()
            .vertex_binding_descriptions(&bindings)
            .vertex_attribute_descriptions(&attributes);

        let input_assembly = vk::PipelineInputAssemblyStateCreateInfo::default()
            .topology(conv::primitive_topology(desc.topology));

        let viewport_state = vk::PipelineViewportStateCreateInfo::default()
            .viewport_count(1)
            .scissor_count(1);

        let rasterization = vk::PipelineRasterizationStateCreateInfo::default()
            .polygon_mode(conv::polygon_mode(desc.polygon_mode))
            .cull_mode(conv::cull_mode(desc.cull_mode))
            .front_face(conv::front_face(desc.front_face))
            .line_width(1.0);

        let multisample = vk::PipelineMultisampleStateCreateInfo::default()
            .rasterization_samples(vk::SampleCountFlags::from_raw(desc.samples.max(1)));

        let depth_stencil = vk::PipelineDepthStencilStateCreateInfo::default()
            .depth_test_enable(desc.depth_test_enable)
            .depth_write_enable(desc.depth_write_enable)
            .depth_compare_op(conv::compare_op(desc.depth_compare));

        let attachments: Vec<vk::PipelineColorBlendAttachmentState> = desc
            .color_attachments
            .iter()
            .map(|attachment| {
                vk::PipelineColorBlendAttachmentState::default()
                    .blend_enable(attachment.blend_enable)
                    .src_color_blend_factor(conv::blend_factor(attachment.src_color_factor))
                    .dst_color_blend_factor(conv::blend_factor(attachment.dst_color_factor))
                    .color_blend_op(conv::blend_op(attachment.color_op))
                    .src_alpha_blend_factor(conv::blend_factor(attachment.src_alpha_factor))
                    .dst_alpha_blend_factor(conv::blend_factor(attachment.dst_alpha_factor))
                    .alpha_blend_op(conv::blend_op(attachment.alpha_op))
                    .color_write_mask(vk::ColorComponentFlags::RGBA)
            })
            .collect();
        let color_blend =
            vk::PipelineColorBlendStateCreateInfo::default().attachments(&attachments);

        let dynamic_states = [vk::DynamicState::VIEWPORT, vk::DynamicState::SCISSOR];
        let dynamic_state =
            vk::PipelineDynamicStateCreateInfo::default().dynamic_states(&dynamic_states);

        let info = vk::GraphicsPipelineCreateInfo::default()
            .stages(&stage_infos)
            .vertex_input_state(&vertex_input)
            .input_assembly_state(&input_assembly)
            .viewport_state(&viewport_state)
            .rasterization_state(&rasterization)
            .multisample_state(&multisample)
            .depth_stencil_state(&depth_stencil)
            .color_blend_state(&color_blend)
            .dynamic_state(&dynamic_state)
            .layout(desc.layout)
            .render_pass(desc.render_pass)
            .subpass(0);

        let raw = unsafe {
            device
                .raw
                .create_graphics_pipelines(vk::PipelineCache::null(), &[info], None)
                .map_err(|(_, result)| result)?[0]
        };

        Ok(Self { device, raw })
    }

    pub fn raw(&self) -> vk::Pipeline {
        self.raw
    }
}

impl Drop for VulkanGraphicsPipeline {
    fn drop(&mut self) {
        unsafe { self.device.raw.destroy_pipeline(self.raw, None) };
    }
}

pub struct VulkanComputePipeline {
    device: Arc<DeviceShared>,
    pub(crate) raw: vk::Pipeline,
}

impl VulkanComputePipeline {
    pub fn new(
        device: Arc<DeviceShared>,
        layout: vk::PipelineLayout,
        module: vk::ShaderModule,
        entry_point: &str,
    ) -> crate::error::Result<Self> {
        let entry_point = CString::new(entry_point).unwrap_or_default();
        let stage = vk::PipelineShaderStageCreateInfo::default()
            .stage(vk::ShaderStageFlags::COMPUTE)
            .module(module)
            .name(&entry_point);
        let info = vk::ComputePipelineCreateInfo::default()
            .stage(stage)
            .layout(layout);

        let raw = unsafe {
            device
                .raw
                .create_compute_pipelines(vk::PipelineCache::null(), &[info], None)
                .map_err(|(_, result)| result)?[0]
        };
        Ok(Self { device, raw })
    }

    pub fn raw(&self) -> vk::Pipeline {
        self.raw
    }
}

impl Drop for VulkanComputePipeline {
    fn drop(&mut self) {
        unsafe { self.device.raw.destroy_pipeline(self.raw, None) };
    }
}

/// Ray-tracing pipeline, gated behind `VK_KHR_ray_tracing_pipeline`
/// (SPEC_FULL.md §10 supplements the distilled spec's raster/compute-only
/// scope with the original's ray-tracing module).
pub struct VulkanRayTracingPipeline {
    device: Arc<DeviceShared>,
    pub(crate) raw: vk::Pipeline,
    pub(crate) group_count: u32,
}

impl VulkanRayTracingPipeline {
    pub fn new(
        device: Arc<DeviceShared>,
        layout: vk::PipelineLayout,
        stages: &[ShaderStage<'_>],
        groups: &[vk::RayTracingShaderGroupCreateInfoKHR],
        max_recursion_depth: u32,
        loader: &ash::khr::ray_tracing_pipeline::Device,
    ) -> crate::error::Result<Self> {
        let entry_points: Vec<CString> = stages
            .iter()
            .map(|stage| CString::new(stage.entry_point).unwrap_or_default())
            .collect();
        let stage_infos: Vec<vk::PipelineShaderStageCreateInfo> = stages
            .iter()
            .zip(entry_points.iter())
            .map(|(stage, entry_point)| {
                vk::PipelineShaderStageCreateInfo::default()
                    .stage(conv::shader_stage_flags(stage.stage).into())
                    .module(stage.module)
                    .name(entry_point)
            })
            .collect();

        let info = vk::RayTracingPipelineCreateInfoKHR::default()
            .stages(&stage_infos)
            .groups(groups)
            .max_pipeline_ray_recursion_depth(max_recursion_depth)
            .layout(layout);

        let raw = unsafe {
            loader
                .create_ray_tracing_pipelines(
                    vk::DeferredOperationKHR::null(),
                    vk::PipelineCache::null(),
                    &[info],
                    None,
                )
                .map_err(|(_, result)| result)?[0]
        };

        Ok(Self {
            device,
            raw,
            group_count: groups.len() as u32,
        })
    }

    pub fn raw(&self) -> vk::Pipeline {
        self.raw
    }

    pub fn group_count(&self) -> u32 {
        self.group_count
    }
}

impl Drop for VulkanRayTracingPipeline {
    fn drop(&mut self) {
        unsafe { self.device.raw.destroy_pipeline(self.raw, None) };
    }
}
