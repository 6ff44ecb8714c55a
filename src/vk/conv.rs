//! Mapping from the backend-agnostic enums in `crate::types` onto `ash::vk`.
//!
//! Grounded on `wgpu-hal/src/vulkan/conv.rs`'s role in the teacher: a pure
//! translation layer with no state, called from every `vk::*::create`
//! helper.

use ash::vk;

use crate::types::*;

pub fn format(format: Format) -> vk::Format {
    match format {
        Format::Undefined => vk::Format::UNDEFINED,
        Format::R8Unorm => vk::Format::R8_UNORM,
        Format::R8g8b8a8Unorm => vk::Format::R8G8B8A8_UNORM,
        Format::B8g8r8a8Unorm => vk::Format::B8G8R8A8_UNORM,
        Format::B8g8r8a8Srgb => vk::Format::B8G8R8A8_SRGB,
        Format::R32g32Sfloat => vk::Format::R32G32_SFLOAT,
        Format::R32g32b32Sfloat => vk::Format::R32G32B32_SFLOAT,
        Format::R32g32b32a32Sfloat => vk::Format::R32G32B32A32_SFLOAT,
        Format::D32Sfloat => vk::Format::D32_SFLOAT,
        Format::D24UnormS8Uint => vk::Format::D24_UNORM_S8_UINT,
    }
}

pub fn format_from_vk(format: vk::Format) -> Format {
    match format {
        vk::Format::R8_UNORM => Format::R8Unorm,
        vk::Format::R8G8B8A8_UNORM => Format::R8g8b8a8Unorm,
        vk::Format::B8G8R8A8_UNORM => Format::B8g8r8a8Unorm,
        vk::Format::B8G8R8A8_SRGB => Format::B8g8r8a8Srgb,
        vk::Format::R32G32_SFLOAT => Format::R32g32Sfloat,
        vk::Format::R32G32B32_SFLOAT => Format::R32g32b32Sfloat,
        vk::Format::R32G32B32A32_SFLOAT => Format::R32g32b32a32Sfloat,
        vk::Format::D32_SFLOAT => Format::D32Sfloat,
        vk::Format::D24_UNORM_S8_UINT => Format::D24UnormS8Uint,
        _ => Format::Undefined,
    }
}

pub fn image_type(ty: TextureType) -> vk::ImageType {
    match ty {
        TextureType::OneD => vk::ImageType::TYPE_1D,
        TextureType::TwoD => vk::ImageType::TYPE_2D,
        TextureType::ThreeD => vk::ImageType::TYPE_3D,
    }
}

pub fn image_view_type(ty: ViewType) -> vk::ImageViewType {
    match ty {
        ViewType::OneD => vk::ImageViewType::TYPE_1D,
        ViewType::TwoD => vk::ImageViewType::TYPE_2D,
        ViewType::TwoDArray => vk::ImageViewType::TYPE_2D_ARRAY,
        ViewType::Cube => vk::ImageViewType::CUBE,
        ViewType::CubeArray => vk::ImageViewType::CUBE_ARRAY,
        ViewType::ThreeD => vk::ImageViewType::TYPE_3D,
    }
}

pub fn image_tiling(tiling: Tiling) -> vk::ImageTiling {
    match tiling {
        Tiling::Optimal => vk::ImageTiling::OPTIMAL,
        Tiling::Linear => vk::ImageTiling::LINEAR,
    }
}

pub fn image_usage(usage: TextureUsageFlags) -> vk::ImageUsageFlags {
    let mut out = vk::ImageUsageFlags::empty();
    if usage.contains(TextureUsageFlags::TRANSFER_SRC) {
        out |= vk::ImageUsageFlags::TRANSFER_SRC;
    }
    if usage.contains(TextureUsageFlags::TRANSFER_DST) {
        out |= vk::ImageUsageFlags::TRANSFER_DST;
    }
    if usage.contains(TextureUsageFlags::SAMPLED) {
        out |= vk::ImageUsageFlags::SAMPLED;
    }
    if usage.contains(TextureUsageFlags::STORAGE) {
        out |= vk::ImageUsageFlags::STORAGE;
    }
    if usage.contains(TextureUsageFlags::COLOR_ATTACHMENT) {
        out |= vk::ImageUsageFlags::COLOR_ATTACHMENT;
    }
    if usage.contains(TextureUsageFlags::DEPTH_STENCIL_ATTACHMENT) {
        out |= vk::ImageUsageFlags::DEPTH_STENCIL_ATTACHMENT;
    }
    if usage.contains(TextureUsageFlags::INPUT_ATTACHMENT) {
        out |= vk::ImageUsageFlags::INPUT_ATTACHMENT;
    }
    out
}

pub fn buffer_usage(usage: BufferUsageFlags) -> vk::BufferUsageFlags {
    let mut out = vk::BufferUsageFlags::empty();
    if usage.contains(BufferUsageFlags::VERTEX_BUFFER) {
        out |= vk::BufferUsageFlags::VERTEX_BUFFER;
    }
    if usage.contains(BufferUsageFlags::INDEX_BUFFER) {
        out |= vk::BufferUsageFlags::INDEX_BUFFER;
    }
    if usage.contains(BufferUsageFlags::UNIFORM_BUFFER) {
        out |= vk::BufferUsageFlags::UNIFORM_BUFFER;
    }
    if usage.contains(BufferUsageFlags::STORAGE_BUFFER) {
        out |= vk::BufferUsageFlags::STORAGE_BUFFER;
    }
    if usage.contains(BufferUsageFlags::INDIRECT_BUFFER) {
        out |= vk::BufferUsageFlags::INDIRECT_BUFFER;
    }
    if usage.contains(BufferUsageFlags::TRANSFER_SRC) {
        out |= vk::BufferUsageFlags::TRANSFER_SRC;
    }
    if usage.contains(BufferUsageFlags::TRANSFER_DST) {
        out |= vk::BufferUsageFlags::TRANSFER_DST;
    }
    if usage.contains(BufferUsageFlags::SHADER_DEVICE_ADDRESS) {
        out |= vk::BufferUsageFlags::SHADER_DEVICE_ADDRESS;
    }
    if usage.contains(BufferUsageFlags::ACCELERATION_STRUCTURE_BUILD_INPUT) {
        out |= vk::BufferUsageFlags::ACCELERATION_STRUCTURE_BUILD_INPUT_READ_ONLY_KHR;
    }
    if usage.contains(BufferUsageFlags::ACCELERATION_STRUCTURE_STORAGE) {
        out |= vk::BufferUsageFlags::ACCELERATION_STRUCTURE_STORAGE_KHR;
    }
    out
}

pub fn shader_stage_flags(stages: ShaderStageFlags) -> vk::ShaderStageFlags {
    let mut out = vk::ShaderStageFlags::empty();
    if stages.contains(ShaderStageFlags::VERTEX) {
        out |= vk::ShaderStageFlags::VERTEX;
    }
    if stages.contains(ShaderStageFlags::FRAGMENT) {
        out |= vk::ShaderStageFlags::FRAGMENT;
    }
    if stages.contains(ShaderStageFlags::COMPUTE) {
        out |= vk::ShaderStageFlags::COMPUTE;
    }
    if stages.contains(ShaderStageFlags::TESSELLATION_CONTROL) {
        out |= vk::ShaderStageFlags::TESSELLATION_CONTROL;
    }
    if stages.contains(ShaderStageFlags::TESSELLATION_EVALUATION) {
        out |= vk::ShaderStageFlags::TESSELLATION_EVALUATION;
    }
    if stages.contains(ShaderStageFlags::GEOMETRY) {
        out |= vk::ShaderStageFlags::GEOMETRY;
    }
    if stages.contains(ShaderStageFlags::MESH) {
        out |= vk::ShaderStageFlags::MESH_EXT;
    }
    if stages.contains(ShaderStageFlags::TASK) {
        out |= vk::ShaderStageFlags::TASK_EXT;
    }
    if stages.contains(ShaderStageFlags::RAYGEN) {
        out |= vk::ShaderStageFlags::RAYGEN_KHR;
    }
    if stages.contains(ShaderStageFlags::ANY_HIT) {
        out |= vk::ShaderStageFlags::ANY_HIT_KHR;
    }
    if stages.contains(ShaderStageFlags::CLOSEST_HIT) {
        out |= vk::ShaderStageFlags::CLOSEST_HIT_KHR;
    }
    if stages.contains(ShaderStageFlags::MISS) {
        out |= vk::ShaderStageFlags::MISS_KHR;
    }
    if stages.contains(ShaderStageFlags::INTERSECTION) {
        out |= vk::ShaderStageFlags::INTERSECTION_KHR;
    }
    if stages.contains(ShaderStageFlags::CALLABLE) {
        out |= vk::ShaderStageFlags::CALLABLE_KHR;
    }
    out
}

pub fn image_layout(layout: TextureLayout) -> vk::ImageLayout {
    match layout {
        TextureLayout::Undefined => vk::ImageLayout::UNDEFINED,
        TextureLayout::General => vk::ImageLayout::GENERAL,
        TextureLayout::ColorAttachmentOptimal => vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL,
        TextureLayout::DepthStencilAttachmentOptimal => {
            vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL
        }
        TextureLayout::DepthStencilReadOnlyOptimal => {
            vk::ImageLayout::DEPTH_STENCIL_READ_ONLY_OPTIMAL
        }
        TextureLayout::ShaderReadOnlyOptimal => vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
        TextureLayout::TransferSrcOptimal => vk::ImageLayout::TRANSFER_SRC_OPTIMAL,
        TextureLayout::TransferDstOptimal => vk::ImageLayout::TRANSFER_DST_OPTIMAL,
        TextureLayout::PresentSrc => vk::ImageLayout::PRESENT_SRC_KHR,
    }
}

pub fn load_op(op: AttachmentLoadOp) -> vk::AttachmentLoadOp {
    match op {
        AttachmentLoadOp::Load => vk::AttachmentLoadOp::LOAD,
        AttachmentLoadOp::Clear => vk::AttachmentLoadOp::CLEAR,
        AttachmentLoadOp::DontCare => vk::AttachmentLoadOp::DONT_CARE,
    }
}

pub fn store_op(op: AttachmentStoreOp) -> vk::AttachmentStoreOp {
    match op {
        AttachmentStoreOp::Store => vk::AttachmentStoreOp::STORE,
        AttachmentStoreOp::DontCare => vk::AttachmentStoreOp::DONT_CARE,
    }
}

pub fn resolve_mode(mode: ResolveModeFlagBits) -> vk::ResolveModeFlags {
    match mode {
        ResolveModeFlagBits::None => vk::ResolveModeFlags::NONE,
        ResolveModeFlagBits::Average => vk::ResolveModeFlags::AVERAGE,
        ResolveModeFlagBits::Min => vk::ResolveModeFlags::MIN,
        ResolveModeFlagBits::Max => vk::ResolveModeFlags::MAX,
    }
}

pub fn compare_op(op: CompareOperation) -> vk::CompareOp {
    match op {
        CompareOperation::Never => vk::CompareOp::NEVER,
        CompareOperation::Less => vk::CompareOp::LESS,
        CompareOperation::Equal => vk::CompareOp::EQUAL,
        CompareOperation::LessOrEqual => vk::CompareOp::LESS_OR_EQUAL,
        CompareOperation::Greater => vk::CompareOp::GREATER,
        CompareOperation::NotEqual => vk::CompareOp::NOT_EQUAL,
        CompareOperation::GreaterOrEqual => vk::CompareOp::GREATER_OR_EQUAL,
        CompareOperation::Always => vk::CompareOp::ALWAYS,
    }
}

pub fn index_type(ty: IndexType) -> vk::IndexType {
    match ty {
        IndexType::Uint16 => vk::IndexType::UINT16,
        IndexType::Uint32 => vk::IndexType::UINT32,
    }
}

pub fn primitive_topology(topology: PrimitiveTopology) -> vk::PrimitiveTopology {
    match topology {
        PrimitiveTopology::TriangleList => vk::PrimitiveTopology::TRIANGLE_LIST,
        PrimitiveTopology::TriangleStrip => vk::PrimitiveTopology::TRIANGLE_STRIP,
        PrimitiveTopology::LineList => vk::PrimitiveTopology::LINE_LIST,
        PrimitiveTopology::LineStrip => vk::PrimitiveTopology::LINE_STRIP,
        PrimitiveTopology::PointList => vk::PrimitiveTopology::POINT_LIST,
    }
}

pub fn front_face(face: FrontFace) -> vk::FrontFace {
    match face {
        FrontFace::CounterClockwise => vk::FrontFace::COUNTER_CLOCKWISE,
        FrontFace::Clockwise => vk::FrontFace::CLOCKWISE,
    }
}

pub fn polygon_mode(mode: PolygonMode) -> vk::PolygonMode {
    match mode {
        PolygonMode::Fill => vk::PolygonMode::FILL,
        PolygonMode::Line => vk::PolygonMode::LINE,
        PolygonMode::Point => vk::PolygonMode::POINT,
    }
}

pub fn cull_mode(mode: CullModeFlags) -> vk::CullModeFlags {
    let mut out = vk::CullModeFlags::NONE;
    if mode.contains(CullModeFlags::FRONT) {
        out |= vk::CullModeFlags::FRONT;
    }
    if mode.contains(CullModeFlags::BACK) {
        out |= vk::CullModeFlags::BACK;
    }
    out
}

pub fn stencil_face_flags(faces: crate::types::StencilFaceFlags) -> vk::StencilFaceFlags {
    let mut out = vk::StencilFaceFlags::empty();
    if faces.contains(crate::types::StencilFaceFlags::FRONT) {
        out |= vk::StencilFaceFlags::FRONT;
    }
    if faces.contains(crate::types::StencilFaceFlags::BACK) {
        out |= vk::StencilFaceFlags::BACK;
    }
    out
}

pub fn blend_factor(factor: BlendFactor) -> vk::BlendFactor {
    match factor {
        BlendFactor::One => vk::BlendFactor::ONE,
        BlendFactor::Zero => vk::BlendFactor::ZERO,
        BlendFactor::SrcAlpha => vk::BlendFactor::SRC_ALPHA,
        BlendFactor::OneMinusSrcAlpha => vk::BlendFactor::ONE_MINUS_SRC_ALPHA,
        BlendFactor::DstAlpha => vk::BlendFactor::DST_ALPHA,
        BlendFactor::OneMinusDstAlpha => vk::BlendFactor::ONE_MINUS_DST_ALPHA,
    }
}

pub fn blend_op(op: BlendOp) -> vk::BlendOp {
    match op {
        BlendOp::Add => vk::BlendOp::ADD,
        BlendOp::Subtract => vk::BlendOp::SUBTRACT,
        BlendOp::ReverseSubtract => vk::BlendOp::REVERSE_SUBTRACT,
        BlendOp::Min => vk::BlendOp::MIN,
        BlendOp::Max => vk::BlendOp::MAX,
    }
}

pub fn filter(f: Filter) -> vk::Filter {
    match f {
        Filter::Nearest => vk::Filter::NEAREST,
        Filter::Linear => vk::Filter::LINEAR,
    }
}

pub fn mipmap_mode(f: MipmapFilter) -> vk::SamplerMipmapMode {
    match f {
        MipmapFilter::Nearest => vk::SamplerMipmapMode::NEAREST,
        MipmapFilter::Linear => vk::SamplerMipmapMode::LINEAR,
    }
}

pub fn address_mode(mode: AddressMode) -> vk::SamplerAddressMode {
    match mode {
        AddressMode::Repeat => vk::SamplerAddressMode::REPEAT,
        AddressMode::MirroredRepeat => vk::SamplerAddressMode::MIRRORED_REPEAT,
        AddressMode::ClampToEdge => vk::SamplerAddressMode::CLAMP_TO_EDGE,
        AddressMode::ClampToBorder => vk::SamplerAddressMode::CLAMP_TO_BORDER,
    }
}

pub fn descriptor_type(ty: ResourceBindingType) -> vk::DescriptorType {
    match ty {
        ResourceBindingType::UniformBuffer => vk::DescriptorType::UNIFORM_BUFFER,
        ResourceBindingType::DynamicUniformBuffer => vk::DescriptorType::UNIFORM_BUFFER_DYNAMIC,
        ResourceBindingType::StorageBuffer => vk::DescriptorType::STORAGE_BUFFER,
        ResourceBindingType::DynamicStorageBuffer => vk::DescriptorType::STORAGE_BUFFER_DYNAMIC,
        ResourceBindingType::Sampler => vk::DescriptorType::SAMPLER,
        ResourceBindingType::CombinedImageSampler => vk::DescriptorType::COMBINED_IMAGE_SAMPLER,
        ResourceBindingType::SampledImage => vk::DescriptorType::SAMPLED_IMAGE,
        ResourceBindingType::StorageImage => vk::DescriptorType::STORAGE_IMAGE,
        ResourceBindingType::UniformTexelBuffer => vk::DescriptorType::UNIFORM_TEXEL_BUFFER,
        ResourceBindingType::StorageTexelBuffer => vk::DescriptorType::STORAGE_TEXEL_BUFFER,
        ResourceBindingType::InputAttachment => vk::DescriptorType::INPUT_ATTACHMENT,
        ResourceBindingType::AccelerationStructure => {
            vk::DescriptorType::ACCELERATION_STRUCTURE_KHR
        }
    }
}

pub fn present_mode(mode: PresentMode) -> vk::PresentModeKHR {
    match mode {
        PresentMode::Immediate => vk::PresentModeKHR::IMMEDIATE,
        PresentMode::Mailbox => vk::PresentModeKHR::MAILBOX,
        PresentMode::Fifo => vk::PresentModeKHR::FIFO,
        PresentMode::FifoRelaxed => vk::PresentModeKHR::FIFO_RELAXED,
    }
}

pub fn color_space(space: ColorSpace) -> vk::ColorSpaceKHR {
    match space {
        ColorSpace::SrgbNonLinear => vk::ColorSpaceKHR::SRGB_NONLINEAR,
    }
}

pub fn external_memory_handle_type(
    ty: ExternalMemoryHandleType,
) -> vk::ExternalMemoryHandleTypeFlags {
    match ty {
        ExternalMemoryHandleType::OpaqueFd => vk::ExternalMemoryHandleTypeFlags::OPAQUE_FD,
        ExternalMemoryHandleType::OpaqueWin32 => vk::ExternalMemoryHandleTypeFlags::OPAQUE_WIN32,
    }
}

pub fn aspect_mask(aspects: TextureAspectFlags) -> vk::ImageAspectFlags {
    let mut out = vk::ImageAspectFlags::empty();
    if aspects.contains(TextureAspectFlags::COLOR) {
        out |= vk::ImageAspectFlags::COLOR;
    }
    if aspects.contains(TextureAspectFlags::DEPTH) {
        out |= vk::ImageAspectFlags::DEPTH;
    }
    if aspects.contains(TextureAspectFlags::STENCIL) {
        out |= vk::ImageAspectFlags::STENCIL;
    }
    out
}
