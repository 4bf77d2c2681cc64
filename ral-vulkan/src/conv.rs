//! Enum/flag conversions between this crate's backend-agnostic `ral_types`
//! and `ash`'s raw Vulkan bindings. Kept in one file the way wgpu-hal's
//! own `vulkan::conv` module centralizes its `map_*` functions.
use ash::vk;
use ral_core::error::CreationError;
use ral_types::{
    AddressMode, BlendFactor, BlendOp, CompareFunction, CullMode, DescriptorRangeType, FillMode,
    FilterMode, FrontFace, IndexBufferFormat, PrimitiveTopology, ResourceKind, ShaderVisibility,
    TextureFormat,
};

pub fn map_texture_format(format: TextureFormat) -> vk::Format {
    use TextureFormat as Tf;
    match format {
        Tf::R8 => vk::Format::R8_UNORM,
        Tf::R8G8B8 => vk::Format::R8G8B8_UNORM,
        Tf::R8G8B8A8 => vk::Format::R8G8B8A8_UNORM,
        Tf::R8G8B8A8Srgb => vk::Format::R8G8B8A8_SRGB,
        Tf::B8G8R8A8 => vk::Format::B8G8R8A8_UNORM,
        Tf::R11G11B10F => vk::Format::B10G11R11_UFLOAT_PACK32,
        Tf::R16G16B16A16F => vk::Format::R16G16B16A16_SFLOAT,
        Tf::R32G32B32A32F => vk::Format::R32G32B32A32_SFLOAT,
        Tf::Bc1 => vk::Format::BC1_RGBA_UNORM_BLOCK,
        Tf::Bc1Srgb => vk::Format::BC1_RGBA_SRGB_BLOCK,
        Tf::Bc2 => vk::Format::BC2_UNORM_BLOCK,
        Tf::Bc2Srgb => vk::Format::BC2_SRGB_BLOCK,
        Tf::Bc3 => vk::Format::BC3_UNORM_BLOCK,
        Tf::Bc3Srgb => vk::Format::BC3_SRGB_BLOCK,
        Tf::Bc4 => vk::Format::BC4_UNORM_BLOCK,
        Tf::Bc5 => vk::Format::BC5_UNORM_BLOCK,
        Tf::Etc1 => vk::Format::ETC2_R8G8B8_UNORM_BLOCK,
        Tf::R16Unorm => vk::Format::R16_UNORM,
        Tf::R32Uint => vk::Format::R32_UINT,
        Tf::R32Float => vk::Format::R32_SFLOAT,
        Tf::D32Float => vk::Format::D32_SFLOAT,
        Tf::R16G16Snorm => vk::Format::R16G16_SNORM,
        Tf::R16G16Float => vk::Format::R16G16_SFLOAT,
        Tf::Unknown => vk::Format::UNDEFINED,
    }
}

pub fn map_primitive_topology(topology: PrimitiveTopology) -> vk::PrimitiveTopology {
    match topology {
        PrimitiveTopology::PointList => vk::PrimitiveTopology::POINT_LIST,
        PrimitiveTopology::LineList => vk::PrimitiveTopology::LINE_LIST,
        PrimitiveTopology::LineStrip => vk::PrimitiveTopology::LINE_STRIP,
        PrimitiveTopology::TriangleList => vk::PrimitiveTopology::TRIANGLE_LIST,
        PrimitiveTopology::TriangleStrip => vk::PrimitiveTopology::TRIANGLE_STRIP,
        t if t.is_patch_list() => vk::PrimitiveTopology::PATCH_LIST,
        _ => vk::PrimitiveTopology::TRIANGLE_LIST,
    }
}

pub fn map_cull_mode(mode: CullMode) -> vk::CullModeFlags {
    match mode {
        CullMode::None => vk::CullModeFlags::NONE,
        CullMode::Front => vk::CullModeFlags::FRONT,
        CullMode::Back => vk::CullModeFlags::BACK,
    }
}

pub fn map_front_face(face: FrontFace) -> vk::FrontFace {
    match face {
        FrontFace::Clockwise => vk::FrontFace::CLOCKWISE,
        FrontFace::CounterClockwise => vk::FrontFace::COUNTER_CLOCKWISE,
    }
}

pub fn map_fill_mode(mode: FillMode) -> vk::PolygonMode {
    match mode {
        FillMode::Solid => vk::PolygonMode::FILL,
        FillMode::Wireframe => vk::PolygonMode::LINE,
    }
}

pub fn map_compare_function(func: CompareFunction) -> vk::CompareOp {
    match func {
        CompareFunction::Never => vk::CompareOp::NEVER,
        CompareFunction::Less => vk::CompareOp::LESS,
        CompareFunction::Equal => vk::CompareOp::EQUAL,
        CompareFunction::LessEqual => vk::CompareOp::LESS_OR_EQUAL,
        CompareFunction::Greater => vk::CompareOp::GREATER,
        CompareFunction::NotEqual => vk::CompareOp::NOT_EQUAL,
        CompareFunction::GreaterEqual => vk::CompareOp::GREATER_OR_EQUAL,
        CompareFunction::Always => vk::CompareOp::ALWAYS,
    }
}

pub fn map_blend_factor(factor: BlendFactor) -> vk::BlendFactor {
    match factor {
        BlendFactor::Zero => vk::BlendFactor::ZERO,
        BlendFactor::One => vk::BlendFactor::ONE,
        BlendFactor::SrcColor => vk::BlendFactor::SRC_COLOR,
        BlendFactor::InvSrcColor => vk::BlendFactor::ONE_MINUS_SRC_COLOR,
        BlendFactor::SrcAlpha => vk::BlendFactor::SRC_ALPHA,
        BlendFactor::InvSrcAlpha => vk::BlendFactor::ONE_MINUS_SRC_ALPHA,
        BlendFactor::DstAlpha => vk::BlendFactor::DST_ALPHA,
        BlendFactor::InvDstAlpha => vk::BlendFactor::ONE_MINUS_DST_ALPHA,
        BlendFactor::DstColor => vk::BlendFactor::DST_COLOR,
        BlendFactor::InvDstColor => vk::BlendFactor::ONE_MINUS_DST_COLOR,
        BlendFactor::SrcAlphaSat => vk::BlendFactor::SRC_ALPHA_SATURATE,
        BlendFactor::BlendFactor => vk::BlendFactor::CONSTANT_COLOR,
        BlendFactor::InvBlendFactor => vk::BlendFactor::ONE_MINUS_CONSTANT_COLOR,
        BlendFactor::Src1Color => vk::BlendFactor::SRC1_COLOR,
        BlendFactor::InvSrc1Color => vk::BlendFactor::ONE_MINUS_SRC1_COLOR,
        BlendFactor::Src1Alpha => vk::BlendFactor::SRC1_ALPHA,
        BlendFactor::InvSrc1Alpha => vk::BlendFactor::ONE_MINUS_SRC1_ALPHA,
    }
}

pub fn map_blend_op(op: BlendOp) -> vk::BlendOp {
    match op {
        BlendOp::Add => vk::BlendOp::ADD,
        BlendOp::Subtract => vk::BlendOp::SUBTRACT,
        BlendOp::RevSubtract => vk::BlendOp::REVERSE_SUBTRACT,
        BlendOp::Min => vk::BlendOp::MIN,
        BlendOp::Max => vk::BlendOp::MAX,
    }
}

pub fn map_address_mode(mode: AddressMode) -> vk::SamplerAddressMode {
    match mode {
        AddressMode::Wrap => vk::SamplerAddressMode::REPEAT,
        AddressMode::Mirror => vk::SamplerAddressMode::MIRRORED_REPEAT,
        AddressMode::Clamp => vk::SamplerAddressMode::CLAMP_TO_EDGE,
        AddressMode::Border => vk::SamplerAddressMode::CLAMP_TO_BORDER,
        AddressMode::MirrorOnce => vk::SamplerAddressMode::MIRROR_CLAMP_TO_EDGE,
    }
}

/// `(min, mag, mipmap, anisotropy_enable, compare_enable)`, mirroring how
/// wgpu-hal's `conv::map_filter_mode` decomposes a single filter enum
/// into the handful of independent `VkSamplerCreateInfo` fields Vulkan
/// actually wants.
pub fn map_filter_mode(
    filter: FilterMode,
) -> (vk::Filter, vk::Filter, vk::SamplerMipmapMode, bool, bool) {
    use vk::Filter as F;
    use vk::SamplerMipmapMode as M;
    let compare = filter.is_comparison();
    match filter {
        FilterMode::MinMagMipPoint | FilterMode::ComparisonMinMagMipPoint => {
            (F::NEAREST, F::NEAREST, M::NEAREST, false, compare)
        }
        FilterMode::MinMagPointMipLinear => (F::NEAREST, F::NEAREST, M::LINEAR, false, compare),
        FilterMode::MinPointMagLinearMipPoint => (F::NEAREST, F::LINEAR, M::NEAREST, false, compare),
        FilterMode::MinPointMagMipLinear => (F::NEAREST, F::LINEAR, M::LINEAR, false, compare),
        FilterMode::MinLinearMagMipPoint => (F::LINEAR, F::NEAREST, M::NEAREST, false, compare),
        FilterMode::MinLinearMagPointMipLinear => (F::LINEAR, F::NEAREST, M::LINEAR, false, compare),
        FilterMode::MinMagLinearMipPoint => (F::LINEAR, F::LINEAR, M::NEAREST, false, compare),
        FilterMode::MinMagMipLinear | FilterMode::ComparisonMinMagMipLinear => {
            (F::LINEAR, F::LINEAR, M::LINEAR, false, compare)
        }
        FilterMode::Anisotropic | FilterMode::ComparisonAnisotropic => {
            (F::LINEAR, F::LINEAR, M::LINEAR, true, compare)
        }
    }
}

/// Vulkan has no 1-byte index type; `UnsignedChar` is rejected here the way
/// wgpu-hal rejects capability-less formats, with the same
/// `CreationError::MissingCapability` the rest of this crate uses.
pub fn map_index_buffer_format(format: IndexBufferFormat) -> Result<vk::IndexType, CreationError> {
    match format {
        IndexBufferFormat::UnsignedChar => {
            Err(CreationError::MissingCapability("8-bit index buffers are not supported on Vulkan"))
        }
        IndexBufferFormat::UnsignedShort => Ok(vk::IndexType::UINT16),
        IndexBufferFormat::UnsignedInt => Ok(vk::IndexType::UINT32),
    }
}

pub fn map_shader_visibility(visibility: ShaderVisibility) -> vk::ShaderStageFlags {
    let mut flags = vk::ShaderStageFlags::empty();
    if visibility.contains(ShaderVisibility::VERTEX) {
        flags |= vk::ShaderStageFlags::VERTEX;
    }
    if visibility.contains(ShaderVisibility::TESSELLATION_CONTROL) {
        flags |= vk::ShaderStageFlags::TESSELLATION_CONTROL;
    }
    if visibility.contains(ShaderVisibility::TESSELLATION_EVALUATION) {
        flags |= vk::ShaderStageFlags::TESSELLATION_EVALUATION;
    }
    if visibility.contains(ShaderVisibility::GEOMETRY) {
        flags |= vk::ShaderStageFlags::GEOMETRY;
    }
    if visibility.contains(ShaderVisibility::FRAGMENT) {
        flags |= vk::ShaderStageFlags::FRAGMENT;
    }
    if visibility.contains(ShaderVisibility::COMPUTE) {
        flags |= vk::ShaderStageFlags::COMPUTE;
    }
    flags
}

/// A descriptor range's `VkDescriptorType` depends on both axes spec.md
/// §4.4's table keys off: the `RangeType` (SRV/UAV/UBV/SAMPLER) and the
/// `ResourceKind` it binds. A `TextureBuffer` SRV is a very different native
/// descriptor from a `Texture2D` SRV, even though both are "SRV" ranges.
pub fn map_descriptor_range_type(
    resource_kind: ResourceKind,
    range_type: DescriptorRangeType,
) -> Result<vk::DescriptorType, CreationError> {
    use DescriptorRangeType as Rt;
    use ResourceKind as Rk;
    match (resource_kind, range_type) {
        (Rk::TextureBuffer, Rt::Srv) => Ok(vk::DescriptorType::UNIFORM_TEXEL_BUFFER),
        (Rk::TextureBuffer, Rt::Uav) => Ok(vk::DescriptorType::STORAGE_TEXEL_BUFFER),

        (Rk::IndexBuffer | Rk::VertexBuffer | Rk::StructuredBuffer | Rk::IndirectBuffer, Rt::Srv | Rt::Uav) => {
            Ok(vk::DescriptorType::STORAGE_BUFFER)
        }

        (Rk::UniformBuffer, Rt::Uav) => Ok(vk::DescriptorType::STORAGE_BUFFER),
        (Rk::UniformBuffer, Rt::Ubv) => Ok(vk::DescriptorType::UNIFORM_BUFFER),

        (Rk::Texture1D | Rk::Texture2D | Rk::Texture2DArray | Rk::Texture3D | Rk::TextureCube, Rt::Srv) => {
            Ok(vk::DescriptorType::COMBINED_IMAGE_SAMPLER)
        }
        (Rk::Texture1D | Rk::Texture2D | Rk::Texture2DArray | Rk::Texture3D | Rk::TextureCube, Rt::Uav) => {
            Ok(vk::DescriptorType::STORAGE_IMAGE)
        }

        (Rk::SamplerState, Rt::Sampler) => Ok(vk::DescriptorType::SAMPLER),

        _ => Err(CreationError::InvalidArgument(
            "descriptor range's ResourceKind and RangeType do not form a combination spec.md §4.4 defines",
        )),
    }
}

/// Clamps a requested sample count down to the nearest supported power of
/// two Vulkan can express as a `VkSampleCountFlagBits` bit.
pub fn map_multisample_count(count: u8) -> vk::SampleCountFlags {
    match count {
        0 | 1 => vk::SampleCountFlags::TYPE_1,
        2 => vk::SampleCountFlags::TYPE_2,
        3 | 4 => vk::SampleCountFlags::TYPE_4,
        5..=8 => vk::SampleCountFlags::TYPE_8,
        9..=16 => vk::SampleCountFlags::TYPE_16,
        17..=32 => vk::SampleCountFlags::TYPE_32,
        _ => vk::SampleCountFlags::TYPE_64,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn srgb_and_linear_variants_stay_distinct() {
        assert_ne!(
            map_texture_format(TextureFormat::R8G8B8A8),
            map_texture_format(TextureFormat::R8G8B8A8Srgb)
        );
    }

    #[test]
    fn patch_list_topologies_all_map_to_patch_list() {
        assert_eq!(
            map_primitive_topology(PrimitiveTopology::PatchList4),
            vk::PrimitiveTopology::PATCH_LIST
        );
    }

    #[test]
    fn anisotropic_filters_enable_anisotropy_only() {
        let (_, _, _, aniso, compare) = map_filter_mode(FilterMode::Anisotropic);
        assert!(aniso);
        assert!(!compare);
        let (_, _, _, aniso, compare) = map_filter_mode(FilterMode::ComparisonAnisotropic);
        assert!(aniso);
        assert!(compare);
    }

    #[test]
    fn unsigned_char_index_format_is_rejected() {
        assert!(map_index_buffer_format(IndexBufferFormat::UnsignedChar).is_err());
        assert!(map_index_buffer_format(IndexBufferFormat::UnsignedShort).is_ok());
    }

    #[test]
    fn shader_visibility_all_sets_every_stage_bit() {
        let flags = map_shader_visibility(ShaderVisibility::ALL);
        assert!(flags.contains(vk::ShaderStageFlags::VERTEX));
        assert!(flags.contains(vk::ShaderStageFlags::FRAGMENT));
        assert!(flags.contains(vk::ShaderStageFlags::COMPUTE));
    }

    #[test]
    fn multisample_count_rounds_up_to_supported_bit() {
        assert_eq!(map_multisample_count(1), vk::SampleCountFlags::TYPE_1);
        assert_eq!(map_multisample_count(4), vk::SampleCountFlags::TYPE_4);
        assert_eq!(map_multisample_count(8), vk::SampleCountFlags::TYPE_8);
    }

    #[test]
    fn descriptor_range_type_follows_the_resource_kind_table() {
        assert_eq!(
            map_descriptor_range_type(ResourceKind::TextureBuffer, DescriptorRangeType::Srv).unwrap(),
            vk::DescriptorType::UNIFORM_TEXEL_BUFFER
        );
        assert_eq!(
            map_descriptor_range_type(ResourceKind::TextureBuffer, DescriptorRangeType::Uav).unwrap(),
            vk::DescriptorType::STORAGE_TEXEL_BUFFER
        );
        assert_eq!(
            map_descriptor_range_type(ResourceKind::StructuredBuffer, DescriptorRangeType::Srv).unwrap(),
            vk::DescriptorType::STORAGE_BUFFER
        );
        assert_eq!(
            map_descriptor_range_type(ResourceKind::UniformBuffer, DescriptorRangeType::Ubv).unwrap(),
            vk::DescriptorType::UNIFORM_BUFFER
        );
        assert_eq!(
            map_descriptor_range_type(ResourceKind::UniformBuffer, DescriptorRangeType::Uav).unwrap(),
            vk::DescriptorType::STORAGE_BUFFER
        );
        assert_eq!(
            map_descriptor_range_type(ResourceKind::Texture2D, DescriptorRangeType::Srv).unwrap(),
            vk::DescriptorType::COMBINED_IMAGE_SAMPLER
        );
        assert_eq!(
            map_descriptor_range_type(ResourceKind::Texture2D, DescriptorRangeType::Uav).unwrap(),
            vk::DescriptorType::STORAGE_IMAGE
        );
        assert_eq!(
            map_descriptor_range_type(ResourceKind::SamplerState, DescriptorRangeType::Sampler).unwrap(),
            vk::DescriptorType::SAMPLER
        );
    }

    #[test]
    fn descriptor_range_type_rejects_combinations_spec_44_does_not_define() {
        assert!(map_descriptor_range_type(ResourceKind::StructuredBuffer, DescriptorRangeType::Ubv).is_err());
        assert!(map_descriptor_range_type(ResourceKind::Texture2D, DescriptorRangeType::Ubv).is_err());
    }
}
