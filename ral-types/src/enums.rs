use bitflags::bitflags;

/// Logger severity levels a [`Context`](crate) implementation must accept.
///
/// Mirrors the validation-layer → logger mapping in spec.md §7:
/// `ERROR_BIT→Critical, WARNING_BIT→Warning,
/// PERFORMANCE_WARNING_BIT→PerformanceWarning, INFORMATION_BIT→Information,
/// DEBUG_BIT→Debug`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Trace,
    Information,
    Debug,
    Warning,
    PerformanceWarning,
    Critical,
}

impl Severity {
    /// Maps onto the ambient `log` crate's level the way `ral-vulkan`'s own
    /// `log::warn!`/`log::error!` calls are leveled, so validation-layer
    /// messages routed through [`Severity`] read consistently with plain
    /// `log` output.
    pub const fn to_log_level(self) -> log::Level {
        match self {
            Self::Trace => log::Level::Trace,
            Self::Information => log::Level::Info,
            Self::Debug => log::Level::Debug,
            Self::Warning | Self::PerformanceWarning => log::Level::Warn,
            Self::Critical => log::Level::Error,
        }
    }
}

/// Every RAL-visible object kind, used to tag resources for backend-affinity
/// checks, descriptor-range binding, and (under `statistics`) per-kind live
/// counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    RootSignature,
    ResourceGroup,
    GraphicsProgram,
    VertexArray,
    RenderPass,
    SwapChain,
    Framebuffer,
    IndexBuffer,
    VertexBuffer,
    TextureBuffer,
    StructuredBuffer,
    IndirectBuffer,
    UniformBuffer,
    Texture1D,
    Texture2D,
    Texture2DArray,
    Texture3D,
    TextureCube,
    GraphicsPipelineState,
    ComputePipelineState,
    SamplerState,
    VertexShader,
    TessellationControlShader,
    TessellationEvaluationShader,
    GeometryShader,
    FragmentShader,
    ComputeShader,
}

impl ResourceKind {
    /// Total number of kinds; used to size per-kind counter tables.
    pub const COUNT: usize = 27;

    pub const ALL: [ResourceKind; Self::COUNT] = [
        Self::RootSignature,
        Self::ResourceGroup,
        Self::GraphicsProgram,
        Self::VertexArray,
        Self::RenderPass,
        Self::SwapChain,
        Self::Framebuffer,
        Self::IndexBuffer,
        Self::VertexBuffer,
        Self::TextureBuffer,
        Self::StructuredBuffer,
        Self::IndirectBuffer,
        Self::UniformBuffer,
        Self::Texture1D,
        Self::Texture2D,
        Self::Texture2DArray,
        Self::Texture3D,
        Self::TextureCube,
        Self::GraphicsPipelineState,
        Self::ComputePipelineState,
        Self::SamplerState,
        Self::VertexShader,
        Self::TessellationControlShader,
        Self::TessellationEvaluationShader,
        Self::GeometryShader,
        Self::FragmentShader,
        Self::ComputeShader,
    ];

    /// Short debug-name tag the way the source decorates native handles
    /// (spec.md §6.6), e.g. `"VBO"`, `"IBO"`, `"UBO"`.
    pub const fn debug_tag(self) -> &'static str {
        match self {
            Self::RootSignature => "RootSignature",
            Self::ResourceGroup => "ResourceGroup",
            Self::GraphicsProgram => "Program",
            Self::VertexArray => "VAO",
            Self::RenderPass => "RenderPass",
            Self::SwapChain => "SwapChain",
            Self::Framebuffer => "FBO",
            Self::IndexBuffer => "IBO",
            Self::VertexBuffer => "VBO",
            Self::TextureBuffer => "TBO",
            Self::StructuredBuffer => "SBO",
            Self::IndirectBuffer => "IndirectBufferObject",
            Self::UniformBuffer => "UBO",
            Self::Texture1D => "Texture1D",
            Self::Texture2D => "Texture2D",
            Self::Texture2DArray => "Texture2DArray",
            Self::Texture3D => "Texture3D",
            Self::TextureCube => "TextureCube",
            Self::GraphicsPipelineState => "GraphicsPSO",
            Self::ComputePipelineState => "ComputePSO",
            Self::SamplerState => "Sampler",
            Self::VertexShader => "VS",
            Self::TessellationControlShader => "TCS",
            Self::TessellationEvaluationShader => "TES",
            Self::GeometryShader => "GS",
            Self::FragmentShader => "FS",
            Self::ComputeShader => "CS",
        }
    }
}

bitflags! {
    /// Construction flags for index/vertex/uniform/texture/structured/indirect
    /// buffers (spec.md §3.1 "Buffers").
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct BufferFlags: u32 {
        const SHADER_RESOURCE    = 0b0000_0001;
        const UNORDERED_ACCESS   = 0b0000_0010;
        const DRAW_ARGUMENTS     = 0b0000_0100;
        const DRAW_INDEXED_ARGUMENTS = 0b0000_1000;
    }
}

bitflags! {
    /// Construction flags for textures (spec.md §3.1 "Textures").
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct TextureFlags: u32 {
        const SHADER_RESOURCE     = 0b0000_0001;
        const UNORDERED_ACCESS    = 0b0000_0010;
        const RENDER_TARGET       = 0b0000_0100;
        const DATA_CONTAINS_MIPMAPS = 0b0000_1000;
        const GENERATE_MIPMAPS    = 0b0001_0000;
    }
}

bitflags! {
    /// Which attachments a `ClearGraphics` command clears (spec.md §6.4).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ClearFlags: u32 {
        const COLOR   = 0b001;
        const DEPTH   = 0b010;
        const STENCIL = 0b100;
    }
}

bitflags! {
    /// Per-stage shader visibility mask for a root-signature parameter
    /// (spec.md §3.1 "RootSignature").
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ShaderVisibility: u32 {
        const VERTEX                   = 0b0000_0001;
        const TESSELLATION_CONTROL     = 0b0000_0010;
        const TESSELLATION_EVALUATION  = 0b0000_0100;
        const GEOMETRY                 = 0b0000_1000;
        const FRAGMENT                 = 0b0001_0000;
        const COMPUTE                  = 0b0010_0000;
        const ALL_GRAPHICS = Self::VERTEX.bits()
            | Self::TESSELLATION_CONTROL.bits()
            | Self::TESSELLATION_EVALUATION.bits()
            | Self::GEOMETRY.bits()
            | Self::FRAGMENT.bits();
        const ALL = Self::ALL_GRAPHICS.bits() | Self::COMPUTE.bits();
    }
}

bitflags! {
    /// Which pipeline stage(s) a single shader-module object was created for.
    /// Distinct from [`ShaderVisibility`], which describes *who may see a
    /// binding*; this describes *what a shader module itself is*.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ShaderStageFlags: u32 {
        const VERTEX = 1 << 0;
        const TESSELLATION_CONTROL = 1 << 1;
        const TESSELLATION_EVALUATION = 1 << 2;
        const GEOMETRY = 1 << 3;
        const FRAGMENT = 1 << 4;
        const COMPUTE = 1 << 5;
    }
}

bitflags! {
    /// `map()` access/behavior flags (§12 of SPEC_FULL.md, grounded on
    /// `NullRenderer.cpp`'s `Renderer::MapType`).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct MapType: u32 {
        const READ               = 0b00001;
        const WRITE               = 0b00010;
        const READ_WRITE          = Self::READ.bits() | Self::WRITE.bits();
        const WRITE_DISCARD       = 0b00100;
        const WRITE_NO_OVERWRITE  = 0b01000;
    }
}

/// Buffer usage hint (spec.md §3.1 "Buffers").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferUsage {
    StaticDraw,
    DynamicDraw,
    StreamDraw,
}

/// Texture usage hint (spec.md §3.1 "Textures").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureUsage {
    Default,
    Immutable,
    Dynamic,
    Staging,
}

/// Index-buffer element format. `UnsignedChar` (1-byte indices) is
/// unsupported on Vulkan; see spec.md §4.2/§4.8.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexBufferFormat {
    UnsignedChar,
    UnsignedShort,
    UnsignedInt,
}

impl IndexBufferFormat {
    pub const fn byte_width(self) -> u32 {
        match self {
            Self::UnsignedChar => 1,
            Self::UnsignedShort => 2,
            Self::UnsignedInt => 4,
        }
    }
}

/// Texture filtering mode. `Anisotropic` variants decompose into
/// `(min, mag, mipmap)` all `Linear` plus a separate anisotropy scalar
/// (spec.md §4.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterMode {
    MinMagMipPoint,
    MinMagPointMipLinear,
    MinPointMagLinearMipPoint,
    MinPointMagMipLinear,
    MinLinearMagMipPoint,
    MinLinearMagPointMipLinear,
    MinMagLinearMipPoint,
    MinMagMipLinear,
    Anisotropic,
    ComparisonMinMagMipPoint,
    ComparisonMinMagMipLinear,
    ComparisonAnisotropic,
}

impl FilterMode {
    pub const fn is_comparison(self) -> bool {
        matches!(
            self,
            Self::ComparisonMinMagMipPoint
                | Self::ComparisonMinMagMipLinear
                | Self::ComparisonAnisotropic
        )
    }
}

/// Address (wrap) mode for one sampler axis. Numbered starting at 1 per
/// spec.md §4.2 ("index with `value - 1`"); backends index their native
/// lookup tables with [`AddressMode::table_index`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressMode {
    Wrap = 1,
    Mirror = 2,
    Clamp = 3,
    Border = 4,
    MirrorOnce = 5,
}

impl AddressMode {
    pub const fn table_index(self) -> usize {
        (self as u32 - 1) as usize
    }
}

/// Blend factor. The enumeration has intentional holes at 12/13 per
/// spec.md §4.2; `table_index` preserves them so lookup tables line up with
/// the source numbering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlendFactor {
    Zero = 1,
    One = 2,
    SrcColor = 3,
    InvSrcColor = 4,
    SrcAlpha = 5,
    InvSrcAlpha = 6,
    DstAlpha = 7,
    InvDstAlpha = 8,
    DstColor = 9,
    InvDstColor = 10,
    SrcAlphaSat = 11,
    // 12 and 13 unused in the source numbering.
    BlendFactor = 14,
    InvBlendFactor = 15,
    Src1Color = 16,
    InvSrc1Color = 17,
    Src1Alpha = 18,
    InvSrc1Alpha = 19,
}

impl BlendFactor {
    pub const fn table_index(self) -> usize {
        (self as u32 - 1) as usize
    }
}

/// Blend operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlendOp {
    Add = 1,
    Subtract = 2,
    RevSubtract = 3,
    Min = 4,
    Max = 5,
}

/// Comparison function. 1-based per spec.md §4.2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareFunction {
    Never = 1,
    Less = 2,
    Equal = 3,
    LessEqual = 4,
    Greater = 5,
    NotEqual = 6,
    GreaterEqual = 7,
    Always = 8,
}

/// Polygon fill mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FillMode {
    Wireframe,
    Solid,
}

/// Face-culling mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CullMode {
    None,
    Front,
    Back,
}

/// Which winding order is considered front-facing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrontFace {
    Clockwise,
    CounterClockwise,
}

/// Primitive topology. `PatchList1`..`PatchList32` encode patch-control-point
/// count as `value - PATCH_LIST_1 + 1`; `PATCH_LIST_1 == 33` per spec.md §4.2
/// / §6.4, preserved here via explicit discriminants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum PrimitiveTopology {
    PointList = 1,
    LineList = 2,
    LineStrip = 3,
    TriangleList = 4,
    TriangleStrip = 5,
    PatchList1 = 33,
    PatchList2,
    PatchList3,
    PatchList4,
    PatchList5,
    PatchList6,
    PatchList7,
    PatchList8,
    PatchList9,
    PatchList10,
    PatchList11,
    PatchList12,
    PatchList13,
    PatchList14,
    PatchList15,
    PatchList16,
    PatchList17,
    PatchList18,
    PatchList19,
    PatchList20,
    PatchList21,
    PatchList22,
    PatchList23,
    PatchList24,
    PatchList25,
    PatchList26,
    PatchList27,
    PatchList28,
    PatchList29,
    PatchList30,
    PatchList31,
    PatchList32,
}

impl PrimitiveTopology {
    pub const PATCH_LIST_1_VALUE: u32 = 33;

    /// Number of control points per patch if this is a `PatchList*`
    /// variant, else the documented default of `1` (spec.md §6.4).
    pub const fn patch_control_points(self) -> u32 {
        let value = self as u32;
        if value >= Self::PATCH_LIST_1_VALUE {
            value - Self::PATCH_LIST_1_VALUE + 1
        } else {
            1
        }
    }

    pub const fn is_patch_list(self) -> bool {
        self as u32 >= Self::PATCH_LIST_1_VALUE
    }
}

/// Descriptor-range binding type within a root-signature descriptor table
/// (spec.md §3.1 "RootSignature").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DescriptorRangeType {
    Srv,
    Uav,
    Ubv,
    Sampler,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn patch_list_control_points() {
        assert_eq!(PrimitiveTopology::PatchList1.patch_control_points(), 1);
        assert_eq!(PrimitiveTopology::PatchList32.patch_control_points(), 32);
        assert_eq!(PrimitiveTopology::TriangleList.patch_control_points(), 1);
        assert!(!PrimitiveTopology::TriangleList.is_patch_list());
        assert!(PrimitiveTopology::PatchList1.is_patch_list());
    }

    #[test]
    fn address_mode_table_index_starts_at_zero() {
        assert_eq!(AddressMode::Wrap.table_index(), 0);
        assert_eq!(AddressMode::MirrorOnce.table_index(), 4);
    }

    #[test]
    fn blend_factor_preserves_holes() {
        assert_eq!(BlendFactor::SrcAlphaSat.table_index(), 10);
        assert_eq!(BlendFactor::BlendFactor.table_index(), 13);
    }
}
