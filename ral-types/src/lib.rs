//! Common types shared by every RAL crate: closed enumerations, capability
//! records, and the small POD structs that cross the command-buffer and
//! root-signature boundaries.
//!
//! This crate has no backend dependency and no unsafe code. Backends
//! (`ral-vulkan`, `ral-null`) translate these enums into their native
//! equivalents; `ral-core` builds the resource/command-buffer model on top of
//! them.

#![warn(trivial_casts, trivial_numeric_casts, unused_extern_crates)]

mod capabilities;
mod draw;
mod enums;
mod format;

pub use capabilities::Capabilities;
pub use draw::{DrawArguments, DrawIndexedArguments, ScissorRectangle, Viewport};
pub use enums::{
    AddressMode, BlendFactor, BlendOp, BufferFlags, BufferUsage, ClearFlags, CompareFunction,
    CullMode, DescriptorRangeType, FillMode, FilterMode, FrontFace, IndexBufferFormat,
    MapType, PrimitiveTopology, ResourceKind, Severity, ShaderStageFlags, ShaderVisibility,
    TextureFlags, TextureUsage,
};
pub use format::TextureFormat;

/// Maximum number of simultaneous render targets any backend may expose.
///
/// See spec.md §6.4: `maxSimultaneousRenderTargets` is capped at this value.
pub const MAX_SIMULTANEOUS_RENDER_TARGETS: usize = 8;

/// Render passes may describe strictly fewer color attachments than
/// [`MAX_SIMULTANEOUS_RENDER_TARGETS`] (spec.md §6.4).
pub const MAX_RENDER_PASS_COLOR_ATTACHMENTS: usize = 7;
