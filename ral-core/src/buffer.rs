use crate::backend::{Backend, DeviceBackend};
use crate::resource::{ResourceMeta, Resource};
use ral_types::{BufferFlags, BufferUsage, ResourceKind, TextureFormat};
use std::sync::Arc;

/// Which of the six buffer purposes spec.md §3.1 distinguishes this buffer
/// serves. A single generic [`Buffer`] struct (rather than six distinct
/// types) mirrors how wgpu-core's own `wgpu_core::resource::Buffer` is one
/// struct regardless of the `BufferUsages` bits set on it; the purpose-kind
/// invariants spec.md documents are enforced in [`BufferDescriptor::validate`]
/// instead of by the type system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferKind {
    Index,
    Vertex,
    Uniform,
    Texture,
    Structured,
    Indirect,
}

impl BufferKind {
    pub const fn resource_kind(self) -> ResourceKind {
        match self {
            Self::Index => ResourceKind::IndexBuffer,
            Self::Vertex => ResourceKind::VertexBuffer,
            Self::Uniform => ResourceKind::UniformBuffer,
            Self::Texture => ResourceKind::TextureBuffer,
            Self::Structured => ResourceKind::StructuredBuffer,
            Self::Indirect => ResourceKind::IndirectBuffer,
        }
    }
}

/// Backend-agnostic description of a buffer (spec.md §3.1 "Buffers").
#[derive(Debug, Clone)]
pub struct BufferDescriptor {
    pub kind: BufferKind,
    pub byte_size: u32,
    pub flags: BufferFlags,
    pub usage: BufferUsage,
    /// Only meaningful for [`BufferKind::Texture`].
    pub texel_format: Option<TextureFormat>,
    /// Only meaningful for [`BufferKind::Structured`]; minimum 16 bytes
    /// (spec.md §3.1).
    pub element_stride: Option<u32>,
}

impl BufferDescriptor {
    /// Checks the invariants spec.md §3.1 documents for buffers. Returns the
    /// first violated invariant; performance-only advice (non-16-byte
    /// structured stride) is reported separately via
    /// [`BufferDescriptor::performance_warning`] since it isn't a hard error.
    pub fn validate(&self) -> Result<(), &'static str> {
        match self.kind {
            BufferKind::Indirect => {
                let has_draw = self.flags.contains(BufferFlags::DRAW_ARGUMENTS);
                let has_indexed = self.flags.contains(BufferFlags::DRAW_INDEXED_ARGUMENTS);
                if has_draw == has_indexed {
                    return Err("IndirectBuffer requires exactly one of DRAW_ARGUMENTS/DRAW_INDEXED_ARGUMENTS");
                }
                let struct_size = if has_draw {
                    std::mem::size_of::<ral_types::DrawArguments>()
                } else {
                    std::mem::size_of::<ral_types::DrawIndexedArguments>()
                } as u32;
                if self.byte_size % struct_size != 0 {
                    return Err("IndirectBuffer byte size must be a multiple of the arguments struct size");
                }
            }
            BufferKind::Structured => {
                let stride = self.element_stride.ok_or("StructuredBuffer requires an element stride")?;
                if stride < 16 {
                    return Err("StructuredBuffer element stride must be at least 16 bytes");
                }
                if self.byte_size % stride != 0 {
                    return Err("StructuredBuffer byte size must be a multiple of its element stride");
                }
            }
            BufferKind::Texture => {
                if self.texel_format.is_none() {
                    return Err("TextureBuffer requires a texel format");
                }
            }
            BufferKind::Index | BufferKind::Vertex | BufferKind::Uniform => {}
        }
        Ok(())
    }

    /// Non-fatal advisory per spec.md §3.1 ("performance warning if not a
    /// multiple of 16").
    pub fn performance_warning(&self) -> Option<&'static str> {
        if self.kind == BufferKind::Structured && self.byte_size % 16 != 0 {
            Some("StructuredBuffer byte size is not a multiple of 16 bytes")
        } else {
            None
        }
    }
}

/// A buffer resource bound to a concrete backend object (spec.md §3.1).
///
/// Holds the [`Arc`] of the device that created it purely so [`Drop`] can
/// call back into `destroy_buffer`; this is what gives the "refcount hits
/// zero, backend object destroyed synchronously" semantics the [`crate::Res`]
/// alias promises (see `DESIGN.md`).
#[derive(Debug)]
pub struct Buffer<B: Backend> {
    meta: ResourceMeta,
    pub descriptor: BufferDescriptor,
    pub(crate) raw: Option<B::Buffer>,
    device: Arc<B::Device>,
}

impl<B: Backend> Buffer<B> {
    pub fn new(meta: ResourceMeta, descriptor: BufferDescriptor, raw: B::Buffer, device: Arc<B::Device>) -> Self {
        Self { meta, descriptor, raw: Some(raw), device }
    }

    pub fn byte_size(&self) -> u32 {
        self.descriptor.byte_size
    }

    pub fn raw(&self) -> &B::Buffer {
        self.raw.as_ref().expect("Buffer accessed after destruction")
    }
}

impl<B: Backend> Resource for Buffer<B> {
    fn meta(&self) -> &ResourceMeta {
        &self.meta
    }
}

impl<B: Backend> Drop for Buffer<B> {
    fn drop(&mut self) {
        if let Some(raw) = self.raw.take() {
            self.device.destroy_buffer(raw);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn desc(kind: BufferKind, byte_size: u32) -> BufferDescriptor {
        BufferDescriptor {
            kind,
            byte_size,
            flags: BufferFlags::empty(),
            usage: BufferUsage::StaticDraw,
            texel_format: None,
            element_stride: None,
        }
    }

    #[test]
    fn indirect_buffer_requires_exactly_one_draw_flag() {
        let mut d = desc(BufferKind::Indirect, 20);
        assert!(d.validate().is_err(), "neither flag set");
        d.flags = BufferFlags::DRAW_ARGUMENTS | BufferFlags::DRAW_INDEXED_ARGUMENTS;
        assert!(d.validate().is_err(), "both flags set");
        d.flags = BufferFlags::DRAW_ARGUMENTS;
        d.byte_size = std::mem::size_of::<ral_types::DrawArguments>() as u32;
        assert!(d.validate().is_ok());
    }

    #[test]
    fn indirect_buffer_size_must_be_multiple_of_struct() {
        let mut d = desc(BufferKind::Indirect, 3);
        d.flags = BufferFlags::DRAW_ARGUMENTS;
        assert!(d.validate().is_err());
    }

    #[test]
    fn structured_buffer_requires_min_16_byte_stride() {
        let mut d = desc(BufferKind::Structured, 32);
        d.element_stride = Some(8);
        assert!(d.validate().is_err());
        d.element_stride = Some(16);
        assert!(d.validate().is_ok());
    }

    #[test]
    fn structured_buffer_size_must_be_multiple_of_stride() {
        let mut d = desc(BufferKind::Structured, 33);
        d.element_stride = Some(16);
        assert!(d.validate().is_err());
    }

    #[test]
    fn structured_buffer_non_16_multiple_is_only_a_warning() {
        let mut d = desc(BufferKind::Structured, 20);
        d.element_stride = Some(20);
        assert!(d.validate().is_ok());
        assert!(d.performance_warning().is_some());
    }

    #[test]
    fn texture_buffer_requires_format() {
        let d = desc(BufferKind::Texture, 64);
        assert!(d.validate().is_err());
    }
}
