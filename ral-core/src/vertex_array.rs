use crate::backend::{Backend, DeviceBackend};
use crate::buffer::Buffer;
use crate::resource::{Res, Resource, ResourceMeta};
use ral_types::IndexBufferFormat;
use std::sync::Arc;

/// One attribute within a vertex buffer's layout (spec.md §3.1 "VertexArray").
#[derive(Debug, Clone, Copy)]
pub struct VertexAttribute {
    pub shader_location: u32,
    pub format: ral_types::TextureFormat,
    pub offset: u32,
}

/// A vertex buffer plus the per-vertex attribute layout read from it, and
/// its step rate (spec.md §3.1: per-vertex vs. per-instance stepping).
#[derive(Debug, Clone)]
pub struct VertexArrayVertexBuffer<B: Backend> {
    pub buffer: Res<Buffer<B>>,
    pub stride: u32,
    pub instance_step_rate: Option<u32>,
    pub attributes: Vec<VertexAttribute>,
}

/// Backend-agnostic description of a [`VertexArray`] (spec.md §3.1):
/// zero or more vertex-buffer bindings plus an optional index buffer.
///
/// Per the Open Question decision recorded in `SPEC_FULL.md` §13, a
/// `VertexArray` does not hold strong references to the buffers it
/// describes (unlike [`crate::resource_group::ResourceGroup`], which does) —
/// callers are responsible for keeping the underlying buffers alive, mirroring
/// the source's behavior of recording raw buffer pointers into the VAO.
#[derive(Debug, Clone, Default)]
pub struct VertexArrayDescriptor<B: Backend> {
    pub vertex_buffers: Vec<VertexArrayVertexBuffer<B>>,
    pub index_buffer: Option<(Res<Buffer<B>>, IndexBufferFormat)>,
}

#[derive(Debug)]
pub struct VertexArray<B: Backend> {
    meta: ResourceMeta,
    pub(crate) raw: Option<B::VertexArray>,
    device: Arc<B::Device>,
}

impl<B: Backend> VertexArray<B> {
    pub fn new(meta: ResourceMeta, raw: B::VertexArray, device: Arc<B::Device>) -> Self {
        Self { meta, raw: Some(raw), device }
    }

    pub fn raw(&self) -> &B::VertexArray {
        self.raw.as_ref().expect("VertexArray accessed after destruction")
    }
}

impl<B: Backend> Resource for VertexArray<B> {
    fn meta(&self) -> &ResourceMeta {
        &self.meta
    }
}

impl<B: Backend> Drop for VertexArray<B> {
    fn drop(&mut self) {
        if let Some(raw) = self.raw.take() {
            self.device.destroy_vertex_array(raw);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_buffer_byte_width_matches_format() {
        assert_eq!(IndexBufferFormat::UnsignedShort.byte_width(), 2);
        assert_eq!(IndexBufferFormat::UnsignedInt.byte_width(), 4);
    }
}
