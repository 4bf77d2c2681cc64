use crate::backend::{Backend, DeviceBackend};
use crate::resource::{Resource, ResourceMeta};
use ral_types::{TextureFormat, MAX_RENDER_PASS_COLOR_ATTACHMENTS};
use std::sync::Arc;

/// Load/store behavior for one attachment (spec.md §3.1 "RenderPass"),
/// matching Vulkan's `VkAttachmentLoadOp`/`VkAttachmentStoreOp` directly
/// since this crate's render-pass model is itself Vulkan-shaped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOp {
    Load,
    Clear,
    DontCare,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOp {
    Store,
    DontCare,
}

#[derive(Debug, Clone, Copy)]
pub struct ColorAttachmentDescriptor {
    pub format: TextureFormat,
    pub load_op: LoadOp,
    pub store_op: StoreOp,
    pub samples: u8,
}

#[derive(Debug, Clone, Copy)]
pub struct DepthStencilAttachmentDescriptor {
    pub format: TextureFormat,
    pub depth_load_op: LoadOp,
    pub depth_store_op: StoreOp,
    pub stencil_load_op: LoadOp,
    pub stencil_store_op: StoreOp,
    pub samples: u8,
}

/// Backend-agnostic description of a [`RenderPass`] (spec.md §3.1): up to
/// [`MAX_RENDER_PASS_COLOR_ATTACHMENTS`] color attachments plus an optional
/// depth-stencil attachment, immutable once created (spec.md's immutable
/// pipeline/render-pass model, §4.5).
#[derive(Debug, Clone, Default)]
pub struct RenderPassDescriptor {
    pub color_attachments: Vec<ColorAttachmentDescriptor>,
    pub depth_stencil_attachment: Option<DepthStencilAttachmentDescriptor>,
}

impl RenderPassDescriptor {
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.color_attachments.len() > MAX_RENDER_PASS_COLOR_ATTACHMENTS {
            return Err("RenderPass exceeds the maximum number of color attachments");
        }
        if self.color_attachments.is_empty() && self.depth_stencil_attachment.is_none() {
            return Err("RenderPass requires at least one attachment");
        }
        let samples = self
            .color_attachments
            .first()
            .map(|a| a.samples)
            .or(self.depth_stencil_attachment.map(|a| a.samples));
        if let Some(samples) = samples {
            let mismatched = self.color_attachments.iter().any(|a| a.samples != samples)
                || self.depth_stencil_attachment.map_or(false, |a| a.samples != samples);
            if mismatched {
                return Err("all attachments in a RenderPass must share the same sample count");
            }
        }
        Ok(())
    }
}

/// A compiled render pass (spec.md §3.1, §4.5): on Vulkan, a `VkRenderPass`
/// with a fixed attachment/subpass layout compatible with any
/// [`crate::framebuffer::Framebuffer`] built against it.
#[derive(Debug)]
pub struct RenderPass<B: Backend> {
    meta: ResourceMeta,
    pub descriptor: RenderPassDescriptor,
    pub(crate) raw: Option<B::RenderPass>,
    device: Arc<B::Device>,
}

impl<B: Backend> RenderPass<B> {
    pub fn new(meta: ResourceMeta, descriptor: RenderPassDescriptor, raw: B::RenderPass, device: Arc<B::Device>) -> Self {
        Self { meta, descriptor, raw: Some(raw), device }
    }

    pub fn raw(&self) -> &B::RenderPass {
        self.raw.as_ref().expect("RenderPass accessed after destruction")
    }
}

impl<B: Backend> Resource for RenderPass<B> {
    fn meta(&self) -> &ResourceMeta {
        &self.meta
    }
}

impl<B: Backend> Drop for RenderPass<B> {
    fn drop(&mut self) {
        if let Some(raw) = self.raw.take() {
            self.device.destroy_render_pass(raw);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn color(samples: u8) -> ColorAttachmentDescriptor {
        ColorAttachmentDescriptor {
            format: TextureFormat::R8G8B8A8,
            load_op: LoadOp::Clear,
            store_op: StoreOp::Store,
            samples,
        }
    }

    #[test]
    fn requires_at_least_one_attachment() {
        assert!(RenderPassDescriptor::default().validate().is_err());
    }

    #[test]
    fn too_many_color_attachments_rejected() {
        let d = RenderPassDescriptor {
            color_attachments: vec![color(1); MAX_RENDER_PASS_COLOR_ATTACHMENTS + 1],
            depth_stencil_attachment: None,
        };
        assert!(d.validate().is_err());
    }

    #[test]
    fn mismatched_sample_counts_rejected() {
        let d = RenderPassDescriptor {
            color_attachments: vec![color(1), color(4)],
            depth_stencil_attachment: None,
        };
        assert!(d.validate().is_err());
    }
}
