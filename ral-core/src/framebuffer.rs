use crate::backend::{Backend, DeviceBackend};
use crate::resource::{Res, Resource, ResourceMeta};
use crate::texture::Texture;
use std::sync::Arc;

/// One attachment slot's binding: a texture plus the mip level it attaches
/// (spec.md §3.1 "Framebuffer").
#[derive(Debug, Clone)]
pub struct FramebufferAttachment<B: Backend> {
    pub texture: Res<Texture<B>>,
    pub mip_level: u32,
}

/// Backend-agnostic description of a [`Framebuffer`] (spec.md §3.1): the
/// concrete attachment textures bound against a compatible
/// [`crate::render_pass::RenderPass`]'s attachment layout.
#[derive(Debug, Clone, Default)]
pub struct FramebufferDescriptor<B: Backend> {
    pub color_attachments: Vec<FramebufferAttachment<B>>,
    pub depth_stencil_attachment: Option<FramebufferAttachment<B>>,
}

impl<B: Backend> FramebufferDescriptor<B> {
    /// Per the Open Question decision recorded in `SPEC_FULL.md` §13,
    /// width/height are computed uniformly from the attachments' mip sizes
    /// (not queried from the backend), so the null backend reports the same
    /// numbers a real backend would. Spec.md §8 invariant 5: the framebuffer's
    /// extent is the *minimum*, not merely the first attachment's, over every
    /// bound attachment (color and depth-stencil alike).
    pub fn compute_width_and_height(&self) -> Option<(u32, u32)> {
        self.color_attachments
            .iter()
            .chain(self.depth_stencil_attachment.as_ref())
            .map(|a| a.texture.mip_size(a.mip_level))
            .reduce(|(aw, ah), (bw, bh)| (aw.min(bw), ah.min(bh)))
    }
}

#[derive(Debug)]
pub struct Framebuffer<B: Backend> {
    meta: ResourceMeta,
    pub descriptor: FramebufferDescriptor<B>,
    width: u32,
    height: u32,
    pub(crate) raw: Option<B::Framebuffer>,
    device: Arc<B::Device>,
}

impl<B: Backend> Framebuffer<B> {
    pub fn new(meta: ResourceMeta, descriptor: FramebufferDescriptor<B>, raw: B::Framebuffer, device: Arc<B::Device>) -> Self {
        let (width, height) = descriptor.compute_width_and_height().unwrap_or((0, 0));
        Self { meta, descriptor, width, height, raw: Some(raw), device }
    }

    /// Builds a [`Framebuffer`] standing in for a swap chain's currently
    /// acquired image (spec.md §3.1: a swap chain is itself "a RenderPass
    /// bound to an OS window plus presentable color images"), so it can be
    /// passed to [`crate::command_buffer::Command::SetGraphicsRenderTarget`]
    /// the same way an application-owned framebuffer would.
    pub(crate) fn from_swap_chain_image(
        meta: ResourceMeta,
        width: u32,
        height: u32,
        raw: B::Framebuffer,
        device: Arc<B::Device>,
    ) -> Self {
        Self {
            meta,
            descriptor: FramebufferDescriptor::default(),
            width,
            height,
            raw: Some(raw),
            device,
        }
    }

    pub fn get_width_and_height(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn raw(&self) -> &B::Framebuffer {
        self.raw.as_ref().expect("Framebuffer accessed after destruction")
    }
}

impl<B: Backend> Resource for Framebuffer<B> {
    fn meta(&self) -> &ResourceMeta {
        &self.meta
    }
}

impl<B: Backend> Drop for Framebuffer<B> {
    fn drop(&mut self) {
        if let Some(raw) = self.raw.take() {
            self.device.destroy_framebuffer(raw);
        }
    }
}

#[cfg(test)]
mod tests {
    // Attachment-bearing behavior is exercised together with
    // `Texture<B>::mip_size` in the null-backend integration tests, since
    // building a `FramebufferAttachment` requires a concrete `Backend` impl
    // (see `ral-null`'s `framebuffer_extent_is_the_minimum_over_all_attachments`).
}
