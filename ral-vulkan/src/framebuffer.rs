//! `VkFramebuffer` creation for application-owned (non-swap-chain)
//! framebuffers, backed by the same render-pass/framebuffer cache
//! `render_pass.rs` maintains on `DeviceShared` — grounded on wgpu-hal's
//! own render-pass-compatibility caching in `vulkan::Device`.
use crate::device::VulkanDevice;
use crate::render_pass::get_or_create_framebuffer;
use crate::types::{VulkanBackend, VulkanFramebuffer};
use ral_core::error::CreationError;
use ral_core::framebuffer::FramebufferDescriptor;

pub fn create_framebuffer(
    device: &VulkanDevice,
    render_pass: &crate::types::VulkanRenderPass,
    descriptor: &FramebufferDescriptor<VulkanBackend>,
) -> Result<VulkanFramebuffer, CreationError> {
    let (width, height) = descriptor
        .compute_width_and_height()
        .ok_or(CreationError::InvalidArgument("Framebuffer requires at least one attachment"))?;

    let mut views = Vec::with_capacity(descriptor.color_attachments.len() + 1);
    for attachment in &descriptor.color_attachments {
        let view = attachment
            .texture
            .view()
            .ok_or(CreationError::InvalidArgument("color attachment texture has no view"))?;
        views.push(view.raw);
    }
    if let Some(attachment) = &descriptor.depth_stencil_attachment {
        let view = attachment
            .texture
            .view()
            .ok_or(CreationError::InvalidArgument("depth-stencil attachment texture has no view"))?;
        views.push(view.raw);
    }

    let raw = get_or_create_framebuffer(&device.shared, render_pass.raw, &views, width, height)?;

    Ok(VulkanFramebuffer {
        raw: parking_lot::Mutex::new(Some(raw)),
        render_pass: render_pass.raw,
        views,
        width,
        height,
    })
}

/// The underlying `VkFramebuffer` is owned by `DeviceShared`'s cache (keyed
/// on render pass + views + extent), not by this object, so destroying a
/// `Framebuffer` only drops this wrapper's handle to it.
pub fn destroy_framebuffer(_device: &VulkanDevice, framebuffer: VulkanFramebuffer) {
    let _ = framebuffer.raw.into_inner();
}
